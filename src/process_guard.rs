//! Process lifecycle management for external array and volume-manager tools
//!
//! A half-finished `mdadm --create` or `vgreduce` is worse than either outcome,
//! so raidgrow never kills a running step.
//!
//! # Solution
//! - Track the in-flight child PID in a global registry
//! - On SIGINT/SIGTERM/SIGHUP, refuse to start further steps, wait for the
//!   in-flight step to finish, then exit with 128 + signal
//! - Workflow steps stay in the terminal's foreground process group so mdadm
//!   can prompt the operator; a terminal Ctrl+C reaches them as it would from
//!   a shell. Read-only queries run in their own process group.

use nix::unistd::Pid;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Global registry of child process IDs
static CHILD_REGISTRY: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// Registry tracking spawned child processes
#[derive(Debug, Default)]
pub struct ChildRegistry {
    /// Set of child PIDs currently running
    pids: HashSet<u32>,
    /// Set once a shutdown signal has arrived; no new children after that
    shutdown_requested: bool,
}

impl ChildRegistry {
    /// Get or create the global child registry
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        CHILD_REGISTRY
            .get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default())))
            .clone()
    }

    /// Register a new child process
    pub fn register(&mut self, pid: u32) {
        self.pids.insert(pid);
        debug!("Registered child process PID {}", pid);
    }

    /// Unregister a child process (called when it exits)
    pub fn unregister(&mut self, pid: u32) {
        self.pids.remove(&pid);
        debug!("Unregistered child process PID {}", pid);
    }

    /// Get count of tracked children
    pub fn count(&self) -> usize {
        self.pids.len()
    }

    /// Stop accepting new children
    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    /// Whether a shutdown signal has been received
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }
}

/// Block until every registered child has been unregistered.
///
/// No timeout: a running step always completes.
pub fn wait_for_children(registry: &Mutex<ChildRegistry>, poll: Duration) {
    loop {
        let remaining = registry.lock().map(|r| r.count()).unwrap_or(0);
        if remaining == 0 {
            return;
        }
        info!(
            "Waiting for {} running step(s) to finish before exiting...",
            remaining
        );
        std::thread::sleep(poll);
    }
}

/// Initialize global signal handlers
/// Handles SIGINT (Ctrl+C), SIGTERM, and SIGHUP
/// Call this once at program start
pub fn init_signal_handlers() -> Result<(), std::io::Error> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use std::thread;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            let signal_name = match sig {
                SIGINT => "SIGINT",
                SIGTERM => "SIGTERM",
                SIGHUP => "SIGHUP",
                _ => "UNKNOWN",
            };

            warn!(
                "Received {}; no further steps will be issued. The array and volume group may need manual attention.",
                signal_name
            );

            let registry = ChildRegistry::global();
            if let Ok(mut guard) = registry.lock() {
                guard.request_shutdown();
            }
            wait_for_children(&registry, Duration::from_millis(200));

            std::process::exit(128 + sig);
        }
    });

    Ok(())
}

/// Extension trait for std::process::Command to set up process groups
pub trait CommandProcessGroup {
    /// Configure the command to run in its own process group
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: setpgid is async-signal-safe and touches no parent state
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(std::io::Error::from)?;
                Ok(())
            });
        }
        self
    }
}
