//! Pre-flight sanity checks for runtime environment
//!
//! Before a real (non-simulated) workflow starts:
//! - every mdadm/LVM binary the workflow may call is on PATH
//! - the process runs with root privileges (EUID 0)
//!
//! A failed check is a configuration error, reported before any step runs.

use crate::error::{RaidError, Result};
use tracing::{debug, info, warn};

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl SanityCheckResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root
    }

    /// Operator-facing description of every failed check
    pub fn describe(&self) -> String {
        let mut problems = Vec::new();
        if !self.is_root {
            problems.push("root privileges required (run with sudo or as root)".to_string());
        }
        if !self.missing_binaries.is_empty() {
            let mut packages: Vec<&str> = self
                .missing_binaries
                .iter()
                .map(|b| get_package_for_binary(b))
                .collect();
            packages.dedup();
            problems.push(format!(
                "missing required binaries: {} (install: {})",
                self.missing_binaries.join(", "),
                packages.join(" ")
            ));
        }
        problems.join("; ")
    }
}

/// Required runtime binaries
const REQUIRED_BINARIES: &[&str] = &[
    "mdadm",     // Array create/stop/zero-superblock/detail
    "pvdisplay", // LVM tools (lvm2)
    "pvmove",
    "vgreduce",
    "pvremove",
    "pvcreate",
    "vgextend",
];

/// Check if a binary is available in PATH
fn binary_exists(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Check if running as root (EUID 0)
fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Perform all sanity checks and return the result
pub fn verify_environment() -> SanityCheckResult {
    let missing_binaries = REQUIRED_BINARIES
        .iter()
        .filter(|binary| !binary_exists(binary))
        .map(|binary| (*binary).to_string())
        .collect();

    SanityCheckResult {
        missing_binaries,
        is_root: is_running_as_root(),
    }
}

/// Map binary names to the package that ships them
fn get_package_for_binary(binary: &str) -> &'static str {
    match binary {
        "mdadm" => "mdadm",
        "pvdisplay" | "pvmove" | "vgreduce" | "pvremove" | "pvcreate" | "vgextend" => "lvm2",
        _ => "unknown",
    }
}

/// Skip root check (for development/testing)
/// Set RAIDGROW_SKIP_ROOT_CHECK=1 to skip
pub fn should_skip_root_check() -> bool {
    std::env::var("RAIDGROW_SKIP_ROOT_CHECK")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Verify the environment for a run.
///
/// In simulate mode nothing is executed, so failed checks only warn.
pub fn run_preflight_checks(simulate: bool) -> Result<()> {
    debug!("Running pre-flight sanity checks (simulate={})...", simulate);

    let mut result = verify_environment();
    if should_skip_root_check() {
        warn!("Root check skipped (RAIDGROW_SKIP_ROOT_CHECK=1)");
        result.is_root = true;
    }

    if result.is_ok() {
        info!("Pre-flight checks passed");
        return Ok(());
    }

    if simulate {
        warn!("Pre-flight check would fail: {}", result.describe());
        return Ok(());
    }

    Err(RaidError::config(format!(
        "Pre-flight check failed: {}",
        result.describe()
    )))
}
