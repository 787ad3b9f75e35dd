//! Read-only host access
//!
//! `SystemProbe` is everything raidgrow reads from the host: the kernel's md
//! status text, per-array sysfs attributes, mdadm's detail report and the
//! `/dev` namespace. Reads happen in simulate mode too.

use crate::command_runner;
use crate::error::{RaidError, Result};
use crate::tools::mdadm::MdadmDetailArgs;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read-only view of the host's array state.
pub trait SystemProbe {
    /// Full text of the kernel's live md status (`/proc/mdstat`).
    fn live_status(&self) -> Result<String>;

    /// Raw chunk-size attribute for the array, in bytes, if present and
    /// readable.
    fn chunk_attribute(&self, array_name: &str) -> Result<Option<String>>;

    /// `mdadm --detail` output for the array.
    fn detail_report(&self, device: &Path) -> Result<String>;

    /// Whether a device node exists.
    fn device_exists(&self, device: &Path) -> bool;

    /// First `/dev/mdN` (N = 0, 1, ...) that does not exist yet.
    fn first_unused_array_device(&self) -> PathBuf {
        let mut index = 0u32;
        loop {
            let candidate = PathBuf::from(format!("/dev/md{}", index));
            if !self.device_exists(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }
}

/// Probe backed by the real host filesystem.
///
/// Paths are resolved under `root`, which is `/` in production and a scratch
/// directory in tests.
#[derive(Debug, Clone)]
pub struct HostProbe {
    root: PathBuf,
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HostProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn host_path(&self, absolute: &Path) -> PathBuf {
        self.root
            .join(absolute.strip_prefix("/").unwrap_or(absolute))
    }
}

impl SystemProbe for HostProbe {
    fn live_status(&self) -> Result<String> {
        let path = self.host_path(Path::new("/proc/mdstat"));
        fs::read_to_string(&path).map_err(|e| {
            RaidError::topology(format!("cannot read {}: {}", path.display(), e))
        })
    }

    fn chunk_attribute(&self, array_name: &str) -> Result<Option<String>> {
        let path = self.host_path(&Path::new("/sys/block").join(array_name).join("md/chunk_size"));
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no chunk attribute at {}", path.display());
                Ok(None)
            }
            Err(e) => {
                warn!("cannot read {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn detail_report(&self, device: &Path) -> Result<String> {
        command_runner::capture(&MdadmDetailArgs {
            device: device.to_path_buf(),
        })
        .map_err(|e| RaidError::topology(format!("cannot query {}: {}", device.display(), e)))
    }

    fn device_exists(&self, device: &Path) -> bool {
        self.host_path(device).exists()
    }
}
