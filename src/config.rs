//! Workflow configuration
//!
//! `Configuration` is built once from operator input (CLI flags or a JSON
//! file), validated, and then handed to the engine by value. Nothing else in
//! the crate reads operator input.

use crate::error::{RaidError, Result};
use crate::layout;
use crate::types::{Mode, RaidLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default chunk size in KiB when none is given
pub const DEFAULT_CHUNK_KB: u32 = 32;

/// Chunk sizes accepted on input, in KiB
pub const CHUNK_KB_RANGE: std::ops::RangeInclusive<u32> = 1..=1024;

fn default_chunk_kb() -> u32 {
    DEFAULT_CHUNK_KB
}

/// Validated operation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub mode: Mode,
    pub volume_group: String,
    /// Existing array for extend/remove; optional fixed device for create
    #[serde(default)]
    pub array_device: Option<PathBuf>,
    /// Partitions to add, in order
    #[serde(default)]
    pub partitions: Vec<PathBuf>,
    #[serde(default)]
    pub level: RaidLevel,
    #[serde(default = "default_chunk_kb")]
    pub chunk_kb: u32,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub simulate: bool,
}

impl Configuration {
    /// Configuration with default level, chunk and no devices.
    pub fn new(mode: Mode, volume_group: impl Into<String>) -> Self {
        Self {
            mode,
            volume_group: volume_group.into(),
            array_device: None,
            partitions: Vec::new(),
            level: RaidLevel::default(),
            chunk_kb: DEFAULT_CHUNK_KB,
            layout: None,
            simulate: false,
        }
    }

    pub fn with_array_device(mut self, device: impl AsRef<str>) -> Self {
        self.array_device = Some(normalize_device(device.as_ref()));
        self
    }

    pub fn with_partitions<I, S>(mut self, partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.partitions = partitions
            .into_iter()
            .map(|p| normalize_device(p.as_ref()))
            .collect();
        self
    }

    pub fn with_level(mut self, level: RaidLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_chunk_kb(mut self, chunk_kb: u32) -> Self {
        self.chunk_kb = chunk_kb;
        self
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn simulated(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    /// Validate the configuration.
    ///
    /// Runs before any external action; every failure is a
    /// `RaidError::Configuration`.
    pub fn validate(&self) -> Result<()> {
        validate_volume_group(&self.volume_group)?;

        match &self.array_device {
            Some(device) => validate_array_device(device)?,
            None if self.mode.requires_array() => {
                return Err(RaidError::config(format!(
                    "RAID device must be specified for {} mode",
                    self.mode
                )));
            }
            None => {}
        }

        if self.mode.requires_partitions() && self.partitions.is_empty() {
            return Err(RaidError::config("Partitions must be specified"));
        }
        if self.mode == Mode::Remove && !self.partitions.is_empty() {
            warn!("Partitions are ignored in remove mode");
        }

        let mut seen = HashSet::new();
        for partition in &self.partitions {
            validate_partition(partition)?;
            if !seen.insert(partition) {
                return Err(RaidError::config(format!(
                    "Partition {} listed more than once",
                    partition.display()
                )));
            }
        }

        if !CHUNK_KB_RANGE.contains(&self.chunk_kb) {
            return Err(RaidError::config(format!(
                "Chunk size must be between {}-{} (got {})",
                CHUNK_KB_RANGE.start(),
                CHUNK_KB_RANGE.end(),
                self.chunk_kb
            )));
        }

        if let Some(raw) = &self.layout {
            match self.mode {
                Mode::Create if self.level.has_layout() => {
                    layout::resolve(self.level, raw)
                        .map_err(|e| RaidError::config(format!("Invalid layout: {}", e)))?;
                }
                Mode::Create => {
                    warn!("Layout '{}' ignored for RAID level {}", raw, self.level)
                }
                Mode::Extend | Mode::Remove => {
                    warn!("Layout '{}' ignored; the existing array's layout is used", raw)
                }
            }
        }

        Ok(())
    }
}

/// Prefix bare names with `/dev/` (`md0` → `/dev/md0`, `sdb1` → `/dev/sdb1`).
pub fn normalize_device(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw.starts_with('/') {
        PathBuf::from(raw)
    } else {
        Path::new("/dev").join(raw)
    }
}

/// LVM volume group names: letters, digits and `+_.-`, not starting with `-`.
fn validate_volume_group(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RaidError::config("Volume group must be specified"));
    }
    if name.starts_with('-')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-'))
    {
        return Err(RaidError::config(format!("Invalid volume group name: {}", name)));
    }
    Ok(())
}

/// Array devices must look like `/dev/md<digits>`.
fn validate_array_device(device: &Path) -> Result<()> {
    let valid = device
        .to_str()
        .and_then(|s| s.strip_prefix("/dev/md"))
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
    if valid {
        Ok(())
    } else {
        Err(RaidError::config(format!(
            "Invalid RAID device: {}",
            device.display()
        )))
    }
}

fn validate_partition(partition: &Path) -> Result<()> {
    let valid = partition.starts_with("/dev")
        && partition.components().count() > 2
        && partition.file_name().is_some();
    if valid {
        Ok(())
    } else {
        Err(RaidError::config(format!(
            "Invalid partition: {}",
            partition.display()
        )))
    }
}
