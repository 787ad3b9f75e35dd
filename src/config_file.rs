//! Configuration file handling for saving and loading workflow configs.
//!
//! Files are JSON documents mirroring `Configuration`:
//!
//! ```json
//! {
//!   "mode": "extend",
//!   "volume_group": "vg0",
//!   "array_device": "/dev/md0",
//!   "partitions": ["/dev/sdd1"],
//!   "simulate": true
//! }
//! ```
//!
//! `level` defaults to 5 and `chunk_kb` to 32 when omitted.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::{normalize_device, Configuration};

impl Configuration {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    ///
    /// Bare device names in the file are normalized the same way as on the
    /// command line. The result is not validated; call `validate()`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let mut config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        config.array_device = config
            .array_device
            .map(|d| normalize_device(&d.to_string_lossy()));
        config.partitions = config
            .partitions
            .iter()
            .map(|p| normalize_device(&p.to_string_lossy()))
            .collect();

        Ok(config)
    }
}
