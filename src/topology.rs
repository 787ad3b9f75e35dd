//! Live array topology
//!
//! Parses the kernel's md status text into an `ArrayTopology` snapshot: member
//! partitions, RAID level, chunk size and layout.
//!
//! # Status line grammar
//!
//! ```text
//! md0 : active raid5 sdd1[2] sdc1[1] sdb1[0]
//! md1 : active (auto-read-only) raid1 sdb2[1] sda2[0](F)
//! ^^^   ^^^^^^ ^^^^^^^^^^^^^^^^ ^^^^^ ^^^^^^^^^^^^^^^^^^^^
//! name  state  optional flags   level members: name[index] with optional (X) suffix
//! ```
//!
//! The parsers are pure functions; `TopologyReader` glues them to a
//! `SystemProbe`.

use crate::error::{RaidError, Result};
use crate::probe::SystemProbe;
use crate::types::RaidLevel;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Point-in-time view of an existing array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayTopology {
    pub device: PathBuf,
    pub level: RaidLevel,
    /// Bare member names (`sdb1`) in the order the kernel reports them
    pub members: Vec<String>,
    pub chunk_kb: u32,
    /// Layout as reported by `mdadm --detail`; present for levels 5 and 10
    pub layout: Option<String>,
}

impl ArrayTopology {
    /// Members as device paths (`/dev/sdb1`), in reported order
    pub fn member_paths(&self) -> Vec<PathBuf> {
        self.members
            .iter()
            .map(|name| Path::new("/dev").join(name))
            .collect()
    }

    /// Whether `partition` (path or bare name) is already a member
    pub fn has_member(&self, partition: &Path) -> bool {
        partition
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.members.iter().any(|m| m == name))
    }
}

/// Level and members extracted from one status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub level: RaidLevel,
    pub members: Vec<String>,
}

/// `/dev/md0` → `md0`
pub fn short_name(device: &Path) -> Result<&str> {
    device
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| RaidError::topology(format!("invalid array device {}", device.display())))
}

/// Find and parse the status line for `array_name` in live status text.
pub fn parse_status(status: &str, array_name: &str) -> Result<StatusLine> {
    let line = status
        .lines()
        .find_map(|line| {
            let (name, rest) = line.split_once(':')?;
            (name.trim() == array_name).then_some(rest)
        })
        .ok_or_else(|| {
            RaidError::topology(format!(
                "Could not get partition information for /dev/{} (not listed as an array)",
                array_name
            ))
        })?;

    let mut tokens = line.split_whitespace().peekable();

    match tokens.next() {
        Some("active") => {}
        Some(state) => {
            return Err(RaidError::topology(format!(
                "/dev/{} is {}, not active",
                array_name, state
            )));
        }
        None => {
            return Err(RaidError::topology(format!(
                "empty status line for /dev/{}",
                array_name
            )));
        }
    }

    while tokens.peek().is_some_and(|t| t.starts_with('(')) {
        tokens.next();
    }

    let level_token = tokens
        .next()
        .ok_or_else(|| RaidError::topology(format!("no RAID level for /dev/{}", array_name)))?;
    let level = level_token
        .strip_prefix("raid")
        .and_then(|n| n.parse::<u8>().ok())
        .and_then(|n| RaidLevel::try_from(n).ok())
        .ok_or_else(|| RaidError::topology(format!("Unknown RAID level ({})", level_token)))?;

    let rest: Vec<&str> = tokens.collect();
    let mut members: Vec<String> = Vec::with_capacity(rest.len());
    for token in &rest {
        let name = parse_member_token(token).ok_or_else(|| {
            RaidError::topology(format!(
                "Could not get partition information from '{}'",
                rest.join(" ")
            ))
        })?;
        if members.iter().any(|m| m == name) {
            return Err(RaidError::topology(format!(
                "member {} listed twice for /dev/{}",
                name, array_name
            )));
        }
        members.push(name.to_string());
    }

    if members.is_empty() {
        return Err(RaidError::topology(format!(
            "Could not get partition information for /dev/{} (no members)",
            array_name
        )));
    }

    Ok(StatusLine { level, members })
}

/// `sdb1[0]` / `sdb1[0](F)` → `sdb1`
fn parse_member_token(token: &str) -> Option<&str> {
    let (name, rest) = token.split_once('[')?;
    let (index, suffix) = rest.split_once(']')?;
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '!'));
    let valid_index = !index.is_empty() && index.chars().all(|c| c.is_ascii_digit());
    let valid_suffix =
        suffix.is_empty() || (suffix.starts_with('(') && suffix.ends_with(')'));
    (valid_name && valid_index && valid_suffix).then_some(name)
}

/// Chunk attribute in bytes → KiB. Unparseable or zero yields None.
pub fn parse_chunk_attribute(raw: &str) -> Option<u32> {
    let bytes: u64 = raw.trim().parse().ok()?;
    let kb = u32::try_from(bytes / 1024).ok()?;
    (kb > 0).then_some(kb)
}

/// First `Layout :` field in an `mdadm --detail` report.
pub fn parse_detail_layout(report: &str) -> Option<String> {
    report.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        let value = value.trim();
        (key.trim() == "Layout" && !value.is_empty()).then(|| value.to_string())
    })
}

/// Builds `ArrayTopology` snapshots from a probe.
pub struct TopologyReader<'a, P: SystemProbe + ?Sized> {
    probe: &'a P,
}

impl<'a, P: SystemProbe + ?Sized> TopologyReader<'a, P> {
    pub fn new(probe: &'a P) -> Self {
        Self { probe }
    }

    /// Read the topology of `device`.
    ///
    /// `fallback_chunk_kb` is used when the chunk attribute is missing or
    /// unreadable.
    ///
    /// # Errors
    ///
    /// `Topology` when the array is not listed or not active, its level is
    /// unsupported, its members cannot be parsed, or a level 5/10 array has no
    /// readable layout.
    pub fn read_topology(&self, device: &Path, fallback_chunk_kb: u32) -> Result<ArrayTopology> {
        info!("Determining current partitions in {}...", device.display());
        let name = short_name(device)?;

        let status = self.probe.live_status()?;
        let line = parse_status(&status, name)?;

        let chunk_kb = match self.probe.chunk_attribute(name)? {
            Some(raw) => parse_chunk_attribute(&raw).unwrap_or_else(|| {
                debug!("unreadable chunk attribute {:?}; using {} KiB", raw.trim(), fallback_chunk_kb);
                fallback_chunk_kb
            }),
            None => fallback_chunk_kb,
        };

        let layout = if line.level.has_layout() {
            let report = self.probe.detail_report(device)?;
            let layout = parse_detail_layout(&report).ok_or_else(|| {
                RaidError::topology(format!("no Layout in detail report for {}", device.display()))
            })?;
            Some(layout)
        } else {
            None
        };

        for member in &line.members {
            info!(" + {}", member);
        }

        Ok(ArrayTopology {
            device: device.to_path_buf(),
            level: line.level,
            members: line.members,
            chunk_kb,
            layout,
        })
    }
}
