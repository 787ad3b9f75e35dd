//! Scripted host doubles shared by the integration tests.

#![allow(dead_code)]

use raidgrow::command_runner::{Executor, ToolOutput};
use raidgrow::probe::SystemProbe;
use raidgrow::tool_traits::ToolArgs;
use raidgrow::{RaidError, Result};
use std::path::{Path, PathBuf};

/// Executor that records every command and fails the ones whose command line
/// starts with a scripted prefix.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    pub calls: Vec<String>,
    failures: Vec<(String, i32)>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands starting with `prefix` exit with `code`.
    pub fn failing(mut self, prefix: &str, code: i32) -> Self {
        self.failures.push((prefix.to_string(), code));
        self
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&mut self, tool: &dyn ToolArgs) -> Result<ToolOutput> {
        let line = tool.command_line();
        self.calls.push(line.clone());
        match self.failures.iter().find(|(prefix, _)| line.starts_with(prefix)) {
            Some((_, code)) => Ok(ToolOutput::failed(*code, format!("{} failed", tool.program()))),
            None => Ok(ToolOutput::ok()),
        }
    }
}

/// Probe serving fixed status text, chunk attribute and detail report.
#[derive(Debug, Clone, Default)]
pub struct FakeProbe {
    pub mdstat: String,
    pub chunk_bytes: Option<String>,
    pub detail: Option<String>,
    pub existing: Vec<PathBuf>,
}

impl FakeProbe {
    pub fn with_status(mdstat: &str) -> Self {
        Self {
            mdstat: mdstat.to_string(),
            ..Self::default()
        }
    }

    pub fn chunk(mut self, bytes: &str) -> Self {
        self.chunk_bytes = Some(bytes.to_string());
        self
    }

    pub fn detail(mut self, report: &str) -> Self {
        self.detail = Some(report.to_string());
        self
    }

    pub fn existing(mut self, devices: &[&str]) -> Self {
        self.existing = devices.iter().map(PathBuf::from).collect();
        self
    }
}

impl SystemProbe for FakeProbe {
    fn live_status(&self) -> Result<String> {
        Ok(self.mdstat.clone())
    }

    fn chunk_attribute(&self, _array_name: &str) -> Result<Option<String>> {
        Ok(self.chunk_bytes.clone())
    }

    fn detail_report(&self, device: &Path) -> Result<String> {
        self.detail
            .clone()
            .ok_or_else(|| RaidError::topology(format!("cannot query {}", device.display())))
    }

    fn device_exists(&self, device: &Path) -> bool {
        self.existing.iter().any(|d| d == device)
    }
}

pub const RAID5_MDSTAT: &str = "\
Personalities : [raid1] [raid6] [raid5] [raid4]
md0 : active raid5 sdb1[0] sdc1[1]
      1953260544 blocks super 1.2 level 5, 64k chunk, algorithm 2 [2/2] [UU]

unused devices: <none>
";

pub const RAID5_DETAIL: &str = "\
/dev/md0:
        Raid Level : raid5
            Layout : left-symmetric
        Chunk Size : 64K
";

pub const RAID10_MDSTAT: &str = "\
md4 : active raid10 sdb1[0] sdc1[1] sdd1[2] sde1[3]
      1953260544 blocks super 1.2 512K chunks 2 near-copies [4/4] [UUUU]
";

pub const RAID10_DETAIL: &str = "\
/dev/md4:
        Raid Level : raid10
            Layout : near=2
";

pub const RAID1_MDSTAT: &str = "\
md1 : active raid1 sdb2[1] sda2[0]
      976630336 blocks [2/2] [UU]
";
