//! Type-safe arguments for `mdadm`.
//!
//! | Struct | Command |
//! |--------|---------|
//! | `MdadmCreateArgs` | `mdadm --create --verbose <dev> --level=L --raid-devices=N [--chunk=K] [--layout=X] <members>` |
//! | `MdadmStopArgs` | `mdadm --stop <dev>` |
//! | `MdadmZeroSuperblockArgs` | `mdadm --zero-superblock <partition>` |
//! | `MdadmDetailArgs` | `mdadm --detail <dev>` (read-only) |

use std::path::PathBuf;

use crate::tool_traits::ToolArgs;
use crate::types::RaidLevel;

/// Arguments for creating an array over an ordered member list.
///
/// # Field to Flag Mapping
///
/// | Rust Field | CLI Flag |
/// |------------|----------|
/// | `device`   | positional after `--create --verbose` |
/// | `level`    | `--level=<n>` |
/// | `members`  | `--raid-devices=<count>` then each path |
/// | `chunk_kb` | `--chunk=<kb>`, omitted when `None` |
/// | `layout`   | `--layout=<layout>`, omitted when `None` |
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use raidgrow::tools::mdadm::MdadmCreateArgs;
/// use raidgrow::tool_traits::ToolArgs;
/// use raidgrow::types::RaidLevel;
///
/// let args = MdadmCreateArgs {
///     device: PathBuf::from("/dev/md0"),
///     level: RaidLevel::Raid5,
///     chunk_kb: Some(64),
///     layout: None,
///     members: vec![PathBuf::from("/dev/sdb1"), PathBuf::from("/dev/sdc1")],
/// };
/// assert_eq!(
///     args.command_line(),
///     "mdadm --create --verbose /dev/md0 --level=5 --raid-devices=2 --chunk=64 /dev/sdb1 /dev/sdc1"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdadmCreateArgs {
    pub device: PathBuf,
    pub level: RaidLevel,
    pub chunk_kb: Option<u32>,
    pub layout: Option<String>,
    /// Member partitions in array order.
    pub members: Vec<PathBuf>,
}

impl ToolArgs for MdadmCreateArgs {
    fn program(&self) -> &'static str {
        "mdadm"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "--create".to_string(),
            "--verbose".to_string(),
            self.device.display().to_string(),
            format!("--level={}", self.level.as_u8()),
            format!("--raid-devices={}", self.members.len()),
        ];
        if let Some(chunk) = self.chunk_kb {
            args.push(format!("--chunk={}", chunk));
        }
        if let Some(layout) = &self.layout {
            args.push(format!("--layout={}", layout));
        }
        args.extend(self.members.iter().map(|m| m.display().to_string()));
        args
    }
}

/// Arguments for deactivating an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdadmStopArgs {
    pub device: PathBuf,
}

impl ToolArgs for MdadmStopArgs {
    fn program(&self) -> &'static str {
        "mdadm"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["--stop".to_string(), self.device.display().to_string()]
    }
}

/// Arguments for erasing md membership metadata from a former member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdadmZeroSuperblockArgs {
    pub partition: PathBuf,
}

impl ToolArgs for MdadmZeroSuperblockArgs {
    fn program(&self) -> &'static str {
        "mdadm"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "--zero-superblock".to_string(),
            self.partition.display().to_string(),
        ]
    }
}

/// Arguments for the read-only detail report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdadmDetailArgs {
    pub device: PathBuf,
}

impl ToolArgs for MdadmDetailArgs {
    fn program(&self) -> &'static str {
        "mdadm"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["--detail".to_string(), self.device.display().to_string()]
    }
}
