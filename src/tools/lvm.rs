//! Type-safe arguments for the LVM2 command set.
//!
//! Detaching a physical volume from its group is three commands in order:
//! `pvmove` relocates allocated extents, `vgreduce` drops the PV from the
//! group, `pvremove` wipes the LVM label. Attaching is `pvcreate` then
//! `vgextend`.

use std::path::PathBuf;

use crate::tool_traits::ToolArgs;

/// `pvdisplay <device>`: succeeds only when the device carries a PV label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvDisplayArgs {
    pub device: PathBuf,
}

impl ToolArgs for PvDisplayArgs {
    fn program(&self) -> &'static str {
        "pvdisplay"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.device.display().to_string()]
    }
}

/// `pvmove --autobackup y <device>`
///
/// Fails with "No data to move" when the PV holds no extents, which is why the
/// workflow marks it tolerable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvMoveArgs {
    pub device: PathBuf,
}

impl ToolArgs for PvMoveArgs {
    fn program(&self) -> &'static str {
        "pvmove"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "--autobackup".to_string(),
            "y".to_string(),
            self.device.display().to_string(),
        ]
    }
}

/// `vgreduce --autobackup y <vg> <device>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VgReduceArgs {
    pub volume_group: String,
    pub device: PathBuf,
}

impl ToolArgs for VgReduceArgs {
    fn program(&self) -> &'static str {
        "vgreduce"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "--autobackup".to_string(),
            "y".to_string(),
            self.volume_group.clone(),
            self.device.display().to_string(),
        ]
    }
}

/// `pvremove <device>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvRemoveArgs {
    pub device: PathBuf,
}

impl ToolArgs for PvRemoveArgs {
    fn program(&self) -> &'static str {
        "pvremove"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.device.display().to_string()]
    }
}

/// `pvcreate <device>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvCreateArgs {
    pub device: PathBuf,
}

impl ToolArgs for PvCreateArgs {
    fn program(&self) -> &'static str {
        "pvcreate"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.device.display().to_string()]
    }
}

/// `vgextend <vg> <device>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VgExtendArgs {
    pub volume_group: String,
    pub device: PathBuf,
}

impl ToolArgs for VgExtendArgs {
    fn program(&self) -> &'static str {
        "vgextend"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            self.volume_group.clone(),
            self.device.display().to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detach_commands() {
        let device = PathBuf::from("/dev/md0");
        assert_eq!(
            PvMoveArgs { device: device.clone() }.command_line(),
            "pvmove --autobackup y /dev/md0"
        );
        assert_eq!(
            VgReduceArgs { volume_group: "vg0".to_string(), device: device.clone() }.command_line(),
            "vgreduce --autobackup y vg0 /dev/md0"
        );
        assert_eq!(PvRemoveArgs { device }.command_line(), "pvremove /dev/md0");
    }

    #[test]
    fn test_attach_commands() {
        let device = PathBuf::from("/dev/md2");
        assert_eq!(PvCreateArgs { device: device.clone() }.command_line(), "pvcreate /dev/md2");
        assert_eq!(
            VgExtendArgs { volume_group: "data".to_string(), device }.command_line(),
            "vgextend data /dev/md2"
        );
    }

    #[test]
    fn test_volume_group_is_a_single_argument() {
        let args = VgExtendArgs {
            volume_group: "odd name".to_string(),
            device: PathBuf::from("/dev/md0"),
        };
        assert_eq!(args.to_cli_args(), vec!["odd name", "/dev/md0"]);
        assert_eq!(args.command_line(), "vgextend 'odd name' /dev/md0");
    }

    #[test]
    fn test_pvdisplay_probe() {
        let args = PvDisplayArgs { device: PathBuf::from("/dev/sdb1") };
        assert_eq!(args.program(), "pvdisplay");
        assert_eq!(args.to_cli_args(), vec!["/dev/sdb1"]);
    }
}
