//! Type-safe configuration types for raidgrow
//!
//! Workflow modes, RAID levels and layout families as enums instead of raw
//! strings, so an unsupported level can never reach `mdadm`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Which workflow to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    /// Build a new array from partitions and add it to the volume group
    Create,
    /// Rebuild an existing array with additional partitions
    Extend,
    /// Detach, stop and wipe an existing array
    Remove,
}

impl Mode {
    /// Modes that operate on an already running array
    pub fn requires_array(&self) -> bool {
        matches!(self, Self::Extend | Self::Remove)
    }

    /// Modes that need at least one configured partition
    pub fn requires_partitions(&self) -> bool {
        matches!(self, Self::Create | Self::Extend)
    }

    /// Modes that end with a new array attached to the volume group
    pub fn rebuilds(&self) -> bool {
        matches!(self, Self::Create | Self::Extend)
    }
}

/// Supported md RAID levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(try_from = "u8", into = "u8")]
#[strum(ascii_case_insensitive)]
pub enum RaidLevel {
    #[strum(to_string = "0", serialize = "raid0")]
    Raid0,
    #[strum(to_string = "1", serialize = "raid1")]
    Raid1,
    #[default]
    #[strum(to_string = "5", serialize = "raid5")]
    Raid5,
    #[strum(to_string = "10", serialize = "raid10")]
    Raid10,
}

impl RaidLevel {
    /// Numeric level as passed to `mdadm --level=`
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Raid0 => 0,
            Self::Raid1 => 1,
            Self::Raid5 => 5,
            Self::Raid10 => 10,
        }
    }

    /// Levels whose data placement is described by a layout
    pub fn has_layout(&self) -> bool {
        matches!(self, Self::Raid5 | Self::Raid10)
    }

    /// Levels that stripe data and therefore take a chunk size
    pub fn uses_chunk(&self) -> bool {
        !matches!(self, Self::Raid1)
    }
}

impl TryFrom<u8> for RaidLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Raid0),
            1 => Ok(Self::Raid1),
            5 => Ok(Self::Raid5),
            10 => Ok(Self::Raid10),
            other => Err(format!("Invalid RAID level: {} (supported: 0, 1, 5, 10)", other)),
        }
    }
}

impl From<RaidLevel> for u8 {
    fn from(level: RaidLevel) -> Self {
        level.as_u8()
    }
}

/// RAID5 parity placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Raid5Layout {
    LeftAsymmetric,
    LeftSymmetric,
    RightAsymmetric,
    RightSymmetric,
}

/// RAID10 copy placement family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Raid10Placement {
    Near,
    Far,
    Offset,
}

impl Raid10Placement {
    /// Single-letter prefix used by mdadm's short layout form (`n2`, `f2`, `o2`)
    pub fn short(&self) -> char {
        match self {
            Self::Near => 'n',
            Self::Far => 'f',
            Self::Offset => 'o',
        }
    }
}
