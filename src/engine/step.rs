//! Workflow steps
//!
//! A `WorkflowStep` is one typed external action plus its failure policy.
//! Steps have no identity beyond their position in the sequence.

use crate::tool_traits::ToolArgs;
use crate::tools::lvm::{
    PvCreateArgs, PvDisplayArgs, PvMoveArgs, PvRemoveArgs, VgExtendArgs, VgReduceArgs,
};
use crate::tools::mdadm::{MdadmCreateArgs, MdadmStopArgs, MdadmZeroSuperblockArgs};
use std::fmt;

/// A single external action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayOp {
    /// Check whether a partition carries an LVM physical-volume label
    ProbePhysicalVolume(PvDisplayArgs),
    /// Move allocated extents off a physical volume
    RelocateExtents(PvMoveArgs),
    /// Drop a physical volume from the volume group
    ReduceGroup(VgReduceArgs),
    /// Erase the LVM label
    WipeSignature(PvRemoveArgs),
    /// Deactivate an array
    StopArray(MdadmStopArgs),
    /// Erase md membership metadata on a former member
    ZeroArraySignature(MdadmZeroSuperblockArgs),
    /// Build the new array
    CreateArray(MdadmCreateArgs),
    /// Label the new array as a physical volume
    InitPhysicalVolume(PvCreateArgs),
    /// Add the new array to the volume group
    ExtendGroup(VgExtendArgs),
}

impl ArrayOp {
    /// The typed tool invocation behind this operation.
    pub fn tool(&self) -> &dyn ToolArgs {
        match self {
            Self::ProbePhysicalVolume(args) => args,
            Self::RelocateExtents(args) => args,
            Self::ReduceGroup(args) => args,
            Self::WipeSignature(args) => args,
            Self::StopArray(args) => args,
            Self::ZeroArraySignature(args) => args,
            Self::CreateArray(args) => args,
            Self::InitPhysicalVolume(args) => args,
            Self::ExtendGroup(args) => args,
        }
    }
}

impl fmt::Display for ArrayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProbePhysicalVolume(a) => write!(f, "ProbePV({})", a.device.display()),
            Self::RelocateExtents(a) => write!(f, "RelocateExtents({})", a.device.display()),
            Self::ReduceGroup(a) => {
                write!(f, "ReduceGroup({} - {})", a.volume_group, a.device.display())
            }
            Self::WipeSignature(a) => write!(f, "WipeSignature({})", a.device.display()),
            Self::StopArray(a) => write!(f, "StopArray({})", a.device.display()),
            Self::ZeroArraySignature(a) => {
                write!(f, "ZeroArraySignature({})", a.partition.display())
            }
            Self::CreateArray(a) => write!(
                f,
                "CreateArray({}, level={}, members={})",
                a.device.display(),
                a.level,
                a.members.len()
            ),
            Self::InitPhysicalVolume(a) => write!(f, "InitPV({})", a.device.display()),
            Self::ExtendGroup(a) => {
                write!(f, "ExtendGroup({} + {})", a.volume_group, a.device.display())
            }
        }
    }
}

/// An operation and whether its failure aborts the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStep {
    pub op: ArrayOp,
    /// When true a failure is reported to the caller instead of aborting
    pub tolerate_failure: bool,
}

impl WorkflowStep {
    /// A step whose failure aborts the workflow
    pub fn fatal(op: ArrayOp) -> Self {
        Self {
            op,
            tolerate_failure: false,
        }
    }

    /// A step whose failure the caller handles
    pub fn tolerant(op: ArrayOp) -> Self {
        Self {
            op,
            tolerate_failure: true,
        }
    }
}
