//! raidgrow library
//!
//! Sequences mdadm and LVM operations to create, extend or retire an md array
//! that backs an LVM volume group.

pub mod cli;
pub mod command_runner;
pub mod config;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod layout;
pub mod probe;
pub mod process_guard;
pub mod sanity;
pub mod tool_traits;
pub mod tools;
pub mod topology;
pub mod types;

// Re-export main types for convenience
pub use command_runner::{CommandRunner, Executor, SystemExecutor, ToolOutput};
pub use config::Configuration;
pub use engine::state::{StageTransitionError, WorkflowContext, WorkflowStage};
pub use engine::step::{ArrayOp, WorkflowStep};
pub use engine::workflow::{OrchestrationEngine, WorkflowReport};
pub use error::{RaidError, Result};
pub use probe::{HostProbe, SystemProbe};
pub use process_guard::{ChildRegistry, CommandProcessGroup};
pub use tool_traits::ToolArgs;
pub use topology::{ArrayTopology, TopologyReader};
pub use types::{Mode, Raid10Placement, Raid5Layout, RaidLevel};
