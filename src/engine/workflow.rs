//! Orchestration Engine
//!
//! Drives one create/extend/remove run. Every external action goes through
//! the `CommandRunner`; every stage change goes through `WorkflowContext`.
//! The first fatal error aborts the run and leaves the context in `Failed`.
//! Nothing already applied is rolled back.
//!
//! Command sequences:
//!
//! ```text
//! create:  per partition: pvdisplay (tolerant) → [pvmove (tolerant), vgreduce, pvremove]
//!          mdadm --create → pvcreate → vgextend
//! extend:  read topology → pvmove (tolerant), vgreduce, pvremove → mdadm --stop
//!          → mdadm --zero-superblock per old member
//!          mdadm --create (old members, then new) → pvcreate → vgextend
//! remove:  read topology → pvmove (tolerant), vgreduce, pvremove → mdadm --stop
//!          → mdadm --zero-superblock per old member
//! ```

use crate::command_runner::{CommandRunner, Executor};
use crate::config::Configuration;
use crate::engine::state::{WorkflowContext, WorkflowStage};
use crate::engine::step::{ArrayOp, WorkflowStep};
use crate::error::{RaidError, Result};
use crate::layout;
use crate::probe::SystemProbe;
use crate::tools::lvm::{
    PvCreateArgs, PvDisplayArgs, PvMoveArgs, PvRemoveArgs, VgExtendArgs, VgReduceArgs,
};
use crate::tools::mdadm::{MdadmCreateArgs, MdadmStopArgs, MdadmZeroSuperblockArgs};
use crate::topology::TopologyReader;
use crate::types::{Mode, RaidLevel};
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Effective array parameters for a run, fixed before anything is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ArrayPlan {
    device: PathBuf,
    level: RaidLevel,
    chunk_kb: u32,
    layout: Option<String>,
    /// Rebuild set for create/extend; retired members for remove
    members: Vec<PathBuf>,
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReport {
    pub mode: Mode,
    pub device: PathBuf,
    pub level: RaidLevel,
    /// None for levels without a chunk size
    pub chunk_kb: Option<u32>,
    pub layout: Option<String>,
    /// Members of the new array, or the retired members after a remove
    pub members: Vec<PathBuf>,
    pub steps_issued: usize,
    pub simulated: bool,
}

impl WorkflowReport {
    /// Multi-line plan summary for the console.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let simulated = if self.simulated { " (simulated)" } else { "" };
        let members = self
            .members
            .iter()
            .map(|m| m.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");

        // Writing to a String cannot fail
        let _ = writeln!(out, "Mode:     {}{}", self.mode, simulated);
        let _ = writeln!(out, "Array:    {}", self.device.display());
        let _ = writeln!(out, "Level:    {}", self.level);
        if let Some(chunk) = self.chunk_kb {
            let _ = writeln!(out, "Chunk:    {} KiB", chunk);
        }
        if let Some(layout) = &self.layout {
            let _ = writeln!(out, "Layout:   {}", layout);
        }
        let label = if self.mode == Mode::Remove { "Retired:" } else { "Members:" };
        let _ = writeln!(out, "{} {}", label, members);
        let _ = write!(out, "Steps:    {}", self.steps_issued);
        out
    }
}

impl fmt::Display for WorkflowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Runs one workflow against a host.
///
/// # Example
///
/// ```
/// use raidgrow::command_runner::{Executor, ToolOutput};
/// use raidgrow::config::Configuration;
/// use raidgrow::engine::workflow::OrchestrationEngine;
/// use raidgrow::probe::HostProbe;
/// use raidgrow::tool_traits::ToolArgs;
/// use raidgrow::types::Mode;
///
/// struct Unused;
/// impl Executor for Unused {
///     fn execute(&mut self, _tool: &dyn ToolArgs) -> raidgrow::Result<ToolOutput> {
///         unreachable!("simulate mode never executes")
///     }
/// }
///
/// let config = Configuration::new(Mode::Create, "vg0")
///     .with_partitions(["sdb1", "sdc1"])
///     .simulated(true);
/// let probe = HostProbe::new("/nonexistent-root");
/// let mut engine = OrchestrationEngine::new(config, Unused, probe);
/// let report = engine.run().unwrap();
/// assert_eq!(report.members.len(), 2);
/// assert_eq!(engine.runner().transcript().last().unwrap(), "vgextend vg0 /dev/md0");
/// ```
pub struct OrchestrationEngine<E: Executor, P: SystemProbe> {
    config: Configuration,
    runner: CommandRunner<E>,
    probe: P,
    ctx: WorkflowContext,
}

impl<E: Executor, P: SystemProbe> OrchestrationEngine<E, P> {
    /// Engine for `config`; simulate mode is taken from the configuration.
    pub fn new(config: Configuration, executor: E, probe: P) -> Self {
        let runner = CommandRunner::new(executor, config.simulate);
        let ctx = WorkflowContext::new(config.mode);
        Self {
            config,
            runner,
            probe,
            ctx,
        }
    }

    /// Echo commands and progress messages on stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.runner = self.runner.with_echo(echo);
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn runner(&self) -> &CommandRunner<E> {
        &self.runner
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.ctx
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Run the workflow to completion or to the first fatal error.
    pub fn run(&mut self) -> Result<WorkflowReport> {
        info!(
            mode = %self.config.mode,
            simulate = self.config.simulate,
            "Starting {} workflow",
            self.config.mode
        );

        match self.execute() {
            Ok(report) => {
                info!("{} workflow complete ({} steps)", report.mode, report.steps_issued);
                Ok(report)
            }
            Err(err) => {
                let stage = self.ctx.current_stage();
                if let Err(e) = self.ctx.fail() {
                    debug!("could not mark workflow failed: {}", e);
                }
                error!("{} workflow failed while {}: {}", self.config.mode, stage, err);
                Err(err)
            }
        }
    }

    fn execute(&mut self) -> Result<WorkflowReport> {
        self.config.validate()?;

        let plan = match self.config.mode {
            Mode::Create => self.prepare_create()?,
            Mode::Extend | Mode::Remove => self.prepare_existing()?,
        };

        if self.config.mode.rebuilds() {
            self.rebuild(&plan)?;
            self.reattach(&plan)?;
        }

        self.ctx.transition_to(WorkflowStage::Done)?;
        Ok(self.report(plan))
    }

    /// Release configured partitions from LVM and pick the new array device.
    fn prepare_create(&mut self) -> Result<ArrayPlan> {
        let level = self.config.level;
        let layout = if level.has_layout() {
            layout::resolve_optional(level, self.config.layout.as_deref())?
        } else {
            None
        };
        let device = match &self.config.array_device {
            Some(device) if self.probe.device_exists(device) => {
                return Err(RaidError::config(format!(
                    "{} already exists; choose an unused array device",
                    device.display()
                )));
            }
            Some(device) => device.clone(),
            None => self.probe.first_unused_array_device(),
        };
        info!("New array will be {}", device.display());

        self.ctx.transition_to(WorkflowStage::Detaching)?;
        let partitions = self.config.partitions.clone();
        for partition in &partitions {
            self.release_partition(partition)?;
        }

        Ok(ArrayPlan {
            device,
            level,
            chunk_kb: self.config.chunk_kb,
            layout,
            members: partitions,
        })
    }

    /// Discover the existing array, then detach, stop and wipe it.
    fn prepare_existing(&mut self) -> Result<ArrayPlan> {
        let device = self.config.array_device.clone().ok_or_else(|| {
            RaidError::config(format!(
                "RAID device must be specified for {} mode",
                self.config.mode
            ))
        })?;

        self.ctx.transition_to(WorkflowStage::Discovering)?;
        let topology =
            TopologyReader::new(&self.probe).read_topology(&device, self.config.chunk_kb)?;
        let layout = layout::resolve_optional(topology.level, topology.layout.as_deref())?;

        if topology.level != self.config.level && self.config.mode == Mode::Extend {
            debug!(
                "configured level {} overridden by discovered level {}",
                self.config.level, topology.level
            );
        }

        let old_members = topology.member_paths();
        let mut members = old_members.clone();
        if self.config.mode == Mode::Extend {
            if let Some(dup) = self
                .config
                .partitions
                .iter()
                .find(|p| topology.has_member(p))
            {
                return Err(RaidError::config(format!(
                    "{} is already a member of {}",
                    dup.display(),
                    device.display()
                )));
            }
            members.extend(self.config.partitions.iter().cloned());
        }

        self.ctx.transition_to(WorkflowStage::Detaching)?;
        self.runner
            .announce(&format!("Removing {} from volume group...", device.display()));
        self.detach_from_group(&device)?;

        self.runner.announce(&format!("Stopping {}...", device.display()));
        self.step(ArrayOp::StopArray(MdadmStopArgs {
            device: device.clone(),
        }))?;

        for member in &old_members {
            self.step(ArrayOp::ZeroArraySignature(MdadmZeroSuperblockArgs {
                partition: member.clone(),
            }))?;
        }

        Ok(ArrayPlan {
            device,
            level: topology.level,
            chunk_kb: topology.chunk_kb,
            layout,
            members,
        })
    }

    /// Detach `partition` if LVM currently knows it as a physical volume.
    fn release_partition(&mut self, partition: &Path) -> Result<()> {
        let probe = WorkflowStep::tolerant(ArrayOp::ProbePhysicalVolume(PvDisplayArgs {
            device: partition.to_path_buf(),
        }));
        if !self.runner.run(&probe)? {
            debug!("{} is not a physical volume; nothing to detach", partition.display());
            return Ok(());
        }

        self.runner.announce(&format!(
            "Removing {} from volume group...",
            partition.display()
        ));
        self.detach_from_group(partition)
    }

    /// pvmove (tolerant), vgreduce, pvremove.
    fn detach_from_group(&mut self, device: &Path) -> Result<()> {
        let moved = self.runner.run(&WorkflowStep::tolerant(ArrayOp::RelocateExtents(
            PvMoveArgs {
                device: device.to_path_buf(),
            },
        )))?;
        if !moved {
            warn!("pvmove {} did not complete; continuing", device.display());
        }

        self.step(ArrayOp::ReduceGroup(VgReduceArgs {
            volume_group: self.config.volume_group.clone(),
            device: device.to_path_buf(),
        }))?;
        self.step(ArrayOp::WipeSignature(PvRemoveArgs {
            device: device.to_path_buf(),
        }))
    }

    fn rebuild(&mut self, plan: &ArrayPlan) -> Result<()> {
        self.ctx.transition_to(WorkflowStage::Rebuilding)?;
        self.runner.announce(&format!(
            "Creating {} from {} partitions...",
            plan.device.display(),
            plan.members.len()
        ));

        self.step(ArrayOp::CreateArray(MdadmCreateArgs {
            device: plan.device.clone(),
            level: plan.level,
            chunk_kb: plan.level.uses_chunk().then_some(plan.chunk_kb),
            layout: plan.layout.clone(),
            members: plan.members.clone(),
        }))?;
        self.step(ArrayOp::InitPhysicalVolume(PvCreateArgs {
            device: plan.device.clone(),
        }))
    }

    fn reattach(&mut self, plan: &ArrayPlan) -> Result<()> {
        self.ctx.transition_to(WorkflowStage::Reattaching)?;
        self.runner.announce(&format!(
            "Adding {} to volume group {}...",
            plan.device.display(),
            self.config.volume_group
        ));
        self.step(ArrayOp::ExtendGroup(VgExtendArgs {
            volume_group: self.config.volume_group.clone(),
            device: plan.device.clone(),
        }))
    }

    /// Run a fatal step.
    fn step(&mut self, op: ArrayOp) -> Result<()> {
        self.runner.run(&WorkflowStep::fatal(op)).map(|_| ())
    }

    fn report(&self, plan: ArrayPlan) -> WorkflowReport {
        WorkflowReport {
            mode: self.config.mode,
            device: plan.device,
            level: plan.level,
            chunk_kb: plan.level.uses_chunk().then_some(plan.chunk_kb),
            layout: plan.layout,
            members: plan.members,
            steps_issued: self.runner.transcript().len(),
            simulated: self.runner.is_simulated(),
        }
    }
}
