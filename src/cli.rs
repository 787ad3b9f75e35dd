use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{normalize_device, Configuration, DEFAULT_CHUNK_KB};
use crate::types::{Mode, RaidLevel};

/// raidgrow - grow, create or retire an md array backing an LVM volume group
#[derive(Parser, Debug)]
#[command(name = "raidgrow")]
#[command(about = "Rebuild an md RAID array with more partitions without leaving its volume group offline")]
#[command(version)]
pub struct Cli {
    /// Simulate: print every command without executing anything.
    ///
    /// Read-only discovery (/proc/mdstat, sysfs, mdadm --detail) still runs
    /// so the printed sequence matches a real run.
    #[arg(long, visible_alias = "dry-run", global = true)]
    pub simulate: bool,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a new array from partitions and add it to the volume group
    Create {
        /// Volume group to extend with the new array
        #[arg(long = "vg")]
        volume_group: String,
        /// Partitions, comma separated (sdb1,sdc1 or /dev/sdb1,...)
        #[arg(short, long, value_delimiter = ',', required = true)]
        partitions: Vec<String>,
        /// RAID level (0, 1, 5, 10)
        #[arg(short, long, default_value_t = RaidLevel::Raid5)]
        level: RaidLevel,
        /// Chunk size in KiB
        #[arg(short, long, default_value_t = DEFAULT_CHUNK_KB)]
        chunk: u32,
        /// Layout (left-symmetric, near=2, ...)
        #[arg(long)]
        layout: Option<String>,
        /// Array device to create (default: first unused /dev/mdN)
        #[arg(short, long)]
        raid: Option<String>,
        /// Write the configuration to a file instead of running it
        #[arg(long)]
        save_config: Option<PathBuf>,
    },
    /// Rebuild an existing array with additional partitions
    Extend {
        /// Volume group the array belongs to
        #[arg(long = "vg")]
        volume_group: String,
        /// Existing array (md0 or /dev/md0)
        #[arg(short, long)]
        raid: String,
        /// Partitions to add, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        partitions: Vec<String>,
        /// Ignored: the array's own level is kept
        #[arg(short, long)]
        level: Option<RaidLevel>,
        /// Chunk size in KiB when the array's own chunk size cannot be read
        #[arg(short, long, default_value_t = DEFAULT_CHUNK_KB)]
        chunk: u32,
        /// Ignored: the array's own layout is kept
        #[arg(long)]
        layout: Option<String>,
        /// Write the configuration to a file instead of running it
        #[arg(long)]
        save_config: Option<PathBuf>,
    },
    /// Detach an array from the volume group, stop it and wipe its members
    Remove {
        /// Volume group the array belongs to
        #[arg(long = "vg")]
        volume_group: String,
        /// Existing array (md0 or /dev/md0)
        #[arg(short, long)]
        raid: String,
        /// Write the configuration to a file instead of running it
        #[arg(long)]
        save_config: Option<PathBuf>,
    },
    /// Run the workflow described by a configuration file
    Apply {
        /// Path to configuration file
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
    /// Print the live topology of an array (read-only)
    Show {
        /// Array device (md0 or /dev/md0)
        raid: String,
    },
}

impl Commands {
    /// Configuration built from flags, for the workflow subcommands.
    pub fn configuration(&self, simulate: bool) -> Option<Configuration> {
        let config = match self {
            Commands::Create {
                volume_group,
                partitions,
                level,
                chunk,
                layout,
                raid,
                ..
            } => {
                let mut config = Configuration::new(Mode::Create, volume_group)
                    .with_partitions(partitions)
                    .with_level(*level)
                    .with_chunk_kb(*chunk);
                config.layout = layout.clone();
                config.array_device = raid.as_deref().map(normalize_device);
                config
            }
            Commands::Extend {
                volume_group,
                raid,
                partitions,
                level,
                chunk,
                layout,
                ..
            } => {
                let mut config = Configuration::new(Mode::Extend, volume_group)
                    .with_array_device(raid)
                    .with_partitions(partitions)
                    .with_chunk_kb(*chunk);
                if let Some(level) = level {
                    config.level = *level;
                }
                config.layout = layout.clone();
                config
            }
            Commands::Remove {
                volume_group, raid, ..
            } => Configuration::new(Mode::Remove, volume_group).with_array_device(raid),
            Commands::Apply { .. } | Commands::Validate { .. } | Commands::Show { .. } => {
                return None;
            }
        };
        Some(config.simulated(simulate))
    }

    /// `--save-config` target, if given
    pub fn save_config(&self) -> Option<&PathBuf> {
        match self {
            Commands::Create { save_config, .. }
            | Commands::Extend { save_config, .. }
            | Commands::Remove { save_config, .. } => save_config.as_ref(),
            _ => None,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["raidgrow"]).is_err());
    }

    #[test]
    fn test_cli_create_defaults() {
        let cli = Cli::try_parse_from(["raidgrow", "create", "--vg", "vg0", "-p", "sdb1,sdc1"])
            .expect("parse");
        let config = cli.command.configuration(cli.simulate).expect("workflow");
        assert_eq!(config.mode, Mode::Create);
        assert_eq!(config.level, RaidLevel::Raid5);
        assert_eq!(config.chunk_kb, 32);
        assert_eq!(
            config.partitions,
            vec![PathBuf::from("/dev/sdb1"), PathBuf::from("/dev/sdc1")]
        );
        assert!(config.array_device.is_none());
        assert!(!config.simulate);
    }

    #[test]
    fn test_cli_create_full() {
        let cli = Cli::try_parse_from([
            "raidgrow", "create", "--vg", "vg0", "--partitions", "/dev/sdb1",
            "--partitions", "sdc1", "--level", "10", "--chunk", "512", "--layout", "near=2",
            "--raid", "md3",
        ])
        .expect("parse");
        let config = cli.command.configuration(false).expect("workflow");
        assert_eq!(config.level, RaidLevel::Raid10);
        assert_eq!(config.chunk_kb, 512);
        assert_eq!(config.layout.as_deref(), Some("near=2"));
        assert_eq!(config.array_device, Some(PathBuf::from("/dev/md3")));
        assert_eq!(config.partitions.len(), 2);
    }

    #[test]
    fn test_cli_rejects_unsupported_level() {
        assert!(
            Cli::try_parse_from(["raidgrow", "create", "--vg", "vg0", "-p", "sdb1", "-l", "6"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_extend_requires_raid() {
        assert!(Cli::try_parse_from(["raidgrow", "extend", "--vg", "vg0", "-p", "sdd1"]).is_err());

        let cli = Cli::try_parse_from([
            "raidgrow", "--dry-run", "extend", "--vg", "vg0", "-r", "md0", "-p", "sdd1",
        ])
        .expect("parse");
        assert!(cli.simulate);
        let config = cli.command.configuration(cli.simulate).expect("workflow");
        assert_eq!(config.mode, Mode::Extend);
        assert_eq!(config.array_device, Some(PathBuf::from("/dev/md0")));
        assert!(config.simulate);
    }

    #[test]
    fn test_cli_simulate_is_global() {
        let cli = Cli::try_parse_from(["raidgrow", "remove", "--vg", "vg0", "-r", "md1", "--simulate"])
            .expect("parse");
        assert!(cli.simulate);
        let config = cli.command.configuration(cli.simulate).expect("workflow");
        assert_eq!(config.mode, Mode::Remove);
        assert!(config.partitions.is_empty());
    }

    #[test]
    fn test_cli_validate_command() {
        let cli = Cli::try_parse_from(["raidgrow", "validate", "/path/to/config.json"])
            .expect("parse");
        match &cli.command {
            Commands::Validate { config } => {
                assert_eq!(config, &PathBuf::from("/path/to/config.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.command.configuration(false).is_none());
    }

    #[test]
    fn test_cli_save_config() {
        let cli = Cli::try_parse_from([
            "raidgrow", "remove", "--vg", "vg0", "-r", "md1", "--save-config", "out.json",
        ])
        .expect("parse");
        assert_eq!(cli.command.save_config(), Some(&PathBuf::from("out.json")));
    }

    #[test]
    fn test_cli_show_command() {
        let cli = Cli::try_parse_from(["raidgrow", "show", "md0"]).expect("parse");
        assert!(matches!(cli.command, Commands::Show { ref raid } if raid == "md0"));
    }
}
