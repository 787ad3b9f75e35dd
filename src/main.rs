//! raidgrow - main entry point

use anyhow::Context;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use raidgrow::cli::{Cli, Commands};
use raidgrow::config::{normalize_device, DEFAULT_CHUNK_KB};
use raidgrow::{
    layout, process_guard, sanity, Configuration, HostProbe, OrchestrationEngine, RaidError,
    SystemExecutor, TopologyReader,
};

/// Initialize logging: stderr, `info` by default, `debug` with --verbose,
/// RUST_LOG overrides both.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);
    debug!("CLI arguments parsed");

    // A signal defers to the running step instead of killing it
    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }

    let code = match run(&cli) {
        Ok(()) => 0,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("✗ {:#}", err);
            exit_code(&err)
        }
    };
    std::process::exit(code);
}

/// Validation failures exit 1, discovery failures 2, step failures 3.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<RaidError>()
        .map(RaidError::exit_code)
        .unwrap_or(1)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Validate { config } => {
            info!("Validating configuration file: {:?}", config);
            let config = Configuration::load_from_file(config)?;
            config.validate()?;
            println!("✓ Configuration file is valid ({} mode)", config.mode);
            Ok(())
        }
        Commands::Apply { config: path } => {
            info!("Running workflow from configuration file: {:?}", path);
            let mut config = Configuration::load_from_file(path)?;
            config.simulate |= cli.simulate;
            run_workflow(config)
        }
        Commands::Show { raid } => show_topology(raid),
        command => {
            let config = command
                .configuration(cli.simulate)
                .context("subcommand does not describe a workflow")?;
            match command.save_config() {
                Some(path) => save_config(&config, path),
                None => run_workflow(config),
            }
        }
    }
}

fn save_config(config: &Configuration, path: &Path) -> anyhow::Result<()> {
    config.validate()?;
    config.save_to_file(path)?;
    println!("✓ Configuration saved to {}", path.display());
    Ok(())
}

fn run_workflow(config: Configuration) -> anyhow::Result<()> {
    config.validate()?;
    sanity::run_preflight_checks(config.simulate)?;

    if config.simulate {
        println!("Simulation mode: commands are printed, not executed");
    }

    let mut engine =
        OrchestrationEngine::new(config, SystemExecutor, HostProbe::default()).with_echo(true);
    let report = engine.run()?;

    println!();
    println!("{}", report.summary());
    Ok(())
}

fn show_topology(raid: &str) -> anyhow::Result<()> {
    let device = normalize_device(raid);
    let probe = HostProbe::default();
    let topology = TopologyReader::new(&probe).read_topology(&device, DEFAULT_CHUNK_KB)?;
    let resolved = layout::resolve_optional(topology.level, topology.layout.as_deref())?;

    println!("Array:   {}", topology.device.display());
    println!("Level:   {}", topology.level);
    if topology.level.uses_chunk() {
        println!("Chunk:   {} KiB", topology.chunk_kb);
    }
    if let (Some(raw), Some(resolved)) = (&topology.layout, &resolved) {
        println!("Layout:  {} ({})", raw, resolved);
    }
    println!("Members: {}", topology.members.join(" "));
    Ok(())
}
