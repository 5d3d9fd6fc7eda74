//! Command dispatch: wires settings, services and output together

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, instrument};

use crate::application::services::LoadReport;
use crate::application::EventLog;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_dir, global_config_path, local_config_path, Settings};
use crate::domain::{AvlTree, TreeDisplay};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

/// Overrides collected from `simulate` flags.
#[derive(Debug, Default)]
struct SimulateOverrides {
    catalog: Option<PathBuf>,
    seed: Option<u64>,
    delay_ms: Option<u64>,
    max_cycles: Option<u64>,
    snapshots: bool,
    log: Option<PathBuf>,
    out: Option<PathBuf>,
}

impl SimulateOverrides {
    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(catalog) = self.catalog {
            settings.catalog = catalog;
        }
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        if let Some(delay) = self.delay_ms {
            settings.step_delay_ms = delay;
        }
        if let Some(max) = self.max_cycles {
            settings.max_cycles = Some(max);
        }
        if self.snapshots {
            settings.snapshot_each_removal = true;
        }
        if let Some(log) = self.log {
            settings.log_file = log;
        }
        if let Some(out) = self.out {
            settings.output_dir = out;
        }
        settings
    }
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let config_dir = resolve_config_dir(cli.config_dir.as_deref())?;

    match &cli.command {
        Some(Commands::Simulate {
            catalog,
            seed,
            delay_ms,
            max_cycles,
            snapshots,
            log,
            out,
        }) => {
            let overrides = SimulateOverrides {
                catalog: catalog.clone(),
                seed: *seed,
                delay_ms: *delay_ms,
                max_cycles: *max_cycles,
                snapshots: *snapshots,
                log: log.clone(),
                out: out.clone(),
            };
            cmd_simulate(&config_dir, overrides)
        }
        Some(Commands::Load { catalog }) => cmd_load(&config_dir, catalog),
        Some(Commands::Dot { catalog, output }) => cmd_dot(&config_dir, catalog, output.as_deref()),
        Some(Commands::Tree { catalog }) => cmd_tree(&config_dir, catalog),
        Some(Commands::Config { command }) => cmd_config(&config_dir, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `stockavl --help`".into(),
        )),
    }
}

fn resolve_config_dir(dir: Option<&Path>) -> CliResult<PathBuf> {
    match dir {
        Some(dir) if !dir.is_dir() => Err(CliError::InvalidArgs(format!(
            "config directory does not exist: {}",
            dir.display()
        ))),
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir().map_err(|e| InfraError::io("get current directory", e).into()),
    }
}

fn container(config_dir: &Path) -> CliResult<ServiceContainer> {
    let settings = Settings::load(Some(config_dir))?;
    Ok(ServiceContainer::new(settings))
}

/// Build a tree from `catalog` without writing a log file.
fn load_quiet(container: &ServiceContainer, catalog: &Path) -> CliResult<(AvlTree, LoadReport)> {
    let mut tree = AvlTree::new();
    let mut log = EventLog::silent();
    let report = container
        .catalog_service()
        .load(catalog, &mut tree, &mut log)?;
    Ok((tree, report))
}

fn print_load_summary(report: &LoadReport) {
    output::detail(format!(
        "inserted {}, duplicates {}, no stock {}, malformed {}",
        report.inserted, report.duplicates, report.skipped, report.malformed
    ));
    if report.malformed > 0 {
        output::warning(&format!(
            "{} malformed line(s) skipped",
            report.malformed
        ));
    }
}

#[instrument(level = "debug", skip(overrides))]
fn cmd_simulate(config_dir: &Path, overrides: SimulateOverrides) -> CliResult<()> {
    let settings = overrides.apply(Settings::load(Some(config_dir))?);
    debug!(?settings, "effective settings");
    let container = ServiceContainer::new(settings);
    let settings = &container.settings;

    let mut log = EventLog::console().with_file(container.fs.as_ref(), &settings.log_file)?;
    let mut tree = AvlTree::new();
    let loaded = container
        .catalog_service()
        .load(&settings.catalog, &mut tree, &mut log)?;

    let initial = settings.initial_export_path();
    container.export_service().write_dot(&tree, &initial)?;
    log.record(format!("Initial structure exported to {}", initial.display()));

    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let report = container
        .simulation_service()
        .run(&mut tree, &loaded.codes, &mut rng, &mut log);
    log.flush();

    output::header("Summary");
    output::detail(format!("cycles: {}", report.cycles));
    output::detail(format!("units sold: {}", report.sales));
    output::detail(format!("out-of-stock draws: {}", report.out_of_stock));
    output::detail(format!("items removed: {}", report.removals));
    if report.completed {
        output::success("inventory fully consumed");
    } else {
        output::warning(&format!(
            "simulation stopped with {} record(s) left",
            tree.count()
        ));
    }
    output::action("Log", &settings.log_file.display());
    Ok(())
}

#[instrument(level = "debug")]
fn cmd_load(config_dir: &Path, catalog: &Path) -> CliResult<()> {
    let container = container(config_dir)?;
    let (tree, report) = load_quiet(&container, catalog)?;

    output::header(format!("{} ({} records, height {})", catalog.display(), tree.count(), tree.height()));
    for record in &tree {
        output::detail(record);
    }
    print_load_summary(&report);
    Ok(())
}

#[instrument(level = "debug")]
fn cmd_dot(config_dir: &Path, catalog: &Path, target: Option<&Path>) -> CliResult<()> {
    let container = container(config_dir)?;
    let (tree, _) = load_quiet(&container, catalog)?;

    match target {
        Some(path) => {
            container.export_service().write_dot(&tree, path)?;
            output::action("Exported", &path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            tree.export_structure(&mut handle)
                .and_then(|()| handle.flush())
                .map_err(|e| InfraError::io("write DOT to stdout", e))?;
        }
    }
    Ok(())
}

#[instrument(level = "debug")]
fn cmd_tree(config_dir: &Path, catalog: &Path) -> CliResult<()> {
    let container = container(config_dir)?;
    let (tree, _) = load_quiet(&container, catalog)?;
    output::info(tree.to_tree_string());
    Ok(())
}

fn cmd_config(config_dir: &Path, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(config_dir))?;
            output::info(settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".into())
                })?
            } else {
                local_config_path(config_dir)
            };
            let fs = RealFileSystem;
            if fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            fs.ensure_parent(&path)
                .and_then(|()| fs.write(&path, &Settings::template()))
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_dir() {
                Some(dir) => output::detail(format!("global: {}", dir.join("stockavl.toml").display())),
                None => output::detail("global: (unavailable)"),
            }
            output::detail(format!("local:  {}", local_config_path(config_dir).display()));
            Ok(())
        }
    }
}
