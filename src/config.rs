//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/stockavl/stockavl.toml`
//! 3. Local config: `<dir>/.stockavl.toml` (working directory by default)
//! 4. Environment variables: `STOCKAVL_*` prefix

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::SimulationOptions;
use crate::application::ApplicationError;

/// Name of the DOT file written before the simulation starts.
pub const INITIAL_EXPORT_FILE: &str = "initial.dot";

/// Unified configuration for stockavl.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Catalog loaded when no file is given on the command line
    pub catalog: PathBuf,
    /// Event log file, replaced on every run
    pub log_file: PathBuf,
    /// Directory for DOT exports
    pub output_dir: PathBuf,
    /// Pause between simulation cycles, in milliseconds
    pub step_delay_ms: u64,
    /// Optional cap on simulation cycles
    pub max_cycles: Option<u64>,
    /// Export a DOT snapshot after every removal
    pub snapshot_each_removal: bool,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("catalogo.csv"),
            log_file: PathBuf::from("log_avl.txt"),
            output_dir: PathBuf::from("."),
            step_delay_ms: 0,
            max_cycles: None,
            snapshot_each_removal: false,
            seed: None,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub catalog: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub step_delay_ms: Option<u64>,
    pub max_cycles: Option<u64>,
    pub snapshot_each_removal: Option<bool>,
    pub seed: Option<u64>,
}

/// Get the XDG config directory for stockavl.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "stockavl").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("stockavl.toml"))
}

/// Get the path to the local config file in `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".stockavl.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input as is.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(expand_env_vars(path.to_string_lossy().as_ref()))
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.catalog = expand_path(&self.catalog);
        self.log_file = expand_path(&self.log_file);
        self.output_dir = expand_path(&self.output_dir);
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            catalog: overlay
                .catalog
                .clone()
                .unwrap_or_else(|| self.catalog.clone()),
            log_file: overlay
                .log_file
                .clone()
                .unwrap_or_else(|| self.log_file.clone()),
            output_dir: overlay
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            step_delay_ms: overlay.step_delay_ms.unwrap_or(self.step_delay_ms),
            max_cycles: overlay.max_cycles.or(self.max_cycles),
            snapshot_each_removal: overlay
                .snapshot_each_removal
                .unwrap_or(self.snapshot_each_removal),
            seed: overlay.seed.or(self.seed),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory holding `.stockavl.toml`; `None` skips the local layer
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply STOCKAVL_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("STOCKAVL")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("catalog") {
            settings.catalog = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("log_file") {
            settings.log_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("output_dir") {
            settings.output_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get::<u64>("step_delay_ms") {
            settings.step_delay_ms = val;
        }
        if let Ok(val) = config.get::<u64>("max_cycles") {
            settings.max_cycles = Some(val);
        }
        if let Ok(val) = config.get::<bool>("snapshot_each_removal") {
            settings.snapshot_each_removal = val;
        }
        if let Ok(val) = config.get::<u64>("seed") {
            settings.seed = Some(val);
        }

        Ok(settings)
    }

    /// Where the pre-simulation DOT export goes.
    pub fn initial_export_path(&self) -> PathBuf {
        self.output_dir.join(INITIAL_EXPORT_FILE)
    }

    pub fn simulation_options(&self) -> SimulationOptions {
        SimulationOptions {
            step_delay: Duration::from_millis(self.step_delay_ms),
            max_cycles: self.max_cycles,
            snapshot_dir: self
                .snapshot_each_removal
                .then(|| self.output_dir.join("steps")),
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# stockavl configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/stockavl/stockavl.toml
#   Local:  ./.stockavl.toml
#   Env:    STOCKAVL_* environment variables (e.g. STOCKAVL_STEP_DELAY_MS=200)

# Catalog used when none is given on the command line
# catalog = "catalogo.csv"

# Event log, replaced on every run
# log_file = "log_avl.txt"

# Directory for DOT exports (initial.dot, steps/step_<n>.dot)
# output_dir = "."

# Pause between simulation cycles in milliseconds
# step_delay_ms = 200

# Stop after this many cycles
# max_cycles = 10000

# Export a DOT snapshot after every removal
# snapshot_each_removal = false

# Fixed seed for reproducible simulations
# seed = 42
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
