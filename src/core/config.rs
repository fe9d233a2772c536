// Core Layer: Engine Configuration
//
// Where the engine comes from, which backend it is asked for and how the
// native log is set up. Built explicitly or read from the environment:
//
// - SPBLA_PATH            explicit library path (wins over discovery)
// - SPBLA_LIB_DIR         directory scanned for the library
//                         (default: directory of the running executable)
// - SPBLA_BACKEND         cpu | cuda | opencl, anything else = engine default
// - SPBLA_LOG_FILE        native log file, logging is off when unset
// - SPBLA_LOG_LEVEL       all | error | warning (default all)
// - SPBLA_GPU_MEM_MANAGED 1 | true

use crate::core::hints::LogHints;
use std::path::PathBuf;

pub const ENV_PATH: &str = "SPBLA_PATH";
pub const ENV_LIB_DIR: &str = "SPBLA_LIB_DIR";
pub const ENV_BACKEND: &str = "SPBLA_BACKEND";
pub const ENV_LOG_FILE: &str = "SPBLA_LOG_FILE";
pub const ENV_LOG_LEVEL: &str = "SPBLA_LOG_LEVEL";
pub const ENV_GPU_MEM_MANAGED: &str = "SPBLA_GPU_MEM_MANAGED";

/// Execution backend requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// No forced backend, the engine selects (cuda, then opencl, then cpu)
    #[default]
    Default,
    Cpu,
    Cuda,
    OpenCl,
}

impl Backend {
    /// Parse a backend name; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "cpu" => Some(Backend::Cpu),
            "cuda" => Some(Backend::Cuda),
            "opencl" => Some(Backend::OpenCl),
            "default" | "" => Some(Backend::Default),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Default => "default",
            Backend::Cpu => "cpu",
            Backend::Cuda => "cuda",
            Backend::OpenCl => "opencl",
        }
    }
}

/// Where the engine implementation comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    /// Load the shared library at this path
    Path(PathBuf),
    /// Scan this directory for the shared library
    Discover(PathBuf),
    /// Use the in-process host engine
    Host,
}

/// Native logging setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub level: LogHints,
}

impl LoggingConfig {
    /// Parse a level name (`all`, `error`, `warning`)
    pub fn level_from_name(name: &str) -> Option<LogHints> {
        let none = LogHints {
            all: false,
            error: false,
            warning: false,
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "all" => Some(LogHints::default()),
            "error" => Some(LogHints {
                error: true,
                ..none
            }),
            "warning" => Some(LogHints {
                warning: true,
                ..none
            }),
            _ => None,
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub source: LibrarySource,
    pub backend: Backend,
    pub logging: Option<LoggingConfig>,
    pub managed_memory: bool,
}

impl EngineConfig {
    /// Configuration for the native library at `path`
    pub fn library(path: impl Into<PathBuf>) -> Self {
        Self::with_source(LibrarySource::Path(path.into()))
    }

    /// Configuration scanning `dir` for the native library
    pub fn discover(dir: impl Into<PathBuf>) -> Self {
        Self::with_source(LibrarySource::Discover(dir.into()))
    }

    /// Configuration for the in-process host engine
    pub fn host() -> Self {
        Self::with_source(LibrarySource::Host)
    }

    fn with_source(source: LibrarySource) -> Self {
        Self {
            source,
            backend: Backend::Default,
            logging: None,
            managed_memory: false,
        }
    }

    /// Select a backend
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Enable native logging into `file`
    pub fn logging(mut self, file: impl Into<PathBuf>, level: LogHints) -> Self {
        self.logging = Some(LoggingConfig {
            file: file.into(),
            level,
        });
        self
    }

    /// Request managed GPU memory
    pub fn managed_memory(mut self, enabled: bool) -> Self {
        self.managed_memory = enabled;
        self
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = match lookup(ENV_PATH) {
            Some(path) if !path.is_empty() => LibrarySource::Path(PathBuf::from(path)),
            _ => LibrarySource::Discover(
                lookup(ENV_LIB_DIR)
                    .filter(|dir| !dir.is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(default_search_dir),
            ),
        };

        let backend = match lookup(ENV_BACKEND) {
            Some(name) => Backend::from_name(&name).unwrap_or_else(|| {
                log::warn!(
                    "Unrecognized {}={:?}, deferring to engine default",
                    ENV_BACKEND,
                    name
                );
                Backend::Default
            }),
            None => Backend::Default,
        };

        let logging = lookup(ENV_LOG_FILE)
            .filter(|file| !file.is_empty())
            .map(|file| {
                let level = lookup(ENV_LOG_LEVEL)
                    .and_then(|name| LoggingConfig::level_from_name(&name))
                    .unwrap_or_default();
                LoggingConfig {
                    file: PathBuf::from(file),
                    level,
                }
            });

        let managed_memory = lookup(ENV_GPU_MEM_MANAGED)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            source,
            backend,
            logging,
            managed_memory,
        }
    }
}

/// Directory of the running executable, falling back to the working directory
fn default_search_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}
