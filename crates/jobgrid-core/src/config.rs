//! jobgrid.toml configuration parser.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Which scheduling backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Self-managed priority queues driven by thread donation.
    Cooperative,
    /// Delegation to an external concurrent thread pool.
    #[default]
    Concurrent,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Cooperative => "cooperative",
            BackendKind::Concurrent => "concurrent",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cooperative" => Ok(BackendKind::Cooperative),
            "concurrent" => Ok(BackendKind::Concurrent),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Top-level jobgrid.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobgridConfig {
    /// `[scheduler]`: backend selection.
    #[serde(default)]
    pub scheduler: SchedulerSection,
    /// `[concurrent]`: tokio service settings, ignored by the cooperative backend.
    #[serde(default)]
    pub concurrent: ConcurrentConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerSection {
    /// Backend to build; `concurrent` when omitted.
    #[serde(default)]
    pub backend: BackendKind,
}

/// Settings for the tokio-backed concurrent service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrentConfig {
    /// Async worker threads driving timers; tokio picks one per core when unset.
    pub worker_threads: Option<usize>,
    /// Upper bound on the blocking pool that runs jobs.
    #[serde(default = "default_max_blocking_threads")]
    pub max_blocking_threads: usize,
    /// Name given to every runtime thread.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
    /// Name of the designated serial (main) context thread.
    #[serde(default = "default_main_thread_name")]
    pub main_thread_name: String,
}

fn default_max_blocking_threads() -> usize {
    64
}

fn default_thread_name() -> String {
    "jobgrid-worker".to_string()
}

fn default_main_thread_name() -> String {
    "jobgrid-main".to_string()
}

impl Default for ConcurrentConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_blocking_threads: default_max_blocking_threads(),
            thread_name: default_thread_name(),
            main_thread_name: default_main_thread_name(),
        }
    }
}

impl JobgridConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: JobgridConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings the concurrent service cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.concurrent.worker_threads == Some(0) {
            anyhow::bail!("concurrent.worker_threads must be at least 1");
        }
        if self.concurrent.max_blocking_threads == 0 {
            anyhow::bail!("concurrent.max_blocking_threads must be at least 1");
        }
        Ok(())
    }

    /// Scaffold a config with every field spelled out.
    pub fn scaffold(backend: BackendKind) -> Self {
        JobgridConfig {
            scheduler: SchedulerSection { backend },
            concurrent: ConcurrentConfig {
                worker_threads: Some(4),
                ..ConcurrentConfig::default()
            },
        }
    }
}
