use std::time::Duration;

use pixarify_core::phase::PhasePlan;
use pixarify_pipeline::backend::DEFAULT_ANIMATION_URL_BASE;
use pixarify_pipeline::RunnerConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Animation job tuning.
    pub jobs: JobConfig,
}

/// Animation job settings: phase pacing, backend timeout and retention.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Pause after each phase in milliseconds (default: `3000`).
    pub phase_delay_ms: u64,
    /// Upper bound on one backend call in seconds (default: `60`).
    pub phase_timeout_secs: u64,
    /// How long finished jobs stay queryable, in seconds (default: `3600`).
    pub retention_secs: u64,
    /// How often the retention sweeper runs, in seconds (default: `60`).
    pub retention_sweep_secs: u64,
    /// Base path for animation URLs (default: `/animation-complete`).
    pub animation_url_base: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `PHASE_DELAY_MS`           | `3000`                     |
    /// | `PHASE_TIMEOUT_SECS`       | `60`                       |
    /// | `JOB_RETENTION_SECS`       | `3600`                     |
    /// | `JOB_RETENTION_SWEEP_SECS` | `60`                       |
    /// | `ANIMATION_URL_BASE`       | `/animation-complete`      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let jobs = JobConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jobs,
        }
    }
}

impl JobConfig {
    pub fn from_env() -> Self {
        let phase_delay_ms: u64 = std::env::var("PHASE_DELAY_MS")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PHASE_DELAY_MS must be a valid u64");

        let phase_timeout_secs: u64 = std::env::var("PHASE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("PHASE_TIMEOUT_SECS must be a valid u64");

        let retention_secs: u64 = std::env::var("JOB_RETENTION_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("JOB_RETENTION_SECS must be a valid u64");

        let retention_sweep_secs: u64 = std::env::var("JOB_RETENTION_SWEEP_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("JOB_RETENTION_SWEEP_SECS must be a valid u64");

        let animation_url_base = std::env::var("ANIMATION_URL_BASE")
            .unwrap_or_else(|_| DEFAULT_ANIMATION_URL_BASE.into());

        Self {
            phase_delay_ms,
            phase_timeout_secs,
            retention_secs,
            retention_sweep_secs,
            animation_url_base,
        }
    }

    /// The default phase plan paced by `phase_delay_ms`.
    pub fn phase_plan(&self) -> PhasePlan {
        PhasePlan::with_delay(Duration::from_millis(self.phase_delay_ms))
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            phase_timeout: Duration::from_secs(self.phase_timeout_secs),
        }
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn retention_sweep_interval(&self) -> Duration {
        // A zero period would make `tokio::time::interval` panic.
        Duration::from_secs(self.retention_sweep_secs.max(1))
    }
}
