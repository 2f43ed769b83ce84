//! Configures tracing output for the weavepack CLI.
//!
//! Monitoring should only be initialized once per process.
use std::sync::Mutex;

pub use from_env::FromEnvError;
pub use tracer::TracerMode;

mod from_env;
mod tracer;

pub static MONITORING_GUARD: Mutex<Option<MonitoringGuard>> = Mutex::new(None);

pub struct MonitoringGuard {
  #[allow(unused)]
  tracer: tracer::Tracer,
}

#[derive(Debug)]
pub struct MonitoringOptions {
  pub tracing_options: Vec<TracerMode>,
  /// Filter used when `RUST_LOG` is not set, e.g. `info`
  pub default_filter: String,
}

impl MonitoringOptions {
  pub fn from_env(default_filter: &str) -> Result<Self, FromEnvError> {
    Ok(Self {
      tracing_options: TracerMode::from_env()?,
      default_filter: default_filter.to_string(),
    })
  }
}

pub fn initialize_monitoring(options: MonitoringOptions) -> anyhow::Result<()> {
  let mut global = MONITORING_GUARD
    .lock()
    .map_err(|_| anyhow::anyhow!("Monitoring lock poisoned"))?;

  if global.is_some() {
    tracing::warn!("Monitoring is getting set-up twice, this will no-op");
    return Ok(());
  }

  let tracer = tracer::Tracer::new(&options.tracing_options, &options.default_filter)?;
  *global = Some(MonitoringGuard { tracer });

  Ok(())
}

/// Drops the tracer guards, flushing any buffered log lines
pub fn close_monitoring() {
  if let Ok(mut global) = MONITORING_GUARD.lock() {
    global.take();
  }
}
