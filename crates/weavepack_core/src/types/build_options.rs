use std::fmt::Display;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// The options passed into weavepack either through the CLI or the programmatic API
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildOptions {
  /// The document the bundle tree is built from
  pub entry: PathBuf,

  /// Root-relative references (`/logo.png`, `~/logo.png`) resolve from here
  pub project_root: PathBuf,

  /// Output directory. Defaults to `<project_root>/dist`.
  pub dist_dir: Option<PathBuf>,

  /// Prefix for rewritten references. Defaults to `/<dist dir name>`.
  pub public_url: Option<String>,

  pub mode: BuildMode,

  /// Adds the hot reload runtime to script and style bundles
  pub hmr: bool,

  pub log_level: LogLevel,

  /// A `.weavepackrc` to use instead of searching from the entry's directory
  pub config: Option<PathBuf>,
}

impl BuildOptions {
  pub fn dist_dir(&self) -> PathBuf {
    self
      .dist_dir
      .clone()
      .unwrap_or_else(|| self.project_root.join("dist"))
  }

  pub fn public_url(&self) -> String {
    if let Some(public_url) = &self.public_url {
      return public_url.clone();
    }

    let dist_dir = self.dist_dir();
    let name = dist_dir
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_default();

    format!("/{name}")
  }

  pub fn should_optimize(&self) -> bool {
    self.mode == BuildMode::Production
  }
}

#[derive(Clone, Debug, Default, Deserialize, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
  #[default]
  Development,
  Production,
}

impl Display for BuildMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      BuildMode::Development => write!(f, "development"),
      BuildMode::Production => write!(f, "production"),
    }
  }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  None,
  Error,
  Warn,
  #[default]
  Info,
  Verbose,
}

impl LogLevel {
  /// The `tracing` filter directive matching this level
  pub fn as_filter(&self) -> &'static str {
    match self {
      LogLevel::None => "off",
      LogLevel::Error => "error",
      LogLevel::Warn => "warn",
      LogLevel::Info => "info",
      LogLevel::Verbose => "debug",
    }
  }
}
