use std::path::PathBuf;

use serde::Deserialize;
use weavepack_core::config_loader::{ConfigFile, ConfigLoader};
use weavepack_core::types::{BuildMode, BuildOptions, Diagnostic, ErrorKind};

pub const WEAVEPACK_RC: &str = ".weavepackrc";

/// Project defaults from `.weavepackrc`
///
/// Values given on the command line or through the API take precedence.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct WeavepackRc {
  pub dist_dir: Option<PathBuf>,
  pub public_url: Option<String>,
  pub hmr: Option<bool>,
  pub mode: Option<BuildMode>,
}

impl WeavepackRc {
  /// Loads the explicit config file from the options, or the closest `.weavepackrc`
  pub fn load(
    loader: &ConfigLoader,
    options: &BuildOptions,
  ) -> anyhow::Result<Option<ConfigFile<WeavepackRc>>> {
    let Some(path) = &options.config else {
      return loader.load_optional_json_config::<WeavepackRc>(WEAVEPACK_RC);
    };

    let raw = loader.fs.read_to_string(path).map_err(|error| Diagnostic {
      kind: ErrorKind::NotFound,
      message: format!("Unable to read config file {}: {error}", path.display()),
      origin: Some(String::from("weavepack::config")),
      file_path: Some(path.clone()),
      hints: None,
    })?;

    let contents = serde_json::from_str::<WeavepackRc>(&raw).map_err(|error| Diagnostic {
      kind: ErrorKind::InvalidConfig,
      message: format!("Error parsing {}: {error}", path.display()),
      origin: Some(String::from("weavepack::config")),
      file_path: Some(path.clone()),
      hints: None,
    })?;

    Ok(Some(ConfigFile {
      contents,
      path: path.clone(),
      raw,
    }))
  }

  /// Fills in the options that were left unset
  ///
  /// Flags can only be switched on from here: `hmr` or production mode set by the caller stay
  /// set.
  pub fn apply(self, options: &mut BuildOptions) {
    if options.dist_dir.is_none() {
      options.dist_dir = self
        .dist_dir
        .map(|dist_dir| options.project_root.join(dist_dir));
    }

    if options.public_url.is_none() {
      options.public_url = self.public_url;
    }

    if !options.hmr {
      options.hmr = self.hmr.unwrap_or_default();
    }

    if options.mode == BuildMode::Development {
      if let Some(mode) = self.mode {
        options.mode = mode;
      }
    }
  }
}
