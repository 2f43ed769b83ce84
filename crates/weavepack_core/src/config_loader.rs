use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use weavepack_filesystem::search::find_ancestor_file;
use weavepack_filesystem::FileSystemRef;

use crate::types::{Diagnostic, ErrorKind};

pub type ConfigLoaderRef = Arc<ConfigLoader>;

/// Loads JSON config files such as `.weavepackrc` and `.htmlnanorc`
#[derive(Debug)]
pub struct ConfigLoader {
  pub fs: FileSystemRef,
  pub project_root: PathBuf,
  pub search_path: PathBuf,
}

#[derive(Debug, PartialEq)]
pub struct ConfigFile<T> {
  pub contents: T,
  pub path: PathBuf,
  pub raw: String,
}

impl ConfigLoader {
  pub fn load_json_config<Config: DeserializeOwned>(
    &self,
    filename: &str,
  ) -> Result<ConfigFile<Config>, anyhow::Error> {
    let path = find_ancestor_file(
      &*self.fs,
      &[filename],
      &self.search_path,
      &self.project_root,
    )
    .ok_or_else(|| Diagnostic {
      kind: ErrorKind::NotFound,
      message: format!(
        "Unable to locate {filename} config file from {}",
        self.search_path.display()
      ),
      origin: Some(String::from("weavepack::config_loader")),
      ..Diagnostic::default()
    })?;

    let code = self.fs.read_to_string(&path)?;

    let contents = serde_json::from_str::<Config>(&code).map_err(|error| Diagnostic {
      kind: ErrorKind::InvalidConfig,
      message: format!("Error parsing {}: {error}", path.display()),
      origin: Some(String::from("weavepack::config_loader")),
      file_path: Some(path.clone()),
      hints: None,
    })?;

    Ok(ConfigFile {
      contents,
      path,
      raw: code,
    })
  }

  /// Like `load_json_config`, but a missing file is `None` rather than an error
  pub fn load_optional_json_config<Config: DeserializeOwned>(
    &self,
    filename: &str,
  ) -> Result<Option<ConfigFile<Config>>, anyhow::Error> {
    match self.load_json_config(filename) {
      Ok(config) => Ok(Some(config)),
      Err(err)
        if err
          .downcast_ref::<Diagnostic>()
          .is_some_and(|d| d.kind == ErrorKind::NotFound) =>
      {
        Ok(None)
      }
      Err(err) => Err(err),
    }
  }
}
