//! Runtime code embedded in the bundler and added to the asset graph on demand.
//!
//! Builtins live under a virtual directory that never exists on disk, so the classifier and
//! resolver treat them like project files without ever touching the file system.
use std::path::{Path, PathBuf};

use weavepack_plugin_transformer_css::CSS_LOADER_SPECIFIER;

/// Directory builtin runtime assets are addressed from
pub const BUILTIN_DIR: &str = "/@weavepack/runtime";

/// Module registry written at the top of every script bundle
pub const PRELUDE: &str = include_str!("./runtime/prelude.js");

const BUNDLE_URL: (&str, &str) = ("bundle-url.js", include_str!("./runtime/bundle-url.js"));
const CSS_LOADER: (&str, &str) = ("css-loader.js", include_str!("./runtime/css-loader.js"));
const HMR_RUNTIME: (&str, &str) = ("hmr-runtime.js", include_str!("./runtime/hmr-runtime.js"));

const BUILTINS: [(&str, &str); 3] = [BUNDLE_URL, CSS_LOADER, HMR_RUNTIME];

/// Maps a bare builtin specifier such as `_css_loader` to its path
pub fn builtin_path(specifier: &str) -> Option<PathBuf> {
  match specifier {
    CSS_LOADER_SPECIFIER => Some(Path::new(BUILTIN_DIR).join(CSS_LOADER.0)),
    _ => None,
  }
}

pub fn is_builtin(path: &Path) -> bool {
  path.starts_with(BUILTIN_DIR)
}

pub fn builtin_source(path: &Path) -> Option<&'static str> {
  if !is_builtin(path) {
    return None;
  }

  let name = path.file_name()?.to_str()?;
  BUILTINS
    .iter()
    .find(|(builtin, _)| *builtin == name)
    .map(|(_, source)| *source)
}

pub fn hmr_runtime_path() -> PathBuf {
  Path::new(BUILTIN_DIR).join(HMR_RUNTIME.0)
}
