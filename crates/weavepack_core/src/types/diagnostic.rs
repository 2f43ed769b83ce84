use std::fmt::Display;
use std::fmt::Formatter;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
  /// A local reference could not be matched to a file
  Resolution,
  /// A parser or transformer failed
  Transform,
  NotFound,
  InvalidConfig,
  #[default]
  Unknown,
}

/// This is a user facing error for weavepack.
///
/// Usually but not always this is linked to a file.
#[derive(Error, Debug, Deserialize, PartialEq, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
  pub kind: ErrorKind,

  /// A summary user-facing message
  pub message: String,

  /// Indicates where this diagnostic was emitted from
  pub origin: Option<String>,

  /// The file the diagnostic refers to
  pub file_path: Option<PathBuf>,

  /// Hints for the user
  pub hints: Option<Vec<String>>,
}

impl Display for Diagnostic {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.message)
  }
}

impl Diagnostic {
  pub fn resolution(specifier: &str, from: Option<PathBuf>) -> Self {
    let message = match &from {
      Some(from) => format!("Failed to resolve '{specifier}' from '{}'", from.display()),
      None => format!("Failed to resolve '{specifier}'"),
    };

    Diagnostic {
      kind: ErrorKind::Resolution,
      message,
      origin: Some(String::from("weavepack::resolver")),
      file_path: from,
      hints: None,
    }
  }

  pub fn transform(file_path: PathBuf, error: &anyhow::Error) -> Self {
    Diagnostic {
      kind: ErrorKind::Transform,
      message: format!("Failed to transform '{}': {error:#}", file_path.display()),
      origin: Some(String::from("weavepack::transformer")),
      file_path: Some(file_path),
      hints: None,
    }
  }

  pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
    self.hints.get_or_insert_with(Vec::new).push(hint.into());
    self
  }
}

#[derive(Error, Default, Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
  pub fn as_ref(&self) -> &Vec<Diagnostic> {
    &self.0
  }

  pub fn into_inner(self) -> Vec<Diagnostic> {
    self.0
  }
}

impl Display for Diagnostics {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for diagnostic in &self.0 {
      writeln!(f, "{}", diagnostic)?;
    }
    Ok(())
  }
}

impl Serialize for Diagnostics {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    self.0.serialize(serializer)
  }
}

impl From<Vec<Diagnostic>> for Diagnostics {
  fn from(diagnostics: Vec<Diagnostic>) -> Self {
    Diagnostics(diagnostics)
  }
}

impl From<Diagnostic> for Diagnostics {
  fn from(diagnostic: Diagnostic) -> Self {
    Diagnostics(vec![diagnostic])
  }
}
