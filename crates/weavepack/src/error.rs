use anyhow::anyhow;
use serde::Serialize;
use weavepack_core::types::Diagnostic;
use weavepack_core::types::Diagnostics;

/// A build failure in the shape reported to users
#[derive(Debug)]
pub enum WeavepackError {
  Diagnostic(Diagnostic),
  Diagnostics(Diagnostics),
  Unknown(String),
}

impl Serialize for WeavepackError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    match self {
      WeavepackError::Diagnostic(diagnostic) => diagnostic.serialize(serializer),
      WeavepackError::Diagnostics(diagnostics) => diagnostics.serialize(serializer),
      WeavepackError::Unknown(message) => message.serialize(serializer),
    }
  }
}

impl std::fmt::Display for WeavepackError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      WeavepackError::Diagnostic(diagnostic) => write!(f, "{diagnostic}"),
      WeavepackError::Diagnostics(diagnostics) => write!(f, "{diagnostics}"),
      WeavepackError::Unknown(message) => write!(f, "{message}"),
    }
  }
}

impl From<&anyhow::Error> for WeavepackError {
  fn from(error: &anyhow::Error) -> Self {
    if let Some(diagnostic) = error.downcast_ref::<Diagnostic>() {
      Self::Diagnostic(diagnostic.clone())
    } else if let Some(diagnostics) = error.downcast_ref::<Diagnostics>() {
      Self::Diagnostics(diagnostics.clone())
    } else if let Some(message) = error.downcast_ref::<String>() {
      Self::Unknown(message.clone())
    } else {
      Self::Unknown(format!("{error:#}"))
    }
  }
}

impl From<WeavepackError> for anyhow::Error {
  fn from(value: WeavepackError) -> Self {
    match value {
      WeavepackError::Diagnostic(diagnostic) => anyhow!(diagnostic),
      WeavepackError::Diagnostics(diagnostics) => anyhow!(diagnostics),
      WeavepackError::Unknown(message) => anyhow!(message),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use weavepack_core::types::ErrorKind;

  use super::*;

  #[test]
  fn recovers_diagnostics_from_anyhow() {
    let error = anyhow!(Diagnostic::resolution(
      "missing.js",
      Some(PathBuf::from("/project/index.html"))
    ));

    let WeavepackError::Diagnostic(diagnostic) = WeavepackError::from(&error) else {
      panic!("Expected a diagnostic");
    };

    assert_eq!(diagnostic.kind, ErrorKind::Resolution);
    assert_eq!(
      serde_json::to_value(WeavepackError::Diagnostic(diagnostic))
        .unwrap()
        .get("kind")
        .and_then(|kind| kind.as_str()),
      Some("Resolution")
    );
  }

  #[test]
  fn falls_back_to_the_error_message() {
    let error = anyhow!("boom").context("while building");

    assert_eq!(
      WeavepackError::from(&error).to_string(),
      "while building: boom"
    );
  }
}
