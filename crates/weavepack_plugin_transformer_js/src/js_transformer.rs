use std::ops::Range;
use std::sync::{Arc, LazyLock};

use anyhow::Error;
use regex::{Captures, Regex};

use weavepack_core::plugin::{PluginContext, TransformResult, TransformerPlugin};
use weavepack_core::types::{Asset, Code, Dependency, FileType, Priority, SpecifierType};

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?m)/\*[\s\S]*?\*/|^\s*//[^\n]*").expect("valid comment pattern")
});

static REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"\brequire\s*\(\s*(?:"([^"]+)"|'([^']+)')\s*\)"#).expect("valid require pattern")
});

static STATIC_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"\b(?:import|export)\s+(?:[\w*{}\s,$]+?\s+from\s*)?(?:"([^"]+)"|'([^']+)')"#)
    .expect("valid import pattern")
});

static DYNAMIC_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"\bimport\s*\(\s*(?:"([^"]+)"|'([^']+)')\s*\)"#).expect("valid import() pattern")
});

/// Name the packaged module registry gives its lazy loader
pub const LAZY_LOADER: &str = "require.lazy";

/// Finds `require()`, `import` and `export ... from` specifiers and dynamic `import()` calls
///
/// Specifiers are left as written; the packager maps them per module. Dynamic imports are
/// routed through the module registry's lazy loader.
#[derive(Debug)]
pub struct WeavepackJsTransformerPlugin {}

impl WeavepackJsTransformerPlugin {
  pub fn new(_ctx: &PluginContext) -> Self {
    WeavepackJsTransformerPlugin {}
  }
}

struct Found {
  offset: usize,
  call: Option<Range<usize>>,
  specifier: String,
  priority: Priority,
  specifier_type: SpecifierType,
}

fn specifier(captures: &Captures<'_>) -> Option<String> {
  captures
    .get(1)
    .or_else(|| captures.get(2))
    .map(|m| m.as_str().to_string())
}

fn find_references(code: &str) -> Vec<Found> {
  let comments: Vec<Range<usize>> = COMMENT_RE.find_iter(code).map(|m| m.range()).collect();
  let in_comment = |offset: usize| comments.iter().any(|comment| comment.contains(&offset));

  let patterns: [(&Regex, Priority, SpecifierType); 3] = [
    (&*REQUIRE_RE, Priority::Sync, SpecifierType::CommonJS),
    (&*STATIC_IMPORT_RE, Priority::Sync, SpecifierType::Esm),
    (&*DYNAMIC_IMPORT_RE, Priority::Lazy, SpecifierType::Esm),
  ];

  let mut found = Vec::new();
  for (pattern, priority, specifier_type) in patterns {
    for captures in pattern.captures_iter(code) {
      let (Some(whole), Some(specifier)) = (captures.get(0), specifier(&captures)) else {
        continue;
      };
      if in_comment(whole.start()) {
        continue;
      }

      let call = (priority == Priority::Lazy).then(|| {
        let open = whole.as_str().find('(').unwrap_or(0);
        whole.start()..whole.start() + open
      });

      found.push(Found {
        offset: whole.start(),
        call,
        specifier,
        priority,
        specifier_type,
      });
    }
  }

  found.sort_by_key(|found| found.offset);
  found
}

impl TransformerPlugin for WeavepackJsTransformerPlugin {
  fn transform(&self, input: Asset) -> Result<TransformResult, Error> {
    let code = input.code.as_str()?;
    let found = find_references(code);

    let mut dependencies: Vec<Dependency> = Vec::new();
    let mut output = String::with_capacity(code.len());
    let mut cursor = 0;

    for reference in found {
      if let Some(call) = reference.call {
        output.push_str(&code[cursor..call.start]);
        output.push_str(LAZY_LOADER);
        cursor = call.end;
      }

      let dependency = Dependency {
        priority: reference.priority,
        source_path: Some(input.file_path.clone()),
        source_asset_type: Some(FileType::Js),
        specifier: reference.specifier,
        specifier_type: reference.specifier_type,
      };

      if !dependencies.contains(&dependency) {
        dependencies.push(dependency);
      }
    }
    output.push_str(&code[cursor..]);

    tracing::trace!(
      path = %input.file_path.display(),
      dependencies = dependencies.len(),
      "Transformed js"
    );

    let mut asset = input;
    asset.code = Arc::new(Code::from(output));

    Ok(TransformResult {
      asset,
      dependencies,
    })
  }
}
