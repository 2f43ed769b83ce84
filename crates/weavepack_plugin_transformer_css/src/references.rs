use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static COMMENT_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"/\*[\s\S]*?\*/").expect("valid comment pattern"));

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r#"@import\s+(?:url\(\s*)?(?:"([^"]*)"|'([^']*)'|([^\s"'();]+))\s*\)?[^;]*(?:;|$)"#,
  )
  .expect("valid import pattern")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^\s"'()]+))\s*\)"#).expect("valid url pattern")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CssReferenceKind {
  /// `@import` rule. The imported sheet is inlined into the importer's bundle.
  Import,
  /// `url()` value, e.g. an image or a font
  Url,
}

#[derive(Debug, PartialEq)]
pub struct CssReference<'a> {
  pub kind: CssReferenceKind,
  pub specifier: &'a str,
}

#[derive(Debug, PartialEq)]
pub enum Replacement {
  Keep,
  Specifier(String),
  /// Drops the whole `@import` rule. Treated as `Keep` for `url()` references.
  RemoveRule,
}

struct Found<'a> {
  kind: CssReferenceKind,
  rule: Range<usize>,
  specifier: regex::Match<'a>,
}

fn specifier<'a>(captures: &Captures<'a>) -> Option<regex::Match<'a>> {
  (1..=3).find_map(|group| captures.get(group))
}

/// Visits every `@import` and `url()` reference outside comments, in source order
///
/// Returns the stylesheet with each reference replaced as directed by `replace`.
pub fn replace_references(
  code: &str,
  mut replace: impl FnMut(&CssReference<'_>) -> Replacement,
) -> String {
  let comments: Vec<Range<usize>> = COMMENT_RE.find_iter(code).map(|m| m.range()).collect();
  let in_comment = |offset: usize| comments.iter().any(|comment| comment.contains(&offset));

  let mut found = Vec::new();
  for captures in IMPORT_RE.captures_iter(code) {
    let (Some(rule), Some(specifier)) = (captures.get(0), specifier(&captures)) else {
      continue;
    };
    if in_comment(rule.start()) {
      continue;
    }

    found.push(Found {
      kind: CssReferenceKind::Import,
      rule: rule.range(),
      specifier,
    });
  }

  let imports: Vec<Range<usize>> = found.iter().map(|found| found.rule.clone()).collect();
  for captures in URL_RE.captures_iter(code) {
    let (Some(rule), Some(specifier)) = (captures.get(0), specifier(&captures)) else {
      continue;
    };
    if in_comment(rule.start()) || imports.iter().any(|import| import.contains(&rule.start())) {
      continue;
    }

    found.push(Found {
      kind: CssReferenceKind::Url,
      rule: rule.range(),
      specifier,
    });
  }

  found.sort_by_key(|found| found.rule.start);

  let mut output = String::with_capacity(code.len());
  let mut cursor = 0;
  for reference in found {
    if reference.specifier.as_str().trim().is_empty() {
      continue;
    }

    let replacement = replace(&CssReference {
      kind: reference.kind,
      specifier: reference.specifier.as_str(),
    });

    let (range, text) = match replacement {
      Replacement::Keep => continue,
      Replacement::Specifier(text) => (reference.specifier.range(), text),
      Replacement::RemoveRule if reference.kind == CssReferenceKind::Import => {
        (reference.rule, String::new())
      }
      Replacement::RemoveRule => continue,
    };

    output.push_str(&code[cursor..range.start]);
    output.push_str(&text);
    cursor = range.end;
  }
  output.push_str(&code[cursor..]);

  output
}

#[cfg(test)]
mod test {
  use indoc::indoc;
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn visits_imports_and_urls_in_source_order() {
    let css = indoc! {r#"
      @import "base.css";
      @import url('theme.css') screen;
      body { background: url(bg.png); }
      /* .unused { background: url(commented.png); } */
      .logo { background-image: url("logo.svg"); }
    "#};

    let mut seen = Vec::new();
    replace_references(css, |reference| {
      seen.push((reference.kind, reference.specifier.to_string()));
      Replacement::Keep
    });

    assert_eq!(
      seen,
      vec![
        (CssReferenceKind::Import, String::from("base.css")),
        (CssReferenceKind::Import, String::from("theme.css")),
        (CssReferenceKind::Url, String::from("bg.png")),
        (CssReferenceKind::Url, String::from("logo.svg")),
      ]
    );
  }

  #[test]
  fn replaces_specifiers_and_removes_rules() {
    let css = indoc! {r#"
      @import "base.css";
      body { background: url("bg.png"); }
    "#};

    let output = replace_references(css, |reference| match reference.kind {
      CssReferenceKind::Import => Replacement::RemoveRule,
      CssReferenceKind::Url => Replacement::Specifier(String::from("/dist/abc.png")),
    });

    assert_eq!(
      output,
      indoc! {r#"

        body { background: url("/dist/abc.png"); }
      "#}
    );
  }
}
