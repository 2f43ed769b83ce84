use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Error;
use html5ever::serialize::SerializeOpts;
use html5ever::tendril::TendrilSink;
use html5ever::{serialize, ParseOpts};
use markup5ever_rcdom::{RcDom, SerializableHandle};

use weavepack_core::plugin::{PluginContext, TransformResult, TransformerPlugin};
use weavepack_core::types::{Asset, Code, Dependency, FileType, Priority, SpecifierType};

use crate::references::{rewrite_references, HtmlReference};

/// Finds the references of a document and swaps each one for its dependency id
#[derive(Debug)]
pub struct WeavepackHtmlTransformerPlugin {}

impl WeavepackHtmlTransformerPlugin {
  pub fn new(_ctx: &PluginContext) -> Self {
    WeavepackHtmlTransformerPlugin {}
  }
}

impl TransformerPlugin for WeavepackHtmlTransformerPlugin {
  fn transform(&self, input: Asset) -> Result<TransformResult, Error> {
    let dom = parse_html(input.code.bytes())?;
    let dependencies = collect_dependencies(&dom, Some(input.file_path.clone()));

    tracing::trace!(
      path = %input.file_path.display(),
      dependencies = dependencies.len(),
      "Transformed html"
    );

    let mut asset = input;
    asset.code = Arc::new(Code::new(serialize_html(dom)?));

    Ok(TransformResult {
      asset,
      dependencies,
    })
  }
}

/// Navigations load later; everything else a document references loads alongside it
fn priority(reference: &HtmlReference<'_>) -> Priority {
  match reference.element {
    "a" | "iframe" => Priority::Lazy,
    _ => Priority::Parallel,
  }
}

fn collect_dependencies(dom: &RcDom, source_path: Option<PathBuf>) -> Vec<Dependency> {
  let mut dependencies: Vec<Dependency> = Vec::new();

  rewrite_references(dom.document.clone(), |reference| {
    let dependency = Dependency {
      priority: priority(reference),
      source_path: source_path.clone(),
      source_asset_type: Some(FileType::Html),
      specifier: reference.value.to_string(),
      specifier_type: SpecifierType::Url,
    };

    let dependency_id = dependency.id();
    if !dependencies.contains(&dependency) {
      dependencies.push(dependency);
    }

    Some(dependency_id)
  });

  dependencies
}

pub fn serialize_html(dom: RcDom) -> Result<Vec<u8>, Error> {
  let document: SerializableHandle = dom.document.clone().into();
  let mut output_bytes = vec![];
  let options = SerializeOpts::default();
  serialize(&mut output_bytes, &document, options)?;
  Ok(output_bytes)
}

pub fn parse_html(bytes: &[u8]) -> Result<RcDom, Error> {
  let mut bytes = BufReader::new(bytes);
  let options = ParseOpts::default();
  let dom = RcDom::default();
  let dom = html5ever::parse_document(dom, options)
    .from_utf8()
    .read_from(&mut bytes)?;
  Ok(dom)
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  fn transform(html: &str) -> (String, Vec<Dependency>) {
    let dom = parse_html(html.trim().as_bytes()).unwrap();
    let dependencies = collect_dependencies(&dom, Some(PathBuf::from("/project/index.html")));
    let html = String::from_utf8(serialize_html(dom).unwrap()).unwrap();
    (html, dependencies)
  }

  fn specifiers(dependencies: &[Dependency]) -> Vec<&str> {
    dependencies
      .iter()
      .map(|dependency| dependency.specifier.as_str())
      .collect()
  }

  #[test]
  fn transforms_external_script_tag() {
    let (html, dependencies) = transform(
      r#"
        <html>
          <body>
            <script src="input.js"></script>
          </body>
        </html>
      "#,
    );

    assert_eq!(specifiers(&dependencies), vec!["input.js"]);
    assert_eq!(dependencies[0].priority, Priority::Parallel);
    assert_eq!(dependencies[0].specifier_type, SpecifierType::Url);
    assert!(html.contains(&format!(r#"<script src="{}"></script>"#, dependencies[0].id())));
    assert!(!html.contains("input.js"));
  }

  #[test]
  fn finds_references_in_source_order() {
    let (_, dependencies) = transform(
      r#"
        <!DOCTYPE html>
        <html>
          <head>
            <link rel="stylesheet" href="index.css">
          </head>
          <body>
            <a href="other.html">Other page</a>
            <img src="logo.png" srcset="logo@2x.png 2x">
            <video poster="poster.jpg"><source src="movie.webm"></video>
            <script src="index.js"></script>
          </body>
        </html>
      "#,
    );

    assert_eq!(
      specifiers(&dependencies),
      vec![
        "index.css",
        "other.html",
        "logo.png",
        "logo@2x.png",
        "poster.jpg",
        "movie.webm",
        "index.js",
      ]
    );
  }

  #[test]
  fn navigations_are_lazy() {
    let (_, dependencies) = transform(r#"<a href="other.html">Other</a><iframe src="frame.html">"#);

    assert_eq!(
      dependencies
        .iter()
        .map(|dependency| dependency.priority)
        .collect::<Vec<Priority>>(),
      vec![Priority::Lazy, Priority::Lazy]
    );
  }

  #[test]
  fn finds_href_when_it_is_not_the_first_attribute() {
    let (_, dependencies) = transform(r#"<link rel="stylesheet" type="text/css" href="index.css">"#);

    assert_eq!(specifiers(&dependencies), vec!["index.css"]);
  }

  #[test]
  fn keeps_remote_and_hash_references_as_dependencies() {
    let (_, dependencies) = transform(
      r##"
        <script src="https://unpkg.com/parcel-bundler"></script>
        <a href="#hash_link">Hash</a>
      "##,
    );

    assert_eq!(
      specifiers(&dependencies),
      vec!["https://unpkg.com/parcel-bundler", "#hash_link"]
    );
  }

  #[test]
  fn repeated_references_produce_one_dependency() {
    let (html, dependencies) = transform(
      r#"
        <a href="other.html">One</a>
        <a href="other.html">Two</a>
      "#,
    );

    assert_eq!(dependencies.len(), 1);
    assert_eq!(html.matches(&dependencies[0].id()).count(), 2);
  }
}
