use std::cell::RefCell;

use anyhow::Error;
use markup5ever_rcdom::{Handle, Node, NodeData};
use serde::Deserialize;

use weavepack_core::plugin::{OptimizeContext, OptimizedBundle, OptimizerPlugin, PluginContext};
use weavepack_plugin_transformer_html::dom::{append_child, remove_node};
use weavepack_plugin_transformer_html::{parse_html, serialize_html};

pub const HTMLNANO_CONFIG: &str = ".htmlnanorc";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct HtmlMinifierConfig {
  /// Replaces every whitespace run in text with one space
  pub collapse_whitespace: bool,
  pub remove_comments: bool,
  /// Joins neighbouring `<style>` elements that apply to the same media
  pub merge_styles: bool,
  /// Re-serializes JSON script blocks without insignificant whitespace
  pub minify_json: bool,
}

impl Default for HtmlMinifierConfig {
  fn default() -> Self {
    Self {
      collapse_whitespace: true,
      remove_comments: true,
      merge_styles: true,
      minify_json: true,
    }
  }
}

/// Minifies documents in production builds
///
/// Whitespace is collapsed rather than removed, so the space between two inline elements
/// survives. Text inside `pre`, `textarea`, `script` and `style` is left untouched, apart from
/// JSON scripts which are re-serialized compactly.
#[derive(Debug)]
pub struct WeavepackHtmlOptimizerPlugin {
  config: HtmlMinifierConfig,
}

impl WeavepackHtmlOptimizerPlugin {
  pub fn new(ctx: &PluginContext) -> Result<Self, Error> {
    let config = ctx
      .config
      .load_optional_json_config::<HtmlMinifierConfig>(HTMLNANO_CONFIG)?
      .map(|config| {
        tracing::debug!(path = %config.path.display(), "Loaded html minifier config");
        config.contents
      })
      .unwrap_or_default();

    Ok(WeavepackHtmlOptimizerPlugin { config })
  }
}

impl OptimizerPlugin for WeavepackHtmlOptimizerPlugin {
  fn optimize(&self, ctx: OptimizeContext<'_>) -> Result<OptimizedBundle, Error> {
    let dom = parse_html(&ctx.contents)?;
    minify(&dom.document, &self.config, false);

    Ok(OptimizedBundle {
      contents: serialize_html(dom)?,
    })
  }
}

fn collapse_whitespace(text: &str) -> String {
  let mut output = String::with_capacity(text.len());
  let mut in_whitespace = false;

  for c in text.chars() {
    if c.is_ascii_whitespace() {
      if !in_whitespace {
        output.push(' ');
      }
      in_whitespace = true;
    } else {
      output.push(c);
      in_whitespace = false;
    }
  }

  output
}

fn element_name(node: &Handle) -> Option<&str> {
  match &node.data {
    NodeData::Element { name, .. } => Some(&*name.local),
    _ => None,
  }
}

fn attribute(node: &Handle, name: &str) -> Option<String> {
  match &node.data {
    NodeData::Element { attrs, .. } => attrs
      .borrow()
      .iter()
      .find(|attribute| &*attribute.name.local == name)
      .map(|attribute| attribute.value.to_string()),
    _ => None,
  }
}

fn text_content(node: &Handle) -> String {
  node
    .children
    .borrow()
    .iter()
    .filter_map(|child| match &child.data {
      NodeData::Text { contents } => Some(contents.borrow().to_string()),
      _ => None,
    })
    .collect()
}

fn replace_text(node: &Handle, text: &str) {
  node.children.borrow_mut().clear();
  append_child(
    node,
    Node::new(NodeData::Text {
      contents: RefCell::new(text.into()),
    }),
  );
}

fn is_blank_text(node: &Handle) -> bool {
  match &node.data {
    NodeData::Text { contents } => contents.borrow().trim().is_empty(),
    _ => false,
  }
}

/// Moves the rules of each `<style>` into the one before it when nothing but whitespace
/// separates them and both apply to the same media
fn merge_styles(node: &Handle) {
  let children: Vec<Handle> = node.children.borrow().clone();
  let mut previous: Option<Handle> = None;

  for child in children {
    if is_blank_text(&child) {
      continue;
    }

    if element_name(&child) != Some("style") {
      previous = None;
      continue;
    }

    match previous.clone() {
      Some(style)
        if attribute(&style, "media") == attribute(&child, "media")
          && attribute(&style, "type") == attribute(&child, "type") =>
      {
        let merged = text_content(&style) + &text_content(&child);
        replace_text(&style, &merged);
        remove_node(&child);
      }
      _ => previous = Some(child),
    }
  }
}

fn minify_json(script: &Handle) {
  let source = text_content(script);
  match serde_json::from_str::<serde_json::Value>(&source) {
    Ok(value) => replace_text(script, &value.to_string()),
    Err(error) => tracing::debug!(%error, "Leaving invalid json script as is"),
  }
}

fn is_json_script(node: &Handle) -> bool {
  element_name(node) == Some("script")
    && matches!(
      attribute(node, "type").as_deref(),
      Some("application/json" | "application/ld+json")
    )
}

fn minify(node: &Handle, config: &HtmlMinifierConfig, preserve_whitespace: bool) {
  if config.merge_styles {
    merge_styles(node);
  }

  let parent_name = element_name(node);
  let children: Vec<Handle> = node.children.borrow().clone();

  for child in children {
    match &child.data {
      NodeData::Element { .. } if config.minify_json && is_json_script(&child) => {
        minify_json(&child);
      }
      NodeData::Comment { .. } if config.remove_comments => remove_node(&child),
      NodeData::Text { contents } if config.collapse_whitespace && !preserve_whitespace => {
        let collapsed = collapse_whitespace(&contents.borrow());
        // Whitespace directly inside <html> and <head> is never rendered
        if collapsed == " " && matches!(parent_name, Some("html" | "head")) {
          remove_node(&child);
        } else {
          *contents.borrow_mut() = collapsed.as_str().into();
        }
      }
      NodeData::Element { .. } => {
        let preserve = preserve_whitespace
          || matches!(
            element_name(&child),
            Some("pre" | "textarea" | "script" | "style")
          );
        minify(&child, config, preserve);
      }
      _ => {}
    }
  }
}
