use std::borrow::Cow;

use petgraph::graph::NodeIndex;
use serde_json::{json, Map, Value};
use weavepack_core::bundle_graph::Bundle;
use weavepack_core::types::FileType;

use super::PackageContext;
use crate::runtime::{self, PRELUDE};

const CSS_HMR_MODULE: &str = "var reloadCSS = require('_css_loader');
if (module.hot) {
  module.hot.dispose(reloadCSS);
  module.hot.accept(reloadCSS);
}";

/// Wraps every member in a module definition for the registry in the prelude
///
/// Each definition carries a map from the specifiers the module uses to the module ids of
/// members, or to the URL (and module id) of the bundle loading a boundary target. The hot
/// reload runtime, when present, runs before the bundle's entry.
pub fn package(ctx: &PackageContext<'_>, bundle: &Bundle) -> anyhow::Result<Vec<u8>> {
  let mut modules = Vec::new();

  for member in &bundle.assets {
    let asset = ctx.asset(*member)?;
    if asset.is_virtual {
      continue;
    }

    let code: Cow<'_, str> = match &asset.file_type {
      FileType::Js => Cow::Borrowed(asset.code.as_str()?),
      FileType::Css if ctx.options.hmr => Cow::Borrowed(CSS_HMR_MODULE),
      FileType::Css => Cow::Borrowed(""),
      other => {
        let url = bundle
          .siblings
          .get(other)
          .map(|sibling| ctx.bundle_url(*sibling))
          .unwrap_or_default();
        Cow::Owned(format!("module.exports = {};", Value::String(url)))
      }
    };

    modules.push(format!(
      "{}: [function (require, module, exports) {{\n{}\n}}, {}]",
      Value::String(ctx.module_id(asset)),
      code,
      Value::Object(specifier_map(ctx, bundle, *member)?)
    ));
  }

  let mut entries = Vec::new();
  if let Some(hmr_runtime) = ctx.asset_graph.asset_index(&runtime::hmr_runtime_path()) {
    if bundle.assets.contains(&hmr_runtime) {
      entries.push(ctx.module_id(ctx.asset(hmr_runtime)?));
    }
  }
  let entry = ctx.module_id(ctx.asset(bundle.entry_asset)?);
  if !entries.contains(&entry) {
    entries.push(entry);
  }

  let output = format!(
    "{PRELUDE}\n__weavepackDefine({{\n{}\n}}, {});\n",
    modules.join(",\n"),
    Value::from(entries)
  );

  Ok(output.into_bytes())
}

fn specifier_map(
  ctx: &PackageContext<'_>,
  bundle: &Bundle,
  asset: NodeIndex,
) -> anyhow::Result<Map<String, Value>> {
  let mut specifiers = Map::new();

  for (node, target) in ctx.dependencies(asset) {
    let Some(target) = target else {
      continue;
    };
    let target_asset = ctx.asset(target)?;

    let value = if bundle.assets.contains(&target) {
      Value::String(ctx.module_id(target_asset))
    } else if node.dependency.is_boundary() {
      let Some(url) = ctx.reference_url(bundle.id, node, Some(target)) else {
        continue;
      };

      let mut loader = json!({ "url": url });
      if target_asset.file_type == FileType::Js {
        loader["id"] = Value::String(ctx.module_id(target_asset));
      }

      let siblings = sibling_urls(ctx, bundle, target);
      if !siblings.is_empty() {
        loader["siblings"] = Value::from(siblings);
      }

      loader
    } else {
      continue;
    };

    specifiers.insert(node.dependency.specifier.clone(), value);
  }

  Ok(specifiers)
}

/// URLs of the bundles that must load alongside the bundle a boundary target opens
fn sibling_urls(ctx: &PackageContext<'_>, from: &Bundle, target: NodeIndex) -> Vec<String> {
  let Some(target_bundle) = ctx.find_bundle(from.id, target) else {
    return Vec::new();
  };

  ctx
    .bundles
    .bundle(target_bundle)
    .siblings
    .values()
    .filter(|sibling| ctx.bundles.bundle(**sibling).parent == Some(target_bundle))
    .map(|sibling| ctx.bundle_url(*sibling))
    .collect()
}
