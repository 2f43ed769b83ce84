use indexmap::IndexSet;
use petgraph::graph::NodeIndex;
use weavepack_core::bundle_graph::Bundle;
use weavepack_core::types::FileType;
use weavepack_plugin_transformer_css::{replace_references, CssReferenceKind, Replacement};

use super::PackageContext;

/// Concatenates the style sheets of a bundle, imported sheets before their importers
///
/// `@import` rules for sheets inlined into the bundle are dropped and `url()` references point
/// at their bundles.
pub fn package(ctx: &PackageContext<'_>, bundle: &Bundle) -> anyhow::Result<Vec<u8>> {
  let mut output = String::new();

  for member in import_order(ctx, bundle) {
    let asset = ctx.asset(member)?;
    let dependencies = ctx.dependencies_by_placeholder(member);

    let code = replace_references(asset.code.as_str()?, |reference| {
      let Some((node, target)) = dependencies.get(reference.specifier) else {
        return Replacement::Keep;
      };

      match reference.kind {
        CssReferenceKind::Import if target.is_some_and(|target| bundle.assets.contains(&target)) => {
          Replacement::RemoveRule
        }
        CssReferenceKind::Import => Replacement::Specifier(node.dependency.specifier.clone()),
        CssReferenceKind::Url => Replacement::Specifier(
          ctx
            .reference_url(bundle.id, node, *target)
            .unwrap_or_else(|| node.dependency.specifier.clone()),
        ),
      }
    });

    if !output.is_empty() && !output.ends_with('\n') {
      output.push('\n');
    }
    output.push_str(&code);
  }

  Ok(output.into_bytes())
}

fn import_order(ctx: &PackageContext<'_>, bundle: &Bundle) -> Vec<NodeIndex> {
  let is_sheet = |asset: NodeIndex| {
    bundle.assets.contains(&asset)
      && ctx
        .asset_graph
        .asset(asset)
        .is_some_and(|asset| asset.file_type == FileType::Css && !asset.is_virtual)
  };

  let mut visited = IndexSet::new();
  let mut order = Vec::new();

  for member in &bundle.assets {
    if !is_sheet(*member) || visited.contains(member) {
      continue;
    }

    // Depth first, emitting a sheet once all of its imports have been emitted
    let mut stack = vec![(*member, false)];
    while let Some((asset, expanded)) = stack.pop() {
      if expanded {
        order.push(asset);
        continue;
      }
      if !visited.insert(asset) {
        continue;
      }

      stack.push((asset, true));
      let imports = ctx
        .asset_graph
        .resolved_dependencies(asset)
        .filter(|(node, target)| !node.dependency.is_boundary() && is_sheet(*target))
        .map(|(_, target)| target)
        .collect::<Vec<_>>();
      stack.extend(imports.into_iter().rev().map(|target| (target, false)));
    }
  }

  order
}
