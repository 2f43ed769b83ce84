use anyhow::anyhow;
use indexmap::{IndexMap, IndexSet};
use petgraph::graph::NodeIndex;
use weavepack_core::asset_graph::AssetGraph;
use weavepack_core::bundle_graph::{BundleGraph, BundleId, BundleOrigin};
use weavepack_core::types::FileType;

use crate::bundling::has_representation;
use crate::runtime;

/// Gives every bundle a sibling bundle for each foreign asset type it contains
///
/// Foreign members move to a sibling of their own type, attached as a child of the bundle that
/// needs them. Members the bundle can still represent stay behind. With hot reloading on, every
/// style bundle gets a script sibling carrying its reload module and every script bundle loaded
/// by a document gets the hot reload runtime. Documents are asked to load the style and script
/// siblings of their children from the head.
///
/// Runs until no pass changes the tree, since new siblings may need siblings of their own.
#[tracing::instrument(level = "info", skip_all)]
pub fn inject_siblings(
  asset_graph: &AssetGraph,
  bundles: &mut BundleGraph,
  hmr: bool,
) -> anyhow::Result<()> {
  let hmr_runtime = if hmr {
    let runtime = asset_graph
      .asset_index(&runtime::hmr_runtime_path())
      .ok_or_else(|| anyhow!("The hot reload runtime is missing from the asset graph"))?;
    Some(inline_closure(asset_graph, runtime))
  } else {
    None
  };

  let mut passes = 0;
  loop {
    passes += 1;
    let mut changed = false;

    let ids = bundles.bundle_ids().collect::<Vec<_>>();
    for id in ids {
      changed |= inject_bundle(asset_graph, bundles, id, hmr_runtime.as_ref());
    }
    changed |= inject_head_references(bundles);

    if !changed {
      break;
    }
  }

  tracing::debug!(passes, bundles = bundles.len(), "Injected sibling bundles");
  Ok(())
}

fn inject_bundle(
  asset_graph: &AssetGraph,
  bundles: &mut BundleGraph,
  id: BundleId,
  hmr_runtime: Option<&Vec<NodeIndex>>,
) -> bool {
  let mut changed = false;
  let bundle = bundles.bundle(id);
  let bundle_type = bundle.bundle_type.clone();

  let mut required: IndexMap<FileType, IndexSet<NodeIndex>> = IndexMap::new();

  if hmr_runtime.is_some() && bundle_type == FileType::Css {
    for member in &bundle.assets {
      if asset_graph
        .asset(*member)
        .is_some_and(|asset| asset.file_type == FileType::Css)
      {
        required.entry(FileType::Js).or_default().insert(*member);
      }
    }
  }

  for member in &bundle.assets {
    let Some(asset) = asset_graph.asset(*member) else {
      continue;
    };
    if asset.is_virtual || asset.file_type == bundle_type {
      continue;
    }

    required
      .entry(asset.file_type.clone())
      .or_default()
      .insert(*member);
  }

  if let Some(hmr_runtime) = hmr_runtime {
    if bundle_type == FileType::Js && is_loaded_by_document(bundles, id) {
      for asset in hmr_runtime {
        changed |= bundles.add_asset(id, *asset);
      }
    }
  }

  for (file_type, members) in required {
    let existing = bundles.bundle(id).siblings.get(&file_type).copied();
    let sibling = match existing {
      Some(sibling) => sibling,
      None => {
        let Some(first) = members.first() else {
          continue;
        };

        let sibling = bundles.add_child(id, file_type.clone(), *first, BundleOrigin::Sibling);
        bundles.connect_siblings(id, sibling);
        changed = true;

        tracing::debug!(
          bundle = id.index(),
          sibling = sibling.index(),
          sibling_type = %file_type.extension(),
          "Created sibling bundle"
        );

        sibling
      }
    };

    for member in members {
      changed |= bundles.add_asset(sibling, member);
    }
  }

  let bundle = bundles.bundle_mut(id);
  let before = bundle.assets.len();
  bundle.assets.retain(|member| {
    asset_graph.asset(*member).map_or(true, |asset| {
      asset.is_virtual
        || asset.file_type == bundle_type
        || has_representation(&asset.file_type, &bundle_type)
    })
  });
  changed |= bundle.assets.len() != before;

  changed
}

/// Whether a document loads this bundle, looking through the sibling chain to the bundle that
/// owns it
fn is_loaded_by_document(bundles: &BundleGraph, id: BundleId) -> bool {
  let mut owner = bundles.bundle(id);
  while owner.origin == BundleOrigin::Sibling {
    match owner.parent {
      Some(parent) => owner = bundles.bundle(parent),
      None => break,
    }
  }

  match owner.parent {
    None => true,
    Some(parent) => bundles.bundle(parent).bundle_type == FileType::Html,
  }
}

fn inject_head_references(bundles: &mut BundleGraph) -> bool {
  let references = bundles
    .bundles()
    .filter(|bundle| {
      bundle.origin == BundleOrigin::Sibling
        && matches!(bundle.bundle_type, FileType::Css | FileType::Js)
    })
    .filter_map(|sibling| {
      let owner = sibling.parent?;
      let document = bundles.bundle(owner).parent?;
      (bundles.bundle(document).bundle_type == FileType::Html).then_some((document, sibling.id))
    })
    .collect::<Vec<_>>();

  let mut changed = false;
  for (document, sibling) in references {
    changed |= bundles.inject_reference(document, sibling);
  }
  changed
}

/// An asset followed by everything it pulls in through inline dependencies
fn inline_closure(asset_graph: &AssetGraph, start: NodeIndex) -> Vec<NodeIndex> {
  let mut closure = IndexSet::new();
  let mut stack = vec![start];

  while let Some(asset) = stack.pop() {
    if !closure.insert(asset) {
      continue;
    }

    let mut inline = asset_graph
      .resolved_dependencies(asset)
      .filter(|(node, _)| !node.dependency.is_boundary())
      .map(|(_, target)| target)
      .collect::<Vec<_>>();
    inline.reverse();
    stack.extend(inline);
  }

  closure.into_iter().collect()
}
