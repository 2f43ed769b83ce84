use html5ever::local_name;
use weavepack_core::bundle_graph::Bundle;
use weavepack_core::types::FileType;
use weavepack_plugin_transformer_html::dom::{append_child, create_element, find_or_create_head};
use weavepack_plugin_transformer_html::references::rewrite_references;
use weavepack_plugin_transformer_html::{parse_html, serialize_html};

use super::PackageContext;

/// Points every reference at its bundle and loads sibling bundles from the head
///
/// References that do not lead to a packaged bundle get their authored value back.
pub fn package(ctx: &PackageContext<'_>, bundle: &Bundle) -> anyhow::Result<Vec<u8>> {
  let asset = ctx.asset(bundle.entry_asset)?;
  let dom = parse_html(asset.code.bytes())?;
  let dependencies = ctx.dependencies_by_placeholder(bundle.entry_asset);

  rewrite_references(dom.document.clone(), |reference| {
    let (node, target) = dependencies.get(reference.value)?;

    Some(
      ctx
        .reference_url(bundle.id, node, *target)
        .unwrap_or_else(|| node.dependency.specifier.clone()),
    )
  });

  if !bundle.injected_references.is_empty() {
    let head = find_or_create_head(&dom.document);

    for sibling in &bundle.injected_references {
      let url = ctx.bundle_url(*sibling);
      let element = match ctx.bundles.bundle(*sibling).bundle_type {
        FileType::Css => create_element(
          local_name!("link"),
          &[(local_name!("rel"), "stylesheet"), (local_name!("href"), &url)],
        ),
        FileType::Js => create_element(local_name!("script"), &[(local_name!("src"), &url)]),
        _ => continue,
      };

      append_child(&head, element);
    }
  }

  serialize_html(dom)
}
