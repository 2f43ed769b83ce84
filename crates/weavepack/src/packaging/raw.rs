use weavepack_core::bundle_graph::Bundle;

use super::PackageContext;

/// Copies the bundle's single asset verbatim
pub fn package(ctx: &PackageContext<'_>, bundle: &Bundle) -> anyhow::Result<Vec<u8>> {
  let asset = ctx.asset(bundle.entry_asset)?;
  Ok(asset.code.bytes().to_vec())
}
