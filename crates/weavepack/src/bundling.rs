//! Splits the asset graph into a tree of typed bundles
use weavepack_core::types::FileType;

pub use inject_siblings::*;
pub use partition::*;

mod inject_siblings;
mod partition;

/// Whether an asset of `asset_type` can be carried inside a bundle of `bundle_type`
///
/// Scripts represent every other type as a module: style sheets as an empty module and
/// anything else as a module exporting its output URL.
pub fn has_representation(asset_type: &FileType, bundle_type: &FileType) -> bool {
  *bundle_type == FileType::Js && *asset_type != FileType::Js
}
