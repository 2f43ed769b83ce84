pub mod asset_graph;
pub mod bundle_graph;
pub mod config_loader;
pub mod hash;
pub mod plugin;
pub mod types;

// Re-export this from core so plugins only need one dependency
pub use weavepack_filesystem::FileSystem;
pub use weavepack_filesystem::FileSystemRef;
