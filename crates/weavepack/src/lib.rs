pub use error::*;
pub use weavepack::*;
pub use weavepack_filesystem as file_system;

pub mod bundling;
pub mod compilation;
pub mod config;
pub mod packaging;
pub mod plugins;
pub mod runtime;

mod error;
#[cfg(test)]
mod test_utils;
mod weavepack;
