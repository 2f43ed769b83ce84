pub use css_transformer::*;
pub use references::*;

mod css_transformer;
mod references;
