pub use html_transformer::*;

pub mod attrs;
pub mod dom;
pub mod dom_visitor;
pub mod references;

mod html_transformer;
