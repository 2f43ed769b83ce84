pub use js_transformer::*;
pub use json_transformer::*;

mod js_transformer;
mod json_transformer;
