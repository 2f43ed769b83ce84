pub use html_optimizer::*;

mod html_optimizer;
