pub use self::asset::*;
pub use self::build_options::*;
pub use self::dependency::*;
pub use self::diagnostic::*;
pub use self::file_type::*;

mod asset;
mod build_options;
mod dependency;
mod diagnostic;
mod file_type;
