pub mod merge;
pub mod models;
pub mod store;
pub mod syntax;
pub mod writer;

pub use merge::TagfileMerger;
pub use models::*;
pub use store::TagStore;
pub use syntax::{SyntaxClassifier, DEFAULT_RESERVED_WORDS};
pub use writer::{format_tag, write_syntax, TagWriter};
