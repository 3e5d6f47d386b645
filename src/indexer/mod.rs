pub mod collector;
pub mod extractor;
pub mod filter;
pub mod macros;
pub mod parser;
pub mod walker;

pub use collector::{generate, Collector, TagIndex};
pub use extractor::{AstWalker, SymbolExtractor};
pub use filter::RecordFilter;
pub use macros::{parse_ctags_output, CtagsExtractor, MacroDef, MacroExtractor};
pub use parser::{ParsedFile, Parser};
pub use walker::FileWalker;
