pub mod config;
pub mod error;
pub mod index;
pub mod indexer;
pub mod languages;

pub use config::{CompileArgs, ConfigFile, Settings};
pub use error::{Result, TagsError};
pub use index::{
    BucketKind, DeclKind, ParentScope, SymbolRecord, SyntaxClassifier, Tag, TagStore,
    TagWriter, TagfileMerger,
};
pub use indexer::{
    generate, AstWalker, Collector, CtagsExtractor, FileWalker, MacroDef, MacroExtractor,
    Parser, RecordFilter, SymbolExtractor, TagIndex,
};
pub use languages::{CppGrammar, LanguageGrammar};
