pub mod cpp;

use std::path::Path;

use tree_sitter::Query;

pub use cpp::CppGrammar;

pub trait LanguageGrammar: Send + Sync {
    fn name(&self) -> &'static str;
    fn file_extensions(&self) -> &[&'static str];
    fn language(&self) -> tree_sitter::Language;

    /// Query capturing `#include` targets as `@include_path`.
    fn includes_query(&self) -> &str;

    /// Get cached includes query (compiled once)
    fn cached_includes_query(&self) -> Option<&'static Query> {
        None
    }

    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.file_extensions().contains(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpp_supports_sources_and_headers() {
        let grammar = CppGrammar;
        assert!(grammar.supports(Path::new("src/widget.cpp")));
        assert!(grammar.supports(Path::new("include/widget.h")));
        assert!(grammar.supports(Path::new("legacy.c")));
        assert!(grammar.supports(Path::new("w.hpp")));
        assert!(!grammar.supports(Path::new("README.md")));
        assert!(!grammar.supports(Path::new("Makefile")));
    }

    #[test]
    fn test_cpp_grammar_name() {
        let grammar: &dyn LanguageGrammar = &CppGrammar;
        assert_eq!(grammar.name(), "cpp");
    }

    #[test]
    fn test_cpp_includes_query_compiles() {
        assert!(CppGrammar.cached_includes_query().is_some());
    }
}
