use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct CppGrammar;

static CPP_INCLUDES_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for CppGrammar {
    fn name(&self) -> &'static str {
        "cpp"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["c", "cc", "cpp", "cxx", "c++", "h", "hh", "hpp", "hxx", "h++", "inl", "ipp", "tcc"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_cpp::LANGUAGE.into()
    }

    fn includes_query(&self) -> &str {
        r#"
        (preproc_include
            path: (string_literal) @include_path
        )

        (preproc_include
            path: (system_lib_string) @system_include_path
        )
        "#
    }

    fn cached_includes_query(&self) -> Option<&'static Query> {
        CPP_INCLUDES_QUERY.get_or_try_init(|| {
            Query::new(&self.language(), self.includes_query())
        }).ok()
    }
}
