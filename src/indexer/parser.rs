use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::error::{Result, TagsError};
use crate::languages::{CppGrammar, LanguageGrammar};

/// `class EXPORT_MACRO Name {` or `struct API Name : Base {`.
static CLASS_HEAD_MACRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:class|struct|union)\s+([A-Z][A-Z0-9_]+)\s+([A-Za-z_][A-Za-z0-9_]*)\s*[:{]")
        .expect("class head pattern is valid")
});

pub struct Parser {
    grammar: Arc<dyn LanguageGrammar>,
}

impl Parser {
    pub fn new(grammar: Arc<dyn LanguageGrammar>) -> Self {
        Self { grammar }
    }

    pub fn parse_file(&self, path: &Path) -> Result<ParsedFile> {
        trace!("Parsing {} as {}", path.display(), self.grammar.name());
        let bytes = std::fs::read(path)?;
        let source = String::from_utf8_lossy(&bytes).into_owned();
        self.parse_source(&source)
    }

    /// Parse `source`. Export macros in class heads are blanked out first,
    /// keeping every byte offset, since tree-sitter does not preprocess.
    pub fn parse_source(&self, source: &str) -> Result<ParsedFile> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.grammar.language())
            .map_err(|e| {
                TagsError::UnsupportedLanguage(format!("{}: {}", self.grammar.name(), e))
            })?;

        let source = mask_class_head_macros(source);
        let tree = parser.parse(source.as_bytes(), None).ok_or_else(|| TagsError::Parse {
            file: Default::default(),
            diagnostics: vec!["parser produced no tree".to_string()],
        })?;

        Ok(ParsedFile {
            tree,
            source: source.into_owned(),
            grammar: self.grammar.clone(),
        })
    }
}

fn mask_class_head_macros(source: &str) -> Cow<'_, str> {
    let mut masked: Option<String> = None;
    for caps in CLASS_HEAD_MACRO.captures_iter(source) {
        let (Some(mac), Some(name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if name.as_str() == "final" {
            continue;
        }
        masked
            .get_or_insert_with(|| source.to_string())
            .replace_range(mac.range(), &" ".repeat(mac.len()));
    }
    masked.map_or(Cow::Borrowed(source), Cow::Owned)
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Arc::new(CppGrammar))
    }
}

pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: String,
    pub grammar: Arc<dyn LanguageGrammar>,
}

impl ParsedFile {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn node_text(&self, node: &tree_sitter::Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }

    pub fn has_errors(&self) -> bool {
        self.root_node().has_error()
    }

    /// `line:column: message` for every syntax error in the tree.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut diagnostics = Vec::new();
        if self.has_errors() {
            self.collect_errors(self.root_node(), &mut diagnostics);
        }
        diagnostics
    }

    fn collect_errors(&self, node: tree_sitter::Node, out: &mut Vec<String>) {
        let pos = node.start_position();
        if node.is_missing() {
            out.push(format!(
                "{}:{}: error: missing '{}'",
                pos.row + 1,
                pos.column + 1,
                node.kind()
            ));
            return;
        }
        if node.is_error() {
            let text: String = self.node_text(&node).chars().take(40).collect();
            out.push(format!(
                "{}:{}: error: unexpected '{}'",
                pos.row + 1,
                pos.column + 1,
                text.trim()
            ));
            return;
        }
        if !node.has_error() {
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_errors(child, out);
        }
    }
}
