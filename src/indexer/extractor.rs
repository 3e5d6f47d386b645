use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use tree_sitter::{Node, StreamingIterator};

use crate::config::CompileArgs;
use crate::error::{Result, TagsError};
use crate::index::{DeclKind, ParentScope, SymbolRecord};
use crate::indexer::parser::{ParsedFile, Parser};

/// Produces the symbol records of one translation unit.
pub trait AstWalker {
    fn walk(&mut self, file: &Path, args: &CompileArgs) -> Result<Vec<SymbolRecord>>;
}

/// Tree-sitter based walker for C and C++.
///
/// Headers reached through `#include` are walked once per translation
/// unit. Syntax errors, common in unpreprocessed code, are logged and the
/// recovered tree is walked; only an unreadable file is an error.
pub struct SymbolExtractor {
    parser: Parser,
}

impl SymbolExtractor {
    pub fn new(parser: Parser) -> Self {
        Self { parser }
    }

    /// Records declared in `parsed`, attributed to `file`.
    pub fn extract(&self, parsed: &ParsedFile, file: &Path) -> Vec<SymbolRecord> {
        let mut records = Vec::new();
        let mut visitor = DeclarationVisitor {
            parsed,
            file,
            records: &mut records,
        };
        visitor.visit_children(parsed.root_node(), &Context::default());
        records
    }

    /// Resolved paths of the headers included by `parsed`.
    pub fn includes(&self, parsed: &ParsedFile, file: &Path, args: &CompileArgs) -> Vec<PathBuf> {
        let Some(query) = parsed.grammar.cached_includes_query() else {
            return Vec::new();
        };

        let mut headers = Vec::new();
        let mut cursor = tree_sitter::QueryCursor::new();
        let mut matches = cursor.matches(query, parsed.root_node(), parsed.source_bytes());

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let capture_name = query.capture_names()[capture.index as usize];
                let text = parsed.node_text(&capture.node).trim();

                let resolved = match capture_name {
                    "include_path" => resolve_include(text.trim_matches('"'), file.parent(), args),
                    "system_include_path" => resolve_include(
                        text.trim_start_matches('<').trim_end_matches('>'),
                        None,
                        args,
                    ),
                    _ => None,
                };

                match resolved {
                    Some(path) => headers.push(path),
                    None => debug!("Unresolved include {} in {}", text, file.display()),
                }
            }
        }

        headers
    }
}

impl Default for SymbolExtractor {
    fn default() -> Self {
        Self::new(Parser::default())
    }
}

impl AstWalker for SymbolExtractor {
    fn walk(&mut self, file: &Path, args: &CompileArgs) -> Result<Vec<SymbolRecord>> {
        let parsed = self.parser.parse_file(file).map_err(|e| TagsError::Parse {
            file: file.to_path_buf(),
            diagnostics: vec![e.to_string()],
        })?;

        if parsed.has_errors() {
            let diagnostics = parsed.diagnostics();
            warn!(
                "{} has {} syntax errors (unexpanded macros?), tags may be incomplete",
                file.display(),
                diagnostics.len()
            );
            for diagnostic in &diagnostics {
                debug!("{}:{}", file.display(), diagnostic);
            }
        }

        let mut records = self.extract(&parsed, file);
        let mut visited = HashSet::from([canonical(file)]);
        let mut pending: VecDeque<PathBuf> = self.includes(&parsed, file, args).into();

        while let Some(header) = pending.pop_front() {
            if !visited.insert(canonical(&header)) {
                continue;
            }
            let parsed = match self.parser.parse_file(&header) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Skipping {}: {}", header.display(), e);
                    continue;
                }
            };
            if parsed.has_errors() {
                warn!("{} has syntax errors, tags may be incomplete", header.display());
            }
            records.extend(self.extract(&parsed, &header));
            pending.extend(self.includes(&parsed, &header, args));
        }

        debug!("{}: {} records", file.display(), records.len());
        Ok(records)
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Quoted includes look next to the including file first; both forms then
/// search the user and system include directories.
fn resolve_include(name: &str, local_dir: Option<&Path>, args: &CompileArgs) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    local_dir
        .into_iter()
        .chain(args.include_dirs().map(PathBuf::as_path))
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[derive(Debug, Clone, Default)]
struct Context {
    scope: ParentScope,
    class_name: Option<String>,
    in_template: bool,
}

impl Context {
    /// Same scope, but no longer the direct child of a template declaration.
    fn nested(&self) -> Self {
        Self {
            in_template: false,
            ..self.clone()
        }
    }

    fn templated(&self) -> Self {
        Self {
            in_template: true,
            ..self.clone()
        }
    }

    fn local() -> Self {
        Self {
            scope: ParentScope::Local,
            class_name: None,
            in_template: false,
        }
    }
}

struct DeclaratorInfo<'t> {
    name: Node<'t>,
    is_function: bool,
    /// Last segment of the qualifying scope, e.g. `Widget` in `Widget::draw`.
    qualifier: Option<String>,
}

struct DeclarationVisitor<'a> {
    parsed: &'a ParsedFile,
    file: &'a Path,
    records: &'a mut Vec<SymbolRecord>,
}

impl<'a> DeclarationVisitor<'a> {
    fn visit_children(&mut self, node: Node<'a>, ctx: &Context) {
        let mut cursor = node.walk();
        let children: Vec<Node<'a>> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child, ctx);
        }
    }

    fn visit(&mut self, node: Node<'a>, ctx: &Context) {
        match node.kind() {
            "class_specifier" => self.visit_record(node, ctx, DeclKind::Class, ParentScope::Class),
            "struct_specifier" => {
                self.visit_record(node, ctx, DeclKind::Struct, ParentScope::Struct)
            }
            "union_specifier" => self.visit_record(node, ctx, DeclKind::Union, ParentScope::Union),
            "enum_specifier" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let is_definition = node.child_by_field_name("body").is_some();
                    self.emit(simple_name(name), DeclKind::Enum, is_definition, ctx.scope);
                }
                self.visit_children(node, &ctx.nested());
            }
            "enumerator" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.emit(name, DeclKind::EnumConstant, true, ctx.scope);
                }
            }
            "namespace_definition" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.emit(name, DeclKind::Namespace, true, ctx.scope);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    let inner = Context {
                        scope: ParentScope::Namespace,
                        class_name: None,
                        in_template: false,
                    };
                    self.visit_children(body, &inner);
                }
            }
            "template_declaration" => self.visit_children(node, &ctx.templated()),
            "function_definition" => self.visit_function_definition(node, ctx),
            "declaration" | "field_declaration" => self.visit_declaration(node, ctx),
            "type_definition" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    self.visit(ty, &ctx.nested());
                }
                for declarator in field_children(node, "declarator") {
                    if let Some(info) = self.resolve_declarator(declarator) {
                        self.emit(info.name, DeclKind::Typedef, true, ctx.scope);
                    }
                }
            }
            "alias_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.emit(name, DeclKind::TypeAlias, true, ctx.scope);
                }
            }
            "parameter_declaration" | "optional_parameter_declaration" => {
                let info = node
                    .child_by_field_name("declarator")
                    .and_then(|d| self.resolve_declarator(d));
                if let Some(info) = info {
                    self.emit(info.name, DeclKind::Parameter, true, ParentScope::Local);
                }
            }
            "compound_statement" => self.visit_children(node, &Context::local()),
            _ => self.visit_children(node, &ctx.nested()),
        }
    }

    fn visit_record(&mut self, node: Node<'a>, ctx: &Context, kind: DeclKind, inner: ParentScope) {
        let kind = if ctx.in_template {
            DeclKind::ClassTemplate
        } else {
            kind
        };
        let body = node.child_by_field_name("body");
        let name = node.child_by_field_name("name").map(simple_name);

        if let Some(name) = name {
            self.emit(name, kind, body.is_some(), ctx.scope);
        }

        if let Some(body) = body {
            let class_name = name.map(|n| strip_template_args(self.parsed.node_text(&n)).to_string());
            let inner = Context {
                scope: inner,
                class_name,
                in_template: false,
            };
            self.visit_children(body, &inner);
        }
    }

    fn visit_function_definition(&mut self, node: Node<'a>, ctx: &Context) {
        if let Some(declarator) = node.child_by_field_name("declarator") {
            if let Some(info) = self.resolve_declarator(declarator) {
                if info.is_function {
                    let kind = self.function_kind(&info, ctx);
                    self.emit(info.name, kind, true, ctx.scope);
                }
            }
            self.visit(declarator, &Context::local());
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body, &Context::local());
        }
    }

    fn visit_declaration(&mut self, node: Node<'a>, ctx: &Context) {
        if let Some(ty) = node.child_by_field_name("type") {
            self.visit(ty, &ctx.nested());
        }

        let is_field = node.kind() == "field_declaration";
        let is_extern = self.has_storage_class(node, "extern");

        for declarator in field_children(node, "declarator") {
            if let Some(info) = self.resolve_declarator(declarator) {
                if info.is_function {
                    let kind = self.function_kind(&info, ctx);
                    self.emit(info.name, kind, false, ctx.scope);
                } else if is_field {
                    self.emit(info.name, DeclKind::Field, true, ctx.scope);
                } else {
                    self.emit(info.name, DeclKind::Variable, !is_extern, ctx.scope);
                }
            }
            self.visit(declarator, &Context::local());
        }
    }

    fn has_storage_class(&self, node: Node<'a>, keyword: &str) -> bool {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .any(|child| child.kind() == "storage_class_specifier" && self.parsed.node_text(&child) == keyword);
        found
    }

    fn function_kind(&self, info: &DeclaratorInfo<'a>, ctx: &Context) -> DeclKind {
        if info.name.kind() == "destructor_name" {
            return DeclKind::Destructor;
        }

        let name = strip_template_args(self.parsed.node_text(&info.name));
        let owner = info
            .qualifier
            .as_deref()
            .map(strip_template_args)
            .or(ctx.class_name.as_deref());

        if info.name.kind() != "operator_name" && owner == Some(name) {
            DeclKind::Constructor
        } else if ctx.in_template {
            DeclKind::FunctionTemplate
        } else if info.qualifier.is_some() || ctx.class_name.is_some() {
            DeclKind::Method
        } else {
            DeclKind::Function
        }
    }

    /// Walk down a declarator to the declared name.
    ///
    /// A pointer or reference met after a function declarator means the
    /// name is a pointer to function, i.e. a variable.
    fn resolve_declarator(&self, node: Node<'a>) -> Option<DeclaratorInfo<'a>> {
        let mut current = node;
        let mut seen_function = false;
        let mut pointer_to_function = false;
        let mut qualifier = None;

        loop {
            match current.kind() {
                "function_declarator" => {
                    seen_function = true;
                    current = current.child_by_field_name("declarator")?;
                }
                "pointer_declarator" | "reference_declarator" => {
                    if seen_function {
                        pointer_to_function = true;
                    }
                    current = inner_declarator(current)?;
                }
                "init_declarator" | "array_declarator" | "parenthesized_declarator"
                | "attributed_declarator" => {
                    current = inner_declarator(current)?;
                }
                "qualified_identifier" => {
                    qualifier = current
                        .child_by_field_name("scope")
                        .map(|scope| self.parsed.node_text(&scope).to_string());
                    current = current.child_by_field_name("name")?;
                }
                "identifier" | "field_identifier" | "type_identifier" | "destructor_name"
                | "operator_name" | "template_function" => break,
                _ => return None,
            }
        }

        let qualifier = qualifier.map(|q: String| match q.rsplit_once("::") {
            Some((_, last)) => last.to_string(),
            None => q,
        });

        Some(DeclaratorInfo {
            name: current,
            is_function: seen_function && !pointer_to_function,
            qualifier,
        })
    }

    fn emit(&mut self, name_node: Node<'a>, kind: DeclKind, is_definition: bool, scope: ParentScope) {
        let name = self.parsed.node_text(&name_node).trim();
        if name.is_empty() {
            return;
        }
        let pos = name_node.start_position();
        self.records.push(
            SymbolRecord::new(name, self.file, pos.row as u32 + 1, pos.column as u32 + 1, kind)
                .with_definition(is_definition)
                .with_scope(scope),
        );
    }
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children_by_field_name(field, &mut cursor).collect();
    children
}

/// The `declarator` field, or the first named child for declarators
/// without one (references, parentheses, attributes).
fn inner_declarator(node: Node<'_>) -> Option<Node<'_>> {
    if let Some(inner) = node.child_by_field_name("declarator") {
        return Some(inner);
    }
    let mut cursor = node.walk();
    let first = node.named_children(&mut cursor).next();
    first
}

/// Unqualified name of a possibly qualified type name.
fn simple_name(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while matches!(current.kind(), "qualified_identifier" | "qualified_type_identifier") {
        match current.child_by_field_name("name") {
            Some(name) => current = name,
            None => break,
        }
    }
    current
}

fn strip_template_args(name: &str) -> &str {
    name.split('<').next().unwrap_or(name).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn extract(source: &str) -> Vec<SymbolRecord> {
        let extractor = SymbolExtractor::default();
        let parsed = Parser::default().parse_source(source).unwrap();
        extractor.extract(&parsed, Path::new("test.cpp"))
    }

    fn find<'r>(records: &'r [SymbolRecord], name: &str, kind: DeclKind) -> Option<&'r SymbolRecord> {
        records.iter().find(|r| r.name == name && r.kind == kind)
    }

    #[test]
    fn test_extract_class_definition_location() {
        let records = extract("\nclass Widget {\n};\n");
        let class = find(&records, "Widget", DeclKind::Class).unwrap();

        assert_eq!(class.line, 2);
        assert_eq!(class.column, 7);
        assert!(class.is_definition);
        assert_eq!(class.file.as_deref(), Some(Path::new("test.cpp")));
    }

    #[test]
    fn test_forward_declaration_is_not_definition() {
        let records = extract("class Widget;\nstruct Point;\n");
        let class = find(&records, "Widget", DeclKind::Class).unwrap();
        assert!(!class.is_definition);
        let point = find(&records, "Point", DeclKind::Struct).unwrap();
        assert!(!point.is_definition);
    }

    #[test]
    fn test_extract_struct_fields_and_union() {
        let records = extract("struct Point { int x; int *y; };\nunion Value { int i; float f; };\n");

        assert!(find(&records, "Point", DeclKind::Struct).is_some());
        let x = find(&records, "x", DeclKind::Field).unwrap();
        assert_eq!(x.scope, ParentScope::Struct);
        assert!(find(&records, "y", DeclKind::Field).is_some());
        assert!(find(&records, "Value", DeclKind::Union).is_some());
        assert!(find(&records, "f", DeclKind::Field).is_some());
    }

    #[test]
    fn test_extract_enum_and_constants() {
        let records = extract("enum Color { Red, Green = 2 };\n");

        assert!(find(&records, "Color", DeclKind::Enum).unwrap().is_definition);
        assert!(find(&records, "Red", DeclKind::EnumConstant).is_some());
        assert!(find(&records, "Green", DeclKind::EnumConstant).is_some());
    }

    #[test]
    fn test_extract_functions_and_prototypes() {
        let records = extract("int add(int a, int b) { return a + b; }\nvoid log(const char *msg);\n");

        let add = find(&records, "add", DeclKind::Function).unwrap();
        assert!(add.is_definition);
        let log = find(&records, "log", DeclKind::Function).unwrap();
        assert!(!log.is_definition);
        let a = find(&records, "a", DeclKind::Parameter).unwrap();
        assert_eq!(a.scope, ParentScope::Local);
        assert!(find(&records, "msg", DeclKind::Parameter).is_some());
    }

    #[test]
    fn test_extract_methods_ctors_and_dtors() {
        let source = r#"
class Widget {
public:
    Widget();
    ~Widget();
    void draw() const;
    int size() { return 0; }
};

Widget::Widget() {}
Widget::~Widget() {}
void Widget::draw() const {}
"#;
        let records = extract(source);

        let ctors: Vec<_> = records.iter().filter(|r| r.kind == DeclKind::Constructor).collect();
        assert!(!ctors.is_empty());
        assert!(ctors.iter().all(|r| r.name == "Widget"));
        assert!(ctors.iter().any(|r| r.is_definition));

        let dtors: Vec<_> = records.iter().filter(|r| r.kind == DeclKind::Destructor).collect();
        assert!(!dtors.is_empty());
        assert!(dtors.iter().all(|r| r.name == "~Widget"));

        let draws: Vec<_> = records
            .iter()
            .filter(|r| r.name == "draw" && r.kind == DeclKind::Method)
            .collect();
        assert_eq!(draws.len(), 2);
        assert!(find(&records, "size", DeclKind::Method).unwrap().is_definition);
    }

    #[test]
    fn test_extract_templates() {
        let source = r#"
template <typename T>
class Box {
    T value;
};

template <typename T>
T identity(T v) { return v; }
"#;
        let records = extract(source);

        assert!(find(&records, "Box", DeclKind::ClassTemplate).is_some());
        assert!(find(&records, "Box", DeclKind::Class).is_none());
        assert!(find(&records, "identity", DeclKind::FunctionTemplate).is_some());
        assert!(find(&records, "value", DeclKind::Field).is_some());
    }

    #[test]
    fn test_extract_typedefs_aliases_and_namespaces() {
        let source = r#"
typedef unsigned int uint;
namespace gfx {
using Scalar = float;
int counter = 0;
}
"#;
        let records = extract(source);

        assert!(find(&records, "uint", DeclKind::Typedef).is_some());
        assert!(find(&records, "Scalar", DeclKind::TypeAlias).is_some());
        assert!(find(&records, "gfx", DeclKind::Namespace).is_some());
        let counter = find(&records, "counter", DeclKind::Variable).unwrap();
        assert_eq!(counter.scope, ParentScope::Namespace);
    }

    #[test]
    fn test_extract_variable_scopes() {
        let source = r#"
int global = 1;
extern int shared;
int (*handler)(int);
void run() { int local = 2; }
"#;
        let records = extract(source);

        assert_eq!(find(&records, "global", DeclKind::Variable).unwrap().scope, ParentScope::File);
        assert!(!find(&records, "shared", DeclKind::Variable).unwrap().is_definition);
        assert!(find(&records, "handler", DeclKind::Variable).is_some());
        assert!(find(&records, "handler", DeclKind::Function).is_none());
        assert_eq!(find(&records, "local", DeclKind::Variable).unwrap().scope, ParentScope::Local);
    }

    fn walk_source(source: &str) -> Vec<SymbolRecord> {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("m.cpp");
        fs::write(&path, source).unwrap();
        SymbolExtractor::default()
            .walk(&path, &CompileArgs::default())
            .unwrap()
    }

    #[test]
    fn test_walk_recovers_from_macro_members() {
        let records = walk_source(
            "#define DECLARE(n) int n;\n\
struct Before { int x; };\n\
struct S { DECLARE(a) DECLARE(b) };\n\
int after_decl(int v) { return v; }\n",
        );

        assert!(find(&records, "Before", DeclKind::Struct).is_some());
        assert!(find(&records, "x", DeclKind::Field).is_some());
        assert!(find(&records, "after_decl", DeclKind::Function).unwrap().is_definition);
    }

    #[test]
    fn test_walk_recovers_from_namespace_macros() {
        let records = walk_source(
            "#define BEGIN_NS namespace app {\n\
#define END_NS }\n\
BEGIN_NS\n\
int counter = 0;\n\
END_NS\n\
\n\
class Widget {};\n\
int main() { return 0; }\n",
        );

        assert!(find(&records, "Widget", DeclKind::Class).unwrap().is_definition);
        assert!(find(&records, "main", DeclKind::Function).is_some());
    }

    #[test]
    fn test_walk_recovers_from_split_parameter_list() {
        let records = walk_source(
            "void log_line(const char *msg,\n\
#ifdef VERBOSE\n\
    int level)\n\
#else\n\
    long level)\n\
#endif\n\
{\n\
}\n\
\n\
struct Sink { int fd; };\n",
        );

        assert!(find(&records, "Sink", DeclKind::Struct).is_some());
        assert!(find(&records, "fd", DeclKind::Field).is_some());
    }

    #[test]
    fn test_walk_tags_class_with_export_macro() {
        let records = walk_source("class API Widget { public: int x; };\n");

        let widget = find(&records, "Widget", DeclKind::Class).unwrap();
        assert!(widget.is_definition);
        assert_eq!((widget.line, widget.column), (1, 11));
        let x = find(&records, "x", DeclKind::Field).unwrap();
        assert_eq!(x.scope, ParentScope::Class);
        assert!(find(&records, "x", DeclKind::Variable).is_none());
    }

    #[test]
    fn test_walk_missing_file_is_parse_error() {
        let err = SymbolExtractor::default()
            .walk(Path::new("does/not/exist.cpp"), &CompileArgs::default())
            .unwrap_err();
        assert!(matches!(err, TagsError::Parse { .. }));
    }

    #[test]
    fn test_walk_follows_includes_once() {
        let temp_dir = TempDir::new().unwrap();
        let include_dir = temp_dir.path().join("include");
        fs::create_dir_all(&include_dir).unwrap();
        fs::write(include_dir.join("shape.h"), "struct Shape { int sides; };\n").unwrap();
        fs::write(
            temp_dir.path().join("local.h"),
            "#include <shape.h>\nint local_helper(int n);\n",
        )
        .unwrap();
        let main = temp_dir.path().join("main.cpp");
        fs::write(
            &main,
            "#include \"local.h\"\n#include <shape.h>\n#include <missing.h>\nint main() { return 0; }\n",
        )
        .unwrap();

        let args = CompileArgs {
            user_includes: vec![include_dir.clone()],
            ..Default::default()
        };
        let records = SymbolExtractor::default().walk(&main, &args).unwrap();

        let shapes: Vec<_> = records
            .iter()
            .filter(|r| r.name == "Shape" && r.kind == DeclKind::Struct)
            .collect();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].file.as_deref(), Some(include_dir.join("shape.h").as_path()));
        assert!(find(&records, "local_helper", DeclKind::Function).is_some());
        assert!(find(&records, "main", DeclKind::Function).is_some());
    }
}
