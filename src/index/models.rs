use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// File marker used for macros defined with `-D` on the command line.
pub const COMMAND_LINE_FILE: &str = "<command-line>";

/// Declaration kinds reported by the AST walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeclKind {
    Class,
    Struct,
    Union,
    Enum,
    EnumConstant,
    Field,
    Parameter,
    Variable,
    Function,
    Constructor,
    Destructor,
    Method,
    FunctionTemplate,
    ClassTemplate,
    Typedef,
    TypeAlias,
    Namespace,
}

impl DeclKind {
    pub const ALL: [DeclKind; 17] = [
        DeclKind::Class,
        DeclKind::Struct,
        DeclKind::Union,
        DeclKind::Enum,
        DeclKind::EnumConstant,
        DeclKind::Field,
        DeclKind::Parameter,
        DeclKind::Variable,
        DeclKind::Function,
        DeclKind::Constructor,
        DeclKind::Destructor,
        DeclKind::Method,
        DeclKind::FunctionTemplate,
        DeclKind::ClassTemplate,
        DeclKind::Typedef,
        DeclKind::TypeAlias,
        DeclKind::Namespace,
    ];

    /// Label written after `kind:` in the tag file.
    pub fn label(&self) -> &'static str {
        match self {
            DeclKind::Class => "class-def",
            DeclKind::Struct => "struct-def",
            DeclKind::Union => "union-def",
            DeclKind::Enum => "enum-def",
            DeclKind::EnumConstant => "enum-constant-def",
            DeclKind::Field => "field-def",
            DeclKind::Parameter => "param-def",
            DeclKind::Variable => "var-decl",
            DeclKind::Function => "function-def",
            DeclKind::Constructor => "ctor",
            DeclKind::Destructor => "dtor",
            DeclKind::Method => "method",
            DeclKind::FunctionTemplate => "function-template",
            DeclKind::ClassTemplate => "class-template",
            DeclKind::Typedef => "typedef-def",
            DeclKind::TypeAlias => "type-alias",
            DeclKind::Namespace => "namespace",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == s)
    }

    /// Kinds that are only indexed when the record is a real definition
    /// rather than a forward declaration or a reference.
    pub fn is_definition_only(&self) -> bool {
        matches!(
            self,
            DeclKind::Class
                | DeclKind::Struct
                | DeclKind::Union
                | DeclKind::Enum
                | DeclKind::EnumConstant
                | DeclKind::Field
                | DeclKind::Function
                | DeclKind::Parameter
                | DeclKind::Typedef
                | DeclKind::TypeAlias
        )
    }

    /// Highlighting bucket the symbol name is classified into, if any.
    pub fn bucket(&self) -> Option<BucketKind> {
        match self {
            DeclKind::Class
            | DeclKind::Struct
            | DeclKind::Union
            | DeclKind::Enum
            | DeclKind::ClassTemplate
            | DeclKind::Typedef
            | DeclKind::TypeAlias
            | DeclKind::Namespace => Some(BucketKind::Type),
            DeclKind::EnumConstant => Some(BucketKind::Constant),
            DeclKind::Function
            | DeclKind::Constructor
            | DeclKind::Method
            | DeclKind::FunctionTemplate => Some(BucketKind::Function),
            DeclKind::Field | DeclKind::Variable => Some(BucketKind::Identifier),
            DeclKind::Parameter | DeclKind::Destructor => None,
        }
    }

    /// Kinds indexed when no explicit allow-list is configured.
    pub fn default_allowed() -> Vec<DeclKind> {
        Self::ALL
            .into_iter()
            .filter(|kind| *kind != DeclKind::Namespace)
            .collect()
    }
}

/// Syntax highlighting buckets, lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKind {
    Identifier,
    Function,
    Constant,
    Type,
}

impl BucketKind {
    pub const BY_PRIORITY: [BucketKind; 4] = [
        BucketKind::Identifier,
        BucketKind::Function,
        BucketKind::Constant,
        BucketKind::Type,
    ];

    pub fn group_name(&self) -> &'static str {
        match self {
            BucketKind::Identifier => "CppTagsIdentifier",
            BucketKind::Function => "CppTagsFunction",
            BucketKind::Constant => "CppTagsConstant",
            BucketKind::Type => "CppTagsType",
        }
    }

    pub fn priority(&self) -> usize {
        *self as usize
    }
}

/// Semantic parent of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParentScope {
    #[default]
    File,
    Namespace,
    Class,
    Struct,
    Union,
    Local,
}

/// One symbol occurrence as reported by the AST walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    pub name: String,
    /// `None` when the location could not be resolved to a file.
    pub file: Option<PathBuf>,
    pub line: u32,
    pub column: u32,
    pub kind: DeclKind,
    pub is_definition: bool,
    pub scope: ParentScope,
}

impl SymbolRecord {
    pub fn new(
        name: impl Into<String>,
        file: impl Into<PathBuf>,
        line: u32,
        column: u32,
        kind: DeclKind,
    ) -> Self {
        Self {
            name: name.into(),
            file: Some(file.into()),
            line,
            column,
            kind,
            is_definition: true,
            scope: ParentScope::File,
        }
    }

    pub fn with_definition(mut self, is_definition: bool) -> Self {
        self.is_definition = is_definition;
        self
    }

    pub fn with_scope(mut self, scope: ParentScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// One entry of the generated tag file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Declaration {
        name: String,
        file: String,
        line: u32,
        column: u32,
        kind: DeclKind,
    },
    /// Marks a file as indexed; `name` is the basename.
    File { name: String, path: String },
    /// `address` is the ctags address (line or ex command), `0` for
    /// command-line defines.
    Macro {
        name: String,
        file: String,
        address: String,
    },
    /// Carried over verbatim from a previously generated tag file.
    Merged {
        name: String,
        file: String,
        excmd: String,
        fields: String,
    },
}

impl Tag {
    pub fn declaration(record: &SymbolRecord, file: &Path) -> Self {
        Tag::Declaration {
            name: record.name.clone(),
            file: file.to_string_lossy().into_owned(),
            line: record.line,
            column: record.column,
            kind: record.kind,
        }
    }

    pub fn file(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Tag::File {
            name,
            path: path.to_string_lossy().into_owned(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Declaration { name, .. }
            | Tag::File { name, .. }
            | Tag::Macro { name, .. }
            | Tag::Merged { name, .. } => name,
        }
    }

    pub fn file_path(&self) -> &str {
        match self {
            Tag::Declaration { file, .. } | Tag::Macro { file, .. } | Tag::Merged { file, .. } => {
                file
            }
            Tag::File { path, .. } => path,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Tag::Declaration { .. } => 0,
            Tag::File { .. } => 1,
            Tag::Macro { .. } => 2,
            Tag::Merged { .. } => 3,
        }
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name()
            .cmp(other.name())
            .then_with(|| self.rank().cmp(&other.rank()))
            .then_with(|| match (self, other) {
                (
                    Tag::Declaration { file: f1, line: l1, column: c1, kind: k1, .. },
                    Tag::Declaration { file: f2, line: l2, column: c2, kind: k2, .. },
                ) => (f1, l1, c1, k1).cmp(&(f2, l2, c2, k2)),
                (Tag::File { path: p1, .. }, Tag::File { path: p2, .. }) => p1.cmp(p2),
                (
                    Tag::Macro { file: f1, address: a1, .. },
                    Tag::Macro { file: f2, address: a2, .. },
                ) => (f1, a1).cmp(&(f2, a2)),
                (
                    Tag::Merged { file: f1, excmd: e1, fields: x1, .. },
                    Tag::Merged { file: f2, excmd: e2, fields: x2, .. },
                ) => (f1, e1, x1).cmp(&(f2, e2, x2)),
                _ => Ordering::Equal,
            })
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
