//! Run configuration.
//!
//! A [`Settings`] value is built once (from the command line, optionally on
//! top of a `.cpptags.toml` file) and passed by reference to every stage of
//! the run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TagsError};
use crate::index::{DeclKind, DEFAULT_RESERVED_WORDS};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = ".cpptags.toml";

pub const DEFAULT_CTAGS_PROGRAM: &str = "ctags";

/// Compiler-style inputs for the AST walker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileArgs {
    /// Flags without the leading dash, e.g. `std=c++14`. See
    /// [`CompileArgs::absorb_flags`].
    pub flags: Vec<String>,
    /// `NAME` or `NAME=value`.
    pub defines: Vec<String>,
    pub user_includes: Vec<PathBuf>,
    pub system_includes: Vec<PathBuf>,
}

impl CompileArgs {
    /// Fold the flags the tree-sitter walker understands into the other
    /// fields: `I<dir>`, `isystem<dir>`, `D<name>[=value]` (with or without
    /// a leading dash). Returns the flags that stay without effect.
    pub fn absorb_flags(&mut self) -> Vec<String> {
        let mut ignored = Vec::new();
        for flag in std::mem::take(&mut self.flags) {
            let bare = flag.strip_prefix('-').unwrap_or(&flag);
            if let Some(dir) = bare.strip_prefix("isystem") {
                self.system_includes.push(PathBuf::from(dir.trim_start_matches('=')));
            } else if let Some(dir) = bare.strip_prefix('I').filter(|d| !d.is_empty()) {
                self.user_includes.push(PathBuf::from(dir));
            } else if let Some(define) = bare.strip_prefix('D').filter(|d| !d.is_empty()) {
                self.defines.push(define.to_string());
            } else {
                ignored.push(flag);
            }
        }
        self.flags = ignored.clone();
        ignored
    }

    /// Include directories in search order: user first, then system.
    pub fn include_dirs(&self) -> impl Iterator<Item = &PathBuf> {
        self.user_includes.iter().chain(&self.system_includes)
    }

    /// Names of the command line macros (the part before `=`).
    pub fn define_names(&self) -> impl Iterator<Item = &str> {
        self.defines
            .iter()
            .map(|d| d.split_once('=').map_or(d.as_str(), |(name, _)| name))
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub compile: CompileArgs,
    pub sort: bool,
    pub include_system_tags: bool,
    pub use_ctags: bool,
    pub ctags_program: String,
    pub kinds: HashSet<DeclKind>,
    pub reserved_words: Vec<String>,
    /// Prior tag file; enables incremental mode.
    pub input_tagfile: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub syntax_file: Option<PathBuf>,
    pub input_files: Vec<PathBuf>,
}

impl Settings {
    pub fn is_incremental(&self) -> bool {
        self.input_tagfile.is_some()
    }

    pub fn allows(&self, kind: DeclKind) -> bool {
        self.kinds.contains(&kind)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compile: CompileArgs::default(),
            sort: true,
            include_system_tags: true,
            use_ctags: true,
            ctags_program: DEFAULT_CTAGS_PROGRAM.to_string(),
            kinds: DeclKind::default_allowed().into_iter().collect(),
            reserved_words: DEFAULT_RESERVED_WORDS.iter().map(|w| w.to_string()).collect(),
            input_tagfile: None,
            output: None,
            syntax_file: None,
            input_files: Vec::new(),
        }
    }
}

/// Contents of a `.cpptags.toml` file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub flags: Vec<String>,
    pub defines: Vec<String>,
    pub user_includes: Vec<PathBuf>,
    pub system_includes: Vec<PathBuf>,
    pub sort: Option<bool>,
    pub include_system_tags: Option<bool>,
    pub use_ctags: Option<bool>,
    pub ctags: Option<String>,
    pub kinds: Option<Vec<String>>,
    pub reserved_words: Option<Vec<String>>,
}

impl ConfigFile {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| TagsError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| TagsError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Starting point for the command line overrides.
    pub fn into_settings(self) -> Result<Settings> {
        let defaults = Settings::default();
        let kinds = match self.kinds {
            Some(labels) => parse_kinds(&labels)?,
            None => defaults.kinds,
        };
        Ok(Settings {
            compile: CompileArgs {
                flags: self.flags,
                defines: self.defines,
                user_includes: self.user_includes,
                system_includes: self.system_includes,
            },
            sort: self.sort.unwrap_or(defaults.sort),
            include_system_tags: self.include_system_tags.unwrap_or(defaults.include_system_tags),
            use_ctags: self.use_ctags.unwrap_or(defaults.use_ctags),
            ctags_program: self.ctags.unwrap_or(defaults.ctags_program),
            kinds,
            reserved_words: self.reserved_words.unwrap_or(defaults.reserved_words),
            ..defaults
        })
    }
}

/// Parse kind labels such as `class-def` or `method`.
pub fn parse_kinds<S: AsRef<str>>(labels: &[S]) -> Result<HashSet<DeclKind>> {
    labels
        .iter()
        .map(|label| {
            let label = label.as_ref().trim();
            DeclKind::from_label(label)
                .ok_or_else(|| TagsError::Config(format!("unknown kind '{}'", label)))
        })
        .collect()
}
