use std::path::Path;

use crate::config::Settings;
use crate::index::{DeclKind, ParentScope, SymbolRecord};

/// Decides whether a symbol record makes it into the tag file.
pub struct RecordFilter<'a> {
    settings: &'a Settings,
    /// Only set in incremental mode.
    active_file: Option<&'a Path>,
}

impl<'a> RecordFilter<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            active_file: None,
        }
    }

    pub fn with_active_file(mut self, file: &'a Path) -> Self {
        self.active_file = Some(file);
        self
    }

    pub fn accepts(&self, record: &SymbolRecord) -> bool {
        let Some(file) = record.file_path() else {
            return false;
        };

        !record.name.is_empty()
            && self.settings.allows(record.kind)
            && !self.is_system_file(file)
            && (record.is_definition || !record.kind.is_definition_only())
            && (record.kind != DeclKind::Variable || is_visible_scope(record.scope))
            && self.active_file.map_or(true, |active| file.ends_with(active))
    }

    fn is_system_file(&self, file: &Path) -> bool {
        !self.settings.include_system_tags
            && self
                .settings
                .compile
                .system_includes
                .iter()
                .any(|prefix| file.starts_with(prefix))
    }
}

/// Variables are tagged at file, namespace and class level only.
fn is_visible_scope(scope: ParentScope) -> bool {
    matches!(
        scope,
        ParentScope::File | ParentScope::Namespace | ParentScope::Class | ParentScope::Struct
    )
}
