use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;

use crate::error::Result;
use crate::languages::{CppGrammar, LanguageGrammar};

/// Expands input paths: files are kept as given, directories are replaced
/// by the C/C++ sources below them.
pub struct FileWalker {
    grammar: Arc<dyn LanguageGrammar>,
}

impl FileWalker {
    pub fn new(grammar: Arc<dyn LanguageGrammar>) -> Self {
        Self { grammar }
    }

    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if path.is_file() && self.is_supported(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    pub fn expand(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for input in inputs {
            if input.is_dir() {
                files.extend(self.walk(input)?);
            } else {
                files.push(input.clone());
            }
        }
        Ok(files)
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.grammar.supports(path)
    }
}

impl Default for FileWalker {
    fn default() -> Self {
        Self::new(Arc::new(CppGrammar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_walk_finds_cpp_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "src/widget.cpp", "");
        create_file(temp_dir.path(), "include/widget.h", "");
        create_file(temp_dir.path(), "README.md", "");

        let files = FileWalker::default().walk(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("include/widget.h"));
        assert!(files[1].ends_with("src/widget.cpp"));
    }

    #[test]
    fn test_walk_skips_hidden() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "visible.cpp", "");
        create_file(temp_dir.path(), ".hidden/secret.cpp", "");

        let files = FileWalker::default().walk(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("visible.cpp"));
    }

    #[test]
    fn test_expand_keeps_files_and_walks_dirs() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "lib/a.cc", "");
        create_file(temp_dir.path(), "main.cpp", "");

        let inputs = vec![
            temp_dir.path().join("main.cpp"),
            temp_dir.path().join("lib"),
            PathBuf::from("generated.cpp"),
        ];
        let files = FileWalker::default().expand(&inputs).unwrap();

        assert_eq!(
            files,
            vec![
                temp_dir.path().join("main.cpp"),
                temp_dir.path().join("lib/a.cc"),
                PathBuf::from("generated.cpp"),
            ]
        );
    }
}
