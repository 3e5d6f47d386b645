use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::Result;
use crate::index::models::{Tag, COMMAND_LINE_FILE};

static TAG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([^\t]+)\t([^\t]+)\t([^\t]+?);"\t(.*)$"#).expect("tag line pattern is valid")
});

/// Reads a previously generated tag file and keeps the entries of files
/// that are not being re-indexed. Command line defines are always dropped
/// since every run emits its own.
pub struct TagfileMerger<'a> {
    reindexed: &'a [PathBuf],
}

impl<'a> TagfileMerger<'a> {
    pub fn new(reindexed: &'a [PathBuf]) -> Self {
        Self { reindexed }
    }

    /// Load `path`. A missing file yields no tags.
    pub fn load(&self, path: &Path) -> Result<Vec<Tag>> {
        if !path.exists() {
            info!("Input tagfile {} does not exist yet", path.display());
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)?;
        let tags = self.parse(&content);
        debug!("Kept {} tags from {}", tags.len(), path.display());
        Ok(tags)
    }

    pub fn parse(&self, content: &str) -> Vec<Tag> {
        content
            .lines()
            .filter(|line| !line.starts_with('!'))
            .filter_map(parse_line)
            .filter(|tag| !self.is_reindexed(tag.file_path()))
            .collect()
    }

    fn is_reindexed(&self, file: &str) -> bool {
        if file == COMMAND_LINE_FILE {
            return true;
        }
        let file = Path::new(file);
        self.reindexed.iter().any(|input| file.ends_with(input))
    }
}

fn parse_line(line: &str) -> Option<Tag> {
    let caps = TAG_LINE.captures(line)?;
    Some(Tag::Merged {
        name: caps[1].to_string(),
        file: caps[2].to_string(),
        excmd: caps[3].to_string(),
        fields: caps[4].to_string(),
    })
}

/// Value of the `kind:` extension field of a merged tag.
pub fn kind_field(fields: &str) -> Option<&str> {
    fields
        .split('\t')
        .find_map(|field| field.strip_prefix("kind:"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PRIOR: &str = "!_TAG_FILE_FORMAT\t2\t/extended format/\n\
!_TAG_FILE_SORTED\t1\t/0=unsorted, 1=sorted, 2=foldcase/\n\
a.cpp\tsrc/a.cpp\t1;\"\tkind:F\n\
alpha\tsrc/a.cpp\t:call cursor(3,5)|;\"\tkind:function-def\n\
b.h\tsrc/b.h\t1;\"\tkind:F\n\
beta\tsrc/b.h\t:call cursor(1,7)|;\"\tkind:class-def\n\
BETA_MAX\tsrc/b.h\t4;\"\tkind:d\n\
this line is not a tag\n\
\n";

    #[test]
    fn test_parse_drops_reindexed_files() {
        let reindexed = vec![PathBuf::from("src/a.cpp")];
        let tags = TagfileMerger::new(&reindexed).parse(PRIOR);

        let names: Vec<_> = tags.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["b.h", "beta", "BETA_MAX"]);
        assert!(tags.iter().all(|t| matches!(t, Tag::Merged { .. })));
    }

    #[test]
    fn test_parse_matches_reindexed_by_path_suffix() {
        let reindexed = vec![PathBuf::from("a.cpp")];
        let tags = TagfileMerger::new(&reindexed).parse(PRIOR);
        assert!(tags.iter().all(|t| t.file_path() == "src/b.h"));

        let reindexed = vec![PathBuf::from("pa.cpp")];
        let tags = TagfileMerger::new(&reindexed).parse(PRIOR);
        assert_eq!(tags.len(), 5);
    }

    #[test]
    fn test_parse_drops_command_line_defines() {
        let content = "TRACE\t<command-line>\t0;\"\tkind:d\nb.h\tsrc/b.h\t1;\"\tkind:F\n";
        let tags = TagfileMerger::new(&[]).parse(content);

        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name(), "b.h");
    }

    #[test]
    fn test_parse_keeps_fields_verbatim() {
        let tags = TagfileMerger::new(&[]).parse("x\tf.h\t/^int x;$/;\"\tkind:v\tline:3\n");
        assert_eq!(
            tags,
            vec![Tag::Merged {
                name: "x".to_string(),
                file: "f.h".to_string(),
                excmd: "/^int x;$/".to_string(),
                fields: "kind:v\tline:3".to_string(),
            }]
        );
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let content = "only\ttwo\n\tf.h\t1;\"\tkind:F\nname\tfile\t12\tkind:d\n";
        assert!(TagfileMerger::new(&[]).parse(content).is_empty());
    }

    #[test]
    fn test_excmd_with_tab_is_malformed() {
        let content = "n\tf\ta\tb;\"\tkind:d\nok\tf\t3;\"\tkind:d\n";
        let tags = TagfileMerger::new(&[]).parse(content);

        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name(), "ok");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let tags = TagfileMerger::new(&[])
            .load(&temp_dir.path().join("tags"))
            .unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_load_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tags");
        fs::write(&path, PRIOR).unwrap();

        let tags = TagfileMerger::new(&[]).load(&path).unwrap();
        assert_eq!(tags.len(), 5);
    }

    #[test]
    fn test_kind_field() {
        assert_eq!(kind_field("kind:d"), Some("d"));
        assert_eq!(kind_field("line:3\tkind:class-def"), Some("class-def"));
        assert_eq!(kind_field("class"), None);
    }
}
