use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Result, TagsError};

static CTAGS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([^\t]+)\t([^\t]+)\t([^\t]+);"\t.*$"#).expect("ctags line pattern is valid")
});

/// A preprocessor macro definition found by the definition finder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDef {
    pub name: String,
    pub file: String,
    /// Line number or ex command locating the definition.
    pub address: String,
}

/// Finds `#define`s in a set of files.
pub trait MacroExtractor {
    fn extract_macros(&self, files: &[String], sorted: bool) -> Result<Vec<MacroDef>>;
}

/// Runs Exuberant/Universal ctags restricted to macro definitions.
pub struct CtagsExtractor {
    program: String,
}

impl CtagsExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn args(&self, files: &[String], sorted: bool) -> Vec<String> {
        let mut args = vec![
            "--c++-kinds=d".to_string(),
            format!("--sort={}", if sorted { "yes" } else { "no" }),
            "-o".to_string(),
            "-".to_string(),
        ];
        args.extend(files.iter().cloned());
        args
    }
}

impl MacroExtractor for CtagsExtractor {
    fn extract_macros(&self, files: &[String], sorted: bool) -> Result<Vec<MacroDef>> {
        debug!("Running {} over {} files", self.program, files.len());

        let output = Command::new(&self.program)
            .args(self.args(files, sorted))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| TagsError::MacroExtractor(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TagsError::MacroExtractor(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(parse_ctags_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `name<TAB>file<TAB>address;"<TAB>...` lines, skipping anything else.
pub fn parse_ctags_output(output: &str) -> Vec<MacroDef> {
    output
        .lines()
        .filter(|line| !line.starts_with('!'))
        .filter_map(|line| CTAGS_LINE.captures(line))
        .map(|caps| MacroDef {
            name: caps[1].to_string(),
            file: caps[2].to_string(),
            address: caps[3].to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ctags_output() {
        let output = "!_TAG_FILE_FORMAT\t2\t/extended format/\n\
MAX_SIZE\tsrc/w.h\t3;\"\td\n\
TRACE\tsrc/log.h\t/^#define TRACE(x)$/;\"\td\tfile:\n\
garbage line\n";

        let macros = parse_ctags_output(output);
        assert_eq!(
            macros,
            vec![
                MacroDef {
                    name: "MAX_SIZE".to_string(),
                    file: "src/w.h".to_string(),
                    address: "3".to_string(),
                },
                MacroDef {
                    name: "TRACE".to_string(),
                    file: "src/log.h".to_string(),
                    address: "/^#define TRACE(x)$/".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_ctags_output_empty() {
        assert!(parse_ctags_output("").is_empty());
    }

    #[test]
    fn test_ctags_args() {
        let extractor = CtagsExtractor::new("ctags");
        let files = vec!["a.h".to_string(), "b.cpp".to_string()];

        assert_eq!(
            extractor.args(&files, true),
            vec!["--c++-kinds=d", "--sort=yes", "-o", "-", "a.h", "b.cpp"]
        );
        assert_eq!(extractor.args(&files, false)[1], "--sort=no");
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let extractor = CtagsExtractor::new("cpptags-no-such-ctags-binary");
        let err = extractor
            .extract_macros(&["a.h".to_string()], true)
            .unwrap_err();
        assert!(matches!(err, TagsError::MacroExtractor(_)));
    }
}
