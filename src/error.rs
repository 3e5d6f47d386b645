use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse '{}'", file.display())]
    Parse {
        file: PathBuf,
        diagnostics: Vec<String>,
    },

    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("Macro extractor error: {0}")]
    MacroExtractor(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TagsError>;
