use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use cpptags::config::{parse_kinds, ConfigFile, Settings, DEFAULT_CONFIG_FILE};
use cpptags::{generate, CtagsExtractor, FileWalker, SymbolExtractor};

#[derive(Parser, Debug)]
#[command(name = "cpptags")]
#[command(about = "Generate Vim tags and syntax keywords for C/C++ sources using tree-sitter")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Index a source tree, tags on stdout
    cpptags src/ > tags

    # Index with include paths and a define, also emit highlighting keywords
    cpptags -I include -d NDEBUG -s tags.vim -o tags src/main.cpp

    # Re-index one file, keeping the other entries of an existing tag file
    cpptags -t tags -o tags src/widget.cpp

    # Skip macro extraction and system headers
    cpptags -C -Y -i /usr/include src/
"#)]
pub struct Cli {
    /// Keep tags in discovery order instead of sorting them
    #[arg(short = 'S', long = "no-sort")]
    pub no_sort: bool,

    /// Compiler flag, passed to the parser as -<FLAG> (repeatable)
    #[arg(short = 'c', long = "flag", value_name = "FLAG", allow_hyphen_values = true)]
    pub flags: Vec<String>,

    /// Preprocessor define, NAME or NAME=VALUE (repeatable)
    #[arg(short = 'd', long = "define", value_name = "DEFINE")]
    pub defines: Vec<String>,

    /// User include directory (repeatable)
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    pub user_includes: Vec<PathBuf>,

    /// System include directory (repeatable)
    #[arg(short = 'i', long = "system-include", value_name = "DIR")]
    pub system_includes: Vec<PathBuf>,

    /// Do not tag declarations found under system include directories
    #[arg(short = 'Y', long = "no-include-system-includes")]
    pub no_system_tags: bool,

    /// Do not run ctags for macro definitions
    #[arg(short = 'C', long = "no-use-ctags")]
    pub no_ctags: bool,

    /// Existing tag file to update; only entries of the given inputs are replaced
    #[arg(short = 't', long = "input-tagfile", value_name = "FILE")]
    pub input_tagfile: Option<PathBuf>,

    /// Output tag file (default: stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write Vim syntax keywords to this file
    #[arg(short = 's', long = "syntax-file", value_name = "FILE")]
    pub syntax_file: Option<PathBuf>,

    /// Declaration kinds to tag, by label (e.g. class-def,method)
    #[arg(long, value_delimiter = ',', value_name = "KINDS")]
    pub kinds: Vec<String>,

    /// ctags program used for macro definitions
    #[arg(long, value_name = "PROGRAM")]
    pub ctags: Option<String>,

    /// Config file (default: .cpptags.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Source files or directories
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,
}

impl Cli {
    /// Build the run settings: config file first, then command line values.
    pub fn into_settings(self) -> Result<Settings> {
        let config = match &self.config {
            Some(path) => ConfigFile::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                ConfigFile::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => ConfigFile::default(),
        };
        let mut settings = config.into_settings()?;

        let compile = &mut settings.compile;
        compile.flags.extend(self.flags);
        compile.defines.extend(self.defines);
        compile.user_includes.extend(self.user_includes);
        compile.system_includes.extend(self.system_includes);
        for flag in compile.absorb_flags() {
            warn!("Compiler flag -{} has no effect on the tree-sitter walker", flag);
        }

        settings.sort &= !self.no_sort;
        settings.include_system_tags &= !self.no_system_tags;
        settings.use_ctags &= !self.no_ctags;

        if !self.kinds.is_empty() {
            settings.kinds = parse_kinds(&self.kinds)?;
        }
        if let Some(program) = self.ctags {
            settings.ctags_program = program;
        }

        settings.input_tagfile = self.input_tagfile;
        settings.output = self.output;
        settings.syntax_file = self.syntax_file;
        settings.input_files = FileWalker::default().expand(&self.inputs)?;

        Ok(settings)
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let settings = cli.into_settings()?;
    if settings.input_files.is_empty() {
        warn!("No C/C++ sources found in the given inputs");
    }
    info!("Indexing {} files", settings.input_files.len());

    let mut walker = SymbolExtractor::default();
    let ctags = CtagsExtractor::new(settings.ctags_program.clone());
    let index = generate(&settings, &mut walker, &ctags)?;

    // Render both outputs before touching the disk; tag file first.
    let mut syntax = Vec::new();
    let keywords = index.write_syntax(&mut syntax)?;
    let mut tags = Vec::new();
    let written = index.write_tags(&mut tags)?;

    match &settings.output {
        Some(path) => {
            fs::write(path, &tags).with_context(|| format!("failed to write {}", path.display()))?
        }
        None => io::stdout().lock().write_all(&tags)?,
    }
    info!("Wrote {} tags", written);

    if let Some(path) = &settings.syntax_file {
        fs::write(path, &syntax).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote {} syntax keywords to {}", keywords, path.display());
    }

    Ok(())
}
