use std::io::Write;

use crate::error::Result;
use crate::index::models::Tag;
use crate::index::syntax::SyntaxClassifier;

const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");
const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writes tags in the extended ctags format understood by Vim.
pub struct TagWriter<W: Write> {
    out: W,
}

impl<W: Write> TagWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_header(&mut self, sorted: bool) -> Result<()> {
        writeln!(
            self.out,
            "!_TAG_FILE_FORMAT\t2\t/extended format; --format=1 will not append ;\" to lines/"
        )?;
        writeln!(
            self.out,
            "!_TAG_FILE_SORTED\t{}\t/0=unsorted, 1=sorted, 2=foldcase/",
            if sorted { 1 } else { 0 }
        )?;
        writeln!(self.out, "!_TAG_PROGRAM_NAME\t{}\t//", PROGRAM_NAME)?;
        writeln!(self.out, "!_TAG_PROGRAM_VERSION\t{}\t//", PROGRAM_VERSION)?;
        Ok(())
    }

    pub fn write_tag(&mut self, tag: &Tag) -> Result<()> {
        writeln!(self.out, "{}", format_tag(tag))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn format_tag(tag: &Tag) -> String {
    match tag {
        Tag::File { name, path } => format!("{}\t{}\t1;\"\tkind:F", name, path),
        Tag::Macro {
            name,
            file,
            address,
        } => format!("{}\t{}\t{};\"\tkind:d", name, file, address),
        Tag::Merged {
            name,
            file,
            excmd,
            fields,
        } => format!("{}\t{}\t{};\"\t{}", name, file, excmd, fields),
        Tag::Declaration {
            name,
            file,
            line,
            column,
            kind,
        } => format!(
            "{}\t{}\t:call cursor({},{})|;\"\tkind:{}",
            name,
            file,
            line,
            column,
            kind.label()
        ),
    }
}

/// Writes one `syntax keyword` line per non-empty bucket.
pub fn write_syntax<W: Write>(classifier: &SyntaxClassifier, out: &mut W) -> Result<usize> {
    let mut lines = 0;
    for (kind, names) in classifier.buckets() {
        if names.is_empty() {
            continue;
        }
        let keywords: Vec<&str> = names.iter().map(String::as_str).collect();
        writeln!(out, "syntax keyword {} {}", kind.group_name(), keywords.join(" "))?;
        lines += 1;
    }
    Ok(lines)
}
