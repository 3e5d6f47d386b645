use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::config::Settings;
use crate::error::Result;
use crate::index::merge::kind_field;
use crate::index::{
    write_syntax, BucketKind, DeclKind, SymbolRecord, SyntaxClassifier, Tag, TagStore,
    TagWriter, TagfileMerger, COMMAND_LINE_FILE,
};
use crate::indexer::extractor::AstWalker;
use crate::indexer::filter::RecordFilter;
use crate::indexer::macros::MacroExtractor;

/// Collects the tags and highlighting keywords of a single run.
pub struct Collector<'a> {
    settings: &'a Settings,
    store: TagStore,
    syntax: SyntaxClassifier,
}

impl<'a> Collector<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            store: TagStore::new(settings.sort),
            syntax: SyntaxClassifier::new(settings.reserved_words.iter().cloned()),
        }
    }

    /// Add the accepted records of one translation unit. `active_file` is the
    /// input being processed in incremental mode.
    pub fn collect_records<I>(&mut self, records: I, active_file: Option<&Path>) -> usize
    where
        I: IntoIterator<Item = SymbolRecord>,
    {
        let filter = match active_file {
            Some(active) => RecordFilter::new(self.settings).with_active_file(active),
            None => RecordFilter::new(self.settings),
        };

        let mut accepted = 0;
        for record in records {
            if !filter.accepts(&record) {
                continue;
            }
            let Some(file) = record.file_path() else {
                continue;
            };
            self.store.add(Tag::declaration(&record, file));
            self.store.add(Tag::file(file));
            if let Some(bucket) = record.kind.bucket() {
                self.syntax.add(bucket, &record.name);
            }
            accepted += 1;
        }
        accepted
    }

    /// Fold in entries of a previous tag file for files not re-indexed now.
    pub fn merge_tagfile(&mut self, path: &Path) -> Result<usize> {
        let tags = TagfileMerger::new(&self.settings.input_files).load(path)?;
        let merged = tags.len();
        for tag in tags {
            if let Tag::Merged { name, fields, .. } = &tag {
                self.classify_merged(name, fields);
            }
            self.store.add(tag);
        }
        info!("Merged {} tags from {}", merged, path.display());
        Ok(merged)
    }

    fn classify_merged(&mut self, name: &str, fields: &str) {
        let bucket = match kind_field(fields) {
            Some("d") => Some(BucketKind::Constant),
            Some(label) => DeclKind::from_label(label).and_then(|kind| kind.bucket()),
            None => None,
        };
        if let Some(bucket) = bucket {
            self.syntax.add(bucket, name);
        }
    }

    /// Add macro definitions for the indexed files and the command line
    /// defines. Skipped when no file has been indexed.
    pub fn collect_macros(&mut self, extractor: &dyn MacroExtractor) -> Result<usize> {
        let files = self.store.files();
        if files.is_empty() {
            debug!("No indexed files, skipping macro extraction");
            return Ok(0);
        }

        let macros = extractor.extract_macros(&files, self.settings.sort)?;
        let mut added = 0;
        for def in macros {
            self.syntax.add_constant(&def.name);
            self.store.add(Tag::Macro {
                name: def.name,
                file: def.file,
                address: def.address,
            });
            added += 1;
        }

        for name in self.settings.compile.define_names() {
            self.syntax.add_constant(name);
            self.store.add(Tag::Macro {
                name: name.to_string(),
                file: COMMAND_LINE_FILE.to_string(),
                address: "0".to_string(),
            });
            added += 1;
        }

        debug!("Collected {} macro tags", added);
        Ok(added)
    }

    pub fn finish(mut self) -> TagIndex {
        self.syntax.finalize();
        TagIndex {
            tags: self.store,
            syntax: self.syntax,
        }
    }
}

/// Result of a run, ready to be written.
pub struct TagIndex {
    pub tags: TagStore,
    pub syntax: SyntaxClassifier,
}

impl TagIndex {
    /// Write the header and every tag. Consumes the index; render the syntax
    /// keywords before calling this.
    pub fn write_tags<W: Write>(self, out: W) -> Result<usize> {
        let mut writer = TagWriter::new(out);
        writer.write_header(self.tags.is_sorted())?;
        let written = self.tags.write_all(&mut writer)?;
        writer.flush()?;
        Ok(written)
    }

    pub fn write_syntax<W: Write>(&self, out: &mut W) -> Result<usize> {
        write_syntax(&self.syntax, out)
    }
}

/// Walk every input file, merge the previous tag file in incremental mode
/// and add macro tags.
///
/// A parse failure aborts the run before anything is written.
pub fn generate(
    settings: &Settings,
    walker: &mut dyn AstWalker,
    macros: &dyn MacroExtractor,
) -> Result<TagIndex> {
    let mut collector = Collector::new(settings);

    for file in &settings.input_files {
        let records = walker.walk(file, &settings.compile)?;
        let active = settings.is_incremental().then_some(file.as_path());
        let accepted = collector.collect_records(records, active);
        debug!("{}: {} tags", file.display(), accepted);
    }

    if let Some(prior) = &settings.input_tagfile {
        collector.merge_tagfile(prior)?;
    }

    if settings.use_ctags {
        collector.collect_macros(macros)?;
    }

    Ok(collector.finish())
}
