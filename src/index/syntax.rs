use std::collections::{BTreeSet, HashSet};

use crate::index::models::BucketKind;

/// Words that are options of Vim's `:syntax keyword` and therefore cannot be
/// highlighted as keywords.
pub const DEFAULT_RESERVED_WORDS: &[&str] = &[
    "cchar",
    "conceal",
    "concealends",
    "contained",
    "containedin",
    "contains",
    "display",
    "excludenl",
    "extend",
    "fold",
    "keepend",
    "nextgroup",
    "oneline",
    "skipempty",
    "skipnl",
    "skipwhite",
    "transparent",
];

/// Splits symbol names into the highlighting buckets.
///
/// Buckets are kept in priority order (see [`BucketKind::BY_PRIORITY`]).
/// After [`SyntaxClassifier::finalize`] a name only remains in the highest
/// priority bucket it was added to.
#[derive(Debug)]
pub struct SyntaxClassifier {
    buckets: [(BucketKind, BTreeSet<String>); 4],
    reserved: HashSet<String>,
}

impl SyntaxClassifier {
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            buckets: BucketKind::BY_PRIORITY.map(|kind| (kind, BTreeSet::new())),
            reserved: reserved.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add(&mut self, bucket: BucketKind, name: &str) {
        match bucket {
            BucketKind::Identifier => self.add_identifier(name),
            BucketKind::Function => self.add_function(name),
            BucketKind::Constant => self.add_constant(name),
            BucketKind::Type => self.add_type(name),
        }
    }

    pub fn add_type(&mut self, name: &str) {
        self.insert(BucketKind::Type, name);
    }

    pub fn add_constant(&mut self, name: &str) {
        self.insert(BucketKind::Constant, name);
    }

    pub fn add_identifier(&mut self, name: &str) {
        self.insert(BucketKind::Identifier, name);
    }

    /// Operator overloads are skipped and template arguments are stripped,
    /// so `make<T>` is stored as `make`.
    pub fn add_function(&mut self, name: &str) {
        if name.starts_with("operator") {
            return;
        }
        self.insert(BucketKind::Function, strip_template_args(name));
    }

    fn insert(&mut self, bucket: BucketKind, name: &str) {
        if name.is_empty() || self.reserved.contains(name) {
            return;
        }
        self.buckets[bucket.priority()].1.insert(name.to_string());
    }

    /// Remove from every bucket the names that also appear in a bucket of
    /// higher priority.
    pub fn finalize(&mut self) {
        for high in 1..self.buckets.len() {
            let (lower, upper) = self.buckets.split_at_mut(high);
            let winners = &upper[0].1;
            for (_, names) in lower.iter_mut() {
                names.retain(|name| !winners.contains(name));
            }
        }
    }

    pub fn bucket(&self, kind: BucketKind) -> &BTreeSet<String> {
        &self.buckets[kind.priority()].1
    }

    /// Buckets in priority order, lowest first.
    pub fn buckets(&self) -> impl Iterator<Item = (BucketKind, &BTreeSet<String>)> {
        self.buckets.iter().map(|(kind, names)| (*kind, names))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|(_, names)| names.is_empty())
    }
}

impl Default for SyntaxClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_WORDS.iter().copied())
    }
}

/// Strip a trailing template argument list. Everything from the first `<`
/// is dropped, so nested arguments are removed as a whole.
fn strip_template_args(name: &str) -> &str {
    if !name.ends_with('>') {
        return name;
    }
    match name.find('<') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}
