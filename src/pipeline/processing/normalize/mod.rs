pub mod vocabulary;

use std::collections::{HashMap, HashSet};

use crate::domain::{Category, Country, Currency, Department, Gender, State};
pub use vocabulary::AliasTable;

/// Canonicalize a raw key for lookup: trim, lowercase, collapse inner whitespace.
pub fn canonical_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Title Case in the way spreadsheet tools do it: the first letter after any
/// non-letter is uppercased, every other letter lowercased.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_alphabetic = false;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if previous_alphabetic {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_alphabetic = true;
        } else {
            out.push(ch);
            previous_alphabetic = false;
        }
    }
    out
}

/// The set of raw tokens that stand for "no value"
#[derive(Debug, Clone)]
pub struct MissingTokens {
    tokens: HashSet<String>,
}

impl MissingTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: tokens.into_iter().map(|t| canonical_key(t.as_ref())).collect(),
        }
    }

    /// Blank input is always missing, whatever the configured tokens.
    pub fn is_missing(&self, raw: &str) -> bool {
        let key = canonical_key(raw);
        key.is_empty() || self.tokens.contains(&key)
    }
}

impl Default for MissingTokens {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_MISSING_TOKENS)
    }
}

/// Static lookup from canonicalized raw spelling to a vocabulary member
#[derive(Debug, Clone)]
pub struct LookupTable<T> {
    entries: HashMap<String, T>,
}

impl<T: AliasTable> LookupTable<T> {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        for value in T::all() {
            entries.insert(canonical_key(value.canonical()), *value);
        }
        for (alias, value) in T::aliases() {
            entries.insert(canonical_key(alias), *value);
        }
        Self { entries }
    }

    /// Map a raw value onto the vocabulary. Unknown spellings come back
    /// trimmed but otherwise untouched.
    pub fn lookup(&self, raw: &str) -> Category<T> {
        match self.entries.get(&canonical_key(raw)) {
            Some(value) => Category::Canonical(*value),
            None => Category::Unrecognized(raw.trim().to_string()),
        }
    }
}

impl<T: AliasTable> Default for LookupTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Text and categorical standardization for one record's fields.
///
/// Pure: every method maps input text to output value and nothing else.
/// Counting unrecognized values is the caller's job.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    pub gender: LookupTable<Gender>,
    pub department: LookupTable<Department>,
    pub currency: LookupTable<Currency>,
    pub country: LookupTable<Country>,
    pub state: LookupTable<State>,
    missing: MissingTokens,
}

impl Normalizer {
    pub fn new(missing: MissingTokens) -> Self {
        Self {
            missing,
            ..Default::default()
        }
    }

    /// Trimmed text, or `None` for a missing token
    pub fn text(&self, raw: &str) -> Option<String> {
        if self.missing.is_missing(raw) {
            None
        } else {
            Some(raw.trim().to_string())
        }
    }

    pub fn title(&self, raw: &str) -> Option<String> {
        self.text(raw).map(|s| title_case(&s))
    }

    pub fn email(&self, raw: &str) -> Option<String> {
        self.text(raw).map(|s| s.to_lowercase())
    }

    pub fn category<T: AliasTable>(
        &self,
        table: &LookupTable<T>,
        raw: &str,
    ) -> Option<Category<T>> {
        if self.missing.is_missing(raw) {
            None
        } else {
            Some(table.lookup(raw))
        }
    }
}
