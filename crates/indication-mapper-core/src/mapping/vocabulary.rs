//! ICD-10 code vocabulary.
//!
//! A read-only table keyed by canonical indication name. Iteration order is the
//! insertion order and acts as the tie-break for synonym matches.

use std::collections::HashMap;

use strsim::{jaro_winkler, normalized_levenshtein};

use crate::models::CodeEntry;

/// Canonical indication names mapped to their ICD-10 codes.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    entries: Vec<(String, Vec<CodeEntry>)>,
    /// Lower-cased canonical name → position in `entries`
    index: HashMap<String, usize>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    /// Create the vocabulary with the default code table.
    pub fn new() -> Self {
        Self::from_entries(Self::default_entries())
    }

    /// Build a vocabulary from ordered entries.
    ///
    /// A repeated canonical name (ignoring case) keeps its first position and
    /// takes the later codes.
    pub fn from_entries(entries: Vec<(String, Vec<CodeEntry>)>) -> Self {
        let mut vocabulary = Self {
            entries: Vec::with_capacity(entries.len()),
            index: HashMap::new(),
        };
        for (name, codes) in entries {
            let key = name.to_lowercase();
            match vocabulary.index.get(&key) {
                Some(&pos) => vocabulary.entries[pos].1 = codes,
                None => {
                    vocabulary.index.insert(key, vocabulary.entries.len());
                    vocabulary.entries.push((name, codes));
                }
            }
        }
        vocabulary
    }

    /// Look up the codes for a canonical name.
    pub fn lookup(&self, canonical_name: &str) -> Option<&[CodeEntry]> {
        self.entries
            .iter()
            .find(|(name, _)| name == canonical_name)
            .map(|(_, codes)| codes.as_slice())
    }

    /// Find the entry whose canonical name equals `text`, ignoring case.
    pub fn find_canonical(&self, text: &str) -> Option<(&str, &[CodeEntry])> {
        self.index.get(&text.to_lowercase()).map(|&pos| {
            let (name, codes) = &self.entries[pos];
            (name.as_str(), codes.as_slice())
        })
    }

    /// Iterate entries in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CodeEntry])> {
        self.entries
            .iter()
            .map(|(name, codes)| (name.as_str(), codes.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tokens of `statement` that occur in no canonical name or synonym.
    pub fn unmapped_terms(&self, statement: &str) -> Vec<String> {
        let known: Vec<String> = self
            .entries
            .iter()
            .flat_map(|(name, codes)| {
                std::iter::once(name.as_str())
                    .chain(codes.iter().flat_map(|c| c.synonyms.iter().map(|s| s.as_str())))
            })
            .flat_map(tokenize)
            .collect();

        tokenize(statement)
            .into_iter()
            .filter(|token| !known.contains(token))
            .collect()
    }

    /// Canonical names closest to `statement`, best first.
    pub fn suggest(&self, statement: &str, limit: usize) -> Vec<String> {
        let query = statement.to_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .entries
            .iter()
            .map(|(name, _)| (fuzzy_match(&query, &name.to_lowercase()), name.as_str()))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Default ICD-10 mappings.
    fn default_entries() -> Vec<(String, Vec<CodeEntry>)> {
        vec![
            (
                "Asthma".into(),
                vec![CodeEntry::new(
                    "J45.901",
                    "Unspecified asthma with (acute) exacerbation",
                    &["Bronchial Asthma", "Asthma Attack"],
                )],
            ),
            (
                "Chronic Obstructive Pulmonary Disease (COPD)".into(),
                vec![CodeEntry::new(
                    "J44.9",
                    "Chronic obstructive pulmonary disease, unspecified",
                    &["COPD", "Chronic Bronchitis", "Emphysema"],
                )],
            ),
            (
                "Dermatology - Dermatitis / Eczema / Rosacea".into(),
                vec![
                    CodeEntry::new(
                        "L30.9",
                        "Dermatitis, unspecified",
                        &["Eczema", "Dermatitis", "Rosacea"],
                    ),
                    CodeEntry::new("L71.9", "Rosacea, unspecified", &["Acne Rosacea", "Rosacea"]),
                ],
            ),
            (
                "Severe Asthma".into(),
                vec![CodeEntry::new(
                    "J45.902",
                    "Severe asthma with (acute) exacerbation",
                    &["Severe Persistent Asthma", "Refractory Asthma"],
                )],
            ),
            (
                "Dermatology - Atopic Dermatitis".into(),
                vec![CodeEntry::new(
                    "L20.9",
                    "Atopic dermatitis, unspecified",
                    &["Atopic Eczema", "AD", "Eczema"],
                )],
            ),
            (
                "Chronic Rhinosinusitis with Nasal Polyposis (CRSwNP)".into(),
                vec![CodeEntry::new(
                    "J33.8",
                    "Other polyp of sinus",
                    &["CRSwNP", "Nasal Polyps", "Chronic Sinusitis with Polyps"],
                )],
            ),
            (
                "Eosinophilic Esophagitis".into(),
                vec![CodeEntry::new(
                    "K20.0",
                    "Eosinophilic esophagitis",
                    &["EoE", "Allergic Esophagitis"],
                )],
            ),
            (
                "Dermatology - Prurigo Nodularis (PN)".into(),
                vec![CodeEntry::new(
                    "L28.1",
                    "Prurigo nodularis",
                    &["PN", "Hyde's Disease", "Nodular Prurigo"],
                )],
            ),
        ]
    }
}

/// Lower-cased whitespace tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

/// Compute fuzzy string similarity using combined metrics.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    // Jaro-Winkler rewards shared prefixes, Levenshtein overall similarity
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);

    jw * 0.6 + lev * 0.4
}
