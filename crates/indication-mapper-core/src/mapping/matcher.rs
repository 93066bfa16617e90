//! Statement-to-code matching.
//!
//! Token-overlap rules, first qualifying rule wins:
//! - Exact canonical name: 1.0
//! - Exact synonym: 0.9
//! - Best token overlap above 0.5
//! - Otherwise the no-match sentinel

use std::str::FromStr;

use crate::models::{CodeEntry, ScoredMatch};

use super::vocabulary::{tokenize, Vocabulary};

/// Confidence for a case-insensitive canonical name match.
pub const EXACT_CONFIDENCE: f64 = 1.0;

/// Confidence for a case-insensitive synonym match.
pub const SYNONYM_CONFIDENCE: f64 = 0.9;

/// Token overlap must be strictly above this to count.
pub const PARTIAL_MATCH_FLOOR: f64 = 0.5;

/// A policy for matching one statement against the vocabulary.
pub trait MatchPolicy: Send + Sync {
    /// Score a statement. Never fails; returns the no-match sentinel instead.
    fn match_statement(&self, statement: &str, vocabulary: &Vocabulary) -> ScoredMatch;

    /// Short name used in configuration and logs.
    fn name(&self) -> &'static str;
}

/// Matching policies selectable by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    TokenOverlap,
    Substring,
}

impl PolicyKind {
    /// Instantiate the policy.
    pub fn build(self) -> Box<dyn MatchPolicy> {
        match self {
            PolicyKind::TokenOverlap => Box::new(TokenOverlapPolicy),
            PolicyKind::Substring => Box::new(SubstringPolicy),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "token-overlap" | "token_overlap" | "token" => Ok(PolicyKind::TokenOverlap),
            "substring" => Ok(PolicyKind::Substring),
            other => Err(format!(
                "unknown match policy '{}' (expected 'token-overlap' or 'substring')",
                other
            )),
        }
    }
}

/// Exact → synonym → token overlap. The default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlapPolicy;

impl MatchPolicy for TokenOverlapPolicy {
    fn match_statement(&self, statement: &str, vocabulary: &Vocabulary) -> ScoredMatch {
        if let Some((name, codes)) = vocabulary.find_canonical(statement) {
            return ScoredMatch {
                indication: name.to_string(),
                codes: codes.to_vec(),
                confidence: EXACT_CONFIDENCE,
            };
        }

        for (name, codes) in vocabulary.iter() {
            if codes.iter().any(|c| c.has_synonym(statement)) {
                return ScoredMatch {
                    indication: name.to_string(),
                    codes: codes.to_vec(),
                    confidence: SYNONYM_CONFIDENCE,
                };
            }
        }

        let words = tokenize(statement);
        let mut best: Option<ScoredMatch> = None;
        let mut highest = 0.0;

        for (name, codes) in vocabulary.iter() {
            let confidence = token_overlap(&words, &tokenize(name));
            if confidence > highest && confidence > PARTIAL_MATCH_FLOOR {
                highest = confidence;
                best = Some(ScoredMatch {
                    indication: name.to_string(),
                    codes: codes.to_vec(),
                    confidence,
                });
            }
        }

        best.unwrap_or_else(|| ScoredMatch::no_match(statement))
    }

    fn name(&self) -> &'static str {
        "token-overlap"
    }
}

/// Accumulates the codes of every canonical name contained in the statement.
///
/// The reported indication is the containing name covering the largest share
/// of the statement, and that share is the confidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringPolicy;

impl MatchPolicy for SubstringPolicy {
    fn match_statement(&self, statement: &str, vocabulary: &Vocabulary) -> ScoredMatch {
        let lower = statement.to_lowercase();
        let statement_len = lower.chars().count();
        if statement_len == 0 {
            return ScoredMatch::no_match(statement);
        }

        let mut codes: Vec<CodeEntry> = Vec::new();
        let mut best: Option<(&str, f64)> = None;

        for (name, entry_codes) in vocabulary.iter() {
            let key = name.to_lowercase();
            if key.is_empty() || !lower.contains(&key) {
                continue;
            }

            let coverage = (key.chars().count() as f64 / statement_len as f64).min(1.0);
            if best.map_or(true, |(_, c)| coverage > c) {
                best = Some((name, coverage));
            }

            for code in entry_codes {
                if !codes.iter().any(|c| c.code == code.code) {
                    codes.push(code.clone());
                }
            }
        }

        match best {
            Some((name, confidence)) => ScoredMatch {
                indication: name.to_string(),
                codes,
                confidence,
            },
            None => ScoredMatch::no_match(statement),
        }
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

/// `|statement tokens found in key| / max(|statement|, |key|)`.
fn token_overlap(words: &[String], key_words: &[String]) -> f64 {
    let longest = words.len().max(key_words.len());
    if longest == 0 {
        return 0.0;
    }
    let common = words.iter().filter(|w| key_words.contains(w)).count();
    common as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(statement: &str) -> ScoredMatch {
        TokenOverlapPolicy.match_statement(statement, &Vocabulary::new())
    }

    fn substring(statement: &str) -> ScoredMatch {
        SubstringPolicy.match_statement(statement, &Vocabulary::new())
    }

    #[test]
    fn test_exact_match() {
        let result = token("Asthma");
        assert_eq!(result.indication, "Asthma");
        assert_eq!(result.codes[0].code, "J45.901");
        assert_eq!(result.confidence, 1.0);

        let result = token("eosinophilic esophagitis");
        assert_eq!(result.indication, "Eosinophilic Esophagitis");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_exact_beats_earlier_synonym() {
        // "Bronchial Asthma" is a synonym of the first entry; the later canonical
        // name still wins.
        let vocabulary = Vocabulary::from_entries(vec![
            (
                "Asthma".into(),
                vec![CodeEntry::new("J45.901", "Asthma", &["Bronchial Asthma"])],
            ),
            (
                "Bronchial Asthma".into(),
                vec![CodeEntry::new("J45.909", "Bronchial asthma", &[])],
            ),
        ]);

        let result = TokenOverlapPolicy.match_statement("bronchial asthma", &vocabulary);
        assert_eq!(result.indication, "Bronchial Asthma");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_synonym_match() {
        let result = token("COPD");
        assert_eq!(result.indication, "Chronic Obstructive Pulmonary Disease (COPD)");
        assert_eq!(result.codes[0].code, "J44.9");
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn test_synonym_tie_break_uses_vocabulary_order() {
        // "Eczema" is a synonym of both dermatology entries
        let result = token("eczema");
        assert_eq!(result.indication, "Dermatology - Dermatitis / Eczema / Rosacea");
        assert_eq!(result.codes.len(), 2);
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn test_partial_match() {
        let result = token("severe asthma exacerbation");
        assert_eq!(result.indication, "Severe Asthma");
        assert!((result.confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_match_at_floor_is_rejected() {
        // 2 of 4 tokens overlap "Severe Asthma": exactly 0.5
        let result = token("persistent severe asthma attacks");
        assert!(result.codes.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.indication, "persistent severe asthma attacks");
    }

    #[test]
    fn test_partial_match_first_of_equal_scores_wins() {
        let vocabulary = Vocabulary::from_entries(vec![
            ("Plaque Psoriasis".into(), vec![CodeEntry::new("L40.0", "Psoriasis vulgaris", &[])]),
            ("Psoriasis Arthritis".into(), vec![CodeEntry::new("L40.50", "Arthropathic psoriasis", &[])]),
        ]);

        let result = TokenOverlapPolicy.match_statement("psoriasis", &vocabulary);
        // 1/2 for both, not above the floor
        assert!(!result.is_match());

        let result = TokenOverlapPolicy.match_statement("psoriasis plaque arthritis", &vocabulary);
        assert_eq!(result.indication, "Plaque Psoriasis");
    }

    #[test]
    fn test_no_match() {
        let result = token("Migraine prevention");
        assert!(!result.is_match());
        assert_eq!(result.indication, "Migraine prevention");
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_token_overlap() {
        let words = tokenize("severe asthma");
        assert_eq!(token_overlap(&words, &tokenize("Severe Asthma")), 1.0);
        assert_eq!(token_overlap(&words, &tokenize("Asthma")), 0.5);
        assert_eq!(token_overlap(&[], &[]), 0.0);
    }

    #[test]
    fn test_substring_accumulates_codes() {
        let result = substring("Treatment of severe asthma in adults");
        // Both "Asthma" and "Severe Asthma" are contained
        let codes: Vec<&str> = result.codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["J45.901", "J45.902"]);
        assert_eq!(result.indication, "Severe Asthma");
        assert!((result.confidence - 13.0 / 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_substring_exact_statement() {
        let result = substring("asthma");
        assert_eq!(result.indication, "Asthma");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_substring_ignores_synonyms() {
        let result = substring("COPD");
        assert!(!result.is_match());
        assert!(substring("").codes.is_empty());
    }

    #[test]
    fn test_policy_kind_parsing() {
        assert_eq!("token-overlap".parse::<PolicyKind>(), Ok(PolicyKind::TokenOverlap));
        assert_eq!(" Substring ".parse::<PolicyKind>(), Ok(PolicyKind::Substring));
        assert!("fuzzy".parse::<PolicyKind>().is_err());
        assert_eq!(PolicyKind::default().build().name(), "token-overlap");
        assert_eq!(PolicyKind::Substring.build().name(), "substring");
    }
}
