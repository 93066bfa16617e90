//! Golden tests for statement matching.
//!
//! These tests pin the matcher output for the default vocabulary.

use indication_mapper_core::mapping::{
    MatchPolicy, SubstringPolicy, TokenOverlapPolicy, Vocabulary, PARTIAL_MATCH_FLOOR,
};
use proptest::prelude::*;

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    statement: &'static str,
    expected_indication: &'static str,
    expected_codes: &'static [&'static str],
    expected_confidence: f64,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "exact-asthma",
            statement: "asthma",
            expected_indication: "Asthma",
            expected_codes: &["J45.901"],
            expected_confidence: 1.0,
        },
        GoldenCase {
            id: "exact-severe-asthma",
            statement: "SEVERE ASTHMA",
            expected_indication: "Severe Asthma",
            expected_codes: &["J45.902"],
            expected_confidence: 1.0,
        },
        GoldenCase {
            id: "synonym-copd",
            statement: "COPD",
            expected_indication: "Chronic Obstructive Pulmonary Disease (COPD)",
            expected_codes: &["J44.9"],
            expected_confidence: 0.9,
        },
        GoldenCase {
            id: "synonym-eczema-first-entry-wins",
            statement: "Eczema",
            expected_indication: "Dermatology - Dermatitis / Eczema / Rosacea",
            expected_codes: &["L30.9", "L71.9"],
            expected_confidence: 0.9,
        },
        GoldenCase {
            id: "synonym-eoe",
            statement: "eoe",
            expected_indication: "Eosinophilic Esophagitis",
            expected_codes: &["K20.0"],
            expected_confidence: 0.9,
        },
        GoldenCase {
            id: "synonym-nasal-polyps",
            statement: "Nasal Polyps",
            expected_indication: "Chronic Rhinosinusitis with Nasal Polyposis (CRSwNP)",
            expected_codes: &["J33.8"],
            expected_confidence: 0.9,
        },
        GoldenCase {
            id: "partial-severe-asthma-exacerbation",
            statement: "severe asthma exacerbation",
            expected_indication: "Severe Asthma",
            expected_codes: &["J45.902"],
            expected_confidence: 2.0 / 3.0,
        },
        GoldenCase {
            id: "partial-eoe-patients",
            statement: "eosinophilic esophagitis patients",
            expected_indication: "Eosinophilic Esophagitis",
            expected_codes: &["K20.0"],
            expected_confidence: 2.0 / 3.0,
        },
        GoldenCase {
            id: "partial-at-floor-rejected",
            statement: "Eosinophilic Esophagitis in adults",
            expected_indication: "Eosinophilic Esophagitis in adults",
            expected_codes: &[],
            expected_confidence: 0.0,
        },
        GoldenCase {
            id: "unknown-condition",
            statement: "Migraine",
            expected_indication: "Migraine",
            expected_codes: &[],
            expected_confidence: 0.0,
        },
    ]
}

#[test]
fn test_golden_cases() {
    let vocabulary = Vocabulary::new();
    let policy = TokenOverlapPolicy;

    for case in get_golden_cases() {
        let scored = policy.match_statement(case.statement, &vocabulary);

        assert_eq!(
            scored.indication, case.expected_indication,
            "Case {}: indication mismatch",
            case.id
        );

        let codes: Vec<&str> = scored.codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, case.expected_codes, "Case {}: codes mismatch", case.id);

        assert!(
            (scored.confidence - case.expected_confidence).abs() < 1e-9,
            "Case {}: confidence {} != {}",
            case.id,
            scored.confidence,
            case.expected_confidence
        );
    }
}

#[test]
fn test_substring_accumulates_codes() {
    let vocabulary = Vocabulary::new();
    let scored = SubstringPolicy.match_statement("Moderate-to-severe asthma", &vocabulary);

    let codes: Vec<&str> = scored.codes.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["J45.901", "J45.902"]);
    assert_eq!(scored.indication, "Severe Asthma");
    assert!((scored.confidence - 13.0 / 25.0).abs() < 1e-9);
}

#[test]
fn test_substring_ignores_synonyms() {
    let vocabulary = Vocabulary::new();
    let scored = SubstringPolicy.match_statement("COPD", &vocabulary);
    assert!(!scored.is_match());
}

fn canonical_names() -> Vec<String> {
    Vocabulary::new().iter().map(|(name, _)| name.to_string()).collect()
}

proptest! {
    #[test]
    fn prop_exact_name_any_case(name in prop::sample::select(canonical_names()), upper in any::<bool>()) {
        let vocabulary = Vocabulary::new();
        let statement = if upper { name.to_uppercase() } else { name.to_lowercase() };

        let scored = TokenOverlapPolicy.match_statement(&statement, &vocabulary);
        prop_assert_eq!(scored.indication, name);
        prop_assert_eq!(scored.confidence, 1.0);
    }

    #[test]
    fn prop_matches_clear_partial_floor(statement in "[a-z ]{0,40}") {
        let vocabulary = Vocabulary::new();
        let scored = TokenOverlapPolicy.match_statement(&statement, &vocabulary);

        if scored.is_match() {
            prop_assert!(scored.confidence > PARTIAL_MATCH_FLOOR);
        } else {
            prop_assert_eq!(scored.confidence, 0.0);
            prop_assert_eq!(scored.indication, statement);
        }
    }
}
