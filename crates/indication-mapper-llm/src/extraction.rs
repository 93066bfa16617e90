//! Requirement extraction from model output and program text.

use indication_mapper_core::EligibilityRequirement;
use serde_json::Value;
use thiserror::Error;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Parse the requirements array out of a model response.
///
/// The model often wraps the array in prose, so the slice from the first `[`
/// to the last `]` is parsed. Entries without a `name` are skipped and
/// non-string values are rendered as JSON text.
pub fn parse_requirements(response: &str) -> ExtractionResult<Vec<EligibilityRequirement>> {
    let start = response
        .find('[')
        .ok_or_else(|| ExtractionError::InvalidFormat("No JSON array found in response".into()))?;
    let end = response
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| {
            ExtractionError::InvalidFormat("No closing bracket found in response".into())
        })?;

    let items: Vec<Value> = serde_json::from_str(&response[start..=end])?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?;
            let value = match item.get("value") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            Some(EligibilityRequirement::new(name, &value))
        })
        .collect())
}

/// Keyword requirements from the `-` bullet lines of eligibility details.
pub fn fallback_requirements(eligibility_details: &str) -> Vec<EligibilityRequirement> {
    let mut requirements = Vec::new();

    for line in eligibility_details.lines() {
        let Some(bullet) = line.strip_prefix('-') else {
            continue;
        };
        let bullet = bullet.trim().to_lowercase();

        if bullet.contains("us resident") {
            requirements.push(EligibilityRequirement::new("us_residency", "true"));
        }
        if bullet.contains("commercial insurance") {
            requirements.push(EligibilityRequirement::new("insurance_coverage", "true"));
        }
        if bullet.contains("fda-approved") {
            requirements.push(EligibilityRequirement::new("fda_approved", "true"));
        }
    }

    requirements
}

/// First number following "minimum age" on the same line.
pub fn extract_minimum_age(response: &str) -> Option<String> {
    const MARKER: &str = "minimum age";

    for line in response.lines() {
        let lower = line.to_lowercase();
        let Some(pos) = lower.find(MARKER) else {
            continue;
        };

        let rest = &lower[pos + MARKER.len()..];
        let digits: String = rest
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() {
            return Some(digits);
        }
    }

    None
}

/// Digits and dots of an annual maximum ("$13,000" -> "13000").
pub fn annual_savings(annual_max: &str) -> Option<String> {
    if annual_max.is_empty() {
        return None;
    }
    Some(
        annual_max
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect(),
    )
}
