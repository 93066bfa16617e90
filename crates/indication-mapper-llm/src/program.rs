//! Patient-assistance program inference.
//!
//! Handles:
//! - Loading `<data_dir>/<drug>.json` program files
//! - Structuring eligibility details with the model (keyword fallback)
//! - Minimum age inference
//! - Benefits, forms, funding and detail summaries

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indication_mapper_core::{EligibilityRequirement, EligibilitySource, InferenceError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extraction::{annual_savings, extract_minimum_age, fallback_requirements, parse_requirements};
use crate::ollama::TextGenerator;
use crate::prompts::{make_minimum_age_prompt, make_requirements_prompt};

/// Program inference errors.
#[derive(Error, Debug)]
pub enum ProgramError {
    #[error("Invalid drug name: {0}")]
    InvalidDrugName(String),

    #[error("No program data for {0}")]
    NotFound(String),

    #[error("Failed to read program data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid program data: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ProgramResult<T> = Result<T, ProgramError>;

/// Raw program file contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ProgramData {
    pub program_name: String,
    #[serde(default)]
    pub coverage_eligibilities: Vec<String>,
    #[serde(default)]
    pub assistance_type: String,
    #[serde(default)]
    pub eligibility_details: String,
    #[serde(default)]
    pub annual_max: String,
    #[serde(default)]
    pub offer_renewable: bool,
    #[serde(default)]
    pub add_renewal_details: String,
    #[serde(default)]
    pub program_details: String,
    #[serde(default)]
    pub income_req: bool,
    #[serde(default)]
    pub income_details: String,
    #[serde(rename = "ProgramURL", default)]
    pub program_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Benefit {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Form {
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Funding {
    pub evergreen: String,
    pub current_funding_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramDetail {
    pub eligibility: String,
    pub program: String,
    pub renewal: String,
    pub income: String,
}

/// Structured program summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramOutput {
    pub program_name: String,
    pub coverage_eligibilities: Vec<String>,
    pub program_type: String,
    pub requirements: Vec<EligibilityRequirement>,
    pub benefits: Vec<Benefit>,
    pub forms: Vec<Form>,
    pub funding: Funding,
    pub details: Vec<ProgramDetail>,
}

/// Infers program information for a drug from its program file.
pub struct ProgramInference {
    generator: Arc<dyn TextGenerator>,
    model: String,
    data_dir: PathBuf,
}

impl ProgramInference {
    pub fn new(generator: Arc<dyn TextGenerator>, model: &str, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            generator,
            model: model.to_string(),
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of a drug's program file. Rejects names that could escape the data dir.
    pub fn program_path(&self, drug_name: &str) -> ProgramResult<PathBuf> {
        let drug_name = drug_name.trim();
        if drug_name.is_empty()
            || drug_name.contains('/')
            || drug_name.contains('\\')
            || drug_name.contains("..")
        {
            return Err(ProgramError::InvalidDrugName(drug_name.to_string()));
        }
        Ok(self.data_dir.join(format!("{}.json", drug_name)))
    }

    /// Load and parse a drug's program file.
    pub fn load_program(&self, drug_name: &str) -> ProgramResult<ProgramData> {
        let path = self.program_path(drug_name)?;
        let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProgramError::NotFound(drug_name.trim().to_string()),
            _ => ProgramError::Io(e),
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Build the structured program summary for a drug.
    pub fn infer_program(&self, drug_name: &str) -> ProgramResult<ProgramOutput> {
        let data = self.load_program(drug_name)?;

        let mut requirements = self.infer_requirements(&data.eligibility_details);
        if let Some(age) = self.infer_minimum_age(&data.program_details) {
            requirements.push(EligibilityRequirement::new("minimum_age", &age));
        }

        let benefits = annual_savings(&data.annual_max)
            .map(|value| Benefit {
                name: "max_annual_savings".into(),
                value,
            })
            .into_iter()
            .collect();

        let forms = if data.program_url.is_empty() {
            Vec::new()
        } else {
            vec![Form {
                name: "Enrollment Form".into(),
                link: data.program_url.clone(),
            }]
        };

        let income = if data.income_req {
            data.income_details.clone()
        } else {
            "Not required".to_string()
        };

        tracing::info!(
            drug_name = %drug_name.trim(),
            requirements = requirements.len(),
            "Inferred program information"
        );

        Ok(ProgramOutput {
            program_name: data.program_name,
            coverage_eligibilities: data.coverage_eligibilities,
            program_type: data.assistance_type,
            requirements,
            benefits,
            forms,
            funding: Funding {
                evergreen: data.offer_renewable.to_string(),
                current_funding_level: "Data Not Available".into(),
            },
            details: vec![ProgramDetail {
                eligibility: data.eligibility_details,
                program: data.program_details,
                renewal: data.add_renewal_details,
                income,
            }],
        })
    }

    fn infer_requirements(&self, eligibility_details: &str) -> Vec<EligibilityRequirement> {
        let prompt = make_requirements_prompt(eligibility_details);
        match self.generator.generate(&self.model, &prompt) {
            Ok(generated) => match parse_requirements(&generated.response) {
                Ok(requirements) => requirements,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse requirements from model output");
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Requirement generation failed, using keyword fallback");
                fallback_requirements(eligibility_details)
            }
        }
    }

    fn infer_minimum_age(&self, program_details: &str) -> Option<String> {
        let prompt = make_minimum_age_prompt(program_details);
        match self.generator.generate(&self.model, &prompt) {
            Ok(generated) => extract_minimum_age(&generated.response),
            Err(e) => {
                tracing::warn!(error = %e, "Minimum age generation failed");
                None
            }
        }
    }
}

impl EligibilitySource for ProgramInference {
    fn infer_eligibility(
        &self,
        drug_name: &str,
    ) -> Result<Vec<EligibilityRequirement>, InferenceError> {
        self.infer_program(drug_name)
            .map(|program| program.requirements)
            .map_err(|e| InferenceError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ollama::MockGenerator;

    const DUPIXENT: &str = r#"{
        "ProgramName": "DUPIXENT MyWay Copay Card",
        "CoverageEligibilities": ["Commercially insured"],
        "AssistanceType": "Coupon",
        "EligibilityDetails": "- Patient must have commercial insurance\n- Patients must be US residents\n- Prescribed for an FDA-approved indication",
        "AnnualMax": "$13,000",
        "OfferRenewable": true,
        "AddRenewalDetails": "Automatically renews every January",
        "ProgramDetails": "Patients must be 18 years of age or older",
        "IncomeReq": false,
        "IncomeDetails": "",
        "ProgramURL": "https://www.dupixent.com/support-savings/copay-card"
    }"#;

    fn write_program(dir: &Path, drug: &str, contents: &str) {
        std::fs::write(dir.join(format!("{}.json", drug)), contents).unwrap();
    }

    fn inference(dir: &Path, generator: MockGenerator) -> ProgramInference {
        ProgramInference::new(Arc::new(generator), "llama2", dir)
    }

    #[test]
    fn test_infer_program_with_model() {
        let dir = tempfile::tempdir().unwrap();
        write_program(dir.path(), "Dupixent", DUPIXENT);

        let generator = MockGenerator::new()
            .respond(
                "Eligibility Details",
                r#"Sure: [{"name":"insurance_coverage","value":"commercial"}]"#,
            )
            .respond("minimum age requirement", "The minimum age is 18.");
        let output = inference(dir.path(), generator).infer_program("Dupixent").unwrap();

        assert_eq!(output.program_name, "DUPIXENT MyWay Copay Card");
        assert_eq!(output.program_type, "Coupon");
        assert_eq!(
            output.requirements,
            vec![
                EligibilityRequirement::new("insurance_coverage", "commercial"),
                EligibilityRequirement::new("minimum_age", "18"),
            ]
        );
        assert_eq!(output.benefits[0].name, "max_annual_savings");
        assert_eq!(output.benefits[0].value, "13000");
        assert_eq!(output.forms[0].name, "Enrollment Form");
        assert_eq!(output.funding.evergreen, "true");
        assert_eq!(output.funding.current_funding_level, "Data Not Available");
        assert_eq!(output.details[0].income, "Not required");
        assert_eq!(output.details[0].renewal, "Automatically renews every January");
    }

    #[test]
    fn test_model_failure_uses_keyword_fallback() {
        let dir = tempfile::tempdir().unwrap();
        write_program(dir.path(), "Dupixent", DUPIXENT);

        let output = inference(dir.path(), MockGenerator::new().failing())
            .infer_program("Dupixent")
            .unwrap();

        let names: Vec<&str> = output.requirements.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["insurance_coverage", "us_residency", "fda_approved"]);
    }

    #[test]
    fn test_unparseable_output_yields_no_requirements() {
        let dir = tempfile::tempdir().unwrap();
        write_program(dir.path(), "Dupixent", DUPIXENT);

        let generator = MockGenerator::new().respond("", "I am not sure.");
        let output = inference(dir.path(), generator).infer_program("Dupixent").unwrap();
        assert!(output.requirements.is_empty());
    }

    #[test]
    fn test_income_and_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        write_program(
            dir.path(),
            "Generic",
            r#"{"ProgramName":"Foundation Grant","OfferRenewable":false,"IncomeReq":true,"IncomeDetails":"Below 400% FPL"}"#,
        );

        let output = inference(dir.path(), MockGenerator::new())
            .infer_program("Generic")
            .unwrap();
        assert!(output.benefits.is_empty());
        assert!(output.forms.is_empty());
        assert_eq!(output.funding.evergreen, "false");
        assert_eq!(output.details[0].income, "Below 400% FPL");
    }

    #[test]
    fn test_missing_and_invalid_programs() {
        let dir = tempfile::tempdir().unwrap();
        write_program(dir.path(), "Broken", "{not json");
        let inference = inference(dir.path(), MockGenerator::new());

        assert!(matches!(inference.infer_program("Nothing"), Err(ProgramError::NotFound(_))));
        assert!(matches!(inference.infer_program("Broken"), Err(ProgramError::Json(_))));
        assert!(matches!(
            inference.infer_program("../secrets"),
            Err(ProgramError::InvalidDrugName(_))
        ));
        assert!(matches!(inference.infer_program("a/b"), Err(ProgramError::InvalidDrugName(_))));
        assert!(matches!(inference.infer_program("  "), Err(ProgramError::InvalidDrugName(_))));
    }

    #[test]
    fn test_eligibility_source() {
        let dir = tempfile::tempdir().unwrap();
        write_program(dir.path(), "Dupixent", DUPIXENT);
        let inference = inference(dir.path(), MockGenerator::new().failing());

        let requirements = inference.infer_eligibility("Dupixent").unwrap();
        assert_eq!(requirements.len(), 3);

        let err = inference.infer_eligibility("Nothing").unwrap_err();
        assert!(err.to_string().contains("Nothing"));
    }
}
