//! Prompts for assistance-program inference.

/// Prompt asking the model to structure a program's eligibility details.
pub fn make_requirements_prompt(eligibility_details: &str) -> String {
    format!(
        r#"Parse the following eligibility details into structured key-value pairs.
Focus on extracting specific requirements like age limits, residency requirements, insurance requirements,
and any other specific conditions. Format the response as JSON with "name" and "value" pairs.

Eligibility Details:
{}

Return only the JSON array of requirements, nothing else."#,
        eligibility_details
    )
}

/// Prompt asking the model for a minimum age requirement.
pub fn make_minimum_age_prompt(program_details: &str) -> String {
    format!(
        "Based on the following program details, infer the minimum age requirement if any: {}",
        program_details
    )
}
