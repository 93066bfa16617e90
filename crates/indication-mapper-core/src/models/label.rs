//! Label data as returned by the label-data source.

use serde::{Deserialize, Serialize};

/// Structured product labeling data for one set id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelData {
    /// NDC package codes listed on the label
    pub ndc_codes: Vec<String>,
    /// Raw "INDICATIONS AND USAGE" section text
    pub indications: String,
    /// Last label update in `YYYYMMDD` form (may be empty if the page had none)
    pub last_update_date: String,
}
