//! Additional report / scan appendix items (section 9).

use serde::{Deserialize, Serialize};

/// Name used when an item is added without one.
pub const UNTITLED: &str = "Untitled";

/// Free-form appendix entry numbered independently of findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalReportItem {
    /// Section identifier ("9.n"), `None` until numbered.
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub code: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewAdditionalReport {
    pub name: String,
    pub description: String,
    pub code: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdditionalReportUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub images: Option<Vec<String>>,
}
