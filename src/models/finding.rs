//! Normalized finding model and the five-level severity scale shared by every
//! scanner parser.

use serde::{Deserialize, Serialize};

// -- Severity scale --

/// Canonical report severity. Variants are declared lowest first so the
/// derived `Ord` gives `Critical > High > Moderate > Low > Informational`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum SeverityLevel {
    #[default]
    Informational,
    Low,
    Moderate,
    High,
    Critical,
}

impl SeverityLevel {
    /// The scale in report order, most severe first.
    pub const ALL: [SeverityLevel; 5] = [
        Self::Critical,
        Self::High,
        Self::Moderate,
        Self::Low,
        Self::Informational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
            Self::Informational => "Informational",
        }
    }

    /// Nessus `ReportItem@severity` codes "0" through "4".
    pub fn from_nessus_code(code: &str) -> Self {
        match code.trim() {
            "4" => Self::Critical,
            "3" => Self::High,
            "2" => Self::Moderate,
            "1" => Self::Low,
            _ => Self::Informational,
        }
    }

    /// OpenVAS / Greenbone `<threat>` words.
    pub fn from_threat(threat: &str) -> Self {
        match threat.trim().to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Moderate,
            "low" => Self::Low,
            _ => Self::Informational,
        }
    }

    /// CVSS v3 qualitative bands.
    pub fn from_cvss(score: f32) -> Self {
        match score {
            s if s >= 9.0 => Self::Critical,
            s if s >= 7.0 => Self::High,
            s if s >= 4.0 => Self::Moderate,
            s if s >= 0.1 => Self::Low,
            _ => Self::Informational,
        }
    }

    /// Free-text label as found in CSV/JSON exports and manual entry.
    /// Numeric labels are treated as CVSS scores.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "moderate" | "medium" => Self::Moderate,
            "low" => Self::Low,
            "informational" | "info" | "none" | "log" => Self::Informational,
            _ => trimmed
                .parse::<f32>()
                .map(Self::from_cvss)
                .unwrap_or(Self::Informational),
        }
    }
}

impl std::fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse used for filters: only scale names and the common
/// `medium`/`info` aliases are accepted.
impl std::str::FromStr for SeverityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "moderate" | "medium" => Ok(Self::Moderate),
            "low" => Ok(Self::Low),
            "informational" | "info" => Ok(Self::Informational),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

impl From<String> for SeverityLevel {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

// -- Finding --

/// One vulnerability or observation, either imported from a scan or entered
/// by hand. Every field is always present; absent source data is `""`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Finding {
    /// Section identifier ("8.n"), `None` until numbered.
    pub id: Option<String>,
    pub severity: SeverityLevel,
    pub title: String,
    pub host: String,
    pub port: String,
    pub protocol: String,
    pub description: String,
    pub impact: String,
    pub recommendation: String,
    pub cvss: String,
    /// Sorted, de-duplicated CVE identifiers joined with ", ".
    pub cve: String,
    pub code: String,
    /// Base64-encoded evidence images in display order.
    pub images: Vec<String>,
    /// The scanner's own record identifier, when the format carries one.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source_id: String,
}

/// Manually entered finding.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewFinding {
    pub title: String,
    pub severity: SeverityLevel,
    pub host: String,
    pub port: String,
    pub protocol: String,
    pub description: String,
    pub impact: String,
    pub recommendation: String,
    pub cvss: String,
    pub cve: String,
    pub code: String,
    pub images: Vec<String>,
}

/// Partial edit of an existing finding; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindingUpdate {
    pub title: Option<String>,
    pub severity: Option<SeverityLevel>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub protocol: Option<String>,
    pub description: Option<String>,
    pub impact: Option<String>,
    pub recommendation: Option<String>,
    pub cvss: Option<String>,
    pub cve: Option<String>,
    pub code: Option<String>,
    /// Replaces the whole image list.
    pub images: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nessus_codes_cover_scale() {
        assert_eq!(SeverityLevel::from_nessus_code("0"), SeverityLevel::Informational);
        assert_eq!(SeverityLevel::from_nessus_code("1"), SeverityLevel::Low);
        assert_eq!(SeverityLevel::from_nessus_code("2"), SeverityLevel::Moderate);
        assert_eq!(SeverityLevel::from_nessus_code("3"), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_nessus_code("4"), SeverityLevel::Critical);
        assert_eq!(SeverityLevel::from_nessus_code("5"), SeverityLevel::Informational);
        assert_eq!(SeverityLevel::from_nessus_code(""), SeverityLevel::Informational);
        assert_eq!(SeverityLevel::from_nessus_code("high"), SeverityLevel::Informational);
    }

    #[test]
    fn threat_words() {
        assert_eq!(SeverityLevel::from_threat("Critical"), SeverityLevel::Critical);
        assert_eq!(SeverityLevel::from_threat("High"), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_threat("Medium"), SeverityLevel::Moderate);
        assert_eq!(SeverityLevel::from_threat("Low"), SeverityLevel::Low);
        assert_eq!(SeverityLevel::from_threat("Log"), SeverityLevel::Informational);
        assert_eq!(SeverityLevel::from_threat("None"), SeverityLevel::Informational);
        assert_eq!(SeverityLevel::from_threat("Info"), SeverityLevel::Informational);
        assert_eq!(SeverityLevel::from_threat("Debug"), SeverityLevel::Informational);
        assert_eq!(SeverityLevel::from_threat(" high "), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_threat("MEDIUM"), SeverityLevel::Moderate);
    }

    #[test]
    fn cvss_bands() {
        assert_eq!(SeverityLevel::from_cvss(9.8), SeverityLevel::Critical);
        assert_eq!(SeverityLevel::from_cvss(7.0), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_cvss(5.3), SeverityLevel::Moderate);
        assert_eq!(SeverityLevel::from_cvss(0.1), SeverityLevel::Low);
        assert_eq!(SeverityLevel::from_cvss(0.0), SeverityLevel::Informational);
    }

    #[test]
    fn labels_fall_back_to_informational() {
        assert_eq!(SeverityLevel::from_label(" medium "), SeverityLevel::Moderate);
        assert_eq!(SeverityLevel::from_label("HIGH"), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_label("7.5"), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_label(""), SeverityLevel::Informational);
        assert_eq!(SeverityLevel::from_label("urgent"), SeverityLevel::Informational);
    }

    #[test]
    fn strict_parse_rejects_unknown_names() {
        assert_eq!("medium".parse::<SeverityLevel>(), Ok(SeverityLevel::Moderate));
        assert_eq!(" Critical".parse::<SeverityLevel>(), Ok(SeverityLevel::Critical));
        assert!("7.5".parse::<SeverityLevel>().is_err());
        assert!("urgent".parse::<SeverityLevel>().is_err());
    }

    #[test]
    fn ordering_puts_critical_on_top() {
        assert!(SeverityLevel::Critical > SeverityLevel::High);
        assert!(SeverityLevel::Low > SeverityLevel::Informational);
        let mut all = SeverityLevel::ALL.to_vec();
        all.sort();
        assert_eq!(all.first(), Some(&SeverityLevel::Informational));
    }

    #[test]
    fn severity_serializes_as_display_name() {
        let json = serde_json::to_string(&SeverityLevel::Moderate).unwrap();
        assert_eq!(json, "\"Moderate\"");
        let parsed: SeverityLevel = serde_json::from_str("\"Medium\"").unwrap();
        assert_eq!(parsed, SeverityLevel::Moderate);
    }

    #[test]
    fn finding_loads_with_missing_fields() {
        let finding: Finding =
            serde_json::from_str(r#"{"id":"8.1","title":"Open SMB","severity":"High"}"#).unwrap();
        assert_eq!(finding.id.as_deref(), Some("8.1"));
        assert_eq!(finding.severity, SeverityLevel::High);
        assert_eq!(finding.host, "");
        assert!(finding.images.is_empty());
    }
}
