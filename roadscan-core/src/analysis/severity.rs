use std::fmt;

use serde::{Deserialize, Serialize};

/// How urgently a hazard needs attention, as graded by the vision model.
///
/// Values the model invents outside `Low`/`Medium`/`High` are kept verbatim
/// in [`Severity::Unrecognized`] and styled like `Medium`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    Unrecognized(String),
}

impl Severity {
    pub fn name(&self) -> &str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Unrecognized(raw) => raw,
        }
    }

    /// Overlay color for the severity, RGBA.
    pub const fn color(&self) -> [u8; 4] {
        match self {
            Severity::Low => [34, 197, 94, 255],   // Green
            Severity::High => [239, 68, 68, 255],  // Red
            Severity::Medium | Severity::Unrecognized(_) => [234, 179, 8, 255], // Yellow
        }
    }

    /// Heading used on the report's count tiles.
    pub const fn tier(&self) -> &'static str {
        match self {
            Severity::Low => "Minor",
            Severity::High => "Critical",
            Severity::Medium | Severity::Unrecognized(_) => "Moderate",
        }
    }

    pub const fn recommended_action(&self) -> &'static str {
        match self {
            Severity::High => "Immediate Patching & Cordoning Required",
            Severity::Medium => "Schedule Repair within 7-14 Business Days",
            Severity::Low | Severity::Unrecognized(_) => {
                "Monitor for Growth - Routine Maintenance Item"
            }
        }
    }
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Low" => Severity::Low,
            "Medium" => Severity::Medium,
            "High" => Severity::High,
            _ => Severity::Unrecognized(raw),
        }
    }
}

impl From<&str> for Severity {
    fn from(raw: &str) -> Self {
        Severity::from(raw.to_string())
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.name().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of hazards per severity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unrecognized: usize,
}

impl SeverityCounts {
    pub fn tally<'a>(severities: impl IntoIterator<Item = &'a Severity>) -> Self {
        severities
            .into_iter()
            .fold(Self::default(), |mut acc, severity| {
                match severity {
                    Severity::High => acc.high += 1,
                    Severity::Medium => acc.medium += 1,
                    Severity::Low => acc.low += 1,
                    Severity::Unrecognized(_) => acc.unrecognized += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low + self.unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mapping_is_fixed() {
        assert_eq!(Severity::Low.color(), [34, 197, 94, 255]);
        assert_eq!(Severity::Medium.color(), [234, 179, 8, 255]);
        assert_eq!(Severity::High.color(), [239, 68, 68, 255]);
    }

    #[test]
    fn test_unknown_severity_falls_back_to_medium_color() {
        let severity = Severity::from("Critical");
        assert_eq!(severity, Severity::Unrecognized("Critical".to_string()));
        assert_eq!(severity.color(), Severity::Medium.color());
        assert_eq!(severity.name(), "Critical");
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        // the model is asked for exactly `Low`, `Medium`, `High`
        assert_eq!(
            Severity::from("high"),
            Severity::Unrecognized("high".to_string())
        );
        assert_eq!(Severity::from("High"), Severity::High);
    }

    #[test]
    fn test_serde_roundtrip_preserves_raw_text() {
        let s: Severity = serde_json::from_str("\"Severe\"").unwrap();
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"Severe\"");
        let s: Severity = serde_json::from_str("\"Low\"").unwrap();
        assert_eq!(s, Severity::Low);
    }

    #[test]
    fn test_recommended_actions() {
        assert_eq!(
            Severity::High.recommended_action(),
            "Immediate Patching & Cordoning Required"
        );
        assert_eq!(
            Severity::Medium.recommended_action(),
            "Schedule Repair within 7-14 Business Days"
        );
        assert_eq!(
            Severity::Low.recommended_action(),
            "Monitor for Growth - Routine Maintenance Item"
        );
    }

    #[test]
    fn test_tally() {
        let severities = [
            Severity::High,
            Severity::Low,
            Severity::High,
            Severity::from("Extreme"),
        ];
        let counts = SeverityCounts::tally(&severities);
        assert_eq!(counts.high, 2);
        assert_eq!(counts.medium, 0);
        assert_eq!(counts.low, 1);
        assert_eq!(counts.unrecognized, 1);
        assert_eq!(counts.total(), 4);
    }
}
