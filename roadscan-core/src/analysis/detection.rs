use serde::{Deserialize, Serialize};

use super::{
    bbox::NormalizedBox,
    severity::{Severity, SeverityCounts},
};

/// One hazard reported by the vision model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box_2d", default = "malformed_box")]
    pub bbox: NormalizedBox,
    pub label: String,
    pub confidence: f64,
    pub severity: Severity,
}

fn malformed_box() -> NormalizedBox {
    NormalizedBox::MALFORMED
}

impl Detection {
    /// Confidence as a whole percentage, rounded half away from zero.
    pub fn confidence_percent(&self) -> i64 {
        (self.confidence * 100.0).round() as i64
    }

    /// Overlay caption, e.g. `High Hazard (87%)`.
    pub fn caption(&self) -> String {
        format!(
            "{} Hazard ({}%)",
            self.severity.name(),
            self.confidence_percent()
        )
    }
}

/// Full response of the vision model for one image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub potholes: Vec<Detection>,
    pub summary: String,
}

impl DetectionResult {
    pub fn counts(&self) -> SeverityCounts {
        SeverityCounts::tally(self.potholes.iter().map(|d| &d.severity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(confidence: f64, severity: Severity) -> Detection {
        Detection {
            bbox: NormalizedBox::new(0.0, 0.0, 10.0, 10.0),
            label: "pothole".to_string(),
            confidence,
            severity,
        }
    }

    #[test]
    fn test_caption_rounds_confidence() {
        assert_eq!(detection(0.874, Severity::High).caption(), "High Hazard (87%)");
        assert_eq!(detection(0.875, Severity::Low).caption(), "Low Hazard (88%)");
        assert_eq!(detection(1.0, Severity::Medium).caption(), "Medium Hazard (100%)");
        assert_eq!(
            detection(0.5, Severity::from("Severe")).caption(),
            "Severe Hazard (50%)"
        );
        // 0.305 * 100 is just below 30.5 in double precision
        assert_eq!(detection(0.305, Severity::Low).caption(), "Low Hazard (30%)");
    }

    #[test]
    fn test_parse_model_payload() {
        let payload = r#"{
            "potholes": [
                {"box_2d": [100, 150, 300, 400], "label": "pothole", "confidence": 0.95, "severity": "High"},
                {"id": 2, "box_2d": [500, 500, 600, 700], "label": "pothole", "confidence": 0.4, "severity": "Low"}
            ],
            "summary": "Two potholes on the right lane."
        }"#;

        let result: DetectionResult = serde_json::from_str(payload).unwrap();
        assert_eq!(result.potholes.len(), 2);
        assert_eq!(
            result.potholes[0].bbox,
            NormalizedBox::new(100.0, 150.0, 300.0, 400.0)
        );
        assert_eq!(result.potholes[1].severity, Severity::Low);
        assert_eq!(result.summary, "Two potholes on the right lane.");

        let counts = result.counts();
        assert_eq!((counts.high, counts.medium, counts.low), (1, 0, 1));
    }

    #[test]
    fn test_missing_summary_is_rejected() {
        let payload = r#"{"potholes": []}"#;
        assert!(serde_json::from_str::<DetectionResult>(payload).is_err());
    }
}
