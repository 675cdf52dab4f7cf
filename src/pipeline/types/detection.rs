use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed detection vocabulary shared by the hazard and sign models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Pothole,
    Crack,
    HospitalSign,
    SchoolSign,
    PedestrianCrossingSign,
    StopSign,
    YieldSign,
    OtherSign,
}

impl ObjectClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClass::Pothole => "pothole",
            ObjectClass::Crack => "crack",
            ObjectClass::HospitalSign => "hospital_sign",
            ObjectClass::SchoolSign => "school_sign",
            ObjectClass::PedestrianCrossingSign => "pedestrian_crossing_sign",
            ObjectClass::StopSign => "stop_sign",
            ObjectClass::YieldSign => "yield_sign",
            ObjectClass::OtherSign => "other_sign",
        }
    }

    /// Road damage that can be reported to an authority
    pub fn is_hazard(&self) -> bool {
        matches!(self, ObjectClass::Pothole | ObjectClass::Crack)
    }

    pub fn is_sign(&self) -> bool {
        !self.is_hazard()
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned box in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// The part of the box that lies inside a `width` x `height` image
    pub fn clipped_to(&self, width: u32, height: u32) -> BoundingBox {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let right = self.x.saturating_add(self.width).min(width);
        let bottom = self.y.saturating_add(self.height).min(height);
        BoundingBox::new(x, y, right - x, bottom - y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignCondition {
    Good,
    Faded,
    Unknown,
}

impl fmt::Display for SignCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignCondition::Good => "good",
            SignCondition::Faded => "faded",
            SignCondition::Unknown => "unknown",
        })
    }
}

/// One detected object. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DetectionRecord")]
pub struct Detection {
    class_label: ObjectClass,
    confidence: f32,
    region: BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<SignCondition>,
}

/// Wire form of a detection, normalized through `Detection::new`
#[derive(Deserialize)]
struct DetectionRecord {
    class_label: ObjectClass,
    confidence: f32,
    region: BoundingBox,
    #[serde(default)]
    condition: Option<SignCondition>,
}

impl From<DetectionRecord> for Detection {
    fn from(record: DetectionRecord) -> Self {
        let detection = Detection::new(record.class_label, record.confidence, record.region);
        match record.condition {
            Some(condition) => detection.with_condition(condition),
            None => detection,
        }
    }
}

impl Detection {
    pub fn new(class_label: ObjectClass, confidence: f32, region: BoundingBox) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            class_label,
            confidence,
            region,
            condition: None,
        }
    }

    /// A copy carrying the assessed sign condition
    pub fn with_condition(&self, condition: SignCondition) -> Self {
        Self {
            condition: Some(condition),
            ..self.clone()
        }
    }

    pub fn class_label(&self) -> ObjectClass {
        self.class_label
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn region(&self) -> BoundingBox {
        self.region
    }

    pub fn condition(&self) -> Option<SignCondition> {
        self.condition
    }

    pub fn is_hazard(&self) -> bool {
        self.class_label.is_hazard()
    }

    fn describe(&self) -> String {
        if self.is_hazard() {
            format!(
                "{} (conf {:.2}, size {}px)",
                self.class_label,
                self.confidence,
                self.region.area()
            )
        } else {
            format!(
                "{} ({}, conf {:.2})",
                self.class_label,
                self.condition.unwrap_or(SignCondition::Unknown),
                self.confidence
            )
        }
    }
}

/// "Hazards: ... | Signs: ..." line stored in memory and sent to authorities
pub fn findings_summary(detections: &[Detection]) -> String {
    let join = |hazard: bool| {
        let parts: Vec<String> = detections
            .iter()
            .filter(|d| d.is_hazard() == hazard)
            .map(Detection::describe)
            .collect();
        if parts.is_empty() {
            "None".to_string()
        } else {
            parts.join(" | ")
        }
    };
    format!("Hazards: {} | Signs: {}", join(true), join(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        let region = BoundingBox::new(0, 0, 10, 10);
        assert_eq!(Detection::new(ObjectClass::Pothole, 1.7, region).confidence(), 1.0);
        assert_eq!(Detection::new(ObjectClass::Pothole, -0.2, region).confidence(), 0.0);
        assert_eq!(Detection::new(ObjectClass::Pothole, f32::NAN, region).confidence(), 0.0);
    }

    #[test]
    fn test_clip_to_image() {
        let region = BoundingBox::new(600, 400, 100, 100);
        assert_eq!(region.clipped_to(640, 480), BoundingBox::new(600, 400, 40, 80));

        let outside = BoundingBox::new(700, 500, 10, 10);
        assert_eq!(outside.clipped_to(640, 480).area(), 0);
    }

    #[test]
    fn test_deserialize_from_model_output() {
        let json = r#"[
            {"class_label": "pothole", "confidence": 0.91, "region": {"x": 10, "y": 20, "width": 200, "height": 150}},
            {"class_label": "stop_sign", "confidence": 0.8, "region": {"x": 0, "y": 0, "width": 40, "height": 40}}
        ]"#;
        let detections: Vec<Detection> = serde_json::from_str(json).unwrap();
        assert_eq!(detections.len(), 2);
        assert!(detections[0].is_hazard());
        assert_eq!(detections[1].class_label(), ObjectClass::StopSign);
        assert_eq!(detections[1].condition(), None);

        let noisy: Detection = serde_json::from_str(
            r#"{"class_label": "crack", "confidence": 1.4, "region": {"x": 0, "y": 0, "width": 1, "height": 1}}"#,
        )
        .unwrap();
        assert_eq!(noisy.confidence(), 1.0);
    }

    #[test]
    fn test_findings_summary() {
        let detections = vec![
            Detection::new(ObjectClass::Pothole, 0.914, BoundingBox::new(0, 0, 200, 150)),
            Detection::new(ObjectClass::SchoolSign, 0.7, BoundingBox::new(0, 0, 20, 20))
                .with_condition(SignCondition::Faded),
        ];
        assert_eq!(
            findings_summary(&detections),
            "Hazards: pothole (conf 0.91, size 30000px) | Signs: school_sign (faded, conf 0.70)"
        );
        assert_eq!(findings_summary(&[]), "Hazards: None | Signs: None");
    }
}
