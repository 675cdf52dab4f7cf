use super::advisory::AdvisoryRefiner;
use crate::config::ClassifierConfig;
use crate::pipeline::types::{Detection, Severity};
use tracing::debug;

/// Numeric hazard score in [0, 1] and the tier it maps to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub score: f32,
    pub severity: Severity,
}

/// Deterministic severity from hazard confidence and box size, optionally
/// refined by an advisory text generator.
pub struct SeverityClassifier {
    config: ClassifierConfig,
    advisory: Option<AdvisoryRefiner>,
}

impl SeverityClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            advisory: None,
        }
    }

    pub fn with_advisory(mut self, advisory: AdvisoryRefiner) -> Self {
        self.advisory = Some(advisory);
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// `None` when no hazard was detected; signs alone never score.
    pub fn score(
        &self,
        detections: &[Detection],
        image_dimensions: Option<(u32, u32)>,
    ) -> Option<f32> {
        let hazards: Vec<&Detection> = detections.iter().filter(|d| d.is_hazard()).collect();
        if hazards.is_empty() {
            return None;
        }

        let max_confidence = hazards
            .iter()
            .map(|d| d.confidence())
            .fold(0.0f32, f32::max);
        let size_score = image_dimensions
            .filter(|(w, h)| *w > 0 && *h > 0)
            .map(|(w, h)| {
                let image_area = w as f64 * h as f64;
                let largest = hazards
                    .iter()
                    .map(|d| d.region().clipped_to(w, h).area())
                    .max()
                    .unwrap_or(0);
                let ratio = (largest as f64 / image_area) as f32;
                if self.config.size_saturation_ratio > 0.0 {
                    (ratio / self.config.size_saturation_ratio).min(1.0)
                } else {
                    1.0
                }
            })
            .unwrap_or(0.0);

        Some(self.config.confidence_weight * max_confidence + self.config.size_weight * size_score)
    }

    pub fn tier_for(&self, score: f32) -> Severity {
        if score >= self.config.high_threshold {
            Severity::High
        } else if score >= self.config.medium_threshold {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Numeric classification only. Empty detections stay `Unset`.
    pub fn assess(
        &self,
        detections: &[Detection],
        image_dimensions: Option<(u32, u32)>,
    ) -> Assessment {
        if detections.is_empty() {
            return Assessment {
                score: 0.0,
                severity: Severity::Unset,
            };
        }
        match self.score(detections, image_dimensions) {
            Some(score) => Assessment {
                score,
                severity: self.tier_for(score),
            },
            None => Assessment {
                score: 0.0,
                severity: Severity::Low,
            },
        }
    }

    pub fn classify(
        &self,
        detections: &[Detection],
        image_dimensions: Option<(u32, u32)>,
    ) -> Severity {
        self.assess(detections, image_dimensions).severity
    }

    /// Numeric tier, then the advisory opinion when one is configured.
    /// The advisory can only confirm or lower the tier.
    pub async fn classify_with_advisory(
        &self,
        detections: &[Detection],
        image_dimensions: Option<(u32, u32)>,
    ) -> Severity {
        let assessment = self.assess(detections, image_dimensions);
        debug!("Hazard score {:.3} -> {}", assessment.score, assessment.severity);

        match &self.advisory {
            Some(advisory) if assessment.severity.is_reportable() => {
                advisory.refine(assessment.severity, detections).await
            }
            _ => assessment.severity,
        }
    }
}
