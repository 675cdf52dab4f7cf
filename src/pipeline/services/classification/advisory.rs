use crate::error::GenerationError;
use crate::pipeline::types::{findings_summary, Detection, Severity};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Natural-language generation backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Asks a text generator for a second opinion on the tier
pub struct AdvisoryRefiner {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl AdvisoryRefiner {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn prompt(numeric: Severity, detections: &[Detection]) -> String {
        format!(
            "You rate road hazards for drivers. Findings: {}. Numeric rating: {}. \
             Answer with exactly one word: HIGH, MEDIUM or LOW.",
            findings_summary(detections),
            numeric
        )
    }

    /// The less severe of the numeric tier and the advisory answer.
    /// Failure, timeout or an unparseable answer keeps the numeric tier.
    pub async fn refine(&self, numeric: Severity, detections: &[Detection]) -> Severity {
        let prompt = Self::prompt(numeric, detections);
        let generation = self.generator.generate(&prompt);
        let answer = match tokio::time::timeout(self.timeout, generation).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!("Advisory failed, keeping {}: {}", numeric, e);
                return numeric;
            }
            Err(_) => {
                warn!(
                    "Advisory failed, keeping {}: {}",
                    numeric,
                    GenerationError::Timeout(self.timeout)
                );
                return numeric;
            }
        };

        match Severity::parse_tier(&answer) {
            Some(advised) => {
                debug!("Advisory says {} (numeric {})", advised, numeric);
                numeric.min(advised)
            }
            None => {
                debug!("Unparseable advisory answer '{}'", answer.trim());
                numeric
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::ScriptedGenerator;

    fn refiner(generator: ScriptedGenerator) -> AdvisoryRefiner {
        AdvisoryRefiner::new(Arc::new(generator), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_failure_keeps_numeric() {
        let refiner = refiner(ScriptedGenerator::failing());
        assert_eq!(refiner.refine(Severity::High, &[]).await, Severity::High);
    }

    #[tokio::test]
    async fn test_timeout_keeps_numeric() {
        let refiner =
            refiner(ScriptedGenerator::answering("LOW").with_delay(Duration::from_millis(500)));
        assert_eq!(refiner.refine(Severity::Medium, &[]).await, Severity::Medium);
    }

    #[tokio::test]
    async fn test_unparseable_keeps_numeric() {
        let refiner = refiner(ScriptedGenerator::answering("hard to say"));
        assert_eq!(refiner.refine(Severity::High, &[]).await, Severity::High);
    }

    #[tokio::test]
    async fn test_confirm_and_downgrade() {
        assert_eq!(
            refiner(ScriptedGenerator::answering("high")).refine(Severity::High, &[]).await,
            Severity::High
        );
        assert_eq!(
            refiner(ScriptedGenerator::answering("MEDIUM.")).refine(Severity::High, &[]).await,
            Severity::Medium
        );
    }
}
