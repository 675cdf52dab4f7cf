use crate::pipeline::types::{Detection, SignCondition};
use image::DynamicImage;

/// Mean luma below this marks a sign as faded
pub const FADED_LUMA_THRESHOLD: f64 = 80.0;

pub fn assess_sign_condition(image: &DynamicImage, detection: &Detection) -> SignCondition {
    let region = detection.region().clipped_to(image.width(), image.height());
    if region.area() == 0 {
        return SignCondition::Unknown;
    }

    let crop = image
        .crop_imm(region.x, region.y, region.width, region.height)
        .to_luma8();
    let total: u64 = crop.pixels().map(|p| p.0[0] as u64).sum();
    let mean = total as f64 / region.area() as f64;

    if mean < FADED_LUMA_THRESHOLD {
        SignCondition::Faded
    } else {
        SignCondition::Good
    }
}

/// Attaches a condition to every sign detection. Hazards pass through unchanged.
/// Without a decodable image every sign is `Unknown`.
pub fn annotate_signs(image: Option<&DynamicImage>, detections: Vec<Detection>) -> Vec<Detection> {
    detections
        .into_iter()
        .map(|detection| {
            if detection.is_hazard() || detection.condition().is_some() {
                return detection;
            }
            let condition = image
                .map(|img| assess_sign_condition(img, &detection))
                .unwrap_or(SignCondition::Unknown);
            detection.with_condition(condition)
        })
        .collect()
}
