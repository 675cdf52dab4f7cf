pub mod clock;
pub mod geo;
pub mod image_reference;

pub use clock::{Clock, ManualClock, SystemClock};
pub use geo::GeoPoint;
pub use image_reference::ImageReference;

/// Encodes a solid-gray PNG of the given size, for tests that need a readable image
#[cfg(test)]
pub(crate) fn test_image_png(width: u32, height: u32) -> Vec<u8> {
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    let img: DynamicImage = DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
        width,
        height,
        Rgb([128, 128, 128]),
    ));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}
