//! Shared helpers for unit tests.

use crate::scene::{ImageSource, SceneObject};

/// Encodes a blank RGBA raster of the given size as PNG bytes.
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let raster = image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
    let mut out = std::io::Cursor::new(Vec::new());
    raster
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

/// An image object with real decodable payload of the given pixel size.
pub(crate) fn image_object(width: u32, height: u32) -> SceneObject {
    SceneObject::image(ImageSource {
        data: png_bytes(width, height),
        natural_width: f64::from(width),
        natural_height: f64::from(height),
    })
}
