use crate::Result;
use base64::prelude::*;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::Array3;
use std::io::Cursor;

/// Stand-in frame for backends that have no real browser to photograph.
pub fn blank_screenshot(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
}

pub fn decode_png(data: &[u8]) -> Result<RgbImage> {
    Ok(image::load_from_memory_with_format(data, ImageFormat::Png)?.to_rgb8())
}

pub fn encode_png_base64(img: &RgbImage) -> Result<String> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(BASE64_STANDARD.encode(buf.into_inner()))
}

pub fn decode_png_base64(data: &str) -> Result<RgbImage> {
    let bytes = BASE64_STANDARD.decode(data)?;
    decode_png(&bytes)
}

/// (height, width, channel) layout, as agents usually consume frames.
pub fn image_to_array(img: &RgbImage) -> Result<Array3<u8>> {
    let (width, height) = img.dimensions();
    Ok(Array3::from_shape_vec(
        (height as usize, width as usize, 3),
        img.as_raw().clone(),
    )?)
}

pub fn image_to_rgba(img: &RgbImage) -> Vec<u8> {
    DynamicImage::ImageRgb8(img.clone()).to_rgba8().into_raw()
}
