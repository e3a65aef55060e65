//! Vertical composition of frame pairs.

use image::{imageops, Rgb, RgbImage};

/// Stack two rasters vertically, cam0 on top.
///
/// Output width is the maximum of the inputs, height the sum; the narrower
/// input is centered horizontally on a white background.
pub fn compose_vertical(top: &RgbImage, bottom: &RgbImage) -> RgbImage {
    let width = top.width().max(bottom.width());
    let height = top.height() + bottom.height();

    let mut out = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    let top_x = i64::from((width - top.width()) / 2);
    let bottom_x = i64::from((width - bottom.width()) / 2);

    imageops::replace(&mut out, top, top_x, 0);
    imageops::replace(&mut out, bottom, bottom_x, i64::from(top.height()));

    out
}
