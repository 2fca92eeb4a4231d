use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, RgbaImage};
use log::warn;

use crate::error::EmomaskError;
use crate::geometry::Point;
use crate::glyph::{GlyphCatalog, GlyphRaster, GlyphRasterizer};
use crate::overlay::OverlaySet;

/// Upper bound on output raster pixels. A base image beyond this cannot be
/// flattened and fails with `CompositionFailure` instead of exhausting
/// memory mid-allocation.
const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

/// Output encoding for the flattened image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// PNG (lossless; the quality parameter is ignored).
    #[default]
    Png,

    /// JPEG encoding at a configurable quality.
    Jpeg,
}

/// Result of flattening and encoding a composition.
#[derive(Debug, Clone)]
pub struct ComposedPhoto {
    /// The encoded image bytes.
    pub data: Vec<u8>,

    /// The output format used.
    pub format: OutputFormat,

    /// Width of the output image in pixels.
    pub width: u32,

    /// Height of the output image in pixels.
    pub height: u32,
}

/// Decode input bytes into a `DynamicImage`.
pub(crate) fn decode_image(input: &[u8]) -> Result<DynamicImage, EmomaskError> {
    image::load_from_memory(input).map_err(|e| EmomaskError::DecodeError(e.to_string()))
}

/// Flatten the base image and every overlay glyph into one full-resolution
/// raster.
///
/// The output has exactly the base image's pixel dimensions; the base is
/// drawn unscaled at the origin, then each overlay's glyph is rasterized at
/// `overlay.size()` (image-space units, no display correction) and
/// alpha-blended centered on `overlay.center()`, in the set's stable
/// insertion order. Glyphs the rasterizer cannot produce are skipped with a
/// warning. Deterministic for fixed inputs.
pub fn compose(
    base: &DynamicImage,
    overlays: &OverlaySet,
    catalog: &GlyphCatalog,
    rasterizer: &dyn GlyphRasterizer,
) -> Result<RgbaImage, EmomaskError> {
    let (width, height) = (base.width(), base.height());
    if width == 0 || height == 0 {
        return Err(EmomaskError::InvalidGeometry {
            width: f64::from(width),
            height: f64::from(height),
        });
    }
    if u64::from(width) * u64::from(height) > MAX_OUTPUT_PIXELS {
        return Err(EmomaskError::CompositionFailure(format!(
            "output raster {width}x{height} exceeds the addressable pixel budget"
        )));
    }

    let mut output = base.to_rgba8();

    for overlay in overlays.iter() {
        let glyph = catalog.glyph(overlay.glyph_index());
        let Some(raster) = rasterizer.rasterize(glyph, overlay.size() as f32) else {
            warn!("skipping overlay: glyph {glyph:?} could not be rasterized");
            continue;
        };
        let expected = raster.width as usize * raster.height as usize * 4;
        if raster.data.len() != expected {
            warn!(
                "skipping overlay: raster for {glyph:?} has {} bytes, expected {expected}",
                raster.data.len()
            );
            continue;
        }
        blend_centered(&mut output, &raster, overlay.center());
    }

    Ok(output)
}

/// Alpha-blend a glyph raster onto the output, centered on an image-space
/// point and clipped at the image borders.
fn blend_centered(output: &mut RgbaImage, raster: &GlyphRaster, center: Point) {
    let left = (center.x - f64::from(raster.width) / 2.0).round() as i64;
    let top = (center.y - f64::from(raster.height) / 2.0).round() as i64;

    for dy in 0..raster.height {
        for dx in 0..raster.width {
            let target_x = left + i64::from(dx);
            let target_y = top + i64::from(dy);
            if target_x < 0
                || target_y < 0
                || target_x >= i64::from(output.width())
                || target_y >= i64::from(output.height())
            {
                continue;
            }

            let offset = (dy as usize * raster.width as usize + dx as usize) * 4;
            let pixel = image::Rgba([
                raster.data[offset],
                raster.data[offset + 1],
                raster.data[offset + 2],
                raster.data[offset + 3],
            ]);
            let alpha = f32::from(pixel[3]) / 255.0;

            let (tx, ty) = (target_x as u32, target_y as u32);
            if alpha > 0.99 {
                output.put_pixel(tx, ty, pixel);
            } else if alpha > 0.01 {
                let bg = output.get_pixel(tx, ty);
                let blended = blend_pixel(bg, &pixel, alpha);
                output.put_pixel(tx, ty, blended);
            }
        }
    }
}

fn blend_pixel(bg: &image::Rgba<u8>, fg: &image::Rgba<u8>, alpha: f32) -> image::Rgba<u8> {
    let inv = 1.0 - alpha;
    image::Rgba([
        (f32::from(fg[0]) * alpha + f32::from(bg[0]) * inv) as u8,
        (f32::from(fg[1]) * alpha + f32::from(bg[1]) * inv) as u8,
        (f32::from(fg[2]) * alpha + f32::from(bg[2]) * inv) as u8,
        bg[3].max(fg[3]),
    ])
}

/// Encode a flattened raster to the specified format.
///
/// JPEG carries no alpha channel, so the raster is reduced to RGB first;
/// `quality` maps to the JPEG quality percentage and must lie in 0.0–1.0.
/// PNG is lossless and ignores `quality`.
pub fn encode_image(
    image: &RgbaImage,
    format: &OutputFormat,
    quality: f32,
) -> Result<Vec<u8>, EmomaskError> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(EmomaskError::InvalidQuality(quality));
    }

    let mut buffer = Vec::new();
    match format {
        OutputFormat::Png => {
            let encoder = PngEncoder::new(&mut buffer);
            encoder
                .write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ExtendedColorType::Rgba8,
                )
                .map_err(|e| EmomaskError::EncodeError(e.to_string()))?;
        }
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let quality_percent = (quality * 100.0).round() as u8;
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality_percent);
            encoder
                .write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| EmomaskError::EncodeError(e.to_string()))?;
        }
    }

    Ok(buffer)
}
