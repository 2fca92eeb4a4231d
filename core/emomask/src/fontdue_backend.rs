use crate::error::EmomaskError;
use crate::glyph::{GlyphRaster, GlyphRasterizer};

/// Glyph rasterizer backed by the `fontdue` crate.
///
/// Renders outline coverage from a caller-supplied font as an opaque dark
/// glyph. Color emoji tables (CBDT/COLR) are not interpreted — a font whose
/// emoji only exist as color bitmaps reports those glyphs as missing and the
/// compositor skips them.
pub struct FontdueRasterizer {
    font: fontdue::Font,
}

impl FontdueRasterizer {
    /// Parse a font from raw bytes (TTF/OTF).
    pub fn from_bytes(data: &[u8]) -> Result<Self, EmomaskError> {
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(|e| EmomaskError::DecodeError(format!("failed to parse font: {e}")))?;
        Ok(Self { font })
    }
}

impl GlyphRasterizer for FontdueRasterizer {
    fn rasterize(&self, glyph: &str, px_size: f32) -> Option<GlyphRaster> {
        if !(px_size.is_finite() && px_size > 0.0) {
            return None;
        }

        // Multi-codepoint sequences (ZWJ emoji, modifiers) render their
        // base character; fontdue shapes single codepoints only.
        let ch = glyph.chars().next()?;
        if self.font.lookup_glyph_index(ch) == 0 {
            return None;
        }

        let (metrics, coverage) = self.font.rasterize(ch, px_size);
        if metrics.width == 0 || metrics.height == 0 {
            return None;
        }

        let mut data = Vec::with_capacity(coverage.len() * 4);
        for value in coverage {
            data.extend_from_slice(&[32, 32, 32, value]);
        }

        Some(GlyphRaster {
            width: metrics.width as u32,
            height: metrics.height as u32,
            data,
        })
    }
}
