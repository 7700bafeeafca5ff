/*!
The vector encoder: per glyph, a bounding box, an advance, and the
glyph's filled contours as integer point lists.

Coordinates stay in the font's y-up orientation, scaled to the pixel
size and rounded to signed 16-bit integers. Curves flatten with the same
fixed subdivision the rasterizer uses, so a consumer filling these
polygons reproduces the bitmap rendition of the same outline.
*/

use crate::config::{FontConfig, IndexMethod};
use crate::header::VectorHeader;
use crate::outline::OutlineSource;
use crate::raster;
use crate::writer::BinaryWriter;
use crate::Error;

use super::EncodedFont;

/// Unused-slot marker in the address index.
const UNUSED_OFFSET: u32 = 0xFFFF_FFFF;
/// Slots in an address-mode index: one per possible code point.
const CODE_POINT_SLOTS: usize = 0x1_0000;

/// One glyph's outline, scaled and rounded for the container.
#[derive(Clone, Debug)]
pub struct VectorGlyph {
    pub code_point: u16,
    /// `(sx0, sy0, sx1, sy1)`, the tight box around all winding points.
    pub bbox: (i16, i16, i16, i16),
    /// Horizontal pen advance in pixels.
    pub advance: u16,
    /// Closed contours; each point list is non-empty and implicitly
    /// closed.
    pub windings: Vec<Vec<(i16, i16)>>,
}

impl VectorGlyph {
    fn payload_len(&self) -> usize {
        let points: usize = self.windings.iter().map(Vec::len).sum();
        8 + 2 + 1 + self.windings.len() + points * 4
    }
}

/**
Extract `code_points` (ascending) and build the vector container.
*/
pub fn encode<S: OutlineSource>(
    source: &S,
    font_name: &str,
    config: &FontConfig,
    code_points: &[u16],
) -> Result<EncodedFont, Error> {
    let scale = config.font_size as f32 / source.units_per_em();

    let mut glyphs: Vec<VectorGlyph> = Vec::with_capacity(code_points.len());
    let mut failed: Vec<u16> = Vec::new();
    for &cp in code_points {
        match extract_glyph(source, scale, cp) {
            Ok(glyph) => glyphs.push(glyph),
            Err(e) => {
                log::warn!("{}", e);
                failed.push(cp);
            }
        }
    }

    let index_area_size = match config.index_method {
        IndexMethod::Address => CODE_POINT_SLOTS * 4,
        IndexMethod::Offset => glyphs.len() * 6,
    };
    let payload_size: usize = glyphs.iter().map(VectorGlyph::payload_len).sum();

    let metrics = source.line_metrics();
    let header = VectorHeader {
        font_size: config.font_size,
        bold: config.bold,
        italic: config.italic,
        index_method: config.index_method,
        index_area_size: index_area_size as i32,
        ascent: round_i16(metrics.ascent * scale),
        descent: round_i16(metrics.descent * scale),
        line_gap: round_i16(metrics.line_gap * scale),
        font_name: font_name.to_string(),
    };

    let mut w = BinaryWriter::with_capacity(header.header_len() + index_area_size + payload_size);
    header.write(&mut w);
    let index_base = w.position();

    match config.index_method {
        IndexMethod::Address => {
            for _ in 0..CODE_POINT_SLOTS {
                w.write_u32(UNUSED_OFFSET);
            }
            for glyph in &glyphs {
                let offset = w.position() as u32;
                w.patch_u32_at(index_base + glyph.code_point as usize * 4, offset)?;
                write_payload(&mut w, glyph);
            }
        }
        IndexMethod::Offset => {
            for glyph in &glyphs {
                w.write_u16(glyph.code_point);
                w.write_u32(UNUSED_OFFSET);
            }
            for (i, glyph) in glyphs.iter().enumerate() {
                let offset = w.position() as u32;
                w.patch_u32_at(index_base + i * 6 + 2, offset)?;
                write_payload(&mut w, glyph);
            }
        }
    }

    Ok(EncodedFont {
        container: w.into_bytes(),
        accepted: glyphs.iter().map(|g| g.code_point).collect(),
        failed,
    })
}

fn write_payload(w: &mut BinaryWriter, glyph: &VectorGlyph) {
    let (sx0, sy0, sx1, sy1) = glyph.bbox;
    w.write_i16(sx0);
    w.write_i16(sy0);
    w.write_i16(sx1);
    w.write_i16(sy1);
    w.write_u16(glyph.advance);
    w.write_u8(glyph.windings.len() as u8);
    for winding in &glyph.windings {
        w.write_u8(winding.len() as u8);
    }
    for winding in &glyph.windings {
        for &(x, y) in winding {
            w.write_i16(x);
            w.write_i16(y);
        }
    }
}

/// Scale, flatten and round one glyph's contours.
fn extract_glyph<S: OutlineSource>(
    source: &S,
    scale: f32,
    code_point: u16,
) -> Result<VectorGlyph, Error> {
    let fail = |reason: String| Error::GlyphRenderFailed {
        code_point,
        reason,
    };

    let outline = source
        .glyph(code_point)
        .ok_or_else(|| fail("the font has no glyph for it".to_string()))?;

    let advance_px = (outline.advance * scale).round();
    if !(0.0..=u16::MAX as f32).contains(&advance_px) {
        return Err(fail(format!("advance {} does not fit a u16", advance_px)));
    }
    let advance = advance_px as u16;

    let mut windings: Vec<Vec<(i16, i16)>> = Vec::new();
    for contour in raster::flatten(&outline.commands) {
        if contour.len() < 2 {
            continue;
        }
        if contour.len() > u8::MAX as usize {
            return Err(fail(format!(
                "a winding has {} points; at most 255 fit the format",
                contour.len()
            )));
        }
        let winding: Vec<(i16, i16)> = contour
            .iter()
            .map(|&(x, y)| Ok((round_point(x * scale)?, round_point(y * scale)?)))
            .collect::<Result<_, String>>()
            .map_err(|reason| fail(reason))?;
        windings.push(winding);
    }
    if windings.len() > u8::MAX as usize {
        return Err(fail(format!(
            "{} windings; at most 255 fit the format",
            windings.len()
        )));
    }

    let mut bbox = (0i16, 0i16, 0i16, 0i16);
    let mut first = true;
    for &(x, y) in windings.iter().flatten() {
        if first {
            bbox = (x, y, x, y);
            first = false;
        } else {
            bbox.0 = bbox.0.min(x);
            bbox.1 = bbox.1.min(y);
            bbox.2 = bbox.2.max(x);
            bbox.3 = bbox.3.max(y);
        }
    }

    Ok(VectorGlyph {
        code_point,
        bbox,
        advance,
        windings,
    })
}

fn round_point(v: f32) -> Result<i16, String> {
    let r = v.round();
    if (i16::MIN as f32..=i16::MAX as f32).contains(&r) {
        Ok(r as i16)
    } else {
        Err(format!("coordinate {} does not fit an i16", r))
    }
}

fn round_i16(v: f32) -> i16 {
    v.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
