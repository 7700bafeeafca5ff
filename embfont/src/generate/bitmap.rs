/*!
The bitmap encoder: rasterize every accepted code point, run the buffer
pipeline, and serialize the container.

Per glyph the pipeline order is fixed: rasterize, gamma, bold, italic,
rotate, then either crop to the ink box or pad to the 8-pixel grid, and
finally pack to the configured bit depth. A glyph that cannot be
produced (no mapping in the font, or crop geometry that does not fit the
format) is recorded as failed and skipped; failures never abort a run.
*/

use image::GrayImage;

use crate::config::{FontConfig, IndexMethod};
use crate::header::BitmapHeader;
use crate::image_ops::{self, InkBox};
use crate::outline::OutlineSource;
use crate::raster;
use crate::writer::BinaryWriter;
use crate::Error;

use super::EncodedFont;

/// Unused-slot marker in the 2-byte address index.
const UNUSED_RANK: u16 = 0xFFFF;
/// Unused-slot marker in the 4-byte address index.
const UNUSED_OFFSET: u32 = 0xFFFF_FFFF;
/// Slots in an address-mode index: one per possible code point.
const CODE_POINT_SLOTS: usize = 0x1_0000;

/**
Placement of a cropped bitmap inside its pre-crop buffer.

Serialized as four bytes in front of the packed pixels, so every field
has to fit a u8.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropInfo {
    pub top_skip: u8,
    pub left_skip: u8,
    pub valid_width: u8,
    pub valid_height: u8,
}

impl TryFrom<InkBox> for CropInfo {
    type Error = String;

    fn try_from(ink: InkBox) -> Result<CropInfo, String> {
        let narrow = |v: u32| {
            u8::try_from(v).map_err(|_| format!("crop geometry {:?} exceeds 255", ink))
        };
        Ok(CropInfo {
            top_skip: narrow(ink.top)?,
            left_skip: narrow(ink.left)?,
            valid_width: narrow(ink.width)?,
            valid_height: narrow(ink.height)?,
        })
    }
}

/// One rendered glyph, ready for serialization.
#[derive(Clone, Debug)]
pub struct BitmapGlyph {
    pub code_point: u16,
    /// Packed pixel data at the configured bit depth.
    pub data: Vec<u8>,
    /// Pixel dimensions of the packed buffer (multiples of 8 unless
    /// cropped).
    pub width: u32,
    pub height: u32,
    pub crop: Option<CropInfo>,
    /// Horizontal pen advance in pixels.
    pub advance: u32,
}

/**
Render `code_points` (ascending) and build the bitmap container.

The returned buffer is the complete file image; the driver only has to
put it on disk.
*/
pub fn encode<S: OutlineSource>(
    source: &S,
    font_name: &str,
    config: &FontConfig,
    code_points: &[u16],
) -> Result<EncodedFont, Error> {
    if config.crop && config.index_method == IndexMethod::Offset {
        return Err(Error::ConfigValidation(
            "crop requires address indexing".to_string(),
        ));
    }

    let lut = image_ops::gamma_lut(config.gamma);
    let mut glyphs: Vec<BitmapGlyph> = Vec::with_capacity(code_points.len());
    let mut failed: Vec<u16> = Vec::new();

    for &cp in code_points {
        match render_glyph(source, config, &lut, cp) {
            Ok(glyph) => glyphs.push(glyph),
            Err(e) => {
                log::warn!("{}", e);
                failed.push(cp);
            }
        }
    }

    let index_area_size = match (config.index_method, config.crop) {
        (IndexMethod::Address, false) => CODE_POINT_SLOTS * 2,
        (IndexMethod::Address, true) => CODE_POINT_SLOTS * 4,
        (IndexMethod::Offset, _) => glyphs.len() * 2,
    };
    let payload_size: usize = glyphs.iter().map(payload_len).sum();

    let header = BitmapHeader {
        font_size: config.font_size,
        render_mode: config.render_mode,
        bold: config.bold,
        italic: config.italic,
        index_method: config.index_method,
        crop: config.crop,
        index_area_size: index_area_size as i32,
        font_name: font_name.to_string(),
    };

    let mut w = BinaryWriter::with_capacity(header.header_len() + index_area_size + payload_size);
    header.write(&mut w);
    let index_base = w.position();

    match (config.index_method, config.crop) {
        (IndexMethod::Address, false) => {
            let mut ranks = vec![UNUSED_RANK; CODE_POINT_SLOTS];
            for (rank, glyph) in glyphs.iter().enumerate() {
                ranks[glyph.code_point as usize] = rank as u16;
            }
            for rank in ranks {
                w.write_u16(rank);
            }
            for glyph in &glyphs {
                w.write_bytes(&glyph.data);
            }
        }
        (IndexMethod::Address, true) => {
            for _ in 0..CODE_POINT_SLOTS {
                w.write_u32(UNUSED_OFFSET);
            }
            for glyph in &glyphs {
                let offset = w.position() as u32;
                w.patch_u32_at(index_base + glyph.code_point as usize * 4, offset)?;
                write_payload(&mut w, glyph);
            }
        }
        (IndexMethod::Offset, _) => {
            for glyph in &glyphs {
                w.write_u16(glyph.code_point);
            }
            for glyph in &glyphs {
                w.write_bytes(&glyph.data);
            }
        }
    }

    Ok(EncodedFont {
        container: w.into_bytes(),
        accepted: glyphs.iter().map(|g| g.code_point).collect(),
        failed,
    })
}

fn payload_len(glyph: &BitmapGlyph) -> usize {
    match glyph.crop {
        Some(_) => 4 + glyph.data.len(),
        None => glyph.data.len(),
    }
}

fn write_payload(w: &mut BinaryWriter, glyph: &BitmapGlyph) {
    if let Some(crop) = &glyph.crop {
        w.write_u8(crop.top_skip);
        w.write_u8(crop.left_skip);
        w.write_u8(crop.valid_width);
        w.write_u8(crop.valid_height);
    }
    w.write_bytes(&glyph.data);
}

/// Run the whole per-glyph pipeline for one code point.
fn render_glyph<S: OutlineSource>(
    source: &S,
    config: &FontConfig,
    lut: &[u8; 256],
    code_point: u16,
) -> Result<BitmapGlyph, Error> {
    let outline = source.glyph(code_point).ok_or_else(|| Error::GlyphRenderFailed {
        code_point,
        reason: "the font has no glyph for it".to_string(),
    })?;

    let scale = config.font_size as f32 / source.units_per_em();
    let advance = (outline.advance * scale).round().max(0.0) as u32;
    let font_size = config.font_size as u32;

    let img = if outline.commands.is_empty() {
        // blank glyph: half the advance wide, never zero
        GrayImage::new((advance / 2).max(1), font_size)
    } else {
        let contours = raster::flatten(&outline.commands);
        let baseline = scale * source.line_metrics().ascent;
        raster::fill(&contours, scale, 0.0, baseline, advance.max(1), font_size)
    };

    let img = image_ops::apply_gamma(&img, lut);
    let img = if config.bold { image_ops::embolden(&img) } else { img };
    let img = if config.italic { image_ops::italicize(&img) } else { img };
    let img = image_ops::rotate(&img, config.rotation);

    if config.crop {
        let (img, ink) = image_ops::crop_to_ink(&img);
        let crop = CropInfo::try_from(ink).map_err(|reason| Error::GlyphRenderFailed {
            code_point,
            reason,
        })?;
        Ok(BitmapGlyph {
            code_point,
            data: image_ops::pack_bits(&img, config.render_mode),
            width: ink.width,
            height: ink.height,
            crop: Some(crop),
            advance,
        })
    } else {
        let img = image_ops::pad_to_alignment(&img);
        Ok(BitmapGlyph {
            code_point,
            data: image_ops::pack_bits(&img, config.render_mode),
            width: img.width(),
            height: img.height(),
            crop: None,
            advance,
        })
    }
}
