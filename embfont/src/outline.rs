/*!
The glyph source seam.

Encoders only need three things from an outline font: per-glyph path
commands with an advance width, the em scale, and the font-wide vertical
metrics. [`OutlineSource`] is that contract; [`FontFile`] implements it
on top of `ab_glyph`, and tests implement it with synthetic glyphs.
*/

use std::path::Path;

use ab_glyph::{Font, FontVec, OutlineCurve};

use crate::raster::PathCommand;
use crate::Error;

/// Font-wide vertical metrics, in unscaled font units.
#[derive(Clone, Copy, Debug)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

/// One glyph as the font describes it: outline commands in font units
/// plus the unscaled horizontal advance.
#[derive(Clone, Debug)]
pub struct GlyphOutline {
    pub commands: Vec<PathCommand>,
    pub advance: f32,
}

/// What the encoders need from an outline font.
pub trait OutlineSource {
    /// Font units per em square; the pixel scale is `size / units_per_em`.
    fn units_per_em(&self) -> f32;

    fn line_metrics(&self) -> LineMetrics;

    /// The glyph for `code_point`, or `None` when the font has no
    /// mapping for it.
    fn glyph(&self, code_point: u16) -> Option<GlyphOutline>;
}

/// An outline font loaded from disk.
pub struct FontFile {
    font: FontVec,
    units_per_em: f32,
    name: String,
}

impl FontFile {
    /**
    Read and parse a .ttf/.otf file.

    The file's stem becomes the font name recorded in container headers
    and output file names.
    */
    pub fn load(path: &Path) -> Result<FontFile, Error> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(Error::FontLoadError(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        let font = FontVec::try_from_vec(bytes).map_err(|_| {
            Error::FontLoadError(format!(
                "{} does not contain recognizable font data",
                path.display()
            ))
        })?;
        let units_per_em = font.units_per_em().ok_or_else(|| {
            Error::FontLoadError(format!(
                "{} lacks a usable units-per-em value",
                path.display()
            ))
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "font".to_string());

        Ok(FontFile {
            font,
            units_per_em,
            name,
        })
    }

    /// The font file's stem, used for headers and output names.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl OutlineSource for FontFile {
    fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    fn line_metrics(&self) -> LineMetrics {
        LineMetrics {
            ascent: self.font.ascent_unscaled(),
            descent: self.font.descent_unscaled(),
            line_gap: self.font.line_gap_unscaled(),
        }
    }

    fn glyph(&self, code_point: u16) -> Option<GlyphOutline> {
        // Surrogate code points have no char form and no glyph.
        let c = char::from_u32(code_point as u32)?;
        let id = self.font.glyph_id(c);
        if id.0 == 0 {
            // .notdef: the font has no mapping for this character
            return None;
        }
        let advance = self.font.h_advance_unscaled(id);
        let commands = match self.font.outline(id) {
            Some(outline) => curves_to_commands(&outline.curves),
            // no outline at all (spaces and friends): an empty glyph
            None => Vec::new(),
        };
        Some(GlyphOutline { commands, advance })
    }
}

/**
Re-express `ab_glyph`'s flat curve list as a command stream.

`ab_glyph` strips the `MoveTo`/`Close` structure and hands back
consecutive curves; a contour break shows up as a curve that does not
start where the previous one ended. This inverts that: each break
closes the previous contour and opens the next.
*/
fn curves_to_commands(curves: &[OutlineCurve]) -> Vec<PathCommand> {
    let mut commands = Vec::with_capacity(curves.len() + 2);
    let mut pen: Option<ab_glyph::Point> = None;

    for curve in curves {
        let (start, end) = match curve {
            OutlineCurve::Line(a, b) => (*a, *b),
            OutlineCurve::Quad(a, _, b) => (*a, *b),
            OutlineCurve::Cubic(a, _, _, b) => (*a, *b),
        };

        let broken = match pen {
            Some(p) => p != start,
            None => true,
        };
        if broken {
            if pen.is_some() {
                commands.push(PathCommand::Close);
            }
            commands.push(PathCommand::MoveTo {
                x: start.x,
                y: start.y,
            });
        }

        match curve {
            OutlineCurve::Line(_, b) => {
                commands.push(PathCommand::LineTo { x: b.x, y: b.y });
            }
            OutlineCurve::Quad(_, c, b) => {
                commands.push(PathCommand::QuadTo {
                    x1: c.x,
                    y1: c.y,
                    x: b.x,
                    y: b.y,
                });
            }
            OutlineCurve::Cubic(_, c1, c2, b) => {
                commands.push(PathCommand::CurveTo {
                    x1: c1.x,
                    y1: c1.y,
                    x2: c2.x,
                    y2: c2.y,
                    x: b.x,
                    y: b.y,
                });
            }
        }
        pen = Some(end);
    }
    if pen.is_some() {
        commands.push(PathCommand::Close);
    }

    commands
}
