/*!
Convert scalable outline fonts (.ttf/.otf) into compact binary fonts for
memory-constrained display firmware.

For every requested code point the converter emits either

  * a pre-rasterized grayscale bitmap, packed at 1, 2, 4, or 8 bits per
    pixel, with optional bold, italic, rotation, gamma correction and
    per-glyph cropping; or

  * a vector glyph: a bounding box, an advance width, and the glyph's
    filled contours as lists of integer points.

Output is a single binary container (`*.bin`) plus a sidecar character-set
file (`*.cst`) listing the code points the container actually serves.

Converting a font takes three steps:

  1. Describe what you want as a [`config::FontConfig`] (usually
     deserialized from a JSON config file with [`config::load_config`]).

  2. Resolve the character sets into code points and load the font.

  3. Hand everything to the driver.

```no_run
use embfont::{config, driver};

let fonts = config::load_config("fonts.json".as_ref()).unwrap();
driver::run_all(&fonts).unwrap();
```

The pieces are usable on their own: [`charset`] resolves character-set
sources, [`raster`] turns outline path commands into grayscale buffers,
[`image_ops`] holds the pure buffer transforms, [`generate`] builds the
containers, and [`header`] packs and re-parses the container headers.
*/

use std::path::PathBuf;

pub mod charset;
pub mod config;
pub mod driver;
pub mod generate;
pub mod header;
pub mod image_ops;
pub mod outline;
pub mod raster;
pub mod writer;

/**
Error type for errors produced by this crate.

Variants are grouped by cause. Everything except `GlyphRenderFailed`
aborts the current font run; a failed glyph is recorded and skipped.
*/
#[derive(Debug)]
pub enum Error {
    /// A config field is missing, out of range, or the combination of
    /// fields is not representable in the output format.
    ConfigValidation(String),

    /// The named config or font file does not exist.
    FileNotFound(PathBuf),

    /// The config file is not valid JSON, or a value in it cannot be
    /// interpreted.
    ParseError(String),

    /// A code point range string does not have the `0xHHHH-0xHHHH` shape,
    /// or its bounds are out of order or out of domain.
    InvalidRange(String),

    /// A character-set file named by the config is absent.
    CharsetFileMissing(PathBuf),

    /// A character-set file exists but cannot be interpreted.
    CharsetParseError(String),

    /// The config names a codepage file; codepage sources are not
    /// supported.
    CodepageUnsupported(PathBuf),

    /// The font file exists but cannot be parsed as an outline font.
    FontLoadError(String),

    /// A single code point could not be rendered. Never fatal.
    GlyphRenderFailed { code_point: u16, reason: String },

    /// The filesystem refused a write, or an emitted value cannot be
    /// placed where the container layout requires it.
    WriteError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::ConfigValidation(s) => {
                write!(f, "invalid configuration: {}", s)
            }
            Error::FileNotFound(p) => {
                write!(f, "file not found: {}", p.display())
            }
            Error::ParseError(s) => {
                write!(f, "parse error: {}", s)
            }
            Error::InvalidRange(s) => {
                write!(f, "invalid code point range \"{}\"", s)
            }
            Error::CharsetFileMissing(p) => {
                write!(f, "character set file not found: {}", p.display())
            }
            Error::CharsetParseError(s) => {
                write!(f, "character set parse error: {}", s)
            }
            Error::CodepageUnsupported(p) => {
                write!(
                    f,
                    "codepage character sets are not supported: {}",
                    p.display()
                )
            }
            Error::FontLoadError(s) => {
                write!(f, "font load error: {}", s)
            }
            Error::GlyphRenderFailed { code_point, reason } => {
                write!(f, "U+{:04X} could not be rendered: {}", code_point, reason)
            }
            Error::WriteError(s) => {
                write!(f, "write error: {}", s)
            }
        }
    }
}

impl std::error::Error for Error {}
