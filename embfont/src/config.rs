/*!
The conversion contract: what to render, how, and where to put it.

A config file is JSON: an object with an optional shared `output`
directory and a list of font entries.

```json
{
    "output": "generated/",
    "fonts": [
        {
            "fontPath": "fonts/LiberationMono-Regular.ttf",
            "fontSize": 24,
            "outputFormat": "bitmap",
            "renderMode": 4,
            "bold": false,
            "italic": false,
            "rotation": 0,
            "gamma": 1.0,
            "indexMethod": "address",
            "crop": false,
            "characterSets": [
                { "type": "range", "value": "0x0020-0x007F" }
            ]
        }
    ]
}
```

Field names are camelCase (the config dialect predates this rewrite and
is kept compatible). Relative paths are taken relative to the config
file's directory.
*/

use std::path::{Path, PathBuf};

use serde_derive::{Deserialize, Serialize};

use crate::charset::CharsetSource;
use crate::Error;

/// Which container the run produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Bitmap,
    Vector,
}

/// How the index table addresses glyph payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMethod {
    /// 65536 fixed slots, indexed directly by code point.
    #[default]
    Address,
    /// One entry per accepted code point, ascending.
    Offset,
}

/// Clockwise glyph rotation, in quarter turns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Rotation, String> {
        match degrees {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Cw90),
            180 => Ok(Rotation::Cw180),
            270 => Ok(Rotation::Cw270),
            other => Err(format!(
                "rotation must be 0, 90, 180 or 270 degrees, not {}",
                other
            )),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> u16 {
        match rotation {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }
}

/**
Everything needed to convert one font into one container.

`base_dir` is not part of the file format; [`load_config`] fills it in
so relative character-set paths resolve against the config file.
*/
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontConfig {
    /// The outline font to convert.
    pub font_path: PathBuf,

    /// Directory the container and sidecars are written into. Falls
    /// back to the config file's shared `output` value when absent.
    #[serde(default)]
    pub output_path: PathBuf,

    /// Pixel size, 1..=255.
    pub font_size: u8,

    #[serde(default)]
    pub output_format: OutputFormat,

    /// Bits per pixel: 1, 2, 4 or 8. Bitmap output only.
    #[serde(default = "default_render_mode")]
    pub render_mode: u8,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    #[serde(default)]
    pub rotation: Rotation,

    /// Gamma correction exponent, 0.1..=5.0.
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    #[serde(default)]
    pub index_method: IndexMethod,

    /// Tighten each bitmap to its ink box. Bitmap output only; requires
    /// address indexing.
    #[serde(default)]
    pub crop: bool,

    pub character_sets: Vec<CharsetSource>,

    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_render_mode() -> u8 {
    8
}

fn default_gamma() -> f64 {
    1.0
}

impl FontConfig {
    /**
    Check the scalar ranges and field combinations this contract allows.

    Cropped bitmaps are located by absolute file offsets, which only the
    address index can carry, so `crop` together with offset indexing is
    rejected rather than silently mis-encoded.
    */
    pub fn validate(&self) -> Result<(), Error> {
        if self.font_path.as_os_str().is_empty() {
            return Err(Error::ConfigValidation("fontPath is empty".to_string()));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(Error::ConfigValidation(
                "no output path: set outputPath on the font or output on the config".to_string(),
            ));
        }
        if self.font_size == 0 {
            return Err(Error::ConfigValidation(
                "fontSize must be between 1 and 255".to_string(),
            ));
        }
        if !matches!(self.render_mode, 1 | 2 | 4 | 8) {
            return Err(Error::ConfigValidation(format!(
                "renderMode must be 1, 2, 4 or 8 bits per pixel, not {}",
                self.render_mode
            )));
        }
        if !(0.1..=5.0).contains(&self.gamma) {
            return Err(Error::ConfigValidation(format!(
                "gamma must be between 0.1 and 5.0, not {}",
                self.gamma
            )));
        }
        if self.crop && self.index_method == IndexMethod::Offset {
            return Err(Error::ConfigValidation(
                "crop requires address indexing: cropped glyphs vary in size, so the \
                 offset index cannot locate them"
                    .to_string(),
            ));
        }
        if self.character_sets.is_empty() {
            return Err(Error::ConfigValidation(
                "characterSets is empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default)]
    output: Option<PathBuf>,
    fonts: Vec<FontConfig>,
}

/**
Load and validate a JSON config file.

Each returned [`FontConfig`] has its font and output paths resolved
against the config file's directory and has passed [`FontConfig::validate`].
*/
pub fn load_config(path: &Path) -> Result<Vec<FontConfig>, Error> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(Error::ParseError(format!(
                "cannot read {}: {}",
                path.display(),
                e
            )));
        }
    };
    let file: ConfigFile = serde_json::from_str(&text).map_err(|e| {
        Error::ParseError(format!("{} is not a valid config: {}", path.display(), e))
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut fonts = file.fonts;
    for font in fonts.iter_mut() {
        if font.output_path.as_os_str().is_empty() {
            if let Some(shared) = &file.output {
                font.output_path = shared.clone();
            }
        }
        font.font_path = join_base(base, &font.font_path);
        font.output_path = join_base(base, &font.output_path);
        font.base_dir = base.to_path_buf();
        font.validate()?;
    }

    if fonts.is_empty() {
        return Err(Error::ConfigValidation(
            "config lists no fonts".to_string(),
        ));
    }

    Ok(fonts)
}

fn join_base(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || path.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
