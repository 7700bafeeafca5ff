/*!
Container generation.

The two encoders share a thin chassis: tracked output files (so a failed
run can sweep up its own droppings), the charset sidecar, the
failed-characters report, and the output naming scheme. The per-format
work lives in [`bitmap`] and [`vector`].
*/

use std::path::{Path, PathBuf};

use crate::writer::BinaryWriter;
use crate::Error;

pub mod bitmap;
pub mod vector;

/// Name of the per-run report listing code points that failed to render.
pub const FAILED_CHARS_FILE: &str = "NotSupportedChars.txt";

/**
The files a run has created so far.

Any error that aborts a run leaves partial output behind; the driver
calls [`Outputs::cleanup`] to delete whatever was already written before
surfacing the error.
*/
#[derive(Debug, Default)]
pub struct Outputs {
    created: Vec<PathBuf>,
}

impl Outputs {
    pub fn new() -> Outputs {
        Outputs::default()
    }

    /// Write `bytes` to `path`, remembering the path for cleanup.
    pub fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<(), Error> {
        self.created.push(path.to_path_buf());
        std::fs::write(path, bytes)
            .map_err(|e| Error::WriteError(format!("cannot write {}: {}", path.display(), e)))
    }

    /// Best-effort removal of everything written so far.
    pub fn cleanup(&self) {
        for path in &self.created {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("could not remove partial output {}: {}", path.display(), e);
                }
            }
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.created
    }
}

/// Create the output directory (and parents) if it is not already there.
pub fn ensure_output_dir(dir: &Path) -> Result<(), Error> {
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::WriteError(format!("cannot create {}: {}", dir.display(), e)))
}

/// Serialize a charset sidecar: consecutive little-endian u16 code
/// points, nothing else.
pub fn charset_bytes(code_points: &[u16]) -> Vec<u8> {
    let mut w = BinaryWriter::with_capacity(code_points.len() * 2);
    for cp in code_points {
        w.write_u16(*cp);
    }
    w.into_bytes()
}

/// Render the failed-characters report: one `U+XXXX` per line.
pub fn failed_chars_report(failed: &[u16]) -> String {
    let mut text = String::with_capacity(failed.len() * 7);
    for cp in failed {
        text.push_str(&format!("U+{:04X}\n", cp));
    }
    text
}

/// `<stem>_size<N>_bits<M>_bitmap.bin` and friends.
pub fn bitmap_file_stem(font_name: &str, font_size: u8, render_mode: u8) -> String {
    format!("{}_size{}_bits{}_bitmap", font_name, font_size, render_mode)
}

/// `<stem>_vector.bin` and friends.
pub fn vector_file_stem(font_name: &str) -> String {
    format!("{}_vector", font_name)
}

/// What an encoder hands back to the driver.
#[derive(Debug)]
pub struct EncodedFont {
    /// The complete container, header through last payload.
    pub container: Vec<u8>,
    /// Code points that rendered successfully, ascending.
    pub accepted: Vec<u16>,
    /// Code points that could not be rendered, ascending.
    pub failed: Vec<u16>,
}
