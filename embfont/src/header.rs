/*!
Container headers, byte-exact.

Both containers open with a small little-endian header: a length byte, a
file flag (1 = bitmap, 2 = vector), a version, the render parameters, a
packed option bitfield, the exact byte size of the index table, and the
NUL-terminated font name. The vector header additionally carries the
scaled vertical metrics.

`parse` is the mirror of `write` and is what firmware-side tooling and
the round-trip tests read headers back with.
*/

use byteorder::{ByteOrder, LittleEndian};

use crate::config::IndexMethod;
use crate::writer::BinaryWriter;
use crate::Error;

pub const BITMAP_FILE_FLAG: u8 = 1;
pub const VECTOR_FILE_FLAG: u8 = 2;

/// Bitmap container format version, frozen at 1.0.2.
pub const BITMAP_VERSION: (u8, u8, u8) = (1, 0, 2);

const BOLD_BIT: u8 = 1 << 0;
const ITALIC_BIT: u8 = 1 << 1;
const OFFSET_INDEX_BIT: u8 = 1 << 3;
const CROP_BIT: u8 = 1 << 4;

/// Longest font name that keeps `headerLength` within its u8.
const MAX_NAME_BYTES: usize = 240;

/// Fixed part of the bitmap header; the name follows at offset 14.
const BITMAP_FIXED_LEN: usize = 14;
/// Fixed part of the vector header; the name follows at offset 20.
const VECTOR_FIXED_LEN: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitmapHeader {
    pub font_size: u8,
    pub render_mode: u8,
    pub bold: bool,
    pub italic: bool,
    pub index_method: IndexMethod,
    pub crop: bool,
    pub index_area_size: i32,
    pub font_name: String,
}

impl BitmapHeader {
    /// Total header bytes, name and terminating NUL included.
    pub fn header_len(&self) -> usize {
        BITMAP_FIXED_LEN + trimmed_name(&self.font_name).len() + 1
    }

    pub fn write(&self, w: &mut BinaryWriter) {
        let name = trimmed_name(&self.font_name);
        w.write_u8(self.header_len() as u8);
        w.write_u8(BITMAP_FILE_FLAG);
        w.write_u8(BITMAP_VERSION.0);
        w.write_u8(BITMAP_VERSION.1);
        w.write_u8(BITMAP_VERSION.2);
        // legacy duplicate of fontSize
        w.write_u8(self.font_size);
        w.write_u8(self.font_size);
        w.write_u8(self.render_mode);
        w.write_u8(pack_bitfield(
            self.bold,
            self.italic,
            self.index_method,
            self.crop,
        ));
        w.write_i32(self.index_area_size);
        w.write_u8(name.len() as u8 + 1);
        w.write_bytes(name.as_bytes());
        w.write_u8(0);
    }

    pub fn parse(bytes: &[u8]) -> Result<BitmapHeader, Error> {
        let bad = |s: String| Error::ParseError(s);

        if bytes.len() < BITMAP_FIXED_LEN {
            return Err(bad("bitmap header truncated".to_string()));
        }
        if bytes[1] != BITMAP_FILE_FLAG {
            return Err(bad(format!("file flag {} is not a bitmap font", bytes[1])));
        }
        let version = (bytes[2], bytes[3], bytes[4]);
        if version != BITMAP_VERSION {
            return Err(bad(format!(
                "unsupported bitmap format version {}.{}.{}",
                version.0, version.1, version.2
            )));
        }
        if bytes[5] != bytes[6] {
            return Err(bad(format!(
                "size bytes disagree: {} vs {}",
                bytes[5], bytes[6]
            )));
        }
        let (bold, italic, index_method, crop) = unpack_bitfield(bytes[8])?;
        let index_area_size = LittleEndian::read_i32(&bytes[9..13]);
        let font_name = read_name(bytes, BITMAP_FIXED_LEN, bytes[0], bytes[13])?;

        Ok(BitmapHeader {
            font_size: bytes[6],
            render_mode: bytes[7],
            bold,
            italic,
            index_method,
            crop,
            index_area_size,
            font_name,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorHeader {
    pub font_size: u8,
    pub bold: bool,
    pub italic: bool,
    pub index_method: IndexMethod,
    pub index_area_size: i32,
    /// Scaled to pixel units; non-negative.
    pub ascent: i16,
    /// Scaled to pixel units; non-positive.
    pub descent: i16,
    pub line_gap: i16,
    pub font_name: String,
}

impl VectorHeader {
    pub fn header_len(&self) -> usize {
        VECTOR_FIXED_LEN + trimmed_name(&self.font_name).len() + 1
    }

    pub fn write(&self, w: &mut BinaryWriter) {
        let name = trimmed_name(&self.font_name);
        w.write_u8(self.header_len() as u8);
        w.write_u8(VECTOR_FILE_FLAG);
        // version major, minor, revision, buildnum
        w.write_u8(0);
        w.write_u8(0);
        w.write_u8(0);
        w.write_u8(0);
        w.write_u8(self.font_size);
        // renderMode slot, meaningless for vector output
        w.write_u8(0);
        w.write_u8(pack_bitfield(self.bold, self.italic, self.index_method, false));
        w.write_i32(self.index_area_size);
        w.write_u8(name.len() as u8 + 1);
        w.write_i16(self.ascent);
        w.write_i16(self.descent);
        w.write_i16(self.line_gap);
        w.write_bytes(name.as_bytes());
        w.write_u8(0);
    }

    pub fn parse(bytes: &[u8]) -> Result<VectorHeader, Error> {
        let bad = |s: String| Error::ParseError(s);

        if bytes.len() < VECTOR_FIXED_LEN {
            return Err(bad("vector header truncated".to_string()));
        }
        if bytes[1] != VECTOR_FILE_FLAG {
            return Err(bad(format!("file flag {} is not a vector font", bytes[1])));
        }
        if bytes[2..6] != [0, 0, 0, 0] {
            return Err(bad("unsupported vector format version".to_string()));
        }
        let (bold, italic, index_method, crop) = unpack_bitfield(bytes[8])?;
        if crop {
            return Err(bad("vector fonts cannot be cropped".to_string()));
        }
        let index_area_size = LittleEndian::read_i32(&bytes[9..13]);
        let ascent = LittleEndian::read_i16(&bytes[14..16]);
        let descent = LittleEndian::read_i16(&bytes[16..18]);
        let line_gap = LittleEndian::read_i16(&bytes[18..20]);
        let font_name = read_name(bytes, VECTOR_FIXED_LEN, bytes[0], bytes[13])?;

        Ok(VectorHeader {
            font_size: bytes[6],
            bold,
            italic,
            index_method,
            index_area_size,
            ascent,
            descent,
            line_gap,
            font_name,
        })
    }
}

fn pack_bitfield(bold: bool, italic: bool, index_method: IndexMethod, crop: bool) -> u8 {
    let mut bits = 0u8;
    if bold {
        bits |= BOLD_BIT;
    }
    if italic {
        bits |= ITALIC_BIT;
    }
    if index_method == IndexMethod::Offset {
        bits |= OFFSET_INDEX_BIT;
    }
    if crop {
        bits |= CROP_BIT;
    }
    bits
}

fn unpack_bitfield(bits: u8) -> Result<(bool, bool, IndexMethod, bool), Error> {
    let index_method = if bits & OFFSET_INDEX_BIT != 0 {
        IndexMethod::Offset
    } else {
        IndexMethod::Address
    };
    let crop = bits & CROP_BIT != 0;
    if crop && index_method == IndexMethod::Offset {
        return Err(Error::ParseError(
            "header claims both crop and offset indexing".to_string(),
        ));
    }
    Ok((bits & BOLD_BIT != 0, bits & ITALIC_BIT != 0, index_method, crop))
}

/// Cut a name down so the header length still fits a byte, on a char
/// boundary.
fn trimmed_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_BYTES {
        return name;
    }
    let mut end = MAX_NAME_BYTES;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

fn read_name(bytes: &[u8], fixed_len: usize, header_len: u8, name_len: u8) -> Result<String, Error> {
    let header_len = header_len as usize;
    let name_len = name_len as usize;
    if name_len == 0 || header_len != fixed_len + name_len || bytes.len() < header_len {
        return Err(Error::ParseError(
            "header length and name length disagree".to_string(),
        ));
    }
    let name_bytes = &bytes[fixed_len..header_len];
    if name_bytes[name_len - 1] != 0 {
        return Err(Error::ParseError(
            "font name is not NUL-terminated".to_string(),
        ));
    }
    String::from_utf8(name_bytes[..name_len - 1].to_vec())
        .map_err(|_| Error::ParseError("font name is not UTF-8".to_string()))
}
