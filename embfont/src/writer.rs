/*!
Little-endian byte emission for the binary containers.

Every multi-byte value in the output format is little-endian, and the
index tables of the crop and vector layouts store absolute file offsets
of payloads that are only written later. [`BinaryWriter`] therefore pairs
a growable buffer with an absolute-position patch operation, so an
encoder can emit a placeholder, write the payload, and then go back and
fill in the real offset.
*/

use std::mem::size_of;

use byteorder::{ByteOrder, LittleEndian};

use crate::Error;

macro_rules! impl_write {
    ($fn_name:ident, $typ:ty, $write:ident) => {
        pub fn $fn_name(&mut self, value: $typ) {
            let mut buf = [0u8; size_of::<$typ>()];
            LittleEndian::$write(&mut buf, value);
            self.buf.extend_from_slice(&buf);
        }
    };
}

/// A growable byte buffer with a write cursor at its end.
#[derive(Debug, Default)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> BinaryWriter {
        BinaryWriter { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> BinaryWriter {
        BinaryWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// The absolute offset the next write lands at.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    impl_write!(write_u16, u16, write_u16);
    impl_write!(write_i16, i16, write_i16);
    impl_write!(write_u32, u32, write_u32);
    impl_write!(write_i32, i32, write_i32);

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /**
    Overwrite four already-written bytes at `offset` with a little-endian
    u32.

    Patching a position at or past the cursor is a programmer error and
    is reported rather than silently growing the buffer.
    */
    pub fn patch_u32_at(&mut self, offset: usize, value: u32) -> Result<(), Error> {
        let end = offset + 4;
        if end > self.buf.len() {
            return Err(Error::WriteError(format!(
                "patch at offset {} lies outside the {} bytes written so far",
                offset,
                self.buf.len()
            )));
        }
        LittleEndian::write_u32(&mut self.buf[offset..end], value);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
