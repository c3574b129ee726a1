//! Operation payload encoding
//!
//! A small CDR-flavoured codec: little-endian fixed-width integers,
//! length-prefixed UTF-8 strings, and object references carried in their
//! stringified form. There is no alignment padding.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{OrbError, Result};
use crate::reference::{Interface, ObjectRef};

/// Builder for an argument or reply payload
#[derive(Default)]
pub struct CdrWriter {
    buf: BytesMut,
}

impl CdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32_le(value);
        self
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.buf.put_u64_le(value);
        self
    }

    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.buf.put_i64_le(value);
        self
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.buf.put_u8(value as u8);
        self
    }

    pub fn write_string(&mut self, value: &str) -> &mut Self {
        self.buf.put_u32_le(value.len() as u32);
        self.buf.put_slice(value.as_bytes());
        self
    }

    /// Write a reference in stringified form
    pub fn write_object(&mut self, obj: &ObjectRef) -> Result<&mut Self> {
        let ior = obj.to_ior_string()?;
        Ok(self.write_string(&ior))
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Cursor over a received payload
pub struct CdrReader {
    buf: Bytes,
}

impl CdrReader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    fn need(&self, n: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(OrbError::Marshal(format!(
                "{} needs {} bytes, {} left",
                what,
                n,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.need(4, "u32")?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.need(8, "u64")?;
        Ok(self.buf.get_u64_le())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.need(8, "i64")?;
        Ok(self.buf.get_i64_le())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.need(1, "bool")?;
        match self.buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(OrbError::Marshal(format!("invalid boolean octet {}", other))),
        }
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        self.need(len, "string body")?;
        let body = self.buf.split_to(len);
        String::from_utf8(body.to_vec()).map_err(|e| OrbError::Marshal(format!("string is not UTF-8: {}", e)))
    }

    pub fn read_object(&mut self) -> Result<ObjectRef> {
        let ior = self.read_string()?;
        ObjectRef::from_ior_string(&ior)
    }

    /// Read a reference and wrap it as `I` without a remote type check
    pub fn read_interface<I: Interface>(&mut self) -> Result<I> {
        Ok(I::from_object(self.read_object()?))
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }
}
