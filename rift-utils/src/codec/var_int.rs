use std::io::{Error, Read, Result, Write};

use crate::serial::{ReadFrom, WriteTo};

/// A LEB128-style variable length `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub i32);

impl VarInt {
    /// The maximum number of bytes a `VarInt` occupies.
    pub const MAX_SIZE: usize = 5;

    /// Returns the exact number of bytes `val` encodes to.
    #[must_use]
    pub fn written_size(val: i32) -> usize {
        match val {
            0 => 1,
            n => (31 - n.leading_zeros() as usize) / 7 + 1,
        }
    }
}

impl ReadFrom for VarInt {
    fn read(data: &mut impl Read) -> Result<Self> {
        let mut val = 0;
        for i in 0..Self::MAX_SIZE {
            let byte = u8::read(data)?;
            val |= (i32::from(byte) & 0x7F) << (i * 7);
            if byte & 0x80 == 0 {
                return Ok(Self(val));
            }
        }
        Err(Error::other("VarInt too large"))
    }
}

impl WriteTo for VarInt {
    fn write(&self, writer: &mut impl Write) -> Result<()> {
        let mut val = self.0 as u32;
        loop {
            let b = (val & 0x7F) as u8;
            val >>= 7;
            if val == 0 {
                return b.write(writer);
            }
            (b | 0x80).write(writer)?;
        }
    }
}

impl From<usize> for VarInt {
    fn from(value: usize) -> Self {
        Self(value as _)
    }
}

impl From<VarInt> for usize {
    fn from(value: VarInt) -> Self {
        value.0 as _
    }
}

impl From<i32> for VarInt {
    fn from(value: i32) -> Self {
        Self(value)
    }
}
