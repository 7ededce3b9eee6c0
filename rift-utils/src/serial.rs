//! Big-endian binary serialization used by the clientbound packets.

use std::io::{self, Error, Read, Result, Write};

use uuid::Uuid;

/// Upper bound for a length prefix read off the wire.
pub const DEFAULT_BOUND: usize = i16::MAX as usize;

/// A type that can be read from a byte stream.
pub trait ReadFrom: Sized {
    /// Reads a value.
    fn read(data: &mut impl Read) -> Result<Self>;
}

/// A type that can be written to a byte stream.
pub trait WriteTo {
    /// Writes the value.
    fn write(&self, writer: &mut impl Write) -> Result<()>;
}

/// A length prefixed sequence that can be read from a byte stream.
pub trait PrefixedRead: Sized {
    /// Reads a sequence whose length is encoded as `P`, rejecting lengths over `bound`.
    fn read_prefixed_bound<P: ReadFrom + Into<usize>>(
        data: &mut impl Read,
        bound: usize,
    ) -> Result<Self>;

    /// Reads a sequence whose length is encoded as `P`.
    fn read_prefixed<P: ReadFrom + Into<usize>>(data: &mut impl Read) -> Result<Self> {
        Self::read_prefixed_bound::<P>(data, DEFAULT_BOUND)
    }
}

/// A length prefixed sequence that can be written to a byte stream.
pub trait PrefixedWrite {
    /// Writes the sequence with its length encoded as `P`.
    fn write_prefixed<P: WriteTo + From<usize>>(&self, writer: &mut impl Write) -> Result<()>;
}

macro_rules! impl_be_number {
    ($($ty:ty),*) => {
        $(
            impl ReadFrom for $ty {
                fn read(data: &mut impl Read) -> Result<Self> {
                    let mut buf = [0; size_of::<Self>()];
                    data.read_exact(&mut buf)?;
                    Ok(Self::from_be_bytes(buf))
                }
            }

            impl WriteTo for $ty {
                fn write(&self, writer: &mut impl Write) -> Result<()> {
                    writer.write_all(&self.to_be_bytes())
                }
            }
        )*
    };
}

impl_be_number!(u8, i8, u16, i16, i32, i64, u64, u128);

impl ReadFrom for bool {
    fn read(data: &mut impl Read) -> Result<Self> {
        Ok(u8::read(data)? != 0)
    }
}

impl WriteTo for bool {
    fn write(&self, writer: &mut impl Write) -> Result<()> {
        u8::from(*self).write(writer)
    }
}

impl ReadFrom for Uuid {
    fn read(data: &mut impl Read) -> Result<Self> {
        Ok(Uuid::from_u128(u128::read(data)?))
    }
}

impl WriteTo for Uuid {
    fn write(&self, writer: &mut impl Write) -> Result<()> {
        self.as_u128().write(writer)
    }
}

impl<T: ReadFrom> ReadFrom for Option<T> {
    fn read(data: &mut impl Read) -> Result<Self> {
        if bool::read(data)? {
            Ok(Some(T::read(data)?))
        } else {
            Ok(None)
        }
    }
}

impl<T: WriteTo> WriteTo for Option<T> {
    fn write(&self, writer: &mut impl Write) -> Result<()> {
        self.is_some().write(writer)?;
        if let Some(value) = self {
            value.write(writer)?;
        }
        Ok(())
    }
}

impl PrefixedRead for String {
    fn read_prefixed_bound<P: ReadFrom + Into<usize>>(
        data: &mut impl Read,
        bound: usize,
    ) -> Result<Self> {
        let len: usize = P::read(data)?.into();
        if len > bound {
            return Err(Error::other(format!("String too long: {len} > {bound}")));
        }
        // Grow with the bytes actually present, not with the claimed length.
        let mut buf = Vec::new();
        data.by_ref().take(len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("String truncated: {} of {len} bytes", buf.len()),
            ));
        }
        String::from_utf8(buf).map_err(|e| Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl PrefixedWrite for str {
    fn write_prefixed<P: WriteTo + From<usize>>(&self, writer: &mut impl Write) -> Result<()> {
        P::from(self.len()).write(writer)?;
        writer.write_all(self.as_bytes())
    }
}

impl PrefixedWrite for String {
    fn write_prefixed<P: WriteTo + From<usize>>(&self, writer: &mut impl Write) -> Result<()> {
        self.as_str().write_prefixed::<P>(writer)
    }
}

impl<T: ReadFrom> PrefixedRead for Vec<T> {
    fn read_prefixed_bound<P: ReadFrom + Into<usize>>(
        data: &mut impl Read,
        bound: usize,
    ) -> Result<Self> {
        let len: usize = P::read(data)?.into();
        if len > bound {
            return Err(Error::other(format!("List too long: {len} > {bound}")));
        }
        let mut items = Vec::with_capacity(len.min(DEFAULT_BOUND));
        for _ in 0..len {
            items.push(T::read(data)?);
        }
        Ok(items)
    }
}

impl<T: WriteTo> PrefixedWrite for [T] {
    fn write_prefixed<P: WriteTo + From<usize>>(&self, writer: &mut impl Write) -> Result<()> {
        P::from(self.len()).write(writer)?;
        for item in self {
            item.write(writer)?;
        }
        Ok(())
    }
}

impl<T: WriteTo> PrefixedWrite for Vec<T> {
    fn write_prefixed<P: WriteTo + From<usize>>(&self, writer: &mut impl Write) -> Result<()> {
        self.as_slice().write_prefixed::<P>(writer)
    }
}
