//! Packets replicating the dimension table to clients.
//!
//! Every packet is framed as a `VarInt` id followed by its body.
use std::io::{self, Cursor, Read, Write};

use rift_utils::serial::{PrefixedRead, PrefixedWrite, ReadFrom, WriteTo};
use rift_utils::{DimensionId, VarInt};
use thiserror::Error;

use crate::config::DimletRules;
use crate::dimension::{DimensionDescriptor, DimensionInformation};

/// Id of [`CRegisterDimension`].
pub const C_REGISTER_DIMENSION: i32 = 0x00;
/// Id of [`CSyncDimensionInfo`].
pub const C_SYNC_DIMENSION_INFO: i32 = 0x01;
/// Id of [`CSyncRules`].
pub const C_SYNC_RULES: i32 = 0x02;

/// Longest rules document a client accepts, in bytes.
pub const MAX_RULES_LEN: usize = 1 << 20;

/// Errors decoding a packet.
#[derive(Debug, Error)]
pub enum PacketError {
    /// The body is truncated or malformed.
    #[error("malformed packet: {0}")]
    Io(#[from] io::Error),
    /// No packet has this id.
    #[error("unknown packet id {0:#04x}")]
    UnknownId(i32),
    /// Bytes were left after the body.
    #[error("{0} trailing bytes after packet body")]
    TrailingBytes(usize),
}

/// Tells clients a dimension id is now registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CRegisterDimension {
    /// The registered dimension.
    pub id: DimensionId,
}

impl WriteTo for CRegisterDimension {
    fn write(&self, writer: &mut impl Write) -> io::Result<()> {
        VarInt(self.id.0).write(writer)
    }
}

impl ReadFrom for CRegisterDimension {
    fn read(data: &mut impl Read) -> io::Result<Self> {
        Ok(Self {
            id: DimensionId(VarInt::read(data)?.0),
        })
    }
}

/// Full snapshot of the server's dimension table, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CSyncDimensionInfo {
    /// Descriptors by id.
    pub descriptors: Vec<(DimensionId, DimensionDescriptor)>,
    /// Runtime records by id.
    pub information: Vec<(DimensionId, DimensionInformation)>,
}

impl WriteTo for CSyncDimensionInfo {
    fn write(&self, writer: &mut impl Write) -> io::Result<()> {
        VarInt::from(self.descriptors.len()).write(writer)?;
        for (id, descriptor) in &self.descriptors {
            id.0.write(writer)?;
            descriptor.write(writer)?;
        }
        VarInt::from(self.information.len()).write(writer)?;
        for (id, information) in &self.information {
            id.0.write(writer)?;
            information.write(writer)?;
        }
        Ok(())
    }
}

fn read_entries<T: ReadFrom>(data: &mut impl Read) -> io::Result<Vec<(DimensionId, T)>> {
    let count: usize = VarInt::read(data)?.into();
    if count > rift_utils::serial::DEFAULT_BOUND {
        return Err(io::Error::other(format!("Too many dimensions: {count}")));
    }
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let id = DimensionId(i32::read(data)?);
        entries.push((id, T::read(data)?));
    }
    Ok(entries)
}

impl ReadFrom for CSyncDimensionInfo {
    fn read(data: &mut impl Read) -> io::Result<Self> {
        Ok(Self {
            descriptors: read_entries(data)?,
            information: read_entries(data)?,
        })
    }
}

/// The server's dimlet rules as json, sent to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSyncRules {
    /// The rules, json encoded.
    pub rules: String,
}

impl CSyncRules {
    /// Encodes `rules`.
    pub fn new(rules: &DimletRules) -> serde_json::Result<Self> {
        Ok(Self {
            rules: rules.to_json()?,
        })
    }

    /// Decodes the carried rules.
    pub fn rules(&self) -> serde_json::Result<DimletRules> {
        DimletRules::from_json(&self.rules)
    }
}

impl WriteTo for CSyncRules {
    fn write(&self, writer: &mut impl Write) -> io::Result<()> {
        self.rules.write_prefixed::<VarInt>(writer)
    }
}

impl ReadFrom for CSyncRules {
    fn read(data: &mut impl Read) -> io::Result<Self> {
        Ok(Self {
            rules: String::read_prefixed_bound::<VarInt>(data, MAX_RULES_LEN)?,
        })
    }
}

/// Every packet the server sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientboundPacket {
    /// See [`CRegisterDimension`].
    RegisterDimension(CRegisterDimension),
    /// See [`CSyncDimensionInfo`].
    SyncDimensionInfo(CSyncDimensionInfo),
    /// See [`CSyncRules`].
    SyncRules(CSyncRules),
}

impl ClientboundPacket {
    /// The packet id written in front of the body.
    #[must_use]
    pub const fn id(&self) -> i32 {
        match self {
            Self::RegisterDimension(_) => C_REGISTER_DIMENSION,
            Self::SyncDimensionInfo(_) => C_SYNC_DIMENSION_INFO,
            Self::SyncRules(_) => C_SYNC_RULES,
        }
    }

    /// Frames the packet.
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        VarInt(self.id()).write(&mut buf)?;
        match self {
            Self::RegisterDimension(packet) => packet.write(&mut buf)?,
            Self::SyncDimensionInfo(packet) => packet.write(&mut buf)?,
            Self::SyncRules(packet) => packet.write(&mut buf)?,
        }
        Ok(buf)
    }

    /// Reads one framed packet, which must span all of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, PacketError> {
        let mut cursor = Cursor::new(bytes);
        let packet = match VarInt::read(&mut cursor)?.0 {
            C_REGISTER_DIMENSION => Self::RegisterDimension(CRegisterDimension::read(&mut cursor)?),
            C_SYNC_DIMENSION_INFO => {
                Self::SyncDimensionInfo(CSyncDimensionInfo::read(&mut cursor)?)
            }
            C_SYNC_RULES => Self::SyncRules(CSyncRules::read(&mut cursor)?),
            id => return Err(PacketError::UnknownId(id)),
        };

        let trailing = bytes.len() - cursor.position() as usize;
        if trailing > 0 {
            return Err(PacketError::TrailingBytes(trailing));
        }
        Ok(packet)
    }
}

impl From<CRegisterDimension> for ClientboundPacket {
    fn from(packet: CRegisterDimension) -> Self {
        Self::RegisterDimension(packet)
    }
}

impl From<CSyncDimensionInfo> for ClientboundPacket {
    fn from(packet: CSyncDimensionInfo) -> Self {
        Self::SyncDimensionInfo(packet)
    }
}

impl From<CSyncRules> for ClientboundPacket {
    fn from(packet: CSyncRules) -> Self {
        Self::SyncRules(packet)
    }
}
