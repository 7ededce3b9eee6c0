//! Clientbound sync packets and the transport they go out through.

pub mod packets;

pub use packets::{
    CRegisterDimension, CSyncDimensionInfo, CSyncRules, ClientboundPacket, PacketError,
};

use uuid::Uuid;

/// The host's network transport.
///
/// Sending is fire and forget. A packet that never arrives is superseded by
/// the next full sync.
pub trait PacketSender {
    /// Sends `packet` to every connected session.
    fn broadcast(&self, packet: ClientboundPacket);
    /// Sends `packet` to one session.
    fn send_to(&self, session: Uuid, packet: ClientboundPacket);
}
