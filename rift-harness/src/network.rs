//! A transport that records packets instead of sending them.
use std::cell::RefCell;

use rift_core::network::{ClientboundPacket, PacketSender};
use uuid::Uuid;

/// Records every packet with its recipient, `None` for broadcasts.
#[derive(Debug, Default)]
pub struct RecordingNetwork {
    sent: RefCell<Vec<(Option<Uuid>, ClientboundPacket)>>,
}

impl RecordingNetwork {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Broadcast packets in send order.
    #[must_use]
    pub fn broadcasts(&self) -> Vec<ClientboundPacket> {
        self.sent
            .borrow()
            .iter()
            .filter(|(session, _)| session.is_none())
            .map(|(_, packet)| packet.clone())
            .collect()
    }

    /// Packets sent to `session` alone, in send order.
    #[must_use]
    pub fn sent_to(&self, session: Uuid) -> Vec<ClientboundPacket> {
        self.sent
            .borrow()
            .iter()
            .filter(|(recipient, _)| *recipient == Some(session))
            .map(|(_, packet)| packet.clone())
            .collect()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.sent.borrow_mut().clear();
    }
}

impl PacketSender for RecordingNetwork {
    fn broadcast(&self, packet: ClientboundPacket) {
        // Everything sent must survive the wire.
        debug_assert!(
            packet
                .encode()
                .is_ok_and(|bytes| ClientboundPacket::decode(&bytes).is_ok_and(|p| p == packet))
        );
        self.sent.borrow_mut().push((None, packet));
    }

    fn send_to(&self, session: Uuid, packet: ClientboundPacket) {
        self.sent.borrow_mut().push((Some(session), packet));
    }
}
