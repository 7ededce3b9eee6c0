//! In-memory host for testing Rift.
//!
//! Provides implementations of the host traits (`DimensionRegistry`,
//! `PacketSender`, `WorldLoader`, `FreezableWorld`, `WorldContext`) that keep
//! everything in memory and record what the core asked of them.
//!
//! # Example
//!
//! ```ignore
//! use rift_harness::{TestServer, TestWorldContext};
//!
//! rift_harness::init();
//! let mut server = TestServer::new();
//! let mut manager = server.open_manager()?;
//! let id = manager.create(&mut server.host(), &TestWorldContext::default(), descriptor, "Alpha", "", None);
//! ```

mod context;
mod network;
mod registry;
mod server;
mod world;

#[cfg(test)]
mod scenarios;

pub use context::TestWorldContext;
pub use network::RecordingNetwork;
pub use registry::TestRegistry;
pub use server::TestServer;
pub use world::{TestWorld, TestWorlds};

use std::sync::Once;

/// Installs the test logger.
///
/// It's safe to call multiple times - subsequent calls are no-ops.
pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(rift_utils::logger::init_for_tests);
}
