//! # Rift core
//!
//! Runtime creation, persistence and upkeep of dynamic dimensions.
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    clippy::unwrap_used
)]
#![allow(
    clippy::multiple_inherent_impl,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::module_name_repetitions
)]

pub mod command;
pub mod config;
pub mod dimension;
pub mod host;
pub mod network;
pub mod storage;
