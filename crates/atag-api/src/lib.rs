//! atag-api: Async client for the Atag One thermostat's local API.
//!
//! The device exposes a proprietary JSON-over-HTTP protocol on a private
//! port (10000 by default). Every request is a POST whose body is a JSON
//! object with exactly one top-level key naming the message kind
//! (`retrieve_message`, `pair_message`, `update_message`); replies mirror
//! this with `*_reply` keys and carry an `acc_status` authorization code.
//!
//! This crate provides the wire types ([`protocol`]), the HTTP client
//! ([`client`]), and shared transport configuration ([`transport`]).
//! Session/retry policy lives one layer up in `atag-core`.

pub mod client;
pub mod error;
pub mod protocol;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::DeviceClient;
pub use error::Error;
pub use protocol::{
    AccStatus, Control, HostIdentity, InfoFlags, PairReply, Reply, Report, Request, RetrieveReply,
    UpdateReply, decode_reply, flame_on,
};
pub use transport::TransportConfig;

/// Default TCP port of the local device API.
pub const DEVICE_PORT: u16 = 10000;
