// Device HTTP client
//
// Wraps `reqwest::Client` with device URL construction, a monotonic
// sequence number, and envelope encoding. `send` returns the raw
// (status, body) pair the session machine consumes; the typed helpers
// (`retrieve`, `pair`, `update`) add decoding and envelope matching for
// one-shot callers.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::protocol::{
    self, HostIdentity, InfoFlags, PairReply, Reply, Request, RetrieveReply, UpdateReply,
};
use crate::transport::TransportConfig;

/// HTTP client for one Atag One device.
///
/// Holds the host identity included in every outbound envelope and a
/// per-instance sequence counter. The device expects a single request in
/// flight at a time; callers (the monitor loop, CLI one-shots) are
/// responsible for not pipelining.
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    identity: HostIdentity,
    seqnr: AtomicU32,
    timeout_secs: u64,
}

impl DeviceClient {
    /// Create a client for the device at `host:port`.
    pub fn new(
        host: &str,
        port: u16,
        identity: HostIdentity,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{host}:{port}"))?;
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            identity,
            seqnr: AtomicU32::new(0),
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client` (tests).
    pub fn with_client(http: reqwest::Client, base_url: Url, identity: HostIdentity) -> Self {
        Self {
            http,
            base_url,
            identity,
            seqnr: AtomicU32::new(0),
            timeout_secs: 30,
        }
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The host identity sent in every envelope.
    pub fn identity(&self) -> &HostIdentity {
        &self.identity
    }

    fn next_seqnr(&self) -> u32 {
        self.seqnr.fetch_add(1, Ordering::Relaxed)
    }

    // ── Request builders ─────────────────────────────────────────────

    /// Build a retrieve envelope with the next sequence number.
    pub fn retrieve_request(&self, info: InfoFlags) -> Request {
        Request::retrieve(self.next_seqnr(), &self.identity, info)
    }

    /// Build a pair envelope with the next sequence number.
    pub fn pair_request(&self) -> Request {
        Request::pair(self.next_seqnr(), &self.identity)
    }

    /// Build an update envelope with the next sequence number.
    pub fn update_request(&self, ch_mode_temp: f64) -> Request {
        Request::update(self.next_seqnr(), &self.identity, ch_mode_temp)
    }

    // ── Raw send ─────────────────────────────────────────────────────

    /// POST one envelope to its message-kind path, returning the HTTP
    /// status and raw body bytes.
    ///
    /// No decoding happens here: the session machine owns the
    /// interpretation of non-200 statuses and malformed bodies.
    pub async fn send(&self, request: &Request) -> Result<(u16, Vec<u8>), Error> {
        let url = self.base_url.join(request.path())?;
        debug!(kind = request.kind(), %url, "POST");

        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout_secs))?;

        Ok((status, body.to_vec()))
    }

    // ── Typed one-shots ──────────────────────────────────────────────

    /// Retrieve device state in one round trip.
    pub async fn retrieve(&self, info: InfoFlags) -> Result<RetrieveReply, Error> {
        let request = self.retrieve_request(info);
        match self.send_decoded(&request).await? {
            Reply::Retrieve(reply) => Ok(reply),
            other => Err(unexpected_reply("retrieve_reply", &other)),
        }
    }

    /// Send one pairing request.
    ///
    /// Pairing is a multi-round handshake: the first reply is usually
    /// `pending` until the user confirms on the device, so callers poll
    /// this until the status settles on authorized or denied.
    pub async fn pair(&self) -> Result<PairReply, Error> {
        let request = self.pair_request();
        match self.send_decoded(&request).await? {
            Reply::Pair(reply) => Ok(reply),
            other => Err(unexpected_reply("pair_reply", &other)),
        }
    }

    /// Set the CH mode target temperature in one round trip.
    pub async fn update(&self, ch_mode_temp: f64) -> Result<UpdateReply, Error> {
        let request = self.update_request(ch_mode_temp);
        match self.send_decoded(&request).await? {
            Reply::Update(reply) => Ok(reply),
            other => Err(unexpected_reply("update_reply", &other)),
        }
    }

    async fn send_decoded(&self, request: &Request) -> Result<Reply, Error> {
        let (status, body) = self.send(request).await?;
        if status != 200 {
            return Err(Error::DeviceStatus {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        protocol::decode_reply(&body)
    }
}

fn unexpected_reply(expected: &str, got: &Reply) -> Error {
    Error::Protocol {
        message: format!("expected {expected}, got {}", got.kind()),
        body: String::new(),
    }
}
