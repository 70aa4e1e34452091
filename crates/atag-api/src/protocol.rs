// Wire types for the Atag One local protocol.
//
// Requests and replies are single-key JSON envelopes; serde's externally
// tagged enum representation produces exactly that shape, so `Request` and
// `Reply` need no custom (de)serialization. Reply bodies are decoded with
// every field optional -- the device omits whole sections depending on the
// requested info bitmask and its authorization state, and a missing field
// must never fail the decode of the rest.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

// ── Info bitmask ────────────────────────────────────────────────────

/// Flag sum selecting which sections a `retrieve_message` asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InfoFlags(u32);

impl InfoFlags {
    pub const CONTROL: InfoFlags = InfoFlags(1);
    pub const SCHEDULES: InfoFlags = InfoFlags(2);
    pub const CONFIGURATION: InfoFlags = InfoFlags(4);
    pub const REPORT: InfoFlags = InfoFlags(8);
    pub const STATUS: InfoFlags = InfoFlags(16);
    pub const WIFISCAN: InfoFlags = InfoFlags(32);
    pub const EXTRA: InfoFlags = InfoFlags(64);

    /// The raw flag sum as sent on the wire.
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for InfoFlags {
    type Output = InfoFlags;

    fn bitor(self, rhs: InfoFlags) -> InfoFlags {
        InfoFlags(self.0 | rhs.0)
    }
}

impl Default for InfoFlags {
    /// The monitor only ever needs control + report.
    fn default() -> Self {
        InfoFlags::CONTROL | InfoFlags::REPORT
    }
}

// ── Authorization status ────────────────────────────────────────────

/// Device-reported authorization status (`acc_status` on every reply).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccStatus {
    /// 0 -- unset / device not ready.
    NotReady,
    /// 1 -- pairing requested, awaiting confirmation on the device.
    Pending,
    /// 2 -- this client is authorized.
    Authorized,
    /// 3 -- pairing explicitly denied.
    Denied,
    /// Any other value.
    Unknown(u8),
}

impl From<u8> for AccStatus {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::NotReady,
            1 => Self::Pending,
            2 => Self::Authorized,
            3 => Self::Denied,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for AccStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "not ready"),
            Self::Pending => write!(f, "pending"),
            Self::Authorized => write!(f, "authorized"),
            Self::Denied => write!(f, "denied"),
            Self::Unknown(raw) => write!(f, "unknown ({raw})"),
        }
    }
}

// ── Host identity ───────────────────────────────────────────────────

/// How this client identifies itself to the device.
///
/// The MAC-like string is the pairing key: the device remembers it once the
/// user confirms the pairing request, and every later envelope carries it
/// in the `account_auth` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    /// Stable MAC-like identifier, e.g. `"01:23:45:67:89:ab"`.
    pub mac: String,
    /// Display name shown in the device's pairing prompt.
    pub device_name: String,
}

impl HostIdentity {
    pub fn new(mac: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            device_name: device_name.into(),
        }
    }

    fn auth_block(&self) -> AccountAuth {
        AccountAuth {
            // Always empty -- the local API has no user accounts.
            user_account: String::new(),
            mac_address: self.mac.clone(),
        }
    }
}

// ── Request envelopes ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AccountAuth {
    pub user_account: String,
    pub mac_address: String,
}

#[derive(Debug, Serialize)]
pub struct RetrieveMessage {
    pub seqnr: u32,
    pub account_auth: AccountAuth,
    pub info: InfoFlags,
}

#[derive(Debug, Serialize)]
pub struct PairMessage {
    pub seqnr: u32,
    pub account_auth: AccountAuth,
    pub accounts: Accounts,
}

#[derive(Debug, Serialize)]
pub struct Accounts {
    pub entries: Vec<AccountEntry>,
}

#[derive(Debug, Serialize)]
pub struct AccountEntry {
    pub mac_address: String,
    pub device_name: String,
    pub account_type: u8,
}

#[derive(Debug, Serialize)]
pub struct UpdateMessage {
    pub seqnr: u32,
    pub account_auth: AccountAuth,
    pub control: UpdateControl,
}

#[derive(Debug, Serialize)]
pub struct UpdateControl {
    pub ch_mode_temp: f64,
}

/// Outbound envelope. Serializes as `{"<kind>_message": {...}}`.
#[derive(Debug, Serialize)]
pub enum Request {
    #[serde(rename = "retrieve_message")]
    Retrieve(RetrieveMessage),
    #[serde(rename = "pair_message")]
    Pair(PairMessage),
    #[serde(rename = "update_message")]
    Update(UpdateMessage),
}

impl Request {
    /// Build a `retrieve_message` envelope.
    pub fn retrieve(seqnr: u32, identity: &HostIdentity, info: InfoFlags) -> Self {
        Self::Retrieve(RetrieveMessage {
            seqnr,
            account_auth: identity.auth_block(),
            info,
        })
    }

    /// Build a `pair_message` envelope requesting authorization for `identity`.
    pub fn pair(seqnr: u32, identity: &HostIdentity) -> Self {
        Self::Pair(PairMessage {
            seqnr,
            account_auth: identity.auth_block(),
            accounts: Accounts {
                entries: vec![AccountEntry {
                    mac_address: identity.mac.clone(),
                    device_name: identity.device_name.clone(),
                    account_type: 0,
                }],
            },
        })
    }

    /// Build an `update_message` envelope setting the CH mode temperature.
    pub fn update(seqnr: u32, identity: &HostIdentity, ch_mode_temp: f64) -> Self {
        Self::Update(UpdateMessage {
            seqnr,
            account_auth: identity.auth_block(),
            control: UpdateControl { ch_mode_temp },
        })
    }

    /// The device path this message kind is POSTed to.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Retrieve(_) => "/retrieve",
            Self::Pair(_) => "/pair",
            Self::Update(_) => "/update",
        }
    }

    /// Message kind name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Retrieve(_) => "retrieve_message",
            Self::Pair(_) => "pair_message",
            Self::Update(_) => "update_message",
        }
    }
}

// ── Reply envelopes ─────────────────────────────────────────────────

/// Inbound envelope: `{"<kind>_reply": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub enum Reply {
    #[serde(rename = "retrieve_reply")]
    Retrieve(RetrieveReply),
    #[serde(rename = "pair_reply")]
    Pair(PairReply),
    #[serde(rename = "update_reply")]
    Update(UpdateReply),
}

impl Reply {
    /// Reply kind name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Retrieve(_) => "retrieve_reply",
            Self::Pair(_) => "pair_reply",
            Self::Update(_) => "update_reply",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveReply {
    pub seqnr: Option<i64>,
    pub acc_status: Option<u8>,
    /// Device status block (device id, connection state, date/time).
    /// Opaque to the monitor; kept for diagnostics.
    pub status: Option<serde_json::Value>,
    pub report: Option<Report>,
    pub control: Option<Control>,
}

impl RetrieveReply {
    pub fn acc_status(&self) -> Option<AccStatus> {
        self.acc_status.map(AccStatus::from)
    }
}

/// The `report` section of a retrieve reply.
///
/// `room_temp` and `boiler_status` are the only fields every firmware
/// version sends; the extended telemetry varies by variant and install.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Report {
    pub report_time: Option<i64>,
    pub room_temp: Option<f64>,
    pub outside_temp: Option<f64>,
    pub burning_hours: Option<f64>,
    pub boiler_status: Option<i64>,
    pub ch_setpoint: Option<f64>,
    pub dhw_water_temp: Option<f64>,
    pub ch_water_temp: Option<f64>,
    pub ch_water_pres: Option<f64>,
    pub ch_return_temp: Option<f64>,
}

/// The `control` section of a retrieve reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Control {
    pub ch_mode_temp: Option<f64>,
    pub ch_status: Option<i64>,
    pub ch_control_mode: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairReply {
    pub seqnr: Option<i64>,
    pub acc_status: Option<u8>,
    pub status: Option<serde_json::Value>,
}

impl PairReply {
    pub fn acc_status(&self) -> Option<AccStatus> {
        self.acc_status.map(AccStatus::from)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateReply {
    pub seqnr: Option<i64>,
    pub acc_status: Option<u8>,
    pub status: Option<serde_json::Value>,
}

impl UpdateReply {
    pub fn acc_status(&self) -> Option<AccStatus> {
        self.acc_status.map(AccStatus::from)
    }

    /// An update took effect only when the device echoes a `status` block
    /// alongside an authorized `acc_status`.
    pub fn acknowledged(&self) -> bool {
        self.acc_status() == Some(AccStatus::Authorized) && self.status.is_some()
    }
}

// ── Decoding ────────────────────────────────────────────────────────

/// Bit in `boiler_status` indicating the flame is currently active.
pub const FLAME_BIT: i64 = 8;

/// Whether the boiler bitmask reports an active flame.
pub fn flame_on(boiler_status: i64) -> bool {
    boiler_status & FLAME_BIT != 0
}

/// Decode a reply body.
///
/// The bytes are interpreted as UTF-8 with invalid sequences replaced (a
/// stray byte from the device must not fail the whole poll), then parsed
/// as a single-key JSON envelope. Unknown or missing envelope keys come
/// back as [`Error::Protocol`](crate::Error::Protocol).
pub fn decode_reply(body: &[u8]) -> Result<Reply, crate::Error> {
    let text = String::from_utf8_lossy(body);
    serde_json::from_str(&text).map_err(|e| crate::Error::Protocol {
        message: e.to_string(),
        body: text.into_owned(),
    })
}
