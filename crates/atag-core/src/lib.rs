// atag-core: Session state machine and polling monitor between atag-api
// and consumers (CLI, host automation bridges).

pub mod config;
pub mod error;
pub mod monitor;
pub mod reading;
pub mod session;
pub mod sink;

// ── Primary re-exports ──────────────────────────────────────────────
pub use atag_api::HostIdentity;
pub use config::{MonitorConfig, RetryPolicy};
pub use error::CoreError;
pub use monitor::{Monitor, MonitorHandle};
pub use reading::{Reading, SensorKey, extract_readings};
pub use session::{
    Action, AuthState, ConnectionState, RequestKind, SETPOINT_MAX, SETPOINT_MIN, Session,
};
pub use sink::{MemorySink, ReadingSink};
