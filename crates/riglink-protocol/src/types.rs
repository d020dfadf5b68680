//! Core protocol types for Riglink's wire format.
//!
//! Every channel speaks the same envelope: a JSON object with a kind
//! key `k`, a value `v`, and a millisecond timestamp `t`. The
//! controller and the client agree on these three keys; anything else
//! in the object rides along untouched so older peers can talk to
//! newer ones.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

// ---------------------------------------------------------------------------
// Commands and responses
// ---------------------------------------------------------------------------

/// Discovery request value: "a controller wants this client".
pub const CMD_CONN_NEW: &str = "NEW";
/// Detach from the controller but keep running.
pub const CMD_DISCONNECT: &str = "DISCONNECT";
/// Restart the media pipeline.
pub const CMD_RESTART: &str = "RESTART";
/// Shut the whole client down.
pub const CMD_DESTROY: &str = "DESTROY";

/// Generic acknowledgment for a handled command.
pub const RESPONSE_OK: &str = "OK";
/// Discovery response value: "handshake accepted".
pub const RESPONSE_ACCEPT: &str = "ACCEPT";
/// Receipt for a command forwarded to the device.
pub const RESPONSE_RECV: &str = "RECV";

// ---------------------------------------------------------------------------
// Kind — which pipeline handles an envelope
// ---------------------------------------------------------------------------

/// The routing kind of an envelope, serialized as the `k` key.
///
/// The wire strings (`CMD`, `SELF`, `CONN`) are fixed protocol
/// vocabulary; an envelope with any other `k` fails to decode and is
/// dropped by the receive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// A command or a response to one.
    #[serde(rename = "CMD")]
    Command,

    /// A self-addressed control message: consumed by the client's own
    /// receive loop, never meant for the controller. Values other than
    /// `RESTART` are relayed back out as commands, which is how other
    /// tasks push messages into the outbound pipeline.
    #[serde(rename = "SELF")]
    Control,

    /// The discovery handshake request. Only valid on the discovery
    /// listener; ignored if it ever shows up on the data channel.
    #[serde(rename = "CONN")]
    Discovery,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Command => "CMD",
            Kind::Control => "SELF",
            Kind::Discovery => "CONN",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Envelope — the wire unit
// ---------------------------------------------------------------------------

/// The wire message unit shared by the discovery, command, and status
/// channels.
///
/// ```json
/// {"k":"CMD","v":"ACCEPT","t":1680000000000,"hostname":"rig-01"}
/// ```
///
/// - `t` is always stamped at construction time on the sending side;
///   decoders default it to 0 when absent rather than failing.
/// - `hostname` appears only on the discovery response.
/// - Unknown extra keys are preserved through decode/encode so this
///   client never strips fields a newer controller added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Routing kind (`k`).
    #[serde(rename = "k")]
    pub kind: Kind,

    /// The command, response, or control value (`v`).
    #[serde(rename = "v")]
    pub value: String,

    /// Milliseconds since the Unix epoch at encode time (`t`).
    #[serde(rename = "t", default)]
    pub timestamp: u64,

    /// Sender hostname; set on the discovery response only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hostname: Option<String>,

    /// Fields this client doesn't know about, carried verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Envelope {
    /// Builds an envelope of the given kind, stamped with the current
    /// time.
    pub fn new(kind: Kind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            timestamp: now_millis(),
            hostname: None,
            extra: serde_json::Map::new(),
        }
    }

    /// A `CMD` envelope (command out, or response to a command in).
    pub fn command(value: impl Into<String>) -> Self {
        Self::new(Kind::Command, value)
    }

    /// A `SELF` envelope for the client's own control queue.
    pub fn control(value: impl Into<String>) -> Self {
        Self::new(Kind::Control, value)
    }

    /// Attaches the sender hostname (discovery response).
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is fixed by the controller protocol. These tests
    //! pin the exact JSON shapes, because a serde-attribute mismatch
    //! means the controller can't parse us (or we can't parse it).

    use super::*;

    #[test]
    fn test_kind_serializes_as_protocol_strings() {
        assert_eq!(serde_json::to_string(&Kind::Command).unwrap(), "\"CMD\"");
        assert_eq!(serde_json::to_string(&Kind::Control).unwrap(), "\"SELF\"");
        assert_eq!(
            serde_json::to_string(&Kind::Discovery).unwrap(),
            "\"CONN\""
        );
    }

    #[test]
    fn test_kind_display_matches_wire_strings() {
        assert_eq!(Kind::Command.to_string(), "CMD");
        assert_eq!(Kind::Control.to_string(), "SELF");
        assert_eq!(Kind::Discovery.to_string(), "CONN");
    }

    #[test]
    fn test_envelope_uses_short_keys() {
        let env = Envelope::command("OK");
        let json: serde_json::Value = serde_json::to_value(&env).unwrap();

        assert_eq!(json["k"], "CMD");
        assert_eq!(json["v"], "OK");
        assert!(json["t"].is_u64());
        // hostname must be absent, not null, when unset.
        assert!(json.get("hostname").is_none());
    }

    #[test]
    fn test_envelope_stamps_timestamp_on_construction() {
        let before = now_millis();
        let env = Envelope::command("PING");
        let after = now_millis();
        assert!(env.timestamp >= before && env.timestamp <= after);
    }

    #[test]
    fn test_envelope_decodes_without_timestamp() {
        // Some controllers omit `t` on control messages; decoders
        // default it to 0 instead of failing.
        let env: Envelope =
            serde_json::from_str(r#"{"k":"SELF","v":"RESTART"}"#).unwrap();
        assert_eq!(env.kind, Kind::Control);
        assert_eq!(env.value, "RESTART");
        assert_eq!(env.timestamp, 0);
    }

    #[test]
    fn test_envelope_with_hostname_round_trip() {
        let env = Envelope::command(RESPONSE_ACCEPT).with_hostname("rig-01");
        let json: serde_json::Value = serde_json::to_value(&env).unwrap();
        assert_eq!(json["v"], "ACCEPT");
        assert_eq!(json["hostname"], "rig-01");

        let decoded: Envelope =
            serde_json::from_value(json).unwrap();
        assert_eq!(decoded.hostname.as_deref(), Some("rig-01"));
    }

    #[test]
    fn test_envelope_preserves_unknown_fields() {
        let json = r#"{"k":"CMD","v":"X","t":5,"trace_id":"abc","n":7}"#;
        let env: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.extra["trace_id"], "abc");
        assert_eq!(env.extra["n"], 7);

        // And they survive a re-encode.
        let back: serde_json::Value = serde_json::to_value(&env).unwrap();
        assert_eq!(back["trace_id"], "abc");
        assert_eq!(back["n"], 7);
    }

    #[test]
    fn test_discovery_request_shape() {
        let env: Envelope =
            serde_json::from_str(r#"{"k":"CONN","v":"NEW"}"#).unwrap();
        assert_eq!(env.kind, Kind::Discovery);
        assert_eq!(env.value, CMD_CONN_NEW);
    }

    #[test]
    fn test_decode_missing_value_fails() {
        let result: Result<Envelope, _> =
            serde_json::from_str(r#"{"k":"CMD","t":5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_kind_fails() {
        let result: Result<Envelope, _> =
            serde_json::from_str(r#"{"v":"OK","t":5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_kind_fails() {
        // Unknown kinds never reach the dispatch table — they die here.
        let result: Result<Envelope, _> =
            serde_json::from_str(r#"{"k":"WAT","v":"OK"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result: Result<Envelope, _> =
            serde_json::from_slice(b"not json at all");
        assert!(result.is_err());
    }
}
