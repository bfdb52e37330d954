//! Text codec for Socket.IO v4 packets carried over Engine.IO v4.
//!
//! Wire format (one WebSocket text frame per packet):
//! ```text
//! <engine type>[<socket type>][<ack id>]<json>
//!
//! 0{"sid":"…","pingInterval":25000,"pingTimeout":20000}   engine open
//! 2 / 3                                                     ping / pong
//! 40{"sid":"…"}                                             socket connect
//! 42["roomUpdate",{"players":["Alice"],"creatorID":"…"}]    socket event
//! 41                                                        socket disconnect
//! 44{"message":"…"}                                         connect error
//! ```
//!
//! Only the default namespace is supported.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{ClientEvent, ServerEvent};

/// Socket connect request sent by the client after the engine opens.
pub const CONNECT: &str = "40";
/// Socket disconnect, either direction.
pub const DISCONNECT: &str = "41";
/// Engine close.
pub const CLOSE: &str = "1";
/// Engine ping (server to client).
pub const PING: &str = "2";
/// Engine pong (client to server).
pub const PONG: &str = "3";

/// Errors that can occur while decoding or encoding a packet.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty packet")]
    Empty,

    /// The leading engine or socket type digit is not recognized.
    #[error("unknown packet type: {0:?}")]
    UnknownPacketType(String),

    /// The JSON body could not be parsed or had the wrong shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A well-formed event whose name this client does not handle.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// A known event whose payload did not match the contract.
    #[error("invalid {name} payload: {reason}")]
    InvalidEvent { name: String, reason: String },

    #[error("unsupported namespace: {0}")]
    UnsupportedNamespace(String),
}

/// Engine.IO open handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

/// A decoded server-to-client packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    /// The socket joined the default namespace; `sid` is the connection id.
    Connect { sid: String },
    Disconnect,
    ConnectError { message: String },
    Event(ServerEvent),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an event as a `42[...]` packet.
///
/// Works for any enum serialized with `tag = "event", content = "payload"`,
/// so both [`ClientEvent`] and [`ServerEvent`] can be sent.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if the event does not
/// serialize to an object with a string `event` field.
///
/// # Examples
///
/// ```rust
/// use big2_core::protocol::{encode_event, ClientEvent};
///
/// let text = encode_event(&ClientEvent::StartGame { room_name: "Quick-42".into() }).unwrap();
/// assert_eq!(text, r#"42["startGame",{"roomName":"Quick-42"}]"#);
/// ```
pub fn encode_event<E: Serialize>(event: &E) -> Result<String, ProtocolError> {
    let value = serde_json::to_value(event).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(ProtocolError::MalformedPayload("event is not an object".to_string()));
    };
    let name = match fields.remove("event") {
        Some(Value::String(name)) => name,
        _ => return Err(ProtocolError::MalformedPayload("missing event name".to_string())),
    };

    let mut array = vec![Value::String(name)];
    if let Some(payload) = fields.remove("payload") {
        array.push(payload);
    }
    let body = serde_json::to_string(&array).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;
    Ok(format!("42{body}"))
}

/// Decodes one server-to-client packet.
///
/// # Errors
///
/// Returns [`ProtocolError`] for unknown packet types, bad JSON, unknown
/// events, or payloads that do not match the event contract.
pub fn decode_frame(text: &str) -> Result<Frame, ProtocolError> {
    let mut chars = text.chars();
    let engine_type = chars.next().ok_or(ProtocolError::Empty)?;
    let rest = chars.as_str();

    match engine_type {
        '0' => serde_json::from_str(rest)
            .map(Frame::Open)
            .map_err(|e| ProtocolError::MalformedPayload(e.to_string())),
        '1' => Ok(Frame::Close),
        '2' => Ok(Frame::Ping),
        '3' => Ok(Frame::Pong),
        '4' => decode_socket_packet(rest),
        '6' => Ok(Frame::Noop),
        other => Err(ProtocolError::UnknownPacketType(other.to_string())),
    }
}

/// Decodes a client-to-server `42[...]` packet.  Used by servers and tests.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the packet is not an event packet or the
/// event is not part of the client contract.
pub fn decode_client_event(text: &str) -> Result<ClientEvent, ProtocolError> {
    let body = text
        .strip_prefix("42")
        .ok_or_else(|| ProtocolError::UnknownPacketType(text.chars().take(2).collect()))?;
    let (name, payload) = split_event(strip_ack_id(body))?;
    let payload = payload.unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(serde_json::json!({ "event": name, "payload": payload }))
        .map_err(|e| ProtocolError::InvalidEvent { name, reason: e.to_string() })
}

/// Encodes an engine open packet.  Used by servers and tests.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if serialization fails.
pub fn encode_open(handshake: &Handshake) -> Result<String, ProtocolError> {
    serde_json::to_string(handshake)
        .map(|json| format!("0{json}"))
        .map_err(|e| ProtocolError::MalformedPayload(e.to_string()))
}

/// Encodes the socket connect acknowledgement carrying the connection id.
pub fn encode_connect_ack(sid: &str) -> String {
    format!("40{}", serde_json::json!({ "sid": sid }))
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn decode_socket_packet(rest: &str) -> Result<Frame, ProtocolError> {
    let mut chars = rest.chars();
    let socket_type = chars.next().ok_or(ProtocolError::Empty)?;
    let body = chars.as_str();
    if body.starts_with('/') {
        let namespace = body.split(',').next().unwrap_or(body);
        return Err(ProtocolError::UnsupportedNamespace(namespace.to_string()));
    }

    match socket_type {
        '0' => {
            #[derive(Deserialize)]
            struct ConnectBody {
                sid: String,
            }
            let parsed: ConnectBody =
                serde_json::from_str(body).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;
            Ok(Frame::Connect { sid: parsed.sid })
        }
        '1' => Ok(Frame::Disconnect),
        '2' => {
            let (name, payload) = split_event(strip_ack_id(body))?;
            if !ServerEvent::NAMES.contains(&name.as_str()) {
                return Err(ProtocolError::UnknownEvent(name));
            }
            ServerEvent::from_parts(&name, payload)
                .map(Frame::Event)
                .map_err(|e| ProtocolError::InvalidEvent { name, reason: e.to_string() })
        }
        '4' => {
            let message = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| body.to_string());
            Ok(Frame::ConnectError { message })
        }
        other => Err(ProtocolError::UnknownPacketType(format!("4{other}"))),
    }
}

/// Skips an optional numeric acknowledgement id before the JSON body.
fn strip_ack_id(body: &str) -> &str {
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

/// Splits `["name", payload?]` into its parts.
fn split_event(body: &str) -> Result<(String, Option<Value>), ProtocolError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;
    let Value::Array(mut items) = value else {
        return Err(ProtocolError::MalformedPayload("event body is not an array".to_string()));
    };
    if items.is_empty() {
        return Err(ProtocolError::MalformedPayload("event array is empty".to_string()));
    }
    let payload = if items.len() > 1 { Some(items.swap_remove(1)) } else { None };
    match items.swap_remove(0) {
        Value::String(name) => Ok((name, payload)),
        _ => Err(ProtocolError::MalformedPayload("event name is not a string".to_string())),
    }
}
