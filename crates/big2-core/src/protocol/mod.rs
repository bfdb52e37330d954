//! Protocol module containing the server event contract and the Socket.IO codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_frame, encode_event, Frame, ProtocolError};
pub use messages::*;
