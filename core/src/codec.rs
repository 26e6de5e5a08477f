//! Binary framing for [`Message`] values crossing a thread boundary.
//!
//! Frames are plain bincode encodings. A frame that fails to decode, whether
//! truncated or carrying an unknown variant tag, is reported as
//! [`CodecError::Decode`]; receivers treat that as a message to ignore.

use thiserror::Error;

use crate::Message;

/// Failures raised while framing messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The message could not be serialised.
    #[error("failed to encode message: {0}")]
    Encode(#[source] bincode::Error),
    /// The frame did not hold a recognised message.
    #[error("failed to decode frame: {0}")]
    Decode(#[source] bincode::Error),
}

/// Serialises a message into an owned frame.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialisation fails.
pub fn encode(message: &Message) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(message).map_err(CodecError::Encode)
}

/// Parses a frame back into a message.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] when the frame is malformed or names an
/// unknown message.
pub fn decode(frame: &[u8]) -> Result<Message, CodecError> {
    bincode::deserialize(frame).map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, CodecError};
    use crate::{Entity, EntityId, Message, SimulationState, SyncSnapshot};

    #[test]
    fn frames_decode_to_the_encoded_message() {
        let mut state = SimulationState::new();
        state.entities_mut().push(Entity::new(EntityId::new(3)));
        let message = Message::SyncState(SyncSnapshot::new(15, 2.5, state));

        let frame = encode(&message).expect("encode");
        assert_eq!(decode(&frame).expect("decode"), message);
    }

    #[test]
    fn control_messages_are_compact() {
        assert_eq!(encode(&Message::Init).expect("encode"), vec![0, 0, 0, 0]);
        assert_eq!(encode(&Message::Stop).expect("encode"), vec![1, 0, 0, 0]);
    }

    #[test]
    fn unknown_tags_and_garbage_are_rejected() {
        assert!(matches!(decode(&[9, 0, 0, 0]), Err(CodecError::Decode(_))));
        assert!(matches!(decode(&[]), Err(CodecError::Decode(_))));
        assert!(matches!(decode(&[2, 0]), Err(CodecError::Decode(_))));
    }
}
