use serde::{Deserialize, Serialize};

use crate::state::{ChannelId, PlayerId, PlayerState, StateMap};

/// Upper bound for a single relay line, far above a full roster snapshot.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEnvelope {
    #[serde(rename = "Game")]
    pub game: String,
    #[serde(rename = "Name")]
    pub name: PlayerId,
    /// JSON-encoded `StateMap`, nested as a string.
    #[serde(rename = "Message")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Delta(PlayerId, PlayerState),
    Snapshot(StateMap),
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Envelope(serde_json::Error),
    #[error("malformed state payload: {0}")]
    Payload(serde_json::Error),
    #[error("state payload has no entries")]
    EmptyPayload,
    #[error("encoding failed: {0}")]
    Encode(serde_json::Error),
}

impl ChannelEnvelope {
    pub fn new(
        channel: &ChannelId,
        sender: &PlayerId,
        states: &StateMap,
    ) -> Result<Self, EnvelopeError> {
        let message = serde_json::to_string(states).map_err(EnvelopeError::Encode)?;
        Ok(Self {
            game: channel.as_str().to_owned(),
            name: sender.clone(),
            message,
        })
    }

    pub fn encode(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(EnvelopeError::Encode)
    }

    pub fn decode(line: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(line).map_err(EnvelopeError::Envelope)
    }

    pub fn is_for(&self, channel: &ChannelId) -> bool {
        self.game == channel.as_str()
    }

    pub fn payload(&self) -> Result<Payload, EnvelopeError> {
        let mut states: StateMap =
            serde_json::from_str(&self.message).map_err(EnvelopeError::Payload)?;

        match states.len() {
            0 => Err(EnvelopeError::EmptyPayload),
            1 => {
                let (id, state) = states.pop_first().ok_or(EnvelopeError::EmptyPayload)?;
                Ok(Payload::Delta(id, state))
            }
            _ => Ok(Payload::Snapshot(states)),
        }
    }
}
