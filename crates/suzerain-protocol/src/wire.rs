use rmp_serde::{decode, encode};
use thiserror::Error;

use crate::{Command, CommandOutcome, Observation, Query};

/// Wire protocol version; bumped on any incompatible payload change.
pub const WIRE_VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported wire version: {0}")]
    UnsupportedVersion(u8),
    #[error("empty frame")]
    EmptyFrame,
}

fn frame(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 1);
    out.push(WIRE_VERSION);
    out.extend(payload);
    out
}

fn unframe(bytes: &[u8]) -> Result<&[u8], WireError> {
    match bytes.split_first() {
        None => Err(WireError::EmptyFrame),
        Some((&WIRE_VERSION, rest)) => Ok(rest),
        Some((&other, _)) => Err(WireError::UnsupportedVersion(other)),
    }
}

pub fn serialize_command(cmd: &Command) -> Result<Vec<u8>, WireError> {
    Ok(frame(encode::to_vec(cmd)?))
}

pub fn deserialize_command(bytes: &[u8]) -> Result<Command, WireError> {
    Ok(decode::from_slice(unframe(bytes)?)?)
}

pub fn serialize_outcome(outcome: &CommandOutcome) -> Result<Vec<u8>, WireError> {
    Ok(frame(encode::to_vec(outcome)?))
}

pub fn deserialize_outcome(bytes: &[u8]) -> Result<CommandOutcome, WireError> {
    Ok(decode::from_slice(unframe(bytes)?)?)
}

pub fn serialize_query(query: &Query) -> Result<Vec<u8>, WireError> {
    Ok(frame(encode::to_vec(query)?))
}

pub fn deserialize_query(bytes: &[u8]) -> Result<Query, WireError> {
    Ok(decode::from_slice(unframe(bytes)?)?)
}

pub fn serialize_observation(obs: &Observation) -> Result<Vec<u8>, WireError> {
    Ok(frame(encode::to_vec(obs)?))
}

pub fn deserialize_observation(bytes: &[u8]) -> Result<Observation, WireError> {
    Ok(decode::from_slice(unframe(bytes)?)?)
}
