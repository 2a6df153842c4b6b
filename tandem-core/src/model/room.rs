use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_ROOM_ID_LEN: usize = 128;
const MAX_IDENTITY_LEN: usize = 256;

/// Caller-chosen room name. Never empty, no control characters.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(String);

/// Display identity a participant announces when joining (an e-mail, a nickname).
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct Identity(String);

impl RoomId {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        validate("room id", raw, MAX_ROOM_ID_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Identity {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        validate("identity", raw, MAX_IDENTITY_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(what: &str, raw: &str, max_len: usize) -> Result<String, Error> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(Error::InvalidArgument(format!("{what} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(Error::InvalidArgument(format!(
            "{what} is longer than {max_len} characters"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(Error::InvalidArgument(format!(
            "{what} contains control characters"
        )));
    }
    Ok(value.to_owned())
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
