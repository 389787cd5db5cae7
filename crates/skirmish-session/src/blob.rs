//! String blobs: how seats and settings ride inside packets.

use serde::{Serialize, de::DeserializeOwned};

use crate::SessionError;

pub(crate) fn to_blob<T: Serialize>(value: &T) -> Result<String, SessionError> {
    serde_json::to_string(value).map_err(SessionError::Encode)
}

pub(crate) fn from_blob<T: DeserializeOwned>(blob: &str) -> Result<T, SessionError> {
    serde_json::from_str(blob).map_err(SessionError::Decode)
}
