// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot serialization: MessagePack primary, gzip-compressed JSON for
//! v1 clients. Incremental patches stay plain JSON and uncompressed.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("MessagePack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode with named fields so clients can evolve independently of field
/// order.
pub fn to_msgpack<T: Serialize>(value: &T) -> Result<Vec<u8>, SnapshotError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

pub fn from_msgpack<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SnapshotError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

pub fn to_gzip_json<T: Serialize>(value: &T) -> Result<Vec<u8>, SnapshotError> {
    let json = serde_json::to_vec(value)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

pub fn from_gzip_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SnapshotError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
