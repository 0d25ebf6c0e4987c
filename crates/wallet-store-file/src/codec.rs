//! Legacy and structured wallet encodings
//!
//! The encoding is detected from the bytes themselves: a `WLT2` prefix means
//! structured, a JSON object tagged `legacy/1` means legacy. Anything else
//! fails to decode.

use crate::proto::{KeyProto, WalletProto};
use prost::Message;
use serde::{Deserialize, Serialize};
use wallet_migration::{StoredKey, WalletPayload, WalletVersion};
use zeroize::Zeroize;

/// Prefix of every structured wallet file
pub const STRUCTURED_MAGIC: &[u8; 4] = b"WLT2";

const LEGACY_FORMAT_TAG: &str = "legacy/1";

/// Codec errors
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// File is empty
    #[error("wallet file is empty")]
    Empty,

    /// Neither encoding recognized
    #[error("unrecognized wallet encoding: {0}")]
    UnknownFormat(String),

    /// Legacy JSON is malformed
    #[error("legacy wallet is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// Key field is not valid hex
    #[error("legacy wallet key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Structured body is malformed
    #[error("structured wallet is malformed: {0}")]
    Proto(#[from] prost::DecodeError),

    /// Structured body could not be written
    #[error("structured wallet could not be encoded: {0}")]
    Encode(#[from] prost::EncodeError),
}

#[derive(Serialize, Deserialize)]
struct LegacyWallet {
    format: String,
    network: String,
    last_block_height: u64,
    keys: Vec<LegacyKey>,
}

#[derive(Serialize, Deserialize)]
struct LegacyKey {
    public_key: String,
    private_key: String,
    creation_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl Drop for LegacyKey {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// Encode `payload` in the requested encoding
pub fn encode(payload: &WalletPayload, version: WalletVersion) -> Result<Vec<u8>, CodecError> {
    match version {
        WalletVersion::Legacy => encode_legacy(payload),
        WalletVersion::Structured => encode_structured(payload),
    }
}

/// Detect the encoding of `bytes` and decode it
pub fn decode(bytes: &[u8]) -> Result<(WalletVersion, WalletPayload), CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }
    if let Some(body) = bytes.strip_prefix(STRUCTURED_MAGIC.as_slice()) {
        return Ok((WalletVersion::Structured, decode_structured(body)?));
    }
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    if first == Some(&b'{') {
        return Ok((WalletVersion::Legacy, decode_legacy(bytes)?));
    }
    Err(CodecError::UnknownFormat(format!(
        "first bytes {}",
        hex::encode(&bytes[..bytes.len().min(8)])
    )))
}

fn encode_legacy(payload: &WalletPayload) -> Result<Vec<u8>, CodecError> {
    let legacy = LegacyWallet {
        format: LEGACY_FORMAT_TAG.to_string(),
        network: payload.network.clone(),
        last_block_height: payload.last_block_height,
        keys: payload
            .keys
            .iter()
            .map(|key| LegacyKey {
                public_key: hex::encode(&key.public_key),
                private_key: hex::encode(&key.private_key),
                creation_time: key.creation_time,
                label: key.label.clone(),
            })
            .collect(),
    };
    Ok(serde_json::to_vec_pretty(&legacy)?)
}

fn decode_legacy(bytes: &[u8]) -> Result<WalletPayload, CodecError> {
    let legacy: LegacyWallet = serde_json::from_slice(bytes)?;
    if legacy.format != LEGACY_FORMAT_TAG {
        return Err(CodecError::UnknownFormat(format!(
            "legacy format tag '{}'",
            legacy.format
        )));
    }

    let keys = legacy
        .keys
        .iter()
        .map(|key| {
            Ok(StoredKey {
                public_key: hex::decode(&key.public_key)?,
                private_key: hex::decode(&key.private_key)?,
                creation_time: key.creation_time,
                label: key.label.clone(),
            })
        })
        .collect::<Result<Vec<_>, CodecError>>()?;

    Ok(WalletPayload {
        network: legacy.network.clone(),
        keys,
        last_block_height: legacy.last_block_height,
    })
}

fn encode_structured(payload: &WalletPayload) -> Result<Vec<u8>, CodecError> {
    let mut proto = WalletProto {
        network: payload.network.clone(),
        keys: payload
            .keys
            .iter()
            .map(|key| KeyProto {
                public_key: key.public_key.clone(),
                private_key: key.private_key.clone(),
                creation_time: key.creation_time,
                label: key.label.clone(),
            })
            .collect(),
        last_block_height: payload.last_block_height,
    };

    let mut out = Vec::with_capacity(STRUCTURED_MAGIC.len() + proto.encoded_len());
    out.extend_from_slice(STRUCTURED_MAGIC);
    let result = proto.encode(&mut out);
    scrub(&mut proto);
    result?;
    Ok(out)
}

fn decode_structured(body: &[u8]) -> Result<WalletPayload, CodecError> {
    let mut proto = WalletProto::decode(body)?;
    let payload = WalletPayload {
        network: proto.network.clone(),
        keys: proto
            .keys
            .iter()
            .map(|key| StoredKey {
                public_key: key.public_key.clone(),
                private_key: key.private_key.clone(),
                creation_time: key.creation_time,
                label: key.label.clone(),
            })
            .collect(),
        last_block_height: proto.last_block_height,
    };
    scrub(&mut proto);
    Ok(payload)
}

fn scrub(proto: &mut WalletProto) {
    for key in &mut proto.keys {
        key.private_key.zeroize();
    }
}
