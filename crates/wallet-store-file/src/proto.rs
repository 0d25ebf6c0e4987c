//! Structured wallet encoding (protobuf)
//!
//! Message types are declared by hand with `prost` derives, so no `protoc`
//! is needed at build time. Field tags are part of the on-disk format and
//! must never be renumbered.

#![allow(missing_docs)] // Proto fields don't need individual docs

use prost::Message;

/// Structured wallet body
#[derive(Clone, PartialEq, Message)]
pub struct WalletProto {
    #[prost(string, tag = "1")]
    pub network: String,
    #[prost(message, repeated, tag = "2")]
    pub keys: Vec<KeyProto>,
    #[prost(uint64, tag = "3")]
    pub last_block_height: u64,
}

/// Key pair entry
#[derive(Clone, PartialEq, Message)]
pub struct KeyProto {
    #[prost(bytes = "vec", tag = "1")]
    pub public_key: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub private_key: Vec<u8>,
    #[prost(int64, tag = "3")]
    pub creation_time: i64,
    #[prost(string, optional, tag = "4")]
    pub label: Option<String>,
}
