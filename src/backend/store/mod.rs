//! Document Store Adapter
//!
//! Wraps the embedded key-value store behind a small atomic contract:
//! get / set / delete / prefix scan, plus TTL-bearing writes and an expiry
//! sweep. Everything above this module addresses documents by opaque string
//! keys and raw JSON values.

mod kv;

pub use kv::KvStore;
