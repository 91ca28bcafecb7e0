//! # fundra-store — Record Store Client
//!
//! Typed async HTTP client for the platform's generic record store. The
//! store exposes one collection per entity type with plain CRUD semantics:
//!
//! - `GET /{collection}?field=value` — list records matching equality filters
//! - `GET /{collection}/{id}` — one record, or 404
//! - `POST /{collection}` — create, store assigns the id
//! - `PUT /{collection}/{id}` — full replace
//! - `PATCH /{collection}/{id}` — shallow merge of the given fields
//!
//! The client is an explicit object constructed once from [`StoreConfig`] —
//! there is no ambient base-URL global. Every request carries the client's
//! timeout, so callers never block indefinitely on the store.
//!
//! Idempotent reads retry on transport errors with exponential backoff
//! ([`retry`]). Writes are never retried here: a replayed POST against
//! financial state could double-write, and callers own that decision.

pub mod client;
pub mod collections;
pub mod error;
mod retry;

pub use client::{RecordStore, StoreConfig};
pub use error::StoreError;
