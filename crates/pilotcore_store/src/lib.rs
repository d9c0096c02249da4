//! Filesystem-backed Session Store (§4.1, §6): one directory per session
//! holding `metadata.json`, an append-only `messages.jsonl` log, and an
//! `images/` directory of PNG blobs referenced from the log by `ImageRef`.

pub mod error;
pub mod layout;
pub mod store;

pub use error::{Result, StoreError};
pub use store::SessionStore;
