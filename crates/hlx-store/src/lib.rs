//! Durable snapshot persistence for HLX.
//!
//! This crate owns everything between an in-memory value and a signed file
//! on disk: encoding through the object codec, sealing into an envelope,
//! the temp-write-then-atomic-replace durability protocol, and the
//! load path that falls back to the backup sibling before giving up.
//!
//! # Sibling files
//!
//! Next to a user-named target `P` the store produces `P.tmp` (transient,
//! removed on every exit path) and `P.bak` (the previous good snapshot,
//! written when backups are enabled).
//!
//! # Concurrency
//!
//! All I/O is synchronous and blocking; a call returns only after the
//! kernel has acknowledged durability. The store provides no mutual
//! exclusion between writers of the same path — serialize those externally,
//! for example with [`PathLocks`].
//!
//! # Design Rules
//!
//! 1. The target name always refers to a complete envelope: old bytes,
//!    backup bytes, or new bytes, never a torn intermediate.
//! 2. A rejected or unreadable snapshot must never take the application
//!    down; `load_or_new` collapses every failure to the default value.
//! 3. The payload is never interpreted before its MAC verifies (the one
//!    documented exception: raw extraction of uncompressed snapshots).

pub mod api;
pub mod convenience;
pub mod durable;
pub mod error;
mod loader;
pub mod pathlock;

pub use api::{
    extract_raw_payload, load_or_fail, load_or_new, save, save_prebuilt_payload,
    stored_timestamp, SaveOptions,
};
pub use convenience::{
    load_bytes_or, load_string_list_or, load_string_or, save_bytes, save_string,
    save_string_list,
};
pub use durable::write_durable;
pub use error::{StoreError, StoreResult};
pub use pathlock::PathLocks;
