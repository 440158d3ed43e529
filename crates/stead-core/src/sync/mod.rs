//! Local-first draft synchronization.
//!
//! Edits land in the local store immediately; this module decides when
//! they travel to the remote authority and how disagreements resolve.
//! The moving parts: [`SyncSession`] carries the per-session eligibility
//! flags, [`SyncClock`] is the restartable debounce gate, [`AutoSync`]
//! polls the gate and runs round-trips, and [`RemoteSyncClient`] performs
//! the exchange and applies the server's `shouldPatch` decision. The
//! engine never loses a local edit: every failure path keeps local data.

mod autosync;
mod client;
mod clock;
mod protocol;
mod session;

pub use autosync::AutoSync;
pub use client::{csrf_token_from_cookies, RemoteSyncClient, SyncOutcome, SyncService};
pub use clock::SyncClock;
pub use protocol::{resolve_response, ResolvedFrom, SyncRequest, SyncResponse};
pub use session::{SyncFlags, SyncSession};
