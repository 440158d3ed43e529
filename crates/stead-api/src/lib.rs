//! stead-api - Reference sync service for Stead
//!
//! The server half of the draft sync protocol: it keeps the most recent
//! winning draft per site as opaque staging data and arbitrates conflicts
//! with the `shouldPatch` flag. Also serves the block editor's image
//! uploads from a local media directory.

pub mod config;
pub mod error;
pub mod routes;
pub mod staging;
