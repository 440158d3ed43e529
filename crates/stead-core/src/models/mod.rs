//! Shared models

mod draft;

pub use draft::{Draft, SiteId};
