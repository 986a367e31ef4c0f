mod cache;
mod element_set;
mod error;
mod refresh;
mod source;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cache::{ElementCache, ElementSnapshot, Freshness};
pub use element_set::{OrbitalElementSet, ISS_NORAD_ID};
pub use refresh::{spawn_refresh, RefreshPolicy};
pub use source::{ConfiguredSource, FileElementSource, HttpElementSource, PayloadFormat};
