//! Per-track temporal state owned by one engine instance.

mod person;
mod store;

pub use person::PersonState;
pub use store::TrackStore;
