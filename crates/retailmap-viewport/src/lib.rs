//! Debounced, cancellable loading of pincode boundaries for the visible map
//! area.
//!
//! Map movement arrives through a [`ViewportHandle`]. One driver task owns
//! all loader state, waits for the viewport to settle, queries a
//! [`BoundarySource`] and publishes [`LoaderSnapshot`]s on a watch channel.
//! A newer observation supersedes any pending or in-flight query; only the
//! latest started query may publish a result.

mod error;
mod loader;
mod source;

pub use error::{LoaderError, SourceError};
pub use loader::{LoaderConfig, LoaderPhase, LoaderSnapshot, ViewportHandle, ViewportLoader};
pub use source::BoundarySource;
