//! Resolves VAST wrapper chains.
//!
//! A [`Loader`] fetches a tag, parses it, and keeps following `<Wrapper>`
//! redirections until it reaches an InLine document, publishing lifecycle
//! events along the way.

pub mod document;
pub mod error;
pub mod events;
pub mod loader;
pub mod models;
pub mod parser;
pub mod stitcher;
pub mod transport;

pub use document::{AdDocument, Chain, TagKind};
pub use error::{ErrorKind, Result, VastError};
pub use events::{EventChannel, EventKind, LoaderEvent};
pub use loader::{load, LoadOptions, Loader};
pub use transport::{HttpTransport, Transport};
