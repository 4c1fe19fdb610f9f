//! Conditional HTTP GET over libcurl.
//!
//! A `Handle` performs blocking GETs into a bounded `Sink` and returns the
//! response's `FreshnessTag` (ETag + Last-Modified). Passing that tag to the
//! next `get` makes the request conditional; an unchanged resource comes back
//! as `Error::NotModified`.
//!
//! ```no_run
//! use cget_core::{Error, Global, Handle, Sink, TextSink};
//!
//! # fn main() -> Result<(), Error> {
//! let global = Global::init()?;
//! let mut body = String::new();
//! let mut handle = Handle::new(&global, TextSink::new(&mut body))?;
//! let tag = handle.get("https://example.com/", None)?;
//! handle.sink_mut().reset()?;
//! match handle.get("https://example.com/", Some(&tag)) {
//!     Err(Error::NotModified) => println!("cached copy is current"),
//!     other => println!("{:?}", other.map(|t| t.to_string())),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod global;
pub mod handle;
pub mod logging;
pub mod sink;
pub mod tag;
pub mod tag_store;

pub use error::{Error, Result};
pub use global::Global;
pub use handle::Handle;
pub use sink::{BytesSink, Discard, Sink, TextSink, WriterSink, DEFAULT_MAX_BYTES};
pub use tag::FreshnessTag;
pub use tag_store::TagStore;
