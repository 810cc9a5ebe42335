//! Migration data models
//!
//! Script identity and metadata, version descriptors, fetched contents and
//! the ordered history handed from the lister to the materializer.

pub mod script;
pub mod version;

pub use script::*;
pub use version::*;
