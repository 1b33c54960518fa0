//! Types exchanged with a metadata collection.

pub mod instance;
pub mod typedef;

pub use instance::*;
pub use typedef::*;
