//! Store snapshot and its JSON boundary
//!
//! This module defines the habit/entry snapshot the engine reads from and the
//! lenient loader that turns stored JSON into a well-typed snapshot, recording
//! every value it had to coerce on the way.

mod adapter;
mod snapshot;

pub use adapter::*;
pub use snapshot::*;
