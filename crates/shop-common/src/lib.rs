//! Storefront Common
//!
//! Pieces shared by every storefront crate:
//! - `logging` - tracing subscriber bootstrap (text or JSON)
//! - `tsid` - time-sorted 64-bit identifiers for entities and requests

pub mod logging;
pub mod tsid;

pub use tsid::TsidGenerator;
