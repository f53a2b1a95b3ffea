//! Types library for the guarded ledger
//!
//! Value types shared by the contract and its execution host. They are
//! frozen: the serialized forms appear in deployment records and events.
//!
//! # Modules
//! - `ids`: Account addresses and transaction identifiers
//! - `numeric`: Native currency amounts

pub mod ids;
pub mod numeric;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
}
