//! HBAR Rate Common Types
//!
//! Value types shared by the rate engine and its callers: the exchange rate
//! model, source quotes, and cycle timing helpers.

pub mod error;
pub mod quote;
pub mod rate;
pub mod time;

pub use error::*;
pub use quote::*;
pub use rate::*;
pub use time::*;
