//! Relationship queries.
//!
//! - [`resolver`]: validates the request, composes the filter chain and
//!   fetches related rows, switching from JOIN to UNION when pagination
//!   requires it
//! - [`assembler`]: turns fetched rows into live entities

pub mod assembler;
pub mod resolver;

#[doc(inline)]
pub use assembler::assemble;
#[doc(inline)]
pub use resolver::{resolve, MAX_STRATEGY_ATTEMPTS};
