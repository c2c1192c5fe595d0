// Shared helpers for integration and property tests. Not every test binary
// exercises every helper.
#![allow(dead_code)]

pub mod builders;
pub mod strategies;

pub use builders::*;
pub use strategies::*;
