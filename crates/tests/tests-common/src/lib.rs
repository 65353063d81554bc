//! Fixtures shared by the tests of the query engine crates.
//!
//! The registry describes a small shop: customers place orders, and orders are made of
//! order lines.

pub mod fixtures;

pub use fixtures::*;
