//! CLI command implementations.

pub mod inspect;
pub mod join;
pub mod split;
