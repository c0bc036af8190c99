//! CLI command implementations.

pub mod common;
pub mod decode;
pub mod extract;
pub mod guid;
pub mod inspect;
