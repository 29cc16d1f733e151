//! Database models split into domain-specific modules.

pub mod account;
pub mod common;
pub mod parking;
pub mod report;

pub use account::*;
pub use common::*;
pub use parking::*;
pub use report::*;
