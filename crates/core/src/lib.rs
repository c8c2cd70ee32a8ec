//! Feed composition and reaction logic for dishfeed.

pub mod services;

pub use services::*;
