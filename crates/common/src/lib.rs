//! Common types for the storefront client workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::SecretString;
