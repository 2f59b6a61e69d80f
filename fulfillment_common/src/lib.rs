pub mod op;
mod secret;
mod vnd;

pub use secret::Secret;
pub use vnd::{Vnd, VndConversionError};
