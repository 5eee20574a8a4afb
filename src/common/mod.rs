pub mod error;

pub use error::{SiftError, SiftErrorKind};
