pub mod error;
pub mod types;

pub use error::{CheckError, Result};
pub use types::{Classification, Level, Severity};
