pub mod error;

pub use error::{EnvsetError, Result};
