pub mod bytes;
pub mod error;
