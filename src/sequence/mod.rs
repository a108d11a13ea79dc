pub mod config;
pub mod sequence;

pub use config::SequenceConfig;
pub use sequence::Sequence;
