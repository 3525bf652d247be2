pub mod config;
pub mod error;

pub use config::DecoderConfig;
pub use error::{MftError, MftResult};
