//! Shared foundation for the chainview workspace: configuration, logging,
//! and the host-facing error taxonomy.

pub mod config;
pub mod error;
pub mod interaction;
pub mod logging;

pub use config::{validate_url, ChainviewConfig};
pub use error::{ChainviewError, ErrorCategory};
pub use interaction::{Choice, InputValidator, PromptError, UserInteraction};
pub use logging::{init_logging, init_logging_to_dir};
