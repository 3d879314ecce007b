pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod providers;
pub mod relay;
pub mod server;
pub mod transcript;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use relay::Relay;
pub use transcript::{ChatSession, Transcript};
pub use types::{CompletionRequest, PromptRequest, RelayResponse, Role};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
