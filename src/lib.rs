pub mod app;
pub mod config;
pub mod endpoint;
pub mod exchange;
pub mod handler;
pub mod identity;
pub mod locale;
pub mod logging;
pub mod messages;
pub mod session;
pub mod state;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use config::Config;
pub use endpoint::{HttpTransport, RouteProbe};
pub use exchange::{classify, ChatRequest, ConnectivityProbe, ExchangeError, RawReply, Transport};
pub use identity::{resolve_client_id, FileStore, KeyValueStore, MemoryStore};
pub use locale::Language;
pub use messages::{ChatMessage, ChatRole, MessageLog};
pub use session::{ChatClient, ChatSession, SendOutcome};
pub use state::UiState;
