pub mod broadcast;
pub mod codec;
pub mod config;
pub mod errors;
pub mod pid;
pub mod server;
pub mod state;

// Primary re-exports
pub use broadcast::Broadcaster;
pub use config::{ServerConfig, load_server_config};
pub use errors::ServerError;
pub use server::run_server;
pub use state::AppState;
