//! GECToR Server
//!
//! HTTP front end for grammatical error correction. `POST /gector` takes a
//! list of sentences and returns the corrected text in an OK/NG envelope.

pub mod cli;
pub mod config;
pub mod routes;
pub mod shutdown;
pub mod state;

pub use cli::Cli;
pub use config::ServerConfig;
pub use routes::create_router;
pub use shutdown::{shutdown_signal, ShutdownSignal};
pub use state::AppState;
