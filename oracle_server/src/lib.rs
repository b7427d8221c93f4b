// oracle_leaks/oracle_server/src/lib.rs

pub mod config;
pub mod context;
pub mod error;
pub mod server;
pub mod session;

pub use config::{Args, ServerConfig};
pub use context::OracleContext;
pub use error::{ConfigError, SessionError};
pub use server::serve;
pub use session::{run_session, serve_session};
