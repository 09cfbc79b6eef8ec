//! # Casting Config
//!
//! Configuration types for the Casting Agency API, loaded once from environment
//! variables at process start and immutable afterwards:
//!
//! - [`auth`]: identity provider domain, API audience, key-set endpoint
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`server`]: listen address
//!
//! # Example
//!
//! ```ignore
//! use casting_config::{AuthConfig, CorsConfig, ServerConfig};
//!
//! dotenvy::dotenv().ok();
//! let auth_config = AuthConfig::from_env()?;
//! let cors_config = CorsConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! ```

pub mod auth;
pub mod cors;
pub mod server;

// Re-export commonly used types at crate root
pub use auth::AuthConfig;
pub use cors::CorsConfig;
pub use server::ServerConfig;
