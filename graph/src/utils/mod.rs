//! Small helpers shared by the Graph client and its callers.
//!
//! The [`env`] module gives validated access to environment variables, used
//! for secrets that should not live in `config.toml`:
//!
//! ```no_run
//! use nimbus_graph::utils::EnvUtils;
//!
//! if let Some(secret) = EnvUtils::get_optional_var("AZURE_CLIENT_SECRET") {
//!     println!("client secret provided through the environment ({} chars)", secret.len());
//! }
//! ```

pub mod env;

pub use env::{EnvUtils, EnvVarError};
