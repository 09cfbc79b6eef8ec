//! # Casting CLI
//!
//! Operator tooling for the Casting Agency API's token pipeline.
//!
//! This library crate holds the command implementations used by the CLI binary,
//! so they can be exercised against an in-memory key source in tests.
//!
//! ## Usage
//!
//! ```ignore
//! use casting_cli::commands;
//!
//! let pipeline = AuthPipeline::from_config(&config)?;
//! let outcome = commands::verify(&pipeline, &token, "get:movies").await;
//! println!("{}", outcome.body);
//! ```

pub mod commands;
