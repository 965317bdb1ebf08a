//! # shape-cli — Shape Stack Command-Line Interface
//!
//! ## Subcommands
//!
//! - `validate`: check a JSON or YAML document against a schema document
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handlers return values; only `main` prints and picks the exit status.

pub mod input;
pub mod validate;
