//! CLI command implementations.
//!
//! Each subcommand group has its own module with argument definitions and
//! handlers.
//!
//! # Command Modules
//!
//! - [`account`] - Login, logout, profile, password, online status
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`location`] - Position provider selection shared by commands
//! - [`rides`] - Ride lists and lifecycle (accept, decline, complete, track)

pub mod account;
pub mod config;
pub mod location;
pub mod rides;
