//! stockscan: batch technical-indicator screener for equity symbols.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], the command-line front end in
//! [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
