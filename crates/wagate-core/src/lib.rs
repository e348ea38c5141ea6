//! # wagate-core
//!
//! Core types, traits, configuration, and error handling for the wagate gateway.

pub mod auth;
pub mod config;
pub mod error;
pub mod event;
pub mod jid;
pub mod traits;
