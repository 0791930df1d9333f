//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the cast bridge core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//! - Caller-facing snapshot and session description types
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions,
//! its configuration contract and the [`CoreEvent`](events::CoreEvent)
//! vocabulary delivered to the host application.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod model;

pub use error::{Error, Result};
