//! Connect host library
//!
//! This module exports the internal components of the host for testing purposes.

pub mod config;
pub mod demo;
pub mod session;
