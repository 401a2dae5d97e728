//! Weightscope CLI library
//!
//! This library exposes the command and configuration modules for testing.

pub mod commands;
pub mod config;
pub mod exit;
pub mod output;
