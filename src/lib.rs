//! smart-line - ask a task database questions in plain language.
//!
//! This library exposes the core modules for use in integration tests.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod output;
