//! yailbuild - App Inventor build server pipeline
//!
//! Turns an App Inventor project (YAIL sources plus component metadata) into
//! a signed, zip-aligned Android package by driving the YAIL compiler, the
//! dex merger and the Android packaging tools.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Build pipeline and command logic
//! - [`infra`] - Infrastructure layer (filesystem, processes, resources, tools)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
