//! Core business logic module
//!
//! This module contains the build pipeline and the logic behind every
//! command. Filesystem and process plumbing belong in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`project`] - Project descriptor loading
//! - [`build_info`] - Component build-info catalog
//! - [`resolver`] - Built-in and extension component resolution
//! - [`requirements`] - Per-category requirement aggregation
//! - [`manifest`] - Android manifest synthesis
//! - [`icon`] - Application icon preparation
//! - [`anim`] - Transition animation resources
//! - [`attach`] - Native library and component asset insertion
//! - [`compile`] - YAIL compilation
//! - [`dex`] - Dex merge planning and execution
//! - [`packaging`] - Packaging, signing and alignment
//! - [`robot`] - Robot controller build extras
//! - [`progress`] - Build progress channel
//! - [`builder`] - Build orchestration
//! - [`inspect`] - Tool-free project inspection
//! - [`clean`] - Clean build output
//! - [`doctor`] - Host checks
//! - [`global_config`] - Global configuration management

pub mod anim;
pub mod attach;
pub mod build_info;
pub mod builder;
pub mod clean;
pub mod compile;
pub mod dex;
pub mod doctor;
pub mod global_config;
pub mod icon;
pub mod inspect;
pub mod manifest;
pub mod packaging;
pub mod progress;
pub mod project;
pub mod requirements;
pub mod resolver;
pub mod robot;
