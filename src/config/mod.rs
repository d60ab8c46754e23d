//! Configuration and constants
//!
//! - [`defaults`] - Default values for build settings
//! - [`paths`] - Logical resource paths inside the runtime files tree

pub mod defaults;
pub mod paths;
