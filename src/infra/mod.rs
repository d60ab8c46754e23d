//! Infrastructure layer
//!
//! Handles all I/O operations: filesystem, external processes, tool discovery
//! and runtime resources. This module is the only place where side effects occur.

pub mod dirs;
pub mod filesystem;
pub mod process;
pub mod resources;
pub mod slots;
pub mod toolchain;
