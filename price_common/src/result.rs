//! Result type alias shared across the workspace.
//!
//! This module defines a convenient alias that defaults the error type to the
//! common `DispatchError`, so functions can simply return `Result<T>`.
use crate::error::DispatchError;

/// Workspace-wide `Result` alias with `DispatchError` as the default error.
pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
