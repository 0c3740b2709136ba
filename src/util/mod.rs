//! Utility helpers shared across the client modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! `storage` isolates durable key-value persistence from session logic, and
//! `format` holds the pure display formatters used by callers rendering
//! catalog and booking data.

pub mod format;
pub mod storage;
