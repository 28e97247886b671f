//! Exit code constants for the bistro CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, config, filesystem)
//! - 2: Invalid generation request
//! - 3: Template missing or not renderable
//! - 4: Model backend failure (unavailable, timeout, error)
//! - 5: History failure (read, write, nothing to export)
//! - 6: History lock acquisition failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid config, or filesystem problems.
pub const USER_ERROR: i32 = 1;

/// Request is missing required fields.
pub const INVALID_REQUEST: i32 = 2;

/// Template could not be located or rendered.
pub const TEMPLATE_FAILURE: i32 = 3;

/// Model backend was unreachable, timed out, or reported an error.
pub const BACKEND_FAILURE: i32 = 4;

/// History log could not be read or written, or does not exist yet.
pub const HISTORY_FAILURE: i32 = 5;

/// History lock could not be acquired.
pub const LOCK_FAILURE: i32 = 6;
