//! Process exit codes used by dispatch

/// Handler succeeded, or help/version was printed
pub const OK: i32 = 0;

/// Unhandled handler error, or a failure signaled without an explicit code
pub const FAILURE: i32 = 1;

/// Command line usage error reported by the parser
pub const USAGE: i32 = 2;
