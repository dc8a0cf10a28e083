#![forbid(unsafe_code)]

//! Shared runtime pieces for the fode workspace.
//!
//! | Module    | Contents                                               |
//! |-----------|--------------------------------------------------------|
//! | `mode`    | [`RuntimeMode`] (Strict / Hardened)                    |
//! | `testing` | tolerance assertions and [`TestLogEntry`] JSON lines   |

pub mod mode;
pub mod testing;

pub use mode::RuntimeMode;
pub use testing::{
    TestLogEntry, TestLogLevel, TestResult, assert_close, assert_close_slice, now_unix_ms,
    within_tolerance,
};
