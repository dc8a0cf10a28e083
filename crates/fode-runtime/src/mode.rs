#![forbid(unsafe_code)]

//! Runtime mode shared by every fode crate.

use serde::{Deserialize, Serialize};

/// Validation strictness for an integration run.
///
/// - **Strict**: SciPy-compatible input handling. Out-of-range `rtol` is
///   clamped with a warning; a non-finite state is left to the step-size
///   controller, which shrinks the step until it underflows.
/// - **Hardened**: everything Strict does, plus finiteness checks on
///   tolerances, the initial state and every stage derivative. A NaN or Inf
///   aborts the run immediately instead of being chased down to underflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeMode {
    #[default]
    Strict,
    Hardened,
}

impl RuntimeMode {
    #[must_use]
    pub const fn is_hardened(self) -> bool {
        matches!(self, Self::Hardened)
    }
}
