// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use admissions_domain::DomainError;

/// Errors that can occur while deciding a user transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A domain rule was violated.
    #[error("{0}")]
    DomainViolation(#[from] DomainError),
    /// An internal invariant failed.
    #[error("Internal error: {0}")]
    Internal(String),
}
