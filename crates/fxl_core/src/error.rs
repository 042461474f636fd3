//! Fatal errors.
//!
//! These signal host or programming bugs (a cyclic scope graph, a
//! reentrant guard). They are never converted into user diagnostics.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("scope graph contains a cycle through '{0}'")]
    ScopeCycle(String),

    #[error("guard '{0}' entered again on the thread that already holds it")]
    Reentrancy(&'static str),

    #[error("guard '{0}' is held by another thread")]
    Contention(&'static str),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
