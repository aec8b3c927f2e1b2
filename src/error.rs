// SHINJUKU HARNESS ERRORS
// RAISED BEFORE OR DURING DISPATCH. NEVER RETRIED, NEVER SWALLOWED.

use thiserror::Error;

use crate::discipline::{COOPERATIVE_TOKEN, PREEMPTIVE_TOKEN};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    Usage,
    Validation,
    Config,
    Invariant,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HarnessError {
    #[error("no experiment specified. pass `{cfs}` and/or `{ghost}` as arguments", cfs = COOPERATIVE_TOKEN, ghost = PREEMPTIVE_TOKEN)]
    NoExperiment,

    #[error("too many arguments: got {given}, at most {max} experiments may be given")]
    TooManyArguments { given: usize, max: usize },

    #[error("no discipline tokens to validate")]
    EmptyDisciplines,

    #[error("invalid scheduler specified: `{0}` (expected `{cfs}` or `{ghost}`)", cfs = COOPERATIVE_TOKEN, ghost = PREEMPTIVE_TOKEN)]
    UnknownDiscipline(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid sweep: {0}")]
    InvalidSweep(String),

    #[error("dispatch invariant violated: {0}")]
    Invariant(String),
}

impl HarnessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoExperiment | Self::TooManyArguments { .. } => ErrorKind::Usage,
            Self::EmptyDisciplines | Self::UnknownDiscipline(_) => ErrorKind::Validation,
            Self::InvalidConfig(_) | Self::InvalidSweep(_) => ErrorKind::Config,
            Self::Invariant(_) => ErrorKind::Invariant,
        }
    }
}
