// SHINJUKU QUEUEING DISCIPLINES
// CLOSED SET. RAW TOKENS ARE VALIDATED ONCE AT THE BOUNDARY; EVERYTHING
// DOWNSTREAM MATCHES EXHAUSTIVELY OVER Discipline.

use std::fmt;
use std::str::FromStr;

use crate::error::HarnessError;

pub const COOPERATIVE_TOKEN: &str = "cfs";
pub const PREEMPTIVE_TOKEN: &str = "ghost";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Discipline {
    // RUN TO COMPLETION ON THE DEFAULT KERNEL SCHEDULER
    Cooperative,
    // FIXED TIME SLICE, PREEMPTED REQUESTS REQUEUED AT THE BACK OF THE FIFO
    Preemptive,
}

impl Discipline {
    pub const ALL: [Discipline; 2] = [Discipline::Cooperative, Discipline::Preemptive];

    pub fn token(self) -> &'static str {
        match self {
            Self::Cooperative => COOPERATIVE_TOKEN,
            Self::Preemptive => PREEMPTIVE_TOKEN,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cooperative => "CFS",
            Self::Preemptive => "GHOST",
        }
    }

    // CASE-SENSITIVE EXACT MATCH
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            COOPERATIVE_TOKEN => Some(Self::Cooperative),
            PREEMPTIVE_TOKEN => Some(Self::Preemptive),
            _ => None,
        }
    }
}

impl FromStr for Discipline {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| HarnessError::UnknownDiscipline(s.to_string()))
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// VALIDATE EVERY TOKEN BEFORE ANYTHING RUNS. PURE: NO SIDE EFFECTS.
// EMPTY INPUT AND UNKNOWN TOKENS ARE DISTINCT FAILURES.
pub fn validate<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Discipline>, HarnessError> {
    if tokens.is_empty() {
        return Err(HarnessError::EmptyDisciplines);
    }
    tokens.iter().map(|t| t.as_ref().parse()).collect()
}

// PREDICATE FORM: TRUE IFF EVERY TOKEN MAPS TO A KNOWN DISCIPLINE
pub fn all_known<S: AsRef<str>>(tokens: &[S]) -> bool {
    validate(tokens).is_ok()
}
