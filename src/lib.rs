// SHINJUKU -- COOPERATIVE VS PREEMPTIVE QUEUEING SWEEPS
// PURE-RUST LIBRARY: DISCIPLINES, CONFIG BUILDERS, SWEEP PLANNING, DISPATCH.
// SHARED BETWEEN THE BINARY (main.rs) AND THE INTEGRATION TESTS.

pub mod antagonist;
pub mod discipline;
pub mod dispatch;
pub mod duration;
pub mod error;
pub mod ghost;
pub mod runner;
pub mod scenario;
pub mod spec;
pub mod sweep;
pub mod workload;

pub use discipline::Discipline;
pub use error::{ErrorKind, HarnessError};
pub use spec::ExperimentSpec;
