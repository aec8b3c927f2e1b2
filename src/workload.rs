// SHINJUKU WORKLOAD CONFIG
// REQUEST MIX, DURATIONS AND WORKER COUNT HANDED TO THE BENCHMARK BINARY.
// BUILT FROM PER-DISCIPLINE DEFAULTS; SCENARIOS SPECIALISE WITH STRUCT
// UPDATE SYNTAX AND THE RESULT IS CHECKED BY validate() BEFORE USE.

use std::time::Duration;

use crate::discipline::Discipline;
use crate::error::HarnessError;

// SHORT (GET) AND LONG (RANGE) REQUEST SERVICE TIMES
pub const DEFAULT_SHORT_OP: Duration = Duration::from_micros(10);
pub const DEFAULT_RANGE_OP: Duration = Duration::from_micros(5000);

pub const DEFAULT_EXPERIMENT_DURATION: Duration = Duration::from_secs(15);
// WARMUP WINDOW EXCLUDED FROM RESULTS
pub const DEFAULT_DISCARD_DURATION: Duration = Duration::from_secs(2);

pub const DEFAULT_RANGE_QUERY_RATIO: f64 = 0.0;

// ONE CPU IS RESERVED FOR THE LOAD GENERATOR
pub const LOAD_GENERATOR_CPUS: u32 = 1;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PrintFormat {
    Pretty,
    Csv,
}

impl PrintFormat {
    pub fn flag(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Csv => "csv",
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct WorkloadConfig {
    pub discipline: Discipline,
    pub cpu_budget: u32,
    pub worker_count: u32,
    pub range_query_ratio: f64,
    pub short_op_duration: Duration,
    pub range_op_duration: Duration,
    pub experiment_duration: Duration,
    pub discard_duration: Duration,
    pub emit_ns: bool,
    pub print_format: PrintFormat,
}

impl WorkloadConfig {
    // DISCIPLINE DEFAULTS. PREEMPTION IS ENFORCED EXTERNALLY, SO NEITHER
    // DISCIPLINE CARRIES A TIME SLICE HERE (SEE ghost::SchedulerOptions).
    pub fn new(
        discipline: Discipline,
        cpu_budget: u32,
        worker_count: u32,
    ) -> Result<Self, HarnessError> {
        let cfg = Self {
            discipline,
            cpu_budget,
            worker_count,
            range_query_ratio: DEFAULT_RANGE_QUERY_RATIO,
            short_op_duration: DEFAULT_SHORT_OP,
            range_op_duration: DEFAULT_RANGE_OP,
            experiment_duration: DEFAULT_EXPERIMENT_DURATION,
            discard_duration: DEFAULT_DISCARD_DURATION,
            emit_ns: false,
            print_format: PrintFormat::Pretty,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    // MOST WORKERS THE DISCIPLINE ALLOWS FOR THIS CPU BUDGET.
    // PREEMPTIVE RUNS OVERSUBSCRIBE ON PURPOSE, SO THEY HAVE NO BOUND.
    pub fn max_workers(&self) -> Option<u32> {
        match self.discipline {
            Discipline::Cooperative => Some(self.cpu_budget.saturating_sub(LOAD_GENERATOR_CPUS)),
            Discipline::Preemptive => None,
        }
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.cpu_budget == 0 {
            return Err(HarnessError::InvalidConfig("cpu budget must be positive".into()));
        }
        if self.worker_count == 0 {
            return Err(HarnessError::InvalidConfig("worker count must be positive".into()));
        }
        if let Some(max) = self.max_workers() {
            if self.worker_count > max {
                return Err(HarnessError::InvalidConfig(format!(
                    "{} workers exceed {} usable cpus for {} ({} cpus, {} reserved for the load generator)",
                    self.worker_count, max, self.discipline, self.cpu_budget, LOAD_GENERATOR_CPUS
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.range_query_ratio) {
            return Err(HarnessError::InvalidConfig(format!(
                "range query ratio {} outside [0, 1]",
                self.range_query_ratio
            )));
        }
        if self.experiment_duration.is_zero() {
            return Err(HarnessError::InvalidConfig("experiment duration must be positive".into()));
        }
        if self.discard_duration >= self.experiment_duration {
            return Err(HarnessError::InvalidConfig(format!(
                "discard window {:?} swallows the whole {:?} experiment",
                self.discard_duration, self.experiment_duration
            )));
        }
        Ok(())
    }
}
