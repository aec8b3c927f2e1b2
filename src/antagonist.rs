// ANTAGONIST
// OPTIONAL CPU-BOUND COMPETITOR RUN NEXT TO EVERY WORKLOAD POINT.

use std::time::Duration;

use crate::error::HarnessError;
use crate::workload::DEFAULT_EXPERIMENT_DURATION;

#[derive(Clone, PartialEq, Debug)]
pub struct AntagonistConfig {
    pub thread_count: u32,
    // FRACTION OF EACH CPU THE ANTAGONIST TRIES TO CONSUME
    pub work_share: f64,
    pub experiment_duration: Duration,
}

impl AntagonistConfig {
    pub fn new(thread_count: u32) -> Result<Self, HarnessError> {
        let cfg = Self {
            thread_count,
            work_share: 1.0,
            experiment_duration: DEFAULT_EXPERIMENT_DURATION,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.thread_count == 0 {
            return Err(HarnessError::InvalidConfig("antagonist needs at least one thread".into()));
        }
        if !(self.work_share > 0.0 && self.work_share <= 1.0) {
            return Err(HarnessError::InvalidConfig(format!(
                "antagonist work share {} outside (0, 1]",
                self.work_share
            )));
        }
        if self.experiment_duration.is_zero() {
            return Err(HarnessError::InvalidConfig("antagonist duration must be positive".into()));
        }
        Ok(())
    }
}
