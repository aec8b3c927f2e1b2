// PREEMPTIVE SCHEDULER OPTIONS
// THE PREEMPTIVE DISCIPLINE IS ENFORCED BY AN EXTERNAL AGENT THAT OWNS A
// CONTIGUOUS CPU SET AND PREEMPTS ANY REQUEST THAT OUTLIVES ITS TIME SLICE.
// COOPERATIVE SPECS NEVER CARRY ONE OF THESE.

use std::time::Duration;

use crate::error::HarnessError;

pub const DEFAULT_PREEMPTION_TIME_SLICE: Duration = Duration::from_micros(30);
pub const DEFAULT_FIRST_CPU: u32 = 0;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SchedulerOptions {
    pub cpu_budget: u32,
    pub first_cpu: u32,
    pub preemption_time_slice: Duration,
}

impl SchedulerOptions {
    pub fn new(cpu_budget: u32) -> Result<Self, HarnessError> {
        let opts = Self {
            cpu_budget,
            first_cpu: DEFAULT_FIRST_CPU,
            preemption_time_slice: DEFAULT_PREEMPTION_TIME_SLICE,
        };
        opts.validate()?;
        Ok(opts)
    }

    // LOWER SLICE: LESS HEAD-OF-LINE BLOCKING, MORE PREEMPTION OVERHEAD
    pub fn with_time_slice(self, slice: Duration) -> Result<Self, HarnessError> {
        let opts = Self { preemption_time_slice: slice, ..self };
        opts.validate()?;
        Ok(opts)
    }

    // CPU LIST IN KERNEL cpulist FORMAT ("0-20")
    pub fn cpu_list(&self) -> String {
        let last = self.first_cpu + self.cpu_budget - 1;
        if last == self.first_cpu {
            self.first_cpu.to_string()
        } else {
            format!("{}-{}", self.first_cpu, last)
        }
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.cpu_budget == 0 {
            return Err(HarnessError::InvalidConfig("agent cpu budget must be positive".into()));
        }
        if self.first_cpu.checked_add(self.cpu_budget).is_none() {
            return Err(HarnessError::InvalidConfig("agent cpu range overflows".into()));
        }
        if self.preemption_time_slice.is_zero() {
            return Err(HarnessError::InvalidConfig("preemption time slice must be positive".into()));
        }
        Ok(())
    }
}
