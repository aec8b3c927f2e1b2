// EXPERIMENT SPEC
// ONE FULLY-SPECIFIED EXPERIMENT: SWEEP + WORKLOAD + OPTIONAL AGENT OPTIONS +
// OPTIONAL ANTAGONIST. BUILT ONCE PER DISPATCHED DISCIPLINE, IMMUTABLE,
// HANDED TO THE RUNNER AND DROPPED.

use std::time::Duration;

use crate::antagonist::AntagonistConfig;
use crate::discipline::Discipline;
use crate::error::HarnessError;
use crate::ghost::SchedulerOptions;
use crate::sweep::ThroughputSweep;
use crate::workload::{PrintFormat, WorkloadConfig};

#[derive(Clone, PartialEq, Debug)]
pub struct ExperimentSpec {
    name: &'static str,
    sweep: ThroughputSweep,
    workload: WorkloadConfig,
    scheduler: Option<SchedulerOptions>,
    antagonist: Option<AntagonistConfig>,
}

impl ExperimentSpec {
    // SCHEDULER OPTIONS ARE REQUIRED FOR PREEMPTIVE AND FORBIDDEN FOR
    // COOPERATIVE; THE WORKLOAD'S DISCIPLINE DECIDES WHICH.
    pub fn new(
        name: &'static str,
        sweep: ThroughputSweep,
        workload: WorkloadConfig,
        scheduler: Option<SchedulerOptions>,
        antagonist: Option<AntagonistConfig>,
    ) -> Result<Self, HarnessError> {
        workload.validate()?;
        match (workload.discipline, &scheduler) {
            (Discipline::Cooperative, Some(_)) => {
                return Err(HarnessError::InvalidConfig(
                    "cooperative experiments run on the default scheduler and take no agent options".into(),
                ));
            }
            (Discipline::Preemptive, None) => {
                return Err(HarnessError::InvalidConfig(
                    "preemptive experiments need agent scheduler options".into(),
                ));
            }
            (_, Some(opts)) => opts.validate()?,
            (Discipline::Cooperative, None) => {}
        }
        if let Some(a) = &antagonist {
            a.validate()?;
        }
        Ok(Self { name, sweep, workload, scheduler, antagonist })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn discipline(&self) -> Discipline {
        self.workload.discipline
    }

    pub fn sweep(&self) -> &ThroughputSweep {
        &self.sweep
    }

    pub fn workload(&self) -> &WorkloadConfig {
        &self.workload
    }

    pub fn scheduler(&self) -> Option<&SchedulerOptions> {
        self.scheduler.as_ref()
    }

    pub fn antagonist(&self) -> Option<&AntagonistConfig> {
        self.antagonist.as_ref()
    }

    // OPERATOR OVERRIDES PRODUCE A NEW, REVALIDATED SPEC
    pub fn with_overrides(self, o: &Overrides) -> Result<Self, HarnessError> {
        let mut workload = self.workload;
        if let Some(d) = o.experiment_duration {
            workload = WorkloadConfig { experiment_duration: d, ..workload };
        }
        if let Some(f) = o.print_format {
            workload = WorkloadConfig { print_format: f, ..workload };
        }

        let scheduler = match (self.scheduler, o.time_slice) {
            (Some(s), Some(slice)) => Some(s.with_time_slice(slice)?),
            (s, _) => s,
        };

        let antagonist = match o.antagonist_threads {
            Some(n) => Some(AntagonistConfig {
                experiment_duration: workload.experiment_duration,
                ..AntagonistConfig::new(n)?
            }),
            None => self.antagonist,
        };

        Self::new(self.name, self.sweep, workload, scheduler, antagonist)
    }
}

// COMMAND-LINE OVERRIDES APPLIED ON TOP OF EVERY SCENARIO.
// time_slice ONLY AFFECTS SPECS THAT CARRY SCHEDULER OPTIONS.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Overrides {
    pub time_slice: Option<Duration>,
    pub experiment_duration: Option<Duration>,
    pub antagonist_threads: Option<u32>,
    pub print_format: Option<PrintFormat>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
