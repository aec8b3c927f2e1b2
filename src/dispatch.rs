// SHINJUKU DISPATCHER
// TOKENS -> DISCIPLINES -> SPECS -> RUNNER, STRICTLY IN ARGUMENT ORDER.
// ARGUMENT COUNT AND TOKEN VALIDATION BOTH HAPPEN BEFORE THE FIRST SPEC IS
// BUILT, SO A BAD ARGUMENT NEVER LEAVES A PARTIAL SWEEP BEHIND.

use anyhow::{Context, Result};
use tracing::info;

use crate::antagonist::AntagonistConfig;
use crate::discipline::{self, Discipline};
use crate::error::HarnessError;
use crate::ghost::SchedulerOptions;
use crate::runner::Runner;
use crate::scenario::ScenarioBook;
use crate::spec::{ExperimentSpec, Overrides};
use crate::workload::WorkloadConfig;

pub const MAX_EXPERIMENTS: usize = 2;

pub fn check_arg_count<S: AsRef<str>>(tokens: &[S]) -> Result<(), HarnessError> {
    match tokens.len() {
        0 => Err(HarnessError::NoExperiment),
        n if n > MAX_EXPERIMENTS => Err(HarnessError::TooManyArguments {
            given: n,
            max: MAX_EXPERIMENTS,
        }),
        _ => Ok(()),
    }
}

// CHECK OVERRIDES IN ISOLATION SO A BAD ONE FAILS BEFORE ANY RUN, NOT WHEN
// THE SECOND EXPERIMENT IS BUILT
fn check_overrides(o: &Overrides) -> Result<(), HarnessError> {
    // EACH OVERRIDE IS CHECKED BY THE CONFIG IT WILL LAND IN
    if let Some(slice) = o.time_slice {
        SchedulerOptions::new(1)?.with_time_slice(slice)?;
    }
    if let Some(d) = o.experiment_duration {
        let workload = WorkloadConfig {
            experiment_duration: d,
            ..WorkloadConfig::new(Discipline::Preemptive, 1, 1)?
        };
        workload.validate()?;
    }
    if let Some(n) = o.antagonist_threads {
        AntagonistConfig::new(n)?;
    }
    Ok(())
}

pub struct Dispatcher {
    book: ScenarioBook,
    overrides: Overrides,
}

impl Dispatcher {
    pub fn new(book: ScenarioBook) -> Self {
        Self { book, overrides: Overrides::default() }
    }

    pub fn with_overrides(self, overrides: Overrides) -> Result<Self, HarnessError> {
        check_overrides(&overrides)?;
        Ok(Self { overrides, ..self })
    }

    // BUILD THE SPEC FOR ONE DISCIPLINE. A MISSING OR MISLABELLED SCENARIO
    // MEANS THE BOOK AND THE DISCIPLINE SET HAVE DRIFTED APART.
    pub fn build(&self, d: Discipline) -> Result<ExperimentSpec, HarnessError> {
        let scenario = self.book.lookup(d).ok_or_else(|| {
            HarnessError::Invariant(format!("no scenario registered for `{}`", d))
        })?;
        let spec = (scenario.build)()?;
        if spec.discipline() != d {
            return Err(HarnessError::Invariant(format!(
                "scenario {} registered for `{}` built a `{}` experiment",
                scenario.name,
                d,
                spec.discipline()
            )));
        }
        if self.overrides.is_empty() {
            Ok(spec)
        } else {
            spec.with_overrides(&self.overrides)
        }
    }

    // ONE BUILD AND ONE BLOCKING RUNNER CALL PER DISCIPLINE, IN ORDER.
    // A RUNNER FAILURE ABORTS EVERYTHING AFTER IT.
    pub fn dispatch(&self, disciplines: &[Discipline], runner: &mut dyn Runner) -> Result<usize> {
        if disciplines.is_empty() {
            return Err(HarnessError::EmptyDisciplines.into());
        }
        for (i, &d) in disciplines.iter().enumerate() {
            let spec = self.build(d)?;
            info!(
                experiment = spec.name(),
                discipline = %d,
                points = spec.sweep().len(),
                first = spec.sweep().first(),
                last = spec.sweep().max(),
                "dispatching {}/{}",
                i + 1,
                disciplines.len()
            );
            runner
                .run(&spec)
                .with_context(|| format!("{} EXPERIMENT FAILED", spec.name()))?;
        }
        Ok(disciplines.len())
    }

    // FULL ENTRY: COUNT CHECK, THEN VALIDATION, THEN DISPATCH
    pub fn run_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
        runner: &mut dyn Runner,
    ) -> Result<usize> {
        check_arg_count(tokens)?;
        let disciplines = discipline::validate(tokens)?;
        self.dispatch(&disciplines, runner)
    }
}
