// SHINJUKU EXPERIMENT SCENARIOS
// EACH SCENARIO IS A PURE FUNCTION FROM A FEW NAMED OVERRIDES TO A COMPLETE
// ExperimentSpec, BUILT FROM THE SHARED WORKLOAD/SCHEDULER/SWEEP BUILDERS.
//
// MACHINE SHAPE: 20 SPINNING WORKERS + 1 LOAD GENERATOR = 21 CPUS.
// COOPERATIVE ALSO LOSES A CPU TO THE DISPATCHER THREAD.

use std::time::Duration;

use crate::discipline::Discipline;
use crate::error::HarnessError;
use crate::ghost::SchedulerOptions;
use crate::spec::ExperimentSpec;
use crate::sweep::{self, Band};
use crate::workload::WorkloadConfig;

pub const NUM_CPUS: u32 = 21;
pub const NUM_CFS_WORKERS: u32 = NUM_CPUS - 2;
pub const NUM_GHOST_WORKERS: u32 = 200;

const GHOST_EXPERIMENT_DURATION: Duration = Duration::from_secs(10);

pub type BuildFn = fn() -> Result<ExperimentSpec, HarnessError>;

#[derive(Clone, Copy, Debug)]
pub struct Scenario {
    pub name: &'static str,
    pub discipline: Discipline,
    pub build: BuildFn,
}

// COOPERATIVE: 99.5% 10us GETS, 0.5% 5ms RANGE QUERIES, RUN TO COMPLETION
pub fn cfs() -> Result<ExperimentSpec, HarnessError> {
    let workload = WorkloadConfig {
        range_query_ratio: 0.005,
        ..WorkloadConfig::new(Discipline::Cooperative, NUM_CPUS, NUM_CFS_WORKERS)?
    };
    ExperimentSpec::new("cfs", sweep::plan(&sweep::COOPERATIVE_BANDS)?, workload, None, None)
}

// SHARED PREEMPTIVE SHAPE: 200 WORKERS OVERSUBSCRIBING 21 CPUS
fn ghost_spec(
    name: &'static str,
    bands: &[Band],
    range_query_ratio: f64,
    short_op: Duration,
    range_op: Duration,
    time_slice: Duration,
) -> Result<ExperimentSpec, HarnessError> {
    let workload = WorkloadConfig {
        range_query_ratio,
        short_op_duration: short_op,
        range_op_duration: range_op,
        experiment_duration: GHOST_EXPERIMENT_DURATION,
        emit_ns: true,
        ..WorkloadConfig::new(Discipline::Preemptive, NUM_CPUS, NUM_GHOST_WORKERS)?
    };
    let scheduler = SchedulerOptions::new(NUM_CPUS)?.with_time_slice(time_slice)?;
    ExperimentSpec::new(name, sweep::plan(bands)?, workload, Some(scheduler), None)
}

// 99.5% 0.5us, 0.5% 500us, 30us SLICE
pub fn ghost_sub_us() -> Result<ExperimentSpec, HarnessError> {
    ghost_spec(
        "ghost/sub-us",
        &sweep::PREEMPTIVE_BANDS,
        0.005,
        Duration::from_nanos(500),
        Duration::from_micros(500),
        Duration::from_micros(30),
    )
}

// 99.5% 4us, 0.5% 10ms, 30us SLICE
pub fn ghost_dispersive() -> Result<ExperimentSpec, HarnessError> {
    ghost_spec(
        "ghost/dispersive",
        &[
            Band::new(10_000, 250_000, 10_000),
            Band::new(250_000, 285_000, 2_500),
            Band::new(285_000, 286_000, 100),
        ],
        0.005,
        Duration::from_micros(4),
        Duration::from_millis(10),
        Duration::from_micros(30),
    )
}

// 50% 1us, 50% 100us. THE FINE BAND RE-ENTERS AT 250K.
const BIMODAL_BANDS: [Band; 2] = [
    Band::new(50_000, 300_000, 50_000),
    Band::new(250_000, 320_000, 10_000),
];

fn ghost_bimodal(name: &'static str, slice_us: u64) -> Result<ExperimentSpec, HarnessError> {
    ghost_spec(
        name,
        &BIMODAL_BANDS,
        0.5,
        Duration::from_micros(1),
        Duration::from_micros(100),
        Duration::from_micros(slice_us),
    )
}

pub fn ghost_bimodal_30us() -> Result<ExperimentSpec, HarnessError> {
    ghost_bimodal("ghost/bimodal-30us", 30)
}

pub fn ghost_bimodal_20us() -> Result<ExperimentSpec, HarnessError> {
    ghost_bimodal("ghost/bimodal-20us", 20)
}

pub fn ghost_bimodal_10us() -> Result<ExperimentSpec, HarnessError> {
    ghost_bimodal("ghost/bimodal-10us", 10)
}

pub fn ghost_bimodal_5us() -> Result<ExperimentSpec, HarnessError> {
    ghost_bimodal("ghost/bimodal-5us", 5)
}

// 100% 1us, 30us SLICE. NO RANGE QUERIES, SO range_op_duration IS UNUSED.
pub fn ghost_short_only() -> Result<ExperimentSpec, HarnessError> {
    ghost_spec(
        "ghost/short-only",
        &[
            Band::new(100_000, 2_000_000, 100_000),
            Band::new(1_900_000, 2_000_000, 10_000),
        ],
        0.0,
        Duration::from_micros(1),
        crate::workload::DEFAULT_RANGE_OP,
        Duration::from_micros(30),
    )
}

pub const CFS: Scenario = Scenario {
    name: "cfs",
    discipline: Discipline::Cooperative,
    build: cfs,
};

pub const GHOST_SUB_US: Scenario = Scenario {
    name: "ghost/sub-us",
    discipline: Discipline::Preemptive,
    build: ghost_sub_us,
};

// SELECTABLE PREEMPTIVE SCENARIOS, KEYED BY THEIR CLI NAME
pub static GHOST_VARIANTS: [(&str, Scenario); 7] = [
    ("sub-us", GHOST_SUB_US),
    (
        "dispersive",
        Scenario {
            name: "ghost/dispersive",
            discipline: Discipline::Preemptive,
            build: ghost_dispersive,
        },
    ),
    (
        "bimodal-30us",
        Scenario {
            name: "ghost/bimodal-30us",
            discipline: Discipline::Preemptive,
            build: ghost_bimodal_30us,
        },
    ),
    (
        "bimodal-20us",
        Scenario {
            name: "ghost/bimodal-20us",
            discipline: Discipline::Preemptive,
            build: ghost_bimodal_20us,
        },
    ),
    (
        "bimodal-10us",
        Scenario {
            name: "ghost/bimodal-10us",
            discipline: Discipline::Preemptive,
            build: ghost_bimodal_10us,
        },
    ),
    (
        "bimodal-5us",
        Scenario {
            name: "ghost/bimodal-5us",
            discipline: Discipline::Preemptive,
            build: ghost_bimodal_5us,
        },
    ),
    (
        "short-only",
        Scenario {
            name: "ghost/short-only",
            discipline: Discipline::Preemptive,
            build: ghost_short_only,
        },
    ),
];

pub const DEFAULT_GHOST_VARIANT: &str = "sub-us";

pub fn ghost_variant(key: &str) -> Option<Scenario> {
    GHOST_VARIANTS.iter().find(|(k, _)| *k == key).map(|(_, s)| *s)
}

pub fn ghost_variant_keys() -> impl Iterator<Item = &'static str> {
    GHOST_VARIANTS.iter().map(|(k, _)| *k)
}

// ONE SCENARIO PER DISCIPLINE. THE DISPATCHER LOOKS SCENARIOS UP HERE.
#[derive(Clone, Debug, Default)]
pub struct ScenarioBook {
    entries: Vec<Scenario>,
}

impl ScenarioBook {
    pub fn new() -> Self {
        Self::default()
    }

    // cfs + DEFAULT PREEMPTIVE VARIANT
    pub fn standard() -> Self {
        Self::new().register(CFS).register(GHOST_SUB_US)
    }

    pub fn with_ghost_variant(key: &str) -> Result<Self, HarnessError> {
        let ghost = ghost_variant(key).ok_or_else(|| {
            HarnessError::InvalidConfig(format!(
                "unknown ghost variant `{}` (known: {})",
                key,
                ghost_variant_keys().collect::<Vec<_>>().join(", ")
            ))
        })?;
        Ok(Self::new().register(CFS).register(ghost))
    }

    // THE VARIANT IS ONLY LOOKED UP WHEN A PREEMPTIVE EXPERIMENT WILL RUN
    pub fn for_disciplines(disciplines: &[Discipline], key: &str) -> Result<Self, HarnessError> {
        if disciplines.contains(&Discipline::Preemptive) {
            Self::with_ghost_variant(key)
        } else {
            Ok(Self::standard())
        }
    }

    // LATER REGISTRATION FOR THE SAME DISCIPLINE REPLACES THE EARLIER ONE
    pub fn register(mut self, scenario: Scenario) -> Self {
        self.entries.retain(|s| s.discipline != scenario.discipline);
        self.entries.push(scenario);
        self
    }

    pub fn lookup(&self, discipline: Discipline) -> Option<&Scenario> {
        self.entries.iter().find(|s| s.discipline == discipline)
    }
}
