// SHINJUKU SWEEP PLANNER
// TARGET THROUGHPUTS ARE SWEPT COARSE-TO-FINE: A WIDE BAND WITH A LARGE
// STEP FOR CHEAP COVERAGE, THEN ONE OR MORE NARROW BANDS WITH SMALLER STEPS
// WHERE THE DISCIPLINE IS EXPECTED TO SATURATE. BANDS ARE FIXED UP FRONT
// FROM KNOWN DISCIPLINE CAPACITY; THERE IS NO FEEDBACK SEARCH.
//
// OUTPUT IS STRICTLY INCREASING. A BAND THAT OVERLAPS ITS PREDECESSOR ONLY
// CONTRIBUTES POINTS ABOVE THE LAST ONE ALREADY EMITTED, SO A SHARED
// BOUNDARY VALUE APPEARS EXACTLY ONCE.

use std::iter;

use crate::discipline::Discipline;
use crate::error::HarnessError;

// HALF-OPEN [start, end) WALKED IN step INCREMENTS, LIKE range(start, end, step)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Band {
    pub start: u64,
    pub end: u64,
    pub step: u64,
}

impl Band {
    pub const fn new(start: u64, end: u64, step: u64) -> Self {
        Self { start, end, step }
    }

    pub fn points(&self) -> impl Iterator<Item = u64> {
        let Band { start, end, step } = *self;
        iter::successors(Some(start), move |&p| p.checked_add(step))
            .take_while(move |&p| p < end)
    }

    fn check(&self) -> Result<(), HarnessError> {
        if self.step == 0 {
            return Err(HarnessError::InvalidSweep(format!("{:?} has a zero step", self)));
        }
        if self.start == 0 {
            return Err(HarnessError::InvalidSweep(format!("{:?} starts at zero req/s", self)));
        }
        if self.start >= self.end {
            return Err(HarnessError::InvalidSweep(format!("{:?} is empty", self)));
        }
        Ok(())
    }
}

// COOPERATIVE: 10K..40K IN 10K STEPS, THEN 50K..=80K IN 1K STEPS
pub const COOPERATIVE_BANDS: [Band; 2] = [
    Band::new(10_000, 50_000, 10_000),
    Band::new(50_000, 81_000, 1_000),
];

// PREEMPTIVE: SATURATES AN ORDER OF MAGNITUDE HIGHER ON SUB-MICROSECOND MIXES
pub const PREEMPTIVE_BANDS: [Band; 2] = [
    Band::new(100_000, 1_900_000, 100_000),
    Band::new(1_900_000, 2_000_000, 10_000),
];

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ThroughputSweep(Vec<u64>);

impl ThroughputSweep {
    pub fn from_points(points: Vec<u64>) -> Result<Self, HarnessError> {
        if points.is_empty() {
            return Err(HarnessError::InvalidSweep("no throughput points".into()));
        }
        if points[0] == 0 {
            return Err(HarnessError::InvalidSweep("throughput points must be positive".into()));
        }
        if let Some(w) = points.windows(2).find(|w| w[0] >= w[1]) {
            return Err(HarnessError::InvalidSweep(format!(
                "points not strictly increasing at {} -> {}",
                w[0], w[1]
            )));
        }
        Ok(Self(points))
    }

    pub fn points(&self) -> &[u64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    // NEVER EMPTY; from_points REJECTS EMPTY INPUT
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> u64 {
        self.0[0]
    }

    pub fn max(&self) -> u64 {
        self.0[self.0.len() - 1]
    }
}

// CONCATENATE BANDS IN ORDER. EACH BAND MUST START ABOVE THE PREVIOUS BAND'S
// START; POINTS NOT ABOVE THE LAST EMITTED VALUE ARE DROPPED.
pub fn plan(bands: &[Band]) -> Result<ThroughputSweep, HarnessError> {
    let mut points: Vec<u64> = Vec::new();
    let mut prev_start: Option<u64> = None;

    for band in bands {
        band.check()?;
        if let Some(s) = prev_start {
            if band.start <= s {
                return Err(HarnessError::InvalidSweep(format!(
                    "{:?} does not start above the previous band ({})",
                    band, s
                )));
            }
        }
        prev_start = Some(band.start);

        let floor = points.last().copied().unwrap_or(0);
        points.extend(band.points().filter(|&p| p > floor));
    }

    ThroughputSweep::from_points(points)
}

pub fn coarse_to_fine(coarse: Band, fine: Band) -> Result<ThroughputSweep, HarnessError> {
    plan(&[coarse, fine])
}

// DEFAULT SWEEP FOR A DISCIPLINE
pub fn default_sweep(discipline: Discipline) -> Result<ThroughputSweep, HarnessError> {
    match discipline {
        Discipline::Cooperative => plan(&COOPERATIVE_BANDS),
        Discipline::Preemptive => plan(&PREEMPTIVE_BANDS),
    }
}
