// SHINJUKU SWEEP PLANNER TESTS
// COARSE-TO-FINE SHAPE, BOUNDARY DEDUPE, DISCIPLINE CAPACITY GAP
//
// PURE PLANNING. NO BENCHMARK BINARY, NO ROOT.

use shinjuku::scenario;
use shinjuku::sweep::{
    coarse_to_fine, default_sweep, plan, Band, ThroughputSweep, COOPERATIVE_BANDS,
    PREEMPTIVE_BANDS,
};
use shinjuku::{Discipline, ErrorKind};

fn strictly_increasing(s: &ThroughputSweep) -> bool {
    s.points().windows(2).all(|w| w[0] < w[1])
}

// === COOPERATIVE SHAPE ===

#[test]
fn cooperative_sweep_exact_points() {
    let s = default_sweep(Discipline::Cooperative).unwrap();
    let mut expected: Vec<u64> = vec![10_000, 20_000, 30_000, 40_000];
    expected.extend((50_000..=80_000).step_by(1_000));
    assert_eq!(s.points(), expected.as_slice());
    assert_eq!(s.len(), 4 + 31);
}

#[test]
fn cooperative_coarse_then_fine_steps() {
    let s = default_sweep(Discipline::Cooperative).unwrap();
    let coarse = COOPERATIVE_BANDS[0];
    let fine = COOPERATIVE_BANDS[1];
    assert!(fine.step < coarse.step);
    for w in s.points().windows(2) {
        let step = w[1] - w[0];
        if w[1] <= coarse.end {
            assert_eq!(step, coarse.step, "COARSE STEP BROKEN AT {}", w[1]);
        } else {
            assert_eq!(step, fine.step, "FINE STEP BROKEN AT {}", w[1]);
        }
    }
}

#[test]
fn cooperative_transition_point_appears_once() {
    let s = default_sweep(Discipline::Cooperative).unwrap();
    let hits = s.iter().filter(|&p| p == 50_000).count();
    assert_eq!(hits, 1);
    assert_eq!(s.first(), 10_000);
    assert_eq!(s.max(), 80_000);
}

// === PREEMPTIVE SHAPE ===

#[test]
fn preemptive_sweep_strictly_increasing() {
    let s = default_sweep(Discipline::Preemptive).unwrap();
    assert!(strictly_increasing(&s));
    assert_eq!(s.first(), PREEMPTIVE_BANDS[0].start);
}

#[test]
fn preemptive_max_is_order_of_magnitude_above_cooperative() {
    let cfs = default_sweep(Discipline::Cooperative).unwrap();
    let ghost = default_sweep(Discipline::Preemptive).unwrap();
    assert!(
        ghost.max() >= cfs.max() * 10,
        "GHOST MAX {} NOT 10X CFS MAX {}",
        ghost.max(),
        cfs.max()
    );
}

#[test]
fn every_ghost_variant_is_strictly_increasing() {
    for (key, s) in scenario::GHOST_VARIANTS.iter() {
        let spec = (s.build)().unwrap_or_else(|e| panic!("{} FAILED TO BUILD: {}", key, e));
        assert!(strictly_increasing(spec.sweep()), "{} NOT STRICTLY INCREASING", key);
    }
}

// === BOUNDARY DEDUPE ===

#[test]
fn overlapping_endpoint_emitted_once() {
    // COARSE ENDS ON 250K, FINE STARTS ON 250K
    let s = coarse_to_fine(
        Band::new(50_000, 300_000, 50_000),
        Band::new(250_000, 320_000, 10_000),
    )
    .unwrap();
    assert_eq!(
        s.points(),
        &[50_000, 100_000, 150_000, 200_000, 250_000, 260_000, 270_000, 280_000, 290_000, 300_000, 310_000]
    );
}

#[test]
fn overlapping_bands_drop_everything_already_covered() {
    let s = plan(&[Band::new(100, 1_000, 100), Band::new(500, 1_200, 50)]).unwrap();
    assert!(strictly_increasing(&s));
    assert_eq!(s.iter().filter(|&p| p == 900).count(), 1);
    assert_eq!(s.iter().find(|&p| p > 900), Some(950));
    assert_eq!(s.max(), 1_150);
}

#[test]
fn three_band_refinement() {
    let s = plan(&[
        Band::new(10_000, 250_000, 10_000),
        Band::new(250_000, 285_000, 2_500),
        Band::new(285_000, 286_000, 100),
    ])
    .unwrap();
    assert!(strictly_increasing(&s));
    assert_eq!(s.len(), 24 + 14 + 10);
    assert_eq!(s.max(), 285_900);
}

// === REJECTED BANDS ===

#[test]
fn zero_step_rejected() {
    let err = plan(&[Band::new(10, 100, 0)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn zero_start_rejected() {
    assert!(plan(&[Band::new(0, 100, 10)]).is_err());
}

#[test]
fn empty_band_rejected() {
    assert!(plan(&[Band::new(100, 100, 10)]).is_err());
    assert!(plan(&[]).is_err());
}

#[test]
fn out_of_order_bands_rejected() {
    assert!(plan(&[Band::new(1_000, 2_000, 100), Band::new(500, 3_000, 100)]).is_err());
}

#[test]
fn from_points_rejects_duplicates() {
    assert!(ThroughputSweep::from_points(vec![10, 20, 20, 30]).is_err());
    assert!(ThroughputSweep::from_points(vec![10, 20, 30]).is_ok());
}

#[test]
fn band_near_u64_max_terminates() {
    let b = Band::new(u64::MAX - 10, u64::MAX, 7);
    assert_eq!(b.points().collect::<Vec<_>>(), vec![u64::MAX - 10, u64::MAX - 3]);
}
