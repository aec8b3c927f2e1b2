// PREFLIGHT CHECK
// RUNS AFTER VALIDATION AND BEFORE THE FIRST DISPATCH. A FAILURE HERE MEANS
// NO EXPERIMENT STARTS.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Result};

use shinjuku::runner::Binaries;
use shinjuku::Discipline;

const KERNEL_CONFIG: &str = "/proc/config.gz";
const GHOST_CONFIG_KEY: &str = "CONFIG_SCHED_CLASS_GHOST=y";

fn check_binary(label: &str, path: &Path) -> bool {
    if path.is_file() {
        println!("  {:<24}OK ({})", label, path.display());
        true
    } else {
        println!("  {:<24}MISSING ({})", label, path.display());
        false
    }
}

// NO READABLE CONFIG IS A SKIP, NOT A FAILURE
fn check_kernel_config() -> bool {
    let file = match std::fs::File::open(KERNEL_CONFIG) {
        Ok(f) => f,
        Err(_) => {
            println!("  {:<24}NOT FOUND (SKIPPED)", KERNEL_CONFIG);
            return true;
        }
    };
    let mut decoder = flate2::read::GzDecoder::new(file);
    let mut config = String::new();
    if decoder.read_to_string(&mut config).is_err() {
        println!("  {:<24}UNREADABLE (SKIPPED)", KERNEL_CONFIG);
        return true;
    }
    let found = config.lines().any(|l| l.trim() == GHOST_CONFIG_KEY);
    if found {
        println!("  {:<24}OK", "CONFIG_SCHED_CLASS_GHOST");
    } else {
        println!("  {:<24}NOT FOUND -- ghost experiments cannot run", "CONFIG_SCHED_CLASS_GHOST");
    }
    found
}

pub fn run_check(disciplines: &[Discipline], bins: &Binaries, antagonist: bool) -> Result<()> {
    println!("SHINJUKU PREFLIGHT");

    let mut ok = check_binary("workload", &bins.rocksdb);
    if antagonist {
        ok &= check_binary("antagonist", &bins.antagonist);
    }
    if disciplines.contains(&Discipline::Preemptive) {
        ok &= check_binary("ghost agent", &bins.agent);
        ok &= check_kernel_config();
    }
    println!();

    if !ok {
        bail!("PREFLIGHT FAILED -- NO EXPERIMENTS DISPATCHED");
    }
    Ok(())
}
