// SHINJUKU RUNNERS
// THE RUNNER IS THE EXTERNAL COLLABORATOR THAT ACTUALLY DRIVES THE BENCHMARK.
// ONE run() CALL PER SPEC; IT BLOCKS UNTIL EVERY THROUGHPUT POINT IS DONE.
// POINTS RUN STRICTLY ONE AT A TIME: OVERLAP WOULD CONTAMINATE CPU/QUEUE STATE.

use std::io::Write;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use crate::antagonist::AntagonistConfig;
use crate::discipline::Discipline;
use crate::duration;
use crate::ghost::SchedulerOptions;
use crate::spec::ExperimentSpec;
use crate::workload::WorkloadConfig;

pub const DEFAULT_ROCKSDB_BIN: &str = "bazel-bin/rocksdb";
pub const DEFAULT_AGENT_BIN: &str = "bazel-bin/agent_shinjuku";
pub const DEFAULT_ANTAGONIST_BIN: &str = "bazel-bin/antagonist";

// TIME FOR THE AGENT TO TAKE OVER ITS CPUS BEFORE LOAD ARRIVES
const AGENT_SETTLE: Duration = Duration::from_secs(1);
// SIGINT -> SIGKILL GRACE PERIOD FOR HELPER PROCESS GROUPS
const STOP_GRACE: Duration = Duration::from_millis(500);

pub trait Runner {
    fn run(&mut self, spec: &ExperimentSpec) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct Binaries {
    pub rocksdb: PathBuf,
    pub agent: PathBuf,
    pub antagonist: PathBuf,
}

impl Default for Binaries {
    fn default() -> Self {
        Self {
            rocksdb: PathBuf::from(DEFAULT_ROCKSDB_BIN),
            agent: PathBuf::from(DEFAULT_AGENT_BIN),
            antagonist: PathBuf::from(DEFAULT_ANTAGONIST_BIN),
        }
    }
}

// ---------------------------------------------------------------------------
// ARGV RENDERING
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PointCommands {
    pub agent: Option<Vec<String>>,
    pub antagonist: Option<Vec<String>>,
    pub workload: Vec<String>,
}

pub fn point_commands(spec: &ExperimentSpec, throughput: u64) -> PointCommands {
    PointCommands {
        agent: spec.scheduler().map(agent_args),
        antagonist: spec.antagonist().map(|a| antagonist_args(a, spec.discipline())),
        workload: workload_args(spec.workload(), throughput),
    }
}

fn flag(args: &mut Vec<String>, name: &str, value: impl ToString) {
    args.push(format!("--{}", name));
    args.push(value.to_string());
}

fn workload_args(w: &WorkloadConfig, throughput: u64) -> Vec<String> {
    let mut args = Vec::with_capacity(24);
    flag(&mut args, "print_format", w.print_format.flag());
    if w.emit_ns {
        args.push("--print_ns".to_string());
    }
    flag(&mut args, "throughput", throughput);
    flag(&mut args, "range_query_ratio", w.range_query_ratio);
    flag(&mut args, "num_workers", w.worker_count);
    flag(&mut args, "get_duration", duration::format(w.short_op_duration));
    flag(&mut args, "range_duration", duration::format(w.range_op_duration));
    flag(&mut args, "experiment_duration", duration::format(w.experiment_duration));
    flag(&mut args, "discard_duration", duration::format(w.discard_duration));
    flag(&mut args, "scheduler", w.discipline.token());
    args
}

fn agent_args(s: &SchedulerOptions) -> Vec<String> {
    let mut args = Vec::with_capacity(4);
    flag(&mut args, "ghost_cpus", s.cpu_list());
    flag(&mut args, "preemption_time_slice", duration::format(s.preemption_time_slice));
    args
}

fn antagonist_args(a: &AntagonistConfig, discipline: Discipline) -> Vec<String> {
    let mut args = Vec::with_capacity(8);
    flag(&mut args, "work_share", a.work_share);
    flag(&mut args, "num_threads", a.thread_count);
    flag(&mut args, "experiment_duration", duration::format(a.experiment_duration));
    flag(&mut args, "scheduler", discipline.token());
    args
}

// ---------------------------------------------------------------------------
// DRY RUN
// ---------------------------------------------------------------------------

// PRINTS WHAT WOULD BE EXECUTED, ONE BLOCK PER THROUGHPUT POINT
pub struct DryRunner<W: Write> {
    out: W,
    bins: Binaries,
}

impl<W: Write> DryRunner<W> {
    pub fn new(out: W, bins: Binaries) -> Self {
        Self { out, bins }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn render(bin: &Path, args: &[String]) -> String {
    format!("{} {}", bin.display(), args.join(" "))
}

impl<W: Write> Runner for DryRunner<W> {
    fn run(&mut self, spec: &ExperimentSpec) -> Result<()> {
        let total = spec.sweep().len();
        writeln!(
            self.out,
            "# {} ({}) -- {} POINTS, {}..={} REQ/S",
            spec.name(),
            spec.discipline().label(),
            total,
            spec.sweep().first(),
            spec.sweep().max()
        )?;
        for (i, tput) in spec.sweep().iter().enumerate() {
            let cmds = point_commands(spec, tput);
            writeln!(self.out, "[{}/{}]", i + 1, total)?;
            if let Some(args) = &cmds.agent {
                writeln!(self.out, "  agent:      {}", render(&self.bins.agent, args))?;
            }
            if let Some(args) = &cmds.antagonist {
                writeln!(self.out, "  antagonist: {}", render(&self.bins.antagonist, args))?;
            }
            writeln!(self.out, "  workload:   {}", render(&self.bins.rocksdb, &cmds.workload))?;
        }
        self.out.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PROCESS RUNNER
// ---------------------------------------------------------------------------

// HELPER PROCESS (AGENT OR ANTAGONIST) IN ITS OWN PROCESS GROUP.
// TORN DOWN ON DROP SO EVERY EXIT PATH CLEANS UP.
struct ProcGuard {
    child: Option<Child>,
    pgid: i32,
    label: &'static str,
}

impl ProcGuard {
    fn spawn(label: &'static str, bin: &Path, args: &[String]) -> Result<Self> {
        debug!(helper = label, argv = ?args, "spawning {}", bin.display());
        let child = Command::new(bin)
            .args(args)
            .process_group(0)
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("FAILED TO START {} ({})", label, bin.display()))?;
        let pgid = child.id() as i32;
        Ok(Self { child: Some(child), pgid, label })
    }

    // POLLS WITHOUT BLOCKING. A REAPED HELPER IS FORGOTTEN SO DROP SKIPS IT.
    fn exited(&mut self) -> Result<Option<ExitStatus>> {
        let child = match self.child.as_mut() {
            Some(c) => c,
            None => bail!("{} ALREADY STOPPED", self.label),
        };
        let status = child
            .try_wait()
            .with_context(|| format!("FAILED TO POLL {}", self.label))?;
        if status.is_some() {
            self.child = None;
        }
        Ok(status)
    }

    // A HELPER THAT HAS ALREADY EXITED NO LONGER ENFORCES ANYTHING
    fn ensure_running(&mut self) -> Result<()> {
        match self.exited()? {
            None => Ok(()),
            Some(status) => bail!("{} EXITED EARLY ({})", self.label, status),
        }
    }

    // END-OF-POINT TEARDOWN. ERRORS IF THE HELPER DIED DURING THE POINT.
    fn finish(mut self) -> Result<()> {
        self.ensure_running()?;
        self.stop();
        Ok(())
    }

    fn stop(&mut self) {
        let mut child = match self.child.take() {
            Some(c) => c,
            None => return,
        };
        if let Ok(Some(status)) = child.try_wait() {
            warn!(helper = self.label, %status, "helper exited before teardown");
            return;
        }
        unsafe { libc::killpg(self.pgid, libc::SIGINT); }
        let deadline = Instant::now() + STOP_GRACE;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) if Instant::now() >= deadline => break,
                Ok(None) => std::thread::sleep(Duration::from_millis(50)),
                Err(_) => break,
            }
        }
        unsafe { libc::killpg(self.pgid, libc::SIGKILL); }
        let _ = child.wait();
    }
}

impl Drop for ProcGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct ProcessRunner<'a> {
    bins: Binaries,
    shutdown: &'a AtomicBool,
}

impl<'a> ProcessRunner<'a> {
    pub fn new(bins: Binaries, shutdown: &'a AtomicBool) -> Self {
        Self { bins, shutdown }
    }

    fn run_point(&self, spec: &ExperimentSpec, throughput: u64) -> Result<()> {
        let cmds = point_commands(spec, throughput);

        // DECLARATION ORDER MATTERS: ON AN ERROR PATH THE GUARDS DROP
        // ANTAGONIST FIRST, AGENT LAST
        let agent = match &cmds.agent {
            Some(args) => {
                let mut guard = ProcGuard::spawn("AGENT", &self.bins.agent, args)?;
                std::thread::sleep(AGENT_SETTLE);
                guard.ensure_running()?;
                Some(guard)
            }
            None => None,
        };
        let antagonist = match &cmds.antagonist {
            Some(args) => Some(ProcGuard::spawn("ANTAGONIST", &self.bins.antagonist, args)?),
            None => None,
        };

        debug!(argv = ?cmds.workload, "running {}", self.bins.rocksdb.display());
        let status = Command::new(&self.bins.rocksdb)
            .args(&cmds.workload)
            .stdin(Stdio::null())
            .status()
            .with_context(|| {
                format!("FAILED TO START WORKLOAD ({})", self.bins.rocksdb.display())
            })?;

        if !status.success() {
            bail!("WORKLOAD EXITED WITH {} AT {} REQ/S", status, throughput);
        }

        // THE ANTAGONIST RUNS FOR ITS OWN FIXED DURATION AND MAY FINISH
        // CLEANLY FIRST. ONLY A FAILED EXIT SPOILS THE POINT.
        if let Some(mut guard) = antagonist {
            match guard.exited()? {
                None => guard.stop(),
                Some(status) if status.success() => {}
                Some(status) => {
                    bail!("ANTAGONIST EXITED WITH {} AT {} REQ/S", status, throughput)
                }
            }
        }
        // THE AGENT MUST OUTLIVE THE WORKLOAD, WHATEVER ITS EXIT STATUS
        if let Some(guard) = agent {
            guard
                .finish()
                .with_context(|| format!("NO PREEMPTION ENFORCED AT {} REQ/S", throughput))?;
        }
        Ok(())
    }
}

impl Runner for ProcessRunner<'_> {
    fn run(&mut self, spec: &ExperimentSpec) -> Result<()> {
        let sep = "=".repeat(60);
        let total = spec.sweep().len();
        println!("{}", sep);
        println!("EXPERIMENT:  {} ({})", spec.name(), spec.discipline().label());
        println!("WORKERS:     {} ON {} CPUS", spec.workload().worker_count, spec.workload().cpu_budget);
        if let Some(s) = spec.scheduler() {
            println!("TIME SLICE:  {}", duration::format(s.preemption_time_slice));
        }
        println!("POINTS:      {} ({}..={} REQ/S)", total, spec.sweep().first(), spec.sweep().max());
        println!("{}", sep);

        for (i, tput) in spec.sweep().iter().enumerate() {
            if self.shutdown.load(Ordering::Relaxed) {
                warn!(experiment = spec.name(), completed = i, total, "sweep interrupted");
                bail!("INTERRUPTED BEFORE {} REQ/S ({}/{} POINTS DONE)", tput, i, total);
            }
            println!("THROUGHPUT {} REQ/S ({}/{})", tput, i + 1, total);
            self.run_point(spec, tput)
                .with_context(|| format!("{} FAILED AT POINT {}/{}", spec.name(), i + 1, total))?;
        }
        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario;

    fn value_of<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
        let key = format!("--{}", name);
        args.iter()
            .position(|a| *a == key)
            .and_then(|i| args.get(i + 1))
            .map(|s| s.as_str())
    }

    #[test]
    fn cfs_point_runs_workload_only() {
        let spec = scenario::cfs().unwrap();
        let cmds = point_commands(&spec, 52_000);
        assert!(cmds.agent.is_none());
        assert!(cmds.antagonist.is_none());
        assert_eq!(value_of(&cmds.workload, "throughput"), Some("52000"));
        assert_eq!(value_of(&cmds.workload, "num_workers"), Some("19"));
        assert_eq!(value_of(&cmds.workload, "range_query_ratio"), Some("0.005"));
        assert_eq!(value_of(&cmds.workload, "get_duration"), Some("10us"));
        assert_eq!(value_of(&cmds.workload, "range_duration"), Some("5ms"));
        assert_eq!(value_of(&cmds.workload, "scheduler"), Some("cfs"));
        assert!(!cmds.workload.iter().any(|a| a == "--print_ns"));
    }

    #[test]
    fn ghost_point_starts_agent_with_slice() {
        let spec = scenario::ghost_bimodal_5us().unwrap();
        let cmds = point_commands(&spec, 260_000);
        let agent = cmds.agent.expect("ghost point needs an agent");
        assert_eq!(value_of(&agent, "ghost_cpus"), Some("0-20"));
        assert_eq!(value_of(&agent, "preemption_time_slice"), Some("5us"));
        assert_eq!(value_of(&cmds.workload, "num_workers"), Some("200"));
        assert_eq!(value_of(&cmds.workload, "get_duration"), Some("1us"));
        assert_eq!(value_of(&cmds.workload, "experiment_duration"), Some("10s"));
        assert_eq!(value_of(&cmds.workload, "scheduler"), Some("ghost"));
        assert!(cmds.workload.iter().any(|a| a == "--print_ns"));
    }

    #[test]
    fn sub_microsecond_op_renders_in_ns() {
        let spec = scenario::ghost_sub_us().unwrap();
        let cmds = point_commands(&spec, 100_000);
        assert_eq!(value_of(&cmds.workload, "get_duration"), Some("500ns"));
    }

    #[test]
    fn csv_override_reaches_argv() {
        let o = crate::spec::Overrides {
            print_format: Some(crate::workload::PrintFormat::Csv),
            ..Default::default()
        };
        let spec = scenario::cfs().unwrap().with_overrides(&o).unwrap();
        let cmds = point_commands(&spec, 10_000);
        assert_eq!(value_of(&cmds.workload, "print_format"), Some("csv"));
    }

    #[test]
    fn dry_runner_prints_every_point() {
        let spec = scenario::cfs().unwrap();
        let mut runner = DryRunner::new(Vec::new(), Binaries::default());
        runner.run(&spec).unwrap();
        let out = String::from_utf8(runner.into_inner()).unwrap();
        let workload_lines = out.lines().filter(|l| l.trim_start().starts_with("workload:")).count();
        assert_eq!(workload_lines, spec.sweep().len());
        assert!(out.contains("--throughput 10000 "));
        assert!(out.contains("--throughput 80000 "));
        assert!(!out.contains("agent:"));
    }

    #[test]
    fn process_runner_stops_before_first_point_when_shutdown_is_set() {
        let shutdown = AtomicBool::new(true);
        let bins = Binaries {
            rocksdb: PathBuf::from("/nonexistent/rocksdb"),
            ..Binaries::default()
        };
        let mut runner = ProcessRunner::new(bins, &shutdown);
        let err = runner.run(&scenario::cfs().unwrap()).unwrap_err();
        assert!(err.to_string().contains("INTERRUPTED"));
    }

    #[test]
    fn process_runner_reports_missing_workload_binary() {
        let shutdown = AtomicBool::new(false);
        let bins = Binaries {
            rocksdb: PathBuf::from("/nonexistent/rocksdb"),
            ..Binaries::default()
        };
        let mut runner = ProcessRunner::new(bins, &shutdown);
        let err = runner.run(&scenario::cfs().unwrap()).unwrap_err();
        assert!(format!("{:#}", err).contains("FAILED TO START WORKLOAD"));
    }

    #[test]
    fn dead_agent_fails_the_point_before_load() {
        let shutdown = AtomicBool::new(false);
        let bins = Binaries {
            rocksdb: PathBuf::from("/bin/true"),
            agent: PathBuf::from("/bin/false"),
            ..Binaries::default()
        };
        let mut runner = ProcessRunner::new(bins, &shutdown);
        let err = runner.run(&scenario::ghost_bimodal_5us().unwrap()).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("AGENT EXITED EARLY"), "{}", msg);
        assert!(msg.contains("FAILED AT POINT 1/"), "{}", msg);
    }

    #[test]
    fn helper_that_exited_cleanly_still_fails_finish() {
        let mut guard = ProcGuard::spawn("AGENT", Path::new("/bin/true"), &[]).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while guard.child.as_mut().unwrap().try_wait().unwrap().is_none() {
            assert!(Instant::now() < deadline, "/bin/true never exited");
            std::thread::sleep(Duration::from_millis(10));
        }
        let err = guard.finish().unwrap_err();
        assert!(err.to_string().contains("AGENT EXITED EARLY"), "{}", err);
    }

    #[test]
    fn live_helper_finishes_cleanly() {
        let args = ["30".to_string()];
        let guard = ProcGuard::spawn("AGENT", Path::new("/bin/sleep"), &args).unwrap();
        let start = Instant::now();
        guard.finish().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
