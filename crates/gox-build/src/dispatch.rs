//! Parallel build dispatch.
//!
//! One [`BuildTask`] is created per (platform, package) pair up front. Tasks
//! run on a dedicated thread pool whose size is the concurrency bound, so no
//! more than `bound` compiler processes are ever alive at once. Each task
//! returns its own [`TaskOutcome`]; the outcomes are folded into a
//! [`BuildReport`] once every task has finished. A failed task never stops
//! or delays the others, and nothing is retried.

use std::fmt;
use std::num::NonZeroUsize;
use std::thread;

use gox_platform::{Platform, PlatformSet};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

use crate::error::{BuildError, Result};
use crate::template::{render_template, TemplateData};
use crate::toolchain::{binary_path, Compiler};

/// Concurrency bound for a requested parallelism.
///
/// Zero or negative means one build per available CPU.
pub fn resolve_bound(parallel: i64) -> usize {
    if parallel > 0 {
        return usize::try_from(parallel).unwrap_or(usize::MAX);
    }
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// One package to build for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTask {
    pub package: String,
    pub platform: Platform,
}

impl fmt::Display for BuildTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.platform, self.package)
    }
}

/// A build that did not produce a binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub platform: Platform,
    pub package: String,
    pub message: String,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}: {}", self.platform, self.package, self.message)
    }
}

/// Terminal state of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded(BuildTask),
    Failed(TaskFailure),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded(_))
    }
}

/// Result of a whole dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Concurrency bound that was in effect.
    pub bound: usize,
    /// Number of tasks dispatched.
    pub total: usize,
    /// Number of tasks that succeeded.
    pub succeeded: usize,
    /// Every failed task.
    pub failures: Vec<TaskFailure>,
}

impl BuildReport {
    fn new(bound: usize, total: usize) -> Self {
        Self {
            bound,
            total,
            ..Self::default()
        }
    }

    fn record(mut self, outcome: TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Succeeded(_) => self.succeeded += 1,
            TaskOutcome::Failed(failure) => self.failures.push(failure),
        }
        self
    }

    /// True when every task succeeded.
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds the cross product of packages and platforms with bounded parallelism.
pub struct Dispatcher<C> {
    compiler: C,
    bound: usize,
    progress: bool,
}

impl<C: Compiler> Dispatcher<C> {
    /// `parallel <= 0` selects the number of available CPUs.
    pub fn new(compiler: C, parallel: i64) -> Self {
        Self {
            compiler,
            bound: resolve_bound(parallel),
            progress: true,
        }
    }

    /// Do not print a `-->` line per task.
    pub fn quiet(mut self) -> Self {
        self.progress = false;
        self
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Expand packages × platforms, platform-major.
    pub fn tasks(packages: &[String], platforms: &PlatformSet) -> Vec<BuildTask> {
        platforms
            .iter()
            .flat_map(|platform| {
                packages.iter().map(move |package| BuildTask {
                    package: package.clone(),
                    platform: platform.clone(),
                })
            })
            .collect()
    }

    /// Build every package for every platform and wait for all of them.
    ///
    /// `output_template` is rendered per task; a bad template fails each task
    /// rather than the dispatch.
    pub fn run(
        &self,
        packages: &[String],
        platforms: &PlatformSet,
        output_template: &str,
    ) -> Result<BuildReport> {
        let tasks = Self::tasks(packages, platforms);
        let total = tasks.len();
        info!(
            tasks = total,
            packages = packages.len(),
            platforms = platforms.len(),
            bound = self.bound,
            "dispatching builds"
        );

        // Never more workers than tasks; the bound still caps concurrency.
        let workers = self.bound.min(total).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("gox-build-{i}"))
            .build()
            .map_err(|e| BuildError::WorkerPool {
                detail: e.to_string(),
            })?;

        let outcomes: Vec<TaskOutcome> = pool.install(|| {
            tasks
                .into_par_iter()
                .map(|task| self.execute(task, output_template))
                .collect()
        });

        let report = outcomes
            .into_iter()
            .fold(BuildReport::new(self.bound, total), BuildReport::record);
        info!(
            succeeded = report.succeeded,
            failed = report.failures.len(),
            "builds finished"
        );
        Ok(report)
    }

    fn execute(&self, task: BuildTask, output_template: &str) -> TaskOutcome {
        if self.progress {
            println!("--> {task}");
        }
        let result = render_template(
            output_template,
            &TemplateData::for_build(&task.package, &task.platform),
        )
        .map_err(|e| e.to_string())
        .and_then(|rendered| {
            let output = binary_path(&rendered, &task.platform);
            debug!(%task, output = %output.display(), "compiling");
            self.compiler.compile(&task.package, &task.platform, &output)
        });

        match result {
            Ok(()) => TaskOutcome::Succeeded(task),
            Err(message) => {
                debug!(%task, %message, "build failed");
                TaskOutcome::Failed(TaskFailure {
                    platform: task.platform,
                    package: task.package,
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Records concurrency and the outputs it was asked to produce.
    #[derive(Default)]
    struct Recorder {
        running: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        delay: Duration,
        fail: Option<(String, Platform)>,
        outputs: Mutex<Vec<PathBuf>>,
        windows: Mutex<Vec<(Instant, Instant)>>,
    }

    impl Recorder {
        fn slow(ms: u64) -> Self {
            Self {
                delay: Duration::from_millis(ms),
                ..Self::default()
            }
        }
    }

    impl Compiler for Recorder {
        fn compile(
            &self,
            package: &str,
            platform: &Platform,
            output: &Path,
        ) -> std::result::Result<(), String> {
            let start = Instant::now();
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.outputs.lock().unwrap().push(output.to_path_buf());
            let failed = self
                .fail
                .as_ref()
                .is_some_and(|(p, pl)| p == package && pl == platform);
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.windows.lock().unwrap().push((start, Instant::now()));
            if failed {
                Err("undefined: main".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn packages(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn platforms(names: &[&str]) -> PlatformSet {
        names.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn bound_resolution() {
        assert_eq!(resolve_bound(3), 3);
        assert!(resolve_bound(0) >= 1);
        assert!(resolve_bound(-1) >= 1);
        assert_eq!(resolve_bound(-1), resolve_bound(0));
    }

    #[test]
    fn tasks_are_platform_major_cross_product() {
        let tasks = Dispatcher::<Recorder>::tasks(
            &packages(&["a", "b"]),
            &platforms(&["linux/amd64", "darwin/arm64"]),
        );
        let rendered: Vec<String> = tasks.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "linux/amd64: a",
                "linux/amd64: b",
                "darwin/arm64: a",
                "darwin/arm64: b"
            ]
        );
    }

    #[test]
    fn every_task_reaches_a_terminal_state_once() {
        let d = Dispatcher::new(Recorder::default(), 4).quiet();
        let report = d
            .run(
                &packages(&["a", "b", "c"]),
                &platforms(&["linux/386", "linux/amd64", "windows/amd64", "darwin/amd64"]),
                "{{.Dir}}_{{.OS}}_{{.Arch}}",
            )
            .unwrap();
        assert_eq!(report.total, 12);
        assert_eq!(report.succeeded + report.failures.len(), 12);
        assert_eq!(d.compiler().calls.load(Ordering::SeqCst), 12);
        assert!(report.success());
    }

    #[test]
    fn runs_up_to_the_bound_at_once() {
        let d = Dispatcher::new(Recorder::slow(30), 2).quiet();
        let report = d
            .run(
                &packages(&["a", "b", "c", "d"]),
                &platforms(&["linux/amd64", "linux/386"]),
                "{{.Dir}}",
            )
            .unwrap();
        assert_eq!(report.bound, 2);
        assert_eq!(d.compiler().peak.load(Ordering::SeqCst), 2);
        assert_eq!(report.succeeded, 8);
    }

    #[test]
    fn wider_bound_is_reached_but_not_exceeded() {
        let d = Dispatcher::new(Recorder::slow(30), 3).quiet();
        let report = d
            .run(
                &packages(&["a", "b", "c"]),
                &platforms(&["linux/amd64", "linux/386", "darwin/amd64"]),
                "{{.Dir}}",
            )
            .unwrap();
        assert_eq!(report.total, 9);
        assert_eq!(d.compiler().peak.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn bound_of_one_runs_sequentially() {
        let d = Dispatcher::new(Recorder::slow(20), 1).quiet();
        d.run(&packages(&["a", "b", "c"]), &platforms(&["linux/amd64"]), "{{.Dir}}")
            .unwrap();
        assert_eq!(d.compiler().peak.load(Ordering::SeqCst), 1);

        let mut windows = d.compiler().windows.lock().unwrap().clone();
        assert_eq!(windows.len(), 3);
        windows.sort_by_key(|(start, _)| *start);
        for pair in windows.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "execution windows overlap");
        }
    }

    #[test]
    fn one_failure_does_not_affect_the_rest() {
        let recorder = Recorder {
            fail: Some(("b".to_string(), Platform::new("linux", "arm"))),
            ..Recorder::default()
        };
        let d = Dispatcher::new(recorder, 3).quiet();
        let report = d
            .run(
                &packages(&["a", "b"]),
                &platforms(&["linux/amd64", "linux/arm", "darwin/amd64"]),
                "{{.Dir}}_{{.OS}}_{{.Arch}}",
            )
            .unwrap();
        assert!(!report.success());
        assert_eq!(report.succeeded, 5);
        assert_eq!(
            report.failures,
            [TaskFailure {
                platform: Platform::new("linux", "arm"),
                package: "b".to_string(),
                message: "undefined: main".to_string(),
            }]
        );
        assert_eq!(
            report.failures[0].to_string(),
            "linux/arm error: b: undefined: main"
        );
    }

    #[test]
    fn bad_template_fails_every_task_without_aborting() {
        let d = Dispatcher::new(Recorder::default(), 2).quiet();
        let report = d
            .run(
                &packages(&["a", "b"]),
                &platforms(&["linux/amd64", "darwin/amd64"]),
                "{{.Dir}}_{{.Version}}",
            )
            .unwrap();
        assert_eq!(report.total, 4);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failures.len(), 4);
        assert!(report.failures.iter().all(|f| f.message.contains("unknown field")));
        assert_eq!(d.compiler().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn outputs_are_rendered_per_task() {
        let d = Dispatcher::new(Recorder::default(), 1).quiet();
        d.run(
            &packages(&["example.com/tool"]),
            &platforms(&["linux/amd64", "windows/386"]),
            "dist/{{.Dir}}_{{.OS}}_{{.Arch}}",
        )
        .unwrap();
        let mut outputs = d.compiler().outputs.lock().unwrap().clone();
        outputs.sort();
        assert_eq!(
            outputs,
            [
                PathBuf::from("dist/tool_linux_amd64"),
                PathBuf::from("dist/tool_windows_386.exe"),
            ]
        );
    }

    #[test]
    fn nothing_to_build() {
        let d = Dispatcher::new(Recorder::default(), 2).quiet();
        let report = d.run(&[], &platforms(&["linux/amd64"]), "{{.Dir}}").unwrap();
        assert_eq!(report.total, 0);
        assert!(report.success());
    }
}
