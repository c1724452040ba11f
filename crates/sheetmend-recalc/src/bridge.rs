//! Child process management and artifact polling for the recalculation
//! engine.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Deserialize;
use sheetmend_core::{CellError, CellLocation};

use crate::error::{RecalcError, Result};
use crate::script;

/// Monotonic tag so concurrent bridge runs in one process never collide on
/// artifact names.
static NEXT_RUN: AtomicU64 = AtomicU64::new(1);

/// Configuration for the recalculation bridge.
#[derive(Debug, Clone)]
pub struct RecalcConfig {
    /// Path to the engine executable. If None, uses "soffice" from PATH.
    pub engine_path: Option<PathBuf>,

    /// Arguments passed to the engine ahead of the script path.
    pub engine_args: Vec<String>,

    /// Hard wall-clock timeout for one recalculation attempt.
    pub timeout: Duration,

    /// Initial delay between artifact polls.
    pub poll_start: Duration,

    /// Ceiling for the poll delay as it backs off.
    pub poll_cap: Duration,

    /// Directory for transient script/artifact files. If None, uses the
    /// system temp directory.
    pub work_dir: Option<PathBuf>,
}

impl Default for RecalcConfig {
    fn default() -> Self {
        Self {
            engine_path: None,
            engine_args: vec!["--headless".to_string(), "--norestore".to_string()],
            timeout: Duration::from_secs(30),
            poll_start: Duration::from_millis(50),
            poll_cap: Duration::from_secs(1),
            work_dir: None,
        }
    }
}

/// One error cell the engine reported after a true recalculation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecalcFinding {
    /// Where the error surfaced
    pub location: CellLocation,
    /// Which error literal the cell displayed
    pub error: CellError,
}

/// The harvested result of one recalculation run.
#[derive(Debug, Clone, Default)]
pub struct RecalcOutcome {
    /// Formula cells the engine inspected
    pub total_formulas: usize,
    /// Error cells, in the order the engine walked them
    pub findings: Vec<RecalcFinding>,
}

/// Wire shape of the engine's output artifact.
#[derive(Debug, Deserialize)]
struct Artifact {
    total_formulas: usize,
    #[serde(default)]
    errors: Vec<ArtifactError>,
}

#[derive(Debug, Deserialize)]
struct ArtifactError {
    cell: String,
    value: String,
}

/// The external recalculation bridge.
///
/// Each [`recalculate`](RecalcBridge::recalculate) call owns one engine
/// child process for its duration. The child and both transient files
/// (script and output artifact) are torn down on every exit path, success
/// or failure; a timed-out child is killed and reaped before the call
/// returns.
#[derive(Debug, Default)]
pub struct RecalcBridge {
    config: RecalcConfig,
}

impl RecalcBridge {
    /// Create a bridge with the given configuration.
    pub fn new(config: RecalcConfig) -> Self {
        Self { config }
    }

    /// The configured timeout, exposed so callers can report degradations.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Force a true recalculation of the workbook at `path` and harvest its
    /// error cells.
    pub fn recalculate(&self, path: &Path) -> Result<RecalcOutcome> {
        let work_dir = self
            .config
            .work_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        let run_id = NEXT_RUN.fetch_add(1, Ordering::Relaxed);
        let script_path = work_dir.join(format!(
            "sheetmend-recalc-{}-{}.bas",
            std::process::id(),
            run_id
        ));
        let output_path = script_path.with_extension("json");

        std::fs::write(&script_path, script::render(path, &output_path))?;

        // Owns the child and both transient files; Drop kills, reaps, and
        // deletes no matter how this function returns.
        let mut run = RunGuard {
            child: None,
            files: vec![script_path.clone(), output_path.clone()],
        };

        let engine = self
            .config
            .engine_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("soffice"));

        let mut cmd = Command::new(&engine);
        cmd.args(&self.config.engine_args)
            .arg(&script_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        tracing::debug!(engine = %engine.display(), workbook = %path.display(), "spawning recalculation engine");
        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RecalcError::EngineNotFound(engine.display().to_string())
            } else {
                RecalcError::SpawnFailed(e)
            }
        })?;
        run.child = Some(child);

        self.wait_for_artifact(&mut run, &output_path)?;

        let raw = std::fs::read_to_string(&output_path)?;
        let artifact: Artifact = serde_json::from_str(&raw)?;
        let outcome = parse_artifact(artifact)?;

        tracing::debug!(
            total_formulas = outcome.total_formulas,
            errors = outcome.findings.len(),
            "recalculation complete"
        );
        Ok(outcome)
    }

    /// Poll for the output artifact with capped exponential backoff until it
    /// appears, the engine dies without it, or the timeout elapses.
    fn wait_for_artifact(&self, run: &mut RunGuard, output_path: &Path) -> Result<()> {
        let start = Instant::now();
        let mut delay = self.config.poll_start;

        loop {
            if output_path.exists() {
                return Ok(());
            }

            if let Some(child) = run.child.as_mut() {
                if let Some(status) = child.try_wait()? {
                    // The file may have landed between the check above and
                    // the exit.
                    if output_path.exists() {
                        return Ok(());
                    }
                    return Err(RecalcError::EngineExited(status.to_string()));
                }
            }

            if start.elapsed() >= self.config.timeout {
                tracing::warn!(
                    timeout_secs = self.config.timeout.as_secs(),
                    "recalculation engine timed out; killing child"
                );
                return Err(RecalcError::Timeout(self.config.timeout.as_secs()));
            }

            std::thread::sleep(delay);
            delay = (delay * 2).min(self.config.poll_cap);
        }
    }
}

/// Convert the wire artifact into a validated outcome.
fn parse_artifact(artifact: Artifact) -> Result<RecalcOutcome> {
    let mut findings = Vec::with_capacity(artifact.errors.len());
    for entry in artifact.errors {
        let location = CellLocation::parse(&entry.cell).map_err(|e| {
            RecalcError::MalformedOutput(format!("bad cell '{}': {}", entry.cell, e))
        })?;
        let error = CellError::parse(&entry.value).ok_or_else(|| {
            RecalcError::MalformedOutput(format!("unknown error literal '{}'", entry.value))
        })?;
        findings.push(RecalcFinding { location, error });
    }

    Ok(RecalcOutcome {
        total_formulas: artifact.total_formulas,
        findings,
    })
}

/// Owns the engine child and the transient files for one run.
struct RunGuard {
    child: Option<Child>,
    files: Vec<PathBuf>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
        for file in &self.files {
            let _ = std::fs::remove_file(file);
        }
    }
}
