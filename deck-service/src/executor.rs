//! Solver subprocess launcher
//!
//! The solver runs out of process with the deck as its only input. The
//! launcher expands a command template, starts the child without a shell,
//! sends its output to log files in the working directory and polls it to
//! completion, killing it if the cancellation flag is raised.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fea_model::error::{FEAError, FEAResult};
use uuid::Uuid;

use crate::dialects::DialectKind;

/// Command line of a solver with `{exe}`, `{name}`, `{deck}`, `{cpus}` and
/// `{license}` placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<String>,
    /// Appended only when a license tag is given
    pub license_args: Vec<String>,
}

impl CommandTemplate {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            license_args: Vec::new(),
        }
    }

    pub fn with_license_args(mut self, args: &[&str]) -> Self {
        self.license_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Conventional invocation of each solver
    pub fn for_dialect(kind: DialectKind) -> Self {
        match kind {
            // ccx takes the job name without extension
            DialectKind::Abaqus => Self::new("{exe}", &["-i", "{name}"]),
            DialectKind::Ansys => Self::new(
                "{exe}",
                &["-b", "-np", "{cpus}", "-i", "{deck}", "-o", "{name}.out"],
            )
            .with_license_args(&["-p", "{license}"]),
            DialectKind::OpenSees => Self::new("{exe}", &["{deck}"]),
            DialectKind::Sofistik => Self::new("{exe}", &["-b", "{deck}"]),
        }
    }

    /// Program and arguments with every placeholder filled in
    pub fn expand(&self, job: &Job) -> (String, Vec<String>) {
        let deck = job
            .deck
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let license = job.license.clone().unwrap_or_default();
        let fill = |s: &str| {
            s.replace("{exe}", &job.exe)
                .replace("{name}", &job.name)
                .replace("{deck}", &deck)
                .replace("{cpus}", &job.cpus.to_string())
                .replace("{license}", &license)
        };

        let mut args: Vec<String> = self.args.iter().map(|a| fill(a)).collect();
        if job.license.is_some() {
            args.extend(self.license_args.iter().map(|a| fill(a)));
        }
        (fill(&self.program), args)
    }
}

/// One solver run
#[derive(Debug, Clone)]
pub struct Job {
    /// Solver executable
    pub exe: String,
    /// Model name, used as the job name
    pub name: String,
    /// Deck inside `workdir`
    pub deck: PathBuf,
    pub workdir: PathBuf,
    pub cpus: usize,
    pub license: Option<String>,
}

impl Job {
    pub fn stdout_log(&self) -> PathBuf {
        self.workdir.join(format!("{}.stdout.log", self.name))
    }

    pub fn stderr_log(&self) -> PathBuf {
        self.workdir.join(format!("{}.stderr.log", self.name))
    }
}

pub struct Launcher {
    template: CommandTemplate,
    poll_interval: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl Launcher {
    pub fn new(template: CommandTemplate) -> Self {
        Self {
            template,
            poll_interval: Duration::from_millis(50),
            cancel: None,
        }
    }

    /// Kill the child and delete its working directory once `flag` is set
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Run `job` to completion; a non-zero exit is an `AnalysisFailed`
    pub fn run(&self, job: &Job) -> FEAResult<()> {
        let run_id = Uuid::new_v4();
        let (program, args) = self.template.expand(job);
        tracing::info!(
            "Starting solver run {} in {:?}: {} {}",
            run_id,
            job.workdir,
            program,
            args.join(" ")
        );

        if self.cancelled() {
            discard(&job.workdir);
            return Err(FEAError::AnalysisFailed(format!("run {run_id} cancelled")));
        }

        let stdout = File::create(job.stdout_log())?;
        let stderr = File::create(job.stderr_log())?;
        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(&job.workdir)
            .env("OMP_NUM_THREADS", job.cpus.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| FEAError::AnalysisFailed(format!("failed to start {program}: {e}")))?;

        let status: ExitStatus = loop {
            if self.cancelled() {
                tracing::warn!("Solver run {} cancelled, killing pid {}", run_id, child.id());
                let _ = child.kill();
                let _ = child.wait();
                discard(&job.workdir);
                return Err(FEAError::AnalysisFailed(format!("run {run_id} cancelled")));
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    let _ = child.kill();
                    return Err(FEAError::AnalysisFailed(format!("lost track of {program}: {e}")));
                }
            }
        };

        if !status.success() {
            let stdout = read_log(&job.stdout_log());
            let stderr = read_log(&job.stderr_log());
            tracing::error!("Solver failed. Stderr: {}\nStdout: {}", stderr, stdout);
            return Err(FEAError::AnalysisFailed(format!(
                "{program} exited with {status}. Check {:?}.",
                job.stderr_log()
            )));
        }

        tracing::info!("Solver run {} finished", run_id);
        Ok(())
    }
}

fn read_log(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

fn discard(workdir: &Path) {
    if let Err(err) = fs::remove_dir_all(workdir) {
        tracing::warn!("Failed to remove scratch directory {:?}: {}", workdir, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(workdir: &Path) -> Job {
        Job {
            exe: "ccx".to_string(),
            name: "tower".to_string(),
            deck: workdir.join("tower.inp"),
            workdir: workdir.to_path_buf(),
            cpus: 4,
            license: None,
        }
    }

    #[test]
    fn test_expand_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let mut j = job(dir.path());
        let (program, args) = CommandTemplate::for_dialect(DialectKind::Abaqus).expand(&j);
        assert_eq!(program, "ccx");
        assert_eq!(args, vec!["-i", "tower"]);

        j.exe = "ansys231".to_string();
        j.deck = dir.path().join("tower.txt");
        let template = CommandTemplate::for_dialect(DialectKind::Ansys);
        let (_, args) = template.expand(&j);
        assert!(!args.contains(&"-p".to_string()));
        assert_eq!(args[2], "4");
        assert_eq!(args[4], "tower.txt");

        j.license = Some("ansys".to_string());
        let (_, args) = template.expand(&j);
        assert_eq!(&args[args.len() - 2..], ["-p", "ansys"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_run() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::new(CommandTemplate::new("true", &[]));
        launcher.run(&job(dir.path())).unwrap();
        assert!(dir.path().join("tower.stdout.log").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_analysis_failed() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::new(CommandTemplate::new("false", &[]));
        let err = launcher.run(&job(dir.path())).unwrap_err();
        assert!(matches!(err, FEAError::AnalysisFailed(_)));
    }

    #[test]
    fn test_missing_program_is_analysis_failed() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::new(CommandTemplate::new("no-such-solver-on-path", &[]));
        let err = launcher.run(&job(dir.path())).unwrap_err();
        assert!(matches!(err, FEAError::AnalysisFailed(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_kills_child_and_removes_scratch() {
        let root = tempfile::tempdir().unwrap();
        let workdir = root.path().join("scratch");
        fs::create_dir_all(&workdir).unwrap();

        let flag = Arc::new(AtomicBool::new(false));
        let launcher = Launcher::new(CommandTemplate::new("sleep", &["30"]))
            .with_cancel(flag.clone())
            .with_poll_interval(Duration::from_millis(10));
        let setter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            flag.store(true, Ordering::SeqCst);
        });

        let err = launcher.run(&job(&workdir)).unwrap_err();
        setter.join().unwrap();
        assert!(matches!(err, FEAError::AnalysisFailed(msg) if msg.contains("cancelled")));
        assert!(!workdir.exists());
    }
}
