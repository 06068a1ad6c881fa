//! Deck writing and the write → run → extract pipeline on [`Structure`]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use fea_model::error::{FEAError, FEAResult};
use fea_model::model::Structure;
use fea_model::results::Results;
use tempfile::TempDir;
use uuid::Uuid;

use crate::dialects::{render_deck, write_input_deck, DeckOptions, DialectKind};
use crate::executor::{CommandTemplate, Job, Launcher};
use crate::extract::extractor_for;

/// Writing solver input decks
pub trait WriteDeck {
    /// Write `{path}/{name}.{ext}` and return its path
    fn write_input_file(&self, kind: DialectKind, options: &DeckOptions) -> FEAResult<PathBuf>;

    /// The deck text, without touching the filesystem
    fn render_input_file(&self, kind: DialectKind, options: &DeckOptions) -> FEAResult<String>;
}

impl WriteDeck for Structure {
    fn write_input_file(&self, kind: DialectKind, options: &DeckOptions) -> FEAResult<PathBuf> {
        write_input_deck(self, kind, options)
    }

    fn render_input_file(&self, kind: DialectKind, options: &DeckOptions) -> FEAResult<String> {
        render_deck(self, kind, options)
    }
}

/// How a solver run is set up
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub dialect: DialectKind,
    pub deck: DeckOptions,
    /// Solver executable, the dialect's conventional command when unset
    pub exe: Option<String>,
    /// Command line, the dialect's conventional one when unset
    pub template: Option<CommandTemplate>,
    pub cpus: usize,
    pub license: Option<String>,
    /// Leave the scratch directory in place after extraction
    pub keep_scratch: bool,
    /// Parent of the scratch directory, the system temp dir when unset
    pub scratch_root: Option<PathBuf>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            dialect: DialectKind::Abaqus,
            deck: DeckOptions::default(),
            exe: None,
            template: None,
            cpus: 1,
            license: None,
            keep_scratch: false,
            scratch_root: None,
            cancel: None,
        }
    }
}

impl AnalysisOptions {
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    fn executable(&self) -> String {
        self.exe
            .clone()
            .unwrap_or_else(|| self.dialect.default_executable().to_string())
    }
}

/// Working directory of one solver run, removed on drop unless kept
pub struct Scratch {
    path: PathBuf,
    guard: Option<TempDir>,
}

impl Scratch {
    fn create(structure: &Structure, options: &AnalysisOptions) -> FEAResult<Self> {
        let root = options.scratch_root.clone().unwrap_or_else(std::env::temp_dir);
        fs::create_dir_all(&root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}_{}_", structure.name, Uuid::new_v4().simple()))
            .tempdir_in(&root)?;
        Ok(Self {
            path: dir.path().to_path_buf(),
            guard: Some(dir),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the directory after this value is dropped
    pub fn keep(mut self) -> PathBuf {
        if let Some(dir) = self.guard.take() {
            let _ = dir.into_path();
        }
        self.path.clone()
    }
}

/// Running a solver on the structure and reading its results back
pub trait Analyse {
    /// Write the deck and run the solver on a copy of it in a fresh scratch
    /// directory
    fn analyse(&self, options: &AnalysisOptions) -> FEAResult<Scratch>;

    /// Merge the results left in `workdir` into `self.results`
    fn extract_data(&mut self, workdir: &Path, options: &AnalysisOptions) -> FEAResult<()>;

    fn analyse_and_extract(&mut self, options: &AnalysisOptions) -> FEAResult<&Results>;
}

impl Analyse for Structure {
    fn analyse(&self, options: &AnalysisOptions) -> FEAResult<Scratch> {
        let kind = options.dialect;
        // fail before launching when nothing can read the output back
        extractor_for(kind)?;

        let deck = self.write_input_file(kind, &options.deck)?;
        let scratch = Scratch::create(self, options)?;
        let file_name = deck
            .file_name()
            .ok_or_else(|| FEAError::Validation(format!("deck path {:?} has no file name", deck)))?;
        let scratch_deck = scratch.path().join(file_name);
        fs::copy(&deck, &scratch_deck)?;

        let job = Job {
            exe: options.executable(),
            name: self.name.clone(),
            deck: scratch_deck,
            workdir: scratch.path().to_path_buf(),
            cpus: options.cpus.max(1),
            license: options.license.clone(),
        };
        let template = options
            .template
            .clone()
            .unwrap_or_else(|| CommandTemplate::for_dialect(kind));
        let mut launcher = Launcher::new(template);
        if let Some(flag) = &options.cancel {
            launcher = launcher.with_cancel(flag.clone());
        }
        launcher.run(&job)?;
        Ok(scratch)
    }

    fn extract_data(&mut self, workdir: &Path, options: &AnalysisOptions) -> FEAResult<()> {
        let extractor = extractor_for(options.dialect)?;
        let results = extractor.extract(self, workdir, &options.deck.fields)?;
        self.results.merge(results);
        Ok(())
    }

    fn analyse_and_extract(&mut self, options: &AnalysisOptions) -> FEAResult<&Results> {
        let scratch = self.analyse(options)?;
        self.extract_data(scratch.path(), options)?;
        if options.keep_scratch {
            let kept = scratch.keep();
            tracing::info!("Keeping scratch directory {:?}", kept);
        }
        Ok(&self.results)
    }
}
