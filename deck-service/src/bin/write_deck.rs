//! Write a solver deck from a structure snapshot, optionally running it

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use deck_service::{Analyse, AnalysisOptions, DeckOptions, DialectKind, WriteDeck};
use fea_model::model::Structure;

#[derive(Parser, Debug)]
#[command(name = "write-deck", version, about = "Write a solver input deck from a structure snapshot")]
struct Args {
    /// Snapshot written by `Structure::save_snapshot`
    snapshot: PathBuf,

    /// abaqus, ansys, opensees or sofistik
    #[arg(short, long, default_value = "abaqus")]
    dialect: DialectKind,

    /// Output fields to request
    #[arg(short, long, value_delimiter = ',', default_value = "u,rf")]
    fields: Vec<String>,

    /// Output directory, the snapshot's path when unset
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// DOFs per node (OpenSees only)
    #[arg(long)]
    ndof: Option<usize>,

    /// Run the solver and print the extracted results
    #[arg(long)]
    run: bool,

    /// Solver executable
    #[arg(long)]
    exe: Option<String>,

    #[arg(long, default_value_t = 1)]
    cpus: usize,

    /// License tag passed to the solver
    #[arg(long)]
    license: Option<String>,

    /// Keep the solver's scratch directory
    #[arg(long)]
    keep_scratch: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deck_service=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut structure = Structure::load_snapshot(&args.snapshot)
        .with_context(|| format!("loading {:?}", args.snapshot))?;
    if let Some(out) = &args.out {
        structure.path = out.clone();
    }

    let deck = DeckOptions {
        fields: args.fields.clone(),
        ndof: args.ndof,
    };

    if !args.run {
        let path = structure.write_input_file(args.dialect, &deck)?;
        println!("{}", path.display());
        return Ok(());
    }

    let options = AnalysisOptions {
        deck,
        exe: args.exe.clone(),
        cpus: args.cpus,
        license: args.license.clone(),
        keep_scratch: args.keep_scratch,
        ..AnalysisOptions::new(args.dialect)
    };
    let name = structure.name.clone();
    let results = structure
        .analyse_and_extract(&options)
        .with_context(|| format!("analysing '{}' with {}", name, args.dialect))?;
    println!("{}", serde_json::to_string_pretty(results)?);
    Ok(())
}
