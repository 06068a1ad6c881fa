//! Deck Service - solver input decks, solver runs and result extraction
//!
//! - [`dialects`]: the writer framework and the Abaqus/CalculiX, Ansys,
//!   OpenSees and SOFiSTiK adapters
//! - [`executor`]: the solver subprocess launcher
//! - [`extract`]: readers turning solver output into the result envelope
//! - [`analysis`]: `write_input_file` and `analyse_and_extract` on a structure
//! - [`api`]: the HTTP service

pub mod analysis;
pub mod api;
pub mod config;
pub mod dialects;
pub mod executor;
pub mod extract;
pub mod models;
pub mod writer;

pub use analysis::{Analyse, AnalysisOptions, WriteDeck};
pub use dialects::{render_deck, write_input_deck, DeckOptions, DialectKind};
