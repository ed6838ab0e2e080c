//! Interactive widgets: the matching-pairs game and the productivity tools.
//!
//! Every widget is an explicit state type driven by method calls; nothing
//! here does IO. The WebSocket session owns one instance of each and turns
//! their results into protocol messages. Exports are returned as
//! `ExportFile`s for the client to download.

use thiserror::Error;

pub mod brainwriting;
pub mod eisenhower;
pub mod export;
pub mod matching;
pub mod prompt;
pub mod swot;

pub use export::ExportFile;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WidgetError {
  #[error("cannot {action} while {phase}")]
  InvalidPhase { action: &'static str, phase: &'static str },
  #[error("word bank has no words to play with")]
  EmptyWordBank,
  #[error("unknown card `{0}`")]
  UnknownCard(String),
  #[error("text must not be empty")]
  EmptyText,
  #[error("no item at that position")]
  ItemNotFound,
  #[error("`{0}` is required")]
  MissingField(&'static str),
  #[error("participant `{0}` is already in the session")]
  DuplicateParticipant(String),
  #[error("unknown participant `{0}`")]
  UnknownParticipant(String),
  #[error("invalid setting: {0}")]
  InvalidSetting(String),
  #[error("import failed: {0}")]
  Import(String),
  #[error("nothing to export yet")]
  NothingToExport,
  #[error("export failed: {0}")]
  Export(String),
  #[error("{0} export is not available for this tool")]
  UnsupportedFormat(&'static str),
  #[error("no vocabulary game `{0}`")]
  UnknownGame(String),
  #[error("no game loaded")]
  NoGameLoaded,
}

/// Trimmed, non-empty user text.
pub(crate) fn clean_text(text: &str) -> Result<String, WidgetError> {
  let t = text.trim();
  if t.is_empty() { Err(WidgetError::EmptyText) } else { Ok(t.to_string()) }
}
