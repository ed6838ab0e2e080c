//! Brain-writing session: timed rounds of silent idea writing.
//!
//! `Setup` → `Active` → `RoundComplete` → `Active` … → `Finished`.
//! The countdown is driven from outside through `tick`; running out of time
//! completes the round exactly like `end_round`. A completed round is
//! archived and every participant receives the next participant's sheet to
//! review before the following round starts with blank sheets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::export::{filename_part, iso_timestamp, write_csv, ExportFile};
use super::WidgetError;

pub const MAX_ROUNDS: u32 = 10;
pub const MAX_MINUTES: u32 = 30;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Method {
  #[default]
  #[serde(rename = "6-3-5")]
  SixThreeFive,
  #[serde(rename = "constrained")]
  Constrained,
  #[serde(rename = "free")]
  Free,
}

impl Method {
  pub fn name(self) -> &'static str {
    match self {
      Method::SixThreeFive => "Brain-Writing 6-3-5",
      Method::Constrained => "Constrained Brain-Writing",
      Method::Free => "Free Brain-Writing",
    }
  }

  pub fn ideas_per_round(self) -> usize {
    match self {
      Method::SixThreeFive | Method::Free => 3,
      Method::Constrained => 2,
    }
  }

  /// Suggested group size, shown as a hint only.
  pub fn suggested_participants(self) -> usize {
    match self {
      Method::SixThreeFive => 6,
      Method::Constrained => 4,
      Method::Free => 5,
    }
  }

  pub fn suggested_minutes(self) -> u32 {
    match self {
      Method::Constrained => 7,
      _ => 5,
    }
  }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Setup,
  Active,
  RoundComplete,
  Finished,
}

impl Phase {
  fn name(self) -> &'static str {
    match self {
      Phase::Setup => "in setup",
      Phase::Active => "a round is running",
      Phase::RoundComplete => "between rounds",
      Phase::Finished => "finished",
    }
  }
}

/// One participant's sheet. `author` wrote the ideas; after rotation the
/// holder reviews someone else's sheet.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
  pub holder: String,
  pub author: String,
  pub ideas: Vec<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RoundRecord {
  pub round: u32,
  pub sheets: Vec<Sheet>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrainwritingSession {
  name: String,
  method: Method,
  participants: Vec<String>,
  rounds: u32,
  minutes: u32,
  phase: Phase,
  round: u32,
  time_left: u32,
  sheets: Vec<Sheet>,
  completed: Vec<RoundRecord>,
}

impl Default for BrainwritingSession {
  fn default() -> Self {
    Self {
      name: String::new(),
      method: Method::default(),
      participants: Vec::new(),
      rounds: 3,
      minutes: 5,
      phase: Phase::Setup,
      round: 0,
      time_left: 0,
      sheets: Vec::new(),
      completed: Vec::new(),
    }
  }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionExport<'a> {
  session_name: &'a str,
  method: &'static str,
  participants: &'a [String],
  rounds: &'a [RoundRecord],
  timestamp: String,
}

impl BrainwritingSession {
  pub fn phase(&self) -> Phase { self.phase }
  pub fn round(&self) -> u32 { self.round }
  pub fn time_left(&self) -> u32 { self.time_left }
  pub fn sheets(&self) -> &[Sheet] { &self.sheets }
  pub fn completed_rounds(&self) -> &[RoundRecord] { &self.completed }
  pub fn participants(&self) -> &[String] { &self.participants }

  fn require(&self, phase: Phase, action: &'static str) -> Result<(), WidgetError> {
    if self.phase == phase { Ok(()) } else { Err(WidgetError::InvalidPhase { action, phase: self.phase.name() }) }
  }

  pub fn set_name(&mut self, name: &str) -> Result<(), WidgetError> {
    self.require(Phase::Setup, "rename the session")?;
    self.name = name.trim().to_string();
    Ok(())
  }

  pub fn set_method(&mut self, method: Method) -> Result<(), WidgetError> {
    self.require(Phase::Setup, "change the method")?;
    self.method = method;
    Ok(())
  }

  pub fn set_rounds(&mut self, rounds: u32) -> Result<(), WidgetError> {
    self.require(Phase::Setup, "change rounds")?;
    if !(1..=MAX_ROUNDS).contains(&rounds) {
      return Err(WidgetError::InvalidSetting(format!("rounds must be between 1 and {MAX_ROUNDS}")));
    }
    self.rounds = rounds;
    Ok(())
  }

  pub fn set_minutes(&mut self, minutes: u32) -> Result<(), WidgetError> {
    self.require(Phase::Setup, "change the round length")?;
    if !(1..=MAX_MINUTES).contains(&minutes) {
      return Err(WidgetError::InvalidSetting(format!("minutes per round must be between 1 and {MAX_MINUTES}")));
    }
    self.minutes = minutes;
    Ok(())
  }

  pub fn add_participant(&mut self, name: &str) -> Result<(), WidgetError> {
    self.require(Phase::Setup, "add participants")?;
    let name = super::clean_text(name)?;
    if self.participants.contains(&name) {
      return Err(WidgetError::DuplicateParticipant(name));
    }
    self.participants.push(name);
    Ok(())
  }

  pub fn remove_participant(&mut self, name: &str) -> Result<(), WidgetError> {
    self.require(Phase::Setup, "remove participants")?;
    let before = self.participants.len();
    self.participants.retain(|p| p != name);
    if self.participants.len() == before {
      return Err(WidgetError::UnknownParticipant(name.to_string()));
    }
    Ok(())
  }

  fn blank_sheets(&self) -> Vec<Sheet> {
    self
      .participants
      .iter()
      .map(|p| Sheet { holder: p.clone(), author: p.clone(), ideas: vec![String::new(); self.method.ideas_per_round()] })
      .collect()
  }

  fn begin_round(&mut self, round: u32) {
    self.round = round;
    self.time_left = self.minutes.saturating_mul(60);
    self.sheets = self.blank_sheets();
    self.phase = Phase::Active;
    debug!(target: "widgets", round, time_left = self.time_left, "Brain-writing round started");
  }

  pub fn start(&mut self) -> Result<(), WidgetError> {
    self.require(Phase::Setup, "start")?;
    if self.name.is_empty() {
      return Err(WidgetError::MissingField("session name"));
    }
    if self.participants.is_empty() {
      return Err(WidgetError::MissingField("participants"));
    }
    info!(target: "widgets", name = %self.name, method = self.method.name(), participants = self.participants.len(), rounds = self.rounds, "Brain-writing session started");
    self.completed.clear();
    self.begin_round(1);
    Ok(())
  }

  pub fn update_idea(&mut self, participant: &str, index: usize, text: &str) -> Result<(), WidgetError> {
    self.require(Phase::Active, "write ideas")?;
    let sheet = self
      .sheets
      .iter_mut()
      .find(|s| s.holder == participant)
      .ok_or_else(|| WidgetError::UnknownParticipant(participant.to_string()))?;
    let slot = sheet.ideas.get_mut(index).ok_or(WidgetError::ItemNotFound)?;
    *slot = text.to_string();
    Ok(())
  }

  /// Count the timer down. Returns true when this tick completed the round.
  pub fn tick(&mut self, secs: u32) -> bool {
    if self.phase != Phase::Active {
      return false;
    }
    self.time_left = self.time_left.saturating_sub(secs);
    if self.time_left == 0 {
      self.complete_round();
      return true;
    }
    false
  }

  pub fn end_round(&mut self) -> Result<(), WidgetError> {
    self.require(Phase::Active, "end the round")?;
    self.complete_round();
    Ok(())
  }

  fn complete_round(&mut self) {
    self.time_left = 0;
    self.completed.push(RoundRecord { round: self.round, sheets: self.sheets.clone() });
    if self.round < self.rounds {
      let n = self.sheets.len();
      self.sheets = (0..n)
        .map(|i| {
          let next = &self.sheets[(i + 1) % n];
          Sheet { holder: self.sheets[i].holder.clone(), author: next.author.clone(), ideas: next.ideas.clone() }
        })
        .collect();
      self.phase = Phase::RoundComplete;
    } else {
      self.phase = Phase::Finished;
    }
    debug!(target: "widgets", round = self.round, phase = ?self.phase, "Brain-writing round complete");
  }

  pub fn next_round(&mut self) -> Result<(), WidgetError> {
    self.require(Phase::RoundComplete, "start the next round")?;
    self.begin_round(self.round + 1);
    Ok(())
  }

  pub fn reset(&mut self) { *self = BrainwritingSession::default(); }

  fn file_stem(&self, now: DateTime<Utc>) -> String {
    format!("brainwriting-{}-{}", filename_part(&self.name, "session"), now.timestamp_millis())
  }

  fn ensure_exportable(&self) -> Result<(), WidgetError> {
    if self.completed.is_empty() { Err(WidgetError::NothingToExport) } else { Ok(()) }
  }

  pub fn export_json(&self, now: DateTime<Utc>) -> Result<ExportFile, WidgetError> {
    self.ensure_exportable()?;
    let body = SessionExport {
      session_name: &self.name,
      method: self.method.name(),
      participants: &self.participants,
      rounds: &self.completed,
      timestamp: iso_timestamp(now),
    };
    ExportFile::json(format!("{}.json", self.file_stem(now)), &body)
  }

  /// One row per idea slot, attributed to the sheet holder of that round.
  pub fn export_csv(&self, now: DateTime<Utc>) -> Result<ExportFile, WidgetError> {
    self.ensure_exportable()?;
    let rows = self.completed.iter().flat_map(|record| {
      record.sheets.iter().flat_map(move |sheet| {
        sheet.ideas.iter().enumerate().map(move |(i, idea)| {
          [
            self.name.clone(),
            self.method.name().to_string(),
            record.round.to_string(),
            sheet.holder.clone(),
            (i + 1).to_string(),
            idea.clone(),
          ]
        })
      })
    });
    let csv = write_csv(&["Session", "Method", "Round", "Participant", "Idea Number", "Idea"], rows)?;
    Ok(ExportFile::csv(format!("{}.csv", self.file_stem(now)), csv))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn ready(rounds: u32) -> BrainwritingSession {
    let mut s = BrainwritingSession::default();
    s.set_name("Q3 Ideas").unwrap();
    s.set_rounds(rounds).unwrap();
    s.set_minutes(1).unwrap();
    for p in ["Ana", "Bruno", "Caio"] {
      s.add_participant(p).unwrap();
    }
    s
  }

  // ==================== Setup ====================

  #[test]
  fn setup_validates_input() {
    let mut s = BrainwritingSession::default();
    assert_eq!(s.start(), Err(WidgetError::MissingField("session name")));
    s.set_name("Retro").unwrap();
    assert_eq!(s.start(), Err(WidgetError::MissingField("participants")));
    s.add_participant("  Ana ").unwrap();
    assert_eq!(s.add_participant("Ana"), Err(WidgetError::DuplicateParticipant("Ana".into())));
    assert_eq!(s.add_participant("  "), Err(WidgetError::EmptyText));
    assert!(s.set_rounds(0).is_err());
    assert!(s.set_minutes(0).is_err());
    assert!(matches!(s.set_rounds(MAX_ROUNDS + 1), Err(WidgetError::InvalidSetting(_))));
    assert!(matches!(s.set_minutes(100_000_000), Err(WidgetError::InvalidSetting(_))));
    s.set_minutes(MAX_MINUTES).unwrap();
    assert_eq!(s.remove_participant("Zed"), Err(WidgetError::UnknownParticipant("Zed".into())));
    s.set_method(Method::Constrained).unwrap();
    s.start().unwrap();
    assert_eq!(s.sheets()[0].ideas.len(), 2);
    assert_eq!(s.time_left(), MAX_MINUTES * 60);
    assert!(s.add_participant("Late").is_err());
  }

  // ==================== Rounds ====================

  #[test]
  fn timer_expiry_completes_and_rotates() {
    let mut s = ready(2);
    s.start().unwrap();
    assert_eq!((s.phase(), s.round(), s.time_left()), (Phase::Active, 1, 60));
    s.update_idea("Ana", 0, "Idea A").unwrap();
    s.update_idea("Bruno", 0, "Idea B").unwrap();
    assert_eq!(s.update_idea("Ana", 3, "x"), Err(WidgetError::ItemNotFound));
    assert_eq!(s.update_idea("Zed", 0, "x"), Err(WidgetError::UnknownParticipant("Zed".into())));

    assert!(!s.tick(59));
    assert!(s.tick(5));
    assert_eq!(s.phase(), Phase::RoundComplete);
    assert_eq!(s.time_left(), 0);
    // Ana now reviews Bruno's sheet, Caio reviews Ana's.
    assert_eq!(s.sheets()[0].author, "Bruno");
    assert_eq!(s.sheets()[0].ideas[0], "Idea B");
    assert_eq!(s.sheets()[2].ideas[0], "Idea A");
    assert_eq!(s.completed_rounds()[0].sheets[0].ideas[0], "Idea A");
    assert!(!s.tick(1));
    assert!(s.update_idea("Ana", 0, "late").is_err());

    s.next_round().unwrap();
    assert_eq!((s.phase(), s.round()), (Phase::Active, 2));
    assert!(s.sheets().iter().all(|sh| sh.ideas.iter().all(String::is_empty)));
    s.end_round().unwrap();
    assert_eq!(s.phase(), Phase::Finished);
    assert_eq!(s.completed_rounds().len(), 2);
    assert!(s.next_round().is_err());

    s.reset();
    assert_eq!(s.phase(), Phase::Setup);
    assert!(s.participants().is_empty());
  }

  // ==================== Export ====================

  #[test]
  fn exports_list_every_idea_slot() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let mut s = ready(1);
    assert_eq!(s.export_csv(now), Err(WidgetError::NothingToExport));
    s.start().unwrap();
    s.update_idea("Bruno", 1, "Say \"yes\"").unwrap();
    s.end_round().unwrap();

    let csv = s.export_csv(now).unwrap();
    assert_eq!(csv.filename, format!("brainwriting-Q3-Ideas-{}.csv", now.timestamp_millis()));
    let lines: Vec<&str> = csv.content.lines().collect();
    assert_eq!(lines.len(), 1 + 3 * 3);
    assert_eq!(lines[5], "\"Q3 Ideas\",\"Brain-Writing 6-3-5\",1,\"Bruno\",2,\"Say \"\"yes\"\"\"");

    let json: serde_json::Value = serde_json::from_str(&s.export_json(now).unwrap().content).unwrap();
    assert_eq!(json["sessionName"], "Q3 Ideas");
    assert_eq!(json["method"], "Brain-Writing 6-3-5");
    assert_eq!(json["rounds"][0]["round"], 1);
    assert_eq!(json["timestamp"], "2024-03-01T00:00:00.000Z");
  }
}
