//! Per-connection widget session: one instance of every widget plus the
//! locale the client is browsing in. `handle` maps a client message onto the
//! widgets and returns the replies; timing (reveal delays, the brain-writing
//! clock) is left to the socket loop, which calls back into `settle`/`tick`.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::domain::Locale;
use crate::markdown::DiagramViewport;
use crate::protocol::{ClientWsMessage, ExportFormat, ServerWsMessage};
use crate::state::AppState;
use crate::widgets::brainwriting::{BrainwritingSession, Phase as RoundPhase};
use crate::widgets::eisenhower::EisenhowerMatrix;
use crate::widgets::matching::{MatchingGame, SelectOutcome};
use crate::widgets::prompt::{PromptBuilder, PromptLabels};
use crate::widgets::swot::SwotMatrix;
use crate::widgets::{ExportFile, WidgetError};

/// What the socket loop should do after a message was handled.
#[derive(Debug, Default)]
pub struct Reply {
  pub messages: Vec<ServerWsMessage>,
  /// Call `settle` once this much time has passed.
  pub settle_after: Option<Duration>,
  /// A brain-writing round just started; restart the one-second clock.
  pub restart_clock: bool,
}

impl Reply {
  fn one(msg: ServerWsMessage) -> Reply { Reply { messages: vec![msg], ..Reply::default() } }

  pub fn error(message: impl Into<String>) -> Reply { Reply::one(ServerWsMessage::Error { message: message.into() }) }
}

pub struct WidgetSession {
  locale: Locale,
  rng: StdRng,
  game: Option<MatchingGame>,
  swot: SwotMatrix,
  eisenhower: EisenhowerMatrix,
  brainwriting: BrainwritingSession,
  prompt: PromptBuilder,
  diagrams: BTreeMap<usize, DiagramViewport>,
}

/// Diagrams tracked per page view; indices at or past this are rejected.
const MAX_DIAGRAMS: usize = 64;

impl WidgetSession {
  pub fn new(locale: Locale) -> Self { Self::with_rng(locale, StdRng::from_entropy()) }

  pub fn with_rng(locale: Locale, rng: StdRng) -> Self {
    Self {
      locale,
      rng,
      game: None,
      swot: SwotMatrix::default(),
      eisenhower: EisenhowerMatrix::default(),
      brainwriting: BrainwritingSession::default(),
      prompt: PromptBuilder::default(),
      diagrams: BTreeMap::new(),
    }
  }

  pub fn locale(&self) -> Locale { self.locale }

  /// True while a brain-writing round is counting down.
  pub fn round_running(&self) -> bool { self.brainwriting.phase() == RoundPhase::Active }

  /// Handle one client message. Widget errors become an `error` reply; the
  /// session stays usable.
  pub fn handle(&mut self, msg: ClientWsMessage, state: &AppState, now: DateTime<Utc>) -> Reply {
    match self.dispatch(msg, state, now) {
      Ok(reply) => reply,
      Err(e) => {
        warn!(target: "widgets", error = %e, "Widget action rejected");
        Reply::error(e.to_string())
      }
    }
  }

  fn game_mut(&mut self) -> Result<&mut MatchingGame, WidgetError> { self.game.as_mut().ok_or(WidgetError::NoGameLoaded) }

  fn game_state(&self) -> Result<ServerWsMessage, WidgetError> {
    let game = self.game.as_ref().ok_or(WidgetError::NoGameLoaded)?;
    Ok(ServerWsMessage::Game { game: game.snapshot() })
  }

  fn swot_state(&self) -> ServerWsMessage {
    ServerWsMessage::Swot { swot: self.swot.clone(), strategies: self.swot.strategies() }
  }

  fn eisenhower_state(&self) -> ServerWsMessage {
    ServerWsMessage::Eisenhower { eisenhower: self.eisenhower.clone(), stats: self.eisenhower.stats() }
  }

  fn brainwriting_state(&self) -> ServerWsMessage { ServerWsMessage::Brainwriting { session: self.brainwriting.clone() } }

  fn prompt_state(&self) -> ServerWsMessage { ServerWsMessage::Prompt { prompt: self.prompt.clone() } }

  fn export(file: ExportFile) -> Reply {
    debug!(target: "widgets", filename = %file.filename, bytes = file.content.len(), "Export ready");
    Reply::one(ServerWsMessage::Export { file })
  }

  fn dispatch(&mut self, msg: ClientWsMessage, state: &AppState, now: DateTime<Utc>) -> Result<Reply, WidgetError> {
    use ClientWsMessage as C;
    let reply = match msg {
      C::Ping => Reply::one(ServerWsMessage::Pong),
      C::SetLocale { locale } => {
        self.locale = locale;
        Reply::one(ServerWsMessage::Locale { locale })
      }

      // ==================== matching game ====================
      C::GameLoad { slug } => {
        let game = state
          .store
          .vocabulary_game(&slug, self.locale)
          .ok_or_else(|| WidgetError::UnknownGame(slug.clone()))?;
        let loaded = MatchingGame::new(game.value.words, state.config.game.clone())?;
        info!(target: "widgets", %slug, locale = %game.locale, fallback = game.fallback, "Vocabulary game loaded");
        self.game = Some(loaded);
        Reply::one(self.game_state()?)
      }
      C::GameConfigure { pairs } => {
        self.game_mut()?.configure(pairs)?;
        Reply::one(self.game_state()?)
      }
      C::GameStart => {
        let game = self.game.as_mut().ok_or(WidgetError::NoGameLoaded)?;
        game.start(&mut self.rng)?;
        Reply::one(self.game_state()?)
      }
      C::GameRestart => {
        let game = self.game.as_mut().ok_or(WidgetError::NoGameLoaded)?;
        game.restart(&mut self.rng)?;
        Reply::one(self.game_state()?)
      }
      C::GameExit => {
        self.game_mut()?.exit();
        Reply::one(self.game_state()?)
      }
      C::GameSelect { card_id } => {
        let game = self.game_mut()?;
        let outcome = game.select(&card_id)?;
        let settle_after = match outcome {
          SelectOutcome::Match { reveal_ms } | SelectOutcome::Mismatch { reveal_ms } => Some(Duration::from_millis(reveal_ms)),
          SelectOutcome::Ignored | SelectOutcome::Selected => None,
        };
        Reply {
          messages: vec![ServerWsMessage::GameSelection { outcome, game: game.snapshot() }],
          settle_after,
          restart_clock: false,
        }
      }

      // ==================== SWOT ====================
      C::SwotSetProject { name, description } => {
        self.swot.set_project(&name, &description);
        Reply::one(self.swot_state())
      }
      C::SwotAdd { quadrant, text } => {
        self.swot.add(quadrant, &text)?;
        Reply::one(self.swot_state())
      }
      C::SwotEdit { quadrant, index, text } => {
        self.swot.edit(quadrant, index, &text)?;
        Reply::one(self.swot_state())
      }
      C::SwotRemove { quadrant, index } => {
        self.swot.remove(quadrant, index)?;
        Reply::one(self.swot_state())
      }
      C::SwotClear => {
        self.swot.clear();
        Reply::one(self.swot_state())
      }
      C::SwotExport { format } => Self::export(match format {
        ExportFormat::Json => self.swot.export_json(now)?,
        ExportFormat::Csv => self.swot.export_csv(now)?,
        ExportFormat::Report => self.swot.export_report(now),
      }),
      C::SwotImport { filename, content } => {
        self.swot.import(&filename, &content)?;
        Reply::one(self.swot_state())
      }

      // ==================== Eisenhower ====================
      C::EisenhowerAdd { quadrant, text } => {
        self.eisenhower.add(quadrant, &text, now)?;
        Reply::one(self.eisenhower_state())
      }
      C::EisenhowerEdit { quadrant, id, text } => {
        self.eisenhower.edit(quadrant, id, &text)?;
        Reply::one(self.eisenhower_state())
      }
      C::EisenhowerToggle { quadrant, id } => {
        self.eisenhower.toggle(quadrant, id)?;
        Reply::one(self.eisenhower_state())
      }
      C::EisenhowerRemove { quadrant, id } => {
        self.eisenhower.remove(quadrant, id)?;
        Reply::one(self.eisenhower_state())
      }
      C::EisenhowerClear => {
        self.eisenhower.clear();
        Reply::one(self.eisenhower_state())
      }
      C::EisenhowerShowCompleted { show } => {
        self.eisenhower.set_show_completed(show);
        Reply::one(self.eisenhower_state())
      }
      C::EisenhowerExport { format } => Self::export(match format {
        ExportFormat::Json => self.eisenhower.export_json(now)?,
        ExportFormat::Csv => self.eisenhower.export_csv(now)?,
        ExportFormat::Report => return Err(WidgetError::UnsupportedFormat("report")),
      }),
      C::EisenhowerImport { filename, content } => {
        self.eisenhower.import(&filename, &content, now)?;
        Reply::one(self.eisenhower_state())
      }

      // ==================== brain-writing ====================
      C::BrainwritingSetup { name, method, rounds, minutes } => {
        self.brainwriting.set_name(&name)?;
        self.brainwriting.set_method(method)?;
        self.brainwriting.set_rounds(rounds)?;
        self.brainwriting.set_minutes(minutes)?;
        Reply::one(self.brainwriting_state())
      }
      C::BrainwritingAddParticipant { name } => {
        self.brainwriting.add_participant(&name)?;
        Reply::one(self.brainwriting_state())
      }
      C::BrainwritingRemoveParticipant { name } => {
        self.brainwriting.remove_participant(&name)?;
        Reply::one(self.brainwriting_state())
      }
      C::BrainwritingStart => {
        self.brainwriting.start()?;
        Reply { restart_clock: true, ..Reply::one(self.brainwriting_state()) }
      }
      C::BrainwritingIdea { participant, index, text } => {
        self.brainwriting.update_idea(&participant, index, &text)?;
        Reply::one(self.brainwriting_state())
      }
      C::BrainwritingEndRound => {
        self.brainwriting.end_round()?;
        Reply::one(self.brainwriting_state())
      }
      C::BrainwritingNextRound => {
        self.brainwriting.next_round()?;
        Reply { restart_clock: true, ..Reply::one(self.brainwriting_state()) }
      }
      C::BrainwritingReset => {
        self.brainwriting.reset();
        Reply::one(self.brainwriting_state())
      }
      C::BrainwritingExport { format } => Self::export(match format {
        ExportFormat::Json => self.brainwriting.export_json(now)?,
        ExportFormat::Csv => self.brainwriting.export_csv(now)?,
        ExportFormat::Report => return Err(WidgetError::UnsupportedFormat("report")),
      }),

      // ==================== prompt builder ====================
      C::PromptUpdate { form } => {
        self.prompt.update(form);
        Reply::one(self.prompt_state())
      }
      C::PromptBuild => {
        let labels = PromptLabels::from_dictionary(&state.store.dictionary(self.locale));
        self.prompt.build(&labels)?;
        Reply::one(self.prompt_state())
      }
      C::PromptReset => {
        self.prompt.reset();
        Reply::one(self.prompt_state())
      }
      C::PromptExport => Self::export(self.prompt.export()?),

      // ==================== diagram viewer ====================
      C::DiagramView { diagram, action } => {
        if diagram >= MAX_DIAGRAMS {
          return Err(WidgetError::InvalidSetting(format!("diagram index must be below {MAX_DIAGRAMS}")));
        }
        let viewport = self.diagrams.entry(diagram).or_default();
        let consumed = viewport.apply(action);
        Reply::one(ServerWsMessage::Diagram {
          diagram,
          scale: viewport.scale(),
          fullscreen: viewport.is_fullscreen(),
          consumed,
        })
      }
    };
    Ok(reply)
  }

  /// Apply a pending game comparison once its reveal delay has elapsed.
  pub fn settle(&mut self) -> Option<ServerWsMessage> {
    let game = self.game.as_mut()?;
    let settled = game.settle()?;
    Some(ServerWsMessage::GameSettled { settled, game: game.snapshot() })
  }

  /// Advance the brain-writing clock. A tick that ends the round returns the
  /// whole session; otherwise just the remaining time.
  pub fn tick(&mut self, secs: u32) -> Option<ServerWsMessage> {
    if !self.round_running() {
      return None;
    }
    if self.brainwriting.tick(secs) {
      info!(target: "widgets", round = self.brainwriting.round(), "Brain-writing round timed out");
      return Some(self.brainwriting_state());
    }
    Some(ServerWsMessage::BrainwritingTick { round: self.brainwriting.round(), time_left: self.brainwriting.time_left() })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::SiteConfig;
  use crate::content::testutil::write;
  use crate::widgets::brainwriting::Method;
  use crate::widgets::matching::Settled;
  use crate::widgets::swot::Quadrant;
  use serde_json::json;

  fn state(dir: &std::path::Path) -> AppState {
    let mut cfg = SiteConfig::default();
    cfg.site.content_dir = dir.to_path_buf();
    AppState::new(cfg)
  }

  fn parse(v: serde_json::Value) -> ClientWsMessage { serde_json::from_value(v).unwrap() }

  fn session() -> WidgetSession { WidgetSession::with_rng(Locale::En, StdRng::seed_from_u64(7)) }

  fn as_json(msg: &ServerWsMessage) -> serde_json::Value { serde_json::to_value(msg).unwrap() }

  // ==================== game ====================

  #[test]
  fn game_flow_over_messages() {
    let dir = tempfile::tempdir().unwrap();
    let words: Vec<_> = (1..=4)
      .map(|i| json!({"id": format!("w{i}"), "source": format!("s{i}"), "target": format!("t{i}")}))
      .collect();
    let bank = json!({"id": "basics", "title": "Basics", "difficulty": "beginner",
      "language_pair": {"source": "en", "target": "pt"}, "words": words});
    write(dir.path(), "games/vocabulary/basics.json", &bank.to_string());
    let st = state(dir.path());
    let now = Utc::now();
    let mut s = session();

    let r = s.handle(parse(json!({"type": "game_start"})), &st, now);
    assert_eq!(as_json(&r.messages[0])["message"], "no game loaded");

    let r = s.handle(parse(json!({"type": "game_load", "slug": "basics"})), &st, now);
    assert_eq!(as_json(&r.messages[0])["game"]["pairs"], 4);
    s.handle(parse(json!({"type": "game_start"})), &st, now);

    s.handle(parse(json!({"type": "game_select", "cardId": "source-w1"})), &st, now);
    let r = s.handle(parse(json!({"type": "game_select", "cardId": "target-w1"})), &st, now);
    assert_eq!(r.settle_after, Some(Duration::from_millis(600)));
    assert_eq!(as_json(&r.messages[0])["outcome"]["result"], "match");

    match s.settle() {
      Some(ServerWsMessage::GameSettled { settled, game }) => {
        assert_eq!(settled, Settled::Matched { completed: false });
        assert_eq!(game.score, 10);
      }
      other => panic!("unexpected: {other:?}"),
    }
    assert!(s.settle().is_none());

    let r = s.handle(parse(json!({"type": "game_load", "slug": "missing"})), &st, now);
    assert_eq!(as_json(&r.messages[0])["type"], "error");
  }

  // ==================== tools ====================

  #[test]
  fn swot_export_and_unsupported_formats() {
    let dir = tempfile::tempdir().unwrap();
    let st = state(dir.path());
    let now = Utc::now();
    let mut s = session();

    let r = s.handle(ClientWsMessage::SwotAdd { quadrant: Quadrant::Strengths, text: "Team".into() }, &st, now);
    assert_eq!(as_json(&r.messages[0])["swot"]["items"]["strengths"][0], "Team");

    let r = s.handle(parse(json!({"type": "swot_export", "format": "report"})), &st, now);
    assert_eq!(as_json(&r.messages[0])["file"]["mime"], "text/plain");

    let r = s.handle(parse(json!({"type": "eisenhower_export", "format": "report"})), &st, now);
    assert_eq!(as_json(&r.messages[0])["type"], "error");
  }

  #[test]
  fn brainwriting_clock_runs_through_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let st = state(dir.path());
    let now = Utc::now();
    let mut s = session();

    let r = s.handle(parse(json!({"type": "brainwriting_setup", "name": "Retro", "method": "free", "rounds": 1, "minutes": 100_000_000})), &st, now);
    assert_eq!(as_json(&r.messages[0])["type"], "error");
    s.handle(ClientWsMessage::BrainwritingSetup { name: "Retro".into(), method: Method::Free, rounds: 1, minutes: 1 }, &st, now);
    s.handle(ClientWsMessage::BrainwritingAddParticipant { name: "Ana".into() }, &st, now);
    assert!(s.tick(1).is_none());
    let r = s.handle(ClientWsMessage::BrainwritingStart, &st, now);
    assert!(r.restart_clock);
    assert!(s.round_running());

    match s.tick(1) {
      Some(ServerWsMessage::BrainwritingTick { round, time_left }) => assert_eq!((round, time_left), (1, 59)),
      other => panic!("unexpected: {other:?}"),
    }
    assert!(matches!(s.tick(59), Some(ServerWsMessage::Brainwriting { .. })));
    assert!(!s.round_running());
  }

  #[test]
  fn diagram_viewports_are_tracked_per_index() {
    let dir = tempfile::tempdir().unwrap();
    let st = state(dir.path());
    let now = Utc::now();
    let mut s = session();

    let zoom = json!({"type": "diagram_view", "diagram": 1, "action": {"kind": "zoom_in"}});
    s.handle(parse(zoom.clone()), &st, now);
    let r = s.handle(parse(zoom), &st, now);
    let v = as_json(&r.messages[0]);
    assert_eq!((v["type"].as_str(), v["diagram"].as_u64()), (Some("diagram"), Some(1)));
    assert!((v["scale"].as_f64().unwrap() - 1.2).abs() < 1e-6);

    let r = s.handle(parse(json!({"type": "diagram_view", "diagram": 0, "action": {"kind": "wheel", "deltaY": 50}})), &st, now);
    let v = as_json(&r.messages[0]);
    assert_eq!(v["consumed"], false);
    assert_eq!(v["scale"], 1.0);

    let r = s.handle(parse(json!({"type": "diagram_view", "diagram": 9999, "action": {"kind": "reset"}})), &st, now);
    assert_eq!(as_json(&r.messages[0])["type"], "error");
  }

  #[test]
  fn prompt_build_uses_session_locale() {
    let dir = tempfile::tempdir().unwrap();
    let st = state(dir.path());
    let now = Utc::now();
    let mut s = session();

    s.handle(parse(json!({"type": "set_locale", "locale": "es"})), &st, now);
    assert_eq!(s.locale(), Locale::Es);
    s.handle(parse(json!({"type": "prompt_update", "form": {"objective": "Resumir"}})), &st, now);
    let r = s.handle(ClientWsMessage::PromptBuild, &st, now);
    let generated = as_json(&r.messages[0])["prompt"]["generated"].as_str().unwrap().to_string();
    assert!(generated.starts_with("**Objetivo:**\nResumir"));
    assert!(generated.contains("**Tono:**\nProfesional"));

    let r = s.handle(ClientWsMessage::PromptExport, &st, now);
    assert_eq!(as_json(&r.messages[0])["file"]["filename"], "llm-prompt.txt");
  }
}
