//! Matching-pairs vocabulary game.
//!
//! Phases: `Configuring` → `Playing` → `Complete`.
//! A round draws N word pairs without replacement and deals 2N shuffled
//! cards, one per side of each pair. Two selected cards are compared at
//! once, but the comparison only takes effect on `settle`, which the caller
//! invokes after the reveal delay carried by the outcome.

use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use super::WidgetError;
use crate::config::GameRules;
use crate::domain::WordPair;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Configuring,
  Playing,
  Complete,
}

impl Phase {
  fn name(self) -> &'static str {
    match self {
      Phase::Configuring => "configuring",
      Phase::Playing => "playing",
      Phase::Complete => "complete",
    }
  }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
  Source,
  Target,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Card {
  /// `source-<word id>` or `target-<word id>`.
  pub id: String,
  pub pair_id: String,
  pub side: Side,
  pub text: String,
  pub matched: bool,
}

/// Allowed pair counts for one word bank.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct PairBounds {
  pub min: usize,
  pub max: usize,
  pub default: usize,
}

impl PairBounds {
  /// `max = min(rules.max, words)`, `min = min(rules.min, max)`. None for an empty bank.
  pub fn for_bank(rules: &GameRules, word_count: usize) -> Option<PairBounds> {
    let max = rules.max_pairs.min(word_count);
    if max == 0 {
      return None;
    }
    let min = rules.min_pairs.min(max).max(1);
    Some(PairBounds { min, max, default: rules.default_pairs.clamp(min, max) })
  }

  pub fn clamp(&self, pairs: usize) -> usize { pairs.clamp(self.min, self.max) }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SelectOutcome {
  /// Matched card, card already selected, or a comparison still pending.
  Ignored,
  /// First card of a pair attempt.
  Selected,
  Match { reveal_ms: u64 },
  Mismatch { reveal_ms: u64 },
}

/// What `settle` applied.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Settled {
  Matched { completed: bool },
  Cleared,
}

#[derive(Clone, Copy, Debug)]
enum Pending {
  Match(usize, usize),
  Mismatch,
}

#[derive(Clone, Debug)]
pub struct MatchingGame {
  words: Vec<WordPair>,
  rules: GameRules,
  bounds: PairBounds,
  pairs: usize,
  phase: Phase,
  cards: Vec<Card>,
  selected: Vec<usize>,
  pending: Option<Pending>,
  score: u32,
  attempts: u32,
  matches: usize,
  started_at: Option<Instant>,
  finished_in: Option<Duration>,
}

/// Serializable view of the whole game.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GameSnapshot {
  pub phase: Phase,
  pub bounds: PairBounds,
  pub pairs: usize,
  pub cards: Vec<Card>,
  pub selected: Vec<String>,
  pub score: u32,
  pub attempts: u32,
  pub matches: usize,
  pub accuracy: u32,
  pub elapsed_secs: u64,
}

impl MatchingGame {
  pub fn new(words: Vec<WordPair>, rules: GameRules) -> Result<MatchingGame, WidgetError> {
    let bounds = PairBounds::for_bank(&rules, words.len()).ok_or(WidgetError::EmptyWordBank)?;
    Ok(MatchingGame {
      words,
      rules,
      bounds,
      pairs: bounds.default,
      phase: Phase::Configuring,
      cards: Vec::new(),
      selected: Vec::new(),
      pending: None,
      score: 0,
      attempts: 0,
      matches: 0,
      started_at: None,
      finished_in: None,
    })
  }

  pub fn phase(&self) -> Phase { self.phase }

  pub fn bounds(&self) -> PairBounds { self.bounds }

  pub fn pairs(&self) -> usize { self.pairs }

  pub fn cards(&self) -> &[Card] { &self.cards }

  pub fn score(&self) -> u32 { self.score }

  pub fn attempts(&self) -> u32 { self.attempts }

  pub fn matches(&self) -> usize { self.matches }

  /// Choose the pair count; out-of-range values are clamped. Returns the count kept.
  pub fn configure(&mut self, pairs: usize) -> Result<usize, WidgetError> {
    self.require(Phase::Configuring, "configure")?;
    self.pairs = self.bounds.clamp(pairs);
    Ok(self.pairs)
  }

  /// Deal a fresh round with the configured pair count.
  pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), WidgetError> {
    self.require(Phase::Configuring, "start")?;
    self.deal(rng);
    Ok(())
  }

  /// Same pair count, new draw and shuffle. Allowed mid-round or after completion.
  pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), WidgetError> {
    if self.phase == Phase::Configuring {
      return Err(WidgetError::InvalidPhase { action: "restart", phase: self.phase.name() });
    }
    self.deal(rng);
    Ok(())
  }

  /// Back to configuring; the round is discarded.
  pub fn exit(&mut self) {
    self.phase = Phase::Configuring;
    self.reset_round();
  }

  pub fn select(&mut self, card_id: &str) -> Result<SelectOutcome, WidgetError> {
    self.require(Phase::Playing, "select a card")?;
    let idx = self
      .cards
      .iter()
      .position(|c| c.id == card_id)
      .ok_or_else(|| WidgetError::UnknownCard(card_id.to_string()))?;

    if self.pending.is_some() || self.cards[idx].matched || self.selected.contains(&idx) {
      return Ok(SelectOutcome::Ignored);
    }
    self.selected.push(idx);
    if self.selected.len() < 2 {
      return Ok(SelectOutcome::Selected);
    }

    self.attempts += 1;
    let (a, b) = (self.selected[0], self.selected[1]);
    let (ca, cb) = (&self.cards[a], &self.cards[b]);
    if ca.pair_id == cb.pair_id && ca.side != cb.side {
      self.pending = Some(Pending::Match(a, b));
      Ok(SelectOutcome::Match { reveal_ms: self.rules.match_reveal_ms })
    } else {
      self.pending = Some(Pending::Mismatch);
      Ok(SelectOutcome::Mismatch { reveal_ms: self.rules.mismatch_reveal_ms })
    }
  }

  /// Apply the pending comparison. None when nothing was pending.
  pub fn settle(&mut self) -> Option<Settled> {
    let pending = self.pending.take()?;
    self.selected.clear();
    match pending {
      Pending::Match(a, b) => {
        self.cards[a].matched = true;
        self.cards[b].matched = true;
        self.score += self.rules.match_score;
        self.matches += 1;
        let completed = self.matches == self.pairs;
        if completed {
          self.phase = Phase::Complete;
          self.finished_in = self.started_at.map(|t| t.elapsed());
          debug!(target: "widgets", pairs = self.pairs, attempts = self.attempts, score = self.score, "Matching round complete");
        }
        Some(Settled::Matched { completed })
      }
      Pending::Mismatch => Some(Settled::Cleared),
    }
  }

  /// round(100 · matches / attempts); 0 before the first attempt.
  pub fn accuracy(&self) -> u32 {
    if self.attempts == 0 {
      return 0;
    }
    ((self.matches as f64 / f64::from(self.attempts)) * 100.0).round() as u32
  }

  /// Time since the round started, frozen once complete.
  pub fn elapsed(&self) -> Duration {
    match (self.finished_in, self.started_at) {
      (Some(d), _) => d,
      (None, Some(t)) => t.elapsed(),
      (None, None) => Duration::ZERO,
    }
  }

  pub fn snapshot(&self) -> GameSnapshot {
    GameSnapshot {
      phase: self.phase,
      bounds: self.bounds,
      pairs: self.pairs,
      cards: self.cards.clone(),
      selected: self.selected.iter().map(|&i| self.cards[i].id.clone()).collect(),
      score: self.score,
      attempts: self.attempts,
      matches: self.matches,
      accuracy: self.accuracy(),
      elapsed_secs: self.elapsed().as_secs(),
    }
  }

  fn require(&self, phase: Phase, action: &'static str) -> Result<(), WidgetError> {
    if self.phase == phase { Ok(()) } else { Err(WidgetError::InvalidPhase { action, phase: self.phase.name() }) }
  }

  fn reset_round(&mut self) {
    self.cards.clear();
    self.selected.clear();
    self.pending = None;
    self.score = 0;
    self.attempts = 0;
    self.matches = 0;
    self.started_at = None;
    self.finished_in = None;
  }

  fn deal<R: Rng + ?Sized>(&mut self, rng: &mut R) {
    self.reset_round();
    let drawn: Vec<&WordPair> = self.words.choose_multiple(rng, self.pairs).collect();
    let mut cards = Vec::with_capacity(drawn.len() * 2);
    for w in drawn {
      cards.push(Card { id: format!("source-{}", w.id), pair_id: w.id.clone(), side: Side::Source, text: w.source.clone(), matched: false });
      cards.push(Card { id: format!("target-{}", w.id), pair_id: w.id.clone(), side: Side::Target, text: w.target.clone(), matched: false });
    }
    cards.shuffle(rng);
    self.cards = cards;
    self.phase = Phase::Playing;
    self.started_at = Some(Instant::now());
    debug!(target: "widgets", pairs = self.pairs, cards = self.cards.len(), "Matching round dealt");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn bank(n: usize) -> Vec<WordPair> {
    (1..=n)
      .map(|i| WordPair { id: format!("w{i}"), source: format!("src{i}"), target: format!("tgt{i}"), context: String::new() })
      .collect()
  }

  fn game_with(words: usize, pairs: usize) -> (MatchingGame, StdRng) {
    let mut g = MatchingGame::new(bank(words), GameRules::default()).unwrap();
    g.configure(pairs).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    g.start(&mut rng).unwrap();
    (g, rng)
  }

  /// Select both cards of a word and settle; panics if the word was not dealt.
  fn play_pair(g: &mut MatchingGame, word: &str) -> (SelectOutcome, Option<Settled>) {
    assert_eq!(g.select(&format!("source-{word}")).unwrap(), SelectOutcome::Selected);
    let outcome = g.select(&format!("target-{word}")).unwrap();
    (outcome, g.settle())
  }

  // ==================== configuring ====================

  #[test]
  fn bounds_follow_rules_and_word_count() {
    let r = GameRules::default();
    assert_eq!(PairBounds::for_bank(&r, 10), Some(PairBounds { min: 4, max: 10, default: 8 }));
    assert_eq!(PairBounds::for_bank(&r, 30), Some(PairBounds { min: 4, max: 12, default: 8 }));
    assert_eq!(PairBounds::for_bank(&r, 3), Some(PairBounds { min: 3, max: 3, default: 3 }));
    assert_eq!(PairBounds::for_bank(&r, 0), None);
    assert_eq!(MatchingGame::new(vec![], r).unwrap_err(), WidgetError::EmptyWordBank);
  }

  #[test]
  fn configure_clamps_into_bounds() {
    let mut g = MatchingGame::new(bank(10), GameRules::default()).unwrap();
    assert_eq!(g.configure(2).unwrap(), 4);
    assert_eq!(g.configure(99).unwrap(), 10);
    assert_eq!(g.configure(6).unwrap(), 6);
  }

  // ==================== playing ====================

  #[test]
  fn four_pairs_from_ten_words_deal_eight_cards() {
    let (g, _) = game_with(10, 4);
    assert_eq!(g.phase(), Phase::Playing);
    assert_eq!(g.cards().len(), 8);
    let mut pair_ids: Vec<_> = g.cards().iter().map(|c| c.pair_id.clone()).collect();
    pair_ids.sort();
    pair_ids.dedup();
    assert_eq!(pair_ids.len(), 4);
    for id in &pair_ids {
      let sides: Vec<_> = g.cards().iter().filter(|c| &c.pair_id == id).map(|c| c.side).collect();
      assert_eq!(sides.len(), 2);
      assert_ne!(sides[0], sides[1]);
    }
  }

  #[test]
  fn matching_w3_scores_ten() {
    // Every word is dealt when pairs == words.
    let (mut g, _) = game_with(4, 4);
    let (outcome, settled) = play_pair(&mut g, "w3");
    assert_eq!(outcome, SelectOutcome::Match { reveal_ms: 600 });
    assert_eq!(settled, Some(Settled::Matched { completed: false }));
    assert_eq!(g.score(), 10);
    assert!(g.cards().iter().filter(|c| c.pair_id == "w3").all(|c| c.matched));
  }

  #[test]
  fn same_side_cards_never_match() {
    let (mut g, _) = game_with(4, 4);
    g.select("source-w1").unwrap();
    let outcome = g.select("source-w2").unwrap();
    assert_eq!(outcome, SelectOutcome::Mismatch { reveal_ms: 1000 });
    assert_eq!(g.settle(), Some(Settled::Cleared));
    assert_eq!(g.score(), 0);
    assert_eq!(g.attempts(), 1);
    assert!(g.cards().iter().all(|c| !c.matched));
  }

  #[test]
  fn selections_are_ignored_while_pending_or_repeated() {
    let (mut g, _) = game_with(4, 4);
    assert_eq!(g.select("source-w1").unwrap(), SelectOutcome::Selected);
    assert_eq!(g.select("source-w1").unwrap(), SelectOutcome::Ignored);
    g.select("target-w1").unwrap();
    // Comparison pending: further picks do nothing.
    assert_eq!(g.select("source-w2").unwrap(), SelectOutcome::Ignored);
    g.settle();
    assert_eq!(g.select("target-w1").unwrap(), SelectOutcome::Ignored);
    assert!(matches!(g.select("source-w99"), Err(WidgetError::UnknownCard(_))));
    assert_eq!(g.attempts(), 1);
  }

  // ==================== complete ====================

  #[test]
  fn completed_round_has_all_pairs_and_at_least_n_attempts() {
    let (mut g, mut rng) = game_with(10, 5);
    let mut words: Vec<String> = g.cards().iter().map(|c| c.pair_id.clone()).collect();
    words.sort();
    words.dedup();

    // One deliberate miss first.
    g.select(&format!("source-{}", words[0])).unwrap();
    g.select(&format!("source-{}", words[1])).unwrap();
    g.settle();

    for w in &words {
      play_pair(&mut g, w);
    }
    assert_eq!(g.phase(), Phase::Complete);
    assert_eq!(g.matches(), 5);
    assert!(g.attempts() >= 5);
    assert_eq!(g.attempts(), 6);
    assert_eq!(g.accuracy(), 83);
    assert_eq!(g.score(), 50);
    assert!(g.select("source-w1").is_err());

    g.restart(&mut rng).unwrap();
    assert_eq!(g.phase(), Phase::Playing);
    assert_eq!(g.cards().len(), 10);
    assert_eq!((g.score(), g.attempts(), g.matches()), (0, 0, 0));

    g.exit();
    assert_eq!(g.phase(), Phase::Configuring);
    assert!(g.cards().is_empty());
    assert_eq!(g.pairs(), 5);
  }

  #[test]
  fn accuracy_is_zero_without_attempts() {
    let (g, _) = game_with(10, 4);
    assert_eq!(g.accuracy(), 0);
    assert_eq!(g.snapshot().selected.len(), 0);
  }
}
