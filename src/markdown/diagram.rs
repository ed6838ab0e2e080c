//! Diagram blocks: header validation and the client viewport model.
//!
//! Drawing happens in the browser. The server only checks that the source
//! names a diagram type the client library knows, so a typo shows up as an
//! inline error next to the source instead of a blank box.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header keywords accepted as the first meaningful line.
const DIAGRAM_TYPES: &[&str] = &[
  "graph",
  "flowchart",
  "sequenceDiagram",
  "classDiagram",
  "stateDiagram",
  "stateDiagram-v2",
  "erDiagram",
  "journey",
  "gantt",
  "pie",
  "quadrantChart",
  "requirementDiagram",
  "gitGraph",
  "C4Context",
  "C4Container",
  "C4Component",
  "mindmap",
  "timeline",
  "sankey-beta",
  "xychart-beta",
  "block-beta",
  "packet-beta",
  "architecture-beta",
  "kanban",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiagramError {
  #[error("diagram is empty")]
  Empty,
  #[error("unknown diagram type `{0}`; the first line must name the diagram kind (e.g. `graph TD`)")]
  UnknownType(String),
  #[error("diagram config block is not closed by `---`")]
  UnterminatedConfig,
}

/// Return the diagram type keyword of `source`.
/// Blank lines, `%%` comments and a leading `---` config block are skipped.
pub fn check(source: &str) -> Result<&'static str, DiagramError> {
  let mut lines = source.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with("%%"));

  let mut first = lines.next().ok_or(DiagramError::Empty)?;
  if first == "---" {
    lines.by_ref().find(|l| *l == "---").ok_or(DiagramError::UnterminatedConfig)?;
    first = lines.next().ok_or(DiagramError::Empty)?;
  }

  let keyword = first.split(|c: char| c.is_whitespace() || c == ':' || c == ';').next().unwrap_or(first);
  DIAGRAM_TYPES
    .iter()
    .find(|t| **t == keyword)
    .copied()
    .ok_or_else(|| DiagramError::UnknownType(keyword.to_string()))
}

/// A viewer gesture on one diagram.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewportAction {
  ZoomIn,
  ZoomOut,
  Reset,
  ToggleFullscreen,
  Wheel {
    #[serde(rename = "deltaY")]
    delta_y: f32,
    #[serde(default)]
    modifier: bool,
  },
}

/// Zoom / fullscreen state of one diagram on the page.
/// Scale is kept in tenths so repeated steps never drift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagramViewport {
  tenths: u8,
  fullscreen: bool,
}

impl Default for DiagramViewport {
  fn default() -> Self { Self { tenths: Self::RESET, fullscreen: false } }
}

impl DiagramViewport {
  const MIN: u8 = 5;
  const MAX: u8 = 30;
  const RESET: u8 = 10;

  pub fn scale(&self) -> f32 { f32::from(self.tenths) / 10.0 }

  pub fn is_fullscreen(&self) -> bool { self.fullscreen }

  pub fn zoom_in(&mut self) { self.tenths = (self.tenths + 1).min(Self::MAX); }

  pub fn zoom_out(&mut self) { self.tenths = self.tenths.saturating_sub(1).max(Self::MIN); }

  pub fn reset(&mut self) { self.tenths = Self::RESET; }

  pub fn toggle_fullscreen(&mut self) { self.fullscreen = !self.fullscreen; }

  /// Scroll-wheel gesture. Zooms only while the modifier key is held;
  /// returns whether the event was consumed (otherwise the page scrolls).
  pub fn wheel(&mut self, delta_y: f32, modifier_held: bool) -> bool {
    if !modifier_held || delta_y == 0.0 {
      return false;
    }
    if delta_y > 0.0 { self.zoom_out() } else { self.zoom_in() }
    true
  }

  /// Apply a gesture; false when it was not consumed.
  pub fn apply(&mut self, action: ViewportAction) -> bool {
    match action {
      ViewportAction::ZoomIn => self.zoom_in(),
      ViewportAction::ZoomOut => self.zoom_out(),
      ViewportAction::Reset => self.reset(),
      ViewportAction::ToggleFullscreen => self.toggle_fullscreen(),
      ViewportAction::Wheel { delta_y, modifier } => return self.wheel(delta_y, modifier),
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn header_detection_skips_comments_and_config() {
    assert_eq!(check("graph TD\nA-->B"), Ok("graph"));
    assert_eq!(check("\n%% comment\nsequenceDiagram\n  A->>B: hi"), Ok("sequenceDiagram"));
    assert_eq!(check("---\ntitle: Flow\n---\nflowchart LR\n"), Ok("flowchart"));
    assert_eq!(check("pie title Pets"), Ok("pie"));
    assert_eq!(check("stateDiagram-v2\n[*] --> S"), Ok("stateDiagram-v2"));
  }

  #[test]
  fn bad_headers_are_reported() {
    assert_eq!(check(""), Err(DiagramError::Empty));
    assert_eq!(check("  \n%% only a comment"), Err(DiagramError::Empty));
    assert_eq!(check("grph TD"), Err(DiagramError::UnknownType("grph".into())));
    assert_eq!(check("---\ntitle: x\n"), Err(DiagramError::UnterminatedConfig));
  }

  #[test]
  fn viewport_is_clamped_and_wheel_needs_modifier() {
    let mut v = DiagramViewport::default();
    assert_eq!(v.scale(), 1.0);
    assert!(!v.wheel(-1.0, false));
    assert_eq!(v.scale(), 1.0);

    for _ in 0..50 {
      v.zoom_in();
    }
    assert_eq!(v.scale(), 3.0);
    for _ in 0..50 {
      assert!(v.wheel(120.0, true));
    }
    assert_eq!(v.scale(), 0.5);

    v.reset();
    v.toggle_fullscreen();
    assert_eq!(v.scale(), 1.0);
    assert!(v.is_fullscreen());
  }

  #[test]
  fn actions_parse_from_client_json() {
    let mut v = DiagramViewport::default();
    let wheel: ViewportAction = serde_json::from_str(r#"{"kind": "wheel", "deltaY": -100, "modifier": true}"#).unwrap();
    assert!(v.apply(wheel));
    assert_eq!(v.scale(), 1.1);
    let scroll: ViewportAction = serde_json::from_str(r#"{"kind": "wheel", "deltaY": 100}"#).unwrap();
    assert!(!v.apply(scroll));
    assert!(v.apply(ViewportAction::ToggleFullscreen));
    assert!(v.is_fullscreen());
  }
}
