//! Markdown → UI tree.
//!
//! pulldown-cmark events are first folded into a small generic node tree,
//! then lowered into typed `Block`/`Inline` values the client renders
//! one-to-one. Three things get special handling on the way down:
//! - fenced code languages go through an alias table, unknown tags lose
//!   their language (plain code, no highlighting);
//! - `mermaid` fences become `Diagram` blocks and never reach the highlighter;
//! - blockquotes opening with `[!NOTE]`-style markers become callouts.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use serde::Serialize;

pub mod diagram;

pub use diagram::DiagramViewport;

/// Languages the client highlighter knows. Anything else renders plain.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CodeLanguage {
  Diagram,
  Sql,
  Javascript,
  Typescript,
  Python,
  Rust,
  Bash,
  Terraform,
}

impl CodeLanguage {
  /// Normalise a fence tag ("py", "RS", "zsh"...). Case-insensitive.
  pub fn from_tag(tag: &str) -> Option<CodeLanguage> {
    let lang = match tag.trim().to_ascii_lowercase().as_str() {
      "diagram" => CodeLanguage::Diagram,
      "sql" | "psql" | "postgresql" => CodeLanguage::Sql,
      "javascript" | "js" => CodeLanguage::Javascript,
      "typescript" | "ts" => CodeLanguage::Typescript,
      "python" | "py" => CodeLanguage::Python,
      "rust" | "rs" => CodeLanguage::Rust,
      "bash" | "sh" | "shell" | "zsh" => CodeLanguage::Bash,
      "terraform" | "hcl" | "tf" => CodeLanguage::Terraform,
      _ => return None,
    };
    Some(lang)
  }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalloutKind {
  Info,
  Warning,
  Danger,
  Success,
}

impl CalloutKind {
  /// Marker tokens, checked in this order.
  const MARKERS: [(&'static str, CalloutKind); 6] = [
    ("[!NOTE]", CalloutKind::Info),
    ("[!INFO]", CalloutKind::Info),
    ("[!WARNING]", CalloutKind::Warning),
    ("[!DANGER]", CalloutKind::Danger),
    ("[!ERROR]", CalloutKind::Danger),
    ("[!SUCCESS]", CalloutKind::Success),
  ];

  pub fn icon(self) -> &'static str {
    match self {
      CalloutKind::Info => "info",
      CalloutKind::Warning => "alert-triangle",
      CalloutKind::Danger => "alert-circle",
      CalloutKind::Success => "check-circle",
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
  Heading { level: u8, anchor: String, inlines: Vec<Inline> },
  Paragraph { inlines: Vec<Inline> },
  List { ordered: bool, start: Option<u64>, items: Vec<Vec<Block>> },
  Code { language: Option<CodeLanguage>, source: String },
  /// Client-rendered diagram. `error` is set when the source failed validation;
  /// the client then shows it next to `source` instead of a drawing.
  Diagram { source: String, kind: Option<String>, error: Option<String> },
  Callout { kind: CalloutKind, icon: &'static str, blocks: Vec<Block> },
  Quote { blocks: Vec<Block> },
  Table { head: Vec<Vec<Inline>>, rows: Vec<Vec<Vec<Inline>>> },
  Rule,
  Html { html: String },
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
  Text { text: String },
  Strong { children: Vec<Inline> },
  Emphasis { children: Vec<Inline> },
  Strikethrough { children: Vec<Inline> },
  Code { code: String },
  /// `external` links open in a new tab.
  Link { href: String, title: Option<String>, external: bool, children: Vec<Inline> },
  /// `alt` doubles as the visible caption.
  Image { src: String, alt: String, title: Option<String> },
  LineBreak,
  TaskMarker { checked: bool },
  Html { html: String },
}

#[derive(Clone, Debug, Serialize, PartialEq, Default)]
pub struct Document {
  pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct OutlineEntry {
  pub level: u8,
  pub text: String,
  pub anchor: String,
}

// Intermediate tree, one node per event / tag pair.
#[derive(Debug)]
enum Node {
  Elem(Elem, Vec<Node>),
  Text(String),
  Code(String),
  Html(String),
  HardBreak,
  Rule,
  Task(bool),
}

#[derive(Debug)]
enum Elem {
  Root,
  Paragraph,
  Heading(u8),
  Quote,
  CodeBlock(Option<String>),
  HtmlBlock,
  List(Option<u64>),
  Item,
  Table,
  TableHead,
  TableRow,
  TableCell,
  Emphasis,
  Strong,
  Strikethrough,
  Link { href: String, title: Option<String> },
  Image { src: String, title: Option<String> },
  /// Anything we don't model; children are kept, the wrapper is dropped.
  Other,
}

/// Render a markdown body into a UI tree. Never fails.
pub fn render(markdown: &str) -> Document {
  let mut anchors = Anchors::default();
  let root = parse_tree(markdown);
  Document { blocks: lower_blocks(root, &mut anchors) }
}

/// Headings in document order, for in-page navigation.
pub fn outline(doc: &Document) -> Vec<OutlineEntry> {
  doc
    .blocks
    .iter()
    .filter_map(|b| match b {
      Block::Heading { level, anchor, inlines } => {
        Some(OutlineEntry { level: *level, text: plain_text(inlines), anchor: anchor.clone() })
      }
      _ => None,
    })
    .collect()
}

/// Visible text of an inline run, markup stripped.
pub fn plain_text(inlines: &[Inline]) -> String {
  let mut out = String::new();
  for i in inlines {
    match i {
      Inline::Text { text } => out.push_str(text),
      Inline::Code { code } => out.push_str(code),
      Inline::Strong { children }
      | Inline::Emphasis { children }
      | Inline::Strikethrough { children }
      | Inline::Link { children, .. } => out.push_str(&plain_text(children)),
      Inline::Image { alt, .. } => out.push_str(alt),
      Inline::LineBreak => out.push(' '),
      Inline::TaskMarker { .. } | Inline::Html { .. } => {}
    }
  }
  out
}

fn parse_tree(markdown: &str) -> Vec<Node> {
  let opts = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
  let mut stack: Vec<(Elem, Vec<Node>)> = vec![(Elem::Root, Vec::new())];

  for event in Parser::new_ext(markdown, opts) {
    match event {
      Event::Start(tag) => stack.push((elem_for(tag), Vec::new())),
      Event::End(_) => {
        // Start/End are balanced; never pop the root.
        if stack.len() > 1 {
          if let Some((elem, children)) = stack.pop() {
            push_node(&mut stack, Node::Elem(elem, children));
          }
        }
      }
      Event::Text(t) => push_node(&mut stack, Node::Text(t.into_string())),
      Event::SoftBreak => push_node(&mut stack, Node::Text(" ".into())),
      Event::Code(c) => push_node(&mut stack, Node::Code(c.into_string())),
      Event::Html(h) | Event::InlineHtml(h) => push_node(&mut stack, Node::Html(h.into_string())),
      Event::HardBreak => push_node(&mut stack, Node::HardBreak),
      Event::Rule => push_node(&mut stack, Node::Rule),
      Event::TaskListMarker(checked) => push_node(&mut stack, Node::Task(checked)),
      _ => {}
    }
  }

  // Unbalanced input cannot happen with pulldown-cmark, but fold leftovers anyway.
  while stack.len() > 1 {
    if let Some((elem, children)) = stack.pop() {
      push_node(&mut stack, Node::Elem(elem, children));
    }
  }
  stack.pop().map(|(_, children)| children).unwrap_or_default()
}

fn elem_for(tag: Tag<'_>) -> Elem {
  match tag {
    Tag::Paragraph => Elem::Paragraph,
    Tag::Heading { level, .. } => Elem::Heading(level as u8),
    Tag::BlockQuote(_) => Elem::Quote,
    Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
      // Info strings may carry attributes after the language: "rust ignore".
      let lang = info.split_whitespace().next().map(str::to_string);
      Elem::CodeBlock(lang)
    }
    Tag::CodeBlock(CodeBlockKind::Indented) => Elem::CodeBlock(None),
    Tag::HtmlBlock => Elem::HtmlBlock,
    Tag::List(start) => Elem::List(start),
    Tag::Item => Elem::Item,
    Tag::Table(_) => Elem::Table,
    Tag::TableHead => Elem::TableHead,
    Tag::TableRow => Elem::TableRow,
    Tag::TableCell => Elem::TableCell,
    Tag::Emphasis => Elem::Emphasis,
    Tag::Strong => Elem::Strong,
    Tag::Strikethrough => Elem::Strikethrough,
    Tag::Link { dest_url, title, .. } => Elem::Link { href: dest_url.into_string(), title: non_empty(title.into_string()) },
    Tag::Image { dest_url, title, .. } => Elem::Image { src: dest_url.into_string(), title: non_empty(title.into_string()) },
    _ => Elem::Other,
  }
}

fn non_empty(s: String) -> Option<String> { if s.is_empty() { None } else { Some(s) } }

/// Append to the innermost open element, merging adjacent text so markers
/// split across events ("[", "!NOTE", "]") read as one run.
fn push_node(stack: &mut [(Elem, Vec<Node>)], node: Node) {
  let Some((_, children)) = stack.last_mut() else { return };
  if let Node::Text(t) = &node {
    if let Some(Node::Text(prev)) = children.last_mut() {
      prev.push_str(t);
      return;
    }
  }
  children.push(node);
}

fn is_inline(node: &Node) -> bool {
  match node {
    Node::Text(_) | Node::Code(_) | Node::Html(_) | Node::HardBreak | Node::Task(_) => true,
    Node::Rule => false,
    Node::Elem(e, _) => matches!(
      e,
      Elem::Emphasis | Elem::Strong | Elem::Strikethrough | Elem::Link { .. } | Elem::Image { .. } | Elem::Other
    ),
  }
}

/// Lower block-level nodes. Runs of bare inline nodes (tight list items)
/// are wrapped in an implicit paragraph.
fn lower_blocks(nodes: Vec<Node>, anchors: &mut Anchors) -> Vec<Block> {
  let mut out = Vec::new();
  let mut pending: Vec<Node> = Vec::new();

  let flush = |pending: &mut Vec<Node>, out: &mut Vec<Block>| {
    if pending.is_empty() {
      return;
    }
    let inlines = lower_inlines(std::mem::take(pending));
    if !inlines.is_empty() {
      out.push(Block::Paragraph { inlines });
    }
  };

  for node in nodes {
    if is_inline(&node) {
      pending.push(node);
      continue;
    }
    flush(&mut pending, &mut out);
    match node {
      Node::Rule => out.push(Block::Rule),
      Node::Elem(elem, children) => out.extend(lower_block(elem, children, anchors)),
      _ => {}
    }
  }
  flush(&mut pending, &mut out);
  out
}

fn lower_block(elem: Elem, children: Vec<Node>, anchors: &mut Anchors) -> Vec<Block> {
  let block = match elem {
    Elem::Paragraph => {
      let inlines = lower_inlines(children);
      if inlines.is_empty() {
        return Vec::new();
      }
      Block::Paragraph { inlines }
    }
    Elem::Heading(level) => {
      let inlines = lower_inlines(children);
      let anchor = anchors.next(&plain_text(&inlines));
      Block::Heading { level, anchor, inlines }
    }
    Elem::CodeBlock(lang) => code_block(lang.as_deref(), raw_text(&children)),
    Elem::HtmlBlock => Block::Html { html: raw_text(&children) },
    Elem::Quote => quote_block(lower_blocks(children, anchors)),
    Elem::List(start) => {
      let items = children
        .into_iter()
        .filter_map(|n| match n {
          Node::Elem(Elem::Item, item) => Some(lower_blocks(item, anchors)),
          _ => None,
        })
        .collect();
      Block::List { ordered: start.is_some(), start, items }
    }
    Elem::Table => table_block(children),
    // Stray wrappers at block level: lower their content in place.
    _ => return lower_blocks(children, anchors),
  };
  vec![block]
}

fn code_block(lang: Option<&str>, mut source: String) -> Block {
  if source.ends_with('\n') {
    source.pop();
  }
  match lang.map(|l| l.trim().to_ascii_lowercase()) {
    Some(l) if l == "mermaid" => match diagram::check(&source) {
      Ok(kind) => Block::Diagram { source, kind: Some(kind.to_string()), error: None },
      Err(e) => Block::Diagram { source, kind: None, error: Some(e.to_string()) },
    },
    Some(l) => Block::Code { language: CodeLanguage::from_tag(&l), source },
    None => Block::Code { language: None, source },
  }
}

/// Detect a leading `[!KIND]` marker; strip it and wrap as a callout.
fn quote_block(mut blocks: Vec<Block>) -> Block {
  let detected = match blocks.first_mut() {
    Some(Block::Paragraph { inlines }) => take_marker(inlines),
    _ => None,
  };
  match detected {
    Some(kind) => {
      if matches!(blocks.first(), Some(Block::Paragraph { inlines }) if inlines.is_empty()) {
        blocks.remove(0);
      }
      Block::Callout { kind, icon: kind.icon(), blocks }
    }
    None => Block::Quote { blocks },
  }
}

fn take_marker(inlines: &mut Vec<Inline>) -> Option<CalloutKind> {
  let Some(Inline::Text { text }) = inlines.first_mut() else { return None };
  let trimmed = text.trim_start();
  let (marker, kind) = CalloutKind::MARKERS.iter().find(|(m, _)| trimmed.starts_with(m))?;
  let rest = trimmed[marker.len()..].trim_start().to_string();
  if rest.is_empty() {
    inlines.remove(0);
    // The marker usually sits on its own line, followed by a break.
    if matches!(inlines.first(), Some(Inline::LineBreak)) {
      inlines.remove(0);
    }
  } else {
    *text = rest;
  }
  Some(*kind)
}

fn table_block(children: Vec<Node>) -> Block {
  let mut head = Vec::new();
  let mut rows = Vec::new();
  for node in children {
    match node {
      Node::Elem(Elem::TableHead, cells) => {
        for c in cells {
          match c {
            Node::Elem(Elem::TableCell, content) => head.push(lower_inlines(content)),
            // Older layouts nest a row inside the head.
            Node::Elem(Elem::TableRow, row) => head.extend(row_cells(row)),
            _ => {}
          }
        }
      }
      Node::Elem(Elem::TableRow, row) => rows.push(row_cells(row)),
      _ => {}
    }
  }
  Block::Table { head, rows }
}

fn row_cells(row: Vec<Node>) -> Vec<Vec<Inline>> {
  row
    .into_iter()
    .filter_map(|c| match c {
      Node::Elem(Elem::TableCell, content) => Some(lower_inlines(content)),
      _ => None,
    })
    .collect()
}

fn lower_inlines(nodes: Vec<Node>) -> Vec<Inline> {
  let mut out = Vec::new();
  for node in nodes {
    match node {
      Node::Text(text) => out.push(Inline::Text { text }),
      Node::Code(code) => out.push(Inline::Code { code }),
      Node::Html(html) => out.push(Inline::Html { html }),
      Node::HardBreak => out.push(Inline::LineBreak),
      Node::Task(checked) => out.push(Inline::TaskMarker { checked }),
      Node::Rule => {}
      Node::Elem(elem, children) => match elem {
        Elem::Strong => out.push(Inline::Strong { children: lower_inlines(children) }),
        Elem::Emphasis => out.push(Inline::Emphasis { children: lower_inlines(children) }),
        Elem::Strikethrough => out.push(Inline::Strikethrough { children: lower_inlines(children) }),
        Elem::Link { href, title } => {
          let external = href.starts_with("http://") || href.starts_with("https://");
          out.push(Inline::Link { href, title, external, children: lower_inlines(children) });
        }
        Elem::Image { src, title } => out.push(Inline::Image { src, alt: raw_text(&children), title }),
        // Block content nested where inlines are expected: keep its text.
        _ => out.extend(lower_inlines(children)),
      },
    }
  }
  out
}

/// Concatenated text of a subtree (code blocks, HTML blocks, image alt).
fn raw_text(nodes: &[Node]) -> String {
  let mut out = String::new();
  for n in nodes {
    match n {
      Node::Text(t) | Node::Code(t) | Node::Html(t) => out.push_str(t),
      Node::HardBreak => out.push('\n'),
      Node::Elem(_, children) => out.push_str(&raw_text(children)),
      Node::Rule | Node::Task(_) => {}
    }
  }
  out
}

/// Heading anchors: slugified text, de-duplicated with a numeric suffix.
#[derive(Default)]
struct Anchors {
  seen: std::collections::HashMap<String, usize>,
}

impl Anchors {
  fn next(&mut self, text: &str) -> String {
    let mut slug = String::new();
    for c in text.trim().chars().flat_map(char::to_lowercase) {
      if c.is_alphanumeric() {
        slug.push(c);
      } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
        slug.push('-');
      }
    }
    let base = slug.trim_matches('-').to_string();
    let base = if base.is_empty() { "section".to_string() } else { base };
    let n = self.seen.entry(base.clone()).or_insert(0);
    *n += 1;
    if *n == 1 { base } else { format!("{base}-{}", *n - 1) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(s: &str) -> Inline { Inline::Text { text: s.into() } }

  // ==================== code & diagrams ====================

  #[test]
  fn py_fence_is_normalised_to_python() {
    let doc = render("```py\nprint('hi')\n```\n");
    assert_eq!(
      doc.blocks,
      vec![Block::Code { language: Some(CodeLanguage::Python), source: "print('hi')".into() }]
    );
  }

  #[test]
  fn aliases_and_unknown_tags() {
    for (tag, lang) in [("rs", CodeLanguage::Rust), ("zsh", CodeLanguage::Bash), ("PSQL", CodeLanguage::Sql), ("tf", CodeLanguage::Terraform)] {
      assert_eq!(CodeLanguage::from_tag(tag), Some(lang), "{tag}");
    }
    let doc = render("```brainfuck\n+++\n```\n\n    indented\n");
    assert_eq!(
      doc.blocks,
      vec![
        Block::Code { language: None, source: "+++".into() },
        Block::Code { language: None, source: "indented".into() },
      ]
    );
  }

  #[test]
  fn mermaid_fence_becomes_a_diagram_not_code() {
    let doc = render("```mermaid\ngraph TD\n  A-->B\n```\n");
    match &doc.blocks[..] {
      [Block::Diagram { source, kind, error }] => {
        assert_eq!(source, "graph TD\n  A-->B");
        assert_eq!(kind.as_deref(), Some("graph"));
        assert!(error.is_none());
      }
      other => panic!("expected a diagram, got {other:?}"),
    }
  }

  #[test]
  fn invalid_diagram_keeps_source_and_reports_error() {
    let doc = render("```mermaid\nnot a diagram\n```\n");
    match &doc.blocks[..] {
      [Block::Diagram { source, kind: None, error: Some(e) }] => {
        assert_eq!(source, "not a diagram");
        assert!(e.contains("not"), "{e}");
      }
      other => panic!("expected a failed diagram, got {other:?}"),
    }
  }

  // ==================== callouts ====================

  #[test]
  fn warning_marker_becomes_a_warning_callout() {
    let doc = render("> [!WARNING]\n> Mind the gap.\n");
    assert_eq!(
      doc.blocks,
      vec![Block::Callout {
        kind: CalloutKind::Warning,
        icon: "alert-triangle",
        blocks: vec![Block::Paragraph { inlines: vec![text("Mind the gap.")] }],
      }]
    );
  }

  #[test]
  fn every_marker_maps_to_its_kind() {
    for (marker, kind) in [("NOTE", CalloutKind::Info), ("INFO", CalloutKind::Info), ("DANGER", CalloutKind::Danger), ("ERROR", CalloutKind::Danger), ("SUCCESS", CalloutKind::Success)] {
      let doc = render(&format!("> [!{marker}] Body\n"));
      match &doc.blocks[..] {
        [Block::Callout { kind: k, blocks, .. }] => {
          assert_eq!(*k, kind);
          assert_eq!(blocks, &vec![Block::Paragraph { inlines: vec![text("Body")] }]);
        }
        other => panic!("{marker}: {other:?}"),
      }
    }
  }

  #[test]
  fn plain_blockquote_stays_a_quote() {
    let doc = render("> Just a thought.\n");
    assert_eq!(
      doc.blocks,
      vec![Block::Quote { blocks: vec![Block::Paragraph { inlines: vec![text("Just a thought.")] }] }]
    );
  }

  // ==================== general structure ====================

  #[test]
  fn links_images_and_lists() {
    let doc = render("- [site](https://example.com)\n- [local](/en/courses)\n\n![A cat](cat.png)\n");
    let Block::List { ordered, items, .. } = &doc.blocks[0] else { panic!("{:?}", doc.blocks) };
    assert!(!ordered);
    assert_eq!(items.len(), 2);
    let external: Vec<bool> = items
      .iter()
      .map(|item| match &item[0] {
        Block::Paragraph { inlines } => matches!(inlines[0], Inline::Link { external: true, .. }),
        _ => false,
      })
      .collect();
    assert_eq!(external, vec![true, false]);
    assert_eq!(
      doc.blocks[1],
      Block::Paragraph { inlines: vec![Inline::Image { src: "cat.png".into(), alt: "A cat".into(), title: None }] }
    );
  }

  #[test]
  fn tables_have_head_and_rows() {
    let doc = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
    assert_eq!(
      doc.blocks,
      vec![Block::Table { head: vec![vec![text("a")], vec![text("b")]], rows: vec![vec![vec![text("1")], vec![text("2")]]] }]
    );
  }

  #[test]
  fn outline_lists_headings_with_unique_anchors() {
    let doc = render("# Intro\n\ntext\n\n## Setup & Install\n\n## Setup & Install\n");
    let o = outline(&doc);
    let anchors: Vec<_> = o.iter().map(|e| (e.level, e.anchor.as_str())).collect();
    assert_eq!(anchors, vec![(1, "intro"), (2, "setup-install"), (2, "setup-install-1")]);
    assert_eq!(o[1].text, "Setup & Install");
  }
}
