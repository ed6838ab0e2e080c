//! Tools: `tools/<slug>/<locale>.md`. The slug must name a known widget.

use serde::Deserialize;
use tracing::{debug, warn};

use super::{list_dirs, read_markdown, ContentStore, Lookup};
use crate::domain::{Locale, Localized, ToolKind, ToolMetadata};

const DEFAULT_ORDER: i64 = 999;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ToolFront {
  title: Option<String>,
  description: Option<String>,
  category: Option<String>,
  icon: Option<String>,
  order: Option<i64>,
}

impl ContentStore {
  pub fn tool(&self, kind: ToolKind, locale: Locale) -> Option<Localized<ToolMetadata>> {
    let dir = self.root().join("tools").join(kind.slug());
    self.with_fallback(locale, |l| match read_markdown::<ToolFront>(&dir.join(format!("{}.md", l.code()))) {
      Lookup::Found((f, _body)) => Lookup::Found(ToolMetadata {
        slug: kind.slug().to_string(),
        kind,
        title: f.title.unwrap_or_else(|| kind.slug().to_string()),
        description: f.description.unwrap_or_default(),
        category: f.category.unwrap_or_else(|| "uncategorized".to_string()),
        icon: f.icon,
        order: f.order.unwrap_or(DEFAULT_ORDER),
      }),
      Lookup::Absent => Lookup::Absent,
      Lookup::Broken => Lookup::Broken,
    })
  }

  /// Lookup by URL slug; unknown slugs are not-found.
  pub fn tool_by_slug(&self, slug: &str, locale: Locale) -> Option<Localized<ToolMetadata>> {
    ToolKind::from_slug(slug).and_then(|kind| self.tool(kind, locale))
  }

  /// Known tools present on disk, ordered by `order` then slug.
  pub fn tools(&self, locale: Locale) -> Vec<Localized<ToolMetadata>> {
    let mut out = Vec::new();
    for name in list_dirs(&self.root().join("tools")) {
      match ToolKind::from_slug(&name) {
        Some(kind) => out.extend(self.tool(kind, locale)),
        None => warn!(target: "content", tool = %name, "Skipping tool directory with no matching widget"),
      }
    }
    out.sort_by(|a, b| a.value.order.cmp(&b.value.order).then_with(|| a.value.slug.cmp(&b.value.slug)));
    debug!(target: "content", %locale, count = out.len(), "Listed tools");
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::content::testutil::write;

  #[test]
  fn tools_are_ordered_and_unknown_dirs_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tools/swot-matrix/en.md", "---\ntitle: SWOT\ncategory: strategy\norder: 2\n---\n");
    write(dir.path(), "tools/eisenhower-matrix/en.md", "---\ntitle: Eisenhower\norder: 1\n---\n");
    write(dir.path(), "tools/eisenhower-matrix/es.md", "---\ntitle: Matriz de Eisenhower\norder: 1\n---\n");
    write(dir.path(), "tools/llm-prompt-builder/en.md", "---\ntitle: Prompt Builder\n---\n");
    write(dir.path(), "tools/kanban-board/en.md", "---\ntitle: Kanban\n---\n");
    let s = ContentStore::new(dir.path(), Locale::En);

    let tools = s.tools(Locale::Es);
    let got: Vec<_> = tools.iter().map(|t| (t.value.title.as_str(), t.value.order, t.fallback)).collect();
    assert_eq!(
      got,
      vec![("Matriz de Eisenhower", 1, false), ("SWOT", 2, true), ("Prompt Builder", 999, true)]
    );
    assert_eq!(tools[2].value.category, "uncategorized");
    assert!(s.tool_by_slug("kanban-board", Locale::En).is_none());
    assert!(s.tool(ToolKind::BrainWritingSession, Locale::En).is_none());
  }
}
