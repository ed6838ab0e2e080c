//! Page view models: what each route hands to the client, assembled from the
//! content store and the markdown renderer. Every builder takes the
//! request's `RenderContext` explicitly and returns plain serde data.
//!
//! Search is a case-insensitive substring match over the listed fields.
//! Filters with no selection match everything.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::SiteConfig;
use crate::content::dictionary::Dictionary;
use crate::content::ContentStore;
use crate::domain::{
  CourseInfo, Difficulty, GameCategory, GameMetadata, LanguagePair, LessonMeta, LibraryResource, Localized,
  ResourceType, ToolKind, ToolMetadata,
};
use crate::locale::RenderContext;
use crate::markdown::{self, Document, OutlineEntry};
use crate::widgets::brainwriting::Method;
use crate::widgets::eisenhower::Priority;
use crate::widgets::matching::PairBounds;
use crate::widgets::prompt::{PromptLabels, Tone};
use crate::widgets::swot::Quadrant;

const DIFFICULTY_ORDER: [Difficulty; 4] =
  [Difficulty::Beginner, Difficulty::Intermediate, Difficulty::Advanced, Difficulty::All];

fn matches_query(query: &str, fields: &[&str]) -> bool {
  let q = query.trim().to_lowercase();
  q.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(&q))
}

/// Comma-separated filter list from a query string; blanks dropped.
fn split_list(raw: Option<&str>) -> Vec<String> {
  raw
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

/// Accepts the same spellings as frontmatter ("avanzado" included).
fn parse_difficulty(s: &str) -> Option<Difficulty> { Difficulty::parse(s) }

// ==================== home ====================

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ContentCounts {
  pub courses: usize,
  pub games: usize,
  pub resources: usize,
  pub tools: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HomeView {
  pub ctx: RenderContext,
  pub featured_courses: Vec<Localized<CourseInfo>>,
  pub tools: Vec<Localized<ToolMetadata>>,
  pub counts: ContentCounts,
}

#[instrument(level = "debug", skip(store, cfg))]
pub fn home(store: &ContentStore, cfg: &SiteConfig, ctx: RenderContext) -> HomeView {
  let courses = store.courses(ctx.locale);
  let tools = store.tools(ctx.locale);
  let counts = ContentCounts {
    courses: courses.len(),
    games: store.games(ctx.locale).len(),
    resources: store.resources(ctx.locale).len(),
    tools: tools.len(),
  };
  HomeView {
    ctx,
    featured_courses: courses.into_iter().take(cfg.site.featured_courses).collect(),
    tools,
    counts,
  }
}

// ==================== courses ====================

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CourseQuery {
  pub q: Option<String>,
  pub difficulty: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CourseGroup {
  /// Lowercased area with whitespace runs as `_`; dictionary key under `areas.`.
  pub area_key: String,
  pub label: String,
  pub courses: Vec<Localized<CourseInfo>>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CoursesView {
  pub ctx: RenderContext,
  pub query: String,
  pub difficulty: Option<Difficulty>,
  /// Difficulties present across all courses, for the filter chips.
  pub difficulties: Vec<Difficulty>,
  pub total: usize,
  pub groups: Vec<CourseGroup>,
}

fn area_key(area: &str) -> String { area.to_lowercase().split_whitespace().collect::<Vec<_>>().join("_") }

#[instrument(level = "debug", skip(store, dict))]
pub fn courses(store: &ContentStore, dict: &Dictionary, ctx: RenderContext, query: &CourseQuery) -> CoursesView {
  let all = store.courses(ctx.locale);
  let q = query.q.clone().unwrap_or_default();
  let difficulty = query.difficulty.as_deref().and_then(parse_difficulty);

  let difficulties = DIFFICULTY_ORDER
    .into_iter()
    .filter(|d| all.iter().any(|c| c.value.difficulty == Some(*d)))
    .collect();
  let total = all.len();

  let mut groups: Vec<CourseGroup> = Vec::new();
  for c in all {
    let info = &c.value;
    let author = info.author.as_deref().unwrap_or_default();
    if !matches_query(&q, &[&info.title, &info.description, &info.area, author]) {
      continue;
    }
    if difficulty.is_some() && info.difficulty != difficulty {
      continue;
    }
    let key = area_key(&info.area);
    match groups.iter_mut().find(|g| g.area_key == key) {
      Some(g) => g.courses.push(c),
      None => {
        let label = dict.get(&format!("areas.{key}")).unwrap_or_else(|| info.area.clone());
        groups.push(CourseGroup { area_key: key, label, courses: vec![c] });
      }
    }
  }

  CoursesView { ctx, query: q, difficulty, difficulties, total, groups }
}

// ==================== lesson ====================

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LessonLink {
  pub slug: String,
  pub title: String,
  pub href: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LessonView {
  pub ctx: RenderContext,
  pub course: Localized<CourseInfo>,
  pub slug: String,
  pub meta: LessonMeta,
  /// Locale the lesson body was read from; differs from `ctx.locale` on fallback.
  pub served_locale: crate::domain::Locale,
  pub fallback: bool,
  pub document: Document,
  pub outline: Vec<OutlineEntry>,
  /// 1-based.
  pub position: usize,
  pub total: usize,
  pub progress_percent: u32,
  pub previous: Option<LessonLink>,
  pub next: Option<LessonLink>,
  pub lessons: Vec<LessonLink>,
}

#[instrument(level = "debug", skip(store))]
pub fn lesson(store: &ContentStore, ctx: RenderContext, course: &str, slug: &str) -> Option<LessonView> {
  let info = store.course(course, ctx.locale)?;
  let lesson = store.lesson(course, slug, ctx.locale)?;

  let links: Vec<LessonLink> = store
    .lessons(course, ctx.locale)
    .into_iter()
    .map(|l| LessonLink {
      href: format!("/{}/courses/{}/{}", ctx.locale.code(), course, l.value.slug),
      slug: l.value.slug,
      title: l.value.meta.title,
    })
    .collect();
  let total = links.len();
  let idx = links.iter().position(|l| l.slug == slug).unwrap_or(0);
  let position = if total == 0 { 0 } else { idx + 1 };
  let progress_percent = if total == 0 { 0 } else { ((position as f64 / total as f64) * 100.0).round() as u32 };
  let previous = idx.checked_sub(1).and_then(|i| links.get(i)).cloned();
  let next = links.get(idx + 1).cloned();

  let document = markdown::render(&lesson.value.body);
  let outline = markdown::outline(&document);

  Some(LessonView {
    ctx,
    course: info,
    slug: lesson.value.slug,
    meta: lesson.value.meta,
    served_locale: lesson.locale,
    fallback: lesson.fallback,
    document,
    outline,
    position,
    total,
    progress_percent,
    previous,
    next,
    lessons: links,
  })
}

// ==================== games ====================

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchQuery {
  pub q: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GameGroup {
  pub category: GameCategory,
  pub label: &'static str,
  pub games: Vec<Localized<GameMetadata>>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GamesView {
  pub ctx: RenderContext,
  pub query: String,
  pub total: usize,
  pub groups: Vec<GameGroup>,
}

#[instrument(level = "debug", skip(store))]
pub fn games(store: &ContentStore, ctx: RenderContext, query: &SearchQuery) -> GamesView {
  let all = store.games(ctx.locale);
  let total = all.len();
  let q = query.q.clone().unwrap_or_default();
  let groups = GameCategory::ALL
    .into_iter()
    .filter_map(|category| {
      let games: Vec<_> = all
        .iter()
        .filter(|g| g.value.category == category)
        .filter(|g| matches_query(&q, &[&g.value.title, &g.value.description, category.label()]))
        .cloned()
        .collect();
      (!games.is_empty()).then_some(GameGroup { category, label: category.label(), games })
    })
    .collect();
  GamesView { ctx, query: q, total, groups }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct VocabularyGameView {
  pub ctx: RenderContext,
  pub slug: String,
  pub title: String,
  pub description: String,
  pub difficulty: Difficulty,
  pub language_pair: LanguagePair,
  pub served_locale: crate::domain::Locale,
  pub fallback: bool,
  pub word_count: usize,
  /// None when the word bank is empty; the game cannot start.
  pub bounds: Option<PairBounds>,
  pub default_pairs: Option<usize>,
}

#[instrument(level = "debug", skip(store, cfg))]
pub fn vocabulary_game(store: &ContentStore, cfg: &SiteConfig, ctx: RenderContext, slug: &str) -> Option<VocabularyGameView> {
  let game = store.vocabulary_game(slug, ctx.locale)?;
  let bounds = PairBounds::for_bank(&cfg.game, game.value.words.len());
  Some(VocabularyGameView {
    ctx,
    slug: slug.to_string(),
    word_count: game.value.words.len(),
    default_pairs: bounds.map(|b| b.default),
    bounds,
    served_locale: game.locale,
    fallback: game.fallback,
    title: game.value.title,
    description: game.value.description,
    difficulty: game.value.difficulty,
    language_pair: game.value.language_pair,
  })
}

// ==================== library ====================

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LibrarySort {
  #[default]
  Newest,
  Oldest,
  TitleAsc,
  TitleDesc,
  Rating,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LibraryQuery {
  pub q: Option<String>,
  /// Comma-separated resource types.
  #[serde(rename = "type")]
  pub types: Option<String>,
  /// Comma-separated categories, matched exactly.
  pub category: Option<String>,
  /// Comma-separated difficulties.
  pub difficulty: Option<String>,
  #[serde(default)]
  pub free_only: bool,
  #[serde(default)]
  pub sort: LibrarySort,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LibraryStats {
  pub total: usize,
  pub categories: usize,
  pub authors: usize,
  pub free: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LibraryView {
  pub ctx: RenderContext,
  pub sort: LibrarySort,
  /// Every category present, sorted, for the filter chips.
  pub categories: Vec<String>,
  pub stats: LibraryStats,
  pub resources: Vec<Localized<LibraryResource>>,
}

fn date_key(r: &LibraryResource) -> &str { r.last_updated.as_deref().or(r.publish_date.as_deref()).unwrap_or_default() }

#[instrument(level = "debug", skip(store))]
pub fn library(store: &ContentStore, ctx: RenderContext, query: &LibraryQuery) -> LibraryView {
  let all = store.resources(ctx.locale);

  let categories: BTreeSet<String> = all.iter().map(|r| r.value.category.clone()).collect();
  let authors: BTreeSet<&str> = all.iter().map(|r| r.value.author.as_str()).collect();
  let stats = LibraryStats {
    total: all.len(),
    categories: categories.len(),
    authors: authors.len(),
    free: all.iter().filter(|r| !r.value.is_paid).count(),
  };

  let q = query.q.clone().unwrap_or_default();
  let types: Vec<ResourceType> = split_list(query.types.as_deref()).iter().filter_map(|t| ResourceType::from_dir_name(t)).collect();
  let wanted_categories = split_list(query.category.as_deref());
  let difficulties: Vec<Difficulty> = split_list(query.difficulty.as_deref()).iter().filter_map(|d| parse_difficulty(d)).collect();

  let mut resources: Vec<Localized<LibraryResource>> = all
    .iter()
    .filter(|r| {
      let v = &r.value;
      let mut fields = vec![v.title.as_str(), v.description.as_str(), v.author.as_str()];
      fields.extend(v.tags.iter().map(String::as_str));
      matches_query(&q, &fields)
        && (types.is_empty() || types.contains(&v.kind))
        && (wanted_categories.is_empty() || wanted_categories.contains(&v.category))
        && (difficulties.is_empty() || v.difficulty.is_some_and(|d| difficulties.contains(&d)))
        && (!query.free_only || !v.is_paid)
    })
    .cloned()
    .collect();

  match query.sort {
    LibrarySort::Newest => resources.sort_by(|a, b| date_key(&b.value).cmp(date_key(&a.value))),
    LibrarySort::Oldest => resources.sort_by(|a, b| date_key(&a.value).cmp(date_key(&b.value))),
    LibrarySort::TitleAsc => resources.sort_by_key(|r| r.value.title.to_lowercase()),
    LibrarySort::TitleDesc => resources.sort_by(|a, b| b.value.title.to_lowercase().cmp(&a.value.title.to_lowercase())),
    LibrarySort::Rating => resources.sort_by(|a, b| {
      let (ra, rb) = (a.value.rating.unwrap_or(0.0), b.value.rating.unwrap_or(0.0));
      rb.total_cmp(&ra)
    }),
  }

  LibraryView { ctx, sort: query.sort, categories: categories.into_iter().collect(), stats, resources }
}

// ==================== tools ====================

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ToolGroup {
  pub category: String,
  pub tools: Vec<Localized<ToolMetadata>>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ToolsView {
  pub ctx: RenderContext,
  pub query: String,
  pub total: usize,
  pub groups: Vec<ToolGroup>,
}

#[instrument(level = "debug", skip(store))]
pub fn tools(store: &ContentStore, ctx: RenderContext, query: &SearchQuery) -> ToolsView {
  let all = store.tools(ctx.locale);
  let total = all.len();
  let q = query.q.clone().unwrap_or_default();
  let mut groups: Vec<ToolGroup> = Vec::new();
  for t in all {
    if !matches_query(&q, &[&t.value.title, &t.value.description, &t.value.category]) {
      continue;
    }
    match groups.iter_mut().find(|g| g.category == t.value.category) {
      Some(g) => g.tools.push(t),
      None => groups.push(ToolGroup { category: t.value.category.clone(), tools: vec![t] }),
    }
  }
  ToolsView { ctx, query: q, total, groups }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Choice {
  pub key: &'static str,
  pub label: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MethodInfo {
  pub key: Method,
  pub name: &'static str,
  pub ideas_per_round: usize,
  pub suggested_participants: usize,
  pub suggested_minutes: u32,
}

/// Static setup data the client needs to mount a tool's widget.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum WidgetSetup {
  PromptBuilder { tones: Vec<Choice> },
  BrainWriting { methods: Vec<MethodInfo> },
  Swot { quadrants: Vec<Choice> },
  Eisenhower { quadrants: Vec<Choice> },
}

impl WidgetSetup {
  pub fn for_kind(kind: ToolKind, dict: &Dictionary) -> WidgetSetup {
    let locale = dict.locale;
    match kind {
      ToolKind::LlmPromptBuilder => {
        let labels = PromptLabels::from_dictionary(dict);
        let tones = Tone::ALL.into_iter().zip(labels.tones).map(|(t, label)| Choice { key: t.key(), label }).collect();
        WidgetSetup::PromptBuilder { tones }
      }
      ToolKind::BrainWritingSession => WidgetSetup::BrainWriting {
        methods: [Method::SixThreeFive, Method::Constrained, Method::Free]
          .into_iter()
          .map(|m| MethodInfo {
            key: m,
            name: m.name(),
            ideas_per_round: m.ideas_per_round(),
            suggested_participants: m.suggested_participants(),
            suggested_minutes: m.suggested_minutes(),
          })
          .collect(),
      },
      ToolKind::SwotMatrix => WidgetSetup::Swot {
        quadrants: Quadrant::ALL.into_iter().map(|q| Choice { key: q.key(), label: q.label(locale).to_string() }).collect(),
      },
      ToolKind::EisenhowerMatrix => WidgetSetup::Eisenhower {
        quadrants: Priority::ALL.into_iter().map(|p| Choice { key: p.key(), label: p.label(locale).to_string() }).collect(),
      },
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ToolView {
  pub ctx: RenderContext,
  pub tool: Localized<ToolMetadata>,
  pub setup: WidgetSetup,
}

#[instrument(level = "debug", skip(store, dict))]
pub fn tool(store: &ContentStore, dict: &Dictionary, ctx: RenderContext, slug: &str) -> Option<ToolView> {
  let tool = store.tool_by_slug(slug, ctx.locale)?;
  let setup = WidgetSetup::for_kind(tool.value.kind, dict);
  Some(ToolView { ctx, tool, setup })
}

// ==================== not found ====================

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NotFoundView {
  pub ctx: RenderContext,
  pub title: String,
  pub message: String,
  pub back_label: String,
  pub back_href: String,
}

pub fn not_found(dict: &Dictionary, ctx: RenderContext) -> NotFoundView {
  NotFoundView {
    ctx,
    title: dict.text("errors.not_found.title"),
    message: dict.text("errors.not_found.message"),
    back_label: dict.text("errors.not_found.back"),
    back_href: format!("/{}", ctx.locale.code()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::content::testutil::write;
  use crate::domain::Locale;
  use crate::locale::Theme;

  fn ctx(locale: Locale) -> RenderContext { RenderContext { locale, theme: Theme::System, default_locale: Locale::En } }

  fn lesson_md(title: &str, order: i64) -> String { format!("---\ntitle: {title}\norder: {order}\n---\n# {title}\n\nBody.\n") }

  fn site() -> (tempfile::TempDir, ContentStore) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "courses/rust/course.json", r#"{"title": "Rust", "area": "Systems Programming", "difficulty": "beginner"}"#);
    write(root, "courses/rust/en/01-intro.md", &lesson_md("Intro", 1));
    write(root, "courses/rust/en/02-own.md", &lesson_md("Ownership", 2));
    write(root, "courses/rust/en/03-traits.md", &lesson_md("Traits", 3));
    write(root, "courses/rust/pt/01-intro.md", &lesson_md("Introdução", 1));
    write(root, "courses/sql/course.json", r#"{"title": "SQL", "area": "Data", "difficulty": "advanced", "author": "Dana"}"#);
    write(root, "courses/sql/en/01-select.md", &lesson_md("Select", 1));
    write(
      root,
      "library/en/video/a.md",
      "---\ntitle: Alpha\nauthor: Ann\ncategory: Rust\nurl: https://a\npublishDate: '2023-01-01'\nrating: 4.0\ndifficulty: beginner\ntags: [async]\n---\n",
    );
    write(
      root,
      "library/en/podcast/b.md",
      "---\ntitle: beta\nauthor: Bob\ncategory: Data\nurl: https://b\nlastUpdated: '2024-05-01'\nisPaid: true\n---\n",
    );
    write(root, "library/en/ebook/c.md", "---\ntitle: Gamma\nauthor: Ann\ncategory: Rust\nurl: https://c\nrating: 4.5\n---\n");
    let store = ContentStore::new(root, Locale::En);
    (dir, store)
  }

  // ==================== courses ====================

  #[test]
  fn courses_group_by_area_and_filter() {
    let (_dir, store) = site();
    let dict = store.dictionary(Locale::En);
    let view = courses(&store, &dict, ctx(Locale::En), &CourseQuery::default());
    assert_eq!(view.total, 2);
    assert_eq!(view.difficulties, vec![Difficulty::Beginner, Difficulty::Advanced]);
    assert_eq!(view.groups.len(), 2);
    assert_eq!(view.groups[0].area_key, "systems_programming");
    assert_eq!(view.groups[0].label, "Systems Programming");

    let view = courses(&store, &dict, ctx(Locale::En), &CourseQuery { q: Some("dana".into()), difficulty: None });
    assert_eq!(view.groups.len(), 1);
    assert_eq!(view.groups[0].courses[0].value.slug, "sql");

    let q = CourseQuery { q: None, difficulty: Some("iniciante".into()) };
    let view = courses(&store, &dict, ctx(Locale::En), &q);
    assert_eq!(view.difficulty, Some(Difficulty::Beginner));
    assert_eq!(view.groups.iter().map(|g| g.courses.len()).sum::<usize>(), 1);
  }

  // ==================== lesson ====================

  #[test]
  fn lesson_navigation_and_progress() {
    let (_dir, store) = site();
    let view = lesson(&store, ctx(Locale::En), "rust", "02-own").unwrap();
    assert_eq!((view.position, view.total, view.progress_percent), (2, 3, 67));
    assert_eq!(view.previous.unwrap().href, "/en/courses/rust/01-intro");
    assert_eq!(view.next.unwrap().slug, "03-traits");
    assert_eq!(view.outline[0].text, "Ownership");
    assert!(!view.fallback);

    let first = lesson(&store, ctx(Locale::En), "rust", "01-intro").unwrap();
    assert!(first.previous.is_none());
    let last = lesson(&store, ctx(Locale::En), "rust", "03-traits").unwrap();
    assert!(last.next.is_none());
    assert_eq!(last.progress_percent, 100);

    assert!(lesson(&store, ctx(Locale::En), "rust", "99-missing").is_none());
    assert!(lesson(&store, ctx(Locale::En), "nope", "01-intro").is_none());
  }

  #[test]
  fn lesson_falls_back_per_lesson() {
    let (_dir, store) = site();
    let translated = lesson(&store, ctx(Locale::Pt), "rust", "01-intro").unwrap();
    assert_eq!((translated.served_locale, translated.fallback), (Locale::Pt, false));
    assert_eq!(translated.meta.title, "Introdução");

    let fallback = lesson(&store, ctx(Locale::Pt), "rust", "02-own").unwrap();
    assert_eq!((fallback.served_locale, fallback.fallback), (Locale::En, true));
    assert_eq!(fallback.total, 3);
    assert_eq!(fallback.lessons[0].href, "/pt/courses/rust/01-intro");
  }

  // ==================== library ====================

  #[test]
  fn library_filters_sorts_and_counts() {
    let (_dir, store) = site();
    let all = library(&store, ctx(Locale::En), &LibraryQuery::default());
    assert_eq!(all.stats, LibraryStats { total: 3, categories: 2, authors: 2, free: 2 });
    assert_eq!(all.categories, vec!["Data", "Rust"]);
    let titles = |v: &LibraryView| v.resources.iter().map(|r| r.value.title.clone()).collect::<Vec<_>>();
    // Undated resources sort last when newest first.
    assert_eq!(titles(&all), vec!["beta", "Alpha", "Gamma"]);

    let q = LibraryQuery { sort: LibrarySort::TitleDesc, ..LibraryQuery::default() };
    assert_eq!(titles(&library(&store, ctx(Locale::En), &q)), vec!["Gamma", "beta", "Alpha"]);

    let q = LibraryQuery { sort: LibrarySort::Rating, free_only: true, ..LibraryQuery::default() };
    assert_eq!(titles(&library(&store, ctx(Locale::En), &q)), vec!["Gamma", "Alpha"]);

    let q = LibraryQuery { q: Some("ASYNC".into()), ..LibraryQuery::default() };
    assert_eq!(titles(&library(&store, ctx(Locale::En), &q)), vec!["Alpha"]);

    let q = LibraryQuery { types: Some("podcast,ebook".into()), category: Some("Rust".into()), ..LibraryQuery::default() };
    assert_eq!(titles(&library(&store, ctx(Locale::En), &q)), vec!["Gamma"]);

    let q = LibraryQuery { difficulty: Some("beginner".into()), ..LibraryQuery::default() };
    assert_eq!(titles(&library(&store, ctx(Locale::En), &q)), vec!["Alpha"]);
  }

  // ==================== tools & not found ====================

  #[test]
  fn tool_setup_carries_localized_choices() {
    let (_dir, store) = site();
    let dict = store.dictionary(Locale::Es);
    match WidgetSetup::for_kind(ToolKind::EisenhowerMatrix, &dict) {
      WidgetSetup::Eisenhower { quadrants } => assert_eq!(quadrants[0].label, "Haz Primero"),
      other => panic!("unexpected setup: {other:?}"),
    }
    match WidgetSetup::for_kind(ToolKind::BrainWritingSession, &dict) {
      WidgetSetup::BrainWriting { methods } => assert_eq!(methods[1].ideas_per_round, 2),
      other => panic!("unexpected setup: {other:?}"),
    }
  }

  #[test]
  fn not_found_uses_builtin_strings() {
    let (_dir, store) = site();
    let view = not_found(&store.dictionary(Locale::Pt), ctx(Locale::Pt));
    assert_eq!(view.title, "Página não encontrada");
    assert_eq!(view.back_href, "/pt");
  }
}
