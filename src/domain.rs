//! Domain models: the closed sets (locales, difficulty tiers, content kinds)
//! and the typed records the content loaders assemble.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Supported site locales. The set is closed; adding one is a code change.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
  En,
  Pt,
  Es,
}

impl Locale {
  pub const ALL: [Locale; 3] = [Locale::En, Locale::Pt, Locale::Es];

  pub fn code(self) -> &'static str {
    match self {
      Locale::En => "en",
      Locale::Pt => "pt",
      Locale::Es => "es",
    }
  }

  /// Exact match on the short code ("en", "pt", "es").
  pub fn from_code(code: &str) -> Option<Locale> {
    Locale::ALL.into_iter().find(|l| l.code() == code)
  }

  /// Name of the language in the language itself.
  pub fn native_name(self) -> &'static str {
    match self {
      Locale::En => "English",
      Locale::Pt => "Português",
      Locale::Es => "Español",
    }
  }

  pub fn flag(self) -> &'static str {
    match self {
      Locale::En => "🇺🇸",
      Locale::Pt => "🇧🇷",
      Locale::Es => "🇪🇸",
    }
  }
}

impl Default for Locale {
  fn default() -> Self { Locale::En }
}

impl fmt::Display for Locale {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.code()) }
}

/// Difficulty tier shared by lessons, courses, games and library resources.
/// Portuguese and Spanish spellings show up in translated frontmatter.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Difficulty {
  Beginner,
  Intermediate,
  Advanced,
  /// Library resources only: suitable for every level.
  All,
}

impl Difficulty {
  /// Case-insensitive; accepts the Portuguese and Spanish spellings.
  pub fn parse(s: &str) -> Option<Difficulty> {
    match s.trim().to_lowercase().as_str() {
      "beginner" | "iniciante" | "principiante" => Some(Difficulty::Beginner),
      "intermediate" | "intermediário" | "intermediario" | "intermedio" => Some(Difficulty::Intermediate),
      "advanced" | "avançado" | "avancado" | "avanzado" => Some(Difficulty::Advanced),
      "all" => Some(Difficulty::All),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Beginner => "beginner",
      Difficulty::Intermediate => "intermediate",
      Difficulty::Advanced => "advanced",
      Difficulty::All => "all",
    }
  }
}

impl TryFrom<String> for Difficulty {
  type Error = String;

  fn try_from(s: String) -> Result<Self, Self::Error> {
    Difficulty::parse(&s).ok_or_else(|| format!("unknown difficulty `{s}`"))
  }
}

/// A frontmatter scalar read as text, whatever YAML typed it as.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
  Text(String),
  Int(i64),
  Float(f64),
  Bool(bool),
}

impl Scalar {
  fn into_text(self) -> String {
    match self {
      Scalar::Text(s) => s,
      Scalar::Int(i) => i.to_string(),
      Scalar::Float(f) => f.to_string(),
      Scalar::Bool(b) => b.to_string(),
    }
  }
}

/// `duration: 15` and `duration: 15 min` both land as text.
pub(crate) fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
  Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_text))
}

/// Unknown difficulty values are dropped with a warning instead of failing
/// the whole record.
pub(crate) fn lenient_difficulty<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Difficulty>, D::Error> {
  let Some(raw) = Option::<Scalar>::deserialize(d)? else { return Ok(None) };
  let text = raw.into_text();
  let parsed = Difficulty::parse(&text);
  if parsed.is_none() {
    warn!(target: "content", value = %text, "Ignoring unknown difficulty");
  }
  Ok(parsed)
}

/// Library resource kinds; one directory per kind under `library/<locale>/`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
  Video,
  Ebook,
  Course,
  Blog,
  Repository,
  Podcast,
  Article,
}

impl ResourceType {
  pub const ALL: [ResourceType; 7] = [
    ResourceType::Video,
    ResourceType::Ebook,
    ResourceType::Course,
    ResourceType::Blog,
    ResourceType::Repository,
    ResourceType::Podcast,
    ResourceType::Article,
  ];

  pub fn dir_name(self) -> &'static str {
    match self {
      ResourceType::Video => "video",
      ResourceType::Ebook => "ebook",
      ResourceType::Course => "course",
      ResourceType::Blog => "blog",
      ResourceType::Repository => "repository",
      ResourceType::Podcast => "podcast",
      ResourceType::Article => "article",
    }
  }

  pub fn from_dir_name(name: &str) -> Option<ResourceType> {
    ResourceType::ALL.into_iter().find(|t| t.dir_name() == name)
  }

  pub fn label(self) -> &'static str {
    match self {
      ResourceType::Video => "Video",
      ResourceType::Ebook => "E-Book",
      ResourceType::Course => "Online Course",
      ResourceType::Blog => "Blog Post",
      ResourceType::Repository => "Code Repository",
      ResourceType::Podcast => "Podcast",
      ResourceType::Article => "Article",
    }
  }

  pub fn icon(self) -> &'static str {
    match self {
      ResourceType::Video => "video",
      ResourceType::Ebook => "book-open",
      ResourceType::Course => "graduation-cap",
      ResourceType::Blog => "file-text",
      ResourceType::Repository => "github",
      ResourceType::Podcast => "headphones",
      ResourceType::Article => "newspaper",
    }
  }
}

/// Game kinds; one directory per kind under `games/`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum GameCategory {
  Vocabulary,
  Grammar,
  Math,
  Coding,
  Physics,
  Logic,
  Fun,
}

impl GameCategory {
  pub const ALL: [GameCategory; 7] = [
    GameCategory::Vocabulary,
    GameCategory::Grammar,
    GameCategory::Math,
    GameCategory::Coding,
    GameCategory::Physics,
    GameCategory::Logic,
    GameCategory::Fun,
  ];

  pub fn dir_name(self) -> &'static str {
    match self {
      GameCategory::Vocabulary => "vocabulary",
      GameCategory::Grammar => "grammar",
      GameCategory::Math => "math",
      GameCategory::Coding => "coding",
      GameCategory::Physics => "physics",
      GameCategory::Logic => "logic",
      GameCategory::Fun => "fun",
    }
  }

  pub fn from_dir_name(name: &str) -> Option<GameCategory> {
    GameCategory::ALL.into_iter().find(|c| c.dir_name() == name)
  }

  pub fn label(self) -> &'static str {
    match self {
      GameCategory::Vocabulary => "Vocabulary",
      GameCategory::Grammar => "Grammar",
      GameCategory::Math => "Mathematics",
      GameCategory::Coding => "Coding",
      GameCategory::Physics => "Physics",
      GameCategory::Logic => "Logic",
      GameCategory::Fun => "Fun",
    }
  }
}

/// Interactive tools the site knows how to mount. A tool directory whose
/// slug is not listed here has no widget and is skipped by the loader.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
  LlmPromptBuilder,
  BrainWritingSession,
  SwotMatrix,
  EisenhowerMatrix,
}

impl ToolKind {
  pub const ALL: [ToolKind; 4] = [
    ToolKind::LlmPromptBuilder,
    ToolKind::BrainWritingSession,
    ToolKind::SwotMatrix,
    ToolKind::EisenhowerMatrix,
  ];

  pub fn slug(self) -> &'static str {
    match self {
      ToolKind::LlmPromptBuilder => "llm-prompt-builder",
      ToolKind::BrainWritingSession => "brain-writing-session",
      ToolKind::SwotMatrix => "swot-matrix",
      ToolKind::EisenhowerMatrix => "eisenhower-matrix",
    }
  }

  pub fn from_slug(slug: &str) -> Option<ToolKind> {
    ToolKind::ALL.into_iter().find(|k| k.slug() == slug)
  }
}

/// A record together with the locale it was actually read from.
/// `fallback` is true when the requested locale had no copy.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Localized<T> {
  #[serde(flatten)]
  pub value: T,
  pub locale: Locale,
  pub fallback: bool,
}

impl<T> Localized<T> {
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Localized<U> {
    Localized { value: f(self.value), locale: self.locale, fallback: self.fallback }
  }
}

/// Lesson frontmatter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LessonMeta {
  pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub order: i64,
  #[serde(default, deserialize_with = "string_or_number")] pub duration: Option<String>,
  #[serde(default, deserialize_with = "lenient_difficulty")] pub difficulty: Option<Difficulty>,
  // Course-level hints used when a course has no course.json.
  #[serde(default, skip_serializing)] pub course_title: Option<String>,
  #[serde(default, skip_serializing)] pub course_description: Option<String>,
  #[serde(default, skip_serializing, deserialize_with = "string_or_number")] pub course_duration: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Lesson {
  pub course: String,
  pub slug: String,
  pub meta: LessonMeta,
  /// Raw markdown body (frontmatter stripped).
  pub body: String,
}

/// Course summary as shown in listings.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CourseInfo {
  pub slug: String,
  pub title: String,
  pub description: String,
  pub area: String,
  pub difficulty: Option<Difficulty>,
  pub duration: Option<String>,
  pub author: Option<String>,
  pub icon: Option<String>,
  pub lesson_count: usize,
}

/// One vocabulary entry: source term, target term and a disambiguating context.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WordPair {
  pub id: String,
  pub source: String,
  pub target: String,
  #[serde(default)] pub context: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LanguagePair {
  pub source: String,
  pub target: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VocabularyGame {
  pub id: String,
  pub title: String,
  #[serde(default)] pub description: String,
  pub difficulty: Difficulty,
  pub language_pair: LanguagePair,
  pub words: Vec<WordPair>,
}

/// Listing entry for any game category.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GameMetadata {
  pub slug: String,
  pub title: String,
  pub description: String,
  pub category: GameCategory,
  pub difficulty: Option<Difficulty>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LibraryResource {
  pub id: String,
  pub title: String,
  pub description: String,
  #[serde(rename = "type")]
  pub kind: ResourceType,
  pub category: String,
  pub author: String,
  pub url: String,
  pub thumbnail: Option<String>,
  pub difficulty: Option<Difficulty>,
  pub duration: Option<String>,
  pub pages: Option<u32>,
  pub publish_date: Option<String>,
  pub last_updated: Option<String>,
  pub tags: Vec<String>,
  pub language: String,
  pub is_paid: bool,
  pub rating: Option<f32>,
  pub platform: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ToolMetadata {
  pub slug: String,
  pub kind: ToolKind,
  pub title: String,
  pub description: String,
  pub category: String,
  pub icon: Option<String>,
  pub order: i64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn locale_codes_round_trip_through_from_code() {
    for l in Locale::ALL {
      assert_eq!(Locale::from_code(l.code()), Some(l));
    }
    assert_eq!(Locale::from_code("fr"), None);
    assert_eq!(Locale::from_code("EN"), None);
  }

  #[test]
  fn difficulty_accepts_translated_spellings() {
    let d: Difficulty = serde_yaml::from_str("avançado").unwrap();
    assert_eq!(d, Difficulty::Advanced);
    let d: Difficulty = serde_yaml::from_str("principiante").unwrap();
    assert_eq!(d, Difficulty::Beginner);
    let d: Difficulty = serde_yaml::from_str("Intermediate").unwrap();
    assert_eq!(d, Difficulty::Intermediate);
    assert!(serde_yaml::from_str::<Difficulty>("expert").is_err());
  }

  #[test]
  fn lesson_frontmatter_tolerates_loose_scalars() {
    let m: LessonMeta = serde_yaml::from_str("title: A\nduration: 15\ndifficulty: Beginner\n").unwrap();
    assert_eq!(m.duration.as_deref(), Some("15"));
    assert_eq!(m.difficulty, Some(Difficulty::Beginner));
    let m: LessonMeta = serde_yaml::from_str("title: B\ndifficulty: expert\nduration: 10 min\n").unwrap();
    assert_eq!(m.difficulty, None);
    assert_eq!(m.duration.as_deref(), Some("10 min"));
  }

  #[test]
  fn tool_kind_maps_directory_slugs() {
    assert_eq!(ToolKind::from_slug("swot-matrix"), Some(ToolKind::SwotMatrix));
    assert_eq!(ToolKind::from_slug("kanban"), None);
    assert_eq!(serde_json::to_string(&ToolKind::LlmPromptBuilder).unwrap(), "\"llm-prompt-builder\"");
  }

  #[test]
  fn resource_type_serializes_as_type_field() {
    assert_eq!(ResourceType::from_dir_name("podcast"), Some(ResourceType::Podcast));
    assert_eq!(ResourceType::from_dir_name("movies"), None);
  }
}
