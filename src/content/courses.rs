//! Courses and lessons: `courses/<course>/<locale>/<lesson>.md` plus an
//! optional `courses/<course>/course.json`.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{list_dirs, list_stems, read_json, read_markdown, ContentStore, Lookup};
use crate::domain::{lenient_difficulty, string_or_number, CourseInfo, Difficulty, Lesson, LessonMeta, Locale, Localized};

/// Fields `course.json` may carry, either at the top level (shared) or inside
/// an object keyed by locale code.
#[derive(Clone, Debug, Default, Deserialize)]
struct CourseFields {
  #[serde(default)] title: Option<String>,
  #[serde(default)] description: Option<String>,
  #[serde(default)] area: Option<String>,
  #[serde(default, deserialize_with = "lenient_difficulty")] difficulty: Option<Difficulty>,
  #[serde(default, deserialize_with = "string_or_number")] duration: Option<String>,
  #[serde(default)] author: Option<String>,
  #[serde(default)] icon: Option<String>,
}

impl CourseFields {
  /// Field-wise: keep ours, fill gaps from `other`.
  fn or(self, other: CourseFields) -> CourseFields {
    CourseFields {
      title: self.title.or(other.title),
      description: self.description.or(other.description),
      area: self.area.or(other.area),
      difficulty: self.difficulty.or(other.difficulty),
      duration: self.duration.or(other.duration),
      author: self.author.or(other.author),
      icon: self.icon.or(other.icon),
    }
  }
}

impl ContentStore {
  fn course_dir(&self, course: &str) -> PathBuf { self.root().join("courses").join(course) }

  fn lesson_path(&self, course: &str, locale: Locale, slug: &str) -> PathBuf {
    self.course_dir(course).join(locale.code()).join(format!("{slug}.md"))
  }

  /// Single lesson, falling back to the default locale when the requested copy is absent.
  #[instrument(level = "debug", skip(self))]
  pub fn lesson(&self, course: &str, slug: &str, locale: Locale) -> Option<Localized<Lesson>> {
    if !is_safe_segment(course) || !is_safe_segment(slug) {
      return None;
    }
    self.with_fallback(locale, |l| match read_markdown::<LessonMeta>(&self.lesson_path(course, l, slug)) {
      Lookup::Found((meta, body)) => Lookup::Found(Lesson { course: course.to_string(), slug: slug.to_string(), meta, body }),
      Lookup::Absent => Lookup::Absent,
      Lookup::Broken => Lookup::Broken,
    })
  }

  /// All lessons of a course, ordered by `order` ascending then slug.
  pub fn lessons(&self, course: &str, locale: Locale) -> Vec<Localized<Lesson>> {
    if !is_safe_segment(course) {
      return Vec::new();
    }
    let slugs: BTreeSet<String> = self
      .listing_locales(locale)
      .into_iter()
      .flat_map(|l| list_stems(&self.course_dir(course).join(l.code()), "md"))
      .collect();

    let mut out: Vec<Localized<Lesson>> = slugs.iter().filter_map(|s| self.lesson(course, s, locale)).collect();
    out.sort_by(|a, b| a.value.meta.order.cmp(&b.value.meta.order).then_with(|| a.value.slug.cmp(&b.value.slug)));
    out
  }

  /// Course slugs present under `courses/`, sorted.
  pub fn course_slugs(&self) -> Vec<String> { list_dirs(&self.root().join("courses")) }

  /// Course summary. The served locale is the one whose lesson directory is used.
  #[instrument(level = "debug", skip(self))]
  pub fn course(&self, slug: &str, locale: Locale) -> Option<Localized<CourseInfo>> {
    if !is_safe_segment(slug) {
      return None;
    }
    let dir = self.course_dir(slug);
    let served = self.with_fallback(locale, |l| {
      let d = dir.join(l.code());
      if d.is_dir() { Lookup::Found(l) } else { Lookup::Absent }
    })?;

    let lessons = self.lessons(slug, locale);
    // course.json sections follow the requested locale, even when lessons fall back.
    let fields = self.course_json_fields(slug, locale).or_else(|| {
      // No usable course.json: derive from the first lesson file by name.
      let first = list_stems(&dir.join(served.value.code()), "md").into_iter().next()?;
      let lesson = self.lesson(slug, &first, served.value)?;
      let m = lesson.value.meta;
      Some(CourseFields {
        title: m.course_title,
        description: m.course_description.or(Some(m.description)),
        difficulty: m.difficulty,
        duration: m.course_duration.or(m.duration),
        ..CourseFields::default()
      })
    });
    let fields = fields.unwrap_or_default();

    Some(served.map(|_| CourseInfo {
      slug: slug.to_string(),
      title: fields.title.unwrap_or_else(|| title_case_slug(slug)),
      description: fields.description.unwrap_or_default(),
      area: fields.area.unwrap_or_else(|| "General".to_string()),
      difficulty: fields.difficulty,
      duration: fields.duration,
      author: fields.author,
      icon: fields.icon,
      lesson_count: lessons.len(),
    }))
  }

  /// Every course with at least one lesson directory in the requested or default locale.
  pub fn courses(&self, locale: Locale) -> Vec<Localized<CourseInfo>> {
    let out: Vec<_> = self.course_slugs().iter().filter_map(|s| self.course(s, locale)).collect();
    debug!(target: "content", %locale, count = out.len(), "Listed courses");
    out
  }

  /// Layered `course.json`: requested locale object, default locale object, shared top level.
  fn course_json_fields(&self, slug: &str, locale: Locale) -> Option<CourseFields> {
    let path = self.course_dir(slug).join("course.json");
    let json = match read_json::<serde_json::Value>(&path) {
      Lookup::Found(v) => v,
      _ => return None,
    };
    let layer = |v: Option<&serde_json::Value>| -> Option<CourseFields> {
      let v = v?.clone();
      match serde_json::from_value::<CourseFields>(v) {
        Ok(f) => Some(f),
        Err(e) => {
          warn!(target: "content", path = %path.display(), error = %e, "Ignoring invalid course.json section");
          None
        }
      }
    };
    let shared = layer(Some(&json)).unwrap_or_default();
    let requested = layer(json.get(locale.code())).unwrap_or_default();
    let default = layer(json.get(self.default_locale().code())).unwrap_or_default();
    Some(requested.or(default).or(shared))
  }
}

/// "intro-to-rust" → "Intro To Rust".
pub fn title_case_slug(slug: &str) -> String {
  slug
    .split(['-', '_'])
    .filter(|w| !w.is_empty())
    .map(|w| {
      let mut chars = w.chars();
      match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

/// Identifiers come from URLs; keep them to a single path segment.
pub(crate) fn is_safe_segment(s: &str) -> bool {
  !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
}
