//! Games: `games/<category>/<slug>.json`, optionally translated as
//! `games/<category>/<slug>.<locale>.json`. The untranslated file is the
//! default locale's copy.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::courses::is_safe_segment;
use super::{list_dirs, list_stems, read_json, ContentStore, Lookup};
use crate::domain::{lenient_difficulty, Difficulty, GameCategory, GameMetadata, Locale, Localized, VocabularyGame};

/// The fields every game file carries, whatever its category.
#[derive(Debug, Deserialize)]
struct GameHeader {
  #[serde(default)] id: Option<String>,
  title: String,
  #[serde(default)] description: String,
  #[serde(default, deserialize_with = "lenient_difficulty")] difficulty: Option<Difficulty>,
}

impl ContentStore {
  fn category_dir(&self, category: GameCategory) -> PathBuf { self.root().join("games").join(category.dir_name()) }

  fn game_file(&self, category: GameCategory, slug: &str, locale: Locale) -> Option<PathBuf> {
    let dir = self.category_dir(category);
    let translated = dir.join(format!("{slug}.{}.json", locale.code()));
    if translated.is_file() {
      return Some(translated);
    }
    let base = dir.join(format!("{slug}.json"));
    (locale == self.default_locale() && base.is_file()).then_some(base)
  }

  fn read_game<T: serde::de::DeserializeOwned>(&self, category: GameCategory, slug: &str, locale: Locale) -> Option<Localized<T>> {
    if !is_safe_segment(slug) {
      return None;
    }
    self.with_fallback(locale, |l| match self.game_file(category, slug, l) {
      Some(path) => read_json::<T>(&path),
      None => Lookup::Absent,
    })
  }

  /// Listing metadata for one game of any category.
  pub fn game(&self, category: GameCategory, slug: &str, locale: Locale) -> Option<Localized<GameMetadata>> {
    let header = self.read_game::<GameHeader>(category, slug, locale)?;
    if let Some(id) = header.value.id.as_deref().filter(|id| *id != slug) {
      debug!(target: "content", %slug, %id, "Game id differs from file name; file name is the slug");
    }
    Some(header.map(|h| GameMetadata {
      slug: slug.to_string(),
      title: h.title,
      description: h.description,
      category,
      difficulty: h.difficulty,
    }))
  }

  /// Full vocabulary game including its word bank.
  #[instrument(level = "debug", skip(self))]
  pub fn vocabulary_game(&self, slug: &str, locale: Locale) -> Option<Localized<VocabularyGame>> {
    self.read_game::<VocabularyGame>(GameCategory::Vocabulary, slug, locale)
  }

  /// Games of one category, sorted by slug.
  pub fn games_by_category(&self, category: GameCategory, locale: Locale) -> Vec<Localized<GameMetadata>> {
    let supported: Vec<&str> = Locale::ALL.iter().map(|l| l.code()).collect();
    let slugs: BTreeSet<String> = list_stems(&self.category_dir(category), "json")
      .into_iter()
      .map(|stem| match stem.rsplit_once('.') {
        Some((base, suffix)) if supported.contains(&suffix) => base.to_string(),
        _ => stem,
      })
      .collect();
    slugs.iter().filter_map(|s| self.game(category, s, locale)).collect()
  }

  /// Every game, grouped by category directory in enumeration order.
  pub fn games(&self, locale: Locale) -> Vec<Localized<GameMetadata>> {
    let mut out = Vec::new();
    for name in list_dirs(&self.root().join("games")) {
      match GameCategory::from_dir_name(&name) {
        Some(category) => out.extend(self.games_by_category(category, locale)),
        None => warn!(target: "content", category = %name, "Skipping unknown game category directory"),
      }
    }
    debug!(target: "content", %locale, count = out.len(), "Listed games");
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::content::testutil::write;

  const ANIMALS: &str = r#"{
    "id": "animals",
    "title": "Animals",
    "description": "Match animal names",
    "difficulty": "beginner",
    "language_pair": {"source": "en", "target": "pt"},
    "words": [
      {"id": "w1", "source": "dog", "target": "cão", "context": "pet"},
      {"id": "w2", "source": "cat", "target": "gato"}
    ]
  }"#;

  fn store() -> (tempfile::TempDir, ContentStore) {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "games/vocabulary/animals.json", ANIMALS);
    write(
      dir.path(),
      "games/vocabulary/animals.pt.json",
      &ANIMALS.replace("\"Animals\"", "\"Animais\""),
    );
    write(dir.path(), "games/math/fractions.json", r#"{"title": "Fractions", "difficulty": "intermedio"}"#);
    write(dir.path(), "games/cooking/soup.json", r#"{"title": "Soup"}"#);
    write(dir.path(), "games/math/broken.json", "{not json");
    let store = ContentStore::new(dir.path(), Locale::En);
    (dir, store)
  }

  #[test]
  fn vocabulary_game_parses_words_and_language_pair() {
    let (_d, s) = store();
    let g = s.vocabulary_game("animals", Locale::En).unwrap();
    assert_eq!(g.value.words.len(), 2);
    assert_eq!(g.value.words[1].context, "");
    assert_eq!(g.value.language_pair.target, "pt");
    assert!(!g.fallback);
  }

  #[test]
  fn translated_file_is_preferred_then_base_file_as_fallback() {
    let (_d, s) = store();
    let pt = s.vocabulary_game("animals", Locale::Pt).unwrap();
    assert_eq!(pt.value.title, "Animais");
    assert!(!pt.fallback);
    let es = s.vocabulary_game("animals", Locale::Es).unwrap();
    assert_eq!(es.value.title, "Animals");
    assert_eq!(es.locale, Locale::En);
    assert!(es.fallback);
  }

  #[test]
  fn listing_skips_unknown_categories_and_malformed_files() {
    let (_d, s) = store();
    let games = s.games(Locale::Pt);
    let slugs: Vec<_> = games.iter().map(|g| (g.value.category, g.value.slug.as_str())).collect();
    assert_eq!(slugs, vec![(GameCategory::Math, "fractions"), (GameCategory::Vocabulary, "animals")]);
    assert_eq!(games[0].value.difficulty, Some(Difficulty::Intermediate));
  }

  #[test]
  fn unknown_game_is_not_found() {
    let (_d, s) = store();
    assert!(s.vocabulary_game("plants", Locale::En).is_none());
    assert!(s.game(GameCategory::Math, "broken", Locale::En).is_none());
  }
}
