//! Library resources: `library/<locale>/<type>/<id>.md`.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::courses::is_safe_segment;
use super::{list_dirs, list_stems, read_markdown, ContentStore, Lookup};
use crate::domain::{lenient_difficulty, string_or_number, Difficulty, LibraryResource, Locale, Localized, ResourceType};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ResourceFront {
  id: Option<String>,
  title: Option<String>,
  description: Option<String>,
  category: Option<String>,
  author: Option<String>,
  url: Option<String>,
  thumbnail: Option<String>,
  #[serde(deserialize_with = "lenient_difficulty")]
  difficulty: Option<Difficulty>,
  #[serde(deserialize_with = "string_or_number")]
  duration: Option<String>,
  pages: Option<u32>,
  publish_date: Option<String>,
  last_updated: Option<String>,
  tags: Vec<String>,
  language: Option<String>,
  is_paid: bool,
  rating: Option<f32>,
  platform: Option<String>,
}

impl ContentStore {
  fn library_dir(&self, locale: Locale) -> PathBuf { self.root().join("library").join(locale.code()) }

  /// One resource by type and file id.
  #[instrument(level = "debug", skip(self))]
  pub fn resource(&self, kind: ResourceType, id: &str, locale: Locale) -> Option<Localized<LibraryResource>> {
    if !is_safe_segment(id) {
      return None;
    }
    self.with_fallback(locale, |l| {
      let path = self.library_dir(l).join(kind.dir_name()).join(format!("{id}.md"));
      match read_markdown::<ResourceFront>(&path) {
        Lookup::Found((front, body)) => Lookup::Found(build_resource(front, &body, kind, id, l)),
        Lookup::Absent => Lookup::Absent,
        Lookup::Broken => Lookup::Broken,
      }
    })
  }

  /// Every resource, ordered by type then id. Callers re-sort for display.
  pub fn resources(&self, locale: Locale) -> Vec<Localized<LibraryResource>> {
    let mut keys: BTreeSet<(ResourceType, String)> = BTreeSet::new();
    for l in self.listing_locales(locale) {
      let dir = self.library_dir(l);
      for name in list_dirs(&dir) {
        let Some(kind) = ResourceType::from_dir_name(&name) else {
          warn!(target: "content", locale = %l, dir = %name, "Skipping unknown library resource type");
          continue;
        };
        keys.extend(list_stems(&dir.join(&name), "md").into_iter().map(|id| (kind, id)));
      }
    }
    let out: Vec<_> = keys.iter().filter_map(|(kind, id)| self.resource(*kind, id, locale)).collect();
    debug!(target: "content", %locale, count = out.len(), "Listed library resources");
    out
  }

  pub fn resources_by_type(&self, kind: ResourceType, locale: Locale) -> Vec<Localized<LibraryResource>> {
    self.resources(locale).into_iter().filter(|r| r.value.kind == kind).collect()
  }

  pub fn resources_by_category(&self, category: &str, locale: Locale) -> Vec<Localized<LibraryResource>> {
    self.resources(locale).into_iter().filter(|r| r.value.category == category).collect()
  }
}

fn build_resource(f: ResourceFront, body: &str, kind: ResourceType, file_id: &str, served: Locale) -> LibraryResource {
  LibraryResource {
    id: f.id.unwrap_or_else(|| file_id.to_string()),
    title: f.title.unwrap_or_default(),
    description: f.description.unwrap_or_else(|| body.trim().chars().take(200).collect()),
    kind,
    category: f.category.unwrap_or_else(|| "Uncategorized".to_string()),
    author: f.author.unwrap_or_else(|| "Unknown".to_string()),
    url: f.url.unwrap_or_default(),
    thumbnail: f.thumbnail,
    difficulty: f.difficulty,
    duration: f.duration,
    pages: f.pages,
    publish_date: f.publish_date,
    last_updated: f.last_updated,
    tags: f.tags,
    language: f.language.unwrap_or_else(|| served.code().to_string()),
    is_paid: f.is_paid,
    rating: f.rating,
    platform: f.platform,
  }
}
