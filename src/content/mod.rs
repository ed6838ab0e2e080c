//! Content store: read-only access to the markdown/JSON files under the
//! content root. Nothing is cached; every call goes back to disk.
//!
//! Fallback rule, shared by every content type: a record missing in the
//! requested locale is looked up once more in the default locale. Listings
//! apply the same rule per identifier and tag each record with the locale it
//! was served from (`Localized`), so a mixed-locale listing is visible.
//!
//! A malformed file is logged and treated as not-found; it never aborts a
//! listing.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::{Locale, Localized};

pub mod courses;
pub mod dictionary;
pub mod games;
pub mod library;
pub mod tools;

#[derive(Clone, Debug)]
pub struct ContentStore {
  root: PathBuf,
  default_locale: Locale,
}

/// Outcome of reading one locale's copy of a record.
pub(crate) enum Lookup<T> {
  Found(T),
  /// No file at the expected path; eligible for fallback.
  Absent,
  /// File exists but could not be read/parsed; already logged.
  Broken,
}

impl ContentStore {
  pub fn new(root: impl Into<PathBuf>, default_locale: Locale) -> Self {
    Self { root: root.into(), default_locale }
  }

  pub fn root(&self) -> &Path { &self.root }

  pub fn default_locale(&self) -> Locale { self.default_locale }

  /// Try `requested`, then the default locale once. Broken files stop the search.
  pub(crate) fn with_fallback<T>(
    &self,
    requested: Locale,
    mut read: impl FnMut(Locale) -> Lookup<T>,
  ) -> Option<Localized<T>> {
    match read(requested) {
      Lookup::Found(value) => return Some(Localized { value, locale: requested, fallback: false }),
      Lookup::Broken => return None,
      Lookup::Absent => {}
    }
    if requested == self.default_locale {
      return None;
    }
    match read(self.default_locale) {
      Lookup::Found(value) => Some(Localized { value, locale: self.default_locale, fallback: true }),
      _ => None,
    }
  }

  /// Locales whose directories are consulted when enumerating identifiers.
  pub(crate) fn listing_locales(&self, requested: Locale) -> Vec<Locale> {
    if requested == self.default_locale { vec![requested] } else { vec![requested, self.default_locale] }
  }
}

/// Read and parse a markdown file with frontmatter, logging failures.
pub(crate) fn read_markdown<T: DeserializeOwned>(path: &Path) -> Lookup<(T, String)> {
  if !path.is_file() {
    return Lookup::Absent;
  }
  let parsed = std::fs::read_to_string(path)
    .with_context(|| format!("read: {}", path.display()))
    .and_then(|contents| parse_front_matter::<T>(&contents).with_context(|| format!("parse: {}", path.display())));
  match parsed {
    Ok(v) => Lookup::Found(v),
    Err(e) => {
      warn!(target: "content", path = %path.display(), error = format!("{e:#}"), "Skipping malformed content file");
      Lookup::Broken
    }
  }
}

/// Read and parse a JSON file, logging failures.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Lookup<T> {
  if !path.is_file() {
    return Lookup::Absent;
  }
  let parsed = std::fs::read(path)
    .with_context(|| format!("read: {}", path.display()))
    .and_then(|bytes| serde_json::from_slice::<T>(&bytes).with_context(|| format!("parse json: {}", path.display())));
  match parsed {
    Ok(v) => Lookup::Found(v),
    Err(e) => {
      warn!(target: "content", path = %path.display(), error = format!("{e:#}"), "Skipping malformed content file");
      Lookup::Broken
    }
  }
}

/// Split `---` YAML frontmatter from the markdown body and deserialize it.
/// A file without frontmatter deserializes from an empty mapping.
pub fn parse_front_matter<T: DeserializeOwned>(contents: &str) -> anyhow::Result<(T, String)> {
  let (yaml, body) = split_front_matter(contents)?;
  let value = match yaml {
    Some(y) => serde_yaml::from_str::<serde_yaml::Value>(&y).context("parse yaml front matter")?,
    None => serde_yaml::Value::Null,
  };
  let value = if value.is_null() { serde_yaml::Value::Mapping(Default::default()) } else { value };
  let meta: T = serde_yaml::from_value(value).context("deserialize front matter")?;
  Ok((meta, body))
}

fn split_front_matter(contents: &str) -> anyhow::Result<(Option<String>, String)> {
  let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
  let mut lines = contents.split_inclusive('\n');
  match lines.next() {
    Some(first) if first.trim_end() == "---" => {}
    _ => return Ok((None, contents.to_string())),
  }

  let mut yaml = String::new();
  let mut consumed = contents.split_inclusive('\n').next().map_or(0, str::len);
  for line in lines {
    consumed += line.len();
    if line.trim_end() == "---" {
      return Ok((Some(yaml), contents[consumed..].to_string()));
    }
    yaml.push_str(line);
  }
  anyhow::bail!("front matter is not terminated by '---'")
}

/// Names of the subdirectories of `dir`, sorted. Missing dir → empty.
pub(crate) fn list_dirs(dir: &Path) -> Vec<String> {
  list_entries(dir, |p| p.is_dir()).into_iter().collect()
}

/// File stems of `*.{ext}` files in `dir`, sorted. Missing dir → empty.
pub(crate) fn list_stems(dir: &Path, ext: &str) -> BTreeSet<String> {
  list_entries(dir, |p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some(ext))
    .into_iter()
    .filter_map(|name| Path::new(&name).file_stem().and_then(|s| s.to_str()).map(str::to_string))
    .collect()
}

fn list_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> BTreeSet<String> {
  let rd = match std::fs::read_dir(dir) {
    Ok(rd) => rd,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeSet::new(),
    Err(e) => {
      warn!(target: "content", dir = %dir.display(), error = %e, "Failed to list content directory");
      return BTreeSet::new();
    }
  };
  rd.filter_map(|entry| entry.ok())
    .filter(|entry| keep(&entry.path()))
    .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
    .filter(|name| !name.starts_with('.'))
    .collect()
}

#[cfg(test)]
pub(crate) mod testutil {
  use std::path::Path;

  /// Write `contents` to `root/rel`, creating parent directories.
  pub fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::Deserialize;

  #[derive(Debug, Deserialize, PartialEq)]
  struct Meta {
    title: String,
    #[serde(default)]
    order: i64,
  }

  #[derive(Debug, Deserialize, PartialEq, Default)]
  struct Loose {
    #[serde(default)]
    title: Option<String>,
  }

  #[test]
  fn front_matter_splits_metadata_and_body() {
    let src = "---\ntitle: Intro\norder: 2\n---\n# Hello\n\nBody text.\n";
    let (meta, body): (Meta, String) = parse_front_matter(src).unwrap();
    assert_eq!(meta, Meta { title: "Intro".into(), order: 2 });
    assert_eq!(body, "# Hello\n\nBody text.\n");
  }

  #[test]
  fn missing_front_matter_is_an_empty_mapping() {
    let (meta, body): (Loose, String) = parse_front_matter("# Just markdown\n").unwrap();
    assert_eq!(meta, Loose::default());
    assert_eq!(body, "# Just markdown\n");
    let (meta, _): (Loose, String) = parse_front_matter("---\n---\nbody").unwrap();
    assert_eq!(meta, Loose::default());
  }

  #[test]
  fn unterminated_or_invalid_front_matter_fails() {
    assert!(parse_front_matter::<Meta>("---\ntitle: x\n").is_err());
    assert!(parse_front_matter::<Meta>("---\ntitle: [unclosed\n---\n").is_err());
    // Required field missing.
    assert!(parse_front_matter::<Meta>("---\norder: 1\n---\n").is_err());
  }

  #[test]
  fn listing_helpers_sort_and_filter() {
    let dir = tempfile::tempdir().unwrap();
    testutil::write(dir.path(), "b.md", "");
    testutil::write(dir.path(), "a.md", "");
    testutil::write(dir.path(), "notes.txt", "");
    testutil::write(dir.path(), "sub/x.md", "");
    testutil::write(dir.path(), ".hidden/x.md", "");
    let stems: Vec<_> = list_stems(dir.path(), "md").into_iter().collect();
    assert_eq!(stems, vec!["a", "b"]);
    assert_eq!(list_dirs(dir.path()), vec!["sub"]);
    assert!(list_dirs(&dir.path().join("nope")).is_empty());
  }
}
