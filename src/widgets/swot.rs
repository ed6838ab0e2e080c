//! SWOT matrix: four quadrants of free-text items plus derived strategies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::export::{filename_part, iso_timestamp, read_csv, write_csv, ExportFile};
use super::{clean_text, WidgetError};
use crate::domain::Locale;
use crate::util::fill_template;

const SO_TEMPLATE: &str = "Leverage \"{s}\" to capitalize on \"{o}\"";
const WO_TEMPLATE: &str = "Improve \"{w}\" to take advantage of \"{o}\"";
const ST_TEMPLATE: &str = "Use \"{s}\" to mitigate \"{t}\"";
const WT_TEMPLATE: &str = "Address \"{w}\" to avoid exposure to \"{t}\"";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Quadrant {
  Strengths,
  Weaknesses,
  Opportunities,
  Threats,
}

impl Quadrant {
  pub const ALL: [Quadrant; 4] = [Quadrant::Strengths, Quadrant::Weaknesses, Quadrant::Opportunities, Quadrant::Threats];

  pub fn key(self) -> &'static str {
    match self {
      Quadrant::Strengths => "strengths",
      Quadrant::Weaknesses => "weaknesses",
      Quadrant::Opportunities => "opportunities",
      Quadrant::Threats => "threats",
    }
  }

  pub fn from_key(key: &str) -> Option<Quadrant> { Quadrant::ALL.into_iter().find(|q| q.key() == key) }

  pub fn label(self, locale: Locale) -> &'static str {
    match (self, locale) {
      (Quadrant::Strengths, Locale::En) => "Strengths",
      (Quadrant::Strengths, Locale::Pt) => "Forças",
      (Quadrant::Strengths, Locale::Es) => "Fortalezas",
      (Quadrant::Weaknesses, Locale::En) => "Weaknesses",
      (Quadrant::Weaknesses, Locale::Pt) => "Fraquezas",
      (Quadrant::Weaknesses, Locale::Es) => "Debilidades",
      (Quadrant::Opportunities, Locale::En) => "Opportunities",
      (Quadrant::Opportunities, Locale::Pt | Locale::Es) => "Oportunidades",
      (Quadrant::Threats, Locale::En) => "Threats",
      (Quadrant::Threats, Locale::Pt) => "Ameaças",
      (Quadrant::Threats, Locale::Es) => "Amenazas",
    }
  }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SwotItems {
  pub strengths: Vec<String>,
  pub weaknesses: Vec<String>,
  pub opportunities: Vec<String>,
  pub threats: Vec<String>,
}

impl SwotItems {
  pub fn get(&self, q: Quadrant) -> &[String] {
    match q {
      Quadrant::Strengths => &self.strengths,
      Quadrant::Weaknesses => &self.weaknesses,
      Quadrant::Opportunities => &self.opportunities,
      Quadrant::Threats => &self.threats,
    }
  }

  fn get_mut(&mut self, q: Quadrant) -> &mut Vec<String> {
    match q {
      Quadrant::Strengths => &mut self.strengths,
      Quadrant::Weaknesses => &mut self.weaknesses,
      Quadrant::Opportunities => &mut self.opportunities,
      Quadrant::Threats => &mut self.threats,
    }
  }
}

/// One suggestion list per pairing; built from the first item of each quadrant.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Strategies {
  #[serde(rename = "SO")]
  pub so: Vec<String>,
  #[serde(rename = "WO")]
  pub wo: Vec<String>,
  #[serde(rename = "ST")]
  pub st: Vec<String>,
  #[serde(rename = "WT")]
  pub wt: Vec<String>,
}

impl Strategies {
  fn sections(&self) -> [(&'static str, &[String]); 4] {
    [("SO", &self.so), ("WO", &self.wo), ("ST", &self.st), ("WT", &self.wt)]
  }
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwotMatrix {
  pub project_name: String,
  pub description: String,
  pub items: SwotItems,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwotExport<'a> {
  project_name: &'a str,
  description: &'a str,
  timestamp: String,
  swot: &'a SwotItems,
  strategies: Strategies,
}

#[derive(Deserialize)]
struct SwotImport {
  swot: Option<SwotItems>,
}

impl SwotMatrix {
  pub fn set_project(&mut self, name: &str, description: &str) {
    self.project_name = name.trim().to_string();
    self.description = description.trim().to_string();
  }

  /// Append an item; returns its index.
  pub fn add(&mut self, q: Quadrant, text: &str) -> Result<usize, WidgetError> {
    let text = clean_text(text)?;
    let list = self.items.get_mut(q);
    list.push(text);
    Ok(list.len() - 1)
  }

  pub fn edit(&mut self, q: Quadrant, index: usize, text: &str) -> Result<(), WidgetError> {
    let text = clean_text(text)?;
    let slot = self.items.get_mut(q).get_mut(index).ok_or(WidgetError::ItemNotFound)?;
    *slot = text;
    Ok(())
  }

  pub fn remove(&mut self, q: Quadrant, index: usize) -> Result<String, WidgetError> {
    let list = self.items.get_mut(q);
    if index >= list.len() {
      return Err(WidgetError::ItemNotFound);
    }
    Ok(list.remove(index))
  }

  /// Drop everything, including project name and description.
  pub fn clear(&mut self) { *self = SwotMatrix::default(); }

  pub fn strategies(&self) -> Strategies {
    let first = |q: Quadrant| self.items.get(q).first().map(String::as_str);
    let (s, w, o, t) = (
      first(Quadrant::Strengths),
      first(Quadrant::Weaknesses),
      first(Quadrant::Opportunities),
      first(Quadrant::Threats),
    );
    let pair = |tpl: &str, a: (&str, Option<&str>), b: (&str, Option<&str>)| -> Vec<String> {
      match (a.1, b.1) {
        (Some(x), Some(y)) => vec![fill_template(tpl, &[(a.0, x), (b.0, y)])],
        _ => Vec::new(),
      }
    };
    Strategies {
      so: pair(SO_TEMPLATE, ("s", s), ("o", o)),
      wo: pair(WO_TEMPLATE, ("w", w), ("o", o)),
      st: pair(ST_TEMPLATE, ("s", s), ("t", t)),
      wt: pair(WT_TEMPLATE, ("w", w), ("t", t)),
    }
  }

  fn file_stem(&self, prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}-{}-{}", filename_part(&self.project_name, "untitled"), now.timestamp_millis())
  }

  pub fn export_json(&self, now: DateTime<Utc>) -> Result<ExportFile, WidgetError> {
    let body = SwotExport {
      project_name: &self.project_name,
      description: &self.description,
      timestamp: iso_timestamp(now),
      swot: &self.items,
      strategies: self.strategies(),
    };
    ExportFile::json(format!("{}.json", self.file_stem("swot-analysis", now)), &body)
  }

  pub fn export_csv(&self, now: DateTime<Utc>) -> Result<ExportFile, WidgetError> {
    let rows = Quadrant::ALL.into_iter().flat_map(|q| self.items.get(q).iter().map(move |item| [q.key(), item.as_str()]));
    let csv = write_csv(&["Quadrant", "Item"], rows)?;
    Ok(ExportFile::csv(format!("{}.csv", self.file_stem("swot-analysis", now)), csv))
  }

  /// Plain-text report with the quadrants and strategy suggestions.
  pub fn export_report(&self, now: DateTime<Utc>) -> ExportFile {
    let mut r = String::from("SWOT ANALYSIS REPORT\n========================\n\n");
    r.push_str(&format!("Project: {}\n", self.project_name));
    r.push_str(&format!("Description: {}\n", self.description));
    r.push_str(&format!("Date: {}\n\n", now.format("%Y-%m-%d")));

    for q in Quadrant::ALL {
      r.push_str(&format!("\n{}\n{}\n", q.key().to_uppercase(), "-".repeat(q.key().len())));
      for (i, item) in self.items.get(q).iter().enumerate() {
        r.push_str(&format!("{}. {}\n", i + 1, item));
      }
    }

    r.push_str("\n\nSTRATEGIC RECOMMENDATIONS\n=========================\n\n");
    for (kind, list) in self.strategies().sections() {
      if list.is_empty() {
        continue;
      }
      r.push_str(&format!("{kind} Strategy:\n"));
      for s in list {
        r.push_str(&format!("- {s}\n"));
      }
      r.push('\n');
    }
    ExportFile::text(format!("{}.txt", self.file_stem("swot-report", now)), r)
  }

  /// Replace the quadrants from a previous JSON or CSV export, chosen by file
  /// extension. On error the matrix is left untouched.
  pub fn import(&mut self, filename: &str, content: &str) -> Result<(), WidgetError> {
    let lower = filename.to_ascii_lowercase();
    let items = if lower.ends_with(".json") {
      let parsed: SwotImport = serde_json::from_str(content).map_err(|e| WidgetError::Import(e.to_string()))?;
      parsed.swot.ok_or_else(|| WidgetError::Import("missing `swot` object".into()))?
    } else if lower.ends_with(".csv") {
      let mut items = SwotItems::default();
      for row in read_csv(content)? {
        let (Some(key), Some(item)) = (row.get(0), row.get(1)) else { continue };
        if let (Some(q), Ok(item)) = (Quadrant::from_key(key.trim()), clean_text(item)) {
          items.get_mut(q).push(item);
        }
      }
      items
    } else {
      return Err(WidgetError::Import(format!("unsupported file type: {filename}")));
    };
    debug!(target: "widgets", %filename, "SWOT data imported");
    self.items = items;
    Ok(())
  }
}
