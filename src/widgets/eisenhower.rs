//! Eisenhower matrix: tasks sorted by urgency and importance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::export::{iso_timestamp, read_csv, write_csv, ExportFile};
use super::{clean_text, WidgetError};
use crate::domain::Locale;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
  /// Urgent and important.
  DoFirst,
  /// Important, not urgent.
  Schedule,
  /// Urgent, not important.
  Delegate,
  Eliminate,
}

impl Priority {
  pub const ALL: [Priority; 4] = [Priority::DoFirst, Priority::Schedule, Priority::Delegate, Priority::Eliminate];

  pub fn key(self) -> &'static str {
    match self {
      Priority::DoFirst => "doFirst",
      Priority::Schedule => "schedule",
      Priority::Delegate => "delegate",
      Priority::Eliminate => "eliminate",
    }
  }

  pub fn from_key(key: &str) -> Option<Priority> { Priority::ALL.into_iter().find(|p| p.key() == key) }

  pub fn label(self, locale: Locale) -> &'static str {
    match (self, locale) {
      (Priority::DoFirst, Locale::En) => "Do First",
      (Priority::DoFirst, Locale::Pt) => "Fazer Primeiro",
      (Priority::DoFirst, Locale::Es) => "Haz Primero",
      (Priority::Schedule, Locale::En) => "Schedule",
      (Priority::Schedule, Locale::Pt) => "Agendar",
      (Priority::Schedule, Locale::Es) => "Programar",
      (Priority::Delegate, Locale::En) => "Delegate",
      (Priority::Delegate, _) => "Delegar",
      (Priority::Eliminate, Locale::En) => "Eliminate",
      (Priority::Eliminate, _) => "Eliminar",
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id: Uuid,
  pub text: String,
  pub completed: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tasks {
  pub do_first: Vec<Task>,
  pub schedule: Vec<Task>,
  pub delegate: Vec<Task>,
  pub eliminate: Vec<Task>,
}

impl Tasks {
  pub fn get(&self, p: Priority) -> &[Task] {
    match p {
      Priority::DoFirst => &self.do_first,
      Priority::Schedule => &self.schedule,
      Priority::Delegate => &self.delegate,
      Priority::Eliminate => &self.eliminate,
    }
  }

  fn get_mut(&mut self, p: Priority) -> &mut Vec<Task> {
    match p {
      Priority::DoFirst => &mut self.do_first,
      Priority::Schedule => &mut self.schedule,
      Priority::Delegate => &mut self.delegate,
      Priority::Eliminate => &mut self.eliminate,
    }
  }

  fn all(&self) -> impl Iterator<Item = (Priority, &Task)> {
    Priority::ALL.into_iter().flat_map(move |p| self.get(p).iter().map(move |t| (p, t)))
  }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatrixStats {
  pub total: usize,
  pub completed: usize,
  /// Rounded percentage; 0 when there are no tasks.
  pub completion_rate: u32,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EisenhowerMatrix {
  pub tasks: Tasks,
  pub show_completed: bool,
}

impl Default for EisenhowerMatrix {
  fn default() -> Self { Self { tasks: Tasks::default(), show_completed: true } }
}

// Wire shape of one exported task, shared by JSON export and import.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
  quadrant: String,
  task: String,
  #[serde(default)]
  completed: bool,
  #[serde(default)]
  created_at: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TasksExport {
  tasks: Vec<TaskRecord>,
  exported_at: String,
}

#[derive(Deserialize)]
struct TasksImport {
  tasks: Option<Vec<TaskRecord>>,
}

impl EisenhowerMatrix {
  pub fn add(&mut self, p: Priority, text: &str, now: DateTime<Utc>) -> Result<Uuid, WidgetError> {
    let text = clean_text(text)?;
    let id = Uuid::new_v4();
    self.tasks.get_mut(p).push(Task { id, text, completed: false, created_at: now });
    Ok(id)
  }

  fn find_mut(&mut self, p: Priority, id: Uuid) -> Result<&mut Task, WidgetError> {
    self.tasks.get_mut(p).iter_mut().find(|t| t.id == id).ok_or(WidgetError::ItemNotFound)
  }

  pub fn edit(&mut self, p: Priority, id: Uuid, text: &str) -> Result<(), WidgetError> {
    let text = clean_text(text)?;
    self.find_mut(p, id)?.text = text;
    Ok(())
  }

  /// Flip the completed flag; returns the new value.
  pub fn toggle(&mut self, p: Priority, id: Uuid) -> Result<bool, WidgetError> {
    let task = self.find_mut(p, id)?;
    task.completed = !task.completed;
    Ok(task.completed)
  }

  pub fn remove(&mut self, p: Priority, id: Uuid) -> Result<Task, WidgetError> {
    let list = self.tasks.get_mut(p);
    let idx = list.iter().position(|t| t.id == id).ok_or(WidgetError::ItemNotFound)?;
    Ok(list.remove(idx))
  }

  pub fn clear(&mut self) { self.tasks = Tasks::default(); }

  pub fn set_show_completed(&mut self, show: bool) { self.show_completed = show; }

  /// Tasks of a quadrant as displayed, honouring `show_completed`.
  pub fn visible(&self, p: Priority) -> Vec<&Task> {
    self.tasks.get(p).iter().filter(|t| self.show_completed || !t.completed).collect()
  }

  pub fn stats(&self) -> MatrixStats {
    let total = self.tasks.all().count();
    let completed = self.tasks.all().filter(|(_, t)| t.completed).count();
    let completion_rate = if total == 0 { 0 } else { ((completed as f64 / total as f64) * 100.0).round() as u32 };
    MatrixStats { total, completed, completion_rate }
  }

  pub fn export_json(&self, now: DateTime<Utc>) -> Result<ExportFile, WidgetError> {
    let tasks = self
      .tasks
      .all()
      .map(|(p, t)| TaskRecord {
        quadrant: p.key().to_string(),
        task: t.text.clone(),
        completed: t.completed,
        created_at: Some(iso_timestamp(t.created_at)),
      })
      .collect();
    let body = TasksExport { tasks, exported_at: iso_timestamp(now) };
    ExportFile::json(format!("eisenhower-matrix-{}.json", now.timestamp_millis()), &body)
  }

  pub fn export_csv(&self, now: DateTime<Utc>) -> Result<ExportFile, WidgetError> {
    let rows = self
      .tasks
      .all()
      .map(|(p, t)| [p.key().to_string(), t.text.clone(), t.completed.to_string(), iso_timestamp(t.created_at)]);
    let csv = write_csv(&["Quadrant", "Task", "Completed", "Created At"], rows)?;
    Ok(ExportFile::csv(format!("eisenhower-matrix-{}.csv", now.timestamp_millis()), csv))
  }

  /// Replace all tasks from a JSON or CSV export. Unknown quadrants are
  /// skipped; a malformed file is rejected and the matrix left untouched.
  pub fn import(&mut self, filename: &str, content: &str, now: DateTime<Utc>) -> Result<usize, WidgetError> {
    let lower = filename.to_ascii_lowercase();
    let records: Vec<TaskRecord> = if lower.ends_with(".json") {
      let parsed: TasksImport = serde_json::from_str(content).map_err(|e| WidgetError::Import(e.to_string()))?;
      parsed.tasks.ok_or_else(|| WidgetError::Import("missing `tasks` array".into()))?
    } else if lower.ends_with(".csv") {
      read_csv(content)?
        .iter()
        .filter(|row| row.len() >= 2)
        .map(|row| TaskRecord {
          quadrant: row[0].trim().to_string(),
          task: row[1].to_string(),
          completed: row.get(2).is_some_and(|c| c.trim() == "true"),
          created_at: row.get(3).map(|c| c.trim().to_string()),
        })
        .collect()
    } else {
      return Err(WidgetError::Import(format!("unsupported file type: {filename}")));
    };

    let mut tasks = Tasks::default();
    let mut imported = 0;
    for r in records {
      let Some(p) = Priority::from_key(&r.quadrant) else { continue };
      let Ok(text) = clean_text(&r.task) else { continue };
      let created_at = r
        .created_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(now);
      tasks.get_mut(p).push(Task { id: Uuid::new_v4(), text, completed: r.completed, created_at });
      imported += 1;
    }
    debug!(target: "widgets", %filename, imported, "Eisenhower tasks imported");
    self.tasks = tasks;
    Ok(imported)
  }
}
