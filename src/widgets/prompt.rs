//! Prompt builder: a form whose filled fields become a sectioned LLM prompt.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ExportFile, WidgetError};
use crate::content::dictionary::Dictionary;
use crate::domain::Locale;

pub const EXPORT_FILENAME: &str = "llm-prompt.txt";

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
  #[default]
  Professional,
  Casual,
  Technical,
  Creative,
  Educational,
}

impl Tone {
  pub const ALL: [Tone; 5] = [Tone::Professional, Tone::Casual, Tone::Technical, Tone::Creative, Tone::Educational];

  pub fn key(self) -> &'static str {
    match self {
      Tone::Professional => "professional",
      Tone::Casual => "casual",
      Tone::Technical => "technical",
      Tone::Creative => "creative",
      Tone::Educational => "educational",
    }
  }

  fn index(self) -> usize { Tone::ALL.iter().position(|t| *t == self).unwrap_or(0) }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PromptForm {
  pub role: String,
  pub objective: String,
  pub context: String,
  pub target_audience: String,
  pub constraints: String,
  pub output_format: String,
  pub tone: Tone,
  pub examples: String,
}

/// Headings and fixed phrases of the generated prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptLabels {
  pub role_prefix: String,
  pub objective: String,
  pub context: String,
  pub target_audience: String,
  pub constraints: String,
  pub output_format: String,
  pub tone: String,
  pub examples: String,
  pub closing: String,
  pub tones: [String; 5],
}

impl PromptLabels {
  pub fn for_locale(locale: Locale) -> PromptLabels {
    let (heads, tones, role_prefix, closing): ([&str; 7], [&str; 5], &str, &str) = match locale {
      Locale::En => (
        ["Objective", "Context", "Target Audience", "Constraints", "Output Format", "Tone", "Examples"],
        ["Professional", "Casual", "Technical", "Creative", "Educational"],
        "You are",
        "Please provide a comprehensive response following the guidelines above.",
      ),
      Locale::Pt => (
        ["Objetivo", "Contexto", "Público-Alvo", "Restrições", "Formato de Saída", "Tom", "Exemplos"],
        ["Profissional", "Casual", "Técnico", "Criativo", "Educacional"],
        "Você é",
        "Por favor, forneça uma resposta completa seguindo as diretrizes acima.",
      ),
      Locale::Es => (
        ["Objetivo", "Contexto", "Público Objetivo", "Restricciones", "Formato de Salida", "Tono", "Ejemplos"],
        ["Profesional", "Casual", "Técnico", "Creativo", "Educativo"],
        "Eres",
        "Por favor, proporciona una respuesta completa siguiendo las pautas anteriores.",
      ),
    };
    PromptLabels {
      role_prefix: role_prefix.into(),
      objective: heads[0].into(),
      context: heads[1].into(),
      target_audience: heads[2].into(),
      constraints: heads[3].into(),
      output_format: heads[4].into(),
      tone: heads[5].into(),
      examples: heads[6].into(),
      closing: closing.into(),
      tones: tones.map(String::from),
    }
  }

  /// Built-in labels for the dictionary's locale, overridden by any
  /// `tools.promptBuilder.*` entries it carries.
  pub fn from_dictionary(dict: &Dictionary) -> PromptLabels {
    let mut labels = PromptLabels::for_locale(dict.locale);
    let pick = |slot: &mut String, key: &str| {
      if let Some(v) = dict.get(&format!("tools.promptBuilder.{key}")) {
        *slot = v;
      }
    };
    pick(&mut labels.role_prefix, "promptTemplate.rolePrefix");
    pick(&mut labels.closing, "promptTemplate.closingText");
    pick(&mut labels.objective, "labels.objective");
    pick(&mut labels.context, "labels.context");
    pick(&mut labels.target_audience, "labels.targetAudience");
    pick(&mut labels.constraints, "labels.constraints");
    pick(&mut labels.output_format, "labels.outputFormat");
    pick(&mut labels.tone, "labels.tone");
    pick(&mut labels.examples, "labels.examples");
    for (slot, tone) in labels.tones.iter_mut().zip(Tone::ALL) {
      pick(slot, &format!("tones.{}", tone.key()));
    }
    labels
  }
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PromptBuilder {
  pub form: PromptForm,
  pub generated: Option<String>,
}

impl PromptBuilder {
  /// Replace the form. A changed form invalidates the last built prompt.
  pub fn update(&mut self, form: PromptForm) {
    if form != self.form {
      self.generated = None;
    }
    self.form = form;
  }

  /// Assemble the prompt from the filled fields. Empty fields are left out.
  pub fn build(&mut self, labels: &PromptLabels) -> Result<&str, WidgetError> {
    let f = &self.form;
    if f.objective.trim().is_empty() {
      return Err(WidgetError::MissingField("objective"));
    }
    let mut out = String::new();
    if !f.role.trim().is_empty() {
      out.push_str(&format!("{} {}.\n\n", labels.role_prefix, f.role.trim()));
    }
    let sections = [
      (&labels.objective, f.objective.as_str()),
      (&labels.context, f.context.as_str()),
      (&labels.target_audience, f.target_audience.as_str()),
      (&labels.constraints, f.constraints.as_str()),
      (&labels.output_format, f.output_format.as_str()),
      (&labels.tone, labels.tones[f.tone.index()].as_str()),
      (&labels.examples, f.examples.as_str()),
    ];
    for (heading, body) in sections {
      let body = body.trim();
      if !body.is_empty() {
        out.push_str(&format!("**{heading}:**\n{body}\n\n"));
      }
    }
    out.push_str(&labels.closing);
    debug!(target: "widgets", chars = out.len(), "Prompt built");
    Ok(self.generated.insert(out).as_str())
  }

  pub fn reset(&mut self) { *self = PromptBuilder::default(); }

  pub fn export(&self) -> Result<ExportFile, WidgetError> {
    let prompt = self.generated.as_ref().ok_or(WidgetError::NothingToExport)?;
    Ok(ExportFile::text(EXPORT_FILENAME.to_string(), prompt.clone()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn objective_is_required() {
    let mut b = PromptBuilder::default();
    assert_eq!(b.build(&PromptLabels::for_locale(Locale::En)), Err(WidgetError::MissingField("objective")));
    assert_eq!(b.export(), Err(WidgetError::NothingToExport));
  }

  #[test]
  fn builds_sections_in_order_skipping_blanks() {
    let mut b = PromptBuilder::default();
    b.update(PromptForm {
      role: "an expert Rust developer".into(),
      objective: "Review this code".into(),
      target_audience: "  ".into(),
      tone: Tone::Technical,
      ..PromptForm::default()
    });
    let prompt = b.build(&PromptLabels::for_locale(Locale::En)).unwrap().to_string();
    assert_eq!(
      prompt,
      "You are an expert Rust developer.\n\n**Objective:**\nReview this code\n\n**Tone:**\nTechnical\n\n\
       Please provide a comprehensive response following the guidelines above."
    );
    let file = b.export().unwrap();
    assert_eq!(file.filename, "llm-prompt.txt");
    assert_eq!(file.content, prompt);

    b.reset();
    assert_eq!(b, PromptBuilder::default());
  }

  #[test]
  fn editing_the_form_discards_the_stale_prompt() {
    let mut b = PromptBuilder::default();
    let form = PromptForm { objective: "Summarize".into(), ..PromptForm::default() };
    b.update(form.clone());
    b.build(&PromptLabels::for_locale(Locale::En)).unwrap();
    b.update(form.clone());
    assert!(b.export().is_ok());

    b.update(PromptForm { objective: "Translate".into(), ..form });
    assert_eq!(b.generated, None);
    assert_eq!(b.export(), Err(WidgetError::NothingToExport));
  }

  #[test]
  fn localized_headings() {
    let mut b = PromptBuilder::default();
    b.update(PromptForm { objective: "Resumir".into(), ..PromptForm::default() });
    let prompt = b.build(&PromptLabels::for_locale(Locale::Pt)).unwrap();
    assert!(prompt.starts_with("**Objetivo:**\nResumir\n\n**Tom:**\nProfissional"));
    assert!(prompt.ends_with("seguindo as diretrizes acima."));
  }
}
