//! UI string dictionaries: `dictionaries/<locale>.json`, nested objects
//! addressed by dotted keys ("navigation.home").

use serde_json::Value;

use super::{read_json, ContentStore, Lookup};
use crate::domain::Locale;

/// Strings the server itself needs even when no dictionary is deployed.
const BUILTIN: &[(&str, [&str; 3])] = &[
  ("errors.not_found.title", ["Page not found", "Página não encontrada", "Página no encontrada"]),
  (
    "errors.not_found.message",
    [
      "The page you are looking for does not exist or is not available in this language.",
      "A página que você procura não existe ou não está disponível neste idioma.",
      "La página que buscas no existe o no está disponible en este idioma.",
    ],
  ),
  ("errors.not_found.back", ["Back to home", "Voltar ao início", "Volver al inicio"]),
];

/// Dictionary for one locale, layered over the default locale's.
#[derive(Clone, Debug)]
pub struct Dictionary {
  pub locale: Locale,
  primary: Value,
  fallback: Value,
}

impl Dictionary {
  /// Look up a dotted key: requested locale, then default locale, then built-ins.
  pub fn get(&self, key: &str) -> Option<String> {
    lookup(&self.primary, key)
      .or_else(|| lookup(&self.fallback, key))
      .map(str::to_string)
      .or_else(|| builtin(key, self.locale).map(str::to_string))
  }

  /// Like `get`, but falls back to the key itself.
  pub fn text(&self, key: &str) -> String { self.get(key).unwrap_or_else(|| key.to_string()) }
}

fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a str> {
  key.split('.').try_fold(root, |node, part| node.get(part))?.as_str()
}

fn builtin(key: &str, locale: Locale) -> Option<&'static str> {
  let idx = Locale::ALL.iter().position(|l| *l == locale)?;
  BUILTIN.iter().find(|(k, _)| *k == key).map(|(_, texts)| texts[idx])
}

impl ContentStore {
  pub fn dictionary(&self, locale: Locale) -> Dictionary {
    let load = |l: Locale| match read_json::<Value>(&self.root().join("dictionaries").join(format!("{}.json", l.code()))) {
      Lookup::Found(v) => v,
      Lookup::Absent | Lookup::Broken => Value::Null,
    };
    let primary = load(locale);
    let fallback = if locale == self.default_locale() { Value::Null } else { load(self.default_locale()) };
    Dictionary { locale, primary, fallback }
  }
}
