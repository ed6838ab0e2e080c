//! Locale resolution for inbound requests.
//!
//! Order (first match wins):
//!   1. locale prefix already in the path (`/pt/...` or `/pt`)
//!   2. preference cookie holding a supported code
//!   3. Accept-Language primary subtags, in header order
//!   4. the configured default
//!
//! Everything here is pure: the middleware in `routes` feeds it the request
//! parts and turns a `Routing::Redirect` into a 307 + cookie.

use serde::Serialize;

use crate::domain::Locale;

/// Path prefixes served as-is, without locale handling.
const BYPASS_PREFIXES: &[&str] = &["/api", "/ws", "/static", "/assets", "/_next", "/favicon.ico"];

/// What the locale middleware should do with a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Routing {
  /// Assets, API and file-like paths: no locale involved.
  Bypass,
  /// Path already carries a supported locale prefix.
  Pass(Locale),
  /// Path must be prefixed; `location` includes the query string.
  Redirect { locale: Locale, location: String },
}

/// Locale carried by the path prefix, if any.
pub fn path_locale(path: &str, supported: &[Locale]) -> Option<Locale> {
  supported.iter().copied().find(|l| {
    let prefix = format!("/{}", l.code());
    path == prefix || path.starts_with(&format!("{prefix}/"))
  })
}

/// True for build assets, API routes and anything that looks like a file.
pub fn is_bypassed(path: &str) -> bool {
  path.contains('.')
    || BYPASS_PREFIXES
      .iter()
      .any(|p| path == *p || path.starts_with(&format!("{p}/")))
}

/// Primary subtags of an Accept-Language header, lowercased, in header order.
/// Quality values are ignored; order is what the client sent.
pub fn accept_language_tags(header: &str) -> impl Iterator<Item = String> + '_ {
  header
    .split(',')
    .filter_map(|part| {
      let tag = part.split(';').next()?.trim();
      let primary = tag.split('-').next()?.trim();
      if primary.is_empty() { None } else { Some(primary.to_ascii_lowercase()) }
    })
}

/// Resolve the locale for a request. Never fails: no signal means `default`.
pub fn resolve(
  path: &str,
  cookie: Option<&str>,
  accept_language: Option<&str>,
  supported: &[Locale],
  default: Locale,
) -> Locale {
  if let Some(l) = path_locale(path, supported) {
    return l;
  }

  if let Some(l) = cookie
    .and_then(|c| Locale::from_code(c.trim()))
    .filter(|l| supported.contains(l))
  {
    return l;
  }

  if let Some(header) = accept_language {
    if let Some(l) = accept_language_tags(header)
      .filter_map(|t| Locale::from_code(&t))
      .find(|l| supported.contains(l))
    {
      return l;
    }
  }

  default
}

/// Decide how to route a request path.
pub fn route(
  path: &str,
  query: Option<&str>,
  cookie: Option<&str>,
  accept_language: Option<&str>,
  supported: &[Locale],
  default: Locale,
) -> Routing {
  if is_bypassed(path) {
    return Routing::Bypass;
  }
  if let Some(l) = path_locale(path, supported) {
    return Routing::Pass(l);
  }

  let locale = resolve(path, cookie, accept_language, supported, default);
  let rest = if path == "/" { "" } else { path };
  let mut location = format!("/{}{}", locale.code(), rest);
  if let Some(q) = query.filter(|q| !q.is_empty()) {
    location.push('?');
    location.push_str(q);
  }
  Routing::Redirect { locale, location }
}

/// Value of a named cookie from a raw `Cookie` header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
  header.split(';').find_map(|pair| {
    let (k, v) = pair.split_once('=')?;
    if k.trim() == name { Some(v.trim().trim_matches('"')) } else { None }
  })
}

/// `Set-Cookie` value persisting the locale preference.
pub fn locale_cookie(name: &str, locale: Locale, max_age_secs: u64) -> String {
  format!("{name}={}; Path=/; Max-Age={max_age_secs}; SameSite=Lax", locale.code())
}

/// Colour theme preference, read from the `theme` cookie.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  Light,
  Dark,
  #[default]
  System,
}

impl Theme {
  pub fn from_cookie(value: Option<&str>) -> Theme {
    match value.map(str::trim) {
      Some("light") => Theme::Light,
      Some("dark") => Theme::Dark,
      _ => Theme::System,
    }
  }
}

/// Explicit per-request rendering inputs. Passed into every page render;
/// nothing here lives in process-wide state.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct RenderContext {
  pub locale: Locale,
  pub theme: Theme,
  pub default_locale: Locale,
}
