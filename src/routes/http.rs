//! HTTP endpoint handlers. Thin wrappers: resolve the locale segment, build
//! the `RenderContext`, run the page builder off the async runtime (content
//! reads are blocking file IO) and answer JSON. A missing record or an
//! unsupported locale answers 404 with the localized not-found view.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, Request, State},
  http::{header, HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use tower::ServiceExt;
use tracing::{error, info, instrument};

use crate::domain::Locale;
use crate::locale::{cookie_value, is_bypassed, RenderContext, Theme};
use crate::pages::{self, CourseQuery, LibraryQuery, SearchQuery};
use crate::protocol::{HealthOut, LocaleOut, LocalesOut};
use crate::routes::static_files;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_locales(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(LocalesOut {
    default: state.default_locale().code(),
    locales: state.supported_locales().iter().copied().map(LocaleOut::from).collect(),
  })
}

fn render_context(state: &AppState, locale: Locale, headers: &HeaderMap) -> RenderContext {
  let theme = headers
    .get(header::COOKIE)
    .and_then(|v| v.to_str().ok())
    .and_then(|c| cookie_value(c, "theme"));
  RenderContext { locale, theme: Theme::from_cookie(theme), default_locale: state.default_locale() }
}

fn not_found(state: &AppState, ctx: RenderContext) -> Response {
  let view = pages::not_found(&state.store.dictionary(ctx.locale), ctx);
  (StatusCode::NOT_FOUND, Json(view)).into_response()
}

/// Run a page builder on the blocking pool. `None` from the builder is a 404.
async fn page<T, F>(state: Arc<AppState>, lang: &str, headers: &HeaderMap, build: F) -> Response
where
  T: Serialize + Send + 'static,
  F: FnOnce(&AppState, RenderContext) -> Option<T> + Send + 'static,
{
  let Some(locale) = Locale::from_code(lang).filter(|l| state.supported_locales().contains(l)) else {
    info!(target: "studyhall", %lang, "Unsupported locale segment");
    let ctx = render_context(&state, state.default_locale(), headers);
    return tokio::task::spawn_blocking(move || not_found(&state, ctx))
      .await
      .unwrap_or_else(|_| StatusCode::NOT_FOUND.into_response());
  };
  let ctx = render_context(&state, locale, headers);
  let task = tokio::task::spawn_blocking(move || match build(&state, ctx) {
    Some(view) => Json(view).into_response(),
    None => not_found(&state, ctx),
  });
  match task.await {
    Ok(resp) => resp,
    Err(e) => {
      error!(target: "studyhall", error = %e, "Page builder task failed");
      StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
  }
}

/// `/:lang` also matches root-level files ("/favicon.ico"); those go to the static service.
#[instrument(level = "info", skip(state, headers, req))]
pub async fn http_home(
  State(state): State<Arc<AppState>>,
  Path(lang): Path<String>,
  headers: HeaderMap,
  req: Request,
) -> Response {
  if is_bypassed(&format!("/{lang}")) {
    return match static_files(&state.config.site.static_dir).oneshot(req).await {
      Ok(resp) => resp.into_response(),
      Err(never) => match never {},
    };
  }
  page(state, &lang, &headers, |s, ctx| Some(pages::home(&s.store, &s.config, ctx))).await
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_courses(
  State(state): State<Arc<AppState>>,
  Path(lang): Path<String>,
  Query(q): Query<CourseQuery>,
  headers: HeaderMap,
) -> Response {
  page(state, &lang, &headers, move |s, ctx| {
    let dict = s.store.dictionary(ctx.locale);
    Some(pages::courses(&s.store, &dict, ctx, &q))
  })
  .await
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_lesson(
  State(state): State<Arc<AppState>>,
  Path((lang, course, lesson)): Path<(String, String, String)>,
  headers: HeaderMap,
) -> Response {
  page(state, &lang, &headers, move |s, ctx| pages::lesson(&s.store, ctx, &course, &lesson)).await
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_games(
  State(state): State<Arc<AppState>>,
  Path(lang): Path<String>,
  Query(q): Query<SearchQuery>,
  headers: HeaderMap,
) -> Response {
  page(state, &lang, &headers, move |s, ctx| Some(pages::games(&s.store, ctx, &q))).await
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_vocabulary_game(
  State(state): State<Arc<AppState>>,
  Path((lang, slug)): Path<(String, String)>,
  headers: HeaderMap,
) -> Response {
  page(state, &lang, &headers, move |s, ctx| pages::vocabulary_game(&s.store, &s.config, ctx, &slug)).await
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_library(
  State(state): State<Arc<AppState>>,
  Path(lang): Path<String>,
  Query(q): Query<LibraryQuery>,
  headers: HeaderMap,
) -> Response {
  page(state, &lang, &headers, move |s, ctx| Some(pages::library(&s.store, ctx, &q))).await
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_tools(
  State(state): State<Arc<AppState>>,
  Path(lang): Path<String>,
  Query(q): Query<SearchQuery>,
  headers: HeaderMap,
) -> Response {
  page(state, &lang, &headers, move |s, ctx| Some(pages::tools(&s.store, ctx, &q))).await
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_tool(
  State(state): State<Arc<AppState>>,
  Path((lang, slug)): Path<(String, String)>,
  headers: HeaderMap,
) -> Response {
  page(state, &lang, &headers, move |s, ctx| {
    let dict = s.store.dictionary(ctx.locale);
    pages::tool(&s.store, &dict, ctx, &slug)
  })
  .await
}
