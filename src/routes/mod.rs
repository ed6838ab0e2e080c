//! Router assembly: page endpoints, API, WebSocket upgrade, locale redirects,
//! static files, CORS, and HTTP tracing.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    set_status::SetStatus,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, Level};

use crate::locale::{self, Routing};
use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - API under `/api/v1/...`
/// - JSON page views under `/:lang/...`
/// - locale redirect for unprefixed page paths (307 + preference cookie)
/// - static SPA from `site.static_dir` with index fallback
/// - CORS (allow any origin/method/headers) and the HTTP trace layer
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = static_files(&state.config.site.static_dir);

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/locales", get(http::http_locales))
        // Pages
        .route("/:lang", get(http::http_home))
        .route("/:lang/courses", get(http::http_courses))
        .route("/:lang/courses/:course/:lesson", get(http::http_lesson))
        .route("/:lang/games", get(http::http_games))
        .route("/:lang/games/vocabulary/:slug", get(http::http_vocabulary_game))
        .route("/:lang/library", get(http::http_library))
        .route("/:lang/tools", get(http::http_tools))
        .route("/:lang/tools/:slug", get(http::http_tool))
        // Frontend fallback; registered before the locale layer so it is covered too.
        .fallback_service(static_service)
        .layer(from_fn_with_state(state.clone(), locale_redirect))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// SPA files with `index.html` as the not-found fallback.
pub(crate) fn static_files(dir: &Path) -> ServeDir<SetStatus<ServeFile>> {
    ServeDir::new(dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(dir.join("index.html")))
}

/// Prefix page paths with the visitor's locale. Resolution order lives in
/// `crate::locale`; this only adapts the request and response.
async fn locale_redirect(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let site = &state.config.site;
    // Borrows of `req` must end before `next.run(req).await`.
    let routing = {
        let header_str = |name: header::HeaderName| req.headers().get(name).and_then(|v| v.to_str().ok());
        let cookie = header_str(header::COOKIE).and_then(|c| locale::cookie_value(c, &site.locale_cookie));
        locale::route(
            req.uri().path(),
            req.uri().query(),
            cookie,
            header_str(header::ACCEPT_LANGUAGE),
            state.supported_locales(),
            state.default_locale(),
        )
    };

    match routing {
        Routing::Bypass | Routing::Pass(_) => next.run(req).await,
        Routing::Redirect { locale, location } => {
            debug!(target: "studyhall", %location, "Locale redirect");
            let cookie = locale::locale_cookie(&site.locale_cookie, locale, site.cookie_max_age_secs);
            (
                StatusCode::TEMPORARY_REDIRECT,
                [(header::LOCATION, location), (header::SET_COOKIE, cookie)],
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::testutil::write;
    use crate::domain::Locale;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(dir: &std::path::Path) -> Router {
        let mut cfg = SiteConfig::default();
        cfg.site.content_dir = dir.join("content");
        cfg.site.static_dir = dir.join("static");
        build_router(Arc::new(AppState::new(cfg)))
    }

    fn seed(dir: &std::path::Path) {
        let root = dir.join("content");
        write(&root, "courses/rust/en/01-intro.md", "---\ntitle: Intro\norder: 1\n---\n# Hello\n");
        write(&root, "courses/rust/en/02-next.md", "---\ntitle: Next\norder: 2\n---\nText\n");
        write(&root, "courses/rust/pt/01-intro.md", "---\ntitle: Introdução\norder: 1\n---\n# Olá\n");
    }

    async fn get(app: Router, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let mut req = HttpRequest::builder().uri(uri);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        let resp = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, headers, json)
    }

    // ==================== API ====================

    #[tokio::test]
    async fn health_and_locales() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _, body) = get(app(dir.path()), "/api/v1/health", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);

        let (_, _, body) = get(app(dir.path()), "/api/v1/locales", &[]).await;
        assert_eq!(body["default"], "en");
        assert_eq!(body["locales"].as_array().unwrap().len(), Locale::ALL.len());
    }

    #[tokio::test]
    async fn root_files_are_served_not_treated_as_locales() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("static"), "robots.txt", "User-agent: *\n");
        let resp = app(dir.path())
            .oneshot(HttpRequest::builder().uri("/robots.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"User-agent: *\n");

        let (status, _, body) = get(app(dir.path()), "/fr", &[]).await;
        // Unprefixed, so redirected before any handler sees "fr".
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(body, serde_json::Value::Null);
    }

    // ==================== locale redirects ====================

    #[tokio::test]
    async fn unprefixed_paths_redirect_and_set_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let (status, headers, _) = get(app(dir.path()), "/courses?q=rust", &[("accept-language", "pt-BR,pt;q=0.9")]).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(headers[header::LOCATION], "/pt/courses?q=rust");
        assert_eq!(headers[header::SET_COOKIE], "locale=pt; Path=/; Max-Age=31536000; SameSite=Lax");

        let (_, headers, _) = get(app(dir.path()), "/", &[("cookie", "locale=es"), ("accept-language", "pt")]).await;
        assert_eq!(headers[header::LOCATION], "/es");
    }

    // ==================== pages ====================

    #[tokio::test]
    async fn lesson_page_serves_fallback_and_404s() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());

        let (status, _, body) = get(app(dir.path()), "/pt/courses/rust/02-next", &[("cookie", "theme=dark")]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fallback"], true);
        assert_eq!(body["served_locale"], "en");
        assert_eq!(body["ctx"]["locale"], "pt");
        assert_eq!(body["ctx"]["theme"], "dark");
        assert_eq!(body["previous"]["href"], "/pt/courses/rust/01-intro");

        let (status, _, body) = get(app(dir.path()), "/pt/courses/rust/99-none", &[]).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["title"], "Página não encontrada");
    }

    #[tokio::test]
    async fn courses_listing_renders() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let (status, _, body) = get(app(dir.path()), "/en/courses", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["groups"][0]["courses"][0]["lesson_count"], 2);
    }
}
