//! Application state shared by every handler: the site configuration and the
//! content store rooted at `site.content_dir`.
//!
//! Nothing here is mutable. Content is re-read from disk per request and
//! widget state lives in the WebSocket session that owns it.

use tracing::{info, instrument, warn};

use crate::config::SiteConfig;
use crate::content::ContentStore;
use crate::domain::Locale;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: SiteConfig,
    pub store: ContentStore,
}

impl AppState {
    #[instrument(level = "info", skip_all)]
    pub fn new(config: SiteConfig) -> Self {
        let root = &config.site.content_dir;
        if root.is_dir() {
            info!(target: "studyhall", content_dir = %root.display(), default_locale = %config.site.default_locale, "Content root ready");
        } else {
            warn!(target: "studyhall", content_dir = %root.display(), "Content root missing; every listing will be empty");
        }
        let store = ContentStore::new(root.clone(), config.site.default_locale);
        Self { config, store }
    }

    pub fn supported_locales(&self) -> &'static [Locale] {
        &Locale::ALL
    }

    pub fn default_locale(&self) -> Locale {
        self.config.site.default_locale
    }
}
