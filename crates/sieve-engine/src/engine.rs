//! Filter engine
//!
//! Owns the compiled rule store, the public suffix list and the stylesheet
//! cache. The host browser asks it two questions: should this request be
//! loaded, and which stylesheet should this page get.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sieve_compiler::{compile_filter_list_bytes, CompileStats};
use sieve_core::domain::{normalize_host, PublicSuffixList};
use sieve_core::matcher::Matcher;
use sieve_core::rules::RuleStore;
use sieve_core::types::{MatchDecision, MatchResult, RequestContext, ResourceType};
use sieve_core::url::extract_host;

use crate::config::Config;
use crate::error::EngineError;
use crate::stylesheet::{render_stylesheet, StylesheetCache};
use crate::user_style::UserStylesheet;
use crate::watch::FileWatcher;

pub struct Engine {
    // Dropped first so no callback outlives the sheets
    watcher: Option<FileWatcher>,
    store: RuleStore,
    psl: PublicSuffixList,
    stats: CompileStats,
    sheets: Arc<Mutex<Stylesheets>>,
    stylesheet_dir: PathBuf,
    default_stylesheet: PathBuf,
}

/// Generated stylesheets and their inputs. All writes happen under the
/// engine's lock, shared with the user stylesheet watcher.
struct Stylesheets {
    cache: StylesheetCache,
    user: UserStylesheet,
    general: String,
}

impl Stylesheets {
    fn write_default(&self) {
        let css = render_stylesheet(self.user.content(), &[], &self.general);
        if let Err(e) = self.cache.write_default(&css) {
            log::warn!("cannot write {}: {}", self.cache.default_path().display(), e);
        }
    }

    fn refresh_user(&mut self) -> bool {
        if !self.user.refresh() {
            return false;
        }
        self.cache.invalidate_hosts();
        self.write_default();
        true
    }
}

fn lock(sheets: &Mutex<Stylesheets>) -> MutexGuard<'_, Stylesheets> {
    sheets.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Engine {
    /// Start the engine from configuration.
    ///
    /// # Errors
    ///
    /// Fails when the engine is disabled, the filter list or suffix list
    /// cannot be read, or the stylesheet cache cannot be created. Bad lines
    /// inside the filter list are never fatal.
    pub fn new(config: &Config) -> Result<Self, EngineError> {
        config.validate()?;
        if !config.enabled {
            return Err(EngineError::Disabled);
        }

        let list = fs::read(&config.filter_list).map_err(|source| EngineError::FilterListUnreadable {
            path: config.filter_list.clone(),
            source,
        })?;

        let psl = match &config.public_suffix_list {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| EngineError::PublicSuffixList {
                    path: path.clone(),
                    source,
                })?;
                PublicSuffixList::parse(&text)
            }
            None => PublicSuffixList::builtin(),
        };

        Self::from_list(
            &list,
            psl,
            &config.cache_dir,
            config.user_stylesheet_uri.as_deref(),
        )
    }

    /// Build an engine from filter-list bytes already in memory.
    ///
    /// A local user stylesheet is watched; edits rebuild the default sheet
    /// and drop the per-host ones. A failed watch is logged and the engine
    /// starts without it.
    pub fn from_list(
        list: &[u8],
        psl: PublicSuffixList,
        cache_dir: &Path,
        user_stylesheet_uri: Option<&str>,
    ) -> Result<Self, EngineError> {
        let (store, stats) = compile_filter_list_bytes(list);
        log::info!(
            "loaded {} blocking, {} exception, {} hiding rules ({} dropped)",
            stats.network_rules,
            stats.exception_rules,
            stats.hiders + stats.general_selectors,
            stats.dropped
        );

        let cache = StylesheetCache::create(cache_dir).map_err(|source| EngineError::CacheDir {
            path: cache_dir.to_path_buf(),
            source,
        })?;
        let stylesheet_dir = cache.dir().to_path_buf();
        let default_stylesheet = cache.default_path().to_path_buf();

        let sheets = Stylesheets {
            cache,
            user: UserStylesheet::from_uri(user_stylesheet_uri),
            general: store.general_selectors().to_string(),
        };
        sheets.write_default();
        let user_path = sheets.user.path().map(Path::to_path_buf);
        let sheets = Arc::new(Mutex::new(sheets));

        let watcher = user_path.and_then(|path| {
            let shared = Arc::downgrade(&sheets);
            let watched = FileWatcher::spawn(&path, move || {
                if let Some(sheets) = shared.upgrade() {
                    lock(&sheets).refresh_user();
                }
            });
            match watched {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    log::warn!("cannot watch user stylesheet {}: {}", path.display(), e);
                    None
                }
            }
        });

        Ok(Self {
            watcher,
            store,
            psl,
            stats,
            sheets,
            stylesheet_dir,
            default_stylesheet,
        })
    }

    /// Decide a request whose context is already classified.
    pub fn evaluate(&self, ctx: &RequestContext<'_>) -> MatchDecision {
        Matcher::new(&self.store).evaluate(ctx)
    }

    /// Like [`Engine::evaluate`], also naming the deciding rule.
    pub fn match_request(&self, ctx: &RequestContext<'_>) -> MatchResult {
        Matcher::new(&self.store).match_request(ctx)
    }

    /// Classify and decide a raw request.
    ///
    /// `page_url` is the top-level document, used for third-party checks.
    /// `content_type` is the sniffed MIME type when known. Anything that
    /// cannot be classified is allowed.
    pub fn check_request(
        &self,
        url: &str,
        page_url: Option<&str>,
        content_type: Option<&str>,
    ) -> MatchDecision {
        let host = match extract_host(url).and_then(normalize_host) {
            Some(host) => host,
            None => return MatchDecision::Allow,
        };
        let base_domain = match self.psl.base_domain_of(&host) {
            Some(base) => base,
            None => return MatchDecision::Allow,
        };

        let is_third_party = match page_url {
            Some(page_url) => {
                let page_base = extract_host(page_url)
                    .and_then(normalize_host)
                    .and_then(|page_host| self.psl.base_domain_of(&page_host));
                match page_base {
                    Some(page_base) => page_base != base_domain,
                    None => return MatchDecision::Allow,
                }
            }
            None => false,
        };

        let ctx = RequestContext {
            url,
            host: &host,
            base_domain: &base_domain,
            resource: content_type.map(ResourceType::from_content_type).unwrap_or_default(),
            is_third_party,
        };
        self.evaluate(&ctx)
    }

    /// The stylesheet a page on `host` should use.
    ///
    /// Hosts without domain-scoped selectors share the default sheet. Returns
    /// `None` only when a per-host sheet was needed and could not be written.
    pub fn stylesheet_for(&self, host: &str) -> Option<PathBuf> {
        let (host, base_domain) = match normalize_host(host)
            .and_then(|host| self.psl.base_domain_of(&host).map(|base| (host, base)))
        {
            Some(pair) => pair,
            None => return Some(self.default_stylesheet.clone()),
        };

        let mut sheets = lock(&self.sheets);
        if let Some(path) = sheets.cache.cached(&host) {
            return Some(path);
        }

        let selectors = self.store.hiding_selectors(&host, &base_domain);
        if selectors.is_empty() {
            return Some(self.default_stylesheet.clone());
        }

        let css = render_stylesheet(sheets.user.content(), &selectors, &sheets.general);
        match sheets.cache.store(&host, &css) {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("cannot write stylesheet for {}: {}", host, e);
                None
            }
        }
    }

    pub fn default_stylesheet(&self) -> &Path {
        &self.default_stylesheet
    }

    pub fn stylesheet_dir(&self) -> &Path {
        &self.stylesheet_dir
    }

    /// Re-read the user stylesheet now instead of waiting for the watch.
    /// Returns `true` when the generated sheets were rebuilt.
    pub fn refresh_user_stylesheet(&self) -> bool {
        lock(&self.sheets).refresh_user()
    }

    /// Whether edits to the user stylesheet are picked up automatically.
    pub fn is_watching_user_stylesheet(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn base_domain_of(&self, host: &str) -> Option<String> {
        self.psl.base_domain_of(host)
    }

    pub fn is_third_party(&self, page_host: &str, request_host: &str) -> Option<bool> {
        self.psl.is_third_party(page_host, request_host)
    }

    pub fn has_cosmetic_rules(&self) -> bool {
        self.store.has_cosmetic_rules()
    }

    pub fn stats(&self) -> &CompileStats {
        &self.stats
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }
}
