// Request coordinator - ties debounce, cancellation, normalization and the
// download trigger together around the single session aggregate.
//
// Every operation follows the same discipline: obtain a fresh token, merge
// the "started" patch, race the network call against supersession, and
// re-check the token before merging the terminal patch. A superseded
// operation's result never touches the session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;

use crate::debounce::DebounceScheduler;
use crate::errors::Error;
use crate::models::{CommunityLinks, Session, SessionPatch, DEFAULT_RENDITION};
use crate::normalize::normalize;
use crate::registry::{RequestKind, RequestRegistry};
use crate::service::ExtractionService;

pub const MSG_PREPARING: &str = "Preparing download...";
pub const MSG_STARTING: &str = "Download starting...";
pub const MSG_FALLBACK: &str = "Click the button below if download didn't start";
pub const MSG_ENTER_URL: &str = "Please enter a URL";

const DEBOUNCE_DELAY: Duration = Duration::from_millis(800);
const FALLBACK_REVEAL_DELAY: Duration = Duration::from_millis(2000);

/// Host-supplied silent download starter. How the host navigates to the
/// locator (synthetic link click, hidden frame, shell open) is a platform
/// detail; no completion signal is expected either way.
pub trait SilentTrigger: Send + Sync {
    fn trigger(&self, locator: &str);
}

/// Default trigger: records the attempt in the log and nothing else.
pub struct LogOnlyTrigger;

impl SilentTrigger for LogOnlyTrigger {
    fn trigger(&self, locator: &str) {
        info!("silent download trigger: {}", locator);
    }
}

/// Timing knobs for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Quiet interval before a metadata lookup fires.
    pub debounce_delay: Duration,
    /// Constant delay before the manual download fallback is revealed.
    pub fallback_delay: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce_delay: DEBOUNCE_DELAY,
            fallback_delay: FALLBACK_REVEAL_DELAY,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }
}

struct Inner {
    service: Arc<dyn ExtractionService>,
    trigger: Arc<dyn SilentTrigger>,
    registry: RequestRegistry,
    debounce: DebounceScheduler,
    session: watch::Sender<Session>,
    links: Mutex<CommunityLinks>,
    fallback_delay: Duration,
}

/// Orchestration facade. Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    pub fn new(
        service: Arc<dyn ExtractionService>,
        trigger: Arc<dyn SilentTrigger>,
        config: CoordinatorConfig,
    ) -> Self {
        let (session, _) = watch::channel(Session::default());
        Self {
            inner: Arc::new(Inner {
                service,
                trigger,
                registry: RequestRegistry::new(),
                debounce: DebounceScheduler::new(config.debounce_delay),
                session,
                links: Mutex::new(CommunityLinks::default()),
                fallback_delay: config.fallback_delay,
            }),
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.inner.session.borrow().clone()
    }

    /// Observe session snapshots as they change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.session.subscribe()
    }

    /// Current community locators (defaults until a refresh succeeds).
    pub fn community_links(&self) -> CommunityLinks {
        self.inner.links.lock().unwrap().clone()
    }

    fn merge(&self, patch: SessionPatch) {
        self.inner.session.send_modify(|session| session.merge(patch));
    }

    /// Called on every keystroke. Schedules a metadata lookup for `url`
    /// after the quiet interval; an empty input cancels any pending lookup,
    /// invalidates the in-flight one and resets the metadata flow to idle.
    pub fn notify_input(&self, url: &str) {
        let url = url.to_string();
        let previous = self.inner.session.borrow().url.clone();

        if url.is_empty() {
            debug!("input cleared; metadata flow back to idle");
            self.inner.debounce.cancel();
            self.inner.registry.begin(RequestKind::Metadata);
            self.merge(
                SessionPatch::new()
                    .url(url)
                    .loading(false)
                    .clear_error()
                    .clear_message()
                    .clear_media_info()
                    .selected_rendition(DEFAULT_RENDITION),
            );
            return;
        }

        let mut patch = SessionPatch::new().url(url.clone());
        if url != previous {
            // Metadata for the old URL is stale the moment the text changes.
            patch = patch
                .clear_media_info()
                .selected_rendition(DEFAULT_RENDITION)
                .clear_message();
        }
        self.merge(patch);

        let weak = Arc::downgrade(&self.inner);
        self.inner.debounce.schedule(async move {
            if let Some(inner) = weak.upgrade() {
                Coordinator { inner }.fetch_media_info(&url).await;
            }
        });
    }

    /// Record the user's rendition choice.
    pub fn select_rendition(&self, rendition_id: &str) {
        self.merge(SessionPatch::new().selected_rendition(rendition_id));
    }

    /// Look up and normalize metadata for `url`, superseding any in-flight
    /// lookup. Stale results are dropped silently.
    pub async fn fetch_media_info(&self, url: &str) {
        if url.is_empty() {
            return;
        }

        let token = self.inner.registry.begin(RequestKind::Metadata);
        self.merge(SessionPatch::new().loading(true).clear_error());
        debug!("metadata fetch started for {}", url);

        let outcome = tokio::select! {
            result = self.inner.service.fetch_info(url) => Some(result),
            _ = self.inner.registry.superseded(&token) => None,
        };
        let Some(result) = outcome else {
            debug!("metadata fetch for {} superseded mid-flight; dropped", url);
            return;
        };
        if !self.inner.registry.is_current(&token) {
            debug!("stale metadata result for {} dropped", url);
            return;
        }

        match result.and_then(normalize) {
            Ok(media_info) => {
                debug!(
                    "metadata ready for {}: {} rendition(s)",
                    url,
                    media_info.renditions.len()
                );
                self.merge(
                    SessionPatch::new()
                        .media_info(media_info)
                        .selected_rendition(DEFAULT_RENDITION)
                        .loading(false)
                        .clear_message(),
                );
            }
            Err(err) => {
                warn!("metadata fetch for {} failed: {}", url, err);
                self.merge(
                    SessionPatch::new()
                        .error(err.to_string())
                        .clear_media_info()
                        .loading(false),
                );
            }
        }
    }

    /// Prepare a download for `url`, fire the silent trigger on success and
    /// reveal the manual fallback link after a constant delay. The
    /// preparation request is issued at most once per call.
    pub async fn start_download(&self, url: &str, rendition_id: &str) {
        if url.trim().is_empty() {
            let err = Error::Validation(MSG_ENTER_URL.to_string());
            warn!("download rejected: {}", err);
            self.merge(SessionPatch::new().error(err.to_string()));
            return;
        }

        let token = self.inner.registry.begin(RequestKind::Download);
        self.merge(
            SessionPatch::new()
                .loading(true)
                .clear_error()
                .message(MSG_PREPARING)
                .clear_download_handle(),
        );
        info!("download preparation started for {} ({})", url, rendition_id);

        let outcome = tokio::select! {
            result = self.inner.service.prepare_download(url, rendition_id) => Some(result),
            _ = self.inner.registry.superseded(&token) => None,
        };
        let Some(result) = outcome else {
            debug!("download preparation for {} superseded mid-flight; dropped", url);
            return;
        };
        if !self.inner.registry.is_current(&token) {
            debug!("stale download result for {} dropped", url);
            return;
        }

        match result {
            Ok(locator) => {
                info!("download prepared at {}", locator);
                self.merge(SessionPatch::new().loading(false).message(MSG_STARTING));
                self.inner.trigger.trigger(&locator);

                // No environment gives a reliable completion signal for the
                // silent trigger, so the manual fallback is revealed
                // unconditionally after a constant delay.
                let weak = Arc::downgrade(&self.inner);
                let delay = self.inner.fallback_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    let this = Coordinator { inner };
                    if this.inner.registry.is_current(&token) {
                        debug!("revealing manual download fallback");
                        this.merge(
                            SessionPatch::new()
                                .download_handle(locator)
                                .message(MSG_FALLBACK),
                        );
                    }
                });
            }
            Err(err) => {
                warn!("download preparation for {} failed: {}", url, err);
                self.merge(
                    SessionPatch::new()
                        .loading(false)
                        .clear_message()
                        .error(err.to_string()),
                );
            }
        }
    }

    /// Best-effort refresh of the community locators. Failures are logged
    /// and swallowed; the hard-coded defaults stay in place.
    pub async fn refresh_community_links(&self) {
        match self.inner.service.community_links().await {
            Ok(links) => {
                info!("community links refreshed");
                *self.inner.links.lock().unwrap() = links;
            }
            Err(err) => {
                warn!("community links refresh failed, keeping defaults: {}", err);
            }
        }
    }

    /// Cancel pending timers and invalidate all in-flight work. Any result
    /// arriving after this point is dropped.
    pub fn shutdown(&self) {
        debug!("coordinator shutdown");
        self.inner.debounce.cancel();
        self.inner.registry.begin(RequestKind::Metadata);
        self.inner.registry.begin(RequestKind::Download);
    }
}
