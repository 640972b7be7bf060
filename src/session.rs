// Session merge operation and the derived metadata-fetch state machine.
//
// All session mutation funnels through `merge` so an operation's distinct
// side effects (set a message, clear an error) land as one update and no
// observer sees a torn intermediate state.

use crate::models::{Session, SessionPatch};

/// Metadata-fetch lifecycle derived from session fields. Re-entrant: any
/// state can return to `Fetching` when a new lookup fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching,
    Ready,
    Failed,
}

impl Session {
    /// Shallow-merge a partial update. `None` fields are left untouched;
    /// double-optional fields distinguish "clear" from "leave alone".
    pub fn merge(&mut self, patch: SessionPatch) {
        if let Some(url) = patch.url {
            self.url = url;
        }
        if let Some(loading) = patch.is_loading {
            self.is_loading = loading;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
        if let Some(message) = patch.message {
            self.message = message;
        }
        if let Some(media_info) = patch.media_info {
            self.media_info = media_info;
        }
        if let Some(id) = patch.selected_rendition {
            self.selected_rendition = id;
        }
        if let Some(handle) = patch.download_handle {
            self.download_handle = handle;
        }
    }

    /// Current position in the Idle -> Fetching -> {Ready, Failed} machine.
    pub fn fetch_state(&self) -> FetchState {
        if self.url.is_empty() {
            FetchState::Idle
        } else if self.is_loading {
            FetchState::Fetching
        } else if self.media_info.is_some() {
            FetchState::Ready
        } else if self.error.is_some() {
            FetchState::Failed
        } else {
            FetchState::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaDescription;
    use crate::models::Rendition;

    fn demo_info() -> MediaDescription {
        MediaDescription {
            title: "Demo".to_string(),
            duration_seconds: Some(60.0),
            thumbnail_url: None,
            source_label: "youtube".to_string(),
            renditions: vec![Rendition::synthetic_best()],
        }
    }

    #[test]
    fn merge_leaves_untouched_fields_alone() {
        let mut session = Session::default();
        session.merge(SessionPatch::new().url("https://a").error("boom"));

        session.merge(SessionPatch::new().loading(true));
        assert_eq!(session.url, "https://a");
        assert_eq!(session.error.as_deref(), Some("boom"));
        assert!(session.is_loading);
    }

    #[test]
    fn merge_distinguishes_clear_from_absent() {
        let mut session = Session::default();
        session.merge(SessionPatch::new().error("boom").message("hi"));

        session.merge(SessionPatch::new().clear_error());
        assert!(session.error.is_none());
        assert_eq!(session.message.as_deref(), Some("hi"));
    }

    #[test]
    fn merge_applies_all_side_effects_at_once() {
        let mut session = Session::default();
        session.merge(SessionPatch::new().url("https://a").loading(true).error("old"));

        session.merge(
            SessionPatch::new()
                .media_info(demo_info())
                .selected_rendition("best")
                .loading(false)
                .clear_error(),
        );
        assert!(!session.is_loading);
        assert!(session.error.is_none());
        assert_eq!(session.media_info.as_ref().unwrap().title, "Demo");
    }

    #[test]
    fn fetch_state_walks_the_machine() {
        let mut session = Session::default();
        assert_eq!(session.fetch_state(), FetchState::Idle);

        session.merge(SessionPatch::new().url("https://a").loading(true).clear_error());
        assert_eq!(session.fetch_state(), FetchState::Fetching);

        session.merge(SessionPatch::new().media_info(demo_info()).loading(false));
        assert_eq!(session.fetch_state(), FetchState::Ready);

        // Re-entrant: a new lookup supersedes Ready.
        session.merge(SessionPatch::new().loading(true).clear_error());
        assert_eq!(session.fetch_state(), FetchState::Fetching);

        session.merge(
            SessionPatch::new()
                .error("unsupported")
                .clear_media_info()
                .loading(false),
        );
        assert_eq!(session.fetch_state(), FetchState::Failed);

        session.merge(SessionPatch::new().url("").clear_error());
        assert_eq!(session.fetch_state(), FetchState::Idle);
    }
}
