use std::sync::Arc;
use std::time::Instant;

use crate::api::{Backend, HttpBackend};
use crate::config::Config;
use crate::editor::WELCOME_CODE;
use crate::preferences::PreferenceStore;
use crate::state::SessionUiState;
use crate::studio::{PendingRequest, Studio};
use crate::view::Page;

const DEFAULT_SPLIT_PERCENT: u16 = 60;

pub struct App {
    pub should_quit: bool,
    pub studio: Studio<Page>,
    pub backend: Arc<dyn Backend>,
    pub server_url: String,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: Config, server_url: String, prefs: Box<dyn PreferenceStore>) -> Self {
        let http = HttpBackend::new(&server_url);
        tracing::info!("Backend requests go to {}", http.base_url());
        let backend: Arc<dyn Backend> = Arc::new(http);
        Self::with_backend(config, server_url, prefs, backend)
    }

    pub fn with_backend(
        config: Config,
        server_url: String,
        prefs: Box<dyn PreferenceStore>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        let mut options = config.editor;
        options.value = WELCOME_CODE.to_string();
        let state = SessionUiState::with_theme(options.theme);
        let page = Page::new(options, config.split_percent.unwrap_or(DEFAULT_SPLIT_PERCENT));

        let mut studio = Studio::with_state(page, prefs, state);
        studio.load_preference(Instant::now());

        Self {
            should_quit: false,
            studio,
            backend,
            server_url,
            animation_frame: 0,
        }
    }

    /// Tick animation frame and due status reversions (called by Tick event)
    pub fn tick(&mut self, now: Instant) {
        self.studio.tick(now);
        if self.studio.view.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Sends `request` on a background task; the completion comes back as an event.
    pub fn spawn_request(
        &self,
        request: PendingRequest,
        tx: tokio::sync::mpsc::UnboundedSender<crate::tui::AppEvent>,
    ) {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let completion = crate::studio::execute(backend.as_ref(), request).await;
            if tx.send(crate::tui::AppEvent::Completed(completion)).is_err() {
                tracing::warn!("Request finished after the event loop closed");
            }
        });
    }
}
