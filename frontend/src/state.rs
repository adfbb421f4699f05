use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::file;
use crate::models::ModelOption;
use crate::session::{Notice, Session};

/// How long a toast stays on screen.
const NOTICE_MS: u32 = 5_000;

/// Shared application state, provided via Leptos context.
#[derive(Clone, Copy)]
pub struct AppState {
    // --- Read signals (for components to subscribe to) ---
    pub session: ReadSignal<Session>,
    pub models: ReadSignal<Vec<ModelOption>>,
    pub selected_model: ReadSignal<String>,

    // --- Write signals (for mutating state) ---
    pub set_session: WriteSignal<Session>,
    pub set_models: WriteSignal<Vec<ModelOption>>,
    pub set_selected_model: WriteSignal<String>,
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (session, set_session) = signal(Session::new());
        let (models, set_models) = signal(Vec::<ModelOption>::new());
        let (selected_model, set_selected_model) = signal(String::new());

        let state = Self {
            session,
            models,
            selected_model,
            set_session,
            set_models,
            set_selected_model,
        };

        provide_context(state);
        state
    }

    /// Load the model list and preselect the backend's default.
    pub fn load_models(&self) {
        let state = *self;
        spawn_local(async move {
            match api::fetch_models().await {
                Ok(models) => {
                    let default = models
                        .iter()
                        .find(|m| m.default)
                        .or_else(|| models.first())
                        .map(|m| m.id.clone())
                        .unwrap_or_default();
                    state.set_selected_model.set(default);
                    state.set_models.set(models);
                }
                Err(e) => {
                    log::error!("Failed to fetch models: {e}");
                    state.update_session(|s| s.notice = Some(Notice::error("Models Unavailable", e)));
                }
            }
        });
    }

    /// Read and encode a picked file; the result waits for the next send.
    pub fn upload(&self, picked: web_sys::File) {
        let name = picked.name();
        let mut started = false;
        self.set_session.update(|s| started = s.begin_upload(&name));
        if !started {
            return;
        }
        self.schedule_notice_clear();

        let state = *self;
        spawn_local(async move {
            match file::read_file(picked).await {
                Ok(data) => {
                    log::debug!("file ready: {} ({} bytes)", data.file_name, data.file_size);
                    state.update_session(|s| s.upload_ready(data));
                }
                Err(e) => {
                    log::error!("Upload failed: {e}");
                    state.update_session(|s| s.upload_failed(e));
                }
            }
        });
    }

    /// Submit the typed text (and any ready file). Returns `true` when a
    /// request was started, so the caller can clear its input.
    pub fn send_message(&self, text: String) -> bool {
        let model = self.selected_model.get_untracked();
        let mut outcome = None;
        self.set_session.update(|s| outcome = Some(s.submit(&text, &model)));

        let body = match outcome {
            Some(Ok(body)) => body,
            Some(Err(e)) => {
                log::debug!("submit refused: {e}");
                self.schedule_notice_clear();
                return false;
            }
            None => return false,
        };

        let state = *self;
        spawn_local(async move {
            match api::send_finance(&body).await {
                Ok(resp) => state.update_session(|s| s.complete(resp)),
                Err(e) => {
                    log::error!("Finance request failed: {e}");
                    state.update_session(|s| s.fail(e));
                }
            }
        });
        true
    }

    pub fn select_chart(&self, index: usize) {
        self.set_session.update(|s| s.select_chart(index));
    }

    pub fn clear_file(&self) {
        self.set_session.update(|s| s.clear_upload());
    }

    pub fn dismiss_notice(&self) {
        self.set_session.update(|s| s.dismiss_notice());
    }

    fn update_session(&self, f: impl FnOnce(&mut Session)) {
        self.set_session.update(f);
        self.schedule_notice_clear();
    }

    /// Clears the current toast after a delay, unless it was replaced.
    fn schedule_notice_clear(&self) {
        let Some(current) = self.session.get_untracked().notice else {
            return;
        };
        let set_session = self.set_session;
        Timeout::new(NOTICE_MS, move || {
            set_session.update(|s| {
                if s.notice.as_ref() == Some(&current) {
                    s.dismiss_notice();
                }
            });
        })
        .forget();
    }
}
