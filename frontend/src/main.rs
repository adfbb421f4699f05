mod api;
mod components;
mod file;
mod models;
mod session;
mod state;

use leptos::mount::mount_to_body;
use leptos::prelude::*;

use components::charts::ChartPanel;
use components::chat::ChatArea;
use state::AppState;

/// Root application component.
#[component]
fn App() -> impl IntoView {
    let state = AppState::provide();

    // Load model options on mount
    state.load_models();

    view! {
        <div class="app-container">
            <ChatArea />
            <ChartPanel />
            {move || {
                state.session.with(|s| s.notice.clone()).map(|notice| {
                    let class = if notice.is_error { "toast error" } else { "toast" };
                    view! {
                        <div class=class on:click=move |_| state.dismiss_notice()>
                            <strong>{notice.title}</strong>
                            <div>{notice.body}</div>
                        </div>
                    }
                })
            }}
        </div>
    }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}
