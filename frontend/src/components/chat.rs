use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

use crate::session::{FileBadge, Role, UiMessage, UploadState};
use crate::state::AppState;

/// Main chat area with model picker, message history and input.
#[component]
pub fn ChatArea() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <main class="chat-area">
            <div class="chat-header">
                <span>"Financial Assistant"</span>
                <ModelPicker />
            </div>

            // Messages
            <div class="messages-container">
                {move || {
                    if state.session.with(|s| s.messages.is_empty()) {
                        view! {
                            <div class="empty-state">
                                "Ask about your financial data, or upload a CSV, PDF or chart image to get started"
                            </div>
                        }.into_any()
                    } else {
                        view! {
                            <For
                                each=move || state.session.with(|s| s.messages.clone())
                                key=|m| (m.id.clone(), m.pending)
                                let:msg
                            >
                                <MessageBubble msg=msg />
                            </For>
                        }.into_any()
                    }
                }}
            </div>

            <ChatInput />
        </main>
    }
}

#[component]
fn ModelPicker() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <select
            class="model-picker"
            prop:value=move || state.selected_model.get()
            on:change=move |ev| state.set_selected_model.set(event_target_value(&ev))
            disabled=move || state.session.with(|s| s.is_sending())
        >
            <For
                each=move || state.models.get()
                key=|m| m.id.clone()
                let:model
            >
                <option value=model.id.clone()>{model.name.clone()}</option>
            </For>
        </select>
    }
}

/// A single chat message bubble.
#[component]
fn MessageBubble(msg: UiMessage) -> impl IntoView {
    let css_class = match (msg.role, msg.pending) {
        (Role::User, _) => "message user",
        (Role::Assistant, true) => "message assistant pending",
        (Role::Assistant, false) => "message assistant",
    };
    let chart_note = msg
        .chart
        .as_ref()
        .map(|c| view! { <div class="chart-note">"Chart: " {c.config.title.clone()}</div> });

    view! {
        <div class=css_class>
            <div class="role-label">{msg.role.as_str()}</div>
            {msg.file.map(|f| view! { <FileChip badge=f /> })}
            <div>{msg.content}</div>
            {chart_note}
        </div>
    }
}

#[component]
fn FileChip(badge: FileBadge) -> impl IntoView {
    let kind = if badge.is_text { "text" } else { "image" };
    view! {
        <div class="file-chip" title=badge.media_type>
            {badge.file_name} " (" {kind} ")"
        </div>
    }
}

/// Chat input form with file picker, textarea and send button.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());

    let is_sending = move || state.session.with(|s| s.is_sending());
    let is_uploading = move || state.session.with(|s| s.is_uploading());
    let has_file = move || state.session.with(|s| s.ready_file().is_some());

    let send = move || {
        if state.send_message(input.get_untracked()) {
            set_input.set(String::new());
        }
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send();
        }
    };

    let on_file = move |ev: ev::Event| {
        let Some(target) = ev.target().and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        if let Some(picked) = target.files().and_then(|files| files.get(0)) {
            state.upload(picked);
        }
        // Allow re-picking the same file.
        target.set_value("");
    };

    view! {
        <div class="input-area">
            {move || {
                state.session.with(|s| match &s.upload {
                    UploadState::Idle => None,
                    UploadState::Uploading { file_name } => Some(view! {
                        <div class="upload-status">"Reading " {file_name.clone()} "..."</div>
                    }.into_any()),
                    UploadState::Ready(file) => Some(view! {
                        <div class="upload-status">
                            {file.file_name.clone()}
                            <button class="clear-file-btn" on:click=move |_| state.clear_file()>"x"</button>
                        </div>
                    }.into_any()),
                })
            }}
            <div class="input-row">
                <label class="file-btn" class:disabled=move || is_sending() || is_uploading()>
                    "+"
                    <input
                        type="file"
                        accept=".csv,.txt,.md,.json,.tsv,.xml,application/pdf,.pdf,image/*"
                        style="display:none"
                        on:change=on_file
                        disabled=move || is_sending() || is_uploading()
                    />
                </label>
                <textarea
                    rows="1"
                    placeholder="Ask about your data… (Enter to send, Shift+Enter for newline)"
                    prop:value=input
                    on:input=move |ev| {
                        set_input.set(event_target_value(&ev));
                    }
                    on:keydown=on_keydown
                    disabled=is_sending
                />
                <button
                    class="send-btn"
                    on:click=move |_| send()
                    disabled=move || {
                        is_sending() || is_uploading() || (input.get().trim().is_empty() && !has_file())
                    }
                >
                    {move || if is_sending() { "Sending…" } else { "Send" }}
                </button>
            </div>
        </div>
    }
}
