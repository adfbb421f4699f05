//! Client-side chat session: the message log, the pending upload and the
//! in-flight request, with the transitions between them.
//!
//! Upload: `Idle -> Uploading -> Ready | Idle` (failure).
//! Request: `Idle -> Sending -> Done | Failed`, then back to `Sending` on the
//! next submit. Only one request may be in flight.

use crate::models::{ChartData, FileData, FinanceRequest, FinanceResponse, WireMessage};

const CHART_FALLBACK: &str = "Generated a chart based on your request.";
const EMPTY_FALLBACK: &str = "I received an empty response.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// What the message bubble shows about an attached file.
#[derive(Clone, Debug, PartialEq)]
pub struct FileBadge {
    pub file_name: String,
    pub media_type: String,
    pub is_text: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UiMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Assistant placeholder awaiting the backend reply.
    pub pending: bool,
    pub has_tool_use: bool,
    pub file: Option<FileBadge>,
    pub chart: Option<ChartData>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UploadState {
    Idle,
    Uploading { file_name: String },
    Ready(FileData),
}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestState {
    Idle,
    Sending,
    Done,
    Failed(String),
}

/// A transient notification (toast).
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub is_error: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitError {
    Busy,
    Empty,
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Busy => f.write_str("A request is already in progress."),
            SubmitError::Empty => f.write_str("Please type a message or upload a file."),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub messages: Vec<UiMessage>,
    pub upload: UploadState,
    pub request: RequestState,
    pub chart_index: usize,
    pub notice: Option<Notice>,
    next_id: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            upload: UploadState::Idle,
            request: RequestState::Idle,
            chart_index: 0,
            notice: None,
            next_id: 0,
        }
    }

    pub fn is_sending(&self) -> bool {
        self.request == RequestState::Sending
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.upload, UploadState::Uploading { .. })
    }

    pub fn ready_file(&self) -> Option<&FileData> {
        match &self.upload {
            UploadState::Ready(file) => Some(file),
            _ => None,
        }
    }

    // ── Upload transitions ───────────────────────────────────────────────────

    /// Returns `false` when another upload or a request is in progress.
    pub fn begin_upload(&mut self, file_name: &str) -> bool {
        if self.is_uploading() || self.is_sending() {
            return false;
        }
        self.upload = UploadState::Uploading { file_name: file_name.to_string() };
        self.notice = Some(Notice::info("Processing File", format!("Working on {file_name}...")));
        true
    }

    pub fn upload_ready(&mut self, file: FileData) {
        let kind = if file.is_text { "Text content loaded" } else { "Image data loaded" };
        self.notice = Some(Notice::info(
            "File Ready",
            format!("{} ({kind}). Add prompt.", file.file_name),
        ));
        self.upload = UploadState::Ready(file);
    }

    pub fn upload_failed(&mut self, reason: String) {
        self.upload = UploadState::Idle;
        self.notice = Some(Notice::error("Upload Failed", reason));
    }

    pub fn clear_upload(&mut self) {
        if !self.is_uploading() {
            self.upload = UploadState::Idle;
        }
    }

    // ── Request transitions ──────────────────────────────────────────────────

    /// Appends the user turn and a pending assistant placeholder, and returns
    /// the request body to send. The ready upload, if any, is consumed.
    pub fn submit(&mut self, input: &str, model: &str) -> Result<FinanceRequest, SubmitError> {
        if self.is_sending() || self.is_uploading() {
            return Err(SubmitError::Busy);
        }
        let text = input.trim();
        if text.is_empty() && self.ready_file().is_none() {
            self.notice = Some(Notice::error("Input required", SubmitError::Empty.to_string()));
            return Err(SubmitError::Empty);
        }

        let file = match std::mem::replace(&mut self.upload, UploadState::Idle) {
            UploadState::Ready(file) => Some(file),
            _ => None,
        };

        let mut history: Vec<WireMessage> = self
            .messages
            .iter()
            .filter(|m| !m.pending)
            .map(|m| WireMessage { role: m.role.as_str().to_string(), content: m.content.clone() })
            .collect();
        history.push(WireMessage { role: "user".to_string(), content: text.to_string() });

        let thinking = match &file {
            Some(f) => format!("Analyzing {}...", f.file_name),
            None => "Thinking...".to_string(),
        };

        let user = UiMessage {
            id: self.next_message_id(),
            role: Role::User,
            content: text.to_string(),
            pending: false,
            has_tool_use: false,
            file: file.as_ref().map(|f| FileBadge {
                file_name: f.file_name.clone(),
                media_type: f.media_type.clone(),
                is_text: f.is_text,
            }),
            chart: None,
        };
        let placeholder = UiMessage {
            id: self.next_message_id(),
            role: Role::Assistant,
            content: thinking,
            pending: true,
            has_tool_use: false,
            file: None,
            chart: None,
        };
        self.messages.push(user);
        self.messages.push(placeholder);
        self.request = RequestState::Sending;

        Ok(FinanceRequest { messages: history, file_data: file, model: model.to_string() })
    }

    /// Replaces the pending placeholder with the backend reply.
    pub fn complete(&mut self, response: FinanceResponse) {
        let content = if !response.content.is_empty() {
            response.content
        } else if response.has_tool_use {
            CHART_FALLBACK.to_string()
        } else {
            EMPTY_FALLBACK.to_string()
        };
        let has_chart = response.chart_data.is_some();

        self.settle(UiMessage {
            id: String::new(),
            role: Role::Assistant,
            content,
            pending: false,
            has_tool_use: response.has_tool_use,
            file: None,
            chart: response.chart_data,
        });
        self.request = RequestState::Done;

        if has_chart {
            self.chart_index = self.charts().len().saturating_sub(1);
        }
    }

    /// Replaces the pending placeholder with an apology; the log is kept so
    /// the user can resubmit.
    pub fn fail(&mut self, reason: String) {
        self.settle(UiMessage {
            id: String::new(),
            role: Role::Assistant,
            content: format!("Sorry, I encountered an error: {reason}"),
            pending: false,
            has_tool_use: false,
            file: None,
            chart: None,
        });
        self.notice = Some(Notice::error("Request Failed", reason.clone()));
        self.request = RequestState::Failed(reason);
    }

    fn settle(&mut self, mut reply: UiMessage) {
        match self.messages.iter_mut().find(|m| m.pending) {
            Some(slot) => {
                reply.id = std::mem::take(&mut slot.id);
                *slot = reply;
            }
            None => {
                reply.id = self.next_message_id();
                self.messages.push(reply);
            }
        }
    }

    // ── Charts ───────────────────────────────────────────────────────────────

    pub fn charts(&self) -> Vec<&ChartData> {
        self.messages.iter().filter_map(|m| m.chart.as_ref()).collect()
    }

    pub fn select_chart(&mut self, index: usize) {
        let count = self.charts().len();
        if count > 0 {
            self.chart_index = index.min(count - 1);
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn next_message_id(&mut self) -> String {
        self.next_id += 1;
        format!("msg-{}", self.next_id)
    }
}

impl Notice {
    pub fn info(title: &str, body: impl Into<String>) -> Self {
        Self { title: title.to_string(), body: body.into(), is_error: false }
    }

    pub fn error(title: &str, body: impl Into<String>) -> Self {
        Self { title: title.to_string(), body: body.into(), is_error: true }
    }
}
