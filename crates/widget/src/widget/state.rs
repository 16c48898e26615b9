use companion_client::{ChatError, ChatRequest, ChatResponse, StudentProfile};

use crate::widget::message::{Message, MessageId};

/// Chips shown under the log never exceed this many entries.
pub const MAX_VISIBLE_SUGGESTIONS: usize = 3;
/// Characters of the session identifier shown in the footer.
pub const SESSION_PREFIX_CHARS: usize = 8;

/// Canned prompt offered on the empty-log welcome panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickStart {
    pub label: &'static str,
    pub prompt: &'static str,
}

pub const QUICK_STARTS: [QuickStart; 4] = [
    QuickStart {
        label: "Mock Interviews",
        prompt: "I want to prepare for mock interviews",
    },
    QuickStart {
        label: "Resume Review",
        prompt: "Can you review my resume?",
    },
    QuickStart {
        label: "Skill Guidance",
        prompt: "What skills should I focus on?",
    },
    QuickStart {
        label: "Career Planning",
        prompt: "I'm confused about my career path",
    },
];

/// User-facing text appended when a request fails for any reason.
pub fn connection_apology(port: u16) -> String {
    format!(
        "Sorry, I'm having trouble connecting. Please check if the server is running on port {port}."
    )
}

/// Identifies the single request allowed in flight.
///
/// A completion is applied only when it presents the token that is still live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(pub u64);

/// Request accepted by [`WidgetState::begin_send`], ready to hand to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSend {
    pub token: RequestToken,
    pub request: ChatRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    EmptyInput,
    AlreadyInFlight { active: RequestToken },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionRejection {
    NoActiveRequest,
    TokenMismatch {
        active: RequestToken,
        attempted: RequestToken,
    },
}

/// Result of the one-shot reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Unknown,
    Online,
    Offline,
}

/// Everything the widget knows, independent of any window.
///
/// Views render from this and feed user events back into it; the only
/// asynchronous step (the HTTP exchange) happens between
/// [`WidgetState::begin_send`] and [`WidgetState::complete`].
#[derive(Debug, Clone)]
pub struct WidgetState {
    profile: StudentProfile,
    is_open: bool,
    messages: Vec<Message>,
    input: String,
    in_flight: Option<RequestToken>,
    session_id: Option<String>,
    domain: Option<String>,
    suggested_actions: Vec<String>,
    backend_status: BackendStatus,
    apology: String,
    next_message_id: u64,
    next_request_token: u64,
}

impl WidgetState {
    /// Creates a closed, empty widget. `backend_port` only shapes the apology text.
    pub fn new(profile: StudentProfile, backend_port: u16) -> Self {
        Self {
            profile,
            is_open: false,
            messages: Vec::new(),
            input: String::new(),
            in_flight: None,
            session_id: None,
            domain: None,
            suggested_actions: Vec::new(),
            backend_status: BackendStatus::Unknown,
            apology: connection_apology(backend_port),
            next_message_id: 1,
            next_request_token: 1,
        }
    }

    pub fn profile(&self) -> &StudentProfile {
        &self.profile
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    /// Hides the panel. Log, session and suggestions are kept for reopening.
    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<RequestToken> {
        self.in_flight
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn suggested_actions(&self) -> &[String] {
        &self.suggested_actions
    }

    pub fn backend_status(&self) -> BackendStatus {
        self.backend_status
    }

    pub fn set_backend_status(&mut self, status: BackendStatus) {
        self.backend_status = status;
    }

    pub fn apology(&self) -> &str {
        &self.apology
    }

    /// Starts one send cycle for `text`.
    ///
    /// On acceptance the user message is echoed into the log, the input is
    /// cleared and the widget enters the loading state. Blank text and sends
    /// while another request is live are rejected without touching state.
    pub fn begin_send(&mut self, text: impl Into<String>) -> Result<PendingSend, SendRejection> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SendRejection::EmptyInput);
        }

        if let Some(active) = self.in_flight {
            return Err(SendRejection::AlreadyInFlight { active });
        }

        let id = self.alloc_message_id();
        self.messages.push(Message::user(id, text.clone()));
        self.input.clear();

        let token = RequestToken(self.next_request_token);
        self.next_request_token = self.next_request_token.saturating_add(1);
        self.in_flight = Some(token);

        let request = ChatRequest::new(
            text,
            self.session_id.clone(),
            self.profile.to_user_context(),
        );

        Ok(PendingSend { token, request })
    }

    /// Sends whatever is currently typed.
    pub fn submit_input(&mut self) -> Result<PendingSend, SendRejection> {
        let text = self.input.clone();
        self.begin_send(text)
    }

    /// Sends a suggestion chip or quick-start prompt verbatim.
    pub fn select_suggested_action(
        &mut self,
        action: impl Into<String>,
    ) -> Result<PendingSend, SendRejection> {
        self.begin_send(action)
    }

    /// Folds the outcome of the live request back into state.
    ///
    /// Loading ends on both paths. A failure appends the apology and leaves
    /// session, domain and suggestions untouched.
    pub fn complete(
        &mut self,
        token: RequestToken,
        outcome: Result<ChatResponse, ChatError>,
    ) -> Result<(), CompletionRejection> {
        match self.in_flight {
            None => return Err(CompletionRejection::NoActiveRequest),
            Some(active) if active != token => {
                return Err(CompletionRejection::TokenMismatch {
                    active,
                    attempted: token,
                });
            }
            Some(_) => {}
        }

        match outcome {
            Ok(reply) => self.apply_reply(reply),
            Err(_) => {
                let id = self.alloc_message_id();
                self.messages.push(Message::bot(id, self.apology.clone(), None));
            }
        }

        self.in_flight = None;
        Ok(())
    }

    fn apply_reply(&mut self, reply: ChatResponse) {
        if self.session_id.is_none() {
            self.session_id = Some(reply.session_id);
        }
        self.domain = reply.domain;
        self.suggested_actions = reply.suggested_actions;

        let id = self.alloc_message_id();
        self.messages.push(Message::bot(id, reply.response, reply.sources));
    }

    /// Header badge text, e.g. `resume_review` becomes `RESUME REVIEW`.
    pub fn domain_badge(&self) -> Option<String> {
        self.domain
            .as_deref()
            .filter(|domain| !domain.trim().is_empty())
            .map(|domain| domain.replace('_', " ").to_uppercase())
    }

    pub fn profile_summary(&self) -> String {
        format!(
            "{} • {} • CGPA {}",
            self.profile.name, self.profile.department, self.profile.cgpa
        )
    }

    pub fn welcome_title(&self) -> String {
        format!("Welcome, {}!", self.profile.name)
    }

    pub fn shows_welcome(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn quick_starts(&self) -> &'static [QuickStart] {
        &QUICK_STARTS
    }

    pub fn shows_typing_indicator(&self) -> bool {
        self.is_loading()
    }

    /// Chips to render: none while loading, otherwise the first few suggestions.
    pub fn visible_suggestions(&self) -> &[String] {
        if self.is_loading() {
            return &[];
        }

        let end = self.suggested_actions.len().min(MAX_VISIBLE_SUGGESTIONS);
        &self.suggested_actions[..end]
    }

    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.input.trim().is_empty()
    }

    pub fn footer_label(&self) -> String {
        match self.session_id.as_deref() {
            Some(session_id) => format!(
                "Session: {}",
                session_id
                    .chars()
                    .take(SESSION_PREFIX_CHARS)
                    .collect::<String>()
            ),
            None => "Session: Starting...".to_string(),
        }
    }

    fn alloc_message_id(&mut self) -> MessageId {
        let id = MessageId::new(self.next_message_id);
        self.next_message_id = self.next_message_id.saturating_add(1);
        id
    }
}
