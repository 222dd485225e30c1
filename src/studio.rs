//! Request orchestration: validates user intents, builds the single request
//! each one needs, and renders the outcome back onto the view.
//!
//! Submitting is split in two halves so the terminal keeps running while a
//! request is in flight: `begin_*` validates and returns a
//! [`PendingRequest`], [`execute`] performs it against a [`Backend`], and
//! [`Studio::complete`] renders the [`Completion`].

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::api::{AiReply, AiRequest, Backend, GatewayError, RunRequest};
use crate::i18n;
use crate::markup;
use crate::preferences::{PreferenceStore, THEME_KEY};
use crate::state::{AiAction, ChatEntry, Confirmation, Sender, SessionUiState, Theme};
use crate::view::View;

pub const STATUS_RESET_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingRequest {
    Run(RunRequest),
    Ai(AiRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Run(Result<String, GatewayError>),
    Ai {
        action: AiAction,
        result: Result<AiReply, GatewayError>,
    },
}

/// Sends one request and waits for its one response.
pub async fn execute(backend: &dyn Backend, request: PendingRequest) -> Completion {
    match request {
        PendingRequest::Run(req) => Completion::Run(backend.run_code(&req).await),
        PendingRequest::Ai(req) => {
            let action = req.action;
            Completion::Ai {
                action,
                result: backend.generate(&req).await,
            }
        }
    }
}

/// Status text with a single pending reversion to the idle label.
#[derive(Debug, Default)]
struct StatusTimer {
    revert_at: Option<Instant>,
}

pub struct Studio<V: View> {
    pub state: SessionUiState,
    pub view: V,
    prefs: Box<dyn PreferenceStore>,
    status: StatusTimer,
    confirmations: VecDeque<Confirmation>,
    in_flight: usize,
}

impl<V: View> Studio<V> {
    pub fn new(view: V, prefs: Box<dyn PreferenceStore>) -> Self {
        Self::with_state(view, prefs, SessionUiState::default())
    }

    /// Starts from `state` and brings the view in line with it.
    pub fn with_state(
        mut view: V,
        prefs: Box<dyn PreferenceStore>,
        state: SessionUiState,
    ) -> Self {
        view.apply_theme(state.active_theme);
        view.apply_direction(state.text_direction);
        view.set_status_text(i18n::idle_status(state.text_direction));
        Self {
            state,
            view,
            prefs,
            status: StatusTimer::default(),
            confirmations: VecDeque::new(),
            in_flight: 0,
        }
    }

    /// Requests issued and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn pending_confirmation(&self) -> Option<&Confirmation> {
        self.confirmations.front()
    }

    // Preference bridge

    /// Reconciles the theme with the stored preference, once at startup.
    /// The stored value wins over the configured starting theme.
    pub fn load_preference(&mut self, now: Instant) {
        let Some(stored) = self.prefs.get(THEME_KEY) else {
            return;
        };
        match stored.parse::<Theme>() {
            Ok(theme) if theme != self.state.active_theme => self.toggle_theme(now),
            Ok(_) => {}
            Err(e) => tracing::warn!("Ignoring stored theme preference: {}", e),
        }
    }

    fn save_preference(&mut self, theme: Theme) {
        if let Err(e) = self.prefs.set(THEME_KEY, theme.as_str()) {
            tracing::error!("Failed to save theme preference: {}", e);
        }
    }

    // Presentation

    /// Shows `message` now and schedules the idle label for three seconds later.
    /// A newer message replaces the pending reversion.
    pub fn set_status(&mut self, message: &str, now: Instant) {
        self.view.set_status_text(message);
        self.status.revert_at = Some(now + STATUS_RESET_DELAY);
    }

    /// Called on every tick; fires the status reversion when it is due.
    pub fn tick(&mut self, now: Instant) {
        if let Some(at) = self.status.revert_at {
            if now >= at {
                self.status.revert_at = None;
                self.view
                    .set_status_text(i18n::idle_status(self.state.text_direction));
            }
        }
    }

    pub fn render_run_output(&mut self, text: &str, is_error: bool) {
        self.view.show_output(text, is_error);
    }

    pub fn render_ai_output(&mut self, text: &str, is_error: bool) {
        self.view.show_ai_output(markup::parse(text), is_error);
    }

    pub fn append_chat_entry(&mut self, sender: Sender, text: &str) {
        self.view.append_chat(ChatEntry::new(sender, text));
    }

    pub fn show_loading(&mut self, visible: bool) {
        self.view.set_loading(visible);
    }

    pub fn toggle_theme(&mut self, now: Instant) {
        let theme = self.state.active_theme.toggled();
        self.state.active_theme = theme;
        self.view.apply_theme(theme);
        self.save_preference(theme);
        tracing::info!("Theme changed to {}", theme.as_str());
        self.set_status(&format!("Theme changed to {} mode", theme.as_str()), now);
    }

    pub fn toggle_direction(&mut self, now: Instant) {
        let direction = self.state.text_direction.toggled();
        self.state.text_direction = direction;
        self.view.apply_direction(direction);
        self.set_status(
            &format!("Direction changed to {}", direction.as_str().to_uppercase()),
            now,
        );
    }

    // Dispatcher

    pub fn select_ai_action(&mut self, action: AiAction, now: Instant) {
        self.state.selected_action = Some(action);
        self.view.mark_action(Some(action));
        self.set_status(&format!("AI Action selected: {}", action.as_str()), now);
    }

    /// Validates a run; returns the request to send, or `None` after
    /// rendering why nothing was sent.
    pub fn begin_run(&mut self, now: Instant) -> Option<PendingRequest> {
        let code = self.view.editor_text();
        let inputs: Vec<String> = self
            .view
            .runtime_inputs()
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();

        if code.trim().is_empty() {
            tracing::warn!("Run rejected: editor is empty");
            self.render_run_output(i18n::NO_CODE_TO_RUN, true);
            return None;
        }

        self.show_loading(true);
        self.set_status("Running Python code...", now);
        self.in_flight += 1;
        tracing::info!(inputs = inputs.len(), "Submitting run request");

        Some(PendingRequest::Run(RunRequest { code, inputs }))
    }

    /// Validates an AI prompt; the user's transcript entry is recorded before
    /// the request is returned.
    pub fn begin_ai_prompt(&mut self, now: Instant) -> Option<PendingRequest> {
        let prompt = self.view.prompt_text().trim().to_string();

        let Some(action) = self.state.selected_action else {
            tracing::warn!("AI prompt rejected: no action selected");
            self.render_ai_output(i18n::SELECT_ACTION_FIRST, true);
            return None;
        };

        let editor = self.view.editor_text();
        if action.transforms_code() {
            if editor.trim().is_empty() {
                tracing::warn!(action = action.as_str(), "AI prompt rejected: editor is empty");
                self.render_ai_output(i18n::CODE_REQUIRED, true);
                return None;
            }
        } else if prompt.is_empty() {
            tracing::warn!(action = action.as_str(), "AI prompt rejected: prompt is empty");
            self.render_ai_output(i18n::PROMPT_REQUIRED, true);
            return None;
        }

        self.show_loading(true);
        self.set_status("Processing AI request...", now);

        let transcript = if prompt.is_empty() {
            i18n::action_placeholder(action)
        } else {
            prompt.clone()
        };
        self.append_chat_entry(Sender::User, &transcript);

        let request = AiRequest {
            action,
            prompt: if prompt.is_empty() {
                editor.clone()
            } else {
                prompt
            },
            code: action.transforms_code().then_some(editor),
        };

        self.in_flight += 1;
        tracing::info!(action = action.as_str(), "Submitting AI request");

        Some(PendingRequest::Ai(request))
    }

    /// Renders the outcome of a request started by `begin_run`/`begin_ai_prompt`.
    pub fn complete(&mut self, completion: Completion, now: Instant) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match completion {
            Completion::Run(result) => self.finish_run(result),
            Completion::Ai { action, result } => self.finish_ai(action, result),
        }

        self.show_loading(false);
        self.set_status(i18n::idle_status(self.state.text_direction), now);
    }

    fn finish_run(&mut self, result: Result<String, GatewayError>) {
        match result {
            Ok(output) => self.render_run_output(&output, false),
            Err(GatewayError::Application(error)) => {
                tracing::warn!("Run failed: {}", error);
                self.render_run_output(&format!("Error:\n{}", error), true);
            }
            Err(e) => {
                tracing::error!("Error running code: {:?}", e);
                self.render_run_output(&format!("Error: {}", e), true);
            }
        }
    }

    fn finish_ai(&mut self, action: AiAction, result: Result<AiReply, GatewayError>) {
        match result {
            Ok(reply) => {
                self.render_ai_output(&reply.text, false);
                self.append_chat_entry(Sender::Ai, &reply.text);

                if action == AiAction::GenerateCode {
                    if let Some(code) = reply.code {
                        self.request_confirmation(Confirmation::InsertCode(code));
                    }
                }

                self.view.clear_prompt();
            }
            Err(e) => {
                match &e {
                    GatewayError::Application(_) => {
                        tracing::warn!(action = action.as_str(), "AI request failed: {}", e)
                    }
                    _ => tracing::error!(action = action.as_str(), "Error sending AI prompt: {:?}", e),
                }
                let message = format!("Error: {}", e);
                self.render_ai_output(&message, true);
                self.append_chat_entry(Sender::Ai, &message);
            }
        }
    }

    // Clearing and confirmations

    pub fn clear_code(&mut self) {
        self.request_confirmation(Confirmation::ClearCode);
    }

    pub fn clear_output(&mut self, now: Instant) {
        self.view.clear_output();
        self.set_status("Output cleared", now);
    }

    /// Empties the AI pane together with the transcript.
    pub fn clear_ai_output(&mut self, now: Instant) {
        self.view.clear_ai_output();
        self.view.clear_chat();
        self.set_status("AI output cleared", now);
    }

    fn request_confirmation(&mut self, confirmation: Confirmation) {
        self.confirmations.push_back(confirmation);
        self.view
            .show_confirmation(self.confirmations.front().cloned());
    }

    /// Answers the front confirmation.
    pub fn resolve_confirmation(&mut self, accepted: bool, now: Instant) {
        let Some(confirmation) = self.confirmations.pop_front() else {
            return;
        };

        if accepted {
            match confirmation {
                Confirmation::ClearCode => {
                    self.view.set_editor_text("");
                    self.set_status("Code cleared", now);
                }
                Confirmation::InsertCode(code) => {
                    self.view.set_editor_text(&code);
                    self.set_status("Generated code inserted", now);
                }
            }
        }

        self.view
            .show_confirmation(self.confirmations.front().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::MarkupNode;
    use crate::preferences::MemoryPreferenceStore;
    use crate::state::Direction;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeView {
        editor: String,
        inputs: String,
        prompt: String,
        output: Option<(String, bool)>,
        ai_output: Option<(Vec<MarkupNode>, bool)>,
        chat: Vec<ChatEntry>,
        status: String,
        loading: bool,
        theme: Option<Theme>,
        direction: Option<Direction>,
        marked: Option<AiAction>,
        confirmation: Option<Confirmation>,
    }

    impl FakeView {
        fn ai_text(&self) -> String {
            self.ai_output
                .as_ref()
                .map(|(nodes, _)| markup::to_plain(nodes))
                .unwrap_or_default()
        }

        fn ai_is_error(&self) -> bool {
            self.ai_output.as_ref().map(|(_, e)| *e).unwrap_or(false)
        }
    }

    impl View for FakeView {
        fn editor_text(&self) -> String {
            self.editor.clone()
        }
        fn set_editor_text(&mut self, text: &str) {
            self.editor = text.to_string();
        }
        fn runtime_inputs(&self) -> String {
            self.inputs.clone()
        }
        fn prompt_text(&self) -> String {
            self.prompt.clone()
        }
        fn clear_prompt(&mut self) {
            self.prompt.clear();
        }
        fn show_output(&mut self, text: &str, is_error: bool) {
            self.output = Some((text.to_string(), is_error));
        }
        fn clear_output(&mut self) {
            self.output = None;
        }
        fn show_ai_output(&mut self, nodes: Vec<MarkupNode>, is_error: bool) {
            self.ai_output = Some((nodes, is_error));
        }
        fn clear_ai_output(&mut self) {
            self.ai_output = None;
        }
        fn append_chat(&mut self, entry: ChatEntry) {
            self.chat.push(entry);
        }
        fn clear_chat(&mut self) {
            self.chat.clear();
        }
        fn set_status_text(&mut self, text: &str) {
            self.status = text.to_string();
        }
        fn set_loading(&mut self, visible: bool) {
            self.loading = visible;
        }
        fn apply_theme(&mut self, theme: Theme) {
            self.theme = Some(theme);
        }
        fn apply_direction(&mut self, direction: Direction) {
            self.direction = Some(direction);
        }
        fn mark_action(&mut self, action: Option<AiAction>) {
            self.marked = action;
        }
        fn show_confirmation(&mut self, confirmation: Option<Confirmation>) {
            self.confirmation = confirmation;
        }
    }

    /// Records every request and answers with canned results.
    #[derive(Default)]
    struct FakeBackend {
        runs: Mutex<Vec<RunRequest>>,
        prompts: Mutex<Vec<AiRequest>>,
        run_result: Option<Result<String, GatewayError>>,
        ai_result: Option<Result<AiReply, GatewayError>>,
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn run_code(&self, request: &RunRequest) -> Result<String, GatewayError> {
            self.runs.lock().unwrap().push(request.clone());
            self.run_result
                .clone()
                .unwrap_or_else(|| Ok(String::new()))
        }

        async fn generate(&self, request: &AiRequest) -> Result<AiReply, GatewayError> {
            self.prompts.lock().unwrap().push(request.clone());
            self.ai_result.clone().unwrap_or_else(|| {
                Ok(AiReply {
                    text: "ok".into(),
                    code: None,
                })
            })
        }
    }

    /// Preference store whose contents stay observable after being boxed.
    #[derive(Clone, Default)]
    struct SharedPrefs(Arc<Mutex<MemoryPreferenceStore>>);

    impl PreferenceStore for SharedPrefs {
        fn get(&self, key: &str) -> Option<String> {
            self.0.lock().unwrap().get(key)
        }
        fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().set(key, value)
        }
    }

    fn studio() -> Studio<FakeView> {
        Studio::new(FakeView::default(), Box::new(MemoryPreferenceStore::default()))
    }

    /// Runs a submit through the backend, the way the event loop does.
    async fn drive(
        studio: &mut Studio<FakeView>,
        backend: &FakeBackend,
        request: Option<PendingRequest>,
        now: Instant,
    ) {
        if let Some(request) = request {
            let completion = execute(backend, request).await;
            studio.complete(completion, now);
        }
    }

    #[tokio::test]
    async fn test_run_scenario_print_one() {
        let mut studio = studio();
        studio.view.editor = "print(1)".into();
        let backend = FakeBackend {
            run_result: Some(Ok("1\n".into())),
            ..Default::default()
        };
        let now = Instant::now();

        let request = studio.begin_run(now);
        assert!(studio.view.loading);
        assert_eq!(studio.in_flight(), 1);
        drive(&mut studio, &backend, request, now).await;

        let runs = backend.runs.lock().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(
            runs[0],
            RunRequest {
                code: "print(1)".into(),
                inputs: vec![]
            }
        );
        assert_eq!(studio.view.output, Some(("1\n".into(), false)));
        assert!(!studio.view.loading);
        assert_eq!(studio.in_flight(), 0);
    }

    #[test]
    fn test_run_inputs_drop_blank_lines_in_order() {
        let mut studio = studio();
        studio.view.editor = "x = input()".into();
        studio.view.inputs = "alpha\n\n   \n beta \ngamma\n".into();

        let request = studio.begin_run(Instant::now());
        match request {
            Some(PendingRequest::Run(req)) => {
                assert_eq!(req.inputs, vec!["alpha", " beta ", "gamma"]);
            }
            other => panic!("expected run request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_with_blank_editor_sends_nothing() {
        for code in ["", "   \n\t"] {
            let mut studio = studio();
            studio.view.editor = code.into();
            let backend = FakeBackend::default();

            let request = studio.begin_run(Instant::now());
            assert!(request.is_none());
            drive(&mut studio, &backend, request, Instant::now()).await;

            assert!(backend.runs.lock().unwrap().is_empty());
            assert_eq!(
                studio.view.output,
                Some(("Error: No code to execute!".into(), true))
            );
            assert!(!studio.view.loading);
        }
    }

    #[tokio::test]
    async fn test_run_error_rendering() {
        let cases = [
            (
                GatewayError::Application("Traceback".into()),
                "Error:\nTraceback",
            ),
            (
                GatewayError::Http {
                    status: 400,
                    message: "SyntaxError".into(),
                },
                "Error: SyntaxError",
            ),
            (
                GatewayError::Transport("connection refused".into()),
                "Error: connection refused",
            ),
        ];

        for (error, expected) in cases {
            let mut studio = studio();
            studio.view.editor = "boom".into();
            let backend = FakeBackend {
                run_result: Some(Err(error)),
                ..Default::default()
            };
            let request = studio.begin_run(Instant::now());
            drive(&mut studio, &backend, request, Instant::now()).await;
            assert_eq!(studio.view.output, Some((expected.to_string(), true)));
        }
    }

    #[tokio::test]
    async fn test_prompt_without_action_sends_nothing() {
        let mut studio = studio();
        studio.view.prompt = "hello".into();
        let backend = FakeBackend::default();

        let request = studio.begin_ai_prompt(Instant::now());
        drive(&mut studio, &backend, request, Instant::now()).await;

        assert!(backend.prompts.lock().unwrap().is_empty());
        assert_eq!(studio.view.ai_text(), "الرجاء اختيار إجراء AI أولاً!");
        assert!(studio.view.ai_is_error());
        assert!(studio.view.chat.is_empty());
    }

    #[test]
    fn test_check_and_fix_requires_code() {
        let mut studio = studio();
        let now = Instant::now();
        studio.select_ai_action(AiAction::CheckAndFix, now);
        studio.view.editor = "  \n".into();
        studio.view.prompt = "fix please".into();

        assert!(studio.begin_ai_prompt(now).is_none());
        assert_eq!(
            studio.view.ai_text(),
            "الرجاء إدخال كود في المحرر قبل استخدام هذا الإجراء."
        );
        assert!(studio.view.chat.is_empty());
    }

    #[tokio::test]
    async fn test_check_and_fix_payload_defaults_prompt_to_code() {
        let mut studio = studio();
        let now = Instant::now();
        studio.select_ai_action(AiAction::CheckAndFix, now);
        studio.view.editor = "prnt(1)".into();
        let backend = FakeBackend::default();

        let request = studio.begin_ai_prompt(now);
        assert_eq!(studio.view.chat.len(), 1);
        assert_eq!(studio.view.chat[0].text, "طلب check_and_fix");
        drive(&mut studio, &backend, request, now).await;

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(
            prompts[..],
            [AiRequest {
                action: AiAction::CheckAndFix,
                prompt: "prnt(1)".into(),
                code: Some("prnt(1)".into()),
            }]
        );
    }

    #[test]
    fn test_chat_response_omits_code() {
        let mut studio = studio();
        let now = Instant::now();
        studio.select_ai_action(AiAction::ChatResponse, now);
        studio.view.editor = "x = 1".into();
        studio.view.prompt = "  what is a list?  ".into();

        match studio.begin_ai_prompt(now) {
            Some(PendingRequest::Ai(req)) => {
                assert_eq!(req.prompt, "what is a list?");
                assert_eq!(req.code, None);
            }
            other => panic!("expected AI request, got {:?}", other),
        }
        assert_eq!(studio.view.chat[0].text, "what is a list?");
    }

    #[test]
    fn test_generate_code_requires_prompt() {
        let mut studio = studio();
        let now = Instant::now();
        studio.select_ai_action(AiAction::GenerateCode, now);
        studio.view.editor = "x = 1".into();

        assert!(studio.begin_ai_prompt(now).is_none());
        assert_eq!(studio.view.ai_text(), "الرجاء إدخال نص أو طلب صالح قبل الإرسال.");
        assert!(studio.view.ai_is_error());
    }

    #[tokio::test]
    async fn test_generated_code_offers_insert() {
        let mut studio = studio();
        let now = Instant::now();
        studio.select_ai_action(AiAction::GenerateCode, now);
        studio.view.editor = "old".into();
        studio.view.prompt = "fizzbuzz".into();
        let backend = FakeBackend {
            ai_result: Some(Ok(AiReply {
                text: "for i in range(3): pass".into(),
                code: Some("for i in range(3): pass".into()),
            })),
            ..Default::default()
        };

        let request = studio.begin_ai_prompt(now);
        drive(&mut studio, &backend, request, now).await;

        assert_eq!(
            studio.view.confirmation,
            Some(Confirmation::InsertCode("for i in range(3): pass".into()))
        );
        assert_eq!(studio.view.editor, "old");
        assert!(studio.view.prompt.is_empty());
        assert_eq!(studio.view.chat.len(), 2);
        assert_eq!(studio.view.chat[1].sender, Sender::Ai);

        studio.resolve_confirmation(true, now);
        assert_eq!(studio.view.editor, "for i in range(3): pass");
        assert_eq!(studio.view.confirmation, None);
    }

    #[tokio::test]
    async fn test_code_from_other_actions_is_not_offered() {
        let mut studio = studio();
        let now = Instant::now();
        studio.select_ai_action(AiAction::ImproveCode, now);
        studio.view.editor = "x=1".into();
        let backend = FakeBackend {
            ai_result: Some(Ok(AiReply {
                text: "x = 1".into(),
                code: Some("x = 1".into()),
            })),
            ..Default::default()
        };

        let request = studio.begin_ai_prompt(now);
        drive(&mut studio, &backend, request, now).await;
        assert_eq!(studio.view.confirmation, None);
        assert_eq!(studio.view.ai_text(), "x = 1");
    }

    #[tokio::test]
    async fn test_ai_failure_is_recorded_in_transcript() {
        let mut studio = studio();
        let now = Instant::now();
        studio.select_ai_action(AiAction::ChatResponse, now);
        studio.view.prompt = "hi".into();
        let backend = FakeBackend {
            ai_result: Some(Err(GatewayError::Transport("dns error".into()))),
            ..Default::default()
        };

        let request = studio.begin_ai_prompt(now);
        drive(&mut studio, &backend, request, now).await;

        assert_eq!(studio.view.ai_text(), "Error: dns error");
        assert!(studio.view.ai_is_error());
        let texts: Vec<_> = studio.view.chat.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["hi", "Error: dns error"]);
        // Prompt is kept so the user can retry
        assert_eq!(studio.view.prompt, "hi");
    }

    #[test]
    fn test_long_reply_truncated_in_transcript_only() {
        let mut studio = studio();
        let now = Instant::now();
        studio.state.selected_action = Some(AiAction::ChatResponse);
        studio.view.prompt = "q".into();
        let long = "z".repeat(250);

        studio.begin_ai_prompt(now);
        studio.complete(
            Completion::Ai {
                action: AiAction::ChatResponse,
                result: Ok(AiReply {
                    text: long.clone(),
                    code: None,
                }),
            },
            now,
        );

        assert_eq!(studio.view.ai_text(), long);
        assert_eq!(studio.view.chat[1].text, format!("{}...", "z".repeat(200)));
    }

    #[test]
    fn test_status_reverts_after_delay() {
        let mut studio = studio();
        let start = Instant::now();
        studio.set_status("Output cleared", start);

        studio.tick(start + Duration::from_secs(2));
        assert_eq!(studio.view.status, "Output cleared");

        studio.tick(start + STATUS_RESET_DELAY);
        assert_eq!(studio.view.status, "Ready");
    }

    #[test]
    fn test_newer_status_cancels_older_reversion() {
        let mut studio = studio();
        let start = Instant::now();
        studio.set_status("first", start);
        studio.set_status("second", start + Duration::from_secs(2));

        studio.tick(start + Duration::from_secs(3));
        assert_eq!(studio.view.status, "second");

        studio.tick(start + Duration::from_secs(5));
        assert_eq!(studio.view.status, "Ready");
    }

    #[test]
    fn test_idle_status_is_localized_in_rtl() {
        let mut studio = studio();
        let start = Instant::now();
        studio.toggle_direction(start);
        assert_eq!(studio.view.direction, Some(Direction::Rtl));
        assert_eq!(studio.view.status, "Direction changed to RTL");

        studio.tick(start + STATUS_RESET_DELAY);
        assert_eq!(studio.view.status, "جاهز");
    }

    #[test]
    fn test_theme_toggle_round_trip_persists() {
        let prefs = SharedPrefs::default();
        let mut studio = Studio::new(FakeView::default(), Box::new(prefs.clone()));
        let now = Instant::now();

        studio.toggle_theme(now);
        assert_eq!(studio.state.active_theme, Theme::Light);
        assert_eq!(prefs.get(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(studio.view.status, "Theme changed to light mode");

        studio.toggle_theme(now);
        assert_eq!(studio.state.active_theme, Theme::Dark);
        assert_eq!(studio.view.theme, Some(Theme::Dark));
        assert_eq!(prefs.get(THEME_KEY).as_deref(), Some("dark"));
    }

    #[test]
    fn test_load_preference_reconciles_stored_theme() {
        let mut prefs = SharedPrefs::default();
        prefs.set(THEME_KEY, "light").unwrap();
        let mut studio = Studio::new(FakeView::default(), Box::new(prefs.clone()));

        studio.load_preference(Instant::now());
        assert_eq!(studio.state.active_theme, Theme::Light);
        assert_eq!(studio.view.theme, Some(Theme::Light));
    }

    #[test]
    fn test_load_preference_keeps_default_when_equal_or_unknown() {
        for stored in ["dark", "purple"] {
            let mut prefs = SharedPrefs::default();
            prefs.set(THEME_KEY, stored).unwrap();
            let mut studio = Studio::new(FakeView::default(), Box::new(prefs.clone()));

            studio.load_preference(Instant::now());
            assert_eq!(studio.state.active_theme, Theme::Dark);
            assert_eq!(prefs.get(THEME_KEY).as_deref(), Some(stored));
        }
    }

    #[test]
    fn test_starting_theme_is_applied_to_view() {
        let studio = Studio::with_state(
            FakeView::default(),
            Box::new(MemoryPreferenceStore::default()),
            SessionUiState::with_theme(Theme::Light),
        );
        assert_eq!(studio.state.active_theme, Theme::Light);
        assert_eq!(studio.view.theme, Some(Theme::Light));
    }

    #[test]
    fn test_stored_theme_wins_over_starting_theme() {
        let mut prefs = SharedPrefs::default();
        prefs.set(THEME_KEY, "dark").unwrap();
        let mut studio = Studio::with_state(
            FakeView::default(),
            Box::new(prefs.clone()),
            SessionUiState::with_theme(Theme::Light),
        );

        studio.load_preference(Instant::now());
        assert_eq!(studio.state.active_theme, Theme::Dark);
        assert_eq!(studio.view.theme, Some(Theme::Dark));
        assert_eq!(prefs.get(THEME_KEY).as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_ai_application_error_rendered_and_logged_to_transcript() {
        let mut studio = studio();
        let now = Instant::now();
        studio.select_ai_action(AiAction::ImproveCode, now);
        studio.view.editor = "x=1".into();
        let backend = FakeBackend {
            ai_result: Some(Err(GatewayError::Application("API Key is missing".into()))),
            ..Default::default()
        };

        let request = studio.begin_ai_prompt(now);
        drive(&mut studio, &backend, request, now).await;

        assert_eq!(backend.prompts.lock().unwrap().len(), 1);
        assert_eq!(studio.view.ai_text(), "Error: API Key is missing");
        assert!(studio.view.ai_is_error());
        let last = studio.view.chat.last().unwrap();
        assert_eq!(last.sender, Sender::Ai);
        assert_eq!(last.text, "Error: API Key is missing");
        assert!(!studio.view.loading);
    }

    #[test]
    fn test_select_action_marks_control() {
        let mut studio = studio();
        studio.select_ai_action(AiAction::ImproveCode, Instant::now());
        assert_eq!(studio.state.selected_action, Some(AiAction::ImproveCode));
        assert_eq!(studio.view.marked, Some(AiAction::ImproveCode));
        assert_eq!(studio.view.status, "AI Action selected: improve_code");
    }

    #[test]
    fn test_clear_code_waits_for_confirmation() {
        let mut studio = studio();
        let now = Instant::now();
        studio.view.editor = "keep me".into();

        studio.clear_code();
        assert_eq!(studio.view.confirmation, Some(Confirmation::ClearCode));
        studio.resolve_confirmation(false, now);
        assert_eq!(studio.view.editor, "keep me");

        studio.clear_code();
        studio.resolve_confirmation(true, now);
        assert_eq!(studio.view.editor, "");
        assert_eq!(studio.view.status, "Code cleared");
    }

    #[test]
    fn test_confirmations_are_answered_in_order() {
        let mut studio = studio();
        let now = Instant::now();
        studio.view.editor = "a".into();
        studio.clear_code();
        studio.request_confirmation(Confirmation::InsertCode("b".into()));

        assert_eq!(studio.pending_confirmation(), Some(&Confirmation::ClearCode));
        studio.resolve_confirmation(true, now);
        assert_eq!(
            studio.view.confirmation,
            Some(Confirmation::InsertCode("b".into()))
        );
        studio.resolve_confirmation(true, now);
        assert_eq!(studio.view.editor, "b");
        assert!(studio.pending_confirmation().is_none());
    }

    #[test]
    fn test_clear_panes() {
        let mut studio = studio();
        let now = Instant::now();
        studio.render_run_output("out", false);
        studio.render_ai_output("ai", false);
        studio.append_chat_entry(Sender::User, "hello");

        studio.clear_output(now);
        assert_eq!(studio.view.output, None);
        assert_eq!(studio.view.status, "Output cleared");

        studio.clear_ai_output(now);
        assert!(studio.view.ai_output.is_none());
        assert!(studio.view.chat.is_empty());
        assert_eq!(studio.view.status, "AI output cleared");
    }

    #[test]
    fn test_overlapping_requests_share_loading_flag() {
        let mut studio = studio();
        let now = Instant::now();
        studio.view.editor = "print(1)".into();
        studio.select_ai_action(AiAction::ChatResponse, now);
        studio.view.prompt = "hi".into();

        let run = studio.begin_run(now);
        let ai = studio.begin_ai_prompt(now);
        assert!(run.is_some() && ai.is_some());
        assert_eq!(studio.in_flight(), 2);

        studio.complete(Completion::Run(Ok("1".into())), now);
        // First completion hides the overlay while the AI call is still out
        assert!(!studio.view.loading);
        assert_eq!(studio.in_flight(), 1);
    }
}
