//! The view surface the controller writes to, and the terminal page that
//! implements it.

use ratatui::layout::Rect;

use crate::editor::{EditorBuffer, EditorOptions, LineInput, TextEditor};
use crate::markup::MarkupNode;
use crate::state::{AiAction, ChatEntry, Confirmation, Direction, Theme};

/// Typed accessors for every control the controller reads or updates.
pub trait View {
    fn editor_text(&self) -> String;
    fn set_editor_text(&mut self, text: &str);
    fn runtime_inputs(&self) -> String;
    fn prompt_text(&self) -> String;
    fn clear_prompt(&mut self);

    fn show_output(&mut self, text: &str, is_error: bool);
    fn clear_output(&mut self);
    fn show_ai_output(&mut self, nodes: Vec<MarkupNode>, is_error: bool);
    fn clear_ai_output(&mut self);
    fn append_chat(&mut self, entry: ChatEntry);
    fn clear_chat(&mut self);

    fn set_status_text(&mut self, text: &str);
    fn set_loading(&mut self, visible: bool);
    fn apply_theme(&mut self, theme: Theme);
    fn apply_direction(&mut self, direction: Direction);
    fn mark_action(&mut self, action: Option<AiAction>);
    fn show_confirmation(&mut self, confirmation: Option<Confirmation>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Editor,
    Inputs,
    Prompt,
    Output,
    AiOutput,
}

impl FocusPane {
    const ORDER: [FocusPane; 5] = [
        FocusPane::Editor,
        FocusPane::Inputs,
        FocusPane::Output,
        FocusPane::Prompt,
        FocusPane::AiOutput,
    ];

    pub fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|p| *p == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|p| *p == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutputPane {
    pub text: String,
    pub is_error: bool,
    pub scroll: u16,
    /// Jump to the last line on next render
    pub follow: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AiPane {
    pub nodes: Vec<MarkupNode>,
    pub is_error: bool,
    pub scroll: u16,
    pub follow: bool,
}

/// Narrowest widths the two columns may be resized to.
pub const MIN_EDITOR_COLS: u16 = 40;
pub const MIN_AI_COLS: u16 = 30;
pub const SPLIT_STEP: u16 = 5;

/// Everything the terminal draws, as plain data.
pub struct Page {
    pub editor: EditorBuffer,
    pub inputs: EditorBuffer,
    pub prompt: LineInput,
    pub output: OutputPane,
    pub ai_output: AiPane,
    pub chat: Vec<ChatEntry>,
    pub chat_scroll: u16,
    pub status: String,
    pub loading: bool,
    pub theme: Theme,
    pub direction: Direction,
    pub marked_action: Option<AiAction>,
    pub confirmation: Option<Confirmation>,
    pub focus: FocusPane,

    /// Share of the body width given to the editor column
    pub split_percent: u16,
    pub body_width: u16,

    // Pane areas for mouse hit-testing (updated during render)
    pub editor_area: Option<Rect>,
    pub output_area: Option<Rect>,
    pub ai_area: Option<Rect>,
    pub chat_area: Option<Rect>,
}

impl Page {
    pub fn new(options: EditorOptions, split_percent: u16) -> Self {
        let theme = options.theme;
        Self {
            editor: EditorBuffer::new(options),
            inputs: EditorBuffer::plain(),
            prompt: LineInput::default(),
            output: OutputPane::default(),
            ai_output: AiPane::default(),
            chat: Vec::new(),
            chat_scroll: 0,
            status: String::new(),
            loading: false,
            theme,
            direction: Direction::Ltr,
            marked_action: None,
            confirmation: None,
            focus: FocusPane::Editor,
            split_percent: split_percent.clamp(10, 90),
            body_width: 0,
            editor_area: None,
            output_area: None,
            ai_area: None,
            chat_area: None,
        }
    }

    /// Moves the divider by `delta` percent unless a column would get too narrow.
    pub fn resize_split(&mut self, delta: i16) -> bool {
        let proposed = (self.split_percent as i16 + delta).clamp(0, 100) as u16;
        if proposed == self.split_percent {
            return false;
        }
        let width = self.body_width as u32;
        let editor_cols = (width * proposed as u32 / 100) as u16;
        let ai_cols = self.body_width.saturating_sub(editor_cols);
        if width > 0 && (editor_cols < MIN_EDITOR_COLS || ai_cols < MIN_AI_COLS) {
            return false;
        }
        self.split_percent = proposed;
        true
    }
}

impl View for Page {
    fn editor_text(&self) -> String {
        self.editor.value()
    }

    fn set_editor_text(&mut self, text: &str) {
        self.editor.set_value(text);
    }

    fn runtime_inputs(&self) -> String {
        self.inputs.value()
    }

    fn prompt_text(&self) -> String {
        self.prompt.text().to_string()
    }

    fn clear_prompt(&mut self) {
        self.prompt.clear();
    }

    fn show_output(&mut self, text: &str, is_error: bool) {
        self.output = OutputPane {
            text: text.to_string(),
            is_error,
            scroll: 0,
            follow: true,
        };
    }

    fn clear_output(&mut self) {
        self.output = OutputPane::default();
    }

    fn show_ai_output(&mut self, nodes: Vec<MarkupNode>, is_error: bool) {
        self.ai_output = AiPane {
            nodes,
            is_error,
            scroll: 0,
            follow: true,
        };
    }

    fn clear_ai_output(&mut self) {
        self.ai_output = AiPane::default();
    }

    fn append_chat(&mut self, entry: ChatEntry) {
        self.chat.push(entry);
        self.chat_scroll = u16::MAX;
    }

    fn clear_chat(&mut self) {
        self.chat.clear();
        self.chat_scroll = 0;
    }

    fn set_status_text(&mut self, text: &str) {
        self.status = text.to_string();
    }

    fn set_loading(&mut self, visible: bool) {
        self.loading = visible;
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.editor.set_theme(theme.editor_scheme());
    }

    fn apply_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    fn mark_action(&mut self, action: Option<AiAction>) {
        self.marked_action = action;
    }

    fn show_confirmation(&mut self, confirmation: Option<Confirmation>) {
        self.confirmation = confirmation;
    }
}
