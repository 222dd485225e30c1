//! Session state shared by the controller and the terminal page.
//!
//! Nothing in here knows about ratatui or HTTP; the types are plain data so
//! the controller can be exercised against an in-memory view.

use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Color scheme applied to both the page chrome and the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Name of the editor color scheme for this theme.
    pub fn editor_scheme(&self) -> &'static str {
        match self {
            Theme::Dark => "vs-dark",
            Theme::Light => "vs",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Theme::Dark => "🌙",
            Theme::Light => "☀️",
        }
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(anyhow!("unknown theme: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Direction::Ltr => Direction::Rtl,
            Direction::Rtl => Direction::Ltr,
        }
    }

    /// Language attribute that goes with the direction.
    pub fn lang(&self) -> &'static str {
        match self {
            Direction::Ltr => "en",
            Direction::Rtl => "ar",
        }
    }
}

/// The fixed set of operations the AI endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiAction {
    CheckAndFix,
    ImproveCode,
    GenerateCode,
    ChatResponse,
}

impl AiAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiAction::CheckAndFix => "check_and_fix",
            AiAction::ImproveCode => "improve_code",
            AiAction::GenerateCode => "generate_code",
            AiAction::ChatResponse => "chat_response",
        }
    }

    pub fn all() -> [AiAction; 4] {
        [
            AiAction::CheckAndFix,
            AiAction::ImproveCode,
            AiAction::GenerateCode,
            AiAction::ChatResponse,
        ]
    }

    /// Actions that operate on the editor contents rather than on a prompt.
    pub fn transforms_code(&self) -> bool {
        matches!(self, AiAction::CheckAndFix | AiAction::ImproveCode)
    }
}

/// Who wrote a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

/// Display length limit for transcript entries, in characters.
pub const CHAT_DISPLAY_LIMIT: usize = 200;

/// One line of the chat transcript. Only the display text is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub sender: Sender,
    pub text: String,
}

impl ChatEntry {
    /// Builds an entry, truncating `text` past [`CHAT_DISPLAY_LIMIT`] characters.
    pub fn new(sender: Sender, text: &str) -> Self {
        let text = if text.chars().count() > CHAT_DISPLAY_LIMIT {
            let mut truncated: String = text.chars().take(CHAT_DISPLAY_LIMIT).collect();
            truncated.push_str("...");
            truncated
        } else {
            text.to_string()
        };
        Self { sender, text }
    }
}

/// The only mutable session state of the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUiState {
    pub active_theme: Theme,
    pub text_direction: Direction,
    pub selected_action: Option<AiAction>,
}

impl SessionUiState {
    /// Fresh session starting on `theme`.
    pub fn with_theme(theme: Theme) -> Self {
        Self {
            active_theme: theme,
            ..Self::default()
        }
    }
}

/// A yes/no question waiting for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    ClearCode,
    InsertCode(String),
}
