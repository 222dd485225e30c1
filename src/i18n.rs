//! English and Arabic labels, picked by text direction.

use crate::state::{AiAction, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Title,
    Editor,
    Inputs,
    Output,
    AiOutput,
    Chat,
    Prompt,
    You,
    Assistant,
    Ready,
    Processing,
    Confirm,
    Action(AiAction),
}

pub fn text(label: Label, dir: Direction) -> &'static str {
    let (en, ar) = match label {
        Label::Title => ("AI Code Studio", "استوديو الكود"),
        Label::Editor => ("Code Editor", "محرر الكود"),
        Label::Inputs => ("Runtime Inputs", "مدخلات التشغيل"),
        Label::Output => ("Output", "المخرجات"),
        Label::AiOutput => ("AI Output", "مخرجات الذكاء الاصطناعي"),
        Label::Chat => ("Chat", "المحادثة"),
        Label::Prompt => ("Prompt", "الطلب"),
        Label::You => ("You", "أنت"),
        Label::Assistant => ("AI Assistant", "المساعد الذكي"),
        Label::Ready => ("Ready", "جاهز"),
        Label::Processing => ("Processing", "جاري المعالجة"),
        Label::Confirm => ("Confirm", "تأكيد"),
        Label::Action(AiAction::CheckAndFix) => ("Check & Fix", "فحص وإصلاح"),
        Label::Action(AiAction::ImproveCode) => ("Improve Code", "تحسين الكود"),
        Label::Action(AiAction::GenerateCode) => ("Generate Code", "توليد كود"),
        Label::Action(AiAction::ChatResponse) => ("Chat", "محادثة"),
    };
    match dir {
        Direction::Ltr => en,
        Direction::Rtl => ar,
    }
}

/// Idle status text for the given direction.
pub fn idle_status(dir: Direction) -> &'static str {
    text(Label::Ready, dir)
}

// Validation messages are shown in Arabic whatever the direction.
pub const SELECT_ACTION_FIRST: &str = "الرجاء اختيار إجراء AI أولاً!";
pub const CODE_REQUIRED: &str = "الرجاء إدخال كود في المحرر قبل استخدام هذا الإجراء.";
pub const PROMPT_REQUIRED: &str = "الرجاء إدخال نص أو طلب صالح قبل الإرسال.";
pub const NO_CODE_TO_RUN: &str = "Error: No code to execute!";

/// Transcript text for a request sent without a prompt.
pub fn action_placeholder(action: AiAction) -> String {
    format!("طلب {}", action.as_str())
}
