use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use crate::app::App;
use crate::state::{AiAction, Direction};
use crate::tui::AppEvent;
use crate::view::{FocusPane, SPLIT_STEP};

pub fn handle_event(app: &mut App, event: AppEvent, tx: &UnboundedSender<AppEvent>) -> Result<()> {
    let now = Instant::now();
    match event {
        AppEvent::Key(key) => handle_key(app, key, now, tx),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(now),
        AppEvent::Completed(completion) => app.studio.complete(completion, now),
    }
    Ok(())
}

fn is_ctrl(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
}

fn handle_key(app: &mut App, key: KeyEvent, now: Instant, tx: &UnboundedSender<AppEvent>) {
    // Global keys that work in any mode
    if is_ctrl(&key) && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        app.should_quit = true;
        return;
    }

    // A pending confirmation takes every other key
    if app.studio.pending_confirmation().is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.studio.resolve_confirmation(true, now)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.studio.resolve_confirmation(false, now)
            }
            _ => {}
        }
        return;
    }

    if handle_shortcut(app, key, now, tx) {
        return;
    }

    match app.studio.view.focus {
        FocusPane::Editor => handle_editor_key(app, key),
        FocusPane::Inputs => handle_inputs_key(app, key),
        FocusPane::Prompt => handle_prompt_key(app, key, now, tx),
        FocusPane::Output | FocusPane::AiOutput => handle_pane_key(app, key),
    }
}

/// Shortcuts shared by every pane. Returns true when the key was consumed.
fn handle_shortcut(app: &mut App, key: KeyEvent, now: Instant, tx: &UnboundedSender<AppEvent>) -> bool {
    let ctrl = is_ctrl(&key);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        // Run code
        KeyCode::Enter if ctrl => submit_run(app, now, tx),
        KeyCode::Char('r') if ctrl => submit_run(app, now, tx),
        KeyCode::F(5) => submit_run(app, now, tx),

        // Send prompt
        KeyCode::Char('s') if ctrl => submit_prompt(app, now, tx),

        // Clearing
        KeyCode::Char('k') | KeyCode::Char('K') if ctrl => app.studio.clear_code(),
        KeyCode::Char('l') | KeyCode::Char('L') if ctrl => app.studio.clear_output(now),
        KeyCode::Char('e') if ctrl => app.studio.clear_ai_output(now),

        // Toggles
        KeyCode::Char('t') if ctrl => app.studio.toggle_theme(now),
        KeyCode::Char('d') if ctrl => app.studio.toggle_direction(now),

        // AI action selection
        KeyCode::Char(c @ '1'..='4') if alt => {
            let idx = c as usize - '1' as usize;
            app.studio.select_ai_action(AiAction::all()[idx], now);
        }

        // Divider, moved in screen direction
        KeyCode::Left | KeyCode::Right if ctrl => {
            let towards_right = key.code == KeyCode::Right;
            let editor_on_left = app.studio.state.text_direction == Direction::Ltr;
            let delta = SPLIT_STEP as i16;
            let delta = if towards_right == editor_on_left { delta } else { -delta };
            app.studio.view.resize_split(delta);
        }

        // Focus
        KeyCode::BackTab => {
            app.studio.view.focus = app.studio.view.focus.prev();
        }
        KeyCode::F(6) => {
            app.studio.view.focus = app.studio.view.focus.next();
        }
        KeyCode::Tab if app.studio.view.focus != FocusPane::Editor => {
            app.studio.view.focus = app.studio.view.focus.next();
        }

        _ => return false,
    }
    true
}

fn submit_run(app: &mut App, now: Instant, tx: &UnboundedSender<AppEvent>) {
    if let Some(request) = app.studio.begin_run(now) {
        app.spawn_request(request, tx.clone());
    }
}

fn submit_prompt(app: &mut App, now: Instant, tx: &UnboundedSender<AppEvent>) {
    if let Some(request) = app.studio.begin_ai_prompt(now) {
        app.spawn_request(request, tx.clone());
    }
}

fn handle_editor_key(app: &mut App, key: KeyEvent) {
    let editor = &mut app.studio.view.editor;
    match key.code {
        KeyCode::Char(c) if !is_ctrl(&key) => editor.insert_char(c),
        KeyCode::Enter => editor.insert_newline(),
        KeyCode::Tab => editor.insert_tab(),
        KeyCode::Backspace => editor.backspace(),
        KeyCode::Delete => editor.delete(),
        KeyCode::Left => editor.move_left(),
        KeyCode::Right => editor.move_right(),
        KeyCode::Up => editor.move_up(),
        KeyCode::Down => editor.move_down(),
        KeyCode::Home => editor.home(),
        KeyCode::End => editor.end(),
        KeyCode::Esc => app.studio.view.focus = FocusPane::Inputs,
        _ => {}
    }
}

fn handle_inputs_key(app: &mut App, key: KeyEvent) {
    let inputs = &mut app.studio.view.inputs;
    match key.code {
        KeyCode::Char(c) if !is_ctrl(&key) => inputs.insert_char(c),
        KeyCode::Enter => inputs.insert_newline(),
        KeyCode::Backspace => inputs.backspace(),
        KeyCode::Delete => inputs.delete(),
        KeyCode::Left => inputs.move_left(),
        KeyCode::Right => inputs.move_right(),
        KeyCode::Up => inputs.move_up(),
        KeyCode::Down => inputs.move_down(),
        KeyCode::Home => inputs.home(),
        KeyCode::End => inputs.end(),
        KeyCode::Esc => app.studio.view.focus = FocusPane::Editor,
        _ => {}
    }
}

fn handle_prompt_key(app: &mut App, key: KeyEvent, now: Instant, tx: &UnboundedSender<AppEvent>) {
    let prompt = &mut app.studio.view.prompt;
    match key.code {
        KeyCode::Enter => submit_prompt(app, now, tx),
        KeyCode::Char(c) if !is_ctrl(&key) => prompt.insert(c),
        KeyCode::Backspace => prompt.backspace(),
        KeyCode::Delete => prompt.delete(),
        KeyCode::Left => prompt.move_left(),
        KeyCode::Right => prompt.move_right(),
        KeyCode::Home => prompt.home(),
        KeyCode::End => prompt.end(),
        KeyCode::Esc => app.studio.view.focus = FocusPane::Editor,
        _ => {}
    }
}

fn handle_pane_key(app: &mut App, key: KeyEvent) {
    let page = &mut app.studio.view;
    let scroll = match page.focus {
        FocusPane::Output => &mut page.output.scroll,
        _ => &mut page.ai_output.scroll,
    };
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => *scroll = scroll.saturating_add(1),
        KeyCode::Char('k') | KeyCode::Up => *scroll = scroll.saturating_sub(1),
        KeyCode::PageDown => *scroll = scroll.saturating_add(10),
        KeyCode::PageUp => *scroll = scroll.saturating_sub(10),
        KeyCode::Char('g') | KeyCode::Home => *scroll = 0,
        KeyCode::Esc => page.focus = FocusPane::Editor,
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let page = &mut app.studio.view;

    let within = |area: Option<Rect>| area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    let scroll = if within(page.output_area) {
        &mut page.output.scroll
    } else if within(page.ai_area) {
        &mut page.ai_output.scroll
    } else if within(page.chat_area) {
        &mut page.chat_scroll
    } else if within(page.editor_area) {
        &mut page.editor.scroll
    } else {
        return;
    };

    match mouse.kind {
        MouseEventKind::ScrollDown => *scroll = scroll.saturating_add(3),
        MouseEventKind::ScrollUp => *scroll = scroll.saturating_sub(3),
        _ => {}
    }
}
