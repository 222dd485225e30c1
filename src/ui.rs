use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::App;
use crate::editor::EditorBuffer;
use crate::i18n::{self, Label};
use crate::markup::{self, MarkupNode};
use crate::state::{AiAction, Confirmation, Direction, Sender, Theme};
use crate::view::{FocusPane, Page};

const MINIMAP_WIDTH: u16 = 10;

/// Colors for one theme.
struct Palette {
    bg: Color,
    fg: Color,
    muted: Color,
    accent: Color,
    focus: Color,
    error: Color,
    success: Color,
    code_bg: Color,
    bar_bg: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                bg: Color::Rgb(0x1e, 0x1e, 0x1e),
                fg: Color::Rgb(0xd4, 0xd4, 0xd4),
                muted: Color::DarkGray,
                accent: Color::Rgb(0x8b, 0x5c, 0xf6),
                focus: Color::Cyan,
                error: Color::Rgb(0xf4, 0x47, 0x47),
                success: Color::Rgb(0x4e, 0xc9, 0xb0),
                code_bg: Color::Rgb(0x2d, 0x2d, 0x30),
                bar_bg: Color::Rgb(0x63, 0x66, 0xf1),
            },
            Theme::Light => Self {
                bg: Color::Rgb(0xff, 0xff, 0xff),
                fg: Color::Rgb(0x1f, 0x1f, 0x1f),
                muted: Color::Gray,
                accent: Color::Rgb(0x63, 0x66, 0xf1),
                focus: Color::Blue,
                error: Color::Rgb(0xc5, 0x1f, 0x1f),
                success: Color::Rgb(0x16, 0x82, 0x3a),
                code_bg: Color::Rgb(0xee, 0xee, 0xf2),
                bar_bg: Color::Rgb(0x8b, 0x5c, 0xf6),
            },
        }
    }
}

fn label(page: &Page, l: Label) -> &'static str {
    i18n::text(l, page.direction)
}

fn text_alignment(page: &Page) -> Alignment {
    match page.direction {
        Direction::Ltr => Alignment::Left,
        Direction::Rtl => Alignment::Right,
    }
}

fn pane_block<'a>(page: &Page, title: String, focused: bool, palette: &Palette) -> Block<'a> {
    let border = if focused { palette.focus } else { palette.muted };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
        .title_alignment(text_alignment(page))
}

/// Number of terminal rows `lines` occupies when wrapped at `width`.
fn wrapped_height<'a>(lines: impl Iterator<Item = &'a str>, width: u16) -> u16 {
    let width = width.max(1) as usize;
    lines
        .map(|l| (l.chars().count().max(1)).div_ceil(width) as u16)
        .fold(0u16, |acc, n| acc.saturating_add(n))
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = Palette::for_theme(app.studio.view.theme);

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        area,
    );

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area, &palette);
    render_body(app, frame, body_area, &palette);
    render_footer(app, frame, footer_area, &palette);

    let page = &app.studio.view;
    if let Some(confirmation) = &page.confirmation {
        render_confirmation(page, confirmation, frame, area, &palette);
    } else if page.loading {
        render_loading(page, app.animation_frame, frame, area, &palette);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let page = &app.studio.view;
    let in_flight = app.studio.in_flight();
    let pending = if in_flight > 0 {
        format!(" [{} pending]", in_flight)
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", label(page, Label::Title)),
            Style::default().fg(Color::White).bold(),
        ),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::White),
        ),
        Span::raw(format!("{} ", page.theme.icon())),
        Span::styled(
            format!(
                "{} {} ",
                page.direction.as_str().to_uppercase(),
                page.direction.lang()
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(app.server_url.clone(), Style::default().fg(Color::White).italic()),
        Span::styled(pending, Style::default().fg(Color::Yellow).bold()),
    ]);

    let header = Paragraph::new(title)
        .alignment(text_alignment(page))
        .style(Style::default().bg(palette.bar_bg));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let page = &app.studio.view;

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(palette.fg);

    let mut spans = vec![
        Span::styled(format!(" {} ", page.status), Style::default().fg(palette.accent).bold()),
        Span::raw(" "),
    ];
    let hints = [
        ("F5", "run"),
        ("Alt+1-4", "action"),
        ("Ctrl+S", "send"),
        ("Ctrl+K", "clear code"),
        ("Ctrl+L", "clear output"),
        ("Ctrl+T", "theme"),
        ("Ctrl+D", "direction"),
        ("Ctrl+Q", "quit"),
    ];
    for (key, what) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", what), label_style));
    }

    let footer = Paragraph::new(Line::from(spans)).alignment(text_alignment(page));
    frame.render_widget(footer, area);
}

fn render_body(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let page = &mut app.studio.view;
    page.body_width = area.width;

    let split = page.split_percent;
    let [left, right] = Layout::horizontal([
        Constraint::Percentage(split),
        Constraint::Percentage(100 - split),
    ])
    .areas(area);

    // The editor column sits on the reading-start side
    let (editor_col, ai_col) = match page.direction {
        Direction::Ltr => (left, right),
        Direction::Rtl => {
            let [ai, editor] = Layout::horizontal([
                Constraint::Percentage(100 - split),
                Constraint::Percentage(split),
            ])
            .areas(area);
            (editor, ai)
        }
    };

    render_editor_column(page, frame, editor_col, palette);
    render_ai_column(page, frame, ai_col, palette);
}

fn render_editor_column(page: &mut Page, frame: &mut Frame, area: Rect, palette: &Palette) {
    let [editor_area, inputs_area, output_area] = Layout::vertical([
        Constraint::Min(6),
        Constraint::Length(5),
        Constraint::Percentage(30),
    ])
    .areas(area);

    page.editor_area = Some(editor_area);
    page.output_area = Some(output_area);

    let title = format!(
        " {} ({}, {}) ",
        label(page, Label::Editor),
        page.editor.options.language,
        page.editor.scheme()
    );
    let block = pane_block(page, title, page.focus == FocusPane::Editor, palette);
    let focused = page.focus == FocusPane::Editor;
    render_text_buffer(&mut page.editor, block, focused, frame, editor_area, palette);

    let block = pane_block(
        page,
        format!(" {} ", label(page, Label::Inputs)),
        page.focus == FocusPane::Inputs,
        palette,
    );
    let focused = page.focus == FocusPane::Inputs;
    render_text_buffer(&mut page.inputs, block, focused, frame, inputs_area, palette);

    render_output(page, frame, output_area, palette);
}

/// One visual row of a buffer.
struct VisualRow {
    /// Logical line number, set on the first row of each line
    line_no: Option<usize>,
    text: String,
}

fn visual_rows(buffer: &EditorBuffer, width: u16) -> (Vec<VisualRow>, (u16, u16)) {
    let width = width.max(1) as usize;
    let (cursor_row, cursor_col) = buffer.cursor();
    let mut rows = Vec::new();
    let mut cursor = (0u16, 0u16);

    for (i, line) in buffer.lines().iter().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        let chunks: Vec<String> = if buffer.options.word_wrap && chars.len() > width {
            chars.chunks(width).map(|c| c.iter().collect()).collect()
        } else {
            vec![line.clone()]
        };

        if i == cursor_row {
            let (offset, col) = if buffer.options.word_wrap {
                ((cursor_col / width).min(chunks.len().saturating_sub(1)), cursor_col % width)
            } else {
                (0, cursor_col)
            };
            // Cursor at the very end of a full chunk stays on that chunk
            let (offset, col) = if buffer.options.word_wrap
                && cursor_col > 0
                && cursor_col == chars.len()
                && cursor_col % width == 0
            {
                (cursor_col / width - 1, width)
            } else {
                (offset, col)
            };
            cursor = ((rows.len() + offset) as u16, col as u16);
        }

        for (j, chunk) in chunks.into_iter().enumerate() {
            rows.push(VisualRow {
                line_no: (j == 0).then_some(i + 1),
                text: chunk,
            });
        }
    }

    (rows, cursor)
}

fn render_text_buffer(
    buffer: &mut EditorBuffer,
    block: Block,
    focused: bool,
    frame: &mut Frame,
    area: Rect,
    palette: &Palette,
) {
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let gutter = if buffer.options.line_numbers {
        buffer.lines().len().to_string().len() as u16 + 1
    } else {
        0
    };
    let minimap = if buffer.options.minimap && inner.width > MINIMAP_WIDTH * 4 {
        MINIMAP_WIDTH
    } else {
        0
    };
    let text_width = inner.width.saturating_sub(gutter + minimap);

    let (rows, (cursor_row, cursor_col)) = visual_rows(buffer, text_width);
    buffer.follow_cursor(cursor_row, inner.height);
    let scroll = buffer.scroll.min(rows.len().saturating_sub(1) as u16);

    let lines: Vec<Line> = rows
        .iter()
        .skip(scroll as usize)
        .take(inner.height as usize)
        .map(|row| {
            let mut spans = Vec::new();
            if gutter > 0 {
                let number = row
                    .line_no
                    .map(|n| format!("{:>width$} ", n, width = gutter as usize - 1))
                    .unwrap_or_else(|| " ".repeat(gutter as usize));
                spans.push(Span::styled(number, Style::default().fg(palette.muted)));
            }
            let visible: String = if buffer.options.word_wrap {
                row.text.clone()
            } else {
                row.text.chars().take(text_width as usize).collect()
            };
            spans.push(Span::styled(visible, Style::default().fg(palette.fg)));
            Line::from(spans)
        })
        .collect();

    let text_area = Rect::new(inner.x, inner.y, inner.width - minimap, inner.height);
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(palette.code_bg)),
        text_area,
    );

    if minimap > 0 {
        let map_area = Rect::new(inner.x + inner.width - minimap, inner.y, minimap, inner.height);
        render_minimap(buffer, scroll, frame, map_area, palette);
    }

    if focused && cursor_row >= scroll && cursor_row < scroll + inner.height {
        let x = inner.x + gutter + cursor_col.min(text_width.saturating_sub(1));
        frame.set_cursor_position((x, inner.y + cursor_row - scroll));
    }
}

/// Coarse overview: one bar per line scaled to the strip width.
fn render_minimap(buffer: &EditorBuffer, scroll: u16, frame: &mut Frame, area: Rect, palette: &Palette) {
    let total = buffer.lines().len().max(1);
    let height = area.height as usize;
    let viewport = scroll as usize..scroll as usize + height;

    let lines: Vec<Line> = (0..height)
        .map(|i| {
            let line_idx = if total < height { i } else { i * total / height };
            if line_idx >= total {
                return Line::default();
            }
            let len = buffer.lines().get(line_idx).map(|l| l.trim_end().len()).unwrap_or(0);
            let bar = (len / 8).min(area.width as usize - 1);
            let style = if viewport.contains(&line_idx) {
                Style::default().fg(palette.accent)
            } else {
                Style::default().fg(palette.muted)
            };
            Line::from(Span::styled(format!(" {}", "▬".repeat(bar)), style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_output(page: &mut Page, frame: &mut Frame, area: Rect, palette: &Palette) {
    let block = pane_block(
        page,
        format!(" {} ", label(page, Label::Output)),
        page.focus == FocusPane::Output,
        palette,
    );
    let inner = block.inner(area);

    if page.output.follow {
        let height = wrapped_height(page.output.text.split('\n'), inner.width);
        page.output.scroll = height.saturating_sub(inner.height);
        page.output.follow = false;
    }

    let color = if page.output.is_error { palette.error } else { palette.success };
    let output = Paragraph::new(page.output.text.as_str())
        .style(Style::default().fg(color))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((page.output.scroll, 0));
    frame.render_widget(output, area);
}

fn render_ai_column(page: &mut Page, frame: &mut Frame, area: Rect, palette: &Palette) {
    let [actions_area, ai_area, chat_area, prompt_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Percentage(35),
        Constraint::Length(3),
    ])
    .areas(area);

    page.ai_area = Some(ai_area);
    page.chat_area = Some(chat_area);

    render_actions(page, frame, actions_area, palette);
    render_ai_output(page, frame, ai_area, palette);
    render_chat(page, frame, chat_area, palette);
    render_prompt(page, frame, prompt_area, palette);
}

fn render_actions(page: &Page, frame: &mut Frame, area: Rect, palette: &Palette) {
    let mut spans = Vec::new();
    for (i, action) in AiAction::all().into_iter().enumerate() {
        let selected = page.marked_action == Some(action);
        let style = if selected {
            Style::default().bg(palette.accent).fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.accent)
        };
        spans.push(Span::styled(
            format!(" {} {} ", i + 1, label(page, Label::Action(action))),
            style,
        ));
        spans.push(Span::raw(" "));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.muted));
    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .block(block)
            .alignment(text_alignment(page)),
        area,
    );
}

fn markup_lines(nodes: &[MarkupNode], base: Style, palette: &Palette) -> Vec<Line<'static>> {
    let code_style = base.bg(palette.code_bg);
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    // A block already ends its own row, so the break right after it is dropped
    let mut after_pre = false;

    for node in nodes {
        let was_after_pre = std::mem::replace(&mut after_pre, false);
        match node {
            MarkupNode::Text(s) => current.push(Span::styled(s.clone(), base)),
            MarkupNode::Code(s) => current.push(Span::styled(s.clone(), code_style)),
            MarkupNode::Break if was_after_pre => {}
            MarkupNode::Break => lines.push(Line::from(std::mem::take(&mut current))),
            MarkupNode::Pre(s) => {
                after_pre = true;
                if !current.is_empty() {
                    lines.push(Line::from(std::mem::take(&mut current)));
                }
                for pre_line in s.trim_matches('\n').split('\n') {
                    lines.push(Line::from(Span::styled(format!(" {} ", pre_line), code_style)));
                }
            }
        }
    }
    if !current.is_empty() {
        lines.push(Line::from(current));
    }

    lines
}

fn render_ai_output(page: &mut Page, frame: &mut Frame, area: Rect, palette: &Palette) {
    let block = pane_block(
        page,
        format!(" {} ", label(page, Label::AiOutput)),
        page.focus == FocusPane::AiOutput,
        palette,
    );
    let inner = block.inner(area);

    let base = if page.ai_output.is_error {
        Style::default().fg(palette.error)
    } else {
        Style::default().fg(palette.fg)
    };
    let lines = markup_lines(&page.ai_output.nodes, base, palette);

    if page.ai_output.follow {
        let plain = markup::to_plain(&page.ai_output.nodes);
        let height = wrapped_height(plain.split('\n'), inner.width);
        page.ai_output.scroll = height.saturating_sub(inner.height);
        page.ai_output.follow = false;
    }

    let ai = Paragraph::new(Text::from(lines))
        .block(block)
        .alignment(text_alignment(page))
        .wrap(Wrap { trim: false })
        .scroll((page.ai_output.scroll, 0));
    frame.render_widget(ai, area);
}

fn render_chat(page: &mut Page, frame: &mut Frame, area: Rect, palette: &Palette) {
    let block = pane_block(page, format!(" {} ", label(page, Label::Chat)), false, palette);
    let inner = block.inner(area);

    let mut lines: Vec<Line> = Vec::new();
    for entry in &page.chat {
        let (who, color) = match entry.sender {
            Sender::User => (label(page, Label::You), palette.focus),
            Sender::Ai => (label(page, Label::Assistant), palette.accent),
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", who),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for text_line in entry.text.split('\n') {
            lines.push(Line::from(text_line.to_string()));
        }
        lines.push(Line::default());
    }

    let plain: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    let max_scroll = wrapped_height(plain.iter().map(String::as_str), inner.width)
        .saturating_sub(inner.height);
    page.chat_scroll = page.chat_scroll.min(max_scroll);

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .alignment(text_alignment(page))
        .wrap(Wrap { trim: false })
        .scroll((page.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_prompt(page: &Page, frame: &mut Frame, area: Rect, palette: &Palette) {
    let focused = page.focus == FocusPane::Prompt;
    let hint = match page.marked_action {
        Some(action) => format!(" {} ({}) ", label(page, Label::Prompt), action.as_str()),
        None => format!(" {} ", label(page, Label::Prompt)),
    };
    let block = pane_block(page, hint, focused, palette);

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = page.prompt.cursor();
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = page
        .prompt
        .text()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(palette.focus))
        .block(block);
    frame.render_widget(input, area);

    if focused {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_loading(page: &Page, frame_idx: u8, frame: &mut Frame, area: Rect, palette: &Palette) {
    let popup_area = centered(area, 30, 3);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    // Animated ellipsis: cycles through ".", "..", "..."
    let dots = ".".repeat(frame_idx as usize + 1);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));
    let text = Paragraph::new(format!("{}{}", label(page, Label::Processing), dots))
        .alignment(Alignment::Center)
        .style(Style::default().bg(palette.bg).fg(palette.fg).italic())
        .block(block);
    frame.render_widget(text, popup_area);
}

fn render_confirmation(
    page: &Page,
    confirmation: &Confirmation,
    frame: &mut Frame,
    area: Rect,
    palette: &Palette,
) {
    let mut lines = Vec::new();
    match confirmation {
        Confirmation::ClearCode => {
            lines.push(Line::from("Are you sure you want to clear the code?"));
        }
        Confirmation::InsertCode(code) => {
            lines.push(Line::from("Would you like to insert this code into the editor?"));
            lines.push(Line::default());
            for code_line in code.lines().take(8) {
                lines.push(Line::from(Span::styled(
                    code_line.to_string(),
                    Style::default().bg(palette.code_bg),
                )));
            }
            if code.lines().count() > 8 {
                lines.push(Line::from(Span::styled("...", Style::default().fg(palette.muted))));
            }
        }
    }
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled(" y ", Style::default().bg(Color::DarkGray).fg(Color::White)),
        Span::raw(" yes   "),
        Span::styled(" n ", Style::default().bg(Color::DarkGray).fg(Color::White)),
        Span::raw(" no "),
    ]));

    let popup_area = centered(area, 64, lines.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(format!(" {} ", label(page, Label::Confirm)));
    let popup = Paragraph::new(Text::from(lines))
        .style(Style::default().bg(palette.bg).fg(palette.fg))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(popup, popup_area);
}
