//! 界面渲染
//!
//! 左侧为可用工具列表，右侧上方为对话历史（按角色着色、过长内容折叠、按宽度换行），
//! 下方为输入框与快捷键提示。

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use crate::core::{AgentPhase, UiState};
use crate::memory::Role;

/// 单条消息在 UI 中显示的最大字符数
const MAX_DISPLAY_CHARS: usize = 2000;
const SIDEBAR_WIDTH: u16 = 28;

/// 对过长内容做折叠：保留前 N 字 + 省略提示
fn truncate_for_display(content: &str) -> String {
    let total = content.chars().count();
    if total <= MAX_DISPLAY_CHARS {
        return content.to_string();
    }
    let head: String = content.chars().take(MAX_DISPLAY_CHARS).collect();
    format!("{}\n... [{} chars omitted]", head, total - MAX_DISPLAY_CHARS)
}

/// 将内容按宽度换行（按字符数，避免在 UTF-8 中间截断）
fn wrap_text(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    for para in s.split('\n') {
        let mut line = String::new();
        for ch in para.chars() {
            if line.chars().count() >= width {
                lines.push(std::mem::take(&mut line));
            }
            line.push(ch);
        }
        lines.push(line);
    }
    lines
}

fn role_style(role: Role) -> (&'static str, Color) {
    match role {
        Role::User => ("You ", Color::Cyan),
        Role::Assistant => ("TNC ", Color::Green),
        Role::System | Role::Tool => ("Sys ", Color::Gray),
    }
}

fn draw_sidebar(f: &mut Frame, area: Rect, title: &str, tools: &[&str]) {
    let items: Vec<ListItem> = tools
        .iter()
        .map(|name| ListItem::new(Line::from(format!("• {name}"))))
        .collect();
    let list = List::new(items).block(
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );
    f.render_widget(list, area);
}

/// 绘制一帧；将 (总行数, 可视高度) 写入 out 供外部 clamp 滚动
pub fn draw(
    f: &mut Frame,
    state: &UiState,
    input_buffer: &str,
    conversation_scroll: usize,
    out: &mut (usize, usize),
    title: &str,
    tools: &[&str],
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(f.area());
    draw_sidebar(f, columns[0], "Tools", tools);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(5)])
        .split(columns[1]);

    let conv_area = chunks[0];
    let content_width = conv_area.width.saturating_sub(3) as usize; // 边框 + 滚动条

    let phase_str = match state.phase {
        AgentPhase::Idle => "ready",
        AgentPhase::Thinking => "thinking…",
        AgentPhase::Error => "error",
    };

    let block = Block::default()
        .title(format!(" {} │ {} ", title, phase_str))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let mut text_lines: Vec<Line> = Vec::new();
    for (idx, m) in state.history.iter().enumerate() {
        if idx > 0 {
            text_lines.push(Line::from(Span::raw("")));
        }
        let (prefix, color) = role_style(m.role);
        let display_text = truncate_for_display(&m.content);
        let wrapped = wrap_text(&display_text, content_width.saturating_sub(5).max(20));
        for (i, line) in wrapped.into_iter().enumerate() {
            let pref = if i == 0 { prefix } else { "    " };
            text_lines.push(Line::from(vec![
                Span::styled(pref, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::raw(line),
            ]));
        }
    }

    let content_height = conv_area.height.saturating_sub(2) as usize;
    let total_lines = text_lines.len();
    let max_scroll = total_lines.saturating_sub(content_height);
    let scroll_offset = conversation_scroll.min(max_scroll);

    let inner = block.inner(conv_area);
    f.render_widget(block, conv_area);
    let paragraph = Paragraph::new(Text::from(text_lines)).scroll((scroll_offset as u16, 0));
    f.render_widget(paragraph, inner);

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .position(scroll_offset)
            .viewport_content_length(content_height);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .thumb_symbol("█")
            .track_symbol(Some("░"));
        f.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
    }

    let input_prompt = if let Some(err) = &state.error_message {
        format!(" Error: {} ", err.chars().take(60).collect::<String>())
    } else if state.input_locked {
        " Waiting for reply… ".to_string()
    } else {
        " Ask about conservation ".to_string()
    };

    let border_color = if state.error_message.is_some() {
        Color::Red
    } else {
        Color::Blue
    };

    let hint = " Enter send │ ↑↓ PgUp/PgDn scroll │ Ctrl+L clear │ Esc/Ctrl+Q quit ";
    let input_block = Block::default()
        .title(input_prompt)
        .title_bottom(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let input = Paragraph::new(input_buffer)
        .block(input_block)
        .wrap(Wrap { trim: false })
        .style(if state.input_locked {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        });

    f.render_widget(input, chunks[1]);

    out.0 = total_lines;
    out.1 = content_height;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_counts_chars() {
        assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_text("ab\n\ncd", 10), vec!["ab", "", "cd"]);
        assert_eq!(wrap_text("生态保护", 2), vec!["生态", "保护"]);
    }

    #[test]
    fn test_long_messages_fold() {
        let long = "x".repeat(MAX_DISPLAY_CHARS + 20);
        assert!(truncate_for_display(&long).ends_with("[20 chars omitted]"));
        assert_eq!(truncate_for_display("short reply"), "short reply");
    }
}
