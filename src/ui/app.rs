//! TUI 应用主循环
//!
//! 进入全屏/原始模式，轮询 state_rx 与键盘事件，将用户输入与快捷键转为 Command 发送给命令循环，
//! 每帧用 draw 渲染 UiState 与输入缓冲。

use std::io::{self, Stdout};

use crossterm::event::KeyCode;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::core::{Command, UiState};
use crate::tools::ToolId;
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::draw;

/// 滚动键对应的新偏移；usize::MAX 表示贴底（渲染后再 clamp）
fn scroll_after(code: KeyCode, current: usize) -> Option<usize> {
    match code {
        KeyCode::Up => Some(current.saturating_sub(1)),
        KeyCode::Down => Some(current.saturating_add(1)),
        KeyCode::PageUp => Some(current.saturating_sub(10)),
        KeyCode::PageDown => Some(current.saturating_add(10)),
        KeyCode::Home => Some(0),
        KeyCode::End => Some(usize::MAX),
        _ => None,
    }
}

fn is_quit_input(input: &str) -> bool {
    matches!(
        input.to_lowercase().as_str(),
        "/exit" | "exit" | "/quit" | "quit"
    )
}

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(
    title: &str,
    state_rx: watch::Receiver<UiState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let event_handler = EventHandler::new(cmd_tx);
    let tools: Vec<&str> = ToolId::ALL.iter().map(|id| id.name()).collect();
    let mut input_buffer = String::new();
    let mut conversation_scroll = 0usize;
    let mut last_history_len = 0usize;

    loop {
        let state = state_rx.borrow().clone();

        if state.history.len() != last_history_len {
            last_history_len = state.history.len();
            conversation_scroll = usize::MAX;
        }

        if let Ok(Some(ev)) = event_handler.poll() {
            match ev {
                AppEvent::Command(Command::Quit) => break,
                AppEvent::Command(_) => {}
                AppEvent::Key(key) => match key.code {
                    KeyCode::Enter if !state.input_locked => {
                        let input = input_buffer.trim().to_string();
                        input_buffer.clear();
                        if is_quit_input(&input) {
                            event_handler.send_quit();
                            break;
                        }
                        if !input.is_empty() {
                            event_handler.send_submit(input);
                        }
                    }
                    KeyCode::Backspace if !state.input_locked => {
                        input_buffer.pop();
                    }
                    KeyCode::Char(c) if !state.input_locked => {
                        input_buffer.push(c);
                    }
                    code => {
                        if let Some(next) = scroll_after(code, conversation_scroll) {
                            conversation_scroll = next;
                        }
                    }
                },
            }
        }

        let mut scroll_info = (0usize, 0usize);
        terminal.draw(|f| {
            draw(
                f,
                &state,
                &input_buffer,
                conversation_scroll,
                &mut scroll_info,
                title,
                &tools,
            );
        })?;
        let (total_lines, viewport_height) = scroll_info;
        conversation_scroll = conversation_scroll.min(total_lines.saturating_sub(viewport_height));

        tokio::task::yield_now().await;
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
