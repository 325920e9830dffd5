use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string edits
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_answer().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        // Enter submits; the guard against empty input and against an
        // outstanding request lives in App::submit
        KeyCode::Enter => app.submit(),

        // Input editing
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }

        // Chat scrolling (never mutates the log)
        KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::PageUp => app.scroll_chat_up(10),
        KeyCode::PageDown => app.scroll_chat_down(10),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Status;
    use crate::client::AnswerClient;

    fn new_app() -> App {
        App::new(AnswerClient::new("http://127.0.0.1:1"))
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn typing_inserts_at_the_cursor() {
        let mut app = new_app();
        for c in "Qum".chars() {
            handle_event(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        // Go back and fix the missing accent: "Qum" -> "Quem"
        handle_event(&mut app, key(KeyCode::Left)).await.unwrap();
        handle_event(&mut app, key(KeyCode::Char('e'))).await.unwrap();
        assert_eq!(app.input, "Quem");
        assert_eq!(app.cursor, 3);
    }

    #[tokio::test]
    async fn editing_is_utf8_safe() {
        let mut app = new_app();
        for c in "é?".chars() {
            handle_event(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        handle_event(&mut app, key(KeyCode::Home)).await.unwrap();
        handle_event(&mut app, key(KeyCode::Delete)).await.unwrap();
        assert_eq!(app.input, "?");

        handle_event(&mut app, key(KeyCode::End)).await.unwrap();
        handle_event(&mut app, key(KeyCode::Backspace)).await.unwrap();
        assert_eq!(app.input, "");
        assert_eq!(app.cursor, 0);
    }

    #[tokio::test]
    async fn enter_submits_non_empty_input() {
        let mut app = new_app();
        for c in "oi".chars() {
            handle_event(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.status, Status::Awaiting);
        assert_eq!(app.input, "");
    }

    #[tokio::test]
    async fn enter_on_whitespace_does_nothing() {
        let mut app = new_app();
        for c in "   ".chars() {
            handle_event(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert!(app.messages.is_empty());
        assert!(app.task.is_none());
        assert_eq!(app.status, Status::Idle);
    }

    #[tokio::test]
    async fn esc_and_ctrl_c_quit() {
        let mut app = new_app();
        handle_event(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert!(app.should_quit);

        let mut app = new_app();
        let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, ctrl_c).await.unwrap();
        assert!(app.should_quit);
    }
}
