use std::time::Duration;
use tracing::trace;

use crate::domain::{GridConfig, GridError, Message};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &GridConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, GridError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            let message = match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    self.handle_key(key, model.raw_keyevents())
                }
                Event::Resize(width, height) => {
                    Some(Message::Resize(width as usize, height as usize))
                }
                _ => None,
            };
            return Ok(message);
        }
        Ok(None)
    }

    /// Maps a key press to a message. While an input is open every key goes to it.
    pub fn handle_key(&self, key: KeyEvent, raw: bool) -> Option<Message> {
        if raw {
            return Some(Message::RawKey(key));
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Message::Quit),
                _ => None,
            };
        }
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::FocusLeft),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::FocusRight),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::ScrollUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::ScrollDown),
            KeyCode::Enter | KeyCode::Char('s') => Some(Message::ToggleSort),
            KeyCode::Char('/') | KeyCode::Char('f') => Some(Message::EditFilter),
            KeyCode::Char('x') => Some(Message::ClearFilter),
            KeyCode::Home | KeyCode::Char('g') => Some(Message::FirstPage),
            KeyCode::PageUp | KeyCode::Char('p') => Some(Message::PreviousPage),
            KeyCode::PageDown | KeyCode::Char('n') => Some(Message::NextPage),
            KeyCode::End | KeyCode::Char('G') => Some(Message::LastPage),
            KeyCode::Char(':') => Some(Message::GoToPage),
            KeyCode::Char('z') => Some(Message::CyclePageSize),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> Controller {
        Controller::new(&GridConfig::default())
    }

    #[test]
    fn maps_table_keys() {
        let c = controller();
        let press = |code| c.handle_key(KeyEvent::new(code, KeyModifiers::NONE), false);

        assert_eq!(press(KeyCode::Char('q')), Some(Message::Quit));
        assert_eq!(press(KeyCode::Right), Some(Message::FocusRight));
        assert_eq!(press(KeyCode::Down), Some(Message::ScrollDown));
        assert_eq!(press(KeyCode::Char('k')), Some(Message::ScrollUp));
        assert_eq!(press(KeyCode::Enter), Some(Message::ToggleSort));
        assert_eq!(press(KeyCode::Char('/')), Some(Message::EditFilter));
        assert_eq!(press(KeyCode::PageDown), Some(Message::NextPage));
        assert_eq!(press(KeyCode::Char('z')), Some(Message::CyclePageSize));
        assert_eq!(press(KeyCode::Char('y')), None);
    }

    #[test]
    fn shifted_last_page_key() {
        let c = controller();
        let key = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(c.handle_key(key, false), Some(Message::LastPage));
    }

    #[test]
    fn raw_mode_forwards_everything() {
        let c = controller();
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(c.handle_key(key, true), Some(Message::RawKey(key)));
    }

    #[test]
    fn ctrl_c_quits() {
        let c = controller();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(c.handle_key(key, false), Some(Message::Quit));
    }
}
