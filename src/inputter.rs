use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line editor behind the filter and go-to-page inputs.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    cursor_pos: usize, // In chars, not bytes
    numeric: bool,
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.enter(),
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.left(),
            (KeyCode::Right, _) => self.right(),
            (KeyCode::Home, _) => self.home(),
            (KeyCode::End, _) => self.end(),
            (KeyCode::Char(chr), KeyModifiers::NONE | KeyModifiers::SHIFT) => self.insert(chr),
            (kc, km) => {
                trace!("Inputter ignores {kc:?} {km:?}");
                self.get()
            }
        }
    }

    /// Starts a new edit with `s` as content and the cursor at its end.
    pub fn start(&mut self, s: &str, numeric: bool) {
        self.clear();
        self.numeric = numeric;
        self.current_input = s.to_string();
        self.cursor_pos = s.chars().count();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            cursor_pos: self.cursor_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.numeric = false;
        self.current_input.clear();
        self.cursor_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let at = self.byte_pos();
            self.current_input.remove(at);
        }
        self.get()
    }

    fn delete(&mut self) -> InputResult {
        if self.cursor_pos < self.current_input.chars().count() {
            let at = self.byte_pos();
            self.current_input.remove(at);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.cursor_pos < self.current_input.chars().count() {
            self.cursor_pos += 1;
        }
        self.get()
    }

    fn home(&mut self) -> InputResult {
        self.cursor_pos = 0;
        self.get()
    }

    fn end(&mut self) -> InputResult {
        self.cursor_pos = self.current_input.chars().count();
        self.get()
    }

    fn insert(&mut self, chr: char) -> InputResult {
        if !self.numeric || chr.is_ascii_digit() || chr == '-' || chr == '.' {
            let at = self.byte_pos();
            self.current_input.insert(at, chr);
            self.cursor_pos += 1;
        }
        self.get()
    }

    fn byte_pos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(inputter: &mut Inputter, s: &str) -> InputResult {
        let mut last = inputter.get();
        for c in s.chars() {
            last = inputter.read(key(KeyCode::Char(c)));
        }
        last
    }

    #[test]
    fn typing_and_editing_at_cursor() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "mal.com");
        for _ in 0..5 {
            inputter.read(key(KeyCode::Left));
        }
        let r = type_str(&mut inputter, "i");
        assert_eq!(r.input, "mail.com");
        assert_eq!(r.cursor_pos, 3);

        let r = inputter.read(key(KeyCode::Backspace));
        assert_eq!(r.input, "mal.com");
        let r = inputter.read(key(KeyCode::Delete));
        assert_eq!(r.input, "ma.com");

        inputter.read(key(KeyCode::End));
        let r = inputter.read(key(KeyCode::Backspace));
        assert_eq!(r.input, "ma.co");
        assert!(!r.finished);
    }

    #[test]
    fn multibyte_characters() {
        let mut inputter = Inputter::default();
        inputter.start("Müller", false);
        inputter.read(key(KeyCode::Home));
        inputter.read(key(KeyCode::Right));
        let r = inputter.read(key(KeyCode::Delete));
        assert_eq!(r.input, "Mller");
    }

    #[test]
    fn numeric_mode_rejects_letters() {
        let mut inputter = Inputter::default();
        inputter.start("", true);
        let r = type_str(&mut inputter, "4a2.5x");
        assert_eq!(r.input, "42.5");
    }

    #[test]
    fn enter_finishes_escape_cancels() {
        let mut inputter = Inputter::default();
        inputter.start("abc", false);
        let r = inputter.read(key(KeyCode::Enter));
        assert!(r.finished && !r.canceled);
        assert_eq!(r.input, "abc");

        inputter.start("abc", false);
        let r = inputter.read(key(KeyCode::Esc));
        assert!(r.finished && r.canceled);
    }

    #[test]
    fn control_chords_are_ignored() {
        let mut inputter = Inputter::default();
        let r = inputter.read(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(r.input, "");
    }
}
