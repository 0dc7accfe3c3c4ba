use log::{debug, error, info};

use crate::buffer::Buffer;
use crate::cursor::{Cursor, Position};
use crate::error::Result;
use crate::file_io::{FileIO, Sink};
use crate::keys::{Key, KeyDecoder};
use crate::mode::{State, StateManager};
use crate::screen::Screen;
use crate::terminal::TerminalIo;

/// 編集セッション
///
/// 描画 → キー読み取り → バッファ更新を ESC まで繰り返し、
/// 終了時にバッファを書き出して端末を元に戻す。
pub struct EditSession<T: TerminalIo> {
    terminal: T,
    decoder: KeyDecoder,
    buffer: Buffer,
    cursor: Cursor,
    sink: Sink,
    state: StateManager,
}

impl<T: TerminalIo> EditSession<T> {
    /// `start_line` が末尾を超えていれば最終行から始める
    pub fn new(terminal: T, buffer: Buffer, sink: Sink, start_line: usize) -> Self {
        let mut cursor = Cursor::new();
        cursor.set(Position::new(start_line, 0), &buffer);
        Self {
            terminal,
            decoder: KeyDecoder::new(),
            buffer,
            cursor,
            sink,
            state: StateManager::new(),
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn cursor(&self) -> Position {
        self.cursor.position()
    }

    pub fn state(&self) -> State {
        self.state.current()
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    /// ESC が押されるまで編集を続ける
    ///
    /// 端末の読み取りに失敗した場合は端末を戻してからエラーを返す。
    pub fn run(&mut self) -> Result<()> {
        info!(
            "editing {} rows, starting at row {}",
            self.buffer.len(),
            self.cursor.row() + 1
        );

        while self.state.is_editing() {
            self.refresh();
            let key = match self.decoder.next_key(&mut self.terminal) {
                Ok(key) => key,
                Err(e) => {
                    error!("terminal read failed: {}", e);
                    self.state.enter_terminated();
                    self.terminal.restore();
                    return Err(e);
                }
            };
            self.process_key(key)?;
        }
        Ok(())
    }

    pub fn refresh(&mut self) {
        let row = self.cursor.row();
        let column = Screen::cursor_to_column(self.buffer.row_bytes(row), self.cursor.col());
        let frame = Screen::render_line(row, &self.buffer, column);
        self.terminal.write_raw(frame.as_bytes());
    }

    pub fn process_key(&mut self, key: Key) -> Result<()> {
        debug!("key {:?} at {:?}", key, self.cursor.position());

        if !matches!(key, Key::Char(_)) {
            self.buffer.discard_pending();
        }

        let pos = self.cursor.position();
        match key {
            Key::Escape => return self.quit(),
            Key::Char(byte) => self.apply(|b| b.insert_byte(pos, byte)),
            Key::Newline => self.apply(|b| b.split_row(pos)),
            Key::Backspace | Key::Ctrl('h') => self.backspace(),
            Key::Delete | Key::Ctrl('d') => self.apply(|b| b.delete_codepoint_after(pos)),
            Key::Ctrl('w') => self.apply(|b| b.delete_word_before(pos)),
            Key::Ctrl('u') => self.apply(|b| b.delete_to_line_start(pos)),
            Key::Ctrl('k') => self.apply(|b| b.delete_to_line_end(pos)),
            Key::ArrowLeft | Key::Ctrl('b') => self.cursor.move_left(&self.buffer),
            Key::ArrowRight | Key::Ctrl('f') => self.cursor.move_right(&self.buffer),
            Key::ArrowUp => self.cursor.move_up(&self.buffer),
            Key::ArrowDown => self.cursor.move_down(&self.buffer),
            Key::Home | Key::Ctrl('a') => self.cursor.move_line_start(),
            Key::End | Key::Ctrl('e') => self.cursor.move_line_end(&self.buffer),
            Key::Ctrl(_) => {}
        }
        Ok(())
    }

    /// バッファ操作が返した位置をそのままカーソルにする
    fn apply<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut Buffer) -> Position,
    {
        let pos = edit(&mut self.buffer);
        self.cursor.set(pos, &self.buffer);
    }

    fn backspace(&mut self) {
        let pos = self.cursor.position();
        if pos.col > 0 {
            self.apply(|b| b.delete_codepoint(pos));
        } else if pos.row > 0 {
            self.apply(|b| b.merge_with_previous(pos.row));
        }
    }

    /// 保存して終了する
    fn quit(&mut self) -> Result<()> {
        self.state.enter_saving();
        let saved = FileIO::save(&self.sink, &self.buffer);
        self.terminal.write_raw(b"\r\n");
        self.state.enter_terminated();
        self.terminal.restore();
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::tests::ScriptedTerminal;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        path: std::path::PathBuf,
    }

    impl Fixture {
        fn new(content: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("doc.txt");
            std::fs::write(&path, content).unwrap();
            Self { _dir: dir, path }
        }

        fn session(&self, input: &[u8], start_line: usize) -> EditSession<ScriptedTerminal> {
            let buffer = FileIO::open(&self.path).unwrap();
            EditSession::new(
                ScriptedTerminal::new(input),
                buffer,
                Sink::File(self.path.clone()),
                start_line,
            )
        }

        fn saved(&self) -> String {
            std::fs::read_to_string(&self.path).unwrap()
        }
    }

    fn contents<T: TerminalIo>(session: &EditSession<T>) -> Vec<&str> {
        session.buffer().rows().iter().map(|r| r.chars()).collect()
    }

    fn press(session: &mut EditSession<ScriptedTerminal>, keys: &[Key]) {
        for &key in keys {
            session.process_key(key).unwrap();
        }
    }

    #[test]
    fn test_insert_into_empty_document() {
        let fx = Fixture::new("");
        let mut session = fx.session(b"", 0);

        press(&mut session, &[Key::Char(b'h'), Key::Char(b'i')]);

        assert_eq!(contents(&session), vec!["hi"]);
        assert_eq!(session.cursor(), Position::new(0, 2));
    }

    #[test]
    fn test_utf8_backspace() {
        let fx = Fixture::new("a€b\n");
        let mut session = fx.session(b"", 0);

        press(&mut session, &[Key::ArrowRight, Key::ArrowRight]);
        assert_eq!(session.cursor(), Position::new(0, 4));

        press(&mut session, &[Key::Backspace]);
        assert_eq!(contents(&session), vec!["ab"]);
        assert_eq!(session.cursor(), Position::new(0, 1));
    }

    #[test]
    fn test_newline_splits_row() {
        let fx = Fixture::new("abcdef\n");
        let mut session = fx.session(b"", 0);

        press(&mut session, &[Key::ArrowRight, Key::ArrowRight, Key::ArrowRight]);
        press(&mut session, &[Key::Newline]);

        assert_eq!(contents(&session), vec!["abc", "def"]);
        assert_eq!(session.cursor(), Position::new(1, 0));
    }

    #[test]
    fn test_backspace_at_line_start_merges() {
        let fx = Fixture::new("abc\ndef\n");
        let mut session = fx.session(b"", 1);

        press(&mut session, &[Key::Backspace]);

        assert_eq!(contents(&session), vec!["abcdef"]);
        assert_eq!(session.cursor(), Position::new(0, 3));
    }

    #[test]
    fn test_boundary_keys_are_noops() {
        let fx = Fixture::new("ab\ncd\n");
        let mut session = fx.session(b"", 0);

        press(&mut session, &[Key::Backspace, Key::Ctrl('w'), Key::ArrowLeft]);
        assert_eq!(contents(&session), vec!["ab", "cd"]);
        assert_eq!(session.cursor(), Position::new(0, 0));

        press(&mut session, &[Key::ArrowDown, Key::End, Key::ArrowRight]);
        assert_eq!(session.cursor(), Position::new(1, 2));
    }

    #[test]
    fn test_start_line_is_clamped() {
        let fx = Fixture::new("one\ntwo\n");
        let session = fx.session(b"", 99);
        assert_eq!(session.cursor(), Position::new(1, 0));
    }

    #[test]
    fn test_control_bindings() {
        let fx = Fixture::new("foo bar baz\n");
        let mut session = fx.session(b"", 0);

        press(&mut session, &[Key::Ctrl('e'), Key::Ctrl('w')]);
        assert_eq!(contents(&session), vec!["foo bar "]);

        press(&mut session, &[Key::Ctrl('b'), Key::Ctrl('b'), Key::Ctrl('k')]);
        assert_eq!(contents(&session), vec!["foo ba"]);

        press(&mut session, &[Key::Ctrl('b'), Key::Ctrl('u')]);
        assert_eq!(contents(&session), vec!["a"]);
        assert_eq!(session.cursor(), Position::new(0, 0));

        press(&mut session, &[Key::Delete]);
        assert!(session.buffer().is_empty());
    }

    #[test]
    fn test_partial_utf8_discarded_by_other_keys() {
        let fx = Fixture::new("");
        let mut session = fx.session(b"", 0);

        press(&mut session, &[Key::Char(0xE2), Key::ArrowLeft, Key::Char(0x82)]);
        assert!(session.buffer().is_empty());
    }

    #[test]
    fn test_bare_escape_saves_and_terminates() {
        let fx = Fixture::new("keep me\n");
        let mut session = fx.session(b"\x1b", 0);

        session.run().unwrap();

        assert_eq!(session.state(), State::Terminated);
        assert_eq!(fx.saved(), "keep me\n");
        assert_eq!(session.terminal().restored, 1);
        assert!(session.terminal().output.ends_with(b"\r\n"));
    }

    #[test]
    fn test_empty_file_quit_without_edits_stays_empty() {
        let fx = Fixture::new("");
        let mut session = fx.session(b"\x1b", 0);

        session.run().unwrap();

        assert_eq!(fx.saved(), "");
    }

    #[test]
    fn test_typed_session_round_trip() {
        let fx = Fixture::new("first\n");
        // 行末に移動して改行、"€ x" を入力して ESC
        let mut input = b"\x1b[F\r".to_vec();
        input.extend_from_slice("€ x".as_bytes());
        input.push(0x1b);
        let mut session = fx.session(&input, 0);

        session.run().unwrap();

        assert_eq!(fx.saved(), "first\n€ x\n");
        assert!(session.terminal().output.starts_with(b"\r"));
    }

    #[test]
    fn test_zero_edits_round_trip() {
        let fx = Fixture::new("a\r\nb\n\nc");
        let mut session = fx.session(b"\x1b", 0);

        session.run().unwrap();

        assert_eq!(fx.saved(), "a\nb\n\nc\n");
    }

    #[test]
    fn test_read_failure_restores_terminal() {
        let fx = Fixture::new("untouched\n");
        let mut session = fx.session(b"abc", 0);

        assert!(session.run().is_err());
        assert_eq!(session.state(), State::Terminated);
        assert_eq!(session.terminal().restored, 1);
        // 保存はしない
        assert_eq!(fx.saved(), "untouched\n");
    }

    #[test]
    fn test_refresh_renders_status_and_cursor() {
        let fx = Fixture::new("x\nあい\n");
        let mut session = fx.session(b"", 1);
        press(&mut session, &[Key::End]);

        session.refresh();

        let out = String::from_utf8(session.terminal().output.clone()).unwrap();
        assert!(out.contains("[2/2] あい"));
        // "[2/2] " (6) + 全角 2 文字 (4)
        assert!(out.contains(&termion::cursor::Right(10).to_string()));
    }
}
