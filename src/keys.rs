//! 端末のバイト列をキーイベントに変換する
//!
//! 単独の ESC と矢印キー等のエスケープシーケンスは、
//! ESC を読んだ時点で入力キューに後続バイトが残っているかで区別する。
//! タイムアウトによる待ちは入れない。

use crate::error::Result;
use crate::terminal::TerminalIo;

const ESC: u8 = 0x1B;
const BACKSPACE: u8 = 0x7F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// 表示可能なバイト (UTF-8 の先頭・継続バイトを含む)
    Char(u8),
    Newline,
    Backspace,
    /// Ctrl + 文字 (小文字)
    Ctrl(char),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Delete,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    SawEscape,
    SawBracket,
}

/// キーデコーダ
///
/// ドキュメントの状態は持たず、1 回の呼び出しで 1 キーを返す。
#[derive(Debug, Default)]
pub struct KeyDecoder;

impl KeyDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn next_key<T: TerminalIo>(&mut self, term: &mut T) -> Result<Key> {
        let mut state = State::Normal;
        loop {
            match state {
                State::Normal => {
                    let byte = term.read_byte()?;
                    if byte != ESC {
                        return Ok(Self::classify(byte));
                    }
                    // 後続バイトが無ければ単独の ESC。問い合わせに失敗した場合は読みに行く
                    if matches!(term.bytes_pending(), Ok(0)) {
                        return Ok(Key::Escape);
                    }
                    state = State::SawEscape;
                }
                State::SawEscape => {
                    if term.read_byte()? != b'[' {
                        return Ok(Key::Escape);
                    }
                    state = State::SawBracket;
                }
                State::SawBracket => {
                    let key = match term.read_byte()? {
                        b'A' => Key::ArrowUp,
                        b'B' => Key::ArrowDown,
                        b'C' => Key::ArrowRight,
                        b'D' => Key::ArrowLeft,
                        b'H' => Key::Home,
                        b'F' => Key::End,
                        digit @ (b'1' | b'3' | b'4' | b'7' | b'8') => {
                            if term.read_byte()? != b'~' {
                                return Ok(Key::Escape);
                            }
                            match digit {
                                b'1' | b'7' => Key::Home,
                                b'4' | b'8' => Key::End,
                                _ => Key::Delete,
                            }
                        }
                        _ => Key::Escape,
                    };
                    return Ok(key);
                }
            }
        }
    }

    fn classify(byte: u8) -> Key {
        match byte {
            b'\r' | b'\n' => Key::Newline,
            BACKSPACE => Key::Backspace,
            0x00..=0x1F => Key::Ctrl(char::from(byte | 0x40).to_ascii_lowercase()),
            _ => Key::Char(byte),
        }
    }
}
