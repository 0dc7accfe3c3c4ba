use termion::{clear, cursor};

use crate::buffer::Buffer;
use crate::utf8;

const EOF_MARKER: &str = "[EOF]";

pub struct Screen;

impl Screen {
    /// バイトオフセットを画面上の桁に変換する
    pub fn cursor_to_column(row: &[u8], byte_offset: usize) -> usize {
        let end = byte_offset.min(row.len());
        let mut pos = 0;
        let mut column = 0;
        while pos < end {
            let (len, width) = utf8::codepoint_span(row, pos);
            pos += len;
            column += width;
        }
        column
    }

    /// "[現在行/総行数] "
    pub fn status_prefix(row_index: usize, total: usize) -> String {
        format!("[{}/{}] ", row_index + 1, total)
    }

    /// 1 行分の再描画シーケンスを組み立てる
    ///
    /// カーソルを隠す → 行クリア → ステータスと本文 → カーソル位置へ移動 → 表示、
    /// を 1 回の書き込みで送れるようにまとめて返す。
    pub fn render_line(row_index: usize, buffer: &Buffer, cursor_column: usize) -> String {
        // 終端を指す行番号を渡す呼び出し側向け。EditSession のカーソルは常に行内
        let Some(row) = buffer.row(row_index) else {
            return format!(
                "\r{}{}{}\r{}",
                cursor::Hide,
                clear::CurrentLine,
                EOF_MARKER,
                cursor::Show
            );
        };

        let status = Self::status_prefix(row_index, buffer.len());
        let mut frame = format!(
            "\r{}{}{}{}\r",
            cursor::Hide,
            clear::CurrentLine,
            status,
            row.chars()
        );

        // ステータスは ASCII のみなのでバイト数 = 桁数
        let column = status.len() + cursor_column;
        if column > 0 {
            let column = u16::try_from(column).unwrap_or(u16::MAX);
            frame.push_str(&cursor::Right(column).to_string());
        }
        frame.push_str(&cursor::Show.to_string());
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_of(lines: &[&str]) -> Buffer {
        Buffer::from_lines(lines.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_cursor_to_column_ascii() {
        assert_eq!(Screen::cursor_to_column(b"hello", 0), 0);
        assert_eq!(Screen::cursor_to_column(b"hello", 3), 3);
        // 行末を超える指定は行末扱い
        assert_eq!(Screen::cursor_to_column(b"hello", 10), 5);
    }

    #[test]
    fn test_cursor_to_column_wide_and_combining() {
        let row = "aあe\u{0301}b".as_bytes();

        assert_eq!(Screen::cursor_to_column(row, 1), 1);
        assert_eq!(Screen::cursor_to_column(row, 4), 3);
        assert_eq!(Screen::cursor_to_column(row, 5), 4);
        // 結合文字は桁を進めない
        assert_eq!(Screen::cursor_to_column(row, 7), 4);
        assert_eq!(Screen::cursor_to_column(row, 8), 5);
    }

    #[test]
    fn test_cursor_to_column_is_monotonic() {
        let row = "x€あ\u{0301}😀 z\t".as_bytes();
        let mut last = 0;
        for offset in 0..=row.len() {
            let column = Screen::cursor_to_column(row, offset);
            assert!(column >= last, "offset {offset}: {column} < {last}");
            last = column;
        }
    }

    #[test]
    fn test_status_prefix() {
        assert_eq!(Screen::status_prefix(0, 1), "[1/1] ");
        assert_eq!(Screen::status_prefix(9, 12), "[10/12] ");
    }

    #[test]
    fn test_render_line() {
        let buffer = buffer_of(&["first", "二行目"]);
        let frame = Screen::render_line(1, &buffer, 4);

        let expected = format!(
            "\r{}{}[2/2] 二行目\r{}{}",
            cursor::Hide,
            clear::CurrentLine,
            cursor::Right(10),
            cursor::Show
        );
        assert_eq!(frame, expected);
    }

    #[test]
    fn test_render_line_past_end_shows_eof() {
        let buffer = buffer_of(&["only"]);
        let frame = Screen::render_line(1, &buffer, 0);

        assert!(frame.contains("[EOF]"));
        assert!(!frame.contains("only"));
    }
}
