use crate::cursor::Position;
use crate::utf8;

/// 1 行分のテキスト (末尾の改行は持たない)
///
/// 中身は常に妥当な UTF-8。長さはバイト数で数える。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    chars: String,
}

impl Row {
    pub fn new(text: String) -> Self {
        Self { chars: text }
    }

    pub fn chars(&self) -> &str {
        &self.chars
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.chars.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn insert_str(&mut self, at: usize, text: &str) {
        let at = utf8::floor_boundary(self.as_bytes(), at);
        self.chars.insert_str(at, text);
    }

    /// `at` で終わるコードポイントを丸ごと削除し、その先頭オフセットを返す
    fn delete_codepoint(&mut self, at: usize) -> usize {
        let at = utf8::floor_boundary(self.as_bytes(), at);
        if at == 0 {
            return 0;
        }
        // 継続バイトを遡って先頭を探し、一度に取り除く
        let start = utf8::prev_boundary(self.as_bytes(), at);
        self.chars.replace_range(start..at, "");
        start
    }

    fn split_off(&mut self, at: usize) -> String {
        let at = utf8::floor_boundary(self.as_bytes(), at);
        self.chars.split_off(at)
    }

    fn append(&mut self, text: &str) {
        self.chars.push_str(text);
    }
}

/// 編集中のドキュメント
///
/// 行は最低 1 つ存在する。範囲外の行・オフセット指定はエラーにせず
/// 最も近い有効な境界に丸める。編集操作は更新後のカーソル位置を返すので、
/// 呼び出し側で計算し直さないこと。
#[derive(Debug)]
pub struct Buffer {
    rows: Vec<Row>,
    /// 組み立て途中のマルチバイト文字
    pending: Vec<u8>,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            rows: vec![Row::default()],
            pending: Vec::new(),
        }
    }

    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut rows: Vec<Row> = lines.into_iter().map(Row::new).collect();
        if rows.is_empty() {
            rows.push(Row::default());
        }
        Self {
            rows,
            pending: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 行は常に 1 つ以上あるので、空とは 1 行だけの空行を指す
    pub fn is_empty(&self) -> bool {
        self.rows.len() == 1 && self.rows[0].is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_bytes(&self, index: usize) -> &[u8] {
        self.rows.get(index).map(|r| r.as_bytes()).unwrap_or(&[])
    }

    /// 位置を有効な範囲に丸める
    pub fn clamp(&self, pos: Position) -> Position {
        let row = pos.row.min(self.rows.len() - 1);
        let col = utf8::floor_boundary(self.rows[row].as_bytes(), pos.col);
        Position::new(row, col)
    }

    /// 組み立て途中のバイト列を捨てる
    pub fn discard_pending(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("discarding partial utf-8 sequence {:02x?}", self.pending);
            self.pending.clear();
        }
    }

    pub fn insert_row(&mut self, at: usize, text: String) -> usize {
        self.pending.clear();
        let at = at.min(self.rows.len());
        self.rows.insert(at, Row::new(text));
        at
    }

    /// 行を削除する。最後の 1 行は空行として残す
    pub fn delete_row(&mut self, at: usize) -> usize {
        self.pending.clear();
        let at = at.min(self.rows.len() - 1);
        if self.rows.len() == 1 {
            self.rows[0] = Row::default();
            return 0;
        }
        self.rows.remove(at);
        at.min(self.rows.len() - 1)
    }

    /// 1 バイト挿入する
    ///
    /// マルチバイト文字は最後のバイトが揃った時点でまとめて挿入する。
    /// それまでは位置を動かさない。不正なシーケンスは捨てる。
    pub fn insert_byte(&mut self, pos: Position, byte: u8) -> Position {
        let pos = self.clamp(pos);

        if byte.is_ascii() {
            self.pending.clear();
            self.rows[pos.row].insert_str(pos.col, char::from(byte).encode_utf8(&mut [0; 4]));
            return Position::new(pos.row, pos.col + 1);
        }

        if utf8::is_continuation(byte) {
            if self.pending.is_empty() {
                return pos;
            }
            self.pending.push(byte);
        } else {
            self.discard_pending();
            self.pending.push(byte);
        }

        if self.pending.len() < utf8::sequence_len(self.pending[0]) {
            return pos;
        }

        let bytes = std::mem::take(&mut self.pending);
        match std::str::from_utf8(&bytes) {
            Ok(text) => {
                self.rows[pos.row].insert_str(pos.col, text);
                Position::new(pos.row, pos.col + text.len())
            }
            Err(_) => {
                log::debug!("dropping invalid utf-8 sequence {:02x?}", bytes);
                pos
            }
        }
    }

    /// `pos` の直前にあるコードポイントを削除する
    pub fn delete_codepoint(&mut self, pos: Position) -> Position {
        self.pending.clear();
        let pos = self.clamp(pos);
        let col = self.rows[pos.row].delete_codepoint(pos.col);
        Position::new(pos.row, col)
    }

    /// `pos` の直後にあるコードポイントを削除する。行末では次の行を連結する
    pub fn delete_codepoint_after(&mut self, pos: Position) -> Position {
        self.pending.clear();
        let pos = self.clamp(pos);
        let bytes = self.rows[pos.row].as_bytes();
        if pos.col < bytes.len() {
            let next = utf8::next_boundary(bytes, pos.col);
            return self.delete_codepoint(Position::new(pos.row, next));
        }
        if pos.row + 1 < self.rows.len() {
            return self.merge_with_previous(pos.row + 1);
        }
        pos
    }

    /// `pos` で行を分割し、残りを次の行として挿入する
    pub fn split_row(&mut self, pos: Position) -> Position {
        self.pending.clear();
        let pos = self.clamp(pos);
        let tail = self.rows[pos.row].split_off(pos.col);
        self.rows.insert(pos.row + 1, Row::new(tail));
        Position::new(pos.row + 1, 0)
    }

    /// 行を前の行の末尾に連結する
    pub fn merge_with_previous(&mut self, row: usize) -> Position {
        self.pending.clear();
        let row = row.min(self.rows.len() - 1);
        if row == 0 {
            return Position::new(0, 0);
        }
        let content = self.rows.remove(row);
        let prev = &mut self.rows[row - 1];
        let col = prev.len();
        prev.append(content.chars());
        Position::new(row - 1, col)
    }

    /// 直前の単語 (と後続の空白) を削除する
    pub fn delete_word_before(&mut self, pos: Position) -> Position {
        self.pending.clear();
        let pos = self.clamp(pos);
        let bytes = self.rows[pos.row].as_bytes();

        let mut start = pos.col;
        while start > 0 {
            let prev = utf8::prev_boundary(bytes, start);
            if !bytes[prev].is_ascii_whitespace() {
                break;
            }
            start = prev;
        }
        while start > 0 {
            let prev = utf8::prev_boundary(bytes, start);
            if bytes[prev].is_ascii_whitespace() {
                break;
            }
            start = prev;
        }

        self.delete_span(pos.row, start, pos.col)
    }

    pub fn delete_to_line_start(&mut self, pos: Position) -> Position {
        self.pending.clear();
        let pos = self.clamp(pos);
        self.delete_span(pos.row, 0, pos.col)
    }

    pub fn delete_to_line_end(&mut self, pos: Position) -> Position {
        self.pending.clear();
        let pos = self.clamp(pos);
        let end = self.rows[pos.row].len();
        self.delete_span(pos.row, pos.col, end)
    }

    /// `start..end` をコードポイント単位で後ろから削除する
    fn delete_span(&mut self, row: usize, start: usize, end: usize) -> Position {
        let line = &mut self.rows[row];
        let mut at = end;
        while at > start {
            at = line.delete_codepoint(at);
        }
        Position::new(row, at)
    }
}
