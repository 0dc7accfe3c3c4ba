use crate::buffer::Buffer;
use crate::utf8;

/// バッファ上の位置 (行, バイトオフセット)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// 編集カーソル
///
/// `col` はバイトオフセットで、常にコードポイント境界を指す。
/// 画面上の桁は `Screen::cursor_to_column` で別途求める。
pub struct Cursor {
    pos: Position,
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

impl Cursor {
    pub fn new() -> Self {
        Self {
            pos: Position::default(),
        }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn row(&self) -> usize {
        self.pos.row
    }

    pub fn col(&self) -> usize {
        self.pos.col
    }

    /// 編集操作の戻り値をそのまま反映する
    pub fn set(&mut self, pos: Position, buffer: &Buffer) {
        self.pos = buffer.clamp(pos);
    }

    pub fn move_left(&mut self, buffer: &Buffer) {
        let bytes = buffer.row_bytes(self.pos.row);
        self.pos.col = utf8::prev_boundary(bytes, self.pos.col);
    }

    pub fn move_right(&mut self, buffer: &Buffer) {
        let bytes = buffer.row_bytes(self.pos.row);
        self.pos.col = utf8::next_boundary(bytes, self.pos.col);
    }

    pub fn move_up(&mut self, buffer: &Buffer) {
        if self.pos.row > 0 {
            self.pos = buffer.clamp(Position::new(self.pos.row - 1, self.pos.col));
        }
    }

    pub fn move_down(&mut self, buffer: &Buffer) {
        if self.pos.row + 1 < buffer.len() {
            self.pos = buffer.clamp(Position::new(self.pos.row + 1, self.pos.col));
        }
    }

    pub fn move_line_start(&mut self) {
        self.pos.col = 0;
    }

    pub fn move_line_end(&mut self, buffer: &Buffer) {
        self.pos.col = buffer.row_bytes(self.pos.row).len();
    }
}
