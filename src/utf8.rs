//! UTF-8 の境界判定と表示幅
//!
//! カーソル移動・削除・描画はすべてここを通して
//! コードポイント単位でバイト列を扱う。

use unicode_width::UnicodeWidthChar;

/// `10xxxxxx` 形式の継続バイトか
pub fn is_continuation(byte: u8) -> bool {
    (byte & 0xC0) == 0x80
}

/// 先頭バイトから UTF-8 シーケンス長を求める
///
/// 継続バイトや不正な先頭バイトは 1 として扱う
pub fn sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

/// `offset` から始まるコードポイントの (バイト長, 表示幅) を返す
///
/// `offset` が末尾以降の場合は (0, 0)。
/// 表示幅は制御文字・結合文字が 0、全角が 2、それ以外は 1。
pub fn codepoint_span(bytes: &[u8], offset: usize) -> (usize, usize) {
    if offset >= bytes.len() {
        return (0, 0);
    }

    let len = sequence_len(bytes[offset]).min(bytes.len() - offset);
    let width = match std::str::from_utf8(&bytes[offset..offset + len]) {
        Ok(s) => s.chars().next().and_then(|c| c.width()).unwrap_or(0),
        // 壊れたシーケンスは置換文字 1 桁として描画される
        Err(_) => 1,
    };
    (len, width)
}

/// `offset` 直前のコードポイント境界
pub fn prev_boundary(bytes: &[u8], offset: usize) -> usize {
    let mut pos = offset.min(bytes.len());
    if pos == 0 {
        return 0;
    }
    pos -= 1;
    while pos > 0 && is_continuation(bytes[pos]) {
        pos -= 1;
    }
    pos
}

/// `offset` 直後のコードポイント境界
pub fn next_boundary(bytes: &[u8], offset: usize) -> usize {
    if offset >= bytes.len() {
        return bytes.len();
    }
    let mut pos = offset + 1;
    while pos < bytes.len() && is_continuation(bytes[pos]) {
        pos += 1;
    }
    pos
}

/// `offset` を行内に収め、シーケンスの途中なら先頭まで戻す
pub fn floor_boundary(bytes: &[u8], offset: usize) -> usize {
    let mut pos = offset.min(bytes.len());
    while pos > 0 && pos < bytes.len() && is_continuation(bytes[pos]) {
        pos -= 1;
    }
    pos
}
