use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use log::info;

use crate::buffer::Buffer;
use crate::error::{EditorError, Result};

/// 先頭からこのバイト数の中に NUL があればバイナリとみなす
const BINARY_PROBE_LEN: usize = 1024;

/// 読み込み元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Stdin,
}

/// 書き出し先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    File(PathBuf),
    Stdout,
}

impl Sink {
    fn describe(&self) -> String {
        match self {
            Sink::File(path) => path.display().to_string(),
            Sink::Stdout => "standard output".to_string(),
        }
    }
}

pub struct FileIO;

impl FileIO {
    pub fn load(source: &Source) -> Result<Buffer> {
        match source {
            Source::File(path) => Self::open(path),
            Source::Stdin => {
                let mut content = Vec::new();
                io::stdin()
                    .lock()
                    .read_to_end(&mut content)
                    .map_err(|source| EditorError::Load {
                        path: PathBuf::from("<stdin>"),
                        source,
                    })?;
                Self::parse(&content, "<stdin>")
            }
        }
    }

    /// ファイルを開く。存在しない場合は空のバッファ (保存時に作成される)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Buffer> {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(content) => Self::parse(&content, &path.display().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("{} does not exist yet, starting empty", path.display());
                Ok(Buffer::new())
            }
            Err(source) => Err(EditorError::Load {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// バイト列を行に分割する。`\n` と `\r\n` はどちらも行末として取り除く
    pub fn parse(content: &[u8], name: &str) -> Result<Buffer> {
        if content.iter().take(BINARY_PROBE_LEN).any(|&b| b == 0) {
            return Err(EditorError::BinaryInput(name.to_string()));
        }

        let text = String::from_utf8_lossy(content);
        let lines: Vec<String> = text
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        info!("loaded {} lines from {}", lines.len(), name);
        Ok(Buffer::from_lines(lines))
    }

    /// 全行をそれぞれ `\n` 付きで書き出す (空のドキュメントは何も書かない)
    pub fn save(sink: &Sink, buffer: &Buffer) -> Result<()> {
        let result = match sink {
            Sink::File(path) => File::create(path).and_then(|file| {
                let mut writer = BufWriter::new(file);
                Self::write_to(&mut writer, buffer)
            }),
            // stdout は呼び出し元のものなので閉じない
            Sink::Stdout => Self::write_to(&mut io::stdout().lock(), buffer),
        };
        result.map_err(|source| EditorError::Save {
            target: sink.describe(),
            source,
        })?;
        info!("wrote {} lines to {}", buffer.len(), sink.describe());
        Ok(())
    }

    /// 空行 1 つだけのドキュメントは空ファイルとして書く
    pub fn write_to<W: Write>(writer: &mut W, buffer: &Buffer) -> io::Result<()> {
        if buffer.is_empty() {
            return writer.flush();
        }
        for row in buffer.rows() {
            writer.write_all(row.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}
