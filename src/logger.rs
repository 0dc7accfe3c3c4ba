//! ログ出力の初期化
//!
//! 画面は編集中の端末、stdout/stdin はデータのパイプになりうるため、
//! ログはファイルにだけ書く。ファイルが指定されなければ何もしない。

use std::env;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

/// ログファイルのパス
pub const LOG_FILE_ENV: &str = "SLIT_LOG";
/// env_logger 形式のフィルタ
pub const LOG_LEVEL_ENV: &str = "SLIT_LOG_LEVEL";

/// `--log-file` か `SLIT_LOG` で指定されたファイルを返す
pub fn log_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    cli_path
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(LOG_FILE_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))
}

pub fn init(path: Option<&Path>) -> io::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_LEVEL_ENV, "debug"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .init();
    log::info!("logging to {}", path.display());
    Ok(())
}
