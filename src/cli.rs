use std::path::PathBuf;

use clap::Parser;

use crate::error::{EditorError, Result};

#[derive(Parser, Debug)]
#[command(name = "slit")]
#[command(about = "Edit a file one line at a time from the terminal, even inside a pipe", long_about = None)]
#[command(version)]
pub struct Args {
    /// File to edit, optionally with a start line (+N or N)
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,

    /// Append diagnostics to this file (overrides SLIT_LOG)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// 引数を解釈した結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// None はパイプモード (stdin → stdout)
    pub path: Option<PathBuf>,
    /// 0 始まりの開始行
    pub start_line: usize,
}

impl Args {
    /// ファイル名と開始行を決める
    ///
    /// `+N` は常に開始行。数字だけの引数は、他にファイル名になる引数が無く
    /// stdin が端末ならファイル名、それ以外は開始行として扱う。
    pub fn invocation(&self, stdin_is_tty: bool) -> Result<Invocation> {
        let mut plus_line = None;
        let mut names = Vec::new();
        let mut numbers = Vec::new();

        for arg in &self.args {
            if let Some(rest) = arg.strip_prefix('+')
                && let Ok(n) = rest.parse::<usize>()
            {
                plus_line = Some(n);
            } else if !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit()) {
                numbers.push(arg.clone());
            } else {
                names.push(arg.clone());
            }
        }

        let mut path = names.pop();
        if path.is_none() && stdin_is_tty {
            path = numbers.pop();
        }

        let line = plus_line.or_else(|| numbers.first().and_then(|n| n.parse().ok()));

        if path.is_none() && stdin_is_tty {
            return Err(EditorError::Usage(
                "Usage: slit [+line] filename  (or pipe data through stdin)".to_string(),
            ));
        }

        Ok(Invocation {
            path: path.map(PathBuf::from),
            start_line: line.map(|n: usize| n.saturating_sub(1)).unwrap_or(0),
        })
    }
}
