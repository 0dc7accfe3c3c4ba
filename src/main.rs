use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use slit::cli::Args;
use slit::editor::EditSession;
use slit::file_io::{FileIO, Sink, Source};
use slit::logger;
use slit::terminal::TerminalSession;

fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = logger::log_path(args.log_file.as_deref());
    logger::init(log_path.as_deref()).context("failed to open log file")?;

    let invocation = args.invocation(io::stdin().is_terminal())?;

    // 端末が無ければ入力を読む前に失敗させる
    let mut terminal = TerminalSession::open()?;

    let (source, sink) = match &invocation.path {
        Some(path) => (Source::File(path.clone()), Sink::File(path.clone())),
        None => (Source::Stdin, Sink::Stdout),
    };
    let buffer = FileIO::load(&source)?;

    terminal.enter_raw_mode()?;

    // セッションは run の後で drop され、どの経路でも端末が戻ってからエラーを表示する
    let result = {
        let mut session = EditSession::new(terminal, buffer, sink, invocation.start_line);
        session.run()
    };
    result?;

    info!("session finished");
    Ok(())
}
