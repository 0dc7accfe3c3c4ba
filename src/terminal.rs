//! 制御端末の管理
//!
//! 標準入出力はパイプに繋がっていることがあるため、操作はすべて
//! /dev/tty に対して行う。raw モードに入る前の端末属性は
//! シグナルハンドラからも参照できる静的領域に退避しておき、
//! 終了経路 (通常終了・エラー・シグナル) のどれでも復元する。

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd};
use std::ptr;
use std::sync::atomic::{AtomicI32, AtomicPtr, Ordering};

use log::{debug, info, warn};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use nix::sys::termios::{
    self, ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices,
    Termios,
};

use crate::error::{EditorError, Result};

/// 端末への入出力
///
/// `EditSession` と `KeyDecoder` はこの trait 越しに端末を扱う。
pub trait TerminalIo {
    /// 1 バイト読むまでブロックする
    fn read_byte(&mut self) -> Result<u8>;

    /// 入力キューに残っているバイト数
    fn bytes_pending(&self) -> io::Result<usize>;

    /// 書き込みは best-effort。失敗しても呼び出し側には返さない
    fn write_raw(&mut self, bytes: &[u8]);

    /// 元の端末属性に戻す。何度呼んでもよい
    fn restore(&mut self);
}

// シグナルハンドラ用の退避領域
static SAVED_FD: AtomicI32 = AtomicI32::new(-1);
static SAVED_TERMIOS: AtomicPtr<libc::termios> = AtomicPtr::new(ptr::null_mut());

nix::ioctl_read_bad!(fionread, libc::FIONREAD, libc::c_int);

pub struct TerminalSession {
    tty: File,
    /// 起動時の属性。最初の enter_raw_mode で一度だけ取得する
    original: Option<Termios>,
    raw: bool,
}

impl TerminalSession {
    /// 制御端末を開く
    pub fn open() -> Result<Self> {
        let tty = termion::get_tty().map_err(EditorError::TerminalUnavailable)?;
        info!("opened controlling terminal (fd {})", tty.as_raw_fd());
        Ok(Self::from_tty(tty))
    }

    pub fn from_tty(tty: File) -> Self {
        Self {
            tty,
            original: None,
            raw: false,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// raw モードに切り替える
    ///
    /// 属性の退避とシグナルハンドラの登録を済ませてから書き換える。
    pub fn enter_raw_mode(&mut self) -> Result<()> {
        if self.is_raw() {
            return Ok(());
        }

        let original = match &self.original {
            Some(original) => original.clone(),
            None => termios::tcgetattr(self.tty.as_fd()).map_err(|source| {
                EditorError::TerminalConfig {
                    call: "tcgetattr",
                    source,
                }
            })?,
        };

        publish_snapshot(self.tty.as_raw_fd(), &original);
        install_signal_handlers();

        let mut raw = original.clone();
        raw.input_flags.remove(
            InputFlags::BRKINT
                | InputFlags::ICRNL
                | InputFlags::INPCK
                | InputFlags::ISTRIP
                | InputFlags::IXON,
        );
        raw.output_flags.remove(OutputFlags::OPOST);
        raw.control_flags.insert(ControlFlags::CS8);
        raw.local_flags
            .remove(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN | LocalFlags::ISIG);
        // 1 バイト届くまで待つ。タイムアウトなし
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

        if let Err(source) = termios::tcsetattr(self.tty.as_fd(), SetArg::TCSAFLUSH, &raw) {
            clear_snapshot();
            return Err(EditorError::TerminalConfig {
                call: "tcsetattr",
                source,
            });
        }

        self.original = Some(original);
        self.raw = true;
        info!("terminal switched to raw mode");
        Ok(())
    }
}

impl TerminalIo for TerminalSession {
    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.tty.read(&mut byte) {
                Ok(1) => return Ok(byte[0]),
                Ok(_) => {
                    return Err(EditorError::TerminalRead(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "terminal closed",
                    )));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(EditorError::TerminalRead(e)),
            }
        }
    }

    fn bytes_pending(&self) -> io::Result<usize> {
        let mut count: libc::c_int = 0;
        // SAFETY: fd は self.tty が所有しており、count は有効な書き込み先
        unsafe { fionread(self.tty.as_raw_fd(), &mut count) }.map_err(io::Error::from)?;
        Ok(count.max(0) as usize)
    }

    fn write_raw(&mut self, bytes: &[u8]) {
        if let Err(e) = self.tty.write_all(bytes).and_then(|_| self.tty.flush()) {
            debug!("dropped terminal write of {} bytes: {}", bytes.len(), e);
        }
    }

    fn restore(&mut self) {
        let Some(original) = &self.original else {
            return;
        };
        if let Err(e) = termios::tcsetattr(self.tty.as_fd(), SetArg::TCSAFLUSH, original) {
            warn!("failed to restore terminal attributes: {}", e);
        }
        // 退避内容は残す。2 回目以降も同じ属性を再適用するだけ
        if self.raw {
            info!("terminal attributes restored");
        }
        self.raw = false;
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.raw {
            self.restore();
        }
        if SAVED_FD.load(Ordering::SeqCst) == self.tty.as_raw_fd() {
            clear_snapshot();
        }
    }
}

fn publish_snapshot(fd: i32, termios: &Termios) {
    let snapshot: libc::termios = termios.clone().into();
    let fresh = Box::into_raw(Box::new(snapshot));
    SAVED_FD.store(fd, Ordering::SeqCst);
    let old = SAVED_TERMIOS.swap(fresh, Ordering::SeqCst);
    if !old.is_null() {
        // SAFETY: old は publish_snapshot が Box::into_raw で作ったもので、既に公開から外れている
        drop(unsafe { Box::from_raw(old) });
    }
}

fn clear_snapshot() {
    SAVED_FD.store(-1, Ordering::SeqCst);
    let old = SAVED_TERMIOS.swap(ptr::null_mut(), Ordering::SeqCst);
    if !old.is_null() {
        // SAFETY: 同上
        drop(unsafe { Box::from_raw(old) });
    }
}

/// 退避した属性を書き戻す。シグナルハンドラから呼ばれるため割り当てやロックはしない
fn restore_snapshot() {
    let fd = SAVED_FD.load(Ordering::SeqCst);
    let saved = SAVED_TERMIOS.load(Ordering::SeqCst);
    if fd < 0 || saved.is_null() {
        return;
    }
    // SAFETY: saved は clear_snapshot で外されるまで有効。tcsetattr は async-signal-safe
    unsafe {
        libc::tcsetattr(fd, libc::TCSAFLUSH, saved);
    }
}

extern "C" fn handle_termination(signum: libc::c_int) {
    restore_snapshot();
    // 既定の動作に戻して再送し、終了ステータスにシグナルを反映させる
    // SAFETY: signal と raise は async-signal-safe。再送はハンドラを抜けるまで保留される
    unsafe {
        libc::signal(signum, libc::SIG_DFL);
        libc::raise(signum);
    }
}

fn install_signal_handlers() {
    let action = SigAction::new(
        SigHandler::Handler(handle_termination),
        SaFlags::SA_RESETHAND,
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP] {
        // SAFETY: ハンドラは restore_snapshot と signal/raise しか呼ばない
        if let Err(e) = unsafe { sigaction(signal, &action) } {
            warn!("failed to install {} handler: {}", signal, e);
        }
    }
}
