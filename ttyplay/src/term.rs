//! Terminal raw mode, character-set selection and SIGINT handling.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use nix::sys::termios::{
    InputFlags, LocalFlags, SetArg, SpecialCharacterIndices, Termios, tcgetattr, tcsetattr,
};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_: nix::libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// True once SIGINT has been delivered. The handler only sets this flag;
/// the interrupted wait returns EINTR and the playback loop unwinds
/// normally, so terminal attributes are restored before exit.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Route SIGINT through the flag instead of the default abort. SA_RESTART
/// is deliberately left off so a pending `ppoll` is interrupted.
pub fn install_sigint_handler() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_sigint),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGINT, &action) }.map(|_| ())
}

/// Puts the controlling terminal into a raw-like mode for single-byte
/// reads: canonical mode and echo off, newline translation off,
/// `VMIN=1, VTIME=0`. The saved attributes are reinstated exactly on drop,
/// which covers normal return, error propagation and panic.
pub struct RawGuard {
    saved: Termios,
}

impl RawGuard {
    pub fn new() -> nix::Result<Self> {
        let stdin = io::stdin();
        let saved = tcgetattr(&stdin)?;

        let mut raw = saved.clone();
        raw.local_flags &= !(LocalFlags::ICANON | LocalFlags::ECHO);
        raw.input_flags &= !(InputFlags::ICRNL | InputFlags::INLCR);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        tcsetattr(&stdin, SetArg::TCSANOW, &raw)?;

        Ok(RawGuard { saved })
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        // Nothing useful can be done about a failure here
        let _ = tcsetattr(&io::stdin(), SetArg::TCSANOW, &self.saved);
    }
}

/// Terminal character mapping selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    EightBit,
}

/// Emit the ISO 2022 escape that switches the terminal's character
/// mapping: `ESC % G` for UTF-8, `ESC % @` for the 8-bit set.
pub fn select_charset(out: &mut impl Write, charset: Charset) -> io::Result<()> {
    match charset {
        Charset::Utf8 => out.write_all(b"\x1b%G")?,
        Charset::EightBit => out.write_all(b"\x1b%@")?,
    }
    out.flush()
}
