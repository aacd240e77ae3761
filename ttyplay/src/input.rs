//! Translation of raw terminal bytes into player commands.

/// Base seek distance in seconds for a single arrow keypress. Up/down and
/// page keys scale this by one and two factors of [`SEEK_SCALE`].
pub const SEEK_BASE_SECS: i64 = 15;
pub const SEEK_SCALE: i64 = 10;

/// An abstract player command decoded from keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    SpeedDouble,
    SpeedHalve,
    SpeedReset,
    TogglePause,
    NextFile,
    PrevFile,
    NextClear,
    PrevClear,
    /// Relative seek by this many seconds, to be scaled by the playback
    /// speed when applied.
    SeekBy(i64),
    SeekToStart,
    SeekToEnd,
}

/// Decode one keypress. `first` is the byte that woke the wait; `next`
/// supplies the remaining bytes of an escape sequence (blocking is fine,
/// terminals emit them back to back). Unknown input decodes to `None` and
/// is silently discarded by the caller.
///
/// Arrow keys arrive as either CSI (`ESC [ x`) or SS3 (`ESC O x`)
/// sequences depending on the terminal's cursor-key mode; both are
/// accepted. Page up/down carry a trailing `~` which is consumed here.
pub fn decode(first: u8, mut next: impl FnMut() -> Option<u8>) -> Option<Command> {
    match first {
        b'+' => Some(Command::SpeedDouble),
        b'-' => Some(Command::SpeedHalve),
        b'1' => Some(Command::SpeedReset),
        b'p' => Some(Command::TogglePause),
        b'q' => Some(Command::Quit),
        b'f' => Some(Command::NextFile),
        b'd' => Some(Command::PrevFile),
        b'c' => Some(Command::NextClear),
        b'x' => Some(Command::PrevClear),
        0x1B => {
            let intro = next()?;
            if intro != b'[' && intro != b'O' {
                return None;
            }
            match next()? {
                b'C' => Some(Command::SeekBy(SEEK_BASE_SECS)),
                b'D' => Some(Command::SeekBy(-SEEK_BASE_SECS)),
                b'B' => Some(Command::SeekBy(SEEK_BASE_SECS * SEEK_SCALE)),
                b'A' => Some(Command::SeekBy(-SEEK_BASE_SECS * SEEK_SCALE)),
                b'6' => {
                    let _ = next(); // trailing '~'
                    Some(Command::SeekBy(SEEK_BASE_SECS * SEEK_SCALE * SEEK_SCALE))
                }
                b'5' => {
                    let _ = next(); // trailing '~'
                    Some(Command::SeekBy(-SEEK_BASE_SECS * SEEK_SCALE * SEEK_SCALE))
                }
                b'H' => Some(Command::SeekToStart),
                b'F' => Some(Command::SeekToEnd),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_bytes(bytes: &[u8]) -> Option<Command> {
        let mut rest = bytes[1..].iter().copied();
        decode(bytes[0], || rest.next())
    }

    #[test]
    fn test_single_byte_commands() {
        assert_eq!(decode_bytes(b"+"), Some(Command::SpeedDouble));
        assert_eq!(decode_bytes(b"-"), Some(Command::SpeedHalve));
        assert_eq!(decode_bytes(b"1"), Some(Command::SpeedReset));
        assert_eq!(decode_bytes(b"p"), Some(Command::TogglePause));
        assert_eq!(decode_bytes(b"q"), Some(Command::Quit));
        assert_eq!(decode_bytes(b"f"), Some(Command::NextFile));
        assert_eq!(decode_bytes(b"d"), Some(Command::PrevFile));
        assert_eq!(decode_bytes(b"c"), Some(Command::NextClear));
        assert_eq!(decode_bytes(b"x"), Some(Command::PrevClear));
    }

    #[test]
    fn test_arrows_follow_ansi_polarity() {
        // Right/down/page-down seek forward, left/up/page-up backward
        assert_eq!(decode_bytes(b"\x1b[C"), Some(Command::SeekBy(15)));
        assert_eq!(decode_bytes(b"\x1b[D"), Some(Command::SeekBy(-15)));
        assert_eq!(decode_bytes(b"\x1b[B"), Some(Command::SeekBy(150)));
        assert_eq!(decode_bytes(b"\x1b[A"), Some(Command::SeekBy(-150)));
        assert_eq!(decode_bytes(b"\x1b[6~"), Some(Command::SeekBy(1500)));
        assert_eq!(decode_bytes(b"\x1b[5~"), Some(Command::SeekBy(-1500)));
    }

    #[test]
    fn test_ss3_variants_accepted() {
        assert_eq!(decode_bytes(b"\x1bOC"), Some(Command::SeekBy(15)));
        assert_eq!(decode_bytes(b"\x1bOA"), Some(Command::SeekBy(-150)));
    }

    #[test]
    fn test_home_and_end() {
        assert_eq!(decode_bytes(b"\x1b[H"), Some(Command::SeekToStart));
        assert_eq!(decode_bytes(b"\x1b[F"), Some(Command::SeekToEnd));
    }

    #[test]
    fn test_unknown_input_is_discarded() {
        assert_eq!(decode_bytes(b"z"), None);
        assert_eq!(decode_bytes(b"\x1b[Z"), None);
        assert_eq!(decode_bytes(b"\x1bXq"), None);
    }

    #[test]
    fn test_incomplete_escape_is_discarded() {
        assert_eq!(decode_bytes(b"\x1b"), None);
        assert_eq!(decode_bytes(b"\x1b["), None);
    }
}
