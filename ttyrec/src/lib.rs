//! Parsing, timing and navigation support for ttyrec terminal-session
//! recordings.
//!
//! A ttyrec file is a plain concatenation of records, each a 12-byte
//! little-endian header (seconds, microseconds, payload length) followed by
//! the raw bytes that were written to the recorded pseudo-terminal. This
//! crate decodes that stream ([`record`]), does the `(seconds, microseconds)`
//! arithmetic playback depends on ([`timeval`]), and builds a
//! time-addressable index of clear-screen points spanning a whole sequence
//! of recordings ([`index`]) so a player can seek and jump without
//! interpreting terminal output.

pub mod error;
pub mod index;
pub mod reader;
pub mod record;
pub mod timeval;
pub mod version;
