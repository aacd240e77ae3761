mod input;
mod peek;
mod player;
mod seek;
mod term;
mod wait;

use std::io::{self, IsTerminal};
use std::path::Path;

use clap::Parser;

use crate::player::{Player, Speed};
use crate::term::Charset;
use crate::wait::Pacer;

/// Interactive player for ttyrec terminal session recordings.
///
/// Plays one or more recordings in order, honouring the original
/// inter-record delays. During playback: +/-/1 adjust speed, p pauses,
/// arrows and page keys seek, f/d jump between files, c/x jump between
/// clear screens, Home/End jump to the start/end, q quits.
#[derive(Parser)]
#[command(name = "ttyplay")]
struct Args {
    /// Initial playback speed multiplier
    #[arg(short = 's', default_value_t = 1.0)]
    speed: f64,

    /// No-wait mode: emit records back to back without pacing
    #[arg(short = 'n')]
    no_wait: bool,

    /// Peek mode: skip existing records, then follow the last file live
    #[arg(short = 'p')]
    peek: bool,

    /// Select the UTF-8 terminal character set before playback
    #[arg(short = 'u', conflicts_with = "eight_bit")]
    utf8: bool,

    /// Select the 8-bit terminal character set before playback
    #[arg(short = '8')]
    eight_bit: bool,

    /// Display version and quit
    #[arg(long)]
    version: bool,

    /// Input ttyrec files, played in command-line order; stdin when omitted
    files: Vec<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<i32, Box<dyn std::error::Error>> {
    if args.version {
        ttyrec::version::print_cli_version_banner(
            "ttyplay",
            env!("CARGO_PKG_VERSION"),
            env!("RELEASE_VERSION"),
            env!("GIT_COMMIT"),
        );
        return Ok(0);
    }

    if !(args.speed > 0.0) {
        return Err("speed must be a positive number".into());
    }

    term::install_sigint_handler()?;

    let charset = if args.utf8 {
        Some(Charset::Utf8)
    } else if args.eight_bit {
        Some(Charset::EightBit)
    } else {
        None
    };
    if let Some(cs) = charset {
        term::select_charset(&mut io::stdout(), cs)?;
    }

    if args.peek {
        let Some(last) = args.files.last() else {
            return Err("peek mode requires at least one file".into());
        };
        peek::follow(Path::new(last), &mut io::stdout().lock())?;
        return Ok(exit_code());
    }

    let speed = Speed::Running(args.speed);
    let out = io::stdout().lock();

    if args.files.is_empty() {
        // Recording piped in: not seekable, not indexable, and the
        // descriptor cannot double as a keyboard
        let pacer = (!args.no_wait).then(|| Pacer::new(false));
        let mut player = Player::over_stdin(out, speed, pacer);
        player.play()?;
    } else {
        let index = ttyrec::index::build_index(&args.files)
            .map_err(|e| format!("cannot index recording: {e}"))?;

        let interactive = !args.no_wait && io::stdin().is_terminal();
        let _raw = if interactive {
            Some(term::RawGuard::new()?)
        } else {
            None
        };

        let pacer = (!args.no_wait).then(|| Pacer::new(interactive));
        let mut player = Player::over_files(&index, out, speed, pacer)?;
        player.play()?;
    }

    Ok(exit_code())
}

fn exit_code() -> i32 {
    if term::interrupted() { 130 } else { 0 }
}
