use chrono::SecondsFormat;
use clap::Parser;

use ttyrec::index::{SessionIndex, build_index};
use ttyrec::timeval::Timeval;

#[derive(Parser)]
#[command(name = "ttyrec-info", about = "Parse and display ttyrec recording structure")]
struct Args {
    /// Input ttyrec files, indexed in the given order
    #[arg(required_unless_present_any = ["schema", "version"])]
    files: Vec<String>,

    /// Output the session index as JSON
    #[arg(long)]
    json: bool,

    /// Print the JSON schema for the output format and exit
    #[arg(long)]
    schema: bool,

    /// Display version and quit
    #[arg(long)]
    version: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Reset SIGPIPE to default so piped output (e.g. head/tail) exits cleanly
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let args = Args::parse();

    if args.version {
        ttyrec::version::print_cli_version_banner(
            "ttyrec-info",
            env!("CARGO_PKG_VERSION"),
            env!("RELEASE_VERSION"),
            env!("GIT_COMMIT"),
        );
        return Ok(());
    }

    if args.schema {
        let schema = schemars::schema_for!(SessionIndex);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let index = build_index(&args.files)?;

    if args.json {
        println!("{}", serde_json::to_string(&index)?);
        return Ok(());
    }

    print_files(&index);
    if !index.clears.is_empty() {
        println!();
        print_clears(&index);
    }

    println!();
    println!(
        "Session: {} file(s), {} clear screen(s), {}s",
        index.files.len(),
        index.clears.len(),
        index.duration()
    );

    Ok(())
}

fn print_files(index: &SessionIndex) {
    println!(
        "{:>4} {:>8} {:>7} {:>14} {:>25}  {}",
        "IDX", "RECORDS", "CLEARS", "DURATION", "START", "FILE"
    );
    for (idx, file) in index.files.iter().enumerate() {
        let clears = index.clears.iter().filter(|c| c.file == idx).count();
        let duration = file.elapsed_at_end - index.file_base_elapsed(idx);
        println!(
            "{:>4} {:>8} {:>7} {:>14} {:>25}  {}",
            idx,
            file.records,
            clears,
            duration.to_string(),
            start_timecode(file.start_timestamp),
            file.path.display()
        );
    }
}

fn print_clears(index: &SessionIndex) {
    println!(
        "{:>4} {:>4} {:>12} {:>12} {:>14}",
        "IDX", "FILE", "RECORD_OFF", "MARKER_OFF", "ELAPSED"
    );
    for (idx, clear) in index.clears.iter().enumerate() {
        println!(
            "{:>4} {:>4} {:>12} {:>12} {:>14}",
            idx,
            clear.file,
            clear.record_offset,
            clear.marker_offset,
            clear.elapsed.to_string()
        );
    }
}

/// Render a record timestamp as a wall-clock timecode. Recording
/// timestamps are capture-time epoch values; this is the one place they
/// are interpreted as absolute time.
fn start_timecode(timestamp: Option<Timeval>) -> String {
    timestamp
        .and_then(|t| chrono::DateTime::from_timestamp(t.sec, (t.usec * 1_000) as u32))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "-".to_string())
}
