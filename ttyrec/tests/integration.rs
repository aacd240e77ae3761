use std::io::Write;
use std::path::PathBuf;

use flate2::Compression;
use flate2::write::GzEncoder;

use ttyrec::index::{SessionIndex, build_index};
use ttyrec::timeval::Timeval;

fn record(sec: u32, usec: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&sec.to_le_bytes());
    out.extend_from_slice(&usec.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn write_fixture(dir: &tempfile::TempDir, name: &str, records: &[(u32, u32, &[u8])]) -> PathBuf {
    let path = dir.path().join(name);
    let mut data = Vec::new();
    for (sec, usec, payload) in records {
        data.extend(record(*sec, *usec, payload));
    }
    std::fs::write(&path, data).unwrap();
    path
}

/// The invariants every well-formed index upholds: strictly increasing
/// record offsets within a file, non-decreasing elapsed across the global
/// chain.
fn assert_index_invariants(index: &SessionIndex) {
    for pair in index.clears.windows(2) {
        assert!(pair[0].elapsed <= pair[1].elapsed, "elapsed went backwards");
        if pair[0].file == pair[1].file {
            assert!(
                pair[0].record_offset < pair[1].record_offset,
                "record offsets not strictly increasing within a file"
            );
        }
    }
}

#[test]
fn test_index_two_payload_session() {
    // {t=0, "hi"}, {t=1, ESC[2J "cls"}, {t=2, "end"}
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        "session.tty",
        &[
            (1000, 0, b"hi"),
            (1001, 0, b"\x1b[2Jcls"),
            (1002, 0, b"end"),
        ],
    );

    let index = build_index(&[path]).unwrap();
    assert_index_invariants(&index);

    assert_eq!(index.files.len(), 1);
    assert_eq!(index.files[0].records, 3);
    assert_eq!(index.files[0].elapsed_at_end, Timeval::new(2, 0));

    assert_eq!(index.clears.len(), 1);
    assert_eq!(index.clears[0].elapsed, Timeval::new(1, 0));
    assert_eq!(index.clears[0].record_offset, 14);

    // Seeking to 1.5 lands on that entry
    assert_eq!(index.locate(Timeval::new(1, 500_000)), Some(0));
}

#[test]
fn test_index_spans_files_in_argument_order() {
    let dir = tempfile::tempdir().unwrap();
    // File A: clear at global t=3; file B: clear at global t=7
    let a = write_fixture(
        &dir,
        "a.tty",
        &[(100, 0, b"start"), (103, 0, b"\x1b[2J"), (104, 0, b"tail")],
    );
    let b = write_fixture(
        &dir,
        "b.tty",
        &[(900, 0, b"other"), (903, 0, b"\x1b[2J")],
    );

    let index = build_index(&[a, b]).unwrap();
    assert_index_invariants(&index);

    assert_eq!(index.files[0].elapsed_at_end, Timeval::new(4, 0));
    assert_eq!(index.files[1].elapsed_at_end, Timeval::new(7, 0));
    assert_eq!(index.duration(), Timeval::new(7, 0));

    assert_eq!(index.clears.len(), 2);
    assert_eq!(index.clears[0].file, 0);
    assert_eq!(index.clears[0].elapsed, Timeval::new(3, 0));
    assert_eq!(index.clears[1].file, 1);
    assert_eq!(index.clears[1].elapsed, Timeval::new(7, 0));

    assert_eq!(index.files[0].first_clear, Some(0));
    assert_eq!(index.files[1].first_clear, Some(1));
}

#[test]
fn test_file_with_no_clears_between_neighbours() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_fixture(&dir, "a.tty", &[(0, 0, b"\x1b[2J"), (2, 0, b"x")]);
    let b = write_fixture(&dir, "b.tty", &[(50, 0, b"plain"), (55, 0, b"text")]);
    let c = write_fixture(&dir, "c.tty", &[(80, 0, b"\x1b[2J")]);

    let index = build_index(&[a, b, c]).unwrap();
    assert_index_invariants(&index);

    assert!(index.files[1].first_clear.is_none());
    assert!(index.files[1].last_clear.is_none());

    // A target inside file B's time range resolves to a neighbour's entry
    let mid_b = Timeval::new(5, 0);
    assert!(mid_b < index.files[1].elapsed_at_end);
    assert_eq!(index.locate(mid_b), Some(0));
    assert_eq!(index.last_clear_before_file(2), Some(0));
}

#[test]
fn test_gzipped_recording() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.tty.gz");

    let mut raw = Vec::new();
    raw.extend(record(10, 0, b"one"));
    raw.extend(record(12, 500_000, b"\x1b[2Jtwo"));

    let file = std::fs::File::create(&path).unwrap();
    let mut enc = GzEncoder::new(file, Compression::default());
    enc.write_all(&raw).unwrap();
    enc.finish().unwrap();

    let index = build_index(&[path]).unwrap();
    assert_eq!(index.files[0].records, 2);
    assert_eq!(index.clears.len(), 1);
    assert_eq!(index.clears[0].elapsed, Timeval::new(2, 500_000));
}

#[test]
fn test_truncated_recording_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.tty");
    let mut data = record(0, 0, b"abcdef");
    data.truncate(data.len() - 2);
    std::fs::write(&path, data).unwrap();

    assert!(build_index(&[path]).is_err());
}

#[test]
fn test_missing_file_is_rejected() {
    let missing = PathBuf::from("/nonexistent/recording.tty");
    assert!(build_index(&[missing]).is_err());
}

#[test]
fn test_index_serialises_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "s.tty", &[(0, 0, b"\x1b[2J")]);
    let index = build_index(&[path]).unwrap();

    let json = serde_json::to_string(&index).unwrap();
    assert!(json.contains("\"clears\""));
    assert!(json.contains("\"record_offset\":0"));
}
