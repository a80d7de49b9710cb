//! `log_errors` probe: recent error density in the service log.
//!
//! The tail of the log is matched against a fixed keyword set. Of the
//! matching lines, only the last [`MAX_CONSIDERED`] are looked at, and of
//! those only the ones stamped within the last [`RECENT_WINDOW_MINUTES`]
//! count. A line whose timestamp cannot be parsed counts as recent, so an
//! unfamiliar log format errs toward alerting.

use std::io::SeekFrom;
use std::path::Path;

use chrono::{NaiveDateTime, TimeDelta};
use regex::Regex;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use healthwatch_core::config::LogCheckConfig;
use healthwatch_core::{Details, ProbeVerdict};

use crate::evaluator::Probe;

/// Lines matching this pattern are error lines.
pub const ERROR_KEYWORDS: &str = "ERROR|CRITICAL|FATAL|Exception|Traceback";

/// Errors older than this are ignored.
pub const RECENT_WINDOW_MINUTES: i64 = 5;

/// Only the most recent error lines are checked for recency.
pub const MAX_CONSIDERED: usize = 10;

/// The tail is read backwards in chunks of this size.
const CHUNK_BYTES: u64 = 64 * 1024;

/// Upper bound on how much of the file end is read to find the tail.
const MAX_TAIL_BYTES: u64 = 8 * 1024 * 1024;

/// Scan the tail of `config.path`, judging recency against `now` (local time,
/// which is what the log's own timestamps are written in).
pub async fn probe(config: &LogCheckConfig, now: NaiveDateTime) -> ProbeVerdict {
    let name = Probe::LogErrors.name();

    let tail = match read_tail(&config.path, config.tail_lines, MAX_TAIL_BYTES).await {
        Ok(Some(tail)) => tail,
        Ok(None) => {
            let mut detail = Details::new();
            detail.insert("message".into(), json!("Log file not found"));
            return ProbeVerdict::new(name, true, detail);
        }
        Err(e) => {
            return ProbeVerdict::errored(name, format!("reading {}: {e}", config.path.display()));
        }
    };

    let error_lines = match find_error_lines(&tail.lines) {
        Ok(found) => found,
        Err(e) => return ProbeVerdict::errored(name, e),
    };
    let recent = recent_errors(&error_lines, now);

    let mut detail = Details::new();
    detail.insert("recent_errors".into(), json!(recent));
    detail.insert("total_errors_checked".into(), json!(error_lines.len()));
    if tail.truncated {
        detail.insert("tail_truncated".into(), json!(true));
    }
    ProbeVerdict::new(name, recent.is_empty(), detail)
}

/// Lines containing any of the error keywords, trimmed.
pub fn find_error_lines(lines: &[String]) -> Result<Vec<&str>, regex::Error> {
    let keywords = Regex::new(ERROR_KEYWORDS)?;
    Ok(lines
        .iter()
        .filter(|line| keywords.is_match(line))
        .map(|line| line.trim())
        .collect())
}

/// The subset of the last [`MAX_CONSIDERED`] error lines that are recent.
pub fn recent_errors<'a>(error_lines: &[&'a str], now: NaiveDateTime) -> Vec<&'a str> {
    let window = TimeDelta::minutes(RECENT_WINDOW_MINUTES);
    let start = error_lines.len().saturating_sub(MAX_CONSIDERED);
    error_lines[start..]
        .iter()
        .copied()
        .filter(|line| match parse_log_timestamp(line) {
            Some(stamp) => now - stamp < window,
            None => true,
        })
        .collect()
}

/// Parse the `YYYY-MM-DD HH:MM:SS,fff - ...` prefix of a log line.
///
/// The fraction after the comma may have one to six digits.
pub fn parse_log_timestamp(line: &str) -> Option<NaiveDateTime> {
    let stamp = line.split(" - ").next()?.trim();
    let (seconds, fraction) = stamp.split_once(',')?;
    let base = NaiveDateTime::parse_from_str(seconds, "%Y-%m-%d %H:%M:%S").ok()?;

    if fraction.is_empty() || fraction.len() > 6 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let micros: i64 = format!("{fraction:0<6}").parse().ok()?;
    Some(base + TimeDelta::microseconds(micros))
}

/// The end of a log file.
struct Tail {
    lines: Vec<String>,
    /// Fewer lines than requested were found within the byte bound.
    truncated: bool,
}

/// Last `n` lines of the file, reading at most `max_bytes` from its end, or
/// `None` if it does not exist.
async fn read_tail(path: &Path, n: usize, max_bytes: u64) -> std::io::Result<Option<Tail>> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let len = file.metadata().await?.len();
    let floor = len.saturating_sub(max_bytes);
    let mut start = len;
    let mut buf: Vec<u8> = Vec::new();

    loop {
        let found = String::from_utf8_lossy(whole_lines(&buf, start == 0))
            .lines()
            .count();
        if found >= n || start <= floor {
            break;
        }
        let next = start.saturating_sub(CHUNK_BYTES).max(floor);
        let mut chunk = vec![0u8; (start - next) as usize];
        file.seek(SeekFrom::Start(next)).await?;
        file.read_exact(&mut chunk).await?;
        chunk.extend_from_slice(&buf);
        buf = chunk;
        start = next;
    }

    let text = String::from_utf8_lossy(whole_lines(&buf, start == 0));
    let lines: Vec<&str> = text.lines().collect();
    let truncated = start > 0 && lines.len() < n;
    let skip = lines.len().saturating_sub(n);
    Ok(Some(Tail {
        lines: lines[skip..].iter().map(|l| l.to_string()).collect(),
        truncated,
    }))
}

/// The part of `buf` made of complete lines. Unless `buf` starts at the
/// beginning of the file, its first line may be cut and is skipped.
fn whole_lines(buf: &[u8], from_file_start: bool) -> &[u8] {
    if from_file_start {
        return buf;
    }
    match buf.iter().position(|&b| b == b'\n') {
        Some(i) => &buf[i + 1..],
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-06-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn stamped(ago: TimeDelta, text: &str) -> String {
        format!("{} - api - {text}", (now() - ago).format("%Y-%m-%d %H:%M:%S,%3f"))
    }

    fn config(path: PathBuf) -> LogCheckConfig {
        LogCheckConfig {
            enabled: true,
            path,
            tail_lines: 100,
        }
    }

    #[test]
    fn parses_python_logging_timestamp() {
        let ts = parse_log_timestamp("2024-06-01 11:58:30,250 - api - ERROR boom").unwrap();
        assert_eq!(ts.format("%H:%M:%S%.3f").to_string(), "11:58:30.250");
    }

    #[test]
    fn rejects_lines_without_timestamp() {
        assert!(parse_log_timestamp("Traceback (most recent call last):").is_none());
        assert!(parse_log_timestamp("2024-06-01 11:58:30 - no fraction").is_none());
        assert!(parse_log_timestamp("2024-06-01 11:58:30,abc - bad").is_none());
    }

    #[test]
    fn ten_minute_old_error_is_not_recent() {
        let line = stamped(TimeDelta::minutes(10), "ERROR database down");
        assert!(recent_errors(&[line.as_str()], now()).is_empty());
    }

    #[test]
    fn one_minute_old_error_is_recent() {
        let line = stamped(TimeDelta::minutes(1), "ERROR database down");
        assert_eq!(recent_errors(&[line.as_str()], now()), vec![line.as_str()]);
    }

    #[test]
    fn unparseable_timestamp_counts_as_recent() {
        let lines = ["Traceback (most recent call last):"];
        assert_eq!(recent_errors(&lines, now()), lines.to_vec());
    }

    #[test]
    fn only_last_ten_errors_are_considered() {
        let mut owned = vec!["no timestamp ERROR early".to_string()];
        owned.extend((0..MAX_CONSIDERED).map(|_| stamped(TimeDelta::hours(1), "ERROR old")));
        let lines: Vec<&str> = owned.iter().map(String::as_str).collect();

        // The unparseable line would count as recent, but it is the 11th from the end.
        assert!(recent_errors(&lines, now()).is_empty());
    }

    #[test]
    fn keyword_matching() {
        let lines: Vec<String> = [
            "INFO all good",
            "  ValueError: Exception raised  ",
            "FATAL crash",
            "debug: error in lowercase",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(
            find_error_lines(&lines).unwrap(),
            vec!["ValueError: Exception raised", "FATAL crash"]
        );
    }

    #[tokio::test]
    async fn missing_log_file_passes() {
        let dir = tempfile::tempdir().unwrap();
        let v = probe(&config(dir.path().join("absent.log")), now()).await;
        assert!(v.ok);
        assert_eq!(v.detail["message"], "Log file not found");
    }

    #[tokio::test]
    async fn recent_error_in_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.log");
        let content = [
            stamped(TimeDelta::minutes(10), "ERROR stale failure"),
            stamped(TimeDelta::minutes(2), "INFO request served"),
            stamped(TimeDelta::minutes(1), "ERROR fresh failure"),
        ]
        .join("\n");
        std::fs::write(&path, content).unwrap();

        let v = probe(&config(path), now()).await;
        assert!(!v.ok);
        assert_eq!(v.detail["total_errors_checked"], 2);
        let recent = v.detail["recent_errors"].as_array().unwrap();
        assert_eq!(recent.len(), 1);
        assert!(recent[0].as_str().unwrap().contains("fresh failure"));
    }

    #[tokio::test]
    async fn old_errors_only_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.log");
        std::fs::write(&path, stamped(TimeDelta::minutes(30), "CRITICAL long ago")).unwrap();

        let v = probe(&config(path), now()).await;
        assert!(v.ok);
        assert_eq!(v.detail["total_errors_checked"], 1);
    }

    fn long_line(tag: char) -> String {
        format!("{tag}{}", "x".repeat(100_000))
    }

    #[tokio::test]
    async fn long_lines_are_read_across_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.log");
        let content: String = ['a', 'b', 'c', 'd'].map(|c| long_line(c) + "\n").concat();
        std::fs::write(&path, content).unwrap();

        let tail = read_tail(&path, 3, MAX_TAIL_BYTES).await.unwrap().unwrap();
        assert!(!tail.truncated);
        assert_eq!(tail.lines, vec![long_line('b'), long_line('c'), long_line('d')]);
    }

    #[tokio::test]
    async fn chunk_starting_on_a_line_break_keeps_every_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.log");
        let line = |c: char| c.to_string().repeat(CHUNK_BYTES as usize - 1);
        let content: String = ['a', 'b', 'c'].map(|c| line(c) + "\n").concat();
        std::fs::write(&path, content).unwrap();

        let tail = read_tail(&path, 2, MAX_TAIL_BYTES).await.unwrap().unwrap();
        assert_eq!(tail.lines, vec![line('b'), line('c')]);
    }

    #[tokio::test]
    async fn byte_bound_marks_tail_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.log");
        let content: String = ['a', 'b', 'c'].map(|c| long_line(c) + "\n").concat();
        std::fs::write(&path, content).unwrap();

        let tail = read_tail(&path, 3, 150_000).await.unwrap().unwrap();
        assert!(tail.truncated);
        assert_eq!(tail.lines, vec![long_line('c')]);
    }

    #[tokio::test]
    async fn only_tail_is_scanned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.log");
        let mut lines = vec!["ERROR outside the tail".to_string()];
        lines.extend((0..5).map(|i| format!("INFO line {i}")));
        std::fs::write(&path, lines.join("\n")).unwrap();

        let mut cfg = config(path);
        cfg.tail_lines = 5;
        let v = probe(&cfg, now()).await;
        assert!(v.ok);
        assert_eq!(v.detail["total_errors_checked"], 0);
    }
}
