use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::StatsError;
use crate::memory::MemoryMonitor;
use crate::metrics::{MetricRow, CSV_HEADER};
use crate::network::NetworkMonitor;
use crate::recorder::Recorder;

// ─── File names ──────────────────────────────────────────────────

pub const FRAME_METRICS_FILE: &str = "frame_metrics.csv";
pub const FRAME_PLOTTING_FILE: &str = "frame_for_plotting.csv";
pub const EVENT_METRICS_FILE: &str = "event_metrics.csv";
pub const EVENT_PLOTTING_FILE: &str = "event_for_plotting.csv";
pub const MEMORY_METRICS_FILE: &str = "memory_metrics.txt";
pub const MEMORY_PLOTTING_FILE: &str = "memory_for_plotting.csv";
pub const NETWORK_METRICS_FILE: &str = "network.txt";
pub const NETWORK_CSV_FILE: &str = "network.csv";

/// Terminator written after every report block, so successive dumps
/// appended to one file can be split apart again.
pub const DUMP_TERMINATOR: &str = "!";

// ─── Writers ─────────────────────────────────────────────────────

fn io_error(path: &Path, source: std::io::Error) -> StatsError {
    StatsError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Append one `header / rows / !` block to the metrics report at `path`.
pub fn append_report(path: &Path, rows: &[MetricRow]) -> Result<(), StatsError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_error(path, e))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{CSV_HEADER}").map_err(|e| io_error(path, e))?;
    for row in rows {
        writeln!(out, "{}", row.csv_line()).map_err(|e| io_error(path, e))?;
    }
    writeln!(out, "{DUMP_TERMINATOR}").map_err(|e| io_error(path, e))?;
    out.flush().map_err(|e| io_error(path, e))
}

/// Rewrite a raw-sample CSV from scratch: header line plus pre-rendered
/// body rows. An empty body leaves just the header.
pub fn write_samples_csv(path: &Path, header: &str, body: &str) -> Result<(), StatsError> {
    let file = std::fs::File::create(path).map_err(|e| io_error(path, e))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{header}").map_err(|e| io_error(path, e))?;
    out.write_all(body.as_bytes()).map_err(|e| io_error(path, e))?;
    out.flush().map_err(|e| io_error(path, e))
}

// ─── Per-domain dumps ────────────────────────────────────────────

/// Dump one recorder: append its report block and rewrite its plotting CSV
/// from the retained spans (one row per leaf sample).
pub fn dump_recorder(
    dir: &Path,
    recorder: &Recorder,
    metrics_file: &str,
    plotting_file: &str,
) -> Result<(), StatsError> {
    append_report(&dir.join(metrics_file), &recorder.report().rows)?;

    let mut body = String::new();
    for span in recorder.retained_spans() {
        span.write_plotting_rows(span.start_ms(), &mut body);
    }
    write_samples_csv(&dir.join(plotting_file), "timestamp,task,len", &body)
}

pub fn dump_memory(dir: &Path, monitor: &MemoryMonitor) -> Result<(), StatsError> {
    append_report(&dir.join(MEMORY_METRICS_FILE), &monitor.report())?;

    let mut body = String::new();
    for usage in monitor.usages() {
        body.push_str(&usage.csv_rows());
    }
    write_samples_csv(&dir.join(MEMORY_PLOTTING_FILE), "timestamp,type,value", &body)
}

pub fn dump_network(dir: &Path, monitor: &NetworkMonitor) -> Result<(), StatsError> {
    append_report(&dir.join(NETWORK_METRICS_FILE), &monitor.report())?;

    let mut body = String::new();
    for packet in monitor.packets() {
        body.push_str(&packet.csv_row());
    }
    write_samples_csv(&dir.join(NETWORK_CSV_FILE), "timestamp,bytes", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::EpochClock;

    #[test]
    fn report_blocks_append_and_terminate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let rows = vec![MetricRow {
            name: "Average".into(),
            params: String::new(),
            unit: "ms".into(),
            value: 7,
        }];
        append_report(&path, &rows).unwrap();
        append_report(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Name,Params,Measurement Unit,Value\nAverage,,ms,7\n!\n\
             Name,Params,Measurement Unit,Value\nAverage,,ms,7\n!\n"
        );
    }

    #[test]
    fn samples_csv_is_rewritten_not_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        write_samples_csv(&path, "timestamp,bytes", "1,10\n2,20\n").unwrap();
        write_samples_csv(&path, "timestamp,bytes", "3,30\n").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "timestamp,bytes\n3,30\n");
    }

    #[test]
    fn empty_sample_log_leaves_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_samples_csv(&path, "timestamp,task,len", "").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "timestamp,task,len\n"
        );
    }

    #[test]
    fn unwritable_path_surfaces_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new("frame update loop", EpochClock::new(), Vec::new());
        let missing = dir.path().join("no-such-subdir");
        let err = dump_recorder(&missing, &recorder, "m.csv", "p.csv").unwrap_err();
        assert!(matches!(err, StatsError::Io { .. }));
    }
}
