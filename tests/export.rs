use std::fs;
use std::path::Path;
use std::time::Duration;

use framestats::{StatsConfig, StatsContext};

fn test_config(dir: &Path) -> StatsConfig {
    StatsConfig {
        output_dir: dir.to_path_buf(),
        dump_interval: Duration::from_secs(60),
        memory_sample_period: Duration::from_secs(1),
        retain_threshold_ms: 0,
    }
}

#[test]
fn empty_logs_dump_header_only_sample_csvs() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = StatsContext::new(test_config(dir.path())).unwrap();
    ctx.dump_all();

    for (file, header) in [
        ("frame_for_plotting.csv", "timestamp,task,len"),
        ("event_for_plotting.csv", "timestamp,task,len"),
        ("memory_for_plotting.csv", "timestamp,type,value"),
        ("network.csv", "timestamp,bytes"),
    ] {
        let text = fs::read_to_string(dir.path().join(file)).unwrap();
        assert_eq!(text, format!("{header}\n"), "unexpected content in {file}");
    }
}

#[test]
fn sequential_dumps_append_parseable_report_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = StatsContext::new(test_config(dir.path())).unwrap();

    ctx.frame_loop.start_measurement();
    ctx.frame_loop.end_measurement();
    ctx.dump_all();
    ctx.dump_all();

    let report = fs::read_to_string(dir.path().join("frame_metrics.csv")).unwrap();
    let blocks: Vec<&str> = report
        .split("!\n")
        .filter(|block| !block.is_empty())
        .collect();
    assert_eq!(blocks.len(), 2);
    for block in blocks {
        let mut lines = block.lines();
        assert_eq!(lines.next(), Some("Name,Params,Measurement Unit,Value"));
        for line in lines {
            assert_eq!(line.split(',').count(), 4, "malformed row: {line}");
        }
    }
}

#[test]
fn retained_spans_land_in_the_plotting_csv() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = StatsContext::new(test_config(dir.path())).unwrap();

    ctx.frame_loop.start_measurement();
    ctx.frame_loop.simple_measure("serialize frame", || {
        std::thread::sleep(Duration::from_millis(3));
    });
    ctx.frame_loop.end_measurement();
    ctx.dump_all();

    let plotting = fs::read_to_string(dir.path().join("frame_for_plotting.csv")).unwrap();
    let mut lines = plotting.lines();
    assert_eq!(lines.next(), Some("timestamp,task,len"));
    let row = lines.next().expect("span above threshold was retained");
    let fields: Vec<&str> = row.split(',').collect();
    assert_eq!(fields[1], "serialize frame");
    assert!(fields[0].parse::<u64>().is_ok());
    assert!(fields[2].parse::<u64>().unwrap() >= 3);
}

#[test]
fn network_packets_are_dumped_and_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = StatsContext::new(test_config(dir.path())).unwrap();

    ctx.network.add(5, 2048);
    ctx.network.add(6, 1024);
    ctx.dump_all();
    ctx.dump_all();

    // the raw CSV is truncated per dump, never appended
    let csv = fs::read_to_string(dir.path().join("network.csv")).unwrap();
    assert_eq!(csv, "timestamp,bytes\n5,2048\n6,1024\n");

    // while the report file accumulates one block per dump
    let report = fs::read_to_string(dir.path().join("network.txt")).unwrap();
    assert_eq!(report.matches("Average packet size").count(), 2);
    assert_eq!(report.matches('!').count(), 2);
}

#[tokio::test]
async fn background_tasks_sample_and_stop() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.memory_sample_period = Duration::from_millis(10);
    let ctx = StatsContext::new(config).unwrap();

    ctx.start_background();
    tokio::time::sleep(Duration::from_millis(60)).await;
    ctx.shutdown().await;

    assert!(!ctx.memory.usages().is_empty());

    // shutdown wrote a final dump of every domain
    for file in [
        "frame_metrics.csv",
        "event_metrics.csv",
        "memory_metrics.txt",
        "memory_for_plotting.csv",
        "network.txt",
        "network.csv",
    ] {
        assert!(dir.path().join(file).exists(), "missing {file}");
    }

    let memory_csv = fs::read_to_string(dir.path().join("memory_for_plotting.csv")).unwrap();
    let mut lines = memory_csv.lines();
    assert_eq!(lines.next(), Some("timestamp,type,value"));
    // readings come in Used/Total pairs
    let rows: Vec<&str> = lines.collect();
    assert!(rows.len() >= 2);
    assert!(rows[0].contains(",Used,"));
    assert!(rows[1].contains(",Total,"));
}
