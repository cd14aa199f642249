use std::io::Write;
use std::process::Command;

use strata::dispatch::{InlineDispatch, PoolDispatch};
use strata::domain::TraceError;
use strata::folding::{ContextSwitchDrawKind, TimelineDraw};
use strata::report::FoldStats;
use strata::timeline::{Timeline, TimelineContext, ViewOptions};
use strata::trace_data::{ContextSwitch, ThreadData, Trace, ZoneLevel};
use strata_common::{ContextSwitchRegion, SampleData, ZoneEvent};
use tempfile::NamedTempFile;

/// 10k short zones, 5k samples and 1k running regions over one millisecond.
fn dense_trace() -> Trace {
    let mut thread = ThreadData::new(1, "hot");
    thread.timeline =
        ZoneLevel::Direct((0..10_000).map(|i| ZoneEvent::new(i * 100, i * 100 + 10)).collect());
    thread.samples = (0..5_000).map(|i| SampleData::new(i * 200, 1)).collect();
    let mut trace = Trace {
        last_time: 1_000_000,
        threads: vec![thread, ThreadData::new(2, "quiet")],
        ..Trace::default()
    };
    trace.context_switches.insert(
        1,
        ContextSwitch::new((0..1_000).map(|i| ContextSwitchRegion::new(i * 1_000, i * 1_000 + 500)).collect()),
    );
    trace
}

fn write_trace(trace: &Trace) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    serde_json::to_writer(&mut file, trace).expect("serialize trace");
    file.flush().expect("flush");
    file
}

#[test]
fn test_replay_document_round_trips() {
    let trace = dense_trace();
    let file = write_trace(&trace);

    let loaded = Trace::from_file(file.path()).expect("load trace");

    assert_eq!(loaded, trace);
    assert_eq!(loaded.context_switches(1).expect("switches").running_time, 500_000);
}

#[test]
fn test_whole_trace_folds_to_a_handful_of_records() {
    let trace = Trace::from_file(write_trace(&dense_trace()).path()).expect("load trace");
    let ctx = TimelineContext::new(0, 1_000_000, 100.0, 1.0);
    let pool = PoolDispatch::new(4).expect("pool");
    let mut timeline = Timeline::new(&trace);

    timeline.preprocess(&ctx, &ViewOptions::default(), &pool);

    let row = &timeline.rows()[0];
    assert_eq!(row.draw().len(), 1);
    assert!(matches!(row.draw()[0], TimelineDraw::Folded { count: 10_000, .. }));
    assert_eq!(row.context_switch_draw().len(), 1);
    assert!(matches!(
        row.context_switch_draw()[0].kind,
        ContextSwitchDrawKind::FoldedMulti { num: 1_000, .. }
    ));
    assert_eq!(row.samples_draw().len(), 1);
    assert_eq!(row.samples_draw()[0].count, 5_000);

    let quiet = FoldStats::from_row(&timeline.rows()[1]);
    assert_eq!(quiet.records(), 0);
}

#[test]
fn test_zoomed_window_counts_only_visible_zones() {
    let trace = dense_trace();
    // 100ns per px: each 10ns zone is sub-pixel, gaps of 90ns are under the threshold.
    let ctx = TimelineContext::new(0, 10_000, 100.0, 1.0);
    let mut timeline = Timeline::new(&trace);

    timeline.preprocess(&ctx, &ViewOptions::default(), &InlineDispatch);

    let row = &timeline.rows()[0];
    let represented: u32 = row.draw().iter().map(TimelineDraw::count).sum();
    assert_eq!(represented, 100);
    assert!(row.draw().iter().all(TimelineDraw::is_folded));

    // At 1ns per px every zone is drawn on its own.
    let ctx = TimelineContext::new(0, 1_000, 1_000.0, 1.0);
    timeline.draw_finished();
    timeline.preprocess(&ctx, &ViewOptions::default(), &InlineDispatch);
    let row = &timeline.rows()[0];
    assert_eq!(row.draw().len(), 10);
    assert!(row.draw().iter().all(|d| matches!(d, TimelineDraw::Zone { .. })));
}

const NESTED: &str = r#"{
    "last_time": 10000,
    "zones": [
        {"start": 100, "end": 900, "child": 1},
        {"start": 1000, "end": 4000},
        {"start": 200, "end": 800}
    ],
    "zone_children": [
        {"kind": "indirect", "items": [0, 1]},
        {"kind": "indirect", "items": [2]}
    ],
    "threads": [{
        "id": 11,
        "name": "render",
        "timeline": {"kind": "direct", "items": [{"start": 0, "end": 5000, "child": 0}]}
    }]
}"#;

#[test]
fn test_nested_indirect_levels() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(NESTED.as_bytes()).expect("write");
    let trace = Trace::from_file(file.path()).expect("load trace");
    let ctx = TimelineContext::new(0, 5_000, 500.0, 1.0);
    let mut timeline = Timeline::new(&trace);

    timeline.preprocess(&ctx, &ViewOptions::default(), &InlineDispatch);

    let row = &timeline.rows()[0];
    assert_eq!(row.depth(), 3);
    let depths: Vec<u32> = row.draw().iter().map(TimelineDraw::depth).collect();
    // Children are emitted before their parent.
    assert_eq!(depths, vec![2, 1, 1, 0]);
    assert_eq!(row.summary().zone_count, 4);
}

#[test]
fn test_unsorted_document_rejected() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(
        br#"{"last_time": 100, "threads": [{"id": 1, "samples": [{"time": 50, "callstack": 0}, {"time": 10, "callstack": 0}]}]}"#,
    )
    .expect("write");

    let err = Trace::from_file(file.path()).unwrap_err();
    assert!(matches!(err, TraceError::Unsorted { index: 1, .. }));
}

#[test]
fn test_cyclic_child_levels_rejected_before_folding() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(
        br#"{
            "last_time": 1000,
            "zone_children": [{"kind": "direct", "items": [{"start": 0, "end": 500, "child": 0}]}],
            "threads": [{"id": 1, "timeline": {"kind": "direct", "items": [{"start": 0, "end": 500, "child": 0}]}}]
        }"#,
    )
    .expect("write");

    let err = Trace::from_file(file.path()).unwrap_err();
    assert!(matches!(err, TraceError::CyclicChildren { what: "zone", handle: 0 }));

    let output = Command::new(env!("CARGO_BIN_EXE_strata"))
        .arg(file.path())
        .arg("--headless")
        .output()
        .expect("run strata");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("is its own ancestor"));
}

#[test]
fn test_headless_binary_prints_report() {
    let file = write_trace(&dense_trace());

    let output = Command::new(env!("CARGO_BIN_EXE_strata"))
        .arg(file.path())
        .args(["--headless", "--width", "100", "--jobs", "2"])
        .output()
        .expect("run strata");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8");
    assert!(stdout.starts_with("window 0..1000000 ns over 100 px"));
    assert!(stdout.contains("TID:1 \"hot\""));
    assert!(stdout.contains("zones: 0 drawn, 1 folded (10000 inside)"));
    assert!(stdout.ends_with("2 threads, 3 draw records, max depth 1\n"));
}

#[test]
fn test_headless_binary_json() {
    let file = write_trace(&dense_trace());

    let output = Command::new(env!("CARGO_BIN_EXE_strata"))
        .arg(file.path())
        .args(["--headless", "--json", "--width", "100", "--no-samples"])
        .output()
        .expect("run strata");

    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(rows[0]["name"], "hot");
    assert_eq!(rows[0]["sample_runs"], 0);
    assert_eq!(rows[1]["id"], 2);
}

#[test]
fn test_binary_exit_codes() {
    let missing = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["/nonexistent/trace.json", "--headless"])
        .output()
        .expect("run strata");
    assert_eq!(missing.status.code(), Some(66));

    let file = write_trace(&dense_trace());
    let inverted = Command::new(env!("CARGO_BIN_EXE_strata"))
        .arg(file.path())
        .args(["--headless", "--start", "500", "--end", "100"])
        .output()
        .expect("run strata");
    assert_eq!(inverted.status.code(), Some(2));
}
