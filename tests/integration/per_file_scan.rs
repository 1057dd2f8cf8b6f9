use super::support::RecordingExtractor;
use super::IntegrationHarness;
use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use figbatch::config::{FailurePolicy, LayoutStyle};
use figbatch::{FigbatchError, InvocationMode, ScanRunner};
use std::fs::File;
use std::path::PathBuf;
use std::time::SystemTime;

#[test]
fn scan_invokes_once_per_matching_file() -> Result<()> {
    let harness = IntegrationHarness::new();
    let a = harness.seed_pdf("arxiv", "cancer", "a.pdf");
    let b = harness.seed_pdf("arxiv", "cancer", "b.pdf");
    harness.seed_pdf("arxiv", "cancer", "readme.txt");

    let config = harness.config();
    let extractor = RecordingExtractor::new();
    let summary = ScanRunner::new(&config, &extractor, harness.pacer())?.run()?;

    assert_eq!(summary.considered, 3);
    assert_eq!(summary.matched, 2);
    assert_eq!(summary.succeeded, 2);
    let inputs: Vec<PathBuf> = extractor.calls().into_iter().map(|c| c.input).collect();
    assert_eq!(inputs, vec![a, b]);
    assert!(extractor
        .calls()
        .iter()
        .all(|c| c.mode == InvocationMode::File));
    Ok(())
}

#[test]
fn nested_layout_uses_output_segment_and_filename_prefixes() -> Result<()> {
    let harness = IntegrationHarness::new();
    harness.seed_pdf("arxiv", "cancer", "a.pdf");
    let mut config = harness.config();
    config.layout.style = LayoutStyle::Nested;
    let extractor = RecordingExtractor::new();
    ScanRunner::new(&config, &extractor, harness.pacer())?.run()?;

    let call = &extractor.calls()[0];
    let base = harness.output_root().join("arxiv/cancer/output");
    assert_eq!(call.images_target, base.join("images/figure"));
    assert_eq!(call.data_target, base.join("data/data"));
    assert!(call.stats_file.starts_with(base.join("statistics")));
    assert!(call.stats_file.exists());
    Ok(())
}

#[test]
fn scope_limits_the_scan_to_one_source() -> Result<()> {
    let harness = IntegrationHarness::new();
    harness.seed_pdf("arxiv", "cancer", "a.pdf");
    let wanted = harness.seed_pdf("pubmed", "cancer", "b.pdf");
    harness.seed_pdf("pubmed", "cardio", "c.pdf");

    let mut config = harness.config();
    config.scan.source = "pubmed".into();
    config.scan.category = "cancer".into();
    let extractor = RecordingExtractor::new();
    let summary = ScanRunner::new(&config, &extractor, harness.pacer())?.run()?;

    assert_eq!(summary.matched, 1);
    assert_eq!(extractor.calls()[0].input, wanted);
    assert!(!harness.output_root().join("arxiv").exists());
    Ok(())
}

#[test]
fn modified_after_excludes_older_files() -> Result<()> {
    let harness = IntegrationHarness::new();
    let old = harness.seed_pdf("arxiv", "cancer", "old.pdf");
    let fresh = harness.seed_pdf("arxiv", "cancer", "fresh.pdf");
    let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    File::options()
        .write(true)
        .open(&old)?
        .set_modified(SystemTime::from(cutoff - Duration::days(30)))?;

    let mut config = harness.config();
    config.scan.modified_after = Some(cutoff.to_rfc3339());
    let extractor = RecordingExtractor::new();
    ScanRunner::new(&config, &extractor, harness.pacer())?.run()?;

    let inputs: Vec<PathBuf> = extractor.calls().into_iter().map(|c| c.input).collect();
    assert_eq!(inputs, vec![fresh]);
    Ok(())
}

#[test]
fn failed_file_is_logged_and_scan_continues() -> Result<()> {
    let harness = IntegrationHarness::new();
    harness.seed_pdf("arxiv", "cancer", "a.pdf");
    let broken = harness.seed_pdf("arxiv", "cancer", "b.pdf");
    harness.seed_pdf("arxiv", "cancer", "c.pdf");

    let config = harness.config();
    let extractor = RecordingExtractor::failing_on(vec![broken]);
    let summary = ScanRunner::new(&config, &extractor, harness.pacer())?.run()?;

    assert_eq!(extractor.calls().len(), 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    Ok(())
}

#[test]
fn abort_policy_stops_the_scan_on_first_failure() -> Result<()> {
    let harness = IntegrationHarness::new();
    let first = harness.seed_pdf("arxiv", "cancer", "a.pdf");
    harness.seed_pdf("arxiv", "cancer", "b.pdf");

    let mut config = harness.config();
    config.scan.failure_policy = FailurePolicy::Abort;
    let extractor = RecordingExtractor::always_failing();
    let err = ScanRunner::new(&config, &extractor, harness.pacer())?
        .run()
        .unwrap_err();

    match err {
        FigbatchError::InvocationFailed { input, .. } => assert_eq!(input, first),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(extractor.calls().len(), 1);
    Ok(())
}

#[test]
fn invalid_date_bound_is_rejected_up_front() {
    let harness = IntegrationHarness::new();
    let mut config = harness.config();
    config.scan.modified_before = Some("last tuesday".into());
    let extractor = RecordingExtractor::new();
    let result = ScanRunner::new(&config, &extractor, harness.pacer());
    assert!(matches!(result, Err(FigbatchError::InvalidDate(_))));
}
