use super::support::RecordingExtractor;
use super::IntegrationHarness;
use anyhow::Result;
use figbatch::config::FailurePolicy;
use figbatch::orchestration::RunLog;
use figbatch::{ContinuousRunner, FigbatchError, InvocationMode};
use std::collections::HashSet;
use std::fs;
use std::time::Duration;

#[test]
fn three_pdfs_in_batches_of_two_invoke_twice() -> Result<()> {
    let harness = IntegrationHarness::new();
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        harness.seed_pdf("arxiv", "cancer", name);
    }
    let mut config = harness.config();
    config.batch.batch_size = 2;
    let extractor = RecordingExtractor::new();
    let pacer = harness.pacer();

    let runner = ContinuousRunner::new(&config, &extractor, &pacer)?;
    let summary = runner.run_sweep()?;

    assert_eq!(summary.categories, 1);
    assert_eq!(summary.batches, 2);
    assert_eq!(summary.files, 3);
    assert_eq!(summary.failures, 0);

    let calls = extractor.calls();
    assert_eq!(calls.len(), 2);
    let pdf_dir = harness.category_pdf_dir("arxiv", "cancer");
    for call in &calls {
        assert_eq!(call.mode, InvocationMode::Batch);
        assert_eq!(call.input, pdf_dir);
        assert_eq!(call.images_target, harness.output_root().join("arxiv/cancer/images"));
        assert_eq!(call.data_target, harness.output_root().join("arxiv/cancer/data"));
    }
    let stats: HashSet<_> = calls.iter().map(|c| c.stats_file.clone()).collect();
    assert_eq!(stats.len(), 2, "stats files must not collide");

    for dir in ["statistics", "images", "data"] {
        assert!(harness.output_root().join("arxiv/cancer").join(dir).is_dir());
    }

    let counts: Vec<usize> = RunLog::new(harness.event_log())
        .load()?
        .iter()
        .map(|r| r.file_count)
        .collect();
    assert_eq!(counts, vec![2, 1]);

    assert_eq!(
        pacer.pauses(),
        vec![Duration::from_secs(5), Duration::from_secs(5)]
    );
    Ok(())
}

#[test]
fn categories_without_pdf_dir_are_skipped() -> Result<()> {
    let harness = IntegrationHarness::new();
    harness.seed_pdf("arxiv", "cancer", "a.pdf");
    fs::create_dir_all(harness.pdf_root().join("arxiv/drafts"))?;
    fs::create_dir_all(harness.category_pdf_dir("pubmed", "empty"))?;
    fs::write(harness.pdf_root().join("manifest.csv"), b"source,category")?;

    let config = harness.config();
    let extractor = RecordingExtractor::new();
    let pacer = harness.pacer();
    let summary = ContinuousRunner::new(&config, &extractor, &pacer)?.run_sweep()?;

    assert_eq!(summary.categories, 2);
    assert_eq!(summary.batches, 1);
    assert!(!harness.output_root().join("arxiv/drafts").exists());
    // Layout is prepared even when the pdfs directory is empty.
    assert!(harness.output_root().join("pubmed/empty/statistics").is_dir());
    assert_eq!(extractor.calls().len(), 1);
    Ok(())
}

#[test]
fn non_pdf_files_are_not_counted() -> Result<()> {
    let harness = IntegrationHarness::new();
    harness.seed_pdf("arxiv", "cancer", "a.pdf");
    harness.seed_pdf("arxiv", "cancer", "notes.txt");
    harness.seed_pdf("arxiv", "cancer", "b.PDF");

    let config = harness.config();
    let extractor = RecordingExtractor::new();
    let pacer = harness.pacer();
    let summary = ContinuousRunner::new(&config, &extractor, &pacer)?.run_sweep()?;
    assert_eq!(summary.files, 1);
    Ok(())
}

#[test]
fn later_sweeps_pick_up_new_files() -> Result<()> {
    let harness = IntegrationHarness::new();
    harness.seed_pdf("arxiv", "cancer", "a.pdf");
    let mut config = harness.config();
    config.batch.batch_size = 1;
    let extractor = RecordingExtractor::new();
    let pacer = harness.pacer();
    let runner = ContinuousRunner::new(&config, &extractor, &pacer)?;

    let first = runner.run_sweep()?;
    harness.seed_pdf("arxiv", "cancer", "b.pdf");
    let second = runner.run_sweep()?;

    assert_eq!(first.batches, 1);
    assert_eq!(second.batches, 2);
    assert_eq!(extractor.calls().len(), 3);
    Ok(())
}

#[test]
fn bounded_sweeps_wait_between_passes_only() -> Result<()> {
    let harness = IntegrationHarness::new();
    harness.seed_pdf("arxiv", "cancer", "a.pdf");
    let mut config = harness.config();
    config.batch.batch_pause_secs = 2;
    config.batch.sweep_pause_secs = 30;
    let extractor = RecordingExtractor::new();
    let pacer = harness.pacer();

    let summaries = ContinuousRunner::new(&config, &extractor, &pacer)?.run_sweeps(2)?;
    assert_eq!(summaries.len(), 2);
    assert_eq!(
        pacer.pauses(),
        vec![
            Duration::from_secs(2),
            Duration::from_secs(30),
            Duration::from_secs(2),
        ]
    );
    Ok(())
}

#[test]
fn failed_batch_aborts_the_sweep() -> Result<()> {
    let harness = IntegrationHarness::new();
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        harness.seed_pdf("arxiv", "cancer", name);
    }
    let mut config = harness.config();
    config.batch.batch_size = 2;
    let extractor = RecordingExtractor::always_failing();
    let pacer = harness.pacer();

    let err = ContinuousRunner::new(&config, &extractor, &pacer)?
        .run_sweep()
        .unwrap_err();
    match err {
        FigbatchError::InvocationFailed { input, stderr, .. } => {
            assert_eq!(input, harness.category_pdf_dir("arxiv", "cancer"));
            assert!(stderr.contains("cannot parse"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(extractor.calls().len(), 1);
    Ok(())
}

#[test]
fn continue_policy_keeps_sweeping_after_failed_batch() -> Result<()> {
    let harness = IntegrationHarness::new();
    harness.seed_pdf("arxiv", "cancer", "a.pdf");
    harness.seed_pdf("pubmed", "cardio", "b.pdf");
    let mut config = harness.config();
    config.batch.failure_policy = FailurePolicy::Continue;
    let extractor =
        RecordingExtractor::failing_on(vec![harness.category_pdf_dir("arxiv", "cancer")]);
    let pacer = harness.pacer();

    let summary = ContinuousRunner::new(&config, &extractor, &pacer)?.run_sweep()?;
    assert_eq!(summary.batches, 2);
    assert_eq!(summary.failures, 1);

    let records = RunLog::new(harness.event_log()).load()?;
    assert_eq!(records.iter().filter(|r| !r.success).count(), 1);
    Ok(())
}

#[test]
fn unwritable_output_root_is_fatal_before_any_invocation() -> Result<()> {
    let harness = IntegrationHarness::new();
    harness.seed_pdf("arxiv", "cancer", "a.pdf");
    fs::write(harness.output_root(), b"not a directory")?;

    let config = harness.config();
    let extractor = RecordingExtractor::new();
    let pacer = harness.pacer();
    let err = ContinuousRunner::new(&config, &extractor, &pacer)?
        .run_sweep()
        .unwrap_err();
    assert!(matches!(err, FigbatchError::DirectorySetup { .. }));
    assert!(extractor.calls().is_empty());
    Ok(())
}

#[test]
fn missing_pdf_root_yields_an_empty_sweep() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut config = harness.config();
    config.paths.pdf_root = harness.workspace_path().join("not-mounted-yet");
    let extractor = RecordingExtractor::new();
    let pacer = harness.pacer();

    let summary = ContinuousRunner::new(&config, &extractor, &pacer)?.run_sweep()?;
    assert_eq!(summary.categories, 0);
    assert!(extractor.calls().is_empty());
    Ok(())
}
