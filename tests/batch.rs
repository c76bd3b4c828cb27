mod common;

use std::path::Path;

use common::{approx, generate_silence_wav, generate_sine_wav, FakeBehavior, FakeProcessor};
use loudmatch::analyzer;
use loudmatch::batch::BatchDriver;
use loudmatch::config::MatchConfig;
use loudmatch::error::ConfigError;
use loudmatch::models::{PairStatus, SilentSide};
use loudmatch::report;
use loudmatch::verify::MAX_ATTEMPTS;

/// Temp workspace with `eng/`, `ita/` and a config pointing at `out/`.
fn setup() -> (tempfile::TempDir, MatchConfig) {
    let base = tempfile::tempdir().unwrap();
    std::fs::create_dir(base.path().join("eng")).unwrap();
    std::fs::create_dir(base.path().join("ita")).unwrap();
    let config = MatchConfig::new(
        base.path().join("eng"),
        base.path().join("ita"),
        base.path().join("out"),
    );
    (base, config)
}

fn sine(dir: &Path, name: &str, rms_db: f64) {
    generate_sine_wav(dir, name, 440.0, rms_db, 1.0, 48000, 16);
}

#[test]
fn test_within_tolerance_copies_verbatim() {
    let (base, config) = setup();
    sine(&config.source_dir, "s1_ENG.wav", -14.0);
    sine(&config.target_dir, "s1_ITA.wav", -14.3);

    let fake = FakeProcessor::new(FakeBehavior::Accurate);
    let summary = BatchDriver::new(config.clone(), &fake).unwrap().run();

    assert_eq!(summary.outcomes[0].status, PairStatus::Bypassed);
    assert_eq!(fake.calls.get(), 0);

    let target = std::fs::read(config.target_dir.join("s1_ITA.wav")).unwrap();
    let output = std::fs::read(base.path().join("out/s1_ITA.wav")).unwrap();
    assert_eq!(target, output, "bypassed output must be byte-identical");

    let m = analyzer::measure(&base.path().join("out/s1_ITA.wav")).unwrap();
    assert!(approx(m.rms_db, -14.3, 0.05), "got {}", m.rms_db);
}

#[test]
fn test_bypass_is_idempotent() {
    let (base, config) = setup();
    sine(&config.source_dir, "s1_ENG.wav", -14.0);
    sine(&config.target_dir, "s1_ITA.wav", -14.3);
    let output = base.path().join("out/s1_ITA.wav");

    let fake = FakeProcessor::new(FakeBehavior::Accurate);
    let driver = BatchDriver::new(config, &fake).unwrap();

    driver.run();
    let first = analyzer::measure(&output).unwrap();
    driver.run();
    let second = analyzer::measure(&output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_quiet_target_is_compressed_and_verified_once() {
    let (base, config) = setup();
    sine(&config.source_dir, "s2_ENG.wav", -10.0);
    sine(&config.target_dir, "s2_ITA.wav", -20.0);

    let fake = FakeProcessor::new(FakeBehavior::Accurate);
    let summary = BatchDriver::new(config.clone(), &fake).unwrap().run();

    assert_eq!(summary.outcomes[0].status, PairStatus::Processed { attempts: 1 });
    assert_eq!(fake.calls.get(), 1);

    let out = analyzer::measure(&base.path().join("out/s2_ITA.wav")).unwrap();
    assert!(approx(out.rms_db, -10.0, 0.1), "got {}", out.rms_db);
}

#[test]
fn test_loud_target_is_attenuated() {
    let (base, config) = setup();
    sine(&config.source_dir, "s3_ENG.wav", -24.0);
    sine(&config.target_dir, "s3_ITA.wav", -12.0);

    let fake = FakeProcessor::new(FakeBehavior::Accurate);
    let summary = BatchDriver::new(config, &fake).unwrap().run();

    assert_eq!(summary.outcomes[0].status, PairStatus::Processed { attempts: 1 });
    let out = analyzer::measure(&base.path().join("out/s3_ITA.wav")).unwrap();
    assert!(approx(out.rms_db, -24.0, 0.1), "got {}", out.rms_db);
}

#[test]
fn test_retry_never_exceeds_two_invocations() {
    let (base, config) = setup();
    sine(&config.source_dir, "s4_ENG.wav", -6.0);
    sine(&config.target_dir, "s4_ITA.wav", -40.0);

    let fake = FakeProcessor::new(FakeBehavior::Stuck);
    let summary = BatchDriver::new(config, &fake).unwrap().run();

    assert_eq!(fake.calls.get(), MAX_ATTEMPTS);
    assert_eq!(summary.outcomes[0].status, PairStatus::Processed { attempts: 2 });
    // The output still exists even though it never converged
    assert!(base.path().join("out/s4_ITA.wav").is_file());
    // The moved-aside first pass is cleaned up
    assert!(!base.path().join("out/s4_ITA.wav.first-pass.wav").exists());
}

#[test]
fn test_retry_corrects_the_first_pass_output() {
    let (base, config) = setup();
    sine(&config.source_dir, "s5_ENG.wav", -10.0);
    sine(&config.target_dir, "s5_ITA.wav", -20.0);

    // First pass lands at -14 (residual 4), second pass lifts it by 2.4 dB
    let fake = FakeProcessor::new(FakeBehavior::Undershoot(0.6));
    let summary = BatchDriver::new(config.clone(), &fake).unwrap().run();

    assert_eq!(summary.outcomes[0].status, PairStatus::Processed { attempts: 2 });
    let inputs = fake.inputs.borrow();
    assert_eq!(inputs[0], config.target_dir.join("s5_ITA.wav"));
    assert!(inputs[1].to_string_lossy().ends_with(".first-pass.wav"));

    let out = analyzer::measure(&base.path().join("out/s5_ITA.wav")).unwrap();
    assert!(approx(out.rms_db, -11.6, 0.15), "got {}", out.rms_db);
}

#[test]
fn test_missing_source_is_skipped_and_batch_continues() {
    let (base, config) = setup();
    sine(&config.target_dir, "a_ITA.wav", -14.0);
    sine(&config.source_dir, "b_ENG.wav", -14.0);
    sine(&config.target_dir, "b_ITA.wav", -14.5);

    let fake = FakeProcessor::new(FakeBehavior::Accurate);
    let summary = BatchDriver::new(config, &fake).unwrap().run();

    assert_eq!(summary.total(), 2);
    assert_eq!(summary.outcomes[0].status, PairStatus::SkippedMissingPair);
    assert_eq!(summary.outcomes[1].status, PairStatus::Bypassed);
    assert!(!base.path().join("out/a_ITA.wav").exists());

    let rows = report::compile(&summary.produced_pairs());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].file_name, "b_ITA.wav");
}

#[test]
fn test_report_has_one_row_per_produced_output() {
    let (_base, config) = setup();
    // Bypassed
    sine(&config.source_dir, "a_ENG.wav", -14.0);
    sine(&config.target_dir, "a_ITA.wav", -14.3);
    // Compressed, within tolerance after one pass
    sine(&config.source_dir, "b_ENG.wav", -10.0);
    sine(&config.target_dir, "b_ITA.wav", -20.0);
    // Missing its source
    sine(&config.target_dir, "c_ITA.wav", -18.0);

    let fake = FakeProcessor::new(FakeBehavior::Accurate);
    let summary = BatchDriver::new(config, &fake).unwrap().run();
    let rows = report::compile(&summary.produced_pairs());

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].file_name, "a_ITA.wav");
    assert_eq!(rows[1].file_name, "b_ITA.wav");

    let b = &rows[1];
    assert!(approx(b.source_rms_db, -10.0, 0.05));
    assert!(approx(b.target_rms_db.unwrap(), -20.0, 0.05));
    assert!(approx(b.output_rms_db, -10.0, 0.1));
    assert!(b.rms_difference_db.abs() <= 2.0);
}

#[test]
fn test_processor_failure_is_not_fatal() {
    let (base, config) = setup();
    sine(&config.source_dir, "a_ENG.wav", -10.0);
    sine(&config.target_dir, "a_ITA.wav", -20.0);
    sine(&config.source_dir, "b_ENG.wav", -14.0);
    sine(&config.target_dir, "b_ITA.wav", -14.0);

    let fake = FakeProcessor::new(FakeBehavior::Unavailable);
    let summary = BatchDriver::new(config, &fake).unwrap().run();

    assert!(matches!(summary.outcomes[0].status, PairStatus::Failed(_)));
    assert_eq!(summary.outcomes[1].status, PairStatus::Bypassed);
    assert!(!base.path().join("out/a_ITA.wav").exists());
    assert_eq!(report::compile(&summary.produced_pairs()).len(), 1);
}

#[test]
fn test_undecodable_processed_output_is_removed() {
    let (base, config) = setup();
    sine(&config.source_dir, "a_ENG.wav", -10.0);
    sine(&config.target_dir, "a_ITA.wav", -20.0);

    let fake = FakeProcessor::new(FakeBehavior::Garbage);
    let summary = BatchDriver::new(config, &fake).unwrap().run();

    match &summary.outcomes[0].status {
        PairStatus::Failed(reason) => assert!(reason.contains("a_ITA.wav")),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(!base.path().join("out/a_ITA.wav").exists());
    assert!(!base.path().join("out/a_ITA.wav.first-pass.wav").exists());
    assert!(report::compile(&summary.produced_pairs()).is_empty());
}

#[test]
fn test_undecodable_target_is_recorded_as_failed() {
    let (_base, config) = setup();
    sine(&config.source_dir, "a_ENG.wav", -14.0);
    std::fs::write(config.target_dir.join("a_ITA.wav"), b"not a wav file").unwrap();

    let fake = FakeProcessor::new(FakeBehavior::Accurate);
    let summary = BatchDriver::new(config, &fake).unwrap().run();

    match &summary.outcomes[0].status {
        PairStatus::Failed(reason) => assert!(reason.contains("a_ITA.wav")),
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn test_silent_source_passes_target_through() {
    let (base, config) = setup();
    generate_silence_wav(&config.source_dir, "a_ENG.wav", 0.5);
    sine(&config.target_dir, "a_ITA.wav", -20.0);

    let fake = FakeProcessor::new(FakeBehavior::Accurate);
    let summary = BatchDriver::new(config.clone(), &fake).unwrap().run();

    assert_eq!(summary.outcomes[0].status, PairStatus::Passthrough(SilentSide::Source));
    assert_eq!(fake.calls.get(), 0);
    assert_eq!(
        std::fs::read(config.target_dir.join("a_ITA.wav")).unwrap(),
        std::fs::read(base.path().join("out/a_ITA.wav")).unwrap()
    );

    let rows = report::compile(&summary.produced_pairs());
    assert_eq!(rows[0].source_rms_db, f64::NEG_INFINITY);
    assert_eq!(rows[0].rms_difference_db, f64::NEG_INFINITY);
}

#[test]
fn test_silent_target_passes_through() {
    let (_base, config) = setup();
    sine(&config.source_dir, "a_ENG.wav", -14.0);
    generate_silence_wav(&config.target_dir, "a_ITA.wav", 0.5);

    let fake = FakeProcessor::new(FakeBehavior::Accurate);
    let summary = BatchDriver::new(config, &fake).unwrap().run();

    assert_eq!(summary.outcomes[0].status, PairStatus::Passthrough(SilentSide::Target));
    assert_eq!(fake.calls.get(), 0);
}

#[test]
fn test_recursive_mirrors_subdirectories() {
    let (base, mut config) = setup();
    config.recursive = true;
    sine(&config.source_dir.join("act1"), "a_ENG.wav", -14.0);
    sine(&config.target_dir.join("act1"), "a_ITA.wav", -14.0);

    let fake = FakeProcessor::new(FakeBehavior::Accurate);
    let summary = BatchDriver::new(config, &fake).unwrap().run();

    assert_eq!(summary.outcomes[0].status, PairStatus::Bypassed);
    assert!(base.path().join("out/act1/a_ITA.wav").is_file());
}

#[test]
fn test_invalid_config_aborts_before_touching_files() {
    let (base, mut config) = setup();
    config.source_dir = base.path().join("missing");

    let fake = FakeProcessor::new(FakeBehavior::Accurate);
    let err = BatchDriver::new(config, &fake).err().unwrap();

    assert!(matches!(err, ConfigError::NotADirectory { .. }));
    assert!(!base.path().join("out").exists());
}
