/*!
 * Integration tests for the read, translate and write workflow
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use subtran::app_config::{BatchMismatchPolicy, ProcessingMode};
use subtran::errors::{AppError, SubtitleError, TranslationError};
use subtran::providers::mock::MockProvider;
use subtran::subtitle_processor::SubtitleCollection;
use subtran::translation::TranslationOptions;
use subtran::{process_file, Controller, DocumentStatus};

use crate::common;

fn controller_with(provider: &MockProvider) -> Controller {
    Controller::with_backend(common::test_config(), Arc::new(provider.clone()))
}

#[tokio::test]
async fn test_process_file_withSampleDocument_shouldWriteTranslation() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output = temp_dir.path().join("movie.fr.srt");
    let translator = common::translator_with(&MockProvider::working(), TranslationOptions::default());

    let report = process_file(&input, &output, &translator).await?;

    assert_eq!(report.status, DocumentStatus::Translated);
    assert_eq!(report.cues, 3);
    assert_eq!(report.translation.translated, 3);

    let source = SubtitleCollection::read_srt_file(&input)?;
    let translated = SubtitleCollection::read_srt_file(&output)?;
    assert_eq!(translated.entries.len(), source.entries.len());
    for (before, after) in source.entries.iter().zip(&translated.entries) {
        assert_eq!(after.seq_num, before.seq_num);
        assert_eq!(after.timing, before.timing);
        assert_eq!(after.text, MockProvider::expected_translation(&before.text, "fr"));
    }
    Ok(())
}

#[tokio::test]
async fn test_process_file_withMultilineCue_shouldKeepLineBreak() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        temp_dir.path(),
        "lines.srt",
        "1\n00:00:01,000 --> 00:00:03,000\n<i>First line</i>\nSecond line\n",
    )?;
    let output = temp_dir.path().join("lines.fr.srt");
    let translator = common::translator_with(&MockProvider::working(), common::batch_options(4));

    process_file(&input, &output, &translator).await?;

    let written = fs::read_to_string(&output)?;
    assert_eq!(
        written,
        "1\n00:00:01,000 --> 00:00:03,000\n[fr] First line\nSecond line\n\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_process_file_withBlankLinesInTranslation_shouldKeepCueLayout() -> Result<()> {
    for options in [TranslationOptions::default(), common::batch_options(2)] {
        let temp_dir = common::create_temp_dir()?;
        let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
        let output = temp_dir.path().join("movie.fr.srt");
        let translator = common::translator_with(&MockProvider::blank_lines(), options);

        process_file(&input, &output, &translator).await?;

        let source = SubtitleCollection::read_srt_file(&input)?;
        let translated = SubtitleCollection::read_srt_file(&output)?;
        assert_eq!(translated.entries.len(), source.entries.len());
        for (before, after) in source.entries.iter().zip(&translated.entries) {
            assert_eq!(after.seq_num, before.seq_num);
            assert_eq!(after.timing, before.timing);
            assert_eq!(
                after.text,
                format!("{}\nsecond paragraph", MockProvider::expected_translation(&before.text, "fr"))
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_process_file_withNoCues_shouldWriteEmptyOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "empty.srt", "nothing to see here\n")?;
    let output = temp_dir.path().join("empty.fr.srt");
    let provider = MockProvider::working();
    let translator = common::translator_with(&provider, TranslationOptions::default());

    let report = process_file(&input, &output, &translator).await?;

    assert_eq!(report.status, DocumentStatus::Empty);
    assert_eq!(report.cues, 0);
    assert_eq!(provider.call_count(), 0);
    assert_eq!(fs::read_to_string(&output)?, "");
    Ok(())
}

#[tokio::test]
async fn test_process_file_withMissingInput_shouldFailUnreadable() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output = temp_dir.path().join("out.srt");
    let translator = common::translator_with(&MockProvider::working(), TranslationOptions::default());

    let result = process_file(&temp_dir.path().join("missing.srt"), &output, &translator).await;

    assert!(matches!(
        result,
        Err(AppError::Subtitle(SubtitleError::UnreadableFile { .. }))
    ));
    assert!(!output.exists());
    Ok(())
}

#[tokio::test]
async fn test_process_file_withBlockedOutput_shouldFailUnwritable() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let blocker = common::create_test_file(temp_dir.path(), "blocker", "")?;
    let translator = common::translator_with(&MockProvider::working(), TranslationOptions::default());

    let result = process_file(&input, &blocker.join("movie.fr.srt"), &translator).await;

    assert!(matches!(
        result,
        Err(AppError::Subtitle(SubtitleError::UnwritableFile { .. }))
    ));
    Ok(())
}

#[tokio::test]
async fn test_process_file_withBatchMismatch_shouldWriteNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output = temp_dir.path().join("movie.fr.srt");
    let translator = common::translator_with(&MockProvider::short_batches(), common::batch_options(2));

    let result = process_file(&input, &output, &translator).await;

    assert!(matches!(
        result,
        Err(AppError::Translation(TranslationError::BatchCountMismatch { .. }))
    ));
    assert!(!output.exists());
    Ok(())
}

#[tokio::test]
async fn test_controller_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let existing = common::create_test_file(temp_dir.path(), "movie.fr.srt", "old")?;
    let provider = MockProvider::working();
    let controller = controller_with(&provider);

    let skipped = controller.run(input.clone(), None, false).await?;
    assert!(skipped.is_none());
    assert_eq!(fs::read_to_string(&existing)?, "old");
    assert_eq!(provider.call_count(), 0);

    let report = controller.run(input, None, true).await?;
    assert_eq!(report.map(|r| r.output), Some(existing.clone()));
    assert!(fs::read_to_string(&existing)?.contains("[fr] This is a test subtitle."));
    Ok(())
}

#[tokio::test]
async fn test_controller_run_withOutputDirectory_shouldNameByLanguage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let out_dir = temp_dir.path().join("out");
    fs::create_dir(&out_dir)?;
    let controller = controller_with(&MockProvider::working());

    let report = controller.run(input, Some(out_dir.clone()), false).await?;

    assert_eq!(report.map(|r| r.output), Some(out_dir.join("movie.fr.srt")));
    Ok(())
}

#[tokio::test]
async fn test_controller_run_folder_shouldTranslateSourcesOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("season1");
    fs::create_dir(&nested)?;
    common::create_test_subtitle(temp_dir.path(), "a.srt")?;
    common::create_test_subtitle(&nested, "b.srt")?;
    common::create_test_subtitle(temp_dir.path(), "c.srt")?;
    common::create_test_file(temp_dir.path(), "c.fr.srt", "already done")?;

    let mut config = common::test_config();
    config.translation.common.processing_mode = ProcessingMode::Batch;
    config.translation.common.batch_mismatch_policy = BatchMismatchPolicy::RetryIndividually;
    let controller = Controller::with_backend(config, Arc::new(MockProvider::working()));

    let summary = controller.run_folder(temp_dir.path().to_path_buf(), false).await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert!(temp_dir.path().join("a.fr.srt").exists());
    assert!(nested.join("b.fr.srt").exists());
    assert_eq!(fs::read_to_string(temp_dir.path().join("c.fr.srt"))?, "already done");
    Ok(())
}

#[tokio::test]
async fn test_controller_run_folder_withoutSubtitles_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "readme.txt", "hi")?;
    let controller = controller_with(&MockProvider::working());

    assert!(controller.run_folder(temp_dir.path().to_path_buf(), false).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_spawn_document_shouldWriteUniquelyNamedOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let downloads = temp_dir.path().join("downloads");
    let controller = controller_with(&MockProvider::working().with_delay(std::time::Duration::from_millis(5)));

    let first = controller.spawn_document(input.clone(), &downloads);
    let second = controller.spawn_document(input, &downloads);
    assert_ne!(first.download_name, second.download_name);
    assert!(first.download_name.ends_with(".srt"));

    let output_path = first.output_path.clone();
    let report = first.wait().await?;
    second.wait().await?;

    assert_eq!(report.output, output_path);
    let written = SubtitleCollection::read_srt_file(&output_path)?;
    assert_eq!(written.entries.len(), 3);
    assert!(written.entries.iter().all(|e| e.text.starts_with("[fr] ")));
    Ok(())
}

#[tokio::test]
async fn test_translate_free_text_shouldUseBackend() -> Result<()> {
    let controller = controller_with(&MockProvider::working());

    let text = controller.translate_free_text("Good morning").await;

    assert_eq!(text, "[fr] Good morning");
    Ok(())
}

#[tokio::test]
async fn test_translate_free_texts_shouldUseOneBatchCall() -> Result<()> {
    let provider = MockProvider::working();
    let controller = controller_with(&provider);
    let texts = vec!["Good morning".to_string(), "Good night".to_string()];

    let translated = controller.translate_free_texts(&texts).await?;

    assert_eq!(translated, vec!["[fr] Good morning", "[fr] Good night"]);
    assert_eq!(provider.batch_sizes(), vec![2]);
    assert!(controller.translate_free_texts(&[]).await?.is_empty());
    assert_eq!(provider.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_translate_free_texts_withShortAnswer_shouldFail() -> Result<()> {
    let controller = controller_with(&MockProvider::short_batches());
    let texts = vec!["one".to_string(), "two".to_string()];

    let result = controller.translate_free_texts(&texts).await;

    assert!(matches!(
        result,
        Err(TranslationError::BatchCountMismatch { batch: 0, expected: 2, actual: 1 })
    ));
    Ok(())
}

#[tokio::test]
async fn test_translate_free_texts_withLeadingDot_shouldMovePeriodBack() -> Result<()> {
    let controller = controller_with(&MockProvider::leading_dot());

    let translated = controller.translate_free_texts(&["See you.".to_string()]).await?;

    assert_eq!(translated, vec!["[fr] See you."]);
    Ok(())
}

#[tokio::test]
async fn test_controller_withMissingPaths_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let controller = controller_with(&MockProvider::working());

    assert!(controller.run(temp_dir.path().join("missing.srt"), None, false).await.is_err());
    assert!(controller.run(temp_dir.path().to_path_buf(), None, false).await.is_err());
    assert!(controller.run_folder(file.clone(), false).await.is_err());
    assert!(controller.run_folder(temp_dir.path().join("missing"), false).await.is_err());

    let explicit = temp_dir.path().join("custom.srt");
    assert_eq!(controller.output_path_for(&file, Some(&explicit)), explicit);
    assert_eq!(
        controller.output_path_for(&file, Some(temp_dir.path())),
        temp_dir.path().join("movie.fr.srt")
    );
    Ok(())
}
