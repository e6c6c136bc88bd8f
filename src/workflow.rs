use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, PolydubError};
use crate::fetch::{FetcherFactory, SourceFetcher};
use crate::job::{ArtifactKind, Job, JobResult, LanguageResult};
use crate::media::{MediaProcessor, MediaProcessorFactory};
use crate::subtitle::write_srt;
use crate::synthesis::{SpeechSynthesizer, SynthesizerFactory};
use crate::transcribe::{Transcriber, TranscriberFactory};
use crate::translate::{Translator, TranslatorFactory};

/// The service handles the pipeline runs on. All are stateless and shared;
/// they are passed in explicitly rather than reached through globals.
#[derive(Clone)]
pub struct Services {
    pub fetcher: Arc<dyn SourceFetcher>,
    pub media: Arc<dyn MediaProcessor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

/// Pipeline orchestrator. A pure function of (Job, Services) → JobResult:
/// reentrant across concurrent jobs because every artifact lives in the
/// job-id–scoped output directory.
pub struct Pipeline {
    services: Services,
    max_concurrent_languages: usize,
}

impl Pipeline {
    pub fn new(services: Services, max_concurrent_languages: usize) -> Self {
        Self {
            services,
            max_concurrent_languages: max_concurrent_languages.max(1),
        }
    }

    /// Wire the default service implementations from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        media.check_availability()?;

        let translate_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.translate.timeout_secs))
            .build()?;
        let synthesis_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.synthesis.timeout_secs))
            .build()?;

        let services = Services {
            fetcher: FetcherFactory::create_fetcher(config.fetch.clone()),
            media,
            transcriber: TranscriberFactory::create_transcriber(config.transcribe.clone()),
            translator: TranslatorFactory::create_translator(
                config.translate.clone(),
                translate_client,
            ),
            synthesizer: SynthesizerFactory::create_synthesizer(
                config.synthesis.clone(),
                synthesis_client,
            ),
        };

        Ok(Self::new(services, config.jobs.max_concurrent_languages))
    }

    /// Run one job to completion.
    ///
    /// The job-level prefix (fetch → extract → transcribe) runs exactly once
    /// and is fatal on failure: no language work starts and no partial
    /// results escape. Past that barrier each language runs its own
    /// sub-pipeline; a failure there is recorded in that language's result
    /// and siblings proceed.
    pub async fn run(&self, job: &Job) -> Result<JobResult> {
        // Reject invalid requests before any file or directory is created.
        job.request.validate()?;
        let languages = job.request.deduplicated_languages();

        info!(
            "Starting job {} for {} ({} languages)",
            job.id,
            job.request.source_url,
            languages.len()
        );

        fs::create_dir_all(&job.output_dir).await?;

        // --- Job-level prefix: fetch once, extract once, transcribe once ---
        let video_path = job.artifact_path(ArtifactKind::OriginalVideo, "");
        let fetched = self
            .services
            .fetcher
            .fetch(&job.request.source_url, &video_path)
            .await?;

        let audio_path = job.artifact_path(ArtifactKind::OriginalAudio, "");
        if let Err(e) = self
            .services
            .media
            .extract_audio(&video_path, &audio_path)
            .await
        {
            let _ = fs::remove_file(&audio_path).await;
            return Err(e);
        }

        let (transcript_text, transcript_warning) =
            match self.services.transcriber.transcribe(&audio_path).await {
                Ok(transcript) => (transcript.text, None),
                Err(PolydubError::Unintelligible(msg)) => {
                    warn!("Job {}: {}", job.id, msg);
                    (String::new(), Some(msg))
                }
                Err(e) => return Err(e),
            };

        // --- Per-language fan-out behind the prefix barrier ---
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_languages));
        let mut tasks = JoinSet::new();

        for (index, language) in languages.iter().enumerate() {
            let semaphore = semaphore.clone();
            let services = self.services.clone();
            let job = job.clone();
            let language = language.clone();
            let text = transcript_text.clone();
            let duration = fetched.duration;

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            index,
                            LanguageResult::failed(&language, "worker pool closed".to_string()),
                        )
                    }
                };

                let result =
                    match process_language(&services, &job, &language, &text, duration).await {
                        Ok(result) => result,
                        Err(e) => {
                            warn!("Job {}: language {} failed: {}", job.id, language, e);
                            cleanup_language_artifacts(&job, &language).await;
                            LanguageResult::failed(&language, e.to_string())
                        }
                    };
                (index, result)
            });
        }

        // Ordered aggregation: each task owns a slot indexed by request
        // position, so no ordering work is needed at join time.
        let mut slots: Vec<Option<LanguageResult>> = vec![None; languages.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!("Job {}: language task aborted: {}", job.id, e),
            }
        }

        let results: Vec<LanguageResult> = slots
            .into_iter()
            .zip(languages.iter())
            .map(|(slot, language)| {
                slot.unwrap_or_else(|| {
                    LanguageResult::failed(language, "language task aborted".to_string())
                })
            })
            .collect();

        info!(
            "Job {} completed: {}/{} languages succeeded",
            job.id,
            results.iter().filter(|r| r.succeeded()).count(),
            results.len()
        );

        Ok(JobResult {
            video_title: fetched.title,
            transcript_warning,
            results,
        })
    }
}

/// One language's sub-pipeline: translate, then whichever artifacts the job
/// flags request. Dub/remux work is skipped entirely when `dubbed` is unset.
async fn process_language(
    services: &Services,
    job: &Job,
    language: &str,
    transcript_text: &str,
    source_duration: Option<f64>,
) -> Result<LanguageResult> {
    let translated = if transcript_text.is_empty() {
        String::new()
    } else {
        services.translator.translate(transcript_text, language).await?
    };

    let mut result = LanguageResult {
        language: language.to_string(),
        subtitle_path: None,
        dubbed_path: None,
        error: None,
    };

    if job.request.flags.subtitles {
        let subtitle_path = job.artifact_path(ArtifactKind::Subtitles, language);
        write_srt(&translated, source_duration, &subtitle_path).await?;
        result.subtitle_path = Some(ArtifactKind::Subtitles.file_name(language));
    }

    if job.request.flags.dubbed {
        let dub_path = job.artifact_path(ArtifactKind::DubbedAudio, language);
        services
            .synthesizer
            .synthesize(&translated, language, &dub_path)
            .await?;

        let video_path = job.artifact_path(ArtifactKind::OriginalVideo, "");
        let output_path = job.artifact_path(ArtifactKind::OutputVideo, language);

        if job.request.flags.preserve_original {
            let original_audio = job.artifact_path(ArtifactKind::OriginalAudio, "");
            services
                .media
                .mix_audio(&video_path, &original_audio, &dub_path, &output_path)
                .await?;
        } else {
            services
                .media
                .replace_audio(&video_path, &dub_path, &output_path)
                .await?;
        }

        result.dubbed_path = Some(ArtifactKind::OutputVideo.file_name(language));
    }

    Ok(result)
}

/// Remove whatever a failed language sub-pipeline managed to write.
async fn cleanup_language_artifacts(job: &Job, language: &str) {
    for kind in [
        ArtifactKind::Subtitles,
        ArtifactKind::DubbedAudio,
        ArtifactKind::OutputVideo,
    ] {
        let _ = fs::remove_file(job.artifact_path(kind, language)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchedVideo, MockSourceFetcher};
    use crate::job::{JobFlags, JobRequest};
    use crate::media::MockMediaProcessor;
    use crate::synthesis::MockSpeechSynthesizer;
    use crate::transcribe::{MockTranscriber, Transcript};
    use crate::translate::MockTranslator;

    struct Mocks {
        fetcher: MockSourceFetcher,
        media: MockMediaProcessor,
        transcriber: MockTranscriber,
        translator: MockTranslator,
        synthesizer: MockSpeechSynthesizer,
    }

    impl Mocks {
        /// Mocks with a working job-level prefix and no per-language
        /// expectations.
        fn with_prefix() -> Self {
            let mut mocks = Self::empty();
            mocks.fetcher.expect_fetch().times(1).returning(|_, _| {
                Ok(FetchedVideo {
                    title: "Test Video".to_string(),
                    duration: Some(60.0),
                })
            });
            mocks
                .media
                .expect_extract_audio()
                .times(1)
                .returning(|_, _| Ok(()));
            mocks.transcriber.expect_transcribe().times(1).returning(|_| {
                Ok(Transcript {
                    text: "hello there".to_string(),
                    language: Some("en".to_string()),
                })
            });
            mocks
        }

        fn empty() -> Self {
            Self {
                fetcher: MockSourceFetcher::new(),
                media: MockMediaProcessor::new(),
                transcriber: MockTranscriber::new(),
                translator: MockTranslator::new(),
                synthesizer: MockSpeechSynthesizer::new(),
            }
        }

        fn into_pipeline(self) -> Pipeline {
            Pipeline::new(
                Services {
                    fetcher: Arc::new(self.fetcher),
                    media: Arc::new(self.media),
                    transcriber: Arc::new(self.transcriber),
                    translator: Arc::new(self.translator),
                    synthesizer: Arc::new(self.synthesizer),
                },
                4,
            )
        }
    }

    fn job(languages: &[&str], flags: JobFlags, output_root: &std::path::Path) -> Job {
        Job::new(
            JobRequest {
                source_url: "https://example.com/watch?v=abc".to_string(),
                languages: languages.iter().map(|s| s.to_string()).collect(),
                flags,
            },
            output_root,
        )
    }

    fn subtitles_only() -> JobFlags {
        JobFlags {
            subtitles: true,
            dubbed: false,
            preserve_original: false,
        }
    }

    #[tokio::test]
    async fn test_transcriber_invoked_exactly_once_for_many_languages() {
        let dir = tempfile::tempdir().unwrap();
        let mut mocks = Mocks::with_prefix();
        mocks
            .translator
            .expect_translate()
            .times(3)
            .returning(|text, lang| Ok(format!("[{}] {}", lang, text)));

        let pipeline = mocks.into_pipeline();
        let job = job(&["es", "fr", "de"], subtitles_only(), dir.path());

        let result = pipeline.run(&job).await.unwrap();
        assert_eq!(result.results.len(), 3);
        assert!(result.results.iter().all(|r| r.succeeded()));
        // times(1) on the transcriber mock is the invariant under test: it
        // panics at drop if transcription ran more (or less) than once.
    }

    #[tokio::test]
    async fn test_duplicate_languages_are_collapsed() {
        let dir = tempfile::tempdir().unwrap();
        let mut mocks = Mocks::with_prefix();
        mocks
            .translator
            .expect_translate()
            .times(2)
            .returning(|text, _| Ok(text.to_string()));

        let pipeline = mocks.into_pipeline();
        let job = job(&["es", "es", "fr"], subtitles_only(), dir.path());

        let result = pipeline.run(&job).await.unwrap();
        let langs: Vec<&str> = result.results.iter().map(|r| r.language.as_str()).collect();
        assert_eq!(langs, vec!["es", "fr"]);
    }

    #[tokio::test]
    async fn test_translation_failure_scoped_to_one_language() {
        let dir = tempfile::tempdir().unwrap();
        let mut mocks = Mocks::with_prefix();
        mocks
            .translator
            .expect_translate()
            .times(3)
            .returning(|text, lang| {
                if lang == "fr" {
                    Err(PolydubError::Translation("model refused".to_string()))
                } else {
                    Ok(format!("[{}] {}", lang, text))
                }
            });

        let pipeline = mocks.into_pipeline();
        let job = job(&["es", "fr", "de"], subtitles_only(), dir.path());

        let result = pipeline.run(&job).await.unwrap();
        assert_eq!(result.results.len(), 3);
        assert!(result.results[0].succeeded());
        assert!(!result.results[1].succeeded());
        assert_eq!(result.results[1].language, "fr");
        assert!(result.results[1].subtitle_path.is_none());
        assert!(result.results[2].succeeded());
        // The failed language leaves no partial artifact behind.
        assert!(!job.artifact_path(ArtifactKind::Subtitles, "fr").exists());
        assert!(job.artifact_path(ArtifactKind::Subtitles, "es").exists());
    }

    #[tokio::test]
    async fn test_subtitles_only_never_touches_dub_components() {
        let dir = tempfile::tempdir().unwrap();
        let mut mocks = Mocks::with_prefix();
        mocks
            .translator
            .expect_translate()
            .times(2)
            .returning(|text, _| Ok(text.to_string()));
        // No expectations on synthesizer / replace_audio / mix_audio: any
        // invocation panics and fails the language, which the success
        // assertions below would catch.

        let pipeline = mocks.into_pipeline();
        let job = job(&["es", "fr"], subtitles_only(), dir.path());

        let result = pipeline.run(&job).await.unwrap();
        assert_eq!(result.video_title, "Test Video");
        assert_eq!(result.results.len(), 2);
        for lang_result in &result.results {
            assert!(lang_result.succeeded());
            assert!(lang_result.subtitle_path.is_some());
            assert!(lang_result.dubbed_path.is_none());
        }
    }

    #[tokio::test]
    async fn test_dub_without_preserve_replaces_audio() {
        let dir = tempfile::tempdir().unwrap();
        let mut mocks = Mocks::with_prefix();
        mocks
            .translator
            .expect_translate()
            .times(1)
            .returning(|text, _| Ok(text.to_string()));
        mocks
            .synthesizer
            .expect_synthesize()
            .times(1)
            .returning(|_, _, _| Ok(()));
        mocks
            .media
            .expect_replace_audio()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let pipeline = mocks.into_pipeline();
        let flags = JobFlags {
            subtitles: false,
            dubbed: true,
            preserve_original: false,
        };
        let job = job(&["es"], flags, dir.path());

        let result = pipeline.run(&job).await.unwrap();
        assert_eq!(result.results[0].dubbed_path.as_deref(), Some("output_es.mp4"));
        assert!(result.results[0].subtitle_path.is_none());
    }

    #[tokio::test]
    async fn test_dub_with_preserve_mixes_audio() {
        let dir = tempfile::tempdir().unwrap();
        let mut mocks = Mocks::with_prefix();
        mocks
            .translator
            .expect_translate()
            .times(1)
            .returning(|text, _| Ok(text.to_string()));
        mocks
            .synthesizer
            .expect_synthesize()
            .times(1)
            .returning(|_, _, _| Ok(()));
        mocks
            .media
            .expect_mix_audio()
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let pipeline = mocks.into_pipeline();
        let flags = JobFlags {
            subtitles: false,
            dubbed: true,
            preserve_original: true,
        };
        let job = job(&["es"], flags, dir.path());

        let result = pipeline.run(&job).await.unwrap();
        assert!(result.results[0].succeeded());
        assert_eq!(result.results[0].dubbed_path.as_deref(), Some("output_es.mp4"));
    }

    #[tokio::test]
    async fn test_empty_language_list_rejected_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Mocks::empty().into_pipeline();
        let job = job(&[], subtitles_only(), dir.path());

        let err = pipeline.run(&job).await.unwrap_err();
        assert!(matches!(err, PolydubError::Validation(_)));
        // No directory was created and no service was invoked (the mocks
        // have no expectations and would panic on any call).
        assert!(!job.output_dir.exists());
    }

    #[tokio::test]
    async fn test_prefix_failure_aborts_whole_job() {
        let dir = tempfile::tempdir().unwrap();
        let mut mocks = Mocks::empty();
        mocks.fetcher.expect_fetch().times(1).returning(|_, _| {
            Err(PolydubError::Fetch("geo restricted".to_string()))
        });

        let pipeline = mocks.into_pipeline();
        let job = job(&["es", "fr"], subtitles_only(), dir.path());

        let err = pipeline.run(&job).await.unwrap_err();
        assert!(matches!(err, PolydubError::Fetch(_)));
        // No language work ran: the translator mock has no expectations.
    }

    #[tokio::test]
    async fn test_unintelligible_audio_completes_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let mut mocks = Mocks::empty();
        mocks.fetcher.expect_fetch().times(1).returning(|_, _| {
            Ok(FetchedVideo {
                title: "Silent Film".to_string(),
                duration: Some(30.0),
            })
        });
        mocks
            .media
            .expect_extract_audio()
            .times(1)
            .returning(|_, _| Ok(()));
        mocks.transcriber.expect_transcribe().times(1).returning(|_| {
            Err(PolydubError::Unintelligible("no speech recognized".to_string()))
        });
        // Translator is never consulted for an empty transcript.

        let pipeline = mocks.into_pipeline();
        let job = job(&["es"], subtitles_only(), dir.path());

        let result = pipeline.run(&job).await.unwrap();
        assert!(result.transcript_warning.is_some());
        assert!(result.results[0].succeeded());
        assert!(result.results[0].subtitle_path.is_some());
    }
}
