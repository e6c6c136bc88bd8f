use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{Result, PolydubError};

/// What a translation job should produce, as accepted at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub source_url: String,
    pub languages: Vec<String>,
    pub flags: JobFlags,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JobFlags {
    /// Emit a subtitle artifact per language
    pub subtitles: bool,
    /// Emit a dubbed video artifact per language
    pub dubbed: bool,
    /// Mix the original audio under the dub instead of replacing it
    pub preserve_original: bool,
}

impl JobRequest {
    /// Validate the request before any network or filesystem work starts.
    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(PolydubError::Validation(
                "source URL must not be empty".to_string(),
            ));
        }
        if self.languages.iter().all(|l| l.trim().is_empty()) {
            return Err(PolydubError::Validation(
                "at least one target language is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Requested languages with duplicates removed, in request order.
    pub fn deduplicated_languages(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for lang in &self.languages {
            let lang = lang.trim();
            if lang.is_empty() {
                continue;
            }
            if !seen.iter().any(|s: &String| s == lang) {
                seen.push(lang.to_string());
            }
        }
        seen
    }
}

/// One accepted translation job. The output directory is owned exclusively by
/// this job and created before any artifact write.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub request: JobRequest,
    pub output_dir: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(request: JobRequest, output_root: &std::path::Path) -> Self {
        let id = Uuid::new_v4();
        Self {
            output_dir: output_root.join(id.to_string()),
            id,
            request,
            created_at: Utc::now(),
        }
    }

    pub fn artifact_path(&self, kind: ArtifactKind, language: &str) -> PathBuf {
        self.output_dir.join(kind.file_name(language))
    }
}

/// Content role of a file inside a job's output directory. Filenames are a
/// deterministic function of (kind, language), so re-running the same job id
/// overwrites the same files and two languages never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    OriginalVideo,
    OriginalAudio,
    Subtitles,
    DubbedAudio,
    OutputVideo,
}

impl ArtifactKind {
    pub fn file_name(&self, language: &str) -> String {
        match self {
            ArtifactKind::OriginalVideo => "original.mp4".to_string(),
            ArtifactKind::OriginalAudio => "original_audio.wav".to_string(),
            ArtifactKind::Subtitles => format!("subtitles_{}.srt", language),
            ArtifactKind::DubbedAudio => format!("dubbed_{}.mp3", language),
            ArtifactKind::OutputVideo => format!("output_{}.mp4", language),
        }
    }
}

/// Outcome for one requested language. A missing expected artifact path plus
/// a populated `error` marks that language as failed without affecting
/// siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageResult {
    pub language: String,
    pub subtitle_path: Option<String>,
    pub dubbed_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LanguageResult {
    pub fn failed(language: &str, error: String) -> Self {
        Self {
            language: language.to_string(),
            subtitle_path: None,
            dubbed_path: None,
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate result of a completed job: one LanguageResult per requested
/// language, in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub video_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_warning: Option<String>,
    pub results: Vec<LanguageResult>,
}

/// Lifecycle of a job as seen by the job manager and the status poll.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed(JobResult),
    Failed { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(languages: &[&str]) -> JobRequest {
        JobRequest {
            source_url: "https://example.com/watch?v=abc".to_string(),
            languages: languages.iter().map(|s| s.to_string()).collect(),
            flags: JobFlags {
                subtitles: true,
                dubbed: false,
                preserve_original: true,
            },
        }
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let mut req = request(&["es"]);
        req.source_url = "  ".to_string();
        assert!(matches!(
            req.validate(),
            Err(PolydubError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_language_list() {
        let req = request(&[]);
        assert!(matches!(
            req.validate(),
            Err(PolydubError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_languages() {
        let req = request(&["", "  "]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_dedup_preserves_request_order() {
        let req = request(&["es", "fr", "es", "de", "fr"]);
        assert_eq!(req.deduplicated_languages(), vec!["es", "fr", "de"]);
    }

    #[test]
    fn test_artifact_names_are_deterministic_and_distinct() {
        let kinds = [
            ArtifactKind::OriginalVideo,
            ArtifactKind::OriginalAudio,
            ArtifactKind::Subtitles,
            ArtifactKind::DubbedAudio,
            ArtifactKind::OutputVideo,
        ];
        let mut names: Vec<String> = kinds.iter().map(|k| k.file_name("es")).collect();
        names.extend(
            [ArtifactKind::Subtitles, ArtifactKind::DubbedAudio, ArtifactKind::OutputVideo]
                .iter()
                .map(|k| k.file_name("fr")),
        );
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        // Deterministic: same inputs, same name
        assert_eq!(
            ArtifactKind::Subtitles.file_name("es"),
            ArtifactKind::Subtitles.file_name("es")
        );
        assert_eq!(ArtifactKind::Subtitles.file_name("es"), "subtitles_es.srt");
        assert_eq!(ArtifactKind::OutputVideo.file_name("fr"), "output_fr.mp4");
    }

    #[test]
    fn test_job_owns_id_scoped_output_dir() {
        let job = Job::new(request(&["es"]), std::path::Path::new("outputs"));
        assert!(job.output_dir.ends_with(job.id.to_string()));
        assert_eq!(
            job.artifact_path(ArtifactKind::OriginalVideo, ""),
            job.output_dir.join("original.mp4")
        );
    }
}
