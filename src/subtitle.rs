use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::Result;

/// Cue span used when the source duration is unknown.
const FALLBACK_CUE_SECONDS: f64 = 3600.0;

/// Write an SRT file holding the full translated text as a single cue.
///
/// Known limitation: no per-segment timing is produced — the one cue spans
/// the whole source duration (or a fixed fallback). The output is still a
/// well-formed SRT block that standard players accept.
pub async fn write_srt<P: AsRef<Path>>(
    text: &str,
    duration_secs: Option<f64>,
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    let end = duration_secs
        .filter(|d| *d > 0.0)
        .unwrap_or(FALLBACK_CUE_SECONDS);

    let srt_content = format!(
        "1\n{} --> {}\n{}\n\n",
        format_srt_time(0.0),
        format_srt_time(end),
        text.trim()
    );

    fs::write(output_path, srt_content).await?;

    info!("SRT file generated successfully");
    Ok(())
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm)
fn format_srt_time(seconds: f64) -> String {
    let total_milliseconds = (seconds * 1000.0) as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(65.123), "00:01:05,123");
        assert_eq!(format_srt_time(3661.500), "01:01:01,500");
    }

    #[tokio::test]
    async fn test_single_cue_round_trips_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subtitles_es.srt");
        let text = "Hola mundo.\nSegunda línea.";

        write_srt(text, Some(61.5), &path).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("1"));
        assert_eq!(lines.next(), Some("00:00:00,000 --> 00:01:01,500"));
        // Remaining cue body equals the translated text
        let body: Vec<&str> = lines.take_while(|l| !l.is_empty()).collect();
        assert_eq!(body.join("\n"), text);
    }

    #[tokio::test]
    async fn test_unknown_duration_uses_fallback_span() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subtitles_fr.srt");

        write_srt("Bonjour", None, &path).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("00:00:00,000 --> 01:00:00,000"));
    }
}
