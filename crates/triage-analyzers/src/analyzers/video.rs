//! Frame-sampling video analyzer
//!
//! ffprobe reports the duration, ffmpeg writes up to `max_frames` evenly
//! spaced JPEG frames into a guard-owned directory, and each frame is
//! classified. The result is the per-label maximum across frames.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;

use triage_core::{ScanTarget, TriageConfig, TypeFamily};
use triage_processing::ResourceGuard;

use super::image::decode_owned;
use crate::analyzer::{merge_max, Analyzer, RawScores};
use crate::error::AnalyzerError;
use crate::pool::AnalyzerPool;

const FRAME_PATTERN: &str = "frame_%04d.jpg";

#[derive(Debug, Clone)]
pub struct FrameSampling {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub max_frames: u32,
    pub max_interval_seconds: u64,
    /// Bound on probing plus extraction for one video.
    pub timeout: Duration,
}

impl Default for FrameSampling {
    fn default() -> Self {
        Self::from_config(&TriageConfig::default())
    }
}

impl FrameSampling {
    pub fn from_config(config: &TriageConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            max_frames: config.ffmpeg_max_frames,
            max_interval_seconds: config.max_interval_seconds,
            timeout: config.ffmpeg_timeout,
        }
    }

    /// Seconds between sampled frames.
    ///
    /// `min(duration / max_frames, max_interval)`; an unknown duration samples
    /// at the maximum interval.
    pub fn interval(&self, duration: Option<f64>) -> f64 {
        let max_interval = self.max_interval_seconds.max(1) as f64;
        match duration {
            Some(d) if d.is_finite() && d > 0.0 => {
                (d / f64::from(self.max_frames.max(1))).min(max_interval)
            }
            _ => max_interval,
        }
    }
}

#[derive(Debug)]
pub struct VideoAnalyzer {
    pool: Arc<AnalyzerPool>,
    sampling: FrameSampling,
}

impl VideoAnalyzer {
    pub fn new(pool: Arc<AnalyzerPool>, sampling: FrameSampling) -> Self {
        Self { pool, sampling }
    }

    #[tracing::instrument(skip(self), fields(process.executable.path = %self.sampling.ffprobe_path))]
    async fn probe_duration(&self, video: &Path) -> Result<Option<f64>, AnalyzerError> {
        let output = Command::new(&self.sampling.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(video)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AnalyzerError::tool("ffprobe", format!("failed to execute: {}", e)))?;

        if !output.status.success() {
            return Err(AnalyzerError::tool(
                "ffprobe",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let probe: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| AnalyzerError::tool("ffprobe", format!("unreadable output: {}", e)))?;
        Ok(probe["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok()))
    }

    async fn extract_frames(
        &self,
        video: &Path,
        out_dir: &Path,
        interval: f64,
    ) -> Result<(), AnalyzerError> {
        let filter = format!("fps={:.6}", 1.0 / interval);
        let output = Command::new(&self.sampling.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-i"])
            .arg(video)
            .arg("-vf")
            .arg(&filter)
            .arg("-frames:v")
            .arg(self.sampling.max_frames.max(1).to_string())
            .args(["-q:v", "2"])
            .arg(out_dir.join(FRAME_PATTERN))
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AnalyzerError::tool("ffmpeg", format!("failed to execute: {}", e)))?;

        if !output.status.success() {
            return Err(AnalyzerError::tool(
                "ffmpeg",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    /// Probe and extract, returning the frame files in timeline order.
    async fn sample(
        &self,
        video: &Path,
        guard: &ResourceGuard,
    ) -> Result<Vec<PathBuf>, AnalyzerError> {
        let duration = self.probe_duration(video).await?;
        let interval = self.sampling.interval(duration);
        let frames_dir = guard.create_dir()?;

        tracing::debug!(
            duration = ?duration,
            interval,
            max_frames = self.sampling.max_frames,
            "Sampling video frames"
        );
        self.extract_frames(video, frames_dir.path(), interval).await?;
        list_frames(frames_dir.path()).await
    }

    /// Classify every frame, keeping the per-label maximum.
    ///
    /// Frames that fail to decode are skipped; at least one must succeed.
    pub(crate) async fn classify_frames(
        &self,
        frames: &[PathBuf],
    ) -> Result<RawScores, AnalyzerError> {
        let mut scores = RawScores::new();
        let mut classified = 0usize;

        for frame in frames {
            let bytes = tokio::fs::read(frame).await?;
            let image = match decode_owned(bytes, Some(".jpg".to_string())).await {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(frame = %frame.display(), error = %e, "Skipping undecodable frame");
                    continue;
                }
            };
            merge_max(&mut scores, self.pool.classify(&image).await?);
            classified += 1;
        }

        if classified == 0 {
            return Err(AnalyzerError::Decode("no frames could be sampled".to_string()));
        }
        Ok(scores)
    }
}

#[async_trait]
impl Analyzer for VideoAnalyzer {
    fn name(&self) -> &str {
        "video"
    }

    fn family(&self) -> TypeFamily {
        TypeFamily::Video
    }

    async fn analyze(
        &self,
        target: &ScanTarget,
        guard: &ResourceGuard,
    ) -> Result<RawScores, AnalyzerError> {
        let started = Instant::now();
        let frames = tokio::time::timeout(self.sampling.timeout, self.sample(&target.path, guard))
            .await
            .map_err(|_| AnalyzerError::Timeout("frame sampling".to_string()))??;

        tracing::debug!(
            file = %target.display_name,
            frames = frames.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Frames sampled"
        );
        self.classify_frames(&frames).await
    }
}

async fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, AnalyzerError> {
    let mut frames = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "jpg") {
            frames.push(path);
        }
    }
    // frame_%04d sorts lexically in timeline order
    frames.sort();
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{png_bytes, target_at, SequenceClassifier};

    fn sampling() -> FrameSampling {
        FrameSampling {
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            max_frames: 20,
            max_interval_seconds: 30,
            timeout: Duration::from_secs(5),
        }
    }

    fn analyzer(classifier: SequenceClassifier) -> VideoAnalyzer {
        let pool = AnalyzerPool::with_classifier(Arc::new(classifier));
        VideoAnalyzer::new(Arc::new(pool), sampling())
    }

    #[test]
    fn interval_spreads_frames_over_duration() {
        let sampling = sampling();
        assert_eq!(sampling.interval(Some(100.0)), 5.0);
        // Long videos are capped at the maximum interval.
        assert_eq!(sampling.interval(Some(3600.0)), 30.0);
        assert_eq!(sampling.interval(None), 30.0);
        assert_eq!(sampling.interval(Some(f64::NAN)), 30.0);
        assert_eq!(sampling.interval(Some(0.0)), 30.0);
    }

    #[tokio::test]
    async fn frames_are_listed_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["frame_0002.jpg", "frame_0001.jpg", "frame_0010.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let frames = list_frames(dir.path()).await.unwrap();
        let names: Vec<String> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["frame_0001.jpg", "frame_0002.jpg", "frame_0010.jpg"]);
    }

    #[tokio::test]
    async fn per_label_maximum_across_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut frames = Vec::new();
        for i in 1..=3 {
            let path = dir.path().join(format!("frame_{:04}.jpg", i));
            std::fs::write(&path, png_bytes(2, 2)).unwrap();
            frames.push(path);
        }

        let analyzer = analyzer(SequenceClassifier::new(vec![
            vec![("porn", 0.1), ("neutral", 0.9)],
            vec![("porn", 0.75), ("neutral", 0.2)],
            vec![("porn", 0.3), ("neutral", 0.6)],
        ]));
        let scores = analyzer.classify_frames(&frames).await.unwrap();
        assert_eq!(scores.get("porn"), Some(&0.75));
        assert_eq!(scores.get("neutral"), Some(&0.9));
    }

    #[tokio::test]
    async fn undecodable_frames_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("frame_0001.jpg");
        std::fs::write(&bad, b"not a jpeg").unwrap();
        let good = dir.path().join("frame_0002.jpg");
        std::fs::write(&good, png_bytes(2, 2)).unwrap();

        let analyzer = analyzer(SequenceClassifier::new(vec![vec![("porn", 0.4)]]));
        let scores = analyzer
            .classify_frames(&[bad.clone(), good])
            .await
            .unwrap();
        assert_eq!(scores.get("porn"), Some(&0.4));

        let err = analyzer.classify_frames(&[bad]).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_ffprobe_is_a_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"\0\0\0\x18ftypmp42").unwrap();
        let target = target_at(&path, TypeFamily::Video, "video/mp4", ".mp4");
        let guard = ResourceGuard::in_dir(dir.path());

        let err = analyzer(SequenceClassifier::new(vec![]))
            .analyze(&target, &guard)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Tool { tool: "ffprobe", .. }));
        assert_eq!(guard.tracked(), 0);
    }
}
