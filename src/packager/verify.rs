//! Post-remux audio/video duration check.

use std::path::{Path, PathBuf};

use dvp_av::{DurationProbe, TrackDurations};
use dvp_core::Timestamp;

/// Largest tolerated difference between video and audio track durations.
pub const SYNC_TOLERANCE: Timestamp = Timestamp::from_millis(33);

/// A produced file whose audio and video durations disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMismatch {
    pub output: PathBuf,
    pub video: Timestamp,
    pub audio: Timestamp,
    pub drift: Timestamp,
}

pub struct SyncVerifier<'a> {
    probe: Option<&'a dyn DurationProbe>,
}

impl<'a> SyncVerifier<'a> {
    /// `None` disables the check (no probe tool available).
    pub fn new(probe: Option<&'a dyn DurationProbe>) -> Self {
        Self { probe }
    }

    /// Advisory only: probe failures skip the check.
    pub async fn verify(&self, output: &Path) -> Option<SyncMismatch> {
        let Some(probe) = self.probe else {
            tracing::debug!("No duration probe; skipping sync check for {}", output.display());
            return None;
        };

        let durations = match probe.track_durations(output).await {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!("Sync check skipped for {}: {e}", output.display());
                return None;
            }
        };

        let mismatch = compare(&durations).map(|(video, audio, drift)| SyncMismatch {
            output: output.to_path_buf(),
            video,
            audio,
            drift,
        });
        if let Some(m) = &mismatch {
            tracing::warn!(
                "Audio/video duration mismatch in {}: video {} audio {} (off by {} ms)",
                m.output.display(),
                m.video,
                m.audio,
                m.drift.as_millis()
            );
        }
        mismatch
    }
}

/// The audio track furthest from the video duration, if beyond tolerance.
fn compare(durations: &TrackDurations) -> Option<(Timestamp, Timestamp, Timestamp)> {
    let video = durations.video?;
    durations
        .audio
        .iter()
        .map(|&audio| (video, audio, video.abs_diff(audio)))
        .max_by_key(|&(_, _, drift)| drift)
        .filter(|&(_, _, drift)| drift > SYNC_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn durations(video: u64, audio: &[u64]) -> TrackDurations {
        TrackDurations {
            video: Some(Timestamp::from_millis(video)),
            audio: audio.iter().map(|&a| Timestamp::from_millis(a)).collect(),
        }
    }

    #[test]
    fn drift_beyond_tolerance_is_reported() {
        let (_, audio, drift) = compare(&durations(5000, &[5040])).unwrap();
        assert_eq!(audio, Timestamp::from_millis(5040));
        assert_eq!(drift, Timestamp::from_millis(40));
    }

    #[test]
    fn drift_within_tolerance_is_ignored() {
        assert!(compare(&durations(5000, &[5020])).is_none());
        assert!(compare(&durations(5000, &[5033])).is_none());
        assert!(compare(&durations(5000, &[4967])).is_none());
    }

    #[test]
    fn worst_audio_track_counts() {
        let (_, audio, _) = compare(&durations(5000, &[5010, 4950])).unwrap();
        assert_eq!(audio, Timestamp::from_millis(4950));
    }

    #[test]
    fn missing_tracks_skip_check() {
        assert!(compare(&TrackDurations::default()).is_none());
        assert!(compare(&durations(5000, &[])).is_none());
    }

    struct FixedProbe(dvp_core::Result<TrackDurations>);

    #[async_trait]
    impl DurationProbe for FixedProbe {
        async fn track_durations(&self, _path: &Path) -> dvp_core::Result<TrackDurations> {
            match &self.0 {
                Ok(d) => Ok(d.clone()),
                Err(e) => Err(dvp_core::Error::tool("mediainfo", e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn verify_reports_mismatch() {
        let probe = FixedProbe(Ok(durations(5000, &[5040])));
        let verifier = SyncVerifier::new(Some(&probe));
        let m = verifier.verify(Path::new("/out/a.mkv")).await.unwrap();
        assert_eq!(m.output, Path::new("/out/a.mkv"));
        assert_eq!(m.drift, Timestamp::from_millis(40));
    }

    #[tokio::test]
    async fn probe_failure_or_absence_is_silent() {
        let probe = FixedProbe(Err(dvp_core::Error::tool("mediainfo", "exit 1")));
        assert!(SyncVerifier::new(Some(&probe)).verify(Path::new("/out/a.mkv")).await.is_none());
        assert!(SyncVerifier::new(None).verify(Path::new("/out/a.mkv")).await.is_none());
    }
}
