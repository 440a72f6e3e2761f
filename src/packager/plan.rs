//! Output container policy.

use dvp_core::config::OutputOptions;
use dvp_core::{Error, OutputPlan, Result, SubtitleHandling};

/// Extensions that have a fixed stream-mapping policy.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mkv", "mov", "dv"];

/// Resolves the requested extension to an [`OutputPlan`] once per run.
///
/// Without an explicit extension, unpackage mode selects `dv` and every other
/// run selects `mkv`.
#[derive(Debug, Clone)]
pub struct OutputPlanner {
    plan: OutputPlan,
}

impl OutputPlanner {
    pub fn new(options: &OutputOptions) -> Result<Self> {
        let requested = options.extension.as_deref().map(|e| e.trim().trim_start_matches('.'));
        let extension = match requested {
            Some(ext) => ext.to_ascii_lowercase(),
            None if options.unpackage => "dv".into(),
            None => "mkv".into(),
        };

        let plan = match extension.as_str() {
            "mkv" => OutputPlan {
                extension,
                container_format: "matroska".into(),
                audio_codec: "pcm_s16le".into(),
                subtitle_handling: SubtitleHandling::Embed {
                    codec: "webvtt".into(),
                },
                resample_audio: false,
                chapters: true,
            },
            "mov" => OutputPlan {
                extension,
                container_format: "mov".into(),
                audio_codec: "pcm_s16le".into(),
                subtitle_handling: SubtitleHandling::Embed {
                    codec: "mov_text".into(),
                },
                resample_audio: true,
                chapters: true,
            },
            "dv" => OutputPlan {
                extension,
                container_format: "dv".into(),
                audio_codec: "copy".into(),
                subtitle_handling: SubtitleHandling::Disabled,
                resample_audio: false,
                chapters: false,
            },
            _ => {
                return Err(Error::configuration(format!(
                    "unsupported output extension {:?} (expected one of: {})",
                    extension,
                    SUPPORTED_EXTENSIONS.join(", ")
                )))
            }
        };

        if options.unpackage && plan.extension != "dv" {
            return Err(Error::configuration(format!(
                "unpackage mode writes raw DV; extension {:?} is not allowed",
                plan.extension
            )));
        }

        Ok(Self { plan })
    }

    pub fn plan(&self) -> &OutputPlan {
        &self.plan
    }
}
