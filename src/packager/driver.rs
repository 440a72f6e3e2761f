//! Range extraction.
//!
//! [`RemuxDriver::job_for`] derives the extraction parameters of one range
//! without touching the filesystem; [`RemuxDriver::extract`] runs them.

use std::path::{Path, PathBuf};

use dvp_av::{CommandRunner, RemuxJob, Seek, SideInput, Workspace};
use dvp_core::config::OutputOptions;
use dvp_core::{Error, OutputPlan, Range, Result, SourceFormat};

use super::sidecar::Sidecar;

/// Per-input facts the driver needs for every range of that input.
#[derive(Debug, Clone, Copy)]
pub struct InputContext<'a> {
    pub source: &'a Path,
    pub format: &'a SourceFormat,
    pub sidecar: &'a Sidecar,
    pub workspace: &'a Workspace,
    pub subtitles: Option<&'a Path>,
    pub captions: Option<&'a Path>,
}

pub struct RemuxDriver<'a> {
    plan: &'a OutputPlan,
    options: &'a OutputOptions,
    ffmpeg: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> RemuxDriver<'a> {
    pub fn new(
        plan: &'a OutputPlan,
        options: &'a OutputOptions,
        ffmpeg: PathBuf,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            plan,
            options,
            ffmpeg,
            runner,
        }
    }

    /// Resolve the extraction of `range`. `chapters` is the ffmetadata file
    /// for this range, if one was written.
    pub fn job_for(
        &self,
        range: &Range,
        input: &InputContext<'_>,
        chapters: Option<PathBuf>,
    ) -> Result<RemuxJob> {
        let output = input.sidecar.output_path(range, &self.plan.extension);

        let (seek, frame_limit, intermediate) = match input.format {
            SourceFormat::Elementary => {
                let offset = range.byte_offset.ok_or_else(|| {
                    Error::malformed(format!("range at {} has no byte offset", range.start_pts))
                })?;
                (Seek::ByteOffset(offset), range.frame_limit(), None)
            }
            SourceFormat::Wrapped(_) => {
                let name = format!("{}.dv", input.sidecar.output_stem(range));
                (
                    Seek::Timestamp {
                        start: range.start_pts,
                        end: range.end_pts,
                    },
                    None,
                    Some(input.workspace.temp_file(&name)),
                )
            }
        };

        let embeds = self.plan.subtitle_codec().is_some();
        let subtitles = input
            .subtitles
            .filter(|_| embeds && self.options.embed_technical_subtitles)
            .map(|path| SideInput {
                path: path.to_path_buf(),
                seek: range.start_pts,
                language: None,
                title: "Technical subtitles".into(),
            });
        let captions = input.captions.filter(|_| embeds).map(|path| SideInput {
            path: path.to_path_buf(),
            seek: range.start_pts,
            language: self.options.caption_language.clone(),
            title: "Captions".into(),
        });

        Ok(RemuxJob {
            source: input.source.to_path_buf(),
            seek,
            frame_limit,
            intermediate,
            subtitles,
            captions,
            chapters: chapters.filter(|_| self.plan.chapters),
            audio_languages: [
                self.options.audio_language.clone(),
                self.options.secondary_audio_language.clone(),
            ],
            plan: self.plan.clone(),
            output,
        })
    }

    /// Run the job's commands in order. A failed range leaves no partial output.
    pub async fn extract(&self, range: &Range, job: &RemuxJob) -> Result<PathBuf> {
        for cmd in job.commands(&self.ffmpeg) {
            if let Err(e) = self.runner.run(&cmd).await {
                if job.output.exists() {
                    if let Err(rm) = std::fs::remove_file(&job.output) {
                        tracing::debug!("Could not remove partial output {}: {rm}", job.output.display());
                    }
                }
                return Err(Error::remux(range.start_pts, e));
            }
        }
        Ok(job.output.clone())
    }
}
