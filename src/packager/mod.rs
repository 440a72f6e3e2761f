//! Segmentation and remux engine.
//!
//! For every input the [`Packager`] obtains the frame log, partitions the
//! frames into ranges, and extracts each range into its own file in the
//! input's sidecar directory:
//!
//! ```text
//! MetadataLoader -> BreakpointSelector/build_ranges -> chapters + RemuxDriver -> SyncVerifier
//! ```
//!
//! Inputs and ranges are processed one at a time. A failed input or range is
//! logged and skipped; only configuration problems stop the run.

pub mod breakpoints;
pub mod chapters;
pub mod driver;
pub mod loader;
pub mod plan;
pub mod ranges;
pub mod report;
pub mod sidecar;
pub mod verify;

use std::fmt;
use std::path::{Path, PathBuf};

use dvp_av::tools::{FFMPEG, MEDIAINFO};
use dvp_av::{CommandRunner, DurationProbe, MediaInfoProbe, ToolRegistry, Workspace};
use dvp_core::config::Config;
use dvp_core::{Error, FrameRecord, Range, Result};

pub use breakpoints::BreakpointSelector;
pub use chapters::Chapter;
pub use driver::{InputContext, RemuxDriver};
pub use loader::{LoadedLog, MetadataLoader};
pub use plan::OutputPlanner;
pub use sidecar::Sidecar;
pub use verify::{SyncMismatch, SyncVerifier};

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub inputs_processed: usize,
    pub inputs_skipped: usize,
    /// Inputs whose frame log came from an earlier run's sidecar.
    pub logs_reused: usize,
    pub ranges_found: usize,
    pub outputs_written: usize,
    pub ranges_failed: usize,
    pub sync_warnings: usize,
}

impl RunSummary {
    fn absorb(&mut self, input: RunSummary) {
        self.inputs_processed += input.inputs_processed;
        self.inputs_skipped += input.inputs_skipped;
        self.logs_reused += input.logs_reused;
        self.ranges_found += input.ranges_found;
        self.outputs_written += input.outputs_written;
        self.ranges_failed += input.ranges_failed;
        self.sync_warnings += input.sync_warnings;
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} input(s) processed ({} with a reused frame log), {} skipped; {} range(s), {} written, {} failed; {} sync warning(s)",
            self.inputs_processed,
            self.logs_reused,
            self.inputs_skipped,
            self.ranges_found,
            self.outputs_written,
            self.ranges_failed,
            self.sync_warnings
        )
    }
}

/// Runs the whole engine with one validated [`Config`].
pub struct Packager<'a> {
    config: &'a Config,
    tools: &'a ToolRegistry,
    runner: &'a dyn CommandRunner,
    planner: OutputPlanner,
    selector: BreakpointSelector,
    ffmpeg: Option<PathBuf>,
}

impl<'a> Packager<'a> {
    /// Validate the configuration and required tools before any input is
    /// touched. Every error returned here is a configuration error.
    pub fn new(config: &'a Config, tools: &'a ToolRegistry, runner: &'a dyn CommandRunner) -> Result<Self> {
        config.validate()?;
        let planner = OutputPlanner::new(&config.output)?;

        let ffmpeg = if config.report_only {
            None
        } else {
            let tool = tools
                .require(FFMPEG)
                .map_err(|e| Error::configuration(e.to_string()))?;
            Some(tool.path.clone())
        };

        Ok(Self {
            config,
            tools,
            runner,
            planner,
            selector: BreakpointSelector::new(config.policy),
            ffmpeg,
        })
    }

    pub async fn run(&self, inputs: &[PathBuf]) -> RunSummary {
        let mut summary = RunSummary::default();
        for input in inputs {
            match self.process_input(input).await {
                Ok(outcome) => summary.absorb(outcome),
                Err(e) => {
                    tracing::warn!("Skipping {}: {e}", input.display());
                    summary.inputs_skipped += 1;
                }
            }
        }
        tracing::info!("{summary}");
        summary
    }

    /// Load, segment, and (unless reporting) extract one input.
    pub async fn process_input(&self, input: &Path) -> Result<RunSummary> {
        if !input.is_file() {
            return Err(Error::source_acquisition(input, "not a readable file"));
        }
        println!("{}", input.display());

        let sidecar = Sidecar::for_input(input, &self.config.sidecar_suffix)?;
        let workspace = Workspace::new()?;
        let loader = MetadataLoader::new(
            self.tools,
            self.runner,
            self.config.output.embed_technical_subtitles,
        );
        let loaded = loader.load(input, &sidecar, &workspace).await?;
        if loaded.reused {
            println!("  (reusing {})", sidecar.log_path().display());
        }
        let frames = &loaded.log.frames;

        let ranges = ranges::build_ranges(frames, &self.selector);
        tracing::info!(
            "{}: {} frames, {} range(s)",
            input.display(),
            frames.len(),
            ranges.len()
        );

        let mut outcome = RunSummary {
            inputs_processed: 1,
            logs_reused: usize::from(loaded.reused),
            ranges_found: ranges.len(),
            ..Default::default()
        };

        if self.config.report_only {
            print!("{}", report::range_table(frames, &ranges));
            return Ok(outcome);
        }

        let Some(ffmpeg) = self.ffmpeg.clone() else {
            return Err(Error::configuration("ffmpeg is required to write outputs"));
        };
        let driver = RemuxDriver::new(self.planner.plan(), &self.config.output, ffmpeg, self.runner);
        let probe = self
            .tools
            .get(MEDIAINFO)
            .map(|tool| MediaInfoProbe::new(tool.path.clone(), self.runner));
        let verifier = SyncVerifier::new(probe.as_ref().map(|p| p as &dyn DurationProbe));

        let context = InputContext {
            source: input,
            format: &loaded.log.format,
            sidecar: &sidecar,
            workspace: &workspace,
            subtitles: loaded.subtitles.as_deref(),
            captions: loaded.captions.as_deref(),
        };

        for range in &ranges {
            match self.package_range(range, frames, &context, &driver).await {
                Ok(output) => {
                    println!("  {} -> {}", range.start_pts, output.display());
                    outcome.outputs_written += 1;
                    if verifier.verify(&output).await.is_some() {
                        outcome.sync_warnings += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!("{e}");
                    outcome.ranges_failed += 1;
                }
            }
        }

        Ok(outcome)
    }

    async fn package_range(
        &self,
        range: &Range,
        frames: &[FrameRecord],
        context: &InputContext<'_>,
        driver: &RemuxDriver<'_>,
    ) -> Result<PathBuf> {
        let chapters = chapters::synthesize(frames, range);
        let metadata = if chapters.is_empty() || !self.planner.plan().chapters {
            None
        } else {
            let path = context
                .workspace
                .temp_file(&format!("{}.ffmetadata", context.sidecar.output_stem(range)));
            std::fs::write(&path, chapters::write_ffmetadata(&chapters))?;
            tracing::debug!("{} chapter(s) for range {}", chapters.len(), range.start_pts);
            Some(path)
        };

        let job = driver.job_for(range, context, metadata)?;
        std::fs::create_dir_all(context.sidecar.dir())?;
        driver.extract(range, &job).await
    }
}
