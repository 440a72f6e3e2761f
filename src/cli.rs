use clap::{Args, Parser, Subcommand};
use dvp_core::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dvpackager")]
#[command(author, version, about = "Split and rewrap captured DV into playable files")]
pub struct Cli {
    /// Path to JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (echoes every external command)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Segment one or more DV captures and write one file per range
    Package(PackageArgs),

    /// Check that required external tools are available
    CheckTools {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        tools: ToolPathArgs,
    },

    /// Display version information
    Version,
}

#[derive(Args)]
pub struct PackageArgs {
    /// Input files (raw DV or DV wrapped in another container)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Never split; produce exactly one output per input
    #[arg(long)]
    pub ignore_technical_changes: bool,

    /// Split where the camera signalled a new recording
    #[arg(long)]
    pub split_on_recording_start: bool,

    /// Split where the recording date/time jumps
    #[arg(long)]
    pub split_on_rdt_discontinuity: bool,

    /// Split where the timecode jumps
    #[arg(long)]
    pub split_on_tc_discontinuity: bool,

    /// Print the ranges that would be produced and stop
    #[arg(long)]
    pub report_only: bool,

    /// Extract raw DV instead of rewrapping (implies `-e dv`)
    #[arg(long)]
    pub unpackage: bool,

    /// Embed the technical subtitle track
    #[arg(long)]
    pub embed_subtitles: bool,

    /// Output extension: mkv, mov, or dv [default: mkv]
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Language tag for the first audio stream
    #[arg(long)]
    pub audio_language: Option<String>,

    /// Language tag for the second audio stream
    #[arg(long)]
    pub secondary_audio_language: Option<String>,

    /// Language tag for the caption stream
    #[arg(long)]
    pub caption_language: Option<String>,

    /// Suffix of the per-input sidecar directory
    #[arg(long)]
    pub sidecar_suffix: Option<String>,

    #[command(flatten)]
    pub tools: ToolPathArgs,
}

#[derive(Args, Default)]
pub struct ToolPathArgs {
    /// Path to the dvrescue executable
    #[arg(long)]
    pub dvrescue_path: Option<PathBuf>,

    /// Path to the ffmpeg executable
    #[arg(long)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Path to the mediainfo executable
    #[arg(long)]
    pub mediainfo_path: Option<PathBuf>,
}

impl ToolPathArgs {
    /// Command-line paths win over the config file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(p) = &self.dvrescue_path {
            config.tools.dvrescue_path = Some(p.clone());
        }
        if let Some(p) = &self.ffmpeg_path {
            config.tools.ffmpeg_path = Some(p.clone());
        }
        if let Some(p) = &self.mediainfo_path {
            config.tools.mediainfo_path = Some(p.clone());
        }
    }
}

impl PackageArgs {
    /// Overlay flags on a loaded config. Boolean flags only ever switch
    /// behaviour on; values replace what the file set.
    pub fn apply(&self, config: &mut Config) {
        let policy = &mut config.policy;
        policy.force_no_split |= self.ignore_technical_changes;
        policy.split_on_recording_start |= self.split_on_recording_start;
        policy.split_on_recording_timestamp_discontinuity |= self.split_on_rdt_discontinuity;
        policy.split_on_timecode_discontinuity |= self.split_on_tc_discontinuity;

        config.report_only |= self.report_only;

        let output = &mut config.output;
        output.unpackage |= self.unpackage;
        output.embed_technical_subtitles |= self.embed_subtitles;
        if let Some(ext) = &self.extension {
            output.extension = Some(ext.clone());
        }
        if let Some(lang) = &self.audio_language {
            output.audio_language = Some(lang.clone());
        }
        if let Some(lang) = &self.secondary_audio_language {
            output.secondary_audio_language = Some(lang.clone());
        }
        if let Some(lang) = &self.caption_language {
            output.caption_language = Some(lang.clone());
        }
        if let Some(suffix) = &self.sidecar_suffix {
            config.sidecar_suffix = suffix.clone();
        }

        self.tools.apply(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn package_flags_overlay_config() {
        let cli = parse(&[
            "dvpackager",
            "package",
            "--split-on-recording-start",
            "--split-on-tc-discontinuity",
            "-e",
            "mov",
            "--audio-language",
            "eng",
            "--ffmpeg-path",
            "/opt/ffmpeg",
            "a.dv",
            "b.dv",
        ]);
        let Commands::Package(args) = cli.command else {
            panic!("expected package");
        };
        assert_eq!(args.inputs.len(), 2);

        let mut config = Config::default();
        args.apply(&mut config);
        assert!(config.policy.split_on_recording_start);
        assert!(config.policy.split_on_timecode_discontinuity);
        assert!(!config.policy.split_on_recording_timestamp_discontinuity);
        assert!(!config.policy.force_no_split);
        assert_eq!(config.output.extension.as_deref(), Some("mov"));
        assert_eq!(config.output.audio_language.as_deref(), Some("eng"));
        assert_eq!(config.tools.ffmpeg_path, Some(PathBuf::from("/opt/ffmpeg")));
    }

    #[test]
    fn flags_keep_config_file_values() {
        let cli = parse(&["dvpackager", "package", "a.dv"]);
        let Commands::Package(args) = cli.command else {
            panic!("expected package");
        };

        let mut config = Config::from_json(r#"{"output": {"extension": "dv"}, "report_only": true}"#).unwrap();
        args.apply(&mut config);
        assert_eq!(config.output.extension.as_deref(), Some("dv"));
        assert!(config.report_only);
    }

    #[test]
    fn package_requires_inputs() {
        assert!(Cli::try_parse_from(["dvpackager", "package"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["dvpackager", "check-tools", "--verbose", "--json"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::CheckTools { json: true, .. }));
    }
}
