//! ffmpeg command construction for extracting one range into one output.
//!
//! A [`RemuxJob`] is the fully resolved description of a single extraction.
//! [`RemuxJob::commands`] turns it into one command (raw DV source, seeked by
//! byte offset) or two commands (wrapped source: trim into a raw DV
//! intermediate first, then remux the intermediate).

use std::path::{Path, PathBuf};

use dvp_core::{OutputPlan, Timestamp};

use crate::command::ToolCommand;

/// How the start of a range is located in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seek {
    /// Skip this many bytes of a raw DV stream.
    ByteOffset(u64),
    /// Trim a wrapped container by presentation time.
    Timestamp { start: Timestamp, end: Timestamp },
}

/// A time-aligned side-channel input (technical subtitles or captions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideInput {
    pub path: PathBuf,
    /// Offset into the side-channel file matching the range start.
    pub seek: Timestamp,
    pub language: Option<String>,
    pub title: String,
}

/// Everything needed to extract one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemuxJob {
    pub source: PathBuf,
    pub seek: Seek,
    /// Video frame bound; `None` extracts to end of stream.
    pub frame_limit: Option<usize>,
    /// Raw DV file the trimmed segment of a wrapped source is written to.
    pub intermediate: Option<PathBuf>,
    pub subtitles: Option<SideInput>,
    pub captions: Option<SideInput>,
    /// ffmetadata file merged as global metadata and chapters.
    pub chapters: Option<PathBuf>,
    /// Language tags for the first and second audio streams.
    pub audio_languages: [Option<String>; 2],
    pub plan: OutputPlan,
    pub output: PathBuf,
}

impl RemuxJob {
    /// Build the ffmpeg invocations for this job, in execution order.
    pub fn commands(&self, ffmpeg: &Path) -> Vec<ToolCommand> {
        match (self.seek, &self.intermediate) {
            (Seek::Timestamp { start, end }, Some(intermediate)) => {
                vec![
                    self.trim_command(ffmpeg, start, end, intermediate),
                    self.mux_command(ffmpeg, intermediate, &["-f", "dv"]),
                ]
            }
            (Seek::Timestamp { start, end }, None) => {
                let input_opts = ["-ss".to_string(), start.to_string(), "-to".into(), end.to_string()];
                vec![self.mux_command(ffmpeg, &self.source, &input_opts)]
            }
            (Seek::ByteOffset(offset), _) => {
                let input_opts = ["-skip_initial_bytes".to_string(), offset.to_string(), "-f".into(), "dv".into()];
                vec![self.mux_command(ffmpeg, &self.source, &input_opts)]
            }
        }
    }

    /// Stream-copy the trimmed segment of a wrapped source into raw DV.
    fn trim_command(
        &self,
        ffmpeg: &Path,
        start: Timestamp,
        end: Timestamp,
        intermediate: &Path,
    ) -> ToolCommand {
        let mut cmd = base_command(ffmpeg);
        cmd.args(["-ss".to_string(), start.to_string(), "-to".into(), end.to_string()]);
        cmd.arg("-i").path_arg(&self.source);
        cmd.args(["-map", "0:v:0", "-map", "0:a?", "-c", "copy", "-f", "dv"]);
        cmd.path_arg(intermediate);
        cmd
    }

    fn mux_command(
        &self,
        ffmpeg: &Path,
        source: &Path,
        input_opts: &[impl AsRef<str>],
    ) -> ToolCommand {
        let mut cmd = base_command(ffmpeg);
        cmd.args(input_opts.iter().map(|s| s.as_ref().to_string()));
        cmd.arg("-i").path_arg(source);

        let subtitle_codec = self.plan.subtitle_codec();
        let side_inputs: Vec<&SideInput> = match subtitle_codec {
            Some(_) => self.subtitles.iter().chain(self.captions.iter()).collect(),
            None => Vec::new(),
        };

        for side in &side_inputs {
            cmd.args(["-ss".to_string(), side.seek.to_string()]);
            cmd.arg("-i").path_arg(&side.path);
        }

        let chapters_index = side_inputs.len() + 1;
        let chapters = self.chapters.as_ref().filter(|_| self.plan.chapters);
        if let Some(chapters) = chapters {
            cmd.args(["-f", "ffmetadata", "-i"]).path_arg(chapters);
        }

        cmd.args(["-map", "0:v:0", "-map", "0:a?"]);
        for i in 1..=side_inputs.len() {
            cmd.args(["-map".to_string(), format!("{i}:0")]);
        }
        if chapters.is_some() {
            cmd.args([
                "-map_metadata".to_string(),
                chapters_index.to_string(),
                "-map_chapters".into(),
                chapters_index.to_string(),
            ]);
        }

        cmd.args(["-c:v", "copy", "-c:a"]).arg(self.plan.audio_codec.as_str());
        if self.plan.resample_audio {
            cmd.args(["-af", "aresample=async=1", "-ar", "48000"]);
        }
        if let (Some(codec), false) = (subtitle_codec, side_inputs.is_empty()) {
            cmd.args(["-c:s", codec]);
        }

        if let Some(limit) = self.frame_limit {
            cmd.args(["-frames:v".to_string(), limit.to_string()]);
        }

        for (i, lang) in self.audio_languages.iter().enumerate() {
            if let Some(lang) = lang {
                cmd.args([format!("-metadata:s:a:{i}"), format!("language={lang}")]);
            }
        }
        for (i, side) in side_inputs.iter().enumerate() {
            cmd.args([format!("-metadata:s:s:{i}"), format!("title={}", side.title)]);
            if let Some(lang) = &side.language {
                cmd.args([format!("-metadata:s:s:{i}"), format!("language={lang}")]);
            }
        }

        cmd.args(["-f", self.plan.container_format.as_str()]);
        cmd.path_arg(&self.output);
        cmd
    }
}

fn base_command(ffmpeg: &Path) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
    cmd.args(["-hide_banner", "-nostdin", "-y", "-loglevel", "error"]);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvp_core::SubtitleHandling;

    fn mkv_plan() -> OutputPlan {
        OutputPlan {
            extension: "mkv".into(),
            container_format: "matroska".into(),
            audio_codec: "pcm_s16le".into(),
            subtitle_handling: SubtitleHandling::Embed {
                codec: "webvtt".into(),
            },
            resample_audio: false,
            chapters: true,
        }
    }

    fn job(seek: Seek) -> RemuxJob {
        RemuxJob {
            source: PathBuf::from("/tapes/a.dv"),
            seek,
            frame_limit: None,
            intermediate: None,
            subtitles: None,
            captions: None,
            chapters: None,
            audio_languages: [None, None],
            plan: mkv_plan(),
            output: PathBuf::from("/tapes/a.dv_dvpackager/a_00-00-00.000.mkv"),
        }
    }

    fn has_pair(cmd: &ToolCommand, a: &str, b: &str) -> bool {
        cmd.get_args().windows(2).any(|w| w[0] == a && w[1] == b)
    }

    #[test]
    fn byte_offset_seek_with_frame_limit() {
        let mut j = job(Seek::ByteOffset(144_000 * 50));
        j.frame_limit = Some(120);
        let cmds = j.commands(Path::new("ffmpeg"));
        assert_eq!(cmds.len(), 1);
        let cmd = &cmds[0];
        assert!(has_pair(cmd, "-skip_initial_bytes", "7200000"));
        assert!(has_pair(cmd, "-frames:v", "120"));
        assert!(has_pair(cmd, "-f", "matroska"));
        assert_eq!(
            cmd.get_args().last().map(String::as_str),
            Some("/tapes/a.dv_dvpackager/a_00-00-00.000.mkv")
        );
    }

    #[test]
    fn open_range_has_no_frame_limit() {
        let cmds = job(Seek::ByteOffset(0)).commands(Path::new("ffmpeg"));
        assert!(!cmds[0].get_args().iter().any(|a| a == "-frames:v"));
    }

    #[test]
    fn wrapped_source_goes_through_intermediate() {
        let mut j = job(Seek::Timestamp {
            start: Timestamp::from_millis(1000),
            end: Timestamp::from_millis(5000),
        });
        j.source = PathBuf::from("/tapes/a.mov");
        j.intermediate = Some(PathBuf::from("/tmp/w/a_00-00-01.000.dv"));
        let cmds = j.commands(Path::new("ffmpeg"));
        assert_eq!(cmds.len(), 2);

        assert!(has_pair(&cmds[0], "-ss", "00:00:01.000"));
        assert!(has_pair(&cmds[0], "-to", "00:00:05.000"));
        assert!(has_pair(&cmds[0], "-i", "/tapes/a.mov"));
        assert_eq!(
            cmds[0].get_args().last().map(String::as_str),
            Some("/tmp/w/a_00-00-01.000.dv")
        );

        assert!(has_pair(&cmds[1], "-i", "/tmp/w/a_00-00-01.000.dv"));
        assert!(!cmds[1].get_args().iter().any(|a| a == "-skip_initial_bytes"));
    }

    #[test]
    fn side_inputs_chapters_and_languages() {
        let mut j = job(Seek::ByteOffset(0));
        j.subtitles = Some(SideInput {
            path: PathBuf::from("/s/a.dvrescue.vtt"),
            seek: Timestamp::from_millis(2000),
            language: None,
            title: "DV technical metadata".into(),
        });
        j.captions = Some(SideInput {
            path: PathBuf::from("/s/a.dvrescue.scc"),
            seek: Timestamp::from_millis(2000),
            language: Some("eng".into()),
            title: "Closed captions".into(),
        });
        j.chapters = Some(PathBuf::from("/tmp/w/chapters.ffmetadata"));
        j.audio_languages = [Some("eng".into()), Some("spa".into())];

        let cmd = &j.commands(Path::new("ffmpeg"))[0];
        assert!(has_pair(cmd, "-i", "/s/a.dvrescue.vtt"));
        assert!(has_pair(cmd, "-ss", "00:00:02.000"));
        assert!(has_pair(cmd, "-map", "1:0"));
        assert!(has_pair(cmd, "-map", "2:0"));
        assert!(has_pair(cmd, "-map_metadata", "3"));
        assert!(has_pair(cmd, "-map_chapters", "3"));
        assert!(has_pair(cmd, "-c:s", "webvtt"));
        assert!(has_pair(cmd, "-metadata:s:a:0", "language=eng"));
        assert!(has_pair(cmd, "-metadata:s:a:1", "language=spa"));
        assert!(has_pair(cmd, "-metadata:s:s:1", "language=eng"));
    }

    #[test]
    fn disabled_subtitles_drop_side_inputs() {
        let mut j = job(Seek::ByteOffset(0));
        j.plan = OutputPlan {
            extension: "dv".into(),
            container_format: "dv".into(),
            audio_codec: "copy".into(),
            subtitle_handling: SubtitleHandling::Disabled,
            resample_audio: false,
            chapters: false,
        };
        j.subtitles = Some(SideInput {
            path: PathBuf::from("/s/a.dvrescue.vtt"),
            seek: Timestamp::ZERO,
            language: None,
            title: "DV technical metadata".into(),
        });
        j.chapters = Some(PathBuf::from("/tmp/w/chapters.ffmetadata"));

        let cmd = &j.commands(Path::new("ffmpeg"))[0];
        let args = cmd.get_args();
        assert!(!args.iter().any(|a| a.ends_with(".vtt")));
        assert!(!args.iter().any(|a| a == "-map_chapters"));
        assert!(!args.iter().any(|a| a == "-c:s"));
        assert!(has_pair(cmd, "-c:a", "copy"));
        assert!(has_pair(cmd, "-f", "dv"));
    }

    #[test]
    fn resample_adds_audio_filter() {
        let mut j = job(Seek::ByteOffset(0));
        j.plan.resample_audio = true;
        let cmd = &j.commands(Path::new("ffmpeg"))[0];
        assert!(has_pair(cmd, "-af", "aresample=async=1"));
        assert!(has_pair(cmd, "-ar", "48000"));
    }
}
