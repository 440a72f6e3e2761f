//! Shared test harness for integration tests.
//!
//! Provides [`LogBuilder`] for dvrescue frame log fixtures and
//! [`FakeRunner`], a [`CommandRunner`] that records every command and plays
//! the part of dvrescue, ffmpeg, and mediainfo without running them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use dvp_av::{CommandRunner, ToolCommand, ToolOutput, ToolRegistry};
use dvp_core::{Error, Timestamp};

/// One `<frame>` of a fixture log.
#[derive(Debug, Clone, Default)]
pub struct FrameSpec {
    pub aspect_ratio: Option<String>,
    pub recording_start: bool,
    pub timecode_discontinuity: bool,
    pub rdt_discontinuity: bool,
}

/// Builds dvrescue XML with frames 33 ms apart.
#[derive(Debug, Clone)]
pub struct LogBuilder {
    format: String,
    error: Option<String>,
    frames: Vec<FrameSpec>,
}

pub const FRAME_MS: u64 = 33;
pub const FRAME_BYTES: u64 = 120_000;

impl LogBuilder {
    pub fn dv(count: usize) -> Self {
        Self::with_format("DV", count)
    }

    pub fn wrapped(count: usize) -> Self {
        Self::with_format("MPEG-4", count)
    }

    fn with_format(format: &str, count: usize) -> Self {
        Self {
            format: format.into(),
            error: None,
            frames: vec![FrameSpec::default(); count],
        }
    }

    /// Switch the aspect ratio from frame `pos` onwards.
    pub fn aspect_from(mut self, pos: usize, aspect: &str) -> Self {
        for frame in &mut self.frames[pos..] {
            frame.aspect_ratio = Some(aspect.into());
        }
        self
    }

    pub fn recording_start(mut self, pos: usize) -> Self {
        self.frames[pos].recording_start = true;
        self
    }

    pub fn timecode_jump(mut self, pos: usize) -> Self {
        self.frames[pos].timecode_discontinuity = true;
        self
    }

    pub fn rdt_jump(mut self, pos: usize) -> Self {
        self.frames[pos].rdt_discontinuity = true;
        self
    }

    pub fn error(mut self, message: &str) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<dvrescue>\n");
        let error = self
            .error
            .as_ref()
            .map(|e| format!(" error=\"{e}\""))
            .unwrap_or_default();
        xml.push_str(&format!("  <media ref=\"tape.dv\" format=\"{}\"{error}>\n", self.format));

        if !self.frames.is_empty() {
            xml.push_str(&format!(
                "    <frames count=\"{}\" video_rate=\"30000/1001\" chroma_subsampling=\"4:1:1\" aspect_ratio=\"4/3\" audio_rate=\"48000\" channels=\"2\">\n",
                self.frames.len()
            ));
            for (i, frame) in self.frames.iter().enumerate() {
                let i = i as u64;
                let mut attrs = format!(
                    "n=\"{i}\" pts=\"{}\" end_pts=\"{}\" tc=\"00:00:{:02};{:02}\" rdt=\"2003-05-18 14:23:00\"",
                    Timestamp::from_millis(i * FRAME_MS),
                    Timestamp::from_millis((i + 1) * FRAME_MS),
                    i / 30,
                    i % 30
                );
                if self.format == "DV" {
                    attrs.push_str(&format!(" pos=\"{}\"", i * FRAME_BYTES));
                }
                if let Some(aspect) = &frame.aspect_ratio {
                    attrs.push_str(&format!(" aspect_ratio=\"{aspect}\""));
                }
                if frame.recording_start {
                    attrs.push_str(" rec_start=\"1\"");
                }
                if frame.timecode_discontinuity {
                    attrs.push_str(" tc_nc=\"1\"");
                }
                if frame.rdt_discontinuity {
                    attrs.push_str(" rdt_nc=\"1\"");
                }
                xml.push_str(&format!("      <frame {attrs}/>\n"));
            }
            xml.push_str("    </frames>\n");
        }

        xml.push_str("  </media>\n</dvrescue>\n");
        xml
    }
}

/// Registry pointing at fake executables; nothing is ever spawned.
pub fn fake_tools() -> ToolRegistry {
    ToolRegistry::default()
        .with_tool("dvrescue", "/fake/bin/dvrescue")
        .with_tool("ffmpeg", "/fake/bin/ffmpeg")
        .with_tool("mediainfo", "/fake/bin/mediainfo")
}

/// Records commands and simulates the external tools.
///
/// - dvrescue writes `log` to its `--xml-output` path (and a WebVTT file when asked).
/// - ffmpeg creates its output file, unless its output name contains `fail_output`.
/// - mediainfo reports `video_ms` / `audio_ms` for every file.
pub struct FakeRunner {
    pub log: String,
    pub fail_output: Option<String>,
    pub video_ms: u64,
    pub audio_ms: u64,
    calls: Mutex<Vec<ToolCommand>>,
}

impl FakeRunner {
    pub fn new(log: &LogBuilder) -> Self {
        Self {
            log: log.to_xml(),
            fail_output: None,
            video_ms: 5000,
            audio_ms: 5000,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, tool: &str) -> Vec<ToolCommand> {
        self.calls()
            .into_iter()
            .filter(|c| c.tool_name() == tool)
            .collect()
    }

    fn value_after(cmd: &ToolCommand, flag: &str) -> Option<PathBuf> {
        cmd.get_args()
            .windows(2)
            .find(|w| w[0] == flag)
            .map(|w| PathBuf::from(&w[1]))
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, cmd: &ToolCommand) -> dvp_core::Result<ToolOutput> {
        self.calls.lock().unwrap().push(cmd.clone());

        match cmd.tool_name().as_str() {
            "dvrescue" => {
                if let Some(xml) = Self::value_after(cmd, "--xml-output") {
                    std::fs::write(xml, &self.log)?;
                }
                if let Some(vtt) = Self::value_after(cmd, "--webvtt-output") {
                    std::fs::write(vtt, "WEBVTT\n")?;
                }
                Ok(ToolOutput::default())
            }
            "ffmpeg" => {
                let output = cmd.get_args().last().map(PathBuf::from).unwrap_or_default();
                let name = output.to_string_lossy().to_string();
                if self.fail_output.as_ref().is_some_and(|f| name.contains(f.as_str())) {
                    return Err(Error::tool("ffmpeg", "Invalid data found when processing input"));
                }
                std::fs::write(&output, b"")?;
                Ok(ToolOutput::default())
            }
            "mediainfo" => Ok(ToolOutput {
                stdout: format!(
                    r#"{{"media":{{"track":[{{"@type":"Video","Duration":"{}"}},{{"@type":"Audio","Duration":"{}"}}]}}}}"#,
                    seconds(self.video_ms),
                    seconds(self.audio_ms),
                ),
                stderr: String::new(),
            }),
            other => Err(Error::tool(other, "unexpected tool")),
        }
    }
}

fn seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

/// Create an input file with some bytes in `dir`.
pub fn touch_input(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0u8; 16]).unwrap();
    path
}
