//! dvrescue invocation for producing the per-frame log.

use std::path::{Path, PathBuf};

use crate::command::ToolCommand;

/// Typed arguments for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeRequest {
    pub input: PathBuf,
    /// Where the XML frame log is written.
    pub xml_output: PathBuf,
    /// Technical subtitle track (WebVTT), when requested.
    pub webvtt_output: Option<PathBuf>,
    /// Closed captions (SCC); dvrescue writes it only if captions exist.
    pub caption_output: Option<PathBuf>,
}

impl AnalyzeRequest {
    pub fn new(input: &Path, xml_output: PathBuf) -> Self {
        Self {
            input: input.to_path_buf(),
            xml_output,
            webvtt_output: None,
            caption_output: None,
        }
    }

    pub fn with_webvtt(mut self, path: PathBuf) -> Self {
        self.webvtt_output = Some(path);
        self
    }

    pub fn with_captions(mut self, path: PathBuf) -> Self {
        self.caption_output = Some(path);
        self
    }

    /// Build the dvrescue command line.
    pub fn command(&self, dvrescue: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(dvrescue.to_path_buf());
        cmd.path_arg(&self.input);
        cmd.arg("--xml-output").path_arg(&self.xml_output);

        if let Some(vtt) = &self.webvtt_output {
            cmd.arg("--webvtt-output").path_arg(vtt);
        }
        if let Some(scc) = &self.caption_output {
            cmd.args(["--cc-format", "scc", "--cc-output"]).path_arg(scc);
        }

        cmd
    }
}
