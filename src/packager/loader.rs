//! Frame log acquisition and parsing.
//!
//! The frame log is the XML document written by `dvrescue --xml-output`:
//!
//! ```xml
//! <dvrescue>
//!   <media ref="tape01.dv" format="DV">
//!     <frames count="2" pts="00:00:00.000000" video_rate="30000/1001" aspect_ratio="4/3" ...>
//!       <frame n="0" pos="0" pts="00:00:00.000000" tc="00:00:00;00" rdt="2003-05-18 14:23:00" rec_start="1"/>
//!       <frame n="1" pos="120000" pts="00:00:00.033367" tc="00:00:00;01" rdt="2003-05-18 14:23:00"/>
//!     </frames>
//!   </media>
//! </dvrescue>
//! ```
//!
//! Technical attributes live on `<frames>` and are inherited by every
//! `<frame>` inside it unless the frame overrides them.

use std::path::{Path, PathBuf};

use dvp_av::tools::DVRESCUE;
use dvp_av::{AnalyzeRequest, CommandRunner, ToolRegistry, Workspace};
use dvp_core::{Error, FrameLog, FrameRecord, Result, SourceFormat, TechnicalAttributes, Timestamp};
use roxmltree::{Document, Node};

use super::sidecar::Sidecar;

/// A parsed frame log plus the side-channel files captured with it.
#[derive(Debug, Clone)]
pub struct LoadedLog {
    pub log: FrameLog,
    /// Technical subtitle track, when present in the sidecar.
    pub subtitles: Option<PathBuf>,
    /// Caption track, when the source carried captions.
    pub captions: Option<PathBuf>,
    /// Whether the log came from an earlier run.
    pub reused: bool,
}

/// Obtains the frame log for an input, reusing the sidecar copy when it is
/// complete and running the analysis tool otherwise.
pub struct MetadataLoader<'a> {
    tools: &'a ToolRegistry,
    runner: &'a dyn CommandRunner,
    want_subtitles: bool,
}

impl<'a> MetadataLoader<'a> {
    pub fn new(tools: &'a ToolRegistry, runner: &'a dyn CommandRunner, want_subtitles: bool) -> Self {
        Self {
            tools,
            runner,
            want_subtitles,
        }
    }

    pub async fn load(&self, input: &Path, sidecar: &Sidecar, workspace: &Workspace) -> Result<LoadedLog> {
        let log_path = sidecar.log_path();
        if log_path.exists() {
            match self.reuse(input, sidecar) {
                Ok(Some(loaded)) => {
                    tracing::info!("Reusing frame log {}", log_path.display());
                    return Ok(loaded);
                }
                Ok(None) => {
                    tracing::info!("Technical subtitles missing from sidecar; re-running analysis");
                }
                Err(e @ Error::SourceAcquisition { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!("Existing frame log {} unusable ({e}); re-running analysis", log_path.display());
                }
            }
        }

        self.analyze(input, sidecar, workspace).await
    }

    /// `Ok(None)` means the log parsed but a requested side channel is absent.
    fn reuse(&self, input: &Path, sidecar: &Sidecar) -> Result<Option<LoadedLog>> {
        let log = read_log(&sidecar.log_path(), input)?;
        let subtitles = existing(sidecar.subtitle_path());
        if self.want_subtitles && subtitles.is_none() {
            return Ok(None);
        }

        Ok(Some(LoadedLog {
            log,
            subtitles,
            captions: existing(sidecar.caption_path()),
            reused: true,
        }))
    }

    async fn analyze(&self, input: &Path, sidecar: &Sidecar, workspace: &Workspace) -> Result<LoadedLog> {
        let dvrescue = self
            .tools
            .require(DVRESCUE)
            .map_err(|e| Error::source_acquisition(input, e))?;

        let xml = workspace.temp_file(&sidecar.log_file_name());
        let vtt = workspace.temp_file(&sidecar.subtitle_file_name());
        let scc = workspace.temp_file(&sidecar.caption_file_name());
        let request = AnalyzeRequest::new(input, xml.clone())
            .with_webvtt(vtt.clone())
            .with_captions(scc.clone());

        tracing::info!("Analyzing {}", input.display());
        self.runner
            .run(&request.command(&dvrescue.path))
            .await
            .map_err(|e| Error::source_acquisition(input, e))?;

        if !xml.exists() {
            return Err(Error::source_acquisition(input, "analysis produced no frame log"));
        }
        let log = read_log(&xml, input)?;

        let dest = sidecar.dir();
        workspace.promote(&xml, dest)?;
        let subtitles = match existing(vtt) {
            Some(vtt) => Some(workspace.promote(&vtt, dest)?),
            None => None,
        };
        // dvrescue may leave an empty caption file when the tape has none.
        let captions = match existing(scc).filter(|p| !is_empty_file(p)) {
            Some(scc) => Some(workspace.promote(&scc, dest)?),
            None => None,
        };

        Ok(LoadedLog {
            log,
            subtitles,
            captions,
            reused: false,
        })
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

fn is_empty_file(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true)
}

fn read_log(path: &Path, input: &Path) -> Result<FrameLog> {
    let xml = std::fs::read_to_string(path)
        .map_err(|e| Error::malformed(format!("cannot read {}: {e}", path.display())))?;
    parse_log(&xml, input)
}

// ---------------------------------------------------------------------------
// XML parsing
// ---------------------------------------------------------------------------

/// Parse a frame log into a validated, ordered [`FrameLog`].
///
/// `input` only labels errors. A `<media error=...>` attribute means the
/// analysis itself failed and is reported as a source acquisition error.
pub fn parse_log(xml: &str, input: &Path) -> Result<FrameLog> {
    let doc = Document::parse(xml).map_err(|e| Error::malformed(format!("XML parse error: {e}")))?;

    let media = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "media")
        .ok_or_else(|| Error::malformed("no <media> element"))?;

    if let Some(error) = media.attribute("error").filter(|e| !e.trim().is_empty()) {
        return Err(Error::source_acquisition(input, error));
    }

    let format = SourceFormat::from_log_format(media.attribute("format").unwrap_or("DV"));

    let frames = media
        .children()
        .filter(|n| is_element(n, "frames"))
        .flat_map(|group| {
            group
                .children()
                .filter(|n| is_element(n, "frame"))
                .map(move |frame| parse_frame(group, frame))
        })
        .collect::<Result<Vec<_>>>()?;

    if frames.is_empty() {
        return Err(Error::malformed("frame log contains no frames"));
    }

    validate_order(&frames, &format)?;

    tracing::debug!("Parsed {} frames ({:?})", frames.len(), format);
    Ok(FrameLog { format, frames })
}

fn is_element(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Frame attribute, falling back to the enclosing `<frames>` group.
fn attr<'a>(group: Node<'a, '_>, frame: Node<'a, '_>, name: &str) -> Option<&'a str> {
    frame.attribute(name).or_else(|| group.attribute(name))
}

fn flag(frame: Node, name: &str) -> bool {
    matches!(frame.attribute(name), Some("1") | Some("true"))
}

fn parse_frame(group: Node, frame: Node) -> Result<FrameRecord> {
    let line = frame.document().text_pos_at(frame.range().start).row;

    let index = frame
        .attribute("n")
        .ok_or_else(|| Error::malformed(format!("frame at line {line} has no index")))?
        .parse::<u64>()
        .map_err(|e| Error::malformed(format!("frame at line {line}: bad index: {e}")))?;

    let pts = frame
        .attribute("pts")
        .ok_or_else(|| Error::malformed(format!("frame {index} has no pts")))?
        .parse::<Timestamp>()?;

    let end_pts = frame.attribute("end_pts").map(str::parse::<Timestamp>).transpose()?;

    let number = |name: &str, value: Option<&str>| -> Result<Option<u64>> {
        value
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|e| Error::malformed(format!("frame {index}: bad {name} {v:?}: {e}")))
            })
            .transpose()
    };

    let text = |name: &str| attr(group, frame, name).map(str::to_string);

    Ok(FrameRecord {
        pts,
        end_pts,
        index,
        timecode: frame.attribute("tc").map(str::to_string),
        recording_timestamp: frame.attribute("rdt").map(str::to_string),
        byte_offset: number("pos", frame.attribute("pos"))?,
        size: number("size", attr(group, frame, "size"))?,
        technical: TechnicalAttributes {
            video_rate: text("video_rate"),
            chroma_subsampling: text("chroma_subsampling"),
            aspect_ratio: text("aspect_ratio"),
            audio_rate: text("audio_rate"),
            channel_count: attr(group, frame, "channels").and_then(|c| c.parse().ok()),
        },
        recording_start: flag(frame, "rec_start"),
        recording_timestamp_discontinuity: flag(frame, "rdt_nc"),
        timecode_discontinuity: flag(frame, "tc_nc"),
    })
}

/// Frames must be strictly ascending by pts and index, no frame may end before
/// it starts, byte offsets must not go backwards, and raw DV frames must carry
/// their offset.
fn validate_order(frames: &[FrameRecord], format: &SourceFormat) -> Result<()> {
    frames.iter().try_fold(None::<&FrameRecord>, |prev, frame| {
        if format.is_elementary() && frame.byte_offset.is_none() {
            return Err(Error::malformed(format!(
                "frame {} has no byte offset in a raw DV log",
                frame.index
            )));
        }
        if let Some(end) = frame.end_pts.filter(|end| *end < frame.pts) {
            return Err(Error::malformed(format!(
                "frame {} end_pts {end} precedes its pts {}",
                frame.index, frame.pts
            )));
        }

        if let Some(prev) = prev {
            if frame.pts <= prev.pts {
                return Err(Error::malformed(format!(
                    "frame {} pts {} does not follow {}",
                    frame.index, frame.pts, prev.pts
                )));
            }
            if frame.index <= prev.index {
                return Err(Error::malformed(format!(
                    "frame index {} does not follow {}",
                    frame.index, prev.index
                )));
            }
            if let (Some(pos), Some(prev_pos)) = (frame.byte_offset, prev.byte_offset) {
                if pos < prev_pos {
                    return Err(Error::malformed(format!(
                        "frame {} byte offset {pos} precedes {prev_pos}",
                        frame.index
                    )));
                }
            }
        }

        Ok(Some(frame))
    })?;

    Ok(())
}
