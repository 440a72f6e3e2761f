//! Per-input sidecar directory layout.
//!
//! ```text
//! tape01.dv_dvpackager/
//!   tape01.dvrescue.xml        frame log (reused on later runs)
//!   tape01.dvrescue.vtt        technical subtitles (optional)
//!   tape01.dvrescue.scc        captions (optional)
//!   tape01_00-00-00.000.mkv    one file per range
//! ```

use std::path::{Path, PathBuf};

use dvp_core::{Error, Range, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidecar {
    dir: PathBuf,
    stem: String,
}

impl Sidecar {
    /// Layout for `input`: `<input file name>_<suffix>/` next to the input.
    pub fn for_input(input: &Path, suffix: &str) -> Result<Self> {
        let file_name = input
            .file_name()
            .ok_or_else(|| Error::source_acquisition(input, "input path has no file name"))?
            .to_string_lossy();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.to_string());
        let parent = input.parent().unwrap_or_else(|| Path::new(""));

        Ok(Self {
            dir: parent.join(format!("{file_name}_{suffix}")),
            stem,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn log_file_name(&self) -> String {
        format!("{}.dvrescue.xml", self.stem)
    }

    pub fn subtitle_file_name(&self) -> String {
        format!("{}.dvrescue.vtt", self.stem)
    }

    pub fn caption_file_name(&self) -> String {
        format!("{}.dvrescue.scc", self.stem)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(self.log_file_name())
    }

    pub fn subtitle_path(&self) -> PathBuf {
        self.dir.join(self.subtitle_file_name())
    }

    pub fn caption_path(&self) -> PathBuf {
        self.dir.join(self.caption_file_name())
    }

    /// `<stem>_<start pts, colons as dashes>`, without extension.
    pub fn output_stem(&self, range: &Range) -> String {
        format!("{}_{}", self.stem, range.start_pts.to_filename_component())
    }

    pub fn output_path(&self, range: &Range, extension: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{extension}", self.output_stem(range)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvp_core::{RangeEnd, TechnicalAttributes, Timestamp};

    #[test]
    fn layout_next_to_input() {
        let sidecar = Sidecar::for_input(Path::new("/tapes/tape01.dv"), "dvpackager").unwrap();
        assert_eq!(sidecar.dir(), Path::new("/tapes/tape01.dv_dvpackager"));
        assert_eq!(
            sidecar.log_path(),
            Path::new("/tapes/tape01.dv_dvpackager/tape01.dvrescue.xml")
        );
        assert_eq!(
            sidecar.subtitle_path(),
            Path::new("/tapes/tape01.dv_dvpackager/tape01.dvrescue.vtt")
        );
    }

    #[test]
    fn output_names_are_filesystem_safe() {
        let sidecar = Sidecar::for_input(Path::new("/tapes/tape01.mov"), "out").unwrap();
        let range = Range {
            start_frame: 0,
            end_frame: RangeEnd::Open { last: 9 },
            start_pts: "01:02:03.456".parse::<Timestamp>().unwrap(),
            end_pts: "01:02:04.000".parse::<Timestamp>().unwrap(),
            technical: TechnicalAttributes::default(),
            byte_offset: None,
        };
        assert_eq!(
            sidecar.output_path(&range, "mkv"),
            Path::new("/tapes/tape01.mov_out/tape01_01-02-03.456.mkv")
        );
    }

    #[test]
    fn relative_input() {
        let sidecar = Sidecar::for_input(Path::new("capture.dv"), "dvpackager").unwrap();
        assert_eq!(sidecar.dir(), Path::new("capture.dv_dvpackager"));
        assert_eq!(sidecar.stem(), "capture");
    }
}
