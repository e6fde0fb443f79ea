//! Opening demo files and turning them into record streams.

use std::path::{Path, PathBuf};

use analysis::{DecodeError, Record};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One JSON encoded record per line, as written by external decoders.
    JsonLines,
    /// A raw CS2 demo.
    Demo,
}

impl Format {
    pub fn detect(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") => Some(Self::JsonLines),
            Some("dem") => Some(Self::Demo),
            _ => None,
        }
    }
}

pub struct Input {
    pub path: PathBuf,
    pub format: Format,
    mmap: memmap2::Mmap,
}

impl Input {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let format =
            Format::detect(path).ok_or_else(|| Error::UnsupportedInput(path.to_path_buf()))?;
        if format == Format::Demo && !cfg!(feature = "csdemo") {
            return Err(Error::UnsupportedInput(path.to_path_buf()));
        }

        let io_err = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::open(path).map_err(io_err)?;
        let mmap = unsafe { memmap2::MmapOptions::new().map(&file) }.map_err(io_err)?;

        Ok(Self {
            path: path.to_path_buf(),
            format,
            mmap,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    pub fn records(&self) -> Box<dyn Iterator<Item = Result<Record, DecodeError>> + '_> {
        match self.format {
            Format::JsonLines => Box::new(json_lines(&self.mmap)),
            Format::Demo => demo_records(&self.mmap),
        }
    }
}

#[cfg(feature = "csdemo")]
fn demo_records(buf: &[u8]) -> Box<dyn Iterator<Item = Result<Record, DecodeError>> + '_> {
    match analysis::demo::parse(buf) {
        Ok(records) => Box::new(records.into_iter().map(Ok)),
        Err(e) => Box::new(std::iter::once(Err(e))),
    }
}

#[cfg(not(feature = "csdemo"))]
fn demo_records(_buf: &[u8]) -> Box<dyn Iterator<Item = Result<Record, DecodeError>> + '_> {
    Box::new(std::iter::once(Err(DecodeError::new(
        "built without demo support",
    ))))
}

/// Decodes lazily, blank lines are skipped. Errors name the 1-based line.
pub fn json_lines(buf: &[u8]) -> impl Iterator<Item = Result<Record, DecodeError>> + '_ {
    buf.split(|b| *b == b'\n')
        .enumerate()
        .filter(|(_, line)| !line.iter().all(u8::is_ascii_whitespace))
        .map(|(idx, line)| {
            serde_json::from_slice(line)
                .map_err(|e| DecodeError::new(format!("line {}: {}", idx + 1, e)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    use analysis::RecordKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn detects_by_extension() {
        assert_eq!(Some(Format::JsonLines), Format::detect(Path::new("a/b.jsonl")));
        assert_eq!(Some(Format::JsonLines), Format::detect(Path::new("b.ndjson")));
        assert_eq!(Some(Format::Demo), Format::detect(Path::new("match.dem")));
        assert_eq!(None, Format::detect(Path::new("match.zip")));
    }

    #[test]
    fn reads_records() {
        let buf = br#"{"tick": 0, "kind": {"type": "header", "map": "de_nuke", "tick_rate": 64, "server_name": null, "source": null}}

{"tick": 12, "game_time": 0.5, "kind": {"type": "round_start"}}
"#;

        let records: Vec<_> = json_lines(buf).collect::<Result<_, _>>().unwrap();

        assert_eq!(2, records.len());
        assert_eq!(
            RecordKind::Header {
                map: Some("de_nuke".to_owned()),
                tick_rate: Some(64),
                server_name: None,
                source: None,
                max_rounds: None,
            },
            records[0].kind
        );
        assert_eq!(Record::at(12, 0.5, RecordKind::RoundStart), records[1]);
    }

    #[test]
    fn reports_the_broken_line() {
        let buf = b"{\"tick\": 1, \"kind\": {\"type\": \"round_start\"}}\n{\"tick\": 2, \"kind\"\n";

        let mut records = json_lines(buf);

        assert!(records.next().unwrap().is_ok());
        let err = records.next().unwrap().unwrap_err();
        assert!(err.message.starts_with("line 2:"), "{}", err.message);
        assert!(records.next().is_none());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = Input::open(Path::new("whatever.txt")).err().unwrap();
        assert!(matches!(err, Error::UnsupportedInput(_)));
    }
}
