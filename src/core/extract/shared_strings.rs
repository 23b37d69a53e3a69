//! Shared-string tables for spreadsheet extraction
//!
//! Cells of type `s` refer to the workbook's shared-string part by index.
//! Two strategies resolve those indexes:
//!
//! - [`InMemoryStrings`] keeps every string in a `Vec`
//! - [`SpilledStrings`] writes the strings to a scratch file once and keeps
//!   only their byte offsets, reading a string back on each lookup
//!
//! Both are fed by the same streaming parser, so they resolve identically.
//! The scratch file of a spilled table is removed when the table is dropped.

use crate::domain::{ExtractError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufRead, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Index-addressed string pool
pub trait SharedStringTable {
    /// Build the table from a shared-string part
    fn load<B: BufRead>(source: B, scratch_dir: &Path) -> Result<Self>
    where
        Self: Sized;

    /// The string at `index`, or `None` when out of range
    fn resolve(&mut self, index: usize) -> Result<Option<String>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stream every `<si>` entry of a shared-string part, in order
///
/// Rich-text runs are concatenated; phonetic runs (`<rPh>`) are skipped.
pub fn for_each_shared_string<B, F>(source: B, mut entry: F) -> Result<()>
where
    B: BufRead,
    F: FnMut(String) -> Result<()>,
{
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut phonetic_depth = 0usize;

    loop {
        buf.clear();
        let finished = match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                match e.local_name().as_ref() {
                    b"si" => current = Some(String::new()),
                    b"t" => in_text = phonetic_depth == 0,
                    b"rPh" => phonetic_depth += 1,
                    _ => {}
                }
                None
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"si" {
                    Some(String::new())
                } else {
                    None
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => current.take(),
                b"t" => {
                    in_text = false;
                    None
                }
                b"rPh" => {
                    phonetic_depth = phonetic_depth.saturating_sub(1);
                    None
                }
                _ => None,
            },
            Event::Text(e) => {
                if let (true, Some(text)) = (in_text, current.as_mut()) {
                    text.push_str(&e.unescape()?);
                }
                None
            }
            Event::Eof => break,
            _ => None,
        };

        if let Some(value) = finished {
            entry(value)?;
        }
    }
    Ok(())
}

/// Whole table held in memory
#[derive(Debug, Default)]
pub struct InMemoryStrings {
    strings: Vec<String>,
}

impl SharedStringTable for InMemoryStrings {
    fn load<B: BufRead>(source: B, _scratch_dir: &Path) -> Result<Self> {
        let mut strings = Vec::new();
        for_each_shared_string(source, |s| {
            strings.push(s);
            Ok(())
        })?;
        Ok(Self { strings })
    }

    fn resolve(&mut self, index: usize) -> Result<Option<String>> {
        Ok(self.strings.get(index).cloned())
    }

    fn len(&self) -> usize {
        self.strings.len()
    }
}

/// Table spilled to a scratch file, indexed by byte offset
pub struct SpilledStrings {
    file: NamedTempFile,
    offsets: Vec<u64>,
    end: u64,
}

impl SpilledStrings {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl SharedStringTable for SpilledStrings {
    fn load<B: BufRead>(source: B, scratch_dir: &Path) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("docsift-sst-")
            .tempfile_in(scratch_dir)?;
        let mut offsets = Vec::new();
        let mut end = 0u64;

        {
            let mut writer = BufWriter::new(file.as_file_mut());
            for_each_shared_string(source, |s| {
                offsets.push(end);
                writer.write_all(s.as_bytes())?;
                end += s.len() as u64;
                Ok(())
            })?;
            writer.flush()?;
        }

        tracing::debug!(
            strings = offsets.len(),
            bytes = end,
            path = %file.path().display(),
            "Spilled shared strings to scratch file"
        );
        Ok(Self { file, offsets, end })
    }

    fn resolve(&mut self, index: usize) -> Result<Option<String>> {
        let Some(&start) = self.offsets.get(index) else {
            return Ok(None);
        };
        let stop = self.offsets.get(index + 1).copied().unwrap_or(self.end);

        let file = self.file.as_file_mut();
        file.seek(SeekFrom::Start(start))?;
        let mut bytes = vec![0u8; (stop - start) as usize];
        file.read_exact(&mut bytes)?;

        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| ExtractError::Xml(format!("Corrupt spilled string {index}: {e}")).into())
    }

    fn len(&self) -> usize {
        self.offsets.len()
    }
}
