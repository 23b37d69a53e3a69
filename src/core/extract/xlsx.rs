//! Cell extraction from spreadsheet containers
//!
//! Worksheets (`xl/worksheets/sheetN.xml`) are streamed one after another and
//! every cell value is handed to a visitor as soon as it is complete, so no
//! sheet is ever held in memory. Shared-string cells are resolved through a
//! [`SharedStringTable`] chosen once per workbook from the container size.

use super::shared_strings::{InMemoryStrings, SharedStringTable, SpilledStrings};
use crate::config::DEFAULT_SPILL_THRESHOLD_BYTES;
use crate::domain::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::PathBuf;
use zip::ZipArchive;

/// How shared strings are resolved for one workbook
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Containers larger than this use the spilled table
    pub spill_threshold_bytes: u64,
    /// Where the spilled table's scratch file is created
    pub scratch_dir: PathBuf,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            spill_threshold_bytes: DEFAULT_SPILL_THRESHOLD_BYTES,
            scratch_dir: std::env::temp_dir(),
        }
    }
}

/// An opened spreadsheet container
pub struct XlsxWorkbook<R> {
    archive: ZipArchive<R>,
    size: u64,
}

impl<R: Read + Seek> XlsxWorkbook<R> {
    /// Open the container, recording its total size
    pub fn open(mut reader: R) -> Result<Self> {
        let size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            archive: ZipArchive::new(reader)?,
            size,
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether `options` select the spilled table for this workbook
    pub fn spills(&self, options: &TableOptions) -> bool {
        self.size > options.spill_threshold_bytes
    }

    /// Visit every non-empty cell value of every worksheet, in archive order
    ///
    /// Returns the number of cells visited. An error from `visit` stops the
    /// scan and is returned unchanged.
    pub fn scan_cells<F>(&mut self, options: &TableOptions, visit: F) -> Result<usize>
    where
        F: FnMut(&str) -> Result<()>,
    {
        let part = self
            .archive
            .file_names()
            .find(|n| n.ends_with("sharedStrings.xml"))
            .map(str::to_string);

        match part {
            None => self.scan_worksheets(&mut InMemoryStrings::default(), visit),
            Some(name) if self.spills(options) => {
                let mut table = self.load_table::<SpilledStrings>(&name, options)?;
                self.scan_worksheets(&mut table, visit)
            }
            Some(name) => {
                let mut table = self.load_table::<InMemoryStrings>(&name, options)?;
                self.scan_worksheets(&mut table, visit)
            }
        }
    }

    fn load_table<T: SharedStringTable>(&mut self, name: &str, options: &TableOptions) -> Result<T> {
        let part = self.archive.by_name(name)?;
        let table = T::load(BufReader::new(part), &options.scratch_dir)?;
        tracing::debug!(part = %name, strings = table.len(), "Loaded shared strings");
        Ok(table)
    }

    fn scan_worksheets<T, F>(&mut self, table: &mut T, mut visit: F) -> Result<usize>
    where
        T: SharedStringTable,
        F: FnMut(&str) -> Result<()>,
    {
        let sheets: Vec<String> = self
            .archive
            .file_names()
            .filter(|n| is_worksheet(n))
            .map(str::to_string)
            .collect();

        let mut visited = 0;
        for name in &sheets {
            let part = self.archive.by_name(name)?;
            visited += scan_sheet(BufReader::new(part), table, &mut visit)?;
        }
        Ok(visited)
    }
}

fn is_worksheet(name: &str) -> bool {
    name.contains("worksheets/sheet") && name.ends_with(".xml")
}

/// Cell being assembled while its element is open
#[derive(Default)]
struct CellState {
    kind: Option<String>,
    value: String,
    inline: String,
    in_value: bool,
    in_inline_text: bool,
}

impl CellState {
    fn start(e: &BytesStart<'_>) -> Result<Self> {
        let mut kind = None;
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if attr.key.local_name().as_ref() == b"t" {
                kind = Some(attr.unescape_value()?.into_owned());
            }
        }
        Ok(Self {
            kind,
            ..Default::default()
        })
    }

    /// Final text of the cell, if it contributes any
    fn resolve<T: SharedStringTable>(self, table: &mut T) -> Result<Option<String>> {
        match self.kind.as_deref() {
            Some("s") => match self.value.trim().parse::<usize>() {
                Ok(index) => table.resolve(index),
                Err(_) => Ok(None),
            },
            Some("inlineStr") => Ok(Some(self.inline)),
            _ => Ok(Some(self.value)),
        }
    }
}

fn scan_sheet<B, T, F>(source: B, table: &mut T, visit: &mut F) -> Result<usize>
where
    B: BufRead,
    T: SharedStringTable,
    F: FnMut(&str) -> Result<()>,
{
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let mut cell: Option<CellState> = None;
    let mut visited = 0;

    loop {
        buf.clear();
        let completed = match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                match e.local_name().as_ref() {
                    b"c" => cell = Some(CellState::start(&e)?),
                    b"v" => {
                        if let Some(c) = cell.as_mut() {
                            c.in_value = true;
                        }
                    }
                    b"t" => {
                        if let Some(c) = cell.as_mut() {
                            c.in_inline_text = true;
                        }
                    }
                    _ => {}
                }
                None
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"c" => cell.take(),
                b"v" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_value = false;
                    }
                    None
                }
                b"t" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_inline_text = false;
                    }
                    None
                }
                _ => None,
            },
            Event::Text(e) => {
                if let Some(c) = cell.as_mut() {
                    if c.in_value {
                        c.value.push_str(&e.unescape()?);
                    } else if c.in_inline_text {
                        c.inline.push_str(&e.unescape()?);
                    }
                }
                None
            }
            Event::Eof => break,
            _ => None,
        };

        if let Some(finished) = completed {
            if let Some(text) = finished.resolve(table)? {
                if !text.trim().is_empty() {
                    visit(&text)?;
                    visited += 1;
                }
            }
        }
    }
    Ok(visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocsiftError, ExtractError};
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn workbook(parts: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        let mut cursor = writer.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    const SHARED: &str = r#"<sst><si><t>Uptime 99.9%</t></si><si><t>Safety</t></si></sst>"#;
    const SHEET1: &str = r#"<worksheet><sheetData>
        <row r="1">
          <c r="A1" t="s"><v>0</v></c>
          <c r="B1"><v>42</v></c>
          <c r="C1" t="s"><v>7</v></c>
          <c r="D1" t="inlineStr"><is><t>Inline note</t></is></c>
          <c r="E1" s="3"/>
        </row>
      </sheetData></worksheet>"#;
    const SHEET2: &str = r#"<worksheet><sheetData>
        <row r="1"><c r="A1" t="s"><v>1</v></c><c r="B1" t="str"><v>formula text</v></c></row>
      </sheetData></worksheet>"#;

    fn parts() -> Vec<(&'static str, &'static str)> {
        vec![
            ("[Content_Types].xml", "<Types/>"),
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/sheet1.xml", SHEET1),
            ("xl/worksheets/_rels/sheet1.xml.rels", "<Relationships/>"),
            ("xl/worksheets/sheet2.xml", SHEET2),
        ]
    }

    fn collect(options: &TableOptions) -> Vec<String> {
        let mut book = XlsxWorkbook::open(workbook(&parts())).unwrap();
        let mut cells = Vec::new();
        book.scan_cells(options, |v| {
            cells.push(v.to_string());
            Ok(())
        })
        .unwrap();
        cells
    }

    #[test]
    fn test_cells_in_order_with_out_of_range_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let options = TableOptions {
            scratch_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert_eq!(
            collect(&options),
            vec!["Uptime 99.9%", "42", "Inline note", "Safety", "formula text"]
        );
    }

    #[test]
    fn test_spilled_strategy_resolves_identically() {
        let dir = tempfile::TempDir::new().unwrap();
        let in_memory = TableOptions {
            scratch_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let spilled = TableOptions {
            spill_threshold_bytes: 1,
            scratch_dir: dir.path().to_path_buf(),
        };

        let book = XlsxWorkbook::open(workbook(&parts())).unwrap();
        assert!(book.spills(&spilled));
        assert!(!book.spills(&in_memory));

        assert_eq!(collect(&in_memory), collect(&spilled));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_workbook_without_shared_strings() {
        let sheet = r#"<worksheet><sheetData><row><c t="s"><v>0</v></c><c><v>5</v></c></row></sheetData></worksheet>"#;
        let mut book = XlsxWorkbook::open(workbook(&[("xl/worksheets/sheet1.xml", sheet)])).unwrap();
        let mut cells = Vec::new();
        book.scan_cells(&TableOptions::default(), |v| {
            cells.push(v.to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(cells, vec!["5"]);
    }

    #[test]
    fn test_visitor_error_stops_scan() {
        let mut book = XlsxWorkbook::open(workbook(&parts())).unwrap();
        let mut seen = 0;
        let err = book
            .scan_cells(&TableOptions::default(), |_| {
                seen += 1;
                Err(DocsiftError::Cancelled)
            })
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_malformed_sheet_is_document_error() {
        let sheet = "<worksheet><sheetData><row><c><v>1</c></row></sheetData></worksheet>";
        let mut book = XlsxWorkbook::open(workbook(&[("xl/worksheets/sheet1.xml", sheet)])).unwrap();
        let err = book
            .scan_cells(&TableOptions::default(), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, DocsiftError::Extract(ExtractError::Xml(_))));
    }

    #[test]
    fn test_spilled_table_removed_when_sheet_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let options = TableOptions {
            spill_threshold_bytes: 1,
            scratch_dir: dir.path().to_path_buf(),
        };
        let sheet = r#"<worksheet><sheetData><row><c t="s"><v>0</c></row></sheetData></worksheet>"#;
        let mut book = XlsxWorkbook::open(workbook(&[
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/sheet1.xml", sheet),
        ]))
        .unwrap();
        assert!(book.spills(&options));

        let err = book.scan_cells(&options, |_| Ok(())).unwrap_err();
        assert!(matches!(err, DocsiftError::Extract(ExtractError::Xml(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
