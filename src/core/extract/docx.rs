//! Paragraph extraction from word-processing containers
//!
//! The container is a ZIP archive; the body lives in `word/document.xml`.
//! The body part is streamed event by event: character data inside `<w:t>`
//! runs accumulates until the enclosing `</w:p>`, which yields the paragraph
//! text followed by a newline. Nothing else in the document model is built.

use crate::domain::{ExtractError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

/// Archive path of the document body
pub const DOCUMENT_PART: &str = "word/document.xml";

/// An opened word-processing container
pub struct DocxDocument<R> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> DocxDocument<R> {
    /// Open the container; fails if it is not a ZIP archive
    pub fn open(reader: R) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
        })
    }

    /// Stream the body paragraphs in document order
    ///
    /// # Errors
    ///
    /// [`ExtractError::MissingPart`] when the archive has no document body.
    pub fn paragraphs(&mut self) -> Result<Paragraphs<impl BufRead + '_>> {
        let part = self.archive.by_name(DOCUMENT_PART).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => {
                ExtractError::MissingPart(DOCUMENT_PART.to_string()).into()
            }
            other => crate::domain::DocsiftError::from(other),
        })?;
        Ok(Paragraphs::new(BufReader::new(part)))
    }
}

/// Single forward pass over the paragraphs of a body part
///
/// Yields each paragraph with a trailing `\n`. After an error the iterator
/// is exhausted.
pub struct Paragraphs<B: BufRead> {
    reader: Reader<B>,
    buf: Vec<u8>,
    text: String,
    in_run_text: bool,
    done: bool,
}

impl<B: BufRead> Paragraphs<B> {
    pub fn new(source: B) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            text: String::new(),
            in_run_text: false,
            done: false,
        }
    }

    fn next_paragraph(&mut self) -> Result<Option<String>> {
        loop {
            self.buf.clear();
            let paragraph_end = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => {
                    if e.local_name().as_ref() == b"t" {
                        self.in_run_text = true;
                    }
                    false
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"t" => {
                        self.in_run_text = false;
                        false
                    }
                    b"p" => true,
                    _ => false,
                },
                Event::Empty(e) => e.local_name().as_ref() == b"p",
                Event::Text(e) if self.in_run_text => {
                    self.text.push_str(&e.unescape()?);
                    false
                }
                Event::CData(e) if self.in_run_text => {
                    self.text.push_str(&String::from_utf8_lossy(&e));
                    false
                }
                Event::Eof => return Ok(None),
                _ => false,
            };

            if paragraph_end {
                let mut paragraph = std::mem::take(&mut self.text);
                paragraph.push('\n');
                return Ok(Some(paragraph));
            }
        }
    }
}

impl<B: BufRead> Iterator for Paragraphs<B> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_paragraph() {
            Ok(Some(paragraph)) => Some(Ok(paragraph)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
