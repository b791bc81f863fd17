use std::fs;
use std::io::{BufRead, BufReader};
use std::iter::FusedIterator;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use xz::bufread::XzDecoder;

use crate::data::{Element, SourceElement};
use crate::errors::{Error, Result};

/// Top-level OSM elements.
pub const DEFAULT_TAGS: [&str; 3] = ["node", "way", "relation"];

/// Opens an OSM file for streaming, decompressing `.xz` inputs on the fly.
pub fn open_source(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = fs::File::open(path)?;
    let file_reader = BufReader::new(file);
    let is_xz = path.extension().is_some_and(|ext| ext == "xz");
    if is_xz {
        let xz_reader = XzDecoder::new(file_reader);
        Ok(Box::new(BufReader::new(xz_reader)))
    } else {
        Ok(Box::new(file_reader))
    }
}

fn is_of_interest(tags: &[String], name: &[u8]) -> bool {
    tags.iter().any(|tag| tag.as_bytes() == name)
}

/// Pull iterator over the elements of interest of an XML document.
///
/// Only the element currently being captured is held in memory: events outside
/// it are dropped as soon as they are read, and a captured element is handed to
/// the consumer (and forgotten) when its end tag is seen. An element of
/// interest nested inside another one is kept as a child of the outer element.
///
/// After a parse error the stream is exhausted.
pub struct ElementStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    tags: Vec<String>,
    open: Vec<Element>,
    capture: Option<Writer<Vec<u8>>>,
    depth: usize,
    peak_depth: usize,
    done: bool,
}

impl<R: BufRead> ElementStream<R> {
    pub fn new(source: R) -> Self {
        ElementStream::with_tags(source, &DEFAULT_TAGS)
    }

    pub fn with_tags(source: R, tags: &[&str]) -> Self {
        ElementStream {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            open: Vec::new(),
            capture: None,
            depth: 0,
            peak_depth: 0,
            done: false,
        }
    }

    /// Largest number of elements held open at once so far.
    pub fn peak_depth(&self) -> usize {
        self.peak_depth
    }

    fn finish(&mut self, element: Element) -> SourceElement {
        let raw = self.capture.take().map(Writer::into_inner).unwrap_or_default();
        SourceElement::new(element, raw)
    }

    fn next_element(&mut self) -> Result<Option<SourceElement>> {
        loop {
            // if we don't keep a borrow elsewhere, we can clear the buffer to keep memory usage low
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf)?;
            let completed = match &event {
                Event::Eof => {
                    if self.depth != 0 {
                        return Err(Error::xml("Unexpected end of document inside an open element"));
                    }
                    return Ok(None);
                },
                Event::Start(start) => {
                    self.depth += 1;
                    if self.capture.is_none() && is_of_interest(&self.tags, start.name().as_ref()) {
                        self.capture = Some(Writer::new(Vec::new()));
                    }
                    if let Some(writer) = self.capture.as_mut() {
                        writer.write_event(&event)?;
                        self.open.push(Element::from_start(start)?);
                        self.peak_depth = self.peak_depth.max(self.open.len());
                    }
                    None
                },
                Event::Empty(start) => {
                    if self.capture.is_none() && is_of_interest(&self.tags, start.name().as_ref()) {
                        self.capture = Some(Writer::new(Vec::new()));
                    }
                    match self.capture.as_mut() {
                        Some(writer) => {
                            writer.write_event(&event)?;
                            let element = Element::from_start(start)?;
                            self.peak_depth = self.peak_depth.max(self.open.len() + 1);
                            match self.open.last_mut() {
                                Some(parent) => {
                                    parent.push_child(element);
                                    None
                                },
                                None => Some(element),
                            }
                        },
                        None => None,
                    }
                },
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    match self.capture.as_mut() {
                        Some(writer) => {
                            writer.write_event(&event)?;
                            match self.open.pop() {
                                Some(element) => match self.open.last_mut() {
                                    Some(parent) => {
                                        parent.push_child(element);
                                        None
                                    },
                                    None => Some(element),
                                },
                                None => None,
                            }
                        },
                        None => None,
                    }
                },
                _ => {
                    if let Some(writer) = self.capture.as_mut() {
                        writer.write_event(&event)?;
                    }
                    None
                },
            };
            drop(event);
            if let Some(element) = completed {
                return Ok(Some(self.finish(element)));
            }
        }
    }
}

impl<R: BufRead> Iterator for ElementStream<R> {
    type Item = Result<SourceElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.done = true;
                None
            },
            Err(err) => {
                self.done = true;
                Some(Err(err))
            },
        }
    }
}

impl<R: BufRead> FusedIterator for ElementStream<R> {}
