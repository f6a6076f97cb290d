//! Streaming reader for AppStream catalog documents.
//!
//! Only the parts of the schema the catalog reader needs are extracted: the
//! component id, its category tags and the architectures named by its
//! flatpak bundle refs. Everything else is skipped without building a tree.

use std::io::{BufRead, BufReader};

use flate2::read::GzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("catalog xml error near byte {position}: {message}")]
pub struct DecodeError {
    pub position: u64,
    pub message: String,
}

/// One `<component>` as seen in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogComponent {
    pub id: Option<String>,
    pub categories: Vec<String>,
    /// Empty when the component carries no architecture metadata.
    pub architectures: Vec<String>,
}

/// Wraps the raw document, decompressing when it carries the gzip magic.
pub fn open_catalog(bytes: &[u8]) -> Box<dyn BufRead + '_> {
    if bytes.starts_with(&GZIP_MAGIC) {
        Box::new(BufReader::new(GzDecoder::new(bytes)))
    } else {
        Box::new(bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Component,
    Id,
    Categories,
    Category,
    FlatpakBundle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Id,
    Category,
    Bundle,
}

enum Step {
    Open(Node),
    Empty(Node),
    Close,
    Text(String),
    Eof,
    Skip,
}

/// Iterator over the components of a catalog document.
pub struct ComponentReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
    component_depth: Option<usize>,
    categories_depth: Option<usize>,
    capture: Option<(Capture, usize)>,
    text: String,
    current: CatalogComponent,
    done: bool,
}

impl<R: BufRead> ComponentReader<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            depth: 0,
            component_depth: None,
            categories_depth: None,
            capture: None,
            text: String::new(),
            current: CatalogComponent::default(),
            done: false,
        }
    }

    fn error(&mut self, message: impl Into<String>) -> DecodeError {
        self.done = true;
        DecodeError {
            position: self.reader.buffer_position() as u64,
            message: message.into(),
        }
    }

    fn next_step(&mut self) -> Result<Step, String> {
        self.buf.clear();
        let event = self
            .reader
            .read_event_into(&mut self.buf)
            .map_err(|err| err.to_string())?;
        let step = match event {
            Event::Start(start) => Step::Open(classify(&start)),
            Event::Empty(start) => Step::Empty(classify(&start)),
            Event::End(_) => Step::Close,
            Event::Text(text) if self.capture.is_some() => {
                Step::Text(text.unescape().map_err(|err| err.to_string())?.into_owned())
            }
            Event::CData(data) if self.capture.is_some() => {
                Step::Text(String::from_utf8_lossy(&data).into_owned())
            }
            Event::Eof => Step::Eof,
            _ => Step::Skip,
        };
        Ok(step)
    }

    fn open(&mut self, node: Node) {
        self.depth += 1;
        let depth = self.depth;
        let Some(component_depth) = self.component_depth else {
            if node == Node::Component {
                self.component_depth = Some(depth);
                self.current = CatalogComponent::default();
            }
            return;
        };

        let capture = match (depth - component_depth, node) {
            (1, Node::Id) => Some(Capture::Id),
            (1, Node::FlatpakBundle) => Some(Capture::Bundle),
            (1, Node::Categories) => {
                self.categories_depth = Some(depth);
                None
            }
            (2, Node::Category) if self.categories_depth == Some(depth - 1) => {
                Some(Capture::Category)
            }
            _ => None,
        };
        if let Some(capture) = capture {
            self.capture = Some((capture, depth));
            self.text.clear();
        }
    }

    /// Returns the finished component when its closing tag is reached.
    fn close(&mut self) -> Option<CatalogComponent> {
        let depth = self.depth;
        self.depth = self.depth.saturating_sub(1);

        if let Some((capture, capture_depth)) = self.capture {
            if capture_depth == depth {
                self.capture = None;
                self.finish_capture(capture);
            }
        }
        if self.categories_depth == Some(depth) {
            self.categories_depth = None;
        }
        if self.component_depth == Some(depth) {
            self.component_depth = None;
            self.categories_depth = None;
            return Some(std::mem::take(&mut self.current));
        }
        None
    }

    fn finish_capture(&mut self, capture: Capture) {
        let value = self.text.trim();
        if value.is_empty() {
            return;
        }
        match capture {
            Capture::Id => self.current.id = Some(value.to_string()),
            Capture::Category => self.current.categories.push(value.to_string()),
            Capture::Bundle => {
                if let Some(arch) = bundle_arch(value) {
                    if !self.current.architectures.iter().any(|known| known == arch) {
                        self.current.architectures.push(arch.to_string());
                    }
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for ComponentReader<R> {
    type Item = Result<CatalogComponent, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let step = match self.next_step() {
                Ok(step) => step,
                Err(message) => return Some(Err(self.error(message))),
            };
            match step {
                Step::Open(node) => self.open(node),
                Step::Empty(Node::Component) if self.component_depth.is_none() => {
                    return Some(Ok(CatalogComponent::default()));
                }
                Step::Empty(_) | Step::Skip => {}
                Step::Text(text) => self.text.push_str(&text),
                Step::Close => {
                    if let Some(component) = self.close() {
                        return Some(Ok(component));
                    }
                }
                Step::Eof => {
                    if self.component_depth.is_some() {
                        return Some(Err(self.error("document ended inside a component")));
                    }
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

/// Architecture of a flatpak ref of any kind, `<kind>/<id>/<arch>/<branch>`.
fn bundle_arch(bundle: &str) -> Option<&str> {
    let parts: Vec<&str> = bundle.split('/').collect();
    match parts.as_slice() {
        [kind, id, arch, _branch] if !kind.is_empty() && !id.is_empty() && !arch.is_empty() => {
            Some(*arch)
        }
        _ => None,
    }
}

fn classify(start: &BytesStart<'_>) -> Node {
    match start.local_name().as_ref() {
        b"component" => Node::Component,
        b"id" => Node::Id,
        b"categories" => Node::Categories,
        b"category" => Node::Category,
        b"bundle" if is_flatpak_bundle(start) => Node::FlatpakBundle,
        _ => Node::Other,
    }
}

fn is_flatpak_bundle(start: &BytesStart<'_>) -> bool {
    matches!(
        start.try_get_attribute("type"),
        Ok(Some(attr)) if attr.value.as_ref() == b"flatpak"
    )
}
