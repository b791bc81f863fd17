use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::data::Document;
use crate::errors::Result;

/// Destination for shaped documents. The store session is owned by the caller
/// and handed to the pipeline that writes into it.
pub trait DocumentStore {
    /// Self-keyed upsert: the document is its own filter. An identical stored
    /// document is replaced, anything else is inserted.
    fn upsert(&mut self, document: &Document) -> Result<()>;

    /// Fetches an arbitrary stored document, for smoke-testing a load.
    fn find_one(&self) -> Result<Option<Document>>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps every document in memory, indexed by its serialization. Meant for
/// tests and small inputs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Vec<Document>,
    index: HashMap<String, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn upsert(&mut self, document: &Document) -> Result<()> {
        let key = serde_json::to_string(document)?;
        match self.index.get(&key) {
            Some(&position) => self.documents[position] = document.clone(),
            None => {
                self.index.insert(key, self.documents.len());
                self.documents.push(document.clone());
            },
        }
        Ok(())
    }

    fn find_one(&self) -> Result<Option<Document>> {
        Ok(self.documents.first().cloned())
    }
}

/// Writes one JSON document per line. Documents already written in this
/// session are not repeated: a digest of the serialization finds candidates,
/// and the line read back from the file confirms the match.
/// Written documents are visible to `find_one` after `flush`.
pub struct JsonLinesStore {
    path: PathBuf,
    writer: BufWriter<File>,
    /// Byte spans of written lines, by digest.
    written: HashMap<u64, Vec<(u64, usize)>>,
    offset: u64,
    digest: fn(&str) -> u64,
}

fn default_digest(line: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    line.hash(&mut hasher);
    hasher.finish()
}

impl JsonLinesStore {
    /// Creates (or truncates) the file at `path`, along with missing parent directories.
    pub fn create(path: &Path) -> Result<JsonLinesStore> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(JsonLinesStore {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: HashMap::new(),
            offset: 0,
            digest: default_digest,
        })
    }

    #[cfg(test)]
    fn with_digest(mut self, digest: fn(&str) -> u64) -> Self {
        self.digest = digest;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn already_written(&mut self, digest: u64, line: &str) -> Result<bool> {
        let spans = match self.written.get(&digest) {
            Some(spans) => spans.clone(),
            None => return Ok(false),
        };
        self.writer.flush()?;
        let mut file = File::open(&self.path)?;
        let mut stored = Vec::new();
        for (start, len) in spans {
            if len != line.len() {
                continue;
            }
            stored.resize(len, 0);
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(&mut stored)?;
            if stored == line.as_bytes() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl DocumentStore for JsonLinesStore {
    fn upsert(&mut self, document: &Document) -> Result<()> {
        let line = serde_json::to_string(document)?;
        let digest = (self.digest)(&line);
        if self.already_written(digest, &line)? {
            return Ok(());
        }
        writeln!(self.writer, "{}", line)?;
        self.written.entry(digest).or_default().push((self.offset, line.len()));
        self.offset += line.len() as u64 + 1;
        Ok(())
    }

    fn find_one(&self) -> Result<Option<Document>> {
        let reader = BufReader::new(File::open(&self.path)?);
        match reader.lines().next() {
            Some(line) => Ok(Some(serde_json::from_str(&line?)?)),
            None => Ok(None),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
