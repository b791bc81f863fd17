use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::info;

use crate::UserConfig;
use crate::data::{Document, SourceElement};
use crate::errors::Result;
use crate::etl::Etl;
use crate::shape::Shaper;
use crate::store::DocumentStore;
use crate::stream::{open_source, ElementStream};

pub const ETL_NAME: &str = "load_documents";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Top-level elements read from the source.
    pub elements: usize,
    pub upserted: usize,
    /// Elements the shaper declined, relations mostly.
    pub skipped: usize,
}

/// Shapes each streamed element and yields the resulting documents, dropping
/// elements that have none.
pub struct Documents<I> {
    elements: I,
    shaper: Shaper,
    seen: usize,
    skipped: usize,
}

impl<I> Documents<I> {
    pub fn new(elements: I, shaper: Shaper) -> Self {
        Documents {
            elements,
            shaper,
            seen: 0,
            skipped: 0,
        }
    }

    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<I: Iterator<Item = Result<SourceElement>>> Iterator for Documents<I> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let element = match self.elements.next()? {
                Ok(element) => element,
                Err(err) => return Some(Err(err)),
            };
            self.seen += 1;
            match self.shaper.shape(element.element()) {
                Ok(Some(document)) => return Some(Ok(document)),
                Ok(None) => self.skipped += 1,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Streams the source file into `store`, one upsert per node or way.
pub struct LoadDocumentsEtl<'a, S: DocumentStore> {
    data_path: PathBuf,
    shaper: Shaper,
    store: &'a mut S,
    progress: bool,
    summary: LoadSummary,
}

impl<'a, S: DocumentStore> LoadDocumentsEtl<'a, S> {
    pub fn new(data_path: &Path, shaper: Shaper, store: &'a mut S) -> Self {
        LoadDocumentsEtl {
            data_path: data_path.to_path_buf(),
            shaper,
            store,
            progress: false,
            summary: LoadSummary::default(),
        }
    }

    pub fn from_config(config: &UserConfig, store: &'a mut S) -> Self {
        LoadDocumentsEtl::new(&config.data_path, Shaper::new(config.range_policy()), store)
    }

    /// Show a progress bar while loading.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn summary(&self) -> LoadSummary {
        self.summary
    }
}

impl<S: DocumentStore> Etl for LoadDocumentsEtl<'_, S> {
    type Input = ElementStream<Box<dyn BufRead>>;
    type Output = Documents<ElementStream<Box<dyn BufRead>>>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    /// Loading is never cached: every run upserts the whole source again.
    fn is_cached(&self) -> Result<bool> {
        Ok(false)
    }

    /// Nothing to clean: the store belongs to the caller.
    fn clean(&self) -> Result<()> {
        Ok(())
    }

    fn extract(&mut self) -> Result<Self::Input> {
        Ok(ElementStream::new(open_source(&self.data_path)?))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        Ok(Documents::new(input, self.shaper))
    }

    fn load(&mut self, mut output: Self::Output) -> Result<()> {
        let mut upserted = 0;
        {
            let documents: Box<dyn Iterator<Item = Result<Document>> + '_> = if self.progress {
                Box::new(tqdm::tqdm(&mut output))
            } else {
                Box::new(&mut output)
            };
            for document in documents {
                self.store.upsert(&document?)?;
                upserted += 1;
            }
        }
        self.store.flush()?;

        self.summary = LoadSummary {
            elements: output.seen(),
            upserted,
            skipped: output.skipped(),
        };
        info!(
            etl_name = ETL_NAME,
            elements = self.summary.elements,
            upserted = self.summary.upserted,
            skipped = self.summary.skipped;
            "Documents loaded"
        );

        if let Some(document) = self.store.find_one()? {
            let document_json = serde_json::to_string(&document)?;
            info!(etl_name = ETL_NAME, document = document_json.as_str(); "Read back a stored document");
        }
        Ok(())
    }
}
