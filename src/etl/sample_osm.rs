use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use log::info;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::writer::Writer;

use crate::UserConfig;
use crate::data::SourceElement;
use crate::errors::Result;
use crate::etl::Etl;
use crate::stream::{open_source, ElementStream};

pub const ETL_NAME: &str = "sample_osm";
pub const SAMPLE_ROOT: &str = "osm";

/// Keeps the elements whose 0-based position is a multiple of `interval`,
/// so the first element is always kept. Errors are passed through.
pub struct Sample<I> {
    elements: I,
    interval: usize,
    index: usize,
}

impl<I> Sample<I> {
    pub fn new(elements: I, interval: NonZeroUsize) -> Self {
        Sample {
            elements,
            interval: interval.get(),
            index: 0,
        }
    }
}

impl<I: Iterator<Item = Result<SourceElement>>> Iterator for Sample<I> {
    type Item = Result<SourceElement>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let element = match self.elements.next()? {
                Ok(element) => element,
                Err(err) => return Some(Err(err)),
            };
            let index = self.index;
            self.index += 1;
            if index % self.interval == 0 {
                return Some(Ok(element));
            }
        }
    }
}

/// Writes `elements` verbatim into a new `<osm>` document. Returns how many
/// elements were written.
pub fn write_sample<W, I>(sink: W, elements: I) -> Result<usize>
where
    W: Write,
    I: Iterator<Item = Result<SourceElement>>,
{
    let mut writer = Writer::new(sink);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.get_mut().write_all(b"\n")?;
    writer.write_event(Event::Start(BytesStart::new(SAMPLE_ROOT)))?;
    writer.get_mut().write_all(b"\n")?;

    let mut written = 0;
    for element in elements {
        let element = element?;
        let out = writer.get_mut();
        out.write_all(b"  ")?;
        out.write_all(element.raw())?;
        out.write_all(b"\n")?;
        written += 1;
    }

    writer.write_event(Event::End(BytesEnd::new(SAMPLE_ROOT)))?;
    writer.get_mut().write_all(b"\n")?;
    writer.into_inner().flush()?;
    Ok(written)
}

pub struct SampleOsmEtl {
    data_path: PathBuf,
    sample_path: PathBuf,
    interval: NonZeroUsize,
    written: usize,
}

impl SampleOsmEtl {
    pub fn new(data_path: &Path, sample_path: &Path, interval: NonZeroUsize) -> SampleOsmEtl {
        SampleOsmEtl {
            data_path: data_path.to_path_buf(),
            sample_path: sample_path.to_path_buf(),
            interval,
            written: 0,
        }
    }

    pub fn from_config(config: &UserConfig) -> Result<SampleOsmEtl> {
        Ok(SampleOsmEtl::new(&config.data_path, &config.sample_path, config.sample_interval()?))
    }

    /// Elements written by the last load.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl Etl for SampleOsmEtl {
    type Input = ElementStream<Box<dyn BufRead>>;
    type Output = Sample<ElementStream<Box<dyn BufRead>>>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self) -> Result<bool> {
        Ok(self.sample_path.try_exists()?)
    }

    fn clean(&self) -> Result<()> {
        if self.is_cached()? {
            fs::remove_file(&self.sample_path)?;
        }
        Ok(())
    }

    fn extract(&mut self) -> Result<Self::Input> {
        Ok(ElementStream::new(open_source(&self.data_path)?))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        Ok(Sample::new(input, self.interval))
    }

    fn load(&mut self, output: Self::Output) -> Result<()> {
        if let Some(parent) = self.sample_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let output_file = File::create(&self.sample_path)?;
        match write_sample(BufWriter::new(output_file), output) {
            Ok(written) => {
                self.written = written;
                info!(etl_name = ETL_NAME, written = written; "Sample written");
                Ok(())
            },
            Err(err) => {
                // A partial sample would otherwise count as cached.
                self.clean()?;
                Err(err)
            },
        }
    }
}
