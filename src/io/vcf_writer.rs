use crate::{
    core::{header::Header, record::VariantRecord},
    utils::util::Result,
};
use flate2::{write::GzEncoder, Compression};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputType {
    Vcf {
        is_uncompressed: bool,
        level: Option<u32>,
    },
}

impl OutputType {
    fn is_uncompressed(&self) -> bool {
        match self {
            Self::Vcf {
                is_uncompressed, ..
            } => *is_uncompressed,
        }
    }

    fn compression(&self) -> Compression {
        match self {
            Self::Vcf {
                level: Some(level), ..
            } => Compression::new(*level),
            Self::Vcf { level: None, .. } => Compression::default(),
        }
    }
}

enum Sink {
    Plain(BufWriter<Box<dyn Write + Send>>),
    Gzip(GzEncoder<BufWriter<Box<dyn Write + Send>>>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(writer) => writer.write(buf),
            Sink::Gzip(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(writer) => writer.flush(),
            Sink::Gzip(writer) => writer.flush(),
        }
    }
}

/// Writes a header followed by encoded records to a file or standard output.
pub struct VcfWriter {
    writer: Sink,
    header: Header,
    records_written: usize,
}

impl VcfWriter {
    fn resolve_output_type(output_type: &Option<OutputType>, output: Option<&str>) -> OutputType {
        match (output_type, output) {
            (Some(output_type), _) => output_type.clone(),
            (None, Some(path)) => Self::infer_output_type_from_extension(path),
            (None, None) => OutputType::Vcf {
                is_uncompressed: true,
                level: None,
            },
        }
    }

    /// Create the output and write the header block.
    pub fn new(
        header: Header,
        output_type: &Option<OutputType>,
        output: Option<&String>,
    ) -> Result<Self> {
        let output_type = Self::resolve_output_type(output_type, output.map(String::as_str));
        log::trace!("{:?}", &output_type);

        let sink: Box<dyn Write + Send> = match output {
            Some(path) => Box::new(File::create(path).map_err(|e| {
                crate::vcf_error!("Failed to create output file {}: {}", path, e)
            })?),
            None => Box::new(io::stdout()),
        };
        let writer = if output_type.is_uncompressed() {
            Sink::Plain(BufWriter::new(sink))
        } else {
            Sink::Gzip(GzEncoder::new(
                BufWriter::new(sink),
                output_type.compression(),
            ))
        };
        Self::start(writer, header)
    }

    /// Wrap an arbitrary uncompressed sink and write the header block.
    pub fn from_writer(writer: Box<dyn Write + Send>, header: Header) -> Result<Self> {
        Self::start(Sink::Plain(BufWriter::new(writer)), header)
    }

    fn start(writer: Sink, header: Header) -> Result<Self> {
        let mut vcf_writer = VcfWriter {
            writer,
            header,
            records_written: 0,
        };
        for line in vcf_writer.header.encode() {
            writeln!(vcf_writer.writer, "{line}")?;
        }
        Ok(vcf_writer)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn write_record(&mut self, record: &VariantRecord) -> Result<()> {
        let line = record.encode(&self.header)?;
        writeln!(self.writer, "{line}")?;
        self.records_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and, for compressed output, write the gzip trailer.
    pub fn finish(self) -> Result<()> {
        match self.writer {
            Sink::Plain(mut writer) => writer.flush()?,
            Sink::Gzip(writer) => writer.finish()?.flush()?,
        }
        Ok(())
    }

    fn infer_output_type_from_extension(path: &str) -> OutputType {
        let path_lower = path.to_lowercase();
        match path_lower.as_str() {
            s if s.ends_with(".vcf.gz") || s.ends_with(".vcf.bgz") || s.ends_with(".gz") => {
                OutputType::Vcf {
                    is_uncompressed: false,
                    level: None,
                }
            }
            _ => OutputType::Vcf {
                is_uncompressed: true,
                level: None,
            },
        }
    }
}
