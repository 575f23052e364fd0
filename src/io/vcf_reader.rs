use crate::{
    constants::{HEADER_INDICATOR, METADATA_INDICATOR},
    core::{
        codec::{LineTransform, VcfCodec},
        header::Header,
        record::VariantRecord,
    },
    error::VcfError,
    io::readers::open_catalog_reader,
    utils::util::{try_exists, Result},
};
use std::{
    io::{BufRead, BufReader, Read as ioRead},
    path::Path,
    sync::Arc,
};

/// A data line together with its 1-based position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedLine {
    pub line_number: usize,
    pub text: String,
}

/// Streams records out of a VCF text source.
///
/// Construction consumes the header block and buffers the first data line.
pub struct VcfReader<R: BufRead> {
    reader: R,
    codec: VcfCodec,
    buffered: Option<NumberedLine>,
    line_number: usize,
}

impl VcfReader<BufReader<Box<dyn ioRead + Send>>> {
    pub fn from_path(
        path: &Path,
        transform: Option<Arc<dyn LineTransform>>,
        skip_genotypes: bool,
    ) -> Result<Self> {
        log::trace!("Start loading VCF {:?}", path);
        try_exists(path)?;
        let reader = open_catalog_reader(path)?;
        Self::with_options(reader, transform, skip_genotypes).map_err(|e| {
            log::error!("Failed to read header of VCF {}", path.display());
            e
        })
    }
}

impl<R: BufRead> VcfReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, None, false)
    }

    pub fn with_options(
        mut reader: R,
        transform: Option<Arc<dyn LineTransform>>,
        skip_genotypes: bool,
    ) -> Result<Self> {
        let mut line_number = 0;
        let mut header_lines = Vec::new();
        loop {
            let Some(line) = next_raw_line(&mut reader, &mut line_number)? else {
                return Err(VcfError::structural(
                    "required header line (#CHROM...) never seen",
                ));
            };
            if line.starts_with(METADATA_INDICATOR) {
                header_lines.push(line);
            } else if line.starts_with(HEADER_INDICATOR) {
                let line = match &transform {
                    Some(transform) => transform.apply(&line).into_owned(),
                    None => line,
                };
                header_lines.push(line);
                break;
            } else if !line.trim().is_empty() {
                return Err(VcfError::structural(
                    "required header line (#CHROM...) never seen before the first data line",
                )
                .at_line(line_number));
            }
        }

        let header = Header::from_lines(&header_lines)?;
        log::debug!(
            "Header: {} metadata lines, {} samples, {}",
            header.lines().len(),
            header.samples().len(),
            header.version().version_string()
        );

        let mut codec = VcfCodec::new(header).with_skip_genotypes(skip_genotypes);
        if let Some(transform) = transform {
            codec = codec.with_transform(transform);
        }
        let mut vcf_reader = VcfReader {
            reader,
            codec,
            buffered: None,
            line_number,
        };
        vcf_reader.buffered = vcf_reader.next_data_line()?;
        Ok(vcf_reader)
    }

    pub fn header(&self) -> &Header {
        self.codec.header()
    }

    pub fn codec(&self) -> &VcfCodec {
        &self.codec
    }

    fn next_data_line(&mut self) -> Result<Option<NumberedLine>> {
        while let Some(text) = next_raw_line(&mut self.reader, &mut self.line_number)? {
            if text.trim().is_empty() {
                continue;
            }
            return Ok(Some(NumberedLine {
                line_number: self.line_number,
                text,
            }));
        }
        Ok(None)
    }

    /// The next data line, as read. `None` at end of stream.
    pub fn read_line(&mut self) -> Result<Option<NumberedLine>> {
        match self.buffered.take() {
            Some(line) => Ok(Some(line)),
            None => self.next_data_line(),
        }
    }

    /// Decode the next data line. `None` at end of stream.
    pub fn read_record(&mut self) -> Result<Option<VariantRecord>> {
        let Some(line) = self.read_line()? else {
            return Ok(None);
        };
        self.codec
            .decode(&line.text)
            .map(Some)
            .map_err(|e| e.at_line(line.line_number))
    }

    /// Iterate over the remaining records. The iterator ends after the first error.
    pub fn records(&mut self) -> Records<'_, R> {
        Records {
            reader: self,
            failed: false,
        }
    }
}

fn next_raw_line<R: BufRead>(reader: &mut R, line_number: &mut usize) -> Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    *line_number += 1;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

pub struct Records<'a, R: BufRead> {
    reader: &'a mut VcfReader<R>,
    failed: bool,
}

impl<R: BufRead> Iterator for Records<'_, R> {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.read_record() {
            Ok(record) => record.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
