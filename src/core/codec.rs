use crate::{
    constants::FIELD_SEPARATOR,
    core::{
        header::Header,
        record::{Locus, VariantRecord},
    },
    error::VcfResult,
};
use std::{borrow::Cow, fmt, sync::Arc};

/// Rewrites a raw data line before it is decoded.
pub trait LineTransform: Send + Sync {
    fn apply<'a>(&self, line: &'a str) -> Cow<'a, str>;
}

impl<F> LineTransform for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn apply<'a>(&self, line: &'a str) -> Cow<'a, str> {
        Cow::Owned(self(line))
    }
}

/// Reads legacy files whose columns are separated by runs of spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceDelimitedTransform;

impl LineTransform for SpaceDelimitedTransform {
    fn apply<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if !line.contains(' ') {
            return Cow::Borrowed(line);
        }
        let separator = FIELD_SEPARATOR.to_string();
        Cow::Owned(line.split_whitespace().collect::<Vec<_>>().join(&separator))
    }
}

/// Decodes and encodes data lines against one header.
///
/// Cloning is cheap and every operation is a pure function of its input, so one
/// codec can be shared between worker threads.
#[derive(Clone)]
pub struct VcfCodec {
    header: Arc<Header>,
    transform: Option<Arc<dyn LineTransform>>,
    skip_genotypes: bool,
}

impl fmt::Debug for VcfCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VcfCodec")
            .field("version", &self.header.version())
            .field("samples", &self.header.samples().len())
            .field("transform", &self.transform.is_some())
            .field("skip_genotypes", &self.skip_genotypes)
            .finish()
    }
}

impl VcfCodec {
    pub fn new(header: Header) -> Self {
        Self {
            header: Arc::new(header),
            transform: None,
            skip_genotypes: false,
        }
    }

    pub fn with_transform(mut self, transform: Arc<dyn LineTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_skip_genotypes(mut self, skip_genotypes: bool) -> Self {
        self.skip_genotypes = skip_genotypes;
        self
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn transform(&self) -> Option<&Arc<dyn LineTransform>> {
        self.transform.as_ref()
    }

    pub fn skips_genotypes(&self) -> bool {
        self.skip_genotypes
    }

    pub fn preprocess<'a>(&self, line: &'a str) -> Cow<'a, str> {
        match &self.transform {
            Some(transform) => transform.apply(line),
            None => Cow::Borrowed(line),
        }
    }

    pub fn decode(&self, line: &str) -> VcfResult<VariantRecord> {
        let line = self.preprocess(line);
        VariantRecord::decode(&line, &self.header, self.skip_genotypes)
    }

    pub fn decode_loc(&self, line: &str) -> VcfResult<Locus> {
        let line = self.preprocess(line);
        VariantRecord::decode_loc(&line)
    }

    pub fn encode(&self, record: &VariantRecord) -> VcfResult<String> {
        record.encode(&self.header)
    }
}
