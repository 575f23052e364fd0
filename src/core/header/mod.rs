pub mod grammar;
pub mod line;

pub use line::{
    CompoundHeaderLine, CompoundKind, FilterHeaderLine, HeaderLine, PlainHeaderLine, ValueType,
};

use crate::{
    constants::{FIELD_SEPARATOR, HEADER_INDICATOR, METADATA_INDICATOR},
    core::version::VcfVersion,
    error::{VcfError, VcfResult},
};
use indexmap::IndexSet;
use std::fmt;

/// The eight columns every VCF data line starts with, in their required order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderColumn {
    Chrom,
    Pos,
    Id,
    Ref,
    Alt,
    Qual,
    Filter,
    Info,
}

impl HeaderColumn {
    pub const ALL: [HeaderColumn; 8] = [
        HeaderColumn::Chrom,
        HeaderColumn::Pos,
        HeaderColumn::Id,
        HeaderColumn::Ref,
        HeaderColumn::Alt,
        HeaderColumn::Qual,
        HeaderColumn::Filter,
        HeaderColumn::Info,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HeaderColumn::Chrom => "CHROM",
            HeaderColumn::Pos => "POS",
            HeaderColumn::Id => "ID",
            HeaderColumn::Ref => "REF",
            HeaderColumn::Alt => "ALT",
            HeaderColumn::Qual => "QUAL",
            HeaderColumn::Filter => "FILTER",
            HeaderColumn::Info => "INFO",
        }
    }
}

impl fmt::Display for HeaderColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub const MANDATORY_COLUMN_COUNT: usize = HeaderColumn::ALL.len();
pub const FORMAT_COLUMN: &str = "FORMAT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    version: VcfVersion,
    /// Sorted by serialized text, without duplicates. Holds exactly one version line.
    lines: Vec<HeaderLine>,
    samples: IndexSet<String>,
}

impl Header {
    /// Build a header programmatically. Any version lines in `lines` are replaced
    /// by a single declaration of `version`, and every line is re-tagged to it.
    pub fn new(
        version: VcfVersion,
        lines: impl IntoIterator<Item = HeaderLine>,
        samples: impl IntoIterator<Item = String>,
    ) -> VcfResult<Self> {
        let mut unique = IndexSet::new();
        for sample in samples {
            if !unique.insert(sample.clone()) {
                return Err(VcfError::structural(format!(
                    "sample {sample} is listed more than once"
                )));
            }
        }
        let lines = lines
            .into_iter()
            .filter(|line| !line.is_version())
            .map(|line| line.with_version(version))
            .chain(std::iter::once(HeaderLine::Version(version)))
            .collect();
        Ok(Self {
            version,
            lines: sort_lines(lines),
            samples: unique,
        })
    }

    /// Build a header from the leading `##` and `#` lines of a file.
    ///
    /// The version comes from the first recognized declaration. A declaration that
    /// is not recognized is dropped, and when none is recognized the default
    /// version is declared instead.
    pub fn from_lines<I, S>(lines: I) -> VcfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(lines, None)
    }

    /// Build a header from text lines, interpreting metadata under `version`
    /// regardless of what the lines declare.
    pub fn from_lines_with_version<I, S>(lines: I, version: VcfVersion) -> VcfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(lines, Some(version))
    }

    fn build<I, S>(lines: I, forced: Option<VcfVersion>) -> VcfResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut metadata: Vec<String> = Vec::new();
        let mut column_line: Option<String> = None;
        for line in lines {
            let line = line.as_ref();
            if let Some(body) = line.strip_prefix(METADATA_INDICATOR) {
                metadata.push(body.to_string());
            } else if line.starts_with(HEADER_INDICATOR) {
                column_line = Some(line.to_string());
                break;
            }
        }
        let column_line = column_line.ok_or_else(|| {
            VcfError::structural("required header line (#CHROM...) never seen")
        })?;

        let version = match forced {
            Some(version) => version,
            None => reconcile_version(&metadata),
        };
        log::debug!("Reading header as {}", version.version_string());

        let mut parsed = Vec::with_capacity(metadata.len());
        for body in &metadata {
            let is_declaration = body
                .split_once('=')
                .is_some_and(|(key, _)| VcfVersion::is_format_key(key));
            if is_declaration {
                continue;
            }
            if let Some(line) = HeaderLine::decode(body, version)? {
                parsed.push(line);
            }
        }

        let samples = parse_column_line(&column_line)?;
        Self::new(version, parsed, samples)
    }

    pub fn version(&self) -> VcfVersion {
        self.version
    }

    /// Metadata lines in serialized order, including the version declaration.
    pub fn lines(&self) -> &[HeaderLine] {
        &self.lines
    }

    pub fn samples(&self) -> &IndexSet<String> {
        &self.samples
    }

    pub fn has_genotyping_data(&self) -> bool {
        !self.samples.is_empty()
    }

    pub fn column_count(&self) -> usize {
        if self.has_genotyping_data() {
            MANDATORY_COLUMN_COUNT + 1 + self.samples.len()
        } else {
            MANDATORY_COLUMN_COUNT
        }
    }

    pub fn info(&self, id: &str) -> Option<&CompoundHeaderLine> {
        self.lines.iter().find_map(|line| match line {
            HeaderLine::Info(info) if info.name == id => Some(info),
            _ => None,
        })
    }

    pub fn format(&self, id: &str) -> Option<&CompoundHeaderLine> {
        self.lines.iter().find_map(|line| match line {
            HeaderLine::Format(format) if format.name == id => Some(format),
            _ => None,
        })
    }

    pub fn filter(&self, id: &str) -> Option<&FilterHeaderLine> {
        self.lines.iter().find_map(|line| match line {
            HeaderLine::Filter(filter) if filter.name == id => Some(filter),
            _ => None,
        })
    }

    /// A sites-only copy of this header.
    pub fn without_samples(&self) -> Header {
        Header {
            version: self.version,
            lines: self.lines.clone(),
            samples: IndexSet::new(),
        }
    }

    /// The `#CHROM...` line, without a trailing newline.
    pub fn column_line(&self) -> String {
        let mut columns: Vec<&str> = HeaderColumn::ALL.iter().map(HeaderColumn::name).collect();
        if self.has_genotyping_data() {
            columns.push(FORMAT_COLUMN);
            columns.extend(self.samples.iter().map(String::as_str));
        }
        let separator = FIELD_SEPARATOR.to_string();
        format!("{HEADER_INDICATOR}{}", columns.join(&separator))
    }

    /// The complete header block, one line per entry, version declaration first.
    pub fn encode(&self) -> Vec<String> {
        let version = HeaderLine::Version(self.version);
        let mut out = Vec::with_capacity(self.lines.len() + 1);
        out.push(format!("{METADATA_INDICATOR}{version}"));
        out.extend(
            self.lines
                .iter()
                .filter(|line| !line.is_version())
                .map(|line| format!("{METADATA_INDICATOR}{line}")),
        );
        out.push(self.column_line());
        out
    }
}

fn reconcile_version(metadata: &[String]) -> VcfVersion {
    let mut found: Option<VcfVersion> = None;
    for body in metadata {
        let Some((key, value)) = body.split_once('=') else {
            continue;
        };
        if !VcfVersion::is_format_key(key) {
            continue;
        }
        match (VcfVersion::from_declaration(key, value), found) {
            (Some(version), None) => found = Some(version),
            (Some(version), Some(first)) if version != first => {
                log::warn!(
                    "Ignoring second version declaration {body}, keeping {}",
                    first.version_string()
                );
            }
            (Some(_), Some(_)) => {}
            (None, _) => log::warn!("Dropping unrecognized version declaration {body}"),
        }
    }
    found.unwrap_or_else(|| {
        log::warn!(
            "No recognized version declaration, assuming {}",
            VcfVersion::DEFAULT.version_string()
        );
        VcfVersion::DEFAULT
    })
}

/// Validate the mandatory columns and return the sample names that follow `FORMAT`.
fn parse_column_line(line: &str) -> VcfResult<Vec<String>> {
    let body = line.strip_prefix(HEADER_INDICATOR).unwrap_or(line);
    let tokens: Vec<&str> = body.split(FIELD_SEPARATOR).collect();

    for (i, column) in HeaderColumn::ALL.iter().enumerate() {
        match tokens.get(i) {
            Some(token) if *token == column.name() => {}
            Some(token) => {
                return Err(VcfError::structural(format!(
                    "expected column {} at position {}, found {token}",
                    column.name(),
                    i + 1
                )))
            }
            None => {
                return Err(VcfError::structural(format!(
                    "expected column {} at position {}, found end of line",
                    column.name(),
                    i + 1
                )))
            }
        }
    }

    match tokens.get(MANDATORY_COLUMN_COUNT) {
        None => Ok(Vec::new()),
        Some(&FORMAT_COLUMN) => Ok(tokens[MANDATORY_COLUMN_COUNT + 1..]
            .iter()
            .map(|s| s.to_string())
            .collect()),
        Some(token) => Err(VcfError::structural(format!(
            "expected column {FORMAT_COLUMN} at position {}, found {token}",
            MANDATORY_COLUMN_COUNT + 1
        ))),
    }
}

fn sort_lines(lines: Vec<HeaderLine>) -> Vec<HeaderLine> {
    let mut keyed: Vec<(String, HeaderLine)> = lines
        .into_iter()
        .map(|line| (line.to_string(), line))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut sorted: Vec<HeaderLine> = Vec::with_capacity(keyed.len());
    for (_, line) in keyed {
        if !sorted.contains(&line) {
            sorted.push(line);
        }
    }
    sorted
}
