use super::grammar::{COMPOUND_TAGS, FILTER_TAGS};
use crate::{
    constants::{UNBOUNDED, UNBOUNDED_V4},
    core::version::VcfVersion,
    error::{VcfError, VcfResult},
};
use std::{fmt, str::FromStr};

pub const INFO_KEY: &str = "INFO";
pub const FORMAT_KEY: &str = "FORMAT";
pub const FILTER_KEY: &str = "FILTER";

/// Which of the two compound header line families a definition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompoundKind {
    Info,
    Format,
}

impl CompoundKind {
    pub fn key(&self) -> &'static str {
        match self {
            CompoundKind::Info => INFO_KEY,
            CompoundKind::Format => FORMAT_KEY,
        }
    }
}

/// Declared type of an INFO or FORMAT field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Float,
    String,
    Character,
    Flag,
}

impl FromStr for ValueType {
    type Err = VcfError;

    fn from_str(s: &str) -> VcfResult<Self> {
        match s {
            "Integer" => Ok(ValueType::Integer),
            "Float" => Ok(ValueType::Float),
            "String" => Ok(ValueType::String),
            "Character" => Ok(ValueType::Character),
            "Flag" => Ok(ValueType::Flag),
            other => Err(VcfError::schema(format!("unknown field type {other}"))),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::String => "String",
            ValueType::Character => "Character",
            ValueType::Flag => "Flag",
        };
        write!(f, "{s}")
    }
}

/// An `INFO` or `FORMAT` definition.
///
/// Equality ignores `version`, so the same definition read from a 3.x and a 4.0
/// header compares equal.
#[derive(Debug, Clone)]
pub struct CompoundHeaderLine {
    pub kind: CompoundKind,
    pub name: String,
    /// Number of values, or [`UNBOUNDED`] when variable or unknown.
    pub count: i32,
    pub value_type: ValueType,
    pub description: String,
    pub version: VcfVersion,
}

impl CompoundHeaderLine {
    pub fn new(
        kind: CompoundKind,
        name: impl Into<String>,
        count: i32,
        value_type: ValueType,
        description: impl Into<String>,
        version: VcfVersion,
    ) -> VcfResult<Self> {
        let name = name.into();
        if kind == CompoundKind::Format && value_type == ValueType::Flag {
            return Err(VcfError::schema(format!(
                "FORMAT field {name} cannot be declared as Flag"
            )));
        }
        if count < UNBOUNDED {
            return Err(VcfError::schema(format!(
                "{} field {name} has a negative count {count}",
                kind.key()
            )));
        }
        Ok(Self {
            kind,
            name,
            count,
            value_type,
            description: description.into(),
            version,
        })
    }

    pub fn decode(kind: CompoundKind, value: &str, version: VcfVersion) -> VcfResult<Self> {
        let fields = version.dialect().parse(value, &COMPOUND_TAGS)?;
        let count = decode_count(&fields["Number"], version)?;
        let value_type = fields["Type"].parse::<ValueType>()?;
        Self::new(
            kind,
            fields["ID"].as_str(),
            count,
            value_type,
            fields["Description"].as_str(),
            version,
        )
    }

    pub fn is_unbounded(&self) -> bool {
        self.count == UNBOUNDED
    }

    /// The line value without the `KEY=` prefix.
    pub fn encode_value(&self) -> String {
        let count = if self.is_unbounded() {
            self.version.unbounded_sentinel().to_string()
        } else {
            self.count.to_string()
        };
        let value_type = self.value_type.to_string();
        self.version.dialect().format(&[
            ("ID", self.name.as_str()),
            ("Number", count.as_str()),
            ("Type", value_type.as_str()),
            ("Description", self.description.as_str()),
        ])
    }
}

fn decode_count(token: &str, version: VcfVersion) -> VcfResult<i32> {
    let token = token.trim();
    if token == version.unbounded_sentinel() || token == UNBOUNDED_V4 {
        return Ok(UNBOUNDED);
    }
    match token.parse::<i32>() {
        Ok(count) if count >= UNBOUNDED => Ok(count),
        _ => Err(VcfError::schema(format!(
            "invalid Number {token} for {}",
            version.version_string()
        ))),
    }
}

impl PartialEq for CompoundHeaderLine {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.count == other.count
            && self.value_type == other.value_type
            && self.description == other.description
    }
}

impl Eq for CompoundHeaderLine {}

#[derive(Debug, Clone)]
pub struct FilterHeaderLine {
    pub name: String,
    pub description: String,
    pub version: VcfVersion,
}

impl FilterHeaderLine {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        version: VcfVersion,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            version,
        }
    }

    pub fn decode(value: &str, version: VcfVersion) -> VcfResult<Self> {
        let fields = version.dialect().parse(value, &FILTER_TAGS)?;
        Ok(Self::new(
            fields["ID"].as_str(),
            fields["Description"].as_str(),
            version,
        ))
    }

    pub fn encode_value(&self) -> String {
        self.version.dialect().format(&[
            ("ID", self.name.as_str()),
            ("Description", self.description.as_str()),
        ])
    }
}

impl PartialEq for FilterHeaderLine {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.description == other.description
    }
}

impl Eq for FilterHeaderLine {}

/// Any other `##KEY=VALUE` metadata line.
#[derive(Debug, Clone)]
pub struct PlainHeaderLine {
    pub key: String,
    pub value: String,
    pub version: VcfVersion,
}

impl PlainHeaderLine {
    pub fn new(key: impl Into<String>, value: impl Into<String>, version: VcfVersion) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            version,
        }
    }
}

impl PartialEq for PlainHeaderLine {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl Eq for PlainHeaderLine {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    Version(VcfVersion),
    Info(CompoundHeaderLine),
    Format(CompoundHeaderLine),
    Filter(FilterHeaderLine),
    Plain(PlainHeaderLine),
}

impl HeaderLine {
    /// Parse the text of a metadata line with its leading `##` already removed.
    ///
    /// Returns `Ok(None)` for lines without a `=`. Version declarations are not
    /// resolved here, see [`HeaderLine::decode_version`].
    pub fn decode(body: &str, version: VcfVersion) -> VcfResult<Option<HeaderLine>> {
        let Some((key, value)) = body.split_once('=') else {
            return Ok(None);
        };
        let line = match key {
            INFO_KEY => HeaderLine::Info(CompoundHeaderLine::decode(
                CompoundKind::Info,
                value,
                version,
            )?),
            FORMAT_KEY => HeaderLine::Format(CompoundHeaderLine::decode(
                CompoundKind::Format,
                value,
                version,
            )?),
            FILTER_KEY => HeaderLine::Filter(FilterHeaderLine::decode(value, version)?),
            _ => HeaderLine::Plain(PlainHeaderLine::new(key, value, version)),
        };
        Ok(Some(line))
    }

    /// Resolve a version declaration line. `None` when the line declares a
    /// version this codec does not know or is not a declaration at all.
    pub fn decode_version(body: &str) -> Option<VcfVersion> {
        let (key, value) = body.split_once('=')?;
        VcfVersion::from_declaration(key, value)
    }

    pub fn key(&self) -> &str {
        match self {
            HeaderLine::Version(version) => version.format_key(),
            HeaderLine::Info(_) => INFO_KEY,
            HeaderLine::Format(_) => FORMAT_KEY,
            HeaderLine::Filter(_) => FILTER_KEY,
            HeaderLine::Plain(line) => &line.key,
        }
    }

    pub fn value(&self) -> String {
        match self {
            HeaderLine::Version(version) => version.version_string().to_string(),
            HeaderLine::Info(line) | HeaderLine::Format(line) => line.encode_value(),
            HeaderLine::Filter(line) => line.encode_value(),
            HeaderLine::Plain(line) => line.value.clone(),
        }
    }

    pub fn is_version(&self) -> bool {
        matches!(self, HeaderLine::Version(_))
    }

    /// Re-tag the line for serialization under `version`.
    pub fn with_version(self, version: VcfVersion) -> HeaderLine {
        match self {
            HeaderLine::Version(_) => HeaderLine::Version(version),
            HeaderLine::Info(line) => HeaderLine::Info(CompoundHeaderLine { version, ..line }),
            HeaderLine::Format(line) => HeaderLine::Format(CompoundHeaderLine { version, ..line }),
            HeaderLine::Filter(line) => HeaderLine::Filter(FilterHeaderLine { version, ..line }),
            HeaderLine::Plain(line) => HeaderLine::Plain(PlainHeaderLine { version, ..line }),
        }
    }
}

impl fmt::Display for HeaderLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.value())
    }
}
