use crate::constants::{
    MISSING_FORMAT_VALUES_V3, MISSING_FORMAT_VALUES_V4, MISSING_VALUE_V3, MISSING_VALUE_V4,
    PASSES_FILTERS_V3, PASSES_FILTERS_V4, UNBOUNDED_V3, UNBOUNDED_V4,
};
use std::fmt;

/// The VCF revisions this codec reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VcfVersion {
    V3_2,
    V3_3,
    V4_0,
}

/// Header line value syntax, one per family of versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Bare positional list: `NS,1,Integer,"Number of samples"`.
    V3,
    /// Keyed block: `<ID=NS,Number=1,Type=Integer,Description="Number of samples">`.
    V4,
}

impl VcfVersion {
    pub const ALL: [VcfVersion; 3] = [VcfVersion::V3_2, VcfVersion::V3_3, VcfVersion::V4_0];

    /// Substituted whenever a file does not declare a recognized version.
    pub const DEFAULT: VcfVersion = VcfVersion::V3_3;

    /// The meta-key used to declare this version.
    pub fn format_key(&self) -> &'static str {
        match self {
            VcfVersion::V3_2 => "format",
            VcfVersion::V3_3 | VcfVersion::V4_0 => "fileformat",
        }
    }

    pub fn version_string(&self) -> &'static str {
        match self {
            VcfVersion::V3_2 => "VCRv3.2",
            VcfVersion::V3_3 => "VCFv3.3",
            VcfVersion::V4_0 => "VCFv4.0",
        }
    }

    /// Resolve a `key=value` metadata pair into a version, if it is a recognized declaration.
    pub fn from_declaration(key: &str, value: &str) -> Option<VcfVersion> {
        Self::ALL
            .into_iter()
            .find(|version| version.format_key() == key && version.version_string() == value.trim())
    }

    /// True when `key` is one of the meta-keys used to declare a version.
    pub fn is_format_key(key: &str) -> bool {
        Self::ALL.iter().any(|version| version.format_key() == key)
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            VcfVersion::V3_2 | VcfVersion::V3_3 => Dialect::V3,
            VcfVersion::V4_0 => Dialect::V4,
        }
    }

    pub fn is_v4(&self) -> bool {
        self.dialect() == Dialect::V4
    }

    pub fn unbounded_sentinel(&self) -> &'static str {
        match self.dialect() {
            Dialect::V3 => UNBOUNDED_V3,
            Dialect::V4 => UNBOUNDED_V4,
        }
    }

    pub fn passes_filters(&self) -> &'static str {
        match self.dialect() {
            Dialect::V3 => PASSES_FILTERS_V3,
            Dialect::V4 => PASSES_FILTERS_V4,
        }
    }

    /// Token written for a missing QUAL value.
    pub fn missing_quality(&self) -> &'static str {
        match self.dialect() {
            Dialect::V3 => MISSING_VALUE_V3,
            Dialect::V4 => MISSING_VALUE_V4,
        }
    }

    /// Value substituted for a blank or absent FORMAT field.
    pub fn missing_format_value(&self, key: &str) -> &'static str {
        match self.dialect() {
            Dialect::V3 => MISSING_FORMAT_VALUES_V3.get(key).copied().unwrap_or(""),
            Dialect::V4 => MISSING_FORMAT_VALUES_V4
                .get(key)
                .copied()
                .unwrap_or(MISSING_VALUE_V4),
        }
    }
}

impl fmt::Display for VcfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.format_key(), self.version_string())
    }
}
