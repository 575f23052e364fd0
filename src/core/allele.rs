use crate::{
    constants::EMPTY_ALLELE,
    error::{VcfError, VcfResult},
};
use std::{fmt, str::FromStr};

const DELETION_PREFIX: char = 'D';
const INSERTION_PREFIX: char = 'I';

/// One allele as written in a REF, ALT or genotype column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenotypeEncoding {
    /// A single reference or alternate base.
    SingleBase(char),
    /// Inserted bases, written `I` followed by the bases.
    Insertion(String),
    /// Deleted length, written `D` followed by the length.
    Deletion(u32),
    /// No call, written `.`.
    Uncalled,
}

/// The variant class of an allele, or of a set of alleles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlleleType {
    SingleBase,
    Insertion,
    Deletion,
    Uncalled,
    Mixed,
}

impl fmt::Display for AlleleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlleleType::SingleBase => "SNP",
            AlleleType::Insertion => "INSERTION",
            AlleleType::Deletion => "DELETION",
            AlleleType::Uncalled => "UNCALLED",
            AlleleType::Mixed => "MIXED",
        };
        write!(f, "{s}")
    }
}

fn is_valid_base(c: char) -> bool {
    matches!(c, 'A' | 'C' | 'G' | 'T')
}

impl GenotypeEncoding {
    pub fn single_base(base: char) -> VcfResult<Self> {
        let base = base.to_ascii_uppercase();
        if !is_valid_base(base) {
            return Err(VcfError::schema(format!("invalid base {base}")));
        }
        Ok(GenotypeEncoding::SingleBase(base))
    }

    pub fn insertion(bases: &str) -> VcfResult<Self> {
        let bases = bases.to_ascii_uppercase();
        if bases.is_empty() || !bases.chars().all(is_valid_base) {
            return Err(VcfError::schema(format!(
                "invalid inserted bases {:?}",
                bases
            )));
        }
        Ok(GenotypeEncoding::Insertion(bases))
    }

    pub fn deletion(length: u32) -> VcfResult<Self> {
        if length == 0 {
            return Err(VcfError::schema("deletion length must be positive"));
        }
        Ok(GenotypeEncoding::Deletion(length))
    }

    pub fn allele_type(&self) -> AlleleType {
        match self {
            GenotypeEncoding::SingleBase(_) => AlleleType::SingleBase,
            GenotypeEncoding::Insertion(_) => AlleleType::Insertion,
            GenotypeEncoding::Deletion(_) => AlleleType::Deletion,
            GenotypeEncoding::Uncalled => AlleleType::Uncalled,
        }
    }

    pub fn is_uncalled(&self) -> bool {
        matches!(self, GenotypeEncoding::Uncalled)
    }

    /// Bases carried by the allele; empty for deletions and no-calls.
    pub fn bases(&self) -> String {
        match self {
            GenotypeEncoding::SingleBase(base) => base.to_string(),
            GenotypeEncoding::Insertion(bases) => bases.clone(),
            GenotypeEncoding::Deletion(_) | GenotypeEncoding::Uncalled => String::new(),
        }
    }

    /// Deleted length; zero for every other kind.
    pub fn length(&self) -> u32 {
        match self {
            GenotypeEncoding::Deletion(length) => *length,
            _ => 0,
        }
    }
}

impl FromStr for GenotypeEncoding {
    type Err = VcfError;

    fn from_str(token: &str) -> VcfResult<Self> {
        let mut chars = token.chars();
        let (Some(first), rest) = (chars.next(), chars.as_str()) else {
            return Err(VcfError::schema("empty allele"));
        };
        if rest.is_empty() {
            if token == EMPTY_ALLELE {
                return Ok(GenotypeEncoding::Uncalled);
            }
            if is_valid_base(first.to_ascii_uppercase()) {
                return GenotypeEncoding::single_base(first);
            }
        }
        match first {
            DELETION_PREFIX => {
                let length = rest.parse::<u32>().map_err(|_| {
                    VcfError::schema(format!("invalid deletion length in allele {token}"))
                })?;
                GenotypeEncoding::deletion(length)
            }
            INSERTION_PREFIX => GenotypeEncoding::insertion(rest),
            _ => Err(VcfError::schema(format!("unrecognized allele {token}"))),
        }
    }
}

impl fmt::Display for GenotypeEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenotypeEncoding::SingleBase(base) => write!(f, "{base}"),
            GenotypeEncoding::Insertion(bases) => write!(f, "{INSERTION_PREFIX}{bases}"),
            GenotypeEncoding::Deletion(length) => write!(f, "{DELETION_PREFIX}{length}"),
            GenotypeEncoding::Uncalled => write!(f, "{EMPTY_ALLELE}"),
        }
    }
}
