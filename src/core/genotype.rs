use crate::{
    constants::{EMPTY_ALLELE, FIELD_SEPARATOR, GENOTYPE_FIELD_SEPARATOR, GENOTYPE_KEY},
    core::{allele::GenotypeEncoding, version::VcfVersion},
    error::{VcfError, VcfResult},
};
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// `/`
    Unphased,
    /// `|`
    Phased,
    /// `\`
    PhasedSwitchProb,
}

impl Phase {
    pub fn separator(&self) -> char {
        match self {
            Phase::Unphased => '/',
            Phase::Phased => '|',
            Phase::PhasedSwitchProb => '\\',
        }
    }

    pub fn from_separator(c: char) -> Option<Phase> {
        match c {
            '/' => Some(Phase::Unphased),
            '|' => Some(Phase::Phased),
            '\\' => Some(Phase::PhasedSwitchProb),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.separator())
    }
}

/// One sample's call at a variant site.
///
/// The alleles and phase make up the `GT` value, which is never stored among the
/// other FORMAT fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenotypeRecord {
    sample: String,
    phase: Phase,
    alleles: Vec<GenotypeEncoding>,
    fields: IndexMap<String, String>,
}

impl GenotypeRecord {
    pub fn new(sample: impl Into<String>, phase: Phase, alleles: Vec<GenotypeEncoding>) -> Self {
        Self {
            sample: sample.into(),
            phase,
            alleles,
            fields: IndexMap::new(),
        }
    }

    /// An unphased call with `ploidy` uncalled alleles and no other fields.
    pub fn no_call(sample: impl Into<String>, ploidy: usize) -> Self {
        Self::new(
            sample,
            Phase::Unphased,
            vec![GenotypeEncoding::Uncalled; ploidy],
        )
    }

    /// Decode one sample column against the record's FORMAT keys.
    ///
    /// Allele indices in `GT` resolve to `reference` (0) or to `alternates` (1..N).
    pub fn decode(
        sample: &str,
        keys: &[&str],
        value: &str,
        reference: char,
        alternates: &[GenotypeEncoding],
        version: VcfVersion,
    ) -> VcfResult<Self> {
        let mut record = Self::new(sample, Phase::Unphased, Vec::new());

        if keys.len() > 1
            && keys.contains(&GENOTYPE_KEY)
            && !value.contains(GENOTYPE_FIELD_SEPARATOR)
        {
            if let Ok((phase, alleles)) = decode_gt(value, reference, alternates) {
                if alleles.iter().all(GenotypeEncoding::is_uncalled) {
                    record.phase = phase;
                    record.alleles = alleles;
                    for key in keys.iter().filter(|key| **key != GENOTYPE_KEY) {
                        record
                            .fields
                            .insert(key.to_string(), version.missing_format_value(key).to_string());
                    }
                    return Ok(record);
                }
            }
        }

        let mut remaining = Some(value);
        for (i, key) in keys.iter().enumerate() {
            let rest = remaining.ok_or_else(|| {
                VcfError::structural(format!(
                    "sample {sample} has {i} fields but FORMAT lists {} keys ({})",
                    keys.len(),
                    keys.join(":")
                ))
            })?;
            let slice = match rest.split_once(GENOTYPE_FIELD_SEPARATOR) {
                Some((head, tail)) => {
                    remaining = Some(tail);
                    head
                }
                None => {
                    remaining = None;
                    rest
                }
            };

            if *key == GENOTYPE_KEY {
                let (phase, alleles) = decode_gt(slice, reference, alternates)?;
                record.phase = phase;
                record.alleles = alleles;
            } else {
                let value = if slice.is_empty() {
                    version.missing_format_value(key)
                } else {
                    slice
                };
                if record.fields.insert(key.to_string(), value.to_string()).is_some() {
                    return Err(VcfError::schema(format!(
                        "FORMAT key {key} is listed more than once"
                    )));
                }
            }
        }

        if let Some(tail) = remaining {
            return Err(VcfError::structural(format!(
                "sample {sample} has more fields than FORMAT lists ({}), unconsumed {tail:?}",
                keys.join(":")
            )));
        }
        Ok(record)
    }

    /// Render this call for the given FORMAT keys.
    ///
    /// Allele indices are looked up in the record-wide `alternates`. Under v4 a call
    /// with no called allele and no informative field collapses to its bare GT
    /// token, `.` per allele.
    pub fn encode(
        &self,
        keys: &[&str],
        reference: char,
        alternates: &[GenotypeEncoding],
        version: VcfVersion,
    ) -> VcfResult<String> {
        if version.is_v4() && self.is_no_call() && self.has_only_missing_fields(version) {
            return Ok(self.encode_no_call());
        }

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            if *key == GENOTYPE_KEY {
                out.push(self.encode_gt(reference, alternates)?);
            } else {
                let value = match self.fields.get(*key) {
                    Some(value) if !value.is_empty() => value.as_str(),
                    _ => version.missing_format_value(key),
                };
                out.push(value.to_string());
            }
        }
        Ok(out.join(&GENOTYPE_FIELD_SEPARATOR.to_string()))
    }

    /// The bare GT token of a no-call, one `.` per allele.
    fn encode_no_call(&self) -> String {
        if self.alleles.is_empty() {
            return EMPTY_ALLELE.to_string();
        }
        vec![EMPTY_ALLELE; self.alleles.len()].join(&self.phase.separator().to_string())
    }

    fn encode_gt(&self, reference: char, alternates: &[GenotypeEncoding]) -> VcfResult<String> {
        if self.alleles.is_empty() {
            return Ok(EMPTY_ALLELE.to_string());
        }
        let reference = GenotypeEncoding::SingleBase(reference.to_ascii_uppercase());
        let indices = self
            .alleles
            .iter()
            .map(|allele| {
                if allele.is_uncalled() {
                    return Ok(EMPTY_ALLELE.to_string());
                }
                if *allele == reference {
                    return Ok("0".to_string());
                }
                alternates
                    .iter()
                    .position(|alt| alt == allele)
                    .map(|i| (i + 1).to_string())
                    .ok_or_else(|| {
                        VcfError::schema(format!(
                            "sample {} carries allele {allele} which is neither the reference nor an alternate",
                            self.sample
                        ))
                    })
            })
            .collect::<VcfResult<Vec<_>>>()?;
        Ok(indices.join(&self.phase.separator().to_string()))
    }

    fn has_only_missing_fields(&self, version: VcfVersion) -> bool {
        self.fields
            .iter()
            .all(|(key, value)| value.is_empty() || value == version.missing_format_value(key))
    }

    pub fn sample(&self) -> &str {
        &self.sample
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn alleles(&self) -> &[GenotypeEncoding] {
        &self.alleles
    }

    pub fn set_alleles(&mut self, phase: Phase, alleles: Vec<GenotypeEncoding>) {
        self.phase = phase;
        self.alleles = alleles;
    }

    pub fn ploidy(&self) -> usize {
        self.alleles.len()
    }

    pub fn fields(&self) -> &IndexMap<String, String> {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Set a FORMAT field. `GT` is derived from the alleles and cannot be set.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<String>) -> VcfResult<()> {
        let key = key.into();
        if key == GENOTYPE_KEY {
            return Err(VcfError::schema(format!(
                "{GENOTYPE_KEY} is derived from the alleles of sample {} and cannot be set",
                self.sample
            )));
        }
        let value = value.into();
        if key.is_empty() || key.contains(is_genotype_delimiter) {
            return Err(VcfError::schema(format!("invalid FORMAT key {key:?}")));
        }
        if value.contains(is_genotype_delimiter) {
            return Err(VcfError::schema(format!(
                "FORMAT {key} value {value:?} of sample {} contains a column or field separator",
                self.sample
            )));
        }
        self.fields.insert(key, value);
        Ok(())
    }

    pub fn is_phased(&self) -> bool {
        self.phase != Phase::Unphased
    }

    pub fn is_no_call(&self) -> bool {
        self.alleles.iter().all(GenotypeEncoding::is_uncalled)
    }

    pub fn is_called(&self) -> bool {
        !self.alleles.is_empty() && !self.alleles.iter().any(GenotypeEncoding::is_uncalled)
    }

    pub fn is_hom_ref(&self, reference: char) -> bool {
        let reference = GenotypeEncoding::SingleBase(reference.to_ascii_uppercase());
        self.is_called() && self.alleles.iter().all(|allele| *allele == reference)
    }

    pub fn is_het(&self) -> bool {
        self.is_called() && self.alleles.iter().any(|allele| *allele != self.alleles[0])
    }

    pub fn is_hom_var(&self, reference: char) -> bool {
        self.is_called() && !self.is_het() && !self.is_hom_ref(reference)
    }
}

fn is_genotype_delimiter(c: char) -> bool {
    c == GENOTYPE_FIELD_SEPARATOR || c == FIELD_SEPARATOR || c == '\n'
}

fn decode_gt(
    slice: &str,
    reference: char,
    alternates: &[GenotypeEncoding],
) -> VcfResult<(Phase, Vec<GenotypeEncoding>)> {
    if slice.is_empty() {
        return Err(VcfError::schema(format!("empty {GENOTYPE_KEY} value")));
    }

    let mut phase: Option<Phase> = None;
    for c in slice.chars() {
        if let Some(found) = Phase::from_separator(c) {
            match phase {
                Some(existing) if existing != found => {
                    return Err(VcfError::schema(format!(
                        "{GENOTYPE_KEY} value {slice} mixes phase separators"
                    )))
                }
                _ => phase = Some(found),
            }
        }
    }

    let groups: Vec<&str> = match phase {
        Some(phase) => slice.split(phase.separator()).collect(),
        None => vec![slice],
    };
    if groups[0].is_empty() {
        return Err(VcfError::schema(format!(
            "{GENOTYPE_KEY} value {slice} does not start with an allele"
        )));
    }

    let alleles = groups
        .into_iter()
        .filter(|group| !group.is_empty())
        .map(|group| decode_allele_index(group, reference, alternates))
        .collect::<VcfResult<Vec<_>>>()?;
    Ok((phase.unwrap_or(Phase::Unphased), alleles))
}

fn decode_allele_index(
    group: &str,
    reference: char,
    alternates: &[GenotypeEncoding],
) -> VcfResult<GenotypeEncoding> {
    if group == EMPTY_ALLELE {
        return Ok(GenotypeEncoding::Uncalled);
    }
    let index = group
        .parse::<usize>()
        .map_err(|_| VcfError::schema(format!("invalid allele index {group}")))?;
    match index {
        0 => GenotypeEncoding::single_base(reference),
        i if i <= alternates.len() => Ok(alternates[i - 1].clone()),
        i => Err(VcfError::schema(format!(
            "allele index {i} is out of range, the record has {} alternates",
            alternates.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn alts(tokens: &[&str]) -> Vec<GenotypeEncoding> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    #[test]
    fn test_decode_gt_and_fields() {
        let record = GenotypeRecord::decode(
            "s1",
            &["GT", "GQ"],
            "0/1:40",
            'A',
            &alts(&["G"]),
            VcfVersion::V4_0,
        )
        .unwrap();
        assert_eq!(
            record.alleles(),
            &[
                GenotypeEncoding::SingleBase('A'),
                GenotypeEncoding::SingleBase('G')
            ]
        );
        assert_eq!(record.phase(), Phase::Unphased);
        assert_eq!(record.field("GQ"), Some("40"));
        assert_eq!(record.fields().len(), 1);
        assert!(record.is_het());
    }

    #[test]
    fn test_decode_phases() {
        for (value, phase) in [
            ("1|0", Phase::Phased),
            ("1\\0", Phase::PhasedSwitchProb),
            ("1/0", Phase::Unphased),
        ] {
            let record =
                GenotypeRecord::decode("s1", &["GT"], value, 'A', &alts(&["C"]), VcfVersion::V4_0)
                    .unwrap();
            assert_eq!(record.phase(), phase);
        }
    }

    #[test]
    fn test_mixed_separators_are_rejected() {
        let err = GenotypeRecord::decode(
            "s1",
            &["GT"],
            "0/1|1",
            'A',
            &alts(&["C"]),
            VcfVersion::V4_0,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_haploid_and_triploid_calls() {
        let haploid =
            GenotypeRecord::decode("s1", &["GT"], "1", 'A', &alts(&["C"]), VcfVersion::V4_0)
                .unwrap();
        assert_eq!(haploid.ploidy(), 1);
        let triploid =
            GenotypeRecord::decode("s1", &["GT"], "0/1/1", 'A', &alts(&["C"]), VcfVersion::V4_0)
                .unwrap();
        assert_eq!(triploid.ploidy(), 3);
    }

    #[test]
    fn test_out_of_range_index() {
        let err = GenotypeRecord::decode(
            "s1",
            &["GT"],
            "0/2",
            'A',
            &alts(&["C"]),
            VcfVersion::V4_0,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_field_count_mismatch() {
        let fewer = GenotypeRecord::decode(
            "s1",
            &["GT", "GQ", "DP"],
            "0/1:40",
            'A',
            &alts(&["C"]),
            VcfVersion::V4_0,
        )
        .unwrap_err();
        assert_eq!(fewer.kind(), ErrorKind::Structural);

        let more = GenotypeRecord::decode(
            "s1",
            &["GT", "GQ"],
            "0/1:40:12",
            'A',
            &alts(&["C"]),
            VcfVersion::V4_0,
        )
        .unwrap_err();
        assert_eq!(more.kind(), ErrorKind::Structural);
    }

    #[test]
    fn test_blank_fields_get_version_defaults() {
        let v3 = GenotypeRecord::decode(
            "s1",
            &["GT", "GQ", "GL"],
            "0/0::",
            'A',
            &[],
            VcfVersion::V3_3,
        )
        .unwrap();
        assert_eq!(v3.field("GQ"), Some("-1"));
        assert_eq!(v3.field("GL"), Some("0,0,0"));

        let v4 = GenotypeRecord::decode(
            "s1",
            &["GT", "GQ", "GL"],
            "0/0::",
            'A',
            &[],
            VcfVersion::V4_0,
        )
        .unwrap();
        assert_eq!(v4.field("GQ"), Some("."));
        assert_eq!(v4.field("GL"), Some(".,.,."));
    }

    #[test]
    fn test_collapsed_no_call() {
        let record = GenotypeRecord::decode(
            "s1",
            &["GT", "GQ", "DP"],
            "./.",
            'A',
            &alts(&["C"]),
            VcfVersion::V4_0,
        )
        .unwrap();
        assert!(record.is_no_call());
        assert_eq!(record.ploidy(), 2);
        assert_eq!(record.field("DP"), Some("."));
    }

    #[test]
    fn test_encode_uses_record_alternates() {
        let mut record = GenotypeRecord::new(
            "s1",
            Phase::Phased,
            vec![
                GenotypeEncoding::SingleBase('T'),
                GenotypeEncoding::Deletion(2),
            ],
        );
        record.set_field("GQ", "35").unwrap();
        let encoded = record
            .encode(
                &["GT", "GQ", "DP"],
                'A',
                &alts(&["D2", "T"]),
                VcfVersion::V4_0,
            )
            .unwrap();
        assert_eq!(encoded, "2|1:35:.");
    }

    #[test]
    fn test_encode_no_call_per_version() {
        let record = GenotypeRecord::no_call("s1", 2);
        assert_eq!(
            record
                .encode(&["GT", "GQ"], 'A', &[], VcfVersion::V4_0)
                .unwrap(),
            "./."
        );
        assert_eq!(
            record
                .encode(&["GT", "GQ"], 'A', &[], VcfVersion::V3_3)
                .unwrap(),
            "./.:-1"
        );
    }

    #[test]
    fn test_encode_unknown_allele() {
        let record = GenotypeRecord::new(
            "s1",
            Phase::Unphased,
            vec![GenotypeEncoding::SingleBase('G')],
        );
        let err = record
            .encode(&["GT"], 'A', &alts(&["C"]), VcfVersion::V4_0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_gt_cannot_be_set() {
        let mut record = GenotypeRecord::no_call("s1", 2);
        assert!(record.set_field("GT", "0/1").is_err());
        assert!(record.set_field("DP", "12").is_ok());
    }

    #[test]
    fn test_set_field_rejects_separators() {
        let mut record = GenotypeRecord::no_call("s1", 2);
        for value in ["1:2", "1\t2", "1\n"] {
            let err = record.set_field("XX", value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Schema, "{value:?}");
        }
        assert!(record.set_field("", "1").is_err());
        assert!(record.set_field("A:B", "1").is_err());
        assert_eq!(record.field("XX"), None);
    }

    #[test]
    fn test_no_calls_keep_their_ploidy() {
        for (ploidy, token) in [(1, "."), (2, "./."), (3, "././.")] {
            let record = GenotypeRecord::no_call("s1", ploidy);
            let encoded = record
                .encode(&["GT", "GQ"], 'A', &alts(&["C"]), VcfVersion::V4_0)
                .unwrap();
            assert_eq!(encoded, token);
            let decoded = GenotypeRecord::decode(
                "s1",
                &["GT", "GQ"],
                &encoded,
                'A',
                &alts(&["C"]),
                VcfVersion::V4_0,
            )
            .unwrap();
            assert_eq!(decoded.ploidy(), ploidy);
            assert!(decoded.is_no_call());
            assert_eq!(decoded.field("GQ"), Some("."));
            assert_eq!(
                decoded
                    .encode(&["GT", "GQ"], 'A', &alts(&["C"]), VcfVersion::V4_0)
                    .unwrap(),
                token
            );
        }
    }

    #[test]
    fn test_phased_no_call_keeps_its_separator() {
        let record = GenotypeRecord::new(
            "s1",
            Phase::Phased,
            vec![GenotypeEncoding::Uncalled, GenotypeEncoding::Uncalled],
        );
        let encoded = record
            .encode(&["GT", "DP"], 'A', &[], VcfVersion::V4_0)
            .unwrap();
        assert_eq!(encoded, ".|.");
        let decoded =
            GenotypeRecord::decode("s1", &["GT", "DP"], &encoded, 'A', &[], VcfVersion::V4_0)
                .unwrap();
        assert_eq!(decoded, {
            let mut expected = record.clone();
            expected.set_field("DP", ".").unwrap();
            expected
        });
    }

    #[test]
    fn test_called_value_without_fields_is_still_a_count_mismatch() {
        let err = GenotypeRecord::decode(
            "s1",
            &["GT", "GQ"],
            "0/1",
            'A',
            &alts(&["C"]),
            VcfVersion::V4_0,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
    }

    #[test]
    fn test_zygosity_predicates() {
        let hom_ref = GenotypeRecord::new(
            "s1",
            Phase::Unphased,
            vec![
                GenotypeEncoding::SingleBase('A'),
                GenotypeEncoding::SingleBase('A'),
            ],
        );
        assert!(hom_ref.is_hom_ref('a'));
        assert!(!hom_ref.is_hom_var('A'));
        let hom_var = GenotypeRecord::new(
            "s1",
            Phase::Unphased,
            vec![
                GenotypeEncoding::SingleBase('C'),
                GenotypeEncoding::SingleBase('C'),
            ],
        );
        assert!(hom_var.is_hom_var('A'));
        assert!(!hom_var.is_het());
        assert!(!GenotypeRecord::no_call("s1", 2).is_called());
    }
}
