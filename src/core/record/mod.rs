pub mod info;

#[cfg(test)]
mod tests;

pub use info::InfoValue;

use crate::{
    constants::{
        ALLELE_COUNT_KEY, ALLELE_FREQUENCY_KEY, ALLELE_NUMBER_KEY, ALLELE_SEPARATOR, DBSNP_KEY,
        EMPTY_ALTERNATE_ALLELE_FIELD, EMPTY_ID_FIELD, EMPTY_INFO_FIELD, FIELD_SEPARATOR,
        FILTER_CODE_SEPARATOR, GENOTYPE_FIELD_SEPARATOR, GENOTYPE_KEY, INFO_FIELD_SEPARATOR,
        MISSING_QUALITY, MISSING_VALUE_V3, MISSING_VALUE_V4, PASSES_FILTERS_V3, PASSES_FILTERS_V4,
        UNFILTERED,
    },
    core::{
        allele::{AlleleType, GenotypeEncoding},
        genotype::GenotypeRecord,
        header::{Header, MANDATORY_COLUMN_COUNT},
        version::VcfVersion,
    },
    error::{VcfError, VcfResult},
};
use indexmap::IndexMap;
use std::fmt;

/// A genomic site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locus {
    pub contig: String,
    /// 1-based.
    pub position: u64,
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.contig, self.position)
    }
}

/// A genotype together with the site it was called at.
#[derive(Debug, Clone, Copy)]
pub struct SampleCall<'a> {
    pub locus: &'a Locus,
    pub genotype: &'a GenotypeRecord,
}

/// One decoded data line.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    locus: Locus,
    id: String,
    reference: char,
    alternates: Vec<GenotypeEncoding>,
    quality: f64,
    filter: String,
    info: IndexMap<String, String>,
    format_keys: Vec<String>,
    genotypes: Vec<GenotypeRecord>,
}

impl VariantRecord {
    /// A record with no ID, missing quality, no filter and no INFO. Duplicate
    /// alternates are dropped, keeping the first occurrence.
    pub fn new(
        contig: impl Into<String>,
        position: u64,
        reference: char,
        alternates: Vec<GenotypeEncoding>,
    ) -> VcfResult<Self> {
        if !reference.is_ascii_alphabetic() {
            return Err(VcfError::schema(format!("invalid reference base {reference}")));
        }
        let mut unique = Vec::with_capacity(alternates.len());
        for alt in alternates {
            if alt.is_uncalled() {
                return Err(VcfError::schema("an alternate allele cannot be uncalled"));
            }
            if !unique.contains(&alt) {
                unique.push(alt);
            }
        }
        Ok(Self {
            locus: Locus {
                contig: contig.into(),
                position,
            },
            id: EMPTY_ID_FIELD.to_string(),
            reference: reference.to_ascii_uppercase(),
            alternates: unique,
            quality: MISSING_QUALITY,
            filter: UNFILTERED.to_string(),
            info: IndexMap::new(),
            format_keys: Vec::new(),
            genotypes: Vec::new(),
        })
    }

    /// Decode one tab-delimited data line against `header`.
    ///
    /// With `skip_genotypes` the FORMAT and sample columns are counted but not parsed.
    pub fn decode(line: &str, header: &Header, skip_genotypes: bool) -> VcfResult<Self> {
        let tokens: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if tokens.len() != header.column_count() {
            return Err(VcfError::structural(format!(
                "expected {} columns, found {} in line {line:?}",
                header.column_count(),
                tokens.len()
            )));
        }
        let version = header.version();

        let position = decode_position(tokens[1])?;
        let reference = decode_reference(tokens[3])?;
        let alternates = decode_alternates(tokens[4])?;
        let mut record = Self::new(tokens[0], position, reference, alternates)?;
        record.id = tokens[2].to_string();
        record.quality = decode_quality(tokens[5])?;
        record.filter = decode_filter(tokens[6], version)?;
        record.info = decode_info(tokens[7])?;

        if header.has_genotyping_data() {
            record.format_keys = tokens[MANDATORY_COLUMN_COUNT]
                .split(GENOTYPE_FIELD_SEPARATOR)
                .map(str::to_string)
                .collect();
            if !skip_genotypes {
                let keys: Vec<&str> = record.format_keys.iter().map(String::as_str).collect();
                let values = &tokens[MANDATORY_COLUMN_COUNT + 1..];
                let mut genotypes = Vec::with_capacity(values.len());
                for (sample, value) in header.samples().iter().zip(values) {
                    genotypes.push(GenotypeRecord::decode(
                        sample,
                        &keys,
                        value,
                        record.reference,
                        &record.alternates,
                        version,
                    )?);
                }
                record.genotypes = genotypes;
            }
        }
        log::trace!("Decoded record at {}", record.locus);
        Ok(record)
    }

    /// Read only CHROM and POS from a data line.
    pub fn decode_loc(line: &str) -> VcfResult<Locus> {
        let mut tokens = line.splitn(3, FIELD_SEPARATOR);
        match (tokens.next(), tokens.next()) {
            (Some(contig), Some(position)) if !contig.is_empty() => Ok(Locus {
                contig: contig.to_string(),
                position: decode_position(position)?,
            }),
            _ => Err(VcfError::structural(format!(
                "expected at least 2 columns in line {line:?}"
            ))),
        }
    }

    /// Render this record as a data line for `header`.
    ///
    /// When the header has samples the record must carry exactly one genotype for
    /// each of them, see [`VariantRecord::fill_missing_genotypes`].
    pub fn encode(&self, header: &Header) -> VcfResult<String> {
        let version = header.version();
        let mut columns: Vec<String> = Vec::with_capacity(header.column_count());
        columns.push(self.locus.contig.clone());
        columns.push(self.locus.position.to_string());
        columns.push(if self.id.is_empty() {
            EMPTY_ID_FIELD.to_string()
        } else {
            self.id.clone()
        });
        columns.push(self.reference.to_string());
        columns.push(self.encode_alternates());
        columns.push(self.encode_quality(version));
        columns.push(self.encode_filter(version));
        columns.push(self.encode_info());

        if header.has_genotyping_data() {
            self.check_samples(header)?;
            let keys = self.format_keys();
            let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            columns.push(keys.join(&GENOTYPE_FIELD_SEPARATOR.to_string()));
            for sample in header.samples() {
                let genotype = self.genotype(sample).ok_or_else(|| {
                    VcfError::structural(format!("record has no genotype for sample {sample}"))
                })?;
                columns.push(genotype.encode(
                    &key_refs,
                    self.reference,
                    &self.alternates,
                    version,
                )?);
            }
        } else if !self.genotypes.is_empty() {
            return Err(VcfError::structural(format!(
                "record at {} carries {} genotypes but the header has no samples",
                self.locus,
                self.genotypes.len()
            )));
        }
        Ok(columns.join(&FIELD_SEPARATOR.to_string()))
    }

    fn check_samples(&self, header: &Header) -> VcfResult<()> {
        let samples = header.samples();
        if let Some(extra) = self
            .genotypes
            .iter()
            .find(|genotype| !samples.contains(genotype.sample()))
        {
            return Err(VcfError::structural(format!(
                "record at {} has sample {} which is not in the header",
                self.locus,
                extra.sample()
            )));
        }
        let missing: Vec<&str> = samples
            .iter()
            .filter(|sample| self.genotype(sample).is_none())
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(VcfError::structural(format!(
                "record at {} is missing header samples: {}",
                self.locus,
                missing.join(", ")
            )));
        }
        Ok(())
    }

    fn encode_alternates(&self) -> String {
        if self.alternates.is_empty() {
            return EMPTY_ALTERNATE_ALLELE_FIELD.to_string();
        }
        self.alternates
            .iter()
            .map(GenotypeEncoding::to_string)
            .collect::<Vec<_>>()
            .join(&ALLELE_SEPARATOR.to_string())
    }

    fn encode_quality(&self, version: VcfVersion) -> String {
        if self.is_missing_quality() {
            version.missing_quality().to_string()
        } else {
            format!("{:.2}", self.quality)
        }
    }

    fn encode_filter(&self, version: VcfVersion) -> String {
        if self.filter == PASSES_FILTERS_V3 || self.filter == PASSES_FILTERS_V4 {
            version.passes_filters().to_string()
        } else if self.filter.is_empty() {
            UNFILTERED.to_string()
        } else {
            self.filter_codes().join(&FILTER_CODE_SEPARATOR.to_string())
        }
    }

    fn encode_info(&self) -> String {
        if self.info.is_empty() {
            return EMPTY_INFO_FIELD.to_string();
        }
        self.info
            .iter()
            .map(|(key, value)| {
                if value.is_empty() {
                    key.clone()
                } else {
                    format!("{key}={value}")
                }
            })
            .collect::<Vec<_>>()
            .join(&INFO_FIELD_SEPARATOR.to_string())
    }

    pub fn locus(&self) -> &Locus {
        &self.locus
    }

    pub fn contig(&self) -> &str {
        &self.locus.contig
    }

    pub fn position(&self) -> u64 {
        self.locus.position
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn reference(&self) -> char {
        self.reference
    }

    pub fn alternates(&self) -> &[GenotypeEncoding] {
        &self.alternates
    }

    /// The reference allele followed by the alternates.
    pub fn allele_list(&self) -> VcfResult<Vec<GenotypeEncoding>> {
        let mut alleles = Vec::with_capacity(self.alternates.len() + 1);
        alleles.push(GenotypeEncoding::single_base(self.reference)?);
        alleles.extend(self.alternates.iter().cloned());
        Ok(alleles)
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn set_quality(&mut self, quality: f64) {
        self.quality = quality;
    }

    pub fn is_missing_quality(&self) -> bool {
        self.quality == MISSING_QUALITY
    }

    pub fn neg_log10_p_error(&self) -> f64 {
        self.quality / 10.0
    }

    /// The raw FILTER value.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn filter_codes(&self) -> Vec<&str> {
        if self.filter == UNFILTERED || self.filter.is_empty() {
            return vec![UNFILTERED];
        }
        self.filter.split(FILTER_CODE_SEPARATOR).collect()
    }

    pub fn is_filtered(&self) -> bool {
        let first = self.filter_codes()[0];
        first != UNFILTERED && first != PASSES_FILTERS_V3 && first != PASSES_FILTERS_V4
    }

    pub fn info(&self) -> &IndexMap<String, String> {
        &self.info
    }

    /// Set an INFO entry. An empty value makes the key a flag.
    pub fn set_info(&mut self, key: impl Into<String>, value: impl Into<String>) -> VcfResult<()> {
        let key = key.into();
        let value = value.into();
        if key.is_empty() || key.contains(is_info_delimiter) || key.contains('=') {
            return Err(VcfError::schema(format!("invalid INFO key {key:?}")));
        }
        if value.contains(is_info_delimiter) {
            return Err(VcfError::schema(format!(
                "INFO {key} value {value:?} contains a column or entry separator"
            )));
        }
        self.info.insert(key, value);
        Ok(())
    }

    pub fn info_value(&self, header: &Header, key: &str) -> VcfResult<Option<InfoValue>> {
        self.info
            .get(key)
            .map(|raw| InfoValue::decode(key, raw, header.info(key)))
            .transpose()
    }

    /// The FORMAT keys as read, or `GT` for a record built in memory, followed by
    /// any field key the attached genotypes carry beyond those, in first-seen order.
    pub fn format_keys(&self) -> Vec<String> {
        let mut keys = if self.format_keys.is_empty() {
            vec![GENOTYPE_KEY.to_string()]
        } else {
            self.format_keys.clone()
        };
        for genotype in &self.genotypes {
            for key in genotype.fields().keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    pub fn set_format_keys(&mut self, keys: Vec<String>) {
        self.format_keys = keys;
    }

    pub fn genotypes(&self) -> &[GenotypeRecord] {
        &self.genotypes
    }

    pub fn genotype(&self, sample: &str) -> Option<&GenotypeRecord> {
        self.genotypes.iter().find(|genotype| genotype.sample() == sample)
    }

    pub fn sample_names(&self) -> Vec<&str> {
        self.genotypes.iter().map(GenotypeRecord::sample).collect()
    }

    pub fn sample_call(&self, sample: &str) -> Option<SampleCall<'_>> {
        self.genotype(sample).map(|genotype| SampleCall {
            locus: &self.locus,
            genotype,
        })
    }

    pub fn add_genotype(&mut self, genotype: GenotypeRecord) -> VcfResult<()> {
        if self.genotype(genotype.sample()).is_some() {
            return Err(VcfError::structural(format!(
                "record at {} already has a genotype for sample {}",
                self.locus,
                genotype.sample()
            )));
        }
        self.genotypes.push(genotype);
        Ok(())
    }

    pub fn set_genotypes(&mut self, genotypes: Vec<GenotypeRecord>) -> VcfResult<()> {
        self.genotypes.clear();
        for genotype in genotypes {
            self.add_genotype(genotype)?;
        }
        Ok(())
    }

    /// Replace the genotype for the same sample, or add it. Returns the replaced one.
    pub fn replace_genotype(&mut self, genotype: GenotypeRecord) -> Option<GenotypeRecord> {
        match self
            .genotypes
            .iter_mut()
            .find(|existing| existing.sample() == genotype.sample())
        {
            Some(existing) => Some(std::mem::replace(existing, genotype)),
            None => {
                self.genotypes.push(genotype);
                None
            }
        }
    }

    /// Add a no-call for every header sample the record has no genotype for.
    /// Returns the number of genotypes added.
    pub fn fill_missing_genotypes(&mut self, header: &Header) -> usize {
        let ploidy = self.genotypes.first().map_or(2, GenotypeRecord::ploidy);
        let missing: Vec<String> = header
            .samples()
            .iter()
            .filter(|sample| self.genotype(sample).is_none())
            .cloned()
            .collect();
        for sample in &missing {
            self.genotypes.push(GenotypeRecord::no_call(sample.as_str(), ploidy));
        }
        missing.len()
    }

    pub fn variant_type(&self) -> Option<AlleleType> {
        let first = self.alternates.first()?.allele_type();
        if self
            .alternates
            .iter()
            .all(|alt| alt.allele_type() == first)
        {
            Some(first)
        } else {
            Some(AlleleType::Mixed)
        }
    }

    pub fn is_snp(&self) -> bool {
        self.variant_type() == Some(AlleleType::SingleBase)
    }

    pub fn is_insertion(&self) -> bool {
        self.variant_type() == Some(AlleleType::Insertion)
    }

    pub fn is_deletion(&self) -> bool {
        self.variant_type() == Some(AlleleType::Deletion)
    }

    pub fn is_indel(&self) -> bool {
        !self.alternates.is_empty()
            && self.alternates.iter().all(|alt| {
                matches!(
                    alt.allele_type(),
                    AlleleType::Insertion | AlleleType::Deletion
                )
            })
    }

    pub fn is_biallelic(&self) -> bool {
        self.alternates.len() == 1
    }

    pub fn has_alternate_allele(&self) -> bool {
        !self.alternates.is_empty()
    }

    pub fn is_reference(&self) -> bool {
        self.alternates.is_empty()
    }

    pub fn is_in_dbsnp(&self) -> bool {
        (!self.id.is_empty() && self.id != EMPTY_ID_FIELD)
            || matches!(self.info.get(DBSNP_KEY).map(String::as_str), Some("") | Some("1"))
    }

    /// `AF`, else `AC / AN`, else 0.
    pub fn non_ref_allele_frequency(&self) -> f64 {
        let first_number = |key: &str| {
            self.info
                .get(key)
                .and_then(|value| value.split(ALLELE_SEPARATOR).next())
                .and_then(|value| value.parse::<f64>().ok())
        };
        if let Some(frequency) = first_number(ALLELE_FREQUENCY_KEY) {
            return frequency;
        }
        match (first_number(ALLELE_COUNT_KEY), first_number(ALLELE_NUMBER_KEY)) {
            (Some(count), Some(number)) if number > 0.0 => count / number,
            _ => 0.0,
        }
    }
}

fn decode_position(token: &str) -> VcfResult<u64> {
    token
        .parse::<u64>()
        .map_err(|_| VcfError::schema(format!("invalid position {token}")))
}

fn decode_reference(token: &str) -> VcfResult<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(base), None) if base.is_ascii_alphabetic() => Ok(base.to_ascii_uppercase()),
        _ => Err(VcfError::schema(format!(
            "reference must be exactly one base, found {token:?}"
        ))),
    }
}

fn decode_alternates(token: &str) -> VcfResult<Vec<GenotypeEncoding>> {
    if token == EMPTY_ALTERNATE_ALLELE_FIELD {
        return Ok(Vec::new());
    }
    token
        .split(ALLELE_SEPARATOR)
        .map(str::parse::<GenotypeEncoding>)
        .collect()
}

fn is_info_delimiter(c: char) -> bool {
    c == INFO_FIELD_SEPARATOR || c == FIELD_SEPARATOR || c == '\n'
}

/// QUAL is a finite, non-negative number or one of the missing markers.
fn decode_quality(token: &str) -> VcfResult<f64> {
    if token == MISSING_VALUE_V4 || token == MISSING_VALUE_V3 {
        return Ok(MISSING_QUALITY);
    }
    match token.parse::<f64>() {
        Ok(quality) if quality.is_finite() && quality >= 0.0 => Ok(quality),
        Ok(quality) if quality == MISSING_QUALITY => Ok(MISSING_QUALITY),
        _ => Err(VcfError::schema(format!(
            "invalid quality {token}, expected a non-negative number or {MISSING_VALUE_V4}"
        ))),
    }
}

fn decode_filter(token: &str, version: VcfVersion) -> VcfResult<String> {
    if version.is_v4() && token == PASSES_FILTERS_V3 {
        return Err(VcfError::schema(format!(
            "filter value {PASSES_FILTERS_V3} is not allowed in {}, use {PASSES_FILTERS_V4}",
            version.version_string()
        )));
    }
    Ok(token.to_string())
}

fn decode_info(token: &str) -> VcfResult<IndexMap<String, String>> {
    let mut info = IndexMap::new();
    if token == EMPTY_INFO_FIELD {
        return Ok(info);
    }
    for entry in token.split(INFO_FIELD_SEPARATOR) {
        let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
        if key.is_empty() {
            return Err(VcfError::schema(format!("empty INFO entry in {token:?}")));
        }
        if info.insert(key.to_string(), value.to_string()).is_some() {
            return Err(VcfError::schema(format!("INFO key {key} appears twice")));
        }
    }
    Ok(info)
}
