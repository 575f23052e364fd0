use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const DEFAULT_THREADS: usize = 1;
pub const DEFAULT_BATCH_SIZE: usize = 4096;
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;
pub const DEFAULT_CATCH_ALL: bool = false;
pub const DEFAULT_SKIP_GENOTYPES: bool = false;

pub const METADATA_INDICATOR: &str = "##";
pub const HEADER_INDICATOR: &str = "#";

pub const FIELD_SEPARATOR: char = '\t';
pub const INFO_FIELD_SEPARATOR: char = ';';
pub const FILTER_CODE_SEPARATOR: char = ';';
pub const GENOTYPE_FIELD_SEPARATOR: char = ':';
pub const ALLELE_SEPARATOR: char = ',';

pub const GENOTYPE_KEY: &str = "GT";
pub const GENOTYPE_QUALITY_KEY: &str = "GQ";
pub const DEPTH_KEY: &str = "DP";
pub const GENOTYPE_FILTER_KEY: &str = "FT";
pub const GENOTYPE_LIKELIHOODS_KEY: &str = "GL";

pub const DBSNP_KEY: &str = "DB";
pub const ALLELE_COUNT_KEY: &str = "AC";
pub const ALLELE_FREQUENCY_KEY: &str = "AF";
pub const ALLELE_NUMBER_KEY: &str = "AN";

pub const EMPTY_ID_FIELD: &str = ".";
pub const EMPTY_INFO_FIELD: &str = ".";
pub const EMPTY_ALTERNATE_ALLELE_FIELD: &str = ".";
pub const EMPTY_ALLELE: &str = ".";
pub const UNFILTERED: &str = ".";
pub const PASSES_FILTERS_V3: &str = "0";
pub const PASSES_FILTERS_V4: &str = "PASS";
pub const MISSING_VALUE_V4: &str = ".";
pub const MISSING_VALUE_V3: &str = "-1";

/// Internal value for a missing QUAL column.
pub const MISSING_QUALITY: f64 = -1.0;

/// Internal value for a header field cardinality that is variable or unknown.
pub const UNBOUNDED: i32 = -1;
pub const UNBOUNDED_V3: &str = "-1";
pub const UNBOUNDED_V4: &str = ".";

/// Values substituted for blank FORMAT fields in VCF 3.x files. Keys not listed map to "".
pub static MISSING_FORMAT_VALUES_V3: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (GENOTYPE_QUALITY_KEY, MISSING_VALUE_V3),
        (DEPTH_KEY, MISSING_VALUE_V3),
        (GENOTYPE_FILTER_KEY, UNFILTERED),
        (GENOTYPE_LIKELIHOODS_KEY, "0,0,0"),
    ])
});

/// Values substituted for blank FORMAT fields in VCF 4.0 files. Keys not listed map to ".".
pub static MISSING_FORMAT_VALUES_V4: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (GENOTYPE_QUALITY_KEY, MISSING_VALUE_V4),
        (DEPTH_KEY, MISSING_VALUE_V4),
        (GENOTYPE_FILTER_KEY, UNFILTERED),
        (GENOTYPE_LIKELIHOODS_KEY, ".,.,."),
    ])
});
