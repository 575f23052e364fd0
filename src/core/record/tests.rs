use super::*;
use crate::{core::genotype::Phase, error::ErrorKind, utils::util::init_logger};
use approx::assert_relative_eq;

const SAMPLE_HEADER: [&str; 7] = [
    "##fileformat=VCFv4.0",
    "##INFO=<ID=AC,Number=.,Type=Integer,Description=\"Allele count\">",
    "##INFO=<ID=DB,Number=0,Type=Flag,Description=\"dbSNP membership\">",
    "##FILTER=<ID=q10,Description=\"Quality below 10\">",
    "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">",
    "##FORMAT=<ID=GQ,Number=1,Type=Integer,Description=\"Genotype quality\">",
    "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsample1\tsample2",
];

fn sample_header() -> Header {
    Header::from_lines(SAMPLE_HEADER).unwrap()
}

fn sites_header(version_line: &str) -> Header {
    Header::from_lines([version_line, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO"]).unwrap()
}

#[test]
fn test_decode_sites_only_line() {
    init_logger();
    let header = Header::from_lines([
        "##fileformat=VCFv4.0",
        "##INFO=<ID=AC,Number=.,Type=Integer,Description=\"AC\">",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
    ])
    .unwrap();
    let record = VariantRecord::decode("1\t100\t.\tA\tG\t30.00\tPASS\tAC=2", &header, false).unwrap();
    assert_eq!(record.contig(), "1");
    assert_eq!(record.position(), 100);
    assert_eq!(record.reference(), 'A');
    assert_eq!(record.alternates(), &[GenotypeEncoding::SingleBase('G')]);
    assert_relative_eq!(record.quality(), 30.0);
    assert_eq!(record.filter_codes(), vec!["PASS"]);
    assert_eq!(record.info().len(), 1);
    assert_eq!(record.info()["AC"], "2");
    assert!(!record.is_filtered());
    assert!(record.is_snp());
}

#[test]
fn test_decode_with_genotypes() {
    let header = sample_header();
    let record = VariantRecord::decode(
        "20\t100\trs1\tA\tG\t50.00\tPASS\tAC=2;DB\tGT:GQ\t0/1:40\t1/1:35",
        &header,
        false,
    )
    .unwrap();
    assert_eq!(record.sample_names(), vec!["sample1", "sample2"]);
    let first = record.genotype("sample1").unwrap();
    assert_eq!(
        first.alleles(),
        &[
            GenotypeEncoding::SingleBase('A'),
            GenotypeEncoding::SingleBase('G')
        ]
    );
    assert_eq!(first.phase(), Phase::Unphased);
    assert_eq!(first.field("GQ"), Some("40"));
    assert!(record.genotype("sample2").unwrap().is_hom_var('A'));
    assert!(record.is_in_dbsnp());

    let call = record.sample_call("sample2").unwrap();
    assert_eq!(call.locus.to_string(), "20:100");
    assert_eq!(call.genotype.field("GQ"), Some("35"));
}

#[test]
fn test_skip_genotypes() {
    let header = sample_header();
    let record = VariantRecord::decode(
        "20\t100\t.\tA\tG\t50.00\tPASS\t.\tGT:GQ\t0/1:40\tnot-a-genotype",
        &header,
        true,
    )
    .unwrap();
    assert!(record.genotypes().is_empty());
    assert_eq!(record.format_keys(), vec!["GT", "GQ"]);
}

#[test]
fn test_column_count_mismatch() {
    let header = sample_header();
    let err = VariantRecord::decode("20\t100\t.\tA\tG\t50.00\tPASS\t.\tGT\t0/1", &header, false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    let message = err.to_string();
    assert!(message.contains("expected 11 columns, found 10"), "{message}");
}

#[test]
fn test_genotype_field_count_mismatch() {
    let header = sample_header();
    let err = VariantRecord::decode(
        "20\t100\t.\tA\tG\t50.00\tPASS\t.\tGT:GQ\t0/1:40:7\t1/1:35",
        &header,
        false,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn test_reference_must_be_one_base() {
    let header = sites_header("##fileformat=VCFv4.0");
    let err = VariantRecord::decode("1\t100\t.\tAC\tG\t30.00\tPASS\t.", &header, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn test_alternates_are_deduplicated_and_typed() {
    let header = sites_header("##fileformat=VCFv4.0");
    let record =
        VariantRecord::decode("1\t100\t.\tA\tD2,IAC,D2\t.\t.\t.", &header, false).unwrap();
    assert_eq!(
        record.alternates(),
        &[
            GenotypeEncoding::Deletion(2),
            GenotypeEncoding::Insertion("AC".to_string())
        ]
    );
    assert_eq!(record.variant_type(), Some(AlleleType::Mixed));
    assert!(record.is_indel());
    assert!(record.is_missing_quality());
    assert_eq!(record.filter_codes(), vec!["."]);
}

#[test]
fn test_empty_alternates() {
    let header = sites_header("##fileformat=VCFv4.0");
    let line = "1\t100\t.\tA\t.\t10.00\tPASS\t.";
    let record = VariantRecord::decode(line, &header, false).unwrap();
    assert!(record.is_reference());
    assert_eq!(record.variant_type(), None);
    assert_eq!(record.encode(&header).unwrap(), line);
}

#[test]
fn test_v4_rejects_v3_pass_marker() {
    let v4 = sites_header("##fileformat=VCFv4.0");
    let err = VariantRecord::decode("1\t100\t.\tA\tG\t30.00\t0\t.", &v4, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);

    let v3 = sites_header("##fileformat=VCFv3.3");
    let record = VariantRecord::decode("1\t100\t.\tA\tG\t30.00\t0\t.", &v3, false).unwrap();
    assert!(!record.is_filtered());
    assert_eq!(record.encode(&v4).unwrap(), "1\t100\t.\tA\tG\t30.00\tPASS\t.");
}

#[test]
fn test_info_errors() {
    let header = sites_header("##fileformat=VCFv4.0");
    for info in ["AC=1;;DB", "AC=1;AC=2", "=3"] {
        let line = format!("1\t100\t.\tA\tG\t30.00\tPASS\t{info}");
        let err = VariantRecord::decode(&line, &header, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema, "{info}");
    }
}

#[test]
fn test_info_flag_round_trip() {
    let header = sample_header();
    let line = "20\t100\t.\tA\tG\t50.00\tq10\tDB;AC=1\tGT:GQ\t0/1:40\t0/0:35";
    let record = VariantRecord::decode(line, &header, false).unwrap();
    assert_eq!(record.info_value(&header, "DB").unwrap(), Some(InfoValue::Flag));
    assert_eq!(
        record.info_value(&header, "AC").unwrap(),
        Some(InfoValue::Integer(vec![Some(1)]))
    );
    assert_eq!(record.info_value(&header, "XX").unwrap(), None);
    assert!(record.is_filtered());
    assert_eq!(record.encode(&header).unwrap(), line);
}

#[test]
fn test_round_trip_v4() {
    let header = sample_header();
    let line = "20\t100\trs7\tA\tG,T\t50.12\tPASS\tAC=1,1;DB\tGT:GQ\t1|2:40\t0/0:35";
    let record = VariantRecord::decode(line, &header, false).unwrap();
    let encoded = record.encode(&header).unwrap();
    assert_eq!(encoded, line);
    assert_eq!(VariantRecord::decode(&encoded, &header, false).unwrap(), record);
}

#[test]
fn test_round_trip_v3() {
    let header = Header::from_lines([
        "##fileformat=VCFv3.3",
        "##INFO=AC,-1,Integer,\"Allele count\"",
        "##FORMAT=GT,1,String,\"Genotype\"",
        "##FORMAT=GQ,1,Integer,\"Genotype quality\"",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA1",
    ])
    .unwrap();
    let line = "1\t5\t.\tC\tT\t-1\t0\t.\tGT:GQ\t./.:-1";
    let record = VariantRecord::decode(line, &header, false).unwrap();
    assert!(record.is_missing_quality());
    assert!(record.genotype("NA1").unwrap().is_no_call());
    assert_eq!(record.encode(&header).unwrap(), line);
}

#[test]
fn test_collapsed_no_call_round_trip() {
    let header = sample_header();
    let line = "20\t100\t.\tA\tG\t50.00\tPASS\t.\tGT:GQ\t./.\t0/1:12";
    let record = VariantRecord::decode(line, &header, false).unwrap();
    assert_eq!(record.genotype("sample1").unwrap().field("GQ"), Some("."));
    assert_eq!(record.encode(&header).unwrap(), line);
}

#[test]
fn test_encode_requires_matching_samples() {
    let header = sample_header();
    let mut record =
        VariantRecord::new("20", 100, 'A', vec![GenotypeEncoding::SingleBase('G')]).unwrap();
    record
        .add_genotype(GenotypeRecord::new(
            "sample1",
            Phase::Unphased,
            vec![
                GenotypeEncoding::SingleBase('A'),
                GenotypeEncoding::SingleBase('G'),
            ],
        ))
        .unwrap();

    let missing = record.encode(&header).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::Structural);
    assert!(missing.to_string().contains("sample2"));

    assert_eq!(record.fill_missing_genotypes(&header), 1);
    assert_eq!(
        record.encode(&header).unwrap(),
        "20\t100\t.\tA\tG\t.\t.\t.\tGT\t0/1\t./."
    );

    record
        .add_genotype(GenotypeRecord::no_call("sample3", 2))
        .unwrap();
    let extra = record.encode(&header).unwrap_err();
    assert_eq!(extra.kind(), ErrorKind::Structural);
    assert!(extra.to_string().contains("sample3"));
}

#[test]
fn test_genotype_mutation() {
    let mut record =
        VariantRecord::new("20", 100, 'A', vec![GenotypeEncoding::SingleBase('G')]).unwrap();
    record
        .add_genotype(GenotypeRecord::no_call("sample1", 2))
        .unwrap();
    assert!(record
        .add_genotype(GenotypeRecord::no_call("sample1", 2))
        .is_err());

    let mut called = GenotypeRecord::new(
        "sample1",
        Phase::Phased,
        vec![
            GenotypeEncoding::SingleBase('G'),
            GenotypeEncoding::SingleBase('A'),
        ],
    );
    called.set_field("GQ", "60").unwrap();
    let replaced = record.replace_genotype(called).unwrap();
    assert!(replaced.is_no_call());
    assert_eq!(record.format_keys(), vec!["GT", "GQ"]);
    assert!(record.genotype("sample1").unwrap().is_phased());
}

#[test]
fn test_decode_loc() {
    let locus = VariantRecord::decode_loc("chr2\t12345\t.\tA\tG\t.\t.\t.").unwrap();
    assert_eq!(
        locus,
        Locus {
            contig: "chr2".to_string(),
            position: 12345
        }
    );
    assert_eq!(
        VariantRecord::decode_loc("chr2").unwrap_err().kind(),
        ErrorKind::Structural
    );
    assert_eq!(
        VariantRecord::decode_loc("chr2\tx").unwrap_err().kind(),
        ErrorKind::Schema
    );
}

#[test]
fn test_allele_frequency_and_quality_helpers() {
    let mut record =
        VariantRecord::new("1", 1, 'c', vec![GenotypeEncoding::SingleBase('T')]).unwrap();
    assert_eq!(record.reference(), 'C');
    assert_relative_eq!(record.non_ref_allele_frequency(), 0.0);
    record.set_info("AC", "1").unwrap();
    record.set_info("AN", "4").unwrap();
    assert_relative_eq!(record.non_ref_allele_frequency(), 0.25);
    record.set_info("AF", "0.3").unwrap();
    assert_relative_eq!(record.non_ref_allele_frequency(), 0.3);
    record.set_quality(45.0);
    assert_relative_eq!(record.neg_log10_p_error(), 4.5);
    assert!(record.set_info("", "1").is_err());
    assert_eq!(
        record.allele_list().unwrap(),
        vec![
            GenotypeEncoding::SingleBase('C'),
            GenotypeEncoding::SingleBase('T')
        ]
    );
}

#[test]
fn test_replaced_genotype_fields_are_encoded() {
    let header = sample_header();
    let line = "20\t100\t.\tA\tG\t50.00\tPASS\t.\tGT:GQ\t0/1:40\t1/1:35";
    let mut record = VariantRecord::decode(line, &header, false).unwrap();

    let mut rewritten = record.genotype("sample1").unwrap().clone();
    rewritten.set_field("DP", "17").unwrap();
    record.replace_genotype(rewritten);

    assert_eq!(record.format_keys(), vec!["GT", "GQ", "DP"]);
    let encoded = record.encode(&header).unwrap();
    assert_eq!(
        encoded,
        "20\t100\t.\tA\tG\t50.00\tPASS\t.\tGT:GQ:DP\t0/1:40:17\t1/1:35:."
    );
    let reread = VariantRecord::decode(&encoded, &header, false).unwrap();
    assert_eq!(reread.genotype("sample1").unwrap().field("DP"), Some("17"));
}

#[test]
fn test_invalid_qualities_are_rejected() {
    let header = sites_header("##fileformat=VCFv4.0");
    for quality in ["-5", "nan", "inf", "-inf", "q30"] {
        let line = format!("1\t100\t.\tA\tG\t{quality}\tPASS\t.");
        let err = VariantRecord::decode(&line, &header, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema, "{quality}");
    }
    for quality in ["0", "-1", "."] {
        let line = format!("1\t100\t.\tA\tG\t{quality}\tPASS\t.");
        assert!(VariantRecord::decode(&line, &header, false).is_ok(), "{quality}");
    }
}

#[test]
fn test_set_info_rejects_separators_in_values() {
    let mut record =
        VariantRecord::new("1", 1, 'A', vec![GenotypeEncoding::SingleBase('T')]).unwrap();
    for value in ["1;DB", "1\t2", "1\n"] {
        let err = record.set_info("XX", value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema, "{value:?}");
    }
    assert!(record.info().is_empty());
    record.set_info("XX", "a=b,c").unwrap();
    let header = sites_header("##fileformat=VCFv4.0");
    let reread = VariantRecord::decode(&record.encode(&header).unwrap(), &header, false).unwrap();
    assert_eq!(reread.info()["XX"], "a=b,c");
}

#[test]
fn test_haploid_no_call_round_trip() {
    let header = Header::from_lines([
        "##fileformat=VCFv4.0",
        "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">",
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1",
    ])
    .unwrap();
    let mut record =
        VariantRecord::new("1", 10, 'A', vec![GenotypeEncoding::SingleBase('G')]).unwrap();
    record
        .add_genotype(GenotypeRecord::no_call("S1", 1))
        .unwrap();

    let line = record.encode(&header).unwrap();
    assert_eq!(line, "1\t10\t.\tA\tG\t.\t.\t.\tGT\t.");
    let reread = VariantRecord::decode(&line, &header, false).unwrap();
    assert_eq!(reread.genotype("S1").unwrap().ploidy(), 1);
    assert_eq!(reread.encode(&header).unwrap(), line);
}
