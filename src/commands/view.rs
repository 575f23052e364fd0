use crate::{
    cli::ViewArgs,
    commands::validate::line_transform,
    io::{vcf_reader::VcfReader, vcf_writer::VcfWriter},
    utils::util::{format_number_with_commas, Result},
};

/// Re-encode a VCF through the codec, normalising its header and records.
pub fn view(args: ViewArgs) -> Result<()> {
    let skip_genotypes = args.skip_genotypes || args.drop_genotypes;
    let mut reader = VcfReader::from_path(
        &args.vcf,
        line_transform(args.space_delimited),
        skip_genotypes,
    )?;

    let header = if args.drop_genotypes {
        reader.header().without_samples()
    } else {
        reader.header().clone()
    };
    let mut writer = VcfWriter::new(header, &args.output_type, args.output.as_ref())?;
    if args.header_only {
        return writer.finish();
    }

    let fill_no_calls = args.skip_genotypes && !args.drop_genotypes;
    for record in reader.records() {
        let mut record = record?;
        if fill_no_calls {
            record.fill_missing_genotypes(writer.header());
        }
        writer.write_record(&record)?;
    }
    log::info!(
        "Wrote {} records",
        format_number_with_commas(writer.records_written())
    );
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::vcf_writer::OutputType;
    use std::{fs, path::PathBuf};
    use tempfile::TempDir;

    const INPUT: &str = "##fileformat=VCFv4.0
##source=test
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total depth\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=GQ,Number=1,Type=Integer,Description=\"Genotype quality\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2
1\t10\t.\ta\tG\t30\tPASS\tDP=12\tGT:GQ\t0/1:30\t0/0:
";

    fn setup() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.vcf");
        fs::write(&input, INPUT).unwrap();
        (dir, input)
    }

    fn args(vcf: PathBuf, output: String) -> ViewArgs {
        ViewArgs {
            vcf,
            output: Some(output),
            output_type: Some(OutputType::Vcf {
                is_uncompressed: true,
                level: None,
            }),
            header_only: false,
            drop_genotypes: false,
            skip_genotypes: false,
            space_delimited: false,
        }
    }

    fn output_path(dir: &TempDir) -> String {
        dir.path().join("out.vcf").to_string_lossy().into_owned()
    }

    #[test]
    fn normalises_records() {
        let (dir, input) = setup();
        let output = output_path(&dir);
        view(args(input, output.clone())).unwrap();
        let text = fs::read_to_string(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "##fileformat=VCFv4.0");
        assert_eq!(
            *lines.last().unwrap(),
            "1\t10\t.\tA\tG\t30.00\tPASS\tDP=12\tGT:GQ\t0/1:30\t0/0:."
        );
    }

    #[test]
    fn header_only_writes_no_records() {
        let (dir, input) = setup();
        let output = output_path(&dir);
        let mut view_args = args(input, output.clone());
        view_args.header_only = true;
        view(view_args).unwrap();
        let text = fs::read_to_string(output).unwrap();
        assert_eq!(text.lines().count(), 6);
        assert!(text.lines().last().unwrap().starts_with("#CHROM"));
    }

    #[test]
    fn drop_genotypes_writes_sites_only() {
        let (dir, input) = setup();
        let output = output_path(&dir);
        let mut view_args = args(input, output.clone());
        view_args.drop_genotypes = true;
        view(view_args).unwrap();
        let text = fs::read_to_string(output).unwrap();
        assert_eq!(
            text.lines().last().unwrap(),
            "1\t10\t.\tA\tG\t30.00\tPASS\tDP=12"
        );
        assert!(text.contains("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n"));
    }

    #[test]
    fn skip_genotypes_writes_no_calls() {
        let (dir, input) = setup();
        let output = output_path(&dir);
        let mut view_args = args(input, output.clone());
        view_args.skip_genotypes = true;
        view(view_args).unwrap();
        let text = fs::read_to_string(output).unwrap();
        assert_eq!(
            text.lines().last().unwrap(),
            "1\t10\t.\tA\tG\t30.00\tPASS\tDP=12\tGT:GQ\t./.\t./."
        );
    }
}
