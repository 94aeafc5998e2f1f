use std::fs::{File, read_to_string};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use flate2::read::MultiGzDecoder;
use gtars_vcf::{
    DataType, FieldMetadata, FieldValue, GenotypeCall, Number, Record, VcfError, VcfReader,
    Variant, read_vcf, write_vcf,
};
use pretty_assertions::assert_eq;
use rstest::*;
use tempfile::tempdir;
use tracing_subscriber::fmt::MakeWriter;

fn get_test_path(file_name: &str) -> PathBuf {
    std::env::current_dir()
        .unwrap()
        .join("../tests/data/vcf")
        .join(file_name)
}

fn floats(values: &[f64]) -> Vec<FieldValue> {
    values.iter().copied().map(FieldValue::Float).collect()
}

/// Collects formatted log output so tests can count warnings.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a WARN-level subscriber and return its result and log output.
fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs.contents())
}

fn write_vcf_text(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("input.vcf");
    let mut file = File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    path
}

#[rstest]
fn test_minimal_file() {
    let (schema, records) = read_vcf(get_test_path("minimal.vcf")).unwrap();
    assert_eq!(records.len(), 1);
    assert!(schema.borrow().samples.is_empty());

    let record = &records[0];
    assert_eq!(record.variant, Variant::new("1", 10, "A", "C").unwrap());
    assert!(record.ids.is_empty());
    assert_eq!(record.quality, Some(30.0));
    assert!(record.passes_filter());
    assert!(record.info.is_empty());
    assert!(record.sample_info.is_none());
    assert!(!record.from_multi_alt);
}

#[rstest]
fn test_multi_alt_expansion() {
    let (_schema, records) = read_vcf(get_test_path("multi_alt.vcf")).unwrap();
    assert_eq!(records.len(), 2);

    let expected = [("A", 0.1, [1.0, 2.0, 3.0]), ("T", 0.9, [1.0, 4.0, 6.0])];
    for (record, (alt, af, gl)) in records.iter().zip(expected) {
        assert_eq!(record.variant.alt(), alt);
        assert!(record.from_multi_alt);
        assert_eq!(record.info.get("AF").unwrap(), Some(&floats(&[af])[..]));
        let samples = record.sample_info.as_ref().unwrap();
        assert_eq!(samples.values("GL", "NA001").unwrap(), &floats(&gl)[..]);
    }
}

#[rstest]
fn test_unknown_info_key_is_synthesized() {
    let (_, output) = capture_warnings(|| {
        let (schema, records) = read_vcf(get_test_path("unknown_key.vcf")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].info.get("NEW_KEY").unwrap(),
            Some(&[FieldValue::String("value".to_string())][..])
        );
        // a second read hits the cached value
        records[0].info.get("NEW_KEY").unwrap();

        let schema = schema.borrow();
        let entry = &schema.infos["NEW_KEY"];
        assert_eq!(entry.number, Number::Unknown);
        assert_eq!(entry.data_type, DataType::String);
        assert!(entry.is_inferred());
    });
    assert_eq!(output.matches("WARN").count(), 1, "{}", output);
    assert!(output.contains("NEW_KEY"));
}

#[rstest]
fn test_unknown_info_key_while_schema_is_borrowed() {
    let (schema, records) = read_vcf(get_test_path("unknown_key.vcf")).unwrap();
    let guard = schema.borrow();
    assert_eq!(
        records[0].info.get("NEW_KEY").unwrap(),
        Some(&[FieldValue::String("value".to_string())][..])
    );
    assert!(!guard.infos.contains_key("NEW_KEY"));
}

#[rstest]
#[case::too_many_values(Number::A, "0.1,0.2,0.3", 2, None, 1)]
#[case::too_few_values(Number::A, "0.1", 3, None, 1)]
#[case::exact_values(Number::A, "0.1,0.2", 2, None, 0)]
#[case::likelihood_count_mismatch(Number::G, "1,2,3", 2, Some("0/1"), 1)]
#[case::likelihood_count_matches(Number::G, "1,2,3,4,5,6", 2, Some("0/1"), 0)]
fn test_cardinality_warnings(
    #[case] number: Number,
    #[case] raw: &str,
    #[case] n_alts: usize,
    #[case] genotype: Option<&str>,
    #[case] expected_warnings: usize,
) {
    let field = FieldMetadata::format("XX", number, DataType::Float, "");
    let genotype: Option<GenotypeCall> = genotype.map(|gt| gt.parse().unwrap());
    let (split, output) =
        capture_warnings(|| field.extract_data(Some(raw), n_alts, genotype.as_ref()).unwrap());
    assert_eq!(split.len(), n_alts);
    assert_eq!(output.matches("WARN").count(), expected_warnings, "{}", output);
}

#[rstest]
fn test_flag_does_not_warn() {
    let flag = FieldMetadata::info("DB", Number::Fixed(0), DataType::Flag, "dbSNP");
    let (values, output) = capture_warnings(|| flag.extract_data(None, 1, None).unwrap());
    assert_eq!(values, vec![vec![FieldValue::Flag(true)]]);
    assert_eq!(output, "");
}

#[rstest]
fn test_short_per_alt_field_warns_once_per_line() {
    let dir = tempdir().unwrap();
    let path = write_vcf_text(
        dir.path(),
        &[
            "##fileformat=VCFv4.2",
            "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Frequency\">",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
            "1\t10\t.\tA\tC,G\t.\tPASS\tAF=0.5",
            "1\t20\t.\tA\tC,G\t.\tPASS\tAF=0.5,0.25,0.125",
        ],
    );
    let (records, output) = capture_warnings(|| read_vcf(&path).unwrap().1);
    assert_eq!(records.len(), 4);
    assert_eq!(records[1].info.get("AF").unwrap(), Some(&[FieldValue::Missing][..]));
    assert_eq!(records[3].info.get("AF").unwrap(), Some(&floats(&[0.25])[..]));
    assert_eq!(output.matches("WARN").count(), 2, "{}", output);
    assert!(output.contains("padding"));
    assert!(output.contains("dropped"));
}

#[rstest]
fn test_separate_multi_alt_lines_round_trip() {
    let dir = tempdir().unwrap();
    let path = write_vcf_text(
        dir.path(),
        &[
            "##fileformat=VCFv4.2",
            "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Frequency\">",
            "##FILTER=<ID=q10,Description=\"Quality below 10\">",
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO",
            "1\t100\trs1\tA\tG,T\t50\tPASS\tAF=0.25,0.5",
            "1\t100\trs2\tA\tC,GG\t20\tq10\tAF=0.1,0.2",
        ],
    );
    let (schema, records) = read_vcf(&path).unwrap();
    let out_path = dir.path().join("out.vcf");
    write_vcf(&out_path, schema, records.clone()).unwrap();

    assert_eq!(read_to_string(&out_path).unwrap(), read_to_string(&path).unwrap());
    let (_, reread) = read_vcf(&out_path).unwrap();
    assert_eq!(reread, records);
    assert_eq!(reread[2].ids, vec!["rs2"]);
    assert_eq!(reread[2].quality, Some(20.0));
    assert!(!reread[2].passes_filter());
}

#[rstest]
#[case("roundtrip.vcf", "out.vcf")]
#[case("roundtrip.vcf", "out.vcf.gz")]
#[case("multi_alt.vcf", "out.vcf")]
fn test_round_trip(#[case] input: &str, #[case] output: &str) {
    let (schema, records) = read_vcf(get_test_path(input)).unwrap();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join(output);
    write_vcf(&out_path, schema.clone(), records.clone()).unwrap();

    let (reread_schema, reread) = read_vcf(&out_path).unwrap();
    assert_eq!(*reread_schema.borrow(), *schema.borrow());
    assert_eq!(reread, records);
}

#[rstest]
fn test_round_trip_is_byte_identical() {
    let path = get_test_path("roundtrip.vcf");
    let (schema, records) = read_vcf(&path).unwrap();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("out.vcf");
    write_vcf(&out_path, schema, records).unwrap();
    assert_eq!(read_to_string(&out_path).unwrap(), read_to_string(&path).unwrap());
}

#[rstest]
fn test_gzipped_output() {
    let path = get_test_path("minimal.vcf");
    let (schema, records) = read_vcf(&path).unwrap();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("out.vcf.gz");
    write_vcf(&out_path, schema, records).unwrap();

    let mut decompressed = String::new();
    MultiGzDecoder::new(File::open(&out_path).unwrap())
        .read_to_string(&mut decompressed)
        .unwrap();
    assert_eq!(decompressed, read_to_string(&path).unwrap());
}

#[rstest]
fn test_roundtrip_fixture_contents() {
    let (schema, records) = read_vcf(get_test_path("roundtrip.vcf")).unwrap();
    assert_eq!(schema.borrow().vcf_format, "4.1");
    assert_eq!(schema.borrow().samples, vec!["NA001", "NA002"]);
    assert_eq!(records.len(), 6);

    let first = &records[0];
    assert!(first.from_candidate_file().unwrap());
    let samples = first.sample_info.as_ref().unwrap();
    assert_eq!(samples.read_depth("NA001").unwrap(), Some(38));
    assert_eq!(samples.genotype_quality("NA002").unwrap(), Some(50));
    assert_eq!(
        samples.genotype_likelihoods("NA001").unwrap(),
        Some(floats(&[-4.0, 0.0, -6.0]))
    );

    let block = &records[1];
    assert!(block.is_ref_block());
    assert_eq!(block.end_position().unwrap(), 350);

    let (del, ins): (&Record, &Record) = (&records[2], &records[3]);
    assert_eq!(del.variant.alt(), "A");
    assert_eq!(ins.variant.alt(), "ACGTT");
    assert!(!del.passes_filter());
    let del_samples = del.sample_info.as_ref().unwrap();
    assert_eq!(del_samples.genotype("NA001").unwrap().to_string(), "0/1");
    assert_eq!(del_samples.genotype("NA002").unwrap().to_string(), "0|1");
    let ins_samples = ins.sample_info.as_ref().unwrap();
    assert_eq!(ins_samples.genotype("NA002").unwrap().to_string(), "0|0");
    assert_eq!(ins.info.get("AF").unwrap(), Some(&floats(&[0.125])[..]));
}

#[rstest]
fn test_errors_carry_line_numbers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.vcf");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "##fileformat=VCFv4.2").unwrap();
    writeln!(file, "##INFO=<ID=AD,Number=R,Type=Integer,Description=\"Depths\">").unwrap();
    writeln!(file, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").unwrap();
    writeln!(file, "1\t10\t.\tA\tC,G\t.\tPASS\tAD=1,2").unwrap();
    drop(file);

    let mut reader = VcfReader::from_path(&path).unwrap();
    let err = reader.next().unwrap().unwrap_err();
    assert!(matches!(err, VcfError::Line { line: 4, .. }));
    assert!(err.to_string().starts_with("line 4: "), "{}", err);
    assert!(reader.next().is_none());

    let err = read_vcf(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("line 4"));
}
