use std::fs;

use germline_builder::builder::{BuilderParams, GermlineBuilder, Locus, Severity};
use germline_builder::library::{AlleleBody, GermlineLibrary, LibraryMeta};

const PARAMS: &str = r#"
gene_type = "V"
allele_name_pattern = '^[^|]+\|([^|]+)\|'
functional_pattern = '^[^|]+\|[^|]+\|[^|]+\|F\|'
reference_pattern = '\|REF$'
first_occurred_allele_is_reference = true
exception_on_error = false
translation_point = "VBegin"

[[reference_points]]
name = "VBegin"
position = "begin"

[[reference_points]]
name = "Mid"
position = 6

[[reference_points]]
name = "CDR3Begin"
position = 12
pattern = 'TA[CT](TG[CT])'

[[reference_points]]
name = "VEnd"
position = "end"
"#;

const REF: &str = "GATCCAGGTACCTATTGTGCC";
const ALT: &str = "GATCCAGGAACCTATTGTGCC";

fn fasta() -> String {
    let mut s = String::new();
    s.push_str(&format!(">M1|TRBV1*01|Homo sapiens|F|REF\n{}\n", REF));
    // padded and wrapped
    s.push_str(">M2|TRBV1*02|Homo sapiens|F|\nGATCCAGG...AACC\nTATTGTGCC\n");
    s.push_str(&format!(">M3|TRBV2*01|Homo sapiens|F|\n{}\n", REF));
    s.push_str(">M4|TRBV2*02|Homo sapiens|F|\nGATCCAGGNACCTATTGTGCC\n");
    s.push_str(&format!(">M5|TRBV3*01|Homo sapiens|F|REF\n{}\n", REF));
    s.push_str(&format!(">M6|TRBV3*02|Homo sapiens|P|REF\n{}\n", ALT));
    s
}

#[test]
fn fasta_to_library_and_back() {
    let dir = tempfile::tempdir().unwrap();
    let params_path = dir.path().join("trbv.toml");
    let input_path = dir.path().join("trbv.fasta");
    let output_path = dir.path().join("trbv.glib");
    fs::write(&params_path, PARAMS).unwrap();
    fs::write(&input_path, fasta()).unwrap();

    let params = BuilderParams::load(&params_path).unwrap();
    let mut builder = GermlineBuilder::new(Locus::TRB, params);
    builder.import_alleles_from_file(input_path.to_str().unwrap()).unwrap();
    assert!(builder.gene("TRBV2").unwrap().allele("TRBV2*02").is_none());

    let removed = builder.compile().unwrap();
    assert_eq!(removed, vec!["TRBV3".to_string()]);
    assert_eq!(builder.diagnostics().count(Severity::Warning), 2);
    assert_eq!(builder.diagnostics().count(Severity::Error), 1);

    let mut report = Vec::new();
    builder.print_report(&mut report).unwrap();
    let report = String::from_utf8(report).unwrap();
    assert!(report.starts_with("TRBV1\n=====\n"));
    assert!(report.contains("TRBV2\n=====\n"));
    assert!(!report.contains("TRBV3"));
    assert!(report.contains(" **********"));

    let mut lib = GermlineLibrary::new(builder.locus(), builder.params().point_names());
    builder.write_alleles(&mut lib).unwrap();
    lib.set_meta(LibraryMeta {
        input_file: Some("trbv.fasta".to_string()),
        build_args: None,
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    });
    lib.save_to_file(output_path.to_str().unwrap()).unwrap();

    let loaded = GermlineLibrary::load_from_file(output_path.to_str().unwrap()).unwrap();
    let names: Vec<&str> = loaded.alleles.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["TRBV1*01", "TRBV1*02", "TRBV2*01"]);
    assert!(loaded.alleles[0].is_reference);
    assert!(matches!(loaded.alleles[1].body, AlleleBody::Derived { .. }));
    assert_eq!(loaded.sequence_of("TRBV1*01").unwrap(), REF.as_bytes().to_vec());
    assert_eq!(loaded.sequence_of("TRBV1*02").unwrap(), ALT.as_bytes().to_vec());
    assert_eq!(loaded.reference_point_names, vec!["VBegin", "Mid", "CDR3Begin", "VEnd"]);
    assert!(loaded.meta.build_timestamp.is_some());
}

#[test]
fn strict_build_stops_at_first_error() {
    let params = BuilderParams::from_toml_str(&PARAMS.replace("exception_on_error = false", "")).unwrap();
    let mut builder = GermlineBuilder::new(Locus::TRB, params);
    builder.import_alleles(fasta().as_bytes()).unwrap();
    assert!(builder.compile().is_err());
}

#[test]
fn demo_parameters_load() {
    let params = BuilderParams::load(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/trbv-imgt.toml")).unwrap();
    assert_eq!(params.point_count(), 7);
    assert_eq!(params.conserved_cysteine_point, params.point_index("CDR3Begin"));
    assert_eq!(params.translation_point, Some(0));
}
