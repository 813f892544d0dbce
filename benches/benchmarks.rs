use criterion::{black_box, criterion_group, criterion_main, Criterion};

use germline_builder::align::{align_global, align_global_with_buf, AlignBuffer, AlignScoring};
use germline_builder::builder::{BuilderParams, GermlineBuilder, Locus};
use germline_builder::io::fasta::RawRecord;

fn make_sequence(len: usize, seed: u32) -> Vec<u8> {
    let bases = [b'A', b'C', b'G', b'T'];
    let mut seq = Vec::with_capacity(len);
    let mut x: u32 = seed;
    for _ in 0..len {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        seq.push(bases[(x >> 16) as usize % 4]);
    }
    seq
}

fn mutate(seq: &[u8]) -> Vec<u8> {
    let mut out = seq.to_vec();
    for i in (7..out.len()).step_by(37) {
        out[i] = if out[i] == b'A' { b'C' } else { b'A' };
    }
    if out.len() > 120 {
        out.remove(100);
        out.insert(60, b'G');
    }
    out
}

fn bench_global_alignment(c: &mut Criterion) {
    let reference = make_sequence(300, 42);
    let query = mutate(&reference);
    let scoring = AlignScoring::default();

    c.bench_function("align_global_300bp", |b| {
        b.iter(|| {
            black_box(align_global(black_box(&reference), black_box(&query), &scoring));
        })
    });

    let mut buf = AlignBuffer::new();
    c.bench_function("align_global_300bp_reused_buffer", |b| {
        b.iter(|| {
            black_box(align_global_with_buf(black_box(&reference), black_box(&query), &scoring, &mut buf));
        })
    });
}

const PARAMS: &str = r#"
gene_type = "J"
allele_name_pattern = '^([^ ]+)'
functional_pattern = ' F$'

[[reference_points]]
name = "JBegin"
position = "begin"

[[reference_points]]
name = "Mid"
position = 150

[[reference_points]]
name = "JEnd"
position = "end"
"#;

fn bench_gene_compile(c: &mut Criterion) {
    let params = BuilderParams::from_toml_str(PARAMS).expect("bench params");
    let reference = make_sequence(300, 7);
    let mut records = vec![RawRecord {
        header: "TRBJ1-1*01 F".to_string(),
        sequence: reference.clone(),
    }];
    let mut allele = reference;
    for n in 2..=12 {
        allele = mutate(&allele);
        records.push(RawRecord {
            header: format!("TRBJ1-1*{:02} F", n),
            sequence: allele.clone(),
        });
    }

    c.bench_function("compile_gene_12_alleles", |b| {
        b.iter(|| {
            let mut builder = GermlineBuilder::new(Locus::TRB, params.clone());
            for rec in &records {
                builder.import_record(rec).expect("import");
            }
            black_box(builder.compile().expect("compile"));
        })
    });
}

criterion_group!(benches, bench_global_alignment, bench_gene_compile);
criterion_main!(benches);
