use crate::align::{align_global_with_buf, AlignBuffer, AlignScoring, Mutations};

use super::error::BuildError;
use super::gene::{AlleleRecord, Derivation};

/// 以锚点分段的全局比对，把 `allele` 编码为相对于 `reference` 的突变集合。
///
/// 只在两条序列都定义了的锚点之间比对；任一侧未定义的锚点直接跳过。
/// 结果以参考序列上第一个共有锚点为原点。
pub fn encode(reference: &AlleleRecord, allele: &AlleleRecord, scoring: &AlignScoring) -> Result<Derivation, BuildError> {
    let unordered = || BuildError::UnorderedReferencePoints {
        allele: allele.name.clone(),
        positions: super::anchor::format_points(&allele.reference_points),
    };

    let mut buf = AlignBuffer::new();
    let mut mutations = Mutations::new();
    let mut prev: Option<(usize, usize)> = None;
    let mut first: Option<(usize, usize)> = None;
    let mut last_point = 0usize;

    for (i, (p1, p2)) in reference.reference_points.iter().zip(&allele.reference_points).enumerate() {
        let (Some(curr1), Some(curr2)) = (*p1, *p2) else {
            continue;
        };
        if first.is_none() {
            first = Some((i, curr1));
        }
        last_point = i;

        let Some((prev1, prev2)) = prev else {
            prev = Some((curr1, curr2));
            continue;
        };
        if curr1 == prev1 && curr2 == prev2 {
            continue;
        }

        let seq1 = reference.sequence.get(prev1..curr1).ok_or_else(unordered)?;
        let seq2 = allele.sequence.get(prev2..curr2).ok_or_else(unordered)?;
        let aln = align_global_with_buf(seq1, seq2, scoring, &mut buf);
        mutations.append(&aln.mutations.move_by(prev1 as isize));
        prev = Some((curr1, curr2));
    }

    let Some((first_point, origin)) = first else {
        return Err(BuildError::NoSharedReferencePoints {
            allele: allele.name.clone(),
            reference: reference.name.clone(),
        });
    };

    Ok(Derivation {
        reference: reference.name.clone(),
        mutations: mutations.move_by(-(origin as isize)),
        first_point,
        last_point,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allele(name: &str, seq: &[u8], points: Vec<Option<usize>>) -> AlleleRecord {
        AlleleRecord {
            name: name.to_string(),
            gene: "TRBV1".to_string(),
            sequence: seq.to_vec(),
            is_functional: true,
            is_reference: false,
            reference_points: points,
            derivation: None,
        }
    }

    fn span(a: &AlleleRecord, d: &Derivation) -> Vec<u8> {
        let from = a.reference_points[d.first_point].unwrap();
        let to = a.reference_points[d.last_point].unwrap();
        a.sequence[from..to].to_vec()
    }

    #[test]
    fn identical_alleles_have_empty_script() {
        let r = allele("TRBV1*01", b"ACGTACGTACGTACGTACGT", vec![Some(0), Some(10), Some(20)]);
        let a = allele("TRBV1*02", b"ACGTACGTACGTACGTACGT", vec![Some(0), Some(10), Some(20)]);
        let d = encode(&r, &a, &AlignScoring::default()).unwrap();
        assert!(d.mutations.is_empty());
        assert_eq!((d.first_point, d.last_point), (0, 2));
    }

    #[test]
    fn undefined_reference_anchor_limits_the_span() {
        let r = allele("TRBV1*01", b"ACGTACGTACGTACGTACGT", vec![Some(0), Some(10), None]);
        let a = allele("TRBV1*02", b"ACGTACCTACGTACGTACGTTT", vec![Some(0), Some(10), Some(20)]);
        let d = encode(&r, &a, &AlignScoring::default()).unwrap();
        assert_eq!((d.first_point, d.last_point), (0, 1));
        assert_eq!(d.mutations.to_string(), "S6:G>C");
        assert_eq!(d.reconstruct(&r).unwrap(), span(&a, &d));
    }

    #[test]
    fn script_is_relative_to_first_shared_anchor() {
        let r = allele("TRBV1*01", b"TTTTTACGTACGTACGTACG", vec![None, Some(5), Some(20)]);
        let a = allele("TRBV1*02", b"GGACGTACCTACGTACG", vec![Some(0), Some(2), Some(17)]);
        let d = encode(&r, &a, &AlignScoring::default()).unwrap();
        assert_eq!(d.first_point, 1);
        assert_eq!(d.mutations.to_string(), "S6:G>C");
        assert_eq!(d.reference_range(&r), Some(5..20));
        assert_eq!(d.absolute_mutations(&r).unwrap().to_string(), "S11:G>C");
        assert_eq!(d.reconstruct(&r).unwrap(), span(&a, &d));
    }

    #[test]
    fn segments_with_indels_round_trip() {
        let r = allele("TRBV1*01", b"AAAACCCCGGGGTTTTACGTAAACCCGGGTTT", vec![Some(0), Some(8), Some(16), Some(32)]);
        let a = allele("TRBV1*02", b"AAAACCCCCGGGTTTTACGTAAACCGGGTTTA", vec![Some(0), Some(9), Some(16), Some(32)]);
        let d = encode(&r, &a, &AlignScoring::default()).unwrap();
        assert_eq!(d.reconstruct(&r).unwrap(), a.sequence[0..32].to_vec());
    }

    #[test]
    fn no_shared_anchor_is_an_error() {
        let r = allele("TRBV1*01", b"ACGT", vec![Some(0), None]);
        let a = allele("TRBV1*02", b"ACGT", vec![None, Some(4)]);
        let err = encode(&r, &a, &AlignScoring::default()).unwrap_err();
        assert!(matches!(err, BuildError::NoSharedReferencePoints { .. }));
    }
}
