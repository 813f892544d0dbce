use std::ops::Range;

use log::debug;

use super::gene::{AlleleRecord, Derivation};
use super::params::BuilderParams;
use crate::align::{nt_to_aa, Mutations};
use crate::util::dna::{self, TranslationFrame};

/// 移码必须在这么多个密码子内得到补偿
pub const MAX_SHIFTED_TRIPLETS: usize = 10;

/// 参考开放阅读框的翻译结果
#[derive(Debug, Clone)]
pub struct AminoAcidView {
    pub frame: TranslationFrame,
    pub sequence: Vec<u8>,
}

/// 切除非编码区后的参考序列，参考点坐标已换算到该序列上
#[derive(Debug, Clone)]
pub struct OrfProjection {
    pub sequence: Vec<u8>,
    /// 被切除的区间（参考序列坐标），按起点排序
    pub noncoding: Vec<Range<usize>>,
    pub reference_points: Vec<Option<usize>>,
    pub translation: Option<AminoAcidView>,
}

#[derive(Debug, Clone)]
pub struct ProjectedAllele {
    /// 相对 [`AminoAcidView::sequence`] 的氨基酸突变
    pub mutations: Mutations,
    pub range: Range<usize>,
}

impl OrfProjection {
    pub fn build(reference: &AlleleRecord, params: &BuilderParams) -> Self {
        let points = &reference.reference_points;
        let mut orf_points = points.clone();
        let mut noncoding: Vec<Range<usize>> = Vec::new();
        for &(from, to) in &params.noncoding_regions {
            let (Some(start), Some(end)) = (points[from], points[to]) else {
                continue;
            };
            orf_points[from] = None;
            orf_points[to] = None;
            if start <= end {
                noncoding.push(start..end);
            }
        }
        noncoding.sort_by_key(|r| r.start);

        // overlapping ranges cannot both be removed
        let mut kept: Vec<Range<usize>> = Vec::with_capacity(noncoding.len());
        for r in noncoding {
            match kept.last() {
                Some(prev) if r.start < prev.end => {
                    debug!("{}: ignoring non-coding range {:?} overlapping {:?}", reference.gene, r, prev);
                }
                _ => kept.push(r),
            }
        }

        for p in orf_points.iter_mut() {
            if let Some(pos) = *p {
                let offset: usize = kept.iter().filter(|r| r.end <= pos).map(|r| r.len()).sum();
                *p = Some(pos.saturating_sub(offset));
            }
        }

        let mut sequence = Vec::with_capacity(reference.sequence.len());
        let mut cursor = 0usize;
        for r in &kept {
            sequence.extend_from_slice(&reference.sequence[cursor..r.start]);
            cursor = r.end;
        }
        sequence.extend_from_slice(&reference.sequence[cursor..]);

        let translation = params
            .translation_point
            .and_then(|i| orf_points[i])
            .map(|start| {
                let frame = TranslationFrame::with_incomplete_codon(start);
                AminoAcidView { frame, sequence: dna::translate(&sequence, frame) }
            });

        Self {
            sequence,
            noncoding: kept,
            reference_points: orf_points,
            translation,
        }
    }

    /// 氨基酸坐标下的参考点
    pub fn aa_reference_points(&self) -> Vec<Option<usize>> {
        match &self.translation {
            Some(t) => self
                .reference_points
                .iter()
                .map(|p| p.map(|pos| t.frame.aa_position(pos)))
                .collect(),
            None => vec![None; self.reference_points.len()],
        }
    }

    /// 把派生等位基因投影到氨基酸坐标。无法翻译、边界参考点被切除，
    /// 或翻译后的突变不确定时返回 None。
    pub fn project(&self, reference: &AlleleRecord, derivation: &Derivation) -> Option<ProjectedAllele> {
        let t = self.translation.as_ref()?;
        let first = (*self.reference_points.get(derivation.first_point)?)?;
        let last = (*self.reference_points.get(derivation.last_point)?)?;
        if last <= first {
            return None;
        }
        let absolute = derivation.absolute_mutations(reference)?;
        let orf_mutations = absolute.remove_in_ranges(&self.noncoding);
        let mutations = nt_to_aa(&self.sequence, &orf_mutations, t.frame, MAX_SHIFTED_TRIPLETS)?;
        let range = t.frame.aa_position(first)..t.frame.aa_position(last - 1) + 1;
        Some(ProjectedAllele { mutations, range })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::Mutation;

    fn params() -> BuilderParams {
        BuilderParams::from_toml_str(
            r#"
gene_type = "V"
allele_name_pattern = '^([^ ]+)'
functional_pattern = ' F$'
translation_point = "L1Begin"
noncoding_regions = [["L1End", "L2Begin"]]

[[reference_points]]
name = "L1Begin"
position = "begin"
[[reference_points]]
name = "L1End"
position = 6
[[reference_points]]
name = "L2Begin"
position = 10
[[reference_points]]
name = "CDR3Begin"
position = 13
[[reference_points]]
name = "VEnd"
position = "end"
"#,
        )
        .unwrap()
    }

    fn reference() -> AlleleRecord {
        // exon ATGGCC, intron GTAG, exon ATTGC ACT
        AlleleRecord {
            name: "TRBV1*01".to_string(),
            gene: "TRBV1".to_string(),
            sequence: b"ATGGCCGTAGATTGCACT".to_vec(),
            is_functional: true,
            is_reference: true,
            reference_points: vec![Some(0), Some(6), Some(10), Some(13), Some(18)],
            derivation: None,
        }
    }

    #[test]
    fn intron_is_removed_and_points_renumbered() {
        let orf = OrfProjection::build(&reference(), &params());
        assert_eq!(orf.sequence, b"ATGGCCATTGCACT".to_vec());
        assert_eq!(orf.noncoding, vec![6..10]);
        assert_eq!(orf.reference_points, vec![Some(0), None, None, Some(9), Some(14)]);
        let t = orf.translation.as_ref().unwrap();
        assert_eq!(t.sequence, b"MAIA_".to_vec());
        assert_eq!(orf.aa_reference_points()[3], Some(3));
    }

    #[test]
    fn projects_substitution_past_intron() {
        let r = reference();
        let orf = OrfProjection::build(&r, &params());
        // ATT -> ACT at reference position 11: I -> T
        let d = Derivation {
            reference: r.name.clone(),
            mutations: Mutations::from_vec(vec![Mutation::Substitution { pos: 11, from: b'T', to: b'C' }]),
            first_point: 0,
            last_point: 4,
        };
        let p = orf.project(&r, &d).unwrap();
        assert_eq!(p.mutations.to_string(), "S2:I>T");
        assert_eq!(p.range, 0..5);
    }

    #[test]
    fn frameshift_is_not_projected() {
        let r = reference();
        let orf = OrfProjection::build(&r, &params());
        let d = Derivation {
            reference: r.name.clone(),
            mutations: Mutations::from_vec(vec![Mutation::Deletion { pos: 1, from: b'T' }]),
            first_point: 0,
            last_point: 4,
        };
        assert!(orf.project(&r, &d).is_none());
    }

    #[test]
    fn bounding_point_inside_removed_range_is_not_projected() {
        let r = reference();
        let orf = OrfProjection::build(&r, &params());
        let d = Derivation {
            reference: r.name.clone(),
            mutations: Mutations::new(),
            first_point: 1,
            last_point: 4,
        };
        assert!(orf.project(&r, &d).is_none());
    }
}
