use std::io::Write;
use std::ops::Range;

use super::gene::Gene;
use super::params::BuilderParams;
use super::projection::{OrfProjection, ProjectedAllele};
use crate::align::multi::{AlignedQuery, MultiAlignment};
use crate::align::Mutations;

pub const LINE_WIDTH: usize = 80;

fn markers(params: &BuilderParams, points: &[Option<usize>]) -> Vec<(String, usize)> {
    points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.map(|pos| (params.point_name(i).to_string(), pos)))
        .collect()
}

fn span(points: &[Option<usize>]) -> Range<usize> {
    let first = points.iter().flatten().next().copied().unwrap_or(0);
    let last = points.iter().flatten().last().copied().unwrap_or(first);
    first..last.max(first)
}

fn write_blocks<W: Write>(out: &mut W, alignment: &MultiAlignment) -> std::io::Result<()> {
    for block in alignment.split(LINE_WIDTH) {
        writeln!(out, "{}", block)?;
        writeln!(out)?;
    }
    Ok(())
}

/// 输出单个基因的比对报告：核苷酸比对块，以及可翻译时的氨基酸比对块。
///
/// 基因必须已在启用差异编码的情况下编译
pub fn write_gene_report<W: Write>(out: &mut W, gene: &Gene, params: &BuilderParams) -> std::io::Result<()> {
    let reference = gene.reference();

    writeln!(out, "{}", gene.name())?;
    writeln!(out, "{}", "=".repeat(gene.name().len()))?;
    writeln!(out)?;

    // nucleotide block, absolute reference coordinates
    let derived: Vec<(String, Mutations, Range<usize>)> = gene
        .final_alleles()
        .skip(1)
        .filter_map(|a| {
            let d = a.derivation.as_ref()?;
            Some((a.full_name(), d.absolute_mutations(reference)?, d.reference_range(reference)?))
        })
        .collect();
    let queries: Vec<AlignedQuery<'_>> = derived
        .iter()
        .map(|(title, mutations, range)| AlignedQuery {
            title: format!(" {}", title),
            mutations,
            range: range.clone(),
        })
        .collect();
    let mut nt = MultiAlignment::build(
        &format!(" {}", reference.full_name()),
        &reference.sequence,
        span(&reference.reference_points),
        &queries,
    );
    nt.draw_points(&markers(params, &reference.reference_points));
    write_blocks(out, &nt)?;
    writeln!(out)?;

    let orf = OrfProjection::build(reference, params);
    let Some(translation) = orf.translation.as_ref() else {
        return Ok(());
    };

    writeln!(out, " **********")?;
    writeln!(out)?;

    let projected: Vec<(String, ProjectedAllele)> = gene
        .final_alleles()
        .skip(1)
        .filter_map(|a| Some((a.full_name(), orf.project(reference, a.derivation.as_ref()?)?)))
        .collect();
    let queries: Vec<AlignedQuery<'_>> = projected
        .iter()
        .map(|(title, p)| AlignedQuery {
            title: format!(" {}", title),
            mutations: &p.mutations,
            range: p.range.clone(),
        })
        .collect();
    let aa_points = orf.aa_reference_points();
    let mut aa = MultiAlignment::build(
        &format!(" {}", reference.full_name()),
        &translation.sequence,
        0..translation.sequence.len(),
        &queries,
    );
    aa.draw_points(&markers(params, &aa_points));
    write_blocks(out, &aa)?;
    writeln!(out)?;
    Ok(())
}
