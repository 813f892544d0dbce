//! 胚系基因库编译器
//!
//! 流程：导入全部记录 -> 逐基因编译（选定参考等位基因并计算差异编码）
//! -> 可选输出比对报告 -> 写入基因库。

pub mod anchor;
pub mod diff;
pub mod error;
pub mod gene;
pub mod header;
pub mod locus;
pub mod params;
pub mod projection;
pub mod report;

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::io::fasta::{FastaReader, RawRecord};
use crate::library::{AlleleBody, LibraryAllele, LibraryWriter};
use crate::util::dna;
use crate::util::mapping::StrippedSequence;

pub use error::{BuildError, Diagnostic, Diagnostics, ErrorPolicy, Severity};
pub use gene::{AlleleRecord, Derivation, Gene};
pub use locus::{GeneType, Locus};
pub use params::BuilderParams;

/// 把一个基因座、一种基因类型的输入编译为胚系基因库
pub struct GermlineBuilder {
    locus: Locus,
    params: BuilderParams,
    genes: BTreeMap<String, Gene>,
    diagnostics: Diagnostics,
}

impl GermlineBuilder {
    pub fn new(locus: Locus, params: BuilderParams) -> Self {
        Self {
            locus,
            params,
            genes: BTreeMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn allow_non_standard_names(mut self) -> Self {
        self.params.allow_non_standard_names = true;
        self
    }

    pub fn no_exception_on_error(mut self) -> Self {
        self.params.exception_on_error = false;
        self
    }

    pub fn locus(&self) -> Locus {
        self.locus
    }

    pub fn params(&self) -> &BuilderParams {
        &self.params
    }

    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.values()
    }

    pub fn gene(&self, name: &str) -> Option<&Gene> {
        self.genes.get(name)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn import_alleles_from_file(&mut self, path: &str) -> Result<()> {
        let f = std::fs::File::open(path).with_context(|| format!("cannot open input FASTA '{}'", path))?;
        self.import_alleles(std::io::BufReader::new(f))
            .with_context(|| format!("while importing '{}'", path))
    }

    pub fn import_alleles<R: BufRead>(&mut self, reader: R) -> Result<()> {
        let mut reader = FastaReader::new(reader);
        let mut n = 0usize;
        while let Some(rec) = reader.next_record()? {
            self.import_record(&rec)?;
            n += 1;
        }
        info!("imported {} records into {} genes", n, self.genes.len());
        Ok(())
    }

    /// 导入一条记录。宽松模式下被拒绝的记录会跳过，并记录到 [`Self::diagnostics`]
    pub fn import_record(&mut self, rec: &RawRecord) -> Result<(), BuildError> {
        let policy = self.params.error_policy();

        let parsed = match header::resolve(&rec.header, self.locus, &self.params, &mut self.diagnostics) {
            Ok(h) => h,
            Err(e) => return policy.handle(e, &mut self.diagnostics),
        };

        let stripped = StrippedSequence::strip(&rec.sequence, self.params.padding_char);
        if dna::contains_wildcards(stripped.as_bytes()) {
            return policy.handle(
                BuildError::WildcardSequenceSkipped { allele: parsed.allele_name },
                &mut self.diagnostics,
            );
        }

        let reference_points = anchor::resolve_all(&self.params.reference_points, &stripped);
        if !anchor::is_ordered(&reference_points) {
            return policy.handle(
                BuildError::UnorderedReferencePoints {
                    allele: parsed.allele_name,
                    positions: anchor::format_points(&reference_points),
                },
                &mut self.diagnostics,
            );
        }

        let is_first = !self.genes.contains_key(&parsed.gene_name);
        let mut allele = AlleleRecord {
            name: parsed.allele_name,
            gene: parsed.gene_name,
            sequence: stripped.into_bytes(),
            is_functional: parsed.is_functional,
            is_reference: parsed.explicit_reference.unwrap_or(is_first),
            reference_points,
            derivation: None,
        };

        if allele.is_functional && self.params.gene_type == GeneType::Variable {
            if let Some(detail) = self.conserved_cysteine_violation(&allele) {
                allele.is_functional = false;
                policy.handle(
                    BuildError::ConservedResidueViolation { allele: allele.name.clone(), detail },
                    &mut self.diagnostics,
                )?;
            }
        }

        debug!("{}: reference points {}", allele.name, anchor::format_points(&allele.reference_points));
        match self.genes.get_mut(&allele.gene) {
            Some(gene) => {
                if let Err(e) = gene.register(allele) {
                    policy.handle(e, &mut self.diagnostics)?;
                }
            }
            None => {
                self.genes.insert(allele.gene.clone(), Gene::with_first_allele(allele));
            }
        }
        Ok(())
    }

    fn conserved_cysteine_violation(&self, allele: &AlleleRecord) -> Option<String> {
        let point = self.params.conserved_cysteine_point?;
        let codon = allele.reference_points[point]
            .and_then(|pos| allele.sequence.get(pos..pos + 3));
        match codon.map(dna::translate_codon) {
            None => Some("absent conserved Cys".to_string()),
            Some(b'C') => None,
            Some(aa) => Some(format!("{} instead of conserved Cys", aa as char)),
        }
    }

    /// 编译全部基因，返回被移除的基因名
    pub fn compile(&mut self) -> Result<Vec<String>, BuildError> {
        let policy = self.params.error_policy();
        let mut removed = Vec::new();
        for gene in self.genes.values_mut() {
            if !gene.compile(&self.params, policy, &mut self.diagnostics)? {
                removed.push(gene.name().to_string());
            }
        }
        for name in &removed {
            self.genes.remove(name);
            self.diagnostics.warning(format!("{} removed.", name));
        }
        Ok(removed)
    }

    /// 输出所有已编译基因的比对报告；未启用差异编码时不输出
    pub fn print_report<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if !self.params.align_alleles {
            return Ok(());
        }
        for gene in self.genes.values() {
            report::write_gene_report(out, gene, &self.params)?;
        }
        Ok(())
    }

    pub fn write_alleles<L: LibraryWriter>(&self, writer: &mut L) -> Result<()> {
        for gene in self.genes.values() {
            for allele in gene.final_alleles() {
                let body = match &allele.derivation {
                    Some(d) if !allele.is_reference => AlleleBody::Derived {
                        reference_allele: d.reference.clone(),
                        mutations: d.mutations.clone(),
                        feature: (
                            self.params.point_name(d.first_point).to_string(),
                            self.params.point_name(d.last_point).to_string(),
                        ),
                    },
                    _ => {
                        writer.write_sequence_part(&allele.name, 0, &allele.sequence)?;
                        AlleleBody::Sequence {
                            accession: allele.name.clone(),
                            reference_points: allele.reference_points.clone(),
                        }
                    }
                };
                writer.write_allele(LibraryAllele {
                    gene_type: self.params.gene_type,
                    name: allele.name.clone(),
                    is_reference: allele.is_reference,
                    is_functional: allele.is_functional,
                    body,
                })?;
            }
        }
        Ok(())
    }
}
