use std::collections::BTreeMap;
use std::ops::Range;

use log::debug;

use super::diff;
use super::error::{BuildError, Diagnostics, ErrorPolicy};
use super::params::BuilderParams;
use crate::align::Mutations;

#[derive(Debug, Clone)]
pub struct AlleleRecord {
    pub name: String,
    pub gene: String,
    /// 去除填充后的核酸序列
    pub sequence: Vec<u8>,
    pub is_functional: bool,
    pub is_reference: bool,
    /// 每个配置的参考点占一格；该等位基因上未定义时为 None
    pub reference_points: Vec<Option<usize>>,
    /// 编译时为非参考等位基因填充
    pub derivation: Option<Derivation>,
}

impl AlleleRecord {
    pub fn full_name(&self) -> String {
        format!("{} [{}]", self.name, if self.is_functional { "F" } else { "P" })
    }
}

/// 非参考等位基因相对于参考等位基因的差异编码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    /// 参考等位基因名
    pub reference: String,
    /// 以参考序列上 `first_point` 的位置为原点的突变
    pub mutations: Mutations,
    /// 两个等位基因都定义了的第一个和最后一个参考点下标
    pub first_point: usize,
    pub last_point: usize,
}

impl Derivation {
    /// 突变集合覆盖的参考序列区间
    pub fn reference_range(&self, reference: &AlleleRecord) -> Option<Range<usize>> {
        let from = (*reference.reference_points.get(self.first_point)?)?;
        let to = (*reference.reference_points.get(self.last_point)?)?;
        Some(from..to)
    }

    /// 换算到参考序列绝对坐标的突变集合
    pub fn absolute_mutations(&self, reference: &AlleleRecord) -> Option<Mutations> {
        let range = self.reference_range(reference)?;
        Some(self.mutations.move_by(range.start as isize))
    }

    /// 重建该等位基因在首尾共有参考点之间的序列
    pub fn reconstruct(&self, reference: &AlleleRecord) -> Option<Vec<u8>> {
        let range = self.reference_range(reference)?;
        let mutated = self.absolute_mutations(reference)?.apply(&reference.sequence)?;
        let end = range.end.checked_add_signed(self.mutations.length_delta())?;
        mutated.get(range.start..end).map(<[u8]>::to_vec)
    }
}

/// 一个基因的全部等位基因，以等位基因名为键
#[derive(Debug, Clone)]
pub struct Gene {
    name: String,
    alleles: BTreeMap<String, AlleleRecord>,
    // key into `alleles`
    reference: String,
    several_reference_alleles: bool,
    final_list: Vec<String>,
}

impl Gene {
    /// 第一个出现的等位基因作为临时参考
    pub fn with_first_allele(allele: AlleleRecord) -> Self {
        let name = allele.gene.clone();
        let reference = allele.name.clone();
        let mut alleles = BTreeMap::new();
        alleles.insert(allele.name.clone(), allele);
        Self {
            name,
            alleles,
            reference,
            several_reference_alleles: false,
            final_list: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> &AlleleRecord {
        &self.alleles[&self.reference]
    }

    pub fn allele(&self, name: &str) -> Option<&AlleleRecord> {
        self.alleles.get(name)
    }

    pub fn alleles(&self) -> impl Iterator<Item = &AlleleRecord> {
        self.alleles.values()
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    pub fn has_several_reference_alleles(&self) -> bool {
        self.several_reference_alleles
    }

    /// 编译后的等位基因列表：参考在前，其余按名称排序
    pub fn final_alleles(&self) -> impl Iterator<Item = &AlleleRecord> {
        self.final_list.iter().filter_map(move |n| self.alleles.get(n))
    }

    pub fn register(&mut self, allele: AlleleRecord) -> Result<(), BuildError> {
        if self.alleles.contains_key(&allele.name) {
            return Err(BuildError::DuplicateAllele { allele: allele.name });
        }

        let current_is_reference = self.reference().is_reference;
        if allele.is_reference {
            if current_is_reference {
                self.several_reference_alleles = true;
            } else {
                self.reference = allele.name.clone();
            }
        }
        self.alleles.insert(allele.name.clone(), allele);
        Ok(())
    }

    /// 编译基因：校验参考等位基因并计算其余等位基因的差异编码。
    ///
    /// 基因需要从库中移除时返回 `Ok(false)`
    pub fn compile(
        &mut self,
        params: &BuilderParams,
        policy: ErrorPolicy,
        diagnostics: &mut Diagnostics,
    ) -> Result<bool, BuildError> {
        self.final_list.clear();

        if !params.align_alleles {
            self.final_list.push(self.reference.clone());
            self.final_list
                .extend(self.alleles.keys().filter(|k| **k != self.reference).cloned());
            return Ok(true);
        }

        if !self.reference().is_reference && !params.first_occurred_allele_is_reference {
            policy.handle(BuildError::NoReferenceAllele { gene: self.name.clone() }, diagnostics)?;
            return Ok(false);
        }
        if self.several_reference_alleles {
            policy.handle(BuildError::MultipleReferenceAlleles { gene: self.name.clone() }, diagnostics)?;
            return Ok(false);
        }

        if let Some(r) = self.alleles.get_mut(&self.reference) {
            r.is_reference = true;
        }

        let mut derived = Vec::new();
        let mut dropped = Vec::new();
        {
            let reference = self.reference();
            for allele in self.alleles.values().filter(|a| a.name != reference.name) {
                match diff::encode(reference, allele, &params.scoring) {
                    Ok(d) => {
                        debug!("{}: {} mutations vs {}", allele.name, d.mutations.len(), reference.name);
                        derived.push((allele.name.clone(), d));
                    }
                    Err(e) => {
                        policy.handle(e, diagnostics)?;
                        dropped.push(allele.name.clone());
                    }
                }
            }
        }

        for name in dropped {
            self.alleles.remove(&name);
        }
        self.final_list.push(self.reference.clone());
        for (name, d) in derived {
            if let Some(a) = self.alleles.get_mut(&name) {
                a.derivation = Some(d);
                self.final_list.push(name);
            }
        }
        Ok(true)
    }
}
