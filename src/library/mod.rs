//! 胚系基因库的持久化格式
//!
//! 参考等位基因保存完整序列（按 accession 存储），其余等位基因保存为
//! 相对参考等位基因的突变集合。整个库以 bincode 序列化到单个文件。

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::align::Mutations;
use crate::builder::locus::{GeneType, Locus};

/// 编译结果的写入端
pub trait LibraryWriter {
    /// 在 `offset` 处把 `sequence` 追加到 `accession` 对应的序列
    fn write_sequence_part(&mut self, accession: &str, offset: usize, sequence: &[u8]) -> Result<()>;

    fn write_allele(&mut self, allele: LibraryAllele) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlleleBody {
    /// 完整序列，存放在 `accession` 下
    Sequence {
        accession: String,
        reference_points: Vec<Option<usize>>,
    },
    /// 相对 `reference_allele` 的突变集合，以参考点 `feature.0` 为原点，覆盖到 `feature.1`
    Derived {
        reference_allele: String,
        mutations: Mutations,
        feature: (String, String),
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryAllele {
    pub gene_type: GeneType,
    pub name: String,
    pub is_reference: bool,
    pub is_functional: bool,
    pub body: AlleleBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryMeta {
    pub input_file: Option<String>,
    pub build_args: Option<String>,
    /// RFC 3339 格式
    pub build_timestamp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GermlineLibrary {
    pub locus: Locus,
    pub reference_point_names: Vec<String>,
    pub sequences: BTreeMap<String, Vec<u8>>,
    pub alleles: Vec<LibraryAllele>,
    pub meta: LibraryMeta,
}

impl GermlineLibrary {
    pub fn new(locus: Locus, reference_point_names: Vec<String>) -> Self {
        Self {
            locus,
            reference_point_names,
            sequences: BTreeMap::new(),
            alleles: Vec::new(),
            meta: LibraryMeta::default(),
        }
    }

    pub fn set_meta(&mut self, meta: LibraryMeta) {
        self.meta = meta;
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let f = std::fs::File::create(path).with_context(|| format!("cannot create library file '{}'", path))?;
        let mut w = std::io::BufWriter::new(f);
        bincode::serialize_into(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let f = std::fs::File::open(path).with_context(|| format!("cannot open library file '{}'", path))?;
        let lib: Self = bincode::deserialize_from(std::io::BufReader::new(f))?;
        Ok(lib)
    }

    pub fn allele(&self, name: &str) -> Option<&LibraryAllele> {
        self.alleles.iter().find(|a| a.name == name)
    }

    fn point_index(&self, name: &str) -> Option<usize> {
        self.reference_point_names.iter().position(|n| n == name)
    }

    /// 取等位基因序列：参考等位基因返回完整序列，派生等位基因返回其 feature 两个参考点之间的片段
    pub fn sequence_of(&self, name: &str) -> Option<Vec<u8>> {
        match &self.allele(name)?.body {
            AlleleBody::Sequence { accession, .. } => self.sequences.get(accession).cloned(),
            AlleleBody::Derived { reference_allele, mutations, feature } => {
                let AlleleBody::Sequence { accession, reference_points } = &self.allele(reference_allele)?.body else {
                    return None;
                };
                let reference = self.sequences.get(accession)?;
                let from = (*reference_points.get(self.point_index(&feature.0)?)?)?;
                let to = (*reference_points.get(self.point_index(&feature.1)?)?)?;
                let mutated = mutations.move_by(from as isize).apply(reference)?;
                let end = to.checked_add_signed(mutations.length_delta())?;
                mutated.get(from..end).map(<[u8]>::to_vec)
            }
        }
    }
}

impl LibraryWriter for GermlineLibrary {
    fn write_sequence_part(&mut self, accession: &str, offset: usize, sequence: &[u8]) -> Result<()> {
        let stored = self.sequences.entry(accession.to_string()).or_default();
        if stored.len() != offset {
            bail!(
                "sequence part for '{}' written at offset {} but {} bases are stored",
                accession,
                offset,
                stored.len()
            );
        }
        stored.extend_from_slice(sequence);
        Ok(())
    }

    fn write_allele(&mut self, allele: LibraryAllele) -> Result<()> {
        if self.allele(&allele.name).is_some() {
            bail!("allele '{}' written twice", allele.name);
        }
        self.alleles.push(allele);
        Ok(())
    }
}
