//! 编译参数
//!
//! 先从 TOML 文件读入 [`ParamsFile`]，再经校验与编译（正则表达式、参考点名称查找）
//! 得到 [`BuilderParams`]。
//!
//! ```toml
//! gene_type = "V"
//! allele_name_pattern = '^[^|]+\|([^|]+)\|'
//! functional_pattern = '^[^|]+\|[^|]+\|[^|]+\|F\|'
//! padding_char = "."
//! translation_point = "L1Begin"
//! noncoding_regions = [["L1End", "L2Begin"]]
//!
//! [[reference_points]]
//! name = "L1Begin"
//! position = "begin"
//!
//! [[reference_points]]
//! name = "CDR3Begin"
//! position = 309
//! pattern = 'TA[CT](TG[CT])'
//! ```

use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use super::anchor::{AnchorRule, ReferencePointSpec};
use super::error::{BuildError, ErrorPolicy};
use super::locus::GeneType;
use crate::align::AlignScoring;

pub const DEFAULT_CONSERVED_CYSTEINE_POINT: &str = "CDR3Begin";

fn default_padding() -> char {
    '.'
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentinel {
    Begin,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PositionEntry {
    Offset(usize),
    Sentinel(Sentinel),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferencePointEntry {
    pub name: String,
    #[serde(default)]
    pub position: Option<PositionEntry>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub pattern_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamsFile {
    pub gene_type: GeneType,
    pub allele_name_pattern: String,
    pub functional_pattern: String,
    #[serde(default)]
    pub reference_pattern: Option<String>,
    #[serde(default = "default_padding")]
    pub padding_char: char,
    #[serde(default = "default_true")]
    pub align_alleles: bool,
    #[serde(default)]
    pub first_occurred_allele_is_reference: bool,
    #[serde(default = "default_true")]
    pub exception_on_error: bool,
    #[serde(default)]
    pub allow_non_standard_names: bool,
    #[serde(default)]
    pub translation_point: Option<String>,
    #[serde(default)]
    pub conserved_cysteine_point: Option<String>,
    #[serde(default)]
    pub noncoding_regions: Vec<[String; 2]>,
    #[serde(default)]
    pub scoring: AlignScoring,
    pub reference_points: Vec<ReferencePointEntry>,
}

#[derive(Debug, Clone)]
pub struct BuilderParams {
    pub gene_type: GeneType,
    pub allele_name_pattern: Regex,
    pub functional_pattern: Regex,
    /// 未配置时，每个基因第一个出现的等位基因为参考
    pub reference_pattern: Option<Regex>,
    pub padding_char: u8,
    pub align_alleles: bool,
    pub first_occurred_allele_is_reference: bool,
    pub exception_on_error: bool,
    pub allow_non_standard_names: bool,
    pub reference_points: Vec<ReferencePointSpec>,
    pub translation_point: Option<usize>,
    pub conserved_cysteine_point: Option<usize>,
    /// 界定非编码区的参考点下标对
    pub noncoding_regions: Vec<(usize, usize)>,
    pub scoring: AlignScoring,
}

fn invalid(msg: impl Into<String>) -> BuildError {
    BuildError::InvalidParameters(msg.into())
}

fn compile_regex(what: &str, pattern: &str) -> Result<Regex, BuildError> {
    Regex::new(pattern).map_err(|e| invalid(format!("{}: {}", what, e)))
}

impl BuilderParams {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, BuildError> {
        let file: ParamsFile = toml::from_str(text).map_err(|e| invalid(e.to_string()))?;
        Self::compile(file)
    }

    pub fn compile(file: ParamsFile) -> Result<Self, BuildError> {
        let allele_name_pattern = compile_regex("allele_name_pattern", &file.allele_name_pattern)?;
        if allele_name_pattern.captures_len() < 2 {
            return Err(invalid("allele_name_pattern must contain a capture group"));
        }
        let functional_pattern = compile_regex("functional_pattern", &file.functional_pattern)?;
        let reference_pattern = file
            .reference_pattern
            .as_deref()
            .map(|p| compile_regex("reference_pattern", p))
            .transpose()?;

        if !file.padding_char.is_ascii() {
            return Err(invalid(format!("padding_char '{}' is not ASCII", file.padding_char)));
        }
        if file.reference_points.is_empty() {
            return Err(invalid("no reference points configured"));
        }

        let mut seen = HashSet::new();
        let mut reference_points = Vec::with_capacity(file.reference_points.len());
        for entry in &file.reference_points {
            if !seen.insert(entry.name.as_str()) {
                return Err(invalid(format!("duplicate reference point '{}'", entry.name)));
            }
            reference_points.push(ReferencePointSpec {
                name: entry.name.clone(),
                rule: compile_rule(entry)?,
            });
        }

        let index_of = |name: &str| -> Result<usize, BuildError> {
            reference_points
                .iter()
                .position(|s| s.name == name)
                .ok_or_else(|| invalid(format!("unknown reference point '{}'", name)))
        };

        let translation_point = file.translation_point.as_deref().map(index_of).transpose()?;
        let mut noncoding_regions = Vec::with_capacity(file.noncoding_regions.len());
        for [from, to] in &file.noncoding_regions {
            noncoding_regions.push((index_of(from)?, index_of(to)?));
        }

        let conserved_cysteine_point = match (&file.conserved_cysteine_point, file.gene_type) {
            (Some(name), _) => Some(index_of(name)?),
            (None, GeneType::Variable) => Some(index_of(DEFAULT_CONSERVED_CYSTEINE_POINT).map_err(|_| {
                invalid(format!(
                    "Variable genes need the '{}' reference point for the conserved Cys check",
                    DEFAULT_CONSERVED_CYSTEINE_POINT
                ))
            })?),
            (None, _) => None,
        };

        Ok(Self {
            gene_type: file.gene_type,
            allele_name_pattern,
            functional_pattern,
            reference_pattern,
            // 序列读入时已转为大写
            padding_char: file.padding_char.to_ascii_uppercase() as u8,
            align_alleles: file.align_alleles,
            first_occurred_allele_is_reference: file.first_occurred_allele_is_reference,
            exception_on_error: file.exception_on_error,
            allow_non_standard_names: file.allow_non_standard_names,
            reference_points,
            translation_point,
            conserved_cysteine_point,
            noncoding_regions,
            scoring: file.scoring,
        })
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        ErrorPolicy { exception_on_error: self.exception_on_error }
    }

    pub fn point_count(&self) -> usize {
        self.reference_points.len()
    }

    pub fn point_index(&self, name: &str) -> Option<usize> {
        self.reference_points.iter().position(|s| s.name == name)
    }

    pub fn point_name(&self, index: usize) -> &str {
        &self.reference_points[index].name
    }

    pub fn point_names(&self) -> Vec<String> {
        self.reference_points.iter().map(|s| s.name.clone()).collect()
    }
}

fn compile_rule(entry: &ReferencePointEntry) -> Result<AnchorRule, BuildError> {
    match (&entry.pattern, entry.position) {
        (Some(_), Some(PositionEntry::Sentinel(_))) => Err(invalid(format!(
            "reference point '{}' combines a pattern with a sequence boundary",
            entry.name
        ))),
        (Some(pattern), position) => {
            let regex = regex::bytes::Regex::new(pattern)
                .map_err(|e| invalid(format!("pattern of '{}': {}", entry.name, e)))?;
            if regex.captures_len() < 2 {
                return Err(invalid(format!("pattern of '{}' must contain a capture group", entry.name)));
            }
            let fallback = match position {
                Some(PositionEntry::Offset(o)) if !entry.pattern_only => Some(o),
                _ => None,
            };
            Ok(AnchorRule::Pattern { regex, fallback })
        }
        (None, _) if entry.pattern_only => Err(invalid(format!(
            "reference point '{}' is pattern_only but has no pattern",
            entry.name
        ))),
        (None, Some(PositionEntry::Sentinel(Sentinel::Begin))) => Ok(AnchorRule::Begin),
        (None, Some(PositionEntry::Sentinel(Sentinel::End))) => Ok(AnchorRule::End),
        (None, Some(PositionEntry::Offset(o))) => Ok(AnchorRule::Offset(o)),
        (None, None) => Ok(AnchorRule::Absent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
gene_type = "J"
allele_name_pattern = '^([^ ]+)'
functional_pattern = ' F$'
"#;

    fn with_points(points: &str) -> String {
        format!("{}\n{}", BASE, points)
    }

    #[test]
    fn parse_all_anchor_kinds() {
        let text = with_points(
            r#"
[[reference_points]]
name = "JBegin"
position = "begin"

[[reference_points]]
name = "FR4Begin"
position = 30
pattern = '(TT[CT]GG)'

[[reference_points]]
name = "Strict"
position = 12
pattern = '(GG)'
pattern_only = true

[[reference_points]]
name = "Mid"
position = 7

[[reference_points]]
name = "Unused"

[[reference_points]]
name = "JEnd"
position = "end"
"#,
        );
        let p = BuilderParams::from_toml_str(&text).unwrap();
        assert_eq!(p.point_count(), 6);
        assert!(matches!(p.reference_points[0].rule, AnchorRule::Begin));
        assert!(matches!(p.reference_points[1].rule, AnchorRule::Pattern { fallback: Some(30), .. }));
        assert!(matches!(p.reference_points[2].rule, AnchorRule::Pattern { fallback: None, .. }));
        assert!(matches!(p.reference_points[3].rule, AnchorRule::Offset(7)));
        assert!(matches!(p.reference_points[4].rule, AnchorRule::Absent));
        assert!(matches!(p.reference_points[5].rule, AnchorRule::End));
        assert_eq!(p.padding_char, b'.');
        assert!(p.align_alleles);
        assert!(p.exception_on_error);
        assert!(p.reference_pattern.is_none());
        assert_eq!(p.conserved_cysteine_point, None);
        assert_eq!(p.scoring, AlignScoring::default());
        assert_eq!(p.point_index("JEnd"), Some(5));
    }

    #[test]
    fn variable_genes_require_cysteine_anchor() {
        let text = r#"
gene_type = "V"
allele_name_pattern = '^([^ ]+)'
functional_pattern = ' F$'

[[reference_points]]
name = "VBegin"
position = "begin"
"#;
        assert!(matches!(BuilderParams::from_toml_str(text), Err(BuildError::InvalidParameters(_))));
    }

    #[test]
    fn rejects_unknown_names_and_bad_patterns() {
        let unknown = format!(
            "translation_point = \"Nope\"\n{}",
            with_points("[[reference_points]]\nname = \"A\"\nposition = \"begin\"\n")
        );
        assert!(BuilderParams::from_toml_str(&unknown).is_err());

        let no_group = with_points("[[reference_points]]\nname = \"A\"\npattern = 'ACG'\n");
        assert!(BuilderParams::from_toml_str(&no_group).is_err());

        let sentinel_pattern = with_points("[[reference_points]]\nname = \"A\"\nposition = \"end\"\npattern = '(A)'\n");
        assert!(BuilderParams::from_toml_str(&sentinel_pattern).is_err());

        let duplicate = with_points(
            "[[reference_points]]\nname = \"A\"\nposition = 1\n[[reference_points]]\nname = \"A\"\nposition = 2\n",
        );
        assert!(BuilderParams::from_toml_str(&duplicate).is_err());
    }

    #[test]
    fn scoring_and_noncoding_regions() {
        let text = format!(
            "noncoding_regions = [[\"A\", \"B\"]]\n{}",
            with_points(
                "[scoring]\nmatch_score = 2\ngap_open = 3\n[[reference_points]]\nname = \"A\"\nposition = 1\n[[reference_points]]\nname = \"B\"\nposition = 5\n",
            )
        );
        let p = BuilderParams::from_toml_str(&text).unwrap();
        assert_eq!(p.noncoding_regions, vec![(0, 1)]);
        assert_eq!(p.scoring.match_score, 2);
        assert_eq!(p.scoring.gap_open, 3);
        assert_eq!(p.scoring.mismatch_penalty, AlignScoring::default().mismatch_penalty);
    }

    #[test]
    fn padding_char_is_upper_cased() {
        let text = format!(
            "padding_char = \"n\"\n{}",
            with_points("[[reference_points]]\nname = \"A\"\nposition = \"begin\"\n")
        );
        let p = BuilderParams::from_toml_str(&text).unwrap();
        assert_eq!(p.padding_char, b'N');
    }
}
