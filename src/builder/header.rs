use regex::Regex;
use std::sync::OnceLock;

use super::error::{BuildError, Diagnostics};
use super::locus::Locus;
use super::params::BuilderParams;

/// 标准等位基因名：`<基因座><基因类型字母><其余部分>*<等位基因编号>`
const ALLELE_NAME_PATTERN: &str = r"(?i)^((IG[HKL]|TR[ABDG])([VDJC])[A-Za-z0-9\-/().]*)\*[0-9]+$";
const GENE_NAME_GROUP: usize = 1;
const LOCUS_GROUP: usize = 2;
const GENE_TYPE_LETTER_GROUP: usize = 3;

fn allele_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ALLELE_NAME_PATTERN).expect("allele name pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
    pub allele_name: String,
    pub gene_name: String,
    pub is_functional: bool,
    /// 未配置参考等位基因模式时为 None
    pub explicit_reference: Option<bool>,
}

/// 从 FASTA 头部提取等位基因名、基因名及标记；基因座或基因类型不一致只产生警告
pub fn resolve(
    header: &str,
    locus: Locus,
    params: &BuilderParams,
    diagnostics: &mut Diagnostics,
) -> Result<ParsedHeader, BuildError> {
    let mut allele_name = params
        .allele_name_pattern
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| BuildError::HeaderPatternMismatch { header: header.to_string() })?;

    let gene_name = match allele_name_regex().captures(&allele_name) {
        Some(caps) => {
            if !locus.matches_name(&caps[LOCUS_GROUP]) {
                diagnostics.warning(format!("Allele from different locus(?): {}", allele_name));
            }
            let letter = caps[GENE_TYPE_LETTER_GROUP].to_ascii_uppercase();
            if !letter.starts_with(params.gene_type.letter()) {
                diagnostics.warning(format!("Allele of different gene type(?): {}", allele_name));
            }
            caps[GENE_NAME_GROUP].to_string()
        }
        None if params.allow_non_standard_names => {
            let gene_name = allele_name.clone();
            allele_name.push_str("*00");
            diagnostics.error(format!(
                "Allele name doesn't match standard pattern: {}. Changed to: {}",
                gene_name, allele_name
            ));
            gene_name
        }
        None => return Err(BuildError::NonStandardAlleleName { name: allele_name }),
    };

    Ok(ParsedHeader {
        allele_name,
        gene_name,
        is_functional: params.functional_pattern.is_match(header),
        explicit_reference: params.reference_pattern.as_ref().map(|p| p.is_match(header)),
    })
}
