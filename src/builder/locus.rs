use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 免疫受体基因座
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locus {
    TRA,
    TRB,
    TRG,
    TRD,
    IGH,
    IGK,
    IGL,
}

impl Locus {
    pub const ALL: [Locus; 7] = [Locus::TRA, Locus::TRB, Locus::TRG, Locus::TRD, Locus::IGH, Locus::IGK, Locus::IGL];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locus::TRA => "TRA",
            Locus::TRB => "TRB",
            Locus::TRG => "TRG",
            Locus::TRD => "TRD",
            Locus::IGH => "IGH",
            Locus::IGK => "IGK",
            Locus::IGL => "IGL",
        }
    }

    /// TRD 基因位于 TRA 基因座内，两者互相接受
    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            Locus::TRA | Locus::TRD => name.eq_ignore_ascii_case("TRA") || name.eq_ignore_ascii_case("TRD"),
            _ => name.eq_ignore_ascii_case(self.as_str()),
        }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locus::ALL
            .iter()
            .copied()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown locus '{}', expected one of TRA TRB TRG TRD IGH IGK IGL", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneType {
    #[serde(rename = "V", alias = "Variable")]
    Variable,
    #[serde(rename = "D", alias = "Diversity")]
    Diversity,
    #[serde(rename = "J", alias = "Joining")]
    Joining,
    #[serde(rename = "C", alias = "Constant")]
    Constant,
}

impl GeneType {
    pub fn letter(&self) -> char {
        match self {
            GeneType::Variable => 'V',
            GeneType::Diversity => 'D',
            GeneType::Joining => 'J',
            GeneType::Constant => 'C',
        }
    }
}

impl fmt::Display for GeneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeneType::Variable => "Variable",
            GeneType::Diversity => "Diversity",
            GeneType::Joining => "Joining",
            GeneType::Constant => "Constant",
        };
        f.write_str(name)
    }
}
