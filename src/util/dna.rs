/// 标准遗传密码表，按 TCAG 顺序排列（索引 = 16*b1 + 4*b2 + b3）
const CODON_TABLE: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

/// 不完整密码子对应的氨基酸占位符
pub const INCOMPLETE_CODON: u8 = b'_';

#[inline]
fn tcag_index(b: u8) -> Option<usize> {
    match b.to_ascii_uppercase() {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

#[inline]
pub fn is_definite_nucleotide(b: u8) -> bool {
    matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}

/// `ACGT` 以外的字母（包括 IUPAC 简并碱基）都视为通配符
pub fn contains_wildcards(seq: &[u8]) -> bool {
    seq.iter().any(|&b| !is_definite_nucleotide(b))
}

/// 翻译单个密码子；含非确定碱基时返回 `X`
pub fn translate_codon(codon: &[u8]) -> u8 {
    if codon.len() != 3 {
        return INCOMPLETE_CODON;
    }
    match (tcag_index(codon[0]), tcag_index(codon[1]), tcag_index(codon[2])) {
        (Some(a), Some(b), Some(c)) => CODON_TABLE[a * 16 + b * 4 + c],
        _ => b'X',
    }
}

/// 以某个核酸位置为起点的阅读框，起点之前允许存在不完整的密码子
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslationFrame {
    /// 开头不完整密码子的长度（`anchor % 3`）
    pub lead: usize,
}

impl TranslationFrame {
    pub fn with_incomplete_codon(anchor: usize) -> Self {
        Self { lead: anchor % 3 }
    }

    /// 核酸位置 `pos` 所在密码子的氨基酸下标
    #[inline]
    pub fn aa_position(&self, pos: usize) -> usize {
        if self.lead == 0 {
            pos / 3
        } else if pos < self.lead {
            0
        } else {
            (pos - self.lead) / 3 + 1
        }
    }

    /// 长度为 `len` 的序列中第 `aa` 个氨基酸对应的核酸区间 `[start, end)`
    pub fn codon_range(&self, aa: usize, len: usize) -> (usize, usize) {
        if self.lead > 0 && aa == 0 {
            return (0, self.lead.min(len));
        }
        let k = if self.lead > 0 { aa - 1 } else { aa };
        let start = (self.lead + 3 * k).min(len);
        (start, (start + 3).min(len))
    }

    /// 长度为 `len` 的序列翻译得到的氨基酸数
    pub fn aa_len(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.aa_position(len - 1) + 1
    }
}

/// 按给定阅读框翻译核酸序列，首尾不完整密码子以 `_` 表示
pub fn translate(seq: &[u8], frame: TranslationFrame) -> Vec<u8> {
    let n = frame.aa_len(seq.len());
    let mut out = Vec::with_capacity(n);
    for aa in 0..n {
        let (s, e) = frame.codon_range(aa, seq.len());
        out.push(translate_codon(&seq[s..e]));
    }
    out
}

pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq {
        let up = b.to_ascii_uppercase();
        out.push(if up == b'U' { b'T' } else { up });
    }
    out
}
