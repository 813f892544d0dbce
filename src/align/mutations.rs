use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::util::dna::{self, TranslationFrame};

/// 单个编辑操作，坐标为参考序列坐标。
/// `Insertion { pos }` 表示插入在参考序列第 `pos` 个字母之前。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mutation {
    Substitution { pos: usize, from: u8, to: u8 },
    Deletion { pos: usize, from: u8 },
    Insertion { pos: usize, to: u8 },
}

impl Mutation {
    #[inline]
    pub fn position(&self) -> usize {
        match *self {
            Mutation::Substitution { pos, .. } | Mutation::Deletion { pos, .. } | Mutation::Insertion { pos, .. } => pos,
        }
    }

    #[inline]
    pub fn length_delta(&self) -> isize {
        match self {
            Mutation::Substitution { .. } => 0,
            Mutation::Deletion { .. } => -1,
            Mutation::Insertion { .. } => 1,
        }
    }

    #[inline]
    pub fn is_insertion(&self) -> bool {
        matches!(self, Mutation::Insertion { .. })
    }

    fn at(self, new_pos: usize) -> Self {
        match self {
            Mutation::Substitution { from, to, .. } => Mutation::Substitution { pos: new_pos, from, to },
            Mutation::Deletion { from, .. } => Mutation::Deletion { pos: new_pos, from },
            Mutation::Insertion { to, .. } => Mutation::Insertion { pos: new_pos, to },
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Mutation::Substitution { pos, from, to } => write!(f, "S{}:{}>{}", pos, from as char, to as char),
            Mutation::Deletion { pos, from } => write!(f, "D{}:{}", pos, from as char),
            Mutation::Insertion { pos, to } => write!(f, "I{}:{}", pos, to as char),
        }
    }
}

/// 突变集合：按位置排序，同一位置上插入排在前面
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mutations {
    muts: Vec<Mutation>,
}

impl Mutations {
    pub fn new() -> Self {
        Self { muts: Vec::new() }
    }

    pub fn from_vec(mut muts: Vec<Mutation>) -> Self {
        // stable: keeps the order of consecutive insertions
        muts.sort_by_key(|m| (m.position(), !m.is_insertion()));
        Self { muts }
    }

    pub fn push(&mut self, m: Mutation) {
        self.muts.push(m);
    }

    pub fn as_slice(&self) -> &[Mutation] {
        &self.muts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mutation> {
        self.muts.iter()
    }

    pub fn len(&self) -> usize {
        self.muts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.muts.is_empty()
    }

    /// 追加另一组（位置不小于当前末尾的）突变
    pub fn append(&mut self, other: &Mutations) {
        self.muts.extend_from_slice(&other.muts);
    }

    /// 整体平移坐标
    pub fn move_by(&self, delta: isize) -> Mutations {
        Mutations {
            muts: self
                .muts
                .iter()
                .map(|m| m.at(m.position().saturating_add_signed(delta)))
                .collect(),
        }
    }

    pub fn length_delta(&self) -> isize {
        self.muts.iter().map(Mutation::length_delta).sum()
    }

    /// 将突变应用到 `seq` 上。位置乱序、越界，或记录的参考字母与 `seq` 不符时返回 None。
    pub fn apply(&self, seq: &[u8]) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(seq.len().saturating_add_signed(self.length_delta()));
        let mut cursor = 0usize;
        for m in &self.muts {
            let p = m.position();
            if p < cursor || p > seq.len() {
                return None;
            }
            out.extend_from_slice(&seq[cursor..p]);
            cursor = p;
            match *m {
                Mutation::Insertion { to, .. } => out.push(to),
                Mutation::Deletion { from, .. } => {
                    if seq.get(p) != Some(&from) {
                        return None;
                    }
                    cursor += 1;
                }
                Mutation::Substitution { from, to, .. } => {
                    if seq.get(p) != Some(&from) {
                        return None;
                    }
                    out.push(to);
                    cursor += 1;
                }
            }
        }
        out.extend_from_slice(&seq[cursor..]);
        Some(out)
    }

    /// 丢弃落在给定区间内的突变，其余突变按区间被切除后的坐标平移
    pub fn remove_in_ranges(&self, ranges: &[Range<usize>]) -> Mutations {
        let mut sorted: Vec<Range<usize>> = ranges.to_vec();
        sorted.sort_by_key(|r| r.start);
        let mut out = Vec::with_capacity(self.muts.len());
        for m in &self.muts {
            let p = m.position();
            let inside = sorted.iter().any(|r| {
                if m.is_insertion() {
                    r.start < p && p < r.end
                } else {
                    r.contains(&p)
                }
            });
            if inside {
                continue;
            }
            let shift: usize = sorted.iter().filter(|r| r.end <= p).map(|r| r.len()).sum();
            out.push(m.at(p - shift));
        }
        Mutations { muts: out }
    }
}

impl fmt::Display for Mutations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, m) in self.muts.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", m)?;
        }
        Ok(())
    }
}

/// 将核酸突变转换为氨基酸突变。
///
/// 突变按密码子分组：每组累积的长度变化必须是 3 的倍数；移码若在
/// `max_shifted_triplets` 个密码子内得不到补偿，或插入/缺失落在不完整密码子上，
/// 则结果不确定，返回 None。
pub fn nt_to_aa(
    reference: &[u8],
    mutations: &Mutations,
    frame: TranslationFrame,
    max_shifted_triplets: usize,
) -> Option<Mutations> {
    let len = reference.len();
    let ref_aa = dna::translate(reference, frame);
    let codon_of = |pos: usize| -> usize {
        if len == 0 {
            0
        } else {
            frame.aa_position(pos.min(len - 1))
        }
    };

    let muts = mutations.as_slice();
    let mut result = Mutations::new();
    let mut i = 0usize;
    while i < muts.len() {
        let first_codon = codon_of(muts[i].position());
        let mut last_codon = first_codon;
        let mut delta = 0isize;
        let mut j = i;
        loop {
            delta += muts[j].length_delta();
            last_codon = last_codon.max(codon_of(muts[j].position()));
            j += 1;
            if j == muts.len() {
                break;
            }
            let next_codon = codon_of(muts[j].position());
            if delta % 3 == 0 && next_codon > last_codon {
                break;
            }
            if delta % 3 != 0 && next_codon > first_codon + max_shifted_triplets {
                return None;
            }
        }
        if delta % 3 != 0 {
            return None;
        }

        let (start, _) = frame.codon_range(first_codon, len);
        let (last_start, end) = frame.codon_range(last_codon, len);
        let touches_incomplete = (frame.lead > 0 && first_codon == 0) || end - last_start < 3;
        if touches_incomplete && delta != 0 {
            return None;
        }

        let block = Mutations { muts: muts[i..j].to_vec() }.move_by(-(start as isize));
        let mutated = block.apply(&reference[start..end])?;
        let block_frame = TranslationFrame { lead: if start == 0 { frame.lead } else { 0 } };
        let mutated_aa = dna::translate(&mutated, block_frame);
        let ref_block = ref_aa.get(first_codon..=last_codon).unwrap_or(&[]);
        diff_block(ref_block, &mutated_aa, first_codon, &mut result);

        i = j;
    }
    Some(result)
}

// Describes `b` relative to `a` as substitutions followed by a tail of
// deletions or insertions, after trimming the common prefix and suffix.
fn diff_block(a: &[u8], b: &[u8], offset: usize, out: &mut Mutations) {
    let mut pre = 0;
    while pre < a.len() && pre < b.len() && a[pre] == b[pre] {
        pre += 1;
    }
    let mut suf = 0;
    while suf < a.len() - pre && suf < b.len() - pre && a[a.len() - 1 - suf] == b[b.len() - 1 - suf] {
        suf += 1;
    }
    let am = &a[pre..a.len() - suf];
    let bm = &b[pre..b.len() - suf];
    let base = offset + pre;
    let common = am.len().min(bm.len());
    for k in 0..common {
        if am[k] != bm[k] {
            out.push(Mutation::Substitution { pos: base + k, from: am[k], to: bm[k] });
        }
    }
    for (k, &from) in am.iter().enumerate().skip(common) {
        out.push(Mutation::Deletion { pos: base + k, from });
    }
    for &to in &bm[common..] {
        out.push(Mutation::Insertion { pos: base + common, to });
    }
}
