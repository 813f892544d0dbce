use serde::{Deserialize, Serialize};

use super::mutations::{Mutation, Mutations};

const NEG_INF: i32 = i32::MIN / 4;

/// 仿射间隙打分参数（罚分均为正数）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignScoring {
    pub match_score: i32,
    pub mismatch_penalty: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for AlignScoring {
    /// 线性缺口打分：长度为 k 的缺口罚分为 `k * gap_extend`
    fn default() -> Self {
        Self {
            match_score: 5,
            mismatch_penalty: 9,
            gap_open: 0,
            gap_extend: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalAlignment {
    pub score: i32,
    /// 把 `reference` 变为 `query` 的突变，参考序列坐标
    pub mutations: Mutations,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    H,
    E,
    F,
}

/// DP 工作缓冲区，可跨调用复用
pub struct AlignBuffer {
    h: Vec<i32>,
    e: Vec<i32>,
    f: Vec<i32>,
}

impl AlignBuffer {
    pub fn new() -> Self {
        Self {
            h: Vec::new(),
            e: Vec::new(),
            f: Vec::new(),
        }
    }

    fn resize(&mut self, size: usize) {
        self.h.clear();
        self.e.clear();
        self.f.clear();
        self.h.resize(size, 0);
        self.e.resize(size, NEG_INF);
        self.f.resize(size, NEG_INF);
    }
}

impl Default for AlignBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// 仿射间隙全局比对（Gotoh），返回把 `reference` 变为 `query` 的突变集合
pub fn align_global(reference: &[u8], query: &[u8], p: &AlignScoring) -> GlobalAlignment {
    align_global_with_buf(reference, query, p, &mut AlignBuffer::new())
}

pub fn align_global_with_buf(reference: &[u8], query: &[u8], p: &AlignScoring, buf: &mut AlignBuffer) -> GlobalAlignment {
    let n = reference.len();
    let m = query.len();
    let cols = m + 1;

    buf.resize((n + 1) * cols);
    let h = &mut buf.h;
    let e = &mut buf.e;
    let f = &mut buf.f;

    // e: ends with a deletion (consumes reference), f: ends with an insertion (consumes query)
    for i in 1..=n {
        h[i * cols] = -(p.gap_open + i as i32 * p.gap_extend);
        e[i * cols] = h[i * cols];
    }
    for j in 1..=m {
        h[j] = -(p.gap_open + j as i32 * p.gap_extend);
        f[j] = h[j];
    }

    for i in 1..=n {
        for j in 1..=m {
            let idx = i * cols + j;
            let up_idx = (i - 1) * cols + j;
            let left_idx = i * cols + (j - 1);
            let diag_idx = (i - 1) * cols + (j - 1);

            e[idx] = (h[up_idx] - p.gap_open - p.gap_extend).max(e[up_idx] - p.gap_extend);
            f[idx] = (h[left_idx] - p.gap_open - p.gap_extend).max(f[left_idx] - p.gap_extend);

            let subst = if reference[i - 1] == query[j - 1] {
                p.match_score
            } else {
                -p.mismatch_penalty
            };
            h[idx] = (h[diag_idx] + subst).max(e[idx]).max(f[idx]);
        }
    }

    let score = h[n * cols + m];

    // backtrack from the bottom-right cell
    let mut ops: Vec<Mutation> = Vec::new();
    let mut i = n;
    let mut j = m;
    let mut state = State::H;
    while i > 0 || j > 0 {
        if i == 0 {
            ops.push(Mutation::Insertion { pos: 0, to: query[j - 1] });
            j -= 1;
            continue;
        }
        if j == 0 {
            ops.push(Mutation::Deletion { pos: i - 1, from: reference[i - 1] });
            i -= 1;
            continue;
        }
        let idx = i * cols + j;
        match state {
            State::H => {
                let diag_idx = (i - 1) * cols + (j - 1);
                let (r, q) = (reference[i - 1], query[j - 1]);
                let subst = if r == q { p.match_score } else { -p.mismatch_penalty };
                if h[idx] == h[diag_idx] + subst {
                    if r != q {
                        ops.push(Mutation::Substitution { pos: i - 1, from: r, to: q });
                    }
                    i -= 1;
                    j -= 1;
                } else if h[idx] == e[idx] {
                    state = State::E;
                } else {
                    state = State::F;
                }
            }
            State::E => {
                let up_idx = (i - 1) * cols + j;
                if e[idx] == h[up_idx] - p.gap_open - p.gap_extend {
                    state = State::H;
                }
                ops.push(Mutation::Deletion { pos: i - 1, from: reference[i - 1] });
                i -= 1;
            }
            State::F => {
                let left_idx = i * cols + (j - 1);
                if f[idx] == h[left_idx] - p.gap_open - p.gap_extend {
                    state = State::H;
                }
                ops.push(Mutation::Insertion { pos: i, to: query[j - 1] });
                j -= 1;
            }
        }
    }
    ops.reverse();

    let mut mutations = Mutations::new();
    for op in ops {
        mutations.push(op);
    }
    GlobalAlignment { score, mutations }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(reference: &[u8], query: &[u8]) -> GlobalAlignment {
        let aln = align_global(reference, query, &AlignScoring::default());
        assert_eq!(aln.mutations.apply(reference).unwrap(), query.to_vec());
        aln
    }

    #[test]
    fn identical_sequences_have_no_mutations() {
        let aln = roundtrip(b"ACGTACGT", b"ACGTACGT");
        assert!(aln.mutations.is_empty());
        assert_eq!(aln.score, 40);
    }

    #[test]
    fn single_mismatch() {
        let aln = roundtrip(b"ACGTACGT", b"ACGAACGT");
        assert_eq!(aln.mutations.to_string(), "S3:T>A");
        assert_eq!(aln.score, 7 * 5 - 9);
    }

    #[test]
    fn insertion_and_deletion() {
        let aln = roundtrip(b"ACGTTTGCAA", b"ACGTTTTGCAA");
        assert_eq!(aln.mutations.length_delta(), 1);
        let aln = roundtrip(b"ACGTTTGCAA", b"ACGTTGCAA");
        assert_eq!(aln.mutations.length_delta(), -1);
    }

    #[test]
    fn empty_sides() {
        let aln = roundtrip(b"", b"ACG");
        assert_eq!(aln.mutations.to_string(), "I0:A,I0:C,I0:G");
        let aln = roundtrip(b"ACG", b"");
        assert_eq!(aln.mutations.to_string(), "D0:A,D1:C,D2:G");
        assert!(roundtrip(b"", b"").mutations.is_empty());
    }

    #[test]
    fn affine_gaps_prefer_one_long_gap() {
        let p = AlignScoring { match_score: 2, mismatch_penalty: 4, gap_open: 6, gap_extend: 1 };
        let reference = b"AAAACCCCGGGGTTTT";
        let query = b"AAAAGGGGTTTT";
        let aln = align_global(reference, query, &p);
        assert_eq!(aln.mutations.apply(reference).unwrap(), query.to_vec());
        assert_eq!(aln.mutations.len(), 4);
        assert!(aln.mutations.iter().all(|m| matches!(m, Mutation::Deletion { .. })));
    }

    #[test]
    fn buffer_reuse() {
        let p = AlignScoring::default();
        let mut buf = AlignBuffer::new();
        let a1 = align_global_with_buf(b"ACGTACGT", b"ACGTACGT", &p, &mut buf);
        assert!(a1.mutations.is_empty());
        let a2 = align_global_with_buf(b"ACG", b"AGG", &p, &mut buf);
        assert_eq!(a2.mutations.to_string(), "S1:C>G");
    }
}
