//! 多条突变集合相对同一条主序列的并排排版。
//!
//! 匹配显示为 `.`，替换显示为查询字母，缺口显示为 `-`。
//! 插入列为所有行共享：某一行在其他行插入的列上没有插入时显示 `-`。

use std::ops::Range;

use super::mutations::{Mutation, Mutations};

/// 一行查询：主序列坐标下的突变集合，覆盖 `range`
pub struct AlignedQuery<'a> {
    pub title: String,
    pub mutations: &'a Mutations,
    pub range: Range<usize>,
}

#[derive(Clone, Copy)]
enum Column {
    Insertion(usize, usize),
    Subject(usize),
}

struct Row {
    title: String,
    chars: Vec<u8>,
    positions: Vec<Option<usize>>,
}

pub struct MultiAlignment {
    subject: Row,
    queries: Vec<Row>,
    columns: Vec<Column>,
    /// （列号, 标签）
    markers: Vec<(usize, String)>,
}

impl MultiAlignment {
    pub fn build(subject_title: &str, subject: &[u8], range: Range<usize>, queries: &[AlignedQuery<'_>]) -> Self {
        let start = range.start;
        let end = range.end.min(subject.len()).max(start);
        let span = end - start;

        // per query: inserted letters before each subject position, and the edit at that position
        let mut layouts: Vec<(Vec<Vec<u8>>, Vec<Option<Mutation>>)> = Vec::with_capacity(queries.len());
        let mut max_ins = vec![0usize; span + 1];
        for q in queries {
            let mut ins: Vec<Vec<u8>> = vec![Vec::new(); span + 1];
            let mut point: Vec<Option<Mutation>> = vec![None; span];
            for m in q.mutations.iter() {
                let p = m.position();
                if p < start || p > end {
                    continue;
                }
                match *m {
                    Mutation::Insertion { to, .. } => ins[p - start].push(to),
                    _ if p < end => point[p - start] = Some(*m),
                    _ => {}
                }
            }
            for (k, letters) in ins.iter().enumerate() {
                max_ins[k] = max_ins[k].max(letters.len());
            }
            layouts.push((ins, point));
        }

        let mut columns = Vec::new();
        for p in start..=end {
            for k in 0..max_ins[p - start] {
                columns.push(Column::Insertion(p, k));
            }
            if p < end {
                columns.push(Column::Subject(p));
            }
        }

        let mut subject_row = Row {
            title: subject_title.to_string(),
            chars: Vec::with_capacity(columns.len()),
            positions: Vec::with_capacity(columns.len()),
        };
        for &c in &columns {
            match c {
                Column::Insertion(..) => {
                    subject_row.chars.push(b'-');
                    subject_row.positions.push(None);
                }
                Column::Subject(p) => {
                    subject_row.chars.push(subject[p]);
                    subject_row.positions.push(Some(p));
                }
            }
        }

        let mut rows = Vec::with_capacity(queries.len());
        for (q, (ins, point)) in queries.iter().zip(&layouts) {
            let (s, e) = (q.range.start, q.range.end);
            let mut row = Row {
                title: q.title.clone(),
                chars: Vec::with_capacity(columns.len()),
                positions: Vec::with_capacity(columns.len()),
            };
            let mut qpos = 0usize;
            for &c in &columns {
                let (ch, pos) = match c {
                    Column::Insertion(p, _) if p < s || p > e => (b' ', None),
                    Column::Insertion(p, k) => match ins[p - start].get(k) {
                        Some(&letter) => {
                            qpos += 1;
                            (letter, Some(qpos - 1))
                        }
                        None => (b'-', None),
                    },
                    Column::Subject(p) if p < s || p >= e => (b' ', None),
                    Column::Subject(p) => match point[p - start] {
                        Some(Mutation::Deletion { .. }) => (b'-', None),
                        Some(Mutation::Substitution { to, .. }) => {
                            qpos += 1;
                            (to, Some(qpos - 1))
                        }
                        _ => {
                            qpos += 1;
                            (b'.', Some(qpos - 1))
                        }
                    },
                };
                row.chars.push(ch);
                row.positions.push(pos);
            }
            rows.push(row);
        }

        Self {
            subject: subject_row,
            queries: rows,
            columns,
            markers: Vec::new(),
        }
    }

    /// 在主序列位置上添加带标签的标记；位于显示区间末端的标记画在最后一列之后
    pub fn draw_points(&mut self, points: &[(String, usize)]) {
        for (name, pos) in points {
            let column = self
                .columns
                .iter()
                .position(|c| matches!(c, Column::Subject(p) if p == pos));
            let column = match column {
                Some(c) => Some(c),
                None if self.subject.positions.iter().flatten().last().map(|&l| l + 1) == Some(*pos) => {
                    Some(self.columns.len())
                }
                None => None,
            };
            if let Some(c) = column {
                self.markers.push((c, format!("<{}", name)));
            }
        }
        self.markers.sort();
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// 按行宽切分为若干块，每块为多行文本
    pub fn split(&self, width: usize) -> Vec<String> {
        let title_w = std::iter::once(&self.subject)
            .chain(&self.queries)
            .map(|r| r.title.len())
            .max()
            .unwrap_or(0);
        let max_pos = std::iter::once(&self.subject)
            .chain(&self.queries)
            .flat_map(|r| r.positions.iter().flatten())
            .max()
            .copied()
            .unwrap_or(0);
        let num_w = max_pos.to_string().len();
        let prefix_w = title_w + num_w + 2;
        let seq_w = width.saturating_sub(prefix_w + num_w + 1).max(10);

        let n = self.columns.len();
        let mut blocks = Vec::new();
        let mut c0 = 0usize;
        loop {
            let c1 = (c0 + seq_w).min(n);
            let last_block = c1 == n;
            let mut lines: Vec<String> = Vec::new();

            // marker rows: greedy placement, labels may run past the block edge
            let mut marker_rows: Vec<Vec<u8>> = Vec::new();
            for (col, label) in &self.markers {
                if *col < c0 || *col > c1 || (*col == c1 && !last_block) {
                    continue;
                }
                let at = col - c0;
                let needed = at + label.len() + 1;
                let slot = marker_rows
                    .iter()
                    .position(|row| row.iter().skip(at).take(label.len() + 1).all(|&b| b == b' '));
                let row = match slot {
                    Some(r) => &mut marker_rows[r],
                    None => {
                        marker_rows.push(Vec::new());
                        let last = marker_rows.len() - 1;
                        &mut marker_rows[last]
                    }
                };
                if row.len() < needed {
                    row.resize(needed, b' ');
                }
                row[at..at + label.len()].copy_from_slice(label.as_bytes());
            }
            for row in marker_rows {
                let text = String::from_utf8_lossy(&row);
                lines.push(format!("{:prefix_w$}{}", "", text.trim_end(), prefix_w = prefix_w));
            }

            for row in std::iter::once(&self.subject).chain(&self.queries) {
                lines.push(render_row(row, c0, c1, title_w, num_w));
            }
            blocks.push(lines.join("\n"));

            if last_block {
                break;
            }
            c0 = c1;
        }
        blocks
    }
}

fn render_row(row: &Row, c0: usize, c1: usize, title_w: usize, num_w: usize) -> String {
    let positions = &row.positions[c0..c1];
    let first = positions.iter().flatten().next();
    let last = positions.iter().flatten().last();
    let fmt_pos = |p: Option<&usize>| p.map(|v| v.to_string()).unwrap_or_default();
    let line = format!(
        "{:<tw$} {:>nw$} {} {}",
        row.title,
        fmt_pos(first),
        String::from_utf8_lossy(&row.chars[c0..c1]),
        fmt_pos(last),
        tw = title_w,
        nw = num_w,
    );
    line.trim_end().to_string()
}
