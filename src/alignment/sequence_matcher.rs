//! Diff-style alignment of two token sequences.
//!
//! Matching blocks are found by recursively taking the longest contiguous
//! common run and recursing on both sides of it, then turned into edit
//! opcodes covering both sequences end to end. No junk heuristics are
//! applied: every token participates in matching regardless of frequency.

use std::collections::HashMap;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// One edit step: `a[a_range]` corresponds to `b[b_range]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub a_range: Range<usize>,
    pub b_range: Range<usize>,
}

impl Opcode {
    /// Equal and same-length replace blocks can be paired position by position.
    pub fn is_positional(&self) -> bool {
        matches!(self.tag, OpTag::Equal | OpTag::Replace) && self.a_range.len() == self.b_range.len()
    }
}

/// Contiguous run where `a[a..a + size] == b[b..b + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBlock {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

pub struct SequenceMatcher<'a, T: Eq + std::hash::Hash> {
    a: &'a [T],
    b: &'a [T],
    b_index: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + std::hash::Hash> SequenceMatcher<'a, T> {
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b_index: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (j, item) in b.iter().enumerate() {
            b_index.entry(item).or_default().push(j);
        }
        Self { a, b, b_index }
    }

    /// Longest common run inside `a[alo..ahi]` x `b[blo..bhi]`; earliest in `a` wins ties,
    /// then earliest in `b`.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchBlock {
        let mut best = MatchBlock {
            a: alo,
            b: blo,
            size: 0,
        };
        // run length of the match ending at (i - 1, j), keyed by j
        let mut run_ending_at: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next_runs: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_ending_at.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_runs.insert(j, k);
                    if k > best.size {
                        best = MatchBlock {
                            a: i + 1 - k,
                            b: j + 1 - k,
                            size: k,
                        };
                    }
                }
            }
            run_ending_at = next_runs;
        }
        best
    }

    /// Non-overlapping matching blocks in increasing order, adjacent runs merged.
    /// Always ends with the sentinel `(len(a), len(b), 0)`.
    pub fn matching_blocks(&self) -> Vec<MatchBlock> {
        let (la, lb) = (self.a.len(), self.b.len());
        let mut pending = vec![(0, la, 0, lb)];
        let mut found = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            found.push(m);
            if alo < m.a && blo < m.b {
                pending.push((alo, m.a, blo, m.b));
            }
            if m.a + m.size < ahi && m.b + m.size < bhi {
                pending.push((m.a + m.size, ahi, m.b + m.size, bhi));
            }
        }
        found.sort_by_key(|m| (m.a, m.b));

        let mut merged: Vec<MatchBlock> = Vec::with_capacity(found.len() + 1);
        for m in found {
            match merged.last_mut() {
                Some(last) if last.a + last.size == m.a && last.b + last.size == m.b => {
                    last.size += m.size;
                }
                _ => merged.push(m),
            }
        }
        merged.push(MatchBlock {
            a: la,
            b: lb,
            size: 0,
        });
        merged
    }

    /// Edit script turning `a` into `b`, covering both sequences without gaps.
    pub fn opcodes(&self) -> Vec<Opcode> {
        let mut ops = Vec::new();
        let (mut i, mut j) = (0, 0);
        for m in self.matching_blocks() {
            let tag = match (i < m.a, j < m.b) {
                (true, true) => Some(OpTag::Replace),
                (true, false) => Some(OpTag::Delete),
                (false, true) => Some(OpTag::Insert),
                (false, false) => None,
            };
            if let Some(tag) = tag {
                ops.push(Opcode {
                    tag,
                    a_range: i..m.a,
                    b_range: j..m.b,
                });
            }
            i = m.a + m.size;
            j = m.b + m.size;
            if m.size > 0 {
                ops.push(Opcode {
                    tag: OpTag::Equal,
                    a_range: m.a..i,
                    b_range: m.b..j,
                });
            }
        }
        ops
    }
}
