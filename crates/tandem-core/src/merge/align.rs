//! Greedy diagonal alignment of two token sequences
//!
//! From the current cursors `(i, j)` the search walks diagonals
//! `d = 0, 1, 2, ...` and on each one probes offsets `(k, d - k)` for
//! `k = d, d - 1, ..., 0`. The first equal pair wins: everything skipped before
//! it becomes a deleted or inserted run, the pair is emitted once, and the
//! search restarts at `d = 0` past the match. This is not a minimum edit
//! distance diff and must stay greedy; merged output depends on it.

use super::token::Token;

/// One piece of the aligned result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Present in both versions
    Common(Token),
    /// Only in the first version
    Deleted(Vec<Token>),
    /// Only in the second version
    Inserted(Vec<Token>),
}

/// Align `first` against `second`.
///
/// Empty runs are not emitted.
pub fn align(first: &[Token], second: &[Token]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while let Some((k, l)) = next_match(first, second, i, j) {
        push_run(&mut segments, Segment::Deleted, &first[i..i + k]);
        push_run(&mut segments, Segment::Inserted, &second[j..j + l]);
        segments.push(Segment::Common(first[i + k].clone()));
        i += k + 1;
        j += l + 1;
    }

    push_run(&mut segments, Segment::Deleted, &first[i..]);
    push_run(&mut segments, Segment::Inserted, &second[j..]);
    segments
}

/// Offsets `(k, l)` of the first match found from `(i, j)`.
///
/// Returns `None` once a diagonal has no pair inside both sequences.
fn next_match(first: &[Token], second: &[Token], i: usize, j: usize) -> Option<(usize, usize)> {
    let remaining_first = first.len().saturating_sub(i);
    let remaining_second = second.len().saturating_sub(j);

    let mut d = 0;
    loop {
        let mut probed = false;
        for k in (0..=d).rev() {
            let l = d - k;
            if k >= remaining_first || l >= remaining_second {
                continue;
            }
            probed = true;
            if first[i + k] == second[j + l] {
                return Some((k, l));
            }
        }
        if !probed {
            return None;
        }
        d += 1;
    }
}

fn push_run(segments: &mut Vec<Segment>, wrap: fn(Vec<Token>) -> Segment, run: &[Token]) {
    if !run.is_empty() {
        segments.push(wrap(run.to_vec()));
    }
}
