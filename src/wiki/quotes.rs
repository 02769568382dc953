//! Apostrophe disambiguation
//!
//!     Runs of two or more apostrophes toggle italic (`''`) and bold (`'''`). Runs of other
//!     lengths are ambiguous: a run of four is a bold toggle with one literal apostrophe in front
//!     of it, or an italic toggle with two. Which reading is right depends on the other runs of
//!     the same line, so the whole line is decided at once.
//!
//!     The search is a shortest path over the four (bold, italic) states. Every run offers a
//!     small set of readings, each costing the number of apostrophes it gives back as literal
//!     text. Styles still open at the end of the line cost extra, so readings that close what
//!     they open win:
//!
//!         run length   readings (literal apostrophes, toggles)
//!         2            (0, italic)
//!         3            (0, bold) (1, italic)
//!         4            (1, bold) (2, italic)
//!         5            (0, bold + italic)
//!         n > 5        (n - 5, bold + italic)
//!
//!     Ties keep the reading listed first.

/// Cost of a style left open at the end of a line.
const UNCLOSED_COST: usize = 4;

/// The decision for one apostrophe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuoteState {
    /// Apostrophes given back as literal text in front of the run.
    pub apocount: usize,
    /// Bold is active after the run.
    pub is_bold: bool,
    /// Italic is active after the run.
    pub is_italic: bool,
}

#[derive(Debug, Clone, Copy)]
struct Reading {
    apocount: usize,
    bold: bool,
    italic: bool,
}

fn readings(count: usize) -> Vec<Reading> {
    let r = |apocount, bold, italic| Reading {
        apocount,
        bold,
        italic,
    };
    match count {
        0 | 1 => vec![r(count, false, false)],
        2 => vec![r(0, false, true)],
        3 => vec![r(0, true, false), r(1, false, true)],
        4 => vec![r(1, true, false), r(2, false, true)],
        n => vec![r(n - 5, true, true)],
    }
}

fn state_index(bold: bool, italic: bool) -> usize {
    (bold as usize) << 1 | italic as usize
}

fn state_flags(index: usize) -> (bool, bool) {
    (index & 2 != 0, index & 1 != 0)
}

/// Decide every run of one line.
///
/// `counts` are the run lengths in line order; the result has one entry per run.
pub fn compute_path(counts: &[usize]) -> Vec<QuoteState> {
    if counts.is_empty() {
        return Vec::new();
    }

    // best[i][s] = (cost, previous state, reading) of reaching state s after run i
    let mut best: Vec<[Option<(usize, usize, Reading)>; 4]> = Vec::with_capacity(counts.len());
    let mut costs: [Option<usize>; 4] = [Some(0), None, None, None];

    for &count in counts {
        let mut step: [Option<(usize, usize, Reading)>; 4] = [None; 4];
        for (prev, cost) in costs.iter().enumerate() {
            let Some(cost) = *cost else { continue };
            let (bold, italic) = state_flags(prev);
            for reading in readings(count) {
                let next = state_index(bold ^ reading.bold, italic ^ reading.italic);
                let total = cost + reading.apocount;
                let better = match step[next] {
                    Some((existing, _, _)) => total < existing,
                    None => true,
                };
                if better {
                    step[next] = Some((total, prev, reading));
                }
            }
        }
        costs = step.map(|entry| entry.map(|(cost, _, _)| cost));
        best.push(step);
    }

    let mut end = 0;
    let mut end_cost = usize::MAX;
    for (state, cost) in costs.iter().enumerate() {
        if let Some(cost) = cost {
            let (bold, italic) = state_flags(state);
            let total = cost + UNCLOSED_COST * (bold as usize + italic as usize);
            if total < end_cost {
                end_cost = total;
                end = state;
            }
        }
    }

    let mut path = vec![QuoteState::default(); counts.len()];
    let mut state = end;
    for (i, step) in best.iter().enumerate().rev() {
        let Some((_, prev, reading)) = step[state] else {
            debug_assert!(false, "quote path broken at run {}", i);
            break;
        };
        let (is_bold, is_italic) = state_flags(state);
        path[i] = QuoteState {
            apocount: reading.apocount,
            is_bold,
            is_italic,
        };
        state = prev;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn state(apocount: usize, is_bold: bool, is_italic: bool) -> QuoteState {
        QuoteState {
            apocount,
            is_bold,
            is_italic,
        }
    }

    #[rstest]
    #[case(&[2], vec![state(0, false, true)])]
    #[case(&[3], vec![state(0, true, false)])]
    #[case(&[4], vec![state(1, true, false)])]
    #[case(&[5], vec![state(0, true, true)])]
    #[case(&[7], vec![state(2, true, true)])]
    #[case(&[2, 2], vec![state(0, false, true), state(0, false, false)])]
    #[case(&[3, 3], vec![state(0, true, false), state(0, false, false)])]
    #[case(&[5, 3], vec![state(0, true, true), state(0, false, true)])]
    fn test_single_line_paths(#[case] counts: &[usize], #[case] expected: Vec<QuoteState>) {
        assert_eq!(compute_path(counts), expected);
    }

    #[test]
    fn test_three_reads_as_italic_when_it_balances_the_line() {
        // '''a''b: bold then italic would leave both open
        let path = compute_path(&[3, 2]);
        assert_eq!(path, vec![state(1, false, true), state(0, false, false)]);
    }

    #[test]
    fn test_empty_line() {
        assert!(compute_path(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn path_has_one_state_per_run(counts in prop::collection::vec(2usize..9, 0..12)) {
            let path = compute_path(&counts);
            prop_assert_eq!(path.len(), counts.len());
            for (state, count) in path.iter().zip(&counts) {
                prop_assert!(state.apocount < *count);
            }
        }
    }
}
