//! Parsing of the engine's search reports.
//!
//! Two kinds of lines are understood:
//!
//! - Live analysis lines holding one or more variation reports, each starting
//!   with `info` and carrying `move`, `visits` and `winrate` (0-100) fields:
//!   `info move D4 visits 120 winrate 54 pv D4 Q16 info move Q16 visits 80 winrate 45`.
//!   These fold into an [`AnalysisSnapshot`].
//! - Candidate lines printed after a move search, `D4 -> 120 (W: 54.32%) ...`.
//!   A `<n> book moves` line means the move came from the opening book and
//!   there are no candidates.

use crate::constants::MAX_CANDIDATES;
use crate::position::Move;

/// Aggregate evaluation of the position being searched.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AnalysisSnapshot {
    /// Win rate for the side to move, 0.0 to 1.0.
    pub winrate: f64,
    /// Total playouts across all reported variations.
    pub playouts: u64,
}

/// A ranked candidate move from a search.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub mv: Move,
    pub simulations: u64,
    /// Win rate as a fraction, 0.0 to 1.0.
    pub winrate: f64,
}

/// Fold a live analysis line into a snapshot.
///
/// Playouts are summed over variations and the win rate is their
/// playout-weighted mean. Returns `None` if the line has no variation with
/// playouts.
pub fn parse_analysis_line(line: &str) -> Option<AnalysisSnapshot> {
    let mut playouts: u64 = 0;
    let mut weighted: f64 = 0.0;

    let mut tokens = line.split_whitespace().peekable();
    while let Some(tok) = tokens.next() {
        if tok != "info" {
            continue;
        }
        let mut visits = None;
        let mut winrate = None;
        while let Some(&key) = tokens.peek() {
            if key == "info" {
                break;
            }
            tokens.next();
            match key {
                "visits" => visits = tokens.next().and_then(|v| v.parse::<u64>().ok()),
                "winrate" => winrate = tokens.next().and_then(|v| v.parse::<f64>().ok()),
                _ => {}
            }
        }
        if let (Some(v), Some(w)) = (visits, winrate) {
            playouts += v;
            weighted += v as f64 * w / 100.0;
        }
    }

    (playouts > 0).then(|| AnalysisSnapshot {
        winrate: weighted / playouts as f64,
        playouts,
    })
}

/// Parse one `<coord> -> <simulations> (W: <percent>%)` line.
pub fn parse_candidate(line: &str) -> Option<Candidate> {
    let (coord, rest) = line.split_once("->")?;
    let mv: Move = coord.trim().parse().ok()?;
    let simulations = rest.split_whitespace().next()?.parse().ok()?;
    let (_, after) = rest.split_once("(W:")?;
    let (pct, _) = after.split_once('%')?;
    let pct: f64 = pct.trim().parse().ok()?;
    Some(Candidate {
        mv,
        simulations,
        winrate: pct / 100.0,
    })
}

/// True for an `<n> book moves` line.
pub fn is_book_line(line: &str) -> bool {
    let mut parts = line.split_whitespace();
    matches!(
        (parts.next(), parts.next(), parts.next(), parts.next()),
        (Some(n), Some("book"), Some("moves"), None) if n.parse::<u64>().is_ok()
    )
}

/// Extract up to three ranked candidates from search output, strongest first.
///
/// Any book-move line in the input means the search was skipped, and the
/// result is empty even if candidate lines were seen before it.
pub fn extract_candidates<S: AsRef<str>>(lines: &[S]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for line in lines {
        let line = line.as_ref();
        if is_book_line(line) {
            return Vec::new();
        }
        if candidates.len() < MAX_CANDIDATES {
            if let Some(c) = parse_candidate(line) {
                candidates.push(c);
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_extract_two_candidates() {
        let lines = ["D4 -> 120 (W: 54.32%)", "Q16 -> 80 (W: 45.00%)"];
        let c = extract_candidates(&lines);
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].mv, "D4".parse::<Move>().unwrap());
        assert_eq!(c[0].simulations, 120);
        assert!(close(c[0].winrate, 0.5432));
        assert_eq!(c[1].mv, "Q16".parse::<Move>().unwrap());
        assert_eq!(c[1].simulations, 80);
        assert!(close(c[1].winrate, 0.45));
    }

    #[test]
    fn test_book_moves_discard_candidates() {
        let lines = [
            "D4 -> 120 (W: 54.32%)",
            "Q16 -> 80 (W: 45.00%)",
            "12 book moves",
        ];
        assert!(extract_candidates(&lines).is_empty());
    }

    #[test]
    fn test_candidates_capped_at_three() {
        let lines = [
            "D4 -> 120 (W: 54.32%)",
            "Q16 -> 80 (W: 45.00%)",
            "C3 -> 40 (W: 40.00%)",
            "R4 -> 20 (W: 30.00%)",
        ];
        let c = extract_candidates(&lines);
        assert_eq!(c.len(), MAX_CANDIDATES);
        assert_eq!(c[2].mv, "C3".parse::<Move>().unwrap());
    }

    #[test]
    fn test_candidate_with_trailing_fields() {
        let line = " D4 ->    1834 (W: 52.10%) (U: 49.01%) (V: 51.12%:   6343) (N:  7.3%) PV: D4 Q16";
        let c = parse_candidate(line).unwrap();
        assert_eq!(c.simulations, 1834);
        assert!(close(c.winrate, 0.521));
    }

    #[test]
    fn test_noise_lines_are_ignored() {
        let lines = [
            "Thinking at most 5.0 seconds...",
            "Playouts: 1200, Win: 51.20%, PV: D4",
            "pass -> 3 (W: 10.00%)",
        ];
        let c = extract_candidates(&lines);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].mv, Move::Pass);
    }

    #[test]
    fn test_is_book_line() {
        assert!(is_book_line("12 book moves"));
        assert!(is_book_line("  3 book moves "));
        assert!(!is_book_line("book moves"));
        assert!(!is_book_line("12 book moves left"));
    }

    #[test]
    fn test_analysis_line_weighted_mean() {
        let line = "info move D4 visits 120 winrate 60 pv D4 Q16 info move Q16 visits 80 winrate 40 pv Q16";
        let snap = parse_analysis_line(line).unwrap();
        assert_eq!(snap.playouts, 200);
        // (120 * 0.60 + 80 * 0.40) / 200
        assert!(close(snap.winrate, 0.52));
    }

    #[test]
    fn test_analysis_line_without_reports() {
        assert_eq!(parse_analysis_line("Thinking at most 5.0 seconds..."), None);
        assert_eq!(parse_analysis_line("info move D4 visits 0 winrate 50"), None);
    }
}
