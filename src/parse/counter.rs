//! Counter-block grammar for `perf stat` logs
//!
//! The harness wraps every benchmark invocation in `perf stat` and prints a
//! run header first:
//!
//! ```text
//! >>> Running ./independent with 4 threads and 7 hashbits
//!
//!  Performance counter stats for './independent 4 7' (5 runs):
//!
//!      5,305,595,199      cpu-cycles                ( +-  0.06% )
//!          1,234.56 msec task-clock                #    0.998 CPUs utilized
//!
//!        1.234 +- 0.002 seconds time elapsed  ( +-  0.17% )
//! ```
//!
//! Every line is classified into a [`CounterLine`]; a small state machine
//! then keeps the `(threads, hash_bits)` context from the latest header and
//! accepts metric lines only inside an open counter block.

use regex::Regex;
use std::sync::OnceLock;

use super::ParseOutcome;
use crate::experiment::Record;

const SECTION_START: &str = "Performance counter stats";
const TERMINAL: &str = "seconds time elapsed";

/// Unit tokens perf prints between a value and the counter name.
const UNITS: &[&str] = &["msec", "usec", "nsec", "sec", "ms", "us", "ns"];

#[allow(clippy::expect_used)]
fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^>>>\s*Running\s.*\bwith\s+(\d+)\s+threads\s+and\s+(\d+)\s+hashbits")
            .expect("run header pattern is a valid regex")
    })
}

#[allow(clippy::expect_used)]
fn metric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([\d,]+(?:\.\d+)?)\s+(\S+)(?:\s+(\S+))?")
            .expect("metric line pattern is a valid regex")
    })
}

/// Classification of one line of a counter log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterLine<'a> {
    /// Run header: `>>> Running ... with N threads and M hashbits`
    Header {
        /// Thread count of the run
        threads: u32,
        /// Hash-bit width of the run
        hash_bits: u32,
    },
    /// `Performance counter stats ...`, opens a counter block
    SectionStart,
    /// `<grouped-digits> <metric-name> ...`
    Metric {
        /// Raw value text, possibly with thousands separators
        raw_value: &'a str,
        /// Counter name
        name: &'a str,
    },
    /// `... seconds time elapsed`, closes the counter block
    Terminal,
    /// Anything else
    Unrecognized,
}

/// Classify a single line
///
/// Surrounding whitespace is ignored. Headers must start with
/// `>>> Running`, and section starts are recognized first, so a command
/// line quoted by perf never reads as a header. Terminal lines are
/// recognized before metric lines, since `1.234 seconds time elapsed` also
/// has the shape of a metric.
///
/// # Examples
///
/// ```rust
/// use trueno_perflog::parse::{classify_counter_line, CounterLine};
///
/// assert_eq!(
///     classify_counter_line("5,305,595,199      cpu-cycles  ( +- 0.06% )"),
///     CounterLine::Metric { raw_value: "5,305,595,199", name: "cpu-cycles" },
/// );
/// assert_eq!(
///     classify_counter_line(">>> Running foo with 4 threads and 7 hashbits"),
///     CounterLine::Header { threads: 4, hash_bits: 7 },
/// );
/// ```
#[must_use]
pub fn classify_counter_line(line: &str) -> CounterLine<'_> {
    let line = line.trim();

    if line.starts_with(SECTION_START) {
        return CounterLine::SectionStart;
    }

    if let Some(captures) = header_pattern().captures(line) {
        let threads = captures.get(1).and_then(|m| m.as_str().parse().ok());
        let hash_bits = captures.get(2).and_then(|m| m.as_str().parse().ok());
        return match (threads, hash_bits) {
            (Some(threads), Some(hash_bits)) => CounterLine::Header { threads, hash_bits },
            _ => CounterLine::Unrecognized,
        };
    }

    if line.contains(TERMINAL) {
        return CounterLine::Terminal;
    }

    if let Some(captures) = metric_pattern().captures(line) {
        if let (Some(raw_value), Some(token)) = (captures.get(1), captures.get(2)) {
            // `1,234.56 msec task-clock`: the counter name follows the unit
            let name = match captures.get(3) {
                Some(next) if UNITS.contains(&token.as_str()) => next.as_str(),
                _ => token.as_str(),
            };
            return CounterLine::Metric {
                raw_value: raw_value.as_str(),
                name,
            };
        }
    }

    CounterLine::Unrecognized
}

/// Strip thousands separators and convert to a number
///
/// # Returns
/// `None` if the remaining text is not a finite number.
///
/// # Examples
///
/// ```rust
/// use trueno_perflog::parse::normalize_grouped_number;
///
/// assert_eq!(normalize_grouped_number("5,305,595,199"), Some(5_305_595_199.0));
/// assert_eq!(normalize_grouped_number(",,,"), None);
/// ```
#[must_use]
pub fn normalize_grouped_number(raw: &str) -> Option<f64> {
    let digits: String = raw.chars().filter(|&c| c != ',').collect();
    digits.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Per-file parse state
#[derive(Debug, Default)]
struct CounterState {
    threads: Option<u32>,
    hash_bits: Option<u32>,
    in_block: bool,
}

/// Parse a region of counter-block output
///
/// A header sets the run context (a zero thread count clears it) and closes
/// any open block. Metric lines are kept only inside a block and with both
/// context values set; rejected metric lines and unrecognized lines inside
/// a block count as discarded.
pub fn parse_counter_region<'a, I>(lines: I) -> ParseOutcome
where
    I: IntoIterator<Item = &'a str>,
{
    let mut outcome = ParseOutcome::default();
    let mut state = CounterState::default();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        match classify_counter_line(line) {
            CounterLine::Header { threads, hash_bits } => {
                state.threads = (threads >= 1).then_some(threads);
                state.hash_bits = Some(hash_bits);
                state.in_block = false;
            }
            CounterLine::SectionStart => state.in_block = true,
            CounterLine::Terminal => state.in_block = false,
            CounterLine::Metric { raw_value, name } if state.in_block => {
                let record = match (state.threads, state.hash_bits) {
                    (Some(threads), Some(hash_bits)) => normalize_grouped_number(raw_value)
                        .map(|value| Record::new(threads, hash_bits, name, value)),
                    _ => None,
                };
                match record {
                    Some(record) => outcome.records.push(record),
                    None => outcome.discarded += 1,
                }
            }
            CounterLine::Unrecognized if state.in_block => outcome.discarded += 1,
            CounterLine::Metric { .. } | CounterLine::Unrecognized => {}
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_section_and_terminal() {
        assert_eq!(
            classify_counter_line(" Performance counter stats for './independent 4 7':"),
            CounterLine::SectionStart
        );
        assert_eq!(
            classify_counter_line("1.234 seconds time elapsed"),
            CounterLine::Terminal
        );
        assert_eq!(
            classify_counter_line("  1.234 +- 0.002 seconds time elapsed  ( +-  0.17% )"),
            CounterLine::Terminal
        );
    }

    #[test]
    fn test_classify_metric_with_unit() {
        assert_eq!(
            classify_counter_line("1,234.56 msec task-clock   #    0.998 CPUs utilized"),
            CounterLine::Metric {
                raw_value: "1,234.56",
                name: "task-clock"
            }
        );
    }

    #[test]
    fn test_classify_unrecognized() {
        assert_eq!(
            classify_counter_line("<not counted>      cache-misses"),
            CounterLine::Unrecognized
        );
        assert_eq!(classify_counter_line("12345"), CounterLine::Unrecognized);
        assert_eq!(classify_counter_line("cpu-cycles 12"), CounterLine::Unrecognized);
    }

    #[test]
    fn test_classify_header_overflow_is_unrecognized() {
        assert_eq!(
            classify_counter_line(">>> Running foo with 99999999999 threads and 7 hashbits"),
            CounterLine::Unrecognized
        );
    }

    #[test]
    fn test_header_requires_running_prefix() {
        let section = " Performance counter stats for \
                       './independent with 4 threads and 7 hashbits' (5 runs):";
        assert_eq!(classify_counter_line(section), CounterLine::SectionStart);
        assert_eq!(
            classify_counter_line("Error in concurrent run with 4 threads and 7 hashbits"),
            CounterLine::Unrecognized
        );
    }

    #[test]
    fn test_section_quoting_run_shape_opens_block() {
        let lines = [
            ">>> Running ./independent with 4 threads and 7 hashbits",
            "Performance counter stats for './independent with 2 threads and 3 hashbits':",
            "5,305,595,199 cpu-cycles",
            "1.0 seconds time elapsed",
        ];
        let outcome = parse_counter_region(lines);
        assert_eq!(outcome.records, vec![Record::new(4, 7, "cpu-cycles", 5_305_595_199.0)]);
    }

    #[test]
    fn test_single_metric_record() {
        let lines = [
            ">>> Running foo with 4 threads and 7 hashbits",
            "Performance counter stats",
            "5,305,595,199 cpu-cycles ( +- 0.06% )",
            "1.234 seconds time elapsed",
        ];
        let outcome = parse_counter_region(lines);
        assert_eq!(
            outcome.records,
            vec![Record::new(4, 7, "cpu-cycles", 5_305_595_199.0)]
        );
        assert_eq!(outcome.discarded, 0);
    }

    #[test]
    fn test_metric_outside_block_ignored() {
        let lines = [
            ">>> Running foo with 4 threads and 7 hashbits",
            "5,305,595,199 cpu-cycles",
            "Performance counter stats",
            "1.234 seconds time elapsed",
            "42 instructions",
        ];
        let outcome = parse_counter_region(lines);
        assert!(outcome.is_empty());
        assert_eq!(outcome.discarded, 0);
    }

    #[test]
    fn test_metric_without_context_discarded() {
        let lines = ["Performance counter stats", "100 cpu-cycles"];
        let outcome = parse_counter_region(lines);
        assert!(outcome.is_empty());
        assert_eq!(outcome.discarded, 1);
    }

    #[test]
    fn test_zero_threads_header_clears_context() {
        let lines = [
            ">>> Running foo with 2 threads and 3 hashbits",
            ">>> Running foo with 0 threads and 3 hashbits",
            "Performance counter stats",
            "100 cpu-cycles",
        ];
        let outcome = parse_counter_region(lines);
        assert!(outcome.is_empty());
        assert_eq!(outcome.discarded, 1);
    }

    #[test]
    fn test_header_closes_open_block() {
        let lines = [
            ">>> Running foo with 1 threads and 3 hashbits",
            "Performance counter stats",
            "100 cpu-cycles",
            ">>> Running foo with 2 threads and 3 hashbits",
            "200 cpu-cycles",
        ];
        let outcome = parse_counter_region(lines);
        assert_eq!(outcome.records, vec![Record::new(1, 3, "cpu-cycles", 100.0)]);
    }

    #[test]
    fn test_context_persists_across_blocks() {
        let lines = [
            ">>> Running foo with 2 threads and 9 hashbits",
            "Performance counter stats",
            "100 cpu-cycles",
            "1.0 seconds time elapsed",
            "Performance counter stats",
            "110 cpu-cycles",
            "1.1 seconds time elapsed",
        ];
        let outcome = parse_counter_region(lines);
        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.records.iter().all(|r| r.threads() == 2 && r.hash_bits() == 9));
    }

    #[test]
    fn test_malformed_grouping_discarded() {
        let lines = [
            ">>> Running foo with 2 threads and 9 hashbits",
            "Performance counter stats",
            ",,, cpu-cycles",
            "7 instructions",
        ];
        let outcome = parse_counter_region(lines);
        assert_eq!(outcome.records, vec![Record::new(2, 9, "instructions", 7.0)]);
        assert_eq!(outcome.discarded, 1);
    }

    #[test]
    fn test_state_does_not_leak_between_calls() {
        let first = [
            ">>> Running foo with 2 threads and 9 hashbits",
            "Performance counter stats",
        ];
        let _ = parse_counter_region(first);

        let outcome = parse_counter_region(["100 cpu-cycles"]);
        assert!(outcome.is_empty());
        assert_eq!(outcome.discarded, 0);
    }
}
