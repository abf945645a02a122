//! Histogram-driven solver: infers tracking policies and block-shape
//! parameters from a historical query log.

use crate::error::Result;
use crate::hist::{Histogram, Island};
use crate::solver::history::{parse_line, HistoryLine, Query};
use crate::solver::policy::{Policy, PolicyParams, SolverReport};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Max delta (in percentage points) between adjacent bins for an index
/// histogram to still count as flat.
const FLAT_THRESHOLD: f64 = 15.0;

/// Margin (in percentage points) by which the last bin of the relative
/// time-length histogram must dominate its neighbor to signal recency.
const RECENCY_THRESHOLD: f64 = 15.0;

/// Running extremes over the observed query bounds.
struct Extremes {
    i_min: i32,
    i_max: i32,
    j_min: i64,
    j_max: i64,
    // Query-time extremes are tracked as recorded but never consulted
    // downstream; the second comparison also writes t_beg.
    #[allow(dead_code)]
    t_beg: i64,
    #[allow(dead_code)]
    t_end: i64,
}

impl Extremes {
    fn new() -> Self {
        Self {
            i_min: i32::MAX,
            i_max: i32::MIN,
            j_min: i64::MAX,
            j_max: i64::MIN,
            t_beg: i64::MIN,
            t_end: i64::MAX,
        }
    }

    fn relax(&mut self, query: &Query) {
        if query.time <= self.t_beg {
            self.t_beg = query.time;
        }
        if query.time >= self.t_end {
            self.t_beg = query.time;
        }
        if query.index_start <= self.i_min {
            self.i_min = query.index_start;
        }
        if query.time_start <= self.j_min {
            self.j_min = query.time_start;
        }
        if query.index_end >= self.i_max {
            self.i_max = query.index_end;
        }
        if query.time_end >= self.j_max {
            self.j_max = query.time_end;
        }
    }
}

/// The seven normalized histograms the inference runs on.
struct QueryHistograms {
    i1: Histogram<i32>,
    i2: Histogram<i32>,
    j1: Histogram<i64>,
    j2: Histogram<i64>,
    i_len: Histogram<i32>,
    j_len: Histogram<i64>,
    j_rel: Histogram<f64>,
}

impl QueryHistograms {
    fn build(queries: &[Query], extremes: &Extremes) -> Result<Self> {
        let i1: Vec<i32> = queries.iter().map(|q| q.index_start).collect();
        let i2: Vec<i32> = queries.iter().map(|q| q.index_end).collect();
        let j1: Vec<i64> = queries.iter().map(|q| q.time_start).collect();
        let j2: Vec<i64> = queries.iter().map(|q| q.time_end).collect();
        let i_len: Vec<i32> = queries.iter().map(|q| q.index_length()).collect();
        let j_len: Vec<i64> = queries.iter().map(|q| q.time_length()).collect();
        let j_rel: Vec<f64> = queries
            .iter()
            .map(|q| q.time_end as f64 / q.time as f64)
            .collect();

        let (i_min, i_max) = (extremes.i_min, extremes.i_max);
        let (j_min, j_max) = (extremes.j_min, extremes.j_max);
        let mut hists = Self {
            i1: Histogram::new("I1", &i1, Some(i_min), Some(i_max))?,
            i2: Histogram::new("I2", &i2, Some(i_min), Some(i_max))?,
            j1: Histogram::new("J1", &j1, Some(j_min), Some(j_max))?,
            j2: Histogram::new("J2", &j2, Some(j_min), Some(j_max))?,
            i_len: Histogram::new(
                "INDEX RANGE LENGTH",
                &i_len,
                Some(0),
                Some(i_max - i_min + 1),
            )?,
            j_len: Histogram::new(
                "TIME RANGE LENGTH",
                &j_len,
                Some(0),
                Some(j_max - j_min + 1),
            )?,
            j_rel: Histogram::new("RELATIVE TIME RANGE LENGTH", &j_rel, Some(0.0), Some(1.0))?,
        };
        hists.i1.normalize_to_percents();
        hists.i2.normalize_to_percents();
        hists.j1.normalize_to_percents();
        hists.j2.normalize_to_percents();
        hists.i_len.normalize_to_percents();
        hists.j_len.normalize_to_percents();
        hists.j_rel.normalize_to_percents();
        Ok(hists)
    }
}

/// Single-pass offline solver over a history log.
pub struct HistogramSolver {
    history_path: PathBuf,
    cache_unit_size: usize,
}

impl HistogramSolver {
    pub fn new<P: AsRef<Path>>(history_path: P, cache_unit_size: usize) -> Self {
        Self {
            history_path: history_path.as_ref().to_path_buf(),
            cache_unit_size,
        }
    }

    /// Run the whole solve: parse the log, build the histograms, adopt or
    /// infer the policies, and derive the block-shape parameters.
    pub fn solve(&self) -> Result<SolverReport> {
        let file = File::open(&self.history_path)?;
        let reader = BufReader::new(file);
        let mut queries: Vec<Query> = Vec::new();
        let mut extremes = Extremes::new();
        let mut hints: Option<(Policy, Policy)> = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let number = index + 1;
            match parse_line(&line) {
                HistoryLine::Query(query) => {
                    extremes.relax(&query);
                    queries.push(query);
                }
                HistoryLine::Hint { index, time } => {
                    match (index.parse::<Policy>(), time.parse::<Policy>()) {
                        (Ok(i_policy), Ok(j_policy)) => {
                            debug!(line = number, "policy hints detected");
                            hints = Some((i_policy, j_policy));
                        }
                        _ => warn!(line = number, "unknown policy names in hint: {}", line),
                    }
                }
                HistoryLine::Ignored => warn!(line = number, "line ignored: {}", line),
            }
        }
        info!(queries = queries.len(), "history parsed");

        let hists = QueryHistograms::build(&queries, &extremes)?;
        debug!("{}", hists.i1);
        debug!("{}", hists.i2);
        debug!("{}", hists.j1);
        debug!("{}", hists.j2);
        debug!("{}", hists.i_len);
        debug!("{}", hists.j_len);
        debug!("{}", hists.j_rel);

        let mut params = PolicyParams::default();
        let (i_policy, j_policy) = match hints {
            Some(hinted) => hinted,
            None => {
                let i_policy = infer_index_policy(&hists, &mut params);
                let j_policy = infer_time_policy(&hists, &mut params);
                (i_policy, j_policy)
            }
        };
        debug!(%i_policy, %j_policy, "estimated policies");

        let (p, l) = mode_based_shape(&hists, self.cache_unit_size, i_policy, j_policy);
        debug!(p, l, "calculated block shape");

        Ok(SolverReport {
            p,
            l,
            i_min: extremes.i_min,
            i_max: extremes.i_max,
            j_min: extremes.j_min,
            j_max: extremes.j_max,
            i_policy,
            j_policy,
            policy_params: params,
            queries,
        })
    }
}

/// Flat start/end histograms mean the whole index range is touched evenly;
/// anything else points at hot ranges, delimited by the islands of the
/// index-range-length histogram.
fn infer_index_policy(hists: &QueryHistograms, params: &mut PolicyParams) -> Policy {
    if hists.i1.is_flat_enough(FLAT_THRESHOLD) && hists.i2.is_flat_enough(FLAT_THRESHOLD) {
        Policy::FullTracking
    } else {
        let islands: Vec<Island> = hists.i_len.islands();
        params.hot_ranges = Some(islands);
        Policy::HotRanges
    }
}

/// Recency shows up as the last non-zero bin of the relative time-length
/// histogram dominating its left neighbor; the window size is the dominant
/// raw ratio within that bin.
fn infer_time_policy(hists: &QueryHistograms, params: &mut PolicyParams) -> Policy {
    let max_bin = hists.j_rel.max_bin();
    let last_nz = hists.j_rel.last_non_zero_bin();
    if max_bin.id() == last_nz
        && last_nz > 0
        && max_bin.value() - hists.j_rel.bin(last_nz - 1).value() > RECENCY_THRESHOLD
    {
        if let Some(window) = hists.j_rel.max_raw_key_in_bin(max_bin.id()) {
            params.recent_window = Some(window);
            return Policy::RecentTracking;
        }
    }
    Policy::FullTracking
}

/// Mode-based shape strategy: the most frequent time-range length becomes P
/// (vectors per block) and the most frequent index-range length becomes L
/// (series length). Does not yet account for the policies or the cache-unit
/// size; replace this function to change the strategy.
fn mode_based_shape(
    hists: &QueryHistograms,
    cache_unit_size: usize,
    i_policy: Policy,
    j_policy: Policy,
) -> (i64, i32) {
    debug!(
        cache_unit_size,
        %i_policy,
        %j_policy,
        "deriving P and L from length modes"
    );
    let p = hists.j_len.max_raw_key();
    let l = hists.i_len.max_raw_key();
    (p, l)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn history_file(lines: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    /// 25 queries with uniform index starts, constant lengths, and relative
    /// time ratios spread well below 1.
    fn uniform_history() -> Vec<String> {
        (0..25)
            .map(|k| format!("1000 {} {} {} {}", k, k + 2, 30 * k, 30 * k + 7))
            .collect()
    }

    #[test]
    fn uniform_workload_gets_full_tracking() {
        let file = history_file(&uniform_history());
        let report = HistogramSolver::new(file.path(), 64).solve().unwrap();
        assert_eq!(report.i_policy, Policy::FullTracking);
        assert_eq!(report.j_policy, Policy::FullTracking);
        assert!(report.policy_params.hot_ranges.is_none());
        assert!(report.policy_params.recent_window.is_none());
        assert_eq!(report.queries.len(), 25);
        assert_eq!(report.i_min, 0);
        assert_eq!(report.i_max, 26);
        assert_eq!(report.j_min, 0);
        assert_eq!(report.j_max, 24 * 30 + 7);
    }

    #[test]
    fn shape_parameters_are_length_modes() {
        let file = history_file(&uniform_history());
        let report = HistogramSolver::new(file.path(), 64).solve().unwrap();
        // Every query spans 2 indices and 7 time units.
        assert_eq!(report.l, 2);
        assert_eq!(report.p, 7);
    }

    #[test]
    fn skewed_workload_gets_hot_ranges_and_recent_tracking() {
        let mut lines: Vec<String> = (0..14)
            .map(|_| "1000 5 9 950 960".to_string())
            .collect();
        lines.push("1000 0 1 90 100".to_string());
        lines.push("1000 19 20 390 400".to_string());
        let file = history_file(&lines);
        let report = HistogramSolver::new(file.path(), 64).solve().unwrap();

        assert_eq!(report.i_policy, Policy::HotRanges);
        // The index-length histogram bins to [100, 0, 0]; the trailing zero
        // run must close on bin 2, not one past it.
        let islands = report.policy_params.hot_ranges.as_ref().unwrap();
        assert_eq!(
            islands,
            &vec![
                Island {
                    begin: 0,
                    top: 0,
                    end: 1
                },
                Island {
                    begin: 2,
                    top: 2,
                    end: 2
                }
            ]
        );

        assert_eq!(report.j_policy, Policy::RecentTracking);
        let window = report.policy_params.recent_window.unwrap();
        assert!((window - 0.96).abs() < 1e-9);

        assert_eq!(report.p, 10);
        assert_eq!(report.l, 4);
    }

    #[test]
    fn hints_override_inference() {
        let mut lines = uniform_history();
        lines.insert(0, "policies: hot_ranges recent_tracking".to_string());
        let file = history_file(&lines);
        let report = HistogramSolver::new(file.path(), 64).solve().unwrap();
        assert_eq!(report.i_policy, Policy::HotRanges);
        assert_eq!(report.j_policy, Policy::RecentTracking);
        // Hinted policies carry no inferred parameters.
        assert!(report.policy_params.hot_ranges.is_none());
        assert!(report.policy_params.recent_window.is_none());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let mut lines = uniform_history();
        lines.insert(0, "# header comment".to_string());
        lines.insert(5, "1000 2 oops 100 400".to_string());
        lines.push("trailing garbage".to_string());
        let file = history_file(&lines);
        let report = HistogramSolver::new(file.path(), 64).solve().unwrap();
        assert_eq!(report.queries.len(), 25);
    }

    #[test]
    fn empty_history_is_rejected() {
        let file = history_file(&[]);
        let err = HistogramSolver::new(file.path(), 64).solve().unwrap_err();
        assert!(matches!(err, crate::error::Error::EmptySamples(_)));
    }

    #[test]
    fn missing_history_file_propagates_io_error() {
        let err = HistogramSolver::new("/nonexistent/history.log", 64)
            .solve()
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
