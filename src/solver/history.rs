//! History log records and the line parser

use serde::Serialize;

/// One historical query: at `time`, the client asked for vector indices
/// `[index_start, index_end]` over timestamps `[time_start, time_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Query {
    pub time: i64,
    pub index_start: i32,
    pub index_end: i32,
    pub time_start: i64,
    pub time_end: i64,
}

impl Query {
    pub fn new(time: i64, index_start: i32, index_end: i32, time_start: i64, time_end: i64) -> Self {
        Self {
            time,
            index_start,
            index_end,
            time_start,
            time_end,
        }
    }

    pub fn index_length(&self) -> i32 {
        self.index_end - self.index_start
    }

    pub fn time_length(&self) -> i64 {
        self.time_end - self.time_start
    }
}

/// Classification of one history log line.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryLine {
    Query(Query),
    /// Explicit policy hints for the index and time dimensions.
    Hint { index: String, time: String },
    /// Neither a query nor a hint; logged and skipped.
    Ignored,
}

/// Classify one log line. A query line is five whitespace-separated integers
/// `time i1 i2 j1 j2`; a hint line is `policies: <iPolicy> <jPolicy>`.
pub fn parse_line(line: &str) -> HistoryLine {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("policies:") {
        let mut names = rest.split_whitespace();
        if let (Some(index), Some(time), None) = (names.next(), names.next(), names.next()) {
            return HistoryLine::Hint {
                index: index.to_string(),
                time: time.to_string(),
            };
        }
        return HistoryLine::Ignored;
    }
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        return HistoryLine::Ignored;
    }
    let parsed = (
        fields[0].parse::<i64>(),
        fields[1].parse::<i32>(),
        fields[2].parse::<i32>(),
        fields[3].parse::<i64>(),
        fields[4].parse::<i64>(),
    );
    match parsed {
        (Ok(time), Ok(i1), Ok(i2), Ok(j1), Ok(j2)) => {
            HistoryLine::Query(Query::new(time, i1, i2, j1, j2))
        }
        _ => HistoryLine::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_line() {
        let line = parse_line("1000 2 6 100 400");
        assert_eq!(
            line,
            HistoryLine::Query(Query::new(1000, 2, 6, 100, 400))
        );
    }

    #[test]
    fn parses_hint_line() {
        let line = parse_line("policies: FULL_TRACKING recent_tracking");
        assert_eq!(
            line,
            HistoryLine::Hint {
                index: "FULL_TRACKING".to_string(),
                time: "recent_tracking".to_string()
            }
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_line("# comment"), HistoryLine::Ignored);
        assert_eq!(parse_line("1000 2 6 100"), HistoryLine::Ignored);
        assert_eq!(parse_line("1000 2 six 100 400"), HistoryLine::Ignored);
        assert_eq!(parse_line("policies: ONLY_ONE"), HistoryLine::Ignored);
        assert_eq!(parse_line(""), HistoryLine::Ignored);
    }

    #[test]
    fn derived_lengths() {
        let q = Query::new(1000, 2, 6, 100, 400);
        assert_eq!(q.index_length(), 4);
        assert_eq!(q.time_length(), 300);
    }
}
