use serde_json::Value;

/// Tagged result of a statement run through a database handle.
///
/// Replaces the older sentinel convention (-1 for "no rows", -2 for
/// "execution failed") with cases a caller cannot conflate: a zero-row
/// result is [`ProcResult::Empty`], never an empty `Rows` vector, and a
/// failed statement is [`ProcResult::Failed`] rather than an exception.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcResult {
    /// One decoded scalar per returned row.
    Rows(Vec<Value>),
    /// The statement ran and returned zero rows.
    Empty,
    /// Affected-row count from a statement executed without a row fetch.
    Done(u64),
    /// Execution failed; the cause is logged server-side and carried here.
    Failed(String),
}

impl ProcResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, ProcResult::Failed(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ProcResult::Empty)
    }

    /// All rows, when the call succeeded with data.
    pub fn rows(&self) -> Option<&[Value]> {
        match self {
            ProcResult::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// First returned scalar, if any.
    pub fn first(&self) -> Option<&Value> {
        self.rows().and_then(<[Value]>::first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_is_distinct_from_rows() {
        let empty = ProcResult::Empty;
        let rows = ProcResult::Rows(vec![json!(0)]);

        assert!(empty.is_empty());
        assert!(!rows.is_empty());
        assert_ne!(empty, rows);
        assert_eq!(empty.first(), None);
        assert_eq!(rows.first(), Some(&json!(0)));
    }

    #[test]
    fn failed_is_not_rows() {
        let failed = ProcResult::Failed("syntax error".into());
        assert!(failed.is_failed());
        assert_eq!(failed.rows(), None);
    }
}
