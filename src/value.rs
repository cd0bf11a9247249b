use crate::scoreboard::Report;

/// Result payload passed between tasks and out of test bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    None,
    String(String),
    Report(Report),
}
