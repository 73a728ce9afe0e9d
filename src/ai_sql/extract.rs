//! Turn raw model output into SQL text

use regex::Regex;
use std::sync::LazyLock;

/// A fence is three backticks. A language tag directly after it is part of the
/// fence when nothing else follows on that line. An `sql` tag is always part of
/// the fence, even when the query starts on the same line.
static FENCE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:[A-Za-z][A-Za-z0-9_+.-]*[ \t]*(?:\r?\n|$)|(?i:sql))?")
        .expect("fence marker pattern is valid")
});

/// Strip every markdown fence marker and surrounding whitespace.
///
/// Nothing else is touched: the result is not checked for being SQL, for
/// statement type, or for containing several statements.
pub fn extract_sql(raw: &str) -> String {
    FENCE_MARKER.replace_all(raw, "").trim().to_string()
}
