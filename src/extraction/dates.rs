use std::sync::OnceLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;

pub(super) const DATE_KEYWORDS: [(&str, u64); 3] =
    [("послезавтра", 2), ("завтра", 1), ("сегодня", 0)];

fn numeric_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{1,2})[./](\d{1,2})").expect("Will never fail."))
}

/// Literal keyword/regex date matching, nothing smarter. Keywords are
/// checked longest first so «послезавтра» is not caught by «завтра»;
/// numeric dates are `dd.mm` or `dd/mm` in the current year.
pub fn parse_due_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.to_lowercase();

    for (keyword, offset) in DATE_KEYWORDS {
        if text.contains(keyword) {
            return today.checked_add_days(Days::new(offset));
        }
    }

    let captures = numeric_date_pattern().captures(&text)?;
    let day: u32 = captures.get(1)?.as_str().parse().ok()?;
    let month: u32 = captures.get(2)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(today.year(), month, day)
}
