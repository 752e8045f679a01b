//! Per-day title numbering: `"{prefix}, {date} ({k} of {n})"`.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::date::format_date;

/// Position of a file among the files sharing its calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRank {
    /// 1-based rank in listing order.
    pub k: usize,
    /// Number of files on that date.
    pub n: usize,
}

/// Rank each date in `dates` among equal dates, keeping the input order.
///
/// Two passes: count per date, then hand out ranks in order of appearance.
pub fn rank_by_day(dates: &[NaiveDate]) -> Vec<DayRank> {
    let mut totals: HashMap<NaiveDate, usize> = HashMap::new();
    for d in dates {
        *totals.entry(*d).or_default() += 1;
    }
    let mut seen: HashMap<NaiveDate, usize> = HashMap::new();
    dates
        .iter()
        .map(|d| {
            let k = seen.entry(*d).or_default();
            *k += 1;
            DayRank {
                k: *k,
                n: totals[d],
            }
        })
        .collect()
}

pub fn title_for(prefix: &str, date: NaiveDate, rank: DayRank) -> String {
    format!("{}, {} ({} of {})", prefix, format_date(date), rank.k, rank.n)
}
