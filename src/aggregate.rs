//! Groups matched rows by normalized subject for the summary sheet

use std::collections::BTreeMap;

use crate::models::{AggregateRow, MatchRow};
use crate::text::{normalize_for_grouping, title_case};

/// Count matches per normalized subject, most frequent first.
///
/// Rows whose subject normalizes to the empty string are skipped. Groups
/// start in key order and are stably sorted by count, so ties are listed
/// alphabetically by key.
pub fn aggregate_by_subject(rows: &[MatchRow]) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        let key = normalize_for_grouping(Some(&row.subject));
        if key.is_empty() {
            continue;
        }
        *groups.entry(key).or_insert(0) += 1;
    }

    let mut aggregates: Vec<AggregateRow> = groups
        .into_iter()
        .map(|(key, count)| AggregateRow {
            display_label: title_case(&key),
            count,
        })
        .collect();
    aggregates.sort_by(|a, b| b.count.cmp(&a.count));
    aggregates
}
