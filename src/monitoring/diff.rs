use std::collections::HashSet;

use super::records::{Keyed, Snapshot};

/// Keys already present in a snapshot.
pub fn key_set<R: Keyed>(records: &[R]) -> HashSet<String> {
    records.iter().map(|r| r.key().to_string()).collect()
}

/// Records in `current` whose key is absent from `previous`, in `current` order.
///
/// A key repeated inside `current` is reported once (first occurrence).
pub fn diff<R: Keyed + Clone>(previous: &HashSet<String>, current: &[R]) -> Vec<R> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut new = Vec::new();

    for record in current {
        let key = record.key();
        if previous.contains(key) {
            continue;
        }
        if seen.insert(key) {
            new.push(record.clone());
        }
    }

    new
}

/// Append `new` to the snapshot, then trim the oldest records down to `limit`.
///
/// Records whose key is in `still_listed` are never trimmed, otherwise they would
/// come back as new on the next pass. `limit == 0` means unbounded. Returns how
/// many records were dropped.
pub fn merge<S: Snapshot>(
    snapshot: &mut S,
    new: Vec<S::Record>,
    limit: usize,
    still_listed: &HashSet<String>,
) -> usize {
    let records = snapshot.records_mut();
    records.extend(new);

    if limit == 0 || records.len() <= limit {
        return 0;
    }

    let before = records.len();
    let mut excess = before - limit;
    records.retain(|record| {
        if excess > 0 && !still_listed.contains(record.key()) {
            excess -= 1;
            false
        } else {
            true
        }
    });

    before - records.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Exchange;
    use crate::monitoring::records::{Announcement, AnnouncementSnapshot, SymbolRecord, SymbolSnapshot};
    use chrono::Utc;

    fn sym(symbol: &str) -> SymbolRecord {
        SymbolRecord::new(Exchange::Binance, symbol, &symbol[..3], &symbol[3..])
    }

    #[test]
    fn test_diff_reports_only_unseen_keys() {
        let previous = key_set(&[sym("ABCUSDT")]);
        let current = vec![sym("ABCUSDT"), sym("XYZUSDT")];

        let new = diff(&previous, &current);
        assert_eq!(new, vec![sym("XYZUSDT")]);
    }

    #[test]
    fn test_diff_preserves_current_order() {
        let previous = key_set(&[sym("BBBUSDT")]);
        let current = vec![sym("ZZZUSDT"), sym("BBBUSDT"), sym("AAAUSDT"), sym("MMMUSDT")];

        let keys: Vec<String> = diff(&previous, &current)
            .into_iter()
            .map(|r| r.symbol)
            .collect();
        assert_eq!(keys, vec!["ZZZUSDT", "AAAUSDT", "MMMUSDT"]);
    }

    #[test]
    fn test_diff_against_empty_snapshot_is_everything() {
        let current = vec![sym("ABCUSDT"), sym("XYZUSDT")];
        assert_eq!(diff(&HashSet::new(), &current), current);
    }

    #[test]
    fn test_diff_collapses_duplicate_current_keys() {
        let current = vec![sym("ABCUSDT"), sym("ABCUSDT")];
        assert_eq!(diff(&HashSet::new(), &current).len(), 1);
    }

    #[test]
    fn test_second_pass_after_merge_is_empty() {
        let mut snapshot = SymbolSnapshot {
            symbols: vec![sym("ABCUSDT")],
        };
        let current = vec![sym("ABCUSDT"), sym("XYZUSDT")];

        let first = diff(&key_set(snapshot.records()), &current);
        merge(&mut snapshot, first, 0, &HashSet::new());
        assert_eq!(snapshot.symbols.len(), 2);

        let second = diff(&key_set(snapshot.records()), &current);
        assert!(second.is_empty());
    }

    #[test]
    fn test_merge_caps_to_most_recent() {
        let mut snapshot = AnnouncementSnapshot::default();
        let make = |n: usize| {
            Announcement::new(
                Exchange::Bybit,
                &format!("New listing number {n}"),
                &format!("https://bybit/{n}"),
                Utc::now(),
                vec![],
            )
        };

        merge(&mut snapshot, (0..3).map(make).collect(), 4, &HashSet::new());
        let dropped = merge(&mut snapshot, (3..6).map(make).collect(), 4, &HashSet::new());

        assert_eq!(dropped, 2);
        assert_eq!(snapshot.announcements.len(), 4);
        assert_eq!(snapshot.announcements[0].title, "New listing number 2");
        assert_eq!(snapshot.announcements[3].title, "New listing number 5");
    }

    #[test]
    fn test_merge_never_trims_records_still_in_the_feed() {
        let make = |n: usize| {
            Announcement::new(
                Exchange::Binance,
                &format!("Binance will list token {n}"),
                &format!("https://binance/{n}"),
                Utc::now(),
                vec![],
            )
        };
        let feed: Vec<Announcement> = (0..3).map(make).collect();
        let listed = key_set(&feed);

        let mut snapshot = AnnouncementSnapshot {
            announcements: vec![make(99)],
        };
        let new = diff(&key_set(snapshot.records()), &feed);
        let dropped = merge(&mut snapshot, new, 2, &listed);

        // only the record that left the feed goes, the cap stretches to the page
        assert_eq!(dropped, 1);
        assert_eq!(snapshot.announcements.len(), 3);
        assert!(diff(&key_set(snapshot.records()), &feed).is_empty());
    }
}
