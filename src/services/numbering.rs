//! Section numbering for findings (8.x) and additional reports (9.x).
//!
//! Identifiers are `{prefix}.{n}` with `n` 1-based. New records take the
//! next number after the current maximum; any delete or reorder is followed
//! by a full renumber so the sequence stays dense.

use crate::models::additional_report::AdditionalReportItem;
use crate::models::finding::Finding;

pub const FINDING_PREFIX: &str = "8";
pub const ADDITIONAL_REPORT_PREFIX: &str = "9";

/// A record carrying a dotted section identifier.
pub trait Numbered {
    fn number(&self) -> Option<&str>;
    fn set_number(&mut self, id: String);
}

impl Numbered for Finding {
    fn number(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_number(&mut self, id: String) {
        self.id = Some(id);
    }
}

impl Numbered for AdditionalReportItem {
    fn number(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_number(&mut self, id: String) {
        self.id = Some(id);
    }
}

/// Numeric suffix of a well-formed `{prefix}.{n}` identifier.
fn suffix(id: &str, prefix: &str) -> Option<u64> {
    id.strip_prefix(prefix)?
        .strip_prefix('.')?
        .parse::<u64>()
        .ok()
        .filter(|&n| n > 0)
}

/// Next free identifier: one past the highest existing suffix for `prefix`.
/// Malformed or foreign identifiers are ignored, and so is a suffix with no
/// representable successor.
pub fn next_id<T: Numbered>(records: &[T], prefix: &str) -> String {
    let next = records
        .iter()
        .filter_map(|r| r.number())
        .filter_map(|id| suffix(id, prefix))
        .filter_map(|n| n.checked_add(1))
        .max()
        .unwrap_or(1);
    format!("{prefix}.{next}")
}

/// Reassign `{prefix}.1 ..= {prefix}.N` in the current order.
pub fn renumber<T: Numbered>(mut records: Vec<T>, prefix: &str) -> Vec<T> {
    renumber_in_place(&mut records, prefix);
    records
}

pub fn renumber_in_place<T: Numbered>(records: &mut [T], prefix: &str) {
    for (i, record) in records.iter_mut().enumerate() {
        record.set_number(format!("{prefix}.{}", i + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(id: Option<&str>, title: &str) -> Finding {
        Finding {
            id: id.map(String::from),
            title: title.to_string(),
            ..Finding::default()
        }
    }

    fn report(id: &str) -> AdditionalReportItem {
        AdditionalReportItem {
            id: Some(id.to_string()),
            ..AdditionalReportItem::default()
        }
    }

    #[test]
    fn next_id_on_empty_collection() {
        assert_eq!(next_id::<AdditionalReportItem>(&[], ADDITIONAL_REPORT_PREFIX), "9.1");
        assert_eq!(next_id::<Finding>(&[], FINDING_PREFIX), "8.1");
    }

    #[test]
    fn next_id_uses_max_not_count() {
        let items = vec![report("9.1"), report("9.4")];
        assert_eq!(next_id(&items, "9"), "9.5");
    }

    #[test]
    fn next_id_ignores_malformed_and_foreign_ids() {
        let findings = vec![
            finding(Some("8.2"), "a"),
            finding(Some("8.x"), "b"),
            finding(Some("9.7"), "c"),
            finding(Some("8.2.1"), "d"),
            finding(Some("80.9"), "e"),
            finding(None, "f"),
        ];
        assert_eq!(next_id(&findings, FINDING_PREFIX), "8.3");
    }

    #[test]
    fn next_id_with_only_malformed_ids_starts_at_one() {
        let findings = vec![finding(Some("draft"), "a"), finding(Some("8."), "b")];
        assert_eq!(next_id(&findings, FINDING_PREFIX), "8.1");
    }

    #[test]
    fn next_id_ignores_suffix_at_integer_limit() {
        let items = vec![report("9.18446744073709551615"), report("9.3")];
        assert_eq!(next_id(&items, ADDITIONAL_REPORT_PREFIX), "9.4");

        let only_max = vec![report(&format!("9.{}", u64::MAX))];
        assert_eq!(next_id(&only_max, ADDITIONAL_REPORT_PREFIX), "9.1");

        let too_large = vec![report("9.99999999999999999999999")];
        assert_eq!(next_id(&too_large, ADDITIONAL_REPORT_PREFIX), "9.1");
    }

    #[test]
    fn renumber_is_dense_and_keeps_order() {
        let findings = vec![
            finding(Some("8.7"), "first"),
            finding(None, "second"),
            finding(Some("8.2"), "third"),
        ];
        let renumbered = renumber(findings, FINDING_PREFIX);
        let ids: Vec<_> = renumbered.iter().map(|f| f.id.clone().unwrap()).collect();
        let titles: Vec<_> = renumbered.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(ids, vec!["8.1", "8.2", "8.3"]);
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn renumber_any_length() {
        for n in [0usize, 1, 9, 10, 25] {
            let findings: Vec<Finding> = (0..n).map(|_| finding(Some("8.99"), "x")).collect();
            let renumbered = renumber(findings, FINDING_PREFIX);
            let expected: Vec<String> = (1..=n).map(|i| format!("8.{i}")).collect();
            let ids: Vec<String> = renumbered.into_iter().filter_map(|f| f.id).collect();
            assert_eq!(ids, expected);
        }
    }

    #[test]
    fn prefixes_are_independent() {
        let mut items = vec![report("8.3"), report("9.2")];
        renumber_in_place(&mut items, ADDITIONAL_REPORT_PREFIX);
        assert_eq!(items[0].id.as_deref(), Some("9.1"));
        assert_eq!(next_id(&items, FINDING_PREFIX), "8.1");
    }
}
