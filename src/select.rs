//! Selects the posts that belong on the index page and puts them in display
//! order. See [`Selection::apply`] for the exact policy.

use crate::post::PostRecord;
use serde::Deserialize;
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// The `layout` value that marks a record as a blog post.
pub const POST_LAYOUT: &str = "post";

/// The route of the site's not-found page. It's excluded from the index even
/// when its frontmatter otherwise looks like a post.
pub const NOT_FOUND_PATH: &str = "/404/";

/// How records with identical dates are ordered relative to each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieOrder {
    /// Sort ascending, then reverse the whole sequence. Records sharing a
    /// date come out in the reverse of their input order.
    #[default]
    Reversed,

    /// Sort descending with a stable sort. Records sharing a date keep their
    /// input order.
    Stable,
}

impl FromStr for TieOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reversed" => Ok(TieOrder::Reversed),
            "stable" => Ok(TieOrder::Stable),
            other => Err(format!(
                "unknown tie order `{}` (expected `reversed` or `stable`)",
                other
            )),
        }
    }
}

impl fmt::Display for TieOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            TieOrder::Reversed => "reversed",
            TieOrder::Stable => "stable",
        })
    }
}

/// The selection policy for index pages.
#[derive(Clone, Debug)]
pub struct Selection {
    /// Records must carry this `layout` to be kept.
    pub layout: String,

    /// Records routed here are dropped.
    pub not_found_path: String,

    /// Ordering among records with equal dates.
    pub tie_order: TieOrder,
}

impl Default for Selection {
    fn default() -> Self {
        Selection {
            layout: POST_LAYOUT.to_owned(),
            not_found_path: NOT_FOUND_PATH.to_owned(),
            tie_order: TieOrder::default(),
        }
    }
}

impl Selection {
    /// Returns a default selection with the given tie order.
    pub fn with_tie_order(tie_order: TieOrder) -> Self {
        Selection {
            tie_order,
            ..Selection::default()
        }
    }

    /// Reports whether `record` may appear on the index. A record is eligible
    /// when its layout is the post layout, its path isn't the not-found page,
    /// and it isn't a draft. Missing `layout` or `path` fail the check; a
    /// missing `draft` flag passes it.
    pub fn is_eligible(&self, record: &PostRecord) -> bool {
        record.layout.as_deref() == Some(self.layout.as_str())
            && record.path.as_deref().map_or(false, |p| p != self.not_found_path)
            && record.draft != Some(true)
    }

    /// Orders `records` by date, most recent first, and drops every record
    /// that isn't [eligible](Selection::is_eligible). Dates are compared as
    /// strings; a missing date compares less than any present one, so undated
    /// records end up last.
    ///
    /// The ordering is computed over all records before filtering, and the
    /// filter never reorders, so the output is a subsequence of the ordered
    /// input.
    pub fn apply<R, I>(&self, records: I) -> Vec<R>
    where
        R: Borrow<PostRecord>,
        I: IntoIterator<Item = R>,
    {
        let mut ordered: Vec<R> = records.into_iter().collect();
        match self.tie_order {
            TieOrder::Reversed => {
                ordered.sort_by(|a, b| a.borrow().date.cmp(&b.borrow().date));
                ordered.reverse();
            }
            TieOrder::Stable => {
                ordered.sort_by(|a, b| b.borrow().date.cmp(&a.borrow().date));
            }
        }
        ordered.retain(|r| self.is_eligible(r.borrow()));
        ordered
    }
}

/// Applies the default [`Selection`] to `records`.
pub fn select_and_order<R, I>(records: I) -> Vec<R>
where
    R: Borrow<PostRecord>,
    I: IntoIterator<Item = R>,
{
    Selection::default().apply(records)
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(id: &str, date: Option<&str>, layout: Option<&str>) -> PostRecord {
        PostRecord {
            title: Some(id.to_owned()),
            date: date.map(str::to_owned),
            layout: layout.map(str::to_owned),
            path: Some(format!("/{}/", id)),
            ..PostRecord::default()
        }
    }

    fn ids(records: &[&PostRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.title.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_most_recent_first() {
        let records = vec![
            record("a", Some("2020/01/01"), Some("post")),
            record("b", Some("2020/06/01"), Some("post")),
        ];
        assert_eq!(vec!["b", "a"], ids(&select_and_order(&records)));
    }

    #[test]
    fn test_drafts_excluded() {
        let mut draft = record("draft", Some("2030/01/01"), Some("post"));
        draft.draft = Some(true);
        let mut published = record("published", Some("2020/01/01"), Some("post"));
        published.draft = Some(false);
        let records = vec![draft, published];
        assert_eq!(vec!["published"], ids(&select_and_order(&records)));
    }

    #[test]
    fn test_not_found_page_excluded() {
        let mut not_found = record("missing", Some("2020/01/01"), Some("post"));
        not_found.path = Some(String::from("/404/"));
        let records = vec![not_found, record("kept", Some("2019/01/01"), Some("post"))];
        assert_eq!(vec!["kept"], ids(&select_and_order(&records)));
    }

    #[test]
    fn test_other_layouts_excluded() {
        let records = vec![
            record("about", Some("2020/01/01"), Some("page")),
            record("nolayout", Some("2020/01/01"), None),
            record("post", Some("2020/01/01"), Some("post")),
        ];
        assert_eq!(vec!["post"], ids(&select_and_order(&records)));
    }

    #[test]
    fn test_missing_path_excluded() {
        let mut pathless = record("pathless", Some("2020/01/01"), Some("post"));
        pathless.path = None;
        let records = vec![pathless];
        assert!(select_and_order(&records).is_empty());
    }

    #[test]
    fn test_equal_dates_reversed() {
        let records = vec![
            record("a", Some("2020/01/01"), Some("post")),
            record("b", Some("2020/01/01"), Some("post")),
        ];
        assert_eq!(vec!["b", "a"], ids(&select_and_order(&records)));
    }

    #[test]
    fn test_equal_dates_stable() {
        let records = vec![
            record("a", Some("2020/01/01"), Some("post")),
            record("b", Some("2020/01/01"), Some("post")),
            record("c", Some("2021/01/01"), Some("post")),
        ];
        let selected = Selection::with_tie_order(TieOrder::Stable).apply(&records);
        assert_eq!(vec!["c", "a", "b"], ids(&selected));
    }

    #[test]
    fn test_undated_last() {
        let records = vec![
            record("undated", None, Some("post")),
            record("dated", Some("2001/01/01"), Some("post")),
        ];
        assert_eq!(vec!["dated", "undated"], ids(&select_and_order(&records)));
    }

    #[test]
    fn test_empty() {
        let records: Vec<PostRecord> = Vec::new();
        assert!(select_and_order(&records).is_empty());
    }

    #[test]
    fn test_output_is_eligible_subset() {
        let mut draft = record("draft", Some("2020/03/01"), Some("post"));
        draft.draft = Some(true);
        let mut not_found = record("404", Some("2020/04/01"), Some("post"));
        not_found.path = Some(NOT_FOUND_PATH.to_owned());
        let records = vec![
            record("a", Some("2020/01/01"), Some("post")),
            draft,
            not_found,
            record("page", Some("2020/05/01"), Some("page")),
            record("b", Some("2020/02/01"), Some("post")),
            record("c", None, Some("post")),
        ];
        let selection = Selection::default();
        let selected = selection.apply(&records);

        for r in &selected {
            assert!(records.iter().any(|candidate| std::ptr::eq(candidate, *r)));
            assert!(selection.is_eligible(r));
        }
        for r in &records {
            if !selected.iter().any(|s| std::ptr::eq(*s, r)) {
                assert!(!selection.is_eligible(r), "{:?} wrongly dropped", r.title);
            }
        }
        assert_eq!(vec!["b", "a", "c"], ids(&selected));
    }

    #[test]
    fn test_deterministic_and_reapplicable() {
        let records = vec![
            record("a", Some("2020/01/01"), Some("post")),
            record("b", Some("2020/01/01"), Some("post")),
            record("c", Some("2020/02/01"), Some("post")),
            record("page", Some("2020/02/01"), Some("page")),
        ];

        let first = select_and_order(&records);
        let second = select_and_order(&records);
        assert_eq!(ids(&first), ids(&second));

        // Reapplying the reversed policy keeps the same records and the same
        // date order; only runs of equal dates flip.
        let again = select_and_order(first.iter().copied());
        assert_eq!(vec!["c", "a", "b"], ids(&again));
        let dates = |v: &[&PostRecord]| v.iter().map(|r| r.date.clone()).collect::<Vec<_>>();
        assert_eq!(dates(&first), dates(&again));

        // The stable policy is fully idempotent.
        let stable = Selection::with_tie_order(TieOrder::Stable);
        let first = stable.apply(&records);
        let again = stable.apply(first.iter().copied());
        assert_eq!(ids(&first), ids(&again));
    }

    #[test]
    fn test_owned_records() {
        let records = vec![
            record("a", Some("2020/01/01"), Some("post")),
            record("b", Some("2020/06/01"), Some("post")),
        ];
        let selected: Vec<PostRecord> = select_and_order(records);
        assert_eq!(Some("b"), selected[0].title.as_deref());
    }

    #[test]
    fn test_parse_tie_order() {
        assert_eq!(Ok(TieOrder::Stable), "stable".parse::<TieOrder>());
        assert_eq!(Ok(TieOrder::Reversed), "reversed".parse::<TieOrder>());
        assert!("sideways".parse::<TieOrder>().is_err());
        for order in [TieOrder::Reversed, TieOrder::Stable] {
            assert_eq!(Ok(order), order.to_string().parse::<TieOrder>());
        }
    }
}
