//! Client-side filtering and sorting over an already fetched list.
//!
//! Everything here is pure: a [`ListQuery`] is applied to a slice of records
//! and yields references in display order. Changing the query never triggers
//! a fetch.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use time::macros::format_description;

pub use time::Date;

/// A record that can be shown in a filtered list.
pub trait ListRecord {
    /// Text fields the free-text search runs over. A record matches when any
    /// of them contains the search term.
    fn search_fields(&self) -> Vec<&str>;

    /// Wire value of a filterable field such as `status` or `priority`.
    /// `None` means the record has no such field or no value for it.
    fn facet(&self, name: &str) -> Option<&str>;

    /// Tab predicate. Records with no notion of buckets are in every bucket.
    fn in_bucket(&self, _bucket: &str) -> bool {
        true
    }

    fn sort_value(&self, key: &str) -> SortValue;
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Number(i64),
    Text(String),
    Missing,
}

impl SortValue {
    pub fn text(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => SortValue::Text(v.to_lowercase()),
            _ => SortValue::Missing,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(String),
    /// Case-insensitive substring, for fields the server matches loosely.
    Contains(String),
}

impl Selection {
    /// `"all"` and the empty string both mean "no filter".
    pub fn parse(raw: &str) -> Self {
        match Self::wanted(raw) {
            Some(value) => Selection::Only(value),
            None => Selection::All,
        }
    }

    pub fn contains(raw: &str) -> Self {
        match Self::wanted(raw) {
            Some(value) => Selection::Contains(value),
            None => Selection::All,
        }
    }

    fn wanted(raw: &str) -> Option<String> {
        let raw = raw.trim();
        (!raw.is_empty() && !raw.eq_ignore_ascii_case("all")).then(|| raw.to_string())
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value == Some(wanted.as_str()),
            Selection::Contains(part) => value
                .is_some_and(|v| v.to_lowercase().contains(&part.to_lowercase())),
        }
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Only(v) | Selection::Contains(v) => Some(v.as_str()),
        }
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("invalid date `{raw}` (expected YYYY-MM-DD): {e}"))
}

/// Inclusive bounds on a record's `date` sort key. Records without a
/// readable date fall outside any bounded range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl DateRange {
    pub fn new(from: Option<Date>, to: Option<Date>) -> Self {
        Self { from, to }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, value: &SortValue) -> bool {
        if self.is_unbounded() {
            return true;
        }
        // Server dates come as `YYYY-MM-DD`, sometimes followed by a time.
        let day = match value {
            SortValue::Text(text) => text.get(..10).and_then(|d| parse_date(d).ok()),
            _ => None,
        };
        day.is_some_and(|day| {
            self.from.is_none_or(|from| day >= from) && self.to.is_none_or(|to| day <= to)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub descending: bool,
}

impl SortSpec {
    /// Parses `key` or `-key` (descending).
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(key) => SortSpec {
                key: key.to_string(),
                descending: true,
            },
            None => SortSpec {
                key: raw.to_string(),
                descending: false,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: String,
    pub facets: BTreeMap<String, Selection>,
    pub bucket: Option<String>,
    pub dates: DateRange,
    pub sort: Option<SortSpec>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn facet(mut self, name: impl Into<String>, raw: &str) -> Self {
        self.facets.insert(name.into(), Selection::parse(raw));
        self
    }

    /// Keeps records whose field contains `raw`, ignoring case.
    pub fn facet_contains(mut self, name: impl Into<String>, raw: &str) -> Self {
        self.facets.insert(name.into(), Selection::contains(raw));
        self
    }

    pub fn dates(mut self, range: DateRange) -> Self {
        self.dates = range;
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn sort(mut self, raw: &str) -> Self {
        self.sort = Some(SortSpec::parse(raw));
        self
    }

    pub fn matches<T: ListRecord>(&self, record: &T) -> bool {
        matches_search(record, &self.search)
            && self
                .facets
                .iter()
                .all(|(name, selection)| selection.matches(record.facet(name)))
            && self
                .bucket
                .as_deref()
                .is_none_or(|bucket| record.in_bucket(bucket))
            && (self.dates.is_unbounded() || self.dates.contains(&record.sort_value("date")))
    }
}

/// The term is used as typed; only the empty string disables the search.
pub fn matches_search<T: ListRecord>(record: &T, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

/// Filters then sorts. The sort is stable, so records with equal keys keep
/// the server's order.
pub fn apply<'a, T: ListRecord>(records: &'a [T], query: &ListQuery) -> Vec<&'a T> {
    let mut out: Vec<&T> = records.iter().filter(|r| query.matches(*r)).collect();
    if let Some(spec) = &query.sort {
        sort_records(&mut out, spec);
    }
    out
}

pub fn sort_records<T: ListRecord>(records: &mut [&T], spec: &SortSpec) {
    records.sort_by(|a, b| {
        compare_values(
            &a.sort_value(&spec.key),
            &b.sort_value(&spec.key),
            spec.descending,
        )
    });
}

// Missing values always go last, whatever the direction.
fn compare_values(a: &SortValue, b: &SortValue, descending: bool) -> Ordering {
    match (a, b) {
        (SortValue::Missing, SortValue::Missing) => Ordering::Equal,
        (SortValue::Missing, _) => Ordering::Greater,
        (_, SortValue::Missing) => Ordering::Less,
        _ if descending => b.cmp(a),
        _ => a.cmp(b),
    }
}
