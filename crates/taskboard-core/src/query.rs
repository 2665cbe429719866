use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// How a filter field constrains the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Case-insensitive substring match.
    Substring,
    /// Exact equality against a closed set of values.
    Exact,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub name: &'static str,
    pub kind: FilterKind,
}

/// Per-collection configuration for list views: which fields may be
/// filtered and sorted, the default ordering, and the page size.
///
/// One generic codec/executor parameterized by this replaces the
/// per-entity copies of the same logic.
#[derive(Debug, Clone, Copy)]
pub struct ListConfig {
    pub default_sort: &'static str,
    pub per_page: i64,
    pub sortable: &'static [&'static str],
    pub filters: &'static [FilterField],
}

impl ListConfig {
    pub fn filter_kind(&self, name: &str) -> Option<FilterKind> {
        self.filters.iter().find(|f| f.name == name).map(|f| f.kind)
    }

    pub fn is_sortable(&self, field: &str) -> bool {
        self.sortable.contains(&field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Accepts exactly `"asc"` or `"desc"`, case-sensitive. Anything else
    /// is rejected so malformed input can never reach the retrieval layer.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Normalized filter/sort/page state for one list view.
///
/// Immutable by convention: every transition returns a new value which is
/// then re-encoded into the next navigation href, so sort and filter state
/// survives page reloads instead of living in a mutated shared object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub filters: BTreeMap<String, String>,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    /// True when the sort was chosen by the operator rather than defaulted.
    /// An explicit sort is always emitted on encode, even when it equals
    /// the default, so repeated toggles stay reproducible across requests.
    pub sort_explicit: bool,
    pub page: i64,
}

impl QuerySpec {
    pub fn default_for(config: &ListConfig) -> Self {
        Self {
            filters: BTreeMap::new(),
            sort_field: config.default_sort.to_string(),
            sort_direction: SortDirection::Desc,
            sort_explicit: false,
            page: 1,
        }
    }

    /// Decode a flat parameter map into a well-formed spec.
    ///
    /// Unrecognized keys are ignored, empty filter values mean "no
    /// constraint", an unlisted sort field falls back to the default, and
    /// a bad page number becomes 1. Invalid input never produces an error:
    /// list views always render something.
    pub fn decode(params: &HashMap<String, String>, config: &ListConfig) -> Self {
        let mut spec = Self::default_for(config);

        for field in config.filters {
            if let Some(value) = params.get(field.name) {
                if !value.is_empty() {
                    spec.filters.insert(field.name.to_string(), value.clone());
                }
            }
        }

        if let Some(field) = params.get("sort_field") {
            if config.is_sortable(field) {
                spec.sort_field = field.clone();
                spec.sort_explicit = true;
            }
        }
        if spec.sort_explicit {
            if let Some(dir) = params.get("sort_direction").and_then(|d| SortDirection::parse_str(d)) {
                spec.sort_direction = dir;
            }
        }

        if let Some(page) = params.get("page") {
            spec.page = page.parse::<i64>().ok().filter(|p| *p >= 1).unwrap_or(1);
        }

        spec
    }

    /// Encode as ordered key/value pairs suitable for a query string.
    ///
    /// Keys at their default value are omitted to keep generated links
    /// minimal, except an explicitly chosen sort which is always kept.
    pub fn encode_pairs(&self, config: &ListConfig) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for field in config.filters {
            if let Some(value) = self.filters.get(field.name) {
                pairs.push((field.name.to_string(), value.clone()));
            }
        }
        if self.sort_explicit {
            pairs.push(("sort_field".into(), self.sort_field.clone()));
            pairs.push(("sort_direction".into(), self.sort_direction.as_str().into()));
        }
        if self.page != 1 {
            pairs.push(("page".into(), self.page.to_string()));
        }
        pairs
    }

    pub fn encode(&self, config: &ListConfig) -> BTreeMap<String, String> {
        self.encode_pairs(config).into_iter().collect()
    }

    pub fn with_page(&self, page: i64) -> Self {
        let mut next = self.clone();
        next.page = page.max(1);
        next
    }

    /// Set or clear a filter. Changing a filter resets to page 1 because
    /// the old page boundary no longer refers to the same row window.
    pub fn with_filter(&self, name: &str, value: Option<&str>) -> Self {
        let mut next = self.clone();
        match value {
            Some(v) if !v.is_empty() => {
                next.filters.insert(name.to_string(), v.to_string());
            }
            _ => {
                next.filters.remove(name);
            }
        }
        next.page = 1;
        next
    }

    /// Column-header sort cycling: clicking the active field flips the
    /// direction, clicking a different field resets to ascending. Fields
    /// outside the sortable whitelist leave the spec unchanged.
    pub fn toggle_sort(&self, field: &str, config: &ListConfig) -> Self {
        if !config.is_sortable(field) {
            return self.clone();
        }
        let mut next = self.clone();
        if field == self.sort_field && self.sort_explicit {
            next.sort_direction = self.sort_direction.flipped();
        } else {
            next.sort_field = field.to_string();
            next.sort_direction = SortDirection::Asc;
        }
        next.sort_explicit = true;
        next.page = 1;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: ListConfig = ListConfig {
        default_sort: "created_at",
        per_page: 10,
        sortable: &["id", "name", "status", "created_at"],
        filters: &[
            FilterField { name: "name", kind: FilterKind::Substring },
            FilterField { name: "status", kind: FilterKind::Exact },
        ],
    };

    fn params(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn decode_of_empty_params_yields_defaults() {
        let spec = QuerySpec::decode(&HashMap::new(), &CONFIG);
        assert_eq!(spec, QuerySpec::default_for(&CONFIG));
        assert_eq!(spec.sort_field, "created_at");
        assert_eq!(spec.sort_direction, SortDirection::Desc);
        assert_eq!(spec.page, 1);
    }

    #[test]
    fn empty_filter_value_means_no_constraint() {
        let spec = QuerySpec::decode(&params(&[("name", ""), ("status", "pending")]), &CONFIG);
        assert!(!spec.filters.contains_key("name"));
        assert_eq!(spec.filters.get("status").unwrap(), "pending");
    }

    #[test]
    fn unknown_sort_field_falls_back_to_default() {
        let spec = QuerySpec::decode(&params(&[("sort_field", "__evil__")]), &CONFIG);
        assert_eq!(spec.sort_field, "created_at");
        assert!(!spec.sort_explicit);
    }

    #[test]
    fn sort_direction_is_case_sensitive() {
        let spec = QuerySpec::decode(
            &params(&[("sort_field", "name"), ("sort_direction", "ASC")]),
            &CONFIG,
        );
        assert_eq!(spec.sort_direction, SortDirection::Desc);

        let spec = QuerySpec::decode(
            &params(&[("sort_field", "name"), ("sort_direction", "asc")]),
            &CONFIG,
        );
        assert_eq!(spec.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn bad_page_values_become_one() {
        for bad in ["0", "-3", "abc", ""] {
            let spec = QuerySpec::decode(&params(&[("page", bad)]), &CONFIG);
            assert_eq!(spec.page, 1, "page={bad:?}");
        }
        let spec = QuerySpec::decode(&params(&[("page", "7")]), &CONFIG);
        assert_eq!(spec.page, 7);
    }

    #[test]
    fn encode_omits_defaults() {
        let spec = QuerySpec::default_for(&CONFIG);
        assert!(spec.encode_pairs(&CONFIG).is_empty());
    }

    #[test]
    fn explicit_sort_is_preserved_even_at_default_field() {
        let spec = QuerySpec::default_for(&CONFIG).toggle_sort("created_at", &CONFIG);
        let encoded = spec.encode(&CONFIG);
        assert_eq!(encoded.get("sort_field").unwrap(), "created_at");
        assert_eq!(encoded.get("sort_direction").unwrap(), "asc");
    }

    #[test]
    fn decode_encode_roundtrip() {
        let original = QuerySpec::decode(
            &params(&[
                ("name", "Apollo"),
                ("status", "pending"),
                ("sort_field", "name"),
                ("sort_direction", "asc"),
                ("page", "3"),
            ]),
            &CONFIG,
        );
        let encoded: HashMap<String, String> = original.encode(&CONFIG).into_iter().collect();
        let decoded = QuerySpec::decode(&encoded, &CONFIG);
        assert_eq!(decoded, original);
    }

    #[test]
    fn roundtrip_of_defaults() {
        let original = QuerySpec::default_for(&CONFIG);
        let encoded: HashMap<String, String> = original.encode(&CONFIG).into_iter().collect();
        assert_eq!(QuerySpec::decode(&encoded, &CONFIG), original);
    }

    #[test]
    fn toggle_cycles_direction_on_same_field_and_resets_on_new_field() {
        let spec = QuerySpec::default_for(&CONFIG);

        let spec = spec.toggle_sort("name", &CONFIG);
        assert_eq!((spec.sort_field.as_str(), spec.sort_direction), ("name", SortDirection::Asc));

        let spec = spec.toggle_sort("name", &CONFIG);
        assert_eq!((spec.sort_field.as_str(), spec.sort_direction), ("name", SortDirection::Desc));

        let spec = spec.toggle_sort("created_at", &CONFIG);
        assert_eq!(
            (spec.sort_field.as_str(), spec.sort_direction),
            ("created_at", SortDirection::Asc)
        );
    }

    #[test]
    fn toggle_on_unknown_field_is_a_noop() {
        let spec = QuerySpec::default_for(&CONFIG);
        assert_eq!(spec.toggle_sort("password", &CONFIG), spec);
    }

    #[test]
    fn toggle_does_not_mutate_the_original() {
        let spec = QuerySpec::default_for(&CONFIG);
        let _ = spec.toggle_sort("name", &CONFIG);
        assert_eq!(spec.sort_field, "created_at");
        assert!(!spec.sort_explicit);
    }

    #[test]
    fn filter_change_resets_page() {
        let spec = QuerySpec::default_for(&CONFIG).with_page(4);
        let spec = spec.with_filter("name", Some("Apollo"));
        assert_eq!(spec.page, 1);
        let spec = spec.with_filter("name", None);
        assert!(spec.filters.is_empty());
    }
}
