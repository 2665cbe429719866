//! The list-response envelope shared by every collection endpoint:
//! `{ data, links: {prev, next}, meta: {current_page, last_page, links} }`,
//! with every href re-encoding the full filter/sort state so navigation
//! never loses it.

use serde::Serialize;
use serde_json::{json, Value};

use taskboard_core::page::PageMetadata;
use taskboard_core::query::{ListConfig, QuerySpec};
use taskboard_db::PageResult;

/// Href for a given page of the same view. Filters and an explicit sort
/// ride along in every generated link.
fn page_url(base_path: &str, spec: &QuerySpec, config: &ListConfig, page: i64) -> String {
    let pairs = spec.with_page(page).encode_pairs(config);
    if pairs.is_empty() {
        return base_path.to_string();
    }
    // Encoding (&str, &str) pairs cannot fail.
    let qs = serde_urlencoded::to_string(&pairs).unwrap_or_default();
    format!("{base_path}?{qs}")
}

pub(crate) fn list_response<T: Serialize>(
    base_path: &str,
    spec: &QuerySpec,
    config: &ListConfig,
    page: PageResult<T>,
) -> Value {
    let meta = PageMetadata::new(page.current_page, page.last_page);
    let url_for = |p: Option<i64>| p.map(|p| page_url(base_path, spec, config, p));

    let links: Vec<Value> = meta
        .page_links()
        .into_iter()
        .map(|link| {
            json!({
                "url": url_for(link.target),
                "label": link.label,
                "active": link.active,
            })
        })
        .collect();

    json!({
        "data": page.rows,
        "links": {
            "prev": url_for(meta.prev_page()),
            "next": url_for(meta.next_page()),
        },
        "meta": {
            "current_page": meta.current_page,
            "last_page": meta.last_page,
            "total": page.total,
            "per_page": page.per_page,
            "links": links,
        },
    })
}
