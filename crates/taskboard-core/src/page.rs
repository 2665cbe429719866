use serde::Serialize;

pub const PREV_LABEL: &str = "&laquo; Previous";
pub const NEXT_LABEL: &str = "Next &raquo;";
pub const ELLIPSIS_LABEL: &str = "...";

/// Pagination facts for one rendered page of a list.
///
/// `current_page` is reported as requested, so a request past the end
/// carries `current_page > last_page` with an empty row set rather than
/// an error. Link building clamps internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub current_page: i64,
    pub last_page: i64,
}

/// One pagination control. `target` is `None` for disabled sentinels and
/// ellipsis markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub label: String,
    pub target: Option<i64>,
    pub active: bool,
}

impl PageLink {
    fn page(target: i64, current: i64) -> Self {
        Self {
            label: target.to_string(),
            target: Some(target),
            active: target == current,
        }
    }

    fn ellipsis() -> Self {
        Self {
            label: ELLIPSIS_LABEL.to_string(),
            target: None,
            active: false,
        }
    }

    fn sentinel(label: &str, target: Option<i64>) -> Self {
        Self {
            label: label.to_string(),
            target,
            active: false,
        }
    }
}

impl PageMetadata {
    pub fn new(current_page: i64, last_page: i64) -> Self {
        Self {
            current_page: current_page.max(1),
            last_page: last_page.max(1),
        }
    }

    pub fn prev_page(&self) -> Option<i64> {
        (self.current_page > 1).then(|| (self.current_page - 1).min(self.last_page))
    }

    pub fn next_page(&self) -> Option<i64> {
        (self.current_page < self.last_page).then(|| self.current_page + 1)
    }

    /// The bounded, ellipsis-compressed control set.
    ///
    /// Up to three pages are shown directly. Beyond that: page 1, the
    /// window within distance 1 of the current page, and the last page,
    /// with a single ellipsis wherever a gap exists. Previous/Next
    /// sentinels bracket the set and are disabled at the edges.
    pub fn page_links(&self) -> Vec<PageLink> {
        let current = self.current_page.min(self.last_page);
        let last = self.last_page;

        let mut links = vec![PageLink::sentinel(PREV_LABEL, self.prev_page())];

        if last <= 3 {
            for page in 1..=last {
                links.push(PageLink::page(page, self.current_page));
            }
        } else {
            links.push(PageLink::page(1, self.current_page));

            let window_start = (current - 1).max(2);
            let window_end = (current + 1).min(last - 1);
            if window_start > 2 {
                links.push(PageLink::ellipsis());
            }
            for page in window_start..=window_end {
                links.push(PageLink::page(page, self.current_page));
            }
            if window_end < last - 1 {
                links.push(PageLink::ellipsis());
            }

            links.push(PageLink::page(last, self.current_page));
        }

        links.push(PageLink::sentinel(NEXT_LABEL, self.next_page()));
        links
    }
}
