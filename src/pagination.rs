//! Length-aware pagination for listing pages.
//!
//! Every generated URL carries the query string of the current request
//! (minus `page`), so paging through a filtered listing keeps the filter.

use serde::Serialize;
use url::form_urlencoded;

pub const PER_PAGE: u64 = 10;

/// Pages shown on each side of the current one in `links`.
const ON_EACH_SIDE: u64 = 3;

const PREVIOUS_LABEL: &str = "&laquo; Previous";
const NEXT_LABEL: &str = "Next &raquo;";

/// Parse a `page` query value; anything unusable means the first page.
pub fn page_number(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Link {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginator<T> {
    pub current_page: u64,
    pub data: Vec<T>,
    pub first_page_url: String,
    pub from: Option<u64>,
    pub last_page: u64,
    pub last_page_url: String,
    pub links: Vec<Link>,
    pub next_page_url: Option<String>,
    pub path: String,
    pub per_page: u64,
    pub prev_page_url: Option<String>,
    pub to: Option<u64>,
    pub total: u64,
}

/// Where generated page URLs point.
#[derive(Debug, Clone, Default)]
pub struct PageUrls {
    path: String,
    query: Vec<(String, String)>,
}

impl PageUrls {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Keep the current query parameters in every link.
    pub fn with_query_string(mut self, query: &[(String, String)]) -> Self {
        self.query = query
            .iter()
            .filter(|(key, _)| key != "page")
            .cloned()
            .collect();
        self
    }

    pub fn url(&self, page: u64) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.query {
            serializer.append_pair(key, value);
        }
        serializer.append_pair("page", &page.to_string());
        format!("{}?{}", self.path, serializer.finish())
    }
}

impl<T> Paginator<T> {
    pub fn new(data: Vec<T>, total: u64, per_page: u64, current_page: u64, urls: &PageUrls) -> Self {
        let per_page = per_page.max(1);
        let current_page = current_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);

        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = (current_page - 1) * per_page + 1;
            (Some(from), Some(from + data.len() as u64 - 1))
        };

        let prev_page_url = (current_page > 1).then(|| urls.url(current_page - 1));
        let next_page_url = (current_page < last_page).then(|| urls.url(current_page + 1));

        let mut links = Vec::new();
        links.push(Link {
            url: prev_page_url.clone(),
            label: PREVIOUS_LABEL.to_string(),
            active: false,
        });
        for element in window(current_page, last_page) {
            links.push(match element {
                Some(page) => Link {
                    url: Some(urls.url(page)),
                    label: page.to_string(),
                    active: page == current_page,
                },
                None => Link {
                    url: None,
                    label: "...".to_string(),
                    active: false,
                },
            });
        }
        links.push(Link {
            url: next_page_url.clone(),
            label: NEXT_LABEL.to_string(),
            active: false,
        });

        Self {
            current_page,
            data,
            first_page_url: urls.url(1),
            from,
            last_page,
            last_page_url: urls.url(last_page),
            links,
            next_page_url,
            path: urls.path.clone(),
            per_page,
            prev_page_url,
            to,
            total,
        }
    }
}

/// Numbered page elements; `None` marks a "..." gap.
fn window(current: u64, last: u64) -> Vec<Option<u64>> {
    let range = |start: u64, end: u64| (start.max(1)..=end.min(last)).map(Some);

    if last < ON_EACH_SIDE * 2 + 8 {
        return range(1, last).collect();
    }

    let edge = ON_EACH_SIDE + 4;
    let mut elements = Vec::new();

    if current <= edge {
        elements.extend(range(1, edge + ON_EACH_SIDE));
        elements.push(None);
        elements.extend(range(last - 1, last));
    } else if current > last - edge {
        elements.extend(range(1, 2));
        elements.push(None);
        elements.extend(range(last - (edge + ON_EACH_SIDE - 1), last));
    } else {
        elements.extend(range(1, 2));
        elements.push(None);
        elements.extend(range(current - ON_EACH_SIDE, current + ON_EACH_SIDE));
        elements.push(None);
        elements.extend(range(last - 1, last));
    }

    elements
}
