//! Paginated list state shared by the Cotizaciones, Facturas and Clientes views.
//!
//! Two pagination strategies sit behind [`PaginationStrategy`]:
//!
//! - [`ServerPagination`]: the backend already sliced the page; rows are
//!   shown as received and navigation is reported to the owner through
//!   [`PageEvents`] so it can refetch.
//! - [`ClientPagination`]: the whole source is local; filtering and slicing
//!   happen here.

mod controller;

pub(crate) use controller::{
    ClientListController, ClienteSource, RecordSource, ServerListController,
};

use serde::{Deserialize, Serialize};

pub(crate) const PAGE_SIZE_OPTIONS: [usize; 3] = [10, 25, 50];
pub(crate) const DEFAULT_PAGE_SIZE: usize = 10;
pub(crate) const SEARCH_DEBOUNCE_MS: i32 = 400;

/// Rows that can be matched against the search box.
pub(crate) trait Searchable {
    /// Fields the client-side filter looks at, in display order.
    fn search_fields(&self) -> Vec<&str>;

    fn matches(&self, needle_lower: &str) -> bool {
        if needle_lower.is_empty() {
            return true;
        }
        self.search_fields()
            .join(" ")
            .to_lowercase()
            .contains(needle_lower)
    }
}

impl Searchable for crate::models::RecordRow {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            &self.date,
            &self.code,
            &self.client,
            &self.description,
            &self.amount,
        ]
    }
}

impl Searchable for crate::models::Cliente {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.known_name().unwrap_or_default(),
            self.company(),
            self.email.as_deref().unwrap_or_default(),
            self.phone().unwrap_or_default(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) struct ListQuery {
    pub search_text: String,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListQuery {
    pub fn new(page_size: usize) -> Self {
        Self {
            search_text: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Returns `true` if the text changed; a change always goes back to page 1.
    pub fn set_search_text(&mut self, text: &str) -> bool {
        if self.search_text == text {
            return false;
        }
        self.search_text = text.to_string();
        self.page = 1;
        true
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.page = 1;
    }
}

/// One page of rows as produced by a fetch (server mode) or the full
/// source (client mode).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ListResult<R> {
    pub rows: Vec<R>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<R> ListResult<R> {
    pub fn empty(query: &ListQuery) -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
            page: query.page,
            page_size: query.page_size,
        }
    }
}

pub(crate) fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// "Mostrando a–b de n" bounds, 1-based and inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DisplayRange {
    pub first: usize,
    pub last: usize,
    pub total: usize,
}

impl DisplayRange {
    /// `None` when there is nothing to paginate (controls are hidden).
    pub fn compute(page: usize, page_size: usize, total: usize) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let start = (page.max(1) - 1) * page_size;
        let end = start + page_size;
        Some(Self {
            first: (start + 1).min(total),
            last: end.min(total),
            total,
        })
    }

    pub fn label(&self) -> String {
        format!("Mostrando {}–{} de {}", self.first, self.last, self.total)
    }
}

/// Everything the table needs to render one frame.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PageView<R> {
    pub rows: Vec<R>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub range: Option<DisplayRange>,
}

impl<R> PageView<R> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

pub(crate) trait PaginationStrategy {
    type Row: Clone;

    fn page(&self) -> usize;
    fn page_size(&self) -> usize;
    /// Number of rows across all pages (after filtering, in client mode).
    fn total(&self) -> usize;
    fn visible_rows(&self) -> Vec<Self::Row>;

    fn go_to_page(&mut self, page: usize);
    fn set_page_size(&mut self, size: usize);
    /// Called with the debounced search text.
    fn set_filter(&mut self, text: &str);

    fn total_pages(&self) -> usize {
        total_pages(self.total(), self.page_size())
    }

    fn display_range(&self) -> Option<DisplayRange> {
        DisplayRange::compute(self.page(), self.page_size(), self.total())
    }

    fn view(&self) -> PageView<Self::Row> {
        PageView {
            rows: self.visible_rows(),
            page: self.page(),
            page_size: self.page_size(),
            total: self.total(),
            total_pages: self.total_pages(),
            range: self.display_range(),
        }
    }
}

/// Receiver for navigation requests in server mode.
pub(crate) trait PageEvents {
    fn page_changed(&self, page: usize);
    fn page_size_changed(&self, size: usize);
    fn search_changed(&self, text: &str);
}

/// Backend-paginated rows. Holds no navigation state of its own: the page
/// shown is whatever the last [`ListResult`] says.
#[derive(Clone, Debug)]
pub(crate) struct ServerPagination<R, E> {
    result: ListResult<R>,
    events: E,
}

impl<R, E> ServerPagination<R, E> {
    pub fn new(result: ListResult<R>, events: E) -> Self {
        Self { result, events }
    }
}

impl<R: Clone, E: PageEvents> PaginationStrategy for ServerPagination<R, E> {
    type Row = R;

    fn page(&self) -> usize {
        self.result.page.max(1)
    }

    fn page_size(&self) -> usize {
        self.result.page_size.max(1)
    }

    fn total(&self) -> usize {
        self.result.total
    }

    fn visible_rows(&self) -> Vec<R> {
        self.result.rows.clone()
    }

    fn go_to_page(&mut self, page: usize) {
        self.events.page_changed(page);
    }

    fn set_page_size(&mut self, size: usize) {
        self.events.page_size_changed(size);
        self.events.page_changed(1);
    }

    fn set_filter(&mut self, text: &str) {
        self.events.search_changed(text);
    }
}

/// Locally filtered and sliced rows.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ClientPagination<R> {
    source: Vec<R>,
    filter_lower: String,
    page: usize,
    page_size: usize,
}

impl<R> Default for ClientPagination<R> {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_PAGE_SIZE)
    }
}

impl<R> ClientPagination<R> {
    pub fn new(source: Vec<R>, page_size: usize) -> Self {
        Self {
            source,
            filter_lower: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Swap the source rows (e.g. after a refetch) keeping filter and page size.
    pub fn replace_source(&mut self, source: Vec<R>) {
        self.source = source;
        self.page = 1;
    }
}

impl<R: Searchable> ClientPagination<R> {
    fn filtered(&self) -> impl Iterator<Item = &R> {
        let needle = self.filter_lower.as_str();
        self.source.iter().filter(move |r| r.matches(needle))
    }
}

impl<R: Clone + Searchable> PaginationStrategy for ClientPagination<R> {
    type Row = R;

    fn page(&self) -> usize {
        self.page
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn total(&self) -> usize {
        self.filtered().count()
    }

    fn visible_rows(&self) -> Vec<R> {
        let start = (self.page - 1) * self.page_size;
        self.filtered()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect()
    }

    fn go_to_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages());
    }

    fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.page = 1;
    }

    fn set_filter(&mut self, text: &str) {
        let next = text.trim().to_lowercase();
        if next != self.filter_lower {
            self.filter_lower = next;
        }
        // Reset even if only whitespace changed; the debounced value moved.
        self.page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordRow;
    use std::cell::RefCell;

    #[derive(Clone, Debug, PartialEq)]
    struct Item(String);

    impl Searchable for Item {
        fn search_fields(&self) -> Vec<&str> {
            vec![&self.0]
        }
    }

    fn items(n: usize) -> Vec<Item> {
        (1..=n).map(|i| Item(format!("item {i}"))).collect()
    }

    #[derive(Debug, PartialEq)]
    enum Ev {
        Page(usize),
        PageSize(usize),
        Search(String),
    }

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Ev>>);

    impl PageEvents for &Recorder {
        fn page_changed(&self, page: usize) {
            self.0.borrow_mut().push(Ev::Page(page));
        }
        fn page_size_changed(&self, size: usize) {
            self.0.borrow_mut().push(Ev::PageSize(size));
        }
        fn search_changed(&self, text: &str) {
            self.0.borrow_mut().push(Ev::Search(text.to_string()));
        }
    }

    fn row(code: &str, client: &str) -> RecordRow {
        RecordRow {
            id: 1,
            date: "2024-01-02".to_string(),
            code: code.to_string(),
            client: client.to_string(),
            description: "Tarjetas de presentación".to_string(),
            amount: "1500.00".to_string(),
            ncf: None,
        }
    }

    #[test]
    fn test_client_visible_len_matches_formula() {
        for s in [0usize, 1, 9, 10, 11, 25, 57] {
            for p in PAGE_SIZE_OPTIONS {
                let pages = total_pages(s, p);
                for k in 1..=pages {
                    let mut pager = ClientPagination::new(items(s), p);
                    pager.go_to_page(k);
                    let expected = p.min(s.saturating_sub((k - 1) * p));
                    assert_eq!(pager.visible_rows().len(), expected, "S={s} P={p} K={k}");
                }
            }
        }
    }

    #[test]
    fn test_client_go_to_page_clamps() {
        let mut pager = ClientPagination::new(items(23), 10);
        pager.go_to_page(99);
        assert_eq!(pager.page(), 3);
        assert_eq!(pager.visible_rows(), vec![Item("item 21".into()), Item("item 22".into()), Item("item 23".into())]);

        pager.go_to_page(0);
        assert_eq!(pager.page(), 1);
    }

    #[test]
    fn test_client_filter_resets_page_and_is_case_insensitive() {
        let mut source = items(30);
        source.push(Item("Especial IMPRESO".into()));
        let mut pager = ClientPagination::new(source, 10);
        pager.go_to_page(3);
        assert_eq!(pager.page(), 3);

        pager.set_filter("  impreso ");
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.total(), 1);
        assert_eq!(pager.visible_rows(), vec![Item("Especial IMPRESO".into())]);

        pager.set_filter("");
        assert_eq!(pager.total(), 31);
    }

    #[test]
    fn test_client_page_size_change_resets_page() {
        let mut pager = ClientPagination::new(items(100), 10);
        pager.go_to_page(3);
        pager.set_page_size(25);
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.page_size(), 25);
        assert_eq!(pager.visible_rows().len(), 25);
    }

    #[test]
    fn test_record_row_filter_fields() {
        let mut pager = ClientPagination::new(
            vec![row("COT-001", "Ferretería Ochoa"), row("COT-002", "Panadería Luz")],
            10,
        );
        pager.set_filter("ochoa");
        assert_eq!(pager.visible_rows().len(), 1);
        pager.set_filter("cot-00");
        assert_eq!(pager.visible_rows().len(), 2);
        pager.set_filter("1500");
        assert_eq!(pager.visible_rows().len(), 2);
    }

    #[test]
    fn test_server_rows_are_trusted() {
        let rec = Recorder::default();
        let rows = vec![row("A", "x"), row("B", "y"), row("C", "z")];
        let mut pager = ServerPagination::new(
            ListResult {
                rows: rows.clone(),
                total: 3,
                page: 7,
                page_size: 2,
            },
            &rec,
        );
        // Even when the slice is inconsistent with page/page_size.
        assert_eq!(pager.visible_rows(), rows);

        pager.set_filter("nothing matches");
        assert_eq!(pager.visible_rows(), rows);
        assert_eq!(*rec.0.borrow(), vec![Ev::Search("nothing matches".into())]);
    }

    #[test]
    fn test_server_navigation_is_delegated() {
        let rec = Recorder::default();
        let mut pager = ServerPagination::new(
            ListResult {
                rows: vec![row("A", "x")],
                total: 40,
                page: 3,
                page_size: 10,
            },
            &rec,
        );

        pager.go_to_page(4);
        pager.set_page_size(25);
        assert_eq!(
            *rec.0.borrow(),
            vec![Ev::Page(4), Ev::PageSize(25), Ev::Page(1)]
        );
        // Controlled: nothing changes until a new result arrives.
        assert_eq!(pager.page(), 3);
    }

    #[test]
    fn test_query_page_size_change_from_page_three() {
        let mut q = ListQuery::new(10);
        q.go_to_page(3);
        q.set_page_size(25);
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 25);
    }

    #[test]
    fn test_query_search_change_resets_page() {
        let mut q = ListQuery::new(10);
        q.go_to_page(5);
        assert!(!q.set_search_text(""));
        assert_eq!(q.page, 5);

        assert!(q.set_search_text("ochoa"));
        assert_eq!(q.page, 1);
    }

    #[test]
    fn test_display_range() {
        assert_eq!(DisplayRange::compute(1, 10, 0), None);

        let r = DisplayRange::compute(3, 10, 23).expect("range");
        assert_eq!((r.first, r.last, r.total), (21, 23, 23));
        assert_eq!(r.label(), "Mostrando 21–23 de 23");

        // Out-of-range page still produces clamped bounds.
        let r = DisplayRange::compute(9, 10, 23).expect("range");
        assert_eq!((r.first, r.last), (23, 23));
    }

    #[test]
    fn test_total_pages_never_zero() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_page_view_navigation_flags() {
        let mut pager = ClientPagination::new(items(15), 10);
        let v = pager.view();
        assert!(!v.has_prev());
        assert!(v.has_next());

        pager.go_to_page(2);
        let v = pager.view();
        assert!(v.has_prev());
        assert!(!v.has_next());
        assert_eq!(v.range.map(|r| r.label()), Some("Mostrando 11–15 de 15".to_string()));
    }
}
