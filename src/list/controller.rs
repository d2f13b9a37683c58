use super::{
    ClientPagination, ListQuery, ListResult, PageEvents, PageView, PaginationStrategy,
    Searchable, ServerPagination, SEARCH_DEBOUNCE_MS,
};
use crate::api::{ApiClient, ApiError, ApiResult};
use crate::cache::ListCache;
use crate::debounce::use_debounced;
use crate::models::{Cliente, DocumentKind, RecordRow};
use leptos::logging::{log, warn};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::future::Future;

/// Something that can produce one page of rows for a query.
pub(crate) trait ListSource: Clone + Send + Sync + 'static {
    type Row: Clone + Send + Sync + 'static;

    fn fetch(&self, query: ListQuery) -> impl Future<Output = ApiResult<ListResult<Self::Row>>>;
}

/// Something that returns its whole collection at once.
pub(crate) trait CollectionSource: Clone + Send + Sync + 'static {
    type Row: Clone + Searchable + Send + Sync + 'static;

    fn fetch_all(&self) -> impl Future<Output = ApiResult<Vec<Self::Row>>>;
}

#[derive(Clone)]
pub(crate) struct RecordSource {
    pub api: ApiClient,
    pub kind: DocumentKind,
}

impl ListSource for RecordSource {
    type Row = RecordRow;

    fn fetch(&self, query: ListQuery) -> impl Future<Output = ApiResult<ListResult<RecordRow>>> {
        let api = self.api.clone();
        let kind = self.kind;
        async move { api.list_records(kind, &query).await }
    }
}

#[derive(Clone)]
pub(crate) struct ClienteSource {
    pub api: ApiClient,
}

impl CollectionSource for ClienteSource {
    type Row = Cliente;

    fn fetch_all(&self) -> impl Future<Output = ApiResult<Vec<Cliente>>> {
        let api = self.api.clone();
        async move { api.list_all_clientes().await }
    }
}

/// Writes server-mode navigation back into the query signal.
#[derive(Clone, Copy)]
pub(crate) struct QueryEvents(pub RwSignal<ListQuery>);

impl PageEvents for QueryEvents {
    fn page_changed(&self, page: usize) {
        if self.0.with_untracked(|q| q.page != page) {
            self.0.update(|q| q.go_to_page(page));
        }
    }

    fn page_size_changed(&self, size: usize) {
        if self.0.with_untracked(|q| q.page_size != size) {
            self.0.update(|q| q.set_page_size(size));
        }
    }

    fn search_changed(&self, text: &str) {
        if self.0.with_untracked(|q| q.search_text != text) {
            self.0.update(|q| {
                q.set_search_text(text);
            });
        }
    }
}

/// Backend-paginated list view state.
///
/// The raw search text is echoed to the input immediately; only its
/// debounced projection reaches the query. Every query change (or
/// [`refresh`](Self::refresh)) triggers exactly one fetch; cached pages are
/// shown while it is in flight.
pub(crate) struct ServerListController<S: ListSource> {
    source: StoredValue<S>,
    cache: StoredValue<ListCache<S::Row>>,
    refresh_tick: RwSignal<u64>,
    on_unauthorized: Callback<()>,
    pub search_input: RwSignal<String>,
    pub query: RwSignal<ListQuery>,
    pub result: RwSignal<ListResult<S::Row>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
}

impl<S: ListSource> Clone for ServerListController<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ListSource> Copy for ServerListController<S> {}

impl<S: ListSource> ServerListController<S> {
    pub fn new(source: S, page_size: usize, on_unauthorized: Callback<()>) -> Self {
        let query = ListQuery::new(page_size);
        let ctl = Self {
            source: StoredValue::new(source),
            cache: StoredValue::new(ListCache::default()),
            refresh_tick: RwSignal::new(0),
            on_unauthorized,
            search_input: RwSignal::new(String::new()),
            result: RwSignal::new(ListResult::empty(&query)),
            query: RwSignal::new(query),
            loading: RwSignal::new(false),
            error: RwSignal::new(None),
        };

        let debounced = use_debounced::<String>(ctl.search_input.into(), SEARCH_DEBOUNCE_MS);
        Effect::new(move |_| {
            let text = debounced.get();
            QueryEvents(ctl.query).search_changed(&text);
        });

        Effect::new(move |_| {
            let _tick = ctl.refresh_tick.get();
            let q = ctl.query.get();
            ctl.load(q);
        });

        ctl
    }

    fn load(self, query: ListQuery) {
        let Some(ticket) = self.cache.try_update_value(|c| c.begin(&query)) else {
            return;
        };

        if let Some(Some(cached)) = self.cache.try_with_value(|c| c.lookup(&query)) {
            let _ = self.result.try_set(cached);
        }
        let _ = self.loading.try_set(true);
        let _ = self.error.try_set(None);

        let source = self.source.get_value();
        spawn_local(async move {
            let res = source.fetch(query).await;

            match res {
                Ok(page) => {
                    let current = self
                        .cache
                        .try_update_value(|c| c.complete(&ticket, page.clone()))
                        .unwrap_or(false);
                    if !current {
                        log!("Ignoring stale list response for {:?}", ticket.key());
                        return;
                    }
                    let _ = self.result.try_set(page);
                }
                Err(e) => {
                    let current = self
                        .cache
                        .try_with_value(|c| c.is_current(&ticket))
                        .unwrap_or(false);
                    if !current {
                        return;
                    }
                    if e.is_unauthorized() {
                        warn!("List request unauthorized; signing out");
                        self.on_unauthorized.run(());
                    } else {
                        let _ = self.error.try_set(Some(e.to_string()));
                    }
                }
            }
            let _ = self.loading.try_set(false);
        });
    }

    /// Drop cached pages and refetch the current query once.
    pub fn refresh(&self) {
        self.cache.update_value(|c| c.invalidate());
        self.refresh_tick.update(|t| *t = t.wrapping_add(1));
    }

    /// Point the query at page 1 without triggering a fetch; the next
    /// [`refresh`](Self::refresh) loads it.
    pub fn first_page_silently(&self) {
        self.query.update_untracked(|q| q.go_to_page(1));
    }

    pub fn is_disposed(&self) -> bool {
        self.query.is_disposed()
    }

    pub fn pager(&self) -> ServerPagination<S::Row, QueryEvents> {
        ServerPagination::new(self.result.get(), QueryEvents(self.query))
    }

    pub fn go_to_page(&self, page: usize) {
        let mut pager = ServerPagination::new(self.result.get_untracked(), QueryEvents(self.query));
        pager.go_to_page(page);
    }

    pub fn set_page_size(&self, size: usize) {
        let mut pager = ServerPagination::new(self.result.get_untracked(), QueryEvents(self.query));
        pager.set_page_size(size);
    }

    pub fn view(&self) -> PageView<S::Row> {
        self.pager().view()
    }
}

/// Locally paginated list view state.
pub(crate) struct ClientListController<S: CollectionSource> {
    source: StoredValue<S>,
    request_id: RwSignal<u64>,
    refresh_tick: RwSignal<u64>,
    on_unauthorized: Callback<()>,
    pub search_input: RwSignal<String>,
    pub pager: RwSignal<ClientPagination<S::Row>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
}

impl<S: CollectionSource> Clone for ClientListController<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: CollectionSource> Copy for ClientListController<S> {}

impl<S: CollectionSource> ClientListController<S> {
    pub fn new(source: S, page_size: usize, on_unauthorized: Callback<()>) -> Self {
        let ctl = Self {
            source: StoredValue::new(source),
            request_id: RwSignal::new(0),
            refresh_tick: RwSignal::new(0),
            on_unauthorized,
            search_input: RwSignal::new(String::new()),
            pager: RwSignal::new(ClientPagination::new(Vec::new(), page_size)),
            loading: RwSignal::new(false),
            error: RwSignal::new(None),
        };

        let debounced = use_debounced::<String>(ctl.search_input.into(), SEARCH_DEBOUNCE_MS);
        Effect::new(move |_| {
            let text = debounced.get();
            ctl.pager.update(|p| p.set_filter(&text));
        });

        Effect::new(move |_| {
            let _tick = ctl.refresh_tick.get();
            ctl.load();
        });

        ctl
    }

    fn load(self) {
        let Some(req_id) = self.request_id.try_get_untracked().map(|id| id.saturating_add(1)) else {
            return;
        };
        self.request_id.set(req_id);
        self.loading.set(true);
        self.error.set(None);

        let Some(source) = self.source.try_get_value() else {
            return;
        };
        spawn_local(async move {
            let res = source.fetch_all().await;
            self.finish(req_id, res);
        });
    }

    /// Apply a finished fetch. Superseded responses and responses that land
    /// after the view was torn down are dropped.
    fn finish(self, req_id: u64, res: ApiResult<Vec<S::Row>>) {
        match self.request_id.try_get_untracked() {
            Some(current) if current == req_id => {}
            Some(_) => {
                log!("Ignoring stale collection response #{req_id}");
                return;
            }
            None => return,
        }

        match res {
            Ok(rows) => {
                let _ = self.pager.try_update(|p| p.replace_source(rows));
            }
            Err(ApiError::Unauthorized) => {
                warn!("Collection request unauthorized; signing out");
                self.on_unauthorized.run(());
            }
            Err(e) => {
                let _ = self.error.try_set(Some(e.to_string()));
            }
        }
        let _ = self.loading.try_set(false);
    }

    pub fn refresh(&self) {
        self.refresh_tick.update(|t| *t = t.wrapping_add(1));
    }

    pub fn view(&self) -> PageView<S::Row> {
        self.pager.with(|p| p.view())
    }

    pub fn go_to_page(&self, page: usize) {
        self.pager.update(|p| p.go_to_page(page));
    }

    pub fn set_page_size(&self, size: usize) {
        self.pager.update(|p| p.set_page_size(size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::ready;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct Fixed;

    impl CollectionSource for Fixed {
        type Row = Cliente;

        fn fetch_all(&self) -> impl Future<Output = ApiResult<Vec<Cliente>>> {
            ready(Ok(vec![]))
        }
    }

    fn acme() -> Cliente {
        Cliente {
            id: 1,
            name: Some("ACME".into()),
            ..Default::default()
        }
    }

    /// Controller state as it looks while request #1 is in flight.
    fn in_flight(signed_out: Arc<AtomicUsize>) -> ClientListController<Fixed> {
        ClientListController {
            source: StoredValue::new(Fixed),
            request_id: RwSignal::new(1),
            refresh_tick: RwSignal::new(0),
            on_unauthorized: Callback::new(move |_| {
                signed_out.fetch_add(1, Ordering::SeqCst);
            }),
            search_input: RwSignal::new(String::new()),
            pager: RwSignal::new(ClientPagination::new(Vec::new(), 10)),
            loading: RwSignal::new(true),
            error: RwSignal::new(None),
        }
    }

    #[test]
    fn test_current_response_fills_the_pager() {
        let owner = Owner::new();
        let ctl = owner.with(|| in_flight(Arc::default()));

        ctl.finish(1, Ok(vec![acme()]));

        assert_eq!(ctl.view().total, 1);
        assert!(!ctl.loading.get_untracked());
    }

    #[test]
    fn test_superseded_response_is_ignored() {
        let owner = Owner::new();
        let ctl = owner.with(|| in_flight(Arc::default()));
        ctl.request_id.set(2);

        ctl.finish(1, Ok(vec![acme()]));

        assert_eq!(ctl.view().total, 0);
        assert!(ctl.loading.get_untracked());
    }

    #[test]
    fn test_unauthorized_runs_handler_once() {
        let signed_out = Arc::new(AtomicUsize::new(0));
        let owner = Owner::new();
        let ctl = owner.with(|| in_flight(signed_out.clone()));

        ctl.finish(1, Err(ApiError::Unauthorized));

        assert_eq!(signed_out.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_response_after_unmount_is_dropped() {
        let signed_out = Arc::new(AtomicUsize::new(0));
        let owner = Owner::new();
        let ctl = owner.with(|| in_flight(signed_out.clone()));
        owner.cleanup();

        ctl.finish(1, Ok(vec![acme()]));
        ctl.finish(1, Err(ApiError::Unauthorized));
        ctl.finish(1, Err(ApiError::Network("offline".into())));
        ctl.load();

        assert_eq!(signed_out.load(Ordering::SeqCst), 0);
        assert!(ctl.request_id.try_get_untracked().is_none());
    }
}
