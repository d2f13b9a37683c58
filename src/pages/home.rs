use crate::api::{ApiClient, ApiResult};
use crate::components::ui::{Card, CardContent, CardHeader, CardTitle, MetricCard};
use crate::list::ListQuery;
use crate::models::{DocumentKind, RecordRow};
use crate::state::AppContext;
use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::future::Future;

const RECENT_QUOTES: usize = 5;

/// Run `fetch` and put its display value in `slot`. Failures leave the
/// tile on its placeholder.
fn load_metric<F, Fut>(
    app: AppContext,
    slot: RwSignal<Option<String>>,
    pending: RwSignal<usize>,
    fetch: F,
) where
    F: FnOnce(ApiClient) -> Fut + 'static,
    Fut: Future<Output = ApiResult<Option<String>>> + 'static,
{
    pending.update(|n| *n += 1);
    let api = app.0.api();
    spawn_local(async move {
        match fetch(api).await {
            Ok(value) => {
                let _ = slot.try_set(value);
            }
            Err(e) if e.is_unauthorized() => app.0.expire_session(),
            Err(e) => warn!("Dashboard metric failed: {e}"),
        }
        let _ = pending.try_update(|n| *n = n.saturating_sub(1));
    });
}

/// A list total, read from a one-row page.
async fn record_total(api: ApiClient, kind: DocumentKind) -> ApiResult<Option<String>> {
    let page = api.list_records(kind, &ListQuery::new(1)).await?;
    Ok(Some(page.total.to_string()))
}

async fn cliente_total(api: ApiClient) -> ApiResult<Option<String>> {
    let page = api.list_clientes(&ListQuery::new(1)).await?;
    Ok(Some(page.total.to_string()))
}

async fn last_ncf(api: ApiClient) -> ApiResult<Option<String>> {
    Ok(api.ncf_sequence().await?.last_ncf())
}

#[component]
pub fn HomePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let facturas: RwSignal<Option<String>> = RwSignal::new(None);
    let cotizaciones: RwSignal<Option<String>> = RwSignal::new(None);
    let clientes: RwSignal<Option<String>> = RwSignal::new(None);
    let ncf: RwSignal<Option<String>> = RwSignal::new(None);
    let pending: RwSignal<usize> = RwSignal::new(0);

    let recent: RwSignal<Vec<RecordRow>> = RwSignal::new(vec![]);
    let recent_loading: RwSignal<bool> = RwSignal::new(true);

    load_metric(app_state, facturas, pending, |api| {
        record_total(api, DocumentKind::Factura)
    });
    load_metric(app_state, cotizaciones, pending, |api| {
        record_total(api, DocumentKind::Cotizacion)
    });
    load_metric(app_state, clientes, pending, cliente_total);
    load_metric(app_state, ncf, pending, last_ncf);

    let api = app_state.0.api();
    spawn_local(async move {
        let query = ListQuery::new(RECENT_QUOTES);
        match api.list_records(DocumentKind::Cotizacion, &query).await {
            Ok(page) => {
                let _ = recent.try_set(page.rows);
            }
            Err(e) => warn!("Recent cotizaciones failed: {e}"),
        }
        let _ = recent_loading.try_set(false);
    });

    let loading = Signal::derive(move || pending.get() > 0);

    view! {
        <div class="space-y-6">
            <h1 class="text-xl font-semibold">"Inicio"</h1>

            <div class="grid grid-cols-2 gap-3 md:grid-cols-4">
                <MetricCard label="Facturas" value=facturas loading=loading />
                <MetricCard label="Cotizaciones" value=cotizaciones loading=loading />
                <MetricCard label="Clientes" value=clientes loading=loading />
                <MetricCard label="Último NCF" value=ncf loading=loading />
            </div>

            <Card>
                <CardHeader>
                    <CardTitle class="text-sm">"Cotizaciones recientes"</CardTitle>
                </CardHeader>
                <CardContent>
                    {move || {
                        if recent_loading.get() {
                            return view! { <div class="text-xs text-muted-foreground">"Cargando..."</div> }
                                .into_any();
                        }
                        let rows = recent.get();
                        if rows.is_empty() {
                            return view! { <div class="text-xs text-muted-foreground">"Sin resultados"</div> }
                                .into_any();
                        }
                        view! {
                            <ul class="divide-y divide-border text-sm">
                                {rows
                                    .into_iter()
                                    .map(|r| {
                                        let date = r.display_date();
                                        view! {
                                            <li class="flex items-center justify-between gap-3 py-2">
                                                <div class="min-w-0">
                                                    <div class="truncate font-medium">{r.code} " · " {r.client}</div>
                                                    <div class="text-xs text-muted-foreground">{date}</div>
                                                </div>
                                                <span class="tabular-nums">{r.amount}</span>
                                            </li>
                                        }
                                    })
                                    .collect_view()}
                            </ul>
                        }
                        .into_any()
                    }}
                    <div class="pt-3 text-xs">
                        <a class="text-primary underline underline-offset-4" href="/cotizaciones">"Ver todas"</a>
                    </div>
                </CardContent>
            </Card>
        </div>
    }
}
