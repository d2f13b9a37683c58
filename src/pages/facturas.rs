use super::flash;
use super::records::{use_record_list, CreateFlow, RecordsPanel};
use crate::components::client_picker::ClientPicker;
use crate::components::line_items::{use_draft_field, LineItemsEditor};
use crate::components::modal::Modal;
use crate::components::ui::{
    BusyLabel, Button, ButtonSize, ButtonVariant, ErrorAlert, Input, Label, Spinner, SuccessAlert,
};
use crate::documents::{open_record_pdf, BrowserViewer, QuietViewer};
use crate::drafts::ClientRef;
use crate::list::ListQuery;
use crate::models::{Cliente, DocumentKind, RecordRow};
use crate::state::{run_post_create, AppContext};
use leptos::logging::{error, log, warn};
use leptos::prelude::*;
use leptos::task::spawn_local;

const KIND: DocumentKind = DocumentKind::Factura;

/// Quotes offered in the "Desde Cotización" list.
const QUOTE_CHOICES: usize = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FacturaOrigin {
    Cliente,
    Cotizacion,
}

#[component]
pub fn FacturasPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let list = use_record_list(KIND);
    let flow = CreateFlow::new(list);
    let draft = flow.draft;

    let origin: RwSignal<Option<FacturaOrigin>> = RwSignal::new(None);
    let date = use_draft_field(draft, |d| &d.date, |d, v| d.date = v);
    let ncf = use_draft_field(draft, |d| &d.ncf, |d, v| d.ncf = v);
    let rnc = use_draft_field(draft, |d| &d.rnc, |d, v| d.rnc = v);

    let saving: RwSignal<bool> = RwSignal::new(false);
    let form_error: RwSignal<Option<String>> = RwSignal::new(None);
    let success: RwSignal<Option<String>> = RwSignal::new(None);

    let quotes: RwSignal<Vec<RecordRow>> = RwSignal::new(vec![]);
    let quotes_loading: RwSignal<bool> = RwSignal::new(false);
    let seeding: RwSignal<Option<i64>> = RwSignal::new(None);

    let prefill_ncf = move || {
        let api = app_state.0.api();
        spawn_local(async move {
            match api.next_ncf().await {
                Ok(Some(next)) => {
                    let _ = draft.try_update(|d| {
                        if d.ncf.trim().is_empty() {
                            d.ncf = next;
                        }
                    });
                }
                Ok(None) => warn!("NCF endpoint returned no value"),
                Err(e) if e.is_unauthorized() => app_state.0.expire_session(),
                Err(e) => warn!("Could not prefill NCF: {e}"),
            }
        });
    };

    let load_quotes = move || {
        quotes_loading.set(true);
        let api = app_state.0.api();
        spawn_local(async move {
            let query = ListQuery::new(QUOTE_CHOICES);
            match api.list_records(DocumentKind::Cotizacion, &query).await {
                Ok(page) => {
                    let _ = quotes.try_set(page.rows);
                }
                Err(e) if e.is_unauthorized() => app_state.0.expire_session(),
                Err(e) => {
                    let _ = form_error.try_set(Some(e.to_string()));
                }
            }
            let _ = quotes_loading.try_set(false);
        });
    };

    let choose = move |o: FacturaOrigin| {
        origin.set(Some(o));
        if o == FacturaOrigin::Cotizacion && quotes.with_untracked(Vec::is_empty) {
            load_quotes();
        }
    };

    let open_form = move |_| {
        form_error.set(None);
        origin.set(None);
        flow.form_open.set(true);
        prefill_ncf();
    };
    let close_form = Callback::new(move |_| flow.form_open.set(false));

    let on_select = Callback::new(move |c: Cliente| draft.update(|d| d.select_client(ClientRef::from(&c))));
    let on_clear = Callback::new(move |_| draft.update(|d| d.clear_client()));

    let seed_from_quote = move |row: RecordRow| {
        if seeding.get_untracked().is_some() {
            return;
        }
        seeding.set(Some(row.id));
        form_error.set(None);
        let api = app_state.0.api();
        spawn_local(async move {
            match api.get_cotizacion(row.id).await {
                Ok(quote) => {
                    let mut taken = 0;
                    let _ = draft.try_update(|d| taken = d.seed_from_cotizacion(&quote));
                    log!("Seeded factura from cotización {}: {taken} items", row.id);
                    if taken == 0 {
                        let _ = form_error
                            .try_set(Some("La cotización no tiene items válidos".to_string()));
                    }
                }
                Err(e) if e.is_unauthorized() => app_state.0.expire_session(),
                Err(e) => {
                    error!("Error loading cotización {}: {e}", row.id);
                    let _ = form_error.try_set(Some(e.to_string()));
                }
            }
            let _ = seeding.try_set(None);
        });
    };

    let on_save = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }
        let payload = match draft.with_untracked(|d| d.factura_payload()) {
            Ok(p) => p,
            Err(e) => {
                form_error.set(Some(e.to_string()));
                return;
            }
        };

        saving.set(true);
        form_error.set(None);
        let api = app_state.0.api();

        spawn_local(async move {
            match api.create_factura(&payload).await {
                Ok(created) => {
                    log!("Factura creada: {:?}", created.id);
                    let message = created
                        .message
                        .clone()
                        .unwrap_or_else(|| format!("{} creada", KIND.singular()));
                    flash(success, message);

                    let open = created.id.map(|id| {
                        let api = api.clone();
                        async move { open_record_pdf(&api, KIND, id, &QuietViewer(BrowserViewer)).await }
                    });
                    let report = run_post_create(&flow, open).await;
                    if !report.is_clean() {
                        warn!("Post-create finished with {} failed step(s)", report.failed.len());
                    }
                    let _ = origin.try_set(None);
                }
                Err(e) if e.is_unauthorized() => app_state.0.expire_session(),
                Err(e) => {
                    error!("Error creating factura: {e}");
                    let _ = form_error.try_set(Some(e.to_string()));
                }
            }
            let _ = saving.try_set(false);
        });
    };

    let has_client = move || draft.with(|d| d.client.is_some());

    view! {
        <div class="space-y-4">
            <div class="flex items-center justify-between gap-3">
                <h1 class="text-xl font-semibold">{KIND.title()}</h1>
                <Button size=ButtonSize::Sm on:click=open_form>"Crear Factura"</Button>
            </div>

            <SuccessAlert message=success />

            <RecordsPanel kind=KIND list=list placeholder="Buscar facturas..." />

            <Modal open=flow.form_open on_close=close_form title="Crear Factura" class="max-w-2xl">
                <Show
                    when=move || origin.get().is_some()
                    fallback=move || view! {
                        <div class="grid grid-cols-2 gap-3">
                            <Button
                                variant=ButtonVariant::Outline
                                class="h-20 w-full"
                                on:click=move |_| choose(FacturaOrigin::Cliente)
                            >
                                "Desde Cliente"
                            </Button>
                            <Button
                                variant=ButtonVariant::Outline
                                class="h-20 w-full"
                                on:click=move |_| choose(FacturaOrigin::Cotizacion)
                            >
                                "Desde Cotización"
                            </Button>
                        </div>
                        <div class="mt-4 flex justify-end">
                            <Button
                                variant=ButtonVariant::Outline
                                size=ButtonSize::Sm
                                on:click=move |_| close_form.run(())
                            >
                                "Cancelar"
                            </Button>
                        </div>
                    }
                >
                    <form class="space-y-4" on:submit=on_save>
                        <Show
                            when=move || origin.get() == Some(FacturaOrigin::Cotizacion) && !has_client()
                            fallback=move || view! {
                                <div class="space-y-1.5">
                                    <Label class="text-xs">"Cliente"</Label>
                                    <ClientPicker
                                        selected=Signal::derive(move || draft.with(|d| d.client.clone()))
                                        on_select=on_select
                                        on_clear=on_clear
                                    />
                                </div>
                            }
                        >
                            <div class="space-y-1.5">
                                <Label class="text-xs">"Cotización"</Label>
                                <div class="max-h-60 overflow-y-auto rounded-md border border-border">
                                    {move || {
                                        if quotes_loading.get() {
                                            return view! {
                                                <div class="px-3 py-2 text-xs text-muted-foreground">"Cargando cotizaciones..."</div>
                                            }
                                            .into_any();
                                        }
                                        let rows = quotes.get();
                                        if rows.is_empty() {
                                            return view! {
                                                <div class="px-3 py-2 text-xs text-muted-foreground">"Sin resultados"</div>
                                            }
                                            .into_any();
                                        }
                                        view! {
                                            <ul class="divide-y divide-border">
                                                {rows
                                                    .into_iter()
                                                    .map(|row| {
                                                        let id = row.id;
                                                        let line = format!("{} · {} · {}", row.code, row.client, row.amount);
                                                        let date = row.display_date();
                                                        let row = StoredValue::new(row);
                                                        view! {
                                                            <li
                                                                class="flex cursor-pointer items-center justify-between gap-2 px-3 py-2 text-sm hover:bg-muted/60"
                                                                on:click=move |_| seed_from_quote(row.get_value())
                                                            >
                                                                <span class="truncate">{line}</span>
                                                                <span class="inline-flex items-center gap-2 text-xs text-muted-foreground">
                                                                    {date}
                                                                    <Show when=move || seeding.get() == Some(id) fallback=|| ().into_view()>
                                                                        <Spinner class="size-3" />
                                                                    </Show>
                                                                </span>
                                                            </li>
                                                        }
                                                    })
                                                    .collect_view()}
                                            </ul>
                                        }
                                        .into_any()
                                    }}
                                </div>
                            </div>
                        </Show>

                        <div class="grid grid-cols-3 gap-3">
                            <div class="space-y-1.5">
                                <Label html_for="fac_date" class="text-xs">"Fecha"</Label>
                                <Input id="fac_date" r#type="date" bind_value=date class="h-8 text-sm" />
                            </div>
                            <div class="space-y-1.5">
                                <Label html_for="fac_ncf" class="text-xs">"NCF"</Label>
                                <Input id="fac_ncf" bind_value=ncf placeholder="—" class="h-8 text-sm" />
                            </div>
                            <div class="space-y-1.5">
                                <Label html_for="fac_rnc" class="text-xs">"RNC"</Label>
                                <Input id="fac_rnc" bind_value=rnc placeholder="—" class="h-8 text-sm" />
                            </div>
                        </div>

                        <div class="space-y-1.5">
                            <Label class="text-xs">"Items de la factura"</Label>
                            <LineItemsEditor draft=draft />
                        </div>

                        <ErrorAlert error=form_error />

                        <div class="flex items-center justify-between gap-2 pt-2">
                            <Button
                                variant=ButtonVariant::Ghost
                                size=ButtonSize::Sm
                                attr:r#type="button"
                                on:click=move |_| origin.set(None)
                            >
                                "Atrás"
                            </Button>
                            <div class="flex items-center gap-2">
                                <Button
                                    variant=ButtonVariant::Outline
                                    size=ButtonSize::Sm
                                    attr:r#type="button"
                                    on:click=move |_| close_form.run(())
                                >
                                    "Cancelar"
                                </Button>
                                <Button size=ButtonSize::Sm attr:disabled=move || saving.get()>
                                    <BusyLabel busy=saving idle_label="Guardar" busy_label="Guardando..." />
                                </Button>
                            </div>
                        </div>
                    </form>
                </Show>
            </Modal>
        </div>
    }
}
