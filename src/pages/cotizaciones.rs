use super::flash;
use super::records::{use_record_list, CreateFlow, RecordsPanel};
use crate::components::client_picker::ClientPicker;
use crate::components::line_items::{use_draft_field, LineItemsEditor};
use crate::components::modal::Modal;
use crate::components::ui::{
    BusyLabel, Button, ButtonSize, ButtonVariant, ErrorAlert, Input, Label, SuccessAlert,
};
use crate::documents::{open_document, open_record_pdf, BrowserViewer, QuietViewer};
use crate::drafts::ClientRef;
use crate::models::{Cliente, DocumentKind};
use crate::state::{run_post_create, AppContext};
use leptos::logging::{error, log, warn};
use leptos::prelude::*;
use leptos::task::spawn_local;

const KIND: DocumentKind = DocumentKind::Cotizacion;

#[component]
pub fn CotizacionesPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let list = use_record_list(KIND);
    let flow = CreateFlow::new(list);
    let draft = flow.draft;

    let date = use_draft_field(draft, |d| &d.date, |d, v| d.date = v);
    let saving: RwSignal<bool> = RwSignal::new(false);
    let previewing: RwSignal<bool> = RwSignal::new(false);
    let form_error: RwSignal<Option<String>> = RwSignal::new(None);
    let success: RwSignal<Option<String>> = RwSignal::new(None);

    let open_form = move |_| {
        form_error.set(None);
        flow.form_open.set(true);
    };
    let close_form = Callback::new(move |_| flow.form_open.set(false));

    let on_select = Callback::new(move |c: Cliente| draft.update(|d| d.select_client(ClientRef::from(&c))));
    let on_clear = Callback::new(move |_| draft.update(|d| d.clear_client()));

    let on_save = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }
        let payload = match draft.with_untracked(|d| d.cotizacion_payload()) {
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
            match api.create_cotizacion(&payload).await {
                Ok(created) => {
                    log!("Cotización creada: {:?}", created.id);
                    let message = match created.code.as_deref() {
                        Some(code) if !code.is_empty() => format!("{} {code} creada", KIND.singular()),
                        _ => format!("{} creada", KIND.singular()),
                    };
                    flash(success, message);

                    let open = created.id.map(|id| {
                        let api = api.clone();
                        async move { open_record_pdf(&api, KIND, id, &QuietViewer(BrowserViewer)).await }
                    });
                    let report = run_post_create(&flow, open).await;
                    if !report.is_clean() {
                        warn!("Post-create finished with {} failed step(s)", report.failed.len());
                    }
                }
                Err(e) if e.is_unauthorized() => app_state.0.expire_session(),
                Err(e) => {
                    error!("Error creating cotización: {e}");
                    let _ = form_error.try_set(Some(e.to_string()));
                }
            }
            let _ = saving.try_set(false);
        });
    };

    let on_preview = move |_| {
        if previewing.get_untracked() {
            return;
        }
        let payload = match draft.with_untracked(|d| d.cotizacion_payload()) {
            Ok(p) => p,
            Err(e) => {
                form_error.set(Some(e.to_string()));
                return;
            }
        };

        previewing.set(true);
        form_error.set(None);
        let api = app_state.0.api();

        spawn_local(async move {
            let _ = open_document(api.preview_cotizacion(&payload), &BrowserViewer).await;
            let _ = previewing.try_set(false);
        });
    };

    let total = move || draft.with(|d| d.total());
    let busy = Signal::derive(move || saving.get() || previewing.get());

    view! {
        <div class="space-y-4">
            <div class="flex items-center justify-between gap-3">
                <h1 class="text-xl font-semibold">{KIND.title()}</h1>
                <Button size=ButtonSize::Sm on:click=open_form>"Crear Cotización"</Button>
            </div>

            <SuccessAlert message=success />

            <RecordsPanel kind=KIND list=list placeholder="Buscar cotizaciones..." />

            <Modal open=flow.form_open on_close=close_form title="Crear Cotización" class="max-w-2xl">
                <form class="space-y-4" on:submit=on_save>
                    <div class="space-y-1.5">
                        <Label class="text-xs">"Cliente"</Label>
                        <ClientPicker
                            selected=Signal::derive(move || draft.with(|d| d.client.clone()))
                            on_select=on_select
                            on_clear=on_clear
                        />
                    </div>

                    <div class="space-y-1.5">
                        <Label html_for="cot_date" class="text-xs">"Fecha"</Label>
                        <Input id="cot_date" r#type="date" bind_value=date class="h-8 text-sm" />
                    </div>

                    <div class="space-y-1.5">
                        <Label class="text-xs">"Items de la cotización"</Label>
                        <LineItemsEditor draft=draft />
                    </div>

                    <ErrorAlert error=form_error />

                    <div class="flex items-center justify-end gap-2 pt-2">
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            attr:r#type="button"
                            on:click=move |_| close_form.run(())
                        >
                            "Cancelar"
                        </Button>
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            attr:r#type="button"
                            attr:disabled=move || busy.get() || total() <= 0.0
                            on:click=on_preview
                        >
                            <BusyLabel busy=previewing idle_label="Vista previa" busy_label="Generando..." />
                        </Button>
                        <Button size=ButtonSize::Sm attr:disabled=move || busy.get()>
                            <BusyLabel busy=saving idle_label="Guardar" busy_label="Guardando..." />
                        </Button>
                    </div>
                </form>
            </Modal>
        </div>
    }
}
