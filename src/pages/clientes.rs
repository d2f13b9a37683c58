use super::flash;
use crate::api::CreateClienteRequest;
use crate::components::modal::Modal;
use crate::components::records_table::{Pager, StatusRow};
use crate::components::ui::{
    BusyLabel, Button, ButtonSize, ButtonVariant, ErrorAlert, Input, Label, SuccessAlert,
};
use crate::list::{ClientListController, ClienteSource, PageView, DEFAULT_PAGE_SIZE};
use crate::models::Cliente;
use crate::state::AppContext;
use leptos::logging::{error, log};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[derive(Clone, Debug, Default, PartialEq)]
struct ClienteForm {
    name: String,
    company: String,
    email: String,
    phone: String,
    address: String,
    rnc: String,
}

impl ClienteForm {
    fn from_cliente(c: &Cliente) -> Self {
        let owned = |v: Option<&str>| v.unwrap_or_default().to_string();
        Self {
            name: owned(c.known_name()),
            company: c.company().to_string(),
            email: owned(c.email.as_deref()),
            phone: owned(c.phone()),
            address: owned(c.direccion.as_deref()),
            rnc: owned(c.rnc.as_deref()),
        }
    }

    /// `None` when the name is missing; blank optional fields are omitted.
    fn to_request(&self) -> Option<CreateClienteRequest> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let opt = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        Some(CreateClienteRequest {
            client_name: name.to_string(),
            company_name: opt(&self.company),
            email: opt(&self.email),
            phone_number: opt(&self.phone),
            direccion: opt(&self.address),
            rnc: opt(&self.rnc),
        })
    }
}

#[component]
pub fn ClientesPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let list = ClientListController::new(
        ClienteSource {
            api: app_state.0.api(),
        },
        DEFAULT_PAGE_SIZE,
        app_state.0.unauthorized_handler(),
    );

    let form_open: RwSignal<bool> = RwSignal::new(false);
    let editing: RwSignal<Option<i64>> = RwSignal::new(None);
    let name: RwSignal<String> = RwSignal::new(String::new());
    let company: RwSignal<String> = RwSignal::new(String::new());
    let email: RwSignal<String> = RwSignal::new(String::new());
    let phone: RwSignal<String> = RwSignal::new(String::new());
    let address: RwSignal<String> = RwSignal::new(String::new());
    let rnc: RwSignal<String> = RwSignal::new(String::new());
    let saving: RwSignal<bool> = RwSignal::new(false);
    let form_error: RwSignal<Option<String>> = RwSignal::new(None);
    let success: RwSignal<Option<String>> = RwSignal::new(None);

    let fill = move |f: ClienteForm| {
        name.set(f.name);
        company.set(f.company);
        email.set(f.email);
        phone.set(f.phone);
        address.set(f.address);
        rnc.set(f.rnc);
    };

    let open_create = move |_| {
        editing.set(None);
        fill(ClienteForm::default());
        form_error.set(None);
        form_open.set(true);
    };
    let open_edit = move |c: Cliente| {
        editing.set(Some(c.id));
        fill(ClienteForm::from_cliente(&c));
        form_error.set(None);
        form_open.set(true);
    };
    let close_form = Callback::new(move |_| form_open.set(false));

    let on_save = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }
        let form = ClienteForm {
            name: name.get_untracked(),
            company: company.get_untracked(),
            email: email.get_untracked(),
            phone: phone.get_untracked(),
            address: address.get_untracked(),
            rnc: rnc.get_untracked(),
        };
        let Some(req) = form.to_request() else {
            form_error.set(Some("El nombre del cliente es obligatorio".to_string()));
            return;
        };

        saving.set(true);
        form_error.set(None);
        let api = app_state.0.api();
        let target = editing.get_untracked();

        spawn_local(async move {
            let result = match target {
                Some(id) => api.update_cliente(id, &req).await,
                None => api.create_cliente(&req).await,
            };
            match result {
                Ok(_) => {
                    log!("Cliente guardado: {}", req.client_name);
                    let message = if target.is_some() { "Cliente actualizado" } else { "Cliente creado" };
                    flash(success, message.to_string());
                    let _ = form_open.try_set(false);
                    if !list.loading.is_disposed() {
                        list.refresh();
                    }
                }
                Err(e) if e.is_unauthorized() => app_state.0.expire_session(),
                Err(e) => {
                    error!("Error saving cliente: {e}");
                    let _ = form_error.try_set(Some(e.to_string()));
                }
            }
            let _ = saving.try_set(false);
        });
    };

    let on_delete = move |c: Cliente| {
        let prompt = format!("¿Eliminar el cliente {}?", c.display_name());
        if !window().confirm_with_message(&prompt).unwrap_or(false) {
            return;
        }
        let api = app_state.0.api();
        spawn_local(async move {
            match api.delete_cliente(c.id).await {
                Ok(()) => {
                    flash(success, "Cliente eliminado".to_string());
                    if !list.loading.is_disposed() {
                        list.refresh();
                    }
                }
                Err(e) if e.is_unauthorized() => app_state.0.expire_session(),
                Err(e) => {
                    error!("Error deleting cliente {}: {e}", c.id);
                    let _ = list.error.try_set(Some(e.to_string()));
                }
            }
        });
    };

    let page_view = Signal::derive(move || list.view());
    let rows = move || page_view.with(|v| v.rows.clone());
    let form_title = move || if editing.get().is_some() { "Editar Cliente" } else { "Nuevo Cliente" };

    let field = move |id: &'static str, label: &'static str, value: RwSignal<String>| {
        view! {
            <div class="space-y-1.5">
                <Label html_for=id class="text-xs">{label}</Label>
                <Input id=id bind_value=value class="h-8 text-sm" />
            </div>
        }
    };

    view! {
        <div class="space-y-4">
            <div class="flex items-center justify-between gap-3">
                <h1 class="text-xl font-semibold">"Clientes"</h1>
                <Button size=ButtonSize::Sm on:click=open_create>"Nuevo Cliente"</Button>
            </div>

            <SuccessAlert message=success />

            <Input
                bind_value=list.search_input
                placeholder="Buscar por nombre, empresa, email o teléfono..."
                class="h-8 max-w-sm text-sm"
            />

            <div class="overflow-hidden rounded-md border border-border bg-background">
                <div class="overflow-x-auto">
                    <table class="w-full text-sm">
                        <thead class="border-b border-border bg-muted/40 text-left text-xs text-muted-foreground">
                            <tr>
                                <th class="px-4 py-2 font-medium">"Nombre"</th>
                                <th class="px-4 py-2 font-medium">"Empresa"</th>
                                <th class="px-4 py-2 font-medium">"Email"</th>
                                <th class="px-4 py-2 font-medium">"Teléfono"</th>
                                <th class="px-4 py-2 font-medium">"RNC"</th>
                                <th class="px-4 py-2"></th>
                            </tr>
                        </thead>
                        <tbody>
                            {move || {
                                if let Some(e) = list.error.get() {
                                    return view! {
                                        <StatusRow colspan=6>
                                            <span class="text-destructive">{e}</span>
                                        </StatusRow>
                                    }
                                    .into_any();
                                }
                                if page_view.with(|v| v.rows.is_empty()) {
                                    let text = if list.loading.get() { "Cargando..." } else { "Sin resultados" };
                                    return view! { <StatusRow colspan=6>{text}</StatusRow> }.into_any();
                                }
                                view! {
                                    <For
                                        each=rows
                                        key=|c: &Cliente| c.id
                                        children=move |c: Cliente| {
                                            let name = c.display_name();
                                            let company = c.company().to_string();
                                            let mail = c.email.clone().unwrap_or_default();
                                            let tel = c.phone().unwrap_or_default().to_string();
                                            let tax_id = c.rnc.clone().unwrap_or_default();
                                            let c = StoredValue::new(c);
                                            view! {
                                                <tr class="border-b border-border last:border-0">
                                                    <td class="px-4 py-2 font-medium">{name}</td>
                                                    <td class="px-4 py-2">{company}</td>
                                                    <td class="px-4 py-2">{mail}</td>
                                                    <td class="whitespace-nowrap px-4 py-2">{tel}</td>
                                                    <td class="whitespace-nowrap px-4 py-2 text-xs">{tax_id}</td>
                                                    <td class="whitespace-nowrap px-4 py-2 text-right">
                                                        <Button
                                                            variant=ButtonVariant::Ghost
                                                            size=ButtonSize::Sm
                                                            on:click=move |_| open_edit(c.get_value())
                                                        >
                                                            "Editar"
                                                        </Button>
                                                        <Button
                                                            variant=ButtonVariant::Ghost
                                                            size=ButtonSize::Sm
                                                            class="text-destructive"
                                                            on:click=move |_| on_delete(c.get_value())
                                                        >
                                                            "Eliminar"
                                                        </Button>
                                                    </td>
                                                </tr>
                                            }
                                        }
                                    />
                                }
                                .into_any()
                            }}
                        </tbody>
                    </table>
                </div>
                <Pager
                    page=Signal::derive(move || page_view.with(|v| v.page))
                    page_size=Signal::derive(move || page_view.with(|v| v.page_size))
                    total_pages=Signal::derive(move || page_view.with(|v| v.total_pages))
                    has_prev=Signal::derive(move || page_view.with(PageView::has_prev))
                    has_next=Signal::derive(move || page_view.with(PageView::has_next))
                    range=Signal::derive(move || page_view.with(|v| v.range))
                    on_page=Callback::new(move |p| list.go_to_page(p))
                    on_page_size=Callback::new(move |s| list.set_page_size(s))
                />
            </div>

            <Modal open=form_open on_close=close_form title="Cliente" class="max-w-lg">
                <form class="space-y-3" on:submit=on_save>
                    <div class="text-xs text-muted-foreground">{form_title}</div>
                    {field("cli_name", "Nombre", name)}
                    {field("cli_company", "Empresa", company)}
                    <div class="grid grid-cols-2 gap-3">
                        {field("cli_email", "Email", email)}
                        {field("cli_phone", "Teléfono", phone)}
                    </div>
                    {field("cli_address", "Dirección", address)}
                    {field("cli_rnc", "RNC", rnc)}

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
                        <Button size=ButtonSize::Sm attr:disabled=move || saving.get()>
                            <BusyLabel busy=saving idle_label="Guardar" busy_label="Guardando..." />
                        </Button>
                    </div>
                </form>
            </Modal>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_requires_name() {
        let form = ClienteForm {
            name: "   ".into(),
            email: "a@b.c".into(),
            ..Default::default()
        };
        assert_eq!(form.to_request(), None);
    }

    #[test]
    fn test_form_omits_blank_optionals() {
        let form = ClienteForm {
            name: " Imprenta Sol ".into(),
            phone: "809-555-0101".into(),
            rnc: "  ".into(),
            ..Default::default()
        };
        let req = form.to_request().expect("named client");
        assert_eq!(req.client_name, "Imprenta Sol");
        assert_eq!(req.phone_number.as_deref(), Some("809-555-0101"));
        assert_eq!(req.company_name, None);
        assert_eq!(req.rnc, None);
    }

    #[test]
    fn test_form_from_spanish_keys() {
        let c: Cliente = serde_json::from_value(serde_json::json!({
            "id": 3,
            "nombre": "Ana",
            "telefono": "809",
            "direccion": "Calle 1"
        }))
        .expect("cliente");
        let form = ClienteForm::from_cliente(&c);
        assert_eq!(form.name, "Ana");
        assert_eq!(form.phone, "809");
        assert_eq!(form.address, "Calle 1");
    }
}
