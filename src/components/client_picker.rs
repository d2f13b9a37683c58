use crate::components::ui::{Button, ButtonSize, ButtonVariant, Input};
use crate::drafts::ClientRef;
use crate::list::Searchable;
use crate::models::Cliente;
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Searchable client list used by the create forms. Clients are fetched
/// once per mount and filtered locally by name, company, email and phone.
#[component]
pub(crate) fn ClientPicker(
    #[prop(into)] selected: Signal<Option<ClientRef>>,
    on_select: Callback<Cliente>,
    on_clear: Callback<()>,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let clientes: RwSignal<Vec<Cliente>> = RwSignal::new(vec![]);
    let loading: RwSignal<bool> = RwSignal::new(true);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let query: RwSignal<String> = RwSignal::new(String::new());

    let api = app_state.0.api();
    spawn_local(async move {
        match api.list_all_clientes().await {
            Ok(list) => {
                let _ = clientes.try_set(list);
            }
            Err(e) if e.is_unauthorized() => app_state.0.expire_session(),
            Err(_) => {
                let _ = error.try_set(Some("Error al cargar clientes".to_string()));
            }
        }
        let _ = loading.try_set(false);
    });

    let filtered = move || {
        let needle = query.get().trim().to_lowercase();
        clientes.with(|all| {
            all.iter()
                .filter(|c| c.matches(&needle))
                .cloned()
                .collect::<Vec<_>>()
        })
    };

    view! {
        <div class="space-y-2">
            <Show
                when=move || selected.get().is_none()
                fallback=move || {
                    let c = selected.get().unwrap_or_default();
                    view! {
                        <div class="flex items-center justify-between rounded-md border border-border bg-muted/40 px-3 py-2 text-sm">
                            <div class="min-w-0">
                                <div class="truncate font-medium">{c.name}</div>
                                {c.rnc.map(|r| view! { <div class="text-xs text-muted-foreground">"RNC " {r}</div> })}
                            </div>
                            <Button
                                variant=ButtonVariant::Outline
                                size=ButtonSize::Sm
                                attr:r#type="button"
                                on:click=move |_| on_clear.run(())
                            >
                                "Cambiar"
                            </Button>
                        </div>
                    }
                }
            >
                <Input
                    bind_value=query
                    placeholder="Buscar por nombre, empresa, email o teléfono..."
                    class="h-8 text-sm"
                />
                <div class="max-h-60 overflow-y-auto rounded-md border border-border">
                    {move || {
                        if loading.get() {
                            return view! {
                                <div class="px-3 py-2 text-xs text-muted-foreground">"Cargando clientes..."</div>
                            }
                            .into_any();
                        }
                        if let Some(e) = error.get() {
                            return view! { <div class="px-3 py-2 text-xs text-destructive">{e}</div> }
                                .into_any();
                        }
                        let list = filtered();
                        if list.is_empty() {
                            return view! {
                                <div class="px-3 py-2 text-xs text-muted-foreground">"Sin resultados"</div>
                            }
                            .into_any();
                        }
                        view! {
                            <ul class="divide-y divide-border">
                                {list
                                    .into_iter()
                                    .map(|c| {
                                        let name = c.display_name();
                                        let detail = [
                                            Some(c.company()),
                                            c.email.as_deref(),
                                            c.phone(),
                                        ]
                                        .into_iter()
                                        .flatten()
                                        .filter(|s| !s.is_empty())
                                        .collect::<Vec<_>>()
                                        .join(" • ");
                                        let c = StoredValue::new(c);
                                        view! {
                                            <li
                                                class="cursor-pointer px-3 py-2 text-sm hover:bg-muted/60"
                                                on:click=move |_| on_select.run(c.get_value())
                                            >
                                                <div class="font-medium">{name}</div>
                                                <div class="text-xs text-muted-foreground">{detail}</div>
                                            </li>
                                        }
                                    })
                                    .collect_view()}
                            </ul>
                        }
                        .into_any()
                    }}
                </div>
            </Show>
        </div>
    }
}
