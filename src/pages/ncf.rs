use super::flash;
use crate::components::ui::{
    BusyLabel, Button, ButtonSize, Card, CardContent, CardDescription, CardHeader, CardTitle,
    ErrorAlert, Input, Label, SuccessAlert,
};
use crate::models::NcfSequence;
use crate::state::AppContext;
use leptos::logging::error;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Counter value typed by the user; must be a non-negative integer.
fn parse_counter(raw: &str) -> Result<u64, String> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| "El valor actual debe ser un número entero positivo".to_string())
}

#[component]
pub fn NcfPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    let sequence: RwSignal<Option<NcfSequence>> = RwSignal::new(None);
    let next: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let saving: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let success: RwSignal<Option<String>> = RwSignal::new(None);
    let current_value: RwSignal<String> = RwSignal::new(String::new());

    let load = move || {
        loading.set(true);
        let api = app_state.0.api();
        spawn_local(async move {
            match api.ncf_sequence().await {
                Ok(seq) => {
                    let _ = current_value.try_set(seq.current_value.to_string());
                    let _ = sequence.try_set(Some(seq));
                }
                Err(e) if e.is_unauthorized() => app_state.0.expire_session(),
                Err(e) => {
                    error!("Error loading NCF sequence: {e}");
                    let _ = error.try_set(Some(e.to_string()));
                }
            }
            match api.next_ncf().await {
                Ok(value) => {
                    let _ = next.try_set(value);
                }
                Err(e) => error!("Error loading next NCF: {e}"),
            }
            let _ = loading.try_set(false);
        });
    };
    load();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }
        let value = match parse_counter(&current_value.get_untracked()) {
            Ok(v) => v,
            Err(message) => {
                error.set(Some(message));
                return;
            }
        };

        saving.set(true);
        error.set(None);
        let api = app_state.0.api();
        spawn_local(async move {
            match api.update_ncf_sequence(value).await {
                Ok(message) => {
                    flash(success, message);
                    load();
                }
                Err(e) if e.is_unauthorized() => app_state.0.expire_session(),
                Err(e) => {
                    error!("Error updating NCF sequence: {e}");
                    let _ = error.try_set(Some(e.to_string()));
                }
            }
            let _ = saving.try_set(false);
        });
    };

    let show = move |f: fn(&NcfSequence) -> String| {
        move || {
            if loading.get() {
                "…".to_string()
            } else {
                sequence.with(|s| s.as_ref().map(f).unwrap_or_else(|| "—".to_string()))
            }
        }
    };

    view! {
        <div class="space-y-4">
            <h1 class="text-xl font-semibold">"NCF"</h1>

            <SuccessAlert message=success />
            <ErrorAlert error=error />

            <Card>
                <CardHeader>
                    <CardTitle class="text-sm">"Secuencia actual"</CardTitle>
                    <CardDescription class="text-xs">{show(|s| s.description.clone())}</CardDescription>
                </CardHeader>
                <CardContent>
                    <dl class="grid grid-cols-3 gap-3 text-sm">
                        <div>
                            <dt class="text-xs text-muted-foreground">"Tipo"</dt>
                            <dd class="font-medium">{show(|s| s.prefix.clone())}</dd>
                        </div>
                        <div>
                            <dt class="text-xs text-muted-foreground">"Valor actual"</dt>
                            <dd class="font-medium tabular-nums">{show(|s| s.current_value.to_string())}</dd>
                        </div>
                        <div>
                            <dt class="text-xs text-muted-foreground">"Próximo NCF"</dt>
                            <dd class="font-medium tabular-nums">
                                {move || {
                                    next.get()
                                        .or_else(|| sequence.with(|s| s.as_ref().map(NcfSequence::next_ncf)))
                                        .unwrap_or_else(|| "—".to_string())
                                }}
                            </dd>
                        </div>
                    </dl>
                </CardContent>
            </Card>

            <Card>
                <CardHeader>
                    <CardTitle class="text-sm">"Actualizar secuencia"</CardTitle>
                </CardHeader>
                <CardContent>
                    <form class="flex items-end gap-3" on:submit=on_submit>
                        <div class="space-y-1.5">
                            <Label html_for="ncf_current" class="text-xs">"Valor actual"</Label>
                            <Input
                                id="ncf_current"
                                r#type="number"
                                min="0"
                                step="1"
                                bind_value=current_value
                                class="h-8 w-40 text-sm"
                            />
                        </div>
                        <Button size=ButtonSize::Sm attr:disabled=move || saving.get() || loading.get()>
                            <BusyLabel busy=saving idle_label="Actualizar" busy_label="Actualizando..." />
                        </Button>
                    </form>
                </CardContent>
            </Card>
        </div>
    }
}
