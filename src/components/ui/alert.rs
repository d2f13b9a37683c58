use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-lg border px-4 py-3 text-sm"}
    clx! {AlertDescription, p, "text-sm [&_p]:leading-relaxed"}
}

pub use components::*;

/// Inline error box, hidden while `error` is `None`.
#[component]
pub fn ErrorAlert(#[prop(into)] error: Signal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || error.get().is_some() fallback=|| ().into_view()>
            {move || error.get().map(|e| view! {
                <Alert class="border-destructive/30">
                    <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                </Alert>
            })}
        </Show>
    }
}

/// Green confirmation banner ("Cotización creada", "Usuario registrado").
#[component]
pub fn SuccessAlert(#[prop(into)] message: Signal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || message.get().is_some() fallback=|| ().into_view()>
            {move || message.get().map(|m| view! {
                <Alert class="border-success/30 bg-success/10">
                    <AlertDescription class="text-success text-xs">{m}</AlertDescription>
                </Alert>
            })}
        </Show>
    }
}
