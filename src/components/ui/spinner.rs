use icons::Loader;
use leptos::prelude::*;
use tw_merge::tw_merge;

#[component]
pub fn Spinner(#[prop(into, optional)] class: String) -> impl IntoView {
    let merged_class = tw_merge!("size-4 animate-spin", class);

    view! { <Loader class=merged_class attr:role="status" attr:aria-label="Cargando" /> }
}

/// Button body that swaps to a spinner and `busy_label` while `busy`.
#[component]
pub fn BusyLabel(
    #[prop(into)] busy: Signal<bool>,
    idle_label: &'static str,
    busy_label: &'static str,
) -> impl IntoView {
    view! {
        <span class="inline-flex items-center gap-2">
            <Show when=move || busy.get() fallback=|| ().into_view()>
                <Spinner />
            </Show>
            {move || if busy.get() { busy_label } else { idle_label }}
        </span>
    }
}
