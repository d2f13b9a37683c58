use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;
use tw_merge::tw_merge;

/// Centered dialog over a dimmed backdrop. Escape and a click on the
/// backdrop both call `on_close`.
#[component]
pub fn Modal(
    #[prop(into)] open: Signal<bool>,
    on_close: Callback<()>,
    title: &'static str,
    #[prop(into, optional)] class: String,
    children: ChildrenFn,
) -> impl IntoView {
    let panel_class = tw_merge!(
        "w-full max-w-sm max-h-[90vh] overflow-y-auto rounded-md border border-border bg-background p-4 shadow-lg",
        class
    );
    let panel_class = StoredValue::new(panel_class);
    let children = StoredValue::new(children);

    view! {
        <Show when=move || open.get() fallback=|| ().into_view()>
            {move || {
                let handle = window_event_listener(ev::keydown, move |e: web_sys::KeyboardEvent| {
                    if e.key() == "Escape" {
                        on_close.run(());
                    }
                });
                on_cleanup(move || handle.remove());

                view! {
                    <div
                        class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4"
                        on:click=move |_| on_close.run(())
                    >
                        <div
                            class=panel_class.get_value()
                            role="dialog"
                            aria-modal="true"
                            on:click=|e: web_sys::MouseEvent| e.stop_propagation()
                        >
                            <div class="mb-3 text-sm font-medium">{title}</div>
                            {children.with_value(|c| c())}
                        </div>
                    </div>
                }
            }}
        </Show>
    }
}
