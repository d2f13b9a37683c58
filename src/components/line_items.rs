use crate::components::ui::{Button, ButtonSize, ButtonVariant, Input, Label};
use crate::drafts::{DocumentDraft, LineItem};
use crate::util::format_money;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

/// Text signal for one field of a draft, synced both ways so form inputs
/// can bind to it and a draft reset clears them.
pub(crate) fn use_draft_field(
    draft: RwSignal<DocumentDraft>,
    get: fn(&DocumentDraft) -> &String,
    set: fn(&mut DocumentDraft, String),
) -> RwSignal<String> {
    let field = RwSignal::new(draft.with_untracked(|d| get(d).clone()));

    Effect::new(move |_| {
        let value = field.get();
        if draft.with_untracked(|d| *get(d) != value) {
            draft.update(|d| set(d, value));
        }
    });

    Effect::new(move |_| {
        let value = draft.with(|d| get(d).clone());
        if field.get_untracked() != value {
            field.set(value);
        }
    });

    field
}

/// Item entry plus the running list of a draft.
#[component]
pub(crate) fn LineItemsEditor(draft: RwSignal<DocumentDraft>) -> impl IntoView {
    let description = use_draft_field(draft, |d| &d.item_form.description, |d, v| {
        d.item_form.description = v
    });
    let amount = use_draft_field(draft, |d| &d.item_form.amount, |d, v| d.item_form.amount = v);
    let quantity = use_draft_field(draft, |d| &d.item_form.quantity, |d, v| {
        d.item_form.quantity = v
    });
    let item_error: RwSignal<Option<String>> = RwSignal::new(None);

    let on_add = move |_| {
        let mut outcome = Ok(());
        draft.update(|d| outcome = d.add_item());
        item_error.set(outcome.err().map(|e| e.to_string()));
    };

    let items = move || draft.with(|d| d.items.clone());
    let total = move || draft.with(|d| format_money(d.total()));

    view! {
        <div class="space-y-3">
            <div class="grid grid-cols-[1fr_6rem_4rem] items-start gap-2">
                <div class="space-y-1">
                    <Label class="text-xs">"Descripción"</Label>
                    <textarea
                        rows="3"
                        placeholder="Descripción"
                        class="w-full resize-y rounded-md border border-input bg-transparent px-3 py-1.5 text-sm outline-none focus-visible:border-ring"
                        prop:value=move || description.get()
                        on:input=move |ev: web_sys::Event| {
                            if let Some(area) = ev
                                .target()
                                .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
                            {
                                description.set(area.value());
                            }
                        }
                    ></textarea>
                </div>
                <div class="space-y-1">
                    <Label class="text-xs">"Monto"</Label>
                    <Input
                        bind_value=amount
                        r#type="number"
                        min="0"
                        step="0.01"
                        placeholder="0.00"
                        class="h-8 text-sm"
                    />
                </div>
                <div class="space-y-1">
                    <Label class="text-xs">"Cant."</Label>
                    <Input bind_value=quantity r#type="number" min="1" step="1" class="h-8 text-sm" />
                </div>
            </div>

            <div class="flex items-center justify-between gap-2">
                <div class="text-xs text-destructive">{move || item_error.get().unwrap_or_default()}</div>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:r#type="button"
                    on:click=on_add
                >
                    "Agregar"
                </Button>
            </div>

            <div class="rounded-md border border-border">
                <Show
                    when=move || draft.with(|d| !d.items.is_empty())
                    fallback=|| view! {
                        <div class="px-3 py-2 text-xs text-muted-foreground">"Aún no hay items agregados."</div>
                    }
                >
                    <ul class="divide-y divide-border">
                        <For
                            each=items
                            key=|it: &LineItem| it.id.clone()
                            children=move |it: LineItem| {
                                let id = it.id.clone();
                                let meta = format!(
                                    "Cant. {} · Monto {}",
                                    it.quantity,
                                    format_money(it.amount)
                                );
                                view! {
                                    <li class="flex items-center justify-between gap-2 px-3 py-2 text-sm">
                                        <div class="min-w-0">
                                            <div class="whitespace-pre-line">{it.description.clone()}</div>
                                            <div class="text-xs text-muted-foreground">{meta}</div>
                                        </div>
                                        <div class="flex items-center gap-2">
                                            <span class="tabular-nums">{format_money(it.subtotal())}</span>
                                            <Button
                                                variant=ButtonVariant::Ghost
                                                size=ButtonSize::Sm
                                                attr:r#type="button"
                                                on:click=move |_| draft.update(|d| d.remove_item(&id))
                                            >
                                                "Quitar"
                                            </Button>
                                        </div>
                                    </li>
                                }
                            }
                        />
                    </ul>
                </Show>
            </div>

            <div class="flex items-center justify-end gap-2 text-sm">
                <span class="text-muted-foreground">"Total"</span>
                <input
                    readonly
                    class="h-8 w-32 rounded-md border border-input bg-muted px-3 text-right text-sm tabular-nums"
                    prop:value=total
                />
            </div>
        </div>
    }
}
