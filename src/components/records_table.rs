use crate::components::ui::{Button, ButtonSize, ButtonVariant, Select, Spinner};
use crate::list::{DisplayRange, PageView, PAGE_SIZE_OPTIONS};
use crate::models::{DocumentKind, RecordRow};
use leptos::prelude::*;

/// Footer shared by every paginated table. Hidden when there is nothing
/// to paginate.
#[component]
pub(crate) fn Pager(
    #[prop(into)] page: Signal<usize>,
    #[prop(into)] page_size: Signal<usize>,
    #[prop(into)] total_pages: Signal<usize>,
    #[prop(into)] has_prev: Signal<bool>,
    #[prop(into)] has_next: Signal<bool>,
    #[prop(into)] range: Signal<Option<DisplayRange>>,
    on_page: Callback<usize>,
    on_page_size: Callback<usize>,
) -> impl IntoView {
    let size_value = RwSignal::new(page_size.get_untracked().to_string());

    // Keep the select in sync when the size changes elsewhere.
    Effect::new(move |_| {
        let s = page_size.get().to_string();
        if size_value.get_untracked() != s {
            size_value.set(s);
        }
    });

    Effect::new(move |prev: Option<()>| {
        let raw = size_value.get();
        if prev.is_none() {
            return;
        }
        if let Ok(s) = raw.parse::<usize>() {
            if s != page_size.get_untracked() {
                on_page_size.run(s);
            }
        }
    });

    let options = PAGE_SIZE_OPTIONS
        .iter()
        .map(|s| (s.to_string(), format!("{s} / página")))
        .collect::<Vec<_>>();

    view! {
        <Show when=move || range.get().is_some() fallback=|| ().into_view()>
            <div class="flex flex-wrap items-center justify-between gap-3 border-t border-border px-4 py-3 text-xs text-muted-foreground">
                <div>{move || range.get().map(|r| r.label()).unwrap_or_default()}</div>
                <div class="flex items-center gap-2">
                    <Select options=options.clone() bind_value=size_value class="text-xs" />
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || !has_prev.get()
                        on:click=move |_| on_page.run(page.get_untracked().saturating_sub(1).max(1))
                    >
                        "Anterior"
                    </Button>
                    <span class="tabular-nums">
                        {move || format!("{} / {}", page.get(), total_pages.get())}
                    </span>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || !has_next.get()
                        on:click=move |_| on_page.run(page.get_untracked() + 1)
                    >
                        "Siguiente"
                    </Button>
                </div>
            </div>
        </Show>
    }
}

/// Body row for loading / error / empty states.
#[component]
pub(crate) fn StatusRow(colspan: usize, children: Children) -> impl IntoView {
    view! {
        <tr>
            <td colspan=colspan.to_string() class="px-4 py-8 text-center text-xs text-muted-foreground">
                {children()}
            </td>
        </tr>
    }
}

/// Quotes or invoices table. Clicking a row asks for its PDF.
#[component]
pub(crate) fn RecordsTable(
    kind: DocumentKind,
    #[prop(into)] page_view: Signal<PageView<RecordRow>>,
    #[prop(into)] loading: Signal<bool>,
    #[prop(into)] error: Signal<Option<String>>,
    /// Row whose PDF is being fetched, if any.
    #[prop(into)] opening: Signal<Option<i64>>,
    on_open: Callback<RecordRow>,
    on_page: Callback<usize>,
    on_page_size: Callback<usize>,
) -> impl IntoView {
    let show_ncf = kind == DocumentKind::Factura;
    let colspan = if show_ncf { 6 } else { 5 };

    let rows = move || page_view.with(|v| v.rows.clone());
    let is_empty = move || page_view.with(|v| v.rows.is_empty());

    view! {
        <div class="overflow-hidden rounded-md border border-border bg-background">
            <div class="overflow-x-auto">
                <table class="w-full text-sm">
                    <thead class="border-b border-border bg-muted/40 text-left text-xs text-muted-foreground">
                        <tr>
                            <th class="px-4 py-2 font-medium">"Fecha"</th>
                            <th class="px-4 py-2 font-medium">"Código"</th>
                            <th class="px-4 py-2 font-medium">"Cliente"</th>
                            <th class="px-4 py-2 font-medium">"Descripción"</th>
                            <th class="px-4 py-2 text-right font-medium">"Monto"</th>
                            {show_ncf.then(|| view! { <th class="px-4 py-2 font-medium">"NCF"</th> })}
                        </tr>
                    </thead>
                    <tbody>
                        {move || {
                            if let Some(e) = error.get() {
                                return view! {
                                    <StatusRow colspan=colspan>
                                        <span class="text-destructive">{e}</span>
                                    </StatusRow>
                                }
                                .into_any();
                            }
                            if is_empty() {
                                let text = if loading.get() { "Cargando..." } else { "Sin resultados" };
                                return view! { <StatusRow colspan=colspan>{text}</StatusRow> }.into_any();
                            }
                            view! {
                                <For
                                    each=rows
                                    key=|r: &RecordRow| (r.id, r.code.clone())
                                    children=move |row: RecordRow| {
                                        let id = row.id;
                                        let date = row.display_date();
                                        let lines = row
                                            .description_lines()
                                            .into_iter()
                                            .map(str::to_string)
                                            .collect::<Vec<_>>();
                                        let ncf = row.ncf.clone().unwrap_or_default();
                                        let code = row.code.clone();
                                        let client = row.client.clone();
                                        let amount = row.amount.clone();
                                        let row = StoredValue::new(row);
                                        view! {
                                            <tr
                                                class="cursor-pointer border-b border-border last:border-0 hover:bg-muted/40"
                                                title="Abrir PDF"
                                                on:click=move |_| {
                                                    if opening.get_untracked().is_none() {
                                                        on_open.run(row.get_value());
                                                    }
                                                }
                                            >
                                                <td class="whitespace-nowrap px-4 py-2">{date}</td>
                                                <td class="whitespace-nowrap px-4 py-2 font-medium">
                                                    <span class="inline-flex items-center gap-2">
                                                        {code}
                                                        <Show when=move || opening.get() == Some(id) fallback=|| ().into_view()>
                                                            <Spinner class="size-3" />
                                                        </Show>
                                                    </span>
                                                </td>
                                                <td class="px-4 py-2">{client}</td>
                                                <td class="px-4 py-2 text-xs text-muted-foreground">
                                                    {lines
                                                        .into_iter()
                                                        .map(|l| view! { <div>{l}</div> })
                                                        .collect_view()}
                                                </td>
                                                <td class="whitespace-nowrap px-4 py-2 text-right tabular-nums">{amount}</td>
                                                {show_ncf.then(|| view! {
                                                    <td class="whitespace-nowrap px-4 py-2 text-xs">{ncf}</td>
                                                })}
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
                on_page=on_page
                on_page_size=on_page_size
            />
        </div>
    }
}
