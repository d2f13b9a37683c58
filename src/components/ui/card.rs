use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Card, div, "bg-card text-card-foreground flex flex-col gap-4 rounded-xl border py-6 shadow-sm"}
    clx! {CardHeader, div, "flex flex-col items-start gap-1.5 px-6"}
    clx! {CardTitle, h2, "leading-none font-semibold"}
    clx! {CardContent, div, "px-6"}
    clx! {CardDescription, p, "text-muted-foreground text-sm"}
}

pub use components::*;

/// Dashboard tile: a label over one large figure.
#[component]
pub fn MetricCard(
    label: &'static str,
    #[prop(into)] value: Signal<Option<String>>,
    #[prop(into)] loading: Signal<bool>,
) -> impl IntoView {
    view! {
        <Card class="gap-2 py-4">
            <CardContent class="space-y-2">
                <div class="text-xs text-muted-foreground">{label}</div>
                <div class="text-2xl font-semibold tabular-nums">
                    {move || {
                        if loading.get() {
                            "…".to_string()
                        } else {
                            value.get().unwrap_or_else(|| "—".to_string())
                        }
                    }}
                </div>
            </CardContent>
        </Card>
    }
}
