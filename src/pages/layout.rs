use super::SignInPage;
use crate::components::ui::{Button, ButtonSize, ButtonVariant, Card, CardContent};
use crate::state::AppContext;
use leptos::prelude::*;
use leptos_router::hooks::{use_location, use_navigate};

const NAV_ITEMS: [(&str, &str); 5] = [
    ("/", "Inicio"),
    ("/cotizaciones", "Cotizaciones"),
    ("/facturas", "Facturas"),
    ("/clientes", "Clientes"),
    ("/ncf", "NCF"),
];

fn is_active(pathname: &str, href: &str) -> bool {
    if href == "/" {
        pathname == "/"
    } else {
        pathname == href || pathname.starts_with(&format!("{href}/"))
    }
}

#[component]
pub fn AppLayout(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let pathname = use_location().pathname;

    let user_name = move || {
        app_state
            .0
            .current_user()
            .map(|u| u.display_name().to_string())
            .unwrap_or_default()
    };

    let on_logout = move |_| app_state.0.sign_out();

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <div class="mx-auto flex min-h-screen w-full max-w-6xl gap-4 px-4 py-6">
                <aside class="w-48 shrink-0">
                    <div class="sticky top-6 space-y-4">
                        <a href="/" class="block text-sm font-medium text-foreground">"Gratex"</a>

                        <Card class="gap-2 py-3">
                            <CardContent class="px-2">
                                <nav class="flex flex-col gap-1" aria-label="Principal">
                                    {NAV_ITEMS
                                        .into_iter()
                                        .map(|(href, label)| {
                                            let class = move || {
                                                if pathname.with(|p| is_active(p, href)) {
                                                    "rounded-md bg-muted px-3 py-1.5 text-sm font-medium"
                                                } else {
                                                    "rounded-md px-3 py-1.5 text-sm text-muted-foreground hover:bg-muted/60"
                                                }
                                            };
                                            view! { <a href=href class=class>{label}</a> }
                                        })
                                        .collect_view()}
                                </nav>
                            </CardContent>
                        </Card>

                        <Card class="gap-2 py-3">
                            <CardContent class="space-y-2 px-3">
                                <div class="truncate text-xs text-muted-foreground">{user_name}</div>
                                <Button
                                    variant=ButtonVariant::Outline
                                    size=ButtonSize::Sm
                                    on:click=on_logout
                                    class="w-full"
                                >
                                    "Cerrar sesión"
                                </Button>
                            </CardContent>
                        </Card>
                    </div>
                </aside>

                <main class="min-w-0 flex-1">{children()}</main>
            </div>
        </div>
    }
}

/// Authenticated pages: the layout when signed in, the sign-in form otherwise.
#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.is_authenticated();

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=move || view! { <SignInPage /> }>
            <AppLayout>
                {move || children.with_value(|c| c())}
            </AppLayout>
        </Show>
    }
}

/// Sign-in and sign-up: a signed-in visitor is sent to the dashboard.
#[component]
pub fn PublicRoute(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());
    let children = StoredValue::new(children);

    Effect::new(move |_| {
        if app_state.0.is_authenticated() {
            navigate.with_value(|nav| nav("/", Default::default()));
        }
    });

    view! {
        <Show when=move || !app_state.0.is_authenticated() fallback=|| ().into_view()>
            {move || children.with_value(|c| c())}
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_active_matching() {
        assert!(is_active("/", "/"));
        assert!(!is_active("/facturas", "/"));
        assert!(is_active("/facturas", "/facturas"));
        assert!(is_active("/facturas/12", "/facturas"));
        assert!(!is_active("/facturasx", "/facturas"));
    }
}
