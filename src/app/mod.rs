use crate::pages::{
    ClientesPage, CotizacionesPage, ExternalCallbackPage, FacturasPage, HomePage, NcfPage,
    PublicRoute, RootAuthed, SignInPage, SignUpPage,
};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // Router hooks (`use_location`, `use_query_map`) need the <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Página no encontrada"</div> }>
                <Route path=path!("signin") view=move || view! {
                    <PublicRoute>
                        <SignInPage />
                    </PublicRoute>
                } />
                <Route path=path!("signup") view=move || view! {
                    <PublicRoute>
                        <SignUpPage />
                    </PublicRoute>
                } />
                <Route path=path!("auth/callback") view=ExternalCallbackPage />
                <Route path=path!("cotizaciones") view=move || view! {
                    <RootAuthed>
                        <CotizacionesPage />
                    </RootAuthed>
                } />
                <Route path=path!("facturas") view=move || view! {
                    <RootAuthed>
                        <FacturasPage />
                    </RootAuthed>
                } />
                <Route path=path!("clientes") view=move || view! {
                    <RootAuthed>
                        <ClientesPage />
                    </RootAuthed>
                } />
                <Route path=path!("ncf") view=move || view! {
                    <RootAuthed>
                        <NcfPage />
                    </RootAuthed>
                } />
                <Route path=path!("") view=move || view! {
                    <RootAuthed>
                        <HomePage />
                    </RootAuthed>
                } />
            </Routes>
        </Router>
    }
}
