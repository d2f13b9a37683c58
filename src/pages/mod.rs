mod auth;
mod clientes;
mod cotizaciones;
mod facturas;
mod home;
mod layout;
mod ncf;
mod records;

pub use auth::{ExternalCallbackPage, SignInPage, SignUpPage};
pub use clientes::ClientesPage;
pub use cotizaciones::CotizacionesPage;
pub use facturas::FacturasPage;
pub use home::HomePage;
pub use layout::{AppLayout, PublicRoute, RootAuthed};
pub use ncf::NcfPage;

use leptos::prelude::*;
use wasm_bindgen::JsCast;

/// How long success banners stay up.
pub(crate) const FLASH_MS: i32 = 3500;

pub(crate) fn after_delay(delay_ms: i32, f: impl FnOnce() + 'static) {
    let _ = window().set_timeout_with_callback_and_timeout_and_arguments_0(
        wasm_bindgen::closure::Closure::once_into_js(f)
            .as_ref()
            .unchecked_ref(),
        delay_ms,
    );
}

/// Show `message` for [`FLASH_MS`]. A newer message is not cleared by an
/// older timer.
pub(crate) fn flash(slot: RwSignal<Option<String>>, message: String) {
    let shown = message.clone();
    let _ = slot.try_set(Some(message));
    after_delay(FLASH_MS, move || {
        if slot.try_get_untracked().flatten().as_deref() == Some(shown.as_str()) {
            let _ = slot.try_set(None);
        }
    });
}
