use super::after_delay;
use crate::api::{LoginData, RegisterRequest};
use crate::components::ui::{
    Button, ButtonSize, BusyLabel, Card, CardContent, CardDescription, CardHeader, CardTitle,
    ErrorAlert, Input, Label, SuccessAlert,
};
use crate::models::User;
use crate::state::AppContext;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use leptos::logging::{error, warn};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_query_map;

/// Delay before leaving the sign-up page after a successful registration.
const REGISTERED_REDIRECT_MS: i32 = 2000;

#[component]
fn AuthShell(title: &'static str, subtitle: &'static str, children: Children) -> impl IntoView {
    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">"Gratex"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">{title}</CardTitle>
                        <CardDescription class="text-xs">{subtitle}</CardDescription>
                    </CardHeader>
                    <CardContent>{children()}</CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn SignInPage() -> impl IntoView {
    let email_or_username: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() {
            return;
        }

        let login = email_or_username.get().trim().to_string();
        let password_val = password.get();
        let api = app_state.0.api();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api.login(&login, &password_val).await {
                Ok(data) => {
                    app_state.0.sign_in_with(data);
                    let _ = window().location().set_href("/");
                }
                Err(e) => {
                    warn!("Login failed: {e}");
                    let _ = error.try_set(Some(e.to_string()));
                }
            }
            let _ = loading.try_set(false);
        });
    };

    view! {
        <AuthShell title="Iniciar sesión" subtitle="Ingrese su correo o usuario y contraseña.">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <div class="flex flex-col gap-1.5">
                    <Label html_for="login" class="text-xs">"Correo o usuario"</Label>
                    <Input
                        id="login"
                        placeholder="usuario@gratex.com"
                        bind_value=email_or_username
                        required=true
                        autofocus=true
                        class="h-8 text-sm"
                    />
                </div>

                <div class="flex flex-col gap-1.5">
                    <Label html_for="password" class="text-xs">"Contraseña"</Label>
                    <Input
                        id="password"
                        r#type="password"
                        placeholder="••••••••"
                        bind_value=password
                        required=true
                        class="h-8 text-sm"
                    />
                </div>

                <ErrorAlert error=error />

                <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
                    <BusyLabel busy=loading idle_label="Entrar" busy_label="Entrando..." />
                </Button>

                <div class="pt-1 text-xs text-muted-foreground">
                    "¿No tiene cuenta? "
                    <a class="text-primary underline underline-offset-4" href="/signup">"Registrarse"</a>
                </div>
            </form>
        </AuthShell>
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct SignUpForm {
    first_name: String,
    last_name: String,
    username: String,
    email: String,
    phone: String,
    password: String,
}

impl SignUpForm {
    fn to_request(&self) -> Option<RegisterRequest> {
        let fields = [
            &self.first_name,
            &self.last_name,
            &self.username,
            &self.email,
            &self.phone,
            &self.password,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return None;
        }
        Some(RegisterRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            name: format!("{} {}", self.first_name.trim(), self.last_name.trim()),
            username: self.username.trim().to_string(),
            phone_number: self.phone.trim().to_string(),
        })
    }
}

#[component]
pub fn SignUpPage() -> impl IntoView {
    let first_name: RwSignal<String> = RwSignal::new(String::new());
    let last_name: RwSignal<String> = RwSignal::new(String::new());
    let username: RwSignal<String> = RwSignal::new(String::new());
    let email: RwSignal<String> = RwSignal::new(String::new());
    let phone: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let success: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() {
            return;
        }

        let form = SignUpForm {
            first_name: first_name.get(),
            last_name: last_name.get(),
            username: username.get(),
            email: email.get(),
            phone: phone.get(),
            password: password.get(),
        };
        let Some(req) = form.to_request() else {
            error.set(Some("Complete todos los campos obligatorios".to_string()));
            return;
        };

        let api = app_state.0.api();
        loading.set(true);
        error.set(None);
        success.set(None);

        spawn_local(async move {
            match api.register(&req).await {
                Ok(message) => {
                    let _ = success.try_set(Some(message));
                    after_delay(REGISTERED_REDIRECT_MS, || {
                        let _ = window().location().set_href("/signin");
                    });
                }
                Err(e) => {
                    warn!("Registration failed: {e}");
                    let _ = error.try_set(Some(e.to_string()));
                }
            }
            let _ = loading.try_set(false);
        });
    };

    let field = move |id: &'static str, label: &'static str, kind: &'static str, value: RwSignal<String>| {
        view! {
            <div class="flex flex-col gap-1.5">
                <Label html_for=id class="text-xs">{label}</Label>
                <Input id=id r#type=kind bind_value=value required=true class="h-8 text-sm" />
            </div>
        }
    };

    view! {
        <AuthShell title="Crear cuenta" subtitle="Todos los campos son obligatorios.">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <div class="grid grid-cols-2 gap-3">
                    {field("first_name", "Nombre", "text", first_name)}
                    {field("last_name", "Apellido", "text", last_name)}
                </div>
                {field("username", "Usuario", "text", username)}
                {field("email", "Correo", "email", email)}
                {field("phone", "Teléfono", "tel", phone)}
                {field("password", "Contraseña", "password", password)}

                <ErrorAlert error=error />
                <SuccessAlert message=success />

                <Button
                    class="w-full"
                    size=ButtonSize::Sm
                    attr:disabled=move || loading.get() || success.get().is_some()
                >
                    <BusyLabel busy=loading idle_label="Registrarse" busy_label="Registrando..." />
                </Button>

                <div class="pt-1 text-xs text-muted-foreground">
                    "¿Ya tiene cuenta? "
                    <a class="text-primary underline underline-offset-4" href="/signin">"Iniciar sesión"</a>
                </div>
            </form>
        </AuthShell>
    }
}

/// `user` query parameter of the external sign-in redirect: base64 of the
/// user JSON.
fn decode_callback_user(raw: &str) -> Option<User> {
    let bytes = STANDARD.decode(raw.trim()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Landing route for external sign-in: `/auth/callback?token=..&user=..`.
#[component]
pub fn ExternalCallbackPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let query = use_query_map();
    let failed: RwSignal<bool> = RwSignal::new(false);

    Effect::new(move |_| {
        let params = query.get();
        let token = params.get("token").unwrap_or_default();
        let user = params.get("user").as_deref().and_then(decode_callback_user);

        match (token.trim().is_empty(), user) {
            (false, Some(user)) => {
                app_state.0.sign_in_with(LoginData { token, user });
                let _ = window().location().set_href("/");
            }
            _ => {
                error!("External sign-in callback without a valid token/user");
                failed.set(true);
            }
        }
    });

    view! {
        <div class="flex min-h-screen items-center justify-center px-4 text-sm text-muted-foreground">
            <Show when=move || failed.get() fallback=|| view! { "Procesando inicio de sesión..." }>
                <div class="space-y-2 text-center">
                    <div>"No se pudo completar el inicio de sesión."</div>
                    <a class="text-primary underline underline-offset-4" href="/signin">"Volver"</a>
                </div>
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> SignUpForm {
        SignUpForm {
            first_name: "Ana".into(),
            last_name: "Pérez".into(),
            username: "ana".into(),
            email: " ana@gratex.com ".into(),
            phone: "809-555-0101".into(),
            password: "secreto".into(),
        }
    }

    #[test]
    fn test_sign_up_requires_every_field() {
        let mut form = filled();
        form.phone = "  ".into();
        assert_eq!(form.to_request(), None);
    }

    #[test]
    fn test_sign_up_request_joins_name() {
        let req = filled().to_request().expect("complete form");
        assert_eq!(req.name, "Ana Pérez");
        assert_eq!(req.email, "ana@gratex.com");
        assert_eq!(req.phone_number, "809-555-0101");
    }

    #[test]
    fn test_callback_user_is_base64_json() {
        let raw = STANDARD.encode(r#"{"id":7,"email":"a@b.c","username":"ana","name":"Ana"}"#);
        let user = decode_callback_user(&raw).expect("decodes");
        assert_eq!(user.id, 7);
        assert_eq!(user.display_name(), "Ana");

        assert_eq!(decode_callback_user("not base64!"), None);
        assert_eq!(decode_callback_user(&STANDARD.encode("[]")), None);
    }
}
