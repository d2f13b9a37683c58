//! Pieces shared by the Cotizaciones and Facturas pages.

use crate::components::records_table::RecordsTable;
use crate::components::ui::Input;
use crate::documents::{open_record_pdf, BrowserViewer};
use crate::drafts::DocumentDraft;
use crate::list::{RecordSource, ServerListController, DEFAULT_PAGE_SIZE};
use crate::models::{DocumentKind, RecordRow};
use crate::state::{AppContext, PostCreateTarget};
use crate::util::today_iso_local;
use leptos::logging::warn;
use leptos::prelude::*;
use leptos::task::spawn_local;

pub(crate) fn use_record_list(kind: DocumentKind) -> ServerListController<RecordSource> {
    let app_state = expect_context::<AppContext>();
    let source = RecordSource {
        api: app_state.0.api(),
        kind,
    };
    ServerListController::new(source, DEFAULT_PAGE_SIZE, app_state.0.unauthorized_handler())
}

/// Row click handler that opens the record's stored PDF. Returns the id
/// being fetched so the table can show a spinner; clicks are ignored
/// while one is in flight.
pub(crate) fn use_row_pdf(kind: DocumentKind) -> (RwSignal<Option<i64>>, Callback<RecordRow>) {
    let app_state = expect_context::<AppContext>();
    let opening: RwSignal<Option<i64>> = RwSignal::new(None);

    let on_open = Callback::new(move |row: RecordRow| {
        if opening.get_untracked().is_some() {
            return;
        }
        opening.set(Some(row.id));
        let api = app_state.0.api();
        spawn_local(async move {
            // The viewer already alerted the user.
            if let Err(e) = open_record_pdf(&api, kind, row.id, &BrowserViewer).await {
                warn!("PDF for {} {} not shown: {e}", kind, row.id);
            }
            let _ = opening.try_set(None);
        });
    });

    (opening, on_open)
}

/// The create modal of a record page, as seen by the post-create pipeline.
#[derive(Clone, Copy)]
pub(crate) struct CreateFlow {
    pub form_open: RwSignal<bool>,
    pub draft: RwSignal<DocumentDraft>,
    pub list: ServerListController<RecordSource>,
}

impl CreateFlow {
    pub fn new(list: ServerListController<RecordSource>) -> Self {
        Self {
            form_open: RwSignal::new(false),
            draft: RwSignal::new(DocumentDraft::new(&today_iso_local())),
            list,
        }
    }

    fn list_alive(&self) -> Result<(), String> {
        if self.list.is_disposed() {
            Err("list view is gone".to_string())
        } else {
            Ok(())
        }
    }
}

impl PostCreateTarget for CreateFlow {
    fn close_form(&self) -> Result<(), String> {
        match self.form_open.try_set(false) {
            None => Ok(()),
            Some(_) => Err("form is gone".to_string()),
        }
    }

    fn clear_draft(&self) -> Result<(), String> {
        let today = today_iso_local();
        self.draft
            .try_update(|d| d.reset(&today))
            .ok_or_else(|| "draft is gone".to_string())
    }

    fn go_to_first_page(&self) -> Result<(), String> {
        self.list_alive()?;
        self.list.first_page_silently();
        Ok(())
    }

    fn refresh(&self) -> Result<(), String> {
        self.list_alive()?;
        self.list.refresh();
        Ok(())
    }
}

/// Search box plus the paginated table.
#[component]
pub(crate) fn RecordsPanel(
    kind: DocumentKind,
    list: ServerListController<RecordSource>,
    placeholder: &'static str,
) -> impl IntoView {
    let (opening, on_open) = use_row_pdf(kind);

    view! {
        <div class="space-y-3">
            <Input bind_value=list.search_input placeholder=placeholder class="h-8 max-w-sm text-sm" />
            <RecordsTable
                kind=kind
                page_view=Signal::derive(move || list.view())
                loading=list.loading
                error=list.error
                opening=opening
                on_open=on_open
                on_page=Callback::new(move |p| list.go_to_page(p))
                on_page_size=Callback::new(move |s| list.set_page_size(s))
            />
        </div>
    }
}
