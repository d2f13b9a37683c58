use crate::documents::DocumentError;
use leptos::logging::warn;
use std::future::Future;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PostCreateStep {
    CloseForm,
    ClearDraft,
    FirstPage,
    Refresh,
    OpenDocument,
}

/// The view a record was just created from.
///
/// Each hook is independent; an `Err` is logged and the pipeline moves on.
pub(crate) trait PostCreateTarget {
    fn close_form(&self) -> Result<(), String>;
    fn clear_draft(&self) -> Result<(), String>;
    /// Move to page 1 without fetching; [`refresh`](Self::refresh) fetches.
    fn go_to_first_page(&self) -> Result<(), String>;
    /// Invalidate the list cache and refetch once.
    fn refresh(&self) -> Result<(), String>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PostCreateReport {
    pub completed: Vec<PostCreateStep>,
    pub failed: Vec<(PostCreateStep, String)>,
}

impl PostCreateReport {
    fn record(&mut self, step: PostCreateStep, outcome: Result<(), String>) {
        match outcome {
            Ok(()) => self.completed.push(step),
            Err(message) => {
                warn!("Post-create step {step:?} failed: {message}");
                self.failed.push((step, message));
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run the steps that follow a successful create, in order. `open_document`
/// runs last and should be built on a quiet viewer so a PDF failure never
/// interrupts the user.
pub(crate) async fn run_post_create<T, F>(target: &T, open_document: Option<F>) -> PostCreateReport
where
    T: PostCreateTarget,
    F: Future<Output = Result<(), DocumentError>>,
{
    let mut report = PostCreateReport::default();
    report.record(PostCreateStep::CloseForm, target.close_form());
    report.record(PostCreateStep::ClearDraft, target.clear_draft());
    report.record(PostCreateStep::FirstPage, target.go_to_first_page());
    report.record(PostCreateStep::Refresh, target.refresh());

    if let Some(open) = open_document {
        let outcome = open.await.map_err(|e| e.to_string());
        report.record(PostCreateStep::OpenDocument, outcome);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ListCache;
    use crate::documents::testing::RecordingViewer;
    use crate::documents::{open_document, QuietViewer};
    use crate::drafts::{ClientRef, DocumentDraft};
    use crate::list::ListQuery;
    use crate::models::RecordRow;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use futures::executor::block_on;
    use futures::future::ready;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    struct FakeView {
        open: Cell<bool>,
        draft: RefCell<DocumentDraft>,
        query: RefCell<ListQuery>,
        cache: RefCell<ListCache<RecordRow>>,
        fetches: Cell<usize>,
        fail_close: bool,
    }

    impl FakeView {
        fn new() -> Self {
            let mut draft = DocumentDraft::new("2024-05-01");
            draft.select_client(ClientRef {
                id: Some(1),
                name: "ACME".into(),
                rnc: None,
            });
            draft.item_form.description = "Tarjetas".into();
            draft.item_form.amount = "10".into();
            draft.add_item().expect("valid item");

            let mut query = ListQuery::new(10);
            query.go_to_page(3);

            Self {
                open: Cell::new(true),
                draft: RefCell::new(draft),
                query: RefCell::new(query),
                cache: RefCell::new(ListCache::default()),
                fetches: Cell::new(0),
                fail_close: false,
            }
        }
    }

    impl PostCreateTarget for FakeView {
        fn close_form(&self) -> Result<(), String> {
            if self.fail_close {
                return Err("modal disposed".into());
            }
            self.open.set(false);
            Ok(())
        }

        fn clear_draft(&self) -> Result<(), String> {
            self.draft.borrow_mut().reset("2024-05-02");
            Ok(())
        }

        fn go_to_first_page(&self) -> Result<(), String> {
            self.query.borrow_mut().go_to_page(1);
            Ok(())
        }

        fn refresh(&self) -> Result<(), String> {
            self.cache.borrow_mut().invalidate();
            self.fetches.set(self.fetches.get() + 1);
            Ok(())
        }
    }

    type NoDocument = futures::future::Ready<Result<(), DocumentError>>;

    #[test]
    fn test_create_then_refresh() {
        let view = FakeView::new();
        let report = block_on(run_post_create(&view, None::<NoDocument>));

        assert!(report.is_clean());
        assert!(!view.open.get());
        assert_eq!(view.query.borrow().page, 1);
        assert!(view.draft.borrow().is_empty());
        assert_eq!(view.draft.borrow().date, "2024-05-02");
        assert_eq!(view.cache.borrow().invalidation_count(), 1);
        assert_eq!(view.fetches.get(), 1);
    }

    #[test]
    fn test_failed_step_does_not_stop_the_rest() {
        let view = FakeView {
            fail_close: true,
            ..FakeView::new()
        };
        let report = block_on(run_post_create(&view, None::<NoDocument>));

        assert_eq!(
            report.failed,
            vec![(PostCreateStep::CloseForm, "modal disposed".to_string())]
        );
        assert_eq!(
            report.completed,
            vec![
                PostCreateStep::ClearDraft,
                PostCreateStep::FirstPage,
                PostCreateStep::Refresh
            ]
        );
        assert_eq!(view.query.borrow().page, 1);
    }

    #[test]
    fn test_pdf_failure_is_reported_quietly() {
        let view = FakeView::new();
        let viewer = RecordingViewer::default();
        let quiet = QuietViewer(&viewer);
        let open = open_document(ready(Ok(json!({ "data": {} }))), &quiet);

        let report = block_on(run_post_create(&view, Some(open)));

        assert_eq!(report.completed.len(), 4);
        assert_eq!(report.failed[0].0, PostCreateStep::OpenDocument);
        assert!(viewer.notices.borrow().is_empty());
        assert_eq!(view.cache.borrow().invalidation_count(), 1);
    }

    #[test]
    fn test_pdf_opens_after_refresh() {
        let view = FakeView::new();
        let viewer = RecordingViewer::default();
        let body = json!({ "data": { "content": STANDARD.encode(b"%PDF-1.4") } });
        let quiet = QuietViewer(&viewer);
        let open = open_document(ready(Ok(body)), &quiet);

        let report = block_on(run_post_create(&view, Some(open)));

        assert!(report.is_clean());
        assert_eq!(report.completed.last(), Some(&PostCreateStep::OpenDocument));
        assert_eq!(viewer.opened.borrow().len(), 1);
    }
}
