//! PDF retrieval: fetch a document as base64, decode it, and hand the bytes
//! to a [`DocumentViewer`].

use crate::api::{ApiClient, ApiError, ApiResult};
use crate::models::DocumentKind;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use leptos::logging::{error, warn};
use serde_json::Value;
use std::future::Future;

/// Object URLs are released this long after the tab is opened.
pub(crate) const RELEASE_DELAY_MS: i32 = 1000;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub(crate) enum DocumentError {
    #[error("Error al abrir el PDF")]
    Fetch(#[from] ApiError),
    #[error("Formato de PDF inválido")]
    InvalidPdfFormat,
    #[error("Error al abrir el PDF")]
    Viewer(String),
}

/// First non-empty base64 string among the response shapes the backend uses.
pub(crate) fn extract_pdf_base64(response: &Value) -> Option<&str> {
    let data = response.get("data");
    let candidates = [
        data.and_then(|d| d.get("content")),
        response.get("content"),
        data.and_then(|d| d.get("pdf")),
        response.get("pdf"),
        data,
        Some(response),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

pub(crate) fn decode_pdf(encoded: &str) -> Result<Vec<u8>, DocumentError> {
    let payload = match encoded.split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| DocumentError::InvalidPdfFormat)?;
    if bytes.is_empty() {
        return Err(DocumentError::InvalidPdfFormat);
    }
    Ok(bytes)
}

/// Where decoded documents go.
pub(crate) trait DocumentViewer {
    /// Wrap the bytes in an `application/pdf` object URL.
    fn create_url(&self, bytes: &[u8]) -> Result<String, DocumentError>;
    fn open(&self, url: &str) -> Result<(), DocumentError>;
    fn schedule_release(&self, url: String, delay_ms: i32);
    /// Tell the user something went wrong.
    fn notify(&self, message: &str);
}

/// Decode `response` and show it. Once an object URL exists its release is
/// always scheduled, even if opening the tab fails.
pub(crate) fn show_pdf_response<V: DocumentViewer>(
    response: &Value,
    viewer: &V,
) -> Result<(), DocumentError> {
    let encoded = extract_pdf_base64(response).ok_or(DocumentError::InvalidPdfFormat)?;
    let bytes = decode_pdf(encoded)?;
    let url = viewer.create_url(&bytes)?;
    let opened = viewer.open(&url);
    viewer.schedule_release(url, RELEASE_DELAY_MS);
    opened
}

/// Await `fetch`, then show the document. Failures are logged and reported
/// through [`DocumentViewer::notify`]; the error is also returned.
pub(crate) async fn open_document<V, F>(fetch: F, viewer: &V) -> Result<(), DocumentError>
where
    V: DocumentViewer,
    F: Future<Output = ApiResult<Value>>,
{
    let result = match fetch.await {
        Ok(response) => show_pdf_response(&response, viewer),
        Err(e) => Err(DocumentError::Fetch(e)),
    };
    if let Err(e) = &result {
        match e {
            DocumentError::Fetch(inner) => error!("Error fetching PDF: {inner}"),
            other => error!("Error opening PDF: {other:?}"),
        }
        viewer.notify(&e.to_string());
    }
    result
}

/// Fetch and open the stored PDF of a quote or invoice.
pub(crate) async fn open_record_pdf<V: DocumentViewer>(
    api: &ApiClient,
    kind: DocumentKind,
    id: i64,
    viewer: &V,
) -> Result<(), DocumentError> {
    open_document(api.document_pdf(kind, id), viewer).await
}

/// Opens documents in a new browser tab; notifications are `alert`s.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserViewer;

fn js_error(e: wasm_bindgen::JsValue) -> DocumentError {
    DocumentError::Viewer(format!("{e:?}"))
}

impl DocumentViewer for BrowserViewer {
    fn create_url(&self, bytes: &[u8]) -> Result<String, DocumentError> {
        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(bytes));

        let opts = web_sys::BlobPropertyBag::new();
        opts.set_type("application/pdf");

        let blob =
            web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &opts).map_err(js_error)?;
        web_sys::Url::create_object_url_with_blob(&blob).map_err(js_error)
    }

    fn open(&self, url: &str) -> Result<(), DocumentError> {
        let window = web_sys::window().ok_or_else(|| DocumentError::Viewer("no window".into()))?;
        match window.open_with_url_and_target(url, "_blank") {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(DocumentError::Viewer("popup blocked".into())),
            Err(e) => Err(js_error(e)),
        }
    }

    fn schedule_release(&self, url: String, delay_ms: i32) {
        use wasm_bindgen::JsCast;

        let Some(window) = web_sys::window() else {
            let _ = web_sys::Url::revoke_object_url(&url);
            return;
        };
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            let _ = web_sys::Url::revoke_object_url(&url);
        });
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            delay_ms,
        );
    }

    fn notify(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
}

/// Same viewer, but failures are only logged. Used where a PDF opens as a
/// side effect and must not interrupt the user.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct QuietViewer<V>(pub V);

impl<V: DocumentViewer> DocumentViewer for QuietViewer<V> {
    fn create_url(&self, bytes: &[u8]) -> Result<String, DocumentError> {
        self.0.create_url(bytes)
    }

    fn open(&self, url: &str) -> Result<(), DocumentError> {
        self.0.open(url)
    }

    fn schedule_release(&self, url: String, delay_ms: i32) {
        self.0.schedule_release(url, delay_ms)
    }

    fn notify(&self, message: &str) {
        warn!("PDF not shown: {message}");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Records every viewer interaction.
    #[derive(Default)]
    pub(crate) struct RecordingViewer {
        pub created: RefCell<Vec<usize>>,
        pub opened: RefCell<Vec<String>>,
        pub released: RefCell<Vec<(String, i32)>>,
        pub notices: RefCell<Vec<String>>,
        pub block_popups: bool,
    }

    impl DocumentViewer for RecordingViewer {
        fn create_url(&self, bytes: &[u8]) -> Result<String, DocumentError> {
            self.created.borrow_mut().push(bytes.len());
            Ok(format!("blob:test/{}", self.created.borrow().len()))
        }

        fn open(&self, url: &str) -> Result<(), DocumentError> {
            if self.block_popups {
                return Err(DocumentError::Viewer("popup blocked".into()));
            }
            self.opened.borrow_mut().push(url.to_string());
            Ok(())
        }

        fn schedule_release(&self, url: String, delay_ms: i32) {
            self.released.borrow_mut().push((url, delay_ms));
        }

        fn notify(&self, message: &str) {
            self.notices.borrow_mut().push(message.to_string());
        }
    }

    impl DocumentViewer for &RecordingViewer {
        fn create_url(&self, bytes: &[u8]) -> Result<String, DocumentError> {
            (*self).create_url(bytes)
        }
        fn open(&self, url: &str) -> Result<(), DocumentError> {
            (*self).open(url)
        }
        fn schedule_release(&self, url: String, delay_ms: i32) {
            (*self).schedule_release(url, delay_ms)
        }
        fn notify(&self, message: &str) {
            (*self).notify(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingViewer;
    use super::*;
    use futures::executor::block_on;
    use futures::future::ready;
    use serde_json::json;

    // "%PDF-1.4\n" plus a few bytes.
    const SAMPLE: &[u8] = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n1 0 obj\n";

    #[test]
    fn test_valid_payload_opens_once_and_releases_once() {
        let viewer = RecordingViewer::default();
        let body = json!({ "status": true, "data": { "filename": "c.pdf", "content": STANDARD.encode(SAMPLE) } });

        let res = block_on(open_document(ready(Ok(body)), &viewer));
        assert_eq!(res, Ok(()));
        assert_eq!(*viewer.created.borrow(), vec![SAMPLE.len()]);
        assert_eq!(viewer.opened.borrow().len(), 1);
        assert_eq!(
            *viewer.released.borrow(),
            vec![("blob:test/1".to_string(), RELEASE_DELAY_MS)]
        );
        assert!(viewer.notices.borrow().is_empty());
    }

    #[test]
    fn test_missing_content_notifies_without_opening() {
        let viewer = RecordingViewer::default();
        let res = block_on(open_document(ready(Ok(json!({ "data": {} }))), &viewer));

        assert_eq!(res, Err(DocumentError::InvalidPdfFormat));
        assert!(viewer.opened.borrow().is_empty());
        assert!(viewer.released.borrow().is_empty());
        assert_eq!(*viewer.notices.borrow(), vec!["Formato de PDF inválido".to_string()]);
    }

    #[test]
    fn test_fetch_failure_notifies() {
        let viewer = RecordingViewer::default();
        let err = ApiError::Http {
            status: 500,
            message: "boom".into(),
        };
        let res = block_on(open_document(ready(Err(err.clone())), &viewer));

        assert_eq!(res, Err(DocumentError::Fetch(err)));
        assert_eq!(*viewer.notices.borrow(), vec!["Error al abrir el PDF".to_string()]);
    }

    #[test]
    fn test_release_scheduled_even_if_popup_blocked() {
        let viewer = RecordingViewer {
            block_popups: true,
            ..Default::default()
        };
        let body = json!({ "content": STANDARD.encode(SAMPLE) });
        let res = block_on(open_document(ready(Ok(body)), &viewer));

        assert!(matches!(res, Err(DocumentError::Viewer(_))));
        assert_eq!(viewer.released.borrow().len(), 1);
        assert_eq!(viewer.notices.borrow().len(), 1);
    }

    #[test]
    fn test_quiet_viewer_does_not_notify() {
        let inner = RecordingViewer::default();
        let quiet = QuietViewer(&inner);
        let res = block_on(open_document(ready(Ok(json!({ "data": {} }))), &quiet));

        assert_eq!(res, Err(DocumentError::InvalidPdfFormat));
        assert!(inner.notices.borrow().is_empty());
    }

    #[test]
    fn test_extract_prefers_data_content() {
        let body = json!({ "content": "b", "data": { "content": "a" } });
        assert_eq!(extract_pdf_base64(&body), Some("a"));

        let body = json!({ "content": "", "data": "c" });
        assert_eq!(extract_pdf_base64(&body), Some("c"));

        assert_eq!(extract_pdf_base64(&json!("raw")), Some("raw"));
        assert_eq!(extract_pdf_base64(&json!({ "data": { "content": 3 } })), None);
    }

    #[test]
    fn test_decode_rejects_garbage_and_accepts_data_uri() {
        assert_eq!(decode_pdf("%%%"), Err(DocumentError::InvalidPdfFormat));

        let uri = format!("data:application/pdf;base64,{}", STANDARD.encode(SAMPLE));
        assert_eq!(decode_pdf(&uri).map(|b| b.len()), Ok(SAMPLE.len()));
    }
}
