mod document;

pub(crate) use document::{ClientRef, DocumentDraft, LineItem};
