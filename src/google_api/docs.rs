//! Google Docs API v1: read note documents, create and fill report documents.

use serde::Deserialize;

use super::{GoogleApiError, GoogleSession};

const DOCUMENTS_URL: &str = "https://docs.googleapis.com/v1/documents";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedDocument {
    document_id: String,
}

/// Browser URL of a document.
pub fn document_url(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", document_id)
}

/// Plain text of a document body: every paragraph text run, in order.
pub fn document_text(document: &serde_json::Value) -> String {
    let mut text = String::new();
    let Some(content) = document["body"]["content"].as_array() else {
        return text;
    };
    for element in content {
        let Some(runs) = element["paragraph"]["elements"].as_array() else {
            continue;
        };
        for run in runs {
            if let Some(s) = run["textRun"]["content"].as_str() {
                text.push_str(s);
            }
        }
    }
    text
}

/// Fetch a document and flatten it to text.
pub fn get_document_text(session: &GoogleSession, document_id: &str) -> Result<String, GoogleApiError> {
    let url = format!("{}/{}", DOCUMENTS_URL, document_id);
    let document: serde_json::Value = session.get_json(&url, &[])?;
    Ok(document_text(&document))
}

/// Create an empty document and return its id.
pub fn create_document(session: &GoogleSession, title: &str) -> Result<String, GoogleApiError> {
    let created: CreatedDocument =
        session.post_json(DOCUMENTS_URL, &serde_json::json!({ "title": title }))?;
    Ok(created.document_id)
}

/// Apply `documents.batchUpdate` requests in order.
pub fn batch_update(
    session: &GoogleSession,
    document_id: &str,
    requests: Vec<serde_json::Value>,
) -> Result<(), GoogleApiError> {
    if requests.is_empty() {
        return Ok(());
    }
    let url = format!("{}/{}:batchUpdate", DOCUMENTS_URL, document_id);
    let _: serde_json::Value =
        session.post_json(&url, &serde_json::json!({ "requests": requests }))?;
    Ok(())
}
