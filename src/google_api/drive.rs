//! Google Drive API v3: list note documents, file a report into a folder.

use serde::Deserialize;

use super::{GoogleApiError, GoogleSession};

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const GOOGLE_DOC_MIME: &str = "application/vnd.google-apps.document";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub modified_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileParents {
    #[serde(default)]
    parents: Vec<String>,
}

/// Drive search for note documents.
///
/// With a folder id: every Google Doc directly inside it. Without: any Doc
/// whose name mentions "Meeting" or "Agenda".
pub fn notes_query(folder_id: Option<&str>) -> String {
    match folder_id.map(str::trim).filter(|f| !f.is_empty()) {
        Some(folder) => format!(
            "'{}' in parents and mimeType='{}' and trashed=false",
            folder.replace('\'', "\\'"),
            GOOGLE_DOC_MIME
        ),
        None => format!(
            "mimeType='{}' and (name contains 'Meeting' or name contains 'Agenda') and trashed=false",
            GOOGLE_DOC_MIME
        ),
    }
}

/// List note documents (paginated, 100 per page).
pub fn list_note_docs(
    session: &GoogleSession,
    folder_id: Option<&str>,
) -> Result<Vec<DriveFile>, GoogleApiError> {
    let query = notes_query(folder_id);
    let mut files = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut params = vec![
            ("q", query.as_str()),
            ("pageSize", "100"),
            ("fields", "nextPageToken, files(id, name, mimeType, modifiedTime)"),
        ];
        if let Some(ref token) = page_token {
            params.push(("pageToken", token.as_str()));
        }

        let body: FileListResponse = session.get_json(FILES_URL, &params)?;
        files.extend(body.files);

        match body.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(files)
}

/// Move a file into `folder_id`, detaching it from its current parents.
pub fn move_to_folder(
    session: &GoogleSession,
    file_id: &str,
    folder_id: &str,
) -> Result<(), GoogleApiError> {
    let url = format!("{}/{}", FILES_URL, file_id);
    let current: FileParents = session.get_json(&url, &[("fields", "parents")])?;
    let remove = current.parents.join(",");
    let _: serde_json::Value = session.patch_json(
        &url,
        &[
            ("addParents", folder_id),
            ("removeParents", remove.as_str()),
            ("fields", "id, parents"),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_query_folder() {
        assert_eq!(
            notes_query(Some("abc123")),
            "'abc123' in parents and mimeType='application/vnd.google-apps.document' and trashed=false"
        );
    }

    #[test]
    fn test_notes_query_fallback() {
        for folder in [None, Some(""), Some("  ")] {
            let q = notes_query(folder);
            assert!(q.contains("name contains 'Meeting'"));
            assert!(q.contains("name contains 'Agenda'"));
        }
    }

    #[test]
    fn test_file_list_deserialization() {
        let body: FileListResponse = serde_json::from_value(serde_json::json!({
            "files": [
                {"id": "d1", "name": "Acme + MyCo Meeting Agendas", "mimeType": GOOGLE_DOC_MIME},
                {"id": "d2"}
            ]
        }))
        .unwrap();
        assert_eq!(body.files.len(), 2);
        assert_eq!(body.files[0].name, "Acme + MyCo Meeting Agendas");
        assert_eq!(body.files[1].name, "");
        assert!(body.next_page_token.is_none());
    }
}
