use std::io::Write;
use std::path::Path;

/// Extract the lower-cased domain from an email address.
///
/// Example: "Sarah.Chen@Acme.com" → "acme.com". Returns "" when there is no `@`.
pub fn domain_from_email(email: &str) -> String {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim().to_lowercase())
        .unwrap_or_default()
}

/// True if the email belongs to the given (lower-cased) internal domain.
pub fn is_internal_email(email: &str, internal_domain: &str) -> bool {
    !internal_domain.is_empty() && domain_from_email(email) == internal_domain
}

/// Lower-cased, space-separated name guess from an email local part.
///
/// Example: "sarah.chen@acme.com" → "sarah chen"
pub fn attendee_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    local
        .split(|c: char| c == '.' || c == '_' || c == '-' || c == '+')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive a display name from an email address (best-effort).
///
/// Example: "sarah.chen@acme.com" → "Sarah Chen"
pub fn name_from_email(email: &str) -> String {
    attendee_name_from_email(email)
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write a file via a sibling temp file + rename so readers never see a partial write.
pub fn atomic_write_str(path: &Path, content: &str) -> std::io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_from_email() {
        assert_eq!(domain_from_email("Sarah.Chen@Acme.COM"), "acme.com");
        assert_eq!(domain_from_email("no-at-sign"), "");
        assert_eq!(domain_from_email("x@"), "");
    }

    #[test]
    fn test_is_internal_email() {
        assert!(is_internal_email("me@myco.com", "myco.com"));
        assert!(!is_internal_email("them@other.com", "myco.com"));
        assert!(!is_internal_email("me@myco.com", ""));
    }

    #[test]
    fn test_attendee_name_from_email() {
        assert_eq!(attendee_name_from_email("Sarah.Chen@acme.com"), "sarah chen");
        assert_eq!(attendee_name_from_email("joe_smith-jr@bigcorp.io"), "joe smith jr");
        assert_eq!(attendee_name_from_email("alice@example.com"), "alice");
    }

    #[test]
    fn test_name_from_email() {
        assert_eq!(name_from_email("sarah.chen@acme.com"), "Sarah Chen");
        assert_eq!(name_from_email("joe_smith@bigcorp.io"), "Joe Smith");
    }

    #[test]
    fn test_atomic_write_str_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        atomic_write_str(&path, "first").unwrap();
        atomic_write_str(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
