//! # Names and Object Keys
//!
//! Display names are what the user sees; object keys are what the blob
//! store sees. Keys are derived, never taken from the caller verbatim.

use chrono::Utc;
use uuid::Uuid;

use super::OwnerId;
use crate::errors::{VaultError, VaultResult};

/// Maximum display name length in characters
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of the sanitized name suffix of an object key
pub const MAX_KEY_SEGMENT_LEN: usize = 128;

const MAX_CONTENT_TYPE_LEN: usize = 255;

/// Validate and normalize a display name (file or folder)
pub fn validate_display_name(name: &str) -> VaultResult<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(VaultError::InvalidInput("name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(VaultError::InvalidInput(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(VaultError::InvalidInput(
            "name must not contain control characters".to_string(),
        ));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(VaultError::InvalidInput(format!("invalid name: {}", trimmed)));
    }

    Ok(trimmed.to_string())
}

/// Validate a MIME type of the form `type/subtype[; params]`
pub fn validate_content_type(content_type: &str) -> VaultResult<String> {
    let trimmed = content_type.trim();
    let invalid = || VaultError::InvalidInput(format!("invalid content type: {:?}", content_type));

    if trimmed.is_empty() || trimmed.len() > MAX_CONTENT_TYPE_LEN {
        return Err(invalid());
    }
    if trimmed.chars().any(|c| c.is_control() || !c.is_ascii()) {
        return Err(invalid());
    }

    let essence = trimmed.split(';').next().unwrap_or_default().trim();
    let (kind, subtype) = essence.split_once('/').ok_or_else(invalid)?;
    let is_token = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };
    if !is_token(kind) || !is_token(subtype) {
        return Err(invalid());
    }

    Ok(trimmed.to_string())
}

/// Reduce a file name to a key-safe segment.
///
/// Path separators, control characters and anything outside
/// `[A-Za-z0-9._-]` are removed, whitespace runs become one `_`, and
/// leading dots are stripped. The result never contains `/`.
pub fn sanitize_key_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;

    for c in name.chars() {
        if c.is_control() {
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            if pending_space && !out.is_empty() {
                out.push('_');
            }
            pending_space = false;
            out.push(c);
        }
    }

    let segment: String = out
        .trim_start_matches('.')
        .chars()
        .take(MAX_KEY_SEGMENT_LEN)
        .collect();

    if segment.is_empty() {
        "file".to_string()
    } else {
        segment
    }
}

/// Key prefix under which all of an owner's objects live
pub fn owner_prefix(owner_id: &OwnerId) -> String {
    format!("uploads/{}/", owner_id)
}

/// Derive a fresh, collision-resistant object key for an upload
pub fn derive_object_key(owner_id: &OwnerId, file_name: &str) -> String {
    format!(
        "{}{}-{}-{}",
        owner_prefix(owner_id),
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        sanitize_key_segment(file_name)
    )
}

/// Whether `key` is a well-formed key in `owner_id`'s prefix
pub fn key_belongs_to(owner_id: &OwnerId, key: &str) -> bool {
    match key.strip_prefix(&owner_prefix(owner_id)) {
        Some(rest) => !rest.is_empty() && !rest.contains('/') && !rest.starts_with('.'),
        None => false,
    }
}
