//! # File and Folder Records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OwnerId;

/// A committed file. Exists only once its backing object was confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub name: String,
    pub size_bytes: u64,
    pub content_type: String,
    /// Unique within the owner's namespace
    pub object_key: String,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// Create a record for a freshly confirmed object
    pub fn new(
        owner_id: OwnerId,
        name: String,
        size_bytes: u64,
        content_type: String,
        object_key: String,
        folder_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            size_bytes,
            content_type,
            object_key,
            folder_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A folder. Only a flat parent reference, no path semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(owner_id: OwnerId, name: String, parent_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            parent_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Which folder a listing is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderFilter {
    /// Every file regardless of folder
    #[default]
    Any,
    /// Files with no folder
    Root,
    In(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    #[default]
    CreatedAt,
    Size,
    ContentType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// File listing filter. Defaults to every file, newest first.
#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    pub folder: FolderFilter,
    /// Case-insensitive substring match on the name
    pub search: Option<String>,
    pub content_type: Option<String>,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl FileQuery {
    /// Whether a record passes the folder, search and type filters
    pub fn matches(&self, file: &FileRecord) -> bool {
        let folder_ok = match self.folder {
            FolderFilter::Any => true,
            FolderFilter::Root => file.folder_id.is_none(),
            FolderFilter::In(id) => file.folder_id == Some(id),
        };
        if !folder_ok {
            return false;
        }

        if let Some(search) = &self.search {
            if !file.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }

        match &self.content_type {
            Some(ct) => &file.content_type == ct,
            None => true,
        }
    }

    /// Sort records in place according to the query
    pub fn sort(&self, files: &mut [FileRecord]) {
        files.sort_by(|a, b| {
            let ordering = match self.sort {
                SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::Size => a.size_bytes.cmp(&b.size_bytes),
                SortField::ContentType => a.content_type.cmp(&b.content_type),
            };
            // Stable tie-break so listings are deterministic
            let ordering = ordering.then_with(|| a.id.cmp(&b.id));
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(name: &str, size: u64, content_type: &str) -> FileRecord {
        FileRecord::new(
            Uuid::new_v4(),
            name.to_string(),
            size,
            content_type.to_string(),
            format!("uploads/x/{}", name),
            None,
        )
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let query = FileQuery {
            search: Some("REPORT".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&record("q3-report.pdf", 1, "application/pdf")));
        assert!(!query.matches(&record("photo.png", 1, "image/png")));
    }

    #[test]
    fn test_folder_filter() {
        let folder = Uuid::new_v4();
        let mut inside = record("a.txt", 1, "text/plain");
        inside.folder_id = Some(folder);
        let root = record("b.txt", 1, "text/plain");

        let in_folder = FileQuery { folder: FolderFilter::In(folder), ..Default::default() };
        assert!(in_folder.matches(&inside));
        assert!(!in_folder.matches(&root));

        let at_root = FileQuery { folder: FolderFilter::Root, ..Default::default() };
        assert!(at_root.matches(&root));
        assert!(!at_root.matches(&inside));
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let mut older = record("old.txt", 1, "text/plain");
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = record("new.txt", 1, "text/plain");

        let mut files = vec![older.clone(), newer.clone()];
        FileQuery::default().sort(&mut files);
        assert_eq!(files[0].id, newer.id);
        assert_eq!(files[1].id, older.id);
    }

    #[test]
    fn test_sort_by_size_ascending() {
        let mut files = vec![
            record("big", 300, "text/plain"),
            record("small", 1, "text/plain"),
            record("mid", 20, "text/plain"),
        ];
        let query = FileQuery {
            sort: SortField::Size,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        query.sort(&mut files);
        let sizes: Vec<u64> = files.iter().map(|f| f.size_bytes).collect();
        assert_eq!(sizes, vec![1, 20, 300]);
    }
}
