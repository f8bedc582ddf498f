use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// URL prefix under which stored files are served.
pub const URL_PREFIX: &str = "/uploads/";

const REPORTS_DIR: &str = "reports";
const MEMBERS_DIR: &str = "members";

/// Local blob storage for uploaded images.
///
/// Files live under `root/reports` and `root/members` and are addressed by
/// their URL path (`/uploads/reports/<name>`).
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_directories(&self) -> Result<()> {
        for dir in [REPORTS_DIR, MEMBERS_DIR] {
            let path = self.root.join(dir);
            fs::create_dir_all(&path)
                .await
                .context(format!("Failed to create upload directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Store a report image; `owner` is folded into the file name.
    pub async fn save_report_image(
        &self,
        bytes: &[u8],
        original_filename: &str,
        owner: &str,
    ) -> Result<String> {
        let filename = generate_filename(original_filename, &format!("report_{owner}_"));
        self.write(REPORTS_DIR, &filename, bytes).await
    }

    pub async fn save_member_image(
        &self,
        bytes: &[u8],
        original_filename: &str,
        user_id: i64,
    ) -> Result<String> {
        let filename = generate_filename(original_filename, &format!("member_{user_id}_"));
        self.write(MEMBERS_DIR, &filename, bytes).await
    }

    async fn write(&self, dir: &str, filename: &str, bytes: &[u8]) -> Result<String> {
        self.ensure_directories().await?;

        let path = self.root.join(dir).join(filename);
        fs::write(&path, bytes)
            .await
            .context(format!("Failed to write upload: {:?}", path))?;

        info!(path = ?path, bytes = bytes.len(), "Stored upload");
        Ok(format!("{URL_PREFIX}{dir}/{filename}"))
    }

    /// Delete a stored file by its URL path.
    ///
    /// Returns `false` for paths outside the store or files that do not exist.
    pub async fn delete(&self, url_path: &str) -> Result<bool> {
        let Some(path) = self.resolve(url_path) else {
            warn!(url_path, "Refusing to delete path outside upload store");
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).context(format!("Failed to delete upload: {:?}", path)),
        }
    }

    fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        let relative = Path::new(url_path.strip_prefix(URL_PREFIX)?);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        (safe && relative.components().count() > 0).then(|| self.root.join(relative))
    }
}

/// `{prefix}{YYYYmmdd_HHMMSS}_{8 hex chars}{ext}`, with the original
/// extension lowercased (`.jpg` when there is none).
pub fn generate_filename(original_filename: &str, prefix: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_else(|| ".jpg".to_string());
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let unique = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}{timestamp}_{}{ext}", &unique[..8])
}

/// Whether a picture URL points at a file we stored ourselves.
pub fn is_local_upload(picture_url: Option<&str>) -> bool {
    picture_url.is_some_and(|url| url.contains(URL_PREFIX) || url.starts_with("uploads/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_filename() {
        let name = generate_filename("Scan.PNG", "report_7_");
        assert!(name.starts_with("report_7_"));
        assert!(name.ends_with(".png"));
        // prefix + 15-char timestamp + '_' + 8 hex + ".png"
        assert_eq!(name.len(), "report_7_".len() + 15 + 1 + 8 + 4);

        assert!(generate_filename("noext", "").ends_with(".jpg"));
        assert_ne!(generate_filename("a.jpg", ""), generate_filename("a.jpg", ""));
    }

    #[test]
    fn test_is_local_upload() {
        assert!(is_local_upload(Some("/uploads/members/a.jpg")));
        assert!(is_local_upload(Some("uploads/members/a.jpg")));
        assert!(!is_local_upload(Some("https://lh3.googleusercontent.com/a/pic")));
        assert!(!is_local_upload(None));
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let url = store.save_report_image(b"img", "x.jpeg", "anonymous").await.unwrap();
        assert!(url.starts_with("/uploads/reports/report_anonymous_"));

        let on_disk = dir.path().join(url.strip_prefix(URL_PREFIX).unwrap());
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"img");

        assert!(store.delete(&url).await.unwrap());
        assert!(!on_disk.exists());
        assert!(!store.delete(&url).await.unwrap());
    }

    #[tokio::test]
    async fn test_member_image_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let url = store.save_member_image(b"face", "me.png", 42).await.unwrap();
        assert!(url.starts_with("/uploads/members/member_42_"));
    }

    #[tokio::test]
    async fn test_delete_rejects_outside_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        assert!(!store.delete("/etc/passwd").await.unwrap());
        assert!(!store.delete("/uploads/../secret").await.unwrap());
        assert!(!store.delete("/uploads/").await.unwrap());
    }
}
