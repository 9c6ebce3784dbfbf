//! Product thumbnail files under the configured media root.

use std::path::{Component, Path, PathBuf};

/// Whether `relative` names a file strictly inside the media root.
pub fn is_safe_relative(relative: &str) -> bool {
    let path = Path::new(relative);
    !relative.trim().is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

fn resolve(media_root: &Path, relative: &str) -> Option<PathBuf> {
    is_safe_relative(relative).then(|| media_root.join(relative))
}

/// Removes a deleted product's thumbnail.
///
/// A missing file is not an error; other failures are logged and swallowed
/// because the database change has already committed.
pub async fn remove_thumbnail(media_root: &Path, relative: &str) {
    let Some(path) = resolve(media_root, relative) else {
        tracing::warn!(thumb = relative, "refusing to remove thumbnail outside media root");
        return;
    };

    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "thumbnail removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove thumbnail"),
    }
}

/// Removes every thumbnail in `thumbs`.
pub async fn remove_thumbnails(media_root: &Path, thumbs: &[String]) {
    for thumb in thumbs {
        remove_thumbnail(media_root, thumb).await;
    }
}
