//! Icon directory listing for the editor's autocomplete.

use std::path::{Path, PathBuf};

/// Image extensions offered in the autocomplete list.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp"];

/// Default icon directory, e.g. ~/.local/share/paddo/icons.
pub fn default_icons_dir() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?
        .join("paddo")
        .join("icons");
    Ok(dir)
}

/// List image filenames in `dir`, sorted. Any read failure (missing
/// directory, permissions) is "no icons available", never an error.
pub fn list_icons(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Icon directory unavailable ({}): {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut icons: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_image_file(name))
        .collect();

    icons.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
    icons
}

fn is_image_file(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(stem, ext)| {
            !stem.is_empty()
                && IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_image_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zebra.png", "app.svg", "notes.txt", "photo.JPEG", "conf.toml"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let icons = list_icons(dir.path());
        assert_eq!(icons, vec!["app.svg", "photo.JPEG", "zebra.png"]);
    }

    #[test]
    fn missing_directory_is_empty_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let icons = list_icons(&dir.path().join("does-not-exist"));
        assert!(icons.is_empty());
    }

    #[test]
    fn extension_matching() {
        assert!(is_image_file("a.png"));
        assert!(is_image_file("a.WEBP"));
        assert!(!is_image_file("png"));
        assert!(!is_image_file(".png"));
        assert!(!is_image_file("archive.tar.gz"));
        assert!(is_image_file("archive.tar.png"));
    }
}
