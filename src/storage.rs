//! Hash-keyed page storage.
//!
//! Layout on disk:
//!
//! ```text
//! <storage_folder>/
//!   <sha256-hex>/
//!     page_1.txt
//!     page_2.txt
//!     ...
//! ```
//!
//! A non-empty hash directory means the document was already processed.

use std::io;
use std::path::{Path, PathBuf};

/// Ensures `<root>/<hash>` exists and returns its path. Idempotent.
pub fn ensure_storage_folder(root: &Path, hash: &str) -> io::Result<PathBuf> {
    let dir = root.join(hash);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Returns true when `dir` contains at least one entry.
pub fn is_populated(dir: &Path) -> io::Result<bool> {
    Ok(std::fs::read_dir(dir)?.next().is_some())
}

/// File name of the record for a 1-based page number.
pub fn page_file_name(page: usize) -> String {
    format!("page_{}.txt", page)
}

/// Writes one `page_<n>.txt` per page (n from 1), overwriting existing files.
///
/// Returns the number of files written.
pub fn save_pages_to_storage(pages: &[String], dir: &Path) -> io::Result<usize> {
    for (i, text) in pages.iter().enumerate() {
        std::fs::write(dir.join(page_file_name(i + 1)), text.as_bytes())?;
    }
    Ok(pages.len())
}

/// Reads back the page records in `dir` in page order.
///
/// Files that do not follow the `page_<n>.txt` naming are ignored.
pub fn load_pages(dir: &Path) -> io::Result<Vec<String>> {
    let mut numbered: Vec<(usize, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let number = name
            .strip_prefix("page_")
            .and_then(|rest| rest.strip_suffix(".txt"))
            .and_then(|n| n.parse::<usize>().ok());
        if let Some(n) = number {
            numbered.push((n, path));
        }
    }
    numbered.sort_by_key(|(n, _)| *n);

    numbered
        .into_iter()
        .map(|(_, path)| std::fs::read_to_string(path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_storage_folder_idempotent() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("storage");
        let a = ensure_storage_folder(&root, "abc").unwrap();
        let b = ensure_storage_folder(&root, "abc").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, root.join("abc"));
        assert!(a.is_dir());
        assert!(!is_populated(&a).unwrap());
    }

    #[test]
    fn test_save_pages_creates_exactly_k_files() {
        let tmp = TempDir::new().unwrap();
        let pages = vec![
            "first".to_string(),
            String::new(),
            "troisième page, ünïcode".to_string(),
        ];
        let written = save_pages_to_storage(&pages, tmp.path()).unwrap();
        assert_eq!(written, 3);

        let mut names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["page_1.txt", "page_2.txt", "page_3.txt"]);

        let third = std::fs::read_to_string(tmp.path().join("page_3.txt")).unwrap();
        assert_eq!(third, "troisième page, ünïcode");
        assert!(is_populated(tmp.path()).unwrap());
    }

    #[test]
    fn test_save_pages_overwrites() {
        let tmp = TempDir::new().unwrap();
        save_pages_to_storage(&["old".to_string()], tmp.path()).unwrap();
        save_pages_to_storage(&["new".to_string()], tmp.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("page_1.txt")).unwrap(),
            "new"
        );
    }

    #[test]
    fn test_load_pages_numeric_order() {
        let tmp = TempDir::new().unwrap();
        let pages: Vec<String> = (1..=12).map(|i| format!("page {}", i)).collect();
        save_pages_to_storage(&pages, tmp.path()).unwrap();
        std::fs::write(tmp.path().join("notes.md"), "ignored").unwrap();

        let loaded = load_pages(tmp.path()).unwrap();
        assert_eq!(loaded, pages);
    }
}
