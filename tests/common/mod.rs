#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use wakeup::config::{Config, ServerConfig};

/// Minimal valid PDF with one Helvetica text line per page, with correct
/// xref byte offsets so pdf-extract can parse it. An empty string yields a
/// page with an empty content stream.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut objects: Vec<String> = Vec::new();
    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids,
        pages.len()
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());
    for (i, text) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> >> >>",
            5 + 2 * i
        ));
        let stream = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", text)
        };
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj {} endobj\n", i + 1, body).as_bytes());
    }
    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for off in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

pub fn test_config(tmp: &TempDir) -> Config {
    Config {
        upload_folder: tmp.path().join("uploads"),
        allowed_extensions: vec!["pdf".to_string()],
        storage_folder: tmp.path().join("storage"),
        server: ServerConfig::default(),
        schedule: Vec::new(),
    }
}

/// Writes a config file for the CLI and returns its path.
pub fn write_config_file(root: &Path) -> PathBuf {
    let config_path = root.join("config.json");
    let content = serde_json::json!({
        "upload_folder": root.join("uploads"),
        "allowed_extensions": ["pdf"],
        "storage_folder": root.join("storage"),
    });
    fs::write(&config_path, content.to_string()).unwrap();
    config_path
}

pub fn count_entries(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    fs::read_dir(dir).unwrap().count()
}
