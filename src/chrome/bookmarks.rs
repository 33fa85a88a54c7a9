//! Bookmark extraction from the foreign `Bookmarks` JSON document.

use crate::chrome::ChromeProfile;
use crate::common::{is_http_url, DataFiles};
use crate::types::Bookmark;
use serde_json::Value;
use std::fs;
use tracing::{info, warn};

/// Walks the three root containers of the bookmark file into a flat list.
///
/// Malformed or partially-unparseable documents yield whatever was collected
/// before the bad subtree; the caller never sees an error.
pub fn extract_bookmarks(profile: &ChromeProfile) -> Vec<Bookmark> {
    let path = profile.path.join(DataFiles::BOOKMARKS);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("cannot read bookmark file {:?}: {}", path, e);
            return Vec::new();
        }
    };

    let doc: Value = match serde_json::from_str(&content) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("cannot parse bookmark file: {}", e);
            return Vec::new();
        }
    };

    let mut bookmarks = Vec::new();
    for root in ["bookmark_bar", "other", "synced"] {
        if let Some(node) = doc.get("roots").and_then(|roots| roots.get(root)) {
            walk(node, "", &mut bookmarks);
        }
    }

    info!(
        "extracted {} bookmarks from profile {}",
        bookmarks.len(),
        profile.id
    );
    bookmarks
}

/// A node with a `children` array is a folder; its name extends the
/// display-only folder path. A node with `type == "url"` is a leaf.
fn walk(node: &Value, folder: &str, out: &mut Vec<Bookmark>) {
    if let Some(children) = node.get("children").and_then(Value::as_array) {
        let name = node.get("name").and_then(Value::as_str).unwrap_or("");
        let subfolder = match (folder.is_empty(), name.is_empty()) {
            (_, true) => folder.to_string(),
            (true, false) => name.to_string(),
            (false, false) => format!("{folder}/{name}"),
        };
        for child in children {
            walk(child, &subfolder, out);
        }
        return;
    }

    if node.get("type").and_then(Value::as_str) != Some("url") {
        return;
    }
    let url = node.get("url").and_then(Value::as_str).unwrap_or("");
    if !is_http_url(url) {
        return;
    }

    let title = node.get("name").and_then(Value::as_str).unwrap_or("");
    out.push(Bookmark {
        title: if title.is_empty() { url } else { title }.to_string(),
        url: url.to_string(),
        folder: folder.to_string(),
    });
}
