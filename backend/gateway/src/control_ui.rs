//! Static web UI.

use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

/// Serve files from `dir`, falling back to its `index.html` for unknown
/// paths so client-side routes resolve.
pub fn static_service(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}
