//! Startup font loading.
//!
//! Faces are read from one directory. The file stem names the face as
//! `Family-Style` (`Inter-SemiBold.ttf`); the style maps to a CSS weight and
//! a stem without a dash is a regular face.

use std::path::Path;

use canvas::fonts::{FontBook, weight_from_style};
use tracing::{info, warn};

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

/// Split a file stem into `(family, weight)`.
#[must_use]
pub fn parse_face_stem(stem: &str) -> (String, u16) {
    match stem.rsplit_once('-') {
        Some((family, style)) if !family.is_empty() => (family.to_owned(), weight_from_style(style)),
        _ => (stem.to_owned(), weight_from_style("regular")),
    }
}

/// Load every font face in `dir`. Unreadable or invalid files are skipped
/// with a warning; a missing directory yields an empty book.
#[must_use]
pub fn load_font_dir(dir: &Path) -> FontBook {
    let mut book = FontBook::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "font directory unreadable");
            return book;
        }
    };

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    paths.sort();

    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let (family, weight) = parse_face_stem(stem);
        let loaded = std::fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| book.add_bytes(&family, weight, bytes).map_err(|e| e.to_string()));
        if let Err(error) = loaded {
            warn!(path = %path.display(), %error, "skipping font face");
        }
    }

    info!(dir = %dir.display(), faces = book.len(), "fonts loaded");
    book
}

#[cfg(test)]
#[path = "fonts_test.rs"]
mod tests;
