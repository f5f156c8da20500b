//! Page sources: where pages come from and in what order.
//!
//! **Why**: The rendering pipeline only cares about an ordered list of pages
//! and a way to fetch raw bytes for one of them. Archive extraction lives
//! behind this boundary; the pipeline never sees file formats.
//!
//! **Used by**: Workers (raw byte fetch, concurrent), Scheduler (ordering,
//! info-page detection)
//!
//! Page order follows the classic reader convention: info pages (`.nfo`,
//! `.txt`) first, then images, each group in natural order so `page10`
//! sorts after `page2`.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::SourceError;

/// Image extensions the pipeline will hand to the resize function.
pub const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"];

/// Extensions treated as info pages (shown as text, never decoded).
pub const INFO_EXTS: &[&str] = &["nfo", "txt"];

/// What a page contains, decided from its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Decodable image page.
    Image,
    /// Text info page; rendered by the presentation layer, not the pipeline.
    Info,
}

/// Ordered collection of pages plus byte access.
///
/// Implementations must support concurrent `get_bytes` calls from multiple
/// worker threads; the pipeline treats a source as read-only.
pub trait PageSource: Send + Sync {
    /// Number of pages in the collection.
    fn page_count(&self) -> usize;

    /// Display name of a page, or `None` when out of range.
    fn page_name(&self, index: usize) -> Option<&str>;

    /// Kind of a page, or `None` when out of range.
    fn page_kind(&self, index: usize) -> Option<PageKind>;

    /// Fetch the raw (undecoded) bytes of a page.
    fn get_bytes(&self, index: usize) -> Result<Vec<u8>, SourceError>;
}

fn ext_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

/// Check if a name looks like a supported image.
pub fn is_image_name(name: &str) -> bool {
    IMAGE_EXTS.contains(&ext_of(name).as_str())
}

/// Check if a name looks like an info text page.
pub fn is_info_name(name: &str) -> bool {
    INFO_EXTS.contains(&ext_of(name).as_str())
}

/// One segment of a natural-order sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Num(u128),
    Text(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Num(a), Segment::Num(b)) => a.cmp(b),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            // Numeric segments sort before text segments at the same position
            (Segment::Num(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Num(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Build a key for natural sorting: digit runs compare numerically,
/// everything else case-insensitively.
fn natural_key(s: &str) -> Vec<Segment> {
    let mut key = Vec::new();
    let mut digits = String::new();
    let mut text = String::new();

    let flush_digits = |digits: &mut String, key: &mut Vec<Segment>| {
        if !digits.is_empty() {
            match digits.parse::<u128>() {
                Ok(n) => key.push(Segment::Num(n)),
                // Absurdly long digit run; fall back to text comparison
                Err(_) => key.push(Segment::Text(std::mem::take(digits))),
            }
            digits.clear();
        }
    };
    let flush_text = |text: &mut String, key: &mut Vec<Segment>| {
        if !text.is_empty() {
            key.push(Segment::Text(std::mem::take(text)));
        }
    };

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            flush_text(&mut text, &mut key);
            digits.push(ch);
        } else {
            flush_digits(&mut digits, &mut key);
            for lc in ch.to_lowercase() {
                text.push(lc);
            }
        }
    }
    flush_digits(&mut digits, &mut key);
    flush_text(&mut text, &mut key);
    key
}

#[derive(Debug)]
struct PageEntry {
    rel: String,
    kind: PageKind,
}

/// Directory-backed page source.
///
/// Recursively lists a directory, keeps image and info files, and orders
/// them info-first with natural sorting inside each group.
#[derive(Debug)]
pub struct DirSource {
    root: PathBuf,
    pages: Vec<PageEntry>,
}

impl DirSource {
    /// Scan a directory into a page source.
    ///
    /// Fails with [`SourceError::NotFound`] when the directory holds no
    /// supported pages, [`SourceError::Io`] when listing fails.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let root = root.into();
        let pattern = format!("{}/**/*", root.display());
        let walk = glob::glob(&pattern).map_err(|e| SourceError::Io(e.to_string()))?;

        let mut info_pages: Vec<String> = Vec::new();
        let mut image_pages: Vec<String> = Vec::new();

        for entry in walk {
            let path = entry.map_err(|e| SourceError::Io(e.to_string()))?;
            if !path.is_file() {
                continue;
            }
            let rel = match path.strip_prefix(&root) {
                Ok(r) => r.to_string_lossy().into_owned(),
                Err(_) => continue,
            };
            if is_info_name(&rel) {
                info_pages.push(rel);
            } else if is_image_name(&rel) {
                image_pages.push(rel);
            }
        }

        if info_pages.is_empty() && image_pages.is_empty() {
            return Err(SourceError::NotFound(format!(
                "no images or info files in {}",
                root.display()
            )));
        }

        info_pages.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        image_pages.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));

        let pages: Vec<PageEntry> = info_pages
            .into_iter()
            .map(|rel| PageEntry {
                rel,
                kind: PageKind::Info,
            })
            .chain(image_pages.into_iter().map(|rel| PageEntry {
                rel,
                kind: PageKind::Image,
            }))
            .collect();

        info!(
            "Opened directory source {}: {} pages",
            root.display(),
            pages.len()
        );
        Ok(Self { root, pages })
    }
}

impl PageSource for DirSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_name(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(|p| p.rel.as_str())
    }

    fn page_kind(&self, index: usize) -> Option<PageKind> {
        self.pages.get(index).map(|p| p.kind)
    }

    fn get_bytes(&self, index: usize) -> Result<Vec<u8>, SourceError> {
        let entry = self
            .pages
            .get(index)
            .ok_or_else(|| SourceError::NotFound(format!("page index {}", index)))?;
        let path = self.root.join(&entry.rel);
        debug!("Reading page bytes: {}", path.display());
        fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(entry.rel.clone()),
            _ => SourceError::Io(format!("{}: {}", path.display(), e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: Natural sort ordering
    /// Validates: Numeric segments compare numerically, not lexically
    #[test]
    fn test_natural_key_ordering() {
        let mut names = vec!["page10.png", "page2.png", "page1.png"];
        names.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        assert_eq!(names, vec!["page1.png", "page2.png", "page10.png"]);
    }

    /// Test: Natural sort is case-insensitive on text segments
    #[test]
    fn test_natural_key_case_insensitive() {
        assert_eq!(natural_key("Page01"), natural_key("page01"));
    }

    #[test]
    fn test_name_classification() {
        assert!(is_image_name("cover.JPG"));
        assert!(is_image_name("a/b/scan001.webp"));
        assert!(is_info_name("release.NFO"));
        assert!(is_info_name("notes.txt"));
        assert!(!is_image_name("archive.zip"));
        assert!(!is_info_name("scan001.png"));
    }

    fn temp_collection(files: &[(&str, &[u8])]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "riffle-src-test-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for (name, bytes) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, bytes).unwrap();
        }
        dir
    }

    /// Test: Directory scan ordering
    /// Validates: Info pages first, images in natural order, nested dirs included
    #[test]
    fn test_dir_source_ordering() {
        let dir = temp_collection(&[
            ("p10.png", b"ten"),
            ("p2.png", b"two"),
            ("nested/p1.png", b"one"),
            ("info.nfo", b"release notes"),
        ]);
        let source = DirSource::new(&dir).unwrap();

        assert_eq!(source.page_count(), 4);
        assert_eq!(source.page_name(0), Some("info.nfo"));
        assert_eq!(source.page_kind(0), Some(PageKind::Info));
        assert_eq!(source.page_name(1), Some("nested/p1.png"));
        assert_eq!(source.page_name(2), Some("p2.png"));
        assert_eq!(source.page_name(3), Some("p10.png"));

        assert_eq!(source.get_bytes(2).unwrap(), b"two");

        let _ = fs::remove_dir_all(&dir);
    }

    /// Test: Empty directory is rejected
    #[test]
    fn test_dir_source_empty() {
        let dir = temp_collection(&[("readme.md", b"not a page")]);
        let err = DirSource::new(&dir).unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
        let _ = fs::remove_dir_all(&dir);
    }

    /// Test: Out-of-range page index
    /// Validates: NotFound, not a panic
    #[test]
    fn test_get_bytes_out_of_range() {
        let dir = temp_collection(&[("p1.png", b"one")]);
        let source = DirSource::new(&dir).unwrap();
        assert!(matches!(
            source.get_bytes(99),
            Err(SourceError::NotFound(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }
}
