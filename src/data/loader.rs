// ============================================================
// Layer 4 — Image Folder Loader
// ============================================================
// Reads a labelled image tree from disk:
//
//   data/seasons/
//     ├── Invierno/   ← class 0
//     │     ├── img001.jpg
//     │     └── ...
//     ├── Otono/      ← class 1
//     ├── Primavera/  ← class 2
//     └── Verano/     ← class 3
//
// Every immediate subfolder of the root is one class. Class
// folders are sorted alphabetically and that order becomes the
// label index. Image files are collected recursively inside each
// class folder and sorted by path, so a scan is deterministic.
//
// Loading happens in two steps:
//   1. scan()  — walk the tree, build the label set and file list
//   2. load()  — decode every file, convert to RGB, resize
//
// Any problem (missing root, no classes, empty class folder,
// undecodable file) is an error: the caller cannot train on a
// partial dataset.
//
// Reference: walkdir crate documentation
//            image crate documentation

use anyhow::{bail, ensure, Context, Result};
use image::RgbImage;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::data::preprocessor::Preprocessor;
use crate::domain::labels::LabelSet;

/// File extensions accepted as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 9] =
    ["png", "jpg", "jpeg", "bmp", "ppm", "tif", "tiff", "gif", "webp"];

/// One image file on disk and the class it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub path:  PathBuf,
    pub label: usize,
}

/// One decoded, resized image with its label
#[derive(Debug, Clone)]
pub struct LabeledImage {
    pub image: RgbImage,
    pub label: usize,
}

/// Result of scanning a dataset root
#[derive(Debug, Clone)]
pub struct ImageFolderIndex {
    pub labels:  LabelSet,
    pub entries: Vec<ImageEntry>,
}

impl ImageFolderIndex {
    /// Number of images per class, in label order
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.labels.len()];
        for e in &self.entries {
            counts[e.label] += 1;
        }
        counts
    }
}

pub struct ImageFolderLoader {
    root: PathBuf,
}

impl ImageFolderLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Walk the root directory and list every class and image file.
    pub fn scan(&self) -> Result<ImageFolderIndex> {
        let meta = fs::metadata(&self.root).with_context(|| {
            format!("Dataset directory '{}' does not exist", self.root.display())
        })?;
        ensure!(
            meta.is_dir(),
            "Dataset path '{}' is not a directory",
            self.root.display()
        );

        // ── Class folders ────────────────────────────────────────────────────
        let mut class_dirs: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Cannot read directory '{}'", self.root.display()))?
        {
            let entry = entry?;
            let path  = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            class_dirs.push((name, path));
        }

        if class_dirs.is_empty() {
            bail!(
                "Dataset directory '{}' has no class subfolders",
                self.root.display()
            );
        }

        class_dirs.sort_by(|a, b| a.0.cmp(&b.0));
        let labels = LabelSet::from_folder_names(
            class_dirs.iter().map(|(name, _)| name.clone()).collect(),
        )?;

        // ── Image files per class ────────────────────────────────────────────
        let mut entries = Vec::new();
        for (label, (name, dir)) in class_dirs.iter().enumerate() {
            let files = list_images(dir)?;
            if files.is_empty() {
                bail!(
                    "Class folder '{}' ({}) contains no images",
                    name,
                    dir.display()
                );
            }
            entries.extend(files.into_iter().map(|path| ImageEntry { path, label }));
        }

        tracing::info!(
            "Found {} images in {} classes: {:?}",
            entries.len(),
            labels.len(),
            labels.names()
        );

        Ok(ImageFolderIndex { labels, entries })
    }

    /// Decode and resize every scanned image.
    pub fn load(&self, index: &ImageFolderIndex, preprocessor: &Preprocessor) -> Result<Vec<LabeledImage>> {
        index
            .entries
            .iter()
            .map(|entry| {
                let image = load_rgb(&entry.path)?;
                Ok(LabeledImage {
                    image: preprocessor.resize(&image),
                    label: entry.label,
                })
            })
            .collect()
    }
}

/// Decode an image file as 8-bit RGB
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)
        .with_context(|| format!("Cannot decode image '{}'", path.display()))?;
    Ok(img.to_rgb8())
}

/// All image files under `dir`, recursively, sorted by path
fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry
            .with_context(|| format!("Failed to read directory entry under '{}'", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if has_image_extension(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .map_or(false, |e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::tempdir;

    /// Write `count` small PNGs into `root/class_name/`
    pub(crate) fn write_class(root: &Path, class_name: &str, count: usize, shade: u8) {
        let dir = root.join(class_name);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..count {
            let img = RgbImage::from_pixel(24, 16, Rgb([shade, i as u8, 255 - shade]));
            img.save(dir.join(format!("img_{i:03}.png"))).unwrap();
        }
    }

    #[test]
    fn test_scan_orders_classes_alphabetically() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "Verano",    2, 200);
        write_class(dir.path(), "Invierno",  3, 10);
        write_class(dir.path(), "Primavera", 1, 120);
        write_class(dir.path(), "Otono",     2, 80);

        let index = ImageFolderLoader::new(dir.path()).scan().unwrap();
        assert_eq!(index.labels.names(), &["Invierno", "Otono", "Primavera", "Verano"]);
        assert_eq!(index.class_counts(), vec![3, 2, 1, 2]);
        assert!(index.entries.iter().all(|e| e.label < 4));
    }

    #[test]
    fn test_scan_skips_non_images_and_recurses() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "a", 1, 0);
        fs::write(dir.path().join("a").join("notes.txt"), "hi").unwrap();
        write_class(&dir.path().join("a"), "nested", 2, 0);
        fs::write(dir.path().join("README.md"), "top-level file").unwrap();

        let index = ImageFolderLoader::new(dir.path()).scan().unwrap();
        assert_eq!(index.labels.len(), 1);
        assert_eq!(index.entries.len(), 3);
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempdir().unwrap();
        let res = ImageFolderLoader::new(dir.path().join("nope")).scan();
        assert!(res.is_err());
    }

    #[test]
    fn test_no_class_folders_is_error() {
        let dir = tempdir().unwrap();
        assert!(ImageFolderLoader::new(dir.path()).scan().is_err());
    }

    #[test]
    fn test_empty_class_folder_is_error() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "full", 2, 0);
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        let err = ImageFolderLoader::new(dir.path()).scan().unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_load_resizes() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "x", 2, 50);
        let loader = ImageFolderLoader::new(dir.path());
        let index  = loader.scan().unwrap();
        let images = loader.load(&index, &Preprocessor::new(32)).unwrap();
        assert_eq!(images.len(), 2);
        assert!(images.iter().all(|i| i.image.dimensions() == (32, 32)));
    }

    #[test]
    fn test_corrupt_image_is_error() {
        let dir = tempdir().unwrap();
        write_class(dir.path(), "x", 1, 50);
        fs::write(dir.path().join("x").join("broken.jpg"), b"not a jpeg").unwrap();
        let loader = ImageFolderLoader::new(dir.path());
        let index  = loader.scan().unwrap();
        assert!(loader.load(&index, &Preprocessor::new(32)).is_err());
    }
}
