//! Merges scanned page images into a single multi-page PDF with printpdf.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use printpdf::{Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, RawImage, XObjectTransform};
use tracing::{debug, warn};

use crate::combine::ConsolidateError;
use crate::contract::PageMerger;

const MM_PER_INCH: f32 = 25.4;

/// A decoded page image and the file it came from.
pub struct ScannedPage {
    pub source: PathBuf,
    image: RawImage,
}

/// Lays out one image per PDF page; each page is exactly the image's size at `dpi`.
#[derive(Debug, Clone)]
pub struct PdfPageMerger {
    dpi: f32,
}

impl PdfPageMerger {
    pub fn new(dpi: f32) -> Self {
        Self { dpi }
    }

    fn pixels_to_mm(&self, pixels: usize) -> Mm {
        Mm(pixels as f32 / self.dpi * MM_PER_INCH)
    }
}

impl Default for PdfPageMerger {
    fn default() -> Self {
        Self::new(300.0)
    }
}

impl PageMerger for PdfPageMerger {
    type Page = ScannedPage;

    fn open_page(&self, path: &Path) -> Result<ScannedPage, ConsolidateError> {
        let bytes = fs::read(path).map_err(|e| ConsolidateError::from_io(path, e))?;
        let mut warnings = Vec::new();
        let image = RawImage::decode_from_bytes(&bytes, &mut warnings).map_err(|reason| {
            ConsolidateError::Decode {
                path: path.to_path_buf(),
                reason,
            }
        })?;
        if !warnings.is_empty() {
            debug!(path = %path.display(), warnings = warnings.len(), "Image decoded with warnings");
        }
        Ok(ScannedPage {
            source: path.to_path_buf(),
            image,
        })
    }

    fn write_merged(
        &self,
        pages: Vec<ScannedPage>,
        destination: &Path,
    ) -> Result<(), ConsolidateError> {
        if pages.is_empty() {
            return Err(ConsolidateError::NoPages);
        }

        let title = destination
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut doc = PdfDocument::new(&title);

        let mut pdf_pages = Vec::with_capacity(pages.len());
        for page in &pages {
            let image_id = doc.add_image(&page.image);
            let ops = vec![Op::UseXobject {
                id: image_id,
                transform: XObjectTransform {
                    dpi: Some(self.dpi),
                    ..Default::default()
                },
            }];
            pdf_pages.push(PdfPage::new(
                self.pixels_to_mm(page.image.width),
                self.pixels_to_mm(page.image.height),
                ops,
            ));
            debug!(source = %page.source.display(), "Added page to PDF");
        }
        drop(pages);

        let mut warnings = Vec::new();
        let bytes = doc
            .with_pages(pdf_pages)
            .save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(destination = %destination.display(), warnings = warnings.len(), "PDF written with warnings");
        }

        write_atomically(destination, &bytes)
    }
}

/// Writes to a temp file next to `destination`, then renames it into place.
fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<(), ConsolidateError> {
    let io_err = |source: std::io::Error| ConsolidateError::Io {
        path: destination.to_path_buf(),
        source,
    };
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.persist(destination).map_err(|e| io_err(e.error))?;
    Ok(())
}
