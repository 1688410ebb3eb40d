//! Font + atlas asset loading.
//!
//! [`load_font_assets`] reads the BMFont description and its distance-field
//! atlas and checks that the atlas really has the dimensions the glyph
//! rectangles were measured against. [`AssetRequest`] runs the same load on a
//! background thread so the window can keep painting while it waits.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use super::atlas::SdfAtlas;
use super::{BmFont, FontParseError};
use crate::render::geometry::{AtlasSize, GeometryError};

/// Failure to load the font description or its atlas.
#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font {}: {source}", path.display())]
    Font {
        path: PathBuf,
        #[source]
        source: FontParseError,
    },

    #[error("failed to decode atlas {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("font {} declares no atlas page", path.display())]
    MissingPage { path: PathBuf },

    #[error("invalid atlas {}: {source}", path.display())]
    InvalidAtlas {
        path: PathBuf,
        #[source]
        source: GeometryError,
    },

    #[error(
        "atlas {} is {actual}, but the font was generated for {expected}",
        path.display()
    )]
    AtlasSizeMismatch {
        path: PathBuf,
        expected: AtlasSize,
        actual: AtlasSize,
    },

    #[error("asset loader thread exited without a result")]
    LoaderDisconnected,
}

/// A font description together with the atlas it indexes into.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub font: BmFont,
    pub atlas: Arc<SdfAtlas>,
    pub font_path: PathBuf,
    pub atlas_path: PathBuf,
}

impl LoadedFont {
    /// Pair an in-memory font with its atlas, validating the dimensions.
    pub fn new(
        font: BmFont,
        atlas: SdfAtlas,
        font_path: impl Into<PathBuf>,
        atlas_path: impl Into<PathBuf>,
    ) -> Result<Self, AssetLoadError> {
        let atlas_path = atlas_path.into();
        let expected = font
            .atlas_size()
            .map_err(|source| AssetLoadError::InvalidAtlas {
                path: atlas_path.clone(),
                source,
            })?;
        if expected != atlas.size() {
            return Err(AssetLoadError::AtlasSizeMismatch {
                path: atlas_path,
                expected,
                actual: atlas.size(),
            });
        }
        Ok(Self {
            font,
            atlas: Arc::new(atlas),
            font_path: font_path.into(),
            atlas_path,
        })
    }

    pub fn atlas_size(&self) -> AtlasSize {
        self.atlas.size()
    }
}

/// Read a font description from disk.
pub fn load_font(path: &Path) -> Result<BmFont, AssetLoadError> {
    let bytes = std::fs::read(path).map_err(|source| AssetLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    BmFont::from_bytes(&bytes).map_err(|source| AssetLoadError::Font {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an atlas image from disk and keep its alpha channel.
pub fn load_atlas(path: &Path) -> Result<SdfAtlas, AssetLoadError> {
    let img = image::open(path).map_err(|source| match source {
        image::ImageError::IoError(source) => AssetLoadError::Io {
            path: path.to_path_buf(),
            source,
        },
        source => AssetLoadError::Image {
            path: path.to_path_buf(),
            source,
        },
    })?;
    SdfAtlas::from_rgba(&img.to_rgba8()).map_err(|source| AssetLoadError::InvalidAtlas {
        path: path.to_path_buf(),
        source,
    })
}

/// Atlas path: the explicit override, or page 0 of the font resolved
/// relative to the font file.
pub fn resolve_atlas_path(
    font: &BmFont,
    font_path: &Path,
    atlas_override: Option<&Path>,
) -> Result<PathBuf, AssetLoadError> {
    if let Some(path) = atlas_override {
        return Ok(path.to_path_buf());
    }
    let page = font
        .pages
        .first()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AssetLoadError::MissingPage {
            path: font_path.to_path_buf(),
        })?;
    let dir = font_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(dir.join(page))
}

/// Load a font and its atlas, validating that they belong together.
pub fn load_font_assets(
    font_path: &Path,
    atlas_override: Option<&Path>,
) -> Result<LoadedFont, AssetLoadError> {
    let font = load_font(font_path)?;
    let atlas_path = resolve_atlas_path(&font, font_path, atlas_override)?;
    let atlas = load_atlas(&atlas_path)?;

    log::info!(
        "loaded font '{}' ({} glyphs) with atlas {} ({})",
        font.info.face,
        font.glyphs.len(),
        atlas_path.display(),
        atlas.size()
    );

    LoadedFont::new(font, atlas, font_path, atlas_path)
}

/// A font load running on a background thread.
pub struct AssetRequest<T> {
    rx: mpsc::Receiver<Result<T, AssetLoadError>>,
}

impl<T: Send + 'static> AssetRequest<T> {
    /// Run `load` on a new thread. `on_done` is invoked from that thread once
    /// the result has been sent (e.g. to request a repaint).
    pub fn spawn<F, D>(load: F, on_done: D) -> Self
    where
        F: FnOnce() -> Result<T, AssetLoadError> + Send + 'static,
        D: FnOnce() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(load());
            on_done();
        });
        Self { rx }
    }

    /// Non-blocking poll. Call every frame.
    pub fn poll(&self) -> Option<Result<T, AssetLoadError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(AssetLoadError::LoaderDisconnected)),
        }
    }

    /// Block until the load finishes.
    pub fn wait(self) -> Result<T, AssetLoadError> {
        self.rx
            .recv()
            .unwrap_or(Err(AssetLoadError::LoaderDisconnected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT: &str = "info face=\"Test\" size=16\n\
        common lineHeight=20 base=16 scaleW=8 scaleH=4 pages=1 packed=0\n\
        page id=0 file=\"atlas.png\"\n\
        char id=65 x=0 y=0 width=4 height=4 xoffset=0 yoffset=2 xadvance=5 page=0 chnl=15\n";

    /// Fresh scratch directory per test
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "sdf-text-loader-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_assets(dir: &Path, atlas_w: u32, atlas_h: u32) -> PathBuf {
        let font_path = dir.join("test.fnt");
        std::fs::write(&font_path, FONT).unwrap();
        let mut img = image::RgbaImage::new(atlas_w, atlas_h);
        img.put_pixel(1, 1, image::Rgba([255, 255, 255, 180]));
        img.save(dir.join("atlas.png")).unwrap();
        font_path
    }

    #[test]
    fn loads_font_and_page_atlas() {
        let dir = scratch_dir("ok");
        let font_path = write_assets(&dir, 8, 4);

        let loaded = load_font_assets(&font_path, None).unwrap();
        assert_eq!(loaded.font.info.face, "Test");
        assert_eq!(loaded.atlas_size(), AtlasSize::new(8, 4).unwrap());
        assert_eq!(loaded.atlas_path, dir.join("atlas.png"));
        assert_eq!(loaded.atlas.texels()[8 + 1], 180);
    }

    #[test]
    fn missing_font_is_an_io_error() {
        let dir = scratch_dir("missing");
        let err = load_font_assets(&dir.join("nope.fnt"), None).unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { .. }));
        assert!(err.to_string().contains("nope.fnt"));
    }

    #[test]
    fn missing_atlas_is_an_io_error() {
        let dir = scratch_dir("no-atlas");
        let font_path = dir.join("test.fnt");
        std::fs::write(&font_path, FONT).unwrap();
        let err = load_font_assets(&font_path, None).unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { ref path, .. } if path.ends_with("atlas.png")));
    }

    #[test]
    fn atlas_size_mismatch_is_reported() {
        let dir = scratch_dir("mismatch");
        let font_path = write_assets(&dir, 16, 4);
        match load_font_assets(&font_path, None).unwrap_err() {
            AssetLoadError::AtlasSizeMismatch { expected, actual, .. } => {
                assert_eq!(expected, AtlasSize::new(8, 4).unwrap());
                assert_eq!(actual, AtlasSize::new(16, 4).unwrap());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn corrupt_font_is_a_font_error() {
        let dir = scratch_dir("corrupt");
        let font_path = dir.join("bad.fnt");
        std::fs::write(&font_path, "char id=65\n").unwrap();
        assert!(matches!(
            load_font_assets(&font_path, None),
            Err(AssetLoadError::Font { .. })
        ));
    }

    #[test]
    fn atlas_override_wins_over_page() {
        let font = BmFont {
            pages: vec!["page.png".into()],
            ..Default::default()
        };
        let path = resolve_atlas_path(&font, Path::new("fonts/a.fnt"), Some(Path::new("x.png")))
            .unwrap();
        assert_eq!(path, PathBuf::from("x.png"));
        let path = resolve_atlas_path(&font, Path::new("fonts/a.fnt"), None).unwrap();
        assert_eq!(path, PathBuf::from("fonts/page.png"));
    }

    #[test]
    fn font_without_pages_needs_override() {
        let font = BmFont::default();
        assert!(matches!(
            resolve_atlas_path(&font, Path::new("a.fnt"), None),
            Err(AssetLoadError::MissingPage { .. })
        ));
    }

    #[test]
    fn background_request_delivers_result() {
        let dir = scratch_dir("background");
        let font_path = write_assets(&dir, 8, 4);
        let request = AssetRequest::spawn(move || load_font_assets(&font_path, None), || {});
        let loaded = request.wait().unwrap();
        assert_eq!(loaded.font.glyphs.len(), 1);
    }

    #[test]
    fn background_request_delivers_failure() {
        let request: AssetRequest<LoadedFont> = AssetRequest::spawn(
            || Err(AssetLoadError::MissingPage { path: "x.fnt".into() }),
            || {},
        );
        assert!(matches!(request.wait(), Err(AssetLoadError::MissingPage { .. })));
    }
}
