use crate::config::SceneConfig;
use crate::font::loader::{load_font_assets, AssetLoadError, LoadedFont};
use crate::render::geometry::{GeometryBuffers, GeometryError, Winding};
use crate::render::layout::{layout_text, LayoutOptions};
use crate::render::mesh::{SdfUniforms, TextMesh};

/// Error while assembling the scene
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Asset(#[from] AssetLoadError),

    #[error("failed to build text geometry: {0}")]
    Geometry(#[from] GeometryError),
}

/// How the string is turned into a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshOptions {
    pub layout: LayoutOptions,
    pub flip_y: bool,
    pub winding: Winding,
    pub uniforms: SdfUniforms,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            layout: LayoutOptions::default(),
            flip_y: false,
            winding: Winding::Clockwise,
            uniforms: SdfUniforms::default(),
        }
    }
}

impl MeshOptions {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            layout: config.layout_options(),
            flip_y: config.flip_y,
            winding: config.winding,
            uniforms: config.uniforms(),
        }
    }
}

/// Lay out `text` → quads → one renderable mesh bound to the font's atlas.
pub fn build_text_mesh(
    font: &LoadedFont,
    text: &str,
    options: &MeshOptions,
) -> Result<TextMesh, SceneError> {
    let layout = layout_text(&font.font, text, &options.layout);
    let geometry = GeometryBuffers::build(
        &layout.glyphs,
        font.atlas_size(),
        options.flip_y,
        options.winding,
    )?;

    log::info!(
        "built text mesh: {} glyphs on {} line(s), {:.0}x{:.0}px",
        geometry.glyph_count(),
        layout.lines,
        layout.width,
        layout.height
    );

    let mut mesh = TextMesh::new(geometry, font.atlas.clone(), layout.bounds());
    mesh.material.uniforms = options.uniforms;
    Ok(mesh)
}

/// Load the configured font and build its mesh. Blocking.
pub fn load_scene(config: &SceneConfig) -> Result<TextMesh, SceneError> {
    let font = load_font_assets(&config.font_path, config.atlas_path.as_deref())?;
    build_text_mesh(&font, &config.text, &MeshOptions::from_config(config))
}
