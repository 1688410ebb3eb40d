pub mod geometry;
pub mod layout;
pub mod mesh;
pub mod sdf_renderer;
pub mod shading;

#[cfg(feature = "sdf-render")]
pub mod gpu_renderer;

/// Which renderer produced the current frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderBackend {
    /// wgpu offscreen pipeline
    Gpu,
    /// rayon rasterizer
    #[default]
    Cpu,
}

impl RenderBackend {
    pub fn label(self) -> &'static str {
        match self {
            Self::Gpu => "GPU",
            Self::Cpu => "CPU",
        }
    }
}
