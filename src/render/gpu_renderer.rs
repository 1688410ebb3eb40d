//! GPU renderer for SDF text meshes.
//!
//! Draws the mesh with a WGSL vertex/fragment pipeline into an offscreen
//! RGBA8 texture and reads it back, so the window can show the frame as an
//! egui texture. Falls back to the CPU rasterizer if no adapter is found.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::font::atlas::SdfAtlas;

use super::mesh::TextMesh;

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const FLAG_DRAW_UV: u32 = 1;
const FLAG_DRAW_DISTANCE: u32 = 2;

// ── Uniform struct (must match WGSL layout exactly) ──

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    text_color: [f32; 3],
    smoothing: f32,
    outline_color: [f32; 3],
    sdf_buffer: f32,
    translate: [f32; 2],
    viewport: [f32; 2],
    scale: f32,
    outline_size: f32,
    opacity: f32,
    flags: u32,
}

impl Uniforms {
    fn from_mesh(mesh: &TextMesh, width: usize, height: usize) -> Self {
        let u = &mesh.material.uniforms;
        let mut flags = 0;
        if u.draw_uv {
            flags |= FLAG_DRAW_UV;
        }
        if u.draw_distance {
            flags |= FLAG_DRAW_DISTANCE;
        }
        Self {
            text_color: u.text_color,
            smoothing: u.smoothing,
            outline_color: u.outline_color,
            sdf_buffer: u.buffer,
            translate: mesh.transform.position,
            viewport: [width as f32, height as f32],
            scale: mesh.transform.scale,
            outline_size: u.outline_size,
            opacity: u.opacity,
            flags,
        }
    }
}

const SHADER: &str = r#"
struct Uniforms {
    text_color: vec3<f32>,
    smoothing: f32,
    outline_color: vec3<f32>,
    sdf_buffer: f32,
    translate: vec2<f32>,
    viewport: vec2<f32>,
    scale: f32,
    outline_size: f32,
    opacity: f32,
    flags: u32,
};

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(0) @binding(1) var atlas: texture_2d<f32>;
@group(0) @binding(2) var atlas_sampler: sampler;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    let screen = position * u.scale + u.translate;
    let ndc = vec2<f32>(
        screen.x / u.viewport.x * 2.0 - 1.0,
        1.0 - screen.y / u.viewport.y * 2.0,
    );
    var out: VsOut;
    out.clip = vec4<f32>(ndc, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let d = textureSample(atlas, atlas_sampler, in.uv).r;
    if ((u.flags & 2u) != 0u) {
        return vec4<f32>(d, d, d, d);
    }
    if ((u.flags & 1u) != 0u) {
        return vec4<f32>(in.uv, 0.0, 1.0);
    }
    let alpha = smoothstep(u.sdf_buffer - u.smoothing, u.sdf_buffer + u.smoothing, d);
    let edge = u.sdf_buffer + u.outline_size;
    let border = smoothstep(edge - u.smoothing, edge + u.smoothing, d);
    let color = mix(u.outline_color, u.text_color, border);
    let a = alpha * u.opacity;
    return vec4<f32>(color * a, a);
}
"#;

/// Atlas texture uploaded for one `SdfAtlas`
struct AtlasTexture {
    source: Arc<SdfAtlas>,
    view: wgpu::TextureView,
}

/// Persistent GPU renderer. The pipeline is built once; the atlas texture is
/// re-uploaded only when the mesh points at a different atlas.
pub struct GpuTextRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    atlas: Option<AtlasTexture>,
}

impl GpuTextRenderer {
    /// Try to initialise the GPU renderer. Returns None if no GPU is available.
    pub fn new() -> Option<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("sdf-text GPU"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .ok()?;

        let (pipeline, bind_group_layout) = build_pipeline(&device);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Atlas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        log::info!("GPU text renderer initialised: {:?}", adapter.get_info().name);

        Some(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            sampler,
            atlas: None,
        })
    }

    /// Render `mesh` to an RGBA pixel buffer of `width * height` pixels,
    /// cleared to `background`. Returns None if the frame is empty or too
    /// large for the device, or the readback fails.
    pub fn render(
        &mut self,
        mesh: &TextMesh,
        width: usize,
        height: usize,
        background: [f32; 3],
    ) -> Option<Vec<u8>> {
        let max_dim = self.device.limits().max_texture_dimension_2d as usize;
        if width == 0 || height == 0 || width > max_dim || height > max_dim {
            return None;
        }
        self.ensure_atlas(&mesh.material.atlas);
        let atlas_view = &self.atlas.as_ref()?.view;

        let extent = wgpu::Extent3d {
            width: width as u32,
            height: height as u32,
            depth_or_array_layers: 1,
        };
        let target = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Text Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let uniforms = Uniforms::from_mesh(mesh, width, height);
        let uniform_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Text Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let geometry = &mesh.geometry;
        let buffers = if geometry.is_empty() {
            None
        } else {
            let init = |label: &str, contents: &[u8], usage: wgpu::BufferUsages| {
                self.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(label),
                        contents,
                        usage,
                    })
            };
            Some((
                init(
                    "Positions",
                    bytemuck::cast_slice(&geometry.positions),
                    wgpu::BufferUsages::VERTEX,
                ),
                init(
                    "UVs",
                    bytemuck::cast_slice(&geometry.uvs),
                    wgpu::BufferUsages::VERTEX,
                ),
                init(
                    "Indices",
                    bytemuck::cast_slice(&geometry.indices),
                    wgpu::BufferUsages::INDEX,
                ),
            ))
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Text Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Text Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: background[0] as f64,
                            g: background[1] as f64,
                            b: background[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some((positions, uvs, indices)) = &buffers {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.set_vertex_buffer(0, positions.slice(..));
                pass.set_vertex_buffer(1, uvs.slice(..));
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..geometry.indices.len() as u32, 0, 0..1);
            }
        }

        // Rows of the copy must be 256-byte aligned
        let unpadded_row = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
        let padded_row = unpadded_row.div_ceil(align) * align;
        let staging_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging"),
            size: (padded_row * height) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging_buf,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row as u32),
                    rows_per_image: Some(height as u32),
                },
            },
            extent,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        // Read back
        let buffer_slice = staging_buf.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        if rx.recv().ok()?.is_err() {
            return None;
        }

        let data = buffer_slice.get_mapped_range();
        let mut pixels = Vec::with_capacity(unpadded_row * height);
        for row in data.chunks_exact(padded_row) {
            pixels.extend_from_slice(&row[..unpadded_row]);
        }

        drop(data);
        staging_buf.unmap();

        Some(pixels)
    }

    /// Upload `atlas` as an R8 texture unless it is already resident.
    fn ensure_atlas(&mut self, atlas: &Arc<SdfAtlas>) {
        if let Some(current) = &self.atlas {
            if Arc::ptr_eq(&current.source, atlas) {
                return;
            }
        }

        let size = atlas.size();
        let extent = wgpu::Extent3d {
            width: size.width(),
            height: size.height(),
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("SDF Atlas"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            atlas.texels(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(size.width()),
                rows_per_image: Some(size.height()),
            },
            extent,
        );

        log::info!("uploaded SDF atlas {} to the GPU", size);

        self.atlas = Some(AtlasTexture {
            source: Arc::clone(atlas),
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        });
    }
}

// ── Pipeline construction ──

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const UV_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];

/// Tightly packed `vec2<f32>` stream, one per vertex buffer
fn vec2_buffer_layout(attributes: &'static [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: (2 * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

fn build_pipeline(device: &wgpu::Device) -> (wgpu::RenderPipeline, wgpu::BindGroupLayout) {
    let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("SDF Text Shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER.into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Text BGL"),
        entries: &[
            // Uniforms
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            // Atlas
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Text PL"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("SDF Text Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader_module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[
                vec2_buffer_layout(&POSITION_ATTRIBUTES),
                vec2_buffer_layout(&UV_ATTRIBUTES),
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader_module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: TARGET_FORMAT,
                blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        // Winding is configurable, so nothing is culled
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    log::info!("GPU text pipeline created");

    (pipeline, bind_group_layout)
}
