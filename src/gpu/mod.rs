//! GPU rendering for particle fields.
//!
//! The scene accumulates in a persistent offscreen texture: every frame
//! starts with a low-alpha background quad over the previous contents (the
//! motion-blur fade), then connection lines, trail points, glow halos, and
//! particle bodies are drawn on top, and the result is blitted to the
//! surface. [`FrameRenderer`] owns the scene texture and pipelines and is
//! shared by the windowed [`GpuState`] and the headless
//! [`OffscreenRenderer`].

mod offscreen;

pub use offscreen::OffscreenRenderer;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::GpuError;
use crate::field::Field;
use crate::shader::{self, DiscInstance, FadeUniforms, LineVertex, Uniforms};
use crate::visuals::{hsl_to_rgb, line_style};

/// Format of the accumulation texture; sRGB so readback bytes are directly
/// PNG-encodable.
pub(crate) const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Pipelines, buffers, and the accumulation texture for one field.
pub struct FrameRenderer {
    width: u32,
    height: u32,
    scene_texture: wgpu::Texture,
    scene_view: wgpu::TextureView,
    scene_cleared: bool,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    fade_uniform_buffer: wgpu::Buffer,
    fade_bind_group: wgpu::BindGroup,

    fade_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    disc_pipeline: wgpu::RenderPipeline,
    glow_pipeline: wgpu::RenderPipeline,

    disc_buffer: GrowableBuffer,
    glow_buffer: GrowableBuffer,
    line_buffer: GrowableBuffer,

    discs: Vec<DiscInstance>,
    glows: Vec<DiscInstance>,
    lines: Vec<LineVertex>,
}

impl FrameRenderer {
    /// Create the renderer for a target of the given pixel size.
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (scene_texture, scene_view) = create_scene_texture(device, width, height);

        let uniforms = Uniforms {
            resolution: [width as f32, height as f32],
            _pad: [0.0; 2],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Field Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let fade_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fade Uniform Buffer"),
            contents: bytemuck::bytes_of(&FadeUniforms {
                color: [0.0, 0.0, 0.0, 0.08],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout = uniform_layout(device, "Field Uniform Layout");
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Field Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let fade_bind_group_layout = uniform_layout(device, "Fade Uniform Layout");
        let fade_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Fade Uniform Bind Group"),
            layout: &fade_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: fade_uniform_buffer.as_entire_binding(),
            }],
        });

        let fade_pipeline = build_pipeline(
            device,
            "Fade",
            shader::FADE_SHADER,
            &fade_bind_group_layout,
            &[],
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );
        let line_pipeline = build_pipeline(
            device,
            "Line",
            shader::LINE_SHADER,
            &uniform_bind_group_layout,
            &[LineVertex::layout()],
            wgpu::PrimitiveTopology::LineList,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );
        let disc_pipeline = build_pipeline(
            device,
            "Disc",
            shader::DISC_SHADER,
            &uniform_bind_group_layout,
            &[DiscInstance::layout()],
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );
        let glow_pipeline = build_pipeline(
            device,
            "Glow",
            shader::GLOW_SHADER,
            &uniform_bind_group_layout,
            &[DiscInstance::layout()],
            wgpu::PrimitiveTopology::TriangleList,
            Some(additive_blend()),
        );

        Self {
            width,
            height,
            scene_texture,
            scene_view,
            scene_cleared: false,
            uniform_buffer,
            uniform_bind_group,
            fade_uniform_buffer,
            fade_bind_group,
            fade_pipeline,
            line_pipeline,
            disc_pipeline,
            glow_pipeline,
            disc_buffer: GrowableBuffer::new("Disc Instances", wgpu::BufferUsages::VERTEX),
            glow_buffer: GrowableBuffer::new("Glow Instances", wgpu::BufferUsages::VERTEX),
            line_buffer: GrowableBuffer::new("Line Vertices", wgpu::BufferUsages::VERTEX),
            discs: Vec::new(),
            glows: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Target size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// View of the accumulated scene, for the blit pass and readback.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.scene_view
    }

    /// The accumulation texture itself.
    pub fn scene_texture(&self) -> &wgpu::Texture {
        &self.scene_texture
    }

    /// Recreate the scene texture for a new size. The accumulated tail is
    /// discarded; the next frame starts from a clean background.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        let (texture, view) = create_scene_texture(device, width, height);
        self.scene_texture = texture;
        self.scene_view = view;
        self.scene_cleared = false;

        let uniforms = Uniforms {
            resolution: [width as f32, height as f32],
            _pad: [0.0; 2],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Record one frame of the field into the accumulation texture.
    pub fn render_field(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        field: &Field,
    ) {
        self.build_geometry(field);

        let background = field.visuals().color_scheme.background();
        let fade = FadeUniforms {
            color: [
                background[0],
                background[1],
                background[2],
                field
                    .visuals()
                    .effective_fade_alpha(field.config().performance_mode),
            ],
        };
        queue.write_buffer(&self.fade_uniform_buffer, 0, bytemuck::bytes_of(&fade));

        self.disc_buffer.upload(device, queue, &self.discs);
        self.glow_buffer.upload(device, queue, &self.glows);
        self.line_buffer.upload(device, queue, &self.lines);

        // First frame after creation/resize clears to the opaque background;
        // afterwards the scene is loaded back so the fade quad can decay it.
        let load = if self.scene_cleared {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(wgpu::Color {
                r: background[0] as f64,
                g: background[1] as f64,
                b: background[2] as f64,
                a: 1.0,
            })
        };
        self.scene_cleared = true;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.scene_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.fade_pipeline);
        pass.set_bind_group(0, &self.fade_bind_group, &[]);
        pass.draw(0..3, 0..1);

        if !self.lines.is_empty() {
            pass.set_pipeline(&self.line_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.line_buffer.slice());
            pass.draw(0..self.lines.len() as u32, 0..1);
        }

        if !self.glows.is_empty() {
            pass.set_pipeline(&self.glow_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.glow_buffer.slice());
            pass.draw(0..6, 0..self.glows.len() as u32);
        }

        if !self.discs.is_empty() {
            pass.set_pipeline(&self.disc_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.disc_buffer.slice());
            pass.draw(0..6, 0..self.discs.len() as u32);
        }
    }

    /// Translate field state into disc, glow, and line primitives.
    fn build_geometry(&mut self, field: &Field) {
        self.discs.clear();
        self.glows.clear();
        self.lines.clear();

        let visuals = field.visuals();
        let performance_mode = field.config().performance_mode;
        let particles = field.particles();

        if let Some(threshold) = field.config().connection_distance {
            for pair in field.connections() {
                let a = &particles[pair.a];
                let b = &particles[pair.b];
                let style = line_style(a, b, pair.distance, threshold);
                // wgpu lines are a fixed single pixel; the 0.3-0.6 px stroke
                // weight is folded into the alpha instead.
                let color = [
                    style.color[0],
                    style.color[1],
                    style.color[2],
                    style.color[3] * style.width,
                ];
                self.lines.push(LineVertex {
                    pos: a.pos.to_array(),
                    color,
                });
                self.lines.push(LineVertex {
                    pos: b.pos.to_array(),
                    color,
                });
            }
        }

        for particle in particles {
            let [r, g, b] = hsl_to_rgb(particle.hue, particle.saturation, particle.lightness);

            for point in &particle.trail {
                self.discs.push(DiscInstance {
                    center: point.pos.to_array(),
                    radius: point.size,
                    _pad: 0.0,
                    color: [r, g, b, point.opacity.clamp(0.0, 1.0)],
                });
            }

            if visuals.glows(particle, performance_mode) {
                let [gr, gg, gb] =
                    hsl_to_rgb(particle.hue, particle.saturation, particle.lightness + 20.0);
                self.glows.push(DiscInstance {
                    center: particle.pos.to_array(),
                    radius: particle.size * 2.0,
                    _pad: 0.0,
                    color: [gr, gg, gb, 1.0],
                });
            }

            self.discs.push(DiscInstance {
                center: particle.pos.to_array(),
                radius: particle.size,
                _pad: 0.0,
                color: [r, g, b, 1.0],
            });
        }
    }
}

/// Vertex buffer that grows to fit each frame's geometry, doubling so
/// steady-state frames never reallocate.
struct GrowableBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: Option<wgpu::Buffer>,
    capacity_bytes: u64,
}

impl GrowableBuffer {
    fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self {
            label,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            buffer: None,
            capacity_bytes: 0,
        }
    }

    fn upload<T: bytemuck::Pod>(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if bytes.is_empty() {
            return;
        }
        if self.buffer.is_none() || (bytes.len() as u64) > self.capacity_bytes {
            let capacity = (bytes.len() as u64).next_power_of_two();
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: capacity,
                usage: self.usage,
                mapped_at_creation: false,
            }));
            self.capacity_bytes = capacity;
        }
        if let Some(buffer) = &self.buffer {
            queue.write_buffer(buffer, 0, bytes);
        }
    }

    fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer
            .as_ref()
            .expect("buffer sliced before first upload")
            .slice(..)
    }
}

fn create_scene_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SCENE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn additive_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader_source: &str,
    bind_group_layout: &wgpu::BindGroupLayout,
    vertex_buffers: &[wgpu::VertexBufferLayout<'_>],
    topology: wgpu::PrimitiveTopology,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(shader_source.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: SCENE_FORMAT,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// GPU state for a windowed simulation: surface, device, the shared frame
/// renderer, and the blit pass that presents the accumulated scene.
pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    renderer: FrameRenderer,
    blit_pipeline: wgpu::RenderPipeline,
    blit_bind_group: wgpu::BindGroup,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
}

impl GpuState {
    /// Initialize the GPU for a window.
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = FrameRenderer::new(&device, config.width, config.height);

        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let blit_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Blit Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let blit_bind_group = create_blit_bind_group(
            &device,
            &blit_bind_group_layout,
            renderer.scene_view(),
            &blit_sampler,
        );

        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(shader::BLIT_SHADER.into()),
        });

        let blit_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Blit Pipeline Layout"),
                bind_group_layouts: &[&blit_bind_group_layout],
                push_constant_ranges: &[],
            });

        let blit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &blit_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &blit_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer,
            blit_pipeline,
            blit_bind_group,
            blit_bind_group_layout,
            blit_sampler,
        })
    }

    /// Reconfigure the surface and scene texture after a window resize.
    /// Zero-sized frames are ignored.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, &self.queue, new_size.width, new_size.height);
        self.blit_bind_group = create_blit_bind_group(
            &self.device,
            &self.blit_bind_group_layout,
            self.renderer.scene_view(),
            &self.blit_sampler,
        );
    }

    /// Render one frame of the field and present it.
    pub fn render(&mut self, field: &Field) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer
            .render_field(&self.device, &self.queue, &mut encoder, field);

        // Blit the accumulated scene onto the swapchain image.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, &self.blit_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_blit_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    scene_view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Blit Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(scene_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
