//! Headless rendering and snapshot export.
//!
//! Renders a field into the accumulation texture without any window, then
//! reads the pixels back for PNG export. Useful for previewing a
//! configuration, generating marketing stills, and exercising the full
//! render path in environments with no display.

use std::path::Path;

use crate::error::{GpuError, SnapshotError};
use crate::field::Field;
use crate::gpu::FrameRenderer;

/// Renders fields into an offscreen texture on a surfaceless device.
pub struct OffscreenRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    renderer: FrameRenderer,
}

impl OffscreenRenderer {
    /// Acquire a device with no surface and set up a renderer of the given
    /// pixel size.
    pub fn new(width: u32, height: u32) -> Result<Self, GpuError> {
        pollster::block_on(Self::new_async(width, height))
    }

    async fn new_async(width: u32, height: u32) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Offscreen Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let renderer = FrameRenderer::new(&device, width.max(1), height.max(1));

        Ok(Self {
            device,
            queue,
            renderer,
        })
    }

    /// Render one frame of the field into the accumulation texture.
    ///
    /// Call once per [`crate::field::Field::advance`] step; the fade tail
    /// builds up across frames exactly as in the windowed loop.
    pub fn render(&mut self, field: &Field) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Offscreen Encoder"),
            });
        self.renderer
            .render_field(&self.device, &self.queue, &mut encoder, field);
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Read the accumulated scene back as an RGBA image.
    pub fn snapshot(&self) -> Result<image::RgbaImage, SnapshotError> {
        let (width, height) = self.renderer.size();
        let bytes_per_pixel = 4u32;
        // Copy rows must be 256-byte aligned.
        let unpadded_bytes_per_row = width * bytes_per_pixel;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(256) * 256;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Snapshot Staging Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Snapshot Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: self.renderer.scene_texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| GpuError::BufferMapping("map_async callback dropped".into()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for row in 0..height {
            let start = (row * padded_bytes_per_row) as usize;
            pixels.extend_from_slice(&data[start..start + unpadded_bytes_per_row as usize]);
        }
        drop(data);
        staging.unmap();

        image::RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            SnapshotError::Gpu(GpuError::BufferMapping(
                "snapshot dimensions did not match readback size".into(),
            ))
        })
    }

    /// Render nothing further; encode the current scene as a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        let snapshot = self.snapshot()?;
        snapshot.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}
