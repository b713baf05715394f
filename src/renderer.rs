//! The renderer: output sizing, pass orchestration, and GPU upload caching.

use std::sync::Arc;

use winit::window::Window;

use crate::camera::PerspectiveCamera;
use crate::gpu::GpuContext;
use crate::mesh_pass::{GpuMesh, MeshPass};
use crate::point_pass::{GpuPoints, PointPass};
use crate::scene::Scene;

/// Device pixel ratios above this are clamped; rendering at 3x density buys
/// nothing visible and triples the fill cost.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// The renderer's output size: logical dimensions plus a clamped device
/// pixel ratio. Physical (surface) size is logical size times the ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_ratio: pixel_ratio.min(MAX_PIXEL_RATIO),
        }
    }

    /// Update the logical size.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Update the pixel ratio, clamped to [`MAX_PIXEL_RATIO`].
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio.min(MAX_PIXEL_RATIO);
    }

    /// Logical width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The clamped pixel ratio in effect.
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Surface width in physical pixels.
    pub fn physical_width(&self) -> u32 {
        ((self.width as f32 * self.pixel_ratio).round() as u32).max(1)
    }

    /// Surface height in physical pixels.
    pub fn physical_height(&self) -> u32 {
        ((self.height as f32 * self.pixel_ratio).round() as u32).max(1)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Renders a [`Scene`] from a [`PerspectiveCamera`] into a window surface.
///
/// Owns the GPU context, the render passes, and a cache of GPU uploads keyed
/// by scene child index (valid because children are never removed). Geometry
/// is uploaded the first frame it appears; transforms and materials are
/// re-written every frame.
pub struct Renderer {
    gpu: GpuContext,
    viewport: Viewport,
    /// Whether the shadow map pass runs. Off by default.
    pub shadows_enabled: bool,
    mesh_pass: MeshPass,
    point_pass: PointPass,
    mesh_cache: Vec<Option<GpuMesh>>,
    point_cache: Vec<Option<GpuPoints>>,
}

impl Renderer {
    /// Bind a renderer to a window's drawable surface.
    pub fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();
        let scale = window.scale_factor() as f32;
        let viewport = Viewport::new(
            (size.width as f32 / scale).round() as u32,
            (size.height as f32 / scale).round() as u32,
            scale,
        );

        let mut gpu = GpuContext::new(window);
        gpu.resize(viewport.physical_width(), viewport.physical_height());

        let mesh_pass = MeshPass::new(&gpu);
        let point_pass = PointPass::new(&gpu);

        Self {
            gpu,
            viewport,
            shadows_enabled: false,
            mesh_pass,
            point_pass,
            mesh_cache: Vec::new(),
            point_cache: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Resize the output to a new logical size.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.viewport.set_size(width, height);
        self.apply_viewport();
    }

    /// Change the device pixel ratio (clamped to [`MAX_PIXEL_RATIO`]).
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.viewport.set_pixel_ratio(ratio);
        self.apply_viewport();
    }

    fn apply_viewport(&mut self) {
        self.gpu
            .resize(self.viewport.physical_width(), self.viewport.physical_height());
    }

    /// Re-apply the surface configuration after a lost/outdated surface.
    pub fn reconfigure(&self) {
        self.gpu.reconfigure();
    }

    /// The underlying GPU context, for direct wgpu access.
    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Upload any scene children that do not have GPU copies yet.
    fn ensure_uploaded(&mut self, scene: &Scene) {
        let len = scene.children().len();
        if self.mesh_cache.len() < len {
            self.mesh_cache.resize_with(len, || None);
            self.point_cache.resize_with(len, || None);
        }
        for (idx, mesh) in scene.meshes() {
            if self.mesh_cache[idx].is_none() {
                self.mesh_cache[idx] = Some(self.mesh_pass.upload(&self.gpu, &mesh.geometry));
            }
        }
        for (idx, cloud) in scene.point_clouds() {
            if self.point_cache[idx].is_none() {
                self.point_cache[idx] = Some(self.point_pass.upload(&self.gpu, cloud));
            }
        }
    }

    /// Render one frame.
    ///
    /// Surface acquisition errors are returned to the caller; the app runner
    /// decides whether to reconfigure, skip the frame, or give up.
    pub fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        time: f32,
    ) -> Result<(), wgpu::SurfaceError> {
        self.mesh_pass.ensure_depth_size(&self.gpu);
        self.ensure_uploaded(scene);

        let shadow_light = if self.shadows_enabled {
            scene.shadow_light()
        } else {
            None
        };

        self.mesh_pass
            .write_frame(&self.gpu, scene, camera, shadow_light, time);
        for (idx, object) in scene.meshes() {
            let gpu_mesh = self.mesh_cache[idx].as_ref().expect("mesh uploaded above");
            self.mesh_pass.write_model(&self.gpu, gpu_mesh, object);
        }

        let view_proj = camera.projection_matrix() * camera.view_matrix();
        for (idx, cloud) in scene.point_clouds() {
            let gpu_points = self.point_cache[idx].as_ref().expect("cloud uploaded above");
            self.point_pass
                .write_frame(&self.gpu, gpu_points, view_proj, cloud.color);
        }

        let output = self.gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if shadow_light.is_some() {
            let casters = scene
                .meshes()
                .filter(|(_, object)| object.cast_shadow)
                .map(|(idx, _)| self.mesh_cache[idx].as_ref().expect("mesh uploaded above"));
            self.mesh_pass.render_shadow(&mut encoder, casters);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.mesh_pass.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.mesh_pass.render(
                &mut pass,
                scene
                    .meshes()
                    .map(|(idx, _)| self.mesh_cache[idx].as_ref().expect("mesh uploaded above")),
            );
            self.point_pass.render(
                &mut pass,
                scene.point_clouds().map(|(idx, _)| {
                    self.point_cache[idx].as_ref().expect("cloud uploaded above")
                }),
            );
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_sets_logical_size_and_aspect() {
        let mut viewport = Viewport::new(640, 480, 1.0);
        viewport.set_size(800, 600);
        assert_eq!(viewport.width(), 800);
        assert_eq!(viewport.height(), 600);
        assert_eq!(viewport.aspect(), 800.0 / 600.0);
    }

    #[test]
    fn pixel_ratio_is_clamped_at_two() {
        for (reported, expected) in [(1.0, 1.0), (2.0, 2.0), (3.0, 2.0)] {
            let viewport = Viewport::new(800, 600, reported);
            assert_eq!(viewport.pixel_ratio(), expected);
        }

        let mut viewport = Viewport::new(800, 600, 1.0);
        viewport.set_pixel_ratio(3.0);
        assert_eq!(viewport.pixel_ratio(), 2.0);
    }

    #[test]
    fn physical_size_scales_by_the_clamped_ratio() {
        let viewport = Viewport::new(800, 600, 3.0);
        assert_eq!(viewport.physical_width(), 1600);
        assert_eq!(viewport.physical_height(), 1200);
    }

    #[test]
    fn repeated_resize_is_idempotent() {
        let mut viewport = Viewport::new(640, 480, 2.0);
        viewport.set_size(800, 600);
        let once = viewport;
        viewport.set_size(800, 600);
        assert_eq!(viewport, once);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let mut viewport = Viewport::new(0, 0, 1.0);
        assert_eq!(viewport.width(), 1);
        viewport.set_size(0, 600);
        assert_eq!(viewport.width(), 1);
        assert_eq!(viewport.height(), 600);
    }
}
