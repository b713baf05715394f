//! # Orbita
//!
//! **A small interactive 3D space scene, and just enough renderer to draw it.**
//!
//! Orbita draws a scene — meshes, lights, a starfield — from a perspective
//! camera under orbit controls, with a vsync-paced frame loop and a resize
//! handler. Describe the scene in a setup closure, mutate it in a frame
//! closure, and the runner does the rest.
//!
//! ## Quick Start
//!
//! ```no_run
//! use orbita::*;
//!
//! fn main() {
//!     run(AppConfig::new().title("Spinning cube"), |ctx| {
//!         ctx.scene.background = Color::from_hex(0x10101a);
//!         let cube = ctx.scene.add_mesh(
//!             MeshObject::new(MeshData::cube(), Material::phong(Color::WHITE)),
//!         );
//!         ctx.scene.add_ambient_light(AmbientLight::new(Color::WHITE, 1.0));
//!
//!         move |frame| {
//!             frame.scene.mesh_mut(cube).rotation.y += frame.dt;
//!         }
//!     });
//! }
//! ```
//!
//! ## Shape of the crate
//!
//! - **Scene description is plain data.** A [`Scene`] and everything in it
//!   is host-side; the renderer uploads GPU copies on first use. Scenes are
//!   buildable (and testable) without a device.
//! - **One camera, one light model.** A [`PerspectiveCamera`], one point
//!   light with an optional shadow map, one ambient term. This is a scene
//!   demo, not an engine.
//! - **Escape hatches stay open.** [`GpuContext`] fields are public, as in
//!   any wgpu app.

mod app;
mod camera;
mod color;
mod geometry;
mod gpu;
mod input;
mod light;
mod material;
mod mesh_pass;
mod orbit;
mod point_pass;
mod renderer;
mod scene;

pub use app::{AppConfig, Frame, SetupContext, run};
pub use camera::PerspectiveCamera;
pub use color::Color;
pub use geometry::{MeshData, PointVertex, Vertex3d, starfield};
pub use gpu::GpuContext;
pub use input::Input;
pub use light::{AmbientLight, PointLight};
pub use material::{Material, Shading};
pub use orbit::OrbitControls;
pub use renderer::{MAX_PIXEL_RATIO, Renderer, Viewport};
pub use scene::{MeshObject, Object, ObjectId, PointCloud, Scene};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3};

// Re-export the winit type orbit input is expressed in
pub use winit::event::MouseButton;
