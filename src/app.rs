//! The application runner: window creation, the frame loop, and the resize
//! handler.
//!
//! [`run`] takes a setup closure that runs exactly once, after the window and
//! renderer exist, and returns the per-frame closure. The winit handler owns
//! all mutable state (scene, camera, renderer, input) and threads it into
//! both closures — no globals.

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::camera::PerspectiveCamera;
use crate::input::Input;
use crate::renderer::Renderer;
use crate::scene::Scene;

/// Window configuration.
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Orbita".to_string(),
            width: 800,
            height: 600,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Context handed to the setup closure, once.
pub struct SetupContext<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut PerspectiveCamera,
    pub renderer: &'a mut Renderer,
}

/// Context handed to the frame closure, every frame.
pub struct Frame<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut PerspectiveCamera,
    pub input: &'a Input,
    /// Seconds since startup.
    pub time: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
}

/// Run the application: create the window, call `setup` once, then loop the
/// returned frame closure until the window closes.
///
/// The loop is paced by the surface's Fifo present mode — one frame per
/// display refresh — re-armed by requesting a redraw at the end of each
/// frame.
pub fn run<S, F>(config: AppConfig, setup: S)
where
    S: FnOnce(&mut SetupContext) -> F + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::Pending {
        config,
        setup: Some(Box::new(move |ctx: &mut SetupContext| {
            Box::new(setup(ctx)) as Box<dyn FnMut(&mut Frame)>
        })),
    };

    event_loop.run_app(&mut app).expect("Event loop error");
}

type SetupFn = Box<dyn FnOnce(&mut SetupContext) -> Box<dyn FnMut(&mut Frame)>>;

enum App {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running {
        window: Arc<Window>,
        renderer: Renderer,
        scene: Scene,
        camera: PerspectiveCamera,
        input: Input,
        frame_fn: Box<dyn FnMut(&mut Frame)>,
        start_time: Instant,
        last_frame: Instant,
    },
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let App::Pending { config, setup } = self else {
            return;
        };

        let window_attrs = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.width, config.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        let mut renderer = Renderer::new(window.clone());
        let mut scene = Scene::new();
        let mut camera = PerspectiveCamera::new(50.0, renderer.viewport().aspect());

        let setup_fn = setup.take().expect("setup consumed twice");
        let frame_fn = setup_fn(&mut SetupContext {
            scene: &mut scene,
            camera: &mut camera,
            renderer: &mut renderer,
        });

        window.request_redraw();

        *self = App::Running {
            window,
            renderer,
            scene,
            camera,
            input: Input::new(),
            frame_fn,
            start_time: Instant::now(),
            last_frame: Instant::now(),
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let App::Running {
            window,
            renderer,
            scene,
            camera,
            input,
            frame_fn,
            start_time,
            last_frame,
        } = self
        else {
            return;
        };

        input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                let scale = window.scale_factor();
                let logical = size.to_logical::<f64>(scale);

                camera.set_aspect((logical.width / logical.height.max(1.0)) as f32);
                camera.update_projection();

                renderer.set_pixel_ratio(scale as f32);
                renderer.set_size(logical.width.round() as u32, logical.height.round() as u32);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                renderer.set_pixel_ratio(scale_factor as f32);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let time = start_time.elapsed().as_secs_f32();
                let dt = now.duration_since(*last_frame).as_secs_f32();
                *last_frame = now;

                {
                    let mut frame = Frame {
                        scene: &mut *scene,
                        camera: &mut *camera,
                        input,
                        time,
                        dt,
                    };
                    frame_fn(&mut frame);
                }

                match renderer.render(scene, camera, time) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        log::warn!("surface lost, reconfiguring");
                        renderer.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("out of GPU memory, exiting");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::warn!("skipping frame: {e:?}");
                    }
                }

                input.end_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}
