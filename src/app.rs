//! Window, event loop and the glue between them and the viewer
//!
//! Loads run on the [`AssetLoader`]'s pool and come back as
//! [`ViewerEvent::Loaded`] user events, so every scene mutation happens on
//! the event loop thread between frames.

use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::{
    assets::{AssetLoader, FileSource, LoadCompletion},
    config::{Catalog, ViewerConfig},
    error::LoadError,
    gfx::{rendering::render_engine::RenderEngine, scene::scene::Scene},
    ui::{catalog_panel, PanelState, UiManager},
    viewer::{
        CompletionOutcome, FrameContext, FrameRenderer, NavigationCommand, Reload, RenderLoop,
        RenderLoopHandle, ResizeHandler, Viewer,
    },
};

/// Events delivered to the window thread from outside it
#[derive(Debug)]
pub enum ViewerEvent {
    Loaded(LoadCompletion),
}

pub struct ShowroomApp {
    event_loop: Option<EventLoop<ViewerEvent>>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    viewer: Viewer,
    loader: AssetLoader,
    proxy: EventLoopProxy<ViewerEvent>,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    render_loop: Option<RenderLoopHandle>,
    resize_handler: Option<ResizeHandler<Arc<Window>>>,
    last_failure: Option<LoadError>,
    fatal: Option<anyhow::Error>,
}

impl ShowroomApp {
    /// Sets up the event loop and loader; the window opens in [`ShowroomApp::run`]
    pub fn new(catalog: Catalog, config: ViewerConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::<ViewerEvent>::with_user_event()
            .build()
            .context("Failed to create event loop")?;
        let proxy = event_loop.create_proxy();

        let source = Arc::new(FileSource::new(config.asset_root.clone()));
        let loader = AssetLoader::new(source).context("Failed to start asset loader")?;

        log::info!(
            "Showroom with {} entries, assets from {}",
            catalog.len(),
            config.asset_root.display()
        );

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                viewer: Viewer::new(catalog, &config),
                config,
                loader,
                proxy,
                window: None,
                render_engine: None,
                ui_manager: None,
                render_loop: None,
                resize_handler: None,
                last_failure: None,
                fatal: None,
            },
        })
    }

    /// Runs until the window is closed
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("Event loop already consumed")?;
        // Frames are requested by the render loop itself
        event_loop.set_control_flow(ControlFlow::Wait);

        event_loop
            .run_app(&mut self.app_state)
            .context("Event loop terminated with an error")?;

        match self.app_state.fatal.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(self.config.title.clone())
                    .with_inner_size(winit::dpi::LogicalSize::new(
                        self.config.width,
                        self.config.height,
                    )),
            )
            .context("Failed to create window")?;
        let window_handle = Arc::new(window);

        let (width, height) = window_handle.inner_size().into();
        let window_clone = window_handle.clone();
        let mut renderer = pollster::block_on(RenderEngine::new(
            window_clone,
            width,
            height,
            &self.config,
        ))?;

        let ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window_handle,
        );

        let mut resize_handler = ResizeHandler::subscribe(window_handle.clone());
        resize_handler.notify(
            &mut self.viewer.scene_mut().camera_manager.camera,
            &mut renderer,
        );

        self.render_loop = Some(RenderLoop::start(&*window_handle));
        self.resize_handler = Some(resize_handler);
        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window_handle);

        if let Some(reload) = self.viewer.start() {
            self.dispatch(reload);
        }
        Ok(())
    }

    fn dispatch(&self, reload: Reload) {
        for request in reload.into_requests() {
            let proxy = self.proxy.clone();
            self.loader.dispatch(request, move |completion| {
                if proxy.send_event(ViewerEvent::Loaded(completion)).is_err() {
                    log::debug!("Event loop closed, dropping load completion");
                }
            });
        }
    }

    fn navigate(&mut self, command: NavigationCommand) {
        if let Some(reload) = self.viewer.handle(command) {
            self.dispatch(reload);
        }
    }

    fn redraw(&mut self) {
        let (Some(window), Some(render_engine), Some(render_loop)) = (
            self.window.as_ref(),
            self.render_engine.as_mut(),
            self.render_loop.as_mut(),
        ) else {
            return;
        };

        let mut painter = FramePainter {
            engine: render_engine,
            ui: self.ui_manager.as_mut(),
            window,
            panel: PanelState::from_viewer(&self.viewer, self.last_failure.as_ref()),
            command: None,
        };

        if let Err(e) = render_loop.tick(self.viewer.scene_mut(), &mut painter, &**window) {
            log::error!("Frame failed: {:#}", e);
        }

        if let Some(command) = painter.command {
            self.navigate(command);
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        self.viewer
            .scene_mut()
            .camera_manager
            .process_keyboard_event(event);

        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
            PhysicalKey::Code(KeyCode::ArrowRight) => self.navigate(NavigationCommand::Advance),
            PhysicalKey::Code(KeyCode::ArrowLeft) => self.navigate(NavigationCommand::Retreat),
            _ => (),
        }
    }

    fn teardown(&mut self) {
        if let Some(render_loop) = self.render_loop.take() {
            render_loop.stop();
        }
        if let Some(mut resize_handler) = self.resize_handler.take() {
            resize_handler.unsubscribe();
        }
    }
}

impl ApplicationHandler<ViewerEvent> for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.open_window(event_loop) {
            log::error!("Failed to start viewer: {:#}", e);
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Loaded(completion) => match self.viewer.complete(completion) {
                CompletionOutcome::Applied(kind) => {
                    log::debug!("Applied {:?} load", kind);
                    self.last_failure = None;
                }
                CompletionOutcome::Failed(error) => self.last_failure = Some(error),
                CompletionOutcome::Superseded => (),
            },
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // Handle UI input first
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::MouseInput { state, button, .. } => {
                self.viewer
                    .scene_mut()
                    .camera_manager
                    .controller
                    .process_mouse_button(button, state);
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let (Some(render_engine), Some(resize_handler)) =
                    (self.render_engine.as_mut(), self.resize_handler.as_mut())
                {
                    resize_handler.notify(
                        &mut self.viewer.scene_mut().camera_manager.camera,
                        render_engine,
                    );
                }
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        // Don't orbit while the overlay has the pointer
        if self
            .ui_manager
            .as_ref()
            .is_some_and(UiManager::wants_input)
        {
            return;
        }

        self.viewer.scene_mut().camera_manager.process_event(&event);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

type NoOverlay = fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView);

/// Renders the scene plus the catalog overlay for one tick
struct FramePainter<'a> {
    engine: &'a mut RenderEngine,
    ui: Option<&'a mut UiManager>,
    window: &'a Window,
    panel: PanelState,
    command: Option<NavigationCommand>,
}

impl FrameRenderer for FramePainter<'_> {
    fn render(&mut self, scene: &mut Scene, frame: &FrameContext) -> anyhow::Result<()> {
        let Some(ui) = self.ui.as_deref_mut() else {
            self.engine
                .render_frame(scene, frame, None::<NoOverlay>)?;
            return Ok(());
        };

        let panel = &self.panel;
        self.command = ui
            .update_logic(self.window, |imgui| catalog_panel(imgui, panel))
            .flatten();

        self.engine.render_frame(
            scene,
            frame,
            Some(
                |device: &wgpu::Device,
                 queue: &wgpu::Queue,
                 encoder: &mut wgpu::CommandEncoder,
                 view: &wgpu::TextureView| {
                    ui.render_display_only(device, queue, encoder, view);
                },
            ),
        )?;
        Ok(())
    }
}
