//! WGPU-based rendering engine for the showroom
//!
//! Two passes per frame: a depth-only pass from the spotlight into the shadow
//! map, then the lit pass into the sRGB surface with PCF shadows, environment
//! reflections and ACES tone mapping driven by the frame's exposure. An
//! optional overlay callback records after the lit pass.

use std::sync::Arc;

use anyhow::Context;
use wgpu::TextureFormat;

use crate::{
    config::ViewerConfig,
    gfx::{
        resources::{
            global_bindings::{GlobalBindings, GlobalUniform},
            texture_resource::TextureResource,
        },
        scene::{model::DrawModel, scene::Scene},
    },
    viewer::render_loop::FrameContext,
    wgpu_utils::binding_types,
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};

const SHADOW_PIPELINE: &str = "Shadow";
const LIT_PIPELINE: &str = "Lit";

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    depth_texture: TextureResource,
    pipeline_manager: PipelineManager,
    global_bindings: GlobalBindings,
    primitive_layout: wgpu::BindGroupLayout,

    shadow_map: TextureResource,

    // Shadow map and environment share group 2
    environment_layout: wgpu::BindGroupLayout,
    environment_texture: TextureResource,
    environment_bind_group: wgpu::BindGroup,
    environment_revision: u64,
}

impl RenderEngine {
    /// Creates a render engine drawing into `window`
    ///
    /// Fails when no adapter or device is available or the pipelines do not
    /// compile.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        viewer: &ViewerConfig,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request a device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .context("Surface reports no supported formats")?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "Surface configured: {}x{} {:?} on {}",
            config.width,
            config.height,
            format,
            adapter.get_info().name
        );

        let depth_texture =
            TextureResource::create_depth_texture(&device, config.width, config.height, "depth_texture");
        let shadow_map =
            TextureResource::create_shadow_map(&device, viewer.spot_light.shadow.map_size);
        let environment_texture = TextureResource::create_fallback_environment(&device, &queue);

        let global_bindings = GlobalBindings::new(&device);

        let primitive_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Primitive Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: binding_types::uniform(),
                count: None,
            }],
        });

        let environment_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Shadow Environment Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: binding_types::depth_texture_2d(),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: binding_types::sampler(wgpu::SamplerBindingType::Comparison),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: binding_types::texture_2d(false),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: binding_types::sampler(wgpu::SamplerBindingType::NonFiltering),
                        count: None,
                    },
                ],
            });

        let environment_bind_group = Self::create_environment_bind_group(
            &device,
            &environment_layout,
            &shadow_map,
            &environment_texture,
        );

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("scene", include_str!("shaders/scene.wgsl"));
        pipeline_manager.load_shader("shadow", include_str!("shaders/shadow.wgsl"));

        // Shadow depth pass, no culling so open meshes still cast
        pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_vertex_only()
                .with_cull_mode(None)
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_depth_bias(2, 2.0)
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    primitive_layout.clone(),
                ]),
        );

        pipeline_manager.register_pipeline(
            LIT_PIPELINE,
            PipelineConfig::default()
                .with_label("LIT")
                .with_shader("scene")
                .with_cull_mode(None)
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    primitive_layout.clone(),
                    environment_layout.clone(),
                ]),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            anyhow::bail!("Failed to create pipelines: {}", errors.join("; "));
        }
        log::debug!("{:?}", pipeline_manager.get_stats());

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            format,
            depth_texture,
            pipeline_manager,
            global_bindings,
            primitive_layout,
            shadow_map,
            environment_layout,
            environment_texture,
            environment_bind_group,
            environment_revision: 0,
        })
    }

    fn create_environment_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        shadow_map: &TextureResource,
        environment: &TextureResource,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Environment Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_map.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&environment.sampler),
                },
            ],
        })
    }

    /// Uploads anything the scene gained since the last frame: new model
    /// buffers and a swapped environment map
    pub fn prepare(&mut self, scene: &mut Scene) {
        scene.prepare_gpu(&self.device, &self.primitive_layout);
        self.sync_environment(scene);
    }

    fn sync_environment(&mut self, scene: &Scene) {
        if scene.environment_revision() == self.environment_revision {
            return;
        }
        self.environment_revision = scene.environment_revision();

        let Some(map) = scene.environment() else {
            return;
        };

        let max_dimension = self.device.limits().max_texture_dimension_2d;
        let texture = if map.width > max_dimension || map.height > max_dimension {
            let fitted = map.as_ref().clone().fit_within(max_dimension);
            log::warn!(
                "Environment '{}' is {}x{}, downsampled to {}x{}",
                map.locator,
                map.width,
                map.height,
                fitted.width,
                fitted.height
            );
            TextureResource::create_environment(&self.device, &self.queue, &fitted)
        } else {
            TextureResource::create_environment(&self.device, &self.queue, map)
        };

        self.environment_bind_group = Self::create_environment_bind_group(
            &self.device,
            &self.environment_layout,
            &self.shadow_map,
            &texture,
        );
        let previous = std::mem::replace(&mut self.environment_texture, texture);
        previous.release();
    }

    /// Renders one frame with an optional overlay
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped;
    /// only unrecoverable surface errors are returned.
    pub fn render_frame<F>(
        &mut self,
        scene: &mut Scene,
        frame: &FrameContext,
        overlay: Option<F>,
    ) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.prepare(scene);
        self.global_bindings.update(
            &self.queue,
            GlobalUniform::new(
                &scene.camera_manager.camera.uniform,
                scene.light(),
                frame.exposure,
                scene.environment().is_some(),
            ),
        );

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring surface texture, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: spotlight depth
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let (Some(pipeline), Some(model)) = (
                self.pipeline_manager.pipeline(SHADOW_PIPELINE),
                scene.current_model(),
            ) {
                shadow_pass.set_pipeline(pipeline);
                shadow_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
                shadow_pass.draw_shadow_casters(model);
            }
        }

        // PASS 2: lit scene
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.pipeline(LIT_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
                render_pass.set_bind_group(2, &self.environment_bind_group, &[]);

                render_pass.draw_primitive(scene.ground().primitive());
                if let Some(model) = scene.current_model() {
                    render_pass.draw_model(model);
                }
            }
        }

        // PASS 3: overlay
        if let Some(overlay) = overlay {
            overlay(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Reconfigures the surface and recreates the depth buffer
    ///
    /// Sizes are physical pixels, so the display's pixel ratio is already
    /// applied. Zero sizes (minimised windows) are ignored. The shadow map
    /// keeps its fixed resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, width, height, "depth_texture");
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Surface format, needed by overlays that render into the same target
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
