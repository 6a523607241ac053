//! Viewport resize handling
//!
//! The window's size is never read globally: a [`ViewportSizeProvider`] is
//! injected and sizes arrive through an explicit subscription that the owner
//! unsubscribes on teardown.

use std::sync::Arc;

use crate::gfx::{camera::orbit_camera::OrbitCamera, rendering::render_engine::RenderEngine};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    /// Physical pixels
    pub width: u32,
    pub height: u32,
    /// Physical pixels per logical pixel, already folded into the size
    pub pixel_ratio: f64,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Source of the current drawable size
pub trait ViewportSizeProvider {
    fn viewport_size(&self) -> ViewportSize;
}

impl ViewportSizeProvider for winit::window::Window {
    fn viewport_size(&self) -> ViewportSize {
        let size = self.inner_size();
        ViewportSize::new(size.width, size.height, self.scale_factor())
    }
}

impl<P> ViewportSizeProvider for Arc<P>
where
    P: ViewportSizeProvider + ?Sized,
{
    fn viewport_size(&self) -> ViewportSize {
        (**self).viewport_size()
    }
}

/// Renderer output that follows the viewport
pub trait RenderSurface {
    /// `width` and `height` are physical pixels
    fn resize_surface(&mut self, width: u32, height: u32);
}

impl RenderSurface for RenderEngine {
    fn resize_surface(&mut self, width: u32, height: u32) {
        self.resize(width, height);
    }
}

/// Keeps camera aspect and renderer output in step with the viewport
///
/// The handler owns the registration with its size provider. Size-changed
/// signals go through [`ResizeHandler::notify`], which reads the registered
/// provider; once [`ResizeHandler::unsubscribe`] has returned the provider,
/// signals reach nothing.
#[derive(Debug)]
pub struct ResizeHandler<P> {
    provider: Option<P>,
    last: Option<ViewportSize>,
}

impl<P: ViewportSizeProvider> ResizeHandler<P> {
    /// Registers with `provider`
    pub fn subscribe(provider: P) -> Self {
        log::debug!("Resize handler subscribed");
        Self {
            provider: Some(provider),
            last: None,
        }
    }

    /// Ends the registration and hands the provider back
    pub fn unsubscribe(&mut self) -> Option<P> {
        let provider = self.provider.take();
        if provider.is_some() {
            log::debug!("Resize handler unsubscribed");
        }
        provider
    }

    pub fn is_subscribed(&self) -> bool {
        self.provider.is_some()
    }

    pub fn last_size(&self) -> Option<ViewportSize> {
        self.last
    }

    /// Viewport-size-changed signal
    ///
    /// Reads the provider and applies its size to the camera projection and
    /// the render surface. Returns false, touching nothing, when
    /// unsubscribed, for zero sizes and for a size equal to the last one
    /// applied.
    pub fn notify<S>(&mut self, camera: &mut OrbitCamera, surface: &mut S) -> bool
    where
        S: RenderSurface + ?Sized,
    {
        let Some(provider) = self.provider.as_ref() else {
            return false;
        };
        let size = provider.viewport_size();
        if size.is_empty() {
            return false;
        }
        if self.last == Some(size) {
            log::debug!("Ignoring repeated viewport size {}x{}", size.width, size.height);
            return false;
        }

        camera.resize_projection(size.width, size.height);
        surface.resize_surface(size.width, size.height);
        self.last = Some(size);

        log::debug!(
            "Viewport resized to {}x{} @{}x",
            size.width,
            size.height,
            size.pixel_ratio
        );
        true
    }
}
