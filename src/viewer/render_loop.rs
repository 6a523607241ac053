//! Per-frame update and draw cycle
//!
//! The loop reschedules itself after every frame and keeps running whether or
//! not a load is in flight. Starting it hands back a [`RenderLoopHandle`]; the
//! owner must call [`RenderLoopHandle::stop`] when the view goes away.

use crate::gfx::scene::scene::Scene;

/// What a renderer needs to know about the frame beyond the scene itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Exposure of the most recently applied model
    pub exposure: f32,
    pub frame_index: u64,
}

/// Asks the platform for another frame
pub trait FrameScheduler {
    fn schedule_frame(&self);
}

impl FrameScheduler for winit::window::Window {
    fn schedule_frame(&self) {
        self.request_redraw();
    }
}

/// Draws one frame of the scene
pub trait FrameRenderer {
    fn render(&mut self, scene: &mut Scene, frame: &FrameContext) -> anyhow::Result<()>;
}

pub struct RenderLoop;

impl RenderLoop {
    /// Requests the first frame and returns the handle that drives the rest
    pub fn start(scheduler: &dyn FrameScheduler) -> RenderLoopHandle {
        log::info!("Render loop started");
        scheduler.schedule_frame();
        RenderLoopHandle {
            frames: 0,
            stopped: false,
        }
    }
}

/// A running render loop
#[must_use = "a render loop runs until stop() is called on its handle"]
#[derive(Debug)]
pub struct RenderLoopHandle {
    frames: u64,
    stopped: bool,
}

impl RenderLoopHandle {
    /// Runs one cycle: damping, exposure, draw, reschedule
    ///
    /// The next frame is scheduled even when drawing fails so a transient
    /// surface error does not end the loop.
    pub fn tick<R>(
        &mut self,
        scene: &mut Scene,
        renderer: &mut R,
        scheduler: &dyn FrameScheduler,
    ) -> anyhow::Result<FrameContext>
    where
        R: FrameRenderer + ?Sized,
    {
        scene.update();

        let frame = FrameContext {
            exposure: scene.exposure(),
            frame_index: self.frames,
        };
        let result = renderer.render(scene, &frame);
        self.frames += 1;

        scheduler.schedule_frame();
        result.map(|()| frame)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Ends the loop, returns how many frames it ran
    pub fn stop(mut self) -> u64 {
        self.stopped = true;
        log::info!("Render loop stopped after {} frames", self.frames);
        self.frames
    }
}

impl Drop for RenderLoopHandle {
    fn drop(&mut self) {
        if !self.stopped {
            log::warn!(
                "Render loop handle dropped without stop() after {} frames",
                self.frames
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Catalog, ViewerConfig};
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingScheduler {
        requests: Cell<usize>,
    }

    impl FrameScheduler for CountingScheduler {
        fn schedule_frame(&self) {
            self.requests.set(self.requests.get() + 1);
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<FrameContext>,
        fail: bool,
    }

    impl FrameRenderer for RecordingRenderer {
        fn render(&mut self, _scene: &mut Scene, frame: &FrameContext) -> anyhow::Result<()> {
            self.frames.push(*frame);
            if self.fail {
                anyhow::bail!("surface gone");
            }
            Ok(())
        }
    }

    fn scene() -> Scene {
        Scene::initialize(&ViewerConfig::default(), Catalog::builtin().first())
    }

    #[test]
    fn ticks_draw_with_current_exposure_and_reschedule() {
        let scheduler = CountingScheduler::default();
        let mut renderer = RecordingRenderer::default();
        let mut scene = scene();

        let mut handle = RenderLoop::start(&scheduler);
        assert_eq!(scheduler.requests.get(), 1);

        handle.tick(&mut scene, &mut renderer, &scheduler).unwrap();
        scene.set_exposure(4.0);
        let frame = handle.tick(&mut scene, &mut renderer, &scheduler).unwrap();

        assert_eq!(frame.frame_index, 1);
        assert_eq!(renderer.frames[0].exposure, 2.0);
        assert_eq!(renderer.frames[1].exposure, 4.0);
        assert_eq!(scheduler.requests.get(), 3);
        assert_eq!(handle.stop(), 2);
    }

    #[test]
    fn tick_advances_camera_damping() {
        let scheduler = CountingScheduler::default();
        let mut renderer = RecordingRenderer::default();
        let mut scene = scene();
        let start_yaw = scene.camera_manager.camera.yaw;

        scene.camera_manager.camera.add_yaw(1.0);
        let mut handle = RenderLoop::start(&scheduler);
        handle.tick(&mut scene, &mut renderer, &scheduler).unwrap();

        let yaw = scene.camera_manager.camera.yaw;
        assert!(yaw > start_yaw && yaw < start_yaw + 1.0);
        handle.stop();
    }

    #[test]
    fn failed_frame_still_reschedules() {
        let scheduler = CountingScheduler::default();
        let mut renderer = RecordingRenderer {
            fail: true,
            ..Default::default()
        };
        let mut scene = scene();

        let mut handle = RenderLoop::start(&scheduler);
        assert!(handle.tick(&mut scene, &mut renderer, &scheduler).is_err());
        assert_eq!(scheduler.requests.get(), 2);
        assert_eq!(handle.frames_rendered(), 1);
        handle.stop();
    }
}
