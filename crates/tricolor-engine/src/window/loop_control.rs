//! Message-loop decisions, independent of the window and the backend.

use anyhow::Result;

use crate::device::GraphicsDevice;
use crate::render::{RenderContext, SceneConfig};
use crate::time::FrameClock;

/// What the message loop does next.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Exit,
}

/// Builds the render context from a freshly created device.
///
/// Any failure is logged and yields `None`: the window stays up and the loop
/// keeps running with nothing drawn.
pub fn start_rendering<D: GraphicsDevice>(
    device: Result<D>,
    scene: SceneConfig,
) -> Option<RenderContext<D>> {
    match device.and_then(|device| RenderContext::initialize(device, scene)) {
        Ok(context) => Some(context),
        Err(e) => {
            log::error!("graphics initialization failed: {e:#}");
            None
        }
    }
}

/// Renders one frame when a live context exists.
///
/// `before_present` runs right before the frame is rendered. A fatal frame
/// releases the context and ends the loop.
pub fn drive_frame<D: GraphicsDevice>(
    context: Option<&mut RenderContext<D>>,
    clock: &mut FrameClock,
    before_present: impl FnOnce(),
) -> LoopAction {
    let Some(context) = context.filter(|c| !c.is_released()) else {
        return LoopAction::Continue;
    };

    let time = clock.tick();
    before_present();
    let report = context.render_frame(&time);

    if !report.is_fatal() {
        return LoopAction::Continue;
    }

    for failure in &report.failures {
        log::error!("{} failed: {}", failure.step, failure.error);
    }
    log::error!("rendering stopped at frame {}", time.frame_index);
    context.shutdown();
    LoopAction::Exit
}

/// Close or destroy: release graphics resources, then leave the loop.
pub fn close_window<D: GraphicsDevice>(context: Option<&mut RenderContext<D>>) -> LoopAction {
    if let Some(context) = context {
        context.shutdown();
    }
    LoopAction::Exit
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use super::*;
    use crate::device::recording::{DeviceEvent, FaultPoint, Journal};
    use crate::device::{DeviceError, RecordingDevice};

    fn clock() -> FrameClock {
        FrameClock::fixed_step(Duration::from_millis(16))
    }

    fn started() -> (RenderContext<RecordingDevice>, Journal) {
        let device = RecordingDevice::new();
        let journal = device.journal();
        let context = start_rendering(Ok(device), SceneConfig::default()).unwrap();
        (context, journal)
    }

    // ── initialization ──────────────────────────────────────────────────

    #[test]
    fn device_creation_failure_leaves_loop_running_empty() {
        let context = start_rendering::<RecordingDevice>(
            Err(anyhow::anyhow!("no suitable adapter")),
            SceneConfig::default(),
        );
        assert!(context.is_none());

        let notified = Cell::new(0);
        let mut clock = clock();
        for _ in 0..3 {
            let action = drive_frame::<RecordingDevice>(None, &mut clock, || {
                notified.set(notified.get() + 1)
            });
            assert_eq!(action, LoopAction::Continue);
        }
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn buffer_failure_releases_device_and_renders_nothing() {
        let device = RecordingDevice::new();
        let journal = device.journal();
        journal.inject(FaultPoint::CreateBuffer, DeviceError::OutOfMemory);

        let mut context = start_rendering(Ok(device), SceneConfig::default());
        assert!(context.is_none());
        assert_eq!(journal.count(|e| matches!(e, DeviceEvent::ReleaseDevice)), 1);

        assert_eq!(drive_frame(context.as_mut(), &mut clock(), || {}), LoopAction::Continue);
        assert!(journal.frames().is_empty());
    }

    // ── frames ──────────────────────────────────────────────────────────

    #[test]
    fn live_context_renders_each_iteration() {
        let (mut context, journal) = started();
        let mut clock = clock();
        let notified = Cell::new(0);

        for _ in 0..4 {
            let action = drive_frame(Some(&mut context), &mut clock, || {
                notified.set(notified.get() + 1)
            });
            assert_eq!(action, LoopAction::Continue);
        }
        assert_eq!(journal.frames().len(), 4);
        assert_eq!(notified.get(), 4);
    }

    #[test]
    fn step_failures_keep_the_loop_running() {
        let (mut context, journal) = started();
        journal.inject(FaultPoint::Lock, DeviceError::OutOfMemory);
        journal.inject(FaultPoint::BeginScene, DeviceError::InvalidCall("busy"));

        let mut clock = clock();
        assert_eq!(drive_frame(Some(&mut context), &mut clock, || {}), LoopAction::Continue);
        assert_eq!(drive_frame(Some(&mut context), &mut clock, || {}), LoopAction::Continue);
        assert!(!context.is_released());
    }

    #[test]
    fn fatal_present_releases_and_exits() {
        let (mut context, journal) = started();
        journal.inject(FaultPoint::Present, DeviceError::OutOfMemory);

        let action = drive_frame(Some(&mut context), &mut clock(), || {});

        assert_eq!(action, LoopAction::Exit);
        assert!(context.is_released());
        assert_eq!(journal.count(|e| matches!(e, DeviceEvent::ReleaseDevice)), 1);
    }

    // ── close ───────────────────────────────────────────────────────────

    #[test]
    fn close_releases_buffer_then_device_and_exits() {
        let (mut context, journal) = started();
        drive_frame(Some(&mut context), &mut clock(), || {});

        assert_eq!(close_window(Some(&mut context)), LoopAction::Exit);

        let events = journal.events();
        let n = events.len();
        assert!(matches!(events[n - 2], DeviceEvent::ReleaseBuffer(_)));
        assert_eq!(events[n - 1], DeviceEvent::ReleaseDevice);

        // Closing again (destroy after close) releases nothing more.
        assert_eq!(close_window(Some(&mut context)), LoopAction::Exit);
        assert_eq!(journal.count(|e| matches!(e, DeviceEvent::ReleaseDevice)), 1);
        assert_eq!(drive_frame(Some(&mut context), &mut clock(), || {}), LoopAction::Continue);
        assert_eq!(journal.frames().len(), 1);
    }

    #[test]
    fn close_without_context_still_exits() {
        assert_eq!(close_window::<RecordingDevice>(None), LoopAction::Exit);
    }
}
