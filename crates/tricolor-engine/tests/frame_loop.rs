use std::time::Duration;

use tricolor_engine::device::recording::{DeviceEvent, FaultPoint};
use tricolor_engine::device::{DeviceError, RecordingDevice, RenderCommand};
use tricolor_engine::geometry::{PackedColor, PrimitiveTopology, TRIANGLE};
use tricolor_engine::render::{FrameStep, RenderContext, SceneConfig};
use tricolor_engine::time::FrameClock;
use tricolor_engine::transform::{rotation_angle, ROTATION_PERIOD_MS};

fn draws(commands: &[RenderCommand]) -> Vec<&RenderCommand> {
    commands
        .iter()
        .filter(|c| matches!(c, RenderCommand::Draw { .. }))
        .collect()
}

#[test]
fn color_advances_by_step_every_frame() {
    let device = RecordingDevice::new();
    let journal = device.journal();
    let mut ctx = RenderContext::initialize(device, SceneConfig::default()).unwrap();
    let mut clock = FrameClock::fixed_step(Duration::from_millis(16));

    const FRAMES: u32 = 240;
    for _ in 0..FRAMES {
        let report = ctx.render_frame(&clock.tick());
        assert!(report.failures.is_empty(), "{:?}", report.failures);
    }

    let expected = TRIANGLE[0].color.0.wrapping_add(100 * FRAMES);
    assert_eq!(ctx.store().vertices()[0].color, PackedColor(expected));
    assert_eq!(journal.frames().len(), FRAMES as usize);
}

#[test]
fn every_frame_draws_one_strip_triangle() {
    let device = RecordingDevice::new();
    let journal = device.journal();
    let mut ctx = RenderContext::initialize(device, SceneConfig::default()).unwrap();
    let mut clock = FrameClock::fixed_step(Duration::from_millis(33));

    for _ in 0..30 {
        ctx.render_frame(&clock.tick());
    }

    for frame in journal.frames() {
        assert_eq!(
            draws(&frame),
            vec![&RenderCommand::Draw {
                topology: PrimitiveTopology::TriangleStrip,
                start_vertex: 0,
                primitive_count: 1,
            }]
        );
    }
    assert_eq!(journal.frames().len(), 30);
}

#[test]
fn color_wraps_past_white() {
    let mut config = SceneConfig::default();
    config.vertices[0].color = PackedColor(0xFFFF_FFFF);

    let mut ctx = RenderContext::initialize(RecordingDevice::new(), config).unwrap();
    ctx.render_frame(&FrameClock::fixed_step(Duration::from_millis(1)).tick());

    assert_eq!(ctx.store().vertices()[0].color, PackedColor(99));
}

#[test]
fn rotation_repeats_each_period() {
    for t in [0, 1, 250, 999, 1_000, 123_456_789] {
        let angle = rotation_angle(t);
        assert!((0.0..std::f32::consts::TAU).contains(&angle));
        assert_eq!(angle, rotation_angle(t + ROTATION_PERIOD_MS));
    }
}

#[test]
fn transient_failures_do_not_stop_the_loop() {
    let device = RecordingDevice::new();
    let journal = device.journal();
    let mut ctx = RenderContext::initialize(device, SceneConfig::default()).unwrap();
    let mut clock = FrameClock::fixed_step(Duration::from_millis(16));

    journal.inject(FaultPoint::BeginScene, DeviceError::InvalidCall("device busy"));
    journal.inject(FaultPoint::Present, DeviceError::SurfaceTimeout);

    let first = ctx.render_frame(&clock.tick());
    assert_eq!(
        first.failures.iter().map(|f| f.step).collect::<Vec<_>>(),
        vec![FrameStep::BeginScene, FrameStep::Present]
    );
    assert!(!first.is_fatal());

    let second = ctx.render_frame(&clock.tick());
    assert!(second.drawn && second.presented);
    assert_eq!(draws(&journal.frames()[0]).len(), 1);
}

#[test]
fn shutdown_releases_once_and_stops_rendering() {
    let device = RecordingDevice::new();
    let journal = device.journal();
    let mut ctx = RenderContext::initialize(device, SceneConfig::default()).unwrap();
    let mut clock = FrameClock::fixed_step(Duration::from_millis(16));

    ctx.render_frame(&clock.tick());
    ctx.shutdown();
    ctx.shutdown();
    assert!(ctx.render_frame(&clock.tick()).is_fatal());
    drop(ctx);

    assert_eq!(journal.count(|e| matches!(e, DeviceEvent::ReleaseBuffer(_))), 1);
    assert_eq!(journal.count(|e| matches!(e, DeviceEvent::ReleaseDevice)), 1);
    assert_eq!(journal.frames().len(), 1);
}
