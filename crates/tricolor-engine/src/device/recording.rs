//! In-memory device that journals every call.
//!
//! Used to exercise the frame renderer and resource lifetime without a GPU.
//! Faults can be injected per call site to drive the error paths.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use bytemuck::Zeroable;

use crate::geometry::{Vertex, VertexFormat};

use super::{
    BufferId, CommandList, DeviceError, GraphicsDevice, RenderCommand, RenderStates,
    VertexBufferAccess,
};

/// Observable device-side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    SetRenderStates(RenderStates),
    CreateBuffer { id: BufferId, vertex_count: u32 },
    Lock(BufferId),
    Unlock(BufferId),
    /// Commands submitted by a successful present, `Present` included.
    Frame(Vec<RenderCommand>),
    ReleaseBuffer(BufferId),
    ReleaseDevice,
}

/// Call sites where a fault can be injected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    CreateBuffer,
    Lock,
    BeginScene,
    Present,
}

#[derive(Debug, Default)]
struct JournalState {
    events: Vec<DeviceEvent>,
    contents: HashMap<BufferId, Vec<Vertex>>,
    faults: Vec<(FaultPoint, DeviceError)>,
    next_buffer: u64,
}

/// Shared handle onto a recording device's history.
///
/// Outlives the device, so tests can inspect releases after shutdown.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<JournalState>>);

impl Journal {
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.0.borrow().events.clone()
    }

    /// Command streams of every presented frame, oldest first.
    pub fn frames(&self) -> Vec<Vec<RenderCommand>> {
        self.0
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                DeviceEvent::Frame(cmds) => Some(cmds.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DeviceEvent) -> bool) -> usize {
        self.0.borrow().events.iter().filter(|e| pred(e)).count()
    }

    /// Buffer contents as the device sees them (last unlocked state).
    pub fn device_contents(&self, id: BufferId) -> Option<Vec<Vertex>> {
        self.0.borrow().contents.get(&id).cloned()
    }

    /// Makes the next call at `point` fail with `error`.
    pub fn inject(&self, point: FaultPoint, error: DeviceError) {
        self.0.borrow_mut().faults.push((point, error));
    }

    fn take_fault(&self, point: FaultPoint) -> Option<DeviceError> {
        let mut state = self.0.borrow_mut();
        let idx = state.faults.iter().position(|(p, _)| *p == point)?;
        Some(state.faults.remove(idx).1)
    }

    fn record(&self, event: DeviceEvent) {
        self.0.borrow_mut().events.push(event);
    }

    fn allocate_id(&self) -> BufferId {
        let mut state = self.0.borrow_mut();
        state.next_buffer += 1;
        BufferId(state.next_buffer)
    }

    fn commit(&self, id: BufferId, vertices: &[Vertex]) {
        self.0.borrow_mut().contents.insert(id, vertices.to_vec());
    }
}

/// Fake device: validates calls like the real one and journals their effects.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    commands: CommandList,
    journal: Journal,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }
}

impl Drop for RecordingDevice {
    fn drop(&mut self) {
        self.journal.record(DeviceEvent::ReleaseDevice);
    }
}

impl GraphicsDevice for RecordingDevice {
    type VertexBuffer = RecordedBuffer;

    fn command_list(&mut self) -> &mut CommandList {
        &mut self.commands
    }

    fn set_render_states(&mut self, states: RenderStates) {
        self.journal.record(DeviceEvent::SetRenderStates(states));
    }

    fn create_vertex_buffer(
        &mut self,
        vertex_count: u32,
        format: VertexFormat,
    ) -> Result<RecordedBuffer, DeviceError> {
        if let Some(err) = self.journal.take_fault(FaultPoint::CreateBuffer) {
            return Err(err);
        }
        if format != Vertex::FORMAT {
            return Err(DeviceError::UnsupportedFormat(format));
        }
        if vertex_count == 0 {
            return Err(DeviceError::InvalidCall("zero-sized vertex buffer"));
        }

        let id = self.journal.allocate_id();
        self.journal.record(DeviceEvent::CreateBuffer { id, vertex_count });
        self.journal.commit(id, &vec![Vertex::zeroed(); vertex_count as usize]);

        Ok(RecordedBuffer {
            id,
            format,
            mapped: vec![Vertex::zeroed(); vertex_count as usize],
            locked: false,
            journal: self.journal.clone(),
        })
    }

    fn begin_scene(&mut self) -> Result<(), DeviceError> {
        if let Some(err) = self.journal.take_fault(FaultPoint::BeginScene) {
            return Err(err);
        }
        self.commands.begin_scene()
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        let commands = self.commands.finish();
        if let Some(err) = self.journal.take_fault(FaultPoint::Present) {
            return Err(err);
        }
        self.journal.record(DeviceEvent::Frame(commands));
        Ok(())
    }
}

/// Vertex buffer owned by a [`RecordingDevice`].
#[derive(Debug)]
pub struct RecordedBuffer {
    id: BufferId,
    format: VertexFormat,
    mapped: Vec<Vertex>,
    locked: bool,
    journal: Journal,
}

impl VertexBufferAccess for RecordedBuffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn vertex_count(&self) -> u32 {
        self.mapped.len() as u32
    }

    fn format(&self) -> VertexFormat {
        self.format
    }

    fn lock(&mut self) -> Result<(), DeviceError> {
        if self.locked {
            return Err(DeviceError::AlreadyLocked);
        }
        if let Some(err) = self.journal.take_fault(FaultPoint::Lock) {
            return Err(err);
        }
        self.locked = true;
        self.journal.record(DeviceEvent::Lock(self.id));
        Ok(())
    }

    fn locked_mut(&mut self) -> Option<&mut [Vertex]> {
        self.locked.then_some(self.mapped.as_mut_slice())
    }

    fn unlock(&mut self) {
        if !self.locked {
            return;
        }
        self.locked = false;
        self.journal.commit(self.id, &self.mapped);
        self.journal.record(DeviceEvent::Unlock(self.id));
    }
}

impl Drop for RecordedBuffer {
    fn drop(&mut self) {
        self.journal.record(DeviceEvent::ReleaseBuffer(self.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{allocate_and_fill, upload_vertices, BufferLock};
    use crate::geometry::TRIANGLE;

    #[test]
    fn allocate_and_fill_sizes_buffer_to_vertices() {
        let mut device = RecordingDevice::new();
        let journal = device.journal();
        let buffer = allocate_and_fill(&mut device, &TRIANGLE).unwrap();

        assert_eq!(buffer.vertex_count(), 3);
        assert_eq!(journal.device_contents(buffer.id()).unwrap(), TRIANGLE.to_vec());
        assert_eq!(
            &journal.events()[..3],
            &[
                DeviceEvent::CreateBuffer { id: buffer.id(), vertex_count: 3 },
                DeviceEvent::Lock(buffer.id()),
                DeviceEvent::Unlock(buffer.id()),
            ]
        );
    }

    #[test]
    fn writes_are_invisible_until_unlock() {
        let mut device = RecordingDevice::new();
        let journal = device.journal();
        let mut buffer = device.create_vertex_buffer(3, Vertex::FORMAT).unwrap();
        let id = buffer.id();

        {
            let mut lock = BufferLock::acquire(&mut buffer).unwrap();
            lock.write(&TRIANGLE).unwrap();
            assert_eq!(journal.device_contents(id).unwrap(), vec![Vertex::zeroed(); 3]);
        }
        assert_eq!(journal.device_contents(id).unwrap(), TRIANGLE.to_vec());
    }

    #[test]
    fn guard_unlocks_on_error_path() {
        let mut device = RecordingDevice::new();
        let journal = device.journal();
        let mut buffer = device.create_vertex_buffer(3, Vertex::FORMAT).unwrap();

        let too_many = [TRIANGLE[0]; 4];
        assert!(matches!(
            upload_vertices(&mut buffer, &too_many),
            Err(DeviceError::BufferOverrun { .. })
        ));
        assert_eq!(journal.count(|e| matches!(e, DeviceEvent::Unlock(_))), 1);
        // Lock is free again.
        upload_vertices(&mut buffer, &TRIANGLE).unwrap();
    }

    #[test]
    fn double_lock_is_rejected() {
        let mut device = RecordingDevice::new();
        let mut buffer = device.create_vertex_buffer(3, Vertex::FORMAT).unwrap();
        buffer.lock().unwrap();
        assert_eq!(buffer.lock(), Err(DeviceError::AlreadyLocked));
        buffer.unlock();
    }

    #[test]
    fn upload_of_same_data_is_idempotent() {
        let mut device = RecordingDevice::new();
        let journal = device.journal();
        let mut buffer = allocate_and_fill(&mut device, &TRIANGLE).unwrap();

        let first = journal.device_contents(buffer.id()).unwrap();
        upload_vertices(&mut buffer, &TRIANGLE).unwrap();
        upload_vertices(&mut buffer, &TRIANGLE).unwrap();
        assert_eq!(journal.device_contents(buffer.id()).unwrap(), first);
    }

    #[test]
    fn injected_lock_fault_fails_once() {
        let mut device = RecordingDevice::new();
        let journal = device.journal();
        let mut buffer = device.create_vertex_buffer(3, Vertex::FORMAT).unwrap();

        journal.inject(FaultPoint::Lock, DeviceError::OutOfMemory);
        assert_eq!(upload_vertices(&mut buffer, &TRIANGLE), Err(DeviceError::OutOfMemory));
        assert!(upload_vertices(&mut buffer, &TRIANGLE).is_ok());
    }

    #[test]
    fn rejects_unsupported_format() {
        let mut device = RecordingDevice::new();
        assert!(matches!(
            device.create_vertex_buffer(3, VertexFormat::XYZ),
            Err(DeviceError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn failed_present_is_not_journaled() {
        let mut device = RecordingDevice::new();
        let journal = device.journal();
        journal.inject(FaultPoint::Present, DeviceError::SurfaceTimeout);

        assert_eq!(device.present(), Err(DeviceError::SurfaceTimeout));
        assert!(journal.frames().is_empty());
        device.present().unwrap();
        assert_eq!(journal.frames(), vec![vec![RenderCommand::Present]]);
    }

    #[test]
    fn released_buffer_can_no_longer_be_drawn() {
        let mut device = RecordingDevice::new();
        let journal = device.journal();
        let buffer = allocate_and_fill(&mut device, &TRIANGLE).unwrap();
        let id = buffer.id();

        device.set_stream_source(&buffer, Vertex::STRIDE).unwrap();
        device.release_vertex_buffer(buffer);
        assert!(journal.events().contains(&DeviceEvent::ReleaseBuffer(id)));

        device.begin_scene().unwrap();
        device.set_vertex_format(Vertex::FORMAT).unwrap();
        assert_eq!(
            device.draw_primitive(crate::geometry::PrimitiveTopology::TriangleStrip, 0, 1),
            Err(DeviceError::InvalidCall("draw without a stream source"))
        );
    }

    #[test]
    fn drop_releases_each_handle_once() {
        let journal;
        {
            let mut device = RecordingDevice::new();
            journal = device.journal();
            let _buffer = device.create_vertex_buffer(3, Vertex::FORMAT).unwrap();
        }
        assert_eq!(journal.count(|e| matches!(e, DeviceEvent::ReleaseBuffer(_))), 1);
        assert_eq!(journal.count(|e| matches!(e, DeviceEvent::ReleaseDevice)), 1);
    }
}
