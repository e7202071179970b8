//! Per-instance vertex streams: current position/value and morph-target
//! position/value, one GPU buffer each.

use crate::data::point_cloud::{Dirty, PointCloud};

/// Smallest allocation; wgpu rejects zero-sized vertex buffers.
const MIN_STREAM_BYTES: u64 = 64;

struct Stream {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: u64,
}

impl Stream {
    fn new(device: &wgpu::Device, label: &'static str) -> Self {
        Self {
            label,
            buffer: Self::allocate(device, label, MIN_STREAM_BYTES),
            capacity: MIN_STREAM_BYTES,
        }
    }

    fn allocate(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Writes `bytes` at offset 0, growing the buffer when it is too small.
    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        let len = bytes.len() as u64;
        if len > self.capacity {
            let capacity = len.next_power_of_two().max(MIN_STREAM_BYTES);
            log::debug!("Growing {} to {} bytes", self.label, capacity);
            self.buffer = Self::allocate(device, self.label, capacity);
            self.capacity = capacity;
        }
        if len > 0 {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
    }
}

pub struct InstanceBuffers {
    positions: Stream,
    values: Stream,
    next_positions: Stream,
    next_values: Stream,
    count: u32,
}

impl InstanceBuffers {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            positions: Stream::new(device, "Instance Positions"),
            values: Stream::new(device, "Instance Values"),
            next_positions: Stream::new(device, "Instance Next Positions"),
            next_values: Stream::new(device, "Instance Next Values"),
            count: 0,
        }
    }

    /// Rewrites the streams flagged in `dirty`. The instance count only
    /// changes with the current state.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        cloud: &PointCloud,
        dirty: Dirty,
    ) {
        if dirty.current {
            let current = cloud.current();
            self.positions
                .write(device, queue, bytemuck::cast_slice(&current.positions));
            self.values
                .write(device, queue, bytemuck::cast_slice(&current.values));
            self.count = cloud.render_count() as u32;
        }
        if dirty.next {
            let next = cloud.next();
            self.next_positions
                .write(device, queue, bytemuck::cast_slice(&next.positions));
            self.next_values
                .write(device, queue, bytemuck::cast_slice(&next.values));
        }
        if dirty.any() {
            log::debug!("Uploaded point data: {} instances", self.count);
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Binds the four streams to vertex slots 1..=4 (slot 0 is the quad).
    pub fn bind<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_vertex_buffer(1, self.positions.buffer.slice(..));
        pass.set_vertex_buffer(2, self.values.buffer.slice(..));
        pass.set_vertex_buffer(3, self.next_positions.buffer.slice(..));
        pass.set_vertex_buffer(4, self.next_values.buffer.slice(..));
    }
}

/// Vertex layouts shared by the display and picking pipelines: the quad
/// corner stream followed by the four instance streams.
pub fn point_vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 5] {
    const CORNER: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
    const POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
    const VALUE: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32];
    const NEXT_POSITION: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32x3];
    const NEXT_VALUE: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![4 => Float32];

    let stream = |stride: usize, step_mode, attributes: &'static [wgpu::VertexAttribute]| {
        wgpu::VertexBufferLayout {
            array_stride: stride as u64,
            step_mode,
            attributes,
        }
    };

    [
        stream(std::mem::size_of::<[f32; 2]>(), wgpu::VertexStepMode::Vertex, &CORNER),
        stream(std::mem::size_of::<[f32; 3]>(), wgpu::VertexStepMode::Instance, &POSITION),
        stream(std::mem::size_of::<f32>(), wgpu::VertexStepMode::Instance, &VALUE),
        stream(std::mem::size_of::<[f32; 3]>(), wgpu::VertexStepMode::Instance, &NEXT_POSITION),
        stream(std::mem::size_of::<f32>(), wgpu::VertexStepMode::Instance, &NEXT_VALUE),
    ]
}
