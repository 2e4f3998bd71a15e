//! Point and line renderers fed from [`PointBatch`](crate::batch::PointBatch)
//! and [`LineBatch`](crate::batch::LineBatch).

use crate::batch::ColorVertex;

use super::camera::CAMERA_WGSL;

/// Draws coloured vertices as points or line segments.
///
/// Vertices are uploaded once per frame with [`PrimitiveRenderer::prepare`];
/// [`PrimitiveRenderer::draw`] consumes them, so a second draw without a
/// new upload issues nothing.
pub struct PrimitiveRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    capacity: usize,
    pending: u32,
}

impl PrimitiveRenderer {
    pub fn points(
        device: &wgpu::Device,
        camera_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
        capacity: usize,
    ) -> Self {
        Self::new(device, camera_layout, format, capacity, wgpu::PrimitiveTopology::PointList, "Point")
    }

    /// `capacity` is in segments.
    pub fn lines(
        device: &wgpu::Device,
        camera_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
        capacity: usize,
    ) -> Self {
        Self::new(device, camera_layout, format, capacity * 2, wgpu::PrimitiveTopology::LineList, "Line")
    }

    fn new(
        device: &wgpu::Device,
        camera_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
        capacity: usize,
        topology: wgpu::PrimitiveTopology,
        label: &str,
    ) -> Self {
        let capacity = capacity.max(1);
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            size: (capacity * std::mem::size_of::<ColorVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} Shader", label)),
            source: wgpu::ShaderSource::Wgsl(primitive_shader().into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", label)),
            bind_group_layouts: &[camera_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Pipeline", label)),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ColorVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x3],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            vertex_buffer,
            capacity,
            pending: 0,
        }
    }

    /// Upload this frame's vertices. `None` leaves nothing to draw.
    pub fn prepare(&mut self, queue: &wgpu::Queue, vertices: Option<Vec<ColorVertex>>) {
        let Some(vertices) = vertices else {
            self.pending = 0;
            return;
        };
        let count = vertices.len().min(self.capacity);
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices[..count]));
        self.pending = count as u32;
    }

    /// Draw the uploaded vertices once. Returns whether anything was drawn.
    pub fn draw(&mut self, pass: &mut wgpu::RenderPass<'_>, camera: &wgpu::BindGroup) -> bool {
        if self.pending == 0 {
            return false;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..self.pending, 0..1);
        self.pending = 0;
        true
    }
}

pub fn primitive_shader() -> String {
    format!("{}{}", CAMERA_WGSL, PRIMITIVE_SHADER)
}

const PRIMITIVE_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) color: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.proj * camera.view * vec4<f32>(position, 0.0, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;
