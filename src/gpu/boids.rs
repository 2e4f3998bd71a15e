//! Instanced triangle sprites for the agents.
//!
//! The agent storage buffer is copied into a vertex buffer every frame
//! after the compute pass, and each agent becomes one triangle pointing
//! along its heading.

use crate::agent::Agent;

use super::camera::CAMERA_WGSL;

pub struct BoidRenderer {
    pipeline: wgpu::RenderPipeline,
    instance_buffer: wgpu::Buffer,
    num_agents: u32,
}

impl BoidRenderer {
    pub fn new(
        device: &wgpu::Device,
        camera_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
        num_agents: u32,
    ) -> Self {
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Boid Instance Buffer"),
            size: num_agents as u64 * Agent::SIZE as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Boid Shader"),
            source: wgpu::ShaderSource::Wgsl(boid_shader().into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Boid Pipeline Layout"),
            bind_group_layouts: &[camera_layout],
            push_constant_ranges: &[],
        });

        // position, data (heading, scale), color
        let attributes = [
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x4,
            },
            wgpu::VertexAttribute {
                offset: std::mem::offset_of!(Agent, data) as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
            wgpu::VertexAttribute {
                offset: std::mem::offset_of!(Agent, color) as wgpu::BufferAddress,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Boid Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: Agent::SIZE as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &attributes,
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
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            instance_buffer,
            num_agents,
        }
    }

    /// Snapshot the simulated agents for drawing.
    pub fn copy_instances(&self, encoder: &mut wgpu::CommandEncoder, agents: &wgpu::Buffer) {
        encoder.copy_buffer_to_buffer(agents, 0, &self.instance_buffer, 0, self.instance_buffer.size());
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, camera: &wgpu::BindGroup) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera, &[]);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        pass.draw(0..3, 0..self.num_agents);
    }
}

pub fn boid_shader() -> String {
    format!("{}{}", CAMERA_WGSL, BOID_SHADER)
}

const BOID_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec4<f32>,
    @location(1) data: vec4<f32>,
    @location(2) color: vec4<f32>,
) -> VertexOutput {
    // Unit triangle pointing along +y.
    var corners = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 0.5),
        vec2<f32>(-0.3, -0.5),
        vec2<f32>(0.3, -0.5),
    );
    let corner = corners[vertex_index] * data.y;

    // Heading h faces (sin h, cos h).
    let forward = vec2<f32>(sin(data.x), cos(data.x));
    let right = vec2<f32>(forward.y, -forward.x);
    let world = position.xy + right * corner.x + forward * corner.y;

    var out: VertexOutput;
    out.clip_position = camera.proj * camera.view * vec4<f32>(world, 0.0, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::validate_wgsl;

    #[test]
    fn test_boid_shader_validates() {
        validate_wgsl(&boid_shader()).unwrap();
    }
}
