//! Compute pipelines for the four flocking stages.

use wgpu::util::DeviceExt;

use crate::agent::{Agent, AgentStore};
use crate::error::GpuError;
use crate::flocking::{Forces, Stage};
use crate::uniforms::SimulationUniforms;

use super::WORKGROUP_SIZE;

/// Device-resident agents and the pipelines that advance them.
pub struct FlockingSimulator {
    agent_buffer: wgpu::Buffer,
    #[allow(dead_code)]
    forces_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    storage_bind_group: wgpu::BindGroup,
    pipelines: Vec<(Stage, wgpu::ComputePipeline)>,
    num_agents: u32,
}

impl FlockingSimulator {
    /// Check that `num_agents` fits the device: the agent buffer must be
    /// bindable as storage and one dispatch per stage must cover the flock.
    pub fn check_limits(num_agents: usize, limits: &wgpu::Limits) -> Result<(), GpuError> {
        let agent_bytes = (num_agents as u64).saturating_mul(Agent::SIZE as u64);
        let max_binding = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
        if agent_bytes > max_binding {
            return Err(GpuError::LimitExceeded {
                limit: "agent buffer bytes",
                requested: agent_bytes,
                max: max_binding,
            });
        }

        let workgroups = (num_agents as u64).div_ceil(u64::from(WORKGROUP_SIZE));
        let max_workgroups = u64::from(limits.max_compute_workgroups_per_dimension);
        if workgroups > max_workgroups {
            return Err(GpuError::LimitExceeded {
                limit: "workgroups per dispatch",
                requested: workgroups,
                max: max_workgroups,
            });
        }
        Ok(())
    }

    pub fn new(device: &wgpu::Device, store: &AgentStore, uniforms: &SimulationUniforms) -> Self {
        let num_agents = store.len() as u32;

        let agent_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Agent Buffer"),
            contents: store.as_bytes(),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
        });

        let forces_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Forces Buffer"),
            size: (store.len() * Forces::SIZE) as u64,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Simulation Uniform Buffer"),
            contents: bytemuck::bytes_of(uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Simulation Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Simulation Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let storage_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let storage_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Agent Storage Layout"),
            entries: &[storage_entry(0), storage_entry(1)],
        });

        let storage_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Agent Storage Bind Group"),
            layout: &storage_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: agent_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: forces_buffer.as_entire_binding(),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Flocking Shader"),
            source: wgpu::ShaderSource::Wgsl(COMPUTE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flocking Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &storage_layout],
            push_constant_ranges: &[],
        });

        let pipelines = Stage::ORDER
            .iter()
            .map(|&stage| {
                let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(stage.label()),
                    layout: Some(&pipeline_layout),
                    module: &shader,
                    entry_point: Some(stage.entry_point()),
                    compilation_options: Default::default(),
                    cache: None,
                });
                (stage, pipeline)
            })
            .collect();

        Self {
            agent_buffer,
            forces_buffer,
            uniform_buffer,
            uniform_bind_group,
            storage_bind_group,
            pipelines,
            num_agents,
        }
    }

    pub fn agent_buffer(&self) -> &wgpu::Buffer {
        &self.agent_buffer
    }

    pub fn num_agents(&self) -> u32 {
        self.num_agents
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &SimulationUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Enqueue all four stages in order. Each dispatch sees the previous
    /// stage's writes.
    pub fn advance(&self, pass: &mut wgpu::ComputePass<'_>) {
        let workgroups = self.num_agents.div_ceil(WORKGROUP_SIZE);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, &self.storage_bind_group, &[]);
        for (_, pipeline) in &self.pipelines {
            pass.set_pipeline(pipeline);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
    }
}

/// One invocation per agent; neighbor search is brute force.
pub const COMPUTE_SHADER: &str = r#"
struct Agent {
    position: vec4<f32>,
    velocity: vec4<f32>,
    data: vec4<f32>,
    color: vec4<f32>,
};

struct Forces {
    alignment: vec2<f32>,
    cohesion: vec2<f32>,
    separation: vec2<f32>,
    pad: vec2<f32>,
};

struct SimUniforms {
    world: vec4<f32>,
    weights: vec4<f32>,
    radii: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> sim: SimUniforms;

@group(1) @binding(0)
var<storage, read_write> agents: array<Agent>;

@group(1) @binding(1)
var<storage, read_write> forces: array<Forces>;

fn wrap_axis(x: f32, size: f32) -> f32 {
    if (size <= 0.0) {
        return x;
    }
    let half_size = size * 0.5;
    let shifted = x + half_size;
    let r = shifted - size * floor(shifted / size) - half_size;
    if (r >= half_size) {
        return -half_size;
    }
    return r;
}

@compute @workgroup_size(256)
fn alignment(@builtin(global_invocation_id) id: vec3<u32>) {
    let i = id.x;
    let n = arrayLength(&agents);
    if (i >= n) {
        return;
    }
    let p = agents[i].position.xy;
    var sum = vec2<f32>(0.0, 0.0);
    var count = 0u;
    for (var j = 0u; j < n; j = j + 1u) {
        if (j == i) {
            continue;
        }
        if (distance(p, agents[j].position.xy) < sim.radii.x) {
            sum = sum + agents[j].velocity.xy;
            count = count + 1u;
        }
    }
    var force = vec2<f32>(0.0, 0.0);
    if (count > 0u) {
        force = sum / f32(count) - agents[i].velocity.xy;
    }
    forces[i].alignment = force;
}

@compute @workgroup_size(256)
fn cohesion(@builtin(global_invocation_id) id: vec3<u32>) {
    let i = id.x;
    let n = arrayLength(&agents);
    if (i >= n) {
        return;
    }
    let p = agents[i].position.xy;
    var sum = vec2<f32>(0.0, 0.0);
    var count = 0u;
    for (var j = 0u; j < n; j = j + 1u) {
        if (j == i) {
            continue;
        }
        if (distance(p, agents[j].position.xy) < sim.radii.y) {
            sum = sum + agents[j].position.xy;
            count = count + 1u;
        }
    }
    var force = vec2<f32>(0.0, 0.0);
    if (count > 0u) {
        force = sum / f32(count) - p;
    }
    forces[i].cohesion = force;
}

@compute @workgroup_size(256)
fn separation(@builtin(global_invocation_id) id: vec3<u32>) {
    let i = id.x;
    let n = arrayLength(&agents);
    if (i >= n) {
        return;
    }
    let p = agents[i].position.xy;
    let radius = sim.radii.z;
    var force = vec2<f32>(0.0, 0.0);
    for (var j = 0u; j < n; j = j + 1u) {
        if (j == i) {
            continue;
        }
        let away = p - agents[j].position.xy;
        let d = length(away);
        if (d > 0.0 && d < radius) {
            force = force + away / d * ((radius - d) / radius);
        }
    }
    forces[i].separation = force;
}

@compute @workgroup_size(256)
fn update(@builtin(global_invocation_id) id: vec3<u32>) {
    let i = id.x;
    if (i >= arrayLength(&agents)) {
        return;
    }
    let dt = sim.world.z;
    let max_speed = sim.world.w;
    let f = forces[i];
    let steer = f.alignment * sim.weights.x + f.cohesion * sim.weights.y + f.separation * sim.weights.z;

    var v = agents[i].velocity.xy + steer * dt;
    let speed = length(v);
    if (max_speed > 0.0 && speed > max_speed) {
        v = v * (max_speed / speed);
    }

    let moved = agents[i].position.xy + v * dt;
    let p = vec2<f32>(wrap_axis(moved.x, sim.world.x), wrap_axis(moved.y, sim.world.y));

    agents[i].velocity = vec4<f32>(v, agents[i].velocity.zw);
    agents[i].position = vec4<f32>(p, agents[i].position.zw);
    if (dot(v, v) > 0.0) {
        agents[i].data.x = atan2(v.x, v.y);
    }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::validate_wgsl;

    #[test]
    fn test_compute_shader_validates() {
        validate_wgsl(COMPUTE_SHADER).unwrap();
    }

    #[test]
    fn test_every_stage_has_an_entry_point() {
        for stage in Stage::ORDER {
            let decl = format!("fn {}(", stage.entry_point());
            assert!(COMPUTE_SHADER.contains(&decl), "missing {}", decl);
        }
    }

    #[test]
    fn test_limits_reject_oversized_agent_buffer() {
        let limits = wgpu::Limits::default();
        let max_agents = limits.max_storage_buffer_binding_size as usize / Agent::SIZE;
        assert!(FlockingSimulator::check_limits(max_agents, &limits).is_ok());

        let err = FlockingSimulator::check_limits(max_agents + 1, &limits).unwrap_err();
        assert!(matches!(
            err,
            GpuError::LimitExceeded { limit: "agent buffer bytes", .. }
        ));
    }

    #[test]
    fn test_limits_reject_too_many_workgroups() {
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: u32::MAX,
            max_buffer_size: u64::MAX,
            max_compute_workgroups_per_dimension: 4,
            ..wgpu::Limits::default()
        };
        assert!(FlockingSimulator::check_limits(4 * WORKGROUP_SIZE as usize, &limits).is_ok());
        let err = FlockingSimulator::check_limits(4 * WORKGROUP_SIZE as usize + 1, &limits).unwrap_err();
        assert!(matches!(
            err,
            GpuError::LimitExceeded { limit: "workgroups per dispatch", requested: 5, max: 4 }
        ));
    }

    #[test]
    fn test_workgroup_size_matches_shader() {
        let decl = format!("@workgroup_size({})", WORKGROUP_SIZE);
        assert_eq!(COMPUTE_SHADER.matches(&decl).count(), Stage::ORDER.len());
    }
}
