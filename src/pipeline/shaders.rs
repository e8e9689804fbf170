//! WGSL sources
//!
//! Bind group layout shared by every shader:
//! - group 0: camera (binding 0) and directional lights (binding 1)
//! - group 1: object transform
//! - group 2: material

/// Lit material: the normal is recovered from the packed tangent frame
pub const LIT_SHADER: &str = r#"
struct CameraUniform {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
    near_far: vec4<f32>,
}

struct LightingUniform {
    directions: array<vec4<f32>, 4>,
    colors: array<vec4<f32>, 4>,
    count: vec4<u32>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
}

struct MaterialUniform {
    base_color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(0) @binding(1) var<uniform> lighting: LightingUniform;
@group(1) @binding(0) var<uniform> object: ObjectUniform;
@group(2) @binding(0) var<uniform> material: MaterialUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    // snorm16 quaternion, w < 0 flags a mirrored bitangent
    @location(1) tangent_frame: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
}

const PI: f32 = 3.14159265;

// Third column of the rotation matrix of q; unchanged when q is negated
fn frame_normal(q: vec4<f32>) -> vec3<f32> {
    return vec3<f32>(
        2.0 * (q.x * q.z + q.w * q.y),
        2.0 * (q.y * q.z - q.w * q.x),
        1.0 - 2.0 * (q.x * q.x + q.y * q.y),
    );
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;

    let world_pos = object.model * vec4<f32>(in.position, 1.0);
    out.clip_position = camera.view_proj * world_pos;

    let normal = frame_normal(normalize(in.tangent_frame));
    out.world_normal = (object.normal_matrix * vec4<f32>(normal, 0.0)).xyz;

    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(in.world_normal);

    var illuminance = vec3<f32>(0.0);
    for (var i = 0u; i < lighting.count.x; i = i + 1u) {
        let ndotl = max(dot(normal, lighting.directions[i].xyz), 0.0);
        illuminance += lighting.colors[i].rgb * ndotl;
    }

    // Lambertian diffuse
    let color = material.base_color.rgb / PI * illuminance;
    return vec4<f32>(color, 1.0);
}
"#;

/// Unlit material showing the per-vertex color
pub const VERTEX_COLOR_SHADER: &str = r#"
struct CameraUniform {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
    near_far: vec4<f32>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
}

struct MaterialUniform {
    base_color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(1) @binding(0) var<uniform> object: ObjectUniform;
@group(2) @binding(0) var<uniform> material: MaterialUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(2) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * object.model * vec4<f32>(in.position, 1.0);
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color * material.base_color;
}
"#;
