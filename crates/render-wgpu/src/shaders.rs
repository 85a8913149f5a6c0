/// WGSL for the textured, lit mesh.
///
/// `swap` exchanges Y and Z before any other transform. `light` doubles as
/// the view-space light direction and the point the view vector is measured
/// from. `display` selects the texture over the depth colour.
pub const MESH_SHADER: &str = r#"
struct MeshUniforms {
    mvp: mat4x4<f32>,
    mv: mat4x4<f32>,
    swap: mat4x4<f32>,
    nt: mat3x3<f32>,
    light: vec3<f32>,
    alpha: f32,
    display: u32,
};

@group(0) @binding(0)
var<uniform> u: MeshUniforms;
@group(0) @binding(1)
var tex: texture_2d<f32>;
@group(0) @binding(2)
var tex_sampler: sampler;

struct VertexInput {
    @location(0) pos: vec3<f32>,
    @location(1) txc: vec2<f32>,
    @location(2) nrm: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) view: vec3<f32>,
    @location(1) vert_norm: vec3<f32>,
    @location(2) tex_coord: vec2<f32>,
};

@vertex
fn vs_mesh(in: VertexInput) -> VertexOutput {
    let p = u.swap * vec4<f32>(in.pos, 1.0);

    var out: VertexOutput;
    out.clip_position = u.mvp * p;
    out.view = u.light - (u.mv * p).xyz;
    out.vert_norm = u.nt * in.nrm;
    out.tex_coord = in.txc;
    return out;
}

@fragment
fn fs_mesh(in: VertexOutput) -> @location(0) vec4<f32> {
    let w = normalize(u.light);
    let n = normalize(in.vert_norm);
    let v = normalize(in.view);

    let diffuse = max(dot(n, w), 0.0);
    let h = normalize(w + v);
    let specular = pow(abs(dot(n, h)), u.alpha);

    // Sampled unconditionally: implicit-derivative sampling needs uniform control flow.
    let texel = textureSample(tex, tex_sampler, vec2<f32>(in.tex_coord.x, 1.0 - in.tex_coord.y));
    let z = in.clip_position.z;
    var base = vec4<f32>(1.0, z * z, 0.0, 1.0);
    if (u.display != 0u) {
        base = texel;
    }
    return vec4<f32>(base.rgb * diffuse + vec3<f32>(specular), base.a);
}
"#;

/// WGSL for the full-screen sphere ray tracer.
pub const RAYTRACE_SHADER: &str = r#"
const BIAS: f32 = 1e-5;
const MAX_BOUNCES: u32 = 64u;

const ENV_SOLID: u32 = 0u;
const ENV_GRADIENT: u32 = 1u;

struct Material {
    k_d: vec3<f32>,
    n: f32,
    k_s: vec3<f32>,
};

struct Sphere {
    center: vec3<f32>,
    radius: f32,
    mtl: Material,
};

struct Light {
    position: vec3<f32>,
    intensity: vec3<f32>,
};

struct Params {
    eye: vec3<f32>,
    bounce_limit: u32,
    forward: vec3<f32>,
    tan_half_fov: f32,
    right: vec3<f32>,
    aspect: f32,
    up: vec3<f32>,
    env_kind: u32,
    env_a: vec3<f32>,
    num_spheres: u32,
    env_b: vec3<f32>,
    num_lights: u32,
};

@group(0) @binding(0)
var<uniform> params: Params;
@group(0) @binding(1)
var<storage, read> spheres: array<Sphere>;
@group(0) @binding(2)
var<storage, read> lights: array<Light>;
@group(0) @binding(3)
var env_map: texture_cube<f32>;
@group(0) @binding(4)
var env_sampler: sampler;

struct Ray {
    pos: vec3<f32>,
    dir: vec3<f32>,
};

struct HitInfo {
    found: bool,
    t: f32,
    position: vec3<f32>,
    normal: vec3<f32>,
    mtl: Material,
};

fn intersect_ray(ray: Ray) -> HitInfo {
    var hit: HitInfo;
    hit.found = false;
    hit.t = 1e30;
    for (var i = 0u; i < params.num_spheres; i++) {
        let s = spheres[i];
        let oc = ray.pos - s.center;
        let a = dot(ray.dir, ray.dir);
        let b = 2.0 * dot(ray.dir, oc);
        let c = dot(oc, oc) - s.radius * s.radius;
        let disc = b * b - 4.0 * a * c;
        if (disc < 0.0) {
            continue;
        }
        let t = -(b + sqrt(disc)) / (2.0 * a);
        if (t > BIAS && t < hit.t) {
            hit.found = true;
            hit.t = t;
            hit.position = ray.pos + t * ray.dir;
            hit.normal = normalize(hit.position - s.center);
            hit.mtl = s.mtl;
        }
    }
    return hit;
}

fn environment(dir: vec3<f32>) -> vec3<f32> {
    // Scenes are Z-up, the cube map is Y-up.
    let d = dir.xzy;
    if (params.env_kind == ENV_SOLID) {
        return params.env_a;
    }
    if (params.env_kind == ENV_GRADIENT) {
        return mix(params.env_a, params.env_b, max(normalize(d).y, 0.0));
    }
    return textureSampleLevel(env_map, env_sampler, d, 0.0).rgb;
}

fn shade(mtl: Material, position: vec3<f32>, normal: vec3<f32>, view: vec3<f32>) -> vec3<f32> {
    let v = normalize(view);
    var color = vec3<f32>(0.0);
    for (var i = 0u; i < params.num_lights; i++) {
        let light = lights[i];
        var shadow: Ray;
        shadow.pos = position;
        shadow.dir = normalize(light.position - position);
        if (intersect_ray(shadow).found) {
            continue;
        }
        let h = normalize(shadow.dir + v);
        color += mtl.k_d * light.intensity * max(0.0, dot(normal, shadow.dir));
        color += mtl.k_s * light.intensity * pow(max(0.0, dot(normal, h)), mtl.n);
    }
    return color;
}

fn ray_tracer(ray: Ray) -> vec4<f32> {
    var hit = intersect_ray(ray);
    if (!hit.found) {
        return vec4<f32>(environment(ray.dir), 0.0);
    }

    var view = normalize(-ray.dir);
    var color = shade(hit.mtl, hit.position, hit.normal, view);
    var k_s = hit.mtl.k_s;

    let limit = min(params.bounce_limit, MAX_BOUNCES);
    for (var bounce = 0u; bounce < limit; bounce++) {
        if (hit.mtl.k_s.r + hit.mtl.k_s.g + hit.mtl.k_s.b <= 0.0) {
            break;
        }

        var r: Ray;
        r.pos = hit.position;
        r.dir = normalize(2.0 * dot(view, hit.normal) * hit.normal - view);

        let next = intersect_ray(r);
        if (!next.found) {
            color += k_s * environment(r.dir);
            break;
        }
        view = -r.dir;
        color += k_s * shade(next.mtl, next.position, next.normal, view);
        k_s *= next.mtl.k_s;
        hit = next;
    }
    return vec4<f32>(color, 1.0);
}

struct FullscreenOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) index: u32) -> FullscreenOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    let p = uv * 2.0 - 1.0;

    var out: FullscreenOutput;
    out.clip_position = vec4<f32>(p, 0.0, 1.0);
    out.ndc = p;
    return out;
}

@fragment
fn fs_raytrace(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let sx = in.ndc.x * params.aspect * params.tan_half_fov;
    let sy = in.ndc.y * params.tan_half_fov;

    var ray: Ray;
    ray.pos = params.eye;
    ray.dir = normalize(params.forward + sx * params.right + sy * params.up);
    return ray_tracer(ray);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_points_present() {
        assert!(MESH_SHADER.contains("fn vs_mesh"));
        assert!(MESH_SHADER.contains("fn fs_mesh"));
        assert!(RAYTRACE_SHADER.contains("fn vs_fullscreen"));
        assert!(RAYTRACE_SHADER.contains("fn fs_raytrace"));
    }

    #[test]
    fn tracer_bias_matches_cpu() {
        let line = format!("const BIAS: f32 = {:e};", lumen_raytrace::BIAS);
        assert!(RAYTRACE_SHADER.contains(&line), "missing {line}");
        let line = format!("const MAX_BOUNCES: u32 = {}u;", lumen_raytrace::MAX_BOUNCES);
        assert!(RAYTRACE_SHADER.contains(&line), "missing {line}");
    }
}
