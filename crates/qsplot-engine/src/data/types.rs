//! Core data types for the engine, focused on GPU data representation.

/// Per-frame uniforms shared by the display and picking shaders.
/// Must match the layout of `Scene` in `points.wgsl` and `picking.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct SceneUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Billboard basis: row 0 of the view matrix.
    pub camera_right: [f32; 3],
    pub point_scale: f32,
    /// Billboard basis: row 1 of the view matrix.
    pub camera_up: [f32; 3],
    pub alpha: f32,
    /// Mapped color of the selected instance, computed on the host.
    pub selected_color: [f32; 3],
    pub morph_time: f32,
    pub color_mode: u32,
    pub selected_id: i32,
    pub has_selection: u32,
    pub filter_enabled: u32,
    pub filter_value: f32,
    pub filter_tolerance: f32,
    pub _pad: [f32; 2],
}

/// Vertex of the axis gizmo. Must match `gizmo.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct GizmoVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Uniform for the gizmo shader.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct GizmoUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Billboard corners in local space, drawn as a triangle strip.
pub const QUAD_CORNERS: [[f32; 2]; 4] = [[-0.5, 0.5], [-0.5, -0.5], [0.5, 0.5], [0.5, -0.5]];
pub const QUAD_VERTEX_COUNT: u32 = QUAD_CORNERS.len() as u32;

pub const AXIS_LENGTH: f32 = 6.0;

/// Three axis lines from the origin: X red, Y green, Z blue.
pub const GIZMO_AXES: [GizmoVertex; 6] = [
    GizmoVertex { position: [0.0, 0.0, 0.0], color: [1.0, 0.0, 0.0] },
    GizmoVertex { position: [AXIS_LENGTH, 0.0, 0.0], color: [1.0, 0.0, 0.0] },
    GizmoVertex { position: [0.0, 0.0, 0.0], color: [0.0, 1.0, 0.0] },
    GizmoVertex { position: [0.0, AXIS_LENGTH, 0.0], color: [0.0, 1.0, 0.0] },
    GizmoVertex { position: [0.0, 0.0, 0.0], color: [0.0, 0.0, 1.0] },
    GizmoVertex { position: [0.0, 0.0, AXIS_LENGTH], color: [0.0, 0.0, 1.0] },
];
