use glam::{Mat4, Vec3, Vec4Swizzles};

const FOV_Y_RAD: f32 = 45.0 * std::f32::consts::PI / 180.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

/// Pitch stays strictly inside ±89° so the look-at basis never degenerates.
pub const PITCH_LIMIT_RAD: f32 = 89.0 * std::f32::consts::PI / 180.0;
// Largest pitch the clamp allows; 89° itself is excluded.
const MAX_PITCH_RAD: f32 = (89.0 - 1e-3) * std::f32::consts::PI / 180.0;
/// Closest the camera may get to its target.
pub const MIN_DISTANCE: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct Camera {
    // --- Orbital Parameters (Primary State) ---
    /// The point the camera orbits around.
    pub target: Vec3,
    /// Distance from the camera to the target.
    distance: f32,
    /// Rotation around the world Y axis (radians).
    yaw: f32,
    /// Elevation above the XZ plane (radians).
    pitch: f32,
    aspect: f32,

    initial_distance: f32,

    // --- Derived Properties (Updated on every mutation) ---
    view: Mat4,
    proj: Mat4,
    right: Vec3,
    up: Vec3,
}

impl Camera {
    /// Creates a camera looking at the origin from `distance` along +Z.
    pub fn new(width: u32, height: u32, distance: f32) -> Self {
        let distance = distance.max(MIN_DISTANCE);
        let mut camera = Self {
            target: Vec3::ZERO,
            distance,
            yaw: 0.0,
            pitch: 0.0,
            aspect: 1.0,
            initial_distance: distance,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            right: Vec3::X,
            up: Vec3::Y,
        };
        camera.set_aspect(width, height);
        camera.update_view();
        camera
    }

    /// Recomputes the projection for a new framebuffer size. A zero height is
    /// treated as one pixel.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
        self.proj = Mat4::perspective_rh(FOV_Y_RAD, self.aspect, Z_NEAR, Z_FAR);
    }

    /// Rotates around the target. Deltas are already scaled by the caller's
    /// sensitivity.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw -= delta_x;
        self.pitch = (self.pitch + delta_y).clamp(-MAX_PITCH_RAD, MAX_PITCH_RAD);
        self.update_view();
    }

    /// Moves toward the target for positive deltas.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta * 0.5).max(MIN_DISTANCE);
        self.update_view();
    }

    /// Returns to the initial orbit around the origin.
    pub fn reset(&mut self) {
        self.target = Vec3::ZERO;
        self.distance = self.initial_distance;
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.update_view();
    }

    /// Eye position reconstructed from the spherical parameters.
    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vec3::new(
                self.distance * cos_pitch * sin_yaw,
                self.distance * sin_pitch,
                self.distance * cos_pitch * cos_yaw,
            )
    }

    fn update_view(&mut self) {
        self.view = Mat4::look_at_rh(self.position(), self.target, Vec3::Y);

        // Billboard basis comes straight from the matrix used for rendering.
        self.right = self.view.row(0).xyz();
        self.up = self.view.row(1).xyz();
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.proj
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }
}
