use bevy::prelude::*;
use bevy::input::mouse::{MouseMotion, MouseWheel, MouseScrollUnit};
use bevy::input::Input;
use bevy_egui::EguiContexts;

pub struct ControllerPlugin;

impl Plugin for ControllerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, orbit_camera_system);
    }
}

pub const MIN_DISTANCE: f32 = 10.0;
pub const MAX_DISTANCE: f32 = 12_700.0;
/// 俯仰角限制, 避免越过极点
const PITCH_LIMIT: f32 = 1.54;
const ROTATE_SPEED: f32 = 0.005;
const ZOOM_STEP: f32 = 0.1;

/// 围绕目标点旋转的相机
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl OrbitCamera {
    pub fn from_eye(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let radius = offset.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        Self {
            target,
            radius,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / offset.length().max(f32::EPSILON)).asin(),
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + self.radius * Vec3::new(cp * sy, sp, cp * cy)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(self.target, Vec3::Y)
    }

    pub fn rotate(&mut self, delta: Vec2) {
        self.yaw -= delta.x * ROTATE_SPEED;
        self.pitch = (self.pitch + delta.y * ROTATE_SPEED).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// `steps` 为正时拉近
    pub fn zoom(&mut self, steps: f32) {
        let factor = (1.0 - ZOOM_STEP).powf(steps);
        self.radius = (self.radius * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

fn orbit_camera_system(
    mut contexts: EguiContexts,
    mouse_button: Res<Input<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut mouse_wheel: EventReader<MouseWheel>,
    mut cameras: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    // 面板占用鼠标时不操作相机
    if contexts.ctx_mut().wants_pointer_input() {
        mouse_motion.clear();
        mouse_wheel.clear();
        return;
    }

    let mut drag = Vec2::ZERO;
    if mouse_button.pressed(MouseButton::Left) {
        for event in mouse_motion.read() {
            drag += event.delta;
        }
    } else {
        mouse_motion.clear();
    }

    let mut scroll = 0.0;
    for event in mouse_wheel.read() {
        scroll += match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / 100.0,
        };
    }

    if drag == Vec2::ZERO && scroll == 0.0 {
        return;
    }

    for (mut orbit, mut transform) in &mut cameras {
        orbit.rotate(drag);
        orbit.zoom(scroll);
        *transform = orbit.transform();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_round_trips() {
        let eye = Vec3::new(0.0, 2000.0, 5000.0);
        let orbit = OrbitCamera::from_eye(eye, Vec3::ZERO);
        assert!((orbit.radius - eye.length()).abs() < 1e-2);
        assert!((orbit.eye() - eye).length() < 0.5);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut orbit = OrbitCamera::from_eye(Vec3::new(0.0, 2000.0, 5000.0), Vec3::ZERO);
        orbit.zoom(-100.0);
        assert_eq!(orbit.radius, MAX_DISTANCE);
        orbit.zoom(500.0);
        assert_eq!(orbit.radius, MIN_DISTANCE);
    }

    #[test]
    fn pitch_stays_off_the_poles() {
        let mut orbit = OrbitCamera::from_eye(Vec3::new(0.0, 0.0, 100.0), Vec3::ZERO);
        orbit.rotate(Vec2::new(0.0, 1.0e6));
        assert_eq!(orbit.pitch, PITCH_LIMIT);
        let t = orbit.transform();
        assert!(t.translation.is_finite());
    }
}
