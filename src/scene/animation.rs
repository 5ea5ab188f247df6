//! Time-dependent transforms: camera orbit, train and drones.
//!
//! Everything here is a pure function of the elapsed time, so a frame can be
//! recomputed from scratch and tests can sample any instant.

use cgmath::{Point3, Quaternion, Rad, Rotation3, Vector3};
use instant::Instant;

use crate::scene::builder::{DroneRig, SceneDescriptor, TrainRig};
use crate::scene::camera::Camera;
use crate::scene::instance::Instance;
use crate::scene::params::{CameraParams, DroneParams};

/// Monotonic elapsed-time source started at mount.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    last: f32,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            last: 0.0,
        }
    }

    /// Seconds since start. Never goes backwards.
    pub fn elapsed(&mut self) -> f32 {
        let now = self.start.elapsed().as_secs_f32();
        self.last = self.last.max(now);
        self.last
    }
}

/// Fraction of a lap completed after `elapsed` seconds, always in `[0, 1)`.
pub fn progress(elapsed: f32, speed: f32) -> f32 {
    let p = (elapsed * speed).rem_euclid(1.0);
    // rem_euclid rounds up to exactly 1.0 for tiny negative products
    if p >= 1.0 { 0.0 } else { p }
}

pub fn orbit_camera(params: &CameraParams, elapsed: f32) -> Camera {
    let angle = elapsed * params.orbit_speed;
    let position = Point3::new(
        angle.cos() * params.orbit_radius,
        params.orbit_height,
        angle.sin() * params.orbit_radius,
    );
    Camera::new(position, params.target)
}

/// Places the train on the track and turns its long (z) axis along the tangent.
pub fn train_transform(rig: &TrainRig, rest: &Instance, elapsed: f32) -> Instance {
    let u = progress(elapsed, rig.speed);
    let tangent = rig.path.tangent_at(u);
    let yaw = tangent.x.atan2(tangent.z);
    Instance::at(rig.path.point_at(u))
        .with_rotation(Quaternion::from_angle_y(Rad(yaw)))
        .with_scale(rest.scale)
}

pub fn drone_transform(rig: &DroneRig, params: &DroneParams, rest: &Instance, elapsed: f32) -> Instance {
    let bob = (elapsed * params.bob_speed + rig.phase).sin() * params.bob_amplitude;
    let spin = elapsed * params.spin_speed + rig.phase;
    Instance::at(rig.base + Vector3::new(0.0, bob, 0.0))
        .with_rotation(Quaternion::from_angle_y(Rad(spin)))
        .with_scale(rest.scale)
}

/// Moves every animated node of `scene` to its pose at `elapsed` and returns
/// the camera for that instant.
pub fn advance(scene: &mut SceneDescriptor, elapsed: f32) -> Camera {
    if let Some(train) = &scene.train {
        if let Some(node) = scene.nodes.get(train.node) {
            let moved = train_transform(train, &node.transform, elapsed);
            scene.nodes[train.node].transform = moved;
        }
    }
    if let Some(params) = &scene.params.drones {
        for rig in &scene.drones {
            if let Some(node) = scene.nodes.get_mut(rig.node) {
                node.transform = drone_transform(rig, params, &node.transform, elapsed);
            }
        }
    }
    orbit_camera(&scene.params.camera, elapsed)
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Rotation};

    use super::*;
    use crate::scene::builder::{self, NodeKind};
    use crate::scene::params::SceneParams;

    #[test]
    fn progress_stays_in_unit_interval() {
        for t in [0.0, 0.5, 24.999, 25.0, 1e6, -3.0, -1e-9] {
            let p = progress(t, 0.04);
            assert!((0.0..1.0).contains(&p), "{t} -> {p}");
        }
        assert!((progress(12.5, 0.04) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn camera_orbits_at_fixed_radius() {
        let params = SceneParams::pixel().camera;
        let start = orbit_camera(&params, 0.0);
        assert_eq!(start.position, Point3::new(8.0, 0.0, 0.0));
        let later = orbit_camera(&params, 3.0);
        let flat = Vector3::new(later.position.x, 0.0, later.position.z);
        assert!((flat.magnitude() - 8.0).abs() < 1e-4);
        assert_eq!(later.target, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn train_faces_along_the_track() {
        let mut scene = builder::build(&SceneParams::neon().with_seed(3)).unwrap();
        let rig = scene.train.clone().unwrap();
        advance(&mut scene, 7.0);
        let transform = scene.nodes[rig.node].transform;
        let u = progress(7.0, rig.speed);
        assert!((transform.position - rig.path.point_at(u)).magnitude() < 1e-4);
        let heading = transform.rotation.rotate_vector(Vector3::unit_z());
        assert!(heading.dot(rig.path.tangent_at(u)) > 0.99);
    }

    #[test]
    fn drones_bob_around_their_base() {
        let mut scene = builder::build(&SceneParams::neon().with_seed(5)).unwrap();
        let amplitude = scene.params.drones.as_ref().unwrap().bob_amplitude;
        let size = scene.params.drones.as_ref().unwrap().size;
        for t in [0.0, 0.7, 4.2] {
            advance(&mut scene, t);
            for rig in &scene.drones {
                let node = &scene.nodes[rig.node];
                assert_eq!(node.kind, NodeKind::Drone);
                assert!((node.transform.position.y - rig.base.y).abs() <= amplitude + 1e-5);
                assert!((node.transform.scale.x - size).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut clock = Clock::start();
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(b >= a);
    }
}
