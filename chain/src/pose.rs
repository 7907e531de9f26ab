use {
    nalgebra as na,
    serde::{Deserialize, Serialize},
};

/// Representation a pose currently exposes its rotation in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationMode {
    Quaternion,
    EulerXyz,
    AxisAngle,
}

impl Default for RotationMode {
    fn default() -> Self {
        RotationMode::EulerXyz
    }
}

/// Position and orientation of a mesh object.
///
/// Every representation has its own storage and only the one selected by
/// `mode` is authoritative. Switching modes converts the current rotation
/// into the new representation and leaves the others untouched.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub location: na::Vector3<f32>,
    mode: RotationMode,
    quaternion: na::UnitQuaternion<f32>,
    euler: na::Vector3<f32>,
    axis: na::Vector3<f32>,
    angle: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Pose::identity()
    }
}

impl Pose {
    pub fn identity() -> Self {
        Pose {
            location: na::Vector3::zeros(),
            mode: RotationMode::EulerXyz,
            quaternion: na::UnitQuaternion::identity(),
            euler: na::Vector3::zeros(),
            axis: na::Vector3::y(),
            angle: 0.0,
        }
    }

    pub fn from_iso(iso: &na::Isometry3<f32>, mode: RotationMode) -> Self {
        let mut pose = Pose::identity();
        pose.mode = mode;
        pose.location = iso.translation.vector;
        pose.set_orientation(iso.rotation);
        pose
    }

    pub fn rotation_mode(&self) -> RotationMode {
        self.mode
    }

    /// Switches rotation representation, converting the current rotation.
    pub fn set_rotation_mode(&mut self, mode: RotationMode) {
        if self.mode == mode {
            return;
        }
        let orientation = self.orientation();
        self.mode = mode;
        self.set_orientation(orientation);
    }

    /// Effective orientation, whatever the current mode is.
    pub fn orientation(&self) -> na::UnitQuaternion<f32> {
        match self.mode {
            RotationMode::Quaternion => self.quaternion,
            RotationMode::EulerXyz => na::UnitQuaternion::from_euler_angles(
                self.euler.x,
                self.euler.y,
                self.euler.z,
            ),
            RotationMode::AxisAngle => {
                match na::Unit::try_new(self.axis, f32::EPSILON) {
                    Some(axis) => {
                        na::UnitQuaternion::from_axis_angle(&axis, self.angle)
                    }
                    None => na::UnitQuaternion::identity(),
                }
            }
        }
    }

    /// Writes orientation into the storage of the current mode.
    pub fn set_orientation(&mut self, orientation: na::UnitQuaternion<f32>) {
        match self.mode {
            RotationMode::Quaternion => self.quaternion = orientation,
            RotationMode::EulerXyz => {
                let (roll, pitch, yaw) = orientation.euler_angles();
                self.euler = na::Vector3::new(roll, pitch, yaw);
            }
            RotationMode::AxisAngle => match orientation.axis_angle() {
                Some((axis, angle)) => {
                    self.axis = axis.into_inner();
                    self.angle = angle;
                }
                None => {
                    self.axis = na::Vector3::y();
                    self.angle = 0.0;
                }
            },
        }
    }

    /// Left-multiplies orientation by `delta`.
    ///
    /// Multiplication happens in quaternion mode, the mode flag is restored
    /// afterwards.
    pub fn rotate(&mut self, delta: &na::UnitQuaternion<f32>) {
        let old_mode = self.mode;
        self.set_rotation_mode(RotationMode::Quaternion);
        self.quaternion = delta * self.quaternion;
        self.set_rotation_mode(old_mode);
    }

    /// Applies world-frame isometry on the left: `pose' = iso * pose`.
    pub fn premultiply(&mut self, iso: &na::Isometry3<f32>) {
        self.location = iso.rotation * self.location + iso.translation.vector;
        self.rotate(&iso.rotation);
    }

    pub fn to_iso(&self) -> na::Isometry3<f32> {
        na::Isometry3::from_parts(
            na::Translation3::from(self.location),
            self.orientation(),
        )
    }

    pub fn to_homogeneous(&self) -> na::Matrix4<f32> {
        self.to_iso().to_homogeneous()
    }
}
