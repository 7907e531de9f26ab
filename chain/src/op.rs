use {
    crate::pose::Pose,
    nalgebra as na,
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

/// World axis an op acts along or around.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'x' => Some(Axis::X),
            'y' => Some(Axis::Y),
            'z' => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }

    pub fn unit(self) -> na::Unit<na::Vector3<f32>> {
        match self {
            Axis::X => na::Vector3::x_axis(),
            Axis::Y => na::Vector3::y_axis(),
            Axis::Z => na::Vector3::z_axis(),
        }
    }
}

/// Single rigid transform in the chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Op {
    /// Displacement along world axis.
    Translate { axis: Axis, magnitude: f32 },

    /// Rotation around world axis, angle in degrees.
    Rotate { axis: Axis, degrees: f32 },
}

impl Op {
    pub fn translate(axis: Axis, magnitude: f32) -> Self {
        Op::Translate { axis, magnitude }
    }

    pub fn rotate(axis: Axis, degrees: f32) -> Self {
        Op::Rotate { axis, degrees }
    }

    pub fn to_iso(&self) -> na::Isometry3<f32> {
        match *self {
            Op::Translate { axis, magnitude } => na::Isometry3::from_parts(
                na::Translation3::from(axis.unit().into_inner() * magnitude),
                na::UnitQuaternion::identity(),
            ),
            Op::Rotate { axis, degrees } => na::Isometry3::from_parts(
                na::Translation3::identity(),
                na::UnitQuaternion::from_axis_angle(
                    &axis.unit(),
                    degrees.to_radians(),
                ),
            ),
        }
    }
}

/// Something that can be composed into a mesh pose.
pub trait PoseTransform {
    /// Composes this transform into `pose` and returns its matrix.
    fn apply(&self, pose: &mut Pose) -> na::Matrix4<f32>;
}

impl PoseTransform for Op {
    fn apply(&self, pose: &mut Pose) -> na::Matrix4<f32> {
        let iso = self.to_iso();
        match *self {
            Op::Translate { .. } => {
                pose.location += iso.translation.vector;
            }
            Op::Rotate { .. } => {
                pose.location = iso.rotation * pose.location;
                pose.rotate(&iso.rotation);
            }
        }
        iso.to_homogeneous()
    }
}

impl PoseTransform for na::Isometry3<f32> {
    fn apply(&self, pose: &mut Pose) -> na::Matrix4<f32> {
        pose.premultiply(self);
        self.to_homogeneous()
    }
}

impl Display for Op {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Op::Translate { axis, magnitude } => {
                write!(fmt, "t{}:{:.4}", axis.as_char(), magnitude)
            }
            Op::Rotate { axis, degrees } => {
                write!(fmt, "r{}:{:.4}", axis.as_char(), degrees)
            }
        }
    }
}

/// Reasons a single op token is rejected.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum OpTokenError {
    #[error("op-spec too short, need at least 3 chars, got {len}")]
    TooShort { len: usize },

    #[error("unknown operator code '{code}', expected 't' or 'r'")]
    UnknownOperator { code: char },

    #[error("unknown axis '{axis}', expected 'x', 'y' or 'z'")]
    UnknownAxis { axis: char },

    #[error("invalid numeric value '{value}'")]
    InvalidValue { value: String },
}

/// Parses `<code><axis><value>` token, e.g. `tx0.123` or `rz-90`.
pub fn parse_op(token: &str) -> Result<Op, OpTokenError> {
    let len = token.chars().count();
    if len < 3 {
        return Err(OpTokenError::TooShort { len });
    }

    let mut chars = token.char_indices();
    let (_, code) = chars.next().unwrap_or((0, '\0'));
    let (_, axis) = chars.next().unwrap_or((0, '\0'));
    let value = chars.next().map_or("", |(offset, _)| &token[offset..]);

    let make: fn(Axis, f32) -> Op = match code {
        't' => Op::translate,
        'r' => Op::rotate,
        code => return Err(OpTokenError::UnknownOperator { code }),
    };

    let axis =
        Axis::from_char(axis).ok_or(OpTokenError::UnknownAxis { axis })?;

    let value = value.trim();
    match value.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(make(axis, value)),
        _ => Err(OpTokenError::InvalidValue {
            value: value.to_owned(),
        }),
    }
}

impl FromStr for Op {
    type Err = OpTokenError;

    fn from_str(s: &str) -> Result<Self, OpTokenError> {
        parse_op(s)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::pose::RotationMode};

    fn assert_poses_close(a: &Pose, b: &Pose) {
        assert!(
            (a.location - b.location).norm() < 1e-5,
            "locations differ: {:?} vs {:?}",
            a.location,
            b.location
        );
        assert!(
            a.orientation().angle_to(&b.orientation()) < 1e-4,
            "orientations differ: {:?} vs {:?}",
            a.orientation(),
            b.orientation()
        );
    }

    #[test]
    fn parse_tokens() {
        assert_eq!(parse_op("tx1.0"), Ok(Op::translate(Axis::X, 1.0)));
        assert_eq!(parse_op("ry90.0"), Ok(Op::rotate(Axis::Y, 90.0)));
        assert_eq!(parse_op("ty-1.25"), Ok(Op::translate(Axis::Y, -1.25)));
        assert_eq!(parse_op("rz1e1"), Ok(Op::rotate(Axis::Z, 10.0)));
        assert_eq!("tz0.5".parse::<Op>(), Ok(Op::translate(Axis::Z, 0.5)));
    }

    #[test]
    fn reject_bad_tokens() {
        assert_eq!(parse_op("tz"), Err(OpTokenError::TooShort { len: 2 }));
        assert_eq!(parse_op(""), Err(OpTokenError::TooShort { len: 0 }));
        assert_eq!(
            parse_op("sx1.0"),
            Err(OpTokenError::UnknownOperator { code: 's' })
        );
        assert_eq!(
            parse_op("tw1.0"),
            Err(OpTokenError::UnknownAxis { axis: 'w' })
        );
        assert_eq!(
            parse_op("txabc"),
            Err(OpTokenError::InvalidValue {
                value: "abc".to_owned()
            })
        );
        assert!(matches!(
            parse_op("rxNaN"),
            Err(OpTokenError::InvalidValue { .. })
        ));
    }

    #[test]
    fn display_matches_token_shape() {
        assert_eq!(Op::translate(Axis::Z, 0.5).to_string(), "tz:0.5000");
        assert_eq!(Op::rotate(Axis::X, -45.0).to_string(), "rx:-45.0000");
    }

    #[test]
    fn translate_moves_location_only() {
        let mut pose = Pose::identity();
        let matrix = Op::translate(Axis::Y, 2.0).apply(&mut pose);
        assert_eq!(pose.location, na::Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(pose.orientation(), na::UnitQuaternion::identity());
        assert_eq!(matrix[(1, 3)], 2.0);
    }

    #[test]
    fn rotations_accumulate() {
        let mut pose = Pose::identity();
        let op = Op::rotate(Axis::Z, 90.0);
        op.apply(&mut pose);
        op.apply(&mut pose);

        let half_turn = na::UnitQuaternion::from_axis_angle(
            &na::Vector3::z_axis(),
            std::f32::consts::PI,
        );
        assert!(pose.orientation().angle_to(&half_turn) < 1e-4);
        assert!((pose.orientation().angle() - std::f32::consts::PI).abs() < 1e-4);
    }

    #[test]
    fn ops_do_not_commute() {
        let translate = Op::translate(Axis::X, 1.0);
        let rotate = Op::rotate(Axis::Z, 90.0);

        let mut forward = Pose::identity();
        translate.apply(&mut forward);
        rotate.apply(&mut forward);

        let mut reverse = Pose::identity();
        rotate.apply(&mut reverse);
        translate.apply(&mut reverse);

        assert!((forward.location - reverse.location).norm() > 0.5);
        assert!((forward.location - na::Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-5);
        assert!((reverse.location - na::Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn rotate_preserves_rotation_mode() {
        for &mode in &[
            RotationMode::EulerXyz,
            RotationMode::Quaternion,
            RotationMode::AxisAngle,
        ] {
            let mut pose = Pose::identity();
            pose.set_rotation_mode(mode);
            Op::rotate(Axis::X, 30.0).apply(&mut pose);
            Op::rotate(Axis::Y, -60.0).apply(&mut pose);
            assert_eq!(pose.rotation_mode(), mode);
        }
    }

    #[test]
    fn isometry_matches_op_replay() {
        let ops = [
            Op::translate(Axis::Z, 0.5),
            Op::rotate(Axis::X, 45.0),
            Op::translate(Axis::Y, -1.25),
            Op::rotate(Axis::Z, 30.0),
        ];

        let mut replayed = Pose::identity();
        let mut composed = na::Isometry3::identity();
        for op in &ops {
            op.apply(&mut replayed);
            composed = op.to_iso() * composed;
        }

        let mut once = Pose::identity();
        composed.apply(&mut once);
        assert_poses_close(&replayed, &once);
    }
}
