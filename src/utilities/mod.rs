pub mod math_helper;
pub mod matrix2x2;
pub mod matrix3x3;
pub mod quaternion;
pub mod vector2;
pub mod vector3;

pub use self::math_helper::Real;
pub use self::matrix2x2::Matrix2x2;
pub use self::matrix3x3::Matrix3x3;
pub use self::quaternion::Quaternion;
pub use self::vector2::Vector2;
pub use self::vector3::Vector3;
