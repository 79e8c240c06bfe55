//! Fixed-width math types shared by the asset records

/// Two-component float vector
pub type Vec2 = [f32; 2];

/// Three-component float vector
pub type Vec3 = [f32; 3];

/// Column-major 4x4 float matrix
pub type Mat4 = [f32; 16];

/// 4x4 identity matrix
pub const IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];
