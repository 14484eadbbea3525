use thiserror::Error;

/// Failures raised while building bodies or wiring them into a world.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("Invalid box dimensions: width {width}, height {height} (both must be positive)")]
    InvalidDimensions { width: f64, height: f64 },

    #[error("Invalid disc radius: {radius} (must be positive)")]
    InvalidRadius { radius: f64 },

    #[error("Unknown body group: {group}")]
    UnknownGroup { group: usize },
}

pub type PhysicsResult<T> = Result<T, PhysicsError>;
