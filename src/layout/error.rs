use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Invalid weight {weight} for item {index}: weights must be finite and non-negative")]
    InvalidWeight { index: usize, weight: f64 },

    #[error("Total weight overflows f64")]
    TotalOverflow,

    #[error("Too many items to lay out: {count}")]
    TooManyItems { count: usize },
}

pub type Result<T> = std::result::Result<T, LayoutError>;
