use crate::grid::Point;
use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The image could not be read or decoded
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("grid dimensions must be positive, got {columns}x{rows}")]
    InvalidDimensions { columns: usize, rows: usize },

    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("invalid grid layout: {0}")]
    Layout(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Endpoint {
    Start,
    Target,
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Endpoint::Start => "start",
                Endpoint::Target => "target",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EndpointProblem {
    OutOfBounds,
    Land,
}

impl Display for EndpointProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EndpointProblem::OutOfBounds => "is outside the grid",
                EndpointProblem::Land => "is land",
            }
        )
    }
}

/// Rejection of a route request before any search was started
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("{endpoint} {point} {problem}, routes must start and end on water")]
    InvalidEndpoint {
        endpoint: Endpoint,
        point: Point,
        problem: EndpointProblem,
    },
}
