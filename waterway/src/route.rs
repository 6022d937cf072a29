use log::warn;

use crate::error::{Endpoint, EndpointProblem, RouteError};
use crate::find::{PathFinder, PathFinderState, PathResult};
use crate::grid::{step_cost, Point, WaterGrid};

/// A water route, from start to target inclusive, with its total cost
pub type Route = PathResult<f64, Point>;

/// Cheapest water-only route between two water cells.
///
/// Moves go to any of the 8 neighbors, orthogonal moves cost 1 and diagonal moves cost
/// √2. A diagonal move may not pass between a land cell and its target. Returns `None`
/// when no such route exists. Both endpoints are expected to be water, see
/// [`plan_route`] for a checked entry point.
pub fn find_water_path(grid: &WaterGrid, start: Point, target: Point) -> Option<Route> {
    let (state, _) = PathFinder::new(grid, start, target).finish(grid);

    match state {
        PathFinderState::PathFound(route) => Some(route),
        _ => None,
    }
}

/// Validate both endpoints, then search.
///
/// A rejected endpoint is an error, while `Ok(None)` means both endpoints are fine
/// but they are not connected by water.
pub fn plan_route(
    grid: &WaterGrid,
    start: Point,
    target: Point,
) -> Result<Option<Route>, RouteError> {
    check_endpoint(grid, Endpoint::Start, start)?;
    check_endpoint(grid, Endpoint::Target, target)?;

    Ok(find_water_path(grid, start, target))
}

fn check_endpoint(grid: &WaterGrid, endpoint: Endpoint, point: Point) -> Result<(), RouteError> {
    let problem = match grid.get(point.x, point.y) {
        None => EndpointProblem::OutOfBounds,
        Some(cell) if !cell.is_water() => EndpointProblem::Land,
        Some(_) => return Ok(()),
    };

    warn!("rejected route {} {}: {}", endpoint, point, problem);

    Err(RouteError::InvalidEndpoint {
        endpoint,
        point,
        problem,
    })
}

/// Sum of the step costs along `path`, `None` if two consecutive points are not neighbors
pub fn path_cost(path: &[Point]) -> Option<f64> {
    path.windows(2)
        .map(|pair| step_cost(pair[0], pair[1]))
        .sum()
}
