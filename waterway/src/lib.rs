pub mod classify;
mod error;
pub mod find;
pub mod grid;
pub mod route;

pub use classify::{classify_grid, classify_grid_with, decode_image, load_image, WaterHeuristic};
pub use error::{Endpoint, EndpointProblem, Error, RouteError};
pub use find::{MapStorage, MapTrait, PathFinder, PathFinderState, PathResult, Visited};
pub use grid::{Cell, Point, Rgb, Terrain, WaterGrid};
pub use route::{find_water_path, path_cost, plan_route, Route};
