use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use waterway::{classify_grid_with, load_image, plan_route, Point, WaterHeuristic};

/// Classify an image into water and land cells and find water routes across it
#[derive(Parser, Debug)]
#[command(name = "waterway", version)]
struct Args {
    /// Image to classify
    image: PathBuf,

    /// Number of grid columns
    #[arg(long, default_value_t = 64)]
    columns: usize,

    /// Number of grid rows
    #[arg(long, default_value_t = 48)]
    rows: usize,

    /// Start cell, as x,y
    #[arg(long, requires = "to")]
    from: Option<Point>,

    /// Target cell, as x,y
    #[arg(long, requires = "from")]
    to: Option<Point>,

    /// JSON file overriding the water classification thresholds
    #[arg(long)]
    heuristic: Option<PathBuf>,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let args = Args::parse();

    let heuristic = match &args.heuristic {
        Some(path) => WaterHeuristic::from_json_file(path)?,
        None => WaterHeuristic::default(),
    };

    let img = load_image(&args.image)
        .with_context(|| format!("could not load {}", args.image.display()))?;
    let grid = classify_grid_with(&img, args.columns, args.rows, &heuristic)?;

    let (Some(from), Some(to)) = (args.from, args.to) else {
        print!("{}", grid);
        println!(
            "{} of {} cells are water",
            grid.water_count(),
            grid.cells().len()
        );
        return Ok(());
    };

    match plan_route(&grid, from, to) {
        Ok(Some(route)) => {
            print!("{}", grid.render_route(&route.path));
            println!(
                "route from {} to {}: {} steps, cost {:.3}",
                from,
                to,
                route.path.len() - 1,
                route.total_cost
            );
        }
        Ok(None) => {
            print!("{}", grid);
            println!("no water route from {} to {}", from, to);
        }
        Err(err) => {
            print!("{}", grid);
            println!("cannot plan a route: {}", err);
        }
    }

    Ok(())
}
