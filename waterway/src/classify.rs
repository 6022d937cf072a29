use std::{fs, ops::Range, path::Path};

use anyhow::Context;
use image::{DynamicImage, GenericImageView, Rgba};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::grid::{Cell, Rgb, Terrain, WaterGrid};
use crate::Error;

/// Keeps the blue share finite for pure black cells
const EPSILON: f64 = 1e-6;

/// Thresholds deciding whether an average cell color looks like water.
///
/// A cell is water when blue dominates the color (`blue_share`), is clearly above both
/// red and green (`blue_delta`) and the color is not a washed out gray (`saturation`).
/// All three comparisons are strict.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterHeuristic {
    /// Minimum `b / (r + g + b)`
    pub min_blue_share: f64,
    /// Minimum `b - max(r, g)`, in channel units
    pub min_blue_delta: f64,
    /// Minimum `(max - min) / max` over the three channels
    pub min_saturation: f64,
}

impl Default for WaterHeuristic {
    fn default() -> Self {
        Self {
            min_blue_share: 0.38,
            min_blue_delta: 12.0,
            min_saturation: 0.15,
        }
    }
}

impl WaterHeuristic {
    /// Load thresholds from a JSON file, missing fields keep their default value
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not read heuristic file {}", path.display()))?;
        let heuristic = serde_json::from_str(&text)
            .with_context(|| format!("invalid heuristic file {}", path.display()))?;
        Ok(heuristic)
    }

    pub fn classify(&self, avg: &Rgb) -> Terrain {
        let total = avg.r + avg.g + avg.b + EPSILON;
        let blue_share = avg.b / total;

        let max = avg.max();
        let saturation = if max == 0.0 { 0.0 } else { (max - avg.min()) / max };

        let blue_delta = avg.b - avg.r.max(avg.g);

        if blue_share > self.min_blue_share
            && blue_delta > self.min_blue_delta
            && saturation > self.min_saturation
        {
            Terrain::Water
        } else {
            Terrain::Land
        }
    }
}

pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, Error> {
    Ok(image::open(path)?)
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, Error> {
    Ok(image::load_from_memory(bytes)?)
}

/// Classify an image into a `columns` x `rows` grid using the default [`WaterHeuristic`]
pub fn classify_grid<I>(image: &I, columns: usize, rows: usize) -> Result<WaterGrid, Error>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    classify_grid_with(image, columns, rows, &WaterHeuristic::default())
}

/// Classify an image into a `columns` x `rows` grid.
///
/// Cell `(col, row)` samples the pixels starting at `floor(col * width / columns)`,
/// `floor(row * height / rows)` with a size of `ceil(width / columns)` by
/// `ceil(height / rows)`. With sizes that do not divide evenly, neighboring cells share
/// a column or row of pixels.
pub fn classify_grid_with<I>(
    image: &I,
    columns: usize,
    rows: usize,
    heuristic: &WaterHeuristic,
) -> Result<WaterGrid, Error>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    if columns == 0 || rows == 0 {
        return Err(Error::InvalidDimensions { columns, rows });
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }

    let sample_width = (width as u64).div_ceil(columns as u64);
    let sample_height = (height as u64).div_ceil(rows as u64);

    let mut cells = Vec::with_capacity(columns * rows);

    for row in 0..rows {
        let y0 = row as u64 * height as u64 / rows as u64;
        let y1 = (y0 + sample_height).min(height as u64);

        for col in 0..columns {
            let x0 = col as u64 * width as u64 / columns as u64;
            let x1 = (x0 + sample_width).min(width as u64);

            let avg = average_color(image, x0 as u32..x1 as u32, y0 as u32..y1 as u32);

            cells.push(Cell {
                x: col,
                y: row,
                terrain: heuristic.classify(&avg),
                avg,
            });
        }
    }

    let grid = WaterGrid::from_cells(columns, rows, cells);

    debug!(
        "classified {}x{} image into {}x{} grid: {} water cells",
        width,
        height,
        columns,
        rows,
        grid.water_count()
    );

    Ok(grid)
}

/// Mean of the r, g and b channels over a non-empty pixel rectangle, alpha is ignored
fn average_color<I>(image: &I, xs: Range<u32>, ys: Range<u32>) -> Rgb
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let mut sum = [0u64; 3];
    let mut count = 0u64;

    for y in ys {
        for x in xs.clone() {
            let Rgba([r, g, b, _]) = image.get_pixel(x, y);
            sum[0] += r as u64;
            sum[1] += g as u64;
            sum[2] += b as u64;
            count += 1;
        }
    }

    let count = count.max(1) as f64;

    Rgb {
        r: sum[0] as f64 / count,
        g: sum[1] as f64 / count,
        b: sum[2] as f64 / count,
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use image::RgbaImage;
    use std::io::Cursor;

    const SEA: Rgba<u8> = Rgba([30, 70, 190, 255]);
    const FIELD: Rgba<u8> = Rgba([70, 150, 60, 255]);

    fn rgb(r: f64, g: f64, b: f64) -> Rgb {
        Rgb { r, g, b }
    }

    /// Left half sea, right half fields
    fn create_coast_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| if x < width / 2 { SEA } else { FIELD })
    }

    #[test]
    fn test_one_cell_per_coordinate() {
        let image = RgbaImage::from_fn(10, 7, |x, y| Rgba([(x * 25) as u8, (y * 36) as u8, 200, 255]));

        let grid = classify_grid(&image, 4, 3).unwrap();

        assert_eq!(grid.columns(), 4);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cells().len(), 12);
        for (i, cell) in grid.cells().iter().enumerate() {
            assert_eq!((cell.x, cell.y), (i % 4, i / 4));
            for channel in [cell.avg.r, cell.avg.g, cell.avg.b] {
                assert!((0.0..=255.0).contains(&channel));
            }
        }
    }

    #[test]
    fn test_classification_is_repeatable() {
        let image = RgbaImage::from_fn(33, 17, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) * 5 % 256) as u8, 255])
        });

        let first = classify_grid(&image, 6, 5).unwrap();
        let second = classify_grid(&image, 6, 5).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_coast() {
        let image = create_coast_image(40, 20);

        let grid = classify_grid(&image, 4, 2).unwrap();

        assert_eq!(grid.to_string(), "~~##\n~~##\n");
        assert_eq!(grid.get(0, 0).unwrap().avg, rgb(30.0, 70.0, 190.0));
    }

    #[test]
    fn test_accepts_dynamic_image() {
        let image = DynamicImage::ImageRgba8(create_coast_image(40, 20));

        let grid = classify_grid(&image, 2, 1).unwrap();
        assert_eq!(grid.to_string(), "~#\n");
    }

    #[test]
    fn test_alpha_is_ignored() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([30, 70, 190, 0]));

        let grid = classify_grid(&image, 1, 1).unwrap();
        assert!(grid.get(0, 0).unwrap().is_water());
    }

    #[test]
    fn test_sample_rectangles_overlap() {
        // 10 px over 4 columns: samples of 3 px starting at 0, 2, 5 and 7
        let image = RgbaImage::from_fn(10, 1, |x, _| {
            if x == 2 {
                Rgba([0, 0, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });

        let grid = classify_grid(&image, 4, 1).unwrap();

        assert_eq!(grid.get(0, 0).unwrap().avg, rgb(0.0, 0.0, 85.0));
        assert_eq!(grid.get(1, 0).unwrap().avg, rgb(0.0, 0.0, 85.0));
        assert_eq!(grid.get(2, 0).unwrap().avg, rgb(0.0, 0.0, 0.0));
        assert_eq!(grid.get(3, 0).unwrap().avg, rgb(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_more_cells_than_pixels() {
        let image = create_coast_image(2, 1);

        let grid = classify_grid(&image, 4, 3).unwrap();

        assert_eq!(grid.cells().len(), 12);
        assert_eq!(grid.to_string(), "~~##\n~~##\n~~##\n");
    }

    #[test]
    fn test_heuristic() {
        let heuristic = WaterHeuristic::default();

        assert_eq!(heuristic.classify(&rgb(0.0, 0.0, 255.0)), Terrain::Water);
        assert_eq!(heuristic.classify(&rgb(30.0, 70.0, 190.0)), Terrain::Water);
        // black and grays have no saturation
        assert_eq!(heuristic.classify(&rgb(0.0, 0.0, 0.0)), Terrain::Land);
        assert_eq!(heuristic.classify(&rgb(128.0, 128.0, 128.0)), Terrain::Land);
        // blue above red and green by exactly the threshold is not enough
        assert_eq!(heuristic.classify(&rgb(40.0, 40.0, 52.0)), Terrain::Land);
        assert_eq!(heuristic.classify(&rgb(40.0, 40.0, 53.0)), Terrain::Water);
        // bright cyan: blue is not ahead of green
        assert_eq!(heuristic.classify(&rgb(0.0, 200.0, 210.0)), Terrain::Land);
    }

    #[test]
    fn test_custom_heuristic() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([40, 40, 53, 255]));
        let strict = WaterHeuristic {
            min_blue_delta: 40.0,
            ..Default::default()
        };

        assert!(classify_grid(&image, 1, 1).unwrap().get(0, 0).unwrap().is_water());
        assert!(!classify_grid_with(&image, 1, 1, &strict)
            .unwrap()
            .get(0, 0)
            .unwrap()
            .is_water());
    }

    #[test]
    fn test_heuristic_partial_json() {
        let heuristic: WaterHeuristic = serde_json::from_str(r#"{"min_saturation": 0.5}"#).unwrap();

        assert_eq!(heuristic.min_saturation, 0.5);
        assert_eq!(heuristic.min_blue_share, 0.38);
        assert_eq!(heuristic.min_blue_delta, 12.0);
    }

    #[test]
    fn test_invalid_dimensions() {
        let image = create_coast_image(4, 4);

        assert!(matches!(
            classify_grid(&image, 0, 3),
            Err(Error::InvalidDimensions { columns: 0, rows: 3 })
        ));
        assert!(matches!(
            classify_grid(&image, 3, 0),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            classify_grid(&RgbaImage::new(0, 0), 3, 3),
            Err(Error::EmptyImage { .. })
        ));
    }

    #[test]
    fn test_decode() {
        assert!(matches!(
            decode_image(b"definitely not a png"),
            Err(Error::ImageDecode(_))
        ));
        assert!(matches!(
            load_image("does/not/exist.png"),
            Err(Error::ImageDecode(_))
        ));

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(create_coast_image(8, 4))
            .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();

        let image = decode_image(&png).unwrap();
        let grid = classify_grid(&image, 2, 2).unwrap();
        assert_eq!(grid.to_string(), "~#\n~#\n");
    }
}
