use geo::{AffineTransform, Coord, Rect};
use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;

use crate::intersection::Intersection;

/// Search area in the catalog's native CRS.
///
/// Serializes as `[xmin, ymin, xmax, ymax]`, the STAC `bbox` layout.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox(Rect<f64>);

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self(Rect::new((xmin, ymin), (xmax, ymax)))
    }

    pub fn to_array(&self) -> [f64; 4] {
        let (min, max) = (self.0.min(), self.0.max());
        [min.x, min.y, max.x, max.y]
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(value: [f64; 4]) -> Self {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(value: BoundingBox) -> Self {
        value.to_array()
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(value: Rect<f64>) -> Self {
        Self(value)
    }
}

/// ISO-8601 start and end of the search interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// STAC `datetime` interval, `start/end`.
    pub fn interval(&self) -> String {
        format!("{}/{}", self.start, self.end)
    }
}

/// Fractional pixel window of a [BoundingBox] over a raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub col_off: f64,
    pub row_off: f64,
    pub width: f64,
    pub height: f64,
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

impl Window {
    /// Window covering `bounds` given the raster's CRS to pixel transform.
    pub fn from_bounds(bounds: &Rect<f64>, inverse: &AffineTransform) -> Self {
        let (min, max) = (bounds.min(), bounds.max());
        let pixels = [
            (min.x, max.y),
            (max.x, max.y),
            (max.x, min.y),
            (min.x, min.y),
        ]
        .map(|(x, y)| inverse.apply(Coord { x, y }));

        let (mut col_start, mut col_stop) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut row_start, mut row_stop) = (f64::INFINITY, f64::NEG_INFINITY);
        for pixel in pixels {
            col_start = col_start.min(pixel.x);
            col_stop = col_stop.max(pixel.x);
            row_start = row_start.min(pixel.y);
            row_stop = row_stop.max(pixel.y);
        }

        Self {
            col_off: col_start,
            row_off: row_start,
            width: (col_stop - col_start).max(0.),
            height: (row_stop - row_start).max(0.),
        }
    }

    /// Snap offsets to the nearest pixel, lengths are left untouched.
    pub fn round_offsets(self) -> Self {
        Self {
            col_off: round_half_up(self.col_off),
            row_off: round_half_up(self.row_off),
            ..self
        }
    }

    /// Snap lengths to the nearest pixel, offsets are left untouched.
    pub fn round_lengths(self) -> Self {
        Self {
            width: round_half_up(self.width),
            height: round_half_up(self.height),
            ..self
        }
    }

    /// Integer window, offsets are rounded first and lengths second.
    pub fn snap(self) -> PixelWindow {
        let rounded = self.round_offsets().round_lengths();
        PixelWindow {
            col_off: rounded.col_off as isize,
            row_off: rounded.row_off as isize,
            width: rounded.width as usize,
            height: rounded.height as usize,
        }
    }
}

/// Pixel bounds of a read.
///
/// Deffined by:
///     - `offset`: (col, row) of the top left pixel,
///         with origin at top left pixel of raster.
///     - `shape`: (W, H).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub col_off: isize,
    pub row_off: isize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    pub fn offset(&self) -> (isize, isize) {
        (self.col_off, self.row_off)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn rect(&self) -> Rect<isize> {
        Rect::new(
            (self.col_off, self.row_off),
            (
                self.col_off + self.width as isize,
                self.row_off + self.height as isize,
            ),
        )
    }

    /// Part of the window inside a `width` x `height` raster, `None` if there are no pixels.
    pub fn clip(&self, width: usize, height: usize) -> Option<PixelWindow> {
        let raster = Rect::new((0, 0), (width as isize, height as isize));
        let clipped = self.rect().intersection(&raster)?;
        let window = PixelWindow {
            col_off: clipped.min().x,
            row_off: clipped.min().y,
            width: clipped.width() as usize,
            height: clipped.height() as usize,
        };
        (!window.is_empty()).then_some(window)
    }
}
