use geo::{AffineTransform, Coord, Rect};
use shrinkwraprs::Shrinkwrap;

use crate::components::bounds::PixelWindow;

/// Pixel (col, row) to CRS (x, y) affine transform of a raster.
#[derive(Shrinkwrap, Debug, Clone, Copy)]
pub struct GeoTransform(AffineTransform);

impl GeoTransform {
    pub fn new(a: f64, b: f64, xoff: f64, d: f64, e: f64, yoff: f64) -> Self {
        Self(AffineTransform::new(a, b, xoff, d, e, yoff))
    }

    /// North up transform with the top left corner at (`west`, `north`).
    pub fn north_up(west: f64, north: f64, res_x: f64, res_y: f64) -> Self {
        Self::new(res_x, 0., west, 0., -res_y, north)
    }

    pub fn from_gdal(gdal_transform: [f64; 6]) -> Self {
        Self::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        )
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.xoff(),
            self.a(),
            self.b(),
            self.yoff(),
            self.d(),
            self.e(),
        ]
    }

    /// CRS to pixel transform.
    pub fn inverse(&self) -> Option<AffineTransform> {
        self.0.inverse()
    }

    /// Absolute pixel size along x and y.
    pub fn resolution(&self) -> (f64, f64) {
        (self.a().abs(), self.e().abs())
    }

    /// Transform of a raster read through `window`.
    pub fn for_window(&self, window: &PixelWindow) -> Self {
        let origin = self.0.apply(Coord {
            x: window.col_off as f64,
            y: window.row_off as f64,
        });
        Self::new(self.a(), self.b(), origin.x, self.d(), self.e(), origin.y)
    }

    /// CRS footprint of a `width` x `height` raster.
    pub fn footprint(&self, width: usize, height: usize) -> Rect<f64> {
        let corners = [
            (0., 0.),
            (width as f64, 0.),
            (width as f64, height as f64),
            (0., height as f64),
        ]
        .map(|(x, y)| self.0.apply(Coord { x, y }));
        let (min, max) = corners.iter().skip(1).fold(
            (corners[0], corners[0]),
            |(min, max), corner| {
                (
                    Coord {
                        x: min.x.min(corner.x),
                        y: min.y.min(corner.y),
                    },
                    Coord {
                        x: max.x.max(corner.x),
                        y: max.y.max(corner.y),
                    },
                )
            },
        );
        Rect::new(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gdal_round_trip_order() {
        let gdal_transform = [500000., 10., 0., 4600000., 0., -10.];
        let transform = GeoTransform::from_gdal(gdal_transform);
        assert_eq!(transform.a(), 10.);
        assert_eq!(transform.xoff(), 500000.);
        assert_eq!(transform.e(), -10.);
        assert_eq!(transform.yoff(), 4600000.);
        assert_eq!(transform.to_gdal(), gdal_transform);
    }

    #[test]
    fn window_transform_moves_origin() {
        let transform = GeoTransform::north_up(100., 200., 2., 2.);
        let window = PixelWindow {
            col_off: 3,
            row_off: 4,
            width: 1,
            height: 1,
        };
        assert_eq!(
            transform.for_window(&window).to_gdal(),
            [106., 2., 0., 192., 0., -2.]
        );
    }

    #[test]
    fn footprint_of_north_up_raster() {
        let transform = GeoTransform::north_up(100., 200., 2., 2.);
        assert_eq!(
            transform.footprint(5, 10),
            Rect::new((100., 180.), (110., 200.))
        );
    }
}
