use gdal::raster::{GdalDataType, GdalType};
use ndarray::Array2;
use num::{NumCast, ToPrimitive};
use std::fmt::Debug;

use crate::components::transforms::GeoTransform;

pub const GTIFF_DRIVER: &str = "GTiff";

/// Sample types a band can be extracted as.
///
/// Types without a variant here are read as [PixelType::Float64].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    UInt8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    pub fn from_gdal(data_type: GdalDataType) -> Self {
        match data_type {
            GdalDataType::UInt8 => Self::UInt8,
            GdalDataType::UInt16 => Self::UInt16,
            GdalDataType::Int16 => Self::Int16,
            GdalDataType::UInt32 => Self::UInt32,
            GdalDataType::Int32 => Self::Int32,
            GdalDataType::Float32 => Self::Float32,
            _ => Self::Float64,
        }
    }
}

pub trait Pixel: GdalType + NumCast + ToPrimitive + Copy + Default + PartialEq + Debug {
    const TYPE: PixelType;
    fn into_pixels(array: Array2<Self>) -> PixelBuffer;
    fn is_nan(self) -> bool;

    /// Whether `self` is the nodata value, NaN nodata matches NaN samples.
    fn is_nodata(self, nodata: Option<Self>) -> bool {
        match nodata {
            Some(nodata) => self == nodata || (nodata.is_nan() && self.is_nan()),
            None => false,
        }
    }
}

macro_rules! impl_pixel {
    ($($t:ty => $variant:ident, $pixel_type:ident, $is_nan:expr;)*) => {
        $(
            impl Pixel for $t {
                const TYPE: PixelType = PixelType::$pixel_type;
                fn into_pixels(array: Array2<Self>) -> PixelBuffer {
                    PixelBuffer::$variant(array)
                }
                fn is_nan(self) -> bool {
                    $is_nan(self)
                }
            }
        )*
    };
}

impl_pixel! {
    u8 => U8, UInt8, |_| false;
    u16 => U16, UInt16, |_| false;
    i16 => I16, Int16, |_| false;
    u32 => U32, UInt32, |_| false;
    i32 => I32, Int32, |_| false;
    f32 => F32, Float32, f32::is_nan;
    f64 => F64, Float64, f64::is_nan;
}

/// Single band samples in the band's own type.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    U8(Array2<u8>),
    U16(Array2<u16>),
    I16(Array2<i16>),
    U32(Array2<u32>),
    I32(Array2<i32>),
    F32(Array2<f32>),
    F64(Array2<f64>),
}

/// Evaluates `$body` with `$array` bound to the typed inner [Array2].
#[macro_export]
macro_rules! dispatch_pixels {
    ($pixels:expr, $array:ident => $body:expr) => {
        match $pixels {
            $crate::components::raster::PixelBuffer::U8($array) => $body,
            $crate::components::raster::PixelBuffer::U16($array) => $body,
            $crate::components::raster::PixelBuffer::I16($array) => $body,
            $crate::components::raster::PixelBuffer::U32($array) => $body,
            $crate::components::raster::PixelBuffer::I32($array) => $body,
            $crate::components::raster::PixelBuffer::F32($array) => $body,
            $crate::components::raster::PixelBuffer::F64($array) => $body,
        }
    };
}

/// Evaluates `$body` with `$t` aliased to the Rust type of `$pixel_type`.
#[macro_export]
macro_rules! with_pixel_type {
    ($pixel_type:expr, $t:ident => $body:expr) => {{
        use $crate::components::raster::PixelType;
        match $pixel_type {
            PixelType::UInt8 => {
                type $t = u8;
                $body
            }
            PixelType::UInt16 => {
                type $t = u16;
                $body
            }
            PixelType::Int16 => {
                type $t = i16;
                $body
            }
            PixelType::UInt32 => {
                type $t = u32;
                $body
            }
            PixelType::Int32 => {
                type $t = i32;
                $body
            }
            PixelType::Float32 => {
                type $t = f32;
                $body
            }
            PixelType::Float64 => {
                type $t = f64;
                $body
            }
        }
    }};
}

impl<T: Pixel> From<Array2<T>> for PixelBuffer {
    fn from(value: Array2<T>) -> Self {
        T::into_pixels(value)
    }
}

impl PixelBuffer {
    pub fn pixel_type(&self) -> PixelType {
        match self {
            Self::U8(_) => PixelType::UInt8,
            Self::U16(_) => PixelType::UInt16,
            Self::I16(_) => PixelType::Int16,
            Self::U32(_) => PixelType::UInt32,
            Self::I32(_) => PixelType::Int32,
            Self::F32(_) => PixelType::Float32,
            Self::F64(_) => PixelType::Float64,
        }
    }

    /// (H, W)
    pub fn dim(&self) -> (usize, usize) {
        dispatch_pixels!(self, array => array.dim())
    }

    /// Samples converted to `T`, values `T` can not hold become `fill`.
    pub fn cast<T: Pixel>(&self, fill: T) -> Array2<T> {
        dispatch_pixels!(self, array => array.mapv(|value| <T as NumCast>::from(value).unwrap_or(fill)))
    }

    /// Converts a nodata value to `T`, `None` if `T` can not represent it.
    pub fn nodata_as<T: Pixel>(nodata: Option<f64>) -> Option<T> {
        nodata.and_then(<T as NumCast>::from)
    }
}

/// Georeferencing and layout of a raster, the parts needed to write it back.
#[derive(Debug, Clone)]
pub struct RasterProfile {
    pub driver: String,
    /// CRS as WKT, empty when the source has none.
    pub crs: String,
    pub transform: GeoTransform,
    pub data_type: PixelType,
    pub width: usize,
    pub height: usize,
    pub count: usize,
    pub nodata: Option<f64>,
}

/// Window of a single band of one asset, held in memory until merged.
#[derive(Debug, Clone)]
pub struct ExtractedRaster {
    pub profile: RasterProfile,
    pub pixels: PixelBuffer,
}

impl ExtractedRaster {
    pub fn footprint(&self) -> geo::Rect<f64> {
        self.profile
            .transform
            .footprint(self.profile.width, self.profile.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn nodata_matching() {
        assert!(3u8.is_nodata(Some(3)));
        assert!(!3u8.is_nodata(Some(0)));
        assert!(!0u8.is_nodata(None));
        assert!(f32::NAN.is_nodata(Some(f32::NAN)));
        assert!(!1.5f32.is_nodata(Some(f32::NAN)));
    }

    #[test]
    fn cast_between_types() {
        let pixels = PixelBuffer::from(array![[1.5f32, -2., f32::NAN]]);
        assert_eq!(pixels.pixel_type(), PixelType::Float32);
        assert_eq!(pixels.cast::<i16>(0), array![[1, -2, 0]]);
        assert_eq!(pixels.cast::<u8>(255), array![[1, 255, 255]]);
    }

    #[test]
    fn nodata_conversion() {
        assert_eq!(PixelBuffer::nodata_as::<u8>(Some(255.)), Some(255));
        assert_eq!(PixelBuffer::nodata_as::<u8>(Some(-9999.)), None);
        assert_eq!(PixelBuffer::nodata_as::<i16>(None), None);
        assert!(PixelBuffer::nodata_as::<f32>(Some(f64::NAN)).unwrap().is_nan());
    }

    #[test]
    fn pixel_types_round_trip_through_macro() {
        let pixel_type = PixelType::Int16;
        let pixels = with_pixel_type!(pixel_type, T => PixelBuffer::from(Array2::<T>::zeros((2, 3))));
        assert_eq!(pixels.pixel_type(), PixelType::Int16);
        assert_eq!(pixels.dim(), (2, 3));
    }
}
