use crate::enums::PixelKind;

use ndarray::Array3;
use ndarray::parallel::prelude::*;

pub const DEFAULT_MODALITY: &str = "CT";
pub const DEFAULT_PHOTOMETRIC_INTERPRETATION: &str = "MONOCHROME2";
pub const DEFAULT_FRAME_OF_REFERENCE_ID: &str = "";
pub const DEFAULT_BITS_ALLOCATED: u16 = 16;
pub const DEFAULT_BITS_STORED: u16 = 16;
pub const DEFAULT_HIGH_BIT: u16 = 15;
pub const DEFAULT_PIXEL_REPRESENTATION: u16 = 1;

/// Voxel storage, indexed `[z, y, x]` in standard (row-major) layout so that
/// voxel (x, y, z) sits at offset `z * rows * columns + y * columns + x`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarBuffer {
    U8(Array3<u8>),
    I16(Array3<i16>),
    U16(Array3<u16>),
    F32(Array3<f32>),
}

macro_rules! with_array {
    ($buffer:expr, $array:ident => $body:expr) => {
        match $buffer {
            ScalarBuffer::U8($array) => $body,
            ScalarBuffer::I16($array) => $body,
            ScalarBuffer::U16($array) => $body,
            ScalarBuffer::F32($array) => $body,
        }
    };
}

impl ScalarBuffer {
    pub fn kind(&self) -> PixelKind {
        match self {
            ScalarBuffer::U8(_) => PixelKind::U8,
            ScalarBuffer::I16(_) => PixelKind::I16,
            ScalarBuffer::U16(_) => PixelKind::U16,
            ScalarBuffer::F32(_) => PixelKind::F32,
        }
    }

    pub fn len(&self) -> usize {
        with_array!(self, array => array.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (slices, rows, columns)
    pub fn dim(&self) -> (usize, usize, usize) {
        with_array!(self, array => array.dim())
    }

    /// Value at `[z, y, x]` widened to f64
    pub fn get(&self, z: usize, y: usize, x: usize) -> Option<f64> {
        with_array!(self, array => array.get([z, y, x]).map(|&value| f64::from(value)))
    }

    /// Contiguous native-endian bytes, in voxel offset order
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ScalarBuffer::U8(array) => array.as_slice(),
            ScalarBuffer::I16(array) => array.as_slice().map(bytemuck::cast_slice),
            ScalarBuffer::U16(array) => array.as_slice().map(bytemuck::cast_slice),
            ScalarBuffer::F32(array) => array.as_slice().map(bytemuck::cast_slice),
        }
    }

    /// Minimum and maximum sample value, `None` for an empty buffer
    pub fn range(&self) -> Option<(f64, f64)> {
        with_array!(self, array => array
            .par_iter()
            .map(|&value| {
                let value = f64::from(value);
                (value, value)
            })
            .reduce_with(|(min_a, max_a), (min_b, max_b)| (min_a.min(min_b), max_a.max(max_b))))
    }
}

/// Descriptive block synthesized once from the first sorted slice
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeMetadata {
    pub frame_of_reference_id: String,
    pub modality: String,
    pub photometric_interpretation: String,
    pub bits_allocated: u16,
    pub bits_stored: u16,
    pub high_bit: u16,
    pub pixel_representation: u16,
    /// (row spacing, column spacing)
    pub pixel_spacing: (f64, f64),
    pub row_cosines: [f64; 3],
    pub column_cosines: [f64; 3],
}

/// Sorted, calibrated scalar volume handed to the renderer.
///
/// Built only by [`crate::assembler::VolumeAssembler`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    dimensions: (usize, usize, usize),
    spacing: (f64, f64, f64),
    origin: [f64; 3],
    direction: [[f64; 3]; 3],
    scalars: ScalarBuffer,
    metadata: VolumeMetadata,
}

impl Volume {
    pub(crate) fn new(
        scalars: ScalarBuffer,
        spacing: (f64, f64, f64),
        origin: [f64; 3],
        direction: [[f64; 3]; 3],
        metadata: VolumeMetadata,
    ) -> Self {
        let (slices, rows, columns) = scalars.dim();
        Self {
            dimensions: (columns, rows, slices),
            spacing,
            origin,
            direction,
            scalars,
            metadata,
        }
    }

    /// Get the dimensions of the volume (columns, rows, slices)
    pub fn dimensions(&self) -> (usize, usize, usize) {
        self.dimensions
    }

    /// Get the dimensions of the underlying array (slices, rows, columns)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.scalars.dim()
    }

    /// Physical size of a voxel (column, row, slice)
    pub fn spacing(&self) -> (f64, f64, f64) {
        self.spacing
    }

    /// World position of voxel (0, 0, 0)
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// Row axis, column axis and scan-axis normal, one unit vector per row
    pub fn direction(&self) -> [[f64; 3]; 3] {
        self.direction
    }

    pub fn metadata(&self) -> &VolumeMetadata {
        &self.metadata
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &ScalarBuffer {
        &self.scalars
    }

    pub fn pixel_kind(&self) -> PixelKind {
        self.scalars.kind()
    }

    pub fn len(&self) -> usize {
        self.scalars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }

    /// Sample at voxel (x, y, z), or `None` outside the volume
    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Option<f64> {
        self.scalars.get(z, y, x)
    }

    /// World coordinates of the (possibly fractional) voxel index (x, y, z)
    pub fn index_to_world(&self, x: f64, y: f64, z: f64) -> [f64; 3] {
        let (sx, sy, sz) = self.spacing;
        let [row, column, normal] = self.direction;
        let (dx, dy, dz) = (x * sx, y * sy, z * sz);
        std::array::from_fn(|axis| {
            self.origin[axis] + row[axis] * dx + column[axis] * dy + normal[axis] * dz
        })
    }

    /// Minimum and maximum voxel value, for transfer-function setup
    pub fn scalar_range(&self) -> Option<(f64, f64)> {
        self.scalars.range()
    }

    /// Raw voxel bytes for upload to the renderer
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.scalars.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn metadata() -> VolumeMetadata {
        VolumeMetadata {
            frame_of_reference_id: DEFAULT_FRAME_OF_REFERENCE_ID.to_string(),
            modality: DEFAULT_MODALITY.to_string(),
            photometric_interpretation: DEFAULT_PHOTOMETRIC_INTERPRETATION.to_string(),
            bits_allocated: DEFAULT_BITS_ALLOCATED,
            bits_stored: DEFAULT_BITS_STORED,
            high_bit: DEFAULT_HIGH_BIT,
            pixel_representation: DEFAULT_PIXEL_REPRESENTATION,
            pixel_spacing: (1.0, 1.0),
            row_cosines: [1.0, 0.0, 0.0],
            column_cosines: [0.0, 1.0, 0.0],
        }
    }

    fn volume() -> Volume {
        // 2 slices of 2 rows by 3 columns
        let data = array![[[1, 2, 3], [4, 5, 6]], [[-7, 8, 9], [10, 11, 12]]];
        Volume::new(
            ScalarBuffer::I16(data),
            (0.5, 2.0, 3.0),
            [10.0, 20.0, 30.0],
            crate::geometry::IDENTITY,
            metadata(),
        )
    }

    #[test]
    fn test_dimensions() {
        let volume = volume();
        assert_eq!(volume.dimensions(), (3, 2, 2));
        assert_eq!(volume.dim(), (2, 2, 3));
        assert_eq!(volume.len(), 12);
        assert_eq!(volume.pixel_kind(), PixelKind::I16);
    }

    #[test]
    fn test_voxel_addressing() {
        let volume = volume();
        assert_eq!(volume.voxel(2, 0, 0), Some(3.0));
        assert_eq!(volume.voxel(0, 1, 1), Some(10.0));
        assert_eq!(volume.voxel(3, 0, 0), None);

        let bytes = volume.as_bytes().unwrap();
        let values: &[i16] = bytemuck::cast_slice(bytes);
        // offset z * rows * columns + y * columns + x
        assert_eq!(values[6 + 3 + 1], 11);
    }

    #[test]
    fn test_index_to_world() {
        let volume = volume();
        assert_eq!(volume.index_to_world(0.0, 0.0, 0.0), [10.0, 20.0, 30.0]);
        assert_eq!(volume.index_to_world(2.0, 1.0, 1.0), [11.0, 22.0, 33.0]);
    }

    #[test]
    fn test_scalar_range() {
        assert_eq!(volume().scalar_range(), Some((-7.0, 12.0)));
    }
}
