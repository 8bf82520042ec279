use crate::{
    enums::PixelKind,
    error::AssemblyError,
    geometry,
    slice_record::{DEFAULT_PIXEL_SPACING, SliceRecord},
    sorter::SliceOrdering,
    volume::{
        DEFAULT_BITS_ALLOCATED, DEFAULT_BITS_STORED, DEFAULT_FRAME_OF_REFERENCE_ID,
        DEFAULT_HIGH_BIT, DEFAULT_MODALITY, DEFAULT_PHOTOMETRIC_INTERPRETATION,
        DEFAULT_PIXEL_REPRESENTATION, ScalarBuffer, Volume, VolumeMetadata,
    },
};

use bytemuck::Pod;
use log::debug;
use ndarray::Array3;

pub struct VolumeAssembler;

impl VolumeAssembler {
    /// Copy the slices into one contiguous buffer and attach geometry and metadata
    ///
    /// Every slice is checked against the first sorted slice before anything
    /// is allocated. Slice `i` of `ordering.order` lands in z-slot `i`; samples
    /// are copied without resampling. A slice whose kind differs from `kind`
    /// has its raw bytes copied into the slot, truncated to the slot size.
    ///
    /// # Errors
    ///
    /// Returns error if there are no slices, a slice has an empty grid, or
    /// the slices disagree on rows, columns or sample count
    pub fn assemble(
        slices: &[SliceRecord],
        ordering: &SliceOrdering,
        kind: PixelKind,
    ) -> Result<Volume, AssemblyError> {
        let first = ordering
            .order
            .first()
            .map(|&index| &slices[index])
            .ok_or(AssemblyError::EmptyInput)?;

        Self::validate_dimensions(slices, first)?;

        let order = &ordering.order;
        let shape = (order.len(), first.rows, first.columns);
        let scalars = match kind {
            PixelKind::U8 => ScalarBuffer::U8(Self::build_volume_array(slices, order, shape)?),
            PixelKind::I16 => ScalarBuffer::I16(Self::build_volume_array(slices, order, shape)?),
            PixelKind::U16 => ScalarBuffer::U16(Self::build_volume_array(slices, order, shape)?),
            PixelKind::F32 => ScalarBuffer::F32(Self::build_volume_array(slices, order, shape)?),
        };

        let spacing = (
            Self::positive_or_default(first.column_spacing),
            Self::positive_or_default(first.row_spacing),
            ordering.z_spacing,
        );
        let direction = Self::direction(first);
        let metadata = Self::metadata(first, &direction);

        debug!(
            "Assembled {:?} {kind} voxels with spacing {:?}",
            scalars.dim(),
            spacing
        );

        Ok(Volume::new(
            scalars,
            spacing,
            ordering.origin,
            direction,
            metadata,
        ))
    }

    fn validate_dimensions(
        slices: &[SliceRecord],
        reference: &SliceRecord,
    ) -> Result<(), AssemblyError> {
        if reference.area() == 0 {
            return Err(AssemblyError::EmptySlice {
                id: reference.id.clone(),
            });
        }

        let expected = (reference.rows, reference.columns);
        for slice in slices {
            let found = (slice.rows, slice.columns);
            if found != expected {
                return Err(AssemblyError::DimensionMismatch {
                    id: slice.id.clone(),
                    expected,
                    found,
                });
            }
            if slice.samples.len() != slice.area() {
                return Err(AssemblyError::SampleCountMismatch {
                    id: slice.id.clone(),
                    expected: slice.area(),
                    found: slice.samples.len(),
                });
            }
        }
        Ok(())
    }

    fn build_volume_array<T: Pod>(
        slices: &[SliceRecord],
        order: &[usize],
        shape: (usize, usize, usize),
    ) -> Result<Array3<T>, AssemblyError> {
        let (depth, height, width) = shape;
        let area = height * width;
        let mut data = vec![T::zeroed(); depth * area];

        for (slot, &index) in data.chunks_exact_mut(area).zip(order) {
            let dest: &mut [u8] = bytemuck::cast_slice_mut(slot);
            let src = slices[index].samples.as_bytes();
            let len = dest.len().min(src.len());
            dest[..len].copy_from_slice(&src[..len]);
        }

        Ok(Array3::from_shape_vec(shape, data)?)
    }

    /// Row axis, column axis and their normal, or the identity basis when
    /// the orientation is missing or degenerate
    fn direction(slice: &SliceRecord) -> [[f64; 3]; 3] {
        slice
            .orientation_patient
            .as_ref()
            .and_then(|(row, column)| {
                let row = geometry::normalize(row)?;
                let column = geometry::normalize(column)?;
                let normal = geometry::scan_normal(&row, &column)?;
                Some([row, column, normal])
            })
            .unwrap_or(geometry::IDENTITY)
    }

    fn metadata(slice: &SliceRecord, direction: &[[f64; 3]; 3]) -> VolumeMetadata {
        VolumeMetadata {
            frame_of_reference_id: slice
                .frame_of_reference_id
                .clone()
                .unwrap_or_else(|| DEFAULT_FRAME_OF_REFERENCE_ID.to_string()),
            modality: slice
                .modality
                .clone()
                .unwrap_or_else(|| DEFAULT_MODALITY.to_string()),
            photometric_interpretation: slice
                .photometric_interpretation
                .clone()
                .unwrap_or_else(|| DEFAULT_PHOTOMETRIC_INTERPRETATION.to_string()),
            bits_allocated: slice.bits_allocated.unwrap_or(DEFAULT_BITS_ALLOCATED),
            bits_stored: slice.bits_stored.unwrap_or(DEFAULT_BITS_STORED),
            high_bit: slice.high_bit.unwrap_or(DEFAULT_HIGH_BIT),
            pixel_representation: slice
                .pixel_representation
                .unwrap_or(DEFAULT_PIXEL_REPRESENTATION),
            pixel_spacing: (
                Self::positive_or_default(slice.row_spacing),
                Self::positive_or_default(slice.column_spacing),
            ),
            row_cosines: direction[0],
            column_cosines: direction[1],
        }
    }

    fn positive_or_default(spacing: f64) -> f64 {
        if spacing.is_finite() && spacing > 0.0 {
            spacing
        } else {
            DEFAULT_PIXEL_SPACING
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice_record::PixelData;

    fn ordering(order: Vec<usize>) -> SliceOrdering {
        SliceOrdering {
            order,
            z_spacing: 2.0,
            origin: [0.0; 3],
        }
    }

    #[test]
    fn test_copies_slices_into_sorted_slots() {
        let slices = vec![
            SliceRecord::new("a", 2, 2, PixelData::U16(vec![1, 2, 3, 4])),
            SliceRecord::new("b", 2, 2, PixelData::U16(vec![5, 6, 7, 8])),
        ];
        let volume = VolumeAssembler::assemble(&slices, &ordering(vec![1, 0]), PixelKind::U16).unwrap();

        match volume.data() {
            ScalarBuffer::U16(array) => {
                assert_eq!(array.as_slice().unwrap(), &[5, 6, 7, 8, 1, 2, 3, 4]);
            }
            other => panic!("unexpected buffer {:?}", other.kind()),
        }
        assert_eq!(volume.dimensions(), (2, 2, 2));
        assert_eq!(volume.spacing(), (1.0, 1.0, 2.0));
    }

    #[test]
    fn test_spacing_and_direction_from_first_sorted_slice() {
        let slices = vec![
            SliceRecord::new("a", 1, 1, PixelData::F32(vec![0.5]))
                .with_pixel_spacing(0.7, 0.8)
                .with_orientation([0.0, 2.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        let volume = VolumeAssembler::assemble(&slices, &ordering(vec![0]), PixelKind::F32).unwrap();

        assert_eq!(volume.spacing(), (0.8, 0.7, 2.0));
        assert_eq!(
            volume.direction(),
            [[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]
        );
        assert_eq!(volume.metadata().row_cosines, [0.0, 1.0, 0.0]);
        assert_eq!(volume.metadata().pixel_spacing, (0.7, 0.8));
    }

    #[test]
    fn test_metadata_defaults_are_independent() {
        let mut slice = SliceRecord::new("a", 1, 1, PixelData::U8(vec![1])).with_modality("MR");
        slice.bits_stored = Some(12);
        let volume = VolumeAssembler::assemble(&[slice], &ordering(vec![0]), PixelKind::U8).unwrap();
        let metadata = volume.metadata();

        assert_eq!(metadata.modality, "MR");
        assert_eq!(metadata.bits_stored, 12);
        assert_eq!(metadata.bits_allocated, DEFAULT_BITS_ALLOCATED);
        assert_eq!(metadata.high_bit, DEFAULT_HIGH_BIT);
        assert_eq!(metadata.photometric_interpretation, "MONOCHROME2");
        assert_eq!(volume.direction(), geometry::IDENTITY);
    }

    #[test]
    fn test_rejects_dimension_mismatch() {
        let slices = vec![
            SliceRecord::new("a", 2, 2, PixelData::U16(vec![0; 4])),
            SliceRecord::new("b", 1, 4, PixelData::U16(vec![0; 4])),
        ];
        let result = VolumeAssembler::assemble(&slices, &ordering(vec![0, 1]), PixelKind::U16);

        match result {
            Err(AssemblyError::DimensionMismatch { id, expected, found }) => {
                assert_eq!(id, "b");
                assert_eq!(expected, (2, 2));
                assert_eq!(found, (1, 4));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_rejects_short_sample_array() {
        let slices = vec![SliceRecord::new("a", 2, 2, PixelData::I16(vec![0; 3]))];
        assert!(matches!(
            VolumeAssembler::assemble(&slices, &ordering(vec![0]), PixelKind::I16),
            Err(AssemblyError::SampleCountMismatch { expected: 4, found: 3, .. })
        ));
    }

    #[test]
    fn test_mixed_kind_copies_raw_bytes() {
        let slices = vec![
            SliceRecord::new("a", 1, 2, PixelData::U16(vec![1, 2])),
            SliceRecord::new("b", 1, 2, PixelData::U8(vec![0xff, 0x01])),
        ];
        let volume = VolumeAssembler::assemble(&slices, &ordering(vec![0, 1]), PixelKind::U16).unwrap();

        let ScalarBuffer::U16(array) = volume.data() else {
            panic!("expected a u16 buffer");
        };
        let bytes: &[u8] = bytemuck::cast_slice(array.as_slice().unwrap());
        assert_eq!(&bytes[4..], &[0xff, 0x01, 0x00, 0x00]);
    }
}
