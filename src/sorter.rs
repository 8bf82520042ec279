use crate::{
    enums::SortBy,
    error::AssemblyError,
    geometry,
    slice_record::{DEFAULT_SLICE_THICKNESS, SliceRecord},
};

use log::{debug, warn};

/// Placement of the slices along the scan axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceOrdering {
    /// Indices into the input, in ascending depth
    pub order: Vec<usize>,
    pub z_spacing: f64,
    /// World position of voxel (0, 0, 0)
    pub origin: [f64; 3],
}

pub struct SpatialSorter;

impl SpatialSorter {
    /// Order slices along the scan axis and derive the inter-slice spacing and origin
    ///
    /// Slices are projected onto the normal of the first slice's imaging plane
    /// and sorted by that depth. Ties keep their input order. When the first
    /// slice lacks position or orientation, any slice lacks a position, or only
    /// one slice is given, the input order is kept and spacing falls back to
    /// the first slice's thickness.
    ///
    /// Spacing is assumed uniform: gaps in the series are not detected.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::EmptyInput`] if `slices` is empty
    pub fn sort(slices: &[SliceRecord], sort_by: SortBy) -> Result<SliceOrdering, AssemblyError> {
        let first = slices.first().ok_or(AssemblyError::EmptyInput)?;

        if slices.len() > 1 && matches!(sort_by, SortBy::ImagePositionPatient) {
            if let Some(ordering) = Self::sort_by_depth(slices) {
                return Ok(ordering);
            }
            warn!(
                "Incomplete slice geometry starting at '{}', keeping input order",
                first.id
            );
        }

        Ok(Self::input_order(slices))
    }

    fn sort_by_depth(slices: &[SliceRecord]) -> Option<SliceOrdering> {
        let first = &slices[0];
        let (row, column) = first.orientation_patient.as_ref()?;
        first.position_patient.as_ref()?;
        let normal = geometry::scan_normal(row, column)?;

        let depths: Vec<f64> = slices
            .iter()
            .map(|slice| {
                slice
                    .position_patient
                    .as_ref()
                    .map(|position| geometry::dot(position, &normal))
            })
            .collect::<Option<_>>()?;

        let mut order: Vec<usize> = (0..slices.len()).collect();
        // sort_by is stable, co-located slices keep their input order
        order.sort_by(|&a, &b| depths[a].total_cmp(&depths[b]));

        let first_index = order[0];
        let last_index = order[order.len() - 1];
        let origin = slices[first_index].position_patient?;
        let z_spacing = (depths[last_index] - depths[first_index]) / (slices.len() - 1) as f64;

        let z_spacing = if z_spacing.is_finite() && z_spacing > 0.0 {
            z_spacing
        } else {
            let fallback = Self::thickness(first);
            warn!("Slices share a single depth, using spacing {fallback}");
            fallback
        };

        debug!(
            "Sorted {} slices along normal {:?}, spacing {z_spacing}",
            slices.len(),
            normal
        );

        Some(SliceOrdering {
            order,
            z_spacing,
            origin,
        })
    }

    fn input_order(slices: &[SliceRecord]) -> SliceOrdering {
        let first = &slices[0];
        SliceOrdering {
            order: (0..slices.len()).collect(),
            z_spacing: Self::thickness(first),
            origin: first.position_patient.unwrap_or([0.0; 3]),
        }
    }

    fn thickness(slice: &SliceRecord) -> f64 {
        slice
            .slice_thickness
            .filter(|thickness| thickness.is_finite() && *thickness > 0.0)
            .unwrap_or(DEFAULT_SLICE_THICKNESS)
    }
}
