use crate::{
    error::{AssemblyError, BoxError},
    pipeline::{AssemblyOptions, AssemblyPipeline, SliceSource},
    slice_record::{DEFAULT_PIXEL_SPACING, PixelData, SliceRecord},
    volume::Volume,
};

use dicom::{
    core::Tag,
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder},
};
use dicom_dictionary_std::tags;
use log::debug;
use ndarray::s;
use rayon::prelude::*;
use std::{fs, path::Path};

/// Decodes DICOM files on demand, using the file path as slice identifier.
pub struct DicomSliceSource;

impl SliceSource for DicomSliceSource {
    fn slice(&self, id: &str) -> Result<SliceRecord, BoxError> {
        let dicom_object = open_file(id)?;
        DicomSliceSource::decode_record(id, &dicom_object)
    }
}

// Stored values only, rescale and windowing are left to the renderer
macro_rules! first_frame {
    ($pixel_data:expr, $options:expr, $kind:ty) => {
        $pixel_data
            .to_ndarray_with_options::<$kind>($options)?
            .slice_move(s![0, .., .., 0])
            .iter()
            .copied()
            .collect::<Vec<$kind>>()
    };
}

impl DicomSliceSource {
    /// Build a [`SliceRecord`] from the first frame of a DICOM object
    ///
    /// The sample kind follows BitsAllocated and PixelRepresentation:
    /// 8 bit data becomes `u8`, 16 bit data `i16` or `u16`, 32 bit data `f32`.
    ///
    /// # Errors
    ///
    /// Returns error if Rows/Columns are missing, the pixel data cannot be
    /// decoded, or the bit depth is not supported
    pub fn decode_record(
        id: &str,
        dicom_object: &FileDicomObject<InMemDicomObject>,
    ) -> Result<SliceRecord, BoxError> {
        let rows: u16 = dicom_object.element(tags::ROWS)?.to_int()?;
        let columns: u16 = dicom_object.element(tags::COLUMNS)?.to_int()?;
        let bits_allocated = Self::get_u16(dicom_object, tags::BITS_ALLOCATED);
        let pixel_representation = Self::get_u16(dicom_object, tags::PIXEL_REPRESENTATION);

        let pixel_data = dicom_object.decode_pixel_data()?;
        let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
        let samples = match (bits_allocated.unwrap_or(16), pixel_representation.unwrap_or(0)) {
            (8, _) => PixelData::U8(first_frame!(pixel_data, &options, u8)),
            (16, 1) => PixelData::I16(first_frame!(pixel_data, &options, i16)),
            (16, _) => PixelData::U16(first_frame!(pixel_data, &options, u16)),
            (32, _) => PixelData::F32(first_frame!(pixel_data, &options, f32)),
            (bits, _) => {
                return Err(format!("Unsupported BitsAllocated {bits} in '{id}'").into());
            }
        };

        let (row_spacing, column_spacing) = Self::get_floats(dicom_object, tags::PIXEL_SPACING)
            .filter(|spacing| spacing.len() == 2)
            .map_or((DEFAULT_PIXEL_SPACING, DEFAULT_PIXEL_SPACING), |spacing| {
                (spacing[0], spacing[1])
            });

        let position_patient = Self::get_floats(dicom_object, tags::IMAGE_POSITION_PATIENT)
            .filter(|position| position.len() == 3)
            .map(|position| [position[0], position[1], position[2]]);

        let orientation_patient = Self::get_floats(dicom_object, tags::IMAGE_ORIENTATION_PATIENT)
            .filter(|orientation| orientation.len() == 6)
            .map(|o| ([o[0], o[1], o[2]], [o[3], o[4], o[5]]));

        debug!("Decoded '{id}': {rows}x{columns} {:?}", samples.kind());

        Ok(SliceRecord {
            id: id.to_string(),
            rows: rows.into(),
            columns: columns.into(),
            row_spacing,
            column_spacing,
            position_patient,
            orientation_patient,
            slice_thickness: dicom_object
                .element(tags::SLICE_THICKNESS)
                .ok()
                .and_then(|element| element.to_float64().ok()),
            frame_of_reference_id: Self::get_string(dicom_object, tags::FRAME_OF_REFERENCE_UID),
            modality: Self::get_string(dicom_object, tags::MODALITY),
            photometric_interpretation: Self::get_string(
                dicom_object,
                tags::PHOTOMETRIC_INTERPRETATION,
            ),
            bits_allocated,
            bits_stored: Self::get_u16(dicom_object, tags::BITS_STORED),
            high_bit: Self::get_u16(dicom_object, tags::HIGH_BIT),
            pixel_representation,
            samples,
        })
    }

    fn get_u16(dicom_object: &FileDicomObject<InMemDicomObject>, tag: Tag) -> Option<u16> {
        dicom_object.element(tag).ok()?.to_int::<u16>().ok()
    }

    fn get_floats(dicom_object: &FileDicomObject<InMemDicomObject>, tag: Tag) -> Option<Vec<f64>> {
        dicom_object.element(tag).ok()?.to_multi_float64().ok()
    }

    fn get_string(dicom_object: &FileDicomObject<InMemDicomObject>, tag: Tag) -> Option<String> {
        let value = dicom_object.element(tag).ok()?.to_str().ok()?;
        let value = value.trim_matches(|c: char| c.is_whitespace() || c == '\0');
        (!value.is_empty()).then(|| value.to_string())
    }
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from DICOM objects
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Slice of DICOM file objects
    /// * `options` - Sorting and pixel kind settings
    ///
    /// # Errors
    ///
    /// Returns error if no objects are given, one fails to decode, or the
    /// slices cannot form one volume
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        options: &AssemblyOptions,
    ) -> Result<Volume, AssemblyError> {
        let results: Vec<_> = dicom_objects
            .par_iter()
            .enumerate()
            .map(|(index, dicom_object)| {
                let id = dicom_object
                    .element(tags::SOP_INSTANCE_UID)
                    .ok()
                    .and_then(|element| element.to_str().ok())
                    .map_or_else(
                        || index.to_string(),
                        |uid| uid.trim_matches(|c: char| c.is_whitespace() || c == '\0').to_string(),
                    );
                DicomSliceSource::decode_record(&id, dicom_object)
                    .map_err(|source| AssemblyError::DecodeFailure { id, source })
            })
            .collect();
        let slices = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        AssemblyPipeline::assemble_slices(slices, options)
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        options: &AssemblyOptions,
    ) -> Result<Volume, AssemblyError> {
        let ids: Vec<String> = paths
            .iter()
            .map(|path| path.as_ref().to_string_lossy().into_owned())
            .collect();

        AssemblyPipeline::assemble_volume(&ids, &DicomSliceSource, options)
    }

    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        options: &AssemblyOptions,
    ) -> Result<Volume, AssemblyError> {
        let mut paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(AssemblyError::EmptyInput);
        }
        // read_dir order is platform dependent, keep ties reproducible
        paths.sort();

        Self::load_from_file_paths(&paths, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory() {
        let result = VolumeLoader::load_from_directory(
            "/nonexistent/slice-volume/series",
            &AssemblyOptions::default(),
        );
        assert!(matches!(result, Err(AssemblyError::Io(_))));
    }

    #[test]
    fn test_missing_file_is_decode_failure() {
        let result = VolumeLoader::load_from_file_paths(
            &["/nonexistent/slice-volume/1.dcm"],
            &AssemblyOptions::default(),
        );
        match result {
            Err(AssemblyError::DecodeFailure { id, .. }) => {
                assert_eq!(id, "/nonexistent/slice-volume/1.dcm");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_no_objects() {
        let result = VolumeLoader::load_from_dicom_objects(&[], &AssemblyOptions::default());
        assert!(matches!(result, Err(AssemblyError::EmptyInput)));
    }
}
