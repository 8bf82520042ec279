use crate::enums::PixelKind;

pub const DEFAULT_PIXEL_SPACING: f64 = 1.0;
pub const DEFAULT_SLICE_THICKNESS: f64 = 1.0;

/// Samples of one decoded slice, row-major, `rows * columns` long.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl PixelData {
    pub fn kind(&self) -> PixelKind {
        match self {
            PixelData::U8(_) => PixelKind::U8,
            PixelData::I16(_) => PixelKind::I16,
            PixelData::U16(_) => PixelKind::U16,
            PixelData::F32(_) => PixelKind::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(v) => v.len(),
            PixelData::I16(v) => v.len(),
            PixelData::U16(v) => v.len(),
            PixelData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw native-endian bytes of the samples
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PixelData::U8(v) => v.as_slice(),
            PixelData::I16(v) => bytemuck::cast_slice(v.as_slice()),
            PixelData::U16(v) => bytemuck::cast_slice(v.as_slice()),
            PixelData::F32(v) => bytemuck::cast_slice(v.as_slice()),
        }
    }
}

/// In-plane axes of a slice: row direction then column direction.
pub type Orientation = ([f64; 3], [f64; 3]);

/// One decoded slice plus the geometry needed to place it in a volume.
///
/// Optional descriptive fields are defaulted independently when the volume
/// metadata is built, never inferred from one another.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceRecord {
    pub id: String,
    pub rows: usize,
    pub columns: usize,
    pub row_spacing: f64,
    pub column_spacing: f64,
    pub position_patient: Option<[f64; 3]>,
    pub orientation_patient: Option<Orientation>,
    pub slice_thickness: Option<f64>,
    pub frame_of_reference_id: Option<String>,
    pub modality: Option<String>,
    pub photometric_interpretation: Option<String>,
    pub bits_allocated: Option<u16>,
    pub bits_stored: Option<u16>,
    pub high_bit: Option<u16>,
    pub pixel_representation: Option<u16>,
    pub samples: PixelData,
}

impl SliceRecord {
    /// Create a record with unit spacing and no optional metadata
    pub fn new(id: impl Into<String>, rows: usize, columns: usize, samples: PixelData) -> Self {
        Self {
            id: id.into(),
            rows,
            columns,
            row_spacing: DEFAULT_PIXEL_SPACING,
            column_spacing: DEFAULT_PIXEL_SPACING,
            position_patient: None,
            orientation_patient: None,
            slice_thickness: None,
            frame_of_reference_id: None,
            modality: None,
            photometric_interpretation: None,
            bits_allocated: None,
            bits_stored: None,
            high_bit: None,
            pixel_representation: None,
            samples,
        }
    }

    pub fn with_position(mut self, position: [f64; 3]) -> Self {
        self.position_patient = Some(position);
        self
    }

    pub fn with_orientation(mut self, row: [f64; 3], column: [f64; 3]) -> Self {
        self.orientation_patient = Some((row, column));
        self
    }

    pub fn with_pixel_spacing(mut self, row_spacing: f64, column_spacing: f64) -> Self {
        self.row_spacing = row_spacing;
        self.column_spacing = column_spacing;
        self
    }

    pub fn with_slice_thickness(mut self, thickness: f64) -> Self {
        self.slice_thickness = Some(thickness);
        self
    }

    pub fn with_modality(mut self, modality: impl Into<String>) -> Self {
        self.modality = Some(modality.into());
        self
    }

    /// Number of samples the pixel grid holds
    pub fn area(&self) -> usize {
        self.rows * self.columns
    }

    pub fn pixel_kind(&self) -> PixelKind {
        self.samples.kind()
    }

    /// Both ImagePositionPatient and ImageOrientationPatient are present
    pub fn has_geometry(&self) -> bool {
        self.position_patient.is_some() && self.orientation_patient.is_some()
    }
}
