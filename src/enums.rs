use std::fmt;

/// Numeric representation of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelKind {
    U8,
    I16,
    U16,
    F32,
}

impl PixelKind {
    /// Width of one sample in bytes
    pub fn byte_width(self) -> usize {
        match self {
            PixelKind::U8 => 1,
            PixelKind::I16 | PixelKind::U16 => 2,
            PixelKind::F32 => 4,
        }
    }
}

impl fmt::Display for PixelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelKind::U8 => "u8",
            PixelKind::I16 => "i16",
            PixelKind::U16 => "u16",
            PixelKind::F32 => "f32",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Project ImagePositionPatient onto the scan-axis normal
    #[default]
    ImagePositionPatient,
    /// Keep the order the slices were supplied in
    None,
}
