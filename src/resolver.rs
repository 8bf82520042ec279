use crate::{enums::PixelKind, error::AssemblyError, slice_record::SliceRecord};

use log::{debug, warn};

pub struct PixelTypeResolver;

impl PixelTypeResolver {
    /// Pick the sample kind for the volume buffer
    ///
    /// The kind of the first slice in `order` is used for the whole volume so
    /// that narrow integer series are never widened. Later slices are not
    /// converted. With `strict` set, a slice of another kind is rejected;
    /// otherwise it is only reported and its bytes are later copied as-is.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::EmptyInput`] for an empty ordering and
    /// [`AssemblyError::PixelKindMismatch`] in strict mode
    pub fn resolve(
        slices: &[SliceRecord],
        order: &[usize],
        strict: bool,
    ) -> Result<PixelKind, AssemblyError> {
        let first = order
            .first()
            .map(|&index| &slices[index])
            .ok_or(AssemblyError::EmptyInput)?;
        let kind = first.pixel_kind();

        let mismatch = order
            .iter()
            .map(|&index| &slices[index])
            .find(|slice| slice.pixel_kind() != kind);

        if let Some(slice) = mismatch {
            if strict {
                return Err(AssemblyError::PixelKindMismatch {
                    id: slice.id.clone(),
                    expected: kind,
                    found: slice.pixel_kind(),
                });
            }
            warn!(
                "Slice '{}' holds {} samples in a {kind} volume, copying raw bytes",
                slice.id,
                slice.pixel_kind()
            );
        }

        debug!("Resolved volume pixel kind {kind}");
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice_record::PixelData;

    fn slices() -> Vec<SliceRecord> {
        vec![
            SliceRecord::new("a", 1, 2, PixelData::F32(vec![0.0, 1.0])),
            SliceRecord::new("b", 1, 2, PixelData::I16(vec![0, 1])),
        ]
    }

    #[test]
    fn test_uses_first_sorted_slice() {
        let slices = slices();
        assert_eq!(
            PixelTypeResolver::resolve(&slices, &[1, 0], false).unwrap(),
            PixelKind::I16
        );
        assert_eq!(
            PixelTypeResolver::resolve(&slices, &[0, 1], false).unwrap(),
            PixelKind::F32
        );
    }

    #[test]
    fn test_strict_rejects_mixed_kinds() {
        let result = PixelTypeResolver::resolve(&slices(), &[1, 0], true);
        match result {
            Err(AssemblyError::PixelKindMismatch {
                id,
                expected,
                found,
            }) => {
                assert_eq!(id, "a");
                assert_eq!(expected, PixelKind::I16);
                assert_eq!(found, PixelKind::F32);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_strict_accepts_uniform_kind() {
        let slices = vec![
            SliceRecord::new("a", 1, 1, PixelData::U16(vec![7])),
            SliceRecord::new("b", 1, 1, PixelData::U16(vec![8])),
        ];
        assert_eq!(
            PixelTypeResolver::resolve(&slices, &[0, 1], true).unwrap(),
            PixelKind::U16
        );
    }
}
