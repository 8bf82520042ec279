use crate::{
    assembler::VolumeAssembler,
    enums::SortBy,
    error::{AssemblyError, BoxError},
    resolver::PixelTypeResolver,
    slice_record::SliceRecord,
    sorter::SpatialSorter,
    volume::Volume,
};

use futures::future::try_join_all;
use log::info;
use rayon::prelude::*;
use std::{collections::HashMap, future::Future};
use web_time::Instant;

/// Settings for one assembly call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyOptions {
    pub sort_by: SortBy,
    /// Reject slices whose pixel kind differs from the first sorted slice
    pub strict_pixel_kind: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            sort_by: SortBy::default(),
            strict_pixel_kind: cfg!(feature = "strict"),
        }
    }
}

impl AssemblyOptions {
    pub fn with_sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_strict_pixel_kind(mut self, strict: bool) -> Self {
        self.strict_pixel_kind = strict;
        self
    }
}

/// Decoding collaborator: hands out an already decoded slice for an identifier.
pub trait SliceSource: Sync {
    fn slice(&self, id: &str) -> Result<SliceRecord, BoxError>;
}

impl SliceSource for HashMap<String, SliceRecord> {
    fn slice(&self, id: &str) -> Result<SliceRecord, BoxError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| format!("unknown slice '{id}'").into())
    }
}

pub struct AssemblyPipeline;

impl AssemblyPipeline {
    /// Fetch every slice from `source` and assemble them into a volume
    ///
    /// Slices are fetched in parallel and joined all-or-nothing: if any fetch
    /// fails, the failure of the earliest identifier is returned and nothing
    /// is assembled.
    ///
    /// # Errors
    ///
    /// Returns error if `ids` is empty, a slice cannot be decoded, or the
    /// slices cannot form one volume
    pub fn assemble_volume<S: SliceSource + ?Sized>(
        ids: &[impl AsRef<str> + Sync],
        source: &S,
        options: &AssemblyOptions,
    ) -> Result<Volume, AssemblyError> {
        if ids.is_empty() {
            return Err(AssemblyError::EmptyInput);
        }

        let results: Vec<_> = ids
            .par_iter()
            .map(|id| {
                let id = id.as_ref();
                source
                    .slice(id)
                    .map_err(|source| AssemblyError::DecodeFailure {
                        id: id.to_string(),
                        source,
                    })
            })
            .collect();
        let slices = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        Self::assemble_slices(slices, options)
    }

    /// Like [`Self::assemble_volume`] for collaborators that decode asynchronously
    ///
    /// All fetches are awaited together; the first failure aborts the join.
    pub async fn assemble_volume_async<F, Fut>(
        ids: &[impl AsRef<str>],
        fetch: F,
        options: &AssemblyOptions,
    ) -> Result<Volume, AssemblyError>
    where
        F: Fn(&str) -> Fut,
        Fut: Future<Output = Result<SliceRecord, BoxError>>,
    {
        if ids.is_empty() {
            return Err(AssemblyError::EmptyInput);
        }

        let slices = try_join_all(ids.iter().map(|id| {
            let id = id.as_ref();
            let pending = fetch(id);
            async move {
                pending
                    .await
                    .map_err(|source| AssemblyError::DecodeFailure {
                        id: id.to_string(),
                        source,
                    })
            }
        }))
        .await?;

        Self::assemble_slices(slices, options)
    }

    /// Sort, resolve and assemble slices that are already decoded
    ///
    /// The records are consumed; their samples are copied into the volume.
    ///
    /// # Errors
    ///
    /// Returns error if `slices` is empty or the slices cannot form one volume
    pub fn assemble_slices(
        slices: Vec<SliceRecord>,
        options: &AssemblyOptions,
    ) -> Result<Volume, AssemblyError> {
        let start = Instant::now();

        let ordering = SpatialSorter::sort(&slices, options.sort_by)?;
        let kind = PixelTypeResolver::resolve(&slices, &ordering.order, options.strict_pixel_kind)?;
        let volume = VolumeAssembler::assemble(&slices, &ordering, kind)?;

        info!(
            "Assembled volume {:?} ({kind}) from {} slices in {:?}",
            volume.dimensions(),
            slices.len(),
            start.elapsed()
        );
        Ok(volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice_record::PixelData;

    struct FailingSource;

    impl SliceSource for FailingSource {
        fn slice(&self, id: &str) -> Result<SliceRecord, BoxError> {
            if id == "bad" || id == "worse" {
                Err(format!("corrupt pixel data in {id}").into())
            } else {
                Ok(SliceRecord::new(id, 1, 1, PixelData::U8(vec![1])))
            }
        }
    }

    #[test]
    fn test_decode_failure_aborts() {
        let result = AssemblyPipeline::assemble_volume(
            &["ok", "bad", "worse"],
            &FailingSource,
            &AssemblyOptions::default(),
        );

        match result {
            Err(AssemblyError::DecodeFailure { id, source }) => {
                assert_eq!(id, "bad");
                assert_eq!(source.to_string(), "corrupt pixel data in bad");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_unknown_id_in_map() {
        let source: HashMap<String, SliceRecord> = HashMap::new();
        assert!(matches!(
            AssemblyPipeline::assemble_volume(&["missing"], &source, &AssemblyOptions::default()),
            Err(AssemblyError::DecodeFailure { .. })
        ));
    }

    #[test]
    fn test_options_builder() {
        let options = AssemblyOptions::default()
            .with_sort_by(SortBy::None)
            .with_strict_pixel_kind(true);
        assert_eq!(options.sort_by, SortBy::None);
        assert!(options.strict_pixel_kind);
    }
}
