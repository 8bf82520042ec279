//! # Slice-volume library
//!
//! This crate assembles an unordered collection of decoded 2D slices into a
//! single sorted, spatially calibrated 3D scalar volume ready to be handed
//! to a ray-casting renderer.
//!
//! Assembly runs in three steps:
//!  - The [`SpatialSorter`] projects every ImagePositionPatient onto the
//!    normal of the imaging plane, sorts by that depth and derives the
//!    inter-slice spacing and the volume origin.
//!  - The [`PixelTypeResolver`] picks the sample kind of the first sorted
//!    slice for the whole buffer, so 16 bit series stay 16 bit.
//!  - The [`VolumeAssembler`] copies each slice into its z-slot of one
//!    contiguous buffer and synthesizes the volume metadata.
//!
//! Missing position or orientation never fails an assembly: the input order
//! is kept and the slice thickness is used as spacing. Empty input,
//! disagreeing slice dimensions and decoding failures abort the call and no
//! partial volume is returned.
//!
//!  Slices are expected to come from one series and acquisition, with
//!  uniform spacing. Gaps in a series are not detected.
//!
//! # Examples
//!
//! ## Assembling decoded slices
//!
//! ```
//! # use slice_volume::{AssemblyOptions, AssemblyPipeline, PixelData, PixelKind, SliceRecord};
//! let slices = [30.0, 10.0, 20.0]
//!     .iter()
//!     .map(|&z| {
//!         SliceRecord::new(format!("slice-{z}"), 2, 2, PixelData::I16(vec![0; 4]))
//!             .with_position([0.0, 0.0, z])
//!             .with_orientation([1.0, 0.0, 0.0], [0.0, 1.0, 0.0])
//!     })
//!     .collect();
//!
//! let volume = AssemblyPipeline::assemble_slices(slices, &AssemblyOptions::default())
//!     .expect("should have assembled the slices");
//! assert_eq!(volume.dimensions(), (2, 2, 3));
//! assert_eq!(volume.spacing().2, 10.0);
//! assert_eq!(volume.origin(), [0.0, 0.0, 10.0]);
//! assert_eq!(volume.pixel_kind(), PixelKind::I16);
//! ```
//!
//! ## Reading a directory of DICOM files
//!
//! ```no_run
//! # use slice_volume::{AssemblyOptions, VolumeLoader};
//! let volume = VolumeLoader::load_from_directory("dicom", &AssemblyOptions::default())
//!     .expect("should have loaded files from directory");
//! println!("{:?} voxels, spacing {:?}", volume.dimensions(), volume.spacing());
//! ```

pub mod assembler;
pub mod enums;
pub mod error;
mod geometry;
pub mod pipeline;
pub mod resolver;
pub mod slice_record;
pub mod sorter;
pub mod volume;
pub mod volume_loader;

pub use assembler::VolumeAssembler;
pub use enums::{PixelKind, SortBy};
pub use error::{AssemblyError, BoxError};
pub use pipeline::{AssemblyOptions, AssemblyPipeline, SliceSource};
pub use resolver::PixelTypeResolver;
pub use slice_record::{PixelData, SliceRecord};
pub use sorter::{SliceOrdering, SpatialSorter};
pub use volume::{ScalarBuffer, Volume, VolumeMetadata};
pub use volume_loader::{DicomSliceSource, VolumeLoader};
