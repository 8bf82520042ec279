use std::{env, path::PathBuf, process::ExitCode};

use log::{error, info};
use slice_volume::{pipeline::AssemblyOptions, volume_loader::VolumeLoader};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let directory = env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("dicom"), PathBuf::from);

    let volume = match VolumeLoader::load_from_directory(&directory, &AssemblyOptions::default()) {
        Ok(volume) => volume,
        Err(err) => {
            error!("Failed to assemble {}: {err}", directory.display());
            return ExitCode::FAILURE;
        }
    };

    let metadata = volume.metadata();
    info!("dimensions: {:?}", volume.dimensions());
    info!("spacing: {:?}", volume.spacing());
    info!("origin: {:?}", volume.origin());
    info!("direction: {:?}", volume.direction());
    info!("pixel kind: {}", volume.pixel_kind());
    info!("modality: {}", metadata.modality);
    if let Some((min, max)) = volume.scalar_range() {
        info!("scalar range: {min} .. {max}");
    }

    ExitCode::SUCCESS
}
