/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! The working store: a directory of named artifacts overwritten on each
//! run. Vector artifacts persist as GeoJSON, rasters as binary float grids
//! with a `.hdr` sidecar. The store assumes single-writer, single-run
//! access.

use std::fs;
use std::path::{Path, PathBuf};

use riparian_raster::Raster;
use riparian_vector::geojson_io::{read_feature_collection, write_feature_collection};
use riparian_vector::FeatureCollection;

use crate::errors::AnalysisError;

pub struct WorkingStore {
    root: PathBuf,
}

impl WorkingStore {
    pub fn open(path: &str) -> Result<WorkingStore, AnalysisError> {
        let root = PathBuf::from(path);
        fs::create_dir_all(&root)
            .map_err(|e| AnalysisError::Input(format!("cannot open working store '{}': {}", path, e)))?;
        Ok(WorkingStore { root })
    }

    pub fn vector_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.geojson", name))
    }

    pub fn raster_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.flt", name))
    }

    /// Path for an exported table or other non-artifact output file.
    pub fn export_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn save_vector(&self, name: &str, fc: &FeatureCollection) -> Result<(), AnalysisError> {
        write_feature_collection(self.vector_path(name), fc)?;
        Ok(())
    }

    pub fn load_vector(&self, name: &str) -> Result<FeatureCollection, AnalysisError> {
        Ok(read_feature_collection(self.vector_path(name))?)
    }

    pub fn save_raster(&self, name: &str, raster: &Raster) -> Result<(), AnalysisError> {
        let mut out = raster.clone();
        out.file_name = self.raster_path(name).to_string_lossy().to_string();
        out.write()?;
        Ok(())
    }

    pub fn load_raster(&self, name: &str) -> Result<Raster, AnalysisError> {
        let path = self.raster_path(name).to_string_lossy().to_string();
        Ok(Raster::new(&path, "r")?)
    }

    /// Removes an artifact by name, whichever representation it has.
    /// Missing files are not an error; a failed run may never have
    /// produced the artifact.
    pub fn delete(&self, name: &str) {
        let _ = fs::remove_file(self.vector_path(name));
        let raster = self.raster_path(name);
        let _ = fs::remove_file(raster.with_extension("hdr"));
        let _ = fs::remove_file(raster);
    }
}

/// Intermediate artifacts owned by one stage. The pipeline retires the
/// scratch only after the following stage has consumed the stage's
/// outputs; failures leave the store as-is for inspection.
#[derive(Default)]
pub struct StageScratch {
    names: Vec<String>,
}

impl StageScratch {
    pub fn new() -> StageScratch {
        StageScratch { names: Vec::new() }
    }

    pub fn add(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    pub fn retire(self, store: &WorkingStore) {
        for name in &self.names {
            tracing::debug!("retiring intermediate artifact '{}'", name);
            store.delete(name);
        }
    }
}
