// -----------------------------------------------------------------------------
// Disk I/O: z-stack loading, cell files, per-frame outputs
// -----------------------------------------------------------------------------

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cell::{Cell, SphereCell, SpherePerturbation};
use crate::engine::{Frame, ImageStack, Plane};
use crate::error::{FitError, FitResult};

const STACK_EXTENSIONS: &[&str] = &["png", "tif", "tiff", "jpg", "jpeg", "bmp"];

fn is_stack_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| STACK_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Every entry of `dir`, sorted. Entry errors propagate.
fn sorted_entries(dir: &Path) -> FitResult<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths)
}

/// Loads every image in `dir` as one z-slice, ordered by file name, as luma in [0, 1].
pub fn load_stack_dir(dir: &Path) -> FitResult<ImageStack> {
    let paths: Vec<PathBuf> = sorted_entries(dir)?
        .into_iter()
        .filter(|p| p.is_file() && is_stack_image(p))
        .collect();

    let mut planes = Vec::with_capacity(paths.len());
    for path in &paths {
        let luma = image::open(path)?.to_luma32f();
        let (w, h) = luma.dimensions();
        planes.push(Plane::from_vec(w as usize, h as usize, luma.into_raw())?);
    }
    tracing::debug!(dir = %dir.display(), slices = planes.len(), "stack loaded");
    ImageStack::from_planes(planes)
}

/// Immediate subdirectories of `root`, sorted by name; each one holds a stack.
pub fn list_stack_dirs(root: &Path) -> FitResult<Vec<PathBuf>> {
    Ok(sorted_entries(root)?.into_iter().filter(|p| p.is_dir()).collect())
}

#[derive(Deserialize)]
struct SphereCellFile {
    #[serde(default)]
    perturbation: Option<SpherePerturbation>,
    cells: Vec<SphereCell>,
}

/// Reads `{ "perturbation": {...}?, "cells": [{ "name", "x", "y", "z", "radius" }, ...] }`.
pub fn load_sphere_cells(path: &Path) -> FitResult<Vec<SphereCell>> {
    let text = fs::read_to_string(path)?;
    let file: SphereCellFile = serde_json::from_str(&text)?;
    if file.cells.is_empty() {
        return Err(FitError::NoCells);
    }
    let perturbation = file.perturbation.unwrap_or_default();
    perturbation.validate()?;
    Ok(file
        .cells
        .into_iter()
        .map(|c| c.with_perturbation(perturbation))
        .collect())
}

/// Writes outline and synthetic slices plus the cell table under
/// `output_path/image_name/`. Returns that directory.
pub fn save_frame_outputs<C: Cell>(frame: &Frame<C>) -> FitResult<PathBuf> {
    let dir = frame.output_path().join(frame.image_name());
    fs::create_dir_all(&dir)?;

    for (i, img) in frame.outline_images().iter().enumerate() {
        img.save(dir.join(format!("outline_{i:03}.png")))?;
    }
    for (i, img) in frame.synth_images().iter().enumerate() {
        img.save(dir.join(format!("synth_{i:03}.png")))?;
    }

    let records = frame.cells_as_records();
    fs::write(dir.join("cells.csv"), records.to_csv())?;
    fs::write(dir.join("cells.json"), records.to_json()?)?;

    tracing::info!(dir = %dir.display(), cells = frame.len(), "outputs written");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sphere_config;
    use image::{GrayImage, Luma};

    #[test]
    fn stack_slices_are_ordered_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        for (name, v) in [("z02.png", 200u8), ("z00.png", 0), ("z01.png", 100)] {
            GrayImage::from_pixel(4, 3, Luma([v])).save(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let stack = load_stack_dir(dir.path()).unwrap();
        assert_eq!((stack.depth(), stack.width(), stack.height()), (3, 4, 3));
        assert_eq!(stack.plane(0).get(0, 0), 0.0);
        assert!((stack.plane(1).get(3, 2) - 100.0 / 255.0).abs() < 1e-6);
        assert!((stack.plane(2).get(1, 1) - 200.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn empty_directory_is_an_empty_stack() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_stack_dir(dir.path()), Err(FitError::EmptyStack)));
    }

    #[test]
    fn unreadable_slices_fail_instead_of_vanishing() {
        let dir = tempfile::tempdir().unwrap();
        GrayImage::new(4, 4).save(dir.path().join("a.png")).unwrap();
        fs::write(dir.path().join("b.png"), b"not a png").unwrap();
        assert!(matches!(load_stack_dir(dir.path()), Err(FitError::Image(_))));

        let missing = dir.path().join("missing");
        assert!(matches!(load_stack_dir(&missing), Err(FitError::Io(_))));
        assert!(matches!(list_stack_dirs(&missing), Err(FitError::Io(_))));
    }

    #[test]
    fn batch_root_lists_only_directories() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("s2")).unwrap();
        fs::create_dir(root.path().join("s1")).unwrap();
        fs::write(root.path().join("readme.txt"), "x").unwrap();
        let dirs = list_stack_dirs(root.path()).unwrap();
        assert_eq!(dirs, vec![root.path().join("s1"), root.path().join("s2")]);
    }

    #[test]
    fn ragged_slices_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        GrayImage::new(4, 4).save(dir.path().join("a.png")).unwrap();
        GrayImage::new(5, 4).save(dir.path().join("b.png")).unwrap();
        assert!(matches!(load_stack_dir(dir.path()), Err(FitError::RaggedStack { index: 1, .. })));
    }

    #[test]
    fn cell_file_applies_shared_perturbation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.json");
        fs::write(
            &path,
            r#"{
                "perturbation": { "min_radius": 2.0 },
                "cells": [
                    { "name": "c1", "x": 4.0, "y": 5.0, "z": 0.0, "radius": 1.0 },
                    { "name": "c2", "x": 9.0, "y": 2.0, "z": 1.0, "radius": 3.0 }
                ]
            }"#,
        )
        .unwrap();

        let cells = load_sphere_cells(&path).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].name, "c1");
        assert_eq!(cells[0].radius, 2.0);
        assert_eq!(cells[1].perturbation().min_radius, 2.0);
    }

    #[test]
    fn cell_file_without_cells_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.json");
        fs::write(&path, r#"{ "cells": [] }"#).unwrap();
        assert!(matches!(load_sphere_cells(&path), Err(FitError::NoCells)));
    }

    #[test]
    fn outputs_land_under_image_name() {
        let out = tempfile::tempdir().unwrap();
        let cfg = sphere_config(2, 1);
        let real = ImageStack::filled(2, 10, 8, 0.0);
        let cells = vec![SphereCell::new("c,1", 5.0, 4.0, 0.0, 2.0)];
        let frame = Frame::new(&real, cfg, cells, out.path(), "stack-a").unwrap();

        let dir = save_frame_outputs(&frame).unwrap();
        assert_eq!(dir, out.path().join("stack-a"));
        for name in ["outline_000.png", "outline_001.png", "synth_000.png", "synth_001.png", "cells.json"] {
            assert!(dir.join(name).is_file(), "missing {name}");
        }
        let csv = fs::read_to_string(dir.join("cells.csv")).unwrap();
        assert!(csv.starts_with("name,x,y,z,radius,file\n"));
        assert!(csv.contains("\"c,1\",5,4,0,2,stack-a"));

        let synth = image::open(dir.join("synth_000.png")).unwrap().to_luma8();
        assert_eq!(synth.dimensions(), (12, 10));
    }
}
