//! Deterministic output names.
//!
//! `{YYYYMMDD}_LEVEL2_{platform}I{A|D}_SIG_N{lat}_E{lon}.tif`, where the
//! platform is the two-character mission code and the coordinates are the
//! scene centroid times ten, rounded half to even, sign dropped, zero-padded
//! to four digits. Scenes that share date, platform, direction and rounded
//! centroid therefore share an output file.

use forcesar_core::SceneRecord;

pub const OUTPUT_EXTENSION: &str = "tif";

/// Centroid ordinate as encoded in file names: `48.3` -> `483`, `-9.1` -> `91`.
pub fn coordinate_code(value: f64) -> u64 {
    (value * 10.0).round_ties_even().abs() as u64
}

/// Two-character mission code, e.g. `S1` for `S1A`.
pub fn platform_code(platform: &str) -> String {
    platform.chars().take(2).collect::<String>().to_uppercase()
}

/// File stem without extension.
pub fn output_stem(scene: &SceneRecord) -> String {
    format!(
        "{}_LEVEL2_{}I{}_SIG_N{:04}_E{:04}",
        scene.acquisition_date.format("%Y%m%d"),
        platform_code(&scene.platform),
        scene.orbit_direction.initial(),
        coordinate_code(scene.centroid_lat),
        coordinate_code(scene.centroid_lon),
    )
}

/// File name with extension.
pub fn output_name(scene: &SceneRecord) -> String {
    format!("{}.{}", output_stem(scene), OUTPUT_EXTENSION)
}
