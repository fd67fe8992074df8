// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tolerances and tool configuration

use crate::geometry::HalvingStyle;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE: &str = "hppmesh.toml";

/// Numeric tolerances used by validation, welding and cutting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Vertices closer than this are welded when closing a mesh
    pub merge_distance: f32,
    /// Half width of the band around a cut plane treated as on-plane
    pub on_plane: f32,
    /// Snap distance of the edge parameter of a cut point to 0 or 1
    pub cut_param_snap: f32,
    /// Depth below which an edge end is used as the cut point
    pub cut_depth_fallback: f32,
    /// Maximum distance for reusing an existing cut vertex
    pub near_vertex: f32,
    /// Allowed deviation of a cut loop's total turn from 360 degrees
    pub travel_angle: f32,
    /// Maximum offset of a vertex from the line between its neighbors
    pub collinear_distance: f32,
    /// Maximum face normal change in degrees when collapsing a vertex
    pub normal_change_degrees: f32,
    /// Maximum squared UV difference on one side of a collapse line
    pub uv_constant: f32,
    /// Maximum UV interpolation error of a collapsed vertex
    pub uv_interpolation: f32,
    /// Distance a vertex may lie in front of a face of a convex mesh
    pub convex: f32,
    /// Distance a vertex must lie in front of a face to make it concave
    pub concave: f32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            merge_distance: 1e-5,
            on_plane: 1e-4,
            cut_param_snap: 1e-5,
            cut_depth_fallback: 1e-3,
            near_vertex: 1e-5,
            travel_angle: 2.5,
            collinear_distance: 1e-3,
            normal_change_degrees: 0.01,
            uv_constant: 1e-6,
            uv_interpolation: 1e-3,
            convex: 1e-3,
            concave: 1e-2,
        }
    }
}

/// Tool configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub tolerances: Tolerances,
    /// Quad halving used before cutting and ray queries
    pub halving_style: HalvingStyle,
}

impl MeshConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: MeshConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `hppmesh.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `HPPMESH_*` environment variable overrides
    pub fn apply_env(&mut self) -> Result<()> {
        let float_var = |name: &str, target: &mut f32| -> Result<()> {
            if let Ok(value) = std::env::var(name) {
                *target = value
                    .parse()
                    .with_context(|| format!("Invalid value for {}: {:?}", name, value))?;
            }
            Ok(())
        };
        float_var("HPPMESH_MERGE_DISTANCE", &mut self.tolerances.merge_distance)?;
        float_var("HPPMESH_ON_PLANE", &mut self.tolerances.on_plane)?;
        float_var("HPPMESH_NEAR_VERTEX", &mut self.tolerances.near_vertex)?;
        float_var("HPPMESH_TRAVEL_ANGLE", &mut self.tolerances.travel_angle)?;

        if let Ok(style) = std::env::var("HPPMESH_HALVING_STYLE") {
            self.halving_style = parse_halving_style(&style)?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}

/// Parse a halving style name as used in config files
pub fn parse_halving_style(name: &str) -> Result<HalvingStyle> {
    match name.trim().to_ascii_lowercase().as_str() {
        "v0_to_v2" => Ok(HalvingStyle::V0ToV2),
        "v1_to_v3" => Ok(HalvingStyle::V1ToV3),
        "shorter" => Ok(HalvingStyle::Shorter),
        "longer" => Ok(HalvingStyle::Longer),
        other => anyhow::bail!("Unknown halving style: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_tolerances() {
        let t = Tolerances::default();
        assert_eq!(t.merge_distance, 1e-5);
        assert_eq!(t.on_plane, 1e-4);
        assert_eq!(t.travel_angle, 2.5);
    }

    #[test]
    fn test_partial_config_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "halving_style = \"longer\"")?;
        writeln!(file, "[tolerances]")?;
        writeln!(file, "merge_distance = 0.01")?;

        let config = MeshConfig::from_file(file.path())?;
        assert_eq!(config.halving_style, HalvingStyle::Longer);
        assert_eq!(config.tolerances.merge_distance, 0.01);
        // Missing keys keep their defaults
        assert_eq!(config.tolerances.on_plane, 1e-4);
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let file = NamedTempFile::new()?;
        let mut config = MeshConfig::default();
        config.tolerances.concave = 0.5;
        config.save(file.path())?;

        let loaded = MeshConfig::from_file(file.path())?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_parse_halving_style() {
        assert_eq!(parse_halving_style("V0_TO_V2").unwrap(), HalvingStyle::V0ToV2);
        assert_eq!(parse_halving_style(" shorter ").unwrap(), HalvingStyle::Shorter);
        assert!(parse_halving_style("diagonal").is_err());
    }
}
