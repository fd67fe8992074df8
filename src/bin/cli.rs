// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! HPP mesh CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use hpp_mesh::geometry::{analyze, CutPlane};
use hpp_mesh::io::{self, HppFile, MeshFile};
use hpp_mesh::{HostMesh, Mesh, MeshConfig};
use log::{debug, warn};
use nalgebra::{Point3, Vector3};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "hppmesh")]
#[command(about = "Validate, weld, cut and inspect HPP mesh files", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./hppmesh.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print statistics of every mesh in a file
    Info {
        input: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check that files decode and their meshes are closed
    Validate {
        /// Files or directories (searched for .hppmesh files)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Cut a mesh with a plane and cap the opening
    Cut {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Point on the plane as x,y,z
        #[arg(long, value_parser = parse_vector)]
        point: Vector3<f32>,

        /// Plane normal as x,y,z, the part in front of the plane is kept
        #[arg(long, value_parser = parse_vector)]
        normal: Vector3<f32>,

        /// Submesh receiving the cap faces
        #[arg(long, default_value_t = 0)]
        cap_submesh: usize,

        /// Mark cap faces as smooth
        #[arg(long)]
        smooth: bool,
    },

    /// Remove redundant vertices
    Weld {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write every loose part of a mesh to its own file
    Split {
        input: PathBuf,

        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Build a mesh file from exported host JSON
    Import {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => {
            let mut config = MeshConfig::from_file(path)?;
            config.apply_env()?;
            config
        }
        None => MeshConfig::load()?,
    };
    debug!("Using {:?}", config);

    match cli.command {
        Commands::Info { input, json } => info_command(&input, json),
        Commands::Validate { paths } => validate_command(&paths, &config),
        Commands::Cut {
            input,
            output,
            point,
            normal,
            cap_submesh,
            smooth,
        } => {
            let plane = CutPlane::new(Point3::from(point), normal)
                .with_submesh(cap_submesh)
                .with_smooth(smooth)
                .with_halving_style(config.halving_style);
            cut_command(&input, &output, &plane, &config)
        }
        Commands::Weld { input, output } => weld_command(&input, &output, &config),
        Commands::Split { input, out_dir } => split_command(&input, &out_dir),
        Commands::Import { input, output } => import_command(&input, &output),
    }
}

fn parse_vector(s: &str) -> Result<Vector3<f32>, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid number in {:?}: {}", s, e))?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z but got {} values", parts.len())),
    }
}

fn read_hpp(path: &Path) -> Result<HppFile> {
    io::read_file(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_hpp(path: &Path, file: &HppFile) -> Result<()> {
    io::write_file(path, file).with_context(|| format!("Failed to write {}", path.display()))
}

fn read_mesh_file(path: &Path) -> Result<MeshFile> {
    match read_hpp(path)? {
        HppFile::Mesh(file) => Ok(file),
        HppFile::Scene(_) => bail!("{} is a scene file, expected a mesh file", path.display()),
    }
}

fn info_command(input: &Path, json: bool) -> Result<()> {
    let file = read_hpp(input)?;
    let stats: Vec<_> = file.meshes().iter().map(analyze).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{} {}", file.magic().bold(), input.display().to_string().cyan());
    if let HppFile::Mesh(mesh_file) = &file {
        if let Some(armature) = &mesh_file.armature {
            println!(
                "  {} {} bones, {} actions",
                "Armature:".bright_black(),
                armature.bones.len(),
                armature.actions.len()
            );
        }
        println!("  {} {}", "Materials:".bright_black(), mesh_file.materials.len());
    }
    for s in &stats {
        s.print();
    }
    Ok(())
}

fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "hppmesh"))
            {
                files.push(entry.into_path());
            }
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn validate_command(paths: &[PathBuf], config: &MeshConfig) -> Result<()> {
    let files = collect_files(paths);
    if files.is_empty() {
        bail!("No .hppmesh files found");
    }

    let mut failures = 0;
    for path in &files {
        let problem = match io::read_file(path) {
            Err(e) => Some(e.to_string()),
            Ok(file) => file
                .meshes()
                .iter()
                .find(|&mesh| !Mesh::clone(mesh).is_closed_with(&config.tolerances))
                .map(|mesh| format!("mesh {:?} is not closed", mesh.name)),
        };
        match problem {
            None => println!("{} {}", "✓".green(), path.display()),
            Some(reason) => {
                failures += 1;
                warn!("Rejected {}: {}", path.display(), reason);
                println!("{} {} {}", "✗".red(), path.display(), reason.bright_black());
            }
        }
    }

    println!(
        "\n{} {} of {} files valid",
        "Summary:".bold(),
        (files.len() - failures).to_string().cyan(),
        files.len()
    );
    if failures > 0 {
        bail!("{} files failed validation", failures);
    }
    Ok(())
}

fn cut_command(input: &Path, output: &Path, plane: &CutPlane, config: &MeshConfig) -> Result<()> {
    let mut file = read_mesh_file(input)?;
    let report = file
        .mesh
        .cut_with_plane_with(plane, &config.tolerances)
        .with_context(|| format!("Failed to cut {}", file.mesh.name))?;

    println!(
        "{} kept {}, split {}, dropped {} triangles",
        "Cut:".bold(),
        report.kept,
        report.split,
        report.dropped
    );
    println!(
        "  {} {} holes, {} islands, {} cap triangles",
        "Cap:".bright_black(),
        report.holes,
        report.islands,
        report.cap_triangles
    );
    match report.welded {
        Some(count) => println!("  {} {} vertices removed", "Weld:".bright_black(), count),
        None => println!("  {} {}", "Weld:".bright_black(), "rolled back".yellow()),
    }

    write_hpp(output, &HppFile::Mesh(file))?;
    println!("{} {}", "Wrote".green(), output.display());
    Ok(())
}

fn weld_command(input: &Path, output: &Path, config: &MeshConfig) -> Result<()> {
    let mut file = read_mesh_file(input)?;
    let before = file.mesh.vertex_count();
    let removed = file
        .mesh
        .merge_useless_vertices_with(&config.tolerances)
        .with_context(|| format!("Failed to weld {}", file.mesh.name))?;

    println!(
        "{} {} -> {} vertices ({} removed)",
        "Weld:".bold(),
        before,
        file.mesh.vertex_count(),
        removed.to_string().cyan()
    );
    write_hpp(output, &HppFile::Mesh(file))?;
    Ok(())
}

fn split_command(input: &Path, out_dir: &Path) -> Result<()> {
    let file = read_mesh_file(input)?;
    let parts = file
        .mesh
        .separate_loose_parts()
        .with_context(|| format!("Failed to split {}", file.mesh.name))?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    for (i, mut part) in parts.into_iter().enumerate() {
        part.name = format!("{}_{}", file.mesh.name, i);
        let path = out_dir.join(format!("{}.hppmesh", part.name));
        let part_file = MeshFile {
            mesh: part,
            armature: file.armature.clone(),
            materials: file.materials.clone(),
        };
        write_hpp(&path, &HppFile::Mesh(part_file))?;
        println!("{} {}", "Wrote".green(), path.display());
    }
    Ok(())
}

fn import_command(input: &Path, output: &Path) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let host: HostMesh = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse host mesh {}", input.display()))?;
    let mesh = Mesh::from_host(host).context("Invalid host mesh")?;

    println!(
        "{} {} vertices, {} triangles, {} quads",
        "Imported:".bold(),
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.quad_count()
    );
    write_hpp(output, &HppFile::Mesh(MeshFile::new(mesh)))?;
    Ok(())
}
