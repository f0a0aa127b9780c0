use std::{num::NonZeroU32, path::PathBuf};

use anyhow::{Context as _, anyhow};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use octopath::{
    Camera, RenderSettings, Scene,
    geometry::{ScreenSize, WorldPoint, WorldVector},
    integrator::{IntegratorSettings, ShadingModel},
    render,
    scene::{Mesh, Object, OctreeSettings, PointLight, QueryMode},
    util::Rgb,
};

/// Renders a triangle mesh scene to a PNG image.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Wavefront OBJ model to render; a built-in demo scene is used if missing
    model: Option<PathBuf>,

    /// Output PNG file
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,

    #[arg(long, default_value_t = 512)]
    width: u32,

    #[arg(long, default_value_t = 512)]
    height: u32,

    /// Camera samples per pixel
    #[arg(short, long, default_value = "1")]
    samples: NonZeroU32,

    /// Hemisphere samples per hit for indirect light
    #[arg(long, default_value_t = 4)]
    indirect_samples: u32,

    #[arg(long, default_value_t = 2)]
    max_depth: u32,

    #[arg(long, default_value = "32")]
    tile_size: NonZeroU32,

    /// Seed for a reproducible image
    #[arg(long)]
    seed: Option<u64>,

    /// Test every triangle instead of using octrees
    #[arg(long)]
    brute_force: bool,

    /// Diffuse only shading, without the mirror term
    #[arg(long)]
    diffuse_only: bool,

    /// Point light position
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [5.0, 5.0, 5.0])]
    light: Vec<f32>,

    /// Camera position
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [0.0, 0.0, 4.0])]
    camera: Vec<f32>,

    #[arg(long, default_value_t = 45.0)]
    fov: f32,

    /// Dump the octree structure to stdout
    #[arg(long)]
    print_octree: bool,
}

fn point(coords: &[f32]) -> anyhow::Result<WorldPoint> {
    match coords {
        &[x, y, z] => Ok(WorldPoint::new(x, y, z)),
        _ => Err(anyhow!("Expected 3 coordinates, got {}", coords.len())),
    }
}

fn demo_scene(light: PointLight) -> Scene {
    let mut scene = Scene::new(light);
    scene.add_object(Object::new(
        Mesh::uv_sphere(1.0, 48, 24),
        WorldVector::new(-0.6, 0.0, 0.0),
        Rgb::new(0.9, 0.3, 0.2),
    ));
    scene.add_object(Object::new(
        Mesh::cuboid(WorldVector::new(0.8, 1.6, 0.8)),
        WorldVector::new(1.2, -0.2, -0.5),
        Rgb::new(0.3, 0.5, 0.9),
    ));
    scene.add_object(Object::new(
        Mesh::quad(12.0),
        WorldVector::new(0.0, -1.0, 0.0),
        Rgb::new(0.8, 0.8, 0.8),
    ));
    scene
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let light = PointLight {
        position: point(&args.light)?,
    };
    let mut scene = match &args.model {
        Some(path) => {
            let mesh = Mesh::with_obj(path)
                .with_context(|| format!("Loading model {}", path.display()))?;
            let mut scene = Scene::new(light);
            scene.add_object(Object::new(mesh, WorldVector::zeros(), Rgb::new(1.0, 1.0, 1.0)));
            scene
        }
        None => demo_scene(light),
    };

    let query = if args.brute_force {
        QueryMode::BruteForce
    } else {
        scene.build_octrees(OctreeSettings::default());
        QueryMode::Octree
    };

    if args.print_octree {
        for object in &scene.objects {
            if let Some(octree) = object.octree() {
                octree.print_tree();
            }
        }
    }

    let camera = Camera::builder()
        .position(point(&args.camera)?)
        .target(WorldPoint::origin())
        .resolution(ScreenSize::new(args.width, args.height))
        .vertical_fov(args.fov)
        .build()?;

    let settings = RenderSettings {
        tile_size: args.tile_size,
        sample_count: args.samples,
        seed: args.seed,
        integrator: IntegratorSettings::builder()
            .max_depth(args.max_depth)
            .indirect_samples(args.indirect_samples)
            .shading(if args.diffuse_only {
                ShadingModel::DiffuseOnly
            } else {
                ShadingModel::Full
            })
            .query(query)
            .build(),
    };

    let bar = ProgressBar::no_length().with_style(
        ProgressStyle::with_template("{wide_bar} {pos}/{len} tiles, {elapsed} elapsed, eta {eta}")?,
    );
    let mut render_progress = render(scene, camera, settings, |_| {}, {
        let bar = bar.clone();
        move |_, progress| {
            bar.set_length(progress.total as u64);
            bar.set_position(progress.finished as u64);
        }
    })?;
    bar.set_length(render_progress.progress().total as u64);

    render_progress.wait()?;
    bar.finish();
    log::info!("Rendering done in {:.1?}", bar.elapsed());

    render_progress
        .image()
        .lock()
        .map_err(|_| anyhow!("Output image lock was poisoned"))?
        .save(&args.output)
        .with_context(|| format!("Saving {}", args.output.display()))?;
    log::info!("Saved {}", args.output.display());

    Ok(())
}
