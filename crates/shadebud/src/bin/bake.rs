//! Bake the split-sum BRDF table, and optionally irradiance and prefiltered
//! cube faces for an equirectangular environment, to disk.

use std::path::{Path, PathBuf};
use std::time::Instant;

use glam::Vec3;
use image::{ImageBuffer, Rgb, Rgb32FImage};
use shadebud::cubemap::{bake_irradiance_cubemap, bake_prefiltered_cubemap};
use shadebud::{BrdfLut, CubeFace, CubeMap, EquirectEnvironment, Error, IblConfig, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: shadebud-bake [--config <file.json>] [--out <dir>] [--env <image>] [--lut-only]";

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    env: Option<PathBuf>,
    lut_only: bool,
    help: bool,
}

impl Args {
    fn parse(args: &[String]) -> Result<Self> {
        let mut res = Args::default();

        let mut i = 0;
        let len = args.len();
        while i < len {
            let arg = &args[i];

            if arg == "--config" {
                i += 1;
                let Some(path) = args.get(i) else {
                    return Err(Error::Args("--config needs a path".to_string()));
                };
                res.config = Some(PathBuf::from(path));
            } else if arg == "--out" || arg == "-o" {
                i += 1;
                let Some(path) = args.get(i) else {
                    return Err(Error::Args("--out needs a directory".to_string()));
                };
                res.out = Some(PathBuf::from(path));
            } else if arg == "--env" {
                i += 1;
                let Some(path) = args.get(i) else {
                    return Err(Error::Args("--env needs an image path".to_string()));
                };
                res.env = Some(PathBuf::from(path));
            } else if arg == "--lut-only" {
                res.lut_only = true;
            } else if arg == "--help" || arg == "-h" {
                res.help = true;
            } else {
                return Err(Error::Args(format!("unrecognized argument '{arg}'")));
            }

            i += 1;
        }

        Ok(res)
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn to_u16(x: f32) -> u16 {
    (x.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
}

fn write_lut(lut: &BrdfLut, out: &Path) -> Result<()> {
    let img = ImageBuffer::from_fn(lut.angle_bins(), lut.roughness_bins(), |x, y| {
        let e = lut.get(x, y);
        Rgb([to_u16(e.scale), to_u16(e.bias), 0u16])
    });
    let png = out.join("brdf_lut.png");
    img.save(&png)?;

    let raw = out.join("brdf_lut.rg16f");
    std::fs::write(&raw, lut.to_rg16f_bytes())?;

    info!("wrote {} and {}", png.display(), raw.display());
    Ok(())
}

/// One linear Radiance HDR file per face, named `<prefix>_<face>.hdr`.
fn write_cube(cube: &CubeMap, out: &Path, prefix: &str) -> Result<()> {
    let size = cube.face_size;
    for face in CubeFace::ALL {
        let img = Rgb32FImage::from_fn(size, size, |x, y| {
            Rgb(cube.texel(face, x, y).max(Vec3::ZERO).to_array())
        });
        img.save(out.join(format!("{prefix}_{}.hdr", face.label())))?;
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => IblConfig::load(path)?,
        None => IblConfig::default(),
    };
    let out = args.out.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out)?;

    let start = Instant::now();
    let lut = BrdfLut::generate(&config.lut);
    info!(
        "generated {}x{} brdf lut ({} samples) in {:?}",
        lut.angle_bins(),
        lut.roughness_bins(),
        config.lut.sample_count,
        start.elapsed()
    );
    write_lut(&lut, &out)?;

    if args.lut_only {
        return Ok(());
    }

    let Some(env_path) = args.env else {
        info!("no --env given, skipping cubemaps");
        return Ok(());
    };

    let env = EquirectEnvironment::open(&env_path)?;
    info!(
        "loaded {} ({}x{})",
        env_path.display(),
        env.width(),
        env.height()
    );

    let start = Instant::now();
    let irradiance = bake_irradiance_cubemap(&env, config.irradiance_face_size);
    write_cube(&irradiance, &out, "irradiance")?;
    info!("irradiance done in {:?}", start.elapsed());

    let start = Instant::now();
    let prefilter = config.prefilter;
    let mips = bake_prefiltered_cubemap(
        &env,
        prefilter.face_size,
        prefilter.mip_count,
        prefilter.sample_count,
    );
    for (mip, cube) in mips.iter().enumerate() {
        write_cube(cube, &out, &format!("prefiltered_mip{mip}"))?;
    }
    info!("{} prefiltered mips done in {:?}", mips.len(), start.elapsed());

    Ok(())
}

fn main() {
    setup_logging();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match Args::parse(&argv) {
        Ok(args) => args,
        Err(err) => {
            error!("{err}");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    if args.help {
        println!("{USAGE}");
        return;
    }

    if let Err(err) = run(args) {
        error!("bake failed: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_flags() {
        let args = Args::parse(&strings(&[
            "--config", "ibl.json", "--out", "baked", "--env", "sky.hdr", "--lut-only",
        ]))
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("ibl.json")));
        assert_eq!(args.out, Some(PathBuf::from("baked")));
        assert_eq!(args.env, Some(PathBuf::from("sky.hdr")));
        assert!(args.lut_only);
    }

    #[test]
    fn missing_value_is_an_error() {
        assert!(matches!(
            Args::parse(&strings(&["--out"])),
            Err(Error::Args(_))
        ));
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(Args::parse(&strings(&["--frobnicate"])).is_err());
    }

    #[test]
    fn cube_faces_keep_radiance_above_one() {
        let dir = tempfile::tempdir().unwrap();
        let cube = CubeMap::from_fn(2, |_| Vec3::splat(8.0));
        write_cube(&cube, dir.path(), "irradiance").unwrap();

        for face in CubeFace::ALL {
            let path = dir.path().join(format!("irradiance_{}.hdr", face.label()));
            let img = image::open(path).unwrap().into_rgb32f();
            assert_eq!(img.dimensions(), (2, 2));
            let texel = img.get_pixel(1, 0).0;
            assert!((texel[0] - 8.0).abs() < 0.1, "{texel:?}");
        }
    }

    #[test]
    fn lut_only_bake_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ibl.json");
        std::fs::write(
            &path,
            r#"{ "lut": { "angle_bins": 8, "roughness_bins": 4, "sample_count": 16 } }"#,
        )
        .unwrap();

        run(Args {
            config: Some(path),
            out: Some(dir.path().join("out")),
            lut_only: true,
            ..Default::default()
        })
        .unwrap();

        let raw = std::fs::read(dir.path().join("out/brdf_lut.rg16f")).unwrap();
        assert_eq!(raw.len(), 8 * 4 * 4);
        let png = image::open(dir.path().join("out/brdf_lut.png")).unwrap();
        assert_eq!((png.width(), png.height()), (8, 4));
    }
}
