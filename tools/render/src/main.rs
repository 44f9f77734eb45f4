//! Raster layer visualizer — renders a serialized Grid to PNG with a min/max
//! stretch and a colour palette. Presentation only; not part of the data
//! contract.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use trailenv_core::Grid;

#[derive(Parser, Debug)]
#[command(name = "render", about = "Render a Grid JSON asset to PNG")]
struct Args {
    /// Grid JSON file to render.
    #[arg(short, long)]
    input: PathBuf,

    /// Output PNG path (defaults to the input with a .png extension).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stretch minimum (defaults per palette).
    #[arg(long)]
    min: Option<f32>,

    /// Stretch maximum (defaults per palette).
    #[arg(long)]
    max: Option<f32>,

    /// Palette: ndvi, elevation, density, or eco.
    #[arg(short, long, default_value = "ndvi")]
    palette: String,
}

// ── Palettes ──────────────────────────────────────────────────────────────────

/// The ecosystem class colours, classes 1–10.
const ECO_COLORS: [[u8; 3]; 10] = [
    [0x00, 0x91, 0x1d], // 1 forest
    [0xbc, 0xbc, 0xbc], // 2 alpine
    [0xb4, 0xff, 0x8e], // 3 tundra
    [0x38, 0xff, 0xe7], // 4 wetland
    [0xf2, 0xe3, 0x41], // 5 semi-natural
    [0xeb, 0x56, 0xff], // 6 open land
    [0x21, 0x63, 0xff], // 7 sea
    [0x19, 0xb8, 0xf7], // 8 freshwater
    [0xf2, 0x8f, 0x84], // 9 cropland
    [0xff, 0x00, 0x00], // 10 urban
];

const NODATA_COLOR: [u8; 3] = [40, 40, 40];

/// Linear ramp through the given colour stops, t in [0, 1].
fn ramp(stops: &[[u8; 3]], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let segments = (stops.len() - 1) as f32;
    let pos = t * segments;
    let i = (pos.floor() as usize).min(stops.len() - 2);
    let f = pos - i as f32;
    let (a, b) = (stops[i], stops[i + 1]);
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * f) as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * f) as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * f) as u8,
    ]
}

struct Palette {
    stops: Vec<[u8; 3]>,
    default_min: f32,
    default_max: f32,
    categorical: bool,
}

fn palette(name: &str) -> Result<Palette> {
    let p = match name {
        "ndvi" => Palette {
            stops: vec![[255, 255, 255], [255, 255, 0], [0, 128, 0]],
            default_min: 0.0,
            default_max: 1.0,
            categorical: false,
        },
        "elevation" => Palette {
            stops: vec![[0, 0, 0], [255, 255, 255]],
            default_min: 0.0,
            default_max: 400.0,
            categorical: false,
        },
        "density" => Palette {
            stops: vec![[255, 255, 255], [0, 0, 255], [0, 0, 0]],
            default_min: 0.0,
            default_max: 0.5,
            categorical: false,
        },
        "eco" => Palette {
            stops: ECO_COLORS.to_vec(),
            default_min: 1.0,
            default_max: 10.0,
            categorical: true,
        },
        other => bail!("unknown palette {other:?} (expected ndvi, elevation, density, or eco)"),
    };
    Ok(p)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file = File::open(&args.input)
        .with_context(|| format!("cannot open {}", args.input.display()))?;
    let grid: Grid = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not a Grid asset", args.input.display()))?;

    let pal = palette(&args.palette)?;
    let min = args.min.unwrap_or(pal.default_min);
    let max = args.max.unwrap_or(pal.default_max);
    if max <= min {
        bail!("stretch max ({max}) must exceed min ({min})");
    }

    let mut img = image::RgbImage::new(grid.width as u32, grid.height as u32);
    for row in 0..grid.height {
        for col in 0..grid.width {
            let v = grid.get(row, col);
            let rgb = if v.is_nan() {
                NODATA_COLOR
            } else if pal.categorical {
                // Integral class codes index the palette directly.
                let code = v.round() as i64;
                if (1..=pal.stops.len() as i64).contains(&code) {
                    pal.stops[(code - 1) as usize]
                } else {
                    NODATA_COLOR
                }
            } else {
                ramp(&pal.stops, (v - min) / (max - min))
            };
            img.put_pixel(col as u32, row as u32, image::Rgb(rgb));
        }
    }

    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("png"));
    img.save(&output)
        .with_context(|| format!("cannot write {}", output.display()))?;
    println!(
        "rendered {:?} ({}x{}) -> {}",
        grid.name,
        grid.width,
        grid.height,
        output.display()
    );
    Ok(())
}
