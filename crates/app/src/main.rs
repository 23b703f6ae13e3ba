//! Entry point: logging + CLI flags → `platform::run`.

use std::path::PathBuf;

use anyhow::Result;
use platform::ViewerConfig;

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

/// `--name` or `--name=on|off`; absent → `default`.
fn parse_switch(args: &[String], name: &str, default: bool) -> bool {
    let mut value = default;
    for arg in args {
        let Some(rest) = arg.strip_prefix(name) else {
            continue;
        };
        if rest.is_empty() {
            value = true;
        } else if let Some(val) = rest.strip_prefix('=') {
            value = matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    value
}

fn parse_size_args(args: &[String]) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                h = Some(ph);
            }
        }
    }

    let ww = w.unwrap_or(1280).max(1);
    let hh = h.unwrap_or(720).max(1);
    (ww, hh)
}

fn parse_sensitivity_arg(args: &[String], default: f32) -> f32 {
    let mut k = default;
    for arg in args {
        if let Some(v) = arg.strip_prefix("--sensitivity=") {
            match v.parse::<f32>() {
                Ok(parsed) if parsed.is_finite() => k = parsed,
                _ => log::warn!("Ignoring invalid sensitivity '{}'", v),
            }
        }
    }
    k
}

/// Positional (non-flag) argument; the last one wins if several are given.
fn parse_model_path(args: &[String], default: PathBuf) -> PathBuf {
    args.iter()
        .rev()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or(default)
}

/// `args` excludes the program name.
fn parse_config(args: &[String]) -> ViewerConfig {
    let defaults = ViewerConfig::default();
    let (width, height) = parse_size_args(args);
    ViewerConfig {
        model_path: parse_model_path(args, defaults.model_path),
        backends: parse_backend_arg(args),
        show_fps: parse_switch(args, "--show-fps", false),
        width,
        height,
        texture: !parse_switch(args, "--no-texture", false),
        rotation: !parse_switch(args, "--no-rotate", false),
        sensitivity: parse_sensitivity_arg(args, defaults.sensitivity),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_config(&args);
    log::info!(
        "Starting viewer. Model: {}, backend: {:?}, show_fps={}, window_size={}x{}, texture={}, rotation={}, sensitivity={}",
        config.model_path.display(),
        config.backends,
        config.show_fps,
        config.width,
        config.height,
        config.texture,
        config.rotation,
        config.sensitivity
    );

    platform::run(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
