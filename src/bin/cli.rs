use anyhow::{anyhow, Context};
use resolens::{Preset, PreviewSession, ResolensConfig, SessionOptions};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    resolens::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: resolens-cli <command> [args]");
        eprintln!("Commands: info, list-devices, list-formats, acquire, adjust, snapshot, demo");
        std::process::exit(1);
    }

    let config = ResolensConfig::load_or_default();

    let command = &args[1];
    match command.as_str() {
        "info" => cmd_info(&args),
        "list-devices" => cmd_list_devices(&config, &args),
        "list-formats" => cmd_list_formats(&config, &args),
        "acquire" => cmd_acquire(&config, &args).await,
        "adjust" => cmd_adjust(&config, &args).await,
        "snapshot" => cmd_snapshot(&config, &args).await,
        "demo" => cmd_demo(&config, &args).await,
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn cmd_info(args: &[String]) -> anyhow::Result<()> {
    let info = resolens::get_info();
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("{} {} ({})", info.name, info.version, info.platform.as_str());
        println!("{}", info.description);
        println!(
            "camera permission: {}",
            resolens::permissions::check_permission()
        );
    }
    Ok(())
}

fn cmd_list_devices(config: &ResolensConfig, args: &[String]) -> anyhow::Result<()> {
    let options = config.session_options();
    let devices = resolens::source::list_devices(&options.synthetic);
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&devices)?);
    } else {
        for d in devices {
            println!("{}: {}", d.id, d.label);
        }
    }
    Ok(())
}

fn cmd_list_formats(config: &ResolensConfig, args: &[String]) -> anyhow::Result<()> {
    if args.len() < 3 {
        eprintln!("Usage: resolens-cli list-formats <device_id>");
        std::process::exit(1);
    }
    let device_id = &args[2];
    let options = config.session_options();
    let formats = resolens::source::list_formats(device_id, &options.synthetic)?;
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&formats)?);
    } else {
        for f in formats {
            println!("{}", f);
        }
    }
    Ok(())
}

async fn cmd_acquire(config: &ResolensConfig, args: &[String]) -> anyhow::Result<()> {
    let preset = parse_preset(config, args.get(2))?;
    let session = open_session(config, args);

    match session.request_preset(preset).await {
        Ok(()) => {
            if args.contains(&"--json".to_string()) {
                let summary = serde_json::json!({
                    "preset": preset.as_str(),
                    "width_readout": session.width_readout(),
                    "dimensions": session.dimensions(),
                });
                println!("{}", serde_json::to_string(&summary)?);
            } else {
                println!("{}", session.dimension_text());
                if let Some(width) = session.width_readout() {
                    println!("width readout: {}", width);
                }
            }
        }
        Err(_) => {
            let message = session
                .error_message()
                .unwrap_or_else(|| "unknown failure".to_string());
            println!("{}", message);
        }
    }

    session.release();
    Ok(())
}

async fn cmd_adjust(config: &ResolensConfig, args: &[String]) -> anyhow::Result<()> {
    if args.len() < 4 {
        eprintln!("Usage: resolens-cli adjust <preset> <width> [--lock-aspect]");
        std::process::exit(1);
    }
    let preset = parse_preset(config, args.get(2))?;
    let width: u32 = args[3]
        .parse()
        .with_context(|| format!("invalid width: {}", args[3]))?;
    let lock_aspect = args.contains(&"--lock-aspect".to_string());

    let session = open_session(config, args);
    if session.request_preset(preset).await.is_err() {
        let message = session
            .error_message()
            .unwrap_or_else(|| "unknown failure".to_string());
        println!("{}", message);
        return Ok(());
    }
    println!("before: {}", session.dimension_text());

    match session.apply_width(width, lock_aspect).await {
        Ok(()) => println!("after:  {}", session.dimension_text()),
        Err(_) => {
            let message = session
                .error_message()
                .unwrap_or_else(|| "unknown failure".to_string());
            println!("{}", message);
        }
    }

    session.release();
    Ok(())
}

async fn cmd_snapshot(config: &ResolensConfig, args: &[String]) -> anyhow::Result<()> {
    if args.len() < 3 {
        eprintln!("Usage: resolens-cli snapshot <path> [preset]");
        std::process::exit(1);
    }
    let file_path = args[2].clone();
    let preset = parse_preset(config, args.get(3))?;

    let session = open_session(config, args);
    session
        .request_preset(preset)
        .await
        .map_err(|e| anyhow!("acquisition failed: {}", e))?;
    let frame = session
        .capture_frame()
        .await
        .map_err(|e| anyhow!("capture failed: {}", e))?;
    session.release();

    let img = image::RgbImage::from_vec(frame.width, frame.height, frame.data)
        .ok_or_else(|| anyhow!("Failed to create image from frame data"))?;
    let dynamic_img = image::DynamicImage::ImageRgb8(img);

    let format = if file_path.to_lowercase().ends_with(".jpg")
        || file_path.to_lowercase().ends_with(".jpeg")
    {
        image::ImageFormat::Jpeg
    } else {
        image::ImageFormat::Png
    };

    let path = file_path.clone();
    tokio::task::spawn_blocking(move || dynamic_img.save_with_format(&path, format))
        .await?
        .with_context(|| format!("Failed to save frame to {}", file_path))?;

    println!("Frame saved to {}", file_path);
    Ok(())
}

async fn cmd_demo(config: &ResolensConfig, args: &[String]) -> anyhow::Result<()> {
    let preset = parse_preset(config, args.get(2))?;
    let lock_aspect = args.contains(&"--lock-aspect".to_string());
    let session = open_session(config, args);

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("Failed to install ctrl-c handler")?;

    if session.request_preset(preset).await.is_err() {
        let message = session
            .error_message()
            .unwrap_or_else(|| "unknown failure".to_string());
        println!("{}", message);
        return Ok(());
    }
    println!("{}", session.dimension_text());
    println!("stepping width down by {}px per tick; ctrl-c to stop", config.demo.width_step);

    let start_width = session.width_readout().unwrap_or(640);
    let mut width = start_width;

    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(config.demo.tick_interval_ms)).await;
        if !running.load(Ordering::SeqCst) {
            break;
        }

        width = if width > config.demo.width_step + 160 {
            width - config.demo.width_step
        } else {
            start_width
        };

        match session.apply_width(width, lock_aspect).await {
            Ok(()) => println!("width {} -> {}", width, session.tick()),
            Err(_) => {
                if let Some(message) = session.error_message() {
                    println!("width {} -> {}", width, message);
                }
            }
        }
    }

    session.release();
    println!("released");
    Ok(())
}

fn open_session(config: &ResolensConfig, args: &[String]) -> PreviewSession {
    let mut options: SessionOptions = config.session_options();
    if let Some(pos) = args.iter().position(|a| a == "--device") {
        if let Some(device_id) = args.get(pos + 1) {
            options = options.with_device(device_id);
        }
    }
    PreviewSession::new(options)
}

fn parse_preset(config: &ResolensConfig, arg: Option<&String>) -> anyhow::Result<Preset> {
    let name = arg
        .filter(|s| !s.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| config.capture.default_preset.clone());
    name.parse::<Preset>().map_err(|e| anyhow!(e))
}
