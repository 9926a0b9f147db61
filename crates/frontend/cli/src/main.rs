use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use m64p_vidext::display_modes::{init_fullscreen_modes, NoDisplay};
use m64p_vidext::{ffi, CoreLibrary, HeadlessWindow, Settings, VideoExtension};
use std::ffi::CString;
use std::os::raw::c_int;
use std::path::PathBuf;
use vidext_core::{m64p_error, M64Error, Size2D};

#[derive(Parser)]
#[command(name = "m64vidext", about = "Mupen64Plus video extension tools")]
struct Args {
    /// Settings file (defaults to vidext.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level ("off" .. "trace")
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the fullscreen modes reported to the core
    Modes {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print effective settings as JSON
    Settings {
        /// Also write them back to the settings file
        #[arg(long, default_value_t = false)]
        write: bool,
    },
    /// Load a core library and register the callback table with it
    Register {
        /// Core library path (defaults to the core_library setting)
        core_lib: Option<PathBuf>,
    },
    /// Run one session through the callback table against a headless window
    Selftest,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load_from(&config_path);
    if let Some(level) = args.log_level {
        settings.log_level = level;
    }
    settings
        .apply_logging()
        .context("Failed to open log file")?;

    match args.command {
        Command::Modes { json } => {
            let modes = resolve_modes(&settings);
            if json {
                println!("{}", serde_json::to_string_pretty(modes)?);
            } else {
                for mode in modes {
                    println!("{}", mode);
                }
            }
        }
        Command::Settings { write } => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if write {
                settings
                    .save_to(&config_path)
                    .with_context(|| format!("Failed to write {}", config_path.display()))?;
                log::info!("Wrote {}", config_path.display());
            }
        }
        Command::Register { core_lib } => {
            let Some(path) = core_lib.or_else(|| settings.core_library.clone()) else {
                bail!("No core library given and core_library is not set");
            };
            resolve_modes(&settings);
            let core = CoreLibrary::load(&path)?;
            let version = core.version()?;
            log::info!("Core: {}", version);

            let window = HeadlessWindow::new(640, 480);
            let mut video = VideoExtension::from_settings(&settings);
            video.bind(window);
            ffi::install(video)?;
            core.register_video_extension()?;
            println!(
                "Registered video extension with {} ({})",
                version,
                core.path().display()
            );
        }
        Command::Selftest => {
            resolve_modes(&settings);
            let report = selftest(&settings)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

#[cfg(feature = "sdl2")]
fn resolve_modes(settings: &Settings) -> &'static [Size2D] {
    use m64p_vidext::sdl2_backend::SdlDisplayQuery;

    match SdlDisplayQuery::open() {
        Ok(query) => init_fullscreen_modes(&query, settings.effective_fallback_modes()),
        Err(e) => {
            log::warn!("SDL video unavailable: {}", e);
            init_fullscreen_modes(&NoDisplay, settings.effective_fallback_modes())
        }
    }
}

#[cfg(not(feature = "sdl2"))]
fn resolve_modes(settings: &Settings) -> &'static [Size2D] {
    init_fullscreen_modes(&NoDisplay, settings.effective_fallback_modes())
}

fn expect_success(callback: &str, code: m64p_error) -> Result<()> {
    match M64Error::from_raw(code) {
        Some(status) if status.is_success() => Ok(()),
        other => bail!("{} returned {:?} ({})", callback, other, code),
    }
}

fn selftest(settings: &Settings) -> Result<serde_json::Value> {
    let window = HeadlessWindow::new(640, 480);
    let mut video = VideoExtension::from_settings(settings);
    video.bind(window.clone());
    ffi::install(video)?;

    let table = &m64p_vidext::VIDEO_EXTENSION_FUNCTIONS;
    let missing = || anyhow::anyhow!("callback table has an empty slot");
    let caption = CString::new("SELFTEST")?;
    let mut sizes = vec![Size2D::default(); 64];
    let mut count = sizes.len() as c_int;

    // SAFETY: every slot is one of our trampolines; pointers refer to live
    // locals sized as the callbacks expect.
    unsafe {
        let set_attr = table.VidExtFuncGLSetAttr.ok_or_else(missing)?;
        for (attr, value) in settings.gl.entries() {
            expect_success("VidExtFuncGLSetAttr", set_attr(attr.as_raw(), value))?;
        }
        expect_success("VidExtFuncInit", table.VidExtFuncInit.ok_or_else(missing)?())?;
        expect_success(
            "VidExtFuncListModes",
            table.VidExtFuncListModes.ok_or_else(missing)?(sizes.as_mut_ptr(), &mut count),
        )?;
        expect_success(
            "VidExtFuncSetMode",
            table.VidExtFuncSetMode.ok_or_else(missing)?(640, 480, 32, 1),
        )?;
        let get_attr = table.VidExtFuncGLGetAttr.ok_or_else(missing)?;
        for (attr, mut value) in settings.gl.entries() {
            expect_success("VidExtFuncGLGetAttr", get_attr(attr.as_raw(), &mut value))?;
        }
        expect_success(
            "VidExtFuncSetCaption",
            table.VidExtFuncSetCaption.ok_or_else(missing)?(caption.as_ptr()),
        )?;
        let swap = table.VidExtFuncGLSwapBuf.ok_or_else(missing)?;
        for _ in 0..60 {
            expect_success("VidExtFuncGLSwapBuf", swap())?;
        }
        expect_success("VidExtFuncToggleFS", table.VidExtFuncToggleFS.ok_or_else(missing)?())?;
        expect_success("VidExtFuncQuit", table.VidExtFuncQuit.ok_or_else(missing)?())?;
    }

    window.pump_events();
    ffi::uninstall()?;

    let stats = window.stats();
    sizes.truncate(count.max(0) as usize);
    Ok(serde_json::json!({
        "modes": sizes,
        "format": stats.last_format,
        "contexts_created": stats.contexts_created,
        "swaps": stats.swaps,
        "done_current_calls": stats.done_current_calls,
        "title": window.title(),
        "fullscreen": window.is_fullscreen(),
    }))
}
