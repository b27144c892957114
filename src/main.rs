#![windows_subsystem = "windows"]

mod app;
mod dialog;
mod directory;
mod document;
mod error;
mod helpers;
mod plugin;
mod scheduler;
mod settings;
mod toast;

use std::{env, path::PathBuf, sync::Arc};

use app::EditorApp;
use eframe::egui;
use egui::IconData;
use image::{Rgba, RgbaImage};
use settings::SettingsStore;

// floppy disk, drawn instead of shipped
fn load_icon_image() -> Arc<IconData> {
    const SIZE: u32 = 64;
    let image = RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let edge = x < 4 || y < 4 || x >= SIZE - 4 || y >= SIZE - 4;
        let shutter = (18..46).contains(&x) && (4..22).contains(&y);
        let label = (12..52).contains(&x) && (34..60).contains(&y);
        match (edge, shutter, label) {
            (true, _, _) => Rgba([20, 40, 80, 255]),
            (_, true, _) => Rgba([190, 195, 205, 255]),
            (_, _, true) => Rgba([245, 245, 240, 255]),
            _ => Rgba([40, 90, 170, 255]),
        }
    });
    let (w, h) = image.dimensions();

    Arc::new(IconData {
        rgba: image.into_raw(),
        width: w,
        height: h,
    })
}

fn main() -> Result<(), eframe::Error> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let initial = env::args_os().nth(1).map(PathBuf::from);
    let store = SettingsStore::from_env();
    log::info!("settings file: {}", store.path().display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([820.0, 640.0])
            .with_icon(load_icon_image()),
        ..Default::default()
    };

    eframe::run_native(
        "Automatic Backup Editor",
        options,
        Box::new(|_cc| Ok(Box::new(EditorApp::new(initial, store)))),
    )
}
