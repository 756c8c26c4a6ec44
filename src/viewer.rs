use crate::error::{Error, Result};
use eframe::egui;
use log::{debug, info};

/// A rendered figure as packed 8-bit RGB rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Shows a rendered figure to the operator; returns once it is dismissed.
pub trait Viewer {
    fn show(&self, title: &str, frame: &RgbFrame) -> Result<()>;
}

/// Native window, blocks until the user closes it.
pub struct WindowViewer;

/// Skips the display step (batch runs, tests).
pub struct Headless;

impl Viewer for Headless {
    fn show(&self, title: &str, _frame: &RgbFrame) -> Result<()> {
        debug!("headless run, not displaying {}", title);
        Ok(())
    }
}

impl Viewer for WindowViewer {
    fn show(&self, title: &str, frame: &RgbFrame) -> Result<()> {
        let image = egui::ColorImage::from_rgb(
            [frame.width as usize, frame.height as usize],
            &frame.pixels,
        );
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title(title)
                .with_inner_size([frame.width as f32, frame.height as f32])
                .with_min_inner_size([320.0, 180.0]),
            ..Default::default()
        };
        info!("showing the figure, close the window to save it");
        eframe::run_native(
            title,
            options,
            Box::new(|_cc| {
                Ok(Box::new(FigureWindow {
                    image,
                    texture: None,
                }))
            }),
        )
        .map_err(|e| Error::Viewer(e.to_string()))
    }
}

struct FigureWindow {
    image: egui::ColorImage,
    texture: Option<egui::TextureHandle>,
}

impl eframe::App for FigureWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let image = &self.image;
        let texture = self.texture.get_or_insert_with(|| {
            ctx.load_texture("figure", image.clone(), egui::TextureOptions::LINEAR)
        });
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(egui::Color32::WHITE))
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.add(
                        egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                            .shrink_to_fit(),
                    );
                });
            });
    }
}
