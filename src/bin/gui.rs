//! GUI entry point for floorplan-scale.
//!
//! Run with: cargo run --bin floorplan-scale-gui

use iced::Size;

use floorplan_scale::gui::FloorplanApp;
use floorplan_scale::AppSettings;

fn main() -> iced::Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let settings = AppSettings::load();

    iced::application(FloorplanApp::title, FloorplanApp::update, FloorplanApp::view)
        .theme(FloorplanApp::theme)
        .subscription(FloorplanApp::subscription)
        .window_size(Size::new(settings.window_width, settings.window_height))
        .run_with(|| (FloorplanApp::new(), iced::Task::none()))
}
