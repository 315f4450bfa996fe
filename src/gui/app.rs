//! Main Iced application for the floorplan-scale GUI.

use chrono::Local;
use iced::event::{self, Event};
use iced::widget::{
    button, canvas, column, container, horizontal_rule, horizontal_space, image, pick_list, row,
    scrollable, stack, text, text_input, vertical_space,
};
use iced::{window, ContentFit, Element, Length, Size, Subscription, Task, Theme};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::calibration::{OverlayRenderer, Raster, ScreenRect};
use crate::detection::{
    decode_png_data_url, DetectionClient, DetectionKind, DetectionRequest, DetectionResponse,
    RequestTicket, SlotState, SourceImage,
};
use crate::export::{default_file_name, write_json, ExportDocument};
use crate::scale::LengthUnit;
use crate::session::CalibrationSession;
use crate::settings::AppSettings;

use super::canvas::{MeasureOverlay, SurfaceClick};
use super::logger::Logger;

const SIDE_PANEL_WIDTH: f32 = 300.0;
const RESULTS_PANEL_WIDTH: f32 = 380.0;
/// Outer padding plus the spacing between the three columns.
const HORIZONTAL_CHROME: f32 = 80.0;
/// Navigation bar, status bar and outer padding.
const VERTICAL_CHROME: f32 = 150.0;

/// Current view/tab of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Main,
    Settings,
    Logs,
}

/// Application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Idle,
    Loading,
    Detecting,
}

/// Messages for the Iced application.
#[derive(Debug, Clone)]
pub enum Message {
    // Navigation
    SwitchView(View),
    WindowResized(Size),

    // Image
    OpenImage,
    ImagePicked(Option<(String, Vec<u8>)>),
    ImageDecoded(u64, SourceImage, Result<Raster, String>),

    // Calibration
    CanvasClicked(SurfaceClick),
    ResetPoints,
    WallLengthChanged(String),
    UnitSelected(LengthUnit),

    // Detection
    Detect(DetectionKind),
    CompareAll,
    DetectionFinished(RequestTicket, Result<DetectionResponse, String>),
    SelectResult(DetectionKind),

    // Output
    ExportResults,
    ExportFinished(Result<Option<PathBuf>, String>),
    SaveAnnotation,
    AnnotationSaved(Result<Option<PathBuf>, String>),

    // Settings
    BaseUrlChanged(String),
    TimeoutChanged(String),
    FontPathChanged(String),
    SaveSettings,
    ResetSettings,
    SettingsSaved(Result<(), String>),
    CheckHealth,
    HealthChecked(Result<bool, String>),

    // Logs
    ClearLogs,
}

/// Cached presentation of a finished detection.
struct ResultView {
    overlay: Option<image::Handle>,
    json: String,
}

/// Main application struct.
pub struct FloorplanApp {
    view: View,
    settings: AppSettings,
    timeout_input: String,

    session: CalibrationSession,
    client: Option<DetectionClient>,
    renderer: OverlayRenderer,

    image_handle: Option<image::Handle>,
    result_views: BTreeMap<DetectionKind, ResultView>,
    selected_result: Option<DetectionKind>,

    state: AppState,
    logger: Logger,
    status: String,
}

impl Default for FloorplanApp {
    fn default() -> Self {
        Self::new()
    }
}

impl FloorplanApp {
    /// Create a new application instance.
    pub fn new() -> Self {
        let settings = AppSettings::load();
        let mut logger = Logger::new();
        logger.info("floorplan-scale GUI started");

        let mut session =
            CalibrationSession::with_wall_length(settings.wall_length_input.clone(), settings.unit);
        session.on_viewport_resize(
            viewport_width(settings.window_width),
            viewport_height(settings.window_height),
        );

        let client = build_client(&settings, &mut logger);
        let renderer = build_renderer(&settings, &mut logger);

        Self {
            view: View::Main,
            timeout_input: settings.request_timeout_secs.to_string(),
            settings,
            session,
            client,
            renderer,
            image_handle: None,
            result_views: BTreeMap::new(),
            selected_result: None,
            state: AppState::Idle,
            logger,
            status: "Open a floor plan to begin".to_string(),
        }
    }

    pub fn title(&self) -> String {
        match self.session.source() {
            Some(source) => format!("Floorplan Scale - {}", source.file_name),
            None => "Floorplan Scale".to_string(),
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Window resizes re-fit the image.
    pub fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::Resized(size)) => Some(Message::WindowResized(size)),
            _ => None,
        })
    }

    /// Update the application state based on messages.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SwitchView(view) => {
                self.view = view;
                Task::none()
            }
            Message::WindowResized(size) => {
                self.session
                    .on_viewport_resize(viewport_width(size.width), viewport_height(size.height));
                Task::none()
            }

            // Image
            Message::OpenImage => Task::perform(pick_image(), Message::ImagePicked),
            Message::ImagePicked(None) => Task::none(),
            Message::ImagePicked(Some((file_name, bytes))) => {
                self.state = AppState::Loading;
                self.status = format!("Decoding {}...", file_name);
                self.logger.info(format!("Loading {} ({} bytes)", file_name, bytes.len()));

                let generation = self.session.begin_image_load();
                let source = SourceImage::new(bytes, file_name);
                Task::perform(decode_image(source), move |(source, result)| {
                    Message::ImageDecoded(generation, source, result)
                })
            }
            Message::ImageDecoded(generation, source, result) => {
                self.state = AppState::Idle;
                match result {
                    Ok(raster) => {
                        let handle = image::Handle::from_rgba(
                            raster.width(),
                            raster.height(),
                            raster.pixels().as_raw().clone(),
                        );
                        let file_name = source.file_name.clone();
                        let (width, height) = (raster.width(), raster.height());
                        if self.session.finish_image_load(generation, source, raster) {
                            self.image_handle = Some(handle);
                            self.result_views.clear();
                            self.selected_result = None;
                            self.logger
                                .success(format!("Loaded {} ({}x{})", file_name, width, height));
                            self.status = "Click two points along a wall of known length".to_string();
                        }
                    }
                    Err(e) => {
                        self.logger.error(format!("Could not load {}: {}", source.file_name, e));
                        self.status = format!("Could not load image: {}", e);
                    }
                }
                Task::none()
            }

            // Calibration
            Message::CanvasClicked(click) => {
                let rect = ScreenRect::at_origin(click.bounds.width as f64, click.bounds.height as f64);
                let measured =
                    self.session
                        .click(click.position.x as f64, click.position.y as f64, &rect);
                if let Some(distance) = measured {
                    self.logger.measure(format!("Pixel distance: {:.2} px", distance));
                    self.report_scale();
                }
                Task::none()
            }
            Message::ResetPoints => {
                self.session.reset_points();
                self.status = "Points cleared".to_string();
                Task::none()
            }
            Message::WallLengthChanged(value) => {
                let unit = self.session.scale().unit();
                self.session.set_wall_length(value.clone(), unit);
                self.settings.wall_length_input = value;
                self.report_scale();
                Task::none()
            }
            Message::UnitSelected(unit) => {
                self.session.set_unit(unit);
                self.settings.unit = unit;
                self.report_scale();
                Task::none()
            }

            // Detection
            Message::Detect(kind) => match self.session.prepare_detection(kind) {
                Ok(request) => {
                    self.result_views.remove(&kind);
                    self.selected_result = Some(kind);
                    self.dispatch(request)
                }
                Err(e) => {
                    self.logger.warning(e.to_string());
                    self.status = e.to_string();
                    Task::none()
                }
            },
            Message::CompareAll => {
                let requests = self.session.prepare_compare_all();
                if requests.is_empty() {
                    self.logger.warning("Nothing to compare: load an image first");
                    return Task::none();
                }
                let skipped = DetectionKind::ALL.len() - requests.len();
                if skipped > 0 {
                    self.logger
                        .info(format!("Skipping {} backends that need a scale", skipped));
                }
                let tasks: Vec<_> = requests
                    .into_iter()
                    .map(|request| {
                        self.result_views.remove(&request.kind());
                        self.dispatch(request)
                    })
                    .collect();
                Task::batch(tasks)
            }
            Message::DetectionFinished(ticket, outcome) => {
                let kind = ticket.kind;
                let view = outcome.as_ref().ok().map(|response| self.result_view(kind, response));
                let summary = match &outcome {
                    Ok(response) => Ok(response.summary()),
                    Err(e) => Err(e.clone()),
                };

                if self.session.complete_detection(ticket, outcome) {
                    match summary {
                        Ok(summary) => {
                            self.logger.detect(format!("{}: {}", kind, summary));
                            self.status = format!("{} finished", kind);
                        }
                        Err(e) => {
                            self.logger.error(format!("{} failed: {}", kind, e));
                            self.status = format!("{} failed", kind);
                        }
                    }
                    if let Some(view) = view {
                        self.result_views.insert(kind, view);
                    }
                }
                if !self.session.results().any_pending() {
                    self.state = AppState::Idle;
                }
                Task::none()
            }
            Message::SelectResult(kind) => {
                self.selected_result = Some(kind);
                Task::none()
            }

            // Output
            Message::ExportResults => {
                let document = ExportDocument::from_session(&self.session);
                Task::perform(export_results(document), Message::ExportFinished)
            }
            Message::ExportFinished(result) => {
                match result {
                    Ok(Some(path)) => {
                        self.logger.success(format!("Exported to {}", path.display()));
                        self.status = "Results exported".to_string();
                    }
                    Ok(None) => {}
                    Err(e) => {
                        self.logger.error(format!("Export failed: {}", e));
                        self.status = format!("Export failed: {}", e);
                    }
                }
                Task::none()
            }
            Message::SaveAnnotation => match self.renderer.render(self.session.surface()) {
                Ok(annotated) => Task::perform(save_annotation(annotated), Message::AnnotationSaved),
                Err(e) => {
                    self.logger.warning(e.to_string());
                    Task::none()
                }
            },
            Message::AnnotationSaved(result) => {
                match result {
                    Ok(Some(path)) => {
                        self.logger.success(format!("Annotation saved to {}", path.display()));
                    }
                    Ok(None) => {}
                    Err(e) => self.logger.error(format!("Saving annotation failed: {}", e)),
                }
                Task::none()
            }

            // Settings
            Message::BaseUrlChanged(value) => {
                self.settings.base_url = value;
                Task::none()
            }
            Message::TimeoutChanged(value) => {
                self.timeout_input = value.clone();
                if let Ok(v) = value.trim().parse::<u64>() {
                    if v > 0 {
                        self.settings.request_timeout_secs = v;
                    }
                }
                Task::none()
            }
            Message::FontPathChanged(value) => {
                self.settings.label_font_path = value;
                Task::none()
            }
            Message::SaveSettings => {
                self.client = build_client(&self.settings, &mut self.logger);
                self.renderer = build_renderer(&self.settings, &mut self.logger);
                let settings = self.settings.clone();
                Task::perform(async move { settings.save() }, Message::SettingsSaved)
            }
            Message::ResetSettings => {
                let wall_length_input = self.settings.wall_length_input.clone();
                let unit = self.settings.unit;
                self.settings = AppSettings {
                    wall_length_input,
                    unit,
                    ..AppSettings::default()
                };
                self.timeout_input = self.settings.request_timeout_secs.to_string();
                self.logger.info("Settings reset to defaults");
                Task::none()
            }
            Message::SettingsSaved(result) => {
                match result {
                    Ok(()) => {
                        self.logger.success("Settings saved");
                        self.status = "Settings saved".to_string();
                    }
                    Err(e) => {
                        self.logger.error(format!("Failed to save settings: {}", e));
                        self.status = format!("Save failed: {}", e);
                    }
                }
                Task::none()
            }
            Message::CheckHealth => match self.client.clone() {
                Some(client) => Task::perform(
                    async move { client.health().await.map_err(|e| e.to_string()) },
                    Message::HealthChecked,
                ),
                None => {
                    self.logger.error("Detection client is not configured");
                    Task::none()
                }
            },
            Message::HealthChecked(result) => {
                match result {
                    Ok(true) => self.logger.success("Detection service is healthy"),
                    Ok(false) => self.logger.warning("Detection service reports not ok"),
                    Err(e) => self.logger.error(format!("Health check failed: {}", e)),
                }
                Task::none()
            }

            // Logs
            Message::ClearLogs => {
                self.logger.clear();
                self.logger.info("Logs cleared");
                Task::none()
            }
        }
    }

    fn dispatch(&mut self, request: DetectionRequest) -> Task<Message> {
        let kind = request.kind();
        let ticket = request.ticket;
        self.state = AppState::Detecting;
        self.logger.detect(format!("Running {}...", kind));

        let client = self.client.clone();
        Task::perform(
            async move {
                match client {
                    Some(client) => client.detect(&request).await.map_err(|e| e.to_string()),
                    None => Err("Detection client is not configured".to_string()),
                }
            },
            move |outcome| Message::DetectionFinished(ticket, outcome),
        )
    }

    fn result_view(&mut self, kind: DetectionKind, response: &DetectionResponse) -> ResultView {
        let overlay = match response.overlay_data_url() {
            Some(url) if !url.is_empty() => match decode_png_data_url(url) {
                Ok(bytes) => Some(image::Handle::from_bytes(bytes)),
                Err(e) => {
                    self.logger.warning(format!("{} overlay unreadable: {}", kind, e));
                    None
                }
            },
            _ => None,
        };
        let json = serde_json::to_string_pretty(response)
            .unwrap_or_else(|e| format!("Failed to format result: {}", e));
        ResultView { overlay, json }
    }

    fn report_scale(&mut self) {
        let scale = self.session.scale();
        if let Some(s) = scale.scale_m_per_px() {
            self.status = format!("Scale: {:.6} m/px", s);
            self.logger.measure(format!("Scale set to {:.6} m/px", s));
        }
    }

    /// Build the view.
    pub fn view(&self) -> Element<'_, Message> {
        let content = match self.view {
            View::Main => self.view_main(),
            View::Settings => self.view_settings(),
            View::Logs => self.view_logs(),
        };

        column![self.view_nav_bar(), content, self.view_status_bar()]
            .spacing(10)
            .padding(20)
            .into()
    }

    fn view_nav_bar(&self) -> Element<'_, Message> {
        let tab = |label: &'static str, view: View| {
            button(text(label))
                .on_press(Message::SwitchView(view))
                .style(if self.view == view {
                    button::primary
                } else {
                    button::secondary
                })
        };

        row![
            tab("📐 Calibrate", View::Main),
            tab("⚙️ Settings", View::Settings),
            tab("📋 Logs", View::Logs),
        ]
        .spacing(10)
        .into()
    }

    fn view_status_bar(&self) -> Element<'_, Message> {
        let state_text = match self.state {
            AppState::Idle => "🟢 Ready",
            AppState::Loading => "🟡 Loading",
            AppState::Detecting => "🔵 Detecting",
        };

        row![
            text(state_text).size(14),
            horizontal_space(),
            text(&self.status).size(14),
        ]
        .padding(10)
        .into()
    }

    fn view_main(&self) -> Element<'_, Message> {
        row![
            self.view_controls(),
            self.view_surface(),
            self.view_results(),
        ]
        .spacing(15)
        .height(Length::Fill)
        .into()
    }

    fn view_controls(&self) -> Element<'_, Message> {
        let scale = self.session.scale();
        let has_image = self.session.surface().has_image();

        let open_btn = button(text("🖼️ Open floor plan"))
            .on_press(Message::OpenImage)
            .padding([8, 16]);

        let image_info = match (self.session.source(), self.session.surface().native_size()) {
            (Some(source), Some((w, h))) => format!("{} ({}x{} px)", source.file_name, w, h),
            _ => "No image loaded".to_string(),
        };

        let wall_input = row![
            text_input("Wall length", scale.raw_input())
                .on_input(Message::WallLengthChanged)
                .width(120),
            pick_list(LengthUnit::ALL, Some(scale.unit()), Message::UnitSelected)
                .width(Length::Fill),
        ]
        .spacing(10);

        let distance = scale
            .pixel_distance()
            .map(|d| format!("Distance: {:.2} px", d))
            .unwrap_or_else(|| "Distance: click two points".to_string());
        let scale_text = scale
            .scale_m_per_px()
            .map(|s| format!("Scale: {:.6} m/px", s))
            .unwrap_or_else(|| "Scale: not set".to_string());

        let reset_btn = button(text("↺ Reset points"))
            .on_press_maybe((!self.session.surface().points().is_empty()).then_some(Message::ResetPoints))
            .style(button::secondary);

        let mut detectors = column![text("Detection").size(18)].spacing(8);
        for kind in DetectionKind::ALL {
            let ready = has_image && (!kind.requires_scale() || scale.has_scale());
            let state = match self.session.results().state(kind) {
                SlotState::Empty => "",
                SlotState::Pending => "running",
                SlotState::Ready(_) => "done",
                SlotState::Failed(_) => "failed",
            };
            detectors = detectors.push(
                row![
                    button(text(kind.to_string()))
                        .on_press_maybe(ready.then_some(Message::Detect(kind)))
                        .width(180),
                    text(state).size(13),
                ]
                .spacing(10),
            );
        }

        let compare_btn = button(text("⚖️ Compare all"))
            .on_press_maybe(has_image.then_some(Message::CompareAll))
            .style(button::success);

        let export_btn = button(text("💾 Export JSON"))
            .on_press(Message::ExportResults)
            .style(button::secondary);
        let annotate_btn = button(text("🖍️ Save annotation"))
            .on_press_maybe(has_image.then_some(Message::SaveAnnotation))
            .style(button::secondary);

        let content = column![
            open_btn,
            text(image_info).size(13),
            horizontal_rule(1),
            text("Reference wall").size(18),
            wall_input,
            text(distance).size(14),
            text(scale_text).size(14),
            reset_btn,
            horizontal_rule(1),
            detectors,
            compare_btn,
            horizontal_rule(1),
            row![export_btn, annotate_btn].spacing(10),
        ]
        .spacing(10);

        scrollable(content).width(SIDE_PANEL_WIDTH).into()
    }

    fn view_surface(&self) -> Element<'_, Message> {
        let surface = self.session.surface();
        let body: Element<'_, Message> = match (
            &self.image_handle,
            surface.display_transform(),
            surface.native_size(),
        ) {
            (Some(handle), Some(transform), Some(native_size)) => {
                let width = transform.width as f32;
                let height = transform.height as f32;
                let overlay = MeasureOverlay::new(surface.overlay(), native_size, Message::CanvasClicked);
                stack![
                    image(handle.clone())
                        .width(width)
                        .height(height)
                        .content_fit(ContentFit::Fill),
                    canvas(overlay).width(width).height(height),
                ]
                .into()
            }
            _ => text("Open a PNG or JPEG floor plan to start measuring").into(),
        };

        container(body)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .style(container::bordered_box)
            .into()
    }

    fn view_results(&self) -> Element<'_, Message> {
        let mut tabs = row![].spacing(5);
        for (kind, _) in self.session.results().ready() {
            tabs = tabs.push(
                button(text(kind.as_str()).size(13))
                    .on_press(Message::SelectResult(kind))
                    .style(if self.selected_result == Some(kind) {
                        button::primary
                    } else {
                        button::secondary
                    }),
            );
        }

        let body: Element<'_, Message> = match self.selected_result {
            None => text("No results yet").size(14).into(),
            Some(kind) => match self.session.results().state(kind) {
                SlotState::Empty => text(format!("{}: no result", kind)).size(14).into(),
                SlotState::Pending => text(format!("{}: running...", kind)).size(14).into(),
                SlotState::Failed(e) => column![
                    text(format!("{} failed", kind)).size(16),
                    text(e.as_str()).size(13).style(text::danger),
                ]
                .spacing(5)
                .into(),
                SlotState::Ready(response) => {
                    let mut col = column![
                        text(kind.to_string()).size(16),
                        text(response.summary()).size(13),
                    ]
                    .spacing(8);
                    if let Some(view) = self.result_views.get(&kind) {
                        if let Some(overlay) = &view.overlay {
                            col = col.push(image(overlay.clone()).width(Length::Fill));
                        }
                        col = col.push(text(&view.json).size(12));
                    }
                    scrollable(col).height(Length::Fill).into()
                }
            },
        };

        column![text("Results").size(18), tabs, body]
            .spacing(10)
            .width(RESULTS_PANEL_WIDTH)
            .height(Length::Fill)
            .into()
    }

    fn view_settings(&self) -> Element<'_, Message> {
        let title = text("⚙️ Settings").size(28);

        let service = column![
            text("🛰️ Detection service").size(18),
            labeled_input(
                "Base URL",
                &self.settings.base_url,
                "http://localhost:8000",
                Message::BaseUrlChanged,
            ),
            labeled_input(
                "Timeout (s)",
                &self.timeout_input,
                "120",
                Message::TimeoutChanged,
            ),
            button(text("Check health"))
                .on_press(Message::CheckHealth)
                .style(button::secondary),
        ]
        .spacing(10);

        let annotation = column![
            text("🖍️ Annotation").size(18),
            labeled_input(
                "Label font",
                &self.settings.label_font_path,
                "/path/to/font.ttf",
                Message::FontPathChanged,
            ),
        ]
        .spacing(10);

        let save_btn = button(text("💾 Save settings"))
            .on_press(Message::SaveSettings)
            .style(button::success)
            .padding([10, 20]);
        let reset_btn = button(text("🔄 Reset defaults"))
            .on_press(Message::ResetSettings)
            .style(button::secondary)
            .padding([10, 20]);

        let content = column![
            title,
            vertical_space().height(10),
            service,
            horizontal_rule(1),
            annotation,
            vertical_space().height(20),
            row![save_btn, reset_btn].spacing(10),
        ]
        .spacing(15)
        .padding(10);

        scrollable(content).height(Length::Fill).into()
    }

    fn view_logs(&self) -> Element<'_, Message> {
        let clear_btn = button(text("🗑️ Clear logs"))
            .on_press(Message::ClearLogs)
            .style(button::secondary);

        let header = row![text("📋 Logs").size(28), horizontal_space(), clear_btn];

        let log_container = container(
            scrollable(text(self.logger.format_all()).size(13)).height(Length::Fill),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(10)
        .style(container::bordered_box);

        let log_path = self
            .logger
            .log_file_path()
            .map(|p| format!("Log file: {}", p.display()))
            .unwrap_or_else(|| "Log file: not created".to_string());

        column![
            header,
            vertical_space().height(10),
            log_container,
            text(log_path).size(12),
        ]
        .spacing(10)
        .height(Length::Fill)
        .into()
    }
}

/// Helper function to create a labeled input row.
fn labeled_input<'a>(
    label: &'a str,
    value: &'a str,
    placeholder: &'a str,
    on_change: impl Fn(String) -> Message + 'a,
) -> Element<'a, Message> {
    row![
        text(label).width(120),
        text_input(placeholder, value)
            .on_input(on_change)
            .width(300),
    ]
    .spacing(10)
    .into()
}

fn viewport_width(window_width: f32) -> f64 {
    (window_width - SIDE_PANEL_WIDTH - RESULTS_PANEL_WIDTH - HORIZONTAL_CHROME).max(0.0) as f64
}

fn viewport_height(window_height: f32) -> f64 {
    (window_height - VERTICAL_CHROME).max(0.0) as f64
}

fn build_client(settings: &AppSettings, logger: &mut Logger) -> Option<DetectionClient> {
    match DetectionClient::new(settings.detection_config()) {
        Ok(client) => Some(client),
        Err(e) => {
            logger.error(format!("Failed to create detection client: {}", e));
            None
        }
    }
}

fn build_renderer(settings: &AppSettings, logger: &mut Logger) -> OverlayRenderer {
    let Some(path) = settings.label_font() else {
        return OverlayRenderer::new();
    };
    OverlayRenderer::new().with_font_file(&path).unwrap_or_else(|e| {
        logger.warning(format!("{}; labels will be omitted", e));
        OverlayRenderer::new()
    })
}

async fn pick_image() -> Option<(String, Vec<u8>)> {
    let file = rfd::AsyncFileDialog::new()
        .set_title("Open floor plan")
        .add_filter("Images", &["png", "jpg", "jpeg"])
        .pick_file()
        .await?;
    let bytes = file.read().await;
    Some((file.file_name(), bytes))
}

async fn decode_image(source: SourceImage) -> (SourceImage, Result<Raster, String>) {
    let bytes = source.bytes.clone();
    let result = tokio::task::spawn_blocking(move || Raster::decode(&bytes))
        .await
        .map_err(|e| e.to_string())
        .and_then(|decoded| decoded.map_err(|e| e.to_string()));
    (source, result)
}

async fn export_results(document: ExportDocument) -> Result<Option<PathBuf>, String> {
    let Some(file) = rfd::AsyncFileDialog::new()
        .set_title("Export results")
        .add_filter("JSON", &["json"])
        .set_file_name(default_file_name(document.exported_at))
        .save_file()
        .await
    else {
        return Ok(None);
    };
    let path = file.path().to_path_buf();
    write_json(&path, &document).map_err(|e| e.to_string())?;
    Ok(Some(path))
}

async fn save_annotation(annotated: ::image::RgbaImage) -> Result<Option<PathBuf>, String> {
    let default_name = format!("floorplan_annotated_{}.png", Local::now().format("%Y%m%d_%H%M%S"));
    let Some(file) = rfd::AsyncFileDialog::new()
        .set_title("Save annotation")
        .add_filter("PNG", &["png"])
        .set_file_name(default_name)
        .save_file()
        .await
    else {
        return Ok(None);
    };
    let path = file.path().to_path_buf();
    annotated
        .save_with_format(&path, ::image::ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_excludes_panels() {
        assert_eq!(viewport_width(1280.0), 520.0);
        assert_eq!(viewport_height(860.0), 710.0);
        assert_eq!(viewport_width(200.0), 0.0);
    }
}
