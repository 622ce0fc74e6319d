use chrono::Local;
use iced::{
    mouse,
    widget::{
        button,
        canvas::{self, Canvas, Geometry, Path, Stroke},
        column, image, pick_list, row, scrollable, text, text_input, Column, Container,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Size, Task, Theme,
};
use medviscore::imaging::filter;
use medviscore::inference::Classifier;
use medviscore::narrative::{
    GeminiProvider, ImageSource, Language, NarrativeGenerator, NarrativeResult,
};
use medviscore::prelude::{
    AnalysisStage, DetectionRecord, Frame as PixelFrame, Region, StageConfig, StageInput,
};
use medviscore::processing::{DetectStage, PreprocessStage};
use medviscore::report::compose_report;
use std::path::PathBuf;

const DISPLAY_WIDTH: u32 = 600;

fn main() -> iced::Result {
    iced::application(DiagnosticApp::boot, DiagnosticApp::update, DiagnosticApp::view)
        .title(application_title)
        .theme(application_theme)
        .run()
}

fn application_title(_: &DiagnosticApp) -> String {
    "Medical Vision Diagnostic Tool".into()
}

fn application_theme(_: &DiagnosticApp) -> Theme {
    Theme::Dark
}

#[derive(Debug)]
struct DiagnosticApp {
    path_input: String,
    save_input: String,
    language: Language,
    api_key: Option<String>,
    preview: Option<Preview>,
    outcome: Option<AnalysisOutcome>,
    busy: bool,
    status: String,
    history: Vec<String>,
}

#[derive(Debug)]
struct Preview {
    handle: image::Handle,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone)]
struct AnalysisOutcome {
    detection: DetectionRecord,
    narrative: NarrativeResult,
    report: String,
}

#[derive(Debug, Clone)]
enum Message {
    PathChanged(String),
    SavePathChanged(String),
    LanguageSelected(Language),
    LoadImage,
    Analyze,
    AnalysisFinished(Result<AnalysisOutcome, String>),
    SaveReport,
}

impl DiagnosticApp {
    fn boot() -> (Self, Task<Message>) {
        let api_key = std::env::var("GEMINI_API_KEY").ok();
        let status = if api_key.is_some() {
            "Ready".into()
        } else {
            "GEMINI_API_KEY is not set; analysis will fail until it is".into()
        };
        (
            DiagnosticApp {
                path_input: String::new(),
                save_input: String::new(),
                language: Language::English,
                api_key,
                preview: None,
                outcome: None,
                busy: false,
                status,
                history: Vec::new(),
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::PathChanged(value) => {
                state.path_input = value;
                Task::none()
            }
            Message::SavePathChanged(value) => {
                state.save_input = value;
                Task::none()
            }
            Message::LanguageSelected(language) => {
                state.language = language;
                Task::none()
            }
            Message::LoadImage => {
                match load_preview(&state.path_input) {
                    Ok(preview) => {
                        state.preview = Some(preview);
                        state.outcome = None;
                        state.status = format!("Loaded: {}", file_label(&state.path_input));
                        state.push_history(format!("Loaded {}", file_label(&state.path_input)));
                    }
                    Err(err) => {
                        state.status = format!("Could not load image: {err}");
                    }
                }
                Task::none()
            }
            Message::Analyze => {
                if state.busy || state.preview.is_none() {
                    return Task::none();
                }
                let api_key = match &state.api_key {
                    Some(key) => key.clone(),
                    None => {
                        state.status = "GEMINI_API_KEY is not set".into();
                        return Task::none();
                    }
                };
                state.busy = true;
                state.status = "Analyzing image...".into();
                let path = PathBuf::from(state.path_input.clone());
                let language = state.language;
                Task::perform(
                    run_analysis(path, api_key, language),
                    Message::AnalysisFinished,
                )
            }
            Message::AnalysisFinished(Ok(outcome)) => {
                state.busy = false;
                let summary = if outcome.detection.has_anomaly {
                    "Analysis complete: Anomalies detected"
                } else {
                    "Analysis complete: No anomalies detected"
                };
                state.status = summary.into();
                state.push_history(summary.into());
                state.outcome = Some(outcome);
                Task::none()
            }
            Message::AnalysisFinished(Err(err)) => {
                state.busy = false;
                state.status = format!("Analysis failed: {err}");
                state.push_history("Analysis failed".into());
                Task::none()
            }
            Message::SaveReport => {
                let Some(outcome) = &state.outcome else {
                    return Task::none();
                };
                if state.save_input.trim().is_empty() {
                    state.status = "Enter a path to save the report".into();
                    return Task::none();
                }
                match std::fs::write(&state.save_input, &outcome.report) {
                    Ok(()) => {
                        state.status = format!("Report saved to {}", file_label(&state.save_input));
                        state.push_history("Report saved".into());
                    }
                    Err(err) => {
                        state.status = format!("Could not save report: {err}");
                    }
                }
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let analyze_button = if state.busy || state.preview.is_none() {
            button("Analyze").padding(10)
        } else {
            button("Analyze").on_press(Message::Analyze).padding(10)
        };
        let save_button = if state.outcome.is_some() {
            button("Save Report").on_press(Message::SaveReport).padding(10)
        } else {
            button("Save Report").padding(10)
        };

        let controls = column![
            text("Medical Image").size(26),
            text_input("Image path", &state.path_input)
                .on_input(Message::PathChanged)
                .padding(6),
            button("Load Image").on_press(Message::LoadImage).padding(10),
            pick_list(Language::ALL, Some(state.language), Message::LanguageSelected),
            analyze_button,
            text_input("Save report as...", &state.save_input)
                .on_input(Message::SavePathChanged)
                .padding(6),
            save_button,
            text(&state.status).size(14),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(320.0));

        let mut results = Column::new().spacing(10).padding(16).width(Length::Fill);
        results = results.push(text("Results").size(26));

        if let Some(preview) = &state.preview {
            results = results.push(
                image(preview.handle.clone())
                    .width(Length::Fixed(preview.width as f32))
                    .height(Length::Fixed(preview.height as f32)),
            );
            if let Some(outcome) = &state.outcome {
                if outcome.detection.has_anomaly {
                    let overlay = Canvas::new(RegionMap::new(
                        &outcome.detection.regions,
                        preview.width as f32,
                        preview.height as f32,
                    ))
                    .width(Length::Fixed(preview.width as f32))
                    .height(Length::Fixed(120.0));
                    results = results.push(text("Flagged regions").size(16));
                    results = results.push(overlay);
                }
            }
        } else {
            results = results.push(text("Load an image to begin").size(14));
        }

        if let Some(outcome) = &state.outcome {
            let region_lines = if outcome.detection.regions.is_empty() {
                Column::new().push(text("No regions reported").size(12))
            } else {
                outcome.detection.regions.iter().enumerate().fold(
                    Column::new().spacing(4),
                    |col, (idx, region)| {
                        col.push(
                            text(format!(
                                "#{}: ({}, {}) {}x{} | score {:.2}",
                                idx + 1,
                                region.x,
                                region.y,
                                region.width,
                                region.height,
                                region.score
                            ))
                            .size(12),
                        )
                    },
                )
            };
            results = results.push(region_lines);
            if let Some(failure) = &outcome.narrative.error {
                results = results.push(
                    text(format!("AI analysis unavailable: {}", failure.category.label()))
                        .size(13),
                );
            }
            results = results.push(text("Report").size(16));
            results = results.push(
                Container::new(
                    scrollable(text(outcome.report.clone()).size(13))
                        .height(Length::Fixed(260.0)),
                )
                .padding(6),
            );
        }

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };
        results = results.push(text("Activity log").size(16));
        results = results.push(
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        );

        let layout = row![controls, results]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

fn file_label(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn load_preview(path: &str) -> Result<Preview, String> {
    let frame = PixelFrame::open(path).map_err(|err| err.to_string())?;
    let display = if frame.width() > DISPLAY_WIDTH {
        let ratio = DISPLAY_WIDTH as f32 / frame.width() as f32;
        let height = ((frame.height() as f32 * ratio).round() as u32).max(1);
        filter::resize_area(&frame, DISPLAY_WIDTH, height).map_err(|err| err.to_string())?
    } else {
        frame
    };

    let (width, height) = (display.width(), display.height());
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for pixel in display.pixels().chunks_exact(3) {
        rgba.extend_from_slice(pixel);
        rgba.push(0xFF);
    }
    Ok(Preview {
        handle: image::Handle::from_rgba(width, height, rgba),
        width,
        height,
    })
}

/// Runs the four-stage pipeline off the display thread; the result is
/// marshaled back to `update` as a message.
async fn run_analysis(
    path: PathBuf,
    api_key: String,
    language: Language,
) -> Result<AnalysisOutcome, String> {
    let stage_config = StageConfig::default();

    let frame = PixelFrame::open(&path).map_err(|err| err.to_string())?;

    let mut preprocess_stage = PreprocessStage::new(4);
    preprocess_stage
        .initialize(&stage_config)
        .map_err(|err| err.to_string())?;
    let preprocess_output = preprocess_stage
        .execute(StageInput {
            frame,
            timestamp: None,
        })
        .map_err(|err| err.to_string())?;
    preprocess_stage.cleanup();

    let mut detect_stage = DetectStage::new(Classifier::pretrained());
    detect_stage
        .initialize(&stage_config)
        .map_err(|err| err.to_string())?;
    let detect_output = detect_stage
        .execute(StageInput {
            frame: preprocess_output.frame,
            timestamp: None,
        })
        .map_err(|err| err.to_string())?;
    detect_stage.cleanup();

    let detection = detect_output
        .metadata
        .detection
        .ok_or_else(|| "detect stage produced no record".to_string())?;

    let generator = NarrativeGenerator::new(Box::new(GeminiProvider::new(&api_key, None)));
    let narrative = generator
        .analyze(ImageSource::Path(&path), Some(&detection), language)
        .await;

    let report = compose_report(&path, &detection, &narrative, Local::now().date_naive());

    Ok(AnalysisOutcome {
        detection,
        narrative,
        report,
    })
}

#[derive(Clone)]
struct RegionMap {
    regions: Vec<Region>,
    reference_width: f32,
    reference_height: f32,
}

impl RegionMap {
    fn new(regions: &[Region], reference_width: f32, reference_height: f32) -> Self {
        Self {
            regions: regions.to_vec(),
            reference_width: reference_width.max(1.0),
            reference_height: reference_height.max(1.0),
        }
    }
}

impl canvas::Program<Message> for RegionMap {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        let scale_x = bounds.width / self.reference_width;
        let scale_y = bounds.height / self.reference_height;

        for region in &self.regions {
            let top_left = Point::new(region.x as f32 * scale_x, region.y as f32 * scale_y);
            let size = Size::new(
                (region.width as f32 * scale_x).max(2.0),
                (region.height as f32 * scale_y).max(2.0),
            );
            let outline = Path::rectangle(top_left, size);
            frame.stroke(
                &outline,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb(0.95, 0.25, 0.2)),
            );

            let marker_radius = 2.0 + region.score * 3.0;
            let marker = Path::new(|builder| builder.circle(top_left, marker_radius));
            frame.fill(&marker, Color::from_rgb(0.95, 0.55, 0.2));
        }

        vec![frame.into_geometry()]
    }
}
