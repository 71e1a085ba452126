//! # Main Display Module
//!
//! Layout of the single application window: title, recording controls, a
//! live status line and the score.

use iced::widget::{button, column, container, horizontal_space, row, scrollable, text, Space};
use iced::{Alignment, Color, Element, Length};

use super::score_staff::ScoreStaff;
use crate::{AppDisplayData, Message, RecordingStatus};

/// Creates the complete main application view
pub fn create_main_view(data: &AppDisplayData) -> Element<'static, Message> {
    let title = text("Melody Scribe").size(28);
    let instructions = text("Start recording and sing or play one note at a time. Each note appears on the staff when it ends.")
        .size(14);

    let main_content = column![
        title,
        instructions,
        Space::with_height(10),
        create_controls(&data.status),
        create_status_line(data),
        Space::with_height(10),
        create_score_panel(data),
    ]
    .spacing(8)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Start/stop, reset and quit buttons.
fn create_controls(status: &RecordingStatus) -> Element<'static, Message> {
    let recording = matches!(
        status,
        RecordingStatus::Starting | RecordingStatus::Listening { .. }
    );
    let (label, color) = if recording {
        ("Stop", Color::from_rgb(0.8, 0.2, 0.2))
    } else {
        ("Start", Color::from_rgb(0.2, 0.6, 0.3))
    };

    let toggle = button(text(label).size(16))
        .padding([8, 20])
        .style(move |_theme, _status| button::Style {
            background: Some(iced::Background::Color(color)),
            text_color: Color::WHITE,
            ..button::Style::default()
        })
        .on_press(Message::ToggleRecording);

    let reset = button(text("Reset").size(16))
        .padding([8, 20])
        .on_press(Message::Reset);

    let quit = button(text("Quit").size(16))
        .padding([8, 20])
        .on_press(Message::Exit);

    row![toggle, reset, horizontal_space(), quit]
        .spacing(10)
        .align_y(Alignment::Center)
        .into()
}

/// Capture state plus what the current frame hears.
fn create_status_line(data: &AppDisplayData) -> Element<'static, Message> {
    let status = match &data.status {
        RecordingStatus::Stopped => "Stopped".to_string(),
        RecordingStatus::Starting => "Opening microphone...".to_string(),
        RecordingStatus::Listening { sample_rate } => format!("Listening ({} Hz)", sample_rate),
        RecordingStatus::Failed(reason) => format!("Microphone unavailable: {}", reason),
    };

    let hearing = data
        .last_report
        .as_ref()
        .and_then(|report| {
            report.frequency.map(|freq| match (report.stable_note, data.cents) {
                (Some(note), Some(cents)) => format!("{}  {:+.0} cents  {:.1} Hz", note, cents, freq),
                (Some(note), None) => format!("{}  {:.1} Hz", note, freq),
                (None, _) => format!("--  {:.1} Hz", freq),
            })
        })
        .unwrap_or_else(|| "--".to_string());

    row![
        text(status).size(14),
        horizontal_space(),
        text(hearing).size(14),
        Space::with_width(20),
        text(format!("{} note(s)", data.note_count)).size(14),
    ]
    .align_y(Alignment::Center)
    .into()
}

fn create_score_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let staff = ScoreStaff::new(data.layout.clone()).view();
    container(scrollable(staff).height(Length::Fill))
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(10)
        .into()
}
