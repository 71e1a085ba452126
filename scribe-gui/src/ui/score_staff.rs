//! # Score Staff Widget
//!
//! Draws a [`ScoreLayout`] on a canvas: staff lines, clef, time signature,
//! ledger lines, noteheads, stems and flags. All positions come from the
//! layout; this widget only paints.

use iced::widget::canvas::{self, Frame, Geometry, Path, Stroke, Text};
use iced::widget::container;
use iced::{mouse, Color, Element, Length, Point, Rectangle, Renderer, Theme};
use scribe_core::score::{PlacedNote, ScoreLayout, StaffLine, CLEF_WIDTH, LINE_SPACING, TIME_SIGNATURE};
use scribe_core::RhythmicSymbol;

const NOTEHEAD_RADIUS: f32 = 4.5;
const STEM_LENGTH: f32 = 35.0;
const LEDGER_HALF_WIDTH: f32 = 8.0;
const INK: Color = Color::BLACK;
const PAPER: Color = Color::WHITE;
const WARNING: Color = Color::from_rgb(0.75, 0.1, 0.1);

pub struct ScoreStaff {
    layout: ScoreLayout,
}

impl ScoreStaff {
    pub fn new(layout: ScoreLayout) -> Self {
        Self { layout }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        let width = self.layout.width;
        let height = self.layout.height;
        container(
            canvas::Canvas::new(self)
                .width(Length::Fixed(width))
                .height(Length::Fixed(height)),
        )
        .into()
    }
}

impl<Message> canvas::Program<Message> for ScoreStaff {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill(&Path::rectangle(Point::ORIGIN, bounds.size()), PAPER);

        for line in &self.layout.lines {
            draw_stave(&mut frame, line);
            for note in &line.notes {
                draw_note(&mut frame, note);
            }
        }

        vec![frame.into_geometry()]
    }
}

fn thin() -> Stroke<'static> {
    Stroke::default().with_width(1.0).with_color(INK)
}

fn draw_stave(frame: &mut Frame, line: &StaffLine) {
    let top = line.top_line_y();
    for i in 0..5 {
        let y = top + i as f32 * LINE_SPACING;
        frame.stroke(
            &Path::line(Point::new(line.x, y), Point::new(line.x + line.width, y)),
            thin(),
        );
    }
    // Barlines at both ends
    for x in [line.x, line.x + line.width] {
        frame.stroke(
            &Path::line(Point::new(x, top), Point::new(x, line.bottom_line_y())),
            thin(),
        );
    }

    frame.fill_text(Text {
        content: "\u{1D11E}".to_string(),
        position: Point::new(line.x + 6.0, top - 14.0),
        color: INK,
        size: 56.0.into(),
        shaping: iced::widget::text::Shaping::Advanced,
        ..Text::default()
    });

    if let Some(error) = &line.error {
        frame.fill_text(Text {
            content: format!("line {} skipped: {}", line.index + 1, error),
            position: Point::new(line.content_start_x(), top + LINE_SPACING),
            color: WARNING,
            size: 13.0.into(),
            ..Text::default()
        });
    }

    if line.show_time_signature {
        let x = line.x + CLEF_WIDTH + 8.0;
        let (beats, unit) = TIME_SIGNATURE;
        for (digit, y) in [(beats, top), (unit, top + 2.0 * LINE_SPACING)] {
            frame.fill_text(Text {
                content: digit.to_string(),
                position: Point::new(x, y - 2.0),
                color: INK,
                size: 22.0.into(),
                ..Text::default()
            });
        }
    }
}

fn draw_note(frame: &mut Frame, note: &PlacedNote) {
    for &y in &note.ledger_lines {
        frame.stroke(
            &Path::line(
                Point::new(note.x - LEDGER_HALF_WIDTH, y),
                Point::new(note.x + LEDGER_HALF_WIDTH, y),
            ),
            thin(),
        );
    }

    if note.sharp {
        frame.fill_text(Text {
            content: "#".to_string(),
            position: Point::new(note.x - 16.0, note.y - 9.0),
            color: INK,
            size: 16.0.into(),
            ..Text::default()
        });
    }

    let head = Path::circle(Point::new(note.x, note.y), NOTEHEAD_RADIUS);
    match note.duration {
        RhythmicSymbol::Half => frame.stroke(&head, Stroke::default().with_width(1.5).with_color(INK)),
        RhythmicSymbol::Quarter | RhythmicSymbol::Eighth => frame.fill(&head, INK),
    }

    let (stem_x, stem_end) = if note.stem_up {
        (note.x + NOTEHEAD_RADIUS, note.y - STEM_LENGTH)
    } else {
        (note.x - NOTEHEAD_RADIUS, note.y + STEM_LENGTH)
    };
    frame.stroke(
        &Path::line(Point::new(stem_x, note.y), Point::new(stem_x, stem_end)),
        Stroke::default().with_width(1.2).with_color(INK),
    );

    if note.duration == RhythmicSymbol::Eighth {
        let direction = if note.stem_up { 1.0 } else { -1.0 };
        let flag = Path::new(|b| {
            b.move_to(Point::new(stem_x, stem_end));
            b.line_to(Point::new(stem_x + 7.0, stem_end + direction * 10.0));
            b.line_to(Point::new(stem_x + 5.0, stem_end + direction * 16.0));
        });
        frame.stroke(&flag, Stroke::default().with_width(1.5).with_color(INK));
    }
}
