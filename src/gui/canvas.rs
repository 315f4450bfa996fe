//! Click-to-measure overlay drawn on top of the displayed image.

use iced::alignment;
use iced::mouse;
use iced::widget::canvas::{self, Frame, Geometry, LineDash, Path, Stroke, Text};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Theme};

use crate::calibration::{
    NativePoint, Overlay, FIRST_POINT_COLOR, LABEL_OFFSET, LINE_COLOR, LINE_DASH, POINT_RADIUS,
    SECOND_POINT_COLOR,
};

/// A left click on the surface, relative to its top-left corner, together
/// with the size the surface was actually rendered at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceClick {
    pub position: Point,
    pub bounds: Rectangle,
}

/// Canvas program drawing the point markers, the dashed segment and the label.
pub struct MeasureOverlay<Message> {
    overlay: Overlay,
    native_size: (u32, u32),
    on_click: fn(SurfaceClick) -> Message,
}

impl<Message> MeasureOverlay<Message> {
    pub fn new(overlay: Overlay, native_size: (u32, u32), on_click: fn(SurfaceClick) -> Message) -> Self {
        Self {
            overlay,
            native_size,
            on_click,
        }
    }

    fn to_display(&self, point: NativePoint, bounds: Rectangle) -> Point {
        let (native_w, native_h) = self.native_size;
        let fx = if native_w > 0 { bounds.width / native_w as f32 } else { 1.0 };
        let fy = if native_h > 0 { bounds.height / native_h as f32 } else { 1.0 };
        Point::new(point.x as f32 * fx, point.y as f32 * fy)
    }
}

fn rgb(color: [u8; 3]) -> Color {
    Color::from_rgb8(color[0], color[1], color[2])
}

impl<Message> canvas::Program<Message> for MeasureOverlay<Message> {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        if let canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) = event {
            if let Some(position) = cursor.position_in(bounds) {
                let click = SurfaceClick { position, bounds };
                return (canvas::event::Status::Captured, Some((self.on_click)(click)));
            }
        }
        (canvas::event::Status::Ignored, None)
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());

        if let Some((a, b)) = self.overlay.segment() {
            let line = Path::line(self.to_display(a, bounds), self.to_display(b, bounds));
            frame.stroke(
                &line,
                Stroke {
                    line_dash: LineDash {
                        segments: &LINE_DASH,
                        offset: 0,
                    },
                    ..Stroke::default().with_color(rgb(LINE_COLOR)).with_width(2.0)
                },
            );
        }

        let markers = [
            (self.overlay.first, FIRST_POINT_COLOR),
            (self.overlay.second, SECOND_POINT_COLOR),
        ];
        for (point, color) in markers {
            if let Some(point) = point {
                let center = self.to_display(point, bounds);
                frame.fill(&Path::circle(center, POINT_RADIUS), rgb(color));
                frame.stroke(
                    &Path::circle(center, POINT_RADIUS),
                    Stroke::default().with_color(Color::WHITE).with_width(1.5),
                );
            }
        }

        if let Some(label) = &self.overlay.label {
            let anchor = self.to_display(label.anchor, bounds);
            let position = Point::new(anchor.x, (anchor.y - LABEL_OFFSET).max(0.0));
            let size = 14.0;
            let plate_width = label.text.len() as f32 * size * 0.6 + 8.0;
            frame.fill_rectangle(
                Point::new(position.x - plate_width / 2.0, position.y - size - 4.0),
                iced::Size::new(plate_width, size + 6.0),
                Color::from_rgba(1.0, 1.0, 1.0, 0.85),
            );
            frame.fill_text(Text {
                content: label.text.clone(),
                position,
                color: Color::BLACK,
                size: Pixels(size),
                horizontal_alignment: alignment::Horizontal::Center,
                vertical_alignment: alignment::Vertical::Bottom,
                ..Text::default()
            });
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}
