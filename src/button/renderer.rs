// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Frame renderer for the download button.
//!
//! The renderer turns the current [`ButtonState`] and the latest
//! [`AnimationFrame`] into a list of [`DrawCommand`]s. It owns the animation
//! clock and drives it from a state machine listener, so the clock starts and
//! stops inside the same `transition` call that writes the state.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use unicode_width::UnicodeWidthStr;

use super::clock::{AnimationClock, AnimationFrame};
use super::state::{ButtonState, ButtonStateMachine, Effect, ListenerId, Transition};
use crate::colors::Rgb;

/// Horizontal gap between the label bounds and the progress circle.
pub const PROGRESS_CIRCLE_GAP: f32 = 16.0;

/// Circle radius as a fraction of half the shorter side.
const PROGRESS_CIRCLE_RATIO: f32 = 0.4;

/// Axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// One paint operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect { rect: RectF, color: Rgb },
    /// Text centered in `bounds`
    Text {
        text: String,
        bounds: RectF,
        color: Rgb,
        size: f32,
    },
    /// Filled pie slice inside `bounds`, angles in degrees
    Arc {
        bounds: RectF,
        start_angle: f32,
        sweep_angle: f32,
        color: Rgb,
    },
}

/// Paint operations for one frame, in painting order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Size of a measured label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

/// Text metrics provided by the host.
pub trait TextMeasurer {
    fn measure(&self, text: &str, size: f32) -> TextSize;
}

/// Measures every column as `size * advance` wide, using display width so
/// wide glyphs count twice.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvanceMeasurer {
    pub advance: f32,
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn measure(&self, text: &str, size: f32) -> TextSize {
        TextSize {
            width: UnicodeWidthStr::width(text) as f32 * size * self.advance,
            height: size,
        }
    }
}

/// Labels and colors of the button.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonStyle {
    pub start_label: String,
    pub busy_label: String,
    pub idle_background: Rgb,
    pub busy_background: Rgb,
    pub text_color: Rgb,
    pub progress_color: Rgb,
    pub text_size: f32,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        Self {
            start_label: "Download".to_string(),
            busy_label: "We are loading".to_string(),
            idle_background: Rgb::new(0x07, 0xC2, 0xAA),
            busy_background: Rgb::new(0x00, 0x43, 0x49),
            text_color: Rgb::WHITE,
            progress_color: Rgb::new(0xF9, 0xA8, 0x25),
            text_size: 55.0,
        }
    }
}

#[derive(Debug, Clone)]
struct LabelLayout {
    label: String,
    text_bounds: RectF,
    circle_bounds: RectF,
}

fn apply_effects(clock: &mut AnimationClock, transition: &Transition) {
    for effect in &transition.effects {
        match effect {
            Effect::StartClock => clock.start_at(transition.at),
            Effect::StopClock => clock.stop(),
        }
    }
}

pub struct AnimatedRenderer {
    machine: Rc<RefCell<ButtonStateMachine>>,
    clock: Rc<RefCell<AnimationClock>>,
    listener: ListenerId,
    style: ButtonStyle,
    measurer: Box<dyn TextMeasurer>,
    size: Option<(f32, f32)>,
    circle_radius: f32,
    layout: Option<LabelLayout>,
    measurements: u64,
}

impl AnimatedRenderer {
    /// Attach a renderer to `machine`. The renderer's clock follows the
    /// machine from here on, including the current state.
    pub fn new(
        machine: Rc<RefCell<ButtonStateMachine>>,
        style: ButtonStyle,
        cycle: Duration,
        measurer: Box<dyn TextMeasurer>,
    ) -> Self {
        let clock = Rc::new(RefCell::new(AnimationClock::new(cycle)));
        let listener_clock = Rc::clone(&clock);
        let listener = {
            let mut machine = machine.borrow_mut();
            if machine.current() == ButtonState::InProgress {
                clock.borrow_mut().start();
            }
            machine.subscribe(move |transition: &Transition| {
                apply_effects(&mut listener_clock.borrow_mut(), transition);
            })
        };

        Self {
            machine,
            clock,
            listener,
            style,
            measurer,
            size: None,
            circle_radius: 0.0,
            layout: None,
            measurements: 0,
        }
    }

    pub fn style(&self) -> &ButtonStyle {
        &self.style
    }

    pub fn size(&self) -> Option<(f32, f32)> {
        self.size
    }

    /// Whether the animation clock is currently running.
    pub fn is_animating(&self) -> bool {
        self.clock.borrow().is_running()
    }

    /// Number of text measurements performed so far.
    pub fn measurement_count(&self) -> u64 {
        self.measurements
    }

    /// Record the layout size. Non-positive sizes count as unknown.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            self.size = None;
            self.layout = None;
            return;
        }
        self.size = Some((width, height));
        self.circle_radius = (width.min(height) / 2.0) * PROGRESS_CIRCLE_RATIO;
        self.clock.borrow_mut().set_extent(width);
        self.layout = None;
    }

    /// Latest animation values, if the clock runs.
    pub fn sample(&self, now: Instant) -> Option<AnimationFrame> {
        self.clock.borrow().sample(now)
    }

    /// Paint operations for the frame at `now`.
    pub fn render(&mut self, now: Instant) -> Frame {
        let Some((width, height)) = self.size else {
            return Frame::default();
        };
        let state = self.machine.borrow().current();
        let animation = match state {
            ButtonState::InProgress => self.sample(now),
            _ => None,
        };

        let label = match state {
            ButtonState::InProgress => self.style.busy_label.clone(),
            ButtonState::Idle | ButtonState::Clicked | ButtonState::Completed => {
                self.style.start_label.clone()
            }
        };
        let layout = self.layout_for(&label, width, height);

        let mut commands = Vec::with_capacity(4);
        match state {
            ButtonState::InProgress => {
                let fill = animation
                    .map(|frame| frame.fill_offset_pixels)
                    .unwrap_or(0.0)
                    .clamp(0.0, width);
                commands.push(DrawCommand::FillRect {
                    rect: RectF::new(0.0, 0.0, fill, height),
                    color: self.style.busy_background,
                });
                commands.push(DrawCommand::FillRect {
                    rect: RectF::new(fill, 0.0, width, height),
                    color: self.style.idle_background,
                });
            }
            _ => commands.push(DrawCommand::FillRect {
                rect: RectF::new(0.0, 0.0, width, height),
                color: self.style.idle_background,
            }),
        }

        commands.push(DrawCommand::Text {
            text: layout.label,
            bounds: layout.text_bounds,
            color: self.style.text_color,
            size: self.style.text_size,
        });

        if state == ButtonState::InProgress {
            commands.push(DrawCommand::Arc {
                bounds: layout.circle_bounds,
                start_angle: 0.0,
                sweep_angle: animation.map(|frame| frame.sweep_angle_degrees).unwrap_or(0.0),
                color: self.style.progress_color,
            });
        }

        Frame { commands }
    }

    fn layout_for(&mut self, label: &str, width: f32, height: f32) -> LabelLayout {
        if let Some(layout) = self.layout.as_ref().filter(|layout| layout.label == label) {
            return layout.clone();
        }

        let measured = self.measurer.measure(label, self.style.text_size);
        self.measurements += 1;

        let left = (width - measured.width) / 2.0;
        let top = (height - measured.height) / 2.0;
        let text_bounds = RectF::new(left, top, left + measured.width, top + measured.height);

        let radius = self.circle_radius;
        let center_x = text_bounds.right + PROGRESS_CIRCLE_GAP + radius;
        let center_y = height / 2.0;
        let circle_bounds = RectF::new(
            center_x - radius,
            center_y - radius,
            center_x + radius,
            center_y + radius,
        );

        let layout = LabelLayout {
            label: label.to_string(),
            text_bounds,
            circle_bounds,
        };
        self.layout = Some(layout.clone());
        layout
    }
}

impl Drop for AnimatedRenderer {
    fn drop(&mut self) {
        if let Ok(mut machine) = self.machine.try_borrow_mut() {
            machine.unsubscribe(self.listener);
        }
    }
}
