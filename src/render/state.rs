use std::time::Duration;

use crate::{
    clock::TimeSource,
    display::{format_raw, DisplayFormat},
};

use super::{
    animator::{AnimationMode, AnimationState, BounceAnimator, Size},
    color::{Background, ColorPolicy, Rgb, TEXT_COLOR},
};

pub const PLACEHOLDER_TEXT: &str = "Please wait while clock initializes...";

/// Bouncing needs a higher rate for smooth motion (~60 fps vs ~15 fps).
pub const BOUNCE_FRAME_PERIOD: Duration = Duration::from_millis(16);
pub const CENTERED_FRAME_PERIOD: Duration = Duration::from_millis(66);

/// Everything the drawing surface needs for one paint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub background: Background,
    pub text_color: Rgb,
}

/// Text extent as the drawing surface would render it.
pub trait TextMeasure {
    fn measure(&self, text: &str) -> Size;
}

impl<F> TextMeasure for F
where
    F: Fn(&str) -> Size,
{
    fn measure(&self, text: &str) -> Size {
        self(text)
    }
}

/// Fixed-pitch measurement, enough for terminals and tests.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMeasure {
    pub char_width: i32,
    pub line_height: i32,
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str) -> Size {
        Size::new(
            text.chars().count() as i32 * self.char_width,
            self.line_height,
        )
    }
}

pub struct RenderState {
    time: TimeSource,
    display_format: i32,
    animator: BounceAnimator,
    colors: ColorPolicy,
    last_frame: Frame,
}

impl RenderState {
    pub fn new(
        time: TimeSource,
        display_format: i32,
        logo_mode: bool,
        colors: ColorPolicy,
    ) -> Self {
        let animator = BounceAnimator::new(mode_for(logo_mode));
        let last_frame = Frame {
            text: PLACEHOLDER_TEXT.to_string(),
            x: 0,
            y: 0,
            background: colors.resolve(),
            text_color: TEXT_COLOR,
        };
        Self {
            time,
            display_format,
            animator,
            colors,
            last_frame,
        }
    }

    /// Computes the next frame: formatted time, its position, and colors.
    pub fn tick(&mut self, measure: &dyn TextMeasure, container: Size) -> Frame {
        let text = format_raw(&self.time.now(), self.display_format);
        let AnimationState { x, y, .. } = self.animator.step(measure.measure(&text), container);

        self.last_frame = Frame {
            text,
            x,
            y,
            background: self.colors.resolve(),
            text_color: TEXT_COLOR,
        };
        self.last_frame.clone()
    }

    /// The last frame produced, or the placeholder before the first tick.
    pub fn current_frame(&self) -> &Frame {
        &self.last_frame
    }

    pub fn display_format(&self) -> Option<DisplayFormat> {
        DisplayFormat::from_raw(self.display_format)
    }

    pub fn display_format_raw(&self) -> i32 {
        self.display_format
    }

    /// Returns the new format, or `None` (no change) for an unknown value.
    pub fn toggle_show_date(&mut self) -> Option<DisplayFormat> {
        self.apply_toggle(DisplayFormat::toggle_show_date)
    }

    pub fn toggle_hour_format(&mut self) -> Option<DisplayFormat> {
        self.apply_toggle(DisplayFormat::toggle_hour_format)
    }

    pub fn logo_mode(&self) -> bool {
        self.animator.mode() == AnimationMode::Bounce
    }

    pub fn set_logo_mode(&mut self, enabled: bool) {
        self.animator.set_mode(mode_for(enabled));
    }

    pub fn animation(&self) -> AnimationState {
        self.animator.state()
    }

    pub fn colors(&self) -> ColorPolicy {
        self.colors
    }

    pub fn set_colors(&mut self, colors: ColorPolicy) {
        self.colors = colors;
    }

    pub fn frame_period(&self) -> Duration {
        if self.logo_mode() {
            BOUNCE_FRAME_PERIOD
        } else {
            CENTERED_FRAME_PERIOD
        }
    }

    fn apply_toggle(
        &mut self,
        toggle: fn(DisplayFormat) -> DisplayFormat,
    ) -> Option<DisplayFormat> {
        let next = toggle(self.display_format()?);
        self.display_format = next.as_raw();
        Some(next)
    }
}

fn mode_for(logo_mode: bool) -> AnimationMode {
    if logo_mode {
        AnimationMode::Bounce
    } else {
        AnimationMode::Centered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::NaiveDate;
    use std::sync::Arc;

    const MEASURE: MonospaceMeasure = MonospaceMeasure {
        char_width: 10,
        line_height: 20,
    };

    fn source() -> TimeSource {
        let local = NaiveDate::from_ymd_opt(2025, 4, 5)
            .unwrap()
            .and_hms_opt(14, 7, 9)
            .unwrap();
        TimeSource::new(Arc::new(ManualClock::new(local)))
    }

    #[test]
    fn placeholder_before_first_tick() {
        let state = RenderState::new(source(), 0, false, ColorPolicy::default());
        assert_eq!(state.current_frame().text, PLACEHOLDER_TEXT);
    }

    #[test]
    fn centered_frame_has_text_position_and_colors() {
        let mut state = RenderState::new(source(), 1, false, ColorPolicy::default());
        let frame = state.tick(&MEASURE, Size::new(800, 600));

        assert_eq!(frame.text, "14:07:09");
        assert_eq!((frame.x, frame.y), ((800 - 80) / 2, (600 - 20) / 2));
        assert_eq!(frame.background, Background::Solid { color: Rgb::BLACK });
        assert_eq!(frame.text_color, Rgb::WHITE);
        assert_eq!(state.current_frame(), &frame);
    }

    #[test]
    fn bounce_frames_move_each_tick() {
        let mut state = RenderState::new(source(), 0, true, ColorPolicy::new(true, false));
        let first = state.tick(&MEASURE, Size::new(800, 600));
        let second = state.tick(&MEASURE, Size::new(800, 600));

        assert_eq!((first.x, first.y), (12, 12));
        assert_eq!((second.x, second.y), (14, 14));
        assert_eq!(
            first.background,
            Background::Gradient {
                top: Rgb::RED,
                bottom: Rgb::BLACK
            }
        );
    }

    #[test]
    fn toggles_change_rendered_text() {
        let mut state = RenderState::new(source(), 0, false, ColorPolicy::default());
        assert_eq!(state.tick(&MEASURE, Size::new(800, 600)).text, "2025-04-05 14:07:09");

        assert_eq!(state.toggle_hour_format(), Some(DisplayFormat::ShowDate12));
        assert_eq!(state.tick(&MEASURE, Size::new(800, 600)).text, "2025-04-05 02:07:09 PM");

        assert_eq!(state.toggle_show_date(), Some(DisplayFormat::HideDate12));
        assert_eq!(state.tick(&MEASURE, Size::new(800, 600)).text, "02:07:09 PM");
        assert_eq!(state.display_format_raw(), 3);
    }

    #[test]
    fn unknown_format_renders_sentinel_and_ignores_toggles() {
        let mut state = RenderState::new(source(), 9, false, ColorPolicy::default());
        assert_eq!(state.tick(&MEASURE, Size::new(800, 600)).text, "Invalid format");
        assert_eq!(state.toggle_show_date(), None);
        assert_eq!(state.display_format_raw(), 9);
    }

    #[test]
    fn frame_period_follows_logo_mode() {
        let mut state = RenderState::new(source(), 0, false, ColorPolicy::default());
        assert_eq!(state.frame_period(), Duration::from_millis(66));
        state.set_logo_mode(true);
        assert_eq!(state.frame_period(), Duration::from_millis(16));
        assert_eq!(state.animation().mode, AnimationMode::Bounce);
    }

    #[test]
    fn closures_can_measure_text() {
        let mut state = RenderState::new(source(), 1, false, ColorPolicy::default());
        let measure = |_: &str| Size::new(100, 50);
        let frame = state.tick(&measure, Size::new(300, 150));
        assert_eq!((frame.x, frame.y), (100, 50));
    }
}
