use std::io::{self, Write};
use std::sync::Mutex;

use crate::render::{Frame, FrameSink, MonospaceMeasure, Size, TextMeasure};

/// Terminal front end: one line, one character per pixel column.
///
/// Only the horizontal position is shown. The line is rewritten only when the
/// text or its column changes so the fast bounce rate does not spam stdout.
pub struct ConsoleSink {
    columns: i32,
    measure: MonospaceMeasure,
    last: Mutex<Option<(String, usize)>>,
}

impl ConsoleSink {
    pub fn new(columns: i32) -> Self {
        Self {
            columns: columns.max(1),
            measure: MonospaceMeasure {
                char_width: 1,
                line_height: 1,
            },
            last: Mutex::new(None),
        }
    }

    /// Width from `COLUMNS`, falling back to 80.
    pub fn from_env() -> Self {
        let columns = std::env::var("COLUMNS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(80);
        Self::new(columns)
    }

    fn line_for(&self, frame: &Frame) -> (String, usize) {
        let width = frame.text.chars().count() as i32;
        let max_x = (self.columns - width).max(0);
        let column = frame.x.clamp(0, max_x) as usize;
        (frame.text.clone(), column)
    }
}

impl FrameSink for ConsoleSink {
    fn container_size(&self) -> Size {
        // A few rows so vertical bouncing has room to move.
        Size::new(self.columns, 8)
    }

    fn measure_text(&self, text: &str) -> Size {
        self.measure.measure(text)
    }

    fn present(&self, frame: Frame) {
        let line = self.line_for(&frame);
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if last.as_ref() == Some(&line) {
            return;
        }

        let (text, column) = &line;
        let mut stdout = io::stdout().lock();
        let _ = write!(
            stdout,
            "\r{:width$}\r{:column$}{text}",
            "",
            "",
            width = self.columns as usize,
            column = *column
        );
        let _ = stdout.flush();
        *last = Some(line);
    }
}
