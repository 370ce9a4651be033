pub mod animator;
pub mod color;
pub mod state;
pub mod ticker;

pub use animator::{step, AnimationMode, AnimationState, BounceAnimator, Size};
pub use color::{parse_color_line, Background, ColorPolicy, Rgb};
pub use state::{Frame, MonospaceMeasure, RenderState, TextMeasure};
pub use ticker::{FrameSink, RenderTicker};
