/// Pixels moved per frame on each axis while bouncing.
pub const BOUNCE_SPEED: i32 = 2;
/// Where bouncing starts the first time it is enabled.
pub const BOUNCE_START: (i32, i32) = (10, 10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationMode {
    Bounce,
    Centered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    pub x: i32,
    pub y: i32,
    pub dx: i32,
    pub dy: i32,
    pub mode: AnimationMode,
}

impl AnimationState {
    pub fn centered() -> Self {
        Self {
            x: 0,
            y: 0,
            dx: BOUNCE_SPEED,
            dy: BOUNCE_SPEED,
            mode: AnimationMode::Centered,
        }
    }

    pub fn bouncing() -> Self {
        Self {
            x: BOUNCE_START.0,
            y: BOUNCE_START.1,
            dx: BOUNCE_SPEED,
            dy: BOUNCE_SPEED,
            mode: AnimationMode::Bounce,
        }
    }
}

/// Advances one frame.
///
/// Centered recomputes the position from the sizes every time. Bounce moves
/// by the velocity first, then flips each component whose edge was touched,
/// so text wider than the container flips `dx` on every frame.
pub fn step(prev: AnimationState, text: Size, container: Size) -> AnimationState {
    match prev.mode {
        AnimationMode::Centered => AnimationState {
            x: (container.width - text.width) / 2,
            y: (container.height - text.height) / 2,
            ..prev
        },
        AnimationMode::Bounce => {
            let mut next = prev;
            next.x += next.dx;
            next.y += next.dy;

            if next.x + text.width >= container.width || next.x <= 0 {
                next.dx = -next.dx;
            }
            if next.y + text.height >= container.height || next.y <= 0 {
                next.dy = -next.dy;
            }
            next
        }
    }
}

/// Per-surface animation state carried across frames.
#[derive(Debug, Clone)]
pub struct BounceAnimator {
    state: AnimationState,
    last_bounce: Option<(i32, i32)>,
}

impl BounceAnimator {
    pub fn new(mode: AnimationMode) -> Self {
        let state = match mode {
            AnimationMode::Bounce => AnimationState::bouncing(),
            AnimationMode::Centered => AnimationState::centered(),
        };
        Self {
            state,
            last_bounce: None,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn mode(&self) -> AnimationMode {
        self.state.mode
    }

    /// Switching into bounce resets the velocity to the default and resumes
    /// from the last bounce position of this surface, or the start corner.
    pub fn set_mode(&mut self, mode: AnimationMode) {
        if mode == self.state.mode {
            return;
        }
        match mode {
            AnimationMode::Bounce => {
                let (x, y) = self.last_bounce.unwrap_or(BOUNCE_START);
                self.state = AnimationState {
                    x,
                    y,
                    ..AnimationState::bouncing()
                };
            }
            AnimationMode::Centered => {
                self.last_bounce = Some((self.state.x, self.state.y));
                self.state.mode = AnimationMode::Centered;
            }
        }
    }

    pub fn step(&mut self, text: Size, container: Size) -> AnimationState {
        self.state = step(self.state, text, container);
        self.state
    }
}
