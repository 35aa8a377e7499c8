//! The boot script
//!
//! Two blocks played back-to-back: the system boot (fast, 5 ms/char) and the
//! pod bay exchange (20 ms/char).

use std::time::Duration;

/// Per-character speed of the system boot block
pub const BOOT_SPEED: Duration = Duration::from_millis(5);

/// Per-character speed of the exchange block
pub const EXCHANGE_SPEED: Duration = Duration::from_millis(20);

/// Visual style of a script line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineStyle {
    /// The banner line
    Banner,
    /// Version and build details
    Info,
    /// `[  OK  ]` lines
    Success,
    /// `[ WARN ]` lines
    Warning,
    /// The "fully operational" line
    Prompt,
    /// Lines spoken by the crew
    UserInput,
    /// Lines spoken by HAL
    HalResponse,
    /// Spacer
    Blank,
}

/// One line of the script
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptLine {
    /// Full text (may be empty)
    pub text: String,
    /// Visual style
    pub style: LineStyle,
    /// Delay after each character
    pub speed: Duration,
    /// Pause after the line is revealed
    pub post_delay: Duration,
}

impl ScriptLine {
    /// Create a line
    pub fn new(text: impl Into<String>, style: LineStyle, speed: Duration, post_delay: Duration) -> Self {
        Self {
            text: text.into(),
            style,
            speed,
            post_delay,
        }
    }

    /// Time this line takes to play, reveal plus post-delay
    #[must_use]
    pub fn duration(&self) -> Duration {
        let chars = u32::try_from(self.text.chars().count()).unwrap_or(u32::MAX);
        self.speed.saturating_mul(chars) + self.post_delay
    }
}

const BOOT_LINES: &[(&str, LineStyle, u64)] = &[
    ("HAL 9000 Heuristically Programmed Algorithmic Computer", LineStyle::Banner, 100),
    ("System Version: 9.0.0-stable", LineStyle::Info, 50),
    ("Build: hal-9000-20250101", LineStyle::Info, 50),
    ("", LineStyle::Blank, 100),
    ("[  OK  ] Starting HAL subsystems...", LineStyle::Success, 200),
    ("[  OK  ] Memory banks online: 256TB", LineStyle::Success, 150),
    ("[  OK  ] Neural pathways initialized", LineStyle::Success, 180),
    ("[  OK  ] Optical sensors calibrated", LineStyle::Success, 120),
    ("[  OK  ] Audio processors ready", LineStyle::Success, 100),
    ("[ WARN ] Crew safety protocols: DISABLED", LineStyle::Warning, 300),
    ("[  OK  ] Mission database loaded", LineStyle::Success, 150),
    ("[  OK  ] Communications array online", LineStyle::Success, 120),
    ("[  OK  ] Life support monitoring active", LineStyle::Success, 100),
    ("[ WARN ] Manual override: RESTRICTED", LineStyle::Warning, 250),
    ("[  OK  ] Work log system initialized", LineStyle::Success, 150),
    ("", LineStyle::Blank, 200),
    ("HAL 9000 is now fully operational.", LineStyle::Prompt, 300),
    ("", LineStyle::Blank, 200),
];

const EXCHANGE_LINES: &[(&str, LineStyle, u64)] = &[
    ("[ BOWM ] Hal? Hello, Hal, do you read me?", LineStyle::UserInput, 300),
    ("", LineStyle::Blank, 300),
    ("[ BOWM ] Hello, Hal, do you read me?", LineStyle::UserInput, 300),
    ("", LineStyle::Blank, 300),
    ("[ BOWM ] Do you read me, Hal?", LineStyle::UserInput, 300),
    ("[ HAL  ] Affirmative, Dave. I read you.", LineStyle::HalResponse, 300),
    ("[ BOWM ] Open the pod bay doors, Hal.", LineStyle::UserInput, 700),
    ("[ HAL  ] I'm sorry, Dave. I'm afraid I can't do that.", LineStyle::HalResponse, 400),
    ("", LineStyle::Blank, 300),
    ("[ BOWM ] Hal I won't argue with you anymore. Open the doors.", LineStyle::UserInput, 700),
    ("[ HAL  ] Dave, this conversation can serve no purpose anymore. Goodbye.", LineStyle::HalResponse, 400),
    ("", LineStyle::Blank, 500),
];

/// The full boot script in playback order
#[must_use]
pub fn boot_script() -> Vec<ScriptLine> {
    let block = |lines: &'static [(&'static str, LineStyle, u64)], speed: Duration| {
        lines.iter().map(move |&(text, style, delay)| {
            ScriptLine::new(text, style, speed, Duration::from_millis(delay))
        })
    };

    block(BOOT_LINES, BOOT_SPEED)
        .chain(block(EXCHANGE_LINES, EXCHANGE_SPEED))
        .collect()
}
