//! Terminal styling for bxt-stage output
//!
//! Output is coloured by [`Role`] rather than by colour name, so sections,
//! package names and warnings look the same in every command. `owo-colors`
//! decides per stream whether colour is used (`NO_COLOR`, TTY checks).
//!
//! | Method        | Role     | Colour | Stream | Used for                     |
//! |---------------|----------|--------|--------|------------------------------|
//! | `.accent()`   | Accent   | Cyan   | stdout | Sections, package names      |
//! | `.success()`  | Success  | Green  | stdout | Staged uploads, done markers |
//! | `.error()`    | Error    | Red    | stderr | Failures, staged deletions   |
//! | `.warn()`     | Warn     | Yellow | stderr | Missing files, push hints    |
//! | `.muted()`    | Muted    | Dim    | stdout | Paths, copy/move targets     |
//! | `.emphasis()` | Emphasis | Bold   | stdout | Section headers, user names  |

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Stream, Style};
use std::fmt::{self, Display};
use std::sync::OnceLock;

/// What a piece of output means to the user
#[derive(Clone, Copy, Debug)]
enum Role {
    Accent,
    Success,
    Error,
    Warn,
    Muted,
    Emphasis,
}

impl Role {
    const fn style(self) -> Style {
        match self {
            Self::Accent => Style::new().cyan(),
            Self::Success => Style::new().green(),
            Self::Error => Style::new().red(),
            Self::Warn => Style::new().yellow(),
            Self::Muted => Style::new().dimmed(),
            Self::Emphasis => Style::new().bold(),
        }
    }

    /// Diagnostics go to stderr, everything else to stdout
    const fn stream(self) -> Stream {
        match self {
            Self::Error | Self::Warn => Stream::Stderr,
            _ => Stream::Stdout,
        }
    }
}

/// Output value tagged with its [`Role`]
#[derive(Clone, Debug)]
pub struct Styled<T> {
    value: T,
    role: Role,
    stream: Stream,
}

impl<T> Styled<T> {
    const fn new(value: T, role: Role) -> Self {
        Self {
            value,
            role,
            stream: role.stream(),
        }
    }

    /// Decide colour from stdout, for warnings inlined into stdout listings
    #[must_use]
    pub const fn for_stdout(mut self) -> Self {
        self.stream = Stream::Stdout;
        self
    }
}

impl<T: Display> Display for Styled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.role.style();
        write!(f, "{}", self.value.if_supports_color(self.stream, |v| v.style(style)))
    }
}

/// Role-based styling for anything printable
pub trait Stylize: Display {
    /// Sections, package names, counts
    fn accent(&self) -> Styled<&Self> {
        Styled::new(self, Role::Accent)
    }

    /// Completed steps
    fn success(&self) -> Styled<&Self> {
        Styled::new(self, Role::Success)
    }

    /// Failures
    fn error(&self) -> Styled<&Self> {
        Styled::new(self, Role::Error)
    }

    /// Problems the user should look at
    fn warn(&self) -> Styled<&Self> {
        Styled::new(self, Role::Warn)
    }

    /// Secondary detail
    fn muted(&self) -> Styled<&Self> {
        Styled::new(self, Role::Muted)
    }

    /// Headers
    fn emphasis(&self) -> Styled<&Self> {
        Styled::new(self, Role::Emphasis)
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Done marker
pub const fn check() -> Styled<&'static str> {
    Styled::new("✓", Role::Success)
}

/// Failure marker
pub const fn cross() -> Styled<&'static str> {
    Styled::new("✗", Role::Error)
}

/// Points from a source section to a copy/move target
pub const fn arrow() -> Styled<&'static str> {
    Styled::new("→", Role::Accent)
}

/// Spinner shown while the session is refreshed
pub fn spinner_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("spinner template is valid")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        })
        .clone()
}

/// Commit upload bar; the position is in per-mille of bytes sent
pub fn upload_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {percent:>3}%")
                .expect("upload template is valid")
                .progress_chars("=> ")
        })
        .clone()
}
