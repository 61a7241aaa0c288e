use std::io::{self, Write};

use crossterm::{cursor, execute, terminal};
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

use super::ColorMode;

const PREFIX: &str = "Encoding: ";

/// Columns used besides the bar: prefix, brackets, the space before the
/// percentage, the percentage itself and one spare column so the line never
/// wraps.
const RESERVED_COLUMNS: usize = PREFIX.len() + 2 + 1 + 4 + 1;

/// Fallback when the terminal width cannot be determined
const DEFAULT_WIDTH: u16 = 80;

/// Draw the progress line on stdout, overwriting the current line.
pub fn show_progress(progress: f32, color: ColorMode) -> io::Result<()> {
    let width = terminal::size().map(|(w, _)| w).unwrap_or(DEFAULT_WIDTH);
    let mut stdout = StandardStream::stdout(color.choice());
    render_progress(&mut stdout, progress, usize::from(width))?;
    stdout.flush()
}

/// Render `\rEncoding: [====    ] NNN%` for a terminal `width` columns wide.
///
/// When there is no room for a bar only the percentage is written.
pub fn render_progress<W: WriteColor>(out: &mut W, progress: f32, width: usize) -> io::Result<()> {
    let progress = progress.clamp(0.0, 1.0);
    let percent = 100.0 * progress;

    let Some(bar_size) = width.checked_sub(RESERVED_COLUMNS) else {
        return write!(out, "\r{}{:.0}%", PREFIX, percent);
    };
    let filled = ((bar_size as f32 * progress) as usize).min(bar_size);

    let mut bracket = ColorSpec::new();
    bracket.set_fg(Some(Color::Blue)).set_intense(true);
    let mut bar = ColorSpec::new();
    bar.set_fg(Some(Color::Green)).set_intense(true);

    write!(out, "\r{}", PREFIX)?;
    out.set_color(&bracket)?;
    write!(out, "[")?;
    out.set_color(&bar)?;
    write!(out, "{}{}", "=".repeat(filled), " ".repeat(bar_size - filled))?;
    out.set_color(&bracket)?;
    write!(out, "] ")?;
    out.reset()?;
    write!(out, "{:3.0}%", percent)
}

/// Restores the cursor when dropped.
#[must_use]
pub struct CursorGuard {
    hidden: bool,
}

/// Hide the terminal cursor until the returned guard is dropped.
pub fn hide_cursor() -> CursorGuard {
    let hidden = execute!(io::stdout(), cursor::Hide).is_ok();
    CursorGuard { hidden }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        if self.hidden {
            let _ = execute!(io::stdout(), cursor::Show);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::NoColor;

    fn render(progress: f32, width: usize) -> String {
        let mut out = NoColor::new(Vec::new());
        render_progress(&mut out, progress, width).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn test_empty_bar() {
        // 38 columns leave a 20 column bar.
        assert_eq!(render(0.0, 38), format!("\rEncoding: [{}]   0%", " ".repeat(20)));
    }

    #[test]
    fn test_half_bar() {
        assert_eq!(
            render(0.5, 38),
            format!("\rEncoding: [{}{}]  50%", "=".repeat(10), " ".repeat(10))
        );
    }

    #[test]
    fn test_full_bar() {
        assert_eq!(render(1.0, 38), format!("\rEncoding: [{}] 100%", "=".repeat(20)));
    }

    #[test]
    fn test_line_fits_width() {
        for width in [18, 40, 80, 200] {
            let line = render(0.33, width);
            assert!(line.chars().count() - 1 < width, "width {width}: {line:?}");
        }
    }

    #[test]
    fn test_narrow_terminal() {
        assert_eq!(render(0.25, 10), "\rEncoding: 25%");
        assert_eq!(render(1.0, 0), "\rEncoding: 100%");
    }

    #[test]
    fn test_out_of_range_progress() {
        assert_eq!(render(1.5, 10), "\rEncoding: 100%");
        assert_eq!(render(-1.0, 10), "\rEncoding: 0%");
    }
}
