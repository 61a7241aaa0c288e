use std::io::{self, Write};

use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

use super::ColorMode;

/// Print `An error has occurred: <message>` in red on stderr.
pub fn write_error(message: &str, color: ColorMode) {
    let mut stderr = StandardStream::stderr(color.choice());
    if write_error_to(&mut stderr, message).is_err() {
        tracing::error!("{}", message);
    }
}

pub fn write_error_to<W: WriteColor>(out: &mut W, message: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
    write!(out, "An error has occurred: {}", message)?;
    out.reset()?;
    writeln!(out)?;
    out.flush()
}
