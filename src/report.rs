use owo_colors::OwoColorize;
use std::fmt::Display;
use std::io::{self, Write};

const BANNER_WIDTH: usize = 60;

#[derive(Debug)]
enum Sink {
    Stdout,
    Stderr,
    Buffer(Vec<u8>),
}

impl Write for Sink {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match self {
            Self::Stdout => io::stdout().write(buf),
            Self::Stderr => io::stderr().write(buf),
            Self::Buffer(buffer) => buffer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout => io::stdout().flush(),
            Self::Stderr => io::stderr().flush(),
            Self::Buffer(_) => Ok(()),
        }
    }
}

/// Colored status lines and report sections.
///
/// Errors go to stderr, everything else to stdout.
#[derive(Debug)]
pub struct Reporter {
    out: Sink,
    err: Sink,
    color: bool,
}

impl Reporter {
    pub const fn stdio(color: bool) -> Self {
        Self {
            out: Sink::Stdout,
            err: Sink::Stderr,
            color,
        }
    }

    /// Keeps everything in memory, without colors.
    pub const fn buffered() -> Self {
        Self {
            out: Sink::Buffer(Vec::new()),
            err: Sink::Buffer(Vec::new()),
            color: false,
        }
    }

    pub const fn colored(&self) -> bool {
        self.color
    }

    pub fn stdout_text(&self) -> String {
        match &self.out {
            Sink::Buffer(buffer) => String::from_utf8_lossy(buffer).into_owned(),
            _ => String::new(),
        }
    }

    pub fn stderr_text(&self) -> String {
        match &self.err {
            Sink::Buffer(buffer) => String::from_utf8_lossy(buffer).into_owned(),
            _ => String::new(),
        }
    }

    pub fn line<D: Display>(
        &mut self,
        text: D,
    ) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    pub fn info<D: Display>(
        &mut self,
        message: D,
    ) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}", message.blue())
        } else {
            writeln!(self.out, "{message}")
        }
    }

    pub fn success<D: Display>(
        &mut self,
        message: D,
    ) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}", message.green())
        } else {
            writeln!(self.out, "{message}")
        }
    }

    pub fn warning<D: Display>(
        &mut self,
        message: D,
    ) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}", message.yellow().bold())
        } else {
            writeln!(self.out, "{message}")
        }
    }

    pub fn error<D: Display>(
        &mut self,
        message: D,
    ) -> io::Result<()> {
        let text = format!("ERROR: {message}");
        if self.color {
            writeln!(self.err, "{}", text.red())
        } else {
            writeln!(self.err, "{text}")
        }
    }

    /// Title between two `=` rules, followed by an empty line.
    pub fn banner<D: Display>(
        &mut self,
        title: D,
    ) -> io::Result<()> {
        let rule = "=".repeat(BANNER_WIDTH);
        writeln!(self.out, "{rule}")?;
        writeln!(self.out, "  {title}")?;
        writeln!(self.out, "{rule}")?;
        writeln!(self.out)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.err.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_land_on_stderr_with_prefix() {
        let mut reporter = Reporter::buffered();
        reporter.info("looking").expect("write");
        reporter.error("boom").expect("write");

        assert_eq!(reporter.stdout_text(), "looking\n");
        assert_eq!(reporter.stderr_text(), "ERROR: boom\n");
    }

    #[test]
    fn banner_is_sixty_columns() {
        let mut reporter = Reporter::buffered();
        reporter.banner("S3 Buckets").expect("write");

        let text = reporter.stdout_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "=".repeat(60));
        assert_eq!(lines[1], "  S3 Buckets");
        assert_eq!(lines[2], "=".repeat(60));
        assert_eq!(lines[3], "");
    }

    #[test]
    fn plain_output_has_no_escape_codes() {
        let mut reporter = Reporter::buffered();
        reporter.success("done").expect("write");
        reporter.warning("careful").expect("write");

        assert!(!reporter.stdout_text().contains('\u{1b}'));
    }

    #[test]
    fn stdio_reporter_has_no_captured_text() {
        let reporter = Reporter::stdio(false);

        assert!(reporter.stdout_text().is_empty());
        assert!(!reporter.colored());
    }
}
