//! Markdown rendering for the terminal.

use std::io::{self, Write};

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

/// ANSI cyan, used for header lines in rich mode.
const HEADER_STYLE: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Prints command output, styled through termimad or as plain markdown.
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    pub fn render(&self, markdown: &str) -> Result<()> {
        let mut out = io::stdout().lock();

        if !self.rich_enabled {
            out.write_all(markdown.as_bytes())?;
            return Ok(out.flush()?);
        }

        for line in markdown.lines() {
            // termimad would strip the hashes; keep them so nesting stays visible
            if line.starts_with('#') {
                writeln!(out, "{HEADER_STYLE}{line}{RESET}")?;
            } else {
                writeln!(out, "{}", self.skin.inline(line))?;
            }
        }
        Ok(out.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_mode_is_not_rich() {
        assert!(!TerminalRenderer::new(false).rich_enabled);
    }

    #[test]
    fn test_render_plain_and_rich() {
        let markdown = "# Launch\n\n- **Status**: draft\n";
        assert!(TerminalRenderer::new(false).render(markdown).is_ok());
        assert!(TerminalRenderer::new(true).render(markdown).is_ok());
    }
}
