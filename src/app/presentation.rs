use nu_ansi_term::Color;

/// Terminal styling, decided once at startup and passed to whatever prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn paint(&self, color: Color, text: &str) -> String {
        if self.enabled {
            color.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn ok(&self, text: &str) -> String {
        self.paint(Color::Green, text)
    }

    pub fn fail(&self, text: &str) -> String {
        self.paint(Color::Red, text)
    }

    pub fn warn(&self, text: &str) -> String {
        self.paint(Color::Yellow, text)
    }

    pub fn heading(&self, text: &str) -> String {
        if self.enabled {
            Color::Cyan.bold().paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.enabled {
            Color::DarkGray.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// `[+]` / `[!]` marker used on result lines.
    pub fn status_marker(&self, success: bool) -> String {
        if success {
            self.ok("[+]")
        } else {
            self.fail("[!]")
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(true)
    }
}
