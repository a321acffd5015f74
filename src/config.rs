use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use cross_xdg::BaseDirs;
use nu_ansi_term::Color;

/// Colours used by the debug shell when stdout is a terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub stop_event: Color,
    pub finished: Color,
    pub warning: Color,
    pub error: Color,
    pub pointer_cell: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            stop_event: Color::Cyan,
            finished: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            pointer_cell: Color::LightYellow,
        }
    }
}

/// Shell settings read from `bfdb.toml`.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub prompt: String,
    /// How many cells left of the pointer `tape` shows.
    pub tape_before: isize,
    pub tape_width: usize,
    pub colors: Colors,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prompt: "(bfdb) ".to_string(),
            tape_before: 10,
            tape_width: 20,
            colors: Colors::default(),
        }
    }
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(|| load_from_toml().unwrap_or_default())
}

fn parse_color(value: &str) -> Option<Color> {
    let s = value.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
    } else {
        let name = s.to_ascii_lowercase();
        return Some(match name.as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" | "purple" => Color::Purple,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            "gray" | "grey" | "darkgray" | "dark_gray" | "darkgrey" | "dark_grey" => Color::DarkGray,
            "lightred" | "light_red" => Color::LightRed,
            "lightgreen" | "light_green" => Color::LightGreen,
            "lightyellow" | "light_yellow" => Color::LightYellow,
            "lightblue" | "light_blue" => Color::LightBlue,
            "lightmagenta" | "light_magenta" => Color::LightPurple,
            "lightcyan" | "light_cyan" => Color::LightCyan,
            _ => return None,
        });
    }
    None
}

fn load_from_toml() -> Option<Settings> {
    let base_dirs = BaseDirs::new().ok()?;

    // On Linux: resolves to /home/<user>/.config
    // On macOS: resolves to /Users/<user>/.config
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bfdb.toml");

    let content = fs::read_to_string(&path).ok()?;
    tracing::debug!(path = %path.display(), "loaded settings");
    Some(parse_settings(&content))
}

/// Parse the small `[section]` / `key = value` subset of TOML the config
/// file uses. Unknown sections, keys and malformed values are ignored.
pub fn parse_settings(content: &str) -> Settings {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut section = String::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len()-1].trim().to_string();
            continue;
        }
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val_raw = line[eq+1..].trim();
            // Accept quoted or unquoted
            let val = if val_raw.starts_with('"') && val_raw.ends_with('"') && val_raw.len() >= 2 {
                val_raw[1..val_raw.len()-1].to_string()
            } else { val_raw.to_string() };
            sections.entry(section.clone()).or_default().insert(key, val);
        }
    }

    let mut cfg = Settings::default();

    if let Some(shell) = sections.get("shell") {
        if let Some(prompt) = shell.get("prompt") {
            cfg.prompt = prompt.clone();
        }
        if let Some(v) = shell.get("tape_before").and_then(|s| s.parse::<isize>().ok()) {
            cfg.tape_before = v;
        }
        if let Some(v) = shell.get("tape_width").and_then(|s| s.parse::<usize>().ok()) {
            cfg.tape_width = v;
        }
    }

    if let Some(colors) = sections.get("colors") {
        macro_rules! set {
            ($field:ident) => {
                if let Some(v) = colors.get(stringify!($field)).and_then(|s| parse_color(s)) {
                    cfg.colors.$field = v;
                }
            };
        }

        set!(stop_event);
        set!(finished);
        set!(warning);
        set!(error);
        set!(pointer_cell);
    }

    cfg
}
