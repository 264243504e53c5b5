use colored::*;
use lazy_static::lazy_static;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Step,
    Success,
    Warn,
    Error,
    Debug,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Step => "step",
            Level::Success => "success",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Debug => "debug",
        }
    }

    /// Text-mode prefix shown before the message.
    fn prefix(self) -> String {
        match self {
            Level::Info => format!("{} INFO ", Glyph::Info),
            Level::Step => Glyph::Arrow.to_string(),
            Level::Success => format!("{} SUCCESS", Glyph::Check),
            Level::Warn => format!("{} WARNING", Glyph::Warning),
            Level::Error => format!("{} ERROR ", Glyph::Cross),
            Level::Debug => "· DEBUG".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    pub format: OutputFormat,
    pub color: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

lazy_static! {
    static ref RENDERER: RwLock<Renderer> = RwLock::new(Renderer::default());
}

static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

pub fn init(format: OutputFormat, color: bool) {
    if let Ok(mut r) = RENDERER.write() {
        r.format = format;
        r.color = color;
    }
}

pub mod glyph;
pub use glyph::Glyph;

#[derive(Serialize)]
struct Event<'a> {
    level: &'a str,
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

fn colorize(level: Level, s: &str, enable: bool) -> String {
    if !enable {
        return s.to_string();
    }
    match level {
        Level::Info => s.blue().to_string(),
        Level::Step => s.cyan().to_string(),
        Level::Success => s.green().bold().to_string(),
        Level::Warn => s.yellow().bold().to_string(),
        Level::Error => s.red().bold().to_string(),
        Level::Debug => s.dimmed().to_string(),
    }
}

fn strip_ansi(input: &str) -> String {
    // Remove CSI sequences like \x1b[0m and \x1b[1;32m
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == 0x1b && i + 1 < bytes.len() && bytes[i + 1] == b'[' {
            i += 2;
            while i < bytes.len() {
                let b = bytes[i];
                i += 1;
                if (b'@'..=b'~').contains(&b) {
                    break;
                }
            }
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn render_text(level: Level, message: &str, color: bool) -> String {
    format!("{} {}", colorize(level, &level.prefix(), color), message)
}

fn render_json(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) -> String {
    let clean_msg = strip_ansi(message);
    let ev = Event {
        level: level.as_str(),
        code,
        message: &clean_msg,
        data,
    };
    serde_json::to_string(&ev).unwrap_or_else(|_| format!("{{\"level\":\"{}\"}}", level.as_str()))
}

pub fn emit(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) {
    if level == Level::Debug && !is_debug_enabled() {
        return;
    }
    let r = RENDERER.read().expect("renderer poisoned").clone();
    let line = match r.format {
        OutputFormat::Text => render_text(level, message, r.color),
        OutputFormat::Json => render_json(level, code, message, data),
    };
    let mut out: Box<dyn Write> = match level {
        Level::Error | Level::Warn => Box::new(io::stderr()),
        _ => Box::new(io::stdout()),
    };
    let _ = writeln!(out, "{}", line);
}

pub fn get_output_format() -> OutputFormat {
    RENDERER.read().expect("renderer poisoned").format
}

pub mod prelude {
    pub use super::{Level, OutputFormat, emit, get_output_format};
}
