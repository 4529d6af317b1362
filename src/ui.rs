use std::io::IsTerminal;
use std::sync::OnceLock;

/// ANSI color codes
pub struct Colors;

impl Colors {
    pub const RED: &'static str = "\x1b[31m";
    pub const GREEN: &'static str = "\x1b[32m";
    pub const YELLOW: &'static str = "\x1b[33m";
    pub const BLUE: &'static str = "\x1b[34m";
    pub const PURPLE: &'static str = "\x1b[35m";
    pub const CYAN: &'static str = "\x1b[36m";
    pub const RESET: &'static str = "\x1b[0m";
}

/// Colors are off when `NO_COLOR` is set or stdout is not a terminal
fn colors_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
    })
}

fn paint(text: &str, color: &str) -> String {
    if colors_enabled() {
        format!("{}{}{}", color, text, Colors::RESET)
    } else {
        text.to_string()
    }
}

pub fn print_colored(text: &str, color: &str) {
    println!("{}", paint(text, color));
}

pub fn eprint_colored(text: &str, color: &str) {
    eprintln!("{}", paint(text, color));
}

pub fn print_success(text: &str) {
    print_colored(text, Colors::GREEN);
}

/// Errors go to stderr
pub fn print_error(text: &str) {
    eprint_colored(text, Colors::RED);
}

pub fn print_warning(text: &str) {
    print_colored(text, Colors::YELLOW);
}

pub fn print_info(text: &str) {
    print_colored(text, Colors::BLUE);
}

pub fn print_header(text: &str) {
    print_colored(text, Colors::PURPLE);
}

/// One step of a sync procedure, e.g. "→ Staging changes"
pub fn print_step(text: &str) {
    print_colored(&format!("→ {text}"), Colors::CYAN);
}

/// Framed banner printed at the start of a procedure
pub fn print_banner(text: &str) {
    let rule = "=".repeat(60);
    print_header(&rule);
    print_header(text);
    print_header(&rule);
}

/// Show a helpful error with suggestions
pub fn show_error_with_help(error: &str, suggestions: &[&str]) {
    print_error(&format!("❌ {error}"));
    if !suggestions.is_empty() {
        println!();
        print_colored("💡 Here's how to fix it:", Colors::CYAN);
        for (i, suggestion) in suggestions.iter().enumerate() {
            println!("   {}. {}", i + 1, suggestion);
        }
        println!();
    }
}
