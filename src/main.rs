use akt::config::Config;
use akt::event_loop::Session;
use akt::pty::PtySession;
use clap::Parser;
use nix::unistd::isatty;
use std::io;
use std::os::fd::AsRawFd;
use std::path::PathBuf;
use std::process;

/// akt: APL Keyboard Translator
#[derive(Parser)]
#[command(name = "akt")]
#[command(version, about = "APL Keyboard Translator")]
#[command(long_about = "Spawns CMD with its ARGS as a slave to a pty, translates Alt+key \
    keystrokes to APL Unicode characters, and passes all other keystrokes \
    and all of CMD's output unaltered.

akt's input must be a terminal and your locale must use a UTF-8 encoding.")]
#[command(after_help = "EXAMPLES:
    # Run GNU APL behind the translator
    akt apl

    # Keep Ctrl-Z for the inner program instead of the shell
    akt -z apl

Set your terminal emulator to send an ESC prefix when you use the Alt key
(often described as \"meta sends escape\") and disable Alt-key access to the
emulator's own menus.")]
struct Cli {
    /// Suppress the terminal's suspend character (usually Ctrl-Z)
    #[arg(short = 'z', long)]
    no_suspend: bool,

    /// Custom config file path (default: ~/.config/akt/config.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Command to run on the pty, with its arguments
    #[arg(value_name = "CMD", trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

/// The locale must use UTF-8, or the translated glyph bytes would be
/// reassembled wrongly on the far side.
fn locale_is_utf8() -> bool {
    ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
        .map(|value| {
            let upper = value.to_uppercase();
            upper.contains("UTF-8") || upper.contains("UTF8")
        })
        .unwrap_or(false)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    // Precondition failures: diagnostic to stderr, nothing proxied, exit 1.
    if !isatty(io::stdin().as_raw_fd()).unwrap_or(false) {
        eprintln!("akt: standard input must be a terminal");
        return 1;
    }
    if !locale_is_utf8() {
        eprintln!("akt: your locale must use a UTF-8 encoding");
        return 1;
    }
    if cli.command.is_empty() {
        eprintln!("akt: no command given; try 'akt --help'");
        return 1;
    }

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("akt: {e}");
            return 1;
        }
    };
    config.session.no_suspend |= cli.no_suspend;

    let pty = match PtySession::spawn(&cli.command[0], &cli.command[1..]) {
        Ok(pty) => pty,
        Err(e) => {
            eprintln!("akt: {e}");
            return 1;
        }
    };

    let mut session = Session::new(pty, &config);
    match session.run() {
        Ok(()) => 0,
        Err(e) => {
            // Session::run has already restored the terminal mode.
            eprintln!("akt: {e}");
            1
        }
    }
}
