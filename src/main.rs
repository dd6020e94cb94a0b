use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use arabic_translator_rust::{Config, Language, Session};

#[derive(Parser, Debug)]
#[command(
    name = "arabic-translator-rust",
    version,
    about = "Translate between Arabic and English with free providers and Gemini learning aids"
)]
struct Cli {
    /// Target language (ar, en or auto)
    #[arg(short = 'l', long = "lang", default_value = "auto")]
    lang: String,

    /// Source language (ar, en or auto to detect)
    #[arg(short = 'L', long = "source-lang", default_value = "auto")]
    source_lang: String,

    /// Gemini API key for this run (overrides the stored key and environment variables)
    #[arg(short = 'k', long = "key")]
    key: Option<String>,

    /// Store a Gemini API key and exit
    #[arg(long = "save-key", value_name = "KEY")]
    save_key: Option<String>,

    /// Remove the stored Gemini API key and exit
    #[arg(long = "clear-key")]
    clear_key: bool,

    /// Add a Gemini enhancement (cultural notes, alternatives) to the translation
    #[arg(long = "enhance")]
    enhance: bool,

    /// Explain the grammar of the input
    #[arg(long = "grammar")]
    grammar: bool,

    /// Show pronunciation guidance for the input
    #[arg(long = "pronunciation")]
    pronunciation: bool,

    /// Show translation histories and exit
    #[arg(long = "show-histories")]
    show_histories: bool,

    /// Clear translation histories and exit
    #[arg(long = "clear-histories")]
    clear_histories: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,

    /// Interactive mode
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,

    /// Serve the HTTP API on ADDR (e.g. 127.0.0.1:11223)
    #[arg(long = "server", value_name = "ADDR")]
    server: Option<String>,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            lang: self.lang.clone(),
            source_lang: self.source_lang.clone(),
            key: self.key.clone(),
            save_key: self.save_key.clone(),
            clear_key: self.clear_key,
            enhance: self.enhance,
            grammar: self.grammar,
            pronunciation: self.pronunciation,
            show_histories: self.show_histories,
            clear_histories: self.clear_histories,
            settings_path: self.read_settings.clone(),
        }
    }

    fn needs_input(&self) -> bool {
        !(self.save_key.is_some() || self.clear_key || self.show_histories || self.clear_histories)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    arabic_translator_rust::logging::init(cli.verbose)?;

    if let Some(addr) = cli.server.clone() {
        let session = arabic_translator_rust::open_session(&cli.config()).await?;
        return arabic_translator_rust::server::run_server(Arc::new(session), addr).await;
    }
    if cli.interactive {
        return run_interactive(cli).await;
    }

    let input = if cli.needs_input() && !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Some(buffer)
    } else {
        None
    };

    let output = arabic_translator_rust::run(cli.config(), input).await?;
    println!("{}", output);
    Ok(())
}

struct InteractiveState {
    config: Config,
}

impl InteractiveState {
    fn new(cli: &Cli) -> Self {
        Self {
            config: Config {
                save_key: None,
                clear_key: false,
                show_histories: false,
                clear_histories: false,
                ..cli.config()
            },
        }
    }

    fn config_for_run(&self) -> Config {
        let mut config = self.config.clone();
        config.show_histories = false;
        config
    }
}

async fn run_interactive(cli: Cli) -> Result<()> {
    let mut state = InteractiveState::new(&cli);
    let session = arabic_translator_rust::open_session(&state.config).await?;
    println!("Interactive mode. Use /quit or /exit to finish.");
    println!("Type /help to see available commands.");

    let mut line = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();
    loop {
        line.clear();
        print!("> ");
        io::stdout().flush()?;
        if stdin_lock.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.starts_with('/') {
            if handle_interactive_command(input, &mut state, &session).await? {
                break;
            }
            continue;
        }

        match arabic_translator_rust::run_with_session(
            &session,
            &state.config_for_run(),
            Some(input.to_string()),
        )
        .await
        {
            Ok(output) => println!("{}", output),
            Err(err) => eprintln!("{:#}", err),
        }
    }
    Ok(())
}

async fn handle_interactive_command(
    input: &str,
    state: &mut InteractiveState,
    session: &Session,
) -> Result<bool> {
    let (command, arg) = split_command(input);
    match command {
        "/quit" | "/exit" if arg.is_empty() => return Ok(true),
        "/help" if arg.is_empty() => print_interactive_help(),
        "/show-histories" if arg.is_empty() => {
            let mut config = state.config_for_run();
            config.show_histories = true;
            let output = arabic_translator_rust::run_with_session(session, &config, None).await?;
            println!("{}", output);
        }
        "/swap" if arg.is_empty() => {
            let (source, target) = swap_tags(&state.config.source_lang, &state.config.lang);
            state.config.source_lang = source;
            state.config.lang = target;
            println!(
                "source-lang: {}, lang: {}",
                state.config.source_lang, state.config.lang
            );
        }
        "/source-lang" => {
            if arg.is_empty() {
                println!("source-lang: {}", state.config.source_lang);
            } else {
                state.config.source_lang = arg.to_string();
                println!("source-lang set to {}", arg);
            }
        }
        "/lang" => {
            if arg.is_empty() {
                println!("lang: {}", state.config.lang);
            } else {
                state.config.lang = arg.to_string();
                println!("lang set to {}", arg);
            }
        }
        "/enhance" => {
            state.config.enhance = parse_toggle(arg, state.config.enhance)?;
            println!("enhance: {}", state.config.enhance);
        }
        "/grammar" => {
            state.config.grammar = parse_toggle(arg, state.config.grammar)?;
            println!("grammar: {}", state.config.grammar);
        }
        "/pronunciation" => {
            state.config.pronunciation = parse_toggle(arg, state.config.pronunciation)?;
            println!("pronunciation: {}", state.config.pronunciation);
        }
        _ => eprintln!("unknown command: {}", input.trim()),
    }
    Ok(false)
}

/// Splits "/lang ar" into ("/lang", "ar"); the command word ends at the first whitespace.
fn split_command(input: &str) -> (&str, &str) {
    let trimmed = input.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (trimmed, ""),
    }
}

/// An "auto" side is taken to be the opposite of the concrete one before swapping.
fn swap_tags(source: &str, target: &str) -> (String, String) {
    match (Language::from_tag(source), Language::from_tag(target)) {
        (Some(source), Some(target)) => (target.code().to_string(), source.code().to_string()),
        (None, Some(target)) => (target.code().to_string(), target.other().code().to_string()),
        (Some(source), None) => (source.other().code().to_string(), source.code().to_string()),
        (None, None) => (source.to_string(), target.to_string()),
    }
}

fn parse_toggle(arg: &str, current: bool) -> Result<bool> {
    let value = arg.trim();
    if value.is_empty() {
        return Ok(!current);
    }
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(anyhow::anyhow!("expected on/off/true/false/1/0")),
    }
}

fn print_interactive_help() {
    println!("Commands:");
    println!("  /quit, /exit                 Exit interactive mode");
    println!("  /show-histories              Show translation histories");
    println!("  /lang <code>                 Set target language (or show current)");
    println!("  /source-lang <code>          Set source language (or show current)");
    println!("  /swap                        Swap source and target languages");
    println!("  /enhance [on|off]            Toggle Gemini enhancement");
    println!("  /grammar [on|off]            Toggle grammar explanation");
    println!("  /pronunciation [on|off]      Toggle pronunciation help");
}
