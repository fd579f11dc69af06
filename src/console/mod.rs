//! # Console Module
//!
//! Interactive line-oriented front end. Commands map one-to-one onto the
//! core: buffer resolution, the send dispatcher, and the connection
//! lifecycle. All I/O errors surface here as status text; none escape to a
//! panic.

use crate::buffer::TextBuffer;
use crate::display::{DisplayLog, SessionLog};
use crate::error::{LinePortError, Result};
use crate::send::send_text;
use crate::send::transform::{SendMode, apply};
use crate::serial::Connection;
use crate::serial::ports::{COMMON_BAUD_RATES, list_ports};
use crate::settings::Preferences;
use clap::Parser;
use log::warn;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::io::AsyncBufReadExt;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "lineport", about = "Compose text, pick lines, send them over a serial port")]
pub struct Cli {
    /// Serial port to open at startup
    #[arg(long)]
    pub port: Option<String>,

    /// Baud rate (defaults to the persisted preference)
    #[arg(long)]
    pub baud: Option<u32>,

    /// Text file to load into the buffer at startup
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Start in decorated mode
    #[arg(long)]
    pub decorated: bool,

    /// List available serial ports and exit
    #[arg(long)]
    pub list_ports: bool,
}

const EDIT_PROMPT: &str = "Enter text; finish with '.' on its own line";

const HELP: &str = "\
Commands:
  open <port> [baud]    connect to a serial port
  close                 disconnect
  load <path>           load a text file into the buffer
  edit                  compose buffer text; finish with '.' on its own line
  erase                 clear the buffer
  show                  list buffer lines with numbers
  goto <line>           move the caret to a line (1-based)
  select <a> <b>        select lines a through b inclusive
  deselect              clear the selection
  mode <plain|decorated>  set the send mode
  send                  send the current selection or caret line
  sendall               send every line in the buffer
  log                   show received data
  clear                 clear the receive log
  record <path>         capture traffic to a file
  ports                 list available serial ports
  quit                  exit";

/// One parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open { port: String, baud: Option<u32> },
    Close,
    Load(PathBuf),
    Edit,
    Erase,
    Show,
    Goto(usize),
    Select(usize, usize),
    Deselect,
    Mode(SendMode),
    Send,
    SendAll,
    Log,
    Clear,
    Record(PathBuf),
    Ports,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line into a command.
    pub fn parse(input: &str) -> Result<Command> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let Some((&command, args)) = tokens.split_first() else {
            return Err(LinePortError::invalid_config("empty command"));
        };
        match (command, args) {
            ("open", [port]) => Ok(Command::Open {
                port: (*port).to_string(),
                baud: None,
            }),
            ("open", [port, baud]) => Ok(Command::Open {
                port: (*port).to_string(),
                baud: Some(parse_arg(baud, "baud rate")?),
            }),
            ("close", []) => Ok(Command::Close),
            ("load", rest) if !rest.is_empty() => Ok(Command::Load(rest.join(" ").into())),
            ("edit", []) => Ok(Command::Edit),
            ("erase", []) => Ok(Command::Erase),
            ("show", []) => Ok(Command::Show),
            ("goto", [line]) => {
                let line: usize = parse_arg(line, "line number")?;
                if line == 0 {
                    return Err(LinePortError::invalid_config("line numbers start at 1"));
                }
                Ok(Command::Goto(line))
            }
            ("select", [a, b]) => {
                let a: usize = parse_arg(a, "line number")?;
                let b: usize = parse_arg(b, "line number")?;
                if a == 0 || b == 0 {
                    return Err(LinePortError::invalid_config("line numbers start at 1"));
                }
                if a > b {
                    return Err(LinePortError::invalid_config(
                        "selection start must not exceed its end",
                    ));
                }
                Ok(Command::Select(a, b))
            }
            ("deselect", []) => Ok(Command::Deselect),
            ("mode", [mode]) => Ok(Command::Mode(SendMode::from_str(mode)?)),
            ("send", []) => Ok(Command::Send),
            ("sendall", []) => Ok(Command::SendAll),
            ("log", []) => Ok(Command::Log),
            ("clear", []) => Ok(Command::Clear),
            ("record", rest) if !rest.is_empty() => Ok(Command::Record(rest.join(" ").into())),
            ("ports", []) => Ok(Command::Ports),
            ("help" | "?", []) => Ok(Command::Help),
            ("quit" | "exit", []) => Ok(Command::Quit),
            _ => Err(LinePortError::invalid_config(format!(
                "unrecognized command or arguments: '{input}', try 'help'"
            ))),
        }
    }
}

fn parse_arg<T: FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| LinePortError::invalid_config(format!("invalid {what} '{value}'")))
}

/// Console state: the buffer, the connection, and the active send mode.
pub struct Console {
    buffer: TextBuffer,
    connection: Connection,
    log: DisplayLog,
    mode: SendMode,
    preferences: Preferences,
}

impl Console {
    /// Creates a console with an empty buffer and no connection.
    pub fn new(preferences: Preferences) -> Self {
        let log = DisplayLog::new();
        Console {
            buffer: TextBuffer::new(),
            connection: Connection::new(log.clone()),
            log,
            mode: SendMode::Plain,
            preferences,
        }
    }

    /// Sets the send mode.
    pub fn set_mode(&mut self, mode: SendMode) {
        self.mode = mode;
    }

    /// Replaces the buffer with composed text and reports the new size.
    pub fn compose(&mut self, text: &str) -> String {
        self.buffer.replace(text);
        format!("Buffer now holds {} line(s)", self.buffer.line_count())
    }

    /// Executes one command and returns its status text.
    pub async fn execute(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Open { port, baud } => {
                let baud = baud.unwrap_or(self.preferences.baud_rate);
                self.connection.open(&port, baud).await?;
                self.preferences.baud_rate = baud;
                if let Err(e) = self.preferences.save() {
                    warn!("Could not persist preferences: {e}");
                }
                Ok(format!("Connected to {port} at {baud} baud"))
            }
            Command::Close => {
                self.connection.disconnect().await;
                Ok("Disconnected".to_string())
            }
            Command::Load(path) => {
                self.buffer.load(&path)?;
                Ok(format!(
                    "Loaded {} line(s) from {}",
                    self.buffer.line_count(),
                    path.display()
                ))
            }
            // Interactive text entry is driven by the run loop; see `run`.
            Command::Edit => Ok(EDIT_PROMPT.to_string()),
            Command::Erase => {
                self.buffer.replace("");
                Ok("Buffer cleared".to_string())
            }
            Command::Show => {
                if self.buffer.text().is_empty() {
                    return Ok("(buffer is empty)".to_string());
                }
                let listing: Vec<String> = self
                    .buffer
                    .text()
                    .split('\n')
                    .enumerate()
                    .map(|(i, line)| format!("{:>4}  {line}", i + 1))
                    .collect();
                Ok(listing.join("\n"))
            }
            Command::Goto(line) => {
                let (start, _) = self
                    .buffer
                    .line_span(line - 1)
                    .ok_or_else(|| LinePortError::invalid_config(format!("no line {line}")))?;
                self.buffer.clear_selection();
                self.buffer.set_caret(start);
                Ok(format!("Current line: {}", self.buffer.resolve_unit()))
            }
            Command::Select(a, b) => {
                let (start, _) = self
                    .buffer
                    .line_span(a - 1)
                    .ok_or_else(|| LinePortError::invalid_config(format!("no line {a}")))?;
                let (_, end) = self
                    .buffer
                    .line_span(b - 1)
                    .ok_or_else(|| LinePortError::invalid_config(format!("no line {b}")))?;
                self.buffer.set_selection(start, end);
                Ok(format!("Selected lines {a} through {b}"))
            }
            Command::Deselect => {
                self.buffer.clear_selection();
                Ok("Selection cleared".to_string())
            }
            Command::Mode(mode) => {
                self.mode = mode;
                Ok(format!("Send mode: {mode}"))
            }
            Command::Send => {
                let unit = self.buffer.resolve_unit().to_string();
                self.transmit(&unit).await
            }
            Command::SendAll => {
                let text = self.buffer.text().to_string();
                self.transmit(&text).await
            }
            Command::Log => {
                if self.log.is_empty() {
                    Ok("(no data received)".to_string())
                } else {
                    Ok(self.log.to_text())
                }
            }
            Command::Clear => {
                self.log.clear();
                Ok("Receive log cleared".to_string())
            }
            Command::Record(path) => {
                let session = SessionLog::create(&path)?;
                self.connection.set_session(Some(session));
                Ok(format!("Recording session to {}", path.display()))
            }
            Command::Ports => {
                let ports = list_ports();
                let mut out = if ports.is_empty() {
                    "No serial ports found".to_string()
                } else {
                    ports.join("\n")
                };
                let rates: Vec<String> =
                    COMMON_BAUD_RATES.iter().map(|r| r.to_string()).collect();
                out.push_str(&format!("\nCommon baud rates: {}", rates.join(" ")));
                Ok(out)
            }
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok("Bye".to_string()),
        }
    }

    async fn transmit(&mut self, unit: &str) -> Result<String> {
        let text = apply(self.mode, unit);
        let sent = send_text(&mut self.connection, &self.log, &text).await?;
        if sent == 0 {
            Ok("Nothing to send".to_string())
        } else {
            Ok(format!("Sent {sent} line(s)"))
        }
    }
}

/// Runs the console: startup actions from CLI arguments, then the
/// interactive command loop until `quit` or end of input.
pub async fn run(cli: Cli) -> Result<()> {
    if cli.list_ports {
        for port in list_ports() {
            println!("{port}");
        }
        return Ok(());
    }

    let mut console = Console::new(Preferences::load());
    if cli.decorated {
        console.set_mode(SendMode::Decorated);
    }
    if let Some(file) = &cli.file {
        match console.execute(Command::Load(file.clone())).await {
            Ok(status) => println!("{status}"),
            Err(e) => println!("Error: {e}"),
        }
    }
    if let Some(port) = &cli.port {
        let command = Command::Open {
            port: port.clone(),
            baud: cli.baud,
        };
        match console.execute(command).await {
            Ok(status) => println!("{status}"),
            Err(e) => println!("Error: {e}"),
        }
    }

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match Command::parse(line) {
            Ok(Command::Quit) => break,
            Ok(Command::Edit) => {
                println!("{EDIT_PROMPT}");
                let mut collected: Vec<String> = Vec::new();
                while let Some(text_line) = lines.next_line().await? {
                    if text_line.trim_end() == "." {
                        break;
                    }
                    collected.push(text_line);
                }
                println!("{}", console.compose(&collected.join("\n")));
            }
            Ok(command) => match console.execute(command).await {
                Ok(status) => println!("{status}"),
                Err(e) => println!("Error: {e}"),
            },
            Err(e) => println!("Error: {e}"),
        }
    }

    console.execute(Command::Close).await?;
    Ok(())
}
