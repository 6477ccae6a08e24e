//! Input line parsing.

/// One line of tester input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect,
    Disconnect,
    Clear,
    Log,
    Get(String),
    Put(String),
    Quit,
    Help,
    /// Anything that is not a command is sent as a message.
    Send(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let (head, arg) = match trimmed.split_once(char::is_whitespace) {
            Some((head, arg)) => (head, arg.trim()),
            None => (trimmed, ""),
        };

        match head {
            "/connect" => Command::Connect,
            "/disconnect" => Command::Disconnect,
            "/clear" => Command::Clear,
            "/log" => Command::Log,
            "/get" => Command::Get(endpoint(arg)),
            "/put" => Command::Put(endpoint(arg)),
            "/quit" | "/exit" => Command::Quit,
            "/help" => Command::Help,
            _ => Command::Send(line.to_owned()),
        }
    }
}

/// REST path for `/get` and `/put`, defaulting to `/api/hello`.
fn endpoint(arg: &str) -> String {
    match arg {
        "" => "/api/hello".into(),
        p if p.starts_with('/') => p.into(),
        p => format!("/{p}"),
    }
}

pub const HELP: &str = "\
commands:
  /connect          open the WebSocket connection (replaces any open one)
  /disconnect       close the connection
  /clear            clear the message log
  /log              print the whole message log
  /get [path]       GET a REST endpoint (default /api/hello)
  /put [path]       PUT a REST endpoint (default /api/hello)
  /quit             exit
anything else is sent as a message";
