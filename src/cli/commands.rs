/// A line of user input, interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Interrupt(String),
    Cancel,
    History,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP_LINES: &[&str] = &[
    "Type a question and press Enter.",
    "/interrupt <question>  drop the current answer and ask again",
    "/cancel                stop the current answer",
    "/history               show this conversation",
    "/help                  show this help",
    "/exit, /quit, /q       leave",
];

impl Command {
    /// Parses one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(Command::Ask(line.to_string()));
        }
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let command = match name.to_lowercase().as_str() {
            "/exit" | "/quit" | "/q" => Command::Quit,
            "/help" => Command::Help,
            "/cancel" => Command::Cancel,
            "/history" => Command::History,
            "/interrupt" if !rest.is_empty() => Command::Interrupt(rest.to_string()),
            _ => Command::Unknown(line.to_string()),
        };
        Some(command)
    }
}
