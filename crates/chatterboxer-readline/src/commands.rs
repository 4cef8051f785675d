/// One REPL command: its name, optional short alias, and argument placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub alias: Option<&'static str>,
    pub argument: Option<&'static str>,
    pub summary: &'static str,
}

impl CommandSpec {
    /// The name followed by the alias, if any.
    pub fn words(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.alias)
    }

    fn usage(&self) -> String {
        match self.argument {
            Some(argument) => format!("{} <{}>", self.name, argument),
            None => self.name.to_string(),
        }
    }
}

/// Commands understood by the REPL, in completion order.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "/human",
        alias: Some("/h"),
        argument: Some("text"),
        summary: "add a human turn",
    },
    CommandSpec {
        name: "/assistant",
        alias: Some("/a"),
        argument: Some("text"),
        summary: "add an assistant turn",
    },
    CommandSpec {
        name: "/save",
        alias: Some("/new"),
        argument: None,
        summary: "save this conversation and start a new one",
    },
    CommandSpec {
        name: "/aggregate",
        alias: Some("/all"),
        argument: None,
        summary: "merge all saved conversations into one file",
    },
    CommandSpec {
        name: "/show",
        alias: None,
        argument: None,
        summary: "print the current conversation",
    },
    CommandSpec {
        name: "/help",
        alias: None,
        argument: None,
        summary: "list commands",
    },
    CommandSpec {
        name: "quit",
        alias: Some("exit"),
        argument: None,
        summary: "leave",
    },
];

/// Finds the command `word` names, by name or alias.
pub fn lookup(word: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.words().any(|w| w == word))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Human(String),
    Assistant(String),
    Save,
    Aggregate,
    Show,
    Help,
    Quit,
    /// A line that isn't a known command.
    Unknown(String),
}

impl Command {
    /// Parses one raw REPL line.
    ///
    /// Leading whitespace is ignored. Text after `/human`/`/assistant` is kept
    /// verbatim apart from the single separating space, trailing whitespace
    /// included, so it may be empty.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_start();
        let trimmed = line.trim_end();

        let (head, rest) = match line.split_once(' ') {
            Some((head, rest)) => (head, rest),
            None => (trimmed, ""),
        };
        let bare = rest.trim().is_empty();

        match lookup(head).map(|spec| spec.name) {
            Some("/human") => Command::Human(rest.to_string()),
            Some("/assistant") => Command::Assistant(rest.to_string()),
            Some("/save") if bare => Command::Save,
            Some("/aggregate") if bare => Command::Aggregate,
            Some("/show") if bare => Command::Show,
            Some("/help") if bare => Command::Help,
            Some("quit") if bare => Command::Quit,
            _ => Command::Unknown(trimmed.to_string()),
        }
    }
}

pub fn help_text() -> String {
    COMMANDS
        .iter()
        .map(|spec| {
            let alias = spec
                .alias
                .map(|alias| format!(" (alias {})", alias))
                .unwrap_or_default();
            format!("{:<18} {}{}", spec.usage(), spec.summary, alias)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
