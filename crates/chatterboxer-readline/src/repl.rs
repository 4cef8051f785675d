use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use chatterboxer_application::{ChatSession, SessionState};
use chatterboxer_core::{ConversationRepository, Role, Turn};

use crate::commands::{COMMANDS, Command, help_text, lookup};

/// rustyline helper driven by the command table.
///
/// Completes and hints the first word of the line, and colours it cyan when
/// it names a command or red when it is an unknown slash word.
#[derive(Clone, Copy, Default)]
struct CommandHelper;

impl Helper for CommandHelper {}

/// The first word being typed, if the cursor is still inside it.
fn leading_word(line: &str, pos: usize) -> Option<&str> {
    let word = &line[..pos];
    (!word.is_empty() && !word.contains(char::is_whitespace)).then_some(word)
}

fn completions(word: &str) -> Vec<Pair> {
    COMMANDS
        .iter()
        .flat_map(|spec| spec.words().map(move |w| (w, spec.summary)))
        .filter(|(w, _)| w.starts_with(word))
        .map(|(w, summary)| Pair {
            display: format!("{:<12} {}", w, summary),
            replacement: format!("{} ", w),
        })
        .collect()
}

fn hint_for(line: &str) -> Option<String> {
    if let Some(head) = line.strip_suffix(' ') {
        return lookup(head)
            .and_then(|spec| spec.argument)
            .map(|argument| format!("<{}>", argument));
    }
    let word = leading_word(line, line.len())?;
    let spec = COMMANDS
        .iter()
        .find(|spec| spec.words().any(|w| w.starts_with(word)))?;
    let completed = spec.words().find(|w| w.starts_with(word))?;

    let mut hint = completed[word.len()..].to_string();
    if let Some(argument) = spec.argument {
        hint.push_str(&format!(" <{}>", argument));
    }
    (!hint.is_empty()).then_some(hint)
}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok((0, leading_word(line, pos).map(completions).unwrap_or_default()))
    }
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let head = line.split(' ').next().unwrap_or_default();
        let tail = &line[head.len()..];
        if lookup(head).is_some() {
            Owned(format!("{}{}", head.bright_cyan(), tail))
        } else if head.starts_with('/') {
            Owned(format!("{}{}", head.red(), tail))
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        hint_for(line)
    }
}

impl Validator for CommandHelper {}

/// Prints the whole conversation, one role-coloured block per turn.
pub fn render_conversation(turns: &[Turn]) {
    println!("{}", "─".repeat(40).bright_black());
    for turn in turns {
        let label = format!("{}:", turn.role);
        let label = match turn.role {
            Role::System => label.bright_black(),
            Role::Human => label.green().bold(),
            Role::Assistant => label.bright_blue().bold(),
        };
        if turn.text.is_empty() {
            println!("{}", label);
            continue;
        }
        println!("{} {}", label, turn.text.lines().next().unwrap_or_default());
        for line in turn.text.lines().skip(1) {
            println!("    {}", line);
        }
    }
    println!("{}", "─".repeat(40).bright_black());
}

/// Runs the interactive authoring loop until `quit` or EOF.
pub fn run<R: ConversationRepository>(mut session: ChatSession<R>) -> Result<()> {
    session.set_observer(render_conversation);

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHelper));

    println!("{}", "=== ChatterBoxer ===".bright_magenta().bold());
    println!(
        "{}",
        format!(
            "Authoring conversation {}. Type '/help' for commands or 'quit' to exit.",
            session.current_id()
        )
        .bright_black()
    );
    println!();

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                match Command::parse(&line) {
                    Command::Quit => {
                        if session.state() == SessionState::Authoring {
                            println!(
                                "{}",
                                "Unsaved turns in the current conversation were discarded.".yellow()
                            );
                        }
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Command::Human(text) => session.add_human(text),
                    Command::Assistant(text) => session.add_assistant(text),
                    Command::Save => match session.finalize() {
                        Ok(saved) => println!(
                            "{}",
                            format!(
                                "Saved conversation {} ({} turns) to {}",
                                saved.id,
                                saved.turns,
                                saved.path.display()
                            )
                            .green()
                        ),
                        Err(e) => eprintln!(
                            "{}",
                            format!("Save failed, conversation kept: {}", e).red()
                        ),
                    },
                    Command::Aggregate => match session.aggregate_all() {
                        Ok(report) => println!(
                            "{}",
                            format!(
                                "Wrote {} conversations to {}",
                                report.conversations,
                                report.destination.display()
                            )
                            .green()
                        ),
                        Err(e) => eprintln!("{}", format!("Aggregation failed: {}", e).red()),
                    },
                    Command::Show => render_conversation(session.snapshot()),
                    Command::Help => println!("{}", help_text().bright_black()),
                    Command::Unknown(input) => println!(
                        "{}",
                        format!("Unknown command: {} (try /human <text> or /help)", input)
                            .bright_black()
                    ),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                tracing::error!("[Repl] Readline failure: {:?}", err);
                return Err(err.into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_completes_name_and_argument() {
        assert_eq!(hint_for("/hu").as_deref(), Some("man <text>"));
        assert_eq!(hint_for("/human").as_deref(), Some(" <text>"));
        assert_eq!(hint_for("/human ").as_deref(), Some("<text>"));
        assert_eq!(hint_for("/sa").as_deref(), Some("ve"));
        assert_eq!(hint_for("/save"), None);
        assert_eq!(hint_for("/human hi"), None);
        assert_eq!(hint_for("/zzz"), None);
    }

    #[test]
    fn test_completion_covers_aliases() {
        let replacements: Vec<String> = completions("/a")
            .into_iter()
            .map(|pair| pair.replacement)
            .collect();
        assert_eq!(replacements, vec!["/assistant ", "/a ", "/aggregate ", "/all "]);
        assert!(completions("/x").is_empty());
    }

    #[test]
    fn test_highlight_marks_unknown_commands() {
        colored::control::set_override(false);
        let helper = CommandHelper;
        assert!(matches!(helper.highlight("hello there", 0), Borrowed(_)));
        assert_eq!(helper.highlight("/human hi", 0), "/human hi");
    }
}
