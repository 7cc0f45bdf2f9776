//! CLI (Command Line Interface) mode
//!
//! Interactive REPL over a [`ChatSession`], plus the one-shot ask used by
//! `--ask`. History indices shown to the user are 1-based.

use chatai_core::{ChatSession, Error, Interaction, LOADING_MESSAGE, SubmitOutcome};
use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Completer, DefaultHinter, EditCommand, Emacs, KeyCode, KeyModifiers, Keybindings,
    MenuBuilder, Prompt, Reedline, ReedlineEvent, ReedlineMenu, Signal, Suggestion,
};
use std::borrow::Cow;
use tracing::info;

/// Available commands for autocomplete display
const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Show help"),
    ("/exit", "Exit"),
    ("/quit", "Exit"),
    ("/history", "List question/answer history"),
    ("/edit", "Edit entry <n>: the next question replaces it"),
    ("/cancel", "Stop editing; the next question is appended"),
    ("/delete", "Delete entry <n>"),
    ("/clear", "Clear the current question and answer"),
    ("/clear-history", "Delete all history"),
];

/// Characters of each side shown per history line
const PREVIEW_CHARS: usize = 100;

/// Command completer for reedline
#[derive(Clone)]
pub struct CommandCompleter {
    commands: Vec<(&'static str, &'static str)>,
}

impl CommandCompleter {
    pub fn new() -> Self {
        Self {
            commands: COMMANDS.to_vec(),
        }
    }
}

impl Default for CommandCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        if !line.starts_with('/') {
            return Vec::new();
        }

        self.commands
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(line))
            .map(|(cmd, desc)| Suggestion {
                value: cmd.to_string(),
                description: Some(desc.to_string()),
                extra: None,
                span: reedline::Span::new(0, pos),
                append_whitespace: true,
                style: None,
            })
            .collect()
    }
}

/// Prompt showing the edit target on the left and the submit label on the right
struct ColoredPrompt {
    edit_index: Option<usize>,
    label: &'static str,
}

impl ColoredPrompt {
    fn for_session(session: &ChatSession) -> Self {
        Self {
            edit_index: session.edit_index(),
            label: session.submit_label(),
        }
    }
}

impl Prompt for ColoredPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        match self.edit_index {
            Some(i) => Cow::Owned(Color::Yellow.bold().paint(format!("edit #{}> ", i + 1)).to_string()),
            None => Cow::Owned(Color::Cyan.bold().paint("> ").to_string()),
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Owned(Style::new().dimmed().paint(self.label).to_string())
    }

    fn render_prompt_indicator(&self, _prompt_mode: reedline::PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: reedline::PromptHistorySearch,
    ) -> Cow<'_, str> {
        Cow::Borrowed("")
    }
}

/// A parsed REPL command
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Exit,
    History,
    /// 0-based index
    Edit(usize),
    Cancel,
    /// 0-based index
    Delete(usize),
    Clear,
    ClearHistory,
    /// Known command with a bad argument; carries the usage line
    Usage(&'static str),
    Unknown(String),
}

/// Parse a line starting with `/`; anything else is a question
fn parse_command(input: &str) -> Option<Command> {
    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();

    let command = match name.as_str() {
        "/help" | "/?" => Command::Help,
        "/exit" | "/quit" | "/q" => Command::Exit,
        "/history" => Command::History,
        "/edit" => match parse_position(arg) {
            Some(index) => Command::Edit(index),
            None => Command::Usage("/edit <n>"),
        },
        "/delete" => match parse_position(arg) {
            Some(index) => Command::Delete(index),
            None => Command::Usage("/delete <n>"),
        },
        "/cancel" => Command::Cancel,
        "/clear" => Command::Clear,
        "/clear-history" => Command::ClearHistory,
        _ => Command::Unknown(name),
    };
    Some(command)
}

/// 1-based position to 0-based index
fn parse_position(arg: Option<&str>) -> Option<usize> {
    arg?.parse::<usize>().ok()?.checked_sub(1)
}

/// Run CLI interactive mode
pub async fn run_cli(session: ChatSession) -> anyhow::Result<()> {
    info!("Starting CLI mode with {} history records", session.history_len());

    print_welcome();

    let mut keybindings = default_keybindings();

    // Trigger completion on '/' key
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Char('/'),
        ReedlineEvent::Edit(vec![EditCommand::Complete]),
    );

    let menu = Box::new(
        ColumnarMenu::default()
            .with_name("command_menu")
            .with_columns(1)
            .with_column_width(Some(40))
            .with_only_buffer_difference(false),
    );

    let hinter = DefaultHinter::default().with_style(Style::new().dimmed());

    let mut line_editor = Reedline::create()
        .with_completer(Box::new(CommandCompleter::new()))
        .with_menu(ReedlineMenu::EngineCompleter(menu))
        .with_hinter(Box::new(hinter))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    loop {
        let prompt = ColoredPrompt::for_session(&session);

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                let input = line.trim();

                if input.is_empty() {
                    continue;
                }

                if let Some(command) = parse_command(input) {
                    match handle_command(&session, command) {
                        Next::Exit => break,
                        Next::Prefill(text) => {
                            line_editor.run_edit_commands(&[
                                EditCommand::Clear,
                                EditCommand::InsertString(text),
                            ]);
                        }
                        Next::Continue => {}
                    }
                    continue;
                }

                ask(&session, input).await;
            }
            Ok(Signal::CtrlC) => {
                println!("^C");
                continue;
            }
            Ok(Signal::CtrlD) => break,
            Err(err) => {
                eprintln!("\nError: {}\n", err);
                break;
            }
        }
    }

    println!("\nBye!\n");
    Ok(())
}

/// Submit from the REPL and print whatever the session now displays
async fn ask(session: &ChatSession, question: &str) {
    println!("{}", Style::new().dimmed().paint(LOADING_MESSAGE));

    match session.submit(question).await {
        Ok(SubmitOutcome::Answered { answer, index, replaced }) => {
            println!("\n{}\n", answer);
            let verb = if replaced { "Updated" } else { "Saved as" };
            println!("{}", Style::new().dimmed().paint(format!("{} #{}", verb, index + 1)));
        }
        Ok(SubmitOutcome::Failed { message }) => {
            eprintln!("\n{}\n", Color::Red.paint(message));
        }
        Err(Error::OutOfRange { index, .. }) => {
            println!("\n{}\n", session.answer());
            eprintln!(
                "{}",
                Color::Red.paint(format!("Entry #{} no longer exists; answer not saved", index + 1))
            );
        }
        Err(e) => {
            eprintln!("\nError: {}\n", e);
        }
    }
}

/// What the REPL does after a command
#[derive(Debug, PartialEq, Eq)]
enum Next {
    Continue,
    /// Start the next line with this text already typed
    Prefill(String),
    Exit,
}

/// Execute a command
fn handle_command(session: &ChatSession, command: Command) -> Next {
    match command {
        Command::Exit => return Next::Exit,
        Command::Help => print_help(),
        Command::History => print_history(&session.history()),
        Command::Edit(index) => match session.begin_edit(index) {
            Ok(item) => {
                println!("\nEditing #{}", index + 1);
                println!("Answer:\n{}\n", item.answer);
                println!("Revise the question below; /cancel to stop editing.\n");
                return Next::Prefill(item.question);
            }
            Err(e) => eprintln!("\n{}\n", e),
        },
        Command::Cancel => {
            session.cancel_edit();
            println!("\nEditing cancelled.\n");
        }
        Command::Delete(index) => match session.delete_history_item(index) {
            Ok(records) => println!("\nDeleted #{} ({} left).\n", index + 1, records.len()),
            Err(e) => eprintln!("\n{}\n", e),
        },
        Command::Clear => {
            session.clear_draft();
            println!("\nCleared.\n");
        }
        Command::ClearHistory => match session.clear_history() {
            Ok(()) => println!("\nHistory cleared.\n"),
            Err(e) => eprintln!("\nFailed to clear history: {}\n", e),
        },
        Command::Usage(usage) => eprintln!("\nUsage: {} (n starts at 1)\n", usage),
        Command::Unknown(name) => {
            eprintln!("\nUnknown command: {}. Type /help for the list.\n", name)
        }
    }
    Next::Continue
}

/// Non-interactive mode: ask once, print the answer and exit
pub async fn run_ask(session: &ChatSession, question: &str) -> anyhow::Result<()> {
    match session.submit(question).await? {
        SubmitOutcome::Answered { answer, .. } => {
            println!("{}", answer);
            Ok(())
        }
        SubmitOutcome::Failed { message } => anyhow::bail!(message),
    }
}

/// Default keybindings for reedline
fn default_keybindings() -> Keybindings {
    let mut keybindings = Keybindings::new();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Edit(vec![EditCommand::Complete]),
    );
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Esc, ReedlineEvent::Esc);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('c'), ReedlineEvent::CtrlC);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::CtrlD);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings
}

fn print_welcome() {
    println!();
    println!("chatai - type a question and press Enter");
    println!("Commands: /help, /history, /edit <n>, /delete <n>, /exit");
    println!();
}

fn print_help() {
    println!();
    println!("Available commands:");
    for (cmd, desc) in COMMANDS {
        println!("  {:<16} {}", cmd, desc);
    }
    println!();
}

/// Print stored history, one numbered entry per pair
pub fn print_history(records: &[Interaction]) {
    println!();
    println!("History ({} entries):", records.len());
    println!("{}", "─".repeat(50));

    for (i, item) in records.iter().enumerate() {
        println!("{}. Q: {}", i + 1, preview(&item.question));
        println!("   A: {}", preview(&item.answer));
    }

    println!("{}", "─".repeat(50));
    println!();
}

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > PREVIEW_CHARS {
        format!("{}...", flat.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        flat
    }
}
