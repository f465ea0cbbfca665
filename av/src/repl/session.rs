//! REPL session management

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::flows::FlowRunner;
use crate::forms::{AssistantChat, ChatRole, DashboardPanel};
use crate::schema::{DashboardInput, Language};
use crate::session::Session;

/// Interactive assistant session
pub struct ReplSession {
    session: Session,
    chat: AssistantChat,
    dashboard: DashboardPanel,
    last_dashboard: Option<DashboardInput>,
}

impl ReplSession {
    pub fn new(runner: FlowRunner, session: Session) -> Self {
        Self {
            session,
            chat: AssistantChat::new(runner.clone()),
            dashboard: DashboardPanel::new(runner),
            last_dashboard: None,
        }
    }

    /// Run the REPL main loop
    pub async fn run(mut self, initial_question: Option<String>) -> Result<()> {
        self.print_welcome();

        if let Some(question) = initial_question {
            println!("{} {}", ">".bright_green(), question);
            self.ask(&question).await;
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(SlashCommand::parse(input)).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.ask(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        self.session.end();
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        let farm = self.session.farm.get();
        println!();
        println!("{}", "AgriVision Assistant".bright_cyan().bold());
        println!("Farm: {} ({})", farm.farm_name, farm.farm_location);
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
        if let Some(greeting) = self.chat.messages().first() {
            println!("{}", greeting.content.bright_blue());
            println!();
        }
    }

    async fn ask(&self, question: &str) {
        println!("{}", "Thinking...".dimmed());
        match self.chat.ask(question).await {
            Ok(Some(reply)) => println!("{}", reply.content.bright_blue()),
            Ok(None) => {}
            Err(invalid) => {
                for field in invalid.errors() {
                    println!("{} {}", "Error:".red(), field);
                }
            }
        }
        println!();
    }

    async fn handle_slash_command(&mut self, command: SlashCommand) -> SlashResult {
        debug!(?command, "ReplSession::handle_slash_command: called");
        match command {
            SlashCommand::Help => self.print_help(),
            SlashCommand::Quit => return SlashResult::Quit,
            SlashCommand::Clear => {
                self.chat.clear();
                println!("{}", "Conversation cleared.".dimmed());
            }
            SlashCommand::History => self.print_history(),
            SlashCommand::Lang(None) => {
                let current = self.session.language.get();
                println!("Language: {} ({})", current.native_name(), current);
                for language in Language::ALL {
                    println!("  {:4} {}", language.code().yellow(), language.native_name());
                }
            }
            SlashCommand::Lang(Some(code)) => match code.parse::<Language>() {
                Ok(language) => {
                    if let Err(e) = self.session.language.set(language) {
                        println!("{} {}", "Error:".red(), e);
                    } else {
                        println!("Language set to {}", language.native_name());
                        self.refresh_dashboard_if_shown().await;
                    }
                }
                Err(e) => println!("{} {}", "Error:".red(), e),
            },
            SlashCommand::Farm(None) => {
                let farm = self.session.farm.get();
                println!();
                println!("{}", "Farm Settings:".bright_cyan());
                println!("  {:10} {}", "Name".yellow(), farm.farm_name);
                println!("  {:10} {}", "Location".yellow(), farm.farm_location);
                println!("  {:10} {} acres", "Size".yellow(), farm.farm_size);
                println!("  {:10} {}", "Type".yellow(), farm.farm_type.as_str());
                println!("  {:10} {}", "About".yellow(), farm.description);
                println!();
            }
            SlashCommand::Farm(Some(location)) => {
                match self.session.farm.update(|farm| farm.farm_location = location.clone()) {
                    Ok(()) => {
                        println!("Farm location set to {}", location);
                        self.refresh_dashboard_if_shown().await;
                    }
                    Err(e) => println!("{} {}", "Error:".red(), e),
                }
            }
            SlashCommand::Dashboard => {
                println!("{}", "Loading farm summary...".dimmed());
                self.last_dashboard = Some(self.session.dashboard_input());
                self.dashboard.refresh(&self.session).await;
                self.print_dashboard();
            }
            SlashCommand::Profile => {
                let user = self.session.user.get();
                println!();
                println!("{}", "Profile:".bright_cyan());
                println!("  {:10} {}", "Name".yellow(), user.full_name);
                println!("  {:10} {}", "Email".yellow(), user.email);
                println!("  {:10} {}", "Bio".yellow(), user.bio);
                println!("  {:10} {}", "Avatar".yellow(), preview(&user.avatar_url, 60));
                println!();
            }
            SlashCommand::Unknown(cmd) => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        SlashResult::Continue
    }

    /// Once the dashboard has been shown, keep it in step with the session
    async fn refresh_dashboard_if_shown(&mut self) {
        let Some(last) = self.last_dashboard.as_mut() else {
            return;
        };
        if self.dashboard.refresh_if_changed(&self.session, last).await.is_some() {
            self.print_dashboard();
        }
    }

    fn print_dashboard(&self) {
        if let Some(text) = self.dashboard.render() {
            println!();
            println!("{}", "Farm Summary:".bright_cyan());
            println!("{}", text);
            println!();
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:18} Show this help", "/help".yellow());
        println!("  {:18} Exit the assistant", "/quit".yellow());
        println!("  {:18} Clear conversation history", "/clear".yellow());
        println!("  {:18} Show conversation history", "/history".yellow());
        println!("  {:18} Show or set the language (en, hi, pa)", "/lang [code]".yellow());
        println!("  {:18} Show farm settings or set the location", "/farm [location]".yellow());
        println!("  {:18} Show the farm summary", "/dashboard".yellow());
        println!("  {:18} Show the user profile", "/profile".yellow());
        println!();
        println!("Anything else is sent to the assistant as a crop question.");
        println!();
    }

    fn print_history(&self) {
        let messages = self.chat.messages();
        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, msg) in messages.iter().enumerate() {
            let role = match msg.role {
                ChatRole::User => "User".bright_green(),
                ChatRole::Assistant => "Assistant".bright_blue(),
            };
            println!("  {}. {}: {}", i + 1, role, preview(&msg.content, 50));
        }
        println!();
    }
}

fn preview(text: &str, max: usize) -> String {
    let head: String = text.chars().take(max).collect();
    if text.chars().count() > max { format!("{}...", head) } else { head }
}

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Quit,
    Clear,
    History,
    Lang(Option<String>),
    Farm(Option<String>),
    Dashboard,
    Profile,
    Unknown(String),
}

impl SlashCommand {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let (cmd, rest) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
        let arg = Some(rest.trim()).filter(|s| !s.is_empty()).map(str::to_string);

        match cmd {
            "/help" | "/h" => Self::Help,
            "/quit" | "/q" | "/exit" => Self::Quit,
            "/clear" | "/c" => Self::Clear,
            "/history" => Self::History,
            "/lang" => Self::Lang(arg),
            "/farm" => Self::Farm(arg),
            "/dashboard" | "/d" => Self::Dashboard,
            "/profile" => Self::Profile,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}
