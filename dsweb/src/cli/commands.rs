//! CLI command execution.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::chat::{
    BootstrapSettings, ChatSession, Key, KeyOutcome, PendingIndicator, Registrar,
    SessionBootstrap, SessionSender, SubmissionHandler, SubmissionOutcome,
};
use crate::config::{Config, Overrides};
use crate::error::{BootstrapError, RestError};
use crate::logging;
use crate::models::RegistrationRequest;
use crate::pubsub::{LocalBroker, PubSubClient};
use crate::rest::{RestClient, RestCommand};
use crate::timeline::{share, MessageRenderer, TerminalSurface};

use super::args::{
    Cli, Commands, CreditsCommands, ImageCommands, RestCommands, VariableCommands,
    VotingCommands,
};

/// Title shown before the intervention and nickname are known.
const PAGE_TITLE: &str = "Deepstream Web";

/// Typing this line leaves the chat.
const QUIT_COMMAND: &str = "/quit";

/// Time given to in-flight replies before the listener is stopped.
const SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Options of the `chat` subcommand.
struct ChatOptions {
    page: String,
    nickname: Option<String>,
    offline: bool,
    echo: bool,
    transcript: Option<PathBuf>,
}

/// Execute the CLI command.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref(), &Overrides::from(&cli))?;
    logging::init(config.debug);
    tracing::debug!(rest_url = %config.rest_url, pubsub_url = %config.pubsub_url, "configuration loaded");

    match cli.command {
        Commands::Chat {
            page,
            nickname,
            offline,
            echo,
            transcript,
        } => {
            let opts = ChatOptions {
                page,
                nickname,
                offline,
                echo,
                transcript,
            };
            run_chat(&config, opts).await
        }
        Commands::Rest { command } => run_rest(&config, command).await,
    }
}

async fn run_chat(config: &Config, opts: ChatOptions) -> Result<()> {
    // Offline, the broker registers participants itself and only admits
    // those; otherwise the REST backend registers and the broker trusts it.
    let broker = if opts.offline {
        LocalBroker::new()
    } else {
        LocalBroker::open()
    };
    if opts.echo {
        broker.provide_echo().await;
    }
    let registrar: Arc<dyn Registrar> = if opts.offline {
        Arc::new(broker.clone())
    } else {
        Arc::new(RestClient::from_config(config))
    };
    let client: Arc<dyn PubSubClient> = Arc::new(broker.connect());
    tracing::info!(
        "Using the in-process broker in place of {}",
        config.pubsub_url
    );

    let (terminal, surface) = share(TerminalSurface::new(PAGE_TITLE));
    let renderer = MessageRenderer::new(surface.clone());
    let bootstrap = SessionBootstrap::load_page(
        &opts.page,
        BootstrapSettings::from(config),
        registrar,
        client,
        renderer.clone(),
    )
    .await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let Some(chat) = join_chat(&bootstrap, opts.nickname, &mut lines).await? else {
        return Ok(());
    };

    let indicator = PendingIndicator::new(surface.clone(), config.pending_delay, config.pending_clear);
    let handler = SubmissionHandler::new(renderer, Arc::new(SessionSender::new(chat.session)))
        .with_indicator(indicator);
    surface.lock().await.focus_input();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim() == QUIT_COMMAND {
            break;
        }
        surface.lock().await.set_input(&line);
        if handler.key_press(Key::Enter).await == KeyOutcome::Submitted(SubmissionOutcome::Rejected) {
            // Nothing was sent; prompt again.
            surface.lock().await.focus_input();
        }
    }

    tokio::time::sleep(SETTLE_DELAY).await;
    chat.listener.abort();

    let terminal = terminal.lock().await;
    tracing::info!(messages = terminal.entries().len(), "chat ended");
    if let Some(path) = opts.transcript {
        write_transcript(&path, &terminal.to_html()).await?;
        println!("Transcript written to {}", path.display());
    }
    Ok(())
}

/// Start the session, asking for a nickname until a usable one is given.
///
/// Returns `None` when input ends first or when registration or login
/// failed; the surface already shows why.
async fn join_chat<R>(
    bootstrap: &SessionBootstrap,
    mut nickname: Option<String>,
    lines: &mut Lines<R>,
) -> Result<Option<ChatSession>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let name = match nickname.take() {
            Some(name) => name,
            None => {
                print!("Nickname: ");
                std::io::stdout().flush().context("Failed to write prompt")?;
                match lines.next_line().await.context("Failed to read nickname")? {
                    Some(line) => line,
                    None => return Ok(None),
                }
            }
        };

        match bootstrap.start(&name).await {
            Ok(chat) => return Ok(Some(chat)),
            Err(BootstrapError::EmptyDisplayName) => {}
            Err(e) => {
                tracing::debug!(routing_key = bootstrap.routing_key(), "chat not started: {e}");
                return Ok(None);
            }
        }
    }
}

async fn write_transcript(path: &Path, html: &str) -> Result<()> {
    tokio::fs::write(path, html)
        .await
        .with_context(|| format!("Failed to write transcript {}", path.display()))
}

async fn run_rest(config: &Config, command: RestCommands) -> Result<()> {
    let client = RestClient::from_config(config);

    match command {
        RestCommands::Variable { command } => {
            run_command(&client, variable_command(command)).await
        }
        RestCommands::Voting { command } => run_command(&client, voting_command(command)).await,
        RestCommands::Credits {
            command: CreditsCommands::Store { kind, id },
        } => run_command(&client, RestCommand::StoreCredit { kind, id }).await,
        RestCommands::Image {
            command: ImageCommands::Upload { variable, file },
        } => {
            let name = format!("image/upload/{variable}");
            report(&name, client.upload_image(&variable, &file).await)
        }
        RestCommands::Register { nickname, pattern } => {
            let request = RegistrationRequest {
                nickname,
                role: config.role.clone(),
                intervention_pattern: pattern.unwrap_or_else(|| config.default_routing_key.clone()),
                intervention_password: config.intervention_password.clone(),
            };
            let result = client.register(&request).await.and_then(|credentials| {
                serde_json::to_value(credentials).map_err(|source| RestError::Decode {
                    command: "deepstream/register".to_string(),
                    source,
                })
            });
            report("deepstream/register", result)
        }
    }
}

fn variable_command(command: VariableCommands) -> RestCommand {
    match command {
        VariableCommands::Read { name } => RestCommand::VariableRead(name),
        VariableCommands::ReadMany { names } => RestCommand::VariableReadMany(names),
        VariableCommands::Write { name, value } => RestCommand::VariableWrite { name, value },
        VariableCommands::ReadGroupArray { name } => RestCommand::VariableReadGroupArray(name),
        VariableCommands::ReadGroupArrayMany { names } => {
            RestCommand::VariableReadGroupArrayMany(names)
        }
        VariableCommands::ReadInterventionArray { name } => {
            RestCommand::VariableReadInterventionArray(name)
        }
        VariableCommands::ReadInterventionArrayMany { names } => {
            RestCommand::VariableReadInterventionArrayMany(names)
        }
        VariableCommands::CalculateGroupAverage { name } => RestCommand::CalculateGroupAverage(name),
        VariableCommands::CalculateInterventionAverage { name } => {
            RestCommand::CalculateInterventionAverage(name)
        }
    }
}

fn voting_command(command: VotingCommands) -> RestCommand {
    match command {
        VotingCommands::Votings { name } => RestCommand::Votings(name),
        VotingCommands::VotingsGroupArray { name } => RestCommand::VotingsGroupArray(name),
        VotingCommands::VotingsInterventionArray { name } => {
            RestCommand::VotingsInterventionArray(name)
        }
        VotingCommands::Vote { voting, receiver } => RestCommand::Vote { voting, receiver },
        VotingCommands::Unvote { voting, receiver } => RestCommand::Unvote { voting, receiver },
    }
}

async fn run_command(client: &RestClient, command: RestCommand) -> Result<()> {
    report(&command.path(), client.execute(&command).await)
}

/// Print the outcome of a REST call the way the harness pages show it.
fn report(command: &str, result: Result<Value, RestError>) -> Result<()> {
    match result {
        Ok(value) => {
            println!("SUCCESS: {command}");
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            println!("ERROR: {command}");
            let Some(status) = e.status() else {
                return Err(e.into());
            };
            println!("Status: {status}");
            if let RestError::Status { ref body, .. } = e {
                if !body.is_empty() {
                    println!("{body}");
                }
            }
            bail!("{command} failed with status {status}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::MemorySurface;
    use serde_json::json;

    #[test]
    fn test_vote_maps_receiver() {
        let command = voting_command(VotingCommands::Vote {
            voting: "best".into(),
            receiver: "ds:7".into(),
        });
        assert_eq!(command.path(), "voting/vote/best/ds%3A7");
    }

    #[test]
    fn test_variable_mapping() {
        let command = variable_command(VariableCommands::CalculateGroupAverage { name: "x".into() });
        assert_eq!(command, RestCommand::CalculateGroupAverage("x".into()));
    }

    #[test]
    fn test_report_success_and_failure() {
        assert!(report("variable/read/x", Ok(json!({"value": 1}))).is_ok());

        let err = report(
            "variable/read/x",
            Err(RestError::Status {
                command: "variable/read/x".into(),
                status: reqwest::StatusCode::FORBIDDEN,
                body: "denied".into(),
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("403"));

        let err = report(
            "image/upload/avatar",
            Err(RestError::File {
                path: "missing.png".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        )
        .unwrap_err();
        assert!(err
            .downcast_ref::<RestError>()
            .is_some_and(|e| e.status().is_none()));
    }

    async fn offline_bootstrap(
        registrar: Arc<dyn Registrar>,
        broker: &LocalBroker,
    ) -> (Arc<tokio::sync::Mutex<MemorySurface>>, SessionBootstrap) {
        let (memory, shared) = share(MemorySurface::with_title(PAGE_TITLE));
        let bootstrap = SessionBootstrap::load_page(
            "index.html",
            BootstrapSettings::from(&Config::default()),
            registrar,
            Arc::new(broker.connect()),
            MessageRenderer::new(shared),
        )
        .await;
        (memory, bootstrap)
    }

    #[tokio::test]
    async fn test_blank_nickname_prompts_again() {
        let broker = LocalBroker::new();
        let (memory, bootstrap) = offline_bootstrap(Arc::new(broker.clone()), &broker).await;
        let mut lines = BufReader::new(&b"\n   \nalice\nhello\n"[..]).lines();

        let chat = join_chat(&bootstrap, None, &mut lines)
            .await
            .unwrap()
            .expect("session should start on the third line");
        assert_eq!(chat.session.display_name, "alice");
        assert_eq!(memory.lock().await.alerts.len(), 2);
        assert!(memory.lock().await.messaging_visible);
        // Lines after the nickname are left for the chat loop.
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("hello"));
        chat.listener.abort();
    }

    #[tokio::test]
    async fn test_blank_flag_nickname_falls_back_to_prompt() {
        let broker = LocalBroker::new();
        let (memory, bootstrap) = offline_bootstrap(Arc::new(broker.clone()), &broker).await;
        let mut lines = BufReader::new(&b""[..]).lines();

        let chat = join_chat(&bootstrap, Some("  ".to_string()), &mut lines)
            .await
            .unwrap();
        assert!(chat.is_none());
        assert_eq!(memory.lock().await.alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_login_failure_ends_quietly() {
        // Credentials come from another broker, so this one rejects the login.
        let broker = LocalBroker::new();
        let (memory, bootstrap) = offline_bootstrap(Arc::new(LocalBroker::new()), &broker).await;
        let mut lines = BufReader::new(&b""[..]).lines();

        let chat = join_chat(&bootstrap, Some("alice".to_string()), &mut lines)
            .await
            .unwrap();
        assert!(chat.is_none());
        let surface = memory.lock().await;
        assert!(surface.status[0].starts_with("Could not connect"));
        assert!(!surface.messaging_visible);
    }

    #[tokio::test]
    async fn test_write_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.html");
        write_transcript(&path, "<div class=\"messages\"></div>").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<div class=\"messages\"></div>"
        );
    }
}
