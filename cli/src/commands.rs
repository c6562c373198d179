use crate::error::{AppError, AppResult};
use crate::session::Session;
use clap::Subcommand;
use nimbus_graph::auth::AuthType;
use nimbus_graph::model::{Group, User};
use nimbus_graph::{CaeOutcome, GraphService, MaxRows};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the signed-in user's profile
    Me,
    /// Save the signed-in user's photo
    Photo {
        /// Destination file
        #[arg(short, long, default_value = "photo.jpg")]
        output: PathBuf,
    },
    /// List groups the signed-in user belongs to
    MemberOf,
    /// List directory users
    Users {
        /// Maximum number of users to list; -1 lists all
        #[arg(long, allow_negative_numbers = true)]
        max: Option<i64>,
    },
    /// List all groups in the organization
    Groups,
}

/// How a command invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Done,
    /// Graph asked for re-authentication; run the command again.
    ChallengeIssued,
}

/// Runs `command` once, printing its result to stdout.
pub async fn execute(
    service: &GraphService,
    command: &Command,
    cancel: &CancellationToken,
) -> AppResult<CommandStatus> {
    match command {
        Command::Me => {
            let outcome = service.get_me().await?;
            finish(outcome, |user| print_user(&user))
        }
        Command::Photo { output } => {
            let outcome = service.get_my_photo().await?;
            match outcome {
                CaeOutcome::Completed(Some(bytes)) => {
                    std::fs::write(output, &bytes)?;
                    println!("Saved {} bytes to {}", bytes.len(), output.display());
                    Ok(CommandStatus::Done)
                }
                other => finish(other, |_| println!("No profile photo is set")),
            }
        }
        Command::MemberOf => {
            let outcome = service.get_member_of(cancel).await?;
            finish(outcome, |groups| print_groups(&groups))
        }
        Command::Users { max } => {
            let outcome = match max {
                Some(max) => {
                    let max_rows = MaxRows::from(*max);
                    log::info!("Listing users with max rows {max_rows}");
                    service.get_users_up_to(max_rows, cancel).await?
                }
                None => service.get_users(cancel).await?,
            };
            finish(outcome, |users| {
                for user in &users {
                    print_user(user);
                }
                println!("{} user(s)", users.len());
            })
        }
        Command::Groups => {
            let groups = service.list_groups(cancel).await?;
            print_groups(&groups);
            Ok(CommandStatus::Done)
        }
    }
}

fn finish<T>(outcome: CaeOutcome<T>, render: impl FnOnce(T)) -> AppResult<CommandStatus> {
    match outcome {
        CaeOutcome::Completed(value) => {
            render(value);
            Ok(CommandStatus::Done)
        }
        CaeOutcome::ChallengeIssued => Ok(CommandStatus::ChallengeIssued),
        CaeOutcome::ChallengeFailed => Err(AppError::ChallengeFailed),
    }
}

fn print_user(user: &User) {
    println!(
        "{}\t{}\t{}",
        user.id,
        user.display_name.as_deref().unwrap_or("-"),
        user.user_principal_name
            .as_deref()
            .or(user.mail.as_deref())
            .unwrap_or("-")
    );
}

fn print_groups(groups: &[Group]) {
    for group in groups {
        let kind = if group.is_microsoft_365() {
            "Microsoft 365"
        } else {
            "Security"
        };
        println!(
            "{}\t{}\t{}",
            group.id,
            group.display_name.as_deref().unwrap_or("-"),
            kind
        );
    }
    println!("{} group(s)", groups.len());
}

/// Runs `command`, repeating it once after a claims challenge so the token
/// provider can re-authenticate with the requested claims.
///
/// A session on a static token is never re-run: the same token would be
/// challenged again.
pub async fn run_with_reauthentication(
    session: &Session,
    command: &Command,
    cancel: &CancellationToken,
) -> AppResult<()> {
    let service = &session.service;
    if execute(service, command, cancel).await? == CommandStatus::Done {
        return Ok(());
    }

    if session.auth_type == AuthType::StaticToken {
        return Err(AppError::ChallengeUnresolved(
            "the supplied access token was revoked; acquire a new token and run the command again"
                .to_string(),
        ));
    }

    eprintln!("Access was revoked by continuous access evaluation. Signing in again...");
    log::warn!("Re-running {command:?} after a claims challenge");

    match execute(service, command, cancel).await? {
        CommandStatus::Done => Ok(()),
        CommandStatus::ChallengeIssued => Err(AppError::ChallengeUnresolved(format!(
            "{command:?} was challenged again"
        ))),
    }
}
