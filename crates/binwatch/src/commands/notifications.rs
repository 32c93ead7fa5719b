//! Notification command handlers.

use serde::Serialize;
use tabled::Tabled;

use binwatch_core::{EntityId, Monitor, Notification};

use crate::cli::{GlobalOpts, NotificationsArgs, NotificationsCommand};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

#[derive(Tabled)]
struct NotificationRow {
    #[tabled(rename = "")]
    unread: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Bin")]
    bin: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Time")]
    time: String,
}

fn row(n: &Notification, painter: Painter) -> NotificationRow {
    NotificationRow {
        unread: if n.is_read { String::new() } else { "●".into() },
        id: n.id.to_string(),
        priority: painter.priority(n.priority, &n.priority.to_string()),
        kind: n.kind.to_string(),
        bin: n.dustbin_name.clone(),
        message: n.message.clone(),
        time: util::timestamp(&n.timestamp),
    }
}

#[derive(Serialize)]
struct ReadAck {
    id: String,
    is_read: bool,
}

pub async fn handle(
    monitor: &Monitor,
    args: NotificationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let painter = Painter::new(&global.color_mode());

    let out = match args.command {
        NotificationsCommand::List { limit, unread } => {
            let mut notes = monitor.notifications(limit, unread).await?;
            // Stable, so backend order breaks timestamp ties.
            notes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            output::render_list(
                &global.format(),
                &notes,
                |n| row(n, painter),
                |n| n.id.to_string(),
            )?
        }
        NotificationsCommand::Read { id } => {
            monitor
                .mark_read(&EntityId::from(id.as_str()))
                .await
                .map_err(|e| CliError::not_found_or(e, "notification", &id, "notifications list"))?;
            let ack = ReadAck { id, is_read: true };
            output::render_single(
                &global.format(),
                &ack,
                |a| format!("Marked notification {} as read", a.id),
                |a| a.id.clone(),
            )?
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}
