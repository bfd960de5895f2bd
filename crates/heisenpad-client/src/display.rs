//! Line-oriented presentation for the `heisenpad` binary.
//!
//! [`parse_line`] turns one line of user input into a [`Line`];
//! [`Feed`] turns successive snapshots into the lines to print.

use std::collections::HashMap;

use heisenpad_app::{MessageBody, SessionSnapshot};
use heisenpad_core::ConnectionState;
use heisenpad_proto::Channel;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Plain text to send.
    Send(String),
    /// `/join <channel>`
    Join(String),
    /// `/key [passphrase]`; no argument clears it.
    Key(String),
    /// `/delete <id prefix>`
    Delete(String),
    /// `/resend <id prefix>`
    Resend(String),
    /// `/reconnect`
    Reconnect,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    /// Unrecognized slash command.
    Unknown(String),
}

/// Help text listing the commands.
pub const HELP: &str = "\
commands:
  /join <channel>     switch channel (default lobby)
  /key [passphrase]   set the encryption key, or clear it
  /delete <id>        delete a message by id prefix
  /resend <id>        re-send a message by id prefix
  /reconnect          reconnect after the connection gave up
  /quit               leave
anything else is sent as a message";

/// Parse one line of input.
pub fn parse_line(input: &str) -> Line {
    let Some(command) = input.trim_start().strip_prefix('/') else {
        return Line::Send(input.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command.trim_end(), ""),
    };

    match name {
        "join" => Line::Join(arg.to_string()),
        "key" => Line::Key(arg.to_string()),
        "delete" if !arg.is_empty() => Line::Delete(arg.to_string()),
        "resend" if !arg.is_empty() => Line::Resend(arg.to_string()),
        "reconnect" => Line::Reconnect,
        "help" => Line::Help,
        "quit" | "exit" => Line::Quit,
        _ => Line::Unknown(name.to_string()),
    }
}

/// Greeting shown on entering a channel.
pub fn welcome_message(channel: &Channel) -> String {
    let channel = channel.display_name();
    format!(
        "Messages in [{channel}] exist only between the people connected right now. \
         Nothing is logged or stored; once everyone leaves, they are gone. \
         Set a key with /key to encrypt; listeners need the same key to read."
    )
}

/// Id prefix shown in the feed.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Turns successive snapshots into printable lines.
///
/// Only differences from the previous snapshot are printed: connection
/// changes, new or changed messages, and deletions.
#[derive(Debug, Default)]
pub struct Feed {
    channel: Option<Channel>,
    connection: Option<ConnectionState>,
    keyed: bool,
    bodies: HashMap<String, MessageBody>,
}

impl Feed {
    /// Lines describing what changed since the last snapshot.
    pub fn update(&mut self, snapshot: &SessionSnapshot) -> Vec<String> {
        let mut lines = Vec::new();

        if self.channel.as_ref() != Some(&snapshot.channel) {
            self.channel = Some(snapshot.channel.clone());
            self.bodies.clear();
            lines.push(format!("* joined [{}]", snapshot.channel.display_name()));
            lines.push(format!("* {}", welcome_message(&snapshot.channel)));
        }

        if self.connection != Some(snapshot.connection) {
            self.connection = Some(snapshot.connection);
            lines.push(format!("* {}", describe_connection(snapshot.connection)));
        }

        if self.keyed != snapshot.keyed {
            self.keyed = snapshot.keyed;
            lines.push(if snapshot.keyed { "* key set".into() } else { "* key cleared".into() });
        }

        for view in &snapshot.messages {
            if self.bodies.get(&view.id) == Some(&view.body) {
                continue;
            }

            let edited = self.bodies.insert(view.id.clone(), view.body.clone()).is_some();
            let author = if view.is_own { "you" } else { short_id(&view.user) };
            let text = match &view.body {
                MessageBody::Plain(text) | MessageBody::Unlocked(text) => text.as_str(),
                MessageBody::Locked => "(locked)",
            };
            let marker = if edited { " (updated)" } else { "" };
            lines.push(format!("[{}] {author}{marker}: {text}", short_id(&view.id)));
        }

        let before = self.bodies.len();
        self.bodies.retain(|id, _| snapshot.message(id).is_some());
        if self.bodies.len() != before {
            lines.push(format!("* {} message(s) removed", before - self.bodies.len()));
        }

        lines
    }
}

fn describe_connection(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Uninstantiated => "not connected",
        ConnectionState::Connecting => "connecting...",
        ConnectionState::Open => "connected",
        ConnectionState::Closing => "disconnecting...",
        ConnectionState::Closed => "disconnected (/reconnect to retry)",
    }
}
