use crate::backend::{create_backend, ChatBackend};
use crate::config::Config;
use crate::error::Result;
use crate::session::{
    messages_from_history, Conversation, ConversationId, Message, MessageIdGenerator, Role,
};
use colored::Colorize;
use prettytable::{format, Table};

/// Build a conversation table, marking the active conversation with `*`
pub fn conversation_table(
    conversations: &[Conversation],
    active: Option<&ConversationId>,
) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "#".bold(),
        "",
        "Title".bold(),
        "ID".bold(),
        "Created".bold()
    ]);

    for (i, conversation) in conversations.iter().enumerate() {
        let marker = if active == Some(&conversation.id) { "*" } else { "" };
        let title = if conversation.title.chars().count() > 40 {
            format!("{}...", conversation.title.chars().take(37).collect::<String>())
        } else {
            conversation.title.clone()
        };
        let created = conversation
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        table.add_row(prettytable::row![
            i + 1,
            marker.green(),
            title,
            conversation.id.as_str().cyan(),
            created
        ]);
    }

    table
}

/// Render one message with a colored speaker label and its `HH:MM` time
pub fn format_message(message: &Message) -> String {
    let label = format!("{}:", message.role.label());
    let label = match message.role {
        Role::User => label.cyan().bold(),
        Role::Assistant => label.green().bold(),
    };
    match message.clock_time() {
        Some(time) => format!("{} {} {}", time.dimmed(), label, message.content),
        None => format!("{} {}", label, message.content),
    }
}

/// Print one message followed by a blank line
pub fn print_message(message: &Message) {
    println!("{}\n", format_message(message));
}

/// List conversations known to the backend
pub async fn list_conversations(config: &Config, json: bool) -> Result<()> {
    let backend = create_backend(&config.backend)?;
    let summaries = backend.list_conversations().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("{}", "No conversations found.".yellow());
        return Ok(());
    }

    let conversations: Vec<Conversation> = summaries
        .into_iter()
        .map(|s| Conversation::from_summary(s, &config.session.default_title))
        .collect();

    println!("\nConversations:");
    conversation_table(&conversations, None).printstd();
    println!();
    println!(
        "Use {} to continue a conversation.",
        "mdchat chat --resume <ID>".cyan()
    );
    println!();
    Ok(())
}

/// Print the history of one conversation
pub async fn show_history(config: &Config, id: &str, json: bool) -> Result<()> {
    let backend = create_backend(&config.backend)?;
    let records = backend.get_history(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", format!("No messages in conversation {}.", id).yellow());
        return Ok(());
    }

    let mut ids = MessageIdGenerator::new();
    for message in messages_from_history(records, &mut ids) {
        print_message(&message);
    }
    Ok(())
}

/// Fetch a conversation's messages for export
pub async fn fetch_messages(backend: &dyn ChatBackend, id: &str) -> Result<Vec<Message>> {
    let records = backend.get_history(id).await?;
    let mut ids = MessageIdGenerator::new();
    Ok(messages_from_history(records, &mut ids))
}

/// Delete a conversation on the backend
///
/// Unlike the interactive `/delete`, a backend failure here is an error.
pub async fn delete_conversation(config: &Config, id: &str, yes: bool) -> Result<()> {
    if !yes && !super::confirm(&format!("Delete conversation {}? [y/N] ", id))? {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }

    let backend = create_backend(&config.backend)?;
    backend.delete_conversation(id).await?;
    println!("{}", format!("Deleted conversation {}", id).green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FakeBackend, HistoryRecord};

    #[test]
    fn test_conversation_table_marks_active() {
        let conversations = vec![
            Conversation::new("a", "First"),
            Conversation::new("b", "x".repeat(60)),
        ];
        let active = ConversationId::new("b");
        let rendered = conversation_table(&conversations, Some(&active)).to_string();

        assert!(rendered.contains("First"));
        assert!(rendered.contains(&format!("{}...", "x".repeat(37))));
        assert!(!rendered.contains(&"x".repeat(38)));
        assert!(rendered.contains('*'));
    }

    #[test]
    fn test_format_message_shows_clock_time() {
        let message = Message::new(
            "1",
            Role::Assistant,
            "Rest and fluids.",
            Some("2025-01-01 14:07:00".to_string()),
        );
        let rendered = format_message(&message);
        assert!(rendered.contains("14:07"));
        assert!(rendered.contains("AI:"));
        assert!(rendered.contains("Rest and fluids."));
    }

    #[test]
    fn test_format_message_without_timestamp() {
        let message = Message::new("1_error", Role::Assistant, "Connection error.", None);
        let rendered = format_message(&message);
        assert!(rendered.contains("Connection error."));
        // Only the speaker label's colon; no time prefix
        assert_eq!(rendered.matches(':').count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_messages_maps_roles() {
        let backend = FakeBackend::new().with_conversation(
            "a",
            vec![
                HistoryRecord {
                    role: "user".to_string(),
                    message: "Hello".to_string(),
                    timestamp: Some("t1".to_string()),
                },
                HistoryRecord {
                    role: "assistant".to_string(),
                    message: "Hi".to_string(),
                    timestamp: Some("t2".to_string()),
                },
            ],
        );

        let messages = fetch_messages(&backend, "a").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].id, "t2");
    }
}
