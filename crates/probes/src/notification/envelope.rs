use serde::{Deserialize, Serialize};

/// Subject attached to every database probe notification.
pub const DATABASE_CHANGE_SUBJECT: &str = "Change in database";

/// Body POSTed to the notification hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub topic: String,
    pub context: NotificationContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContext {
    pub subject: String,
    pub content: String,
}

impl NotificationEnvelope {
    pub fn new(
        topic: impl Into<String>,
        subject: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            context: NotificationContext { subject: subject.into(), content: content.into() },
        }
    }

    pub fn subject(&self) -> &str {
        &self.context.subject
    }

    pub fn content(&self) -> &str {
        &self.context.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let envelope = NotificationEnvelope::new("orders", DATABASE_CHANGE_SUBJECT, "1 - a - ");
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({
                "topic": "orders",
                "context": { "subject": "Change in database", "content": "1 - a - " }
            })
        );
    }

    #[test]
    fn test_accessors() {
        let envelope = NotificationEnvelope::new("orders", DATABASE_CHANGE_SUBJECT, "2 - b - ");
        assert_eq!(envelope.subject(), "Change in database");
        assert_eq!(envelope.content(), "2 - b - ");
    }

    #[test]
    fn test_empty_content_is_kept() {
        let envelope = NotificationEnvelope::new("orders", DATABASE_CHANGE_SUBJECT, "");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["context"]["content"], "");
    }
}
