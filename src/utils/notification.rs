use sqlx::PgConnection;
use uuid::Uuid;

/// Result type for notification operations
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur in notification operations
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Notification has no recipients")]
    NoRecipients,
}

/// Builder for per-recipient notification rows. Delivery (email/push) is out
/// of scope; dashboards poll these rows.
pub struct NotificationBuilder {
    title: String,
    body: Option<String>,
    request_id: Option<Uuid>,
    recipients: Vec<String>,
}

impl NotificationBuilder {
    /// Create a new notification builder with the required title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            request_id: None,
            recipients: Vec::new(),
        }
    }

    /// Set notification body
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Link the notification to a facility request
    pub fn request(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add a recipient by email address
    pub fn recipient(mut self, email: impl Into<String>) -> Self {
        self.recipients.push(email.into());
        self
    }

    /// Insert one row per recipient. Runs on the caller's connection so it
    /// can participate in the surrounding transaction.
    pub async fn send(self, conn: &mut PgConnection) -> NotificationResult<()> {
        if self.recipients.is_empty() {
            return Err(NotificationError::NoRecipients);
        }

        for recipient in &self.recipients {
            sqlx::query(
                r#"
                INSERT INTO notifications (recipient_email, title, body, request_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(recipient)
            .bind(&self.title)
            .bind(&self.body)
            .bind(self.request_id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}
