use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

pub const SQS_EVENT_SOURCE: &str = "aws:sqs";
pub const SNS_EVENT_SOURCE: &str = "aws:sns";

#[derive(Debug, Error)]
pub enum MessageEventError {
    #[error("malformed {kind} event: {source}")]
    Malformed {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("record {index} has event source '{found}', expected '{expected}'")]
    UnexpectedSource {
        index: usize,
        found: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SqsEvent {
    #[serde(rename = "Records")]
    pub records: Vec<SqsRecord>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SqsRecord {
    pub message_id: String,
    pub event_source: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SnsEvent {
    #[serde(rename = "Records")]
    pub records: Vec<SnsRecord>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SnsRecord {
    pub event_source: String,
    pub sns: SnsMessage,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SnsMessage {
    pub message_id: String,
    pub topic_arn: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MessageBatchResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl MessageBatchResponse {
    fn processed(kind: &str) -> Self {
        Self {
            status_code: 200,
            body: format!("Processed {kind} Messages Successfully"),
        }
    }
}

pub fn handle_sqs_event(event: Value) -> Result<MessageBatchResponse, MessageEventError> {
    let event: SqsEvent = serde_json::from_value(event)
        .map_err(|source| MessageEventError::Malformed { kind: "SQS", source })?;

    for (index, record) in event.records.iter().enumerate() {
        expect_source(index, &record.event_source, SQS_EVENT_SOURCE)?;
        info!(
            component = "sqs_handler",
            event = "message_received",
            message_id = %record.message_id,
            body = %record.body,
        );
    }

    Ok(MessageBatchResponse::processed("SQS"))
}

pub fn handle_sns_event(event: Value) -> Result<MessageBatchResponse, MessageEventError> {
    let event: SnsEvent = serde_json::from_value(event)
        .map_err(|source| MessageEventError::Malformed { kind: "SNS", source })?;

    for (index, record) in event.records.iter().enumerate() {
        expect_source(index, &record.event_source, SNS_EVENT_SOURCE)?;
        info!(
            component = "sns_handler",
            event = "message_received",
            message_id = %record.sns.message_id,
            topic_arn = %record.sns.topic_arn,
            subject = record.sns.subject.as_deref().unwrap_or_default(),
            message = %record.sns.message,
        );
    }

    Ok(MessageBatchResponse::processed("SNS"))
}

fn expect_source(
    index: usize,
    found: &str,
    expected: &'static str,
) -> Result<(), MessageEventError> {
    if found == expected {
        Ok(())
    } else {
        Err(MessageEventError::UnexpectedSource {
            index,
            found: found.to_string(),
            expected,
        })
    }
}
