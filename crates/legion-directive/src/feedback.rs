//! Directive feedback model and its producers

use crate::error::DirectiveError;
use crate::key::{DirectiveKey, IdGenerator, UlidGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tokio::sync::mpsc;

/// Processing status reported for a directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackStatus {
    /// Consumption started
    InProgress,
    /// Consumption finished successfully
    Completed,
    /// Consumption failed
    Failed,
}

impl FeedbackStatus {
    /// Whether no further feedback is expected after this status
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Status notification about the processing of one directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveFeedback {
    /// Unique key of the feedback itself
    pub key: String,
    /// Directive the feedback is about
    pub directive_key: DirectiveKey,
    /// Reported status
    pub status: FeedbackStatus,
    /// Failure message, present with [`FeedbackStatus::Failed`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DirectiveFeedback {
    fn new(directive_key: DirectiveKey, status: FeedbackStatus, error: Option<String>) -> Self {
        Self {
            key: UlidGenerator.generate(),
            directive_key,
            status,
            error,
        }
    }

    /// Feedback announcing that processing started
    #[must_use]
    pub fn in_progress(directive_key: DirectiveKey) -> Self {
        Self::new(directive_key, FeedbackStatus::InProgress, None)
    }

    /// Feedback announcing successful completion
    #[must_use]
    pub fn completed(directive_key: DirectiveKey) -> Self {
        Self::new(directive_key, FeedbackStatus::Completed, None)
    }

    /// Feedback announcing a failure with its message
    #[must_use]
    pub fn failed(directive_key: DirectiveKey, error: impl Into<String>) -> Self {
        Self::new(directive_key, FeedbackStatus::Failed, Some(error.into()))
    }
}

/// Outbound channel for directive feedback
#[async_trait]
pub trait FeedbackProducer: Send + Sync + Debug {
    /// Publish one feedback notification
    async fn publish(&self, feedback: DirectiveFeedback) -> Result<(), DirectiveError>;
}

/// In-process [`FeedbackProducer`] backed by an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelFeedbackProducer {
    sender: mpsc::UnboundedSender<DirectiveFeedback>,
}

impl ChannelFeedbackProducer {
    /// Create new producer and the receiver draining it
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DirectiveFeedback>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl FeedbackProducer for ChannelFeedbackProducer {
    async fn publish(&self, feedback: DirectiveFeedback) -> Result<(), DirectiveError> {
        self.sender
            .send(feedback)
            .map_err(|e| DirectiveError::TransportClosed(format!("feedback for {}", e.0.directive_key)))
    }
}
