use crate::clients::AwsClients;
use crate::config::{ChannelConfig, ChannelKind, Config};
use crate::model::Message;
use anyhow::Result;
use async_trait::async_trait;

mod line;
mod topic;

pub use line::LineNotifier;
pub use topic::TopicNotifier;

#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> ChannelKind;

    /// Delivers the message once. Failures are returned, never retried here.
    async fn publish(&self, message: &Message) -> Result<()>;
}

pub fn build_notifier(config: &Config, clients: &AwsClients) -> Result<Box<dyn Notifier>> {
    let notifier: Box<dyn Notifier> = match &config.channel {
        ChannelConfig::Topic { topic_arn } => {
            Box::new(TopicNotifier::new(clients.sns.clone(), topic_arn.clone()))
        }
        ChannelConfig::Line { token, endpoint } => {
            Box::new(LineNotifier::new(token.clone(), endpoint.clone())?)
        }
    };
    Ok(notifier)
}
