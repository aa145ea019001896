use crate::clients::aws::map_sdk_error;
use crate::config::ChannelKind;
use crate::model::Message;
use crate::notify::Notifier;
use anyhow::Result;
use async_trait::async_trait;

pub struct TopicNotifier {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl TopicNotifier {
    pub fn new(client: aws_sdk_sns::Client, topic_arn: String) -> Self {
        Self { client, topic_arn }
    }
}

#[async_trait]
impl Notifier for TopicNotifier {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn publish(&self, message: &Message) -> Result<()> {
        tracing::debug!(
            "SNS email body: {}.....",
            message.body.lines().next().unwrap_or_default()
        );
        tracing::info!("SNS email subject: {}", message.subject);

        let response = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(&message.subject)
            .message(&message.body)
            .send()
            .await
            .map_err(|err| map_sdk_error("SNS", err))?;

        tracing::debug!(
            message_id = response.message_id().unwrap_or_default(),
            "published to topic"
        );
        Ok(())
    }
}
