//! Long-poll chat front end.
//!
//! Reads updates from the Bot API, keeps per-user preferences and starts one
//! pipeline run per URL message. Runs proceed concurrently; shutdown waits for
//! the ones already started after cancelling them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use uplink_core::{
    AllowList, ChatPlatform, ChatTarget, DeliveryOutcome, IncomingMessage, PipelineOrchestrator,
    PipelineRequest, PreferenceStore, StatusRelay, TelegramClient, Transcoder, UserId,
};

use crate::commands::{parse_command, BotCommand, WELCOME};

/// Buffer size for the status event channel of each run
pub const STATUS_BUFFER_SIZE: usize = 64;

/// Pause after a failed `getUpdates` call
const RETRY_DELAY: Duration = Duration::from_secs(3);

pub struct BotFrontend<T: Transcoder> {
    client: Arc<TelegramClient>,
    orchestrator: PipelineOrchestrator<T>,
    allow_list: AllowList,
    preferences: Arc<PreferenceStore>,
    thumbnail_dir: PathBuf,
}

impl<T: Transcoder + 'static> BotFrontend<T> {
    pub fn new(
        client: Arc<TelegramClient>,
        orchestrator: PipelineOrchestrator<T>,
        allow_list: AllowList,
        preferences: Arc<PreferenceStore>,
        thumbnail_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            orchestrator,
            allow_list,
            preferences,
            thumbnail_dir,
        }
    }

    /// Polls until `cancel` fires, then waits for the running uploads.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut offset: Option<i64> = None;
        let mut jobs = JoinSet::new();

        info!("Polling for updates");
        loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                batch = self.client.get_updates(offset) => batch,
            };

            match batch {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        if let Some(message) = update.message {
                            self.handle(message, &mut jobs, &cancel).await;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Fetching updates failed, retrying");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }

            while let Some(done) = jobs.try_join_next() {
                if let Err(e) = done {
                    warn!(error = %e, "Upload task failed");
                }
            }
        }

        info!(running = jobs.len(), "Stopped polling, waiting for uploads");
        while let Some(done) = jobs.join_next().await {
            if let Err(e) = done {
                warn!(error = %e, "Upload task failed");
            }
        }
    }

    /// Handles one incoming message. URL messages are started on `jobs`.
    pub async fn handle(
        &self,
        message: IncomingMessage,
        jobs: &mut JoinSet<()>,
        cancel: &CancellationToken,
    ) {
        let target = ChatTarget::new(message.chat.id);
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let command = parse_command(text);

        if command == BotCommand::Start {
            self.reply(&target, WELCOME).await;
            return;
        }

        let Some(user) = message.sender_id() else {
            debug!(chat_id = target.chat_id, "Ignoring message without a sender");
            return;
        };
        if self.allow_list.authorize(user).is_err() {
            self.reply(&target, "You are not allowed to use this bot.")
                .await;
            return;
        }

        match command {
            BotCommand::Start => {}
            BotCommand::Rename(Some(name)) => {
                self.preferences.set_rename(user, name.as_str()).await;
                self.reply(&target, &format!("Next upload will be named: {}", name))
                    .await;
            }
            BotCommand::Rename(None) => {
                self.reply(&target, "Usage: /rename newfilename.ext").await;
            }
            BotCommand::SetThumb => self.set_thumbnail(user, &message, &target).await,
            BotCommand::Clear => {
                self.preferences.clear(user).await;
                self.reply(&target, "Preferences cleared.").await;
            }
            BotCommand::Url(url) => self.start_upload(user, url, target, jobs, cancel).await,
            BotCommand::NotAUrl => {
                self.reply(&target, "Please send a valid http(s) URL.").await;
            }
            BotCommand::Unknown(name) => {
                self.reply(&target, &format!("Unknown command: /{}", name))
                    .await;
            }
        }
    }

    async fn start_upload(
        &self,
        user: UserId,
        url: String,
        target: ChatTarget,
        jobs: &mut JoinSet<()>,
        cancel: &CancellationToken,
    ) {
        let preferences = self.preferences.take_for_job(user).await;
        let request = PipelineRequest::new(url, target).with_preferences(preferences);

        let (status_tx, status_rx) = mpsc::channel(STATUS_BUFFER_SIZE);
        let relay = StatusRelay::new(self.client.clone(), target);
        let relay_handle = tokio::spawn(relay.run(status_rx));
        let pipeline = self
            .orchestrator
            .spawn(request, status_tx, cancel.child_token());

        jobs.spawn(async move {
            match pipeline.await {
                Ok(report) => match report.outcome {
                    DeliveryOutcome::Success(receipt) => info!(
                        run_id = %report.run_id,
                        user,
                        file_name = %receipt.file_name,
                        bytes = receipt.size_bytes,
                        "Upload finished"
                    ),
                    DeliveryOutcome::Failure { stage, reason } => info!(
                        run_id = %report.run_id,
                        user,
                        stage = %stage,
                        reason = %reason,
                        "Upload failed"
                    ),
                },
                Err(e) => warn!(user, error = %e, "Pipeline task failed"),
            }
            if let Err(e) = relay_handle.await {
                warn!(error = %e, "Status relay task failed");
            }
        });
    }

    async fn set_thumbnail(&self, user: UserId, message: &IncomingMessage, target: &ChatTarget) {
        let Some(photo) = message
            .reply_to_message
            .as_deref()
            .and_then(|m| m.largest_photo())
        else {
            self.reply(target, "Reply to a photo with /setthumb to use it as the thumbnail.")
                .await;
            return;
        };

        let path = self.thumbnail_dir.join(format!("thumb_{}.jpg", user));
        match self.client.download_file(&photo.file_id, &path).await {
            Ok(bytes) => {
                debug!(user, bytes, path = %path.display(), "Thumbnail saved");
                self.preferences.set_thumbnail(user, path).await;
                self.reply(target, "Thumbnail set.").await;
            }
            Err(e) => {
                warn!(user, error = ?e, "Saving thumbnail failed");
                self.reply(target, &format!("Could not save the thumbnail: {}", e))
                    .await;
            }
        }
    }

    async fn reply(&self, target: &ChatTarget, text: &str) {
        if let Err(e) = self.client.send_message(target, text).await {
            warn!(chat_id = target.chat_id, error = %e, "Failed to send reply");
        }
    }
}
