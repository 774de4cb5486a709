//! Renders a turn's output into the chat.
//!
//! Text streams into the "Thinking..." status message by editing it, at
//! most once per edit interval. Images and voice go out as their own
//! messages; text that follows them is sent as a fresh reply. Replies are
//! sent as MarkdownV2; final text Telegram cannot parse is resent plain.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use gemi_ai::OutputEvent;
use gemi_common::TransportError;

use crate::markdown::{italic, split_md, to_markdown_v2};
use crate::telegram::{ChatTransport, TextFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The user deleted the reply; stop consuming the turn.
    Stop,
}

pub struct Reply<'a> {
    transport: &'a dyn ChatTransport,
    chat: i64,
    reply_to: i64,
    status: Option<i64>,
    /// Text not yet delivered in final form.
    pending: String,
    /// What the status message currently shows, as sent.
    shown: String,
    /// Every text chunk of the turn.
    transcript: String,
    last_edit: Option<Instant>,
    edit_interval: Duration,
    max_chars: usize,
    stopped: bool,
}

impl<'a> Reply<'a> {
    pub fn new(
        transport: &'a dyn ChatTransport,
        chat: i64,
        reply_to: i64,
        status: i64,
        edit_interval: Duration,
        max_chars: usize,
    ) -> Self {
        Self {
            transport,
            chat,
            reply_to,
            status: Some(status),
            pending: String::new(),
            shown: String::new(),
            transcript: String::new(),
            last_edit: None,
            edit_interval,
            max_chars,
            stopped: false,
        }
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub async fn render(&mut self, event: OutputEvent) -> Result<Flow, TransportError> {
        match event {
            OutputEvent::TextChunk(chunk) => {
                self.pending.push_str(&chunk);
                self.transcript.push_str(&chunk);
                if self.edit_due() {
                    return Ok(self.preview().await);
                }
            }
            OutputEvent::Image(images) => {
                self.detach_status().await?;
                self.transport
                    .send_media_group(self.chat, Some(self.reply_to), &images)
                    .await?;
            }
            OutputEvent::Audio(clip) => {
                self.detach_status().await?;
                self.transport
                    .send_voice(self.chat, Some(self.reply_to), &clip)
                    .await?;
            }
            OutputEvent::SearchResults(results) => {
                info!(
                    query = %results.query,
                    hits = results.hits.len(),
                    "Search results received"
                );
            }
        }
        Ok(Flow::Continue)
    }

    /// Deliver the remaining text once the turn is over.
    pub async fn finish(&mut self) -> Result<(), TransportError> {
        if self.stopped || self.pending.trim().is_empty() {
            return Ok(());
        }
        self.flush().await
    }

    /// Show `text` in italics in place of the reply, as a best effort.
    pub async fn report(&mut self, text: &str) {
        let text = italic(text);
        if let Some(status) = self.status {
            match self
                .transport
                .edit_message_text(self.chat, status, &text, TextFormat::MarkdownV2)
                .await
            {
                Ok(()) => return,
                Err(e) => debug!(error = %e, "Could not edit status message, replying instead"),
            }
        }
        if let Err(e) = self
            .transport
            .send_message(self.chat, &text, TextFormat::MarkdownV2, Some(self.reply_to))
            .await
        {
            warn!(error = %e, "Failed to report error to the user");
        }
    }

    fn edit_due(&self) -> bool {
        self.status.is_some()
            && self
                .last_edit
                .map_or(true, |at| at.elapsed() >= self.edit_interval)
    }

    /// Intermediate edit. Rejections are swallowed unless the message is gone.
    async fn preview(&mut self) -> Flow {
        let Some(status) = self.status else {
            return Flow::Continue;
        };
        let preview = split_md(&self.pending, self.max_chars)
            .into_iter()
            .next()
            .map(|chunk| to_markdown_v2(&chunk))
            .unwrap_or_default();
        if preview.trim().is_empty() || preview.trim() == self.shown.trim() {
            return Flow::Continue;
        }

        self.last_edit = Some(Instant::now());
        match self
            .transport
            .edit_message_text(self.chat, status, &preview, TextFormat::MarkdownV2)
            .await
        {
            Ok(()) => self.shown = preview,
            Err(e) if e.is_not_found() => {
                info!(chat = self.chat, "Reply was deleted, dropping the rest of the turn");
                self.status = None;
                self.stopped = true;
                return Flow::Stop;
            }
            Err(e) => debug!(error = %e, "Ignoring failed intermediate edit"),
        }
        Flow::Continue
    }

    /// Final delivery of the pending text: the first chunk into the status
    /// message, the rest as follow-up replies.
    async fn flush(&mut self) -> Result<(), TransportError> {
        let mut chunks = split_md(&self.pending, self.max_chars).into_iter();
        let Some(first) = chunks.next() else {
            return Ok(());
        };

        let formatted = to_markdown_v2(&first);
        match self.status {
            Some(status) if formatted.trim() != self.shown.trim() => {
                match self.edit_markdown(status, &first, &formatted).await {
                    Ok(()) => {}
                    Err(e) if e.is_not_modified() => {}
                    Err(e) if e.is_not_found() => {
                        self.status = None;
                        self.stopped = true;
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                }
            }
            Some(_) => {}
            None => self.send_markdown(&first).await?,
        }
        self.shown = formatted;

        for chunk in chunks {
            self.send_markdown(&chunk).await?;
        }
        self.pending.clear();
        Ok(())
    }

    async fn edit_markdown(
        &self,
        status: i64,
        raw: &str,
        formatted: &str,
    ) -> Result<(), TransportError> {
        match self
            .transport
            .edit_message_text(self.chat, status, formatted, TextFormat::MarkdownV2)
            .await
        {
            Err(e) if e.is_parse_failure() => {
                warn!(error = %e, "Reply markup rejected, sending plain text");
                self.transport
                    .edit_message_text(self.chat, status, raw, TextFormat::Plain)
                    .await
            }
            other => other,
        }
    }

    async fn send_markdown(&self, raw: &str) -> Result<(), TransportError> {
        let formatted = to_markdown_v2(raw);
        let sent = match self
            .transport
            .send_message(self.chat, &formatted, TextFormat::MarkdownV2, Some(self.reply_to))
            .await
        {
            Err(e) if e.is_parse_failure() => {
                warn!(error = %e, "Reply markup rejected, sending plain text");
                self.transport
                    .send_message(self.chat, raw, TextFormat::Plain, Some(self.reply_to))
                    .await
            }
            other => other,
        };
        sent.map(|_| ())
    }

    /// Release the status message before media goes out. Text it already
    /// holds is finalized; an empty status message is deleted.
    async fn detach_status(&mut self) -> Result<(), TransportError> {
        let Some(status) = self.status else {
            return Ok(());
        };
        if self.pending.trim().is_empty() {
            if let Err(e) = self.transport.delete_message(self.chat, status).await {
                debug!(error = %e, "Failed to delete status message");
            }
        } else {
            self.flush().await?;
        }
        self.status = None;
        self.shown.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeTransport, Sent};
    use gemi_ai::{GeneratedImage, VoiceClip};

    fn reply(transport: &FakeTransport, interval: Duration) -> Reply<'_> {
        Reply::new(transport, 5, 9, 100, interval, 4000)
    }

    fn chunk(text: &str) -> OutputEvent {
        OutputEvent::TextChunk(text.to_string())
    }

    fn image() -> OutputEvent {
        OutputEvent::Image(vec![GeneratedImage {
            name: "bike".into(),
            url: "http://images/bike.png".into(),
            mime_type: "image/png".into(),
            data: vec![1],
        }])
    }

    #[tokio::test]
    async fn edits_are_throttled() {
        let transport = FakeTransport::new();
        let mut reply = reply(&transport, Duration::from_secs(3600));

        for text in ["a", "b", "c"] {
            assert_eq!(reply.render(chunk(text)).await.unwrap(), Flow::Continue);
        }
        reply.finish().await.unwrap();

        assert_eq!(transport.edits(), ["a", "abc"]);
        assert_eq!(reply.transcript(), "abc");
    }

    #[tokio::test]
    async fn unchanged_text_is_not_edited_again() {
        let transport = FakeTransport::new();
        let mut reply = reply(&transport, Duration::ZERO);

        reply.render(chunk("hello")).await.unwrap();
        reply.render(chunk("  ")).await.unwrap();
        reply.finish().await.unwrap();

        assert_eq!(transport.edits(), ["hello"]);
    }

    #[tokio::test]
    async fn deleted_reply_stops_rendering() {
        let transport = FakeTransport::new().fail_edit("Bad Request: message to edit not found");
        let mut reply = reply(&transport, Duration::ZERO);

        assert_eq!(reply.render(chunk("hi")).await.unwrap(), Flow::Stop);
        reply.finish().await.unwrap();

        assert_eq!(transport.edits(), ["hi"]);
        assert_eq!(transport.actions().len(), 1);
    }

    #[tokio::test]
    async fn intermediate_rejection_is_swallowed() {
        let transport = FakeTransport::new().fail_edit("Bad Request: can't parse entities");
        let mut reply = reply(&transport, Duration::ZERO);

        assert_eq!(reply.render(chunk("one")).await.unwrap(), Flow::Continue);
        reply.render(chunk(" two")).await.unwrap();
        reply.finish().await.unwrap();

        assert_eq!(transport.edits(), ["one", "one two"]);
    }

    #[tokio::test]
    async fn final_rejection_is_surfaced() {
        let transport = FakeTransport::new()
            .fail_edit("Bad Request: message is too long")
            .fail_edit("Bad Request: message is too long");
        let mut reply = reply(&transport, Duration::from_secs(3600));

        reply.render(chunk("one")).await.unwrap();
        reply.render(chunk(" two")).await.unwrap();
        let err = reply.finish().await.unwrap_err();
        assert!(matches!(err, TransportError::Rejected(_)));
    }

    #[tokio::test]
    async fn text_is_sent_as_markdown() {
        let transport = FakeTransport::new();
        let mut reply = reply(&transport, Duration::ZERO);

        reply.render(chunk("**Done.**")).await.unwrap();
        reply.finish().await.unwrap();

        assert_eq!(transport.edits(), [r"*Done\.*"]);
        assert_eq!(transport.edit_formats(), [TextFormat::MarkdownV2]);
    }

    #[tokio::test]
    async fn unparsable_markdown_falls_back_to_plain_text() {
        let rejected = "Bad Request: can't parse entities: Can't find end of bold entity";
        let transport = FakeTransport::new().fail_edit(rejected).fail_edit(rejected);
        let mut reply = reply(&transport, Duration::from_secs(3600));

        reply.render(chunk("**bold** move.")).await.unwrap();
        reply.finish().await.unwrap();

        assert_eq!(
            transport.edits(),
            [r"*bold* move\.", r"*bold* move\.", "**bold** move."]
        );
        assert_eq!(
            transport.edit_formats(),
            [TextFormat::MarkdownV2, TextFormat::MarkdownV2, TextFormat::Plain]
        );
    }

    #[tokio::test]
    async fn report_is_italic() {
        let transport = FakeTransport::new();
        let mut reply = reply(&transport, Duration::ZERO);

        reply.report("File size too big.").await;

        assert_eq!(transport.edits(), [r"_File size too big\._"]);
    }

    #[tokio::test]
    async fn image_replaces_empty_status() {
        let transport = FakeTransport::new();
        let mut reply = reply(&transport, Duration::ZERO);

        reply.render(image()).await.unwrap();
        reply.render(chunk("Here is your bike")).await.unwrap();
        reply.finish().await.unwrap();

        assert_eq!(
            transport.actions(),
            vec![
                Sent::Delete(100),
                Sent::Media(1),
                Sent::Message {
                    text: "Here is your bike".into(),
                    reply_to: Some(9)
                },
            ]
        );
    }

    #[tokio::test]
    async fn text_before_voice_is_kept() {
        let transport = FakeTransport::new();
        let mut reply = reply(&transport, Duration::from_secs(3600));

        reply.render(chunk("Sure, ")).await.unwrap();
        reply.render(chunk("listen:")).await.unwrap();
        reply
            .render(OutputEvent::Audio(VoiceClip {
                url: "http://voice/a.wav".into(),
                mime_type: "audio/wav".into(),
                data: vec![0],
            }))
            .await
            .unwrap();
        reply.finish().await.unwrap();

        assert_eq!(transport.edits(), ["Sure, ", "Sure, listen:"]);
        assert_eq!(transport.actions().last(), Some(&Sent::Voice));
    }

    #[tokio::test]
    async fn long_text_overflows_into_replies() {
        let transport = FakeTransport::new();
        let mut reply = Reply::new(&transport, 5, 9, 100, Duration::from_secs(3600), 12);

        reply.render(chunk("first part\n\nsecond part")).await.unwrap();
        reply.finish().await.unwrap();

        assert_eq!(transport.edits(), ["first part"]);
        assert_eq!(
            transport.actions().last(),
            Some(&Sent::Message {
                text: "second part".into(),
                reply_to: Some(9)
            })
        );
    }
}
