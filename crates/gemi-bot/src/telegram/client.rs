use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use gemi_ai::{GeneratedImage, MediaSource, VoiceClip};
use gemi_common::TransportError;
use gemi_config::schema::BotConfig;

use super::types::{ApiResponse, File, Message, Update};
use super::{ChatTransport, TextFormat};

/// HTTP client for the Bot API.
pub struct TelegramClient {
    token: String,
    api_url: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// reqwest errors carry the request URL, which embeds the bot token.
fn network(err: reqwest::Error) -> TransportError {
    TransportError::Network(err.without_url().to_string())
}

async fn parse_response<T: DeserializeOwned>(
    method: &str,
    response: reqwest::Response,
) -> Result<T, TransportError> {
    let status = response.status();
    let text = response.text().await.map_err(network)?;

    let envelope: ApiResponse<T> = match serde_json::from_str(&text) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            return Err(TransportError::Parse(format!("{method}: {e}")));
        }
        Err(_) => return Err(TransportError::Api(format!("HTTP {status}: {text}"))),
    };

    if envelope.ok {
        return envelope
            .result
            .ok_or_else(|| TransportError::Parse(format!("{method}: missing result")));
    }

    let description = envelope
        .description
        .unwrap_or_else(|| status.to_string());
    match envelope.error_code.unwrap_or(status.as_u16()) {
        400 => Err(TransportError::Rejected(description)),
        code => Err(TransportError::Api(format!("HTTP {code}: {description}"))),
    }
}

fn file_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" => "ogg",
        _ => "jpg",
    }
}

fn reply_parameters(reply_to: Option<i64>) -> Option<String> {
    reply_to.map(|id| json!({"message_id": id, "allow_sending_without_reply": true}).to_string())
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(network)?;
        Ok(Self {
            token: token.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &BotConfig) -> Result<Self, TransportError> {
        Self::new(&config.token, &config.api_url)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, TransportError> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(network)?;
        parse_response(method, response).await
    }

    async fn call_multipart<T: DeserializeOwned>(
        &self,
        method: &str,
        form: Form,
    ) -> Result<T, TransportError> {
        let response = self
            .http
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        parse_response(method, response).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u32,
    ) -> Result<Vec<Update>, TransportError> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        let response = self
            .http
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(u64::from(timeout_secs) + 10))
            .json(&body)
            .send()
            .await
            .map_err(network)?;
        parse_response("getUpdates", response).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File, TransportError> {
        self.call("getFile", &json!({"file_id": file_id})).await
    }

    /// Download a file by the path `getFile` returned.
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}/file/bot{}/{file_path}", self.api_url, self.token);
        let response = self.http.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Api(format!("HTTP {status}: download failed")));
        }
        let bytes = response.bytes().await.map_err(network)?;
        Ok(bytes.to_vec())
    }

    fn upload_part(data: &[u8], name: &str, mime_type: &str) -> Result<Part, TransportError> {
        Part::bytes(data.to_vec())
            .file_name(format!("{name}.{}", file_extension(mime_type)))
            .mime_str(mime_type)
            .map_err(network)
    }

    fn base_form(chat_id: i64, reply_to: Option<i64>) -> Form {
        let form = Form::new().text("chat_id", chat_id.to_string());
        match reply_parameters(reply_to) {
            Some(params) => form.text("reply_parameters", params),
            None => form,
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        format: TextFormat,
        reply_to: Option<i64>,
    ) -> Result<i64, TransportError> {
        let mut body = json!({"chat_id": chat_id, "text": text});
        if let Some(mode) = format.parse_mode() {
            body["parse_mode"] = json!(mode);
        }
        if let Some(id) = reply_to {
            body["reply_parameters"] = json!({"message_id": id, "allow_sending_without_reply": true});
        }
        let sent: Message = self.call("sendMessage", &body).await?;
        Ok(sent.message_id)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        format: TextFormat,
    ) -> Result<(), TransportError> {
        let mut body = json!({"chat_id": chat_id, "message_id": message_id, "text": text});
        if let Some(mode) = format.parse_mode() {
            body["parse_mode"] = json!(mode);
        }
        let _: Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        let body = json!({"chat_id": chat_id, "message_id": message_id});
        let _: bool = self.call("deleteMessage", &body).await?;
        Ok(())
    }

    async fn send_media_group(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        images: &[GeneratedImage],
    ) -> Result<(), TransportError> {
        // sendMediaGroup needs at least two items.
        if let [image] = images {
            let form = Self::base_form(chat_id, reply_to).part(
                "photo",
                Self::upload_part(&image.data, &image.name, &image.mime_type)?,
            );
            let _: Message = self.call_multipart("sendPhoto", form).await?;
            return Ok(());
        }

        let media: Vec<Value> = (0..images.len())
            .map(|i| json!({"type": "photo", "media": format!("attach://photo{i}")}))
            .collect();
        let mut form = Self::base_form(chat_id, reply_to).text("media", Value::from(media).to_string());
        for (i, image) in images.iter().enumerate() {
            form = form.part(
                format!("photo{i}"),
                Self::upload_part(&image.data, &image.name, &image.mime_type)?,
            );
        }
        let _: Vec<Message> = self.call_multipart("sendMediaGroup", form).await?;
        Ok(())
    }

    async fn send_voice(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        clip: &VoiceClip,
    ) -> Result<(), TransportError> {
        let form = Self::base_form(chat_id, reply_to).part(
            "voice",
            Self::upload_part(&clip.data, "voice", &clip.mime_type)?,
        );
        let _: Message = self.call_multipart("sendVoice", form).await?;
        Ok(())
    }
}

#[async_trait]
impl MediaSource for TelegramClient {
    async fn download(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        let file = self.get_file(file_id).await?;
        let path = file
            .file_path
            .ok_or_else(|| TransportError::Api(format!("file {file_id} has no download path")))?;
        debug!(file_id, size = ?file.file_size, "Downloading file");
        self.download_file(&path).await
    }
}
