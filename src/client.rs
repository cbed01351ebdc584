use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Duration;
use uuid::Uuid;

use crate::attachment::Attachment;
use crate::events::{ChatEvent, ColorTag};

/// Shown when the backend gives no usable error detail.
pub const GENERIC_FAILURE: &str = "The playlist service ran into a problem.";

/// One song in a recommended playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub artist: String,
    pub title: String,
    pub youtube_link: String,
}

/// Parsed backend response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotReply {
    pub emotion: String,
    pub recommended_songs: Vec<Song>,
}

/// Immutable snapshot of the composition at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub text: Option<String>,
    pub color: Option<ColorTag>,
    pub image: Option<Attachment>,
}

impl Submission {
    /// An all-empty submission is never dispatched.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.color.is_none() && self.image.is_none()
    }
}

/// HTTP client for the playlist recommendation backend.
///
/// All three composition fields travel in one multipart request to the
/// combined endpoint; whichever fields are absent are simply left out.
#[derive(Clone)]
pub struct RecommendClient {
    client: reqwest::Client,
    base_url: String,
}

impl RecommendClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    /// Dispatch a submission and return a receiver for its completion.
    ///
    /// The round trip runs on a spawned task; exactly one `ChatEvent` is
    /// delivered, tagged with `request_id`. Nothing is retried and nothing
    /// is cancelled; the caller decides what to do with late completions.
    pub fn request_events(
        &self,
        request_id: Uuid,
        submission: Submission,
    ) -> mpsc::Receiver<ChatEvent> {
        let (tx, rx) = mpsc::channel(1);

        let client = self.clone();
        tokio::spawn(async move {
            let event = match client.recommend(submission).await {
                Ok(reply) => ChatEvent::Reply { request_id, reply },
                Err(e) => ChatEvent::Failed {
                    request_id,
                    message: e.to_string(),
                },
            };
            let _ = tx.send(event).await;
        });

        rx
    }

    /// Send one combined request and parse the playlist out of the reply.
    pub async fn recommend(&self, submission: Submission) -> Result<BotReply> {
        let url = format!(
            "{}/api/chat/combined",
            self.base_url.trim_end_matches('/')
        );

        let mut form = reqwest::multipart::Form::new();
        if let Some(text) = submission.text {
            form = form.text("text", text);
        }
        if let Some(color) = submission.color {
            form = form.text("color", color.wire_name());
        }
        if let Some(image) = submission.image {
            let part = reqwest::multipart::Part::bytes(image.bytes)
                .file_name(image.filename)
                .mime_str(&image.mime)
                .context("invalid attachment mime type")?;
            form = form.part("image", part);
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("could not reach the playlist service")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("could not read the service response")?;

        if !status.is_success() {
            return Err(anyhow!(error_message(&body)));
        }

        parse_reply(&body)
    }
}

/// Parse a 2xx body. A malformed body surfaces as the generic failure,
/// indistinguishable from a transport error for the caller.
fn parse_reply(body: &str) -> Result<BotReply> {
    serde_json::from_str(body).map_err(|_| anyhow!(GENERIC_FAILURE))
}

/// Pull the `error` field out of a non-2xx body, falling back to the
/// generic failure string when the body is absent or unparsable.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_playlist_reply() {
        let body = r#"{
            "emotion": "happy",
            "recommended_songs": [
                {"artist": "A", "title": "T", "youtube_link": "http://x"}
            ]
        }"#;

        let reply = parse_reply(body).unwrap();
        assert_eq!(reply.emotion, "happy");
        assert_eq!(reply.recommended_songs.len(), 1);
        assert_eq!(reply.recommended_songs[0].artist, "A");
        assert_eq!(reply.recommended_songs[0].title, "T");
        assert_eq!(reply.recommended_songs[0].youtube_link, "http://x");
    }

    #[test]
    fn an_empty_playlist_is_still_a_valid_reply() {
        let reply = parse_reply(r#"{"emotion": "calm", "recommended_songs": []}"#).unwrap();
        assert_eq!(reply.emotion, "calm");
        assert!(reply.recommended_songs.is_empty());
    }

    #[test]
    fn malformed_success_body_becomes_the_generic_failure() {
        let err = parse_reply("<html>oops</html>").unwrap_err();
        assert_eq!(err.to_string(), GENERIC_FAILURE);
    }

    #[test]
    fn error_body_field_is_surfaced() {
        assert_eq!(error_message(r#"{"error": "bad input"}"#), "bad input");
    }

    #[test]
    fn unparsable_error_body_falls_back_to_generic() {
        assert_eq!(error_message("gateway timeout"), GENERIC_FAILURE);
        assert_eq!(error_message(r#"{"detail": "nope"}"#), GENERIC_FAILURE);
    }

    #[test]
    fn submission_emptiness() {
        assert!(Submission::default().is_empty());

        let with_color = Submission {
            color: Some(ColorTag::Blue),
            ..Submission::default()
        };
        assert!(!with_color.is_empty());
    }

    #[tokio::test]
    async fn unreachable_backend_delivers_a_failed_event() {
        // Nothing listens on port 9; the connection is refused locally.
        let client = RecommendClient::new("http://127.0.0.1:9".to_string());
        let request_id = Uuid::new_v4();

        let mut rx = client.request_events(
            request_id,
            Submission {
                text: Some("hello".to_string()),
                ..Submission::default()
            },
        );

        match rx.recv().await {
            Some(ChatEvent::Failed { request_id: id, message }) => {
                assert_eq!(id, request_id);
                assert!(message.contains("could not reach"));
            }
            other => panic!("expected a Failed event, got {other:?}"),
        }
    }
}
