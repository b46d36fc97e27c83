///! Outbound notifications
///!
///! The `Notifier` trait is the only seam the poll cycle sees; the Telegram
///! implementation lives behind it so cycles are testable with a mock.
///! Delivery policy: photos first (rotating through the candidates), plain
///! text as the last resort.

mod caption;
mod telegram;

pub use caption::build_caption;
pub use telegram::TelegramNotifier;

use anyhow::Result;
use async_trait::async_trait;

/// A destination capable of delivering one alert.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a photo with an HTML caption.
    async fn send_photo(&self, photo_url: &str, caption: &str) -> Result<()>;

    /// Send a plain HTML message.
    async fn send_text(&self, text: &str) -> Result<()>;
}

/// Attempt delivery of one alert: each candidate photo in turn, then text.
///
/// `rotation` offsets which photo is tried first so consecutive alerts for
/// the same aircraft vary; callers pass the cycle timestamp. Returns whether
/// anything at all was delivered; only then may the cooldown be committed.
pub async fn deliver(
    notifier: &dyn Notifier,
    photos: &[String],
    caption: &str,
    rotation: usize,
) -> bool {
    for i in 0..photos.len() {
        let url = &photos[(rotation + i) % photos.len()];
        match notifier.send_photo(url, caption).await {
            Ok(()) => return true,
            Err(e) => tracing::warn!("Photo delivery failed for {}: {:#}", url, e),
        }
    }

    match notifier.send_text(caption).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Text delivery failed: {:#}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fails photo sends for URLs containing "bad"; records everything sent.
    struct FlakyNotifier {
        sent: Mutex<Vec<String>>,
        fail_text: bool,
    }

    impl FlakyNotifier {
        fn new(fail_text: bool) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_text,
            }
        }
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn send_photo(&self, photo_url: &str, _caption: &str) -> Result<()> {
            if photo_url.contains("bad") {
                anyhow::bail!("unreachable photo host");
            }
            self.sent.lock().unwrap().push(format!("photo:{}", photo_url));
            Ok(())
        }

        async fn send_text(&self, text: &str) -> Result<()> {
            if self.fail_text {
                anyhow::bail!("text endpoint down");
            }
            self.sent.lock().unwrap().push(format!("text:{}", text));
            Ok(())
        }
    }

    fn photos(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn test_first_working_photo_wins() {
        let notifier = FlakyNotifier::new(true);
        let ok = deliver(
            &notifier,
            &photos(&["https://bad.example/1.jpg", "https://ok.example/2.jpg"]),
            "alert",
            0,
        )
        .await;

        assert!(ok);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), ["photo:https://ok.example/2.jpg"]);
    }

    #[tokio::test]
    async fn test_rotation_changes_starting_photo() {
        let notifier = FlakyNotifier::new(true);
        let ok = deliver(
            &notifier,
            &photos(&["https://ok.example/1.jpg", "https://ok.example/2.jpg"]),
            "alert",
            1,
        )
        .await;

        assert!(ok);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), ["photo:https://ok.example/2.jpg"]);
    }

    #[tokio::test]
    async fn test_all_photos_fail_falls_back_to_text() {
        let notifier = FlakyNotifier::new(false);
        let ok = deliver(
            &notifier,
            &photos(&["https://bad.example/1.jpg"]),
            "alert",
            0,
        )
        .await;

        assert!(ok);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), ["text:alert"]);
    }

    #[tokio::test]
    async fn test_no_photos_goes_straight_to_text() {
        let notifier = FlakyNotifier::new(false);
        assert!(deliver(&notifier, &[], "alert", 7).await);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), ["text:alert"]);
    }

    #[tokio::test]
    async fn test_everything_failing_reports_undelivered() {
        let notifier = FlakyNotifier::new(true);
        let ok = deliver(
            &notifier,
            &photos(&["https://bad.example/1.jpg"]),
            "alert",
            0,
        )
        .await;

        assert!(!ok);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }
}
