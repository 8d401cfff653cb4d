//! Progress bar utilities for uploads

use tokio::io::AsyncRead;

use super::OutputConfig;

/// Reader handed to streaming uploads
pub type ProgressReader = Box<dyn AsyncRead + Send + Unpin>;

/// Progress bar wrapper
///
/// In quiet or JSON mode, progress is suppressed.
#[derive(Debug)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    fn visible(config: &OutputConfig) -> bool {
        !(config.quiet || config.json || config.no_progress)
    }

    /// Byte progress towards `total`
    pub fn new(config: &OutputConfig, total: u64) -> Self {
        let bar = Self::visible(config).then(|| {
            let bar = indicatif::ProgressBar::new(total);
            if let Ok(style) = indicatif::ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self { bar }
    }

    /// Spinner for transfers of unknown size
    pub fn spinner(config: &OutputConfig, message: &str) -> Self {
        let bar = Self::visible(config).then(|| {
            let bar = indicatif::ProgressBar::new_spinner();
            if let Ok(style) =
                indicatif::ProgressStyle::default_spinner().template("{spinner:.green} {msg} {bytes}")
            {
                bar.set_style(style);
            }
            bar.set_message(message.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(100));
            bar
        });

        Self { bar }
    }

    /// Count the bytes read through `reader`
    pub fn wrap_reader<R>(&self, reader: R) -> ProgressReader
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        match &self.bar {
            Some(bar) => Box::new(bar.wrap_async_read(reader)),
            None => Box::new(reader),
        }
    }

    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_progress_bar_quiet_mode() {
        let config = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        assert!(!ProgressBar::new(&config, 100).is_visible());
    }

    #[test]
    fn test_progress_bar_json_mode() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        assert!(!ProgressBar::new(&config, 100).is_visible());
    }

    #[test]
    fn test_progress_bar_no_progress() {
        let config = OutputConfig {
            no_progress: true,
            ..Default::default()
        };
        assert!(!ProgressBar::spinner(&config, "uploading").is_visible());
    }

    #[test]
    fn test_progress_bar_normal() {
        assert!(ProgressBar::new(&OutputConfig::default(), 100).is_visible());
    }

    #[tokio::test]
    async fn test_wrapped_reader_passes_bytes_through() {
        let bar = ProgressBar::new(&OutputConfig::default(), 5);
        let mut reader = bar.wrap_reader(std::io::Cursor::new(b"hello".to_vec()));

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        bar.finish_and_clear();
        assert_eq!(out, b"hello");
    }
}
