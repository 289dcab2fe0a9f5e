//! Results of background image resolution, applied to the editor in one
//! step whenever the owner of the editor gets around to it.

use std::future::Future;

use manos_plate_core::Editor;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

/// "Image `key` now lives at `src`."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolution {
    pub key: String,
    pub src: String,
}

pub struct MutationQueue {
    sender: UnboundedSender<ImageResolution>,
    receiver: UnboundedReceiver<ImageResolution>,
    tasks: JoinSet<()>,
}

impl Default for MutationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            tasks: JoinSet::new(),
        }
    }

    pub fn sender(&self) -> UnboundedSender<ImageResolution> {
        self.sender.clone()
    }

    pub fn post(&self, resolution: ImageResolution) {
        // The receiver lives as long as `self`.
        let _ = self.sender.send(resolution);
    }

    /// Runs `resolve` in the background and posts its source for `key`, if
    /// it produces one. Must be called inside a tokio runtime.
    pub fn spawn<F>(&mut self, key: String, resolve: F)
    where
        F: Future<Output = Option<String>> + Send + 'static,
    {
        let sender = self.sender.clone();
        self.tasks.spawn(async move {
            if let Some(src) = resolve.await {
                let _ = sender.send(ImageResolution { key, src });
            }
        });
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Applies every resolution received so far. Resolutions whose image
    /// has since been removed are dropped. Returns how many were applied.
    pub fn apply_pending(&mut self, editor: &mut Editor) -> usize {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(err) = joined {
                log::warn!("image resolution task failed: {err}");
            }
        }

        let mut applied = 0;
        while let Ok(resolution) = self.receiver.try_recv() {
            if editor.resolve_image(&resolution.key, &resolution.src) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for every outstanding resolution, then applies them.
    pub async fn apply_until_idle(&mut self, editor: &mut Editor) -> usize {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(err) = joined {
                log::warn!("image resolution task failed: {err}");
            }
        }
        self.apply_pending(editor)
    }
}
