//! Paste and insert entry points. Both update the document right away and
//! leave the network work to background tasks whose results come back
//! through the [`MutationQueue`].

use std::sync::Arc;

use manos_plate_core::{CommandError, Editor, Node, VoidKind};
use manos_portable::{
    HtmlElement, HtmlNode, IMAGE_KEY_ATTR, nodes_to_blocks, normalize_nodes, parse_fragment,
    sanitize,
};
use serde_json::json;
use uuid::Uuid;

use crate::queue::MutationQueue;
use crate::resolver::ImageResolver;
use crate::source::ImageFile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PasteSummary {
    /// Image nodes placed in the document by this paste.
    pub images: usize,
    /// Images handed to background resolution.
    pub pending: usize,
}

pub struct PasteHandler {
    resolver: Arc<ImageResolver>,
    queue: MutationQueue,
}

impl PasteHandler {
    pub fn new(resolver: ImageResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
            queue: MutationQueue::new(),
        }
    }

    pub fn resolver(&self) -> &ImageResolver {
        &self.resolver
    }

    pub fn queue(&mut self) -> &mut MutationQueue {
        &mut self.queue
    }

    /// Inserts each image file as embedded data, then tries to host it.
    /// Files that are not images are skipped.
    pub fn paste_files(
        &mut self,
        editor: &mut Editor,
        files: Vec<ImageFile>,
    ) -> Result<PasteSummary, CommandError> {
        let mut summary = PasteSummary::default();

        for file in files {
            if !file.is_image() {
                log::debug!("skipping non-image paste {} ({})", file.name, file.mime);
                continue;
            }

            let key = Uuid::new_v4().to_string();
            editor.run_command(
                "image.insert",
                Some(json!({ "src": file.to_data_uri(), "key": key })),
            )?;
            summary.images += 1;

            let resolver = Arc::clone(&self.resolver);
            self.queue.spawn(key, async move {
                let reference = resolver.resolve_file(&file).await;
                reference.is_hosted().then(|| reference.into_src())
            });
            summary.pending += 1;
        }

        Ok(summary)
    }

    /// Inserts a sanitized HTML fragment. Remote images keep their original
    /// `src` until a re-hosted copy arrives, and keep it for good if the
    /// fetch or upload fails.
    pub fn paste_html(
        &mut self,
        editor: &mut Editor,
        html: &str,
    ) -> Result<PasteSummary, CommandError> {
        let mut nodes = parse_fragment(&sanitize(html));
        normalize_nodes(&mut nodes);

        let mut remote = Vec::new();
        tag_remote_images(&mut nodes, &self.resolver, &mut remote);

        let blocks = nodes_to_blocks(&nodes);
        if blocks.is_empty() {
            return Ok(PasteSummary::default());
        }
        let images = count_images(&blocks);

        let nodes = serde_json::to_value(&blocks)
            .map_err(|err| CommandError::new(format!("Failed to paste HTML: {err}")))?;
        editor.run_command("blocks.insert", Some(json!({ "nodes": nodes })))?;

        let pending = remote.len();
        for (key, src) in remote {
            let resolver = Arc::clone(&self.resolver);
            self.queue
                .spawn(key, async move { resolver.resolve_remote(&src).await });
        }

        Ok(PasteSummary { images, pending })
    }

    pub fn apply_pending(&mut self, editor: &mut Editor) -> usize {
        self.queue.apply_pending(editor)
    }

    pub async fn apply_until_idle(&mut self, editor: &mut Editor) -> usize {
        self.queue.apply_until_idle(editor).await
    }
}

/// Keys every `<img>` that should be re-hosted and records its source.
fn tag_remote_images(
    nodes: &mut [HtmlNode],
    resolver: &ImageResolver,
    remote: &mut Vec<(String, String)>,
) {
    for node in nodes {
        if let HtmlNode::Element(el) = node {
            tag_element(el, resolver, remote);
        }
    }
}

fn tag_element(el: &mut HtmlElement, resolver: &ImageResolver, remote: &mut Vec<(String, String)>) {
    if el.tag == "img" {
        if let Some(src) = el.attr("src").map(str::trim).map(str::to_string) {
            if resolver.needs_rehost(&src) {
                let key = Uuid::new_v4().to_string();
                el.set_attr(IMAGE_KEY_ATTR, key.clone());
                remote.push((key, src));
            }
        }
        return;
    }
    tag_remote_images(&mut el.children, resolver, remote);
}

fn count_images(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::Void(void) if void.kind == VoidKind::Image => 1,
            Node::Element(el) => count_images(&el.children),
            _ => 0,
        })
        .sum()
}
