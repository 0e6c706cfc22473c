use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::assets::AssetFetcher;
use crate::assets::decode::decode_image;
use crate::assets::fetch::{BlobSource, HttpBlobSource};
use crate::encode::output::{ArtifactNamer, OutputEncoder, PNG_CONTENT_TYPE};
use crate::encode::png;
use crate::encode::video::VideoOverlayAdapter;
use crate::foundation::config::ForgeConfig;
use crate::foundation::core::FrameSize;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::model::template::MediaKind;
use crate::render::compositor::{Backdrop, CompositeReport, Compositor, LayerKind};
use crate::service::collab::{BackgroundRemover, TemplateStore, UploadSink, UserStore};
use crate::service::job::{CompositeJob, OverlayType, UserDataUsed};
use crate::text::font::FontResolver;

/// Result of a successful render, as returned to callers.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutcome {
    pub url: String,
    pub object_name: String,
    pub frame_size: FrameSize,
    pub overlay_type: OverlayType,
    pub media_kind: MediaKind,
    pub user_data_used: UserDataUsed,
    /// xxh3 of the rendered raster (the static overlay frame for video), hex encoded.
    pub fingerprint: String,
    pub layers: Vec<LayerKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub omitted_layers: Vec<OmittedLayer>,
}

/// An optional layer dropped during compositing.
#[derive(Clone, Debug, Serialize)]
pub struct OmittedLayer {
    pub layer: LayerKind,
    pub reason: String,
}

/// External capabilities a [`Renderer`] works against.
#[derive(Clone)]
pub struct Collaborators {
    pub templates: Arc<dyn TemplateStore>,
    pub users: Arc<dyn UserStore>,
    pub uploads: Arc<dyn UploadSink>,
    pub blobs: Arc<dyn BlobSource>,
    pub background_remover: Option<Arc<dyn BackgroundRemover>>,
}

/// Invocation surface: resolves ids, composites, encodes and stores.
///
/// Each call owns its own [`CompositeJob`]; a renderer can be shared across threads.
pub struct Renderer {
    config: ForgeConfig,
    templates: Arc<dyn TemplateStore>,
    users: Arc<dyn UserStore>,
    fetcher: AssetFetcher,
    fonts: FontResolver,
    output: OutputEncoder,
    background_remover: Option<Arc<dyn BackgroundRemover>>,
}

impl Renderer {
    pub fn new(config: ForgeConfig, collab: Collaborators) -> Self {
        let fetcher = AssetFetcher::new(collab.blobs, config.media.ffprobe.clone());
        let fonts = FontResolver::new(&config.fonts);
        let output = OutputEncoder::new(ArtifactNamer::from_config(&config.output), collab.uploads);
        Self {
            templates: collab.templates,
            users: collab.users,
            fetcher,
            fonts,
            output,
            background_remover: collab.background_remover,
            config,
        }
    }

    /// Renderer fetching assets over HTTP(S) and from local paths.
    pub fn with_http(
        config: ForgeConfig,
        templates: Arc<dyn TemplateStore>,
        users: Arc<dyn UserStore>,
        uploads: Arc<dyn UploadSink>,
    ) -> ForgeResult<Self> {
        let blobs = Arc::new(HttpBlobSource::new(&config.fetch)?);
        Ok(Self::new(
            config,
            Collaborators {
                templates,
                users,
                uploads,
                blobs,
                background_remover: None,
            },
        ))
    }

    pub fn with_background_remover(mut self, remover: Arc<dyn BackgroundRemover>) -> Self {
        self.background_remover = Some(remover);
        self
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Name and profile photo only.
    pub fn render_personal(&self, template_id: &str, user_id: &str) -> ForgeResult<RenderOutcome> {
        self.render(template_id, user_id, OverlayType::Personal)
    }

    /// All available user details, phone and address included.
    pub fn render_business(&self, template_id: &str, user_id: &str) -> ForgeResult<RenderOutcome> {
        self.render(template_id, user_id, OverlayType::Business)
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub fn render(
        &self,
        template_id: &str,
        user_id: &str,
        overlay_type: OverlayType,
    ) -> ForgeResult<RenderOutcome> {
        let job = self.resolve(template_id, user_id, overlay_type)?;
        self.run_job(&job)
    }

    /// Look up the template and user and build the job.
    pub fn resolve(
        &self,
        template_id: &str,
        user_id: &str,
        overlay_type: OverlayType,
    ) -> ForgeResult<CompositeJob> {
        let template = self.templates.get_template(template_id)?;
        let user = self.users.get_user(user_id)?;
        Ok(CompositeJob::new(
            template_id,
            user_id,
            overlay_type,
            template,
            &user,
        ))
    }

    /// Composite, encode and store one resolved job.
    pub fn run_job(&self, job: &CompositeJob) -> ForgeResult<RenderOutcome> {
        let template = &job.template;
        tracing::debug!(
            frame = ?template.frame_size,
            media = ?template.main_media.kind,
            "rendering job"
        );
        let profile_photo = job
            .profile_photo_url()
            .map(|url| self.fetcher.fetch_image(url));

        let (stored, fingerprint, report) = match template.main_media.kind {
            MediaKind::Image => {
                let main = self.fetcher.fetch_image(&template.main_media.url)?;
                let composite = Compositor::new(&self.fonts).compose(
                    template,
                    &job.user,
                    Backdrop::MainImage(&main),
                    profile_photo,
                )?;
                let stored =
                    self.output
                        .store_image(&composite.frame, &job.user_id, &job.template_id)?;
                (stored, composite.frame.fingerprint(), composite.report)
            }
            MediaKind::Video => {
                let out = VideoOverlayAdapter::new(&self.fetcher, &self.fonts, &self.config.media)
                    .run(template, &job.user, profile_photo)?;
                let stored = self
                    .output
                    .store_video(out.mp4, &job.user_id, &job.template_id)?;
                (stored, out.overlay_fingerprint, out.report)
            }
        };

        Ok(outcome(job, stored.url, stored.name, fingerprint, report))
    }

    /// Strip the background from an uploaded image and store it as `no-bg-{stem}.png`.
    #[tracing::instrument(level = "info", skip(self, bytes), fields(len = bytes.len()))]
    pub fn remove_background(&self, bytes: &[u8], file_name: &str) -> ForgeResult<String> {
        let remover = self.background_remover.as_ref().ok_or_else(|| {
            ForgeError::Other(anyhow::anyhow!("no background remover configured"))
        })?;
        let input = decode_image(file_name, bytes)?;
        let output = remover.remove_background(&input)?;
        let png = png::encode_image_png(&output)?;
        let stored = self
            .output
            .store_named(png, PNG_CONTENT_TYPE, no_bg_name(file_name))?;
        Ok(stored.url)
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("fetcher", &self.fetcher)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

pub(crate) fn no_bg_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    format!("no-bg-{stem}.png")
}

fn outcome(
    job: &CompositeJob,
    url: String,
    object_name: String,
    fingerprint: u64,
    report: CompositeReport,
) -> RenderOutcome {
    RenderOutcome {
        url,
        object_name,
        frame_size: job.template.frame_size,
        overlay_type: job.overlay_type,
        media_kind: job.template.main_media.kind,
        user_data_used: job.user_data_used(),
        fingerprint: format!("{fingerprint:016x}"),
        layers: report.painted.to_vec(),
        omitted_layers: report
            .omitted
            .into_iter()
            .map(|(layer, reason)| OmittedLayer { layer, reason })
            .collect(),
    }
}
