use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::foundation::config::ConcurrencyConfig;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::model::template::MediaKind;
use crate::service::job::{CompositeJob, OverlayType};
use crate::service::renderer::{RenderOutcome, Renderer};

/// One entry of a batch request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub template_id: String,
    pub user_id: String,
    #[serde(default)]
    pub mode: OverlayType,
}

/// Runs independent render jobs in parallel.
///
/// Image and video jobs get separate pools so long encodes cannot starve image renders.
#[derive(Debug)]
pub struct JobPool {
    image_pool: rayon::ThreadPool,
    video_pool: rayon::ThreadPool,
}

impl JobPool {
    pub fn new(cfg: &ConcurrencyConfig) -> ForgeResult<Self> {
        Ok(Self {
            image_pool: build_thread_pool("image", cfg.image_jobs)?,
            video_pool: build_thread_pool("video", cfg.video_jobs)?,
        })
    }

    /// Run every request; results come back in request order.
    #[tracing::instrument(level = "info", skip_all, fields(requests = requests.len()))]
    pub fn run_batch(
        &self,
        renderer: &Renderer,
        requests: &[RenderRequest],
    ) -> Vec<ForgeResult<RenderOutcome>> {
        let mut results: Vec<Option<ForgeResult<RenderOutcome>>> =
            requests.iter().map(|_| None).collect();
        let mut images = Vec::new();
        let mut videos = Vec::new();

        for (i, req) in requests.iter().enumerate() {
            match renderer.resolve(&req.template_id, &req.user_id, req.mode) {
                Ok(job) if job.template.main_media.kind == MediaKind::Video => {
                    videos.push((i, job))
                }
                Ok(job) => images.push((i, job)),
                Err(e) => results[i] = Some(Err(e)),
            }
        }
        tracing::debug!(images = images.len(), videos = videos.len(), "batch partitioned");

        let run = |pool: &rayon::ThreadPool, jobs: &[(usize, CompositeJob)]| {
            pool.install(|| {
                jobs.par_iter()
                    .map(|(i, job)| (*i, renderer.run_job(job)))
                    .collect::<Vec<_>>()
            })
        };
        let (image_results, video_results) = std::thread::scope(|s| {
            let video = s.spawn(|| run(&self.video_pool, &videos));
            let image = run(&self.image_pool, &images);
            (image, video.join())
        });
        let video_results = video_results.unwrap_or_else(|_| {
            videos
                .iter()
                .map(|(i, _)| {
                    (
                        *i,
                        Err(ForgeError::Other(anyhow::anyhow!("video worker panicked"))),
                    )
                })
                .collect()
        });

        for (i, r) in image_results.into_iter().chain(video_results) {
            results[i] = Some(r);
        }
        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| Err(ForgeError::Other(anyhow::anyhow!("job not run")))))
            .collect()
    }
}

fn build_thread_pool(kind: &str, threads: usize) -> ForgeResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(ForgeError::Other(anyhow::anyhow!(
            "{kind} job concurrency must be >= 1"
        )));
    }
    let name = format!("postforge-{kind}");
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("{name}-{i}"))
        .build()
        .map_err(|e| ForgeError::Other(anyhow::anyhow!("failed to build {kind} thread pool: {e}")))
}
