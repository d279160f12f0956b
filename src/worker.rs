// THEORY:
// The algorithms in this crate are synchronous, single-threaded compute: no
// internal concurrency, no I/O, bounded by fixed iteration counts. What
// needs care is the caller side — overlapping requests against one logical
// engine must be serialized. The `worker` module provides that by
// construction: an `AnalysisWorker` owns a request queue and a single task
// that executes requests strictly in order, so callers on any number of
// tasks can submit work without coordinating among themselves.
//
// `AnalysisPool` layers a round-robin dispatcher over several workers for
// callers with independent images to process; because every invocation
// builds its own state, workers share nothing and need no locks.

use crate::error::{EngineError, Result};
use crate::pipeline::{ClassificationReport, PathResult, PipelineConfig, classify_scene, find_optimal_path};
use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};

/// A unit of work for the analysis worker.
enum AnalysisRequest {
    Classify {
        image: image::RgbImage,
        reply: oneshot::Sender<Result<ClassificationReport>>,
    },
    FindPath {
        image: image::RgbImage,
        start_px: (u32, u32),
        end_px: (u32, u32),
        reply: oneshot::Sender<Result<PathResult>>,
    },
}

/// One logical engine: a queue plus a single task draining it in order.
pub struct AnalysisWorker {
    sender: mpsc::UnboundedSender<AnalysisRequest>,
}

impl AnalysisWorker {
    pub fn new(config: PipelineConfig) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<AnalysisRequest>();

        tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                match request {
                    AnalysisRequest::Classify { image, reply } => {
                        let _ = reply.send(classify_scene(&image, &config));
                    }
                    AnalysisRequest::FindPath {
                        image,
                        start_px,
                        end_px,
                        reply,
                    } => {
                        let _ = reply.send(find_optimal_path(&image, start_px, end_px, &config));
                    }
                }
            }
        });

        Self { sender }
    }

    /// Submits a classification request and waits for its report.
    pub async fn classify(&self, image: image::RgbImage) -> Result<ClassificationReport> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(AnalysisRequest::Classify { image, reply })
            .map_err(|_| EngineError::WorkerClosed)?;
        response.await.map_err(|_| EngineError::WorkerClosed)?
    }

    /// Submits a pathfinding request and waits for its result.
    pub async fn find_path(
        &self,
        image: image::RgbImage,
        start_px: (u32, u32),
        end_px: (u32, u32),
    ) -> Result<PathResult> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(AnalysisRequest::FindPath {
                image,
                start_px,
                end_px,
                reply,
            })
            .map_err(|_| EngineError::WorkerClosed)?;
        response.await.map_err(|_| EngineError::WorkerClosed)?
    }
}

/// A round-robin pool of workers for independent requests. Defaults to one
/// worker per CPU.
pub struct AnalysisPool {
    workers: Vec<AnalysisWorker>,
    next: std::sync::atomic::AtomicUsize,
}

impl AnalysisPool {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_workers(config, num_cpus::get().max(1))
    }

    pub fn with_workers(config: PipelineConfig, count: usize) -> Self {
        let workers = (0..count.max(1))
            .map(|_| AnalysisWorker::new(config.clone()))
            .collect();
        Self {
            workers,
            next: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    fn next_worker(&self) -> &AnalysisWorker {
        let index = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        &self.workers[index % self.workers.len()]
    }

    pub async fn classify(&self, image: image::RgbImage) -> Result<ClassificationReport> {
        self.next_worker().classify(image).await
    }

    pub async fn find_path(
        &self,
        image: image::RgbImage,
        start_px: (u32, u32),
        end_px: (u32, u32),
    ) -> Result<PathResult> {
        self.next_worker().find_path(image, start_px, end_px).await
    }

    /// Classifies a batch of independent images across the pool.
    pub async fn classify_batch(
        &self,
        images: Vec<image::RgbImage>,
    ) -> Vec<Result<ClassificationReport>> {
        join_all(images.into_iter().map(|image| self.classify(image))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_floor_plan(width: u32, height: u32) -> image::RgbImage {
        image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]))
    }

    #[tokio::test]
    async fn worker_serves_both_request_kinds() {
        let worker = AnalysisWorker::new(PipelineConfig::default());

        let report = worker.classify(light_floor_plan(40, 40)).await.unwrap();
        assert!(report.region_count > 0);
        assert!(report.evidence.is_empty()); // plain white scene

        let path = worker
            .find_path(light_floor_plan(40, 40), (5, 5), (35, 35))
            .await
            .unwrap();
        assert_eq!(path.cells.len(), 7);
    }

    #[tokio::test]
    async fn worker_rejects_degenerate_images() {
        let worker = AnalysisWorker::new(PipelineConfig::default());
        let result = worker.classify(image::RgbImage::new(0, 0)).await;
        assert!(matches!(result, Err(EngineError::EmptyImage { .. })));
    }

    #[tokio::test]
    async fn pool_processes_a_batch() {
        let pool = AnalysisPool::with_workers(PipelineConfig::default(), 2);
        let images = vec![light_floor_plan(30, 30), light_floor_plan(40, 40)];
        let reports = pool.classify_batch(images).await;
        assert_eq!(reports.len(), 2);
        for report in reports {
            assert!(report.unwrap().region_count > 0);
        }
    }
}
