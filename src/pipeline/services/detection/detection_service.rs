use super::detector::HazardDetector;
use crate::common::ImageReference;
use crate::error::DetectionError;
use crate::pipeline::types::Detection;
use futures::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneService;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt};

/// Tower service around a `HazardDetector`
#[derive(Clone)]
pub struct DetectionService {
    inner: Arc<dyn HazardDetector>,
}

impl DetectionService {
    pub fn new(inner: Arc<dyn HazardDetector>) -> Self {
        Self { inner }
    }
}

impl Service<ImageReference> for DetectionService {
    type Response = Vec<Detection>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, image: ImageReference) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move { inner.detect(&image).await.map_err(BoxError::from) })
    }
}

type BoxedDetection = BoxCloneService<ImageReference, Vec<Detection>, BoxError>;

/// The detector stack the Vision step calls: the detector, bounded by a timeout
pub struct DetectionClient {
    service: Mutex<BoxedDetection>,
    timeout: Option<Duration>,
}

impl DetectionClient {
    pub async fn detect(&self, image: ImageReference) -> Result<Vec<Detection>, DetectionError> {
        let service = self
            .service
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        service
            .oneshot(image)
            .await
            .map_err(|err| self.classify_error(err))
    }

    fn classify_error(&self, err: BoxError) -> DetectionError {
        if err.is::<Elapsed>() {
            return DetectionError::Timeout(self.timeout.unwrap_or_default());
        }
        match err.downcast::<DetectionError>() {
            Ok(detection_error) => *detection_error,
            Err(other) => DetectionError::Backend(other.to_string()),
        }
    }
}

pub struct DetectionClientBuilder {
    detector: Arc<dyn HazardDetector>,
    timeout: Option<Duration>,
}

impl DetectionClientBuilder {
    pub fn new(detector: Arc<dyn HazardDetector>) -> Self {
        Self {
            detector,
            timeout: None,
        }
    }

    pub fn detect_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> DetectionClient {
        let service = ServiceBuilder::new()
            .option_layer(self.timeout.map(TimeoutLayer::new))
            .service(DetectionService::new(self.detector));

        DetectionClient {
            service: Mutex::new(BoxCloneService::new(service)),
            timeout: self.timeout,
        }
    }
}
