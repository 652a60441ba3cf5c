use labs_config::LabsConfig;
use labs_types::{
    GenerationResult, GenerationTask, LabsError, Result, ServiceSession, TaskRequest, TaskStatus,
    http::json_response,
};
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Labs tasks API client bound to one service session.
pub struct TaskClient {
    http: Client,
    base_url: String,
    poll_interval: Duration,
    poll_timeout: Option<Duration>,
    batch_size: u32,
}

impl TaskClient {
    /// Create a client whose every request carries `Authorization: Bearer <sensitive id>`.
    ///
    /// # Errors
    ///
    /// Returns [`LabsError::Config`] if the session id is not a valid header
    /// value, or a transport error if the HTTP client cannot be built.
    pub fn new(session: &ServiceSession, config: &LabsConfig) -> Result<Self> {
        let mut bearer = HeaderValue::from_str(&session.bearer())
            .map_err(|e| LabsError::Config(format!("invalid session id: {e}")))?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: format!("{}/api/labs/tasks", config.base_url.trim_end_matches('/')),
            poll_interval: config.poll_interval(),
            poll_timeout: config.poll_timeout(),
            batch_size: config.batch_size,
        })
    }

    /// Images per task when the caller has no preference.
    #[must_use]
    pub fn default_batch_size(&self) -> u32 {
        self.batch_size
    }

    /// Submit a text-to-image task and wait for its images.
    ///
    /// Polls once per interval with no upper bound unless a poll timeout is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`LabsError::PromptRejected`] if the service rejects the task,
    /// [`LabsError::Invariant`] if it succeeds without generations, and
    /// transport or deserialization errors unchanged.
    pub async fn submit(&self, prompt: &str, count: u32) -> Result<Vec<GenerationResult>> {
        self.submit_with_cancel(prompt, count, &CancellationToken::new())
            .await
    }

    /// Like [`submit`](Self::submit), stopping with [`LabsError::Cancelled`]
    /// as soon as `cancel` fires.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit); additionally `Cancelled` and, when a poll
    /// timeout is configured, [`LabsError::Timeout`].
    pub async fn submit_with_cancel(
        &self,
        prompt: &str,
        count: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<GenerationResult>> {
        let task = self.create_task(prompt, count).await?;
        info!(task_id = %task.id, batch_size = count, "generation task created");

        let wait = self.wait_for_terminal(task, cancel);
        let task = match self.poll_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| LabsError::Timeout(limit))??,
            None => wait.await?,
        };

        let results = task
            .generations
            .map(|g| g.data)
            .ok_or_else(|| LabsError::Invariant("no generations found".into()))?;
        info!(task_id = %task.id, images = results.len(), "generation task succeeded");
        Ok(results)
    }

    /// `POST /api/labs/tasks`. `count` is forwarded as-is; the service enforces its range.
    ///
    /// # Errors
    ///
    /// Returns a transport, status or deserialization error.
    pub async fn create_task(&self, prompt: &str, count: u32) -> Result<GenerationTask> {
        let resp = self
            .http
            .post(&self.base_url)
            .json(&TaskRequest::text_to_image(prompt, count))
            .send()
            .await?;
        json_response(resp).await
    }

    /// `GET /api/labs/tasks/{id}`: one read of the task's current state.
    ///
    /// # Errors
    ///
    /// Returns a transport, status or deserialization error.
    pub async fn get_task(&self, id: &str) -> Result<GenerationTask> {
        let resp = self
            .http
            .get(format!("{}/{id}", self.base_url))
            .send()
            .await?;
        json_response(resp).await
    }

    /// Re-read `task` until it is terminal; a rejection becomes an error.
    async fn wait_for_terminal(
        &self,
        mut task: GenerationTask,
        cancel: &CancellationToken,
    ) -> Result<GenerationTask> {
        while !task.status.is_terminal() {
            task = tokio::select! {
                () = cancel.cancelled() => return Err(LabsError::Cancelled),
                polled = self.get_task(&task.id) => polled?,
            };
            debug!(task_id = %task.id, status = ?task.status, "polled task");

            if task.status.is_terminal() {
                break;
            }
            tokio::select! {
                () = cancel.cancelled() => return Err(LabsError::Cancelled),
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        match task.status {
            TaskStatus::Rejected => Err(LabsError::PromptRejected(task.rejection_message())),
            _ => Ok(task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::{HeaderMap as AxumHeaders, StatusCode, header},
        response::{IntoResponse, Response},
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use std::{
        collections::VecDeque,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    /// Scripted tasks API: creation returns `created`, each status read pops
    /// the next scripted body (the last one repeats).
    struct TaskDouble {
        created: Value,
        statuses: Mutex<VecDeque<Value>>,
        creates: AtomicUsize,
        polls: AtomicUsize,
    }

    impl TaskDouble {
        fn new(created: Value, statuses: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                created,
                statuses: Mutex::new(statuses.into()),
                creates: AtomicUsize::new(0),
                polls: AtomicUsize::new(0),
            })
        }
    }

    fn authorized(headers: &AxumHeaders) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some("Bearer sess-1")
    }

    async fn create(
        State(double): State<Arc<TaskDouble>>,
        headers: AxumHeaders,
        Json(body): Json<Value>,
    ) -> Response {
        double.creates.fetch_add(1, Ordering::SeqCst);
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        if body["task_type"] != "text2im" || body["prompt"]["caption"].as_str().is_none() {
            return StatusCode::BAD_REQUEST.into_response();
        }
        Json(double.created.clone()).into_response()
    }

    async fn status(
        State(double): State<Arc<TaskDouble>>,
        Path(id): Path<String>,
        headers: AxumHeaders,
    ) -> Response {
        double.polls.fetch_add(1, Ordering::SeqCst);
        if !authorized(&headers) || id != "task-1" {
            return StatusCode::NOT_FOUND.into_response();
        }
        let mut statuses = double.statuses.lock().unwrap();
        let next = if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().cloned().unwrap()
        };
        Json(next).into_response()
    }

    async fn spawn(double: Arc<TaskDouble>) -> LabsConfig {
        let router = Router::new()
            .route("/api/labs/tasks", post(create))
            .route("/api/labs/tasks/{id}", get(status))
            .with_state(double);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        LabsConfig {
            base_url: base,
            poll_interval_ms: 10,
            ..LabsConfig::default()
        }
    }

    fn task(status: &str) -> Value {
        json!({"object": "task", "id": "task-1", "created": 1_660_000_000, "status": status})
    }

    fn succeeded(paths: &[&str]) -> Value {
        let data: Vec<Value> = paths
            .iter()
            .enumerate()
            .map(|(i, p)| json!({"id": format!("gen-{i}"), "generation": {"image_path": p}}))
            .collect();
        json!({"id": "task-1", "created": 1, "status": "succeeded", "generations": {"data": data}})
    }

    fn client(config: &LabsConfig) -> TaskClient {
        TaskClient::new(&ServiceSession::new("sess-1"), config).unwrap()
    }

    #[tokio::test]
    async fn test_pending_twice_then_succeeded() {
        let double = TaskDouble::new(
            task("pending"),
            vec![
                task("pending"),
                task("pending"),
                succeeded(&["https://img/1.webp"]),
            ],
        );
        let config = spawn(Arc::clone(&double)).await;

        let results = client(&config).submit("a red fox", 1).await.unwrap();
        assert_eq!(double.creates.load(Ordering::SeqCst), 1);
        assert_eq!(double.polls.load(Ordering::SeqCst), 3);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "gen-0");
        assert_eq!(results[0].image_path(), "https://img/1.webp");
    }

    #[tokio::test]
    async fn test_rejected_surfaces_message() {
        let double = TaskDouble::new(
            task("pending"),
            vec![json!({
                "id": "task-1",
                "status": "rejected",
                "status_information": {"message": "policy"}
            })],
        );
        let config = spawn(Arc::clone(&double)).await;

        let err = client(&config).submit("bad prompt", 4).await.unwrap_err();
        assert!(matches!(err, LabsError::PromptRejected(ref m) if m == "policy"));
        assert_eq!(double.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_without_message() {
        let double = TaskDouble::new(task("pending"), vec![task("rejected")]);
        let config = spawn(double).await;

        let err = client(&config).submit("x", 4).await.unwrap_err();
        assert!(matches!(err, LabsError::PromptRejected(ref m) if m == "Unknown error"));
    }

    #[tokio::test]
    async fn test_succeeded_without_generations_is_invariant_error() {
        let double = TaskDouble::new(
            task("pending"),
            vec![json!({"id": "task-1", "status": "succeeded", "generations": null})],
        );
        let config = spawn(double).await;

        let err = client(&config).submit("x", 4).await.unwrap_err();
        assert!(matches!(err, LabsError::Invariant(_)));
    }

    #[tokio::test]
    async fn test_terminal_creation_skips_polling() {
        let double = TaskDouble::new(succeeded(&["a", "b"]), vec![task("pending")]);
        let config = spawn(Arc::clone(&double)).await;

        let results = client(&config).submit("x", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(double.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_status_keeps_polling() {
        let double = TaskDouble::new(
            task("pending"),
            vec![task("queued"), succeeded(&["https://img/1.webp"])],
        );
        let config = spawn(Arc::clone(&double)).await;

        let results = client(&config).submit("x", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(double.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel_stops_polling() {
        let double = TaskDouble::new(task("pending"), vec![task("pending")]);
        let config = spawn(double).await;
        let client = client(&config);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = client
            .submit_with_cancel("x", 4, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, LabsError::Cancelled));
    }

    #[tokio::test]
    async fn test_poll_timeout() {
        let double = TaskDouble::new(task("pending"), vec![task("pending")]);
        let mut config = spawn(double).await;
        config.poll_timeout_secs = Some(1);

        let err = client(&config).submit("x", 4).await.unwrap_err();
        assert!(matches!(err, LabsError::Timeout(d) if d == Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_wrong_session_is_upstream_error() {
        let double = TaskDouble::new(task("pending"), vec![task("pending")]);
        let config = spawn(Arc::clone(&double)).await;
        let client = TaskClient::new(&ServiceSession::new("other"), &config).unwrap();

        let err = client.submit("x", 4).await.unwrap_err();
        assert!(matches!(err, LabsError::Upstream { status: 401, .. }));
        assert_eq!(double.polls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_batch_size() {
        let client = client(&LabsConfig::default());
        assert_eq!(client.default_batch_size(), 4);
    }
}
