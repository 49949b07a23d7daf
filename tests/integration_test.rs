use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use postflow::core::{
    Attachment,
    BlobStore,
    CreatePostBody,
    FeedScope,
    LikeOutcome,
    MemorySession,
    Post,
    PostBackend,
    PostError,
    PostId,
    SubmissionOutcome,
};
use postflow::publish::{
    CompletionEffects,
    CompletionWatcher,
    Observation,
    PostPublisher,
    SubmissionStore,
    Viewer,
};
use tokio::sync::broadcast;
use url::Url;

/// 模拟存储 - 可指定某个下标失败
struct MockUploader {
    delay: Duration,
    fail_index: Option<usize>,
    stored: AtomicUsize,
}

impl MockUploader {
    fn new(delay: Duration, fail_index: Option<usize>) -> Self {
        Self {
            delay,
            fail_index,
            stored: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for MockUploader {
    async fn store(&self, path: &str, attachment: &Attachment) -> postflow::Result<Url> {
        let index: usize = attachment.name.trim_start_matches("file-").parse().unwrap();

        // 后面的文件先完成
        tokio::time::sleep(self.delay * (10 - index as u32 % 10)).await;

        if self.fail_index == Some(index) {
            return Err(PostError::internal_error("network error"));
        }
        self.stored.fetch_add(1, Ordering::SeqCst);
        Ok(Url::parse(&format!("https://example.com/uploaded/{}", path)).unwrap())
    }
}

#[derive(Default)]
struct MockBackend {
    requests: Mutex<Vec<CreatePostBody>>,
    reject: bool,
}

#[async_trait::async_trait]
impl PostBackend for MockBackend {
    async fn create_post(&self, _token: Option<&str>, body: &CreatePostBody) -> postflow::Result<SubmissionOutcome> {
        self.requests.lock().unwrap().push(body.clone());
        if self.reject {
            return Err(PostError::rejected(422, "caption too long"));
        }
        Ok(SubmissionOutcome { post_id: PostId::new("p42") })
    }

    async fn list_posts(&self, _token: Option<&str>, _scope: &FeedScope) -> postflow::Result<Vec<Post>> {
        Ok(vec![])
    }

    async fn toggle_like(&self, _token: Option<&str>, post_id: &PostId) -> postflow::Result<LikeOutcome> {
        Ok(LikeOutcome { post_id: post_id.clone(), likes: vec![] })
    }
}

#[derive(Default)]
struct MockDialog {
    closed: AtomicUsize,
    refreshed: Mutex<Vec<FeedScope>>,
    failures: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl CompletionEffects for MockDialog {
    async fn close_dialog(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    async fn refresh_feed(&self, scope: FeedScope) {
        self.refreshed.lock().unwrap().push(scope);
    }

    async fn report_failure(&self, message: &str) {
        self.failures.lock().unwrap().push(message.to_string());
    }
}

fn attachments(count: usize) -> Vec<Attachment> {
    (0..count)
        .map(|i| Attachment::new(format!("file-{}", i), "image/png", vec![0u8; 1024 * (i + 1)]))
        .collect()
}

fn alice() -> Viewer {
    Viewer {
        username: "alice".into(),
        viewed_profile: Some("alice".into()),
    }
}

async fn next_settled(events: &mut broadcast::Receiver<Observation>) -> Observation {
    loop {
        match events.recv().await.unwrap() {
            event @ (Observation::Completed { .. } | Observation::Failed { .. }) => return event,
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_upload_order_matches_input() {
    for count in [0, 1, 2, 5] {
        let uploader = Arc::new(MockUploader::new(Duration::from_millis(5), None));
        let backend = Arc::new(MockBackend::default());
        let publisher = PostPublisher::new(uploader.clone(), backend.clone(), Arc::new(MemorySession::new()));

        publisher.publish(attachments(count), "caption").await.unwrap().wait().await.unwrap();

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let expected: Vec<String> = (0..count)
            .map(|i| format!("https://example.com/uploaded/files/file-{}", i))
            .collect();
        assert_eq!(requests[0].files, expected);
        assert_eq!(uploader.stored.load(Ordering::SeqCst), count);
    }
}

#[tokio::test]
async fn test_empty_post_still_submits() {
    let backend = Arc::new(MockBackend::default());
    let publisher = PostPublisher::new(
        Arc::new(MockUploader::new(Duration::ZERO, None)),
        backend.clone(),
        Arc::new(MemorySession::new()),
    );

    publisher.publish(vec![], "").await.unwrap().wait().await.unwrap();

    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].files.is_empty());
    assert_eq!(requests[0].caption, "");
}

#[tokio::test]
async fn test_any_upload_failure_blocks_submission() {
    for fail_index in 0..3 {
        let backend = Arc::new(MockBackend::default());
        let publisher = PostPublisher::new(
            Arc::new(MockUploader::new(Duration::from_millis(5), Some(fail_index))),
            backend.clone(),
            Arc::new(MemorySession::new()),
        );

        let err = match publisher.publish(attachments(3), "caption").await {
            Ok(_) => panic!("publish should fail"),
            Err(err) => err,
        };

        assert!(err.is_aggregate_upload());
        assert!(backend.requests.lock().unwrap().is_empty());
        assert!(publisher.store().snapshot().error.is_some());
        assert!(!publisher.store().snapshot().publishing);
    }
}

#[tokio::test]
async fn test_publish_closes_dialog_and_refreshes_own_feed() {
    let backend = Arc::new(MockBackend::default());
    let publisher = PostPublisher::new(
        Arc::new(MockUploader::new(Duration::from_millis(2), None)),
        backend.clone(),
        Arc::new(MemorySession::with_token("t0k3n")),
    );
    let dialog = Arc::new(MockDialog::default());
    let watcher = CompletionWatcher::spawn(publisher.store().subscribe(), alice(), dialog.clone());
    let mut events = watcher.subscribe();

    publisher.publish(attachments(2), "hello").await.unwrap();

    assert_eq!(next_settled(&mut events).await, Observation::Completed { post_id: PostId::new("p42") });
    assert_eq!(dialog.closed.load(Ordering::SeqCst), 1);
    assert_eq!(*dialog.refreshed.lock().unwrap(), vec![FeedScope::Profile("alice".into())]);
    assert_eq!(backend.requests.lock().unwrap()[0].caption, "hello");

    drop(publisher);
    watcher.join().await.unwrap();
    assert_eq!(dialog.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_upload_failure_keeps_dialog_open() {
    let backend = Arc::new(MockBackend::default());
    let publisher = PostPublisher::new(
        Arc::new(MockUploader::new(Duration::from_millis(2), Some(0))),
        backend.clone(),
        Arc::new(MemorySession::new()),
    );
    let dialog = Arc::new(MockDialog::default());
    let watcher = CompletionWatcher::spawn(publisher.store().subscribe(), alice(), dialog.clone());
    let mut events = watcher.subscribe();

    let err = publisher.publish(attachments(1), "hello").await.err().unwrap();
    assert!(err.is_aggregate_upload());

    match next_settled(&mut events).await {
        Observation::Failed { error } => assert!(error.starts_with("Upload batch aborted")),
        other => panic!("unexpected observation: {other:?}"),
    }
    assert_eq!(dialog.closed.load(Ordering::SeqCst), 0);
    assert!(dialog.refreshed.lock().unwrap().is_empty());
    assert_eq!(dialog.failures.lock().unwrap().len(), 1);
    assert!(backend.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_post_is_not_completion() {
    let backend = Arc::new(MockBackend { reject: true, ..Default::default() });
    let publisher = PostPublisher::new(
        Arc::new(MockUploader::new(Duration::ZERO, None)),
        backend,
        Arc::new(MemorySession::new()),
    );
    let dialog = Arc::new(MockDialog::default());
    let watcher = CompletionWatcher::spawn(publisher.store().subscribe(), alice(), dialog.clone());
    let mut events = watcher.subscribe();

    let result = publisher.publish(attachments(1), "x".repeat(5000).as_str()).await.unwrap().wait().await;
    assert!(matches!(result, Err(PostError::Rejected { status_code: 422, .. })));

    assert!(matches!(next_settled(&mut events).await, Observation::Failed { .. }));
    assert_eq!(dialog.closed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_watcher_ignores_outcome_from_before_it_started() {
    let store = SubmissionStore::new();
    let submission = store.begin();
    store.fulfill(submission, SubmissionOutcome { post_id: PostId::new("p1") });

    let dialog = Arc::new(MockDialog::default());
    let watcher = CompletionWatcher::spawn(store.subscribe(), alice(), dialog.clone());

    // 已有的 p1 只作为基线
    drop(store);
    watcher.join().await.unwrap();
    assert_eq!(dialog.closed.load(Ordering::SeqCst), 0);
    assert!(dialog.refreshed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_back_to_back_submissions_complete_separately() {
    let store = SubmissionStore::new();
    let dialog = Arc::new(MockDialog::default());
    let watcher = CompletionWatcher::spawn(store.subscribe(), alice(), dialog.clone());
    let mut events = watcher.subscribe();

    // watcher 还没运行, 三次写入会合并成一个快照
    let first = store.begin();
    store.fulfill(first, SubmissionOutcome { post_id: PostId::new("p1") });
    let second = store.begin();

    assert_eq!(events.recv().await.unwrap(), Observation::Started { submission: second });
    assert_eq!(dialog.closed.load(Ordering::SeqCst), 0);
    assert!(store.snapshot().publishing);

    store.fulfill(second, SubmissionOutcome { post_id: PostId::new("p2") });
    assert_eq!(next_settled(&mut events).await, Observation::Completed { post_id: PostId::new("p2") });
    assert_eq!(dialog.closed.load(Ordering::SeqCst), 1);
    assert_eq!(*dialog.refreshed.lock().unwrap(), vec![FeedScope::Profile("alice".into())]);

    drop(store);
    watcher.join().await.unwrap();
}
