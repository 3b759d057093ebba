//! End-to-end deployment behaviour of `ServerContainer`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use parking_lot::Mutex;
use wsmount_core::{
    AnnotatedEndpoint, AnnotatedMetadataBuilder, DescriptorScanner, Endpoint, EndpointConfig,
    EndpointMetadata, HandlerClass, MethodDecl, ParamKind, PathSpec, ServerEndpoint, Session,
    UpgradeRequest, Variant,
};
use wsmount_server::service::{HandlerInstance, MethodScanner};
use wsmount_server::{
    ConnectionFactory, DeploymentError, EndpointRouter, MappedRouter, RouterError,
    ServerContainer, WebSocketPolicy,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CountingScanner {
    scans: AtomicUsize,
}

impl DescriptorScanner for CountingScanner {
    fn scan(&self, builder: &mut AnnotatedMetadataBuilder) -> anyhow::Result<()> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
        MethodScanner::new().scan(builder)
    }
}

#[derive(Default)]
struct RecordingRouter {
    calls: Mutex<Vec<(String, Arc<dyn ConnectionFactory>)>>,
}

impl EndpointRouter for RecordingRouter {
    fn add_mapping(
        &self,
        path: PathSpec,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<(), RouterError> {
        self.calls.lock().push((path.to_string(), factory));
        Ok(())
    }
}

#[derive(Default)]
struct ChatRoom {
    messages: Vec<String>,
}

impl AnnotatedEndpoint for ChatRoom {
    fn server_endpoint() -> ServerEndpoint {
        ServerEndpoint::new("/rooms/{room}").with_subprotocols(["chat"])
    }

    fn methods() -> Vec<MethodDecl> {
        vec![
            MethodDecl::on_open(
                "joined",
                [ParamKind::Session, ParamKind::PathParam("room".into())],
            ),
            MethodDecl::on_message("said", [ParamKind::Session, ParamKind::Text]),
            MethodDecl::on_close("left", [ParamKind::Session, ParamKind::CloseReason]),
            MethodDecl::plain("history", []),
        ]
    }
}

#[derive(Default)]
struct Chat;

impl Endpoint for Chat {
    fn on_open(&mut self, session: &Session, config: &EndpointConfig) {
        assert_eq!(session.path, config.path);
    }
}

#[derive(Default)]
struct Unrelated;

fn container_with(
    router: Arc<dyn EndpointRouter>,
) -> (Arc<CountingScanner>, ServerContainer) {
    let scanner = Arc::new(CountingScanner::default());
    let container = ServerContainer::with_parts(
        router,
        Arc::clone(&scanner) as Arc<dyn DescriptorScanner>,
        WebSocketPolicy::default().shared(),
    );
    (scanner, container)
}

fn session(path: &str) -> Session {
    Session {
        id: "s-1".to_string(),
        path: path.to_string(),
        path_params: Default::default(),
        subprotocol: None,
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[test]
fn sequential_resolution_is_idempotent() {
    let (scanner, container) = container_with(Arc::new(MappedRouter::new()));
    let class = Arc::new(HandlerClass::annotated::<ChatRoom>());

    let first = container.endpoint_metadata(&class, None).unwrap();
    let second = container.endpoint_metadata(&class, None).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(scanner.scans.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_first_resolution_scans_once() {
    const CALLERS: usize = 8;
    let (scanner, container) = container_with(Arc::new(MappedRouter::new()));
    let class = Arc::new(HandlerClass::annotated::<ChatRoom>());
    let barrier = Barrier::new(CALLERS);

    let resolved: Vec<Arc<EndpointMetadata>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    container.endpoint_metadata(&class, None).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(scanner.scans.load(Ordering::SeqCst), 1);
    assert!(resolved.iter().all(|m| Arc::ptr_eq(m, &resolved[0])));
}

#[test]
fn classification_covers_both_forms_and_rejects_others() {
    let (_scanner, container) = container_with(Arc::new(MappedRouter::new()));

    let annotated = container
        .endpoint_metadata(&Arc::new(HandlerClass::annotated::<ChatRoom>()), None)
        .unwrap();
    assert_eq!(annotated.variant(), Variant::AnnotationDescribed);
    assert_eq!(annotated.bindings().unwrap().len(), 3);

    let programmatic = container
        .endpoint_metadata(&Arc::new(HandlerClass::programmatic::<Chat>()), None)
        .unwrap();
    assert_eq!(programmatic.variant(), Variant::Programmatic);

    let err = container
        .endpoint_metadata(&Arc::new(HandlerClass::of::<Unrelated>()), None)
        .unwrap_err();
    assert!(matches!(err, DeploymentError::Classification(_)));
    assert!(err.to_string().contains("Unrelated"));
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn add_endpoint_config_publishes_exactly_one_mapping() {
    let router = Arc::new(RecordingRouter::default());
    let (_scanner, container) = container_with(Arc::clone(&router) as Arc<dyn EndpointRouter>);
    let class = Arc::new(HandlerClass::programmatic::<Chat>());

    container
        .add_endpoint_config(EndpointConfig::new(class, "/chat"))
        .unwrap();

    let calls = router.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/chat");

    let mut instance = calls[0].1.create(&UpgradeRequest::new("/chat")).unwrap();
    assert_eq!(instance.config.path, "/chat");
    let config = instance.config.clone();
    instance
        .endpoint_mut()
        .unwrap()
        .on_open(&session("/chat"), &config);
}

#[test]
fn annotated_factory_creates_fresh_instances() {
    let router = Arc::new(MappedRouter::new());
    let (_scanner, container) = container_with(Arc::clone(&router) as Arc<dyn EndpointRouter>);

    container
        .add_endpoint_class(&Arc::new(HandlerClass::annotated::<ChatRoom>()))
        .unwrap();

    let factory = router.factory("/rooms/{room}").unwrap();
    let a = factory.create(&UpgradeRequest::new("/rooms/1")).unwrap();
    let b = factory.create(&UpgradeRequest::new("/rooms/2")).unwrap();

    assert_ne!(a.id, b.id);
    assert!(a.downcast_ref::<ChatRoom>().unwrap().messages.is_empty());
    assert_eq!(a.config.subprotocols, vec!["chat"]);
    assert!(Arc::ptr_eq(&a.metadata, &b.metadata));
}

#[test]
fn duplicate_path_fails_without_affecting_first_endpoint() {
    let router = Arc::new(MappedRouter::new());
    let (_scanner, container) = container_with(Arc::clone(&router) as Arc<dyn EndpointRouter>);

    container
        .add_endpoint_class(&Arc::new(HandlerClass::annotated::<ChatRoom>()))
        .unwrap();
    let other = Arc::new(HandlerClass::programmatic::<Chat>());
    let err = container
        .add_endpoint_config(EndpointConfig::new(other, "/rooms/{room}"))
        .unwrap_err();

    assert!(matches!(err, DeploymentError::Router(RouterError::DuplicatePath { .. })));
    assert_eq!(router.len(), 1);
    let instance = router
        .factory("/rooms/{room}")
        .unwrap()
        .create(&UpgradeRequest::new("/rooms/x"))
        .unwrap();
    assert_eq!(instance.metadata.variant(), Variant::AnnotationDescribed);
}

#[test]
fn annotated_config_deployment_keeps_marker_path() {
    let router = Arc::new(MappedRouter::new());
    let (_scanner, container) = container_with(Arc::clone(&router) as Arc<dyn EndpointRouter>);
    let class = Arc::new(HandlerClass::annotated::<ChatRoom>());

    container
        .add_endpoint_config(
            EndpointConfig::new(Arc::clone(&class), "/elsewhere")
                .with_user_property("topic", serde_json::json!("rust")),
        )
        .unwrap();

    assert_eq!(router.paths(), vec!["/rooms/{room}"]);
    let instance = router
        .factory("/rooms/{room}")
        .unwrap()
        .create(&UpgradeRequest::new("/rooms/7"))
        .unwrap();
    assert_eq!(instance.config.path, "/rooms/{room}");
    assert_eq!(instance.config.subprotocols, vec!["chat"]);
    assert_eq!(instance.config.user_properties["topic"], serde_json::json!("rust"));
}

#[test]
fn redescribed_type_with_new_marker_is_rejected() {
    let router = Arc::new(MappedRouter::new());
    let (_scanner, container) = container_with(Arc::clone(&router) as Arc<dyn EndpointRouter>);
    let at = |path: &str| {
        Arc::new(HandlerClass::of::<Unrelated>().with_marker(ServerEndpoint::new(path)))
    };

    container.add_endpoint_class(&at("/a")).unwrap();
    let err = container.add_endpoint_class(&at("/b")).unwrap_err();

    assert!(matches!(err, DeploymentError::MarkerConflict { .. }));
    assert!(err.to_string().contains("/b"));
    assert_eq!(router.paths(), vec!["/a"]);
}

#[test]
fn failed_deployment_leaves_no_cache_entry() {
    let (_scanner, container) = container_with(Arc::new(MappedRouter::new()));
    let broken = Arc::new(
        HandlerClass::of::<Unrelated>()
            .with_marker(ServerEndpoint::new("/broken"))
            .with_method(MethodDecl::on_message("bad", [ParamKind::Session])),
    );

    let err = container.add_endpoint_class(&broken).unwrap_err();

    assert!(matches!(err, DeploymentError::Scan { .. }));
    assert!(container.resolver().cached(broken.id()).is_none());
}

#[test]
fn prebuilt_descriptor_is_registered_directly() {
    let router = Arc::new(RecordingRouter::default());
    let (scanner, container) = container_with(Arc::clone(&router) as Arc<dyn EndpointRouter>);
    let class = Arc::new(HandlerClass::programmatic::<Chat>());
    let metadata = Arc::new(
        EndpointMetadata::programmatic(
            Arc::clone(&class),
            Some(EndpointConfig::new(class, "/direct")),
        )
        .unwrap(),
    );

    container.add_endpoint_metadata(metadata).unwrap();

    assert_eq!(router.calls.lock()[0].0, "/direct");
    assert_eq!(scanner.scans.load(Ordering::SeqCst), 0);
    assert!(container.resolver().is_empty());
}

#[test]
fn client_instance_reuses_server_descriptor() {
    let (scanner, container) = container_with(Arc::new(MappedRouter::new()));
    let class = Arc::new(HandlerClass::annotated::<ChatRoom>());
    container.add_endpoint_class(&class).unwrap();

    let instance = container
        .new_client_endpoint_instance(
            HandlerInstance::Annotated(Box::new(ChatRoom::default())),
            &class,
            None,
            "/unused",
        )
        .unwrap();

    assert_eq!(instance.config.path, "/rooms/{room}");
    assert_eq!(scanner.scans.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn max_binary_size_writes_overall_and_streaming_limits() {
    let (_scanner, container) = container_with(Arc::new(MappedRouter::new()));

    container
        .set_default_max_binary_message_buffer_size(1_048_576)
        .unwrap();

    let policy = container.policy();
    assert_eq!(policy.read().max_binary_message_size(), 1_048_576);
    assert_eq!(policy.read().max_binary_message_buffer_size(), 1_048_576);
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn shutdown_forces_reclassification() {
    let (scanner, container) = container_with(Arc::new(MappedRouter::new()));
    let class = Arc::new(HandlerClass::annotated::<ChatRoom>());
    container.start();

    let before = container.endpoint_metadata(&class, None).unwrap();
    container.stop();
    assert!(container.resolver().is_empty());

    container.start();
    let after = container.endpoint_metadata(&class, None).unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(scanner.scans.load(Ordering::SeqCst), 2);
}
