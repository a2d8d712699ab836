//! End-to-end page lifecycle tests through the public SDK.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use folio_sdk::prelude::*;

/// Page without a GET handler.
#[derive(Default)]
struct Blank;

impl PageHandler for Blank {}

/// Persistent profile form; its own command object.
#[derive(Default, Command)]
struct Profile {
    #[param]
    age: i32,

    #[param(name = "display-name")]
    name: String,

    #[param(readonly)]
    plan: String,

    invoked: u32,
}

impl PageHandler for Profile {
    fn on_get(&mut self, _: &mut PageCore, _: &TransactionContext) -> Result<View, PageError> {
        Ok(View::Default)
    }

    fn on_post(&mut self, page: &mut PageCore, _: &TransactionContext) -> Result<View, PageError> {
        self.invoked += 1;
        let invoked = self.invoked;
        let error_count = page.errors().len();
        page.model_mut().insert("invoked", invoked);
        page.model_mut().insert("error_count", error_count);
        page.model_mut().insert("age", self.age);
        Ok(View::named("profile/form"))
    }
}

/// Persistent counter used for concurrency checks.
#[derive(Default)]
struct Tally {
    posts: u32,
}

impl PageHandler for Tally {
    fn on_get(&mut self, _: &mut PageCore, _: &TransactionContext) -> Result<View, PageError> {
        Ok(View::Default)
    }

    fn on_post(&mut self, page: &mut PageCore, _: &TransactionContext) -> Result<View, PageError> {
        let seen = self.posts;
        thread::sleep(Duration::from_millis(20));
        self.posts = seen + 1;
        page.model_mut().insert("posts", self.posts);
        Ok(View::Default)
    }
}

/// One-shot upload form.
#[derive(Default, Command)]
struct Attachment {
    #[param(upload)]
    document: Option<UploadedFile>,

    #[param(converter = RangeConverter::new(IntegerConverter, 1, 10))]
    copies: i32,
}

impl PageHandler for Attachment {
    fn on_post(&mut self, page: &mut PageCore, _: &TransactionContext) -> Result<View, PageError> {
        let stored = self.document.as_ref().map(|f| f.exists()).unwrap_or(false);
        page.model_mut().insert("stored", stored);
        Ok(View::Default)
    }
}

fn engine() -> PageEngine {
    init_test_tracing();

    let pages = PageCatalog::new()
        .with("/blank", PageType::of::<Blank>())
        .with("/profile", PageType::of::<Profile>().persistent())
        .with("/tally", PageType::of::<Tally>().persistent())
        .with("/attach", PageType::of::<Attachment>());
    let fields = FieldCatalog::new().with::<Profile>().with::<Attachment>();

    PageEngine::new(EngineConfig::default(), pages, fields).unwrap()
}

fn get(uri: &str) -> TransactionContext {
    TransactionContext::new(Method::Get, uri)
}

fn post(uri: &str) -> TransactionContext {
    TransactionContext::new(Method::Post, uri)
}

/// Open a persistent page and return its identity and the session nonce.
fn open(engine: &PageEngine, path: &str, session: &Session) -> (PageId, String) {
    let response = engine.service(&get(path), session).unwrap();
    let nonce = response.model.get_str("_nonce").unwrap().to_string();
    (response.page_id.unwrap(), nonce)
}

#[test]
fn test_get_without_handler_is_unsupported() {
    let engine = engine();

    let err = engine.service(&get("/blank"), &Session::new()).unwrap_err();

    assert!(matches!(err, PageError::UnsupportedMethod(ref m) if m == "GET"));
    assert_eq!(err.status().as_u16(), 405);
    assert!(engine.registry().is_empty());
}

#[test]
fn test_persistent_post_without_nonce_is_rejected() {
    let engine = engine();
    let session = Session::new();
    let (id, _) = open(&engine, "/profile", &session);

    let cx = post("/profile")
        .with_param("_pid", id.to_string())
        .with_param("age", "30");
    let err = engine.service(&cx, &session).unwrap_err();

    assert!(matches!(err, PageError::NonceMissing));
    assert!(err.is_security_failure());

    let record = engine.registry().lookup(id).unwrap();
    let page = record.lock();
    assert_eq!(page.core().state(), PageState::New);
    assert!(page.core().shadow_input().is_empty());
}

#[test]
fn test_field_error_reaches_business_method() {
    let engine = engine();
    let session = Session::new();
    let (id, nonce) = open(&engine, "/profile", &session);

    let cx = post("/profile")
        .with_param("_pid", id.to_string())
        .with_param("_nonce", nonce)
        .with_param("age", "abc")
        .with_param("display-name", "Ada");
    let response = engine.service(&cx, &session).unwrap();

    assert_eq!(response.errors.len(), 1);
    let error = response.errors.iter().next().unwrap();
    assert_eq!(error.field.as_deref(), Some("age"));
    assert_eq!(response.model.get("invoked"), Some(&serde_json::json!(1)));
    assert_eq!(response.model.get("error_count"), Some(&serde_json::json!(1)));
    assert_eq!(response.state, Some(PageState::Submit));

    let record = engine.registry().lookup(id).unwrap();
    let page = record.lock();
    assert_eq!(page.core().shadow_input().get("age"), Some("abc"));
    assert_eq!(page.field_text(engine.binder(), "display-name").as_deref(), Some("Ada"));
}

#[test]
fn test_get_keeps_errors_of_previous_post() {
    let engine = engine();
    let session = Session::new();
    let (id, nonce) = open(&engine, "/profile", &session);

    let cx = post("/profile")
        .with_param("_pid", id.to_string())
        .with_param("_nonce", nonce.clone())
        .with_param("age", "abc");
    engine.service(&cx, &session).unwrap();

    let shown = engine
        .service(&get(&format!("/profile?_pid={id}")), &session)
        .unwrap();
    assert_eq!(shown.errors.len(), 1);

    let fixed = post("/profile")
        .with_param("_pid", id.to_string())
        .with_param("_nonce", nonce)
        .with_param("age", "42");
    let response = engine.service(&fixed, &session).unwrap();
    assert!(response.errors.is_empty());
    assert_eq!(response.model.get("age"), Some(&serde_json::json!(42)));
}

#[test]
fn test_readonly_field_is_not_bound() {
    let engine = engine();
    let session = Session::new();
    let (id, nonce) = open(&engine, "/profile", &session);

    let cx = post("/profile")
        .with_param("_pid", id.to_string())
        .with_param("_nonce", nonce)
        .with_param("plan", "enterprise");
    engine.service(&cx, &session).unwrap();

    let record = engine.registry().lookup(id).unwrap();
    let page = record.lock();
    assert_eq!(page.field_text(engine.binder(), "plan").as_deref(), Some(""));
}

#[test]
fn test_evicted_identity_is_not_found() {
    let engine = engine();
    let session = Session::new();
    let mut last = None;
    for _ in 0..7 {
        last = Some(open(&engine, "/profile", &session).0);
    }
    let id = last.unwrap();
    assert_eq!(id, PageId(7));

    engine.evict_idle(Duration::ZERO);

    let err = engine
        .service(&get(&format!("/profile?_pid={id}")), &session)
        .unwrap_err();
    assert!(matches!(err, PageError::PageNotFound(ref raw) if raw == "7"));
    assert!(err.is_terminal());
}

#[test]
fn test_same_identity_requests_are_serialized() {
    let engine = engine();
    let session = Session::new();
    let (id, nonce) = open(&engine, "/tally", &session);
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        for _ in 0..2 {
            s.spawn(|| {
                let cx = post("/tally")
                    .with_param("_pid", id.to_string())
                    .with_param("_nonce", nonce.clone());
                barrier.wait();
                engine.service(&cx, &session).unwrap();
            });
        }
    });

    let response = engine
        .service(&get(&format!("/tally?_pid={id}")), &session)
        .unwrap();
    assert_eq!(response.state, Some(PageState::Submit));

    let record = engine.registry().lookup(id).unwrap();
    let page = record.lock();
    assert_eq!(page.core().model().get("posts"), Some(&serde_json::json!(2)));
}

#[test]
fn test_unrelated_pages_run_in_parallel() {
    let engine = Arc::new(engine());
    let session = Arc::new(Session::new());
    let ids: Vec<_> = (0..4)
        .map(|_| open(&engine, "/tally", &session))
        .collect();

    thread::scope(|s| {
        for (id, nonce) in &ids {
            let engine = Arc::clone(&engine);
            let session = Arc::clone(&session);
            s.spawn(move || {
                let cx = post("/tally")
                    .with_param("_pid", id.to_string())
                    .with_param("_nonce", nonce.clone());
                engine.service(&cx, &session).unwrap();
            });
        }
    });

    let snapshot = engine.metrics().snapshot();
    assert_eq!(snapshot.successes, 8);
    assert_eq!(snapshot.total_failures(), 0);
}

#[test]
fn test_uploaded_files_are_released() {
    use std::io::Write;

    let engine = engine();
    let session = Session::new();

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    writeln!(tmp, "quarterly report").unwrap();
    let (_, path) = tmp.keep().unwrap();

    let file = UploadedFile::new(&path)
        .with_content_type("text/plain")
        .with_file_name("report.txt");
    let cx = post("/attach")
        .with_file("document", file)
        .with_param("copies", "2");
    let response = engine.service(&cx, &session).unwrap();

    assert_eq!(response.model.get("stored"), Some(&serde_json::json!(true)));
    assert!(!path.exists());
}

#[test]
fn test_uploaded_files_are_released_on_validation_failure() {
    use std::io::Write;

    let engine = engine();
    let session = Session::new();

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    writeln!(tmp, "draft").unwrap();
    let (_, path) = tmp.keep().unwrap();

    let cx = post("/attach")
        .with_file("document", UploadedFile::new(&path))
        .with_param("copies", "50");
    let err = engine.service(&cx, &session).unwrap_err();

    match err {
        PageError::ValidationFailed(errors) => assert!(errors.has_field_errors("copies")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!path.exists());
}

#[test]
fn test_integer_field_round_trip() {
    let table = Profile::field_table();
    let mut profile = Profile::default();
    let mut shadow = ShadowInput::new();
    let mut errors = Errors::new();
    let janitor = ResourceJanitor::new();
    let key = CommandSlot::new().resolve(|| CommandTarget::Page).key();
    let params: Parameters = [("age".to_string(), "42".to_string())].into_iter().collect();
    let files = UploadedFiles::new();

    let mut scope = BindScope {
        key,
        params: &params,
        files: &files,
        shadow: &mut shadow,
        errors: &mut errors,
        janitor: &janitor,
    };
    table.bind(&mut profile, &mut scope);

    assert!(errors.is_empty());
    assert_eq!(profile.age, 42);
    assert_eq!(table.field_text(&profile, "age").as_deref(), Some("42"));
}

#[test]
fn test_nonce_rotation_when_enabled() {
    let mut config = EngineConfig::default();
    config.nonce.rotate_after_verify = true;
    let pages = PageCatalog::new().with("/profile", PageType::of::<Profile>().persistent());
    let engine = PageEngine::new(config, pages, FieldCatalog::new().with::<Profile>()).unwrap();
    let session = Session::new();
    let (id, nonce) = open(&engine, "/profile", &session);

    let cx = post("/profile")
        .with_param("_pid", id.to_string())
        .with_param("_nonce", nonce.clone());
    let response = engine.service(&cx, &session).unwrap();
    let rotated = response.model.get_str("_nonce").unwrap();
    assert_ne!(rotated, nonce);

    let err = engine.service(&cx, &session).unwrap_err();
    assert!(matches!(err, PageError::NonceMismatch));
}
