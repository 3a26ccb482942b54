// Integration tests for the batch orchestration pipeline
// These drive the real orchestrator and engine against a mock completion
// client and a temporary filesystem.

use ghostpen_lib::batch::{BatchConfig, BatchHandle, BatchOrchestrator, BatchStatusEvent};
use ghostpen_lib::client::{GenerationClient, GenerationParams};
use ghostpen_lib::config::Config;
use ghostpen_lib::engine::ConversionEngine;
use ghostpen_lib::presets::PresetStore;
use ghostpen_lib::worklist::parse_work_list;
use ghostpen_lib::{BusinessProfile, ItemStatus, MenuItem};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Completion mock: bodies for body-sized calls, a canned line for title
/// calls, and a call counter for retry assertions.
struct MockClient {
    calls: Arc<AtomicUsize>,
}

impl MockClient {
    fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl GenerationClient for MockClient {
    fn complete(&self, _prompt: &str, params: &GenerationParams) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if params.max_tokens <= 100 {
            // Title call; deliberately too short so the engine exercises its
            // template fallback
            Ok("제목".to_string())
        } else {
            Ok("생성된 본문입니다. 주소는 일산 중앙로예요.\n메뉴가 정말 다양하더라구요.".to_string())
        }
    }
}

/// Completion mock that always fails.
struct FailingClient {
    calls: Arc<AtomicUsize>,
}

impl GenerationClient for FailingClient {
    fn complete(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err("completion service unavailable".to_string())
    }
}

/// Completion mock that requests a batch stop after the first body call.
struct StoppingClient {
    handle: Arc<Mutex<Option<BatchHandle>>>,
}

impl GenerationClient for StoppingClient {
    fn complete(&self, _prompt: &str, params: &GenerationParams) -> Result<String, String> {
        if params.max_tokens > 100 {
            if let Some(handle) = self.handle.lock().unwrap().as_ref() {
                handle.stop();
            }
        }
        Ok("생성된 본문입니다.".to_string())
    }
}

fn test_config() -> Config {
    Config {
        feature_seed: Some(7),
        ..Default::default()
    }
}

fn fast_batch_config(dir: &TempDir) -> BatchConfig {
    BatchConfig {
        output_base_dir: dir.path().join("output"),
        preset_dir: dir.path().join("업체정보"),
        max_retries: 2,
        retry_delay_secs: 0,
        api_delay_secs: 0,
        pause_poll_ms: 10,
    }
}

fn default_profile() -> BusinessProfile {
    BusinessProfile {
        name: "대종칼국수".to_string(),
        address: "경기 고양시 일산동구 중앙로 123".to_string(),
        menu_items: vec![MenuItem::with_price("바지락칼국수", "9,000원")],
        ordered_items: vec![MenuItem::with_price("바지락칼국수", "9,000원")],
        features: vec!["[필수] 14시간 우려낸 사골 육수".to_string()],
        ..Default::default()
    }
}

fn write_worklist(dir: &TempDir, rows: &[(&str, &str, &str)]) -> std::path::PathBuf {
    let mut csv = String::from("원본파일경로,키워드,프리셋파일\n");
    for (source, keyword, preset) in rows {
        csv.push_str(&format!("{},{},{}\n", source, keyword, preset));
    }
    let path = dir.path().join("worklist.csv");
    fs::write(&path, csv).unwrap();
    path
}

fn write_source(dir: &TempDir, name: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, "원본 블로그 글이에요. 정말 맛있더라구요!").unwrap();
    path.display().to_string()
}

#[test]
fn test_run_processes_only_rows_with_existing_sources() {
    let dir = TempDir::new().unwrap();
    let s1 = write_source(&dir, "blog1.txt");
    let s2 = write_source(&dir, "blog2.txt");
    let s3 = write_source(&dir, "blog3.txt");
    let worklist = write_worklist(
        &dir,
        &[
            (s1.as_str(), "일산 칼국수 맛집", ""),
            (s2.as_str(), "일산 점심 맛집", ""),
            ("/없는/경로/blog.txt", "유령 키워드", ""),
            (s3.as_str(), "일산 가족 외식", ""),
        ],
    );

    let mut items = parse_work_list(&worklist).unwrap();
    assert_eq!(items.len(), 3, "nonexistent source row must be skipped");

    let engine = ConversionEngine::new(test_config(), Box::new(MockClient::new()));
    let mut orchestrator = BatchOrchestrator::new(fast_batch_config(&dir), engine);
    let summary = orchestrator.run(&mut items, &default_profile()).unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.success, 3);
    assert_eq!(summary.failed, 0);
    assert!(items.iter().all(|i| i.status == ItemStatus::Success));

    // Partitioned output: one business directory with success files and a
    // summary
    let business_summary = &summary.by_business["대종칼국수"];
    assert_eq!(business_summary.total, 3);
    assert_eq!(business_summary.success, 3);

    let business_root = dir
        .path()
        .join("output")
        .join(&summary.timestamp)
        .join("대종칼국수");
    assert!(business_root.join("성공").join("대종칼국수_일산 칼국수 맛집.txt").exists());
    assert!(business_root.join("실패").exists());
    assert!(business_root.join("summary.json").exists());

    // Output files carry the document form (title line + body)
    let document = fs::read_to_string(
        business_root.join("성공").join("대종칼국수_일산 칼국수 맛집.txt"),
    )
    .unwrap();
    assert!(document.starts_with("제목:"));
    assert!(document.contains("(지도)"));
}

#[test]
fn test_failing_item_exhausts_retries_and_lands_in_report() {
    let dir = TempDir::new().unwrap();
    let s1 = write_source(&dir, "blog1.txt");
    let worklist = write_worklist(&dir, &[(s1.as_str(), "일산 칼국수 맛집", "")]);

    let mut items = parse_work_list(&worklist).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let client = FailingClient {
        calls: calls.clone(),
    };
    let engine = ConversionEngine::new(test_config(), Box::new(client));
    let config = fast_batch_config(&dir);
    let max_retries = config.max_retries;
    let mut orchestrator = BatchOrchestrator::new(config, engine);
    let summary = orchestrator.run(&mut items, &default_profile()).unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(summary.success, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(items[0].status, ItemStatus::Failed);
    assert_eq!(items[0].retry_count, max_retries);
    assert_eq!(calls.load(Ordering::SeqCst) as u32, max_retries);
    assert!(items[0]
        .error
        .as_deref()
        .unwrap()
        .contains("completion service unavailable"));

    let report_path = dir
        .path()
        .join("output")
        .join(&summary.timestamp)
        .join("대종칼국수")
        .join("실패")
        .join("failed_items.csv");
    let report = fs::read_to_string(report_path).unwrap();
    assert!(report.starts_with("원본파일경로,키워드,프리셋파일,에러메시지"));
    assert!(report.contains("일산 칼국수 맛집"));
    assert!(report.contains("completion service unavailable"));
}

#[test]
fn test_preset_partitioning_and_fallback() {
    let dir = TempDir::new().unwrap();
    let s1 = write_source(&dir, "blog1.txt");
    let s2 = write_source(&dir, "blog2.txt");
    let s3 = write_source(&dir, "blog3.txt");

    // Two real presets plus one dangling reference
    let store = PresetStore::new(dir.path().join("업체정보"));
    let mut second = default_profile();
    second.name = "예향한정식".to_string();
    second.address = "전남 목포시 평화로 12".to_string();
    store.save(&default_profile(), Some("대종칼국수.json")).unwrap();
    store.save(&second, Some("예향한정식.json")).unwrap();

    let worklist = write_worklist(
        &dir,
        &[
            (s1.as_str(), "일산 칼국수 맛집", "대종칼국수.json"),
            (s2.as_str(), "목포 한정식 맛집", "예향한정식.json"),
            (s3.as_str(), "유실된 프리셋 키워드", "없는업체.json"),
        ],
    );

    let mut items = parse_work_list(&worklist).unwrap();
    let engine = ConversionEngine::new(test_config(), Box::new(MockClient::new()));
    let mut orchestrator = BatchOrchestrator::new(fast_batch_config(&dir), engine);
    let summary = orchestrator.run(&mut items, &default_profile()).unwrap();

    assert_eq!(summary.success, 3);
    // Missing preset fell back to the default profile's business
    assert_eq!(items[2].business_name.as_deref(), Some("대종칼국수"));

    assert_eq!(summary.by_business.len(), 2);
    assert_eq!(summary.by_business["대종칼국수"].total, 2);
    assert_eq!(summary.by_business["예향한정식"].total, 1);

    let output = dir.path().join("output").join(&summary.timestamp);
    assert!(output
        .join("예향한정식")
        .join("성공")
        .join("예향한정식_목포 한정식 맛집.txt")
        .exists());
}

#[test]
fn test_stop_requested_before_run_leaves_items_pending() {
    let dir = TempDir::new().unwrap();
    let s1 = write_source(&dir, "blog1.txt");
    let s2 = write_source(&dir, "blog2.txt");
    let worklist = write_worklist(
        &dir,
        &[(s1.as_str(), "키워드 하나", ""), (s2.as_str(), "키워드 둘", "")],
    );

    let mut items = parse_work_list(&worklist).unwrap();
    let engine = ConversionEngine::new(test_config(), Box::new(MockClient::new()));
    let mut orchestrator = BatchOrchestrator::new(fast_batch_config(&dir), engine);
    orchestrator.handle().stop();

    let summary = orchestrator.run(&mut items, &default_profile()).unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.success, 0);
    assert_eq!(summary.failed, 0);
    assert!(items.iter().all(|i| i.status == ItemStatus::Pending));
}

#[test]
fn test_stop_mid_run_finishes_in_flight_item_only() {
    let dir = TempDir::new().unwrap();
    let s1 = write_source(&dir, "blog1.txt");
    let s2 = write_source(&dir, "blog2.txt");
    let s3 = write_source(&dir, "blog3.txt");
    let worklist = write_worklist(
        &dir,
        &[
            (s1.as_str(), "키워드 하나", ""),
            (s2.as_str(), "키워드 둘", ""),
            (s3.as_str(), "키워드 셋", ""),
        ],
    );

    let mut items = parse_work_list(&worklist).unwrap();
    let handle_slot: Arc<Mutex<Option<BatchHandle>>> = Arc::new(Mutex::new(None));
    let client = StoppingClient {
        handle: handle_slot.clone(),
    };
    let engine = ConversionEngine::new(test_config(), Box::new(client));
    let mut orchestrator = BatchOrchestrator::new(fast_batch_config(&dir), engine);
    *handle_slot.lock().unwrap() = Some(orchestrator.handle());

    let summary = orchestrator.run(&mut items, &default_profile()).unwrap();

    // The first item completes; the stop is observed before the second
    assert_eq!(summary.success, 1);
    assert_eq!(items[0].status, ItemStatus::Success);
    assert_eq!(items[1].status, ItemStatus::Pending);
    assert_eq!(items[2].status, ItemStatus::Pending);
}

#[test]
fn test_status_events_emitted_in_order() {
    let dir = TempDir::new().unwrap();
    let s1 = write_source(&dir, "blog1.txt");
    let worklist = write_worklist(&dir, &[(s1.as_str(), "일산 칼국수 맛집", "")]);

    let mut items = parse_work_list(&worklist).unwrap();
    let engine = ConversionEngine::new(test_config(), Box::new(MockClient::new()));
    let mut orchestrator = BatchOrchestrator::new(fast_batch_config(&dir), engine);
    let (tx, rx) = std::sync::mpsc::channel();
    orchestrator.set_status_sender(tx);

    orchestrator.run(&mut items, &default_profile()).unwrap();

    let events: Vec<BatchStatusEvent> = rx.try_iter().collect();
    assert!(matches!(
        events.first(),
        Some(BatchStatusEvent::ItemStarted { index: 0, .. })
    ));
    assert!(events.iter().any(|e| matches!(
        e,
        BatchStatusEvent::ItemFinished {
            status: ItemStatus::Success,
            ..
        }
    )));
    assert!(matches!(
        events.last(),
        Some(BatchStatusEvent::Progress {
            completed: 1,
            total: 1
        })
    ));
}

#[test]
fn test_invalid_default_profile_prevents_run() {
    let dir = TempDir::new().unwrap();
    let s1 = write_source(&dir, "blog1.txt");
    let worklist = write_worklist(&dir, &[(s1.as_str(), "키워드", "")]);

    let mut items = parse_work_list(&worklist).unwrap();
    let engine = ConversionEngine::new(test_config(), Box::new(MockClient::new()));
    let mut orchestrator = BatchOrchestrator::new(fast_batch_config(&dir), engine);

    let mut bad_profile = default_profile();
    bad_profile.ordered_items.clear();
    let err = orchestrator.run(&mut items, &bad_profile).unwrap_err();
    assert!(err.contains("invalid default business profile"));
    assert_eq!(items[0].status, ItemStatus::Pending);
}
