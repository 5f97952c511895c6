// Action gateway and inventory tests against a recording runtime double

mod common;

use common::*;
use dockhand::docker_repo::BatchAction;
use dockhand::error::{ErrorKind, RuntimeError};
use dockhand::models::{BuildImageBody, RunContainerBody};

#[tokio::test]
async fn delete_running_container_stops_before_remove() {
    let fake = FakeRuntime::with_containers(vec![container("abc123", "web", "Up 2 hours")]);
    let repo = repo(fake.clone());

    repo.delete_container("abc123").await.unwrap();

    assert_eq!(
        fake.calls(),
        vec!["list_containers", "stop:abc123", "remove:abc123"]
    );
    assert!(fake.containers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn delete_stopped_container_skips_stop() {
    let fake = FakeRuntime::with_containers(vec![container(
        "abc123",
        "web",
        "Exited (0) 3 days ago",
    )]);
    let repo = repo(fake.clone());

    repo.delete_container("web").await.unwrap();

    assert_eq!(fake.calls(), vec!["list_containers", "remove:web"]);
}

#[tokio::test]
async fn delete_with_failing_stop_never_removes() {
    let fake = FakeRuntime::with_containers(vec![container("abc123", "web", "Up 2 hours")]);
    fake.fail_on("stop");
    let repo = repo(fake.clone());

    let err = repo.delete_container("abc123").await.unwrap_err();

    assert!(matches!(err, RuntimeError::DeleteFailed { ref id, .. } if id == "abc123"));
    assert_eq!(err.kind(), ErrorKind::CommandFailed);
    assert!(!fake.calls().iter().any(|c| c.starts_with("remove")));
    assert_eq!(fake.containers.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_by_name_prefers_exact_name_over_id_prefix() {
    let fake = FakeRuntime::with_containers(vec![
        container("abc123456789", "old", "Exited (0) 2 days ago"),
        container("fff999888777", "abc", "Up 5 minutes"),
    ]);
    let repo = repo(fake.clone());

    repo.delete_container("abc").await.unwrap();

    assert_eq!(fake.calls(), vec!["list_containers", "stop:abc", "remove:abc"]);
    let left = fake.containers.lock().unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].name, "old");
}

#[tokio::test]
async fn delete_by_unique_id_prefix_stops_running_container() {
    let fake = FakeRuntime::with_containers(vec![
        container("abc123456789", "web", "Up 5 minutes"),
        container("fff999888777", "db", "Exited (0) 2 days ago"),
    ]);
    let repo = repo(fake.clone());

    repo.delete_container("abc1").await.unwrap();

    assert_eq!(fake.calls(), vec!["list_containers", "stop:abc1", "remove:abc1"]);
}

#[tokio::test]
async fn delete_with_failing_remove_is_a_delete_failure() {
    let fake = FakeRuntime::with_containers(vec![container("abc123", "web", "Up 2 hours")]);
    fake.fail_on("remove");
    let repo = repo(fake.clone());

    let err = repo.delete_container("abc123").await.unwrap_err();

    assert!(matches!(err, RuntimeError::DeleteFailed { .. }));
    assert!(err.to_string().contains("simulated remove failure"));
}

#[tokio::test]
async fn restart_is_stop_then_start() {
    let fake = FakeRuntime::with_containers(vec![container("abc123", "web", "Up 2 hours")]);
    let repo = repo(fake.clone());

    repo.restart_container("abc123").await.unwrap();

    assert_eq!(fake.calls(), vec!["stop:abc123", "start:abc123"]);
}

#[tokio::test]
async fn restart_with_failing_stop_never_starts() {
    let fake = FakeRuntime::with_containers(vec![container("abc123", "web", "Up 2 hours")]);
    fake.fail_on("stop:abc123");
    let repo = repo(fake.clone());

    let err = repo.restart_container("abc123").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CommandFailed);
    assert_eq!(fake.calls(), vec!["stop:abc123"]);
}

#[tokio::test]
async fn batch_reports_every_item_despite_failures() {
    let fake = FakeRuntime::with_containers(vec![
        container("a1", "one", "Exited (0) 1 hour ago"),
        container("b2", "two", "Exited (0) 1 hour ago"),
        container("c3", "three", "Exited (0) 1 hour ago"),
    ]);
    fake.fail_on("start:b2");
    let repo = repo(fake.clone());
    let ids: Vec<String> = ["a1", "b2", "c3"].iter().map(|s| s.to_string()).collect();

    let res = repo.batch(BatchAction::StartContainer, &ids).await;

    assert_eq!(res.results.len(), 3);
    let flags: Vec<bool> = res.results.iter().map(|r| r.success).collect();
    assert_eq!(flags, vec![true, false, true]);
    assert_eq!((res.succeeded, res.failed), (2, 1));
    assert!(res.results[1].error.as_deref().unwrap().contains("simulated"));
    assert_eq!(fake.calls(), vec!["start:a1", "start:b2", "start:c3"]);
}

#[tokio::test]
async fn batch_image_delete_runs_sequentially() {
    let fake = FakeRuntime::with_containers(vec![]);
    fake.fail_on("remove_image:img1");
    let repo = repo(fake.clone());
    let ids = vec!["img1".to_string(), "img2".to_string()];

    let res = repo.batch(BatchAction::DeleteImage, &ids).await;

    assert_eq!(res.failed, 1);
    assert_eq!(fake.calls(), vec!["remove_image:img1", "remove_image:img2"]);
}

#[tokio::test]
async fn run_rejects_sentinel_images_without_calling_runtime() {
    let fake = FakeRuntime::with_containers(vec![]);
    let repo = repo(fake.clone());

    for image in ["", "<none>:<none>", "null:null"] {
        let err = repo
            .run_container(RunContainerBody {
                image: image.into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn run_passes_typed_request() {
    let fake = FakeRuntime::with_containers(vec![]);
    let repo = repo(fake.clone());

    let id = repo
        .run_container(RunContainerBody {
            image: "redis:7".into(),
            name: Some("cache".into()),
            ports: Some("6379:6379".into()),
            volumes: None,
            env: Some("A=1\nB=2".into()),
            restart: true,
        })
        .await
        .unwrap();

    assert_eq!(id, "0123456789ab");
    let req = fake.last_run.lock().unwrap().clone().unwrap();
    assert_eq!(req.name.as_deref(), Some("cache"));
    assert_eq!(req.ports[0].to_flag_value(), "6379:6379");
    assert_eq!(req.env.len(), 2);
    assert!(req.restart_always);
}

#[tokio::test]
async fn listing_failure_returns_empty_inventory() {
    let fake = FakeRuntime::with_containers(vec![container("a1", "one", "Up 1 hour")]);
    fake.fail_on("list_containers");
    fake.fail_on("list_images");
    let repo = repo(fake.clone());

    assert!(repo.list_containers().await.is_empty());
    assert!(repo.list_images().await.is_empty());
}

#[tokio::test]
async fn stats_are_attached_to_running_containers_only() {
    let fake = FakeRuntime::with_containers(vec![
        container("a1", "web", "Up 1 hour"),
        container("b2", "db", "Exited (0) 1 hour ago"),
    ]);
    *fake.stats.lock().unwrap() = vec![sample("a1", "web", 1.5, 512.0), sample("b2", "db", 9.0, 1.0)];
    let repo = repo(fake.clone());

    let list = repo.list_containers_with_stats().await;

    let web = list.iter().find(|c| c.name == "web").unwrap();
    assert_eq!(web.stats.as_ref().unwrap().memory_usage, 512.0);
    let db = list.iter().find(|c| c.name == "db").unwrap();
    assert!(db.stats.is_none());
    assert_eq!(fake.calls(), vec!["list_containers", "stats"]);
}

#[tokio::test]
async fn container_counts() {
    let fake = FakeRuntime::with_containers(vec![
        container("a1", "web", "Up 1 hour"),
        container("b2", "db", "Exited (0) 1 hour ago"),
        container("c3", "job", "Created"),
    ]);
    let counts = repo(fake).container_counts().await;
    assert_eq!((counts.total, counts.running, counts.stopped), (3, 1, 2));
}

#[tokio::test]
async fn docker_resources_sum_without_normalizing() {
    let fake = FakeRuntime::with_containers(vec![]);
    *fake.stats.lock().unwrap() = vec![
        sample("a1", "web", 80.04, 512.4),
        sample("b2", "db", 75.0, 511.9),
    ];
    *fake.disk_bytes.lock().unwrap() = 3 * 1024 * 1024 * 1024 / 2;
    let repo = repo(fake);

    let r = repo.docker_resources(4096).await.unwrap();

    assert_eq!(r.cpu_usage, 155.0);
    assert_eq!(r.memory_usage, 1024);
    assert_eq!(r.memory_percentage, 25);
    assert_eq!(r.disk_usage, 1.5);
    assert_eq!(r.network_rx, 21);
    assert_eq!(r.network_tx, 4);
}

#[tokio::test]
async fn container_stats_for_unknown_id_is_parse_error() {
    let fake = FakeRuntime::with_containers(vec![]);
    let err = repo(fake).container_stats("ghost").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn container_stats_of_stopped_container_is_validation_error() {
    let fake = FakeRuntime::with_containers(vec![container("def456", "db", "Exited (0) 1 hour ago")]);
    *fake.stats.lock().unwrap() = vec![sample("def456", "db", 0.0, 0.0)];

    let err = repo(fake.clone()).container_stats("db").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!fake.calls().iter().any(|c| c.starts_with("stats")));
}

#[tokio::test]
async fn container_stats_of_running_container() {
    let fake = FakeRuntime::with_containers(vec![container("abc123", "web", "Up 2 hours")]);
    *fake.stats.lock().unwrap() = vec![sample("abc123", "web", 3.0, 128.0)];

    let stats = repo(fake).container_stats("web").await.unwrap();

    assert_eq!(stats.cpu_percent, 3.0);
    assert_eq!(stats.memory_usage, 128.0);
}

#[tokio::test]
async fn logs_are_split_and_line_count_clamped() {
    let fake = FakeRuntime::with_containers(vec![]);
    let repo = repo(fake.clone());

    let lines = repo.container_logs("web", None).await.unwrap();
    assert_eq!(lines, vec!["first line", "second line"]);
    repo.container_logs("web", Some(100_000)).await.unwrap();
    repo.container_logs("web", Some(0)).await.unwrap();

    assert_eq!(fake.calls(), vec!["logs:web:100", "logs:web:500", "logs:web:1"]);
}

#[tokio::test]
async fn build_from_content_uses_temp_context_and_cleans_up() {
    let fake = FakeRuntime::with_containers(vec![]);
    let repo = repo(fake.clone());

    repo.build_image(BuildImageBody {
        name: "myapp".into(),
        tag: String::new(),
        dockerfile_content: Some("FROM alpine:3.20\nCMD [\"true\"]\n".into()),
        build_args: Some("VERSION=1\n\nMODE=prod".into()),
        ..Default::default()
    })
    .await
    .unwrap();

    let req = fake.last_build.lock().unwrap().clone().unwrap();
    assert_eq!(req.tag, "myapp:latest");
    assert_eq!(req.dockerfile, req.context.join("Dockerfile"));
    assert_eq!(req.build_args, vec!["VERSION=1", "MODE=prod"]);
    assert_eq!(
        fake.built_dockerfile.lock().unwrap().as_deref(),
        Some("FROM alpine:3.20\nCMD [\"true\"]\n")
    );
    assert!(!req.context.exists());
}

#[tokio::test]
async fn build_temp_dir_is_removed_even_when_build_fails() {
    let fake = FakeRuntime::with_containers(vec![]);
    fake.fail_on("build");
    let repo = repo(fake.clone());

    let err = repo
        .build_image(BuildImageBody {
            name: "myapp".into(),
            tag: "v1".into(),
            dockerfile_content: Some("FROM scratch\n".into()),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CommandFailed);
    assert_eq!(fake.calls(), vec!["build:myapp:v1"]);
    let req = fake.last_build.lock().unwrap().clone().unwrap();
    assert!(!req.context.exists());
}

#[tokio::test]
async fn build_from_path_defaults_context_to_dockerfile_dir() {
    let fake = FakeRuntime::with_containers(vec![]);
    let repo = repo(fake.clone());

    repo.build_image(BuildImageBody {
        name: "svc".into(),
        tag: "v2".into(),
        dockerfile_path: Some("/srv/svc/Dockerfile".into()),
        ..Default::default()
    })
    .await
    .unwrap();

    let req = fake.last_build.lock().unwrap().clone().unwrap();
    assert_eq!(req.context, std::path::PathBuf::from("/srv/svc"));
}

#[tokio::test]
async fn build_requires_name_and_a_dockerfile() {
    let fake = FakeRuntime::with_containers(vec![]);
    let repo = repo(fake.clone());

    let no_name = repo
        .build_image(BuildImageBody {
            dockerfile_content: Some("FROM scratch".into()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(no_name.kind(), ErrorKind::Validation);

    let no_file = repo
        .build_image(BuildImageBody {
            name: "x".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(no_file.kind(), ErrorKind::Validation);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn flag_like_ids_are_rejected() {
    let fake = FakeRuntime::with_containers(vec![]);
    let repo = repo(fake.clone());

    let err = repo.stop_container("--time=0").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(fake.calls().is_empty());
}
