//! Listener supervision against real sockets.

use std::time::Duration;

use host_orchestrator::lifecycle::startup::{listener_starters, Subsystems};
use host_orchestrator::lifecycle::Supervisor;
use host_orchestrator::routing::compose_router;

mod common;

#[tokio::test]
async fn missing_tls_key_takes_the_process_down() {
    let http_port = 28381;
    let tmp = tempfile::tempdir().unwrap();

    let cert_dir = tmp.path().join("cert");
    std::fs::create_dir_all(&cert_dir).unwrap();
    std::fs::write(cert_dir.join("cert.pem"), "placeholder").unwrap();

    let mut config = common::config_in(tmp.path(), http_port);
    config.https_port = Some("28382".into());
    config.tls = host_orchestrator::config::TlsPaths::in_dir(&cert_dir);

    let err = tokio::time::timeout(Duration::from_secs(5), host_orchestrator::run(config))
        .await
        .expect("run must return when a listener fails")
        .unwrap_err();
    assert_eq!(err.listener_name(), Some("https"));

    // The HTTP listener was aborted along with the rest.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(tokio::net::TcpStream::connect(("127.0.0.1", http_port)).await.is_err());
}

#[tokio::test]
async fn occupied_http_port_is_reported() {
    let http_port = 28383;
    let _squatter = tokio::net::TcpListener::bind(("0.0.0.0", http_port)).await.unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let config = common::config_in(tmp.path(), http_port);

    let err = tokio::time::timeout(Duration::from_secs(5), host_orchestrator::run(config))
        .await
        .expect("run must return when a listener fails")
        .unwrap_err();
    assert_eq!(err.listener_name(), Some("http"));
}

#[cfg(unix)]
#[tokio::test]
async fn control_socket_and_http_share_one_router() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let http_port = 28384;
    let tmp = tempfile::tempdir().unwrap();
    let config = common::config_in(tmp.path(), http_port);

    let subsystems = Subsystems::build(&config).unwrap();
    let router = compose_router(&subsystems, &config).unwrap();
    let mut supervisor = Supervisor::new();
    for starter in listener_starters(&config, router) {
        supervisor.add(starter);
    }
    let server = tokio::spawn(supervisor.run());
    tokio::time::sleep(Duration::from_millis(500)).await;

    subsystems.debug_vars.update(host_orchestrator::orchestrator::debug::Variables {
        cvd_bin_android_build_id: "42".into(),
        cvd_bin_android_build_target: "cf_x86_64".into(),
    });

    let res = common::client()
        .get(format!("http://127.0.0.1:{}/_debug/varz", http_port))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["cvd_bin_android_build_id"], "42");

    let mut stream = tokio::net::UnixStream::connect(tmp.path().join("operator"))
        .await
        .expect("control socket not listening");
    stream
        .write_all(b"GET /_debug/statusz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("ok"));

    server.abort();
}
