use std::io::Write;
use std::path::Path;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use packhorse::core::error::InstallerError;
use packhorse::core::pack::{CatalogClient, PackInstaller};
use packhorse::core::state::LauncherState;
use packhorse::core::loaders::ForgeInstaller;

const MANIFEST: &str = r#"{
    "manifestType": "minecraftModpack",
    "manifestVersion": 1,
    "name": "All the Mods 6",
    "version": "1.8.21",
    "minecraft": {
        "version": "1.16.5",
        "modLoaders": [{"id": "forge-36.2.0", "primary": true}]
    },
    "overrides": "overrides",
    "files": [
        {"projectID": 111, "fileID": 1001},
        {"projectID": 222, "fileID": 2002}
    ]
}"#;

/// Write a pack archive to disk: manifest plus one override file.
fn write_pack_zip(dir: &Path) -> std::path::PathBuf {
    let zip_path = dir.join("pack.zip");
    let file = std::fs::File::create(&zip_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    writer.start_file("manifest.json", options).unwrap();
    writer.write_all(MANIFEST.as_bytes()).unwrap();
    writer
        .start_file("overrides/config/pack.cfg", options)
        .unwrap();
    writer.write_all(b"render_distance=8").unwrap();
    writer.start_file("unrelated/skip-me.txt", options).unwrap();
    writer.write_all(b"outside the overrides root").unwrap();

    writer.finish().unwrap();
    zip_path
}

fn forge_installer_jar() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("version.json", options).unwrap();
    writer
        .write_all(br#"{"id": "1.16.5-forge-36.2.0", "mainClass": "cpw.mods.modlauncher.Launcher"}"#)
        .unwrap();
    writer.finish().unwrap().into_inner()
}

/// Stub the catalog and the file hosting: project 111 resolves via the
/// batch response, project 222 only via the per-file fallback.
async fn mount_catalog_and_files(server: &MockServer, b_jar_length: u64) {
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 111,
                "latestFiles": [{
                    "id": 1001,
                    "downloadUrl": format!("{}/hosted/a.jar", server.uri()),
                    "fileName": "a.jar",
                    "fileLength": 5,
                }]
            },
            {"id": 222, "latestFiles": []}
        ])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/222/file/2002"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2002,
            "downloadUrl": format!("{}/hosted/b.jar", server.uri()),
            "fileName": "b.jar",
            "fileLength": b_jar_length,
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hosted/a.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"alpha".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hosted/b.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bravo".to_vec()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(
            "/net/minecraftforge/forge/1.16.5-36.2.0/forge-1.16.5-36.2.0-installer.jar",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(forge_installer_jar()))
        .mount(server)
        .await;
}

fn installer<'a>(state: &'a LauncherState, server: &MockServer) -> PackInstaller<'a> {
    let catalog = CatalogClient::new(state.http_client.clone()).with_base_url(server.uri());
    PackInstaller::new(state)
        .with_catalog(catalog)
        .with_forge(ForgeInstaller::new().with_maven_base(server.uri()))
}

#[tokio::test]
async fn installs_a_pack_end_to_end() {
    let server = MockServer::start().await;
    mount_catalog_and_files(&server, 5).await;

    let tmp = tempfile::tempdir().unwrap();
    let state = LauncherState::with_data_dir(tmp.path().to_path_buf()).unwrap();
    let zip_path = write_pack_zip(tmp.path());

    let report = installer(&state, &server)
        .install(zip_path.to_str().unwrap(), None)
        .await
        .unwrap();

    assert_eq!(report.instance_name, "All-the-Mods-6-1.8.21");
    assert_eq!(report.pack_name, "All the Mods 6");
    assert_eq!(report.pack_version, "1.8.21");
    assert_eq!(report.overrides_copied, 1);
    assert_eq!(report.mods_resolved, 2);
    assert_eq!(report.mods_downloaded, 2);
    assert!(report.completed_cleanly());

    let instance_dir = tmp.path().join("instances/All-the-Mods-6-1.8.21");

    // Both mod jars landed in minecraft/mods/.
    assert_eq!(
        std::fs::read(instance_dir.join("minecraft/mods/a.jar")).unwrap(),
        b"alpha"
    );
    assert_eq!(
        std::fs::read(instance_dir.join("minecraft/mods/b.jar")).unwrap(),
        b"bravo"
    );

    // Overlay applied inside the game dir; out-of-root entries skipped.
    assert_eq!(
        std::fs::read_to_string(instance_dir.join("minecraft/config/pack.cfg")).unwrap(),
        "render_distance=8"
    );
    assert!(!instance_dir.join("minecraft/skip-me.txt").exists());

    // Instance record carries the forge version id and the memory override.
    let record = std::fs::read_to_string(instance_dir.join("instance.json")).unwrap();
    assert!(record.contains("\"1.16.5-forge-36.2.0\""));
    assert!(record.contains("java.memory.max"));

    // Forge got provisioned under the versions root.
    assert!(tmp
        .path()
        .join("versions/1.16.5-forge-36.2.0/1.16.5-forge-36.2.0.json")
        .exists());
}

#[tokio::test]
async fn installing_over_an_existing_instance_is_rejected() {
    let server = MockServer::start().await;
    mount_catalog_and_files(&server, 5).await;

    let tmp = tempfile::tempdir().unwrap();
    let state = LauncherState::with_data_dir(tmp.path().to_path_buf()).unwrap();
    let zip_path = write_pack_zip(tmp.path());

    installer(&state, &server)
        .install(zip_path.to_str().unwrap(), Some("mine"))
        .await
        .unwrap();

    let err = installer(&state, &server)
        .install(zip_path.to_str().unwrap(), Some("mine"))
        .await
        .unwrap_err();
    assert!(matches!(err, InstallerError::InstanceExists(name) if name == "mine"));
}

#[tokio::test]
async fn a_size_mismatch_completes_with_warnings() {
    let server = MockServer::start().await;
    // The catalog lies about b.jar's size; the download must be flagged
    // without sinking the rest of the install.
    mount_catalog_and_files(&server, 9999).await;

    let tmp = tempfile::tempdir().unwrap();
    let state = LauncherState::with_data_dir(tmp.path().to_path_buf()).unwrap();
    let zip_path = write_pack_zip(tmp.path());

    let report = installer(&state, &server)
        .install(zip_path.to_str().unwrap(), None)
        .await
        .unwrap();

    assert_eq!(report.mods_resolved, 2);
    assert_eq!(report.mods_downloaded, 1);
    assert!(!report.completed_cleanly());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Size mismatch"));

    // The healthy sibling still landed.
    let mods = tmp.path().join("instances/All-the-Mods-6-1.8.21/minecraft/mods");
    assert!(mods.join("a.jar").exists());
}

#[tokio::test]
async fn a_pack_without_a_manifest_leaves_no_instance_behind() {
    let server = MockServer::start().await;

    let tmp = tempfile::tempdir().unwrap();
    let state = LauncherState::with_data_dir(tmp.path().to_path_buf()).unwrap();

    let zip_path = tmp.path().join("broken.zip");
    let file = std::fs::File::create(&zip_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("readme.txt", options).unwrap();
    writer.write_all(b"no manifest here").unwrap();
    writer.finish().unwrap();

    let err = installer(&state, &server)
        .install(zip_path.to_str().unwrap(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, InstallerError::InvalidManifest(_)));
    assert!(state.instance_manager.list().await.unwrap().is_empty());
    assert!(!tmp.path().join("versions").exists());
}

#[tokio::test]
async fn an_unsupported_locator_is_rejected_up_front() {
    let server = MockServer::start().await;

    let tmp = tempfile::tempdir().unwrap();
    let state = LauncherState::with_data_dir(tmp.path().to_path_buf()).unwrap();

    let err = installer(&state, &server)
        .install("https://example.com/definitely-not-a-pack", None)
        .await
        .unwrap_err();

    assert!(matches!(err, InstallerError::UnsupportedLocator(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
