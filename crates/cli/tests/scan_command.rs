use cli::commands::{self, ScanArgs};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;
use zenith_core::config::AppConfig;

fn fixture(root: &std::path::Path) {
    for (rel, content) in [
        ("api/package.json", r#"{"dependencies": {"express": "4"}}"#),
        ("api/README.md", "# api"),
        ("api-old/package.json", "{}"),
        ("vendor/lib/Cargo.toml", "[package]"),
    ] {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

#[test]
fn cli_flags_extend_config_options() {
    let mut cfg = AppConfig::default();
    cfg.scan.root = Some("/from/config".to_string());
    cfg.scan.undocumented_threshold = 70;

    let options = commands::scan_options(&cfg, &ScanArgs::default());
    assert_eq!(options.root, PathBuf::from("/from/config"));
    assert_eq!(options.undocumented_threshold, 70);
    assert!(options.exclusions.contains("node_modules"));

    let args = ScanArgs {
        root: Some("/from/cli".to_string()),
        exclude: vec!["vendor".to_string()],
        threshold: Some(50),
        include_hidden: true,
        ..ScanArgs::default()
    };
    let options = commands::scan_options(&cfg, &args);
    assert_eq!(options.root, PathBuf::from("/from/cli"));
    assert!(options.exclusions.contains("vendor"));
    assert!(options.exclusions.contains("node_modules"));
    assert_eq!(options.undocumented_threshold, 50);
    assert!(options.include_hidden);
}

#[tokio::test]
async fn scan_saves_report_and_writes_markdown() {
    let temp = tempdir().unwrap();
    let tree = temp.path().join("tree");
    fixture(&tree);
    let md_path = temp.path().join("report.md");

    let mut cfg = AppConfig::default();
    cfg.database.path = temp.path().join("db/zenith.db").to_string_lossy().into_owned();
    let args = ScanArgs {
        root: Some(tree.to_string_lossy().into_owned()),
        exclude: vec!["vendor".to_string()],
        markdown: Some(md_path.to_string_lossy().into_owned()),
        save: true,
        ..ScanArgs::default()
    };

    let outcome = commands::run_scan(&cfg, &args).await.unwrap();
    assert_eq!(outcome.report.total_projects, 2);
    assert_eq!(outcome.report.duplicate_groups.len(), 1);
    let scan_id = outcome.scan_id.unwrap();

    let md = fs::read_to_string(&md_path).unwrap();
    assert!(md.contains("## Duplicate groups"));
    assert!(md.contains("api-old"));

    let (id, stored) = commands::stored_report(&cfg, None).await.unwrap();
    assert_eq!(id, scan_id);
    assert_eq!(stored, outcome.report);

    let history = commands::history(&cfg, 5).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(commands::format_history(&history).starts_with(&format!("#{} ", scan_id)));

    let (undocumented, latest) = commands::stored_projects(&cfg, true).await.unwrap();
    assert_eq!(latest, Some(scan_id));
    assert_eq!(undocumented.len(), 1);
    assert_eq!(undocumented[0].name, "api-old");
    assert!(commands::format_projects(&undocumented, latest).contains("[dup 1]"));
}

#[tokio::test]
async fn missing_root_surfaces_as_error() {
    let temp = tempdir().unwrap();
    let cfg = AppConfig::default();
    let args = ScanArgs {
        root: Some(temp.path().join("absent").to_string_lossy().into_owned()),
        ..ScanArgs::default()
    };
    let err = commands::run_scan(&cfg, &args).await.err().unwrap();
    assert!(err.to_string().contains("not a readable directory"));
}

#[test]
fn text_report_lists_groups_and_undocumented() {
    let temp = tempdir().unwrap();
    fixture(temp.path());
    let report = zenith_core::scan(temp.path(), &zenith_core::default_exclusions(), 60).unwrap();
    let text = commands::format_report(&report);
    assert!(text.starts_with("scan: 3 projects"));
    assert!(text.contains("file types: .json 2, .md 1, .toml 1"));
    assert!(text.contains("duplicate group 1 (matching directory name):"));
    assert!(text.contains("undocumented (score < 60):"));
}

#[tokio::test]
async fn stored_projects_follow_the_latest_scan() {
    let temp = tempdir().unwrap();
    let tree = temp.path().join("tree");
    fixture(&tree);

    let mut cfg = AppConfig::default();
    cfg.database.path = temp.path().join("zenith.db").to_string_lossy().into_owned();
    let args = ScanArgs {
        root: Some(tree.to_string_lossy().into_owned()),
        exclude: vec!["vendor".to_string()],
        save: true,
        ..ScanArgs::default()
    };
    let first_id = commands::run_scan(&cfg, &args).await.unwrap().scan_id.unwrap();

    fs::remove_dir_all(tree.join("api-old")).unwrap();
    let rescan = ScanArgs {
        threshold: Some(70),
        ..args.clone()
    };
    let second_id = commands::run_scan(&cfg, &rescan).await.unwrap().scan_id.unwrap();

    // the configured threshold stays 60; the stored scan ran with 70
    let (undocumented, latest) = commands::stored_projects(&cfg, true).await.unwrap();
    assert_eq!(latest, Some(second_id));
    let names: Vec<_> = undocumented.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["api"]);

    let (all, latest) = commands::stored_projects(&cfg, false).await.unwrap();
    assert_eq!(all.len(), 2);
    let listing = commands::format_projects(&all, latest);
    assert!(!listing.contains("[dup"));
    assert!(listing.contains(&format!("[last seen in scan #{}]", first_id)));
}
