use std::fs::{self, File};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use terminal_secrets::audit::{cleanup_rotated, AuditEvent, AuditLog, AuditOptions};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn rotated_files(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("audit.log."))
        .collect();
    names.sort();
    names
}

#[test]
fn rotates_when_size_threshold_is_reached() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.log");
    let mut log = AuditLog::open(AuditOptions {
        enabled: true,
        path: path.clone(),
        max_bytes: 256,
        max_age: 90 * DAY,
    });
    log.set_user("alice@local");

    for n in 0..6 {
        log.secret_reveal("demo", &format!("team/api/secret-{n}"), "1", None);
    }
    log.close();

    let rotated = rotated_files(&dir);
    assert!(!rotated.is_empty(), "expected at least one rotated file");
    assert!(path.exists());

    // Nothing is lost across rotations and every line stays a full record.
    let mut total = 0;
    for name in rotated.iter().map(String::as_str).chain(["audit.log"]) {
        let raw = fs::read_to_string(dir.path().join(name)).unwrap();
        for line in raw.lines() {
            let event: AuditEvent = serde_json::from_str(line).unwrap();
            assert_eq!(event.user, "alice@local");
            total += 1;
        }
    }
    assert_eq!(total, 6);
}

#[test]
fn rotation_happens_once_when_the_threshold_is_crossed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.log");
    let max_bytes = 1024;
    let mut log = AuditLog::open(AuditOptions {
        enabled: true,
        path: path.clone(),
        max_bytes,
        max_age: 90 * DAY,
    });
    log.set_user("alice@local");

    let len_of = |path: &std::path::Path| fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let mut writes = 0;
    loop {
        let before = len_of(&path);
        log.secret_copy("demo", "team/api/token", "1", None);
        writes += 1;
        assert!(writes < 100, "threshold never reached");

        let rotated = rotated_files(&dir);
        if rotated.is_empty() {
            assert!(len_of(&path) < max_bytes);
            continue;
        }
        // The crossing write is the one that rotated, and only once.
        assert!(before < max_bytes);
        assert_eq!(rotated.len(), 1);
        assert!(len_of(&dir.path().join(&rotated[0])) >= max_bytes);
        assert_eq!(len_of(&path), 0);
        break;
    }

    log.secret_copy("demo", "team/api/token", "2", None);
    log.close();
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);
    assert_eq!(rotated_files(&dir).len(), 1);
}

#[test]
fn retention_removes_only_expired_rotated_files() {
    let dir = TempDir::new().unwrap();
    let now = SystemTime::now();

    let old = dir.path().join("audit.log.20200101-000000");
    let recent = dir.path().join("audit.log.20990101-000000");
    let active = dir.path().join("audit.log");
    let unrelated = dir.path().join("other.log.20200101-000000");
    for path in [&old, &recent, &active, &unrelated] {
        fs::write(path, b"{}\n").unwrap();
    }
    let backdate = now - 100 * DAY;
    for path in [&old, &active, &unrelated] {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(backdate)
            .unwrap();
    }

    let removed = cleanup_rotated(dir.path(), "audit.log", 90 * DAY, now);
    assert_eq!(removed, 1);
    assert!(!old.exists());
    assert!(recent.exists());
    assert!(active.exists());
    assert!(unrelated.exists());
}

#[test]
fn reconfigure_switches_target_and_keeps_user() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.log");
    let second = dir.path().join("nested").join("second.log");
    let options = |path| AuditOptions {
        enabled: true,
        path,
        max_bytes: 0,
        max_age: 90 * DAY,
    };

    let mut log = AuditLog::open(options(first.clone()));
    log.set_user("bob@local");
    log.session_start("demo");
    log.reconfigure(options(second.clone()));
    log.session_end("demo");
    log.close();

    assert_eq!(fs::read_to_string(&first).unwrap().lines().count(), 1);
    let raw = fs::read_to_string(&second).unwrap();
    let event: AuditEvent = serde_json::from_str(raw.trim()).unwrap();
    assert_eq!(event.user, "bob@local");
}
