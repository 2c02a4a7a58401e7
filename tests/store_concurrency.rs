use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use taskdesk::error::Error;
use taskdesk::lock::{lock_path_for, FileLock};
use taskdesk::model::{Assignment, TaskDraft};
use taskdesk::provider::DataProvider;
use taskdesk::storage::Storage;
use taskdesk::store::FileStore;
use tempfile::TempDir;

fn draft(title: String) -> TaskDraft {
    TaskDraft {
        title,
        description: None,
        deadline: NaiveDate::from_ymd_opt(2030, 1, 1).expect("date"),
        assignment: Assignment::Department("Vendas".into()),
        checklist: vec!["a".to_string(), "b".to_string()],
    }
}

#[test]
fn concurrent_writers_lose_no_tasks() {
    let dir = TempDir::new().expect("tempdir");
    Storage::new(dir.path()).init().expect("init");
    let root = Arc::new(dir.path().to_path_buf());

    let handles: Vec<_> = (0..4)
        .map(|writer| {
            let root = Arc::clone(&root);
            thread::spawn(move || {
                let store = FileStore::open(root.as_path());
                for n in 0..5 {
                    store
                        .create_task(&draft(format!("w{writer}-{n}")), "boss")
                        .expect("create task");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let store = FileStore::open(root.as_path());
    let tasks = store.list_tasks().expect("tasks");
    assert_eq!(tasks.len(), 20);
    let titles: HashSet<&str> = tasks.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles.len(), 20);
    assert_eq!(store.list_all_checklist_items().expect("items").len(), 40);
    assert_eq!(store.load_events().expect("events").len(), 20);

    let rebuilt = store.rebuild().expect("rebuild");
    assert_eq!(rebuilt.tasks, tasks);
}

#[test]
fn held_lock_blocks_commits() {
    let dir = TempDir::new().expect("tempdir");
    let storage = Storage::new(dir.path());
    storage.init().expect("init");
    let store = FileStore::new(storage.clone());

    let _held = FileLock::acquire(lock_path_for(&storage.tasks_log()), 1000).expect("hold lock");
    let err = store
        .create_task(&draft("blocked".to_string()), "boss")
        .expect_err("lock is held");
    assert!(matches!(err, Error::LockFailed(_)));
    assert_eq!(err.exit_code(), 4);
    assert!(store.list_tasks().expect("tasks").is_empty());
}
