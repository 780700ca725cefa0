use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use configs::{AppConfig, StorageBackend};
use serde::{Deserialize, Serialize};
use service::{AppContext, Service, ServiceName, Storage};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Preferences {
    theme: String,
    page_size: u32,
}

/// Service that persists its state through the shared store.
struct PreferencesService {
    name: ServiceName,
    storage: Storage,
}

impl PreferencesService {
    fn key(&self) -> String {
        format!("{}:prefs", self.name)
    }

    fn load(&self) -> Preferences {
        self.storage.get(&self.key(), Preferences::default())
    }

    fn save(&self, prefs: &Preferences) {
        self.storage.set(&self.key(), prefs);
    }
}

static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

struct Expensive {
    name: ServiceName,
}

impl Service for Expensive {
    fn create(name: &str) -> Self {
        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        Self { name: name.into() }
    }

    fn service_name(&self) -> &str {
        self.name.as_str()
    }
}

fn file_config(tag: &str) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.storage.backend = StorageBackend::File;
    cfg.storage.path = std::env::temp_dir()
        .join(format!("app_context_{tag}_{}", uuid::Uuid::new_v4()))
        .join("storage.json");
    cfg
}

#[test]
fn service_state_survives_context_restart() -> Result<(), anyhow::Error> {
    let cfg = file_config("restart");
    let dir = cfg.storage.path.parent().map(|p| p.to_path_buf());

    let ctx = AppContext::from_config(cfg.clone())?;
    let storage = ctx.storage.clone();
    let prefs = ctx
        .registry
        .get_instance_with("settings", |n| PreferencesService { name: n.into(), storage });
    assert_eq!(prefs.load(), Preferences::default());
    prefs.save(&Preferences { theme: "dark".into(), page_size: 50 });
    ctx.shutdown();
    assert!(ctx.registry.is_empty());

    let restarted = AppContext::from_config(cfg)?;
    let storage = restarted.storage.clone();
    let prefs = restarted
        .registry
        .get_instance_with("settings", |n| PreferencesService { name: n.into(), storage });
    assert_eq!(prefs.load(), Preferences { theme: "dark".into(), page_size: 50 });

    if let Some(dir) = dir {
        let _ = std::fs::remove_dir_all(dir);
    }
    Ok(())
}

#[test]
fn corrupt_file_entry_falls_back_to_default() -> Result<(), anyhow::Error> {
    let cfg = file_config("corrupt");
    let dir = cfg.storage.path.parent().map(|p| p.to_path_buf());
    let ctx = AppContext::from_config(cfg)?;

    ctx.storage.backend().set_item("settings:prefs", "[1, 2")?;
    let storage = ctx.storage.clone();
    let prefs = ctx
        .registry
        .get_instance_with("settings", |n| PreferencesService { name: n.into(), storage });
    assert_eq!(prefs.load(), Preferences::default());

    if let Some(dir) = dir {
        let _ = std::fs::remove_dir_all(dir);
    }
    Ok(())
}

#[test]
fn concurrent_requests_share_one_instance() {
    let ctx = AppContext::in_memory();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let registry = Arc::clone(&ctx.registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.get_instance::<Expensive>("expensive")
            })
        })
        .collect();

    let instances: Vec<Arc<Expensive>> = handles.into_iter().map(|h| h.join().expect("thread")).collect();
    let first = &instances[0];
    assert!(instances.iter().all(|i| Arc::ptr_eq(i, first)));
    assert_eq!(first.service_name(), "expensive");
    assert_eq!(ctx.registry.len(), 1);
    assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 1);
}
