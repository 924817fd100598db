use std::thread;

use kvdoc::{KvBase, KvConfig};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
struct PageViews {
    total: u64,
    last_visitor: String,
}

fn main() {
    let db = KvBase::new(None, true).unwrap();
    let views = db
        .open_collection_with::<String, PageViews>("views", KvConfig::new().with_max_retries(100))
        .unwrap();

    let handles: Vec<_> = ["alice", "bob", "carol"]
        .into_iter()
        .map(|visitor| {
            let views = views.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    views
                        .put_f("/index.html".to_string(), |old| PageViews {
                            total: old.map_or(0, |v| v.total) + 1,
                            last_visitor: visitor.to_string(),
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    println!(
        "Views after concurrent updates:\n{:#?}",
        views.get_record(&"/index.html".to_string())
    );

    views.remove(&"/index.html".to_string()).unwrap();
    println!(
        "After remove:\n{:#?}",
        views.get(&"/index.html".to_string())
    );
}
