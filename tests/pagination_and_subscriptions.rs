//! Pagination edge cases and subscriber fan-out, exercised through
//! `PaginatedStore` directly (no `Client` indirection needed for these).

use async_trait::async_trait;
use opkit::modifiers::StoreOptions;
use opkit::{Context, Continuation, Path, PaginatedQuery};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

mod support {
    use super::*;

    pub struct Feed {
        pub calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl PaginatedQuery for Feed {
        type PageId = u32;
        type PageValue = Vec<u32>;
        type Failure = String;

        fn path(&self) -> Path {
            Path::from_token("feed")
        }

        fn next_page_id(&self, pages: &opkit::state::Pages<u32, Vec<u32>>, _context: &Context) -> Option<u32> {
            pages.last().map(|p| p.page_id + 1)
        }

        fn previous_page_id(&self, pages: &opkit::state::Pages<u32, Vec<u32>>, _context: &Context) -> Option<u32> {
            pages.first().and_then(|p| p.page_id.checked_sub(1))
        }

        async fn fetch_page(
            &self,
            page_id: Option<u32>,
            _context: Context,
            _continuation: &Continuation<Vec<u32>, String>,
        ) -> Result<(u32, Vec<u32>), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let id = page_id.unwrap_or(5);
            Ok((id, vec![id]))
        }
    }
}

use opkit::store::PaginatedStore;
use support::Feed;

#[tokio::test]
async fn first_page_id_is_resolved_by_the_operation_not_guessed_by_the_store() {
    // `next_page_id` returns `None` on an empty page list, so the store asks
    // the operation to fetch with `page_id: None`; `Feed` resolves that to 5
    // rather than 0, and the store must report whatever id the operation chose.
    let store = PaginatedStore::new(
        Feed { calls: Arc::new(AtomicU32::new(0)) },
        StoreOptions::new(),
    );
    let status = store.fetch_next_page(Context::new()).await;
    let pages = status.success().expect("first page fetch succeeds");
    assert_eq!(pages.first().unwrap().page_id, 5);
}

#[tokio::test]
async fn previous_page_fetch_prepends_without_disturbing_existing_pages() {
    let store = PaginatedStore::new(
        Feed { calls: Arc::new(AtomicU32::new(0)) },
        StoreOptions::new(),
    );
    store.fetch_next_page(Context::new()).await; // page 5
    store.fetch_next_page(Context::new()).await; // page 6
    let status = store.fetch_previous_page(Context::new()).await;
    let pages = status.success().expect("previous page fetch succeeds");
    assert_eq!(pages.len(), 3);
    assert_eq!(pages.first().unwrap().page_id, 4);
    assert_eq!(pages.last().unwrap().page_id, 6);
}

#[tokio::test]
async fn subscribers_see_every_page_fetch() {
    let store = PaginatedStore::new(
        Feed { calls: Arc::new(AtomicU32::new(0)) },
        StoreOptions::new(),
    );
    let notifications = Arc::new(AtomicU32::new(0));
    let counter = notifications.clone();
    let _subscription = store.subscribe(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.fetch_next_page(Context::new()).await;
    store.fetch_next_page(Context::new()).await;
    tokio::task::yield_now().await;

    assert!(notifications.load(Ordering::SeqCst) >= 2);
}
