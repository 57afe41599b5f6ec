#![allow(dead_code)]

use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
};

/// Counts requests that reach a stub server.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn counted(router: Router, hits: Hits) -> Router {
    router.layer(middleware::from_fn(move |req: Request, next: Next| {
        let hits = hits.clone();
        async move {
            hits.record();
            let response: Response = next.run(req).await;
            response
        }
    }))
}

/// Serves `router` from a dedicated thread and runtime so blocking clients
/// can call it from the test thread.
pub fn spawn_blocking_stub(router: Router) -> (SocketAddr, Hits) {
    let hits = Hits::default();
    let app = counted(router, hits.clone());

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    (addr, hits)
}

/// Serves `router` on the current runtime.
pub async fn spawn_stub(router: Router) -> (SocketAddr, Hits) {
    let hits = Hits::default();
    let app = counted(router, hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, hits)
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mm-llm-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
