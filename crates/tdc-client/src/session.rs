//! # Query Session
//!
//! Owns both query forms and the last accepted result page for each.
//!
//! Editing goes through `&mut` on the session. Execution only needs `&self`,
//! so several executions may be in flight at once (share the session behind
//! an `Arc` and run snapshots with [`QuerySession::run_advanced`]). Within a
//! form, a newer request supersedes older ones: late responses are logged
//! and dropped, and a failed request leaves the previous page in place.

use std::time::Instant;

use tokio::sync::RwLock;
use uuid::Uuid;

use tdc_core::{PageNav, PredefinedQueries, Query, QueryEditor, ResultPage, SimpleQuery};

use crate::service::QueryService;
use crate::slot::{Outcome, RequestSlot, Ticket};
use crate::ClientError;

pub struct QuerySession<S> {
    service: S,
    editor: QueryEditor,
    simple: SimpleQuery,
    advanced_slot: RequestSlot,
    simple_slot: RequestSlot,
    advanced_page: RwLock<Option<ResultPage>>,
    simple_page: RwLock<Option<ResultPage>>,
}

impl<S: QueryService> QuerySession<S> {
    pub fn new(service: S, editor: QueryEditor) -> Self {
        Self {
            service,
            editor,
            simple: SimpleQuery::default(),
            advanced_slot: RequestSlot::new("advanced"),
            simple_slot: RequestSlot::new("simple"),
            advanced_page: RwLock::new(None),
            simple_page: RwLock::new(None),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn editor(&self) -> &QueryEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut QueryEditor {
        &mut self.editor
    }

    pub fn simple(&self) -> &SimpleQuery {
        &self.simple
    }

    pub fn simple_mut(&mut self) -> &mut SimpleQuery {
        &mut self.simple
    }

    pub async fn last_advanced(&self) -> Option<ResultPage> {
        self.advanced_page.read().await.clone()
    }

    pub async fn last_simple(&self) -> Option<ResultPage> {
        self.simple_page.read().await.clone()
    }

    pub async fn collections(&self) -> Result<Vec<String>, ClientError> {
        let names = self.service.collections().await?;
        tracing::debug!("{} collections available", names.len());
        Ok(names)
    }

    pub async fn predefined_queries(&self) -> Result<PredefinedQueries, ClientError> {
        let templates = self.service.predefined_queries().await?;
        tracing::debug!("{} predefined queries", templates.len());
        Ok(templates)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Run the advanced query as currently edited.
    pub async fn execute(&self) -> Result<Outcome<ResultPage>, ClientError> {
        self.run_advanced(self.editor.query()).await
    }

    /// Run the simple form as currently filled in.
    pub async fn execute_simple(&self) -> Result<Outcome<ResultPage>, ClientError> {
        self.run_simple(&self.simple).await
    }

    pub async fn run_advanced(&self, query: &Query) -> Result<Outcome<ResultPage>, ClientError> {
        let ticket = self.advanced_slot.issue();
        let request_id = Uuid::new_v4();
        tracing::info!(
            %request_id,
            slot = ticket.slot,
            ticket = ticket.seq,
            collection = %query.collection,
            page = query.page,
            "executing query"
        );
        let started = Instant::now();
        let result = self.service.execute(query).await;
        self.settle(
            &self.advanced_slot,
            &self.advanced_page,
            ticket,
            request_id,
            started,
            result,
        )
        .await
    }

    pub async fn run_simple(
        &self,
        query: &SimpleQuery,
    ) -> Result<Outcome<ResultPage>, ClientError> {
        let ticket = self.simple_slot.issue();
        let request_id = Uuid::new_v4();
        tracing::info!(
            %request_id,
            slot = ticket.slot,
            ticket = ticket.seq,
            collection = %query.collection,
            page = query.page,
            "executing simple query"
        );
        let started = Instant::now();
        let result = self.service.simple_query(query).await;
        self.settle(
            &self.simple_slot,
            &self.simple_page,
            ticket,
            request_id,
            started,
            result,
        )
        .await
    }

    async fn settle(
        &self,
        slot: &RequestSlot,
        store: &RwLock<Option<ResultPage>>,
        ticket: Ticket,
        request_id: Uuid,
        started: Instant,
        result: Result<ResultPage, ClientError>,
    ) -> Result<Outcome<ResultPage>, ClientError> {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        // Freshness check and store happen under one lock.
        let mut current = store.write().await;
        if !slot.is_current(ticket) {
            tracing::warn!(
                %request_id,
                slot = ticket.slot,
                ticket = ticket.seq,
                elapsed_ms,
                ok = result.is_ok(),
                "dropping stale response"
            );
            return Ok(Outcome::Superseded);
        }
        match result {
            Ok(page) => {
                tracing::info!(
                    %request_id,
                    slot = ticket.slot,
                    ticket = ticket.seq,
                    elapsed_ms,
                    rows = page.data.len(),
                    total = page.total,
                    "query completed"
                );
                *current = Some(page.clone());
                Ok(Outcome::Applied(page))
            }
            Err(e) => {
                tracing::error!(
                    %request_id,
                    slot = ticket.slot,
                    ticket = ticket.seq,
                    elapsed_ms,
                    "query failed: {}",
                    e
                );
                Err(e)
            }
        }
    }

    // =========================================================================
    // Paging
    // =========================================================================

    /// Execute the page after the last accepted advanced page. `None` when
    /// there is no such page.
    pub async fn next_page(&mut self) -> Result<Option<Outcome<ResultPage>>, ClientError> {
        let target = self.last_advanced().await.and_then(|p| PageNav::of(&p).next());
        self.goto_advanced(target).await
    }

    pub async fn prev_page(&mut self) -> Result<Option<Outcome<ResultPage>>, ClientError> {
        let target = self.last_advanced().await.and_then(|p| PageNav::of(&p).prev());
        self.goto_advanced(target).await
    }

    pub async fn next_simple_page(&mut self) -> Result<Option<Outcome<ResultPage>>, ClientError> {
        let target = self.last_simple().await.and_then(|p| PageNav::of(&p).next());
        self.goto_simple(target).await
    }

    pub async fn prev_simple_page(&mut self) -> Result<Option<Outcome<ResultPage>>, ClientError> {
        let target = self.last_simple().await.and_then(|p| PageNav::of(&p).prev());
        self.goto_simple(target).await
    }

    async fn goto_advanced(
        &mut self,
        target: Option<u32>,
    ) -> Result<Option<Outcome<ResultPage>>, ClientError> {
        let Some(page) = target else {
            return Ok(None);
        };
        let previous = self.editor.query().page;
        self.editor.set_page(page);
        match self.execute().await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                self.editor.set_page(previous);
                Err(e)
            }
        }
    }

    async fn goto_simple(
        &mut self,
        target: Option<u32>,
    ) -> Result<Option<Outcome<ResultPage>>, ClientError> {
        let Some(page) = target else {
            return Ok(None);
        };
        let previous = self.simple.page;
        self.simple.page = page;
        match self.execute_simple().await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                self.simple.page = previous;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tdc_core::SchemaRegistry;
    use tokio::sync::oneshot;

    /// Answers with the requested page. A page number can be gated so its
    /// response waits until the test releases it; page 99 always fails.
    #[derive(Default)]
    struct FakeService {
        calls: Arc<AtomicUsize>,
        gates: Mutex<HashMap<u32, oneshot::Receiver<()>>>,
    }

    impl FakeService {
        fn gate(&self, page: u32) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(page, rx);
            tx
        }

        async fn answer(&self, page: u32, total_pages: u32) -> Result<ResultPage, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.lock().unwrap().remove(&page);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if page == 99 {
                return Err(ClientError::Server {
                    status: 500,
                    message: Some("Query execution failed: boom".into()),
                });
            }
            Ok(ResultPage {
                data: vec![json!({"page": page})],
                total: u64::from(total_pages) * 10,
                page,
                limit: 10,
                total_pages,
                has_next_page: page < total_pages,
                has_prev_page: page > 1,
                execution_time: 3,
            })
        }
    }

    #[async_trait]
    impl QueryService for FakeService {
        async fn collections(&self) -> Result<Vec<String>, ClientError> {
            Ok(vec!["clients".into(), "google_findings".into()])
        }

        async fn predefined_queries(&self) -> Result<PredefinedQueries, ClientError> {
            Ok(PredefinedQueries::default())
        }

        async fn execute(&self, query: &Query) -> Result<ResultPage, ClientError> {
            self.answer(query.page, 3).await
        }

        async fn simple_query(&self, query: &SimpleQuery) -> Result<ResultPage, ClientError> {
            self.answer(query.page, 2).await
        }
    }

    fn session() -> QuerySession<FakeService> {
        let editor = QueryEditor::new(Arc::new(SchemaRegistry::builtin()));
        QuerySession::new(FakeService::default(), editor)
    }

    fn page_of(query_page: u32) -> Query {
        Query {
            page: query_page,
            ..Query::default()
        }
    }

    #[tokio::test]
    async fn test_execute_stores_result() {
        let session = session();
        let outcome = session.execute().await.unwrap();
        let page = outcome.applied().unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(session.last_advanced().await, Some(page));
        assert!(session.last_simple().await.is_none());
    }

    #[tokio::test]
    async fn test_stale_response_is_dropped() {
        let session = Arc::new(session());
        let release_slow = session.service().gate(1);
        let calls = session.service().calls.clone();

        let slow_session = session.clone();
        let slow = tokio::spawn(async move { slow_session.run_advanced(&page_of(1)).await });
        while calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }

        let fast = session.run_advanced(&page_of(2)).await.unwrap();
        assert_eq!(fast.applied().map(|p| p.page), Some(2));

        release_slow.send(()).unwrap();
        let slow = slow.await.unwrap().unwrap();
        assert!(slow.is_superseded());
        assert_eq!(session.last_advanced().await.map(|p| p.page), Some(2));
    }

    #[tokio::test]
    async fn test_slots_do_not_supersede_each_other() {
        let session = Arc::new(session());
        let release = session.service().gate(1);
        let calls = session.service().calls.clone();

        let advanced_session = session.clone();
        let advanced = tokio::spawn(async move { advanced_session.execute().await });
        while calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }

        let mut simple = SimpleQuery::default();
        simple.page = 2;
        let simple_outcome = session.run_simple(&simple).await.unwrap();
        assert!(!simple_outcome.is_superseded());

        release.send(()).unwrap();
        let advanced = advanced.await.unwrap().unwrap();
        assert_eq!(advanced.applied().map(|p| p.page), Some(1));
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_page() {
        let session = session();
        session.run_advanced(&page_of(2)).await.unwrap();

        let err = session.run_advanced(&page_of(99)).await.unwrap_err();
        assert_eq!(
            err.user_message("Query execution failed"),
            "Query execution failed: boom"
        );
        assert_eq!(session.last_advanced().await.map(|p| p.page), Some(2));
    }

    #[tokio::test]
    async fn test_paging_follows_last_result() {
        let mut session = session();
        assert!(session.next_page().await.unwrap().is_none());

        session.execute().await.unwrap();
        let next = session.next_page().await.unwrap().unwrap();
        assert_eq!(next.applied().map(|p| p.page), Some(2));
        assert_eq!(session.editor().query().page, 2);

        session.next_page().await.unwrap();
        assert_eq!(session.editor().query().page, 3);
        assert!(session.next_page().await.unwrap().is_none());

        let prev = session.prev_page().await.unwrap().unwrap();
        assert_eq!(prev.applied().map(|p| p.page), Some(2));
    }

    #[tokio::test]
    async fn test_simple_paging() {
        let mut session = session();
        session.execute_simple().await.unwrap();
        assert!(session.prev_simple_page().await.unwrap().is_none());

        session.next_simple_page().await.unwrap();
        assert_eq!(session.simple().page, 2);
        assert_eq!(session.last_simple().await.map(|p| p.page), Some(2));
        assert!(session.next_simple_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_page_turn_restores_page() {
        let mut session = session();
        session.simple_mut().page = 98;
        *session.simple_page.write().await = Some(ResultPage {
            page: 98,
            total_pages: 100,
            has_next_page: true,
            ..ResultPage::default()
        });

        assert!(session.next_simple_page().await.is_err());
        assert_eq!(session.simple().page, 98);
        assert_eq!(session.last_simple().await.map(|p| p.page), Some(98));
    }
}
