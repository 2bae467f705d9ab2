use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::client::ResearchService;
use crate::data_models::Query;
use crate::error::ClientError;
use crate::renderer::SummaryRenderer;
use crate::view::{PageState, ResultView};

/// Where a submission's outcome ends up. The desk is the only caller.
pub trait DisplaySurface: Send + Sync {
    /// Hides the previous result and error.
    fn reset(&self);
    fn set_busy(&self, busy: bool);
    fn show_results(&self, view: &ResultView);
    fn show_error(&self, message: &str);
}

/// Clears the surface's busy state on drop.
struct BusyScope<'a> {
    surface: &'a dyn DisplaySurface,
}

impl<'a> BusyScope<'a> {
    fn enter(surface: &'a dyn DisplaySurface) -> Self {
        surface.set_busy(true);
        Self { surface }
    }
}

impl Drop for BusyScope<'_> {
    fn drop(&mut self) {
        self.surface.set_busy(false);
    }
}

/// Drives one submission end to end: validate, mark busy, query, render.
pub struct ResearchDesk {
    service: Arc<dyn ResearchService>,
    renderer: Arc<dyn SummaryRenderer>,
}

impl ResearchDesk {
    pub fn new(service: Arc<dyn ResearchService>, renderer: Arc<dyn SummaryRenderer>) -> Self {
        Self { service, renderer }
    }

    pub async fn search(
        &self,
        raw: &str,
        surface: &dyn DisplaySurface,
    ) -> Result<ResultView, ClientError> {
        surface.reset();

        let query = match Query::parse(raw) {
            Ok(query) => query,
            Err(e) => {
                surface.show_error(&e.to_string());
                return Err(e);
            }
        };

        let outcome = {
            let _busy = BusyScope::enter(surface);
            self.service.research(&query).await
        };

        match outcome {
            Ok(result) => {
                let view = ResultView::build(&result, self.renderer.as_ref());
                surface.show_results(&view);
                Ok(view)
            }
            Err(e) => {
                surface.show_error(&e.to_string());
                Err(e)
            }
        }
    }
}

/// Prints results to stdout and status/errors to stderr.
#[derive(Debug, Default)]
pub struct TerminalSurface;

impl DisplaySurface for TerminalSurface {
    fn reset(&self) {}

    fn set_busy(&self, busy: bool) {
        if busy {
            eprintln!("Researching...");
        }
    }

    fn show_results(&self, view: &ResultView) {
        let mut stdout = std::io::stdout().lock();
        let written = writeln!(
            stdout,
            "{}\n\n<!-- sources -->\n{}\n\n<!-- stats -->\n{}",
            view.summary_html, view.sources_html, view.stats_html
        );
        if let Err(e) = written {
            tracing::error!("failed to write results: {e}");
        }
    }

    fn show_error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

/// Collects the outcome into a [`PageState`] for server-side rendering.
#[derive(Debug, Default)]
pub struct PageSurface {
    state: Mutex<PageState>,
}

impl PageSurface {
    pub fn new(query: &str) -> Self {
        Self {
            state: Mutex::new(PageState {
                query: query.to_string(),
                ..PageState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> PageState {
        self.state().clone()
    }
}

impl DisplaySurface for PageSurface {
    fn reset(&self) {
        let mut state = self.state();
        state.error = None;
        state.results = None;
    }

    fn set_busy(&self, busy: bool) {
        self.state().busy = busy;
    }

    fn show_results(&self, view: &ResultView) {
        self.state().results = Some(view.clone());
    }

    fn show_error(&self, message: &str) {
        self.state().error = Some(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::ResearchResult;
    use crate::renderer::StructuredRenderer;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Reset,
        Busy(bool),
        Results,
        Error(String),
    }

    #[derive(Default)]
    struct RecordingSurface {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingSurface {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl DisplaySurface for RecordingSurface {
        fn reset(&self) {
            self.events.lock().unwrap().push(Event::Reset);
        }
        fn set_busy(&self, busy: bool) {
            self.events.lock().unwrap().push(Event::Busy(busy));
        }
        fn show_results(&self, _view: &ResultView) {
            self.events.lock().unwrap().push(Event::Results);
        }
        fn show_error(&self, message: &str) {
            self.events.lock().unwrap().push(Event::Error(message.to_string()));
        }
    }

    struct StubService {
        calls: AtomicUsize,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl ResearchService for StubService {
        async fn research(&self, query: &Query) -> Result<ResearchResult, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(message) => Err(ClientError::Service(message.clone())),
                None => Ok(ResearchResult {
                    summary: format!("About *{query}*"),
                    sources: Vec::new(),
                    word_count: 2,
                    processing_time: 0.5,
                }),
            }
        }
    }

    fn make_desk(fail_with: Option<&str>) -> (ResearchDesk, Arc<StubService>) {
        let service = Arc::new(StubService {
            calls: AtomicUsize::new(0),
            fail_with: fail_with.map(str::to_string),
        });
        let desk = ResearchDesk::new(service.clone(), Arc::new(StructuredRenderer));
        (desk, service)
    }

    #[tokio::test]
    async fn test_blank_query_never_marks_busy() {
        let (desk, service) = make_desk(None);
        let surface = RecordingSurface::default();

        let err = desk.search("   ", &surface).await.unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            surface.events(),
            vec![
                Event::Reset,
                Event::Error("Please enter a research query".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_success_toggles_busy_around_call() {
        let (desk, service) = make_desk(None);
        let surface = RecordingSurface::default();

        let view = desk.search(" tokio ", &surface).await.unwrap();

        assert_eq!(view.summary_html, "<p>About <em>tokio</em></p>");
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            surface.events(),
            vec![Event::Reset, Event::Busy(true), Event::Busy(false), Event::Results]
        );
    }

    #[tokio::test]
    async fn test_service_error_is_shown_and_busy_cleared() {
        let (desk, _service) = make_desk(Some("quota exceeded"));
        let surface = RecordingSurface::default();

        let err = desk.search("tokio", &surface).await.unwrap_err();

        assert_eq!(err.to_string(), "quota exceeded");
        assert_eq!(
            surface.events(),
            vec![
                Event::Reset,
                Event::Busy(true),
                Event::Busy(false),
                Event::Error("quota exceeded".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_page_surface_replaces_previous_outcome() {
        let (desk, _service) = make_desk(None);
        let surface = PageSurface::new("tokio");
        surface.show_error("old error");

        desk.search("tokio", &surface).await.unwrap();

        let state = surface.snapshot();
        assert!(!state.busy);
        assert!(state.error.is_none());
        assert!(state.results.is_some());
        assert_eq!(state.query, "tokio");
    }
}
