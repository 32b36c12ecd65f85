//! HTTP surface: REST endpoint plus the embedded dashboard page

use crate::provider::Completer;
use crate::session::{Session, Topic};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// API state shared across handlers
pub struct ApiState {
    pub completer: Arc<dyn Completer>,
}

/// Request to generate an answer for one panel
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Which panel the question was asked on
    pub topic: Topic,
    /// The citizen's question
    pub prompt: String,
}

/// Response carrying the generated answer
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// The model output, verbatim
    pub answer: String,
    /// Model that served the request
    pub model_id: String,
    /// Wall-clock time for the completion call (ms)
    pub duration_ms: u64,
}

/// Error body for failed generate calls
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
    pub models: ModelsInfo,
}

/// Topic→model mapping as reported by /health
#[derive(Debug, Serialize)]
pub struct ModelsInfo {
    pub insights: String,
    pub services: String,
}

/// Query parameters accepted by the dashboard page
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub section: Option<Topic>,
}

/// Create the API router
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/generate", post(generate))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the dashboard page with the requested panel active
async fn dashboard(Query(params): Query<PageParams>) -> Html<String> {
    let session = match params.section {
        Some(topic) => Session::new().select(topic),
        None => Session::new(),
    };
    Html(render_dashboard(session))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.completer.name().to_string(),
        models: ModelsInfo {
            insights: state.completer.model_for(Topic::Insights).to_string(),
            services: state.completer.model_for(Topic::Services).to_string(),
        },
    })
}

/// Generate an answer for a panel.
///
/// Blank prompts are rejected here, before the backend is touched; backend
/// failures are surfaced for this one action and leave the page usable.
async fn generate(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.prompt.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: validation_message(request.topic).to_string(),
            }),
        ));
    }

    info!(
        topic = %request.topic,
        chars = request.prompt.len(),
        "Forwarding prompt to completion backend"
    );

    match state.completer.generate(request.topic, &request.prompt).await {
        Ok(completion) => Ok(Json(GenerateResponse {
            answer: completion.text,
            model_id: completion.model_id,
            duration_ms: completion.duration_ms,
        })),
        Err(e) => {
            warn!(topic = %request.topic, error = %e, "Completion request failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Validation warning shown when a panel's submission is blank
fn validation_message(topic: Topic) -> &'static str {
    match topic {
        Topic::Insights => "Please enter a question.",
        Topic::Services => "Please describe your request.",
    }
}

/// Single-locale string table feeding the rendered page
struct Strings {
    title: &'static str,
    subtitle: &'static str,
    insights_label: &'static str,
    services_label: &'static str,
    footer: &'static str,
}

const EN: Strings = Strings {
    title: "🌆 Citizen Dashboard",
    subtitle: "Explore insights about your city.",
    insights_label: "🧠 City Insights",
    services_label: "🚑 Public Services",
    footer: "© 2025 Citizen Dashboard | Powered by watsonx.ai",
};

fn render_dashboard(session: Session) -> String {
    DASHBOARD_HTML
        .replace("__TITLE__", EN.title)
        .replace("__SUBTITLE__", EN.subtitle)
        .replace("__INSIGHTS_LABEL__", EN.insights_label)
        .replace("__SERVICES_LABEL__", EN.services_label)
        .replace("__FOOTER__", EN.footer)
        .replace("__ACTIVE_SECTION__", session.current_section().as_str())
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>__TITLE__</title>
    <style>
        :root {
            --bg: #f4f6f9;
            --panel: #ffffff;
            --blue: #3498db;
            --blue-dark: #2980b9;
            --blue-card: #ebf5fb;
            --blue-hover: #def8ff;
            --green: #2ecc71;
            --green-dark: #27ae60;
            --green-card: #ecf5eb;
            --heading: #2c3e50;
            --label: #34495e;
            --muted: #7f8c8d;
            --warning: #b9770e;
            --error: #c0392b;
        }
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body {
            background: var(--bg);
            color: var(--heading);
            font-family: 'Segoe UI', sans-serif;
            min-height: 100vh;
            padding: 30px 20px;
        }
        .container { max-width: 900px; margin: 0 auto; }
        h1 { text-align: center; }
        .subtitle {
            text-align: center;
            font-size: 16px;
            margin-top: 8px;
            color: var(--label);
        }
        .navbar {
            display: flex;
            justify-content: center;
            gap: 20px;
            padding: 15px 0;
            margin-bottom: 25px;
        }
        .nav-button {
            background: var(--panel);
            color: var(--blue);
            border: 2px solid var(--blue);
            width: 180px;
            height: 50px;
            font-size: 16px;
            border-radius: 8px;
            cursor: pointer;
            transition: all 0.3s ease;
        }
        .nav-button:hover {
            background: var(--blue-hover);
            transform: scale(1.05);
        }
        .nav-button.active {
            background: var(--blue);
            color: var(--panel);
        }
        .card {
            display: none;
            padding: 20px;
            border-radius: 10px;
            box-shadow: 0 2px 8px rgba(0,0,0,0.05);
            margin: 20px 0;
        }
        .card.active { display: block; }
        .card-blue { background: var(--blue-card); border-left: 6px solid var(--blue-dark); }
        .card-green { background: var(--green-card); border-left: 6px solid var(--green-dark); }
        .card h2 { margin-bottom: 15px; }
        label {
            display: block;
            font-weight: bold;
            color: var(--label);
            margin-bottom: 8px;
        }
        textarea {
            width: 100%;
            height: 90px;
            background: var(--panel);
            border: 1px solid var(--muted);
            border-radius: 8px;
            padding: 12px;
            font-family: inherit;
            font-size: 0.95rem;
            resize: vertical;
        }
        textarea:focus { outline: none; border-color: var(--blue-dark); }
        .submit-button {
            border: none;
            color: white;
            padding: 10px 20px;
            font-size: 14px;
            border-radius: 8px;
            cursor: pointer;
            margin-top: 12px;
        }
        .submit-button:disabled { opacity: 0.5; cursor: not-allowed; }
        .submit-blue { background: var(--blue); }
        .submit-blue:hover { background: var(--blue-dark); }
        .submit-green { background: var(--green); }
        .submit-green:hover { background: var(--green-dark); }
        .warning {
            display: none;
            color: var(--warning);
            margin-top: 10px;
            font-size: 0.9rem;
        }
        .error-box {
            color: var(--error);
            margin-top: 10px;
            font-size: 0.9rem;
        }
        .ai-analysis {
            display: none;
            background: var(--panel);
            border-radius: 8px;
            padding: 15px;
            margin-top: 15px;
            line-height: 1.5;
        }
        .answer-meta {
            font-size: 0.75rem;
            color: var(--muted);
            margin-top: 6px;
        }
        .footer {
            text-align: center;
            font-size: 14px;
            margin-top: 40px;
            color: var(--muted);
        }
    </style>
</head>
<body data-section="__ACTIVE_SECTION__">
    <div class="container">
        <h1>__TITLE__</h1>
        <p class="subtitle">__SUBTITLE__</p>

        <div class="navbar">
            <button class="nav-button" id="nav-insights" onclick="selectSection('insights')">__INSIGHTS_LABEL__</button>
            <button class="nav-button" id="nav-services" onclick="selectSection('services')">__SERVICES_LABEL__</button>
        </div>

        <div class="card card-blue" id="card-insights">
            <h2>__INSIGHTS_LABEL__</h2>
            <label for="prompt-insights">Ask something about the city:</label>
            <textarea id="prompt-insights" placeholder="e.g., What's the traffic like today?"></textarea>
            <button class="submit-button submit-blue" id="submit-insights" onclick="submitPrompt('insights')">🔍 Get Insight</button>
            <p class="warning" id="warning-insights">Please enter a question.</p>
            <p class="error-box" id="error-insights"></p>
            <div class="ai-analysis" id="answer-insights"></div>
            <p class="answer-meta" id="meta-insights"></p>
        </div>

        <div class="card card-green" id="card-services">
            <h2>__SERVICES_LABEL__</h2>
            <label for="prompt-services">What would you like to know about public services?</label>
            <textarea id="prompt-services" placeholder="e.g., Where is the nearest hospital?"></textarea>
            <button class="submit-button submit-green" id="submit-services" onclick="submitPrompt('services')">🏥 Find Service</button>
            <p class="warning" id="warning-services">Please describe your request.</p>
            <p class="error-box" id="error-services"></p>
            <div class="ai-analysis" id="answer-services"></div>
            <p class="answer-meta" id="meta-services"></p>
        </div>

        <p class="footer">__FOOTER__</p>
    </div>

    <script>
        function selectSection(topic) {
            for (const t of ['insights', 'services']) {
                document.getElementById('card-' + t).classList.toggle('active', t === topic);
                document.getElementById('nav-' + t).classList.toggle('active', t === topic);
            }
            const url = new URL(window.location);
            url.searchParams.set('section', topic);
            history.replaceState(null, '', url);
        }

        async function submitPrompt(topic) {
            const prompt = document.getElementById('prompt-' + topic).value;
            const warning = document.getElementById('warning-' + topic);
            const errorBox = document.getElementById('error-' + topic);
            const answer = document.getElementById('answer-' + topic);
            const meta = document.getElementById('meta-' + topic);
            const button = document.getElementById('submit-' + topic);

            warning.style.display = 'none';
            errorBox.textContent = '';

            if (!prompt.trim()) {
                warning.style.display = 'block';
                return;
            }

            button.disabled = true;
            try {
                const res = await fetch('/api/generate', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({ topic: topic, prompt: prompt })
                });
                const data = await res.json();
                if (!res.ok) {
                    errorBox.textContent = data.error || ('Request failed with HTTP ' + res.status);
                    return;
                }
                // Completion text is rendered verbatim as markup.
                answer.innerHTML = data.answer;
                answer.style.display = 'block';
                meta.textContent = data.model_id + ' · ' + data.duration_ms + ' ms';
            } catch (err) {
                errorBox.textContent = 'Could not reach the dashboard server: ' + err.message;
            } finally {
                button.disabled = false;
            }
        }

        selectSection(document.body.dataset.section);
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Completion, ProviderError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records invocations; answers with a fixed string or a fixed failure.
    struct StubCompleter {
        calls: AtomicUsize,
        last_topic: Mutex<Option<Topic>>,
        answer: Option<String>,
    }

    impl StubCompleter {
        fn answering(answer: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_topic: Mutex::new(None),
                answer: Some(answer.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_topic: Mutex::new(None),
                answer: None,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Completer for StubCompleter {
        fn name(&self) -> &str {
            "stub"
        }

        fn model_for(&self, topic: Topic) -> &str {
            match topic {
                Topic::Insights => "stub/insights-model",
                Topic::Services => "stub/services-model",
            }
        }

        async fn generate(
            &self,
            topic: Topic,
            _prompt: &str,
        ) -> Result<Completion, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_topic.lock().unwrap() = Some(topic);
            match &self.answer {
                Some(text) => Ok(Completion {
                    text: text.clone(),
                    model_id: self.model_for(topic).to_string(),
                    usage: None,
                    duration_ms: 7,
                }),
                None => Err(ProviderError::Upstream("HTTP 500: internal".to_string())),
            }
        }
    }

    fn state_with(stub: Arc<StubCompleter>) -> Arc<ApiState> {
        Arc::new(ApiState { completer: stub })
    }

    #[tokio::test]
    async fn test_dashboard_defaults_to_insights() {
        let Html(page) = dashboard(Query(PageParams { section: None })).await;
        assert!(page.contains("data-section=\"insights\""));
        assert!(page.contains("Citizen Dashboard"));
        assert!(page.contains("Explore insights about your city."));
    }

    #[tokio::test]
    async fn test_dashboard_honors_section_parameter() {
        let Html(page) = dashboard(Query(PageParams {
            section: Some(Topic::Services),
        }))
        .await;
        assert!(page.contains("data-section=\"services\""));
    }

    #[tokio::test]
    async fn test_blank_prompt_makes_no_outbound_call() {
        let stub = Arc::new(StubCompleter::answering("unused"));
        let state = state_with(stub.clone());

        for topic in [Topic::Insights, Topic::Services] {
            let result = generate(
                State(state.clone()),
                Json(GenerateRequest {
                    topic,
                    prompt: "  ".to_string(),
                }),
            )
            .await;

            let (status, Json(body)) = result.expect_err("blank prompt must be rejected");
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body.error, validation_message(topic));
        }

        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_passes_prompt_through() {
        let stub = Arc::new(StubCompleter::answering("Traffic is light downtown."));
        let state = state_with(stub.clone());

        let result = generate(
            State(state),
            Json(GenerateRequest {
                topic: Topic::Insights,
                prompt: "What's the traffic like today?".to_string(),
            }),
        )
        .await;

        let Json(body) = result.expect("stubbed completion must succeed");
        assert_eq!(body.answer, "Traffic is light downtown.");
        assert_eq!(body.model_id, "stub/insights-model");
        assert_eq!(stub.call_count(), 1);
        assert_eq!(*stub.last_topic.lock().unwrap(), Some(Topic::Insights));
    }

    #[tokio::test]
    async fn test_generate_uses_topic_keyed_model() {
        let stub = Arc::new(StubCompleter::answering("The nearest hospital is on Main St."));
        let state = state_with(stub.clone());

        let result = generate(
            State(state),
            Json(GenerateRequest {
                topic: Topic::Services,
                prompt: "Where is the nearest hospital?".to_string(),
            }),
        )
        .await;

        let Json(body) = result.expect("stubbed completion must succeed");
        assert_eq!(body.model_id, "stub/services-model");
        assert_eq!(*stub.last_topic.lock().unwrap(), Some(Topic::Services));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_surfaced_not_fatal() {
        let stub = Arc::new(StubCompleter::failing());
        let state = state_with(stub.clone());

        let result = generate(
            State(state),
            Json(GenerateRequest {
                topic: Topic::Insights,
                prompt: "What's the traffic like today?".to_string(),
            }),
        )
        .await;

        let (status, Json(body)) = result.expect_err("stub failure must surface");
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.error.contains("HTTP 500"));
        assert_eq!(stub.call_count(), 1);

        // The failure is local to the submit action: the page still renders
        // with the selector untouched.
        let Html(page) = dashboard(Query(PageParams { section: None })).await;
        assert!(page.contains("data-section=\"insights\""));
    }

    #[tokio::test]
    async fn test_health_reports_provider_and_models() {
        let stub = Arc::new(StubCompleter::answering("unused"));
        let state = state_with(stub);

        let Json(health) = health_check(State(state)).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.provider, "stub");
        assert_eq!(health.models.insights, "stub/insights-model");
        assert_eq!(health.models.services, "stub/services-model");
    }

    #[test]
    fn test_validation_messages_match_panels() {
        assert_eq!(validation_message(Topic::Insights), "Please enter a question.");
        assert_eq!(validation_message(Topic::Services), "Please describe your request.");
    }
}
