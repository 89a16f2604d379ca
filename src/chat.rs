//! Keyword-routed infrastructure assistant
//!
//! Messages are classified by an ordered list of case-insensitive substring
//! rules; the first rule that matches wins. Creation, scaling and query
//! intents answer from fixed templates. Everything else goes to the
//! completion backend when one is available, and to a fixed suggestions
//! string otherwise. Backend failures never reach the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::CompletionBackend;
use crate::types::ChatReply;

/// What a chat message is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Provision something new
    Creation,
    /// Change replica counts
    Scaling,
    /// Costs or status
    Query,
    /// Anything else
    Freeform,
}

/// Classification rules in priority order
const INTENT_RULES: &[(Intent, &[&str])] = &[
    (Intent::Creation, &["create", "deploy"]),
    (Intent::Scaling, &["scale"]),
    (Intent::Query, &["cost", "status", "show"]),
];

const SYSTEM_INSTRUCTION: &str = "You are an infrastructure management AI assistant. Help with:";

const FALLBACK_RESPONSE: &str = "I can help you manage your infrastructure. Try asking:\n\
- 'Create a Redis cluster with 2 nodes'\n\
- 'Scale the frontend deployment to 5 replicas'\n\
- 'Show me current costs'";

const REDIS_TERRAFORM: &str = r#"resource "aws_elasticache_cluster" "redis" {
  cluster_id           = "redis-cache"
  engine               = "redis"
  node_type            = "cache.t3.micro"
  num_cache_nodes      = 2
  parameter_group_name = "default.redis6.x"
  port                 = 6379
}"#;

const DEPLOYMENT_MANIFEST: &str = "apiVersion: apps/v1
kind: Deployment
metadata:
  name: my-app
spec:
  replicas: 3
  selector:
    matchLabels:
      app: my-app
  template:
    metadata:
      labels:
        app: my-app
    spec:
      containers:
      - name: app
        image: nginx:latest
        ports:
        - containerPort: 80";

const SCALE_COMMAND: &str = "kubectl scale deployment frontend --replicas=5";

const COST_REPORT: &str = "Current infrastructure costs:\n\
- EC2 instances: $120/month\n\
- RDS database: $85/month\n\
- S3 storage: $15/month\n\
- Total: $220/month";

const STATUS_REPORT: &str = "System status: All services running normally.\n\
- 5 active pods\n\
- CPU usage: 45%\n\
- Memory usage: 60%";

/// Classify a message using the ordered keyword rules
pub fn classify(message: &str) -> Intent {
    let lowered = message.to_lowercase();
    INTENT_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Freeform)
}

/// Build the prompt sent to the completion backend
pub fn build_prompt(message: &str, context: &str) -> String {
    let prompt = format!("{} {}", SYSTEM_INSTRUCTION, message);
    if context.is_empty() {
        prompt
    } else {
        format!("Context: {}\n\n{}", context, prompt)
    }
}

/// Answers chat messages, optionally backed by an LLM
pub struct ChatResponder {
    backend: Option<Arc<dyn CompletionBackend>>,
    available: AtomicBool,
    recheck_each_request: bool,
}

impl ChatResponder {
    /// Responder that only ever uses templates and the fixed fallback
    pub fn without_backend() -> Self {
        Self {
            backend: None,
            available: AtomicBool::new(false),
            recheck_each_request: false,
        }
    }

    /// Probe `backend` once and keep the result for the responder's lifetime
    pub async fn connect(backend: Arc<dyn CompletionBackend>, recheck_each_request: bool) -> Self {
        let available = backend.probe().await;
        if !available {
            warn!("Completion backend not available, using canned responses");
        }
        Self::with_availability(backend, available, recheck_each_request)
    }

    /// Use `backend` with an availability already known to the caller
    pub fn with_availability(
        backend: Arc<dyn CompletionBackend>,
        available: bool,
        recheck_each_request: bool,
    ) -> Self {
        Self {
            backend: Some(backend),
            available: AtomicBool::new(available),
            recheck_each_request,
        }
    }

    /// Whether freeform messages will be sent to the backend
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// Answer `message`, with optional `context` passed through to the backend
    pub async fn respond(&self, message: &str, context: &str) -> ChatReply {
        let intent = classify(message);
        debug!(?intent, "chat message classified");

        match intent {
            Intent::Creation => creation_reply(message),
            Intent::Scaling => scaling_reply(),
            Intent::Query => query_reply(message),
            Intent::Freeform => self.freeform_reply(message, context).await,
        }
    }

    async fn freeform_reply(&self, message: &str, context: &str) -> ChatReply {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return fallback_reply(),
        };

        if self.recheck_each_request {
            let available = backend.probe().await;
            self.available.store(available, Ordering::Relaxed);
        }

        if !self.is_available() {
            return fallback_reply();
        }

        match backend.generate(&build_prompt(message, context)).await {
            Ok(text) => ChatReply::text(text),
            Err(e) => {
                warn!(error = %e, "Completion backend call failed, using fallback");
                fallback_reply()
            }
        }
    }
}

fn creation_reply(message: &str) -> ChatReply {
    let lowered = message.to_lowercase();

    if lowered.contains("redis") {
        ChatReply::with_code(
            "I'll help you create a Redis cluster. Here's the Terraform configuration:",
            REDIS_TERRAFORM,
            "hcl",
        )
    } else if lowered.contains("kubernetes") || lowered.contains("deployment") {
        ChatReply::with_code(
            "Here's a Kubernetes deployment configuration:",
            DEPLOYMENT_MANIFEST,
            "yaml",
        )
    } else {
        ChatReply::text(
            "I can help you create infrastructure resources. What would you like to deploy?",
        )
    }
}

// No parameter extraction: the replica count and target are fixed.
fn scaling_reply() -> ChatReply {
    ChatReply::with_code(
        "I'll scale your deployment. Here's the command:",
        SCALE_COMMAND,
        "bash",
    )
}

fn query_reply(message: &str) -> ChatReply {
    if message.to_lowercase().contains("cost") {
        ChatReply::text(COST_REPORT)
    } else {
        ChatReply::text(STATUS_REPORT)
    }
}

fn fallback_reply() -> ChatReply {
    ChatReply::text(FALLBACK_RESPONSE)
}
