//! Implementation of the `bistro post` and `bistro reply` commands.
//!
//! Both build a typed request from their arguments and hand it to the
//! orchestrator with an Ollama client. The generated text is printed as a
//! JSON object keyed by the request type (`caption` or `reply`).

use crate::cli::{PostArgs, ReplyArgs};
use bistro::context::AppContext;
use bistro::error::{BistroError, Result};
use bistro::generation::{GenerationClient, OllamaClient};
use bistro::history::HistoryStore;
use bistro::orchestrator::{GenerationOutcome, GenerationRequest, Orchestrator, Persistence};
use bistro::template::TemplateStore;
use bistro::uploads;
use std::sync::Arc;

/// Execute the `bistro post` command.
pub fn cmd_post(ctx: &AppContext, args: PostArgs) -> Result<()> {
    let client = OllamaClient::from_config(&ctx.config)?;
    let outcome = run_post(ctx, client, args).inspect_err(|e| print_backend_hint(ctx, e))?;
    print_outcome(&outcome)
}

/// Execute the `bistro reply` command.
pub fn cmd_reply(ctx: &AppContext, args: ReplyArgs) -> Result<()> {
    let client = OllamaClient::from_config(&ctx.config)?;
    let outcome = run_reply(ctx, client, args).inspect_err(|e| print_backend_hint(ctx, e))?;
    print_outcome(&outcome)
}

fn run_post<C: GenerationClient>(
    ctx: &AppContext,
    client: C,
    args: PostArgs,
) -> Result<GenerationOutcome> {
    let image_reference = match &args.image {
        Some(source) => {
            let stored = uploads::store_image(&ctx.uploads_dir(), source)?;
            Some(ctx.relative_to_data_dir(&stored).display().to_string())
        }
        None => None,
    };

    let request = GenerationRequest::SocialPost {
        dish_name: args.dish_name,
        theme: args.theme,
        tone: args.tone,
        image_reference,
    };
    orchestrator(ctx, client).generate(&request)
}

fn run_reply<C: GenerationClient>(
    ctx: &AppContext,
    client: C,
    args: ReplyArgs,
) -> Result<GenerationOutcome> {
    let request = GenerationRequest::ReviewReply {
        review_text: args.review_text,
        sentiment: args.sentiment,
        tone: args.tone,
    };
    orchestrator(ctx, client).generate(&request)
}

fn orchestrator<C: GenerationClient>(ctx: &AppContext, client: C) -> Orchestrator<C> {
    Orchestrator::new(
        TemplateStore::new(ctx.templates_dir()),
        client,
        Arc::new(HistoryStore::from_context(ctx)),
        ctx.config.model_id.clone(),
    )
}

fn print_backend_hint(ctx: &AppContext, err: &BistroError) {
    if let Some(hint) = backend_hint(ctx, err) {
        eprintln!("Hint: {}", hint);
    }
}

fn backend_hint(ctx: &AppContext, err: &BistroError) -> Option<String> {
    err.is_backend().then(|| {
        format!(
            "check that Ollama is running at {} and that the model is pulled: ollama pull {}",
            ctx.config.backend.base_url, ctx.config.model_id
        )
    })
}

fn print_outcome(outcome: &GenerationOutcome) -> Result<()> {
    let body = serde_json::to_string_pretty(&outcome.response_json())
        .map_err(|e| BistroError::UserError(format!("failed to format response: {}", e)))?;
    println!("{}", body);

    if let Persistence::Failed(e) = &outcome.persistence {
        eprintln!("Warning: the result was not saved to history: {}", e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro::history::EntryType;
    use bistro::template::{DEFAULT_REVIEW_REPLY_TEMPLATE, DEFAULT_SOCIAL_POST_TEMPLATE};
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Echoes a fixed reply and remembers the last prompt.
    struct FixedClient {
        reply: &'static str,
        last_prompt: Mutex<Option<String>>,
    }

    impl FixedClient {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                last_prompt: Mutex::new(None),
            }
        }
    }

    impl GenerationClient for FixedClient {
        fn generate(&self, _model_id: &str, prompt: &str) -> Result<String> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok(self.reply.to_string())
        }
    }

    struct DownClient;

    impl GenerationClient for DownClient {
        fn generate(&self, _model_id: &str, _prompt: &str) -> Result<String> {
            Err(BistroError::BackendUnavailable("connection refused".to_string()))
        }
    }

    fn initialized_context(dir: &Path) -> AppContext {
        let ctx = AppContext::resolve_from(dir).unwrap();
        let templates = TemplateStore::new(ctx.templates_dir());
        fs::create_dir_all(templates.dir()).unwrap();
        fs::write(templates.template_path("social_post"), DEFAULT_SOCIAL_POST_TEMPLATE).unwrap();
        fs::write(templates.template_path("review_reply"), DEFAULT_REVIEW_REPLY_TEMPLATE).unwrap();
        ctx
    }

    fn post_args(image: Option<&Path>) -> PostArgs {
        PostArgs {
            dish_name: "Pasta".to_string(),
            theme: "Italian".to_string(),
            tone: "fun".to_string(),
            image: image.map(Path::to_path_buf),
        }
    }

    #[test]
    fn test_post_generates_and_records() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = initialized_context(temp_dir.path());
        let client = FixedClient::new("Check out our pasta! 🍝");

        let outcome = run_post(&ctx, &client, post_args(None)).unwrap();

        assert_eq!(
            outcome.response_json(),
            serde_json::json!({ "caption": "Check out our pasta! 🍝" })
        );
        assert!(outcome.is_persisted());

        let entries = HistoryStore::from_context(&ctx).read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, EntryType::SocialPost);
        assert_eq!(entries[0].input["dish_name"], "Pasta");
        assert!(!entries[0].input.contains_key("image_reference"));
    }

    #[test]
    fn test_post_with_image_records_stored_path() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = initialized_context(temp_dir.path());
        let source = temp_dir.path().join("my pasta.png");
        fs::write(&source, b"png").unwrap();
        let client = FixedClient::new("Look!");

        run_post(&ctx, &client, post_args(Some(&source))).unwrap();

        assert!(ctx.uploads_dir().join("my_pasta.png").is_file());
        let entries = HistoryStore::from_context(&ctx).read_all().unwrap();
        assert_eq!(
            entries[0].input["image_reference"],
            Path::new("static")
                .join("uploads")
                .join("my_pasta.png")
                .display()
                .to_string()
        );
    }

    #[test]
    fn test_post_with_missing_image_fails_before_generation() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = initialized_context(temp_dir.path());
        let client = FixedClient::new("unused");

        let err = run_post(&ctx, &client, post_args(Some(&temp_dir.path().join("nope.png"))))
            .unwrap_err();

        assert!(matches!(err, BistroError::InvalidRequest(_)));
        assert!(client.last_prompt.lock().unwrap().is_none());
        assert!(!ctx.history_path().exists());
    }

    #[test]
    fn test_reply_generates_and_records() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = initialized_context(temp_dir.path());
        let client = FixedClient::new("Thank you for visiting!");

        let outcome = run_reply(
            &ctx,
            &client,
            ReplyArgs {
                review_text: "Great food".to_string(),
                sentiment: "positive".to_string(),
                tone: "warm".to_string(),
            },
        )
        .unwrap();

        assert_eq!(
            outcome.response_json(),
            serde_json::json!({ "reply": "Thank you for visiting!" })
        );
        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Great food"));
        assert!(prompt.contains("positive"));

        let replies = HistoryStore::from_context(&ctx)
            .read_filtered(Some("review_reply"))
            .unwrap();
        assert_eq!(replies.len(), 1);
    }

    #[test]
    fn test_uninitialized_directory_reports_missing_template() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::resolve_from(temp_dir.path()).unwrap();
        let client = FixedClient::new("unused");

        let err = run_post(&ctx, &client, post_args(None)).unwrap_err();

        assert!(matches!(err, BistroError::TemplateNotFound { .. }));
        assert_eq!(err.exit_code(), bistro::exit_codes::TEMPLATE_FAILURE);
        assert!(backend_hint(&ctx, &err).is_none());
    }

    #[test]
    fn test_backend_failure_gets_hint() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = initialized_context(temp_dir.path());
        let client = DownClient;

        let err = run_post(&ctx, &client, post_args(None)).unwrap_err();

        assert!(err.is_backend());
        let hint = backend_hint(&ctx, &err).unwrap();
        assert!(hint.contains(&ctx.config.backend.base_url));
        assert!(hint.contains(&ctx.config.model_id));
        assert!(!ctx.history_path().exists());
    }
}
