//! Implementation of the `bistro init` command.
//!
//! # What `bistro init` does
//!
//! 1. Creates the data directory if it does not exist
//! 2. Creates `bistro.yaml` with default values (if missing)
//! 3. Creates the templates directory with the default social post and
//!    review reply templates (each only if missing)
//! 4. Creates the uploads directory
//!
//! The history log is not created; it appears with the first generation.

use bistro::config::Config;
use bistro::context::AppContext;
use bistro::error::{BistroError, Result};
use bistro::fs::atomic_write_file;
use bistro::history::EntryType;
use bistro::template::{
    DEFAULT_REVIEW_REPLY_TEMPLATE, DEFAULT_SOCIAL_POST_TEMPLATE, TemplateStore,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Execute the `bistro init` command.
///
/// This command is **idempotent**: running it again never overwrites
/// an edited config or template.
pub fn cmd_init(ctx: &AppContext) -> Result<()> {
    let created = scaffold(ctx)?;

    println!("Initialized bistro data directory: {}", ctx.data_dir.display());
    println!();
    if created.is_empty() {
        println!("Everything was already in place.");
    } else {
        println!("Created:");
        for path in &created {
            println!("  {}", ctx.relative_to_data_dir(path).display());
        }
    }
    println!();
    println!("Next steps:");
    println!("  1. Start Ollama and pull the model: ollama pull {}", ctx.config.model_id);
    println!("  2. Edit the prompt templates in {}/", ctx.config.templates_dir);
    println!("  3. Generate: bistro post --dish <name> --theme <theme> --tone <tone>");

    Ok(())
}

/// Create whatever is missing and return the paths that were created.
fn scaffold(ctx: &AppContext) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();

    ensure_dir(&ctx.data_dir, &mut created)?;

    let config_path = ctx.config_path();
    if !config_path.exists() {
        let yaml = Config::default().to_yaml()?;
        atomic_write_file(&config_path, &yaml)?;
        created.push(config_path);
    }

    let templates = TemplateStore::new(ctx.templates_dir());
    ensure_dir(templates.dir(), &mut created)?;
    for entry_type in EntryType::ALL {
        let path = templates.template_path(entry_type.template_id());
        if !path.exists() {
            atomic_write_file(&path, default_template(entry_type))?;
            created.push(path);
        }
    }

    ensure_dir(&ctx.uploads_dir(), &mut created)?;

    tracing::info!(
        data_dir = %ctx.data_dir.display(),
        created = created.len(),
        "initialized data directory"
    );

    Ok(created)
}

fn default_template(entry_type: EntryType) -> &'static str {
    match entry_type {
        EntryType::SocialPost => DEFAULT_SOCIAL_POST_TEMPLATE,
        EntryType::ReviewReply => DEFAULT_REVIEW_REPLY_TEMPLATE,
    }
}

fn ensure_dir(path: &Path, created: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(path).map_err(|e| {
        BistroError::UserError(format!(
            "failed to create directory '{}': {}",
            path.display(),
            e
        ))
    })?;
    created.push(path.to_path_buf());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn fresh_context(dir: &Path) -> AppContext {
        AppContext::resolve_from(dir.join("bistro-data")).unwrap()
    }

    #[test]
    fn test_scaffold_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = fresh_context(temp_dir.path());

        let created = scaffold(&ctx).unwrap();

        assert!(ctx.data_dir.is_dir());
        assert!(ctx.config_path().is_file());
        assert!(ctx.templates_dir().join("social_post_template.txt").is_file());
        assert!(ctx.templates_dir().join("review_reply_template.txt").is_file());
        assert!(ctx.uploads_dir().is_dir());
        assert!(!ctx.history_path().exists());
        assert!(created.contains(&ctx.config_path()));
    }

    #[test]
    fn test_written_config_loads_as_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = fresh_context(temp_dir.path());
        scaffold(&ctx).unwrap();

        assert_eq!(Config::load(ctx.config_path()).unwrap(), Config::default());
    }

    #[test]
    fn test_default_templates_render() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = fresh_context(temp_dir.path());
        scaffold(&ctx).unwrap();

        let templates = TemplateStore::new(ctx.templates_dir());
        let vars: BTreeMap<String, String> = [
            ("review_text", "Lovely"),
            ("sentiment", "positive"),
            ("tone", "warm"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let prompt = templates.render("review_reply", &vars).unwrap();
        assert!(prompt.contains("Lovely"));
    }

    #[test]
    fn test_scaffold_is_idempotent_and_keeps_edits() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = fresh_context(temp_dir.path());
        scaffold(&ctx).unwrap();

        let template_path = ctx.templates_dir().join("social_post_template.txt");
        fs::write(&template_path, "Custom {{ dish_name }}").unwrap();
        fs::write(ctx.config_path(), "model_id: mistral\n").unwrap();

        let created = scaffold(&ctx).unwrap();

        assert!(created.is_empty());
        assert_eq!(
            fs::read_to_string(&template_path).unwrap(),
            "Custom {{ dish_name }}"
        );
        assert_eq!(
            fs::read_to_string(ctx.config_path()).unwrap(),
            "model_id: mistral\n"
        );
    }

    #[test]
    fn test_scaffold_restores_missing_template() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = fresh_context(temp_dir.path());
        scaffold(&ctx).unwrap();

        let template_path = ctx.templates_dir().join("review_reply_template.txt");
        fs::remove_file(&template_path).unwrap();

        let created = scaffold(&ctx).unwrap();

        assert_eq!(created, vec![template_path.clone()]);
        assert_eq!(
            fs::read_to_string(template_path).unwrap(),
            DEFAULT_REVIEW_REPLY_TEMPLATE
        );
    }
}
