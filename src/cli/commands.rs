//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::cli::output::{
    MaskReport, OutputFormat, format_hash, format_jobs, format_json, format_mask,
    format_patterns, format_separation, format_status, format_worker_report,
};
use crate::cli::parser::{Cli, Commands, QueueCommands};
use crate::config::{SeparatorConfig, default_config_json, load_config};
use crate::core::{JobStatus, Variable};
use crate::error::{CommandError, Error, IoError, Result, StorageError};
use crate::io::{read_file, read_input, write_file};
use crate::pipeline::{mask_document, unmask_document};
use crate::queue::{SqliteQueue, Worker, enqueue_variables};
use crate::separation::{DEFAULT_PATTERN, PATTERN_PRESETS, UnmatchedPolicy};
use crate::storage::{ObjectStore, SqliteStorage};
use serde::Deserialize;
use std::fmt::Write as FmtWrite;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Executes the CLI command.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let db_path = cli.get_db_path();

    match &cli.command {
        Commands::Init { force } => cmd_init(&db_path, *force),
        Commands::Status => cmd_status(&db_path, format),
        Commands::Reset { yes } => cmd_reset(&db_path, *yes),
        Commands::Separate {
            file,
            output,
            variables,
        } => cmd_separate(
            &load_settings(cli)?,
            file.as_deref(),
            output.as_deref(),
            variables.as_deref(),
            format,
        ),
        Commands::Restore {
            file,
            variables,
            keep_unmatched,
            output,
        } => cmd_restore(
            &load_settings(cli)?,
            file.as_deref(),
            variables,
            *keep_unmatched,
            output.as_deref(),
        ),
        Commands::Mask {
            file,
            bucket,
            key,
            no_enqueue,
        } => cmd_mask(
            &db_path,
            &load_settings(cli)?,
            file,
            bucket,
            key.as_deref(),
            *no_enqueue,
            format,
        ),
        Commands::Unmask {
            bucket,
            key,
            from_key,
            output,
        } => cmd_unmask(
            &db_path,
            &load_settings(cli)?,
            bucket,
            key,
            from_key.as_deref(),
            output.as_deref(),
        ),
        Commands::Queue(queue_cmd) => {
            let settings = load_settings(cli)?;
            match queue_cmd {
                QueueCommands::List { status } => {
                    cmd_queue_list(&db_path, &settings, status.as_deref(), format)
                }
                QueueCommands::Work { limit } => cmd_queue_work(&db_path, &settings, *limit, format),
                QueueCommands::Retry { stale_after } => {
                    cmd_queue_retry(&db_path, &settings, *stale_after)
                }
            }
        }
        Commands::Patterns => Ok(format_patterns(PATTERN_PRESETS, DEFAULT_PATTERN, format)),
        Commands::Hash { text } => cmd_hash(&load_settings(cli)?, text, format),
        Commands::Config { default } => cmd_config(cli, *default),
    }
}

/// Loads configuration and applies command-line overrides.
fn load_settings(cli: &Cli) -> Result<SeparatorConfig> {
    let cwd = std::env::current_dir().map_err(|e| IoError::Generic(e.to_string()))?;
    let loaded = load_config(cli.config.as_deref(), &cwd)?;
    let config = loaded.config.with_overrides(
        cli.pattern.as_deref(),
        cli.regex.as_deref(),
        cli.hash_len,
    );
    config.validate()?;
    Ok(config)
}

/// Opens storage and ensures it's initialized.
fn open_storage(db_path: &Path) -> Result<SqliteStorage> {
    if !db_path.exists() {
        return Err(StorageError::NotInitialized.into());
    }

    let storage = SqliteStorage::open(db_path)?;

    if !storage.is_initialized()? {
        return Err(StorageError::NotInitialized.into());
    }

    Ok(storage)
}

/// Opens the queue on initialized storage.
fn open_queue(db_path: &Path, settings: &SeparatorConfig) -> Result<SqliteQueue> {
    let storage = open_storage(db_path)?;
    Ok(SqliteQueue::new(Arc::new(Mutex::new(storage))).with_timeout(settings.queue_timeout()))
}

/// Builds a single-threaded runtime for queue operations.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            CommandError::ExecutionFailed(format!("failed to start async runtime: {e}")).into()
        })
}

/// Writes to `output` when given, otherwise returns the text.
fn emit(text: String, output: Option<&Path>) -> Result<String> {
    match output {
        Some(path) => {
            write_file(path, &text)?;
            Ok(String::new())
        }
        None => Ok(text),
    }
}

// ==================== Command Implementations ====================

fn cmd_init(db_path: &Path, force: bool) -> Result<String> {
    if db_path.exists() && !force {
        return Err(CommandError::ExecutionFailed(
            "Database already exists. Use --force to reinitialize.".to_string(),
        )
        .into());
    }

    if force && db_path.exists() {
        std::fs::remove_file(db_path).map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to remove existing database: {e}"))
        })?;
    }

    let mut storage = SqliteStorage::open(db_path)?;
    storage.init()?;

    Ok(format!(
        "Initialized varsep database at: {}\n",
        db_path.display()
    ))
}

fn cmd_status(db_path: &Path, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let stats = storage.stats()?;
    Ok(format_status(&stats, format))
}

fn cmd_reset(db_path: &Path, yes: bool) -> Result<String> {
    if !yes {
        return Err(CommandError::ExecutionFailed(
            "Use --yes to confirm reset. This will delete all objects and jobs.".to_string(),
        )
        .into());
    }

    let mut storage = open_storage(db_path)?;
    storage.reset()?;

    Ok("varsep state reset successfully.\n".to_string())
}

fn cmd_separate(
    settings: &SeparatorConfig,
    file: Option<&Path>,
    output: Option<&Path>,
    variables: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let separator = settings.build_separator()?;
    let text = read_input(file)?;
    let result = separator.separate_variables(&text)?;

    if let Some(path) = variables {
        write_file(path, &format_json(&result.variables))?;
    }

    match (output, format) {
        (Some(path), _) => {
            write_file(path, &result.processed_text)?;
            Ok(format_separation(&result, format))
        }
        (None, OutputFormat::Json) => Ok(format_json(&result)),
        (None, OutputFormat::Text) => Ok(result.processed_text),
    }
}

/// Accepted shapes of a variables file: a bare list, or any object with a
/// `variables` list (separation output, manifests).
#[derive(Deserialize)]
#[serde(untagged)]
enum VariablesFile {
    List(Vec<Variable>),
    Wrapped { variables: Vec<Variable> },
}

fn read_variables(path: &Path) -> Result<Vec<Variable>> {
    let json = read_file(path)?;
    let parsed: VariablesFile = serde_json::from_str(&json).map_err(|e| {
        CommandError::InvalidArgument(format!(
            "{} is not a variables file: {e}",
            path.display()
        ))
    })?;
    Ok(match parsed {
        VariablesFile::List(vars) | VariablesFile::Wrapped { variables: vars } => vars,
    })
}

fn cmd_restore(
    settings: &SeparatorConfig,
    file: Option<&Path>,
    variables: &Path,
    keep_unmatched: bool,
    output: Option<&Path>,
) -> Result<String> {
    let mut settings = settings.clone();
    if keep_unmatched {
        settings.unmatched = UnmatchedPolicy::Keep;
    }
    let separator = settings.build_separator()?;

    let vars = read_variables(variables)?;
    let text = read_input(file)?;
    let restored = separator.restore_variables(&text, &vars)?;
    emit(restored, output)
}

fn cmd_mask(
    db_path: &Path,
    settings: &SeparatorConfig,
    file: &Path,
    bucket: &str,
    key: Option<&str>,
    no_enqueue: bool,
    format: OutputFormat,
) -> Result<String> {
    let separator = settings.build_separator()?;
    let mut storage = open_storage(db_path)?;

    let key = match key {
        Some(k) => k.to_string(),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| CommandError::MissingArgument("--key".to_string()))?,
    };

    let text = read_file(file)?;
    let masked = mask_document(&separator, &mut storage, bucket, &key, &text)?;

    let enqueued = if no_enqueue {
        0
    } else {
        let queue = SqliteQueue::new(Arc::new(Mutex::new(storage)))
            .with_timeout(settings.queue_timeout());
        runtime()?.block_on(enqueue_variables(&queue, &masked.result))?
    };

    let report = MaskReport {
        bucket: masked.bucket,
        key: masked.key,
        manifest_key: masked.manifest_key,
        variables: masked.result.len(),
        distinct: masked.result.distinct_variables().len(),
        enqueued,
    };
    Ok(format_mask(&report, format))
}

fn cmd_unmask(
    db_path: &Path,
    settings: &SeparatorConfig,
    bucket: &str,
    key: &str,
    from_key: Option<&str>,
    output: Option<&Path>,
) -> Result<String> {
    let separator = settings.build_separator()?;
    let storage = open_storage(db_path)?;
    let restored = unmask_document(&separator, &storage, bucket, key, from_key)?;
    emit(restored, output)
}

fn cmd_queue_list(
    db_path: &Path,
    settings: &SeparatorConfig,
    status: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let status = status.map(str::parse::<JobStatus>).transpose()?;
    let queue = open_queue(db_path, settings)?;
    let jobs = runtime()?.block_on(queue.list_jobs(status))?;
    Ok(format_jobs(&jobs, format))
}

fn cmd_queue_work(
    db_path: &Path,
    settings: &SeparatorConfig,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<String> {
    let queue = open_queue(db_path, settings)?;
    let worker = Worker::new(queue)
        .with_bucket(settings.variables_bucket.clone())
        .with_stale_after(Some(settings.stale_after()));
    let report = runtime()?.block_on(worker.run(limit))?;
    Ok(format_worker_report(&report, format))
}

fn cmd_queue_retry(
    db_path: &Path,
    settings: &SeparatorConfig,
    stale_after: Option<u64>,
) -> Result<String> {
    let queue = open_queue(db_path, settings)?;
    let idle = stale_after.map_or_else(|| settings.stale_after(), Duration::from_secs);
    let (failed, stale) = runtime()?.block_on(async {
        let failed = queue.retry_failed().await?;
        let stale = queue.requeue_stale(idle).await?;
        Ok::<_, Error>((failed, stale))
    })?;
    Ok(format!("Requeued {failed} failed and {stale} stale jobs.\n"))
}

fn cmd_hash(settings: &SeparatorConfig, text: &str, format: OutputFormat) -> Result<String> {
    let separator = settings.build_separator()?;
    let hash = separator.generate_hash(text);
    let placeholder = separator.placeholder().render(&hash);
    Ok(format_hash(text, &hash, &placeholder, format))
}

fn cmd_config(cli: &Cli, default: bool) -> Result<String> {
    if default {
        let mut json = default_config_json()?;
        json.push('\n');
        return Ok(json);
    }

    let cwd = std::env::current_dir().map_err(|e| IoError::Generic(e.to_string()))?;
    let source = load_config(cli.config.as_deref(), &cwd)?.source;
    let settings = load_settings(cli)?;

    let mut output = String::new();
    if OutputFormat::parse(&cli.format) == OutputFormat::Text {
        let _ = writeln!(
            output,
            "# source: {}",
            source.map_or_else(|| "defaults".to_string(), |p| p.display().to_string())
        );
    }
    output.push_str(&format_json(&settings));
    output.push('\n');
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, RestoreError};
    use tempfile::TempDir;

    fn setup() -> (TempDir, std::path::PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        (temp_dir, db_path)
    }

    fn settings() -> SeparatorConfig {
        SeparatorConfig::default()
    }

    #[test]
    fn test_cmd_init() {
        let (_temp_dir, db_path) = setup();
        let result = cmd_init(&db_path, false);
        assert!(result.is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn test_cmd_init_already_exists() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false).unwrap();

        assert!(cmd_init(&db_path, false).is_err());
        assert!(cmd_init(&db_path, true).is_ok());
    }

    #[test]
    fn test_cmd_status_requires_init() {
        let (_temp_dir, db_path) = setup();
        let err = cmd_status(&db_path, OutputFormat::Text).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::NotInitialized)));
    }

    #[test]
    fn test_cmd_status() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false).unwrap();

        let result = cmd_status(&db_path, OutputFormat::Text).unwrap();
        assert!(result.contains("Buckets"));
    }

    #[test]
    fn test_cmd_reset() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false).unwrap();

        assert!(cmd_reset(&db_path, false).is_err());
        assert!(cmd_reset(&db_path, true).is_ok());
    }

    #[test]
    fn test_cmd_separate_and_restore_files() {
        let (temp_dir, _db_path) = setup();
        let input = temp_dir.path().join("in.txt");
        let masked = temp_dir.path().join("masked.txt");
        let vars = temp_dir.path().join("vars.json");
        let restored = temp_dir.path().join("restored.txt");
        let text = "Hello {{name}}, your code is {{code}}.";
        std::fs::write(&input, text).unwrap();

        let summary = cmd_separate(
            &settings(),
            Some(&input),
            Some(&masked),
            Some(&vars),
            OutputFormat::Text,
        )
        .unwrap();
        assert!(summary.contains("Separated 2 variables"));

        let masked_text = std::fs::read_to_string(&masked).unwrap();
        assert!(masked_text.starts_with("Hello <VAR:"));

        let out = cmd_restore(&settings(), Some(&masked), &vars, false, Some(&restored)).unwrap();
        assert!(out.is_empty());
        assert_eq!(std::fs::read_to_string(&restored).unwrap(), text);
    }

    #[test]
    fn test_cmd_separate_json_feeds_restore() {
        let (temp_dir, _db_path) = setup();
        let input = temp_dir.path().join("in.txt");
        std::fs::write(&input, "Total: {{count}}").unwrap();

        let json = cmd_separate(&settings(), Some(&input), None, None, OutputFormat::Json).unwrap();
        let result_path = temp_dir.path().join("result.json");
        std::fs::write(&result_path, &json).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let masked_path = temp_dir.path().join("masked.txt");
        std::fs::write(&masked_path, value["processed_text"].as_str().unwrap()).unwrap();

        let restored = cmd_restore(&settings(), Some(&masked_path), &result_path, false, None).unwrap();
        assert_eq!(restored, "Total: {{count}}");
    }

    #[test]
    fn test_cmd_restore_unmatched() {
        let (temp_dir, _db_path) = setup();
        let input = temp_dir.path().join("masked.txt");
        let vars = temp_dir.path().join("vars.json");
        std::fs::write(&input, "Hi <VAR:0123456789ab>").unwrap();
        std::fs::write(&vars, "[]").unwrap();

        let err = cmd_restore(&settings(), Some(&input), &vars, false, None).unwrap_err();
        assert!(matches!(
            err,
            Error::Restore(RestoreError::UnmatchedPlaceholder { .. })
        ));

        let kept = cmd_restore(&settings(), Some(&input), &vars, true, None).unwrap();
        assert_eq!(kept, "Hi <VAR:0123456789ab>");
    }

    #[test]
    fn test_cmd_restore_rejects_other_hash_width() {
        let (temp_dir, _db_path) = setup();
        let input = temp_dir.path().join("in.txt");
        let masked = temp_dir.path().join("masked.txt");
        let vars = temp_dir.path().join("vars.json");
        std::fs::write(&input, "Hello {{name}}!").unwrap();

        let wide = settings().with_overrides(None, None, Some(16));
        cmd_separate(&wide, Some(&input), Some(&masked), Some(&vars), OutputFormat::Text).unwrap();

        let err = cmd_restore(&settings(), Some(&masked), &vars, true, None).unwrap_err();
        assert!(matches!(
            err,
            Error::Restore(RestoreError::MalformedHash { expected: 12, .. })
        ));
        assert_eq!(
            cmd_restore(&wide, Some(&masked), &vars, false, None).unwrap(),
            "Hello {{name}}!"
        );
    }

    #[test]
    fn test_cmd_restore_bad_variables_file() {
        let (temp_dir, _db_path) = setup();
        let input = temp_dir.path().join("masked.txt");
        let vars = temp_dir.path().join("vars.json");
        std::fs::write(&input, "Hi").unwrap();
        std::fs::write(&vars, r#"{"nope": 1}"#).unwrap();

        let err = cmd_restore(&settings(), Some(&input), &vars, false, None).unwrap_err();
        assert!(matches!(err, Error::Command(CommandError::InvalidArgument(_))));
    }

    #[test]
    fn test_cmd_mask_work_unmask() {
        let (temp_dir, db_path) = setup();
        cmd_init(&db_path, false).unwrap();
        let doc = temp_dir.path().join("greeting.txt");
        std::fs::write(&doc, "Hello {{name}}, bye {{name}}.").unwrap();

        let out = cmd_mask(&db_path, &settings(), &doc, "documents", None, false, OutputFormat::Json)
            .unwrap();
        let report: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(report["key"], "greeting.txt");
        assert_eq!(report["variables"], 2);
        assert_eq!(report["enqueued"], 1);

        let jobs = cmd_queue_list(&db_path, &settings(), Some("pending"), OutputFormat::Text).unwrap();
        assert!(jobs.contains("{{name}}"));

        let work = cmd_queue_work(&db_path, &settings(), None, OutputFormat::Text).unwrap();
        assert_eq!(work, "Processed 1 jobs (0 failed)\n");

        let restored =
            cmd_unmask(&db_path, &settings(), "documents", "greeting.txt", None, None).unwrap();
        assert_eq!(restored, "Hello {{name}}, bye {{name}}.");
    }

    #[test]
    fn test_cmd_mask_no_enqueue() {
        let (temp_dir, db_path) = setup();
        cmd_init(&db_path, false).unwrap();
        let doc = temp_dir.path().join("doc.txt");
        std::fs::write(&doc, "{{a}}").unwrap();

        let out = cmd_mask(
            &db_path,
            &settings(),
            &doc,
            "documents",
            Some("custom-key"),
            true,
            OutputFormat::Text,
        )
        .unwrap();
        assert!(out.contains("Masked documents/custom-key"));
        assert!(out.contains("Enqueued:      0"));
    }

    #[test]
    fn test_cmd_queue_list_bad_status() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false).unwrap();
        assert!(cmd_queue_list(&db_path, &settings(), Some("done"), OutputFormat::Text).is_err());
    }

    #[test]
    fn test_cmd_queue_retry_empty() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false).unwrap();
        assert_eq!(
            cmd_queue_retry(&db_path, &settings(), None).unwrap(),
            "Requeued 0 failed and 0 stale jobs.\n"
        );
    }

    #[test]
    fn test_cmd_queue_retry_requeues_abandoned_job() {
        let (_temp_dir, db_path) = setup();
        cmd_init(&db_path, false).unwrap();
        {
            let mut storage = open_storage(&db_path).unwrap();
            storage
                .insert_job(&crate::core::QueueItem::new("0123456789ab", "{{a}}"))
                .unwrap();
            storage.claim_next_job().unwrap().unwrap();
        }

        assert_eq!(
            cmd_queue_retry(&db_path, &settings(), None).unwrap(),
            "Requeued 0 failed and 0 stale jobs.\n"
        );
        assert_eq!(
            cmd_queue_retry(&db_path, &settings(), Some(0)).unwrap(),
            "Requeued 0 failed and 1 stale jobs.\n"
        );

        let work = cmd_queue_work(&db_path, &settings(), None, OutputFormat::Text).unwrap();
        assert_eq!(work, "Processed 1 jobs (0 failed)\n");
    }

    #[test]
    fn test_cmd_hash() {
        let out = cmd_hash(&settings(), "{{name}}", OutputFormat::Text).unwrap();
        let hash = out.split_whitespace().next().unwrap();
        assert_eq!(hash.len(), 12);
        assert!(out.contains(&format!("<VAR:{hash}>")));
    }
}
