//! Build automation tasks for ragadmin
//!
//! Currently generates the CLI reference from the clap definitions.

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for ragadmin", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<ragadmin_cli::Cli>();

    let content = format!(
        r#"# ragadmin CLI Reference

This documentation is generated from the CLI source code. Last updated: {}.

## Overview

ragadmin is a command-line console for administering a RAG platform backend:
users, model registry, model versions, benchmarks and the dashboard.

## Quick Start

```bash
# Point the CLI at the backend
ragadmin config set server_url http://localhost:9380
ragadmin health

# Users
ragadmin users list --status active
ragadmin users bulk deactivate a@example.com b@example.com --yes
ragadmin users export --format csv --role admin

# Models and benchmarks
ragadmin models benchmark run <model-id> --type latency --wait
ragadmin models compare <id-1> <id-2>

# Versions
ragadmin versions list <model-id>
ragadmin versions rollback <model-id>

# Live dashboard
ragadmin dashboard --watch
```

## Commands

{}

## Environment Variables

- `RAGADMIN_SERVER_URL` - Backend URL (default: `http://localhost:9380`)
- `RAGADMIN_TOKEN` - Bearer token sent with every request
- `RAGADMIN_API_TIMEOUT_SECS` - Request timeout in seconds
- `RAGADMIN_CACHE_TTL_SECS` - Query cache stale time in seconds
- `RAGADMIN_EXPORT_DIR` - Default directory for `users export`
- `RAGADMIN_CONFIG` - Alternate config file path
- `RAGADMIN_LOG_LEVEL` / `RAGADMIN_LOG_OUTPUT` - Logging overrides

---

*To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
