use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use repo_digest::aggregator::PublicationTracker;
use repo_digest::config::{load_credentials, Credentials};
use repo_digest::github::DEFAULT_API_BASE;
use repo_digest::publish::{PostStatus, RetryPolicy};
use repo_digest::{PipelineContext, PipelineOutcome, PublishPipeline, PublishRequest};

#[derive(Parser)]
#[command(name = "repo-digest")]
#[command(about = "Publish a digest of recent GitHub activity to WordPress")]
struct Cli {
    /// GitHub token (can also be set via GITHUB_TOKEN env var)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// WordPress site URL
    #[arg(long, env = "WORDPRESS_URL")]
    wordpress_url: Option<String>,

    #[arg(long, env = "WORDPRESS_USERNAME")]
    wordpress_username: Option<String>,

    /// WordPress application password
    #[arg(long, env = "WORDPRESS_PASSWORD", hide_env_values = true)]
    wordpress_password: Option<String>,

    /// JSON or TOML credentials file
    #[arg(long, env = "REPO_DIGEST_CONFIG")]
    config: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE)]
    github_api: String,

    /// Attempts per network step (1 = no retries)
    #[arg(long, default_value = "1")]
    retries: u32,

    #[arg(long, default_value = "1000")]
    retry_delay_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the article and print it without publishing
    Preview {
        #[command(flatten)]
        article: ArticleArgs,

        /// Print the draft as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the article and publish it
    Publish {
        #[command(flatten)]
        article: ArticleArgs,
    },

    /// Poll repositories and publish whenever there is new activity
    Watch {
        /// Repositories to watch (URL or owner/name), comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        repos: Vec<String>,

        /// Seconds between polls
        #[arg(long, default_value = "3600")]
        interval: u64,

        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,

        #[arg(long, default_value = "draft")]
        status: PostStatus,
    },
}

#[derive(Args)]
struct ArticleArgs {
    /// Repository URL or owner/name
    #[arg(short, long, conflicts_with_all = ["owner", "name"])]
    repo: Option<String>,

    #[arg(long, requires = "name")]
    owner: Option<String>,

    #[arg(long, requires = "owner")]
    name: Option<String>,

    /// Only include activity after this instant (RFC 3339)
    #[arg(long)]
    since: Option<DateTime<Utc>>,

    #[arg(long)]
    title: Option<String>,

    /// Extra tags, comma separated
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,

    #[arg(long, default_value = "draft")]
    status: PostStatus,
}

impl ArticleArgs {
    fn into_request(self) -> Result<PublishRequest> {
        let mut request = match (self.repo, self.owner, self.name) {
            (Some(repo), _, _) => PublishRequest::new(repo),
            (None, Some(owner), Some(name)) => PublishRequest::for_repo(&owner, &name),
            _ => bail!("pass --repo, or --owner together with --name"),
        };
        request.since = self.since;
        request.title = self.title;
        request.tags = self.tags;
        request.categories = self.categories;
        request.status = self.status;
        Ok(request)
    }
}

impl Cli {
    fn context(&self) -> Result<PipelineContext> {
        let from_file = match &self.config {
            Some(path) => load_credentials(path)
                .with_context(|| format!("loading credentials from {}", path.display()))?,
            None => Credentials::default(),
        };
        let credentials = from_file.overlay(Credentials {
            github_credential: self.github_token.clone(),
            publish_url: self.wordpress_url.clone(),
            publish_username: self.wordpress_username.clone(),
            publish_credential: self.wordpress_password.clone(),
        });

        Ok(PipelineContext::new(credentials)
            .with_github_api(self.github_api.clone())
            .with_retry(RetryPolicy::new(
                self.retries,
                Duration::from_millis(self.retry_delay_ms),
            )))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let context = cli.context()?;

    match cli.command {
        Commands::Preview { article, json } => {
            let pipeline = PublishPipeline::new(context)?;
            let request = article.into_request()?.preview();
            match pipeline.run(&request).await? {
                PipelineOutcome::Preview { draft, since } => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&draft)?);
                    } else {
                        println!("Title:      {}", draft.title);
                        println!("Status:     {}", draft.status);
                        println!("Since:      {}", since.to_rfc3339());
                        println!("Tags:       {}", join(&draft.tags));
                        println!("Categories: {}", join(&draft.categories));
                        println!();
                        println!("{}", draft.body_html);
                    }
                }
                other => bail!("unexpected outcome for a preview run: {:?}", other),
            }
        }
        Commands::Publish { article } => {
            let pipeline = PublishPipeline::new(context)?;
            let request = article.into_request()?;
            if let PipelineOutcome::Published { post, since, .. } = pipeline.run(&request).await? {
                println!("✓ Published post {} ({})", post.id, post.link);
                println!("  covering activity since {}", since.to_rfc3339());
            }
        }
        Commands::Watch {
            repos,
            interval,
            tags,
            categories,
            status,
        } => {
            let tracker = Arc::new(PublicationTracker::new());
            let pipeline = PublishPipeline::new(context.with_tracker(tracker))?;
            let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tokio::signal::ctrl_c() => {
                        println!("Stopping.");
                        break;
                    }
                }

                for repo in &repos {
                    let request = PublishRequest {
                        tags: tags.clone(),
                        categories: categories.clone(),
                        status,
                        skip_if_empty: true,
                        ..PublishRequest::new(repo.clone())
                    };
                    match pipeline.run(&request).await {
                        Ok(PipelineOutcome::Published { post, .. }) => {
                            println!("✓ {}: published {}", repo, post.link);
                        }
                        Ok(PipelineOutcome::NoActivity { since }) => {
                            println!("- {}: no activity since {}", repo, since.to_rfc3339());
                        }
                        Ok(PipelineOutcome::Preview { .. }) => {}
                        // Keep polling; the tracker was not advanced so the next poll retries.
                        Err(e) => {
                            tracing::error!(error = %e, "watch iteration failed");
                            println!("✗ {}: {}", repo, e);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn join(values: &std::collections::BTreeSet<String>) -> String {
    values.iter().cloned().collect::<Vec<_>>().join(", ")
}
